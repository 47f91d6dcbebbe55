//! Proptest generators for property-based testing.

use proptest::prelude::*;

use access_ledger_core::TokenId;

/// Generate a token id.
pub fn token_id() -> impl Strategy<Value = TokenId> {
    "[a-z][a-z0-9-]{0,15}".prop_map(TokenId::new)
}

/// Generate an owner name.
pub fn owner() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(@[a-z]{2,6}\\.edu)?".prop_map(String::from)
}

/// Generate a positive issuance amount.
pub fn amount() -> impl Strategy<Value = i64> {
    1i64..=50
}

/// Generate an access quota.
pub fn access_quota() -> impl Strategy<Value = i64> {
    1i64..=5
}

/// Generate a monthly quota; zero disables replenishment.
pub fn monthly_token_quota() -> impl Strategy<Value = i64> {
    prop_oneof![Just(0i64), 1i64..=100]
}

/// One action in a generated registry run.
///
/// Targets index into the tokens issued so far, wrapping around.
#[derive(Debug, Clone)]
pub enum Step {
    /// Issue a standard token from the transferable token.
    Issue { amount: i64, access_quota: i64 },
    Consume { target: usize },
    ChangeOwner { target: usize, owner: String },
    Revoke { target: usize },
    /// Move the clock forward.
    AdvanceDays(i64),
}

/// Generate a step, weighted towards balance-affecting ones.
pub fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (amount(), access_quota())
            .prop_map(|(amount, access_quota)| Step::Issue { amount, access_quota }),
        6 => any::<usize>().prop_map(|target| Step::Consume { target }),
        1 => (any::<usize>(), owner())
            .prop_map(|(target, owner)| Step::ChangeOwner { target, owner }),
        1 => any::<usize>().prop_map(|target| Step::Revoke { target }),
        1 => (1i64..=45).prop_map(Step::AdvanceDays),
    ]
}

/// Parameters for a generated run: the transferable token's grant and the
/// steps applied after it is issued.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub amount: i64,
    pub monthly_token_quota: i64,
    pub steps: Vec<Step>,
}

impl Arbitrary for RunParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            1i64..=200, // transferable amount
            monthly_token_quota(),
            prop::collection::vec(step(), 1..40),
        )
            .prop_map(|(amount, monthly_token_quota, steps)| RunParams {
                amount,
                monthly_token_quota,
                steps,
            })
            .boxed()
    }
}
