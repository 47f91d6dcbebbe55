//! Canned registry scenarios.
//!
//! Each scenario is a list of operations, the clock reading each runs at,
//! and the outcome it must have, followed by the balances expected at the end.
//! They pin the observable behaviour of the registry so another
//! implementation can be checked against the same list.

use access_ledger::{ErrorKind, Operation, TokenId};

use crate::fixtures::{TestFixture, FIXTURE_EPOCH};

/// 2023-12-01T00:00:00Z, the first month boundary after [`FIXTURE_EPOCH`].
pub const NEXT_MONTH: i64 = 1_701_388_800;

/// Expected result of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    Ok,
    Fails(ErrorKind),
}

#[derive(Debug, Clone)]
pub struct ScenarioStep {
    /// Clock reading (Unix seconds) the operation runs at.
    pub at: i64,
    pub operation: Operation,
    pub expect: Expect,
}

/// Balance of one token once every step has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedBalance {
    pub token_id: &'static str,
    pub available_accesses: i64,
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub steps: Vec<ScenarioStep>,
    pub balances: Vec<ExpectedBalance>,
}

fn id(s: &str) -> TokenId {
    TokenId::new(s)
}

fn at(at: i64, operation: Operation, expect: Expect) -> ScenarioStep {
    ScenarioStep {
        at,
        operation,
        expect,
    }
}

fn ok(operation: Operation) -> ScenarioStep {
    at(FIXTURE_EPOCH, operation, Expect::Ok)
}

fn fails(operation: Operation, kind: ErrorKind) -> ScenarioStep {
    at(FIXTURE_EPOCH, operation, Expect::Fails(kind))
}

fn balance(token_id: &'static str, available_accesses: i64, amount: i64) -> ExpectedBalance {
    ExpectedBalance {
        token_id,
        available_accesses,
        amount,
    }
}

fn issue_root() -> Operation {
    Operation::IssueRoot {
        token_id: id("R"),
        certificate_id: "cert-1".into(),
        owner: "registrar".into(),
    }
}

fn issue_transferable(token_id: &str, amount: i64, monthly_token_quota: i64) -> Operation {
    Operation::IssueTransferable {
        token_id: id(token_id),
        issuer_token_id: id("R"),
        recipient: "dept".into(),
        amount,
        monthly_token_quota,
        expiry_date: 0,
    }
}

fn issue_standard(token_id: &str, issuer: &str, amount: i64, access_quota: i64) -> Operation {
    Operation::IssueStandard {
        token_id: id(token_id),
        issuer_token_id: id(issuer),
        recipient: "student".into(),
        amount,
        access_quota,
        expiry_date: 0,
    }
}

fn consume(token_id: &str) -> Operation {
    Operation::Consume {
        token_id: id(token_id),
    }
}

/// Every canned scenario.
pub fn all_scenarios() -> Vec<Scenario> {
    let mut spend = vec![
        ok(issue_root()),
        ok(issue_transferable("T", 10, 0)),
        ok(issue_standard("S1", "T", 3, 2)),
    ];
    spend.extend((0..6).map(|_| ok(consume("S1"))));
    spend.push(fails(consume("S1"), ErrorKind::InvalidState));
    spend.push(fails(
        Operation::Revoke { token_id: id("S1") },
        ErrorKind::InvalidState,
    ));

    vec![
        Scenario {
            name: "standard issuance debits the transferable issuer",
            steps: vec![
                ok(issue_root()),
                ok(issue_transferable("T", 10, 0)),
                ok(issue_standard("S1", "T", 3, 2)),
            ],
            balances: vec![balance("T", 4, 4), balance("S1", 6, 3)],
        },
        Scenario {
            name: "a standard token is spent after its last access",
            steps: spend,
            balances: vec![balance("S1", 0, 0)],
        },
        Scenario {
            name: "duplicate root issuance is rejected",
            steps: vec![ok(issue_root()), fails(issue_root(), ErrorKind::AlreadyExists)],
            balances: vec![balance("R", 0, 1)],
        },
        Scenario {
            name: "only root tokens issue transferable tokens",
            steps: vec![
                ok(issue_root()),
                ok(issue_transferable("T", 10, 0)),
                fails(
                    Operation::IssueTransferable {
                        token_id: id("T2"),
                        issuer_token_id: id("T"),
                        recipient: "x".into(),
                        amount: 1,
                        monthly_token_quota: 0,
                        expiry_date: 0,
                    },
                    ErrorKind::PermissionDenied,
                ),
                ok(issue_standard("S1", "T", 1, 1)),
                fails(issue_standard("S2", "S1", 1, 1), ErrorKind::PermissionDenied),
            ],
            balances: vec![balance("T", 9, 9)],
        },
        Scenario {
            name: "an overdraw leaves the issuer untouched",
            steps: vec![
                ok(issue_root()),
                ok(issue_transferable("T", 5, 0)),
                fails(issue_standard("S1", "T", 3, 2), ErrorKind::InsufficientBalance),
            ],
            balances: vec![balance("T", 5, 5)],
        },
        Scenario {
            name: "a monthly quota is restored before the first use of a new month",
            steps: vec![
                ok(issue_root()),
                ok(issue_transferable("T", 5, 5)),
                ok(consume("T")),
                ok(consume("T")),
                ok(consume("T")),
                at(NEXT_MONTH + 60, consume("T"), Expect::Ok),
            ],
            balances: vec![balance("T", 4, 4)],
        },
        Scenario {
            name: "an exhausted monthly quota waits for the next month",
            steps: vec![
                ok(issue_root()),
                ok(issue_transferable("T", 1, 1)),
                ok(consume("T")),
                fails(consume("T"), ErrorKind::InsufficientBalance),
                at(NEXT_MONTH, consume("T"), Expect::Ok),
            ],
            balances: vec![balance("T", 0, 0)],
        },
    ]
}

/// Run a scenario on a fresh fixture. Returns the first mismatch.
pub async fn run_scenario(scenario: &Scenario) -> Result<(), String> {
    let fixture = TestFixture::new();

    for (index, step) in scenario.steps.iter().enumerate() {
        fixture.clock.set(step.at);
        let result = fixture.registry.apply(step.operation.clone()).await;

        let actual = match &result {
            Ok(_) => Expect::Ok,
            Err(err) => Expect::Fails(err.kind()),
        };
        if actual != step.expect {
            return Err(format!(
                "step {} ({}): expected {:?}, got {:?}",
                index,
                step.operation.name(),
                step.expect,
                result.err().map(|e| e.to_string()),
            ));
        }
    }

    for expected in &scenario.balances {
        let token = fixture
            .token(expected.token_id)
            .await
            .map_err(|e| format!("{}: {}", expected.token_id, e))?;
        let actual = (token.available_accesses, token.amount);
        if actual != (expected.available_accesses, expected.amount) {
            return Err(format!(
                "{}: expected (available, amount) = ({}, {}), got {:?}",
                expected.token_id, expected.available_accesses, expected.amount, actual
            ));
        }
    }

    Ok(())
}

/// Run every scenario, reporting `(name, passed, detail)` for each.
pub async fn verify_all_scenarios() -> Vec<(String, bool, String)> {
    let mut report = Vec::new();
    for scenario in all_scenarios() {
        let outcome = run_scenario(&scenario).await;
        report.push((
            scenario.name.to_string(),
            outcome.is_ok(),
            outcome.err().unwrap_or_default(),
        ));
    }
    report
}
