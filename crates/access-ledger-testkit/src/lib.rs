//! # Access Ledger Testkit
//!
//! Testing utilities for the Access Ledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Scenarios**: Canned operation sequences with expected outcomes and balances
//! - **Fault injection**: A ledger wrapper that fails chosen writes
//! - **Generators**: Proptest strategies for property-based testing
//! - **Invariants**: Balance checks every stored token must pass
//! - **Fixtures**: A registry wired to a memory ledger and a manual clock
//!
//! ## Scenarios
//!
//! ```rust,no_run
//! use access_ledger_testkit::scenarios::verify_all_scenarios;
//!
//! async fn check() {
//!     for (name, passed, detail) in verify_all_scenarios().await {
//!         println!("{}: {} {}", name, passed, detail);
//!     }
//! }
//! ```
//!
//! ## Fault Injection
//!
//! ```rust,no_run
//! use access_ledger::{RegistryConfig, TokenRegistry};
//! use access_ledger_core::SystemClock;
//! use access_ledger_store::MemoryLedger;
//! use access_ledger_testkit::FlakyLedger;
//!
//! let ledger = FlakyLedger::new(MemoryLedger::new());
//! ledger.plan().fail_puts_to("S1", 1);
//! let registry = TokenRegistry::new(ledger, SystemClock, RegistryConfig::default());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use access_ledger_testkit::generators::RunParams;
//!
//! proptest! {
//!     #[test]
//!     fn balances_hold(params: RunParams) {
//!         // replay params.steps against a TestFixture
//!     }
//! }
//! ```

pub mod faults;
pub mod fixtures;
pub mod generators;
pub mod invariants;
pub mod scenarios;

pub use faults::{FaultPlan, FlakyLedger};
pub use fixtures::{FixtureRegistry, Hierarchy, TestFixture, FIXTURE_EPOCH};
pub use generators::{RunParams, Step};
pub use invariants::{check_all, check_token};
pub use scenarios::{all_scenarios, run_scenario, verify_all_scenarios, Expect, Scenario};
