#![allow(dead_code)]

pub use taskplan_test_utils::{builders, init_tracing, with_timeout};

use taskplan::errors::{ErrorKind, PlanError};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Assert that `result` failed with the given error kind.
pub fn assert_kind<T: std::fmt::Debug>(result: Result<T, PlanError>, kind: ErrorKind) {
    match result {
        Err(err) => assert_eq!(err.kind(), kind, "unexpected error: {err:?}"),
        Ok(v) => panic!("expected {kind:?} error, got Ok({v:?})"),
    }
}
