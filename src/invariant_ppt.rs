//! Runtime workflow invariants with contract-test support
//!
//! The controller asserts its resource invariants after every state change.
//! Each assertion is recorded so that contract tests can prove the checks
//! actually ran on the paths they exercise.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crabgate::invariant_ppt::*;
//!
//! assert_invariant!(
//!     !(camera_bound && image_held),
//!     "Camera and preview are mutually exclusive",
//!     "controller::commit"
//! );
//!
//! #[test]
//! fn contract_capture_flow() {
//!     // ...drive the controller...
//!     contract_test("capture flow", &["Camera and preview are mutually exclusive"]);
//! }
//! ```

use std::cell::RefCell;
use std::collections::HashSet;
use std::thread_local;

/// Camera stream and held image never coexist
pub const CAMERA_PREVIEW_EXCLUSIVE: &str = "Camera and preview are mutually exclusive";
/// A bound stream exists exactly when the phase is CameraActive
pub const CAMERA_MATCHES_PHASE: &str = "Camera handle matches workflow phase";
/// A held image exists exactly when the phase is PreviewReady or Processing
pub const IMAGE_MATCHES_PHASE: &str = "Held image matches workflow phase";
/// No error overlay is attached while processing
pub const NO_ERROR_WHILE_PROCESSING: &str = "No error overlay while processing";

thread_local! {
    static INVARIANT_LOG: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
}

/// Assert an invariant and log it for contract testing.
///
/// # Panics
/// Panics if the condition is false.
#[macro_export]
macro_rules! assert_invariant {
    ($condition:expr, $message:expr) => {
        $crate::invariant_ppt::__assert_invariant_impl($condition, $message, None)
    };
    ($condition:expr, $message:expr, $context:expr) => {
        $crate::invariant_ppt::__assert_invariant_impl($condition, $message, Some($context))
    };
}

#[doc(hidden)]
pub fn __assert_invariant_impl(condition: bool, message: &str, context: Option<&str>) {
    INVARIANT_LOG.with(|log| {
        log.borrow_mut().insert(message.to_string());
    });

    if !condition {
        let ctx = context.unwrap_or("unknown");
        panic!("INVARIANT VIOLATION [{}]: {}", ctx, message);
    }
}

/// Check that specific invariants were verified on this thread.
///
/// # Panics
/// Panics if any required invariant was not checked.
pub fn contract_test(test_name: &str, required_invariants: &[&str]) {
    let log = INVARIANT_LOG.with(|log| log.borrow().clone());

    let missing: Vec<&str> = required_invariants
        .iter()
        .copied()
        .filter(|invariant| !log.contains(*invariant))
        .collect();

    if !missing.is_empty() {
        panic!(
            "CONTRACT FAILURE [{}]: The following invariants were not checked:\n  - {}",
            test_name,
            missing.join("\n  - ")
        );
    }
}

/// Clear this thread's invariant log
pub fn clear_invariant_log() {
    INVARIANT_LOG.with(|log| {
        log.borrow_mut().clear();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_invariant_satisfies_contract() {
        clear_invariant_log();
        assert_invariant!(true, CAMERA_PREVIEW_EXCLUSIVE);
        contract_test("single", &[CAMERA_PREVIEW_EXCLUSIVE]);
    }

    #[test]
    #[should_panic(expected = "CONTRACT FAILURE")]
    fn test_unchecked_invariant_fails_contract() {
        clear_invariant_log();
        contract_test("missing", &[IMAGE_MATCHES_PHASE]);
    }

    #[test]
    #[should_panic(expected = "INVARIANT VIOLATION [unit]")]
    fn test_violation_panics_with_context() {
        assert_invariant!(false, CAMERA_MATCHES_PHASE, "unit");
    }
}
