//! Process-wide configuration.
//!
//! Validators are an optional safety net and can be disabled globally, e.g.
//! for production deployments that have already exercised their inputs.
//! Converters have no such toggle: they are part of normal value shaping.

use std::sync::atomic::{AtomicBool, Ordering};

static RUN_VALIDATORS: AtomicBool = AtomicBool::new(true);

/// Whether parameter validators run during binding. Defaults to `true`.
pub fn run_validators() -> bool {
    RUN_VALIDATORS.load(Ordering::Relaxed)
}

/// Enable or disable validator execution for the whole process.
pub fn set_run_validators(run: bool) {
    RUN_VALIDATORS.store(run, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validators_run_by_default() {
        assert!(run_validators());
    }
}
