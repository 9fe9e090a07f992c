//! Scenario assertions
//!
//! Each check returns the error that names exactly what did not hold.

use crate::common::{Error, Result};
use crate::session::{SessionOutcome, TransferResult};

/// Exit code must be 0
pub fn assert_exit_success(command: &str, outcome: &SessionOutcome) -> Result<()> {
    if outcome.success() {
        Ok(())
    } else {
        Err(Error::SessionFailed {
            command: command.to_string(),
            code: outcome.exit_code,
        })
    }
}

/// Captured output must contain `expected`
pub fn assert_output_contains(outcome: &SessionOutcome, expected: &str) -> Result<()> {
    if outcome.output.contains(expected) {
        Ok(())
    } else {
        Err(Error::OutputMismatch {
            expected: expected.to_string(),
            output: outcome.output.clone(),
        })
    }
}

/// Every requested byte must have been copied
pub fn assert_transferred_exactly(result: &TransferResult) -> Result<()> {
    if result.is_exact() {
        Ok(())
    } else {
        Err(Error::ShortTransfer {
            requested: result.requested,
            copied: result.copied,
        })
    }
}

/// The session that received a payload must exit 0
pub fn assert_transfer_accepted(result: &TransferResult, outcome: &SessionOutcome) -> Result<()> {
    if outcome.success() {
        Ok(())
    } else {
        Err(Error::TransferRejected {
            code: outcome.exit_code,
            copied: result.copied,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(exit_code: Option<i32>, output: &str) -> SessionOutcome {
        SessionOutcome {
            exit_code,
            output: output.to_string(),
        }
    }

    #[test]
    fn test_exit_success() {
        assert!(assert_exit_success("uptime", &outcome(Some(0), "")).is_ok());
        let err = assert_exit_success("uptime", &outcome(Some(127), "")).unwrap_err();
        assert!(matches!(err, Error::SessionFailed { code: Some(127), .. }));
        assert!(assert_exit_success("uptime", &outcome(None, "")).is_err());
    }

    #[test]
    fn test_output_contains() {
        let probe = outcome(Some(0), " 10:00:01 up 3 days,  load average: 0.00, 0.01, 0.05\n");
        assert!(assert_output_contains(&probe, "load average:").is_ok());

        let err = assert_output_contains(&outcome(Some(0), "hello"), "load average:").unwrap_err();
        assert!(err.to_string().contains("load average:"));
    }

    #[test]
    fn test_transferred_exactly() {
        let exact = TransferResult { requested: 10, copied: 10 };
        assert!(assert_transferred_exactly(&exact).is_ok());

        let short = TransferResult { requested: 10, copied: 9 };
        assert!(matches!(
            assert_transferred_exactly(&short),
            Err(Error::ShortTransfer { requested: 10, copied: 9 })
        ));
    }

    #[test]
    fn test_rejected_transfer_keeps_count_but_fails() {
        let exact = TransferResult { requested: 10, copied: 10 };
        let err = assert_transfer_accepted(&exact, &outcome(Some(3), "")).unwrap_err();
        assert!(matches!(err, Error::TransferRejected { code: Some(3), copied: 10 }));
        assert!(assert_transfer_accepted(&exact, &outcome(Some(0), "")).is_ok());
    }
}
