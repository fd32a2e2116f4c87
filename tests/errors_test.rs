#[cfg(test)]
mod error_tests {
    use crabgate::errors::{AcquisitionError, TransitionError, ValidationError, VerifyError};
    use crabgate::Phase;
    use std::error::Error;

    #[test]
    fn test_display_includes_kind_and_detail() {
        let error = VerifyError::Capture("surface unavailable".to_string());
        assert_eq!(error.to_string(), "Capture error: surface unavailable");

        let error = VerifyError::from(AcquisitionError::Busy);
        assert_eq!(
            error.to_string(),
            "Device acquisition error: camera is in use by another application"
        );
    }

    #[test]
    fn test_acquisition_error_is_source() {
        let error = VerifyError::from(AcquisitionError::NoDevice);
        assert!(error.source().is_some());

        let error = VerifyError::Decode("eof".to_string());
        assert!(error.source().is_none());
    }

    #[test]
    fn test_validation_messages_name_the_constraint() {
        let not_image = VerifyError::from(ValidationError::NotAnImage {
            declared_type: "text/plain".to_string(),
        });
        assert!(not_image.to_string().contains("text/plain"));
        assert_eq!(not_image.user_message(), "Please upload an image file.");

        let too_large = VerifyError::from(ValidationError::TooLarge {
            size: 6_291_456,
            limit: 5_242_880,
        });
        assert!(too_large.to_string().contains("6291456"));
        assert!(too_large.user_message().contains("5MB"));
    }

    #[test]
    fn test_rejection_and_fault_messages_differ() {
        let rejected = VerifyError::OutOfRange {
            age: 25,
            min: 13,
            max: 17,
        };
        let fault = VerifyError::Classification("timeout".to_string());
        assert!(rejected.user_message().contains("25"));
        assert!(rejected.user_message().contains("13-17"));
        assert!(!fault.user_message().contains("timeout"));
        assert_ne!(rejected.user_message(), fault.user_message());
    }

    #[test]
    fn test_expected_outcomes() {
        let expected = [
            VerifyError::from(ValidationError::TooLarge { size: 1, limit: 0 }),
            VerifyError::OutOfRange {
                age: 40,
                min: 13,
                max: 17,
            },
        ];
        for error in &expected {
            assert!(error.is_expected(), "{:?}", error);
        }

        let faults = [
            VerifyError::from(AcquisitionError::PermissionDenied),
            VerifyError::Capture("x".to_string()),
            VerifyError::Decode("x".to_string()),
            VerifyError::Classification("x".to_string()),
        ];
        for error in &faults {
            assert!(!error.is_expected(), "{:?}", error);
            assert!(error.is_attachable(), "{:?}", error);
        }
    }

    #[test]
    fn test_transition_error_display() {
        let error = TransitionError::Invalid {
            from: Phase::Idle,
            event: "SubmitRequested",
        };
        assert_eq!(error.to_string(), "cannot apply SubmitRequested while Idle");
        assert_eq!(
            TransitionError::Busy.to_string(),
            "workflow is processing; input ignored"
        );
    }
}
