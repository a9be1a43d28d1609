// ABOUTME: Integration tests for the status classifier.
// ABOUTME: Verifies the live/terminal partition of both vocabularies and drift handling.

use kahu::status::*;

mod deploy_vocabulary {
    use super::*;

    #[test]
    fn live_statuses_block_new_actions() {
        for raw in [
            "queued",
            "pending",
            "scheduling",
            "building",
            "pushing",
            "deploying",
            "validating",
            "rolling_out",
            "in_progress",
        ] {
            assert!(is_live(raw), "{raw} should be live");
            assert!(blocks_new_actions(raw), "{raw} should block");
            assert!(!is_terminal_success(raw));
            assert!(!is_terminal_failure(raw));
        }
    }

    #[test]
    fn terminal_success() {
        for raw in ["success", "succeeded", "deployed"] {
            assert!(is_terminal_success(raw), "{raw}");
            assert!(!is_live(raw));
            assert!(!blocks_new_actions(raw));
        }
    }

    #[test]
    fn terminal_failure() {
        for raw in [
            "failed",
            "error",
            "cancelled",
            "canceled",
            "timed_out",
            "rolled_back",
            "superseded",
        ] {
            assert!(is_terminal_failure(raw), "{raw}");
            assert!(!is_live(raw));
            assert!(!blocks_new_actions(raw));
        }
    }

    #[test]
    fn classification_ignores_case_and_separators() {
        assert!(is_live("Rolling-Out"));
        assert!(is_live("IN PROGRESS"));
        assert!(is_terminal_failure("Timed-Out"));
        assert_eq!(DeployStatus::parse("Rolling-Out"), DeployStatus::RollingOut);
    }

    #[test]
    fn unrecognized_is_neither_live_nor_terminal() {
        let status = DeployStatus::parse("hibernating");
        assert_eq!(status.phase(), Phase::Unrecognized);
        assert!(!status.is_live());
        assert!(!status.is_terminal());
        assert!(!status.blocks_new_actions());
        assert!(!status.is_recognized());
        assert_eq!(status.to_string(), "hibernating");
    }

    #[test]
    fn empty_string_is_unrecognized() {
        assert_eq!(DeployStatus::parse("").phase(), Phase::Unrecognized);
        assert!(!blocks_new_actions(""));
    }

    #[test]
    fn serde_round_trips_through_strings() {
        let status: DeployStatus = serde_json::from_str("\"Deployed\"").unwrap();
        assert_eq!(status, DeployStatus::Success);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"success\"");

        let unknown: DeployStatus = serde_json::from_str("\"Warming\"").unwrap();
        assert_eq!(serde_json::to_string(&unknown).unwrap(), "\"Warming\"");
    }
}

mod rule_deploy_vocabulary {
    use super::*;

    #[test]
    fn partition() {
        for raw in ["queued", "pending", "in_progress", "publishing"] {
            assert!(RuleDeployStatus::parse(raw).is_live(), "{raw}");
        }
        for raw in ["published", "success", "succeeded"] {
            assert!(RuleDeployStatus::parse(raw).is_terminal_success(), "{raw}");
        }
        for raw in ["failed", "error", "cancelled", "canceled"] {
            assert!(RuleDeployStatus::parse(raw).is_terminal_failure(), "{raw}");
        }
    }

    #[test]
    fn deploy_only_statuses_are_unrecognized_for_rules() {
        assert_eq!(
            RuleDeployStatus::parse("building").phase(),
            Phase::Unrecognized
        );
    }
}

mod provisioning {
    use super::*;

    #[test]
    fn early_lifecycle_statuses() {
        for raw in ["provisioning", "Creating", "pending", "initializing"] {
            assert!(is_provisioning(raw), "{raw}");
        }
        for raw in ["running", "stopped", ""] {
            assert!(!is_provisioning(raw), "{raw}");
        }
    }
}
