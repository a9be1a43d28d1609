// ABOUTME: Integration tests for type-safe identifiers and validated types.
// ABOUTME: Tests parsing, validation, and display of tracking identities.

use kahu::types::*;

mod id_tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_compare_by_value() {
        assert_eq!(ResourceId::new("svc-1"), ResourceId::new("svc-1"));
        assert_ne!(ResourceId::new("svc-1"), ResourceId::new("svc-2"));
    }

    #[test]
    fn ids_hash_by_value() {
        let set: HashSet<DeployId> = ["d-1", "d-1", "d-2"].into_iter().map(DeployId::new).collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn numeric_ids_deserialize_as_strings() {
        let id: RuleId = serde_json::from_str("17").unwrap();
        assert_eq!(id.as_str(), "17");
        let id: RuleId = serde_json::from_str("\"r-17\"").unwrap();
        assert_eq!(id.into_inner(), "r-17");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&RuleDeployId::new("rd-1")).unwrap();
        assert_eq!(json, "\"rd-1\"");
    }
}

mod environment_tests {
    use super::*;

    #[test]
    fn valid_environments() {
        for name in ["production", "staging", "pr-42", "eu_west.1"] {
            assert_eq!(Environment::new(name).unwrap().as_str(), name);
        }
    }

    #[test]
    fn default_is_production() {
        assert_eq!(Environment::default().as_str(), "production");
    }

    #[test]
    fn empty_is_rejected() {
        assert!(matches!(
            Environment::new("  "),
            Err(EnvironmentError::Empty)
        ));
    }

    #[test]
    fn too_long_is_rejected() {
        assert!(matches!(
            Environment::new(&"e".repeat(64)),
            Err(EnvironmentError::TooLong)
        ));
    }

    #[test]
    fn invalid_char_is_rejected() {
        assert!(matches!(
            Environment::new("prod/eu"),
            Err(EnvironmentError::InvalidChar('/'))
        ));
    }

    #[test]
    fn deserialize_validates() {
        assert!(serde_json::from_str::<Environment>("\"staging\"").is_ok());
        assert!(serde_json::from_str::<Environment>("\"bad env\"").is_err());
    }
}

mod resource_kind_tests {
    use super::*;

    #[test]
    fn surrounding_slashes_are_trimmed() {
        assert_eq!(ResourceKind::new("/services/").unwrap().as_str(), "services");
    }

    #[test]
    fn uppercase_is_rejected() {
        assert!(matches!(
            ResourceKind::new("Services"),
            Err(ResourceKindError::InvalidChar('S'))
        ));
    }

    #[test]
    fn empty_is_rejected() {
        assert!(matches!(
            ResourceKind::new("/"),
            Err(ResourceKindError::Empty)
        ));
    }

    #[test]
    fn parses_from_str() {
        let kind: ResourceKind = "cron-jobs".parse().unwrap();
        assert_eq!(kind.to_string(), "cron-jobs");
    }
}

mod target_tests {
    use super::*;

    #[test]
    fn display_includes_full_identity() {
        let target = Target::service("svc-1", Environment::default());
        assert_eq!(target.to_string(), "services/svc-1@production");
    }

    #[test]
    fn environment_is_part_of_identity() {
        let prod = Target::service("svc-1", Environment::default());
        let staging = Target::service("svc-1", Environment::new("staging").unwrap());
        assert_ne!(prod, staging);
    }

    #[test]
    fn scope_is_part_of_identity() {
        let detail = Target::service("svc-1", Environment::default());
        let list = detail.clone().with_scope(ViewScope::List);
        assert_eq!(detail.scope, ViewScope::Detail);
        assert_ne!(detail, list);
    }
}

mod action_kind_tests {
    use super::*;

    #[test]
    fn endpoint_paths() {
        assert_eq!(ActionKind::Deploy.endpoint_path(), "deploy");
        assert_eq!(ActionKind::PublishRules.endpoint_path(), "rules/publish");
    }

    #[test]
    fn display_and_serde_agree() {
        for kind in [ActionKind::Deploy, ActionKind::PublishRules] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
            assert_eq!(serde_json::from_str::<ActionKind>(&json).unwrap(), kind);
        }
    }
}
