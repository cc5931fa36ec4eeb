//! Platform Integration Tests
//!
//! Tests for domain models, credential handling, token lifecycle, and
//! error handling. Everything here runs without a database.

use std::collections::HashSet;

use chrono::{Duration, Utc};

use td_platform::domain::{
    validate_username, Account, Label, NewTodo, Priority, TodoPatch,
};
use td_platform::error::AppError;
use td_platform::service::{AuthConfig, AuthService, PasswordPolicy, PasswordService};
use td_platform::TsidGenerator;

mod credential_tests {
    use super::*;

    #[test]
    fn test_verify_round_trip() {
        let passwords = PasswordService::default();
        let hash = passwords.hash_password("CorrectHorse1").unwrap();

        assert!(passwords.verify_password("CorrectHorse1", &hash));
        assert!(!passwords.verify_password("CorrectHorse2", &hash));
        assert!(!passwords.verify_password("correcthorse1", &hash));
    }

    #[test]
    fn test_hash_never_echoes_password() {
        let passwords = PasswordService::default();
        let hash = passwords.hash_password("CorrectHorse1").unwrap();
        assert!(!hash.contains("CorrectHorse1"));
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_policy_matrix() {
        let policy = PasswordPolicy::default();

        assert!(policy.validate("SecurePass123").is_ok());
        assert!(policy.validate("Aa345678").is_ok());

        // each missing requirement fails
        assert!(policy.validate("Short1A").is_err());
        assert!(policy.validate("nouppercase123").is_err());
        assert!(policy.validate("NOLOWERCASE123").is_err());
        assert!(policy.validate("NoDigitsAtAll").is_err());
    }
}

mod token_tests {
    use super::*;

    fn auth() -> AuthService {
        AuthService::new(AuthConfig::new("integration-secret", "taskdeck"))
    }

    #[test]
    fn test_valid_immediately_after_issuance() {
        let auth = auth();
        let token = auth.issue_token("john_doe").unwrap();
        assert_eq!(auth.validate_token(&token).unwrap().sub, "john_doe");
    }

    #[test]
    fn test_fails_once_past_expiry() {
        let auth = auth();
        let token = auth
            .issue_token_with_ttl("john_doe", Duration::seconds(-1))
            .unwrap();
        assert!(matches!(
            auth.validate_token(&token),
            Err(AppError::TokenExpired)
        ));
    }

    #[test]
    fn test_configured_ttl_lands_in_exp() {
        let auth = AuthService::new(
            AuthConfig::new("integration-secret", "taskdeck").with_ttl_minutes(5),
        );
        let token = auth.issue_token("john_doe").unwrap();
        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[test]
    fn test_validation_is_stateless_across_instances() {
        // Same secret and issuer: a second service instance validates
        // tokens without shared state.
        let issuing = auth();
        let validating = auth();
        let token = issuing.issue_token("john_doe").unwrap();
        assert!(validating.validate_token(&token).is_ok());
    }
}

mod domain_tests {
    use super::*;

    #[test]
    fn test_account_lifecycle() {
        let mut account = Account::new("john_doe", "$argon2id$stub");
        assert!(account.is_active);
        assert!(!account.is_superuser);

        account.deactivate();
        assert!(!account.is_active);

        account.activate();
        assert!(account.is_active);
    }

    #[test]
    fn test_username_policy() {
        assert!(validate_username("john_doe").is_ok());
        assert!(validate_username("user-42").is_ok());

        assert!(validate_username("abc").is_err());
        assert!(validate_username(&"x".repeat(33)).is_err());
        assert!(validate_username("bad space").is_err());
        assert!(validate_username("bad!char").is_err());
    }

    fn base_todo() -> NewTodo {
        NewTodo {
            title: "Project Plan".to_string(),
            description: None,
            completed: false,
            priority: None,
            deadline: Utc::now().date_naive(),
            labels: vec!["Work".to_string(), "Urgent".to_string()],
            username: "john_doe".to_string(),
        }
    }

    #[test]
    fn test_todo_deadline_today_ok_yesterday_rejected() {
        let today = Utc::now().date_naive();

        assert!(base_todo().into_todo(today).is_ok());

        let mut stale = base_todo();
        stale.deadline = today - Duration::days(1);
        let err = stale.into_todo(today).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert!(err.to_string().contains("deadline"));
    }

    #[test]
    fn test_todo_label_vocabulary() {
        let today = Utc::now().date_naive();

        let valid = base_todo().into_todo(today).unwrap();
        assert_eq!(valid.labels, vec![Label::Work, Label::Urgent]);

        let mut invalid = base_todo();
        invalid.labels = vec!["Invalid".to_string()];
        assert!(invalid.into_todo(today).is_err());
    }

    #[test]
    fn test_partial_update_touches_only_completed_and_updated_at() {
        let today = Utc::now().date_naive();
        let mut todo = base_todo().into_todo(today).unwrap();
        let before = todo.clone();

        let patch = TodoPatch {
            completed: Some(true),
            ..Default::default()
        };
        patch.apply(&mut todo, today).unwrap();

        assert!(todo.completed);
        assert_eq!(todo.id, before.id);
        assert_eq!(todo.title, before.title);
        assert_eq!(todo.priority, before.priority);
        assert_eq!(todo.deadline, before.deadline);
        assert_eq!(todo.labels, before.labels);
        assert_eq!(todo.created_at, before.created_at);
    }

    #[test]
    fn test_priority_defaults_to_medium() {
        let today = Utc::now().date_naive();
        let todo = base_todo().into_todo(today).unwrap();
        assert_eq!(todo.priority, Priority::Medium);
    }
}

mod tsid_tests {
    use super::*;

    #[test]
    fn test_generated_ids_pass_validity_check() {
        for _ in 0..100 {
            assert!(TsidGenerator::is_valid(&TsidGenerator::generate()));
        }
    }

    #[test]
    fn test_uniqueness() {
        let ids: HashSet<String> = (0..1000).map(|_| TsidGenerator::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_time_ordering() {
        let ids: Vec<String> = (0..50)
            .map(|_| {
                let id = TsidGenerator::generate();
                std::thread::sleep(std::time::Duration::from_millis(1));
                id
            })
            .collect();

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted, "ids should sort in creation order");
    }

    #[test]
    fn test_foreign_id_shapes_are_invalid() {
        // ObjectId hex, UUIDs, and arbitrary junk all fail the shape check
        assert!(!TsidGenerator::is_valid("507f1f77bcf86cd799439011"));
        assert!(!TsidGenerator::is_valid("3f0e9a5c-4d4e-4d7e-9c7d-1d2f3a4b5c6d"));
        assert!(!TsidGenerator::is_valid("../../etc/passwd"));
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = AppError::not_found("Todo", "0ABC123DEF456");
        let msg = err.to_string();
        assert!(msg.contains("Todo"));
        assert!(msg.contains("0ABC123DEF456"));
    }

    #[test]
    fn test_duplicate_error() {
        let err = AppError::duplicate("Account", "username", "john_doe");
        let msg = err.to_string();
        assert!(msg.contains("Account"));
        assert!(msg.contains("username"));
        assert!(msg.contains("john_doe"));
    }

    #[test]
    fn test_error_variants_display() {
        let errors = vec![
            AppError::InvalidCredentials,
            AppError::TokenExpired,
            AppError::InvalidToken { message: "malformed".to_string() },
            AppError::validation("title: must be 1 to 100 characters"),
            AppError::unauthorized("Could not validate credentials"),
            AppError::forbidden("Not enough permissions"),
            AppError::internal("unexpected"),
        ];
        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }
}
