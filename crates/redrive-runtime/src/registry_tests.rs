//! Tests for the queue registry.

use super::*;

fn name(raw: &str) -> QueueName {
    raw.parse().unwrap()
}

fn handle_for(raw: &str) -> QueueHandle {
    QueueHandle::new(format!("memory://us-east-1/000000000000/{}", raw))
}

fn arn_for(raw: &str) -> QueueArn {
    QueueArn::new(format!("arn:aws:sqs:us-east-1:000000000000:{}", raw))
}

fn registry_with(names: &[&str]) -> QueueRegistry {
    let mut registry = QueueRegistry::new();
    for raw in names {
        registry
            .register(name(raw), handle_for(raw), arn_for(raw))
            .unwrap();
    }
    registry
}

// ============================================================================
// Registration
// ============================================================================

mod registration {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let registry = registry_with(&["dead"]);

        assert_eq!(registry.resolve_arn(&name("dead")).unwrap(), &arn_for("dead"));
        assert_eq!(registry.handle(&name("dead")).unwrap(), &handle_for("dead"));
        assert!(registry.contains(&name("dead")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_same_handle_is_idempotent() {
        let mut registry = registry_with(&["main"]);

        let record = registry
            .register(name("main"), handle_for("main"), arn_for("main"))
            .unwrap();

        assert_eq!(record.handle, handle_for("main"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_different_handle_is_duplicate() {
        let mut registry = registry_with(&["main"]);

        let result = registry.register(name("main"), handle_for("elsewhere"), arn_for("main"));

        match result {
            Err(QueueError::DuplicateQueue {
                queue_name,
                existing_handle,
            }) => {
                assert_eq!(queue_name, "main");
                assert_eq!(existing_handle, handle_for("main").to_string());
            }
            other => panic!("Expected DuplicateQueue, got: {:?}", other),
        }
        assert_eq!(registry.handle(&name("main")).unwrap(), &handle_for("main"));
    }

    #[test]
    fn test_re_registration_fills_in_attributes() {
        let mut registry = registry_with(&["main"]);
        assert!(registry.get(&name("main")).unwrap().attributes.is_none());

        let attributes = QueueAttributes::default().with_max_message_size(2048);
        registry
            .register_with_attributes(
                name("main"),
                handle_for("main"),
                arn_for("main"),
                Some(attributes),
            )
            .unwrap();

        assert_eq!(
            registry.get(&name("main")).unwrap().max_message_size(),
            Some(2048)
        );
    }

    #[test]
    fn test_resolve_unknown_queue_fails() {
        let registry = QueueRegistry::new();

        assert!(matches!(
            registry.resolve_arn(&name("missing")),
            Err(QueueError::QueueNotFound { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_removes_queue() {
        let mut registry = registry_with(&["main", "dead"]);

        let removed = registry.unregister(&name("main"));

        assert_eq!(removed.map(|r| r.name), Some(name("main")));
        assert!(matches!(
            registry.resolve_arn(&name("main")),
            Err(QueueError::QueueNotFound { .. })
        ));
        assert!(registry.unregister(&name("main")).is_none());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec![&name("dead")]);
    }
}

// ============================================================================
// Redrive Policies
// ============================================================================

mod redrive {
    use super::*;

    #[test]
    fn test_attach_policy_resolves_target_arn() {
        let mut registry = registry_with(&["dead", "main"]);

        let policy = registry
            .attach_redrive_policy(&name("main"), &name("dead"), 3)
            .unwrap()
            .clone();

        assert_eq!(policy.dead_letter_target_arn, arn_for("dead"));
        assert_eq!(policy.max_receive_count, 3);
        assert_eq!(
            registry.redrive_policy(&name("main")).unwrap(),
            Some(&policy)
        );
    }

    /// attach fails iff the target is unresolved or the count is below 1
    #[test]
    fn test_attach_policy_failure_conditions() {
        for (target_registered, count) in [(true, 0), (true, 1), (true, 10), (false, 0), (false, 3)]
        {
            let mut registry = if target_registered {
                registry_with(&["dead", "main"])
            } else {
                registry_with(&["main"])
            };

            let result = registry.attach_redrive_policy(&name("main"), &name("dead"), count);
            let should_fail = !target_registered || count < 1;

            assert_eq!(
                result.is_err(),
                should_fail,
                "target_registered={} count={}",
                target_registered,
                count
            );
        }
    }

    #[test]
    fn test_invalid_count_reported_before_missing_target() {
        let mut registry = registry_with(&["main"]);

        let result = registry.attach_redrive_policy(&name("main"), &name("dead"), 0);

        assert!(matches!(result, Err(QueueError::InvalidPolicy { .. })));
    }

    #[test]
    fn test_attach_to_unknown_source_fails_without_mutation() {
        let mut registry = registry_with(&["dead"]);

        let result = registry.attach_redrive_policy(&name("main"), &name("dead"), 3);

        assert!(matches!(result, Err(QueueError::QueueNotFound { .. })));
        assert!(!registry.contains(&name("main")));
        assert_eq!(registry.redrive_policy(&name("dead")).unwrap(), None);
    }

    #[test]
    fn test_failed_attach_keeps_previous_policy() {
        let mut registry = registry_with(&["dead", "main"]);
        registry
            .attach_redrive_policy(&name("main"), &name("dead"), 3)
            .unwrap();

        let result = registry.attach_redrive_policy(&name("main"), &name("dead"), 0);

        assert!(result.is_err());
        assert_eq!(
            registry
                .redrive_policy(&name("main"))
                .unwrap()
                .map(|p| p.max_receive_count),
            Some(3)
        );
    }

    #[test]
    fn test_policy_for_does_not_attach() {
        let registry = registry_with(&["dead", "main"]);

        let policy = registry.redrive_policy_for(&name("dead"), 5).unwrap();

        assert_eq!(policy.max_receive_count, 5);
        assert_eq!(registry.redrive_policy(&name("main")).unwrap(), None);
    }

    #[test]
    fn test_dead_letter_sources_and_reverse_lookup() {
        let mut registry = registry_with(&["dead", "main", "other", "plain"]);
        registry
            .attach_redrive_policy(&name("main"), &name("dead"), 3)
            .unwrap();
        registry
            .attach_redrive_policy(&name("other"), &name("dead"), 5)
            .unwrap();

        let sources = registry.dead_letter_sources(&name("dead"));
        assert_eq!(sources, vec![&name("main"), &name("other")]);
        assert!(registry.dead_letter_sources(&name("plain")).is_empty());
        assert!(registry.dead_letter_sources(&name("unknown")).is_empty());

        let found = registry.find_by_arn(&arn_for("dead")).unwrap();
        assert_eq!(found.name, name("dead"));
        assert!(registry.find_by_arn(&arn_for("nowhere")).is_none());
    }

    #[test]
    fn test_attach_updates_known_attributes() {
        let mut registry = QueueRegistry::new();
        registry
            .register(name("dead"), handle_for("dead"), arn_for("dead"))
            .unwrap();
        registry
            .register_with_attributes(
                name("main"),
                handle_for("main"),
                arn_for("main"),
                Some(QueueAttributes::default()),
            )
            .unwrap();

        registry
            .attach_redrive_policy(&name("main"), &name("dead"), 2)
            .unwrap();

        let record = registry.get(&name("main")).unwrap();
        assert_eq!(
            record
                .attributes
                .as_ref()
                .and_then(|a| a.redrive_policy.as_ref())
                .map(|p| p.max_receive_count),
            Some(2)
        );
    }
}
