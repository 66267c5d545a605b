//! Comprehensive tests for Outcome and Failure.

#[cfg(test)]
mod tests {
    use crate::core::{Failure, FailureKind, Metadata, Outcome, Success};
    use crate::errors::StepflowError;
    use anyhow::Context;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    #[test]
    fn test_ok_has_no_status_and_empty_metadata() {
        let outcome: Outcome = Outcome::ok(json!({"id": 1}));
        assert!(outcome.is_ok());
        assert!(!outcome.is_err());
        assert_eq!(outcome.status(), None);

        let Outcome::Ok(success) = outcome else {
            panic!("expected success");
        };
        assert!(success.metadata.is_empty());
    }

    #[test]
    fn test_ok_with_status() {
        let outcome: Outcome = Outcome::ok_with_status(json!(null), 201);
        assert_eq!(outcome.status(), Some(201));
    }

    #[test]
    fn test_ok_with_metadata_and_status() {
        let meta = Metadata::new().header("X-Total", "3");
        let outcome: Outcome = Outcome::ok_with(json!([]), meta.clone(), 206);

        assert_eq!(
            outcome,
            Outcome::Ok(Success {
                data: json!([]),
                metadata: meta,
                status: Some(206),
            })
        );
    }

    #[test]
    fn test_named_constructors() {
        let cases: Vec<(Outcome, u16, &str)> = vec![
            (Outcome::bad_request("m"), 400, "BadRequest"),
            (Outcome::unauthorized("m"), 401, "Unauthorized"),
            (Outcome::forbidden("m"), 403, "Forbidden"),
            (Outcome::not_found("m"), 404, "NotFound"),
            (Outcome::internal_error("m"), 500, "InternalError"),
            (Outcome::validation_error("m"), 400, "ValidationError"),
        ];

        for (outcome, status, name) in cases {
            let failure = outcome.failure().unwrap();
            assert_eq!(failure.status, status);
            assert_eq!(failure.name.as_deref(), Some(name));
            assert_eq!(failure.message, "m");
        }
    }

    #[test]
    fn test_timeout_outcome() {
        let outcome: Outcome = Outcome::timeout();
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.status, 408);
        assert_eq!(failure.message, "Request timeout");
    }

    #[test]
    fn test_plain_err_has_no_name_but_display_name_falls_back() {
        let outcome: Outcome = Outcome::err("nope", 403);
        let failure = outcome.failure().unwrap();
        assert!(failure.name.is_none());
        assert_eq!(failure.display_name(), "Forbidden");
    }

    #[test]
    fn test_from_error_defaults_to_500() {
        let error = anyhow::anyhow!("database unreachable");
        let failure = Failure::from_error(&error, None);

        assert_eq!(failure.status, 500);
        assert_eq!(failure.message, "database unreachable");
        assert!(failure.stack.as_deref().unwrap().contains("database unreachable"));
    }

    #[test]
    fn test_from_error_prefers_override() {
        let error: anyhow::Error = Failure::of_kind(FailureKind::NotFound, "gone").into();
        let failure = Failure::from_error(&error, Some(410));
        assert_eq!(failure.status, 410);
        assert_eq!(failure.name.as_deref(), Some("Error"));
    }

    #[test]
    fn test_from_error_override_renames_failure() {
        let error: anyhow::Error = Failure::of_kind(FailureKind::NotFound, "gone").into();
        let failure = Failure::from_error(&error, Some(400));
        assert_eq!(failure.status, 400);
        assert_eq!(failure.name.as_deref(), Some("BadRequest"));

        let error = anyhow::anyhow!("quota exceeded");
        let failure = Failure::from_error(&error, Some(403));
        assert_eq!(failure.status, 403);
        assert_eq!(failure.name.as_deref(), Some("Forbidden"));
    }

    #[test]
    fn test_from_error_override_matching_status_keeps_name() {
        let error: anyhow::Error = Failure::of_kind(FailureKind::Validation, "bad email").into();
        let failure = Failure::from_error(&error, Some(400));
        assert_eq!(failure.status, 400);
        assert_eq!(failure.name.as_deref(), Some("ValidationError"));
    }

    #[test]
    fn test_from_error_uses_carried_status_through_context() {
        let error = Err::<(), _>(Failure::of_kind(FailureKind::Forbidden, "not yours"))
            .context("loading task")
            .unwrap_err();
        let failure = Failure::from_error(&error, None);

        assert_eq!(failure.status, 403);
        assert_eq!(failure.message, "loading task");
        assert!(failure.stack.as_deref().unwrap().contains("not yours"));
    }

    #[test]
    fn test_from_error_reads_stepflow_error_status() {
        let error: anyhow::Error = StepflowError::InvalidBody("trailing comma".into()).into();
        let failure = Failure::from_error(&error, None);
        assert_eq!(failure.status, 400);
        assert_eq!(failure.name.as_deref(), Some("BadRequest"));
    }

    #[test]
    fn test_from_panic_payloads() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        let failure = Failure::from_panic("explode", boxed.as_ref());
        assert_eq!(failure.status, 500);
        assert_eq!(failure.message, "boom");
        assert_eq!(failure.name.as_deref(), Some("PipelineError"));
        assert_eq!(failure.stack.as_deref(), Some("Pipeline step: explode"));

        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(Failure::from_panic("x", owned.as_ref()).message, "owned boom");
    }

    #[test]
    fn test_map_keeps_metadata_and_status() {
        let outcome: Outcome<i32> = Outcome::ok_with(2, Metadata::new().with("k", json!(1)), 202);
        let mapped = outcome.map(|n| n * 10);

        let success = mapped.into_result().unwrap();
        assert_eq!(success.data, 20);
        assert_eq!(success.status, Some(202));
        assert_eq!(success.metadata.get("k"), Some(&json!(1)));
    }

    #[test]
    fn test_into_json() {
        #[derive(serde::Serialize)]
        struct Task {
            title: String,
        }

        let outcome = Outcome::ok(Task {
            title: "write docs".into(),
        })
        .into_json();
        assert_eq!(outcome.data(), Some(&json!({"title": "write docs"})));
    }

    #[test]
    fn test_failure_converts_into_outcome() {
        let outcome: Outcome<Value> = Failure::internal("x").into();
        assert!(outcome.is_err());
    }
}
