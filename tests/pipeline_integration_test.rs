//! End-to-end repair pipeline tests over in-memory collaborators.

mod common;

use std::time::Duration;

use common::{harness, replace_response, test_config, FlakyProbe};

use mender::domain::errors::DomainError;
use mender::domain::models::{AppError, ErrorCategory};

const REFERENCE_ERROR: &str = "ReferenceError: foo is not defined";
const APP_CONTENT: &str = "const bar = 1;\nconsole.log(foo);\n";

#[tokio::test]
async fn clean_fix_succeeds_on_first_attempt() {
    let h = harness(
        APP_CONTENT,
        vec![replace_response(
            "console.log(foo);",
            "console.log(bar);",
            0.9,
        )],
        FlakyProbe::clean(),
        test_config(3, 10),
    )
    .await;

    let result = h
        .pipeline
        .attempt_fix("p1", AppError::new(REFERENCE_ERROR), None, None)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.attempts.len(), 1);
    assert!(!result.attempts[0].outcome.rolled_back);
    assert!(result.final_fix.is_some());
    assert_eq!(result.resolved_error.as_deref(), Some(REFERENCE_ERROR));
    assert_eq!(
        h.store.get("p1").await.unwrap().file_content,
        "const bar = 1;\nconsole.log(bar);\n"
    );
}

#[tokio::test]
async fn mismatched_old_code_is_rejected_before_any_mutation() {
    let h = harness(
        APP_CONTENT,
        vec![replace_response(
            "this code is nowhere in the file",
            "console.log(bar);",
            0.9,
        )],
        FlakyProbe::clean(),
        test_config(1, 10),
    )
    .await;

    let result = h
        .pipeline
        .attempt_fix("p1", AppError::new(REFERENCE_ERROR), None, None)
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.attempts.len(), 1);
    let outcome = &result.attempts[0].outcome;
    assert!(outcome.applied_fix.is_none());
    assert!(outcome
        .failure_reason
        .as_deref()
        .unwrap()
        .contains("not found verbatim"));
    // Nothing mutated.
    assert_eq!(h.store.get("p1").await.unwrap().file_content, APP_CONTENT);
}

#[tokio::test]
async fn runtime_failure_rolls_back_and_enriches_the_next_attempt() {
    // The first application still reproduces the error at runtime; the
    // second probe round is clean.
    let h = harness(
        APP_CONTENT,
        vec![
            replace_response("console.log(foo);", "console.log(baz);", 0.9),
            replace_response("console.log(foo);", "console.log(bar);", 0.9),
        ],
        FlakyProbe::failing_for(2, vec![REFERENCE_ERROR.to_string()]),
        test_config(3, 10),
    )
    .await;

    let result = h
        .pipeline
        .attempt_fix("p1", AppError::new(REFERENCE_ERROR), None, None)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.attempts.len(), 2);
    assert!(!result.attempts[0].success);
    assert!(result.attempts[0].outcome.rolled_back);
    assert!(result.attempts[1].success);

    // The second generation saw what failed and why.
    let prompts = h.service.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("FAILED"));
    assert!(prompts[1].contains("console error"));

    assert_eq!(
        h.store.get("p1").await.unwrap().file_content,
        "const bar = 1;\nconsole.log(bar);\n"
    );
}

#[tokio::test]
async fn exhausted_attempts_end_with_a_category_recommendation() {
    let type_error = "TypeError: value is not assignable to parameter";
    let h = harness(
        APP_CONTENT,
        vec![
            replace_response("console.log(foo);", "console.log(bar);", 0.9),
            replace_response("console.log(foo);", "console.log(baz);", 0.9),
            replace_response("console.log(foo);", "console.log(qux);", 0.9),
        ],
        FlakyProbe::failing_for(u32::MAX, vec![type_error.to_string()]),
        test_config(3, 10),
    )
    .await;

    let result = h
        .pipeline
        .attempt_fix("p1", AppError::new(type_error), None, None)
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.attempts.len(), 3);
    // Exactly one generation call per attempt, none after exhaustion.
    assert_eq!(h.service.calls(), 3);
    assert_eq!(result.unresolved_error.as_deref(), Some(type_error));
    assert_eq!(
        result.recommendation.as_deref(),
        Some(ErrorCategory::Type.suggestion())
    );
    // Every attempt was rolled back; the file is untouched.
    assert_eq!(h.store.get("p1").await.unwrap().file_content, APP_CONTENT);
}

#[tokio::test(start_paused = true)]
async fn no_backoff_sleep_follows_the_final_attempt() {
    let mut config = test_config(2, 10);
    config.engine.backoff_base_ms = 500;
    let h = harness(
        APP_CONTENT,
        vec![
            replace_response("console.log(foo);", "console.log(bar);", 0.9),
            replace_response("console.log(foo);", "console.log(baz);", 0.9),
        ],
        FlakyProbe::failing_for(u32::MAX, vec![REFERENCE_ERROR.to_string()]),
        config,
    )
    .await;

    let started = tokio::time::Instant::now();
    let result = h
        .pipeline
        .attempt_fix("p1", AppError::new(REFERENCE_ERROR), None, None)
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.attempts.len(), 2);
    // Under a paused clock the only time that can pass is backoff sleep:
    // one inter-attempt delay of 500ms * 2^1, and nothing after attempt 2.
    assert_eq!(started.elapsed(), Duration::from_millis(1_000));
}

#[tokio::test]
async fn rate_limited_request_never_reaches_the_fix_service() {
    let h = harness(
        APP_CONTENT,
        vec![replace_response(
            "console.log(foo);",
            "console.log(bar);",
            0.9,
        )],
        FlakyProbe::clean(),
        test_config(3, 1),
    )
    .await;

    let first = h
        .pipeline
        .attempt_fix("p1", AppError::new(REFERENCE_ERROR), None, None)
        .await
        .unwrap();
    assert!(first.success);
    assert_eq!(h.service.calls(), 1);

    let second = h
        .pipeline
        .attempt_fix("p1", AppError::new("another error"), None, None)
        .await;
    match second {
        Err(DomainError::RateLimited {
            key,
            retry_after_secs,
        }) => {
            assert_eq!(key, "p1");
            assert!(retry_after_secs >= 1);
        }
        other => panic!("expected rate limit rejection, got {other:?}"),
    }
    // No generation call was made for the rejected request.
    assert_eq!(h.service.calls(), 1);
}

#[tokio::test]
async fn different_projects_do_not_share_a_rate_limit_window() {
    let h = harness(
        APP_CONTENT,
        vec![
            replace_response("console.log(foo);", "console.log(bar);", 0.9),
            replace_response("console.log(foo);", "console.log(bar);", 0.9),
        ],
        FlakyProbe::clean(),
        test_config(3, 1),
    )
    .await;
    h.store.seed("p2", APP_CONTENT, Default::default()).await;

    h.pipeline
        .attempt_fix("p1", AppError::new(REFERENCE_ERROR), None, None)
        .await
        .unwrap();
    // p1 is now at its cap, but p2 has its own window.
    let result = h
        .pipeline
        .attempt_fix("p2", AppError::new(REFERENCE_ERROR), None, None)
        .await
        .unwrap();
    assert!(result.success);
}
