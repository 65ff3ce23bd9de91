// tests/pipeline_execution_tests.rs
mod common;

use basket::{ContextData, Pipeline, PipelineControl, PipelineError, PipelineResult};
use common::*;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_pipeline_runs_steps_in_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("step1", false), ("step2", false), ("step3", false)]);
  pipeline.on_root("step1", recording_handler("step1"));
  pipeline.on_root("step2", recording_handler("step2"));
  pipeline.on_root("step3", recording_handler("step3"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["step1", "step2", "step3"]);
  assert!(ctx.read().compensated.is_empty());
}

#[tokio::test]
#[serial]
async fn test_stop_halts_without_compensating() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("a", false), ("b", false), ("c", false)]);
  pipeline.on_root("a", recording_handler("a"));
  pipeline.compensate_root("a", recording_compensation("a"));
  pipeline.on_root("b", recording_handler("b"));
  pipeline.on_root("c", recording_handler("c"));

  let ctx = ContextData::new(TestContext {
    should_stop_at: Some("b".to_string()),
    ..Default::default()
  });
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  let guard = ctx.read();
  assert_eq!(guard.steps_executed, vec!["a", "b"]);
  assert!(guard.compensated.is_empty());
}

#[tokio::test]
#[serial]
async fn test_failure_compensates_completed_steps_in_reverse() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("reserve", false),
    ("charge", false),
    ("ship", false),
    ("notify", false),
  ]);
  pipeline.on_root("reserve", recording_handler("reserve"));
  pipeline.compensate_root("reserve", recording_compensation("reserve"));
  pipeline.on_root("charge", recording_handler("charge"));
  pipeline.compensate_root("charge", recording_compensation("charge"));
  pipeline.on_root("ship", failing_handler("ship", "carrier down"));
  pipeline.compensate_root("ship", recording_compensation("ship"));
  pipeline.on_root("notify", recording_handler("notify"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result, Err(TestError::Handler("carrier down".to_string())));
  let guard = ctx.read();
  assert_eq!(guard.steps_executed, vec!["reserve", "charge", "ship"]);
  // The failing step itself is not compensated.
  assert_eq!(guard.compensated, vec!["charge", "reserve"]);
}

#[tokio::test]
#[serial]
async fn test_failed_compensation_reports_both_causes_and_halts() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("first", false), ("second", false), ("third", false)]);
  pipeline.on_root("first", recording_handler("first"));
  pipeline.compensate_root("first", recording_compensation("first"));
  pipeline.on_root("second", recording_handler("second"));
  pipeline.compensate_root("second", |_ctx: ContextData<TestContext>| async move {
    Err::<(), TestError>(TestError::Handler("undo refused".to_string()))
  });
  pipeline.on_root("third", failing_handler("third", "boom"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  match result {
    Err(TestError::Engine(s)) => {
      assert!(s.contains("CompensationFailed"), "{}", s);
      assert!(s.contains("second"), "{}", s);
      assert!(s.contains("boom"), "{}", s);
    }
    other => panic!("Expected CompensationFailed, got {:?}", other),
  }
  // "first" is never compensated once "second" failed to undo.
  assert!(ctx.read().compensated.is_empty());
}

#[tokio::test]
#[serial]
async fn test_non_optional_step_missing_handler_fails() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("ok", false), ("step_with_no_handler", false)]);
  pipeline.on_root("ok", recording_handler("ok"));
  pipeline.compensate_root("ok", recording_compensation("ok"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  match result {
    Err(TestError::Engine(s)) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("step_with_no_handler"));
    }
    other => panic!("Expected HandlerMissing, got {:?}", other),
  }
  assert_eq!(ctx.read().compensated, vec!["ok"]);
}

#[tokio::test]
#[serial]
async fn test_optional_step_without_handler_is_skipped() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("a", false), ("maybe", true), ("b", false)]);
  pipeline.on_root("a", recording_handler("a"));
  pipeline.on_root("b", recording_handler("b"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["a", "b"]);
}

#[tokio::test]
#[serial]
async fn test_step_insertion_and_removal() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("a", false), ("c", false)]);
  pipeline.insert_after_step("a", "b", false);
  pipeline.insert_before_step("a", "pre", true);
  assert_eq!(pipeline.step_names(), vec!["pre", "a", "b", "c"]);

  pipeline.on_root("a", recording_handler("a"));
  pipeline.on_root("b", recording_handler("b"));
  pipeline.on_root("c", recording_handler("c"));
  pipeline.remove_step("b");
  pipeline.remove_step("does_not_exist");
  assert_eq!(pipeline.step_names(), vec!["pre", "a", "c"]);

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["a", "c"]);
}

#[tokio::test]
#[serial]
async fn test_set_optional_turns_missing_handler_into_skip() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("only", false)]);
  pipeline.set_optional("only", true);
  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx).await.unwrap(), PipelineResult::Completed);
}

#[test]
#[should_panic(expected = "already exists")]
fn test_duplicate_step_names_panic() {
  let _ = Pipeline::<TestContext, TestError>::new(&[("dup", false), ("dup", false)]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_with_engine_error_type_accepts_anyhow() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, PipelineError>::new(&[("task", false)]);
  pipeline.on_root("task", |_ctx: ContextData<TestContext>| async move {
    Err::<PipelineControl, anyhow::Error>(anyhow::anyhow!("intentional"))
  });

  let result = pipeline.run(ContextData::new(TestContext::default())).await;
  match result {
    Err(PipelineError::Handler { source }) => assert_eq!(source.to_string(), "intentional"),
    other => panic!("Expected PipelineError::Handler, got {:?}", other),
  }
}
