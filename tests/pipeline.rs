use std::fs;
use std::sync::{Arc, Mutex};

use frame_transformers::execution::{
    CompositeObserver, ExecutionEvent, ExecutionObserver, Pipeline, PipelineOptions, TracingExecutionObserver,
};
use frame_transformers::field_config::ThresholdsConfig;
use frame_transformers::ingestion::frames_from_json_path;
use frame_transformers::transformers::TransformerConfig;
use frame_transformers::types::Value;

fn fixture_pipeline() -> Vec<TransformerConfig> {
    let text = fs::read_to_string("tests/fixtures/pipeline.json").unwrap();
    serde_json::from_str(&text).unwrap()
}

fn dashboard_options() -> PipelineOptions {
    PipelineOptions {
        variables: [("__from", "0"), ("__to", "3000")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        ..Default::default()
    }
}

#[derive(Default)]
struct FailureLog {
    failed: Mutex<Vec<String>>,
}

impl ExecutionObserver for FailureLog {
    fn on_event(&self, event: &ExecutionEvent) {
        if let ExecutionEvent::StageFailed { id, message, .. } = event {
            self.failed.lock().unwrap().push(format!("{id}: {message}"));
        }
    }
}

#[test]
fn fixture_pipeline_runs_end_to_end() {
    let frames = frames_from_json_path("tests/fixtures/config_and_data.json").unwrap();
    let failures = Arc::new(FailureLog::default());
    let observers: Vec<Arc<dyn ExecutionObserver>> = vec![failures.clone(), Arc::new(TracingExecutionObserver)];
    let observer = CompositeObserver::new(observers);
    let pipeline = Pipeline::new(&fixture_pipeline(), dashboard_options()).with_observer(Arc::new(observer));

    let out = pipeline.apply(&frames);

    // The config frame is consumed; the data frame is filtered to the dashboard range.
    assert_eq!(out.len(), 1);
    let frame = &out[0];
    assert_eq!(frame.ref_id.as_deref(), Some("A"));
    assert_eq!(frame.length, 2);
    assert_eq!(frame.display_names(), vec!["CPU", "Time"]);

    let cpu = &frame.fields[0];
    assert_eq!(cpu.values, vec![Value::from(35), Value::from(72)]);
    assert_eq!(cpu.config.max, Some(100.0));
    assert_eq!(cpu.config.min, Some(0.0));
    assert_eq!(cpu.config.unit.as_deref(), Some("percent"));
    let mut expected = ThresholdsConfig::seeded();
    expected.push_step(80.0);
    assert_eq!(cpu.config.thresholds.as_ref(), Some(&expected));

    let failed = failures.failed.lock().unwrap();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].starts_with("notARealTransformer: unknown transformer"));

    let metrics = pipeline.metrics().snapshot();
    assert_eq!(metrics.stages_applied, 3);
    assert_eq!(metrics.stages_skipped, 1);
    assert_eq!(metrics.stages_failed, 1);
    assert_eq!(metrics.frames_in, 2);
    assert_eq!(metrics.frames_out, 1);
}

#[test]
fn strict_construction_reports_the_unknown_stage() {
    let err = Pipeline::try_new(&fixture_pipeline(), PipelineOptions::default())
        .err()
        .unwrap();
    assert_eq!(err.to_string(), "unknown transformer 'notARealTransformer'");
}

#[test]
fn batches_match_sequential_runs() {
    let frames = frames_from_json_path("tests/fixtures/config_and_data.json").unwrap();
    let pipeline = Pipeline::new(
        &fixture_pipeline(),
        PipelineOptions {
            num_threads: Some(3),
            ..dashboard_options()
        },
    );
    let batches = vec![frames.clone(); 12];
    let parallel = pipeline.apply_batches(&batches);
    let sequential: Vec<_> = pipeline.apply_stream(batches.clone()).collect();
    assert_eq!(parallel, sequential);
    assert_eq!(pipeline.metrics().snapshot().runs_finished, 24);
}

#[test]
fn empty_pipeline_is_identity() {
    let frames = frames_from_json_path("tests/fixtures/long_series.json").unwrap();
    let pipeline = Pipeline::new(&[], PipelineOptions::default());
    assert!(pipeline.is_empty());
    assert_eq!(pipeline.apply(&frames), frames);
}
