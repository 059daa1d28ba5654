use linecount_rs::{
    CountingConfig, CountingPipeline, CountingSession, Detection, Error, IdentityTracker,
    ReplayDetector, RunSummary, TrackedObject,
};

/// Gives every detection id 1, the single car in these recordings.
struct SingleCar;

impl IdentityTracker for SingleCar {
    fn update(&mut self, detections: Vec<Detection>) -> Vec<TrackedObject> {
        detections
            .into_iter()
            .map(|d| TrackedObject::new(1, d.label, d.bbox, d.score))
            .collect()
    }
}

const WITH_BROKEN_RECORD: &str = concat!(
    r#"{"frame": 0, "detections": [{"x1": 0, "y1": 100, "x2": 10, "y2": 140, "label": "car"}]}"#,
    "\n",
    "{\"frame\": 1, \"detections\": [oops]}\n",
    r#"{"frame": 2, "detections": [{"x1": 0, "y1": 180, "x2": 10, "y2": 220, "label": "car"}]}"#,
    "\n\n",
);

fn session(text: &str, skip_failed: bool) -> CountingSession<ReplayDetector<&[u8]>, SingleCar> {
    let pipeline = CountingPipeline::new(
        ReplayDetector::from_reader(text.as_bytes()),
        SingleCar,
        &CountingConfig::default(),
        400,
    )
    .unwrap();
    CountingSession::new(pipeline, skip_failed)
}

#[test]
fn test_skipped_frame_is_recorded_and_run_continues() {
    let mut session = session(WITH_BROKEN_RECORD, true);
    session.run_recorded(None, 640, 400).unwrap();

    let summary = session.into_summary();
    assert_eq!(summary.frames, 3);
    assert_eq!(summary.skipped_frames, [1]);
    assert_eq!(summary.crossings.len(), 1);
    assert_eq!(summary.crossings[0].frame_index, 2);
    assert_eq!(summary.crossings[0].center_y, 200);
    assert_eq!(summary.tally.get("car"), Some(1));
    assert_eq!(summary.line.y, 200);
}

#[test]
fn test_broken_record_is_fatal_without_skipping() {
    let mut session = session(WITH_BROKEN_RECORD, false);
    let result = session.run_recorded(None, 640, 400);

    assert!(matches!(result, Err(Error::Replay { line: 2, .. })));
    assert_eq!(session.summary().frames, 2);
    assert!(session.summary().skipped_frames.is_empty());
    assert!(session.summary().crossings.is_empty());
}

#[test]
fn test_run_ends_at_last_recorded_line_or_frame_limit() {
    let text = concat!(
        r#"{"frame": 0, "detections": []}"#,
        "\n",
        r#"{"frame": 4, "detections": [{"x1": 0, "y1": 185, "x2": 10, "y2": 215, "label": "car"}]}"#,
        "\n",
    );

    let mut until_exhausted = session(text, false);
    until_exhausted.run_recorded(None, 0, 400).unwrap();
    assert_eq!(until_exhausted.summary().frames, 5);
    assert_eq!(until_exhausted.summary().tally.get("car"), Some(1));

    let mut limited = session(text, false);
    limited.run_recorded(Some(8), 0, 400).unwrap();
    assert_eq!(limited.summary().frames, 8);
    assert_eq!(limited.pipeline().frames_processed(), 8);

    let mut short = session(text, false);
    short.run_recorded(Some(3), 0, 400).unwrap();
    assert_eq!(short.summary().tally.get("car"), Some(0));
}

#[test]
fn test_summary_json() {
    let mut session = session(WITH_BROKEN_RECORD, true);
    session.run_recorded(None, 640, 400).unwrap();
    let summary = session.into_summary();

    let mut buf = Vec::new();
    summary.to_writer(&mut buf).unwrap();

    let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(json["frames"], 3);
    assert_eq!(json["skipped_frames"], serde_json::json!([1]));
    assert_eq!(json["line"], serde_json::json!({"y": 200, "margin": 10}));
    assert_eq!(
        json["tally"],
        serde_json::json!([{"label": "car", "count": 1}, {"label": "truck", "count": 0}])
    );
    assert_eq!(json["crossings"][0]["track_id"], 1);
    assert_eq!(json["crossings"][0]["label"], "car");

    let back: RunSummary = serde_json::from_slice(&buf).unwrap();
    assert_eq!(back, summary);
}
