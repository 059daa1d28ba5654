use linecount_rs::{
    CountingConfig, CountingPipeline, Detection, IdentityTracker, Overlay, ReplayDetector, TrackId,
    TrackedObject,
};

/// Hands out fixed ids in detection order, standing in for a real tracker.
struct ScriptedTracker {
    ids: Vec<u64>,
}

impl IdentityTracker for ScriptedTracker {
    fn update(&mut self, detections: Vec<Detection>) -> Vec<TrackedObject> {
        detections
            .into_iter()
            .zip(&self.ids)
            .map(|(d, &id)| TrackedObject::new(id, d.label, d.bbox, d.score))
            .collect()
    }
}

/// One truck and one car driving down through a 400 px tall frame, plus a pedestrian.
fn replay_lines(frames: u64) -> String {
    (0..frames)
        .map(|f| {
            let car_top = 100.0 + 12.0 * f as f32;
            let truck_top = 60.0 + 9.0 * f as f32;
            format!(
                concat!(
                    r#"{{"frame": {}, "detections": ["#,
                    r#"{{"x1": 300, "y1": {}, "x2": 420, "y2": {}, "score": 0.85, "label": "truck"}},"#,
                    r#"{{"x1": 40, "y1": {}, "x2": 100, "y2": {}, "score": 0.9, "label": "car"}},"#,
                    r#"{{"x1": 500, "y1": 190, "x2": 520, "y2": 230, "score": 0.9, "label": "person"}}"#,
                    "]}}\n"
                ),
                f,
                truck_top,
                truck_top + 80.0,
                car_top,
                car_top + 40.0,
            )
        })
        .collect()
}

#[test]
fn test_replay_through_bytetrack_counts_each_vehicle_once() {
    let text = replay_lines(30);
    let detector = ReplayDetector::from_reader(text.as_bytes());
    let config = CountingConfig::default();
    let mut pipeline = CountingPipeline::from_config(detector, &config, 400).unwrap();

    let mut crossings = Vec::new();
    let mut last_tally = None;
    for _ in 0..30 {
        let report = pipeline.process_frame(&[], 640, 400).unwrap();
        assert!(report.objects.iter().all(|o| o.label != "person"));
        crossings.extend(report.crossings);
        last_tally = Some(report.tally);
    }

    let tally = last_tally.unwrap();
    assert_eq!(tally.get("car"), Some(1));
    assert_eq!(tally.get("truck"), Some(1));
    assert_eq!(crossings.len(), 2);
    assert_ne!(crossings[0].track_id, crossings[1].track_id);
    assert_eq!(tally.overlay_text(), "Total Passed - Car: 1 | Truck: 1");
}

#[test]
fn test_pipeline_is_generic_over_tracker() {
    let text = concat!(
        r#"{"frame": 0, "detections": [{"x1": 0, "y1": 180, "x2": 10, "y2": 220, "label": "car"}, {"x1": 0, "y1": 0, "x2": 10, "y2": 10, "label": "bus"}]}"#,
        "\n",
        r#"{"frame": 1, "detections": [{"x1": 0, "y1": 181, "x2": 10, "y2": 221, "label": "car"}]}"#,
    );
    let config = CountingConfig {
        classes: vec!["car".into()],
        ..CountingConfig::default()
    };
    let tracker = ScriptedTracker { ids: vec![42] };
    let mut pipeline =
        CountingPipeline::new(ReplayDetector::from_reader(text.as_bytes()), tracker, &config, 400)
            .unwrap();

    let first = pipeline.process_frame(&[], 0, 0).unwrap();
    assert_eq!(first.objects.len(), 1);
    assert_eq!(first.crossings[0].track_id, TrackId(42));
    assert_eq!(first.crossings[0].frame_index, 0);

    let second = pipeline.process_frame(&[], 0, 0).unwrap();
    assert!(second.crossings.is_empty());
    assert_eq!(second.tally.get("car"), Some(1));
}

#[test]
fn test_failed_frame_does_not_stop_later_frames() {
    let text = concat!(
        "{\"frame\": 0, \"detections\": [oops]}\n",
        r#"{"frame": 1, "detections": [{"x1": 0, "y1": 190, "x2": 10, "y2": 212, "label": "car"}]}"#,
    );
    let config = CountingConfig::default();
    let tracker = ScriptedTracker { ids: vec![1] };
    let mut pipeline =
        CountingPipeline::new(ReplayDetector::from_reader(text.as_bytes()), tracker, &config, 400)
            .unwrap();

    assert!(pipeline.process_frame(&[], 0, 0).is_err());
    let report = pipeline.process_frame(&[], 0, 0).unwrap();
    assert_eq!(report.frame_index, 1);
    assert_eq!(report.tally.get("car"), Some(1));
}

#[test]
fn test_overlay_from_report() {
    let text = r#"{"frame": 0, "detections": [{"x1": 20, "y1": 100, "x2": 80, "y2": 150, "score": 0.9, "label": "truck"}]}"#;
    let config = CountingConfig::default();
    let mut pipeline = CountingPipeline::from_config(
        ReplayDetector::from_reader(text.as_bytes()),
        &config,
        360,
    )
    .unwrap();

    let report = pipeline.process_frame(&[], 640, 360).unwrap();
    let overlay = Overlay::build(640, &report.objects, pipeline.counter().line(), &report.tally);

    assert_eq!(overlay.boxes.len(), 1);
    assert!(overlay.boxes[0].caption.starts_with("Truck #"));
    assert_eq!(overlay.line.from, (0, 180));
    assert_eq!(overlay.tally_text, "Total Passed - Car: 0 | Truck: 0");
}

#[test]
fn test_count_uses_detected_center_on_fast_object() {
    // Detected centers 41, 66, ..., 191, 216: only the 191 sample lies in (190, 210).
    let text: String = (0..8u64)
        .map(|f| {
            let center = 41.0 + 25.0 * f as f32;
            format!(
                r#"{{"frame": {f}, "detections": [{{"x1": 200, "y1": {}, "x2": 260, "y2": {}, "score": 0.9, "label": "car"}}]}}"#,
                center - 40.0,
                center + 40.0,
            ) + "\n"
        })
        .collect();
    let config = CountingConfig::default();
    let mut pipeline =
        CountingPipeline::from_config(ReplayDetector::from_reader(text.as_bytes()), &config, 400)
            .unwrap();

    let mut centers = Vec::new();
    let mut crossings = Vec::new();
    for _ in 0..8 {
        let report = pipeline.process_frame(&[], 640, 400).unwrap();
        centers.extend(report.objects.iter().map(|o| o.bbox.center_row()));
        crossings.extend(report.crossings);
    }

    assert_eq!(centers, [41, 66, 91, 116, 141, 166, 191, 216]);
    assert_eq!(crossings.len(), 1);
    assert_eq!(crossings[0].frame_index, 6);
    assert_eq!(crossings[0].center_y, 191);
    assert_eq!(pipeline.counter().snapshot().get("car"), Some(1));
}
