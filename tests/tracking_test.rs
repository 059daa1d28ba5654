use linecount_rs::{ByteTracker, Detection, IdentityTracker, TrackerConfig};

#[test]
fn test_basic_tracking() {
    let mut tracker = ByteTracker::new(TrackerConfig::default());

    // Frame 1: tracks created on the first frame are confirmed immediately.
    let tracks1 = tracker.update(vec![Detection::new(100.0, 100.0, 200.0, 200.0, 0.9, "car")]);
    assert_eq!(tracks1.len(), 1);
    let id1 = tracks1[0].track_id;
    assert_eq!(tracks1[0].label, "car");

    // Frame 2: same object moved slightly
    let tracks2 = tracker.update(vec![Detection::new(105.0, 105.0, 205.0, 205.0, 0.9, "car")]);
    assert_eq!(tracks2.len(), 1);
    assert_eq!(tracks2[0].track_id, id1);

    // Frame 3: occluded, low score; recovered by the second association
    let occluded = Detection::new(110.0, 110.0, 210.0, 210.0, 0.2, "car");
    let tracks3 = tracker.update(vec![occluded.clone()]);
    assert_eq!(tracks3.len(), 1);
    assert_eq!(tracks3[0].track_id, id1);
    assert_eq!(tracks3[0].bbox, occluded.bbox);

    // Frame 4: object disappears
    let tracks4 = tracker.update(vec![]);
    assert!(tracks4.is_empty());

    // Frame 5: reappears within the track buffer and keeps its identity
    let reappeared = Detection::new(115.0, 115.0, 215.0, 215.0, 0.9, "car");
    let tracks5 = tracker.update(vec![reappeared.clone()]);
    assert_eq!(tracks5.len(), 1);
    assert_eq!(tracks5[0].track_id, id1);
    assert_eq!(tracks5[0].bbox, reappeared.bbox);
}

#[test]
fn test_distinct_objects_get_distinct_ids() {
    let mut tracker = ByteTracker::default();

    let frame = |dy: f32| {
        vec![
            Detection::new(10.0, 10.0 + dy, 60.0, 60.0 + dy, 0.9, "car"),
            Detection::new(300.0, 10.0 + dy, 380.0, 90.0 + dy, 0.8, "truck"),
        ]
    };

    let first = tracker.update(frame(0.0));
    assert_eq!(first.len(), 2);
    assert_ne!(first[0].track_id, first[1].track_id);

    for step in 1..5 {
        let tracks = tracker.update(frame(step as f32 * 4.0));
        assert_eq!(tracks.len(), 2);
        for track in &tracks {
            let original = first.iter().find(|t| t.track_id == track.track_id).unwrap();
            assert_eq!(original.label, track.label);
        }
    }
}

#[test]
fn test_late_object_needs_second_sighting() {
    let mut tracker = ByteTracker::default();
    tracker.update(vec![]);

    // Tracks born after the first frame are confirmed on their next match.
    let det = || vec![Detection::new(50.0, 50.0, 90.0, 90.0, 0.9, "truck")];
    assert!(tracker.update(det()).is_empty());
    let confirmed = tracker.update(det());
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].label, "truck");
}
