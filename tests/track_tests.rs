use approx::assert_abs_diff_eq;
use timeline_engine::{Interpolation, Track, Value, TIME_TOLERANCE};

fn linear(track: &mut Track, time: f64, x: f64) {
    assert!(track.add_keyframe(time, Value::scalar(x), Interpolation::Linear));
}

#[test]
fn times_stay_strictly_increasing_through_mutations() {
    let mut track = Track::new();
    for t in [3.0, 0.5, 2.0, 1.0, 4.0] {
        linear(&mut track, t, t * 10.0);
        assert!(track.is_strictly_sorted());
    }
    assert!(track.update_keyframe_time(0, 2.5));
    assert!(track.is_strictly_sorted());
    assert!(track.remove_keyframe(2.0));
    assert!(track.is_strictly_sorted());
    assert!(track.set_keyframe(0, 9.0, Value::scalar(-1.0), Interpolation::Step));
    assert!(track.is_strictly_sorted());
}

#[test]
fn interpolation_law_midpoint() {
    // With no other keyframes between (t0,v0) and (t1,v1), the sample at the
    // midpoint is the componentwise mean.
    let mut track = Track::new();
    track.add_keyframe(1.0, Value::new(2.0, -8.0, 0.5), Interpolation::Linear);
    track.add_keyframe(3.0, Value::new(6.0, 8.0, 1.5), Interpolation::Linear);

    let mid = track.value_at_time(2.0).unwrap();
    assert_abs_diff_eq!(mid[0], 4.0, epsilon = 1e-12);
    assert_abs_diff_eq!(mid[1], 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(mid[2], 1.0, epsilon = 1e-12);
}

#[test]
fn transform_track_scenario() {
    let mut track = Track::new();
    track.add_keyframe(0.0, Value::new(0.0, 0.0, 0.0), Interpolation::Linear);
    track.add_keyframe(5.0, Value::new(10.0, 0.0, 0.0), Interpolation::Linear);

    let v = track.value_at_time(2.5).unwrap();
    assert_abs_diff_eq!(v[0], 5.0);
    assert_abs_diff_eq!(v[1], 0.0);
    assert_abs_diff_eq!(v[2], 0.0);
}

#[test]
fn move_past_neighbor_changes_sampling_order() {
    // [(0,a),(1,b),(2,c)], move the keyframe at time 1 to time 3:
    // sorted order becomes [(0,a),(2,c),(3,b)].
    let (a, b, c) = (Value::scalar(1.0), Value::scalar(2.0), Value::scalar(3.0));
    let mut track = Track::new();
    track.add_keyframe(0.0, a, Interpolation::Linear);
    track.add_keyframe(1.0, b, Interpolation::Linear);
    track.add_keyframe(2.0, c, Interpolation::Linear);

    let moved = track.find_keyframe_index(1.0, TIME_TOLERANCE).unwrap();
    assert!(track.update_keyframe_time(moved, 3.0));

    assert_eq!(track.times(), &[0.0, 2.0, 3.0]);
    assert_eq!(track.values(), &[a, c, b]);

    // Sampling at 2.5 interpolates between c and b.
    assert_abs_diff_eq!(track.value_at_time(2.5).unwrap()[0], 2.5);
}

#[test]
fn move_onto_existing_keyframe_replaces_it() {
    let mut track = Track::new();
    linear(&mut track, 0.0, 1.0);
    linear(&mut track, 1.0, 2.0);
    linear(&mut track, 2.0, 3.0);

    // Drag the first keyframe exactly onto the second.
    assert!(track.update_keyframe_time(0, 1.0));
    assert_eq!(track.len(), 2);
    assert!(track.is_strictly_sorted());
    assert_eq!(track.times(), &[1.0, 2.0]);
    // The moved keyframe wins, as with the insert overwrite policy.
    let idx = track.find_keyframe_index(1.0, TIME_TOLERANCE).unwrap();
    assert_eq!(track.keyframe(idx).unwrap().value, Value::scalar(1.0));
}

#[test]
fn move_within_tolerance_of_neighbor_replaces_it() {
    let mut track = Track::new();
    linear(&mut track, 0.0, 1.0);
    linear(&mut track, 1.0, 2.0);

    // Landing 0.4 ms away counts as the same time.
    assert!(track.update_keyframe_time(1, 0.0004));
    assert_eq!(track.len(), 1);
    assert!(track.is_strictly_sorted());
    assert_eq!(track.keyframe(0).unwrap().value, Value::scalar(2.0));
}

#[test]
fn set_keyframe_onto_existing_time_replaces_it() {
    let mut track = Track::new();
    linear(&mut track, 0.0, 1.0);
    linear(&mut track, 1.0, 2.0);
    linear(&mut track, 2.0, 3.0);

    assert!(track.set_keyframe(2, 1.0, Value::scalar(9.0), Interpolation::Step));
    assert_eq!(track.len(), 2);
    assert!(track.is_strictly_sorted());
    assert_eq!(track.times(), &[0.0, 1.0]);
    let idx = track.find_keyframe_index(1.0, TIME_TOLERANCE).unwrap();
    assert_eq!(track.keyframe(idx).unwrap().value, Value::scalar(9.0));
    assert_eq!(track.keyframe(idx).unwrap().interpolation, Interpolation::Step);
}

#[test]
fn removal_reduces_count_and_forgets_time() {
    let mut track = Track::new();
    linear(&mut track, 0.0, 0.0);
    linear(&mut track, 1.0, 1.0);
    linear(&mut track, 2.0, 2.0);

    assert!(track.remove_keyframe_by_index(1));
    assert_eq!(track.len(), 2);
    assert_eq!(track.find_keyframe_index(1.0, TIME_TOLERANCE), None);
}

#[test]
fn add_then_sample_returns_the_value() {
    let mut track = Track::new();
    for (t, v) in [(0.0, [1.0, 2.0, 3.0]), (1.3, [0.0, -1.0, 7.0]), (2.6, [9.0, 9.0, 9.0])] {
        track.add_keyframe(t, Value::from(v), Interpolation::Linear);
        let sampled = track.value_at_time(t).unwrap();
        assert_abs_diff_eq!(sampled.max_abs_diff(&Value::from(v)), 0.0, epsilon = 1e-9);
    }
}

#[test]
fn empty_track_never_panics() {
    let track = Track::new();
    assert_eq!(track.value_at_time(0.0), None);
    assert_eq!(track.value_at_time(-1.0), None);
    assert_eq!(track.value_at_time(f64::MAX), None);
    assert_eq!(track.find_keyframe_index(1.0, TIME_TOLERANCE), None);
    assert_eq!(track.keyframe(0), None);
}

#[test]
fn index_resolution_after_resort() {
    let mut track = Track::new();
    linear(&mut track, 0.0, 0.0);
    linear(&mut track, 1.0, 10.0);

    let idx = track.find_keyframe_index(1.0, TIME_TOLERANCE).unwrap();
    assert!(track.update_keyframe_time(idx, 0.5));
    // The old index may now point at a different record; re-resolve by time.
    let idx = track.find_keyframe_index(0.5, TIME_TOLERANCE).unwrap();
    assert_eq!(track.keyframe(idx).unwrap().value, Value::scalar(10.0));
}
