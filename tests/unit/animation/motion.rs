use super::*;

fn bob() -> Motion {
    Motion::sine(900.0, 20.0, 0.5)
}

fn sway() -> Motion {
    Motion::sine(0.0, 3.0, 0.8)
}

#[test]
fn sine_hits_baseline_peak_and_trough() {
    let m = bob();
    assert!((m.sample(0.0) - 900.0).abs() < 1e-9);
    // Period is 2 s: quarter period is the peak, three quarters is the trough.
    assert!((m.sample(0.5) - 920.0).abs() < 1e-9);
    assert!((m.sample(1.5) - 880.0).abs() < 1e-9);
    assert!((m.sample(2.0) - 900.0).abs() < 1e-9);
}

#[test]
fn bob_stays_within_bounds_over_twenty_seconds() {
    let m = bob();
    assert_eq!(m.bounds(), (880.0, 920.0));
    for frame in 0..500u32 {
        let t = f64::from(frame) / 25.0;
        let y = m.sample(t);
        assert!((880.0..=920.0).contains(&y), "y({t}) = {y}");
    }
}

#[test]
fn sway_stays_within_three_degrees() {
    let m = sway();
    assert_eq!(m.bounds(), (-3.0, 3.0));
    for frame in 0..500u32 {
        let t = f64::from(frame) / 25.0;
        let a = m.sample(t);
        assert!((-3.0..=3.0).contains(&a), "theta({t}) = {a}");
    }
    // Quarter period of 0.8 Hz.
    assert!((m.sample(0.3125) - 3.0).abs() < 1e-9);
}

#[test]
fn negative_amplitude_bounds_are_ordered() {
    let m = Motion::sine(10.0, -2.0, 1.0);
    assert_eq!(m.bounds(), (8.0, 12.0));
}

#[test]
fn constant_ignores_time() {
    let m = Motion::constant(150.0);
    assert_eq!(m.sample(0.0), 150.0);
    assert_eq!(m.sample(19.96), 150.0);
    assert_eq!(m.bounds(), (150.0, 150.0));
}

#[test]
fn validate_rejects_nan() {
    assert!(Motion::sine(f64::NAN, 1.0, 1.0).validate("y").is_err());
    assert!(bob().validate("y").is_ok());
}

#[test]
fn serde_uses_kind_tag() {
    let v = serde_json::to_value(bob()).unwrap();
    assert_eq!(v["kind"], "sine");
    let back: Motion =
        serde_json::from_value(serde_json::json!({"kind": "sine", "amp": 20.0, "freq_hz": 0.5, "offset": 900.0}))
            .unwrap();
    assert_eq!(back, bob());
}
