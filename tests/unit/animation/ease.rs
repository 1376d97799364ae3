use super::*;

#[test]
fn endpoints_are_stable() {
    for ease in [Ease::Linear, Ease::InOutCubic] {
        assert_eq!(ease.apply(0.0), 0.0);
        assert_eq!(ease.apply(1.0), 1.0);
    }
}

#[test]
fn in_out_cubic_is_monotonic_on_unit_interval() {
    let mut prev = Ease::InOutCubic.apply(0.0);
    for i in 1..=1000 {
        let v = Ease::InOutCubic.apply(f64::from(i) / 1000.0);
        assert!(v >= prev, "not monotonic at {i}");
        prev = v;
    }
}

#[test]
fn in_out_cubic_is_symmetric_around_midpoint() {
    assert!((Ease::InOutCubic.apply(0.5) - 0.5).abs() < 1e-12);
    let a = Ease::InOutCubic.apply(0.2);
    let b = Ease::InOutCubic.apply(0.8);
    assert!((a + b - 1.0).abs() < 1e-12);
    assert!((a - 0.032).abs() < 1e-12);
}

#[test]
fn out_of_range_input_is_clamped() {
    assert_eq!(Ease::InOutCubic.apply(-1.0), 0.0);
    assert_eq!(Ease::InOutCubic.apply(2.0), 1.0);
}
