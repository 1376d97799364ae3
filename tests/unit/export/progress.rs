use super::*;

#[test]
fn capture_progress_is_capped() {
    let mut p = ProgressReporter::new(0.9);
    assert_eq!(p.capture(1, 10), Some(0.1));
    assert_eq!(p.capture(9, 10), Some(0.9));
    assert_eq!(p.capture(10, 10), None);
    assert_eq!(p.last(), Some(0.9));
}

#[test]
fn finalize_fills_the_headroom() {
    let mut p = ProgressReporter::new(0.9);
    p.capture(10, 10);
    assert_eq!(p.finalize(0.0), None);
    let mid = p.finalize(0.5).unwrap();
    assert!((mid - 0.95).abs() < 1e-12);
    assert_eq!(p.finalize(1.0), Some(1.0));
    assert_eq!(p.finalize(1.0), None);
}

#[test]
fn values_never_decrease() {
    let mut p = ProgressReporter::new(0.99);
    let mut seen = Vec::new();
    for (done, total) in [(1, 4), (1, 4), (3, 4), (2, 4), (4, 4)] {
        seen.extend(p.capture(done, total));
    }
    seen.extend(p.finalize(f64::NAN));
    seen.extend(p.finalize(1.0));
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(seen.last().copied(), Some(1.0));
}

#[test]
fn empty_exports_report_the_cap() {
    let mut p = ProgressReporter::new(0.99);
    assert_eq!(p.capture(0, 0), Some(0.99));
}
