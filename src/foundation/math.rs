pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Hermite smoothstep of `t` between `edge0` and `edge1`.
pub(crate) fn smoothstep(edge0: f64, edge1: f64, t: f64) -> f64 {
    if edge1 <= edge0 {
        return if t < edge0 { 0.0 } else { 1.0 };
    }
    let x = ((t - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

/// Linear blend of two straight-alpha RGBA8 colors.
pub(crate) fn lerp_rgba8(a: [u8; 4], b: [u8; 4], t: f64) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    let mut out = [0u8; 4];
    for i in 0..4 {
        let v = f64::from(a[i]) + (f64::from(b[i]) - f64::from(a[i])) * t;
        out[i] = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
