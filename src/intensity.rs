//! Linear intensity rescaling for display.

/// Map `value` from `[src_min, src_max]` onto `[dst_min, dst_max]`.
///
/// A degenerate source range (`src_max == src_min`) maps every value to
/// `dst_min`, so a uniform slice renders black instead of NaN.
#[inline]
pub fn normalize(value: f64, src_min: f64, src_max: f64, dst_min: f64, dst_max: f64) -> f64 {
    let src_range = src_max - src_min;
    if src_range == 0.0 {
        return dst_min;
    }
    dst_min + (value - src_min) * (dst_max - dst_min) / src_range
}

/// Rescale into `0..=255` and truncate toward zero.
#[inline]
pub fn normalize_to_u8(value: f32, src_min: f32, src_max: f32) -> u8 {
    let scaled = normalize(
        f64::from(value),
        f64::from(src_min),
        f64::from(src_max),
        0.0,
        255.0,
    );
    // NaN saturates to 0 under `as`
    scaled.clamp(0.0, 255.0) as u8
}

/// Minimum and maximum over the finite values, or `None` if there are none.
pub fn finite_range<'a>(values: impl IntoIterator<Item = &'a f32>) -> Option<(f32, f32)> {
    values
        .into_iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
