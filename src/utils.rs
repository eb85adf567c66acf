/// Round to a fixed number of decimals, as the reports present ratios.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Position of a frame in the video, in seconds.
pub fn frame_to_seconds(frame_index: u64, fps: f64) -> f64 {
    if fps <= 0.0 {
        return 0.0;
    }
    frame_index as f64 / fps
}

/// `numerator / max(denominator, 1)` so empty runs report zero instead of NaN.
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    numerator as f64 / denominator.max(1) as f64
}
