//! Human-readable rendering of millisecond durations.

/// Render a duration given in milliseconds.
///
/// - below 1000 ms: whole milliseconds, e.g. `"999 ms"`
/// - below 60000 ms: seconds rounded to two decimals, e.g. `"1.5 s"`
/// - otherwise: minutes rounded to two decimals, e.g. `"1 min"`
///
/// Thresholds are inclusive-exclusive, so exactly 1000 ms renders as
/// seconds and exactly 60000 ms as minutes. Negative or NaN input is
/// treated as zero.
pub fn to_human_readable(duration_ms: f64) -> String {
    let duration_ms = duration_ms.max(0.0);

    if duration_ms < 1000.0 {
        format!("{} ms", duration_ms.trunc() as u64)
    } else if duration_ms < 60_000.0 {
        format!("{} s", round2(duration_ms / 1000.0))
    } else {
        format!("{} min", round2(duration_ms / 60_000.0))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
