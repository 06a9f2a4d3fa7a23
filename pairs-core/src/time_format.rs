//! Display formatting for elapsed game time.

/// Render seconds as zero-padded `MM:SS`.
///
/// Minutes do not roll over into hours; values of 100 minutes or more are
/// outside the timer's range and render with a wider minute field.
#[must_use]
pub fn format_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Render milliseconds as `MM:SS`, truncating partial seconds.
#[must_use]
pub fn format_millis(millis: u64) -> String {
    format_time(millis / 1000)
}

/// Parse `MM:SS` back into seconds. Malformed input yields 0.
#[must_use]
pub fn parse_time_to_seconds(text: &str) -> u64 {
    let Some((minutes, seconds)) = text.split_once(':') else {
        return 0;
    };
    if seconds.contains(':') {
        return 0;
    }
    let minutes: u64 = minutes.trim().parse().unwrap_or(0);
    let seconds: u64 = seconds.trim().parse().unwrap_or(0);
    minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .unwrap_or(0)
}

/// Human-readable duration, e.g. `"45 seconds"`, `"2 minutes"`, `"2m 5s"`.
#[must_use]
pub fn readable_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds} second{}", plural(seconds));
    }
    let minutes = seconds / 60;
    let rest = seconds % 60;
    if rest == 0 {
        format!("{minutes} minute{}", plural(minutes))
    } else {
        format!("{minutes}m {rest}s")
    }
}

fn plural(n: u64) -> &'static str {
    if n == 1 { "" } else { "s" }
}
