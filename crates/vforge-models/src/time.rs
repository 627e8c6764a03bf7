//! Seconds formatting and frame-precision constants.

/// Frame rate assumed for frame-granularity math when a file has not
/// been probed for its real rate.
pub const DEFAULT_FPS: f64 = 30.0;

/// One video frame at [`DEFAULT_FPS`], used as the tolerance for
/// duration comparisons.
pub const FRAME_EPSILON: f64 = 1.0 / DEFAULT_FPS;

/// Format seconds into HH:MM:SS or HH:MM:SS.mmm string.
pub fn format_seconds(total_secs: f64) -> String {
    let hours = (total_secs / 3600.0).floor() as u32;
    let mins = ((total_secs % 3600.0) / 60.0).floor() as u32;
    let secs = total_secs % 60.0;

    // Include milliseconds if present
    if (secs - secs.floor()).abs() > 0.0001 {
        format!("{:02}:{:02}:{:06.3}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, mins, secs.floor() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_whole_seconds() {
        assert_eq!(format_seconds(0.0), "00:00:00");
        assert_eq!(format_seconds(90.0), "00:01:30");
        assert_eq!(format_seconds(3661.0), "01:01:01");
    }

    #[test]
    fn test_format_fractional_seconds() {
        assert_eq!(format_seconds(39.5), "00:00:39.500");
    }
}
