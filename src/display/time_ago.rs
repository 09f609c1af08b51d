const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

/// Human-readable age of an item, given how many seconds ago it was posted.
///
/// Negative ages (clock skew between client and server) read as "just now".
pub fn format_time_ago(seconds: i64) -> String {
    let (count, unit) = match seconds {
        s if s < MINUTE => return "just now".to_string(),
        s if s < HOUR => (s / MINUTE, "minute"),
        s if s < DAY => (s / HOUR, "hour"),
        s if s < MONTH => (s / DAY, "day"),
        s if s < YEAR => (s / MONTH, "month"),
        s => (s / YEAR, "year"),
    };
    let plural = if count == 1 { "" } else { "s" };
    format!("{count} {unit}{plural} ago")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_is_just_now() {
        assert_eq!(format_time_ago(0), "just now");
        assert_eq!(format_time_ago(59), "just now");
        assert_eq!(format_time_ago(-300), "just now");
    }

    #[test]
    fn test_units_and_plurals() {
        assert_eq!(format_time_ago(60), "1 minute ago");
        assert_eq!(format_time_ago(5 * MINUTE + 30), "5 minutes ago");
        assert_eq!(format_time_ago(HOUR), "1 hour ago");
        assert_eq!(format_time_ago(23 * HOUR), "23 hours ago");
        assert_eq!(format_time_ago(2 * DAY), "2 days ago");
        assert_eq!(format_time_ago(MONTH), "1 month ago");
        assert_eq!(format_time_ago(11 * MONTH), "11 months ago");
        assert_eq!(format_time_ago(3 * YEAR), "3 years ago");
    }
}
