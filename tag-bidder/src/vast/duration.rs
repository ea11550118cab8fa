//! VAST `<Duration>` parsing.

use std::sync::LazyLock;

use regex::Regex;

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([01]?\d|2[0-3]):([0-5]?\d):([0-5]?\d)(\.(\d{1,3}))?$")
        .expect("duration pattern is valid")
});

/// Parses an `HH:MM:SS` or `HH:MM:SS.mmm` duration into whole seconds.
///
/// Milliseconds are accepted and truncated. Returns `None` for any other form.
///
/// # Examples
///
/// ```
/// use tag_bidder::vast::parse_duration;
///
/// assert_eq!(parse_duration("00:00:30"), Some(30));
/// assert_eq!(parse_duration("01:02:03.500"), Some(3723));
/// assert_eq!(parse_duration("30s"), None);
/// ```
#[must_use]
pub fn parse_duration(value: &str) -> Option<u32> {
    let captures = DURATION.captures(value.trim())?;
    let field = |index: usize| captures.get(index)?.as_str().parse::<u32>().ok();
    Some(field(1)? * 3600 + field(2)? * 60 + field(3)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_durations() {
        assert_eq!(parse_duration("00:00:15"), Some(15));
        assert_eq!(parse_duration("0:1:5"), Some(65));
        assert_eq!(parse_duration("23:59:59"), Some(86_399));
        assert_eq!(parse_duration("00:00:45.038"), Some(45));
        assert_eq!(parse_duration(" 00:00:30 "), Some(30));
    }

    #[test]
    fn test_invalid_durations() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("24:00:00"), None);
        assert_eq!(parse_duration("00:60:00"), None);
        assert_eq!(parse_duration("00:00:30.1234"), None);
        assert_eq!(parse_duration("00:30"), None);
        assert_eq!(parse_duration("abc"), None);
    }
}
