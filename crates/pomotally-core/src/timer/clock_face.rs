/// Render seconds as `mm:ss`.
///
/// Minutes are zero-padded to two digits and keep growing past 99.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_minutes_and_seconds() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(300), "05:00");
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(1499), "24:59");
    }

    #[test]
    fn long_durations_keep_all_minute_digits() {
        assert_eq!(format_clock(125 * 60 + 7), "125:07");
    }
}
