//! Human-readable durations for the user-lookup reply.

/// Seconds per unit, largest first.
const UNITS: &[(i64, &str)] = &[
    (31_536_000, "year"),
    (2_592_000, "month"),
    (86_400, "day"),
    (3_600, "hour"),
    (60, "minute"),
    (1, "second"),
];

/// Render an age in seconds using its two largest non-zero units,
/// e.g. "1 year 2 months" or "5 minutes".
pub fn humanize_age(seconds: i64) -> String {
    let mut remaining = seconds.max(0);
    let mut parts = Vec::with_capacity(2);

    for &(unit_secs, name) in UNITS {
        if parts.len() == 2 {
            break;
        }

        let count = remaining / unit_secs;
        if count > 0 {
            let plural = if count == 1 { "" } else { "s" };
            parts.push(format!("{count} {name}{plural}"));
            remaining %= unit_secs;
        }
    }

    if parts.is_empty() {
        "0 seconds".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_negative() {
        assert_eq!(humanize_age(0), "0 seconds");
        assert_eq!(humanize_age(-5), "0 seconds");
    }

    #[test]
    fn single_unit() {
        assert_eq!(humanize_age(1), "1 second");
        assert_eq!(humanize_age(45), "45 seconds");
        assert_eq!(humanize_age(3_600), "1 hour");
    }

    #[test]
    fn two_largest_units_only() {
        assert_eq!(humanize_age(61), "1 minute 1 second");
        assert_eq!(humanize_age(90_061), "1 day 1 hour");
        // Minutes and seconds are dropped once days and hours are present.
        assert_eq!(humanize_age(90_061 + 59), "1 day 1 hour");
    }

    #[test]
    fn years_and_months() {
        assert_eq!(humanize_age(31_536_000 + 2 * 2_592_000), "1 year 2 months");
    }
}
