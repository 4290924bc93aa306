//! Print-time duration parsing.
//!
//! The slicer reports estimated print time as a compound string such as
//! `"2d 3h 45m 30s"`, with any subset of the four components present.
//! Parsing is deliberately lenient: a missing or unreadable component
//! counts as zero, and a completely unmatched string parses as zero hours.
//! This tolerates the partial time strings some slicer profiles emit
//! instead of failing the whole quote.

use std::sync::OnceLock;

use regex::Regex;

const HOURS_PER_DAY: f64 = 24.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const SECONDS_PER_HOUR: f64 = 3600.0;

fn component_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*([dhms])").expect("duration regex is valid"))
}

/// Parse a compound print-time string into fractional hours.
///
/// `"2d 3h 45m 30s"` -> `2*24 + 3 + 45/60 + 30/3600` hours. Unknown text
/// between components is ignored; repeated units accumulate.
pub fn parse_print_time(text: &str) -> f64 {
    let mut hours = 0.0;
    for caps in component_re().captures_iter(text) {
        // Both groups matched by construction; the value fits in u64 for
        // any realistic print time.
        let value: f64 = caps[1].parse().unwrap_or(0.0);
        hours += match &caps[2] {
            "d" => value * HOURS_PER_DAY,
            "h" => value,
            "m" => value / MINUTES_PER_HOUR,
            "s" => value / SECONDS_PER_HOUR,
            _ => 0.0,
        };
    }
    hours
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn full_compound_string() {
        let hours = parse_print_time("2d 3h 45m 30s");
        assert!(close(hours, 2.0 * 24.0 + 3.0 + 45.0 / 60.0 + 30.0 / 3600.0));
    }

    #[test]
    fn hours_and_minutes_only() {
        assert!(close(parse_print_time("5h 30m"), 5.5));
    }

    #[test]
    fn minutes_only() {
        assert!(close(parse_print_time("90m"), 1.5));
    }

    #[test]
    fn seconds_only() {
        assert!(close(parse_print_time("45s"), 45.0 / 3600.0));
    }

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(parse_print_time(""), 0.0);
    }

    #[test]
    fn unmatched_string_is_zero() {
        assert_eq!(parse_print_time("Unknown"), 0.0);
    }

    #[test]
    fn garbage_between_components_ignored() {
        assert!(close(parse_print_time("approx. 1h (plus 30m cooling)"), 1.5));
    }

    #[test]
    fn no_space_between_components() {
        assert!(close(parse_print_time("1h30m"), 1.5));
    }
}
