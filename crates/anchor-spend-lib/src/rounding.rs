use crate::error::AttributionError;
use chrono::{Duration, NaiveTime, ParseError, Timelike};
use std::fmt;
use std::str::FromStr;

/// How raw schedule times are snapped onto the hourly spend grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingMethod {
    /// Start rounded down, end rounded up.
    #[default]
    Method1,
    /// Start and end both rounded up.
    Method2,
    /// Start and end both truncated to the hour.
    Method3,
    /// Start truncated to the hour, end rounded up.
    Method4,
}

impl RoundingMethod {
    pub fn name(&self) -> &'static str {
        match self {
            RoundingMethod::Method1 => "method1",
            RoundingMethod::Method2 => "method2",
            RoundingMethod::Method3 => "method3",
            RoundingMethod::Method4 => "method4",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RoundingMethod::Method1 => "start rounded down, end rounded up",
            RoundingMethod::Method2 => "start and end rounded up",
            RoundingMethod::Method3 => "start and end truncated to the hour",
            RoundingMethod::Method4 => "start truncated to the hour, end rounded up",
        }
    }

    /// Applies the method to an already parsed time.
    pub fn apply(&self, time: NaiveTime, is_end: bool) -> NaiveTime {
        match self {
            RoundingMethod::Method1 if is_end => ceil_hour(time),
            RoundingMethod::Method1 => floor_hour(time),
            RoundingMethod::Method2 => ceil_hour(time),
            RoundingMethod::Method3 => floor_hour(time),
            RoundingMethod::Method4 if is_end => ceil_hour(time),
            RoundingMethod::Method4 => floor_hour(time),
        }
    }
}

impl FromStr for RoundingMethod {
    type Err = AttributionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "method1" => Ok(RoundingMethod::Method1),
            "method2" => Ok(RoundingMethod::Method2),
            "method3" => Ok(RoundingMethod::Method3),
            "method4" => Ok(RoundingMethod::Method4),
            other => Err(AttributionError::Configuration(format!(
                "unsupported time processing method: {other}"
            ))),
        }
    }
}

impl fmt::Display for RoundingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses an `HH:MM` schedule boundary and snaps it with `method`.
///
/// `23:59` and `24:00` both mean the midnight closing the day and come back
/// as `00:00`; the caller moves such an end onto the following date.
pub fn normalize(
    time_str: &str,
    method: RoundingMethod,
    is_end: bool,
) -> Result<NaiveTime, ParseError> {
    let time_str = time_str.trim();
    if time_str == "23:59" || time_str == "24:00" {
        return Ok(NaiveTime::MIN);
    }

    let time = NaiveTime::parse_from_str(time_str, "%H:%M")?;
    Ok(method.apply(time, is_end))
}

fn floor_hour(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), 0, 0).unwrap_or(time)
}

fn ceil_hour(time: NaiveTime) -> NaiveTime {
    if time.minute() == 0 && time.second() == 0 {
        return time;
    }
    // Wraps to 00:00 past 23:00.
    let (rounded, _) = floor_hour(time).overflowing_add_signed(Duration::hours(1));
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_method1_rounds_start_down_and_end_up() {
        assert_eq!(normalize("20:15", RoundingMethod::Method1, false).unwrap(), hm(20, 0));
        assert_eq!(normalize("20:15", RoundingMethod::Method1, true).unwrap(), hm(21, 0));
        assert_eq!(normalize("20:00", RoundingMethod::Method1, true).unwrap(), hm(20, 0));
    }

    #[test]
    fn test_method2_rounds_both_up() {
        assert_eq!(normalize("9:30", RoundingMethod::Method2, false).unwrap(), hm(10, 0));
        assert_eq!(normalize("9:30", RoundingMethod::Method2, true).unwrap(), hm(10, 0));
        assert_eq!(normalize("23:10", RoundingMethod::Method2, false).unwrap(), hm(0, 0));
    }

    #[test]
    fn test_end_of_day_aliases() {
        assert_eq!(normalize("23:59", RoundingMethod::Method2, false).unwrap(), hm(0, 0));
        assert_eq!(normalize("24:00", RoundingMethod::Method1, true).unwrap(), hm(0, 0));
        assert_eq!(normalize(" 24:00 ", RoundingMethod::Method3, true).unwrap(), hm(0, 0));
    }

    #[test]
    fn test_method3_truncates_both() {
        assert_eq!(normalize("20:15", RoundingMethod::Method3, false).unwrap(), hm(20, 0));
        assert_eq!(normalize("20:15", RoundingMethod::Method3, true).unwrap(), hm(20, 0));
        assert_eq!(normalize("20:59", RoundingMethod::Method3, true).unwrap(), hm(20, 0));
    }

    #[test]
    fn test_method4_truncates_start_and_rounds_end_up() {
        assert_eq!(normalize("20:15", RoundingMethod::Method4, false).unwrap(), hm(20, 0));
        assert_eq!(normalize("20:15", RoundingMethod::Method4, true).unwrap(), hm(21, 0));
    }

    #[test]
    fn test_unknown_method_is_configuration_error() {
        let err = "method5".parse::<RoundingMethod>().unwrap_err();
        assert!(matches!(err, AttributionError::Configuration(_)));
        assert_eq!("method3".parse::<RoundingMethod>().unwrap(), RoundingMethod::Method3);
    }

    #[test]
    fn test_unparsable_time() {
        assert!(normalize("8pm", RoundingMethod::Method1, false).is_err());
        assert!(normalize("25:00", RoundingMethod::Method1, false).is_err());
    }
}
