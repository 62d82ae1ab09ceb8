//! Date and time functions
//!
//! Timestamps are ISO 8601 strings, a few common non-ISO layouts, or unix
//! seconds. Results are strings in [`DEFAULT_FORMAT`] unless the call passes
//! a .NET format string as its last argument.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Timelike, Utc,
};
use serde_json::Value;

use super::datetime_format::{DEFAULT_FORMAT, format_datetime};
use super::timezone::resolve_timezone;
use super::{get_int_arg, get_optional_text_arg, get_text_arg};
use crate::context::EvaluationContext;
use crate::core::error::{ExpressionError, ExpressionResult};
use crate::value_utils::{number_as_f64, value_type_name};

/// Seconds between 0001-01-01 and the unix epoch
const EPOCH_OFFSET_SECONDS: i64 = 62_135_596_800;
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Layouts accepted besides RFC 3339, all read as UTC
const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
];

const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Calendar unit for `addToTime`, `getPastTime` and friends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    fn parse(function: &str, unit: &str) -> ExpressionResult<Self> {
        let unit = match unit.to_ascii_lowercase().trim_end_matches('s') {
            "second" => Self::Second,
            "minute" => Self::Minute,
            "hour" => Self::Hour,
            "day" => Self::Day,
            "week" => Self::Week,
            "month" => Self::Month,
            "year" => Self::Year,
            _ => {
                return Err(ExpressionError::invalid_argument(
                    function,
                    format!("'{}' is not a valid time unit", unit),
                ));
            }
        };
        Ok(unit)
    }
}

fn naive_from_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
        .or_else(|| {
            DATE_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDate::parse_from_str(text, layout).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Read a timestamp argument as a UTC instant
pub(crate) fn parse_timestamp(function: &str, value: &Value) -> ExpressionResult<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let seconds = number_as_f64(n).unwrap_or(f64::NAN);
            let whole = seconds.trunc() as i64;
            let nanos = ((seconds - seconds.trunc()) * 1e9) as u32;
            Utc.timestamp_opt(whole, nanos).single().ok_or_else(|| {
                ExpressionError::invalid_date(format!("{} is not a valid unix timestamp", n))
            })
        }
        Value::String(text) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(text.trim()) {
                return Ok(dt.with_timezone(&Utc));
            }
            naive_from_text(text)
                .map(|naive| Utc.from_utc_datetime(&naive))
                .ok_or_else(|| {
                    ExpressionError::invalid_date(format!("{}: cannot parse '{}'", function, text))
                })
        }
        other => Err(ExpressionError::invalid_argument(
            function,
            format!("expected a timestamp, got {}", value_type_name(other)),
        )),
    }
}

fn timestamp_arg(function: &str, args: &[Value], index: usize) -> ExpressionResult<DateTime<Utc>> {
    parse_timestamp(function, &args[index])
}

fn render(dt: DateTime<Utc>, args: &[Value], format_index: usize) -> Value {
    let format = get_optional_text_arg(args, format_index);
    Value::String(format_datetime(
        &dt.fixed_offset(),
        format.as_deref().unwrap_or(DEFAULT_FORMAT),
    ))
}

fn out_of_range(function: &str) -> ExpressionError {
    ExpressionError::invalid_date(format!("{}: result is out of range", function))
}

fn shift(
    function: &str,
    dt: DateTime<Utc>,
    amount: i64,
    unit: TimeUnit,
) -> ExpressionResult<DateTime<Utc>> {
    let months = |n: i64| u32::try_from(n.unsigned_abs()).ok().map(Months::new);
    let shifted = match unit {
        TimeUnit::Second => Duration::try_seconds(amount).and_then(|d| dt.checked_add_signed(d)),
        TimeUnit::Minute => Duration::try_minutes(amount).and_then(|d| dt.checked_add_signed(d)),
        TimeUnit::Hour => Duration::try_hours(amount).and_then(|d| dt.checked_add_signed(d)),
        TimeUnit::Day => Duration::try_days(amount).and_then(|d| dt.checked_add_signed(d)),
        TimeUnit::Week => Duration::try_weeks(amount).and_then(|d| dt.checked_add_signed(d)),
        TimeUnit::Month | TimeUnit::Year => {
            let count = if unit == TimeUnit::Year {
                amount.checked_mul(12)
            } else {
                Some(amount)
            };
            count.and_then(|n| {
                let step = months(n)?;
                if n >= 0 {
                    dt.checked_add_months(step)
                } else {
                    dt.checked_sub_months(step)
                }
            })
        }
    };
    shifted.ok_or_else(|| out_of_range(function))
}

fn add_unit(function: &str, args: &[Value], unit: TimeUnit) -> ExpressionResult<Value> {
    let dt = timestamp_arg(function, args, 0)?;
    let amount = get_int_arg(function, args, 1, "interval")?;
    Ok(render(shift(function, dt, amount, unit)?, args, 2))
}

/// Add days to a timestamp
pub fn add_days(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    add_unit("addDays", args, TimeUnit::Day)
}

/// Add hours to a timestamp
pub fn add_hours(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    add_unit("addHours", args, TimeUnit::Hour)
}

/// Add minutes to a timestamp
pub fn add_minutes(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    add_unit("addMinutes", args, TimeUnit::Minute)
}

/// Add seconds to a timestamp
pub fn add_seconds(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    add_unit("addSeconds", args, TimeUnit::Second)
}

fn move_by_unit(function: &str, args: &[Value], direction: i64) -> ExpressionResult<Value> {
    let dt = timestamp_arg(function, args, 0)?;
    let amount = get_int_arg(function, args, 1, "interval")?;
    let unit = TimeUnit::parse(function, &get_text_arg(function, args, 2, "timeUnit")?)?;
    let amount = amount
        .checked_mul(direction)
        .ok_or_else(|| out_of_range(function))?;
    Ok(render(shift(function, dt, amount, unit)?, args, 3))
}

/// Add a number of time units to a timestamp
pub fn add_to_time(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    move_by_unit("addToTime", args, 1)
}

/// Subtract a number of time units from a timestamp
pub fn subtract_from_time(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    move_by_unit("subtractFromTime", args, -1)
}

/// Day of the month, 1-based
pub fn day_of_month(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let dt = timestamp_arg("dayOfMonth", args, 0)?;
    Ok(Value::from(dt.day()))
}

/// Day of the week, Sunday = 0
pub fn day_of_week(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let dt = timestamp_arg("dayOfWeek", args, 0)?;
    Ok(Value::from(dt.weekday().num_days_from_sunday()))
}

/// Day of the year, 1-based
pub fn day_of_year(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let dt = timestamp_arg("dayOfYear", args, 0)?;
    Ok(Value::from(dt.ordinal()))
}

/// Month, 1-based
pub fn month(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let dt = timestamp_arg("month", args, 0)?;
    Ok(Value::from(dt.month()))
}

/// Year
pub fn year(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let dt = timestamp_arg("year", args, 0)?;
    Ok(Value::from(dt.year()))
}

/// Date part as `M/d/yyyy`
pub fn date(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let dt = timestamp_arg("date", args, 0)?;
    Ok(Value::String(format_datetime(&dt.fixed_offset(), "M/d/yyyy")))
}

/// Current time from the context clock
pub fn utc_now(args: &[Value], ctx: &EvaluationContext) -> ExpressionResult<Value> {
    Ok(render(ctx.now(), args, 0))
}

/// Reformat a timestamp
pub fn format_date_time(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let dt = timestamp_arg("formatDateTime", args, 0)?;
    Ok(render(dt, args, 1))
}

/// Relative description of the target date seen from the base date
pub fn date_read_back(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let base = timestamp_arg("dateReadBack", args, 0)?;
    let target = timestamp_arg("dateReadBack", args, 1)?;
    let days = (target.date_naive() - base.date_naive()).num_days();

    let text = match days {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        -1 => "yesterday".to_string(),
        2 => "the day after tomorrow".to_string(),
        -2 => "the day before yesterday".to_string(),
        _ => {
            let format = get_optional_text_arg(args, 2);
            format_datetime(&target.fixed_offset(), format.as_deref().unwrap_or("D"))
        }
    };
    Ok(Value::String(text))
}

/// `midnight`, `morning`, `noon`, `afternoon`, `evening` or `night`
pub fn get_time_of_day(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let dt = timestamp_arg("getTimeOfDay", args, 0)?;
    let minutes = dt.hour() * 60 + dt.minute();
    let period = match minutes {
        0 => "midnight",
        1..720 => "morning",
        720 => "noon",
        721..1080 => "afternoon",
        1080..=1320 => "evening",
        _ => "night",
    };
    Ok(Value::String(period.to_string()))
}

fn relative_to_now(
    function: &str,
    args: &[Value],
    ctx: &EvaluationContext,
    direction: i64,
) -> ExpressionResult<Value> {
    let amount = get_int_arg(function, args, 0, "interval")?;
    let unit = TimeUnit::parse(function, &get_text_arg(function, args, 1, "timeUnit")?)?;
    let amount = amount
        .checked_mul(direction)
        .ok_or_else(|| out_of_range(function))?;
    Ok(render(shift(function, ctx.now(), amount, unit)?, args, 2))
}

/// Now minus a number of time units
pub fn get_past_time(args: &[Value], ctx: &EvaluationContext) -> ExpressionResult<Value> {
    relative_to_now("getPastTime", args, ctx, -1)
}

/// Now plus a number of time units
pub fn get_future_time(args: &[Value], ctx: &EvaluationContext) -> ExpressionResult<Value> {
    relative_to_now("getFutureTime", args, ctx, 1)
}

/// Local time in a zone, for a UTC timestamp
pub fn convert_from_utc(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let dt = timestamp_arg("convertFromUTC", args, 0)?;
    let zone = resolve_timezone(&get_text_arg("convertFromUTC", args, 1, "timezone")?)?;
    let local: DateTime<FixedOffset> = dt.with_timezone(&zone).fixed_offset();
    let format = get_optional_text_arg(args, 2);
    Ok(Value::String(format_datetime(
        &local,
        format.as_deref().unwrap_or("yyyy-MM-ddTHH:mm:ss.fffK"),
    )))
}

/// UTC time for a local timestamp in a zone
pub fn convert_to_utc(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let text = get_text_arg("convertToUTC", args, 0, "timestamp")?;
    let zone = resolve_timezone(&get_text_arg("convertToUTC", args, 1, "timezone")?)?;

    // Any offset in the input is ignored: the wall-clock time belongs to `zone`
    let naive = match DateTime::parse_from_rfc3339(text.trim()) {
        Ok(dt) => dt.naive_local(),
        Err(_) => naive_from_text(&text).ok_or_else(|| {
            ExpressionError::invalid_date(format!("convertToUTC: cannot parse '{}'", text))
        })?,
    };
    let local = zone.from_local_datetime(&naive).earliest().ok_or_else(|| {
        ExpressionError::invalid_date(format!("convertToUTC: '{}' does not exist in {}", text, zone))
    })?;
    Ok(render(local.with_timezone(&Utc), args, 2))
}

fn truncate(
    function: &str,
    args: &[Value],
    cut: fn(NaiveDateTime) -> Option<NaiveDateTime>,
) -> ExpressionResult<Value> {
    let dt = timestamp_arg(function, args, 0)?;
    let start = cut(dt.naive_utc()).ok_or_else(|| out_of_range(function))?;
    Ok(render(Utc.from_utc_datetime(&start), args, 1))
}

/// Midnight of the timestamp's day
pub fn start_of_day(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    truncate("startOfDay", args, |dt| Some(dt.date().and_time(NaiveTime::MIN)))
}

/// Start of the timestamp's hour
pub fn start_of_hour(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    truncate("startOfHour", args, |dt| dt.date().and_hms_opt(dt.hour(), 0, 0))
}

/// Midnight of the first day of the timestamp's month
pub fn start_of_month(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    truncate("startOfMonth", args, |dt| {
        dt.date().with_day(1).map(|d| d.and_time(NaiveTime::MIN))
    })
}

/// 100-nanosecond intervals since 0001-01-01T00:00:00Z
pub fn ticks(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let dt = timestamp_arg("ticks", args, 0)?;
    let seconds = dt.timestamp() + EPOCH_OFFSET_SECONDS;
    let ticks = seconds
        .checked_mul(TICKS_PER_SECOND)
        .and_then(|t| t.checked_add(i64::from(dt.timestamp_subsec_nanos() / 100)))
        .ok_or_else(|| out_of_range("ticks"))?;
    Ok(Value::from(ticks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TIMESTAMP: &str = "2018-03-15T13:00:00.000Z";

    fn call(f: fn(&[Value], &EvaluationContext) -> ExpressionResult<Value>, args: &[Value]) -> Value {
        let ctx = EvaluationContext::builder()
            .fixed_time(Utc.with_ymd_and_hms(2018, 3, 15, 13, 0, 0).unwrap())
            .build();
        f(args, &ctx).unwrap()
    }

    #[test]
    fn test_parse_accepts_common_layouts() {
        for text in ["2018-03-15T13:00:00.000Z", "2018/03/15 13:00:00", "03/15/2018 13:00:00", "2018-03-15T13:00:00Z"] {
            let dt = parse_timestamp("t", &json!(text)).unwrap();
            assert_eq!(dt, Utc.with_ymd_and_hms(2018, 3, 15, 13, 0, 0).unwrap(), "{}", text);
        }
        let unix = parse_timestamp("t", &json!(1_521_118_800)).unwrap();
        assert_eq!(unix.to_rfc3339(), "2018-03-15T13:00:00+00:00");
        assert!(parse_timestamp("t", &json!("yesterday-ish")).is_err());
    }

    #[test]
    fn test_add_functions() {
        assert_eq!(call(add_days, &[json!(TIMESTAMP), json!(1)]), json!("2018-03-16T13:00:00.000Z"));
        assert_eq!(call(add_hours, &[json!(TIMESTAMP), json!(1), json!("MM-dd-yy hh-mm")]), json!("03-15-18 02-00"));
        assert_eq!(call(add_seconds, &[json!(TIMESTAMP), json!(-1)]), json!("2018-03-15T12:59:59.000Z"));
    }

    #[test]
    fn test_calendar_units() {
        assert_eq!(call(subtract_from_time, &[json!(TIMESTAMP), json!(1), json!("Month")]), json!("2018-02-15T13:00:00.000Z"));
        assert_eq!(call(subtract_from_time, &[json!(TIMESTAMP), json!(1), json!("Year")]), json!("2017-03-15T13:00:00.000Z"));
        assert_eq!(call(add_to_time, &[json!("2018-01-31T00:00:00Z"), json!(1), json!("Month")]), json!("2018-02-28T00:00:00.000Z"));
        let ctx = EvaluationContext::new();
        assert!(add_to_time(&[json!(TIMESTAMP), json!(1), json!("Fortnight")], &ctx).is_err());
    }

    #[test]
    fn test_parts() {
        assert_eq!(call(day_of_week, &[json!(TIMESTAMP)]), json!(4));
        assert_eq!(call(day_of_year, &[json!(TIMESTAMP)]), json!(74));
        assert_eq!(call(date, &[json!(TIMESTAMP)]), json!("3/15/2018"));
    }

    #[test]
    fn test_time_of_day_boundaries() {
        let cases = [("00:00", "midnight"), ("08:00", "morning"), ("12:00", "noon"), ("13:00", "afternoon"), ("22:00", "evening"), ("23:00", "night")];
        for (time, expected) in cases {
            let ts = format!("2018-03-15T{}:00.000Z", time);
            assert_eq!(call(get_time_of_day, &[json!(ts)]), json!(expected));
        }
    }

    #[test]
    fn test_relative_to_fixed_clock() {
        assert_eq!(call(utc_now, &[]), json!(TIMESTAMP));
        assert_eq!(call(get_past_time, &[json!(1), json!("Day"), json!("MM-dd-yy")]), json!("03-14-18"));
        assert_eq!(call(get_future_time, &[json!(1), json!("Week"), json!("MM-dd-yy")]), json!("03-22-18"));
    }

    #[test]
    fn test_time_zones() {
        assert_eq!(
            call(convert_from_utc, &[json!("2018-01-02T02:00:00.000Z"), json!("Pacific Standard Time"), json!("D")]),
            json!("Monday, January 1, 2018")
        );
        assert_eq!(
            call(convert_to_utc, &[json!("01/01/2018 00:00:00"), json!("Pacific Standard Time")]),
            json!("2018-01-01T08:00:00.000Z")
        );
    }

    #[test]
    fn test_date_read_back() {
        assert_eq!(call(date_read_back, &[json!(TIMESTAMP), json!("2018-03-16T00:00:00Z")]), json!("tomorrow"));
        assert_eq!(call(date_read_back, &[json!(TIMESTAMP), json!("2018-03-14T23:00:00Z")]), json!("yesterday"));
        assert_eq!(call(date_read_back, &[json!(TIMESTAMP), json!("2018-03-20T00:00:00Z")]), json!("Tuesday, March 20, 2018"));
    }

    #[test]
    fn test_start_of_and_ticks() {
        assert_eq!(call(start_of_month, &[json!("2018-03-15T13:30:30.000Z")]), json!("2018-03-01T00:00:00.000Z"));
        assert_eq!(call(ticks, &[json!("2018-01-01T08:00:00.000Z")]), json!(636_503_904_000_000_000_i64));
    }
}
