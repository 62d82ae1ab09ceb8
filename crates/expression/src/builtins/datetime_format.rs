//! .NET-style date and time format strings
//!
//! A single-character format is a standard pattern (`d`, `D`, `o`, `s`, ...)
//! expanded to its custom equivalent. Everything else is a custom pattern
//! made of repeated-letter tokens (`yyyy`, `MM`, `dddd`, `hh`, `fff`, `tt`,
//! `K`, `zzz`). Letters that are not tokens are copied as they are, so
//! `MM-DD-YY` keeps `DD` and `YY` literally.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};

/// Output format used when a function is given no format
pub const DEFAULT_FORMAT: &str = "yyyy-MM-ddTHH:mm:ss.fffZ";

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const DAYS: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

fn standard_pattern(format: &str) -> Option<&'static str> {
    let pattern = match format {
        "d" => "M/d/yyyy",
        "D" => "dddd, MMMM d, yyyy",
        "f" => "dddd, MMMM d, yyyy h:mm tt",
        "F" | "U" => "dddd, MMMM d, yyyy h:mm:ss tt",
        "g" => "M/d/yyyy h:mm tt",
        "G" => "M/d/yyyy h:mm:ss tt",
        "M" | "m" => "MMMM d",
        "o" | "O" => "yyyy-MM-ddTHH:mm:ss.fffffffK",
        "R" | "r" => "ddd, dd MMM yyyy HH:mm:ss 'GMT'",
        "s" => "yyyy-MM-ddTHH:mm:ss",
        "t" => "h:mm tt",
        "T" => "h:mm:ss tt",
        "u" => "yyyy-MM-dd HH:mm:ss'Z'",
        "Y" | "y" => "MMMM yyyy",
        _ => return None,
    };
    Some(pattern)
}

/// Render `dt` with a .NET standard or custom format string
pub fn format_datetime(dt: &DateTime<FixedOffset>, format: &str) -> String {
    let pattern = standard_pattern(format).unwrap_or(format);
    // `%x` forces a lone letter to be read as a custom token
    let pattern = pattern.strip_prefix('%').filter(|p| p.len() == 1).unwrap_or(pattern);

    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                i += 1;
                while i < chars.len() && chars[i] != c {
                    out.push(chars[i]);
                    i += 1;
                }
                i += 1;
                continue;
            }
            '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                }
                i += 2;
                continue;
            }
            '%' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let mut run = 1;
        while chars.get(i + run) == Some(&c) {
            run += 1;
        }

        if !push_token(&mut out, dt, c, run) {
            // Not a token letter: emit the whole run unchanged
            out.extend(std::iter::repeat_n(c, run));
        }
        i += run;
    }

    out
}

fn push_token(out: &mut String, dt: &DateTime<FixedOffset>, c: char, run: usize) -> bool {
    match c {
        'y' => {
            let year = dt.year();
            match run {
                1 => out.push_str(&(year % 100).to_string()),
                2 => out.push_str(&format!("{:02}", year % 100)),
                n => out.push_str(&format!("{:0width$}", year, width = n)),
            }
        }
        'M' => match run {
            1 => out.push_str(&dt.month().to_string()),
            2 => out.push_str(&format!("{:02}", dt.month())),
            3 => out.push_str(&MONTHS[dt.month0() as usize][..3]),
            _ => out.push_str(MONTHS[dt.month0() as usize]),
        },
        'd' => {
            let weekday = DAYS[dt.weekday().num_days_from_sunday() as usize];
            match run {
                1 => out.push_str(&dt.day().to_string()),
                2 => out.push_str(&format!("{:02}", dt.day())),
                3 => out.push_str(&weekday[..3]),
                _ => out.push_str(weekday),
            }
        }
        'h' => {
            let hour = match dt.hour() % 12 {
                0 => 12,
                h => h,
            };
            push_number(out, hour, run);
        }
        'H' => push_number(out, dt.hour(), run),
        'm' => push_number(out, dt.minute(), run),
        's' => push_number(out, dt.second(), run),
        'f' | 'F' => {
            let digits = run.min(7);
            let ticks = format!("{:07}", dt.nanosecond() % 1_000_000_000 / 100);
            let fraction = &ticks[..digits];
            if c == 'F' {
                let trimmed = fraction.trim_end_matches('0');
                if trimmed.is_empty() && out.ends_with('.') {
                    out.pop();
                }
                out.push_str(trimmed);
            } else {
                out.push_str(fraction);
            }
        }
        't' => {
            let designator = if dt.hour() < 12 { "AM" } else { "PM" };
            out.push_str(if run == 1 { &designator[..1] } else { designator });
        }
        'K' => {
            let seconds = dt.offset().local_minus_utc();
            if seconds == 0 {
                out.push('Z');
            } else {
                out.push_str(&offset_text(seconds, true));
            }
        }
        'z' => {
            let seconds = dt.offset().local_minus_utc();
            match run {
                1 => {
                    let sign = if seconds < 0 { '-' } else { '+' };
                    out.push_str(&format!("{}{}", sign, seconds.abs() / 3600));
                }
                2 => out.push_str(&offset_text(seconds, false)),
                _ => out.push_str(&offset_text(seconds, true)),
            }
        }
        'g' => out.push_str("A.D."),
        _ => return false,
    }
    true
}

fn push_number(out: &mut String, value: u32, run: usize) {
    if run == 1 {
        out.push_str(&value.to_string());
    } else {
        out.push_str(&format!("{:02}", value));
    }
}

fn offset_text(seconds: i32, with_minutes: bool) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let seconds = seconds.abs();
    if with_minutes {
        format!("{}{:02}:{:02}", sign, seconds / 3600, seconds % 3600 / 60)
    } else {
        format!("{}{:02}", sign, seconds / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample() -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2018, 3, 15, 13, 4, 5)
            .unwrap()
            .fixed_offset()
    }

    #[test]
    fn test_default_format() {
        assert_eq!(format_datetime(&sample(), DEFAULT_FORMAT), "2018-03-15T13:04:05.000Z");
    }

    #[test]
    fn test_custom_tokens() {
        let dt = sample();
        assert_eq!(format_datetime(&dt, "MM-dd-yy hh-mm"), "03-15-18 01-04");
        assert_eq!(format_datetime(&dt, "ddd, MMM d yyyy h:m:s tt"), "Thu, Mar 15 2018 1:4:5 PM");
        assert_eq!(format_datetime(&dt, "MM-DD-YY"), "03-DD-YY");
        assert_eq!(format_datetime(&dt, "'day' d"), "day 15");
        assert_eq!(format_datetime(&dt, "HH:mm:ss.FFF"), "13:04:05");
    }

    #[test]
    fn test_standard_patterns() {
        let dt = sample();
        assert_eq!(format_datetime(&dt, "D"), "Thursday, March 15, 2018");
        assert_eq!(format_datetime(&dt, "d"), "3/15/2018");
        assert_eq!(format_datetime(&dt, "s"), "2018-03-15T13:04:05");
        assert_eq!(format_datetime(&dt, "%d"), "15");
    }

    #[test]
    fn test_offsets() {
        let pst = FixedOffset::west_opt(8 * 3600).unwrap();
        let dt = sample().with_timezone(&pst);
        assert_eq!(format_datetime(&dt, "HH:mm K"), "05:04 -08:00");
        assert_eq!(format_datetime(&dt, "zz"), "-08");
        assert_eq!(format_datetime(&sample(), "K"), "Z");
    }
}
