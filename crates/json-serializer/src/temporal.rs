//! ISO-8601 text forms for date and time types.
//!
//! | Type | Example |
//! |---|---|
//! | `chrono::NaiveDate` | `"2023-11-28"` |
//! | `chrono::NaiveDateTime` | `"2023-11-28T22:15:30"` |
//! | `chrono::DateTime<Utc>` | `"2023-11-28T22:15:30.123Z"` |
//! | `std::time::Duration` | `"PT10H30M5.52S"` |
//! | [`Period`] | `"P1Y2M3D"` |
//!
//! All of them are written as JSON strings.

use crate::descriptor::{PrimitiveKind, TypeDescriptor};
use crate::error::{EncodeError, TemporalParseError, TypeMismatchError};
use crate::mapper::{DecodeContext, EncodeContext, Mapped};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use std::fmt::{self, Write as _};
use std::str::FromStr;
use std::time::Duration;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const SECONDS_PER_DAY: u64 = 86_400;

/// A calendar amount of years, months, and days, such as `P1Y2M3D`.
///
/// Unlike [`Duration`] the components are kept separately; a month is not a
/// fixed number of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Period {
    pub years: i32,
    pub months: i32,
    pub days: i32,
}

impl Period {
    pub fn new(years: i32, months: i32, days: i32) -> Self {
        Self {
            years,
            months,
            days,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Zero components are left out; the zero period is `P0D`.
impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("P0D");
        }
        f.write_str("P")?;
        if self.years != 0 {
            write!(f, "{}Y", self.years)?;
        }
        if self.months != 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.days != 0 {
            write!(f, "{}D", self.days)?;
        }
        Ok(())
    }
}

/// Accepts `PnYnMnWnD` with any subset of components in that order, each
/// optionally signed, plus an optional leading sign that negates the whole
/// period. Weeks are folded into days.
impl FromStr for Period {
    type Err = TemporalParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let err = || TemporalParseError::new("period", input);
        let upper = input.to_ascii_uppercase();
        let (negate, body) = match upper.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, upper.strip_prefix('+').unwrap_or(&upper)),
        };
        let mut rest = body.strip_prefix('P').ok_or_else(err)?;
        if rest.is_empty() {
            return Err(err());
        }

        let mut period = Period::default();
        for unit in ['Y', 'M', 'W', 'D'] {
            let Some(idx) = rest.find(unit) else {
                continue;
            };
            let amount = parse_signed(&rest[..idx]).ok_or_else(err)?;
            rest = &rest[idx + 1..];
            match unit {
                'Y' => period.years = amount,
                'M' => period.months = amount,
                'W' => {
                    period.days = amount
                        .checked_mul(7)
                        .and_then(|d| d.checked_add(period.days))
                        .ok_or_else(err)?
                }
                _ => period.days = period.days.checked_add(amount).ok_or_else(err)?,
            }
        }
        if !rest.is_empty() {
            return Err(err());
        }

        if negate {
            period = Period {
                years: period.years.checked_neg().ok_or_else(err)?,
                months: period.months.checked_neg().ok_or_else(err)?,
                days: period.days.checked_neg().ok_or_else(err)?,
            };
        }
        Ok(period)
    }
}

fn parse_signed(digits: &str) -> Option<i32> {
    let unsigned = digits
        .strip_prefix(['-', '+'])
        .unwrap_or(digits);
    if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn parse_unsigned(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Render a duration as `PT#H#M#S`, leaving out zero components.
///
/// Hours are not folded into days, so two days is `PT48H`. The fraction keeps
/// only significant digits; the zero duration is `PT0S`.
pub fn format_iso_duration(duration: &Duration) -> String {
    let total = duration.as_secs();
    let nanos = duration.subsec_nanos();
    if total == 0 && nanos == 0 {
        return "PT0S".to_owned();
    }

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut out = String::from("PT");
    if hours > 0 {
        let _ = write!(out, "{hours}H");
    }
    if minutes > 0 {
        let _ = write!(out, "{minutes}M");
    }
    if seconds > 0 || nanos > 0 {
        let _ = write!(out, "{seconds}");
        if nanos > 0 {
            let fraction = format!("{nanos:09}");
            out.push('.');
            out.push_str(fraction.trim_end_matches('0'));
        }
        out.push('S');
    }
    out
}

/// Parse `PnDTnHnMn.nS`. Every component is optional but at least one must be
/// present; only seconds take a fraction (up to nanosecond precision).
/// Negative durations are rejected.
pub fn parse_iso_duration(input: &str) -> Result<Duration, TemporalParseError> {
    let err = || TemporalParseError::new("duration", input);
    let upper = input.to_ascii_uppercase();
    let rest = upper.strip_prefix('P').ok_or_else(err)?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };

    let mut seconds: u64 = 0;
    let mut nanos: u32 = 0;
    let mut seen = false;

    if !date_part.is_empty() {
        let days = date_part.strip_suffix('D').ok_or_else(err)?;
        seconds = parse_unsigned(days)
            .and_then(|d| d.checked_mul(SECONDS_PER_DAY))
            .ok_or_else(err)?;
        seen = true;
    }

    if let Some(time) = time_part {
        if time.is_empty() {
            return Err(err());
        }
        let mut remaining = time;
        for (unit, scale) in [('H', 3600u64), ('M', 60), ('S', 1)] {
            let Some(idx) = remaining.find(unit) else {
                continue;
            };
            let amount = &remaining[..idx];
            remaining = &remaining[idx + 1..];
            let whole = if unit == 'S' {
                let (whole, fraction) = match amount.split_once('.') {
                    Some((whole, fraction)) => (whole, Some(fraction)),
                    None => (amount, None),
                };
                if let Some(fraction) = fraction {
                    nanos = parse_fraction(fraction).ok_or_else(err)?;
                }
                whole
            } else {
                amount
            };
            seconds = parse_unsigned(whole)
                .and_then(|n| n.checked_mul(scale))
                .and_then(|n| n.checked_add(seconds))
                .ok_or_else(err)?;
            seen = true;
        }
        if !remaining.is_empty() {
            return Err(err());
        }
    }

    if !seen {
        return Err(err());
    }
    Ok(Duration::new(seconds, nanos))
}

/// One to nine digits after the decimal point, as nanoseconds.
fn parse_fraction(digits: &str) -> Option<u32> {
    if digits.is_empty() || digits.len() > 9 {
        return None;
    }
    let value = parse_unsigned(digits)?;
    let scale = 10u64.pow(9 - digits.len() as u32);
    u32::try_from(value * scale).ok()
}

/// Read a string and hand it to `parse`, turning any failure into a mismatch.
fn from_text<T, E: fmt::Display>(
    value: &Value,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Result<T, TypeMismatchError> {
    let text = value
        .as_str()
        .ok_or_else(|| TypeMismatchError::expected("string", value))?;
    parse(text).map_err(|e| TypeMismatchError::invalid(e.to_string()))
}

impl Mapped for NaiveDate {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive::<Self>(PrimitiveKind::Formatted("ISO-8601 date"))
    }

    fn to_value(&self, _cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        Ok(Value::String(self.format(DATE_FORMAT).to_string()))
    }

    fn from_value(value: &Value, _cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        from_text(value, |s| {
            NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| TemporalParseError::new("date", s))
        })
    }
}

/// Fractional seconds are written only when present, in groups of three
/// digits.
impl Mapped for NaiveDateTime {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive::<Self>(PrimitiveKind::Formatted("ISO-8601 local date-time"))
    }

    fn to_value(&self, _cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        Ok(Value::String(self.format(DATE_TIME_FORMAT).to_string()))
    }

    fn from_value(value: &Value, _cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        from_text(value, |s| {
            NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
                .map_err(|_| TemporalParseError::new("local date-time", s))
        })
    }
}

/// Written in UTC with a `Z` suffix; any RFC 3339 offset is accepted on input.
impl Mapped for DateTime<Utc> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive::<Self>(PrimitiveKind::Formatted("RFC 3339 instant"))
    }

    fn to_value(&self, _cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        Ok(Value::String(self.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
    }

    fn from_value(value: &Value, _cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        from_text(value, |s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| TemporalParseError::new("instant", s))
        })
    }
}

impl Mapped for Duration {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive::<Self>(PrimitiveKind::Formatted("ISO-8601 duration"))
    }

    fn to_value(&self, _cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        Ok(Value::String(format_iso_duration(self)))
    }

    fn from_value(value: &Value, _cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        from_text(value, parse_iso_duration)
    }
}

impl Mapped for Period {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive::<Self>(PrimitiveKind::Formatted("ISO-8601 period"))
    }

    fn to_value(&self, _cx: &mut EncodeContext<'_>) -> Result<Value, EncodeError> {
        Ok(Value::String(self.to_string()))
    }

    fn from_value(value: &Value, _cx: &mut DecodeContext<'_>) -> Result<Self, TypeMismatchError> {
        from_text(value, str::parse::<Period>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SerializerConfig;
    use crate::error::MismatchKind;
    use chrono::{NaiveTime, TimeZone};

    fn encode<T: Mapped>(value: &T) -> Value {
        let config = SerializerConfig::default();
        value.to_value(&mut EncodeContext::new(&config)).unwrap()
    }

    fn decode<T: Mapped>(text: &str) -> Result<T, TypeMismatchError> {
        let config = SerializerConfig::default();
        T::from_value(&Value::from(text), &mut DecodeContext::new(&config))
    }

    // ========================================================================
    // Duration
    // ========================================================================

    #[test]
    fn duration_format() {
        let d = Duration::from_secs(10 * 3600 + 30 * 60 + 5) + Duration::from_millis(520);
        assert_eq!(format_iso_duration(&d), "PT10H30M5.52S");
        assert_eq!(format_iso_duration(&Duration::ZERO), "PT0S");
        assert_eq!(format_iso_duration(&Duration::from_secs(7200)), "PT2H");
        assert_eq!(format_iso_duration(&Duration::from_secs(2 * 86_400)), "PT48H");
        assert_eq!(format_iso_duration(&Duration::from_nanos(1)), "PT0.000000001S");
        assert_eq!(format_iso_duration(&Duration::from_secs(61)), "PT1M1S");
    }

    #[test]
    fn duration_parse() {
        let d = parse_iso_duration("PT10H30M5.52S").unwrap();
        assert_eq!(d, Duration::new(37_805, 520_000_000));
        assert_eq!(parse_iso_duration("P2D").unwrap(), Duration::from_secs(172_800));
        assert_eq!(
            parse_iso_duration("P1DT1S").unwrap(),
            Duration::from_secs(86_401)
        );
        assert_eq!(parse_iso_duration("pt15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_iso_duration("PT0S").unwrap(), Duration::ZERO);
    }

    #[test]
    fn duration_parse_rejects_malformed() {
        for input in [
            "", "P", "PT", "10H", "PT5S10H", "PT1.5H", "PT-5S", "PT1.0000000001S", "P1W", "PT5",
            "PTS",
        ] {
            let err = parse_iso_duration(input).unwrap_err();
            assert_eq!(err.kind, "duration", "{input}");
        }
    }

    // ========================================================================
    // Period
    // ========================================================================

    #[test]
    fn period_display() {
        assert_eq!(Period::new(1, 2, 3).to_string(), "P1Y2M3D");
        assert_eq!(Period::default().to_string(), "P0D");
        assert_eq!(Period::new(0, 5, 0).to_string(), "P5M");
        assert_eq!(Period::new(-1, 0, 10).to_string(), "P-1Y10D");
    }

    #[test]
    fn period_parse() {
        assert_eq!("P1Y2M3D".parse::<Period>().unwrap(), Period::new(1, 2, 3));
        assert_eq!("P2W".parse::<Period>().unwrap(), Period::new(0, 0, 14));
        assert_eq!("P1W2D".parse::<Period>().unwrap(), Period::new(0, 0, 9));
        assert_eq!("-P1Y-2M".parse::<Period>().unwrap(), Period::new(-1, 2, 0));
        assert_eq!("p3m".parse::<Period>().unwrap(), Period::new(0, 3, 0));
    }

    #[test]
    fn period_parse_rejects_malformed() {
        for input in ["", "P", "1Y", "P3D2M", "P1.5Y", "PY", "P1Y2", "P99999999999D"] {
            assert!(input.parse::<Period>().is_err(), "{input}");
        }
    }

    // ========================================================================
    // chrono types
    // ========================================================================

    #[test]
    fn dates() {
        let date = NaiveDate::from_ymd_opt(2023, 11, 28).unwrap();
        assert_eq!(encode(&date), Value::from("2023-11-28"));
        assert_eq!(decode::<NaiveDate>("2023-11-28").unwrap(), date);
        assert!(decode::<NaiveDate>("2023-02-30").is_err());
    }

    #[test]
    fn date_times() {
        let dt = NaiveDate::from_ymd_opt(2023, 11, 28)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(22, 15, 30).unwrap());
        assert_eq!(encode(&dt), Value::from("2023-11-28T22:15:30"));
        assert_eq!(decode::<NaiveDateTime>("2023-11-28T22:15:30").unwrap(), dt);
        assert_eq!(
            decode::<NaiveDateTime>("2023-11-28T22:15").unwrap(),
            dt - chrono::Duration::seconds(30)
        );

        let with_millis = dt + chrono::Duration::milliseconds(250);
        assert_eq!(encode(&with_millis), Value::from("2023-11-28T22:15:30.250"));
        assert_eq!(
            decode::<NaiveDateTime>("2023-11-28T22:15:30.250").unwrap(),
            with_millis
        );
    }

    #[test]
    fn instants() {
        let instant = Utc.with_ymd_and_hms(2023, 11, 28, 22, 15, 30).unwrap();
        assert_eq!(encode(&instant), Value::from("2023-11-28T22:15:30Z"));
        assert_eq!(
            decode::<DateTime<Utc>>("2023-11-28T23:15:30+01:00").unwrap(),
            instant
        );
    }

    #[test]
    fn non_string_and_bad_text() {
        let config = SerializerConfig::default();
        let err = Period::from_value(&Value::from(3), &mut DecodeContext::new(&config)).unwrap_err();
        assert_eq!(
            err.kind,
            MismatchKind::Expected {
                expected: "string",
                found: "number"
            }
        );

        let err = decode::<Duration>("ten hours").unwrap_err();
        assert_eq!(
            err.kind,
            MismatchKind::InvalidValue("invalid ISO-8601 duration: \"ten hours\"".into())
        );
    }
}
