//! Conversion of scanned [`Value`]s into typed destinations.
//!
//! Rules, in priority order:
//!
//! 1. `Null` becomes the destination's zero value (`Default`), or `None` for `Option<T>`.
//! 2. Text and bytes are interchangeable.
//! 3. Time destinations parse text as RFC 3339 when it contains a `T`, else as
//!    `%Y-%m-%d %H:%M:%S` (19+ chars), else as `%Y-%m-%d` (10+ chars). Zoned
//!    destinations read the wall clock in local time; naive ones keep it as is.
//! 4. Same-kind or numerically convertible sources convert directly.
//! 5. Anything else is stringified and parsed into the destination.

use chrono::{
    DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};

use crate::value::{Value, DATE_FORMAT, DATE_TIME_FORMAT};

/// Why a value could not be stored into a destination type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error("cannot store a {from} value into {to}")]
    Incompatible {
        from: &'static str,
        to: &'static str,
    },
    #[error("cannot parse {text:?} as {to}")]
    Parse { text: String, to: &'static str },
    #[error("{text} is out of range for {to}")]
    OutOfRange { text: String, to: &'static str },
}

/// What a decoder does when a column cannot be converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionMode {
    /// Abort the call with [`Error::Conversion`](crate::Error::Conversion).
    #[default]
    Strict,
    /// Log the failure and store the zero value.
    Lenient,
}

/// A type a scanned column can be stored into.
pub trait FromColumn: Sized + Default {
    /// Whether the type can represent NULL itself (`Option<T>`, [`Value`]).
    const NULLABLE: bool = false;

    /// Converts a non-null value. Use [`convert`] to include the NULL rule.
    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

/// Converts `value` into `T`, mapping `Null` to `T::default()`.
pub fn convert<T: FromColumn>(value: Value) -> Result<T, ConversionError> {
    if value.is_null() && !T::NULLABLE {
        return Ok(T::default());
    }
    T::from_value(value)
}

/// Parses date or date-time text into local time.
///
/// Wall-clock times that fall into a daylight-saving gap are moved forward
/// by the length of the gap.
///
/// ```
/// use sqlx_osm::convert::parse_time_text;
///
/// let t = parse_time_text("2014-06-01 12:32:40.123")?;
/// assert_eq!(t.naive_local().to_string(), "2014-06-01 12:32:40");
/// # Ok::<(), sqlx_osm::convert::ConversionError>(())
/// ```
pub fn parse_time_text(text: &str) -> Result<DateTime<Local>, ConversionError> {
    if text.len() >= 19 && text.contains('T') {
        return DateTime::parse_from_rfc3339(text)
            .map(|t| t.with_timezone(&Local))
            .map_err(|_| parse_error(text));
    }
    parse_wall_clock(text).map(local)
}

/// Like [`parse_time_text`], but keeps the wall-clock reading without
/// attaching a zone. RFC 3339 text is normalized to local time first.
pub fn parse_naive_time_text(text: &str) -> Result<NaiveDateTime, ConversionError> {
    if text.len() >= 19 && text.contains('T') {
        return parse_time_text(text).map(|t| t.naive_local());
    }
    parse_wall_clock(text)
}

fn parse_error(text: &str) -> ConversionError {
    ConversionError::Parse {
        text: text.to_owned(),
        to: "datetime",
    }
}

fn parse_wall_clock(text: &str) -> Result<NaiveDateTime, ConversionError> {
    if text.len() >= 19 {
        let head = text.get(..19).ok_or_else(|| parse_error(text))?;
        return NaiveDateTime::parse_from_str(head, DATE_TIME_FORMAT).map_err(|_| parse_error(text));
    }
    if text.len() >= 10 {
        let head = text.get(..10).ok_or_else(|| parse_error(text))?;
        return NaiveDate::parse_from_str(head, DATE_FORMAT)
            .map(|d| d.and_time(NaiveTime::MIN))
            .map_err(|_| parse_error(text));
    }
    Err(parse_error(text))
}

/// Attaches the local zone. Ambiguous readings take the earlier instant;
/// readings inside a gap keep the offset in force before the transition.
fn local(naive: NaiveDateTime) -> DateTime<Local> {
    resolve_in(&Local, naive)
}

fn resolve_in<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => t,
        LocalResult::None => {
            let before = tz.offset_from_utc_datetime(&(naive - Duration::days(1))).fix();
            let shift = Duration::seconds(i64::from(before.local_minus_utc()));
            tz.from_utc_datetime(&(naive - shift))
        }
    }
}

/// Text for parsing; `None` when the value has no meaningful text form.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Text(s) => Some(s.clone()),
        Value::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
        Value::Bool(_) | Value::Int(_) | Value::UInt(_) | Value::Float(_) => Some(value.to_text()),
        _ => None,
    }
}

fn parse_text<T: std::str::FromStr>(value: &Value, to: &'static str) -> Result<T, ConversionError> {
    let text = text_of(value).ok_or(ConversionError::Incompatible {
        from: value.kind(),
        to,
    })?;
    text.trim().parse().map_err(|_| ConversionError::Parse { text, to })
}

/// Text of a time-destination source; `None` for empty text, which is the zero value.
fn time_text(value: Value, to: &'static str) -> Result<Option<String>, ConversionError> {
    let text = match value {
        Value::Text(s) => s,
        Value::Bytes(b) => String::from_utf8_lossy(&b).into_owned(),
        other => {
            return Err(ConversionError::Incompatible {
                from: other.kind(),
                to,
            })
        }
    };
    Ok(Some(text).filter(|t| !t.is_empty()))
}

/// Zoned time destinations: native values are read as local wall-clock time.
fn time_from(value: Value, to: &'static str) -> Result<Option<DateTime<Local>>, ConversionError> {
    match value {
        Value::DateTime(dt) => Ok(Some(local(dt))),
        Value::Date(d) => Ok(Some(local(d.and_time(NaiveTime::MIN)))),
        other => time_text(other, to)?
            .map(|text| parse_time_text(&text))
            .transpose(),
    }
}

/// Naive time destinations never pass through a zone.
fn naive_from(value: Value, to: &'static str) -> Result<Option<NaiveDateTime>, ConversionError> {
    match value {
        Value::DateTime(dt) => Ok(Some(dt)),
        Value::Date(d) => Ok(Some(d.and_time(NaiveTime::MIN))),
        other => time_text(other, to)?
            .map(|text| parse_naive_time_text(&text))
            .transpose(),
    }
}

macro_rules! int_from_column {
    ($($t:ty),+) => {
        $(
            impl FromColumn for $t {
                fn from_value(value: Value) -> Result<Self, ConversionError> {
                    let to = stringify!($t);
                    let out_of_range = |text: String| ConversionError::OutOfRange { text, to };
                    match value {
                        Value::Int(i) => <$t>::try_from(i).map_err(|_| out_of_range(i.to_string())),
                        Value::UInt(u) => <$t>::try_from(u).map_err(|_| out_of_range(u.to_string())),
                        Value::Float(f) => {
                            let t = f.trunc();
                            if t.is_finite() && t >= <$t>::MIN as f64 && t <= <$t>::MAX as f64 {
                                Ok(t as $t)
                            } else {
                                Err(out_of_range(f.to_string()))
                            }
                        }
                        other => parse_text(&other, to),
                    }
                }
            }
        )+
    };
}

int_from_column!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! float_from_column {
    ($($t:ty),+) => {
        $(
            impl FromColumn for $t {
                fn from_value(value: Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::Float(f) => Ok(f as $t),
                        Value::Int(i) => Ok(i as $t),
                        Value::UInt(u) => Ok(u as $t),
                        other => parse_text(&other, stringify!($t)),
                    }
                }
            }
        )+
    };
}

float_from_column!(f32, f64);

impl FromColumn for bool {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(0) | Value::UInt(0) => Ok(false),
            Value::Int(1) | Value::UInt(1) => Ok(true),
            Value::Int(i) => Err(ConversionError::OutOfRange {
                text: i.to_string(),
                to: "bool",
            }),
            Value::UInt(u) => Err(ConversionError::OutOfRange {
                text: u.to_string(),
                to: "bool",
            }),
            other => {
                let text = text_of(&other).ok_or(ConversionError::Incompatible {
                    from: other.kind(),
                    to: "bool",
                })?;
                match text.trim() {
                    "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
                    "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
                    _ => Err(ConversionError::Parse { text, to: "bool" }),
                }
            }
        }
    }
}

impl FromColumn for String {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Bytes(b) => String::from_utf8(b).map_err(|e| ConversionError::Parse {
                text: String::from_utf8_lossy(e.as_bytes()).into_owned(),
                to: "String",
            }),
            other => Ok(other.to_text()),
        }
    }
}

impl FromColumn for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Ok(other.to_text().into_bytes()),
        }
    }
}

impl FromColumn for DateTime<Local> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(time_from(value, "DateTime<Local>")?.unwrap_or_default())
    }
}

impl FromColumn for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(time_from(value, "DateTime<Utc>")?
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_default())
    }
}

impl FromColumn for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(naive_from(value, "NaiveDateTime")?.unwrap_or_default())
    }
}

impl FromColumn for NaiveDate {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Date(d) => Ok(d),
            other => Ok(naive_from(other, "NaiveDate")?
                .map(|t| t.date())
                .unwrap_or_default()),
        }
    }
}

impl FromColumn for NaiveTime {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Time(t) => Ok(t),
            Value::DateTime(dt) => Ok(dt.time()),
            other => {
                let text = text_of(&other).ok_or(ConversionError::Incompatible {
                    from: other.kind(),
                    to: "NaiveTime",
                })?;
                NaiveTime::parse_from_str(text.trim(), "%H:%M:%S%.f").map_err(|_| {
                    ConversionError::Parse {
                        text,
                        to: "NaiveTime",
                    }
                })
            }
        }
    }
}

impl FromColumn for Value {
    const NULLABLE: bool = true;

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value)
    }
}

impl<T: FromColumn> FromColumn for Option<T> {
    const NULLABLE: bool = true;

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(value).map(Some)
    }
}

impl<T: FromColumn> FromColumn for Box<T> {
    const NULLABLE: bool = T::NULLABLE;

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        T::from_value(value).map(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_null_is_zero_value() {
        assert_eq!(convert::<i64>(Value::Null).unwrap(), 0);
        assert_eq!(convert::<String>(Value::Null).unwrap(), "");
        assert!(!convert::<bool>(Value::Null).unwrap());
        assert_eq!(convert::<Option<i64>>(Value::Null).unwrap(), None);
        assert_eq!(convert::<Value>(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_text_and_bytes_interchange() {
        assert_eq!(convert::<String>(Value::Bytes(b"hi".to_vec())).unwrap(), "hi");
        assert_eq!(convert::<Vec<u8>>(Value::Text("hi".into())).unwrap(), b"hi");
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(convert::<i32>(Value::UInt(7)).unwrap(), 7);
        assert_eq!(convert::<u8>(Value::Text("200".into())).unwrap(), 200);
        assert_eq!(convert::<i64>(Value::Bytes(b"-12".to_vec())).unwrap(), -12);
        assert_eq!(convert::<i64>(Value::Float(3.9)).unwrap(), 3);
        assert_eq!(convert::<f64>(Value::Int(2)).unwrap(), 2.0);
        assert_eq!(convert::<f64>(Value::Text("1.25".into())).unwrap(), 1.25);
        assert_eq!(convert::<String>(Value::Int(5)).unwrap(), "5");
    }

    #[test]
    fn test_narrowing_is_range_checked() {
        assert_eq!(
            convert::<i8>(Value::Int(300)),
            Err(ConversionError::OutOfRange {
                text: "300".into(),
                to: "i8"
            })
        );
        assert!(convert::<u32>(Value::Int(-1)).is_err());
    }

    #[test]
    fn test_unparseable_text_is_an_error() {
        assert_eq!(
            convert::<i64>(Value::Text("abc".into())),
            Err(ConversionError::Parse {
                text: "abc".into(),
                to: "i64"
            })
        );
        assert!(convert::<i64>(Value::Date(NaiveDate::default())).is_err());
    }

    #[test]
    fn test_bool_conversions() {
        assert!(convert::<bool>(Value::Int(1)).unwrap());
        assert!(!convert::<bool>(Value::Text("false".into())).unwrap());
        assert!(convert::<bool>(Value::Bytes(b"T".to_vec())).unwrap());
        assert!(convert::<bool>(Value::Int(2)).is_err());
        assert!(convert::<bool>(Value::Text("yes".into())).is_err());
    }

    #[test]
    fn test_time_text_formats() {
        let dt = convert::<NaiveDateTime>(Value::Text("2014-06-01 12:32:40".into())).unwrap();
        assert_eq!(dt.to_string(), "2014-06-01 12:32:40");

        let d = convert::<NaiveDateTime>(Value::Bytes(b"2014-06-01".to_vec())).unwrap();
        assert_eq!(d.to_string(), "2014-06-01 00:00:00");

        let date = convert::<NaiveDate>(Value::Text("2014-06-01 12:32:40".into())).unwrap();
        assert_eq!(date.to_string(), "2014-06-01");

        assert!(convert::<NaiveDateTime>(Value::Text("06/01".into())).is_err());
    }

    /// Eastern time around the 2021-03-14 spring-forward at 07:00 UTC.
    #[derive(Debug, Clone, Copy)]
    struct SpringForward;

    impl SpringForward {
        fn switch() -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2021, 3, 14).unwrap().and_hms_opt(7, 0, 0).unwrap()
        }

        fn offset(hours: i32) -> FixedOffset {
            FixedOffset::west_opt(hours * 3600).unwrap()
        }
    }

    impl TimeZone for SpringForward {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            SpringForward
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let standard = *local + Duration::hours(5) < Self::switch();
            let daylight = *local + Duration::hours(4) >= Self::switch();
            match (standard, daylight) {
                (true, true) => LocalResult::Ambiguous(Self::offset(5), Self::offset(4)),
                (true, false) => LocalResult::Single(Self::offset(5)),
                (false, true) => LocalResult::Single(Self::offset(4)),
                (false, false) => LocalResult::None,
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::switch() {
                Self::offset(5)
            } else {
                Self::offset(4)
            }
        }
    }

    #[test]
    fn test_wall_clock_in_dst_gap_moves_forward() {
        let gap = NaiveDateTime::parse_from_str("2021-03-14 02:30:00", DATE_TIME_FORMAT).unwrap();
        let t = resolve_in(&SpringForward, gap);
        assert_eq!(t.naive_local().to_string(), "2021-03-14 03:30:00");
        assert_eq!(t.naive_utc().to_string(), "2021-03-14 07:30:00");

        let before = resolve_in(&SpringForward, gap - Duration::hours(1));
        assert_eq!(before.naive_utc().to_string(), "2021-03-14 06:30:00");
    }

    #[test]
    fn test_dst_gap_text_converts() {
        for text in ["2021-03-14 02:30:00", "2021-03-28 02:30:00", "2021-10-03 02:30:00"] {
            let naive = NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT).unwrap();
            assert_eq!(convert::<NaiveDateTime>(Value::Text(text.into())).unwrap(), naive);
            assert_eq!(convert::<NaiveDate>(Value::Text(text.into())).unwrap(), naive.date());

            let zoned = convert::<DateTime<Local>>(Value::Text(text.into())).unwrap();
            assert!(zoned.naive_local() >= naive);
            assert!(zoned.naive_local() - naive <= Duration::hours(2));
        }
    }

    #[test]
    fn test_rfc3339_text_is_normalized_to_local() {
        let expected = DateTime::parse_from_rfc3339("2014-06-01T12:32:40Z")
            .unwrap()
            .with_timezone(&Local);
        let t = convert::<DateTime<Local>>(Value::Text("2014-06-01T12:32:40Z".into())).unwrap();
        assert_eq!(t, expected);
        let utc = convert::<DateTime<Utc>>(Value::Text("2014-06-01T12:32:40Z".into())).unwrap();
        assert_eq!(utc.to_rfc3339(), "2014-06-01T12:32:40+00:00");
    }

    #[test]
    fn test_empty_time_text_is_zero_value() {
        assert_eq!(
            convert::<NaiveDateTime>(Value::Text(String::new())).unwrap(),
            NaiveDateTime::default()
        );
    }

    #[test]
    fn test_native_time_values() {
        let dt = NaiveDate::from_ymd_opt(2020, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        assert_eq!(convert::<NaiveDateTime>(Value::DateTime(dt)).unwrap(), dt);
        assert_eq!(convert::<NaiveDate>(Value::DateTime(dt)).unwrap(), dt.date());
        assert_eq!(convert::<NaiveTime>(Value::Text("07:08:09".into())).unwrap(), dt.time());
        assert_eq!(convert::<String>(Value::DateTime(dt)).unwrap(), "2020-05-06 07:08:09");
    }

    #[test]
    fn test_option_and_box_wrap_values() {
        assert_eq!(convert::<Option<i64>>(Value::Int(4)).unwrap(), Some(4));
        assert_eq!(convert::<Box<i64>>(Value::Int(4)).unwrap(), Box::new(4));
        assert_eq!(convert::<Box<i64>>(Value::Null).unwrap(), Box::new(0));
    }
}
