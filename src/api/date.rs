use chrono::{Datelike, NaiveDate};
use thiserror::Error;

/// Wire format for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date '{0}', expected YYYY-MM-DD")]
pub struct InvalidDate(pub String);

/// Parse `YYYY-MM-DD` exactly: four-digit year, two-digit month and day,
/// dash separators, and a day that exists on the calendar.
pub fn parse_date(raw: &str) -> Result<NaiveDate, InvalidDate> {
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(InvalidDate(raw.to_string()));
    }

    let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| InvalidDate(raw.to_string()))?;
    // Postgres has no year zero
    if date.year() < 1 {
        return Err(InvalidDate(raw.to_string()));
    }
    Ok(date)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `#[serde(with = "iso_date")]` for `NaiveDate` fields
pub mod iso_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_leap_day_and_round_trips() {
        let date = parse_date("2024-02-29").unwrap();
        assert_eq!(format_date(date), "2024-02-29");
    }

    #[test]
    fn rejects_impossible_days() {
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("0000-01-01").is_err());
    }

    #[test]
    fn rejects_other_shapes() {
        for raw in [
            "02/30/2024",
            "2024/02/28",
            "2024-2-28",
            "2024-02-8",
            "24-02-28",
            "2024-02",
            "2024-02-28T00:00:00",
            " 2024-02-28",
            "+2024-02-28",
            "",
        ] {
            assert!(parse_date(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn serde_helper_formats_dates() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Holder {
            #[serde(with = "iso_date")]
            date: NaiveDate,
        }
        let json = serde_json::to_string(&Holder { date: parse_date("0999-01-05").unwrap() }).unwrap();
        assert_eq!(json, r#"{"date":"0999-01-05"}"#);
        assert!(serde_json::from_str::<Holder>(r#"{"date":"02/30/2024"}"#).is_err());
    }
}
