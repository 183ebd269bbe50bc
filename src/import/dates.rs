//! Calendar-date coercion for spreadsheet cells.
//!
//! Only three shapes are understood: an Excel serial number, `YYYY-MM-DD`
//! and `DD/MM/YYYY`. Anything else is absent rather than guessed.

use anyhow::{Result, anyhow};
use chrono::{Datelike, Duration, NaiveDate};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::workbook::CellValue;

pub const ISO_FORMAT: &str = "%Y-%m-%d";

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("ISO date pattern"));

static DAY_FIRST_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("day-first date pattern"));

/// Coerce a cell into an ISO `YYYY-MM-DD` string, or `None` when it is not a date
pub fn coerce_date(value: &CellValue) -> Option<String> {
    parse_date(value).map(|date| date.format(ISO_FORMAT).to_string())
}

/// Parse a cell into a calendar date without ever failing loudly
pub fn parse_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Number(serial) => match excel_serial_to_date(*serial) {
            Ok(date) => Some(date),
            Err(e) => {
                debug!("Ignoring date serial {}: {}", serial, e);
                None
            }
        },
        CellValue::Text(text) => parse_date_text(text.trim()),
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = ISO_DATE.captures(text) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }

    if let Some(caps) = DAY_FIRST_DATE.captures(text) {
        return ymd(&caps[3], &caps[2], &caps[1]);
    }

    debug!("Unrecognised date text '{}'", text);
    None
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Serial of 9999-12-31, the last date Excel can represent
pub const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Convert Excel serial date number to NaiveDate
///
/// Excel counts days from 1900-01-01 and treats 1900 as a leap year, so
/// serial 60 is the nonexistent 1900-02-29. The time-of-day fraction is dropped.
pub fn excel_serial_to_date(serial: f64) -> Result<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return Err(anyhow!("Invalid Excel date serial: {} (must be >= 1)", serial));
    }
    if serial >= MAX_EXCEL_SERIAL + 1.0 {
        return Err(anyhow!("Invalid Excel date serial: {} (beyond year 9999)", serial));
    }

    let excel_epoch = NaiveDate::from_ymd_opt(1900, 1, 1)
        .ok_or_else(|| anyhow!("Failed to create Excel epoch date"))?;

    let adjusted_days = if serial >= 60.0 {
        (serial - 2.0) as i64
    } else {
        (serial - 1.0) as i64
    };

    let date = Duration::try_days(adjusted_days)
        .and_then(|offset| excel_epoch.checked_add_signed(offset))
        .ok_or_else(|| anyhow!("Invalid Excel date serial: {} (overflow)", serial))?;

    if date.year() > 9999 {
        return Err(anyhow!("Invalid Excel date serial: {} (beyond year 9999)", serial));
    }

    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> CellValue {
        CellValue::from(value)
    }

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(excel_serial_to_date(44927.0).unwrap(), NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(excel_serial_to_date(45292.0).unwrap(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(excel_serial_to_date(45292.75).unwrap(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        // leap year bug boundary
        assert_eq!(excel_serial_to_date(59.0).unwrap(), NaiveDate::from_ymd_opt(1900, 2, 28).unwrap());
        assert_eq!(excel_serial_to_date(61.0).unwrap(), NaiveDate::from_ymd_opt(1900, 3, 1).unwrap());

        assert!(excel_serial_to_date(0.0).is_err());
        assert!(excel_serial_to_date(-1.0).is_err());
        assert!(excel_serial_to_date(f64::NAN).is_err());
        assert!(excel_serial_to_date(f64::INFINITY).is_err());
        assert!(excel_serial_to_date(1e12).is_err());
        assert!(excel_serial_to_date(3e11).is_err());
        assert!(excel_serial_to_date(f64::MAX).is_err());
        assert!(excel_serial_to_date(MAX_EXCEL_SERIAL + 1.0).is_err());
        assert_eq!(
            excel_serial_to_date(MAX_EXCEL_SERIAL).unwrap(),
            NaiveDate::from_ymd_opt(9999, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_huge_numeric_cells_are_absent() {
        assert_eq!(coerce_date(&CellValue::Number(1e12)), None);
        assert_eq!(coerce_date(&CellValue::Number(3e11)), None);
        assert_eq!(coerce_date(&CellValue::Number(f64::MAX)), None);
    }

    #[test]
    fn test_numeric_cells_are_serials() {
        assert_eq!(coerce_date(&CellValue::Number(45292.0)), Some("2024-01-01".to_string()));
        assert_eq!(coerce_date(&CellValue::Number(0.0)), None);
        assert_eq!(coerce_date(&CellValue::Number(f64::NAN)), None);
    }

    #[test]
    fn test_iso_dates_round_trip() {
        for date in ["2024-01-01", "1999-12-31", "2024-02-29", "2030-07-15"] {
            assert_eq!(coerce_date(&text(date)), Some(date.to_string()));
        }
        assert_eq!(coerce_date(&text("  2024-03-05 ")), Some("2024-03-05".to_string()));
    }

    #[test]
    fn test_day_first_dates_are_reordered() {
        assert_eq!(coerce_date(&text("05/03/2024")), Some("2024-03-05".to_string()));
        assert_eq!(coerce_date(&text("31/12/2023")), Some("2023-12-31".to_string()));
        assert_eq!(coerce_date(&text("5/3/2024")), Some("2024-03-05".to_string()));
    }

    #[test]
    fn test_other_shapes_are_absent() {
        for value in [
            "",
            "mañana",
            "2024/03/05",
            "03-05-2024",
            "2024-13-01",
            "2023-02-29",
            "31/02/2024",
            "45292",
            "5 de marzo de 2024",
        ] {
            assert_eq!(coerce_date(&text(value)), None, "value: {:?}", value);
        }
    }
}
