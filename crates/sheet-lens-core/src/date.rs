//! Excel date serials
//!
//! Serial 1 is 1900-01-01. Serial 60 is the phantom 1900-02-29, which maps
//! to 1900-02-28 here; from serial 61 on, days count from 1899-12-30.

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Convert a 1900-system serial to a timestamp
///
/// Returns `None` for negative or non-finite serials and for values past
/// the end of the representable calendar.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let adjusted = if serial < 60.0 { serial + 1.0 } else { serial };
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (adjusted * 86_400_000.0).round();
    if millis > i64::MAX as f64 {
        return None;
    }
    base.checked_add_signed(Duration::milliseconds(millis as i64))
}
