//! Date formats of the two systems.

use chrono::NaiveDate;

/// Source dates are `DD-MM-YYYY`.
pub fn parse_source_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%d-%m-%Y").ok()
}

/// Destination dates are ISO `YYYY-MM-DD`.
pub fn parse_destination_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_dates_are_day_first() {
        assert_eq!(parse_source_date("05-03-2010"), NaiveDate::from_ymd_opt(2010, 3, 5));
        assert_eq!(parse_source_date("2010-03-05"), None);
        assert_eq!(parse_source_date("31-02-2010"), None);
    }

    #[test]
    fn destination_dates_are_iso() {
        assert_eq!(parse_destination_date("2010-03-05"), NaiveDate::from_ymd_opt(2010, 3, 5));
        assert_eq!(parse_destination_date("05-03-2010"), None);
    }
}
