//! Day, month and year bucket keys.
//!
//! Keys are formatted in the offset the timestamp carries. A snapshot taken
//! at 00:30 +0200 belongs to that local day even though it is the previous
//! day in UTC.

use chrono::{DateTime, FixedOffset};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketKeys {
    pub day: String,
    pub month: String,
    pub year: String,
}

pub fn keys(time: &DateTime<FixedOffset>) -> BucketKeys {
    BucketKeys {
        day: time.format("%Y%m%d").to_string(),
        month: time.format("%Y%m").to_string(),
        year: time.format("%Y").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z").unwrap()
    }

    #[test]
    fn formats_all_three_keys() {
        let k = keys(&at("2024-03-07 13:45:00 +0000"));
        assert_eq!(k.day, "20240307");
        assert_eq!(k.month, "202403");
        assert_eq!(k.year, "2024");
    }

    #[test]
    fn uses_the_timestamps_own_offset() {
        // 2023-12-31 23:30 UTC
        let k = keys(&at("2024-01-01 00:30:00 +0100"));
        assert_eq!(k.day, "20240101");
        assert_eq!(k.month, "202401");
        assert_eq!(k.year, "2024");
    }

    #[test]
    fn same_instant_different_offsets_can_differ() {
        let east = keys(&at("2024-01-01 00:30:00 +0100"));
        let utc = keys(&at("2023-12-31 23:30:00 +0000"));
        assert_ne!(east.day, utc.day);
        assert_ne!(east.year, utc.year);
    }
}
