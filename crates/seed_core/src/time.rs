use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::{SeedError, SeedResult};

/// Microseconds since the Unix epoch, UTC.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn parse_rfc3339(value: &str) -> SeedResult<Self> {
        let parsed = OffsetDateTime::parse(value.trim(), &Rfc3339)
            .map_err(|err| SeedError::transform(format!("invalid timestamp '{value}': {err}")))?;
        let micros = parsed.unix_timestamp_nanos() / 1_000;
        let micros = i64::try_from(micros)
            .map_err(|_| SeedError::transform(format!("timestamp out of range: {value}")))?;
        Ok(Self(micros))
    }

    pub fn as_micros(self) -> i64 {
        self.0
    }

    pub fn from_micros(value: i64) -> Self {
        Timestamp(value)
    }
}

#[cfg(test)]
mod tests {
    use super::Timestamp;
    use crate::SeedError;

    #[test]
    fn parses_utc_and_offset_forms() {
        let utc = Timestamp::parse_rfc3339("2023-11-05T12:00:00.000Z").expect("utc");
        assert_eq!(utc.as_micros(), 1_699_185_600_000_000);
        let offset = Timestamp::parse_rfc3339("2023-11-05T14:00:00+02:00").expect("offset");
        assert_eq!(utc, offset);
    }

    #[test]
    fn rejects_garbage() {
        let err = Timestamp::parse_rfc3339("last tuesday").unwrap_err();
        assert!(matches!(err, SeedError::Transform { .. }));
    }
}
