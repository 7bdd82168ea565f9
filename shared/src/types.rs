//! Common types used across the engine

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// How roots are bucketed into virtual batches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupingPolicy {
    /// Offset of the site's local time from UTC, used to find the lot day
    pub utc_offset_minutes: i32,
    /// Whether roots missing a genetic or location share the "unknown" bucket
    pub merge_unattributed: bool,
}

impl Default for GroupingPolicy {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            merge_unattributed: true,
        }
    }
}

impl GroupingPolicy {
    /// Site offset, or `None` when it is not strictly within one day of UTC
    pub fn offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
    }

    /// Local calendar day of an instant; time-of-day is discarded
    ///
    /// Out-of-range offsets fall back to UTC. Hosts reject them up front with
    /// [`crate::validation::validate_policy`].
    pub fn calendar_date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        match self.offset() {
            Some(offset) => at.with_timezone(&offset).date_naive(),
            None => at.date_naive(),
        }
    }
}

/// Unit count requested by a host that speaks signed or floating numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount(pub u64);

impl Amount {
    /// Reject negative values before they reach the allocator
    pub fn try_from_signed(value: i64, available: u64) -> EngineResult<Self> {
        u64::try_from(value)
            .map(Amount)
            .map_err(|_| EngineError::InvalidAmount {
                requested: value as i128,
                available,
            })
    }

    /// Reject fractional, negative and non-finite numbers
    pub fn try_from_f64(value: f64, available: u64) -> EngineResult<Self> {
        if !value.is_finite() || value.fract() != 0.0 || value < 0.0 || value > u64::MAX as f64 {
            return Err(EngineError::InvalidAmount {
                requested: if value.is_finite() { value as i128 } else { -1 },
                available,
            });
        }
        Ok(Amount(value as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_calendar_date_utc() {
        let policy = GroupingPolicy::default();
        let at = Utc.with_ymd_and_hms(2024, 1, 10, 23, 30, 0).unwrap();
        assert_eq!(
            policy.calendar_date_of(at),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
        );
    }

    #[test]
    fn test_calendar_date_shifted_by_offset() {
        let policy = GroupingPolicy {
            utc_offset_minutes: 7 * 60,
            ..Default::default()
        };
        // 23:30 UTC is 06:30 the next day at UTC+7
        let at = Utc.with_ymd_and_hms(2024, 1, 10, 23, 30, 0).unwrap();
        assert_eq!(
            policy.calendar_date_of(at),
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()
        );

        let west = GroupingPolicy {
            utc_offset_minutes: -5 * 60,
            ..Default::default()
        };
        let early = Utc.with_ymd_and_hms(2024, 1, 10, 2, 0, 0).unwrap();
        assert_eq!(
            west.calendar_date_of(early),
            NaiveDate::from_ymd_opt(2024, 1, 9).unwrap()
        );
    }

    #[test]
    fn test_extreme_offset_falls_back_to_utc() {
        let at = Utc.with_ymd_and_hms(2024, 1, 10, 23, 30, 0).unwrap();
        for minutes in [i32::MAX, i32::MIN, 1440, -1440] {
            let policy = GroupingPolicy {
                utc_offset_minutes: minutes,
                ..Default::default()
            };
            assert!(policy.offset().is_none());
            assert_eq!(
                policy.calendar_date_of(at),
                NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
            );
        }

        let edge = GroupingPolicy {
            utc_offset_minutes: 1439,
            ..Default::default()
        };
        assert!(edge.offset().is_some());
    }

    #[test]
    fn test_amount_from_signed() {
        assert_eq!(Amount::try_from_signed(3, 10), Ok(Amount(3)));
        assert_eq!(
            Amount::try_from_signed(-2, 10),
            Err(EngineError::InvalidAmount {
                requested: -2,
                available: 10
            })
        );
    }

    #[test]
    fn test_amount_from_f64() {
        assert_eq!(Amount::try_from_f64(4.0, 10), Ok(Amount(4)));
        assert!(Amount::try_from_f64(1.5, 10).is_err());
        assert!(Amount::try_from_f64(-1.0, 10).is_err());
        assert!(Amount::try_from_f64(f64::NAN, 10).is_err());
    }
}
