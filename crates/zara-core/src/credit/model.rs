//! Credit state and configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{Metadata, META_GENERATION_COUNT, META_LAST_GENERATION_DATE};

pub const DEFAULT_DAILY_LIMIT: u32 = 10;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Global credit settings shared by all users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditConfig {
    pub daily_limit: u32,
    pub limit_enabled: bool,
}

impl Default for CreditConfig {
    fn default() -> Self {
        Self {
            daily_limit: DEFAULT_DAILY_LIMIT,
            limit_enabled: true,
        }
    }
}

/// Remaining credits of one user for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditState {
    pub count: u32,
    pub last_reset_date: NaiveDate,
}

impl CreditState {
    pub fn fresh(daily_limit: u32, today: NaiveDate) -> Self {
        Self {
            count: daily_limit,
            last_reset_date: today,
        }
    }

    /// Reads the cached credit fields from identity metadata.
    ///
    /// Returns `None` when either field is missing or malformed. Negative
    /// counts clamp to zero.
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        let count = match metadata.get(META_GENERATION_COUNT)? {
            Value::Number(n) => {
                if let Some(count) = n.as_u64() {
                    u32::try_from(count).unwrap_or(u32::MAX)
                } else if n.as_i64().is_some_and(|count| count < 0) {
                    0
                } else {
                    return None;
                }
            }
            _ => return None,
        };
        let date = metadata.get(META_LAST_GENERATION_DATE)?.as_str()?;
        let last_reset_date = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
        Some(Self {
            count,
            last_reset_date,
        })
    }

    pub fn to_metadata_patch(&self) -> Metadata {
        let mut patch = Metadata::new();
        patch.insert(META_GENERATION_COUNT.to_string(), Value::from(self.count));
        patch.insert(
            META_LAST_GENERATION_DATE.to_string(),
            Value::String(self.last_reset_date.format(DATE_FORMAT).to_string()),
        );
        patch
    }

    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.last_reset_date == today
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: Value) -> Metadata {
        value.as_object().cloned().unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_reads_metadata() {
        let state = CreditState::from_metadata(&metadata(json!({
            "generation_count": 3,
            "last_generation_date": "2024-05-02"
        })))
        .unwrap();
        assert_eq!(state, CreditState { count: 3, last_reset_date: day(2) });
    }

    #[test]
    fn test_negative_count_clamps_to_zero() {
        let state = CreditState::from_metadata(&metadata(json!({
            "generation_count": -4,
            "last_generation_date": "2024-05-02"
        })))
        .unwrap();
        assert_eq!(state.count, 0);
    }

    #[test]
    fn test_malformed_fields_are_absent() {
        for value in [
            json!({}),
            json!({ "generation_count": "3", "last_generation_date": "2024-05-02" }),
            json!({ "generation_count": 1.5, "last_generation_date": "2024-05-02" }),
            json!({ "generation_count": 3, "last_generation_date": "yesterday" }),
            json!({ "generation_count": 3 }),
        ] {
            assert_eq!(CreditState::from_metadata(&metadata(value.clone())), None, "{}", value);
        }
    }

    #[test]
    fn test_metadata_patch_uses_iso_date() {
        let patch = CreditState::fresh(10, day(7)).to_metadata_patch();
        assert_eq!(patch[META_GENERATION_COUNT], json!(10));
        assert_eq!(patch[META_LAST_GENERATION_DATE], json!("2024-05-07"));
        assert_eq!(CreditState::from_metadata(&patch), Some(CreditState::fresh(10, day(7))));
    }
}
