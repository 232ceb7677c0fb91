//! Stable logical storage keys.

pub const CUSTOM_PERSONAS: &str = "custom-personas";
pub const ANNOUNCEMENTS: &str = "app-announcements";
pub const SEEN_ANNOUNCEMENTS: &str = "seen-announcements";
pub const DAILY_LIMIT: &str = "global-image-generation-limit";
pub const LIMIT_ENABLED: &str = "is-credit-limit-enabled";

/// Suffix of the key that receives an unreadable value.
pub const CORRUPT_SUFFIX: &str = ".corrupt";

pub fn corrupt_key(key: &str) -> String {
    format!("{}{}", key, CORRUPT_SUFFIX)
}
