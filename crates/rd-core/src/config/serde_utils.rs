//! Shared serialization/deserialization utilities for configuration

/// Helper module for Duration serialization as seconds
///
/// Serializes `std::time::Duration` as a u64 number of seconds, which reads
/// better in TOML configuration files.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Config {
///     #[serde(with = "rd_core::config::serde_utils::duration_secs")]
///     display: Duration,
/// }
/// ```
pub mod duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize a Duration as seconds (u64)
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    /// Deserialize a Duration from seconds (u64)
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Window {
        #[serde(with = "duration_secs")]
        display: Duration,
    }

    #[test]
    fn test_duration_secs_toml() {
        let window = Window {
            display: Duration::from_secs(120),
        };
        let text = toml::to_string(&window).unwrap();
        assert_eq!(text.trim(), "display = 120");

        let parsed: Window = toml::from_str("display = 30").unwrap();
        assert_eq!(parsed.display, Duration::from_secs(30));
    }

    #[test]
    fn test_duration_secs_rejects_negative() {
        let result: Result<Window, _> = toml::from_str("display = -1");
        assert!(result.is_err());
    }
}
