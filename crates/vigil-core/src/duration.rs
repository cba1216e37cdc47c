// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Serde support for humane duration values.
//!
//! Configuration files may write durations either as bare seconds (`300`)
//! or as suffixed strings (`250ms`, `90s`, `5m`, `2h`). Use with
//! `#[serde(with = "vigil_core::duration")]`, or
//! `#[serde(with = "vigil_core::duration::option")]` for optional fields.

use std::time::Duration;

use serde::de::{Deserializer, Error as DeError};
use serde::ser::Serializer;
use serde::Deserialize;

/// Parses a duration from a suffixed string.
pub fn parse(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("empty duration".to_string());
    }

    let (number, unit) = match value.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => value.split_at(idx),
        None => (value, "s"),
    };

    let amount: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration '{value}'"))?;

    match unit {
        "ms" => Ok(Duration::from_millis(amount)),
        "s" => Ok(Duration::from_secs(amount)),
        "m" => Ok(Duration::from_secs(amount * 60)),
        "h" => Ok(Duration::from_secs(amount * 3600)),
        _ => Err(format!("unknown duration unit '{unit}' in '{value}'")),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Seconds(u64),
    Text(String),
}

impl TryFrom<Raw> for Duration {
    type Error = String;

    fn try_from(raw: Raw) -> Result<Self, Self::Error> {
        match raw {
            Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
            Raw::Text(text) => parse(&text),
        }
    }
}

/// Deserializes a duration from seconds or a suffixed string.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Raw::deserialize(deserializer)?;
    Duration::try_from(raw).map_err(DeError::custom)
}

/// Serializes a duration as whole seconds.
pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}

/// Serde support for `Option<Duration>` fields.
pub mod option {
    use super::*;

    /// Deserializes an optional duration.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Raw>::deserialize(deserializer)?;
        raw.map(Duration::try_from)
            .transpose()
            .map_err(DeError::custom)
    }

    /// Serializes an optional duration as whole seconds.
    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
