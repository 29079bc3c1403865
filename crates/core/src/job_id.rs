//! Structured job identifiers.
//!
//! A [`JobId`] is `{timestamp, backend, user, suffix}` and is written as
//! `<YYYYMMDD_HHMMSS>-<backend>-<user>-<suffix>`, the form already used by
//! stored job files. Parsing goes by schema rather than by splitting on
//! `-`: the timestamp is fixed width, the suffix is the trailing five hex
//! digits and backend names cannot contain `-`, so whatever remains between
//! them is the username, dashes included.
//!
//! The suffix gives 16^5 (about one million) values per
//! (second, backend, user). By the birthday bound, two submissions from the
//! same user to the same backend in the same second collide with
//! probability about 1 in 2 million; submit writes the job record
//! create-only and redraws the suffix when that happens.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;
use crate::naming::{validate_backend_name, validate_username};

/// `strftime` format of the timestamp segment.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Number of hex digits in the random suffix.
pub const SUFFIX_LEN: usize = 5;

static JOB_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{8}_\d{6})-([A-Za-z0-9_]+)-(.+)-([0-9a-f]{5})$").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId {
    timestamp: NaiveDateTime,
    backend: String,
    user: String,
    suffix: String,
}

impl JobId {
    /// Build a fresh id for a submission made at `now` with a random suffix.
    pub fn generate(backend: &str, user: &str, now: DateTime<Utc>) -> Result<Self, CoreError> {
        let suffix = format!("{:05x}", rand::rng().random_range(0..0x10_0000u32));
        Self::from_parts(backend, user, now.naive_utc(), &suffix)
    }

    /// Assemble an id from its fields, validating each.
    pub fn from_parts(
        backend: &str,
        user: &str,
        timestamp: NaiveDateTime,
        suffix: &str,
    ) -> Result<Self, CoreError> {
        validate_backend_name(backend)?;
        validate_username(user)?;
        if suffix.len() != SUFFIX_LEN
            || !suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        {
            return Err(CoreError::Invalid(format!(
                "Job id suffix must be {SUFFIX_LEN} lowercase hex digits"
            )));
        }
        // Stored ids carry second resolution only.
        let timestamp = timestamp
            .with_nanosecond(0)
            .ok_or_else(|| CoreError::Internal("timestamp cannot be truncated".into()))?;

        Ok(Self {
            timestamp,
            backend: backend.to_string(),
            user: user.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// Parse the wire form. Any deviation from the schema is `NotFound`,
    /// since no job can exist under a malformed id.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let not_found = || CoreError::NotFound {
            entity: "Job",
            id: raw.to_string(),
        };
        let caps = JOB_ID_RE.captures(raw).ok_or_else(not_found)?;
        let timestamp = NaiveDateTime::parse_from_str(&caps[1], TIMESTAMP_FORMAT)
            .map_err(|_| not_found())?;
        Self::from_parts(&caps[2], &caps[3], timestamp, &caps[4]).map_err(|_| not_found())
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.backend,
            self.user,
            self.suffix
        )
    }
}

impl FromStr for JobId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for JobId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap().naive_utc()
    }

    #[test]
    fn displays_legacy_wire_form() {
        let id = JobId::from_parts("fermions", "alice", at(12, 30, 5), "0a1b2").unwrap();
        assert_eq!(id.to_string(), "20240301_123005-fermions-alice-0a1b2");
    }

    #[test]
    fn parses_legacy_wire_form() {
        let id = JobId::parse("20240301_123005-fermions-alice-0a1b2").unwrap();
        assert_eq!(id.backend(), "fermions");
        assert_eq!(id.user(), "alice");
        assert_eq!(id.suffix(), "0a1b2");
        assert_eq!(id.timestamp(), at(12, 30, 5));
    }

    #[test]
    fn username_with_dashes_survives_parsing() {
        let id = JobId::from_parts("fermions", "jean-luc-p", at(0, 0, 0), "fffff").unwrap();
        let parsed = JobId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed.user(), "jean-luc-p");
        assert_eq!(parsed, id);
    }

    #[test]
    fn malformed_ids_are_not_found() {
        for raw in [
            "",
            "garbage",
            "20240301_123005-fermions-alice",
            "20240301_123005-fermions-alice-0A1B2",
            "2024030_123005-fermions-alice-0a1b2",
            "20241399_123005-fermions-alice-0a1b2",
            "20240301_123005--alice-0a1b2",
            "20240301_123005-fermions-al/ice-0a1b2",
        ] {
            assert_matches!(JobId::parse(raw), Err(CoreError::NotFound { .. }), "{raw}");
        }
    }

    #[test]
    fn generated_ids_round_trip() {
        let now = Utc::now();
        let id = JobId::generate("fermions", "alice", now).unwrap();
        assert_eq!(id.suffix().len(), SUFFIX_LEN);
        assert_eq!(JobId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn generate_rejects_dashed_backend() {
        assert_matches!(
            JobId::generate("multi-qudit", "alice", Utc::now()),
            Err(CoreError::Invalid(_))
        );
    }

    #[test]
    fn ordering_follows_creation_time() {
        let early = JobId::from_parts("zz", "zz", at(1, 0, 0), "fffff").unwrap();
        let late = JobId::from_parts("aa", "aa", at(2, 0, 0), "00000").unwrap();
        assert!(early < late);
    }

    #[test]
    fn serializes_as_string() {
        let id = JobId::parse("20240301_123005-fermions-alice-0a1b2").unwrap();
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, serde_json::json!("20240301_123005-fermions-alice-0a1b2"));
        let back: JobId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }
}
