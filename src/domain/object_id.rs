//! Document identifiers.
//!
//! Every record is keyed by a 12-byte identifier rendered as 24 lowercase hex
//! characters: 4 bytes of big-endian unix seconds followed by 8 random bytes.

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

pub const OBJECT_ID_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, sqlx::Type, utoipa::ToSchema)]
#[sqlx(transparent)]
#[serde(transparent)]
#[schema(value_type = String, example = "65f1c2a9e4b0a1b2c3d4e5f6")]
pub struct ObjectId(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObjectIdError {
    #[error("expected {} hex characters, got {0}", OBJECT_ID_LEN * 2)]
    InvalidLength(usize),

    #[error("contains non-hexadecimal characters")]
    InvalidHex,
}

impl ObjectId {
    pub fn new() -> Self {
        let mut bytes = [0u8; OBJECT_ID_LEN];
        let secs = Utc::now().timestamp() as u32;
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..].copy_from_slice(&Uuid::new_v4().as_bytes()[..8]);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != OBJECT_ID_LEN * 2 {
            return Err(ObjectIdError::InvalidLength(s.len()));
        }
        if !s.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(ObjectIdError::InvalidHex);
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
