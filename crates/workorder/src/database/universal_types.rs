/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Storage-neutral identifier and timestamp types.
//!
//! Domain code works with [`UniversalUuid`] and [`UniversalTimestamp`]. The
//! SQLite row models store identifiers as 16-byte BLOBs and timestamps as
//! RFC3339 TEXT; conversion happens at the DAL boundary so that Diesel-specific
//! code stays in `dal::models`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::StorageError;

/// UUID wrapper used for every surrogate key in the subsystem.
///
/// New identifiers are UUIDv7, so byte order follows creation time and
/// `ORDER BY id` doubles as a creation-order sort.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct UniversalUuid(pub Uuid);

impl UniversalUuid {
    /// Creates a new time-ordered identifier.
    pub fn new_v7() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Convert to bytes for SQLite BLOB storage
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }

    /// Create from bytes (SQLite BLOB)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        Uuid::from_slice(bytes)
            .map(UniversalUuid)
            .map_err(|e| StorageError::Decode(format!("invalid uuid bytes: {}", e)))
    }
}

impl fmt::Display for UniversalUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UniversalUuid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(UniversalUuid)
    }
}

impl From<Uuid> for UniversalUuid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<UniversalUuid> for Uuid {
    fn from(wrapper: UniversalUuid) -> Self {
        wrapper.0
    }
}

/// Timestamp wrapper stored as RFC3339 text.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct UniversalTimestamp(pub DateTime<Utc>);

impl UniversalTimestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Convert to RFC3339 string for SQLite TEXT storage
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Create from RFC3339 string (SQLite TEXT)
    pub fn from_rfc3339(s: &str) -> Result<Self, StorageError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| UniversalTimestamp(dt.with_timezone(&Utc)))
            .map_err(|e| StorageError::Decode(format!("invalid timestamp '{}': {}", s, e)))
    }
}

impl fmt::Display for UniversalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for UniversalTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<UniversalTimestamp> for DateTime<Utc> {
    fn from(wrapper: UniversalTimestamp) -> Self {
        wrapper.0
    }
}

/// Decodes an optional BLOB column into an optional identifier.
pub(crate) fn uuid_from_optional_bytes(
    bytes: Option<&[u8]>,
) -> Result<Option<UniversalUuid>, StorageError> {
    bytes.map(UniversalUuid::from_bytes).transpose()
}

/// Decodes an optional TEXT column into an optional timestamp.
pub(crate) fn timestamp_from_optional_text(
    text: Option<&str>,
) -> Result<Option<UniversalTimestamp>, StorageError> {
    text.map(UniversalTimestamp::from_rfc3339).transpose()
}
