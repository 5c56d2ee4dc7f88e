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

use std::collections::HashSet;

use crate::config::types::*;
use crate::config::ConfigValidationError;

pub trait Validate {
    fn validate(&self) -> Result<(), ConfigValidationError>;
}

impl Validate for WorkOrderConfig {
    fn validate(&self) -> Result<(), ConfigValidationError> {
        let mut errors = Vec::new();

        if let Err(e) = self.database.validate() {
            errors.push(e);
        }
        if let Err(e) = self.operations.validate() {
            errors.push(e);
        }
        if let Err(e) = validate_entries(
            "datasources",
            self.datasources.iter().map(|d| (d.id.as_str(), d.name.as_str())),
        ) {
            errors.push(e);
        }
        if let Err(e) = validate_entries(
            "departments",
            self.departments.iter().map(|d| (d.id.as_str(), d.name.as_str())),
        ) {
            errors.push(e);
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigValidationError::Multiple { errors }),
        }
    }
}

impl Validate for DatabaseConfig {
    fn validate(&self) -> Result<(), ConfigValidationError> {
        let url = self.url.trim();
        if url.is_empty() || url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Err(ConfigValidationError::InvalidDatabaseUrl {
                url: self.url.clone(),
            });
        }

        if self.pool_size == 0 || self.pool_size > 100 {
            return Err(ConfigValidationError::InvalidPoolSize {
                size: self.pool_size,
            });
        }

        Ok(())
    }
}

impl Validate for OperationsConfig {
    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.timeout_ms == 0 {
            return Err(ConfigValidationError::InvalidTimeout {
                timeout_ms: self.timeout_ms,
            });
        }
        Ok(())
    }
}

/// Directory entries need an id and a name, and ids must be unique per section.
fn validate_entries<'a>(
    section: &'static str,
    entries: impl Iterator<Item = (&'a str, &'a str)>,
) -> Result<(), ConfigValidationError> {
    let mut seen = HashSet::new();
    for (id, name) in entries {
        if id.is_empty() {
            return Err(ConfigValidationError::EmptyField { section, field: "id" });
        }
        if name.is_empty() {
            return Err(ConfigValidationError::EmptyField {
                section,
                field: "name",
            });
        }
        if !seen.insert(id) {
            return Err(ConfigValidationError::DuplicateEntry {
                section,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}
