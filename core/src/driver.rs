// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Generic business logic errors for any service.
//!
//! Every service should implement its own driver: the layer that coordinates access to the
//! database on behalf of the REST handlers.  Drivers are exposed to the REST layer behind a
//! trait so that handlers can be tested against stand-in implementations.

use crate::db::DbError;

/// Business logic errors.  These errors encompass backend and logical errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DriverError {
    /// Catch-all error type for unexpected database errors.
    #[error("{0}")]
    BackendError(String),
}

impl From<DbError> for DriverError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Config(_) | DbError::Connection(_) | DbError::Query(_) => {
                DriverError::BackendError(e.to_string())
            }
        }
    }
}

/// Result type for this module.
pub type DriverResult<T> = Result<T, DriverError>;
