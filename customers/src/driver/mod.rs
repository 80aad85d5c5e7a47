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

//! Business logic for the service.

use crate::model::CustomerResponse;
use async_trait::async_trait;
use crm_core::db::Db;
use crm_core::driver::DriverResult;
use std::sync::Arc;

mod customers;
#[cfg(test)]
pub(crate) mod testutils;

/// Read access to the collection of customers.
///
/// The REST layer only depends on this capability so that handlers can be exercised against
/// stand-in implementations.
#[async_trait]
pub(crate) trait CustomerRepository {
    /// Gets all customers, newest first.
    async fn get_all(&self) -> DriverResult<Vec<CustomerResponse>>;
}

/// A customer repository that can be shared across concurrent requests.
pub(crate) type SharedRepository = Arc<dyn CustomerRepository + Send + Sync>;

/// Business logic backed by a database.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(db: Arc<dyn Db + Send + Sync>) -> Self {
        Self { db }
    }
}
