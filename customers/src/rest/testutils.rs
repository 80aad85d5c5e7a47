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

//! Test utilities for the REST API.

use crate::db::testutils::{insert_customer, setup_sqlite};
use crate::driver::{CustomerRepository, Driver};
use crate::model::CustomerResponse;
use crate::rest::app;
use async_trait::async_trait;
use axum::Router;
use crm_core::db::Db;
use crm_core::db::sqlite::SqliteDb;
use crm_core::driver::{DriverError, DriverResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use time::{Duration, OffsetDateTime};

/// Creates a customer with placeholder contact details.  The update time is one hour after
/// `created_at`.
pub(crate) fn sample_customer(
    id: &str,
    full_name: &str,
    created_at: OffsetDateTime,
) -> CustomerResponse {
    CustomerResponse::new(
        id.to_owned(),
        full_name.to_owned(),
        "someone@example.com".to_owned(),
        "+15555550100".to_owned(),
        "1 Main Street".to_owned(),
        created_at,
        created_at + Duration::hours(1),
    )
}

/// A repository that returns canned results.
pub(crate) struct FakeRepository {
    result: Result<Vec<CustomerResponse>, String>,
}

impl FakeRepository {
    /// Creates a repository that returns `customers` on every call.
    pub(crate) fn with_customers(customers: Vec<CustomerResponse>) -> Self {
        Self { result: Ok(customers) }
    }

    /// Creates a repository that fails with `message` on every call.
    pub(crate) fn with_error<S: Into<String>>(message: S) -> Self {
        Self { result: Err(message.into()) }
    }

    pub(crate) fn into_app(self) -> Router {
        app(Arc::new(self))
    }
}

#[async_trait]
impl CustomerRepository for FakeRepository {
    async fn get_all(&self) -> DriverResult<Vec<CustomerResponse>> {
        self.result.clone().map_err(DriverError::BackendError)
    }
}

/// A flag that can be observed after its owner is gone.
#[derive(Clone, Default)]
pub(crate) struct Flag(Arc<AtomicBool>);

impl Flag {
    pub(crate) fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sets a flag when dropped.
struct SetOnDrop(Flag);

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        self.0.0.store(true, Ordering::SeqCst);
    }
}

/// A repository whose queries never complete and that records when they are abandoned.
#[derive(Default)]
pub(crate) struct HangingRepository {
    cancelled: Flag,
}

impl HangingRepository {
    /// Returns a flag that becomes set once an in-flight query is dropped.
    pub(crate) fn cancelled(&self) -> Flag {
        self.cancelled.clone()
    }

    pub(crate) fn into_app(self) -> Router {
        app(Arc::new(self))
    }
}

#[async_trait]
impl CustomerRepository for HangingRepository {
    async fn get_all(&self) -> DriverResult<Vec<CustomerResponse>> {
        let _guard = SetOnDrop(self.cancelled.clone());
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(vec![])
    }
}

/// An application backed by a real database.
pub(crate) struct TestContext {
    db: Arc<SqliteDb>,
    app: Router,
}

impl TestContext {
    pub(crate) async fn setup() -> Self {
        let db = Arc::new(setup_sqlite().await);
        let driver = Driver::new(db.clone());
        let app = app(Arc::new(driver));
        Self { db, app }
    }

    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    pub(crate) async fn insert_customer(
        &self,
        first_name: &str,
        last_name: &str,
        created_at: OffsetDateTime,
    ) -> String {
        insert_customer(&mut self.db.ex().await.unwrap(), first_name, last_name, created_at)
            .await
            .unwrap()
    }

    pub(crate) async fn teardown(&self) {
        self.db.close().await;
    }
}
