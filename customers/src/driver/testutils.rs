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

//! Test utilities for the business layer.

use crate::db::testutils::setup_sqlite;
use crate::driver::Driver;
use crm_core::db::sqlite::{self, SqliteDb};
use crm_core::db::{Db, Executor};
use std::sync::Arc;

pub(crate) struct TestContext {
    db: Arc<SqliteDb>,
    driver: Driver,
}

impl TestContext {
    /// Creates a driver backed by an in-memory database with the customers schema.
    pub(crate) async fn setup() -> Self {
        Self::with_db(setup_sqlite().await)
    }

    /// Creates a driver backed by an empty in-memory database.
    pub(crate) async fn setup_without_schema() -> Self {
        Self::with_db(sqlite::testutils::setup().await)
    }

    fn with_db(db: SqliteDb) -> Self {
        let db = Arc::new(db);
        let driver = Driver::new(db.clone());
        Self { db, driver }
    }

    /// Obtains a direct connection to the database to prepare test data.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Closes the database so that dropping the context does not warn.
    pub(crate) async fn teardown(&self) {
        self.db.close().await;
    }
}
