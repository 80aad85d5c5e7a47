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

//! Test utilities to populate the customers table.

use crate::db::init_schema;
#[cfg(feature = "postgres")]
use crm_core::db::postgres;
use crm_core::db::sqlite::{self, unpack_timestamp};
use crm_core::db::{Db, DbResult, Executor};
#[cfg(feature = "postgres")]
use sqlx::Row;
use time::{Duration, OffsetDateTime};

/// Inserts a customer named `first_name last_name` created at `created_at` and returns its
/// identifier as assigned by the database.
///
/// The remaining fields are derived from the name so that tests can predict them.  The update
/// time is one hour after the creation time.
pub(crate) async fn insert_customer(
    ex: &mut Executor,
    first_name: &str,
    last_name: &str,
    created_at: OffsetDateTime,
) -> DbResult<String> {
    let email = sample_email(first_name, last_name);
    let phone = "+15555550100";
    let address = sample_address(last_name);
    let updated_at = created_at + Duration::hours(1);

    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO customers
                    (first_name, last_name, email, phone, address, hashed_password,
                     created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING id::TEXT AS id
            ";
            let row = sqlx::query(query_str)
                .bind(first_name)
                .bind(last_name)
                .bind(&email)
                .bind(phone)
                .bind(&address)
                .bind("not-a-real-hash")
                .bind(created_at)
                .bind(updated_at)
                .fetch_one(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)
        }

        Executor::Sqlite(ex) => {
            let (created_at_secs, created_at_nsecs) = unpack_timestamp(created_at);
            let (updated_at_secs, updated_at_nsecs) = unpack_timestamp(updated_at);
            let query_str = "
                INSERT INTO customers
                    (first_name, last_name, email, phone, address, hashed_password,
                     created_at_secs, created_at_nsecs, updated_at_secs, updated_at_nsecs)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ";
            let done = sqlx::query(query_str)
                .bind(first_name)
                .bind(last_name)
                .bind(&email)
                .bind(phone)
                .bind(&address)
                .bind("not-a-real-hash")
                .bind(created_at_secs)
                .bind(created_at_nsecs)
                .bind(updated_at_secs)
                .bind(updated_at_nsecs)
                .execute(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Ok(done.last_insert_rowid().to_string())
        }
    }
}

/// Returns the email address that `insert_customer` assigns to a customer.
pub(crate) fn sample_email(first_name: &str, last_name: &str) -> String {
    format!("{}.{}@example.com", first_name, last_name).to_lowercase()
}

/// Returns the postal address that `insert_customer` assigns to a customer.
pub(crate) fn sample_address(last_name: &str) -> String {
    format!("1 {} Street, Springfield", last_name)
}

/// Creates an in-memory SQLite database with the customers schema.
pub(crate) async fn setup_sqlite() -> sqlite::SqliteDb {
    let db = sqlite::testutils::setup().await;
    init_schema(&mut db.ex().await.unwrap()).await.unwrap();
    db
}

/// Connects to the PostgreSQL test database and creates the customers schema in it.
#[cfg(feature = "postgres")]
pub(crate) async fn setup_postgres() -> postgres::PostgresDb {
    let db = postgres::testutils::setup().await;
    init_schema(&mut db.ex().await.unwrap()).await.unwrap();
    db
}
