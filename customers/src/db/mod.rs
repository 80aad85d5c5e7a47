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

//! Database abstraction to read the customers table.

use crate::model::CustomerResponse;
#[cfg(feature = "postgres")]
use crm_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use crm_core::db::sqlite::{self, build_timestamp};
use crm_core::db::{DbError, DbResult, Executor};
use futures::TryStreamExt;
use log::{error, info};
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
#[cfg(feature = "postgres")]
use time::{OffsetDateTime, UtcOffset};

#[cfg(test)]
pub(crate) mod testutils;

/// Query to fetch all customers on PostgreSQL, newest first.
///
/// The sort keys are qualified with the table name because the output columns shadow them with
/// different types.
#[cfg(feature = "postgres")]
const GET_CUSTOMERS_PGSQL: &str = "
    SELECT
        id::TEXT AS id,
        CONCAT(first_name, ' ', last_name) AS full_name,
        email, phone, address, created_at, updated_at
    FROM customers
    ORDER BY customers.created_at DESC, customers.id DESC
";

/// Query to fetch all customers on SQLite, newest first.
#[cfg(any(feature = "sqlite", test))]
const GET_CUSTOMERS_SQLITE: &str = "
    SELECT
        CAST(id AS TEXT) AS id,
        first_name || ' ' || last_name AS full_name,
        email, phone, address,
        created_at_secs, created_at_nsecs, updated_at_secs, updated_at_nsecs
    FROM customers
    ORDER BY created_at_secs DESC, created_at_nsecs DESC, customers.id DESC
";

/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for CustomerResponse {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let full_name: String = row.try_get("full_name").map_err(postgres::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(postgres::map_sqlx_error)?;
        let phone: String = row.try_get("phone").map_err(postgres::map_sqlx_error)?;
        let address: String = row.try_get("address").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;
        let updated_at: OffsetDateTime =
            row.try_get("updated_at").map_err(postgres::map_sqlx_error)?;

        Ok(CustomerResponse::new(
            id,
            full_name,
            email,
            phone,
            address,
            created_at.to_offset(UtcOffset::UTC),
            updated_at.to_offset(UtcOffset::UTC),
        ))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for CustomerResponse {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let full_name: String = row.try_get("full_name").map_err(sqlite::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(sqlite::map_sqlx_error)?;
        let phone: String = row.try_get("phone").map_err(sqlite::map_sqlx_error)?;
        let address: String = row.try_get("address").map_err(sqlite::map_sqlx_error)?;
        let created_at_secs: i64 =
            row.try_get("created_at_secs").map_err(sqlite::map_sqlx_error)?;
        let created_at_nsecs: i64 =
            row.try_get("created_at_nsecs").map_err(sqlite::map_sqlx_error)?;
        let updated_at_secs: i64 =
            row.try_get("updated_at_secs").map_err(sqlite::map_sqlx_error)?;
        let updated_at_nsecs: i64 =
            row.try_get("updated_at_nsecs").map_err(sqlite::map_sqlx_error)?;

        Ok(CustomerResponse::new(
            id,
            full_name,
            email,
            phone,
            address,
            build_timestamp(created_at_secs, created_at_nsecs)?,
            build_timestamp(updated_at_secs, updated_at_nsecs)?,
        ))
    }
}

/// Drains the rows returned by `rows`, converting each into a `T`.
///
/// Conversion stops at the first failure and the remaining rows are discarded along with the
/// stream, which releases the underlying cursor.
async fn collect_rows<R, T, S>(
    mut rows: S,
    map_err: fn(sqlx::Error) -> DbError,
) -> DbResult<Vec<T>>
where
    S: futures::Stream<Item = Result<R, sqlx::Error>> + Unpin,
    T: TryFrom<R, Error = DbError>,
{
    let mut items = vec![];
    while let Some(row) = rows.try_next().await.map_err(map_err)? {
        items.push(T::try_from(row)?);
    }
    Ok(items)
}

/// Gets all customers, sorted by creation time with the newest first.
///
/// Customers created at the same instant are sorted by descending identifier.
pub(crate) async fn get_customers(ex: &mut Executor) -> DbResult<Vec<CustomerResponse>> {
    let (query_str, result) = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let rows = sqlx::query(GET_CUSTOMERS_PGSQL).fetch(&mut **ex);
            (GET_CUSTOMERS_PGSQL, collect_rows(rows, postgres::map_sqlx_error).await)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let rows = sqlx::query(GET_CUSTOMERS_SQLITE).fetch(&mut **ex);
            (GET_CUSTOMERS_SQLITE, collect_rows(rows, sqlite::map_sqlx_error).await)
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    match result {
        Ok(customers) => {
            info!("Fetched {} customers", customers.len());
            Ok(customers)
        }
        Err(e) => {
            error!("Customers query failed: {}; query was: {}", e, query_str.trim());
            Err(e)
        }
    }
}
