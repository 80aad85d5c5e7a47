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

//! Generic abstraction to access different database systems.
//!
//! The facilities in this module provide an abstraction over different database systems such as
//! PostgreSQL and SQLite.  The PostgreSQL backend is for production use and the SQLite backend is
//! primarily intended to support unit tests.

use async_trait::async_trait;
use log::error;
use std::time::Duration;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Database errors.
///
/// Startup problems are classified as `Config` or `Connection` and are fatal to the process.
/// Everything that goes wrong while serving a request is a `Query`.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// Indicates that the database settings are missing or malformed.
    #[error("Invalid database configuration: {0}")]
    Config(String),

    /// Indicates that the database could not be reached or did not respond in time.
    #[error("Cannot connect to the database: {0}")]
    Connection(String),

    /// Indicates a failure executing a query or decoding its results.
    #[error("Query failed: {0}")]
    Query(String),
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// A database executor that can talk to multiple database implementations.
///
/// This type provides a generic mechanism to access a typed connection, which is needed by sqlx
/// to offer type safety guarantees.  Users of this type are forced to destructure it and issue
/// different calls for each database.
///
/// The wrapped connection goes back to the pool when the executor is dropped.
pub enum Executor {
    /// A PostgreSQL connection that can be used in `sqlx` operations.
    #[cfg(feature = "postgres")]
    Postgres(sqlx::pool::PoolConnection<sqlx::Postgres>),

    /// A SQLite connection that can be used in `sqlx` operations.
    #[cfg(feature = "sqlite")]
    Sqlite(sqlx::pool::PoolConnection<sqlx::Sqlite>),
}

/// Abstraction over the database connection pool.
#[async_trait]
pub trait Db {
    /// Obtains an executor for direct access to the pool.
    ///
    /// This would be better called `executor` but this method is used so frequently that it makes
    /// call sites too verbose.
    async fn ex(&self) -> DbResult<Executor>;

    /// Verifies that the database is reachable by round-tripping a trivial request through one of
    /// the pooled connections.
    async fn ping(&self) -> DbResult<()>;

    /// Closes all connections in the pool and waits for them to be released.
    async fn close(&self);
}

/// Pings `db` and gives up after `timeout`.
///
/// On failure, the pool is closed before returning so that the caller can simply drop `db`
/// without leaking any connections.
pub async fn check_liveness<D: Db + ?Sized>(db: &D, timeout: Duration) -> DbResult<()> {
    let result = match tokio::time::timeout(timeout, db.ping()).await {
        Ok(result) => result,
        Err(_) => Err(DbError::Connection(format!(
            "Ping did not complete within {}ms",
            timeout.as_millis()
        ))),
    };

    if let Err(e) = result {
        error!("Failed to ping database: {}", e);
        db.close().await;
        return Err(e);
    }
    Ok(())
}

/// Macros to help instantiate tests for multiple database systems.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    pub use paste::paste;

    /// Instantiates the `module::name` test for the database configured by `setup`.
    ///
    /// The `extra` metadata parameter can be used to tag the generated tests.
    #[macro_export]
    macro_rules! generate_one_test [
        ( $name:ident, $setup:expr, $module:path $(, #[$extra:meta] )? ) => {
            #[tokio::test]
            $(#[$extra])?
            async fn $name() {
                $crate::db::testutils::paste! {
                    $module :: [< $name >]($setup).await;
                }
            }
        }
    ];

    pub use generate_one_test;

    /// Instantiates a collection of tests for a specific database system.
    ///
    /// The database implementation to run the tests against is determined by the `setup`
    /// expression, which needs to return a database object.  The returned database should also
    /// have been initialized with the desired schema.
    ///
    /// The `extra` metadata parameter can be used to tag the generated tests.
    #[macro_export]
    macro_rules! generate_tests [
        ( #[$extra:meta], $setup:expr, $module:path $(, $name:ident)+ ) => {
            $(
                $crate::db::testutils::generate_one_test!($name, $setup, $module, #[$extra]);
            )+
        };

        ( $setup:expr, $module:path $(, $name:ident)+ ) => {
            $(
                $crate::db::testutils::generate_one_test!($name, $setup, $module);
            )+
        };
    ];

    pub use generate_tests;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Outcome of a ping against a `FakeDb`.
    enum PingBehavior {
        Succeed,
        Fail,
        Hang,
    }

    /// A database whose ping outcome is scripted and that records whether it was closed.
    struct FakeDb {
        ping: PingBehavior,
        closed: AtomicBool,
    }

    impl FakeDb {
        fn new(ping: PingBehavior) -> Self {
            Self { ping, closed: AtomicBool::new(false) }
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Db for FakeDb {
        async fn ex(&self) -> DbResult<Executor> {
            Err(DbError::Connection("FakeDb has no connections".to_owned()))
        }

        async fn ping(&self) -> DbResult<()> {
            match self.ping {
                PingBehavior::Succeed => Ok(()),
                PingBehavior::Fail => Err(DbError::Connection("Connection refused".to_owned())),
                PingBehavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
            }
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_check_liveness_ok_keeps_pool_open() {
        let db = FakeDb::new(PingBehavior::Succeed);
        check_liveness(&db, Duration::from_secs(5)).await.unwrap();
        assert!(!db.is_closed());
    }

    #[tokio::test]
    async fn test_check_liveness_failure_closes_pool() {
        let db = FakeDb::new(PingBehavior::Fail);
        assert_eq!(
            DbError::Connection("Connection refused".to_owned()),
            check_liveness(&db, Duration::from_secs(5)).await.unwrap_err()
        );
        assert!(db.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_liveness_timeout_closes_pool() {
        let db = FakeDb::new(PingBehavior::Hang);
        match check_liveness(&db, Duration::from_secs(5)).await {
            Err(DbError::Connection(msg)) => assert!(msg.contains("5000ms"), "Got: {}", msg),
            e => panic!("Must have failed with a Connection error but got: {:?}", e),
        }
        assert!(db.is_closed());
    }

    /// Runs a `query` on `ex` and does not care about its results.  The `query` must be valid for
    /// all possible database implementations.
    #[cfg(any(feature = "postgres", feature = "sqlite"))]
    async fn exec(ex: &mut Executor, query: &str) {
        match ex {
            #[cfg(feature = "postgres")]
            Executor::Postgres(conn) => {
                sqlx::query(query).execute(&mut **conn).await.unwrap();
            }

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(conn) => {
                sqlx::query(query).execute(&mut **conn).await.unwrap();
            }
        }
    }

    /// Runs a `query` on `ex` that fetches a single row with an `i64` value on `column` and returns
    /// that value.  The `query` must be valid for all possible database implementations.
    #[cfg(any(feature = "postgres", feature = "sqlite"))]
    async fn query_i64(ex: &mut Executor, column: &str, query: &str) -> i64 {
        use sqlx::Row;

        match ex {
            #[cfg(feature = "postgres")]
            Executor::Postgres(conn) => {
                let row = sqlx::query(query).fetch_one(&mut **conn).await.unwrap();
                row.try_get(column).unwrap()
            }

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(conn) => {
                let row = sqlx::query(query).fetch_one(&mut **conn).await.unwrap();
                row.try_get(column).unwrap()
            }
        }
    }

    #[cfg(any(feature = "postgres", feature = "sqlite"))]
    pub(super) async fn test_direct_execution(db: Box<dyn Db>) {
        exec(&mut db.ex().await.unwrap(), "CREATE TABLE test (i INTEGER)").await;
        exec(&mut db.ex().await.unwrap(), "INSERT INTO test (i) VALUES (3)").await;
        assert_eq!(
            1,
            query_i64(&mut db.ex().await.unwrap(), "count", "SELECT COUNT(*) AS count FROM test")
                .await
        );
        db.close().await;
    }

    #[cfg(any(feature = "postgres", feature = "sqlite"))]
    pub(super) async fn test_ping_ok(db: Box<dyn Db>) {
        db.ping().await.unwrap();
        check_liveness(db.as_ref(), Duration::from_secs(5)).await.unwrap();
        db.close().await;
    }

    #[cfg(any(feature = "postgres", feature = "sqlite"))]
    pub(super) async fn test_ping_after_close(db: Box<dyn Db>) {
        db.close().await;
        match db.ping().await {
            Err(DbError::Connection(_)) => (),
            e => panic!("Must have failed with a Connection error but got: {:?}", e),
        }
    }

    #[cfg(any(feature = "postgres", feature = "sqlite"))]
    pub(super) async fn test_concurrent_executors(db: Box<dyn Db>) {
        let ex1 = db.ex().await.unwrap();
        let ex2 = db.ex().await.unwrap();
        drop(ex1);
        drop(ex2);
        db.close().await;
    }

    /// Instantiates tests that need write access to the test database.
    #[cfg(any(feature = "postgres", feature = "sqlite"))]
    #[macro_export]
    macro_rules! generate_db_rw_tests [
        ( $setup:expr $(, #[$extra:meta])? ) => {
            $crate::db::testutils::generate_tests!(
                $( #[$extra], )?
                $setup,
                $crate::db::tests,
                test_direct_execution,
                test_ping_ok,
                test_ping_after_close
            );
        }
    ];

    #[cfg(any(feature = "postgres", feature = "sqlite"))]
    pub(super) use generate_db_rw_tests;

    /// Instantiates tests that need more than one connection open at once.  These tests cannot
    /// write to the database.
    #[cfg(any(feature = "postgres", feature = "sqlite"))]
    #[macro_export]
    macro_rules! generate_db_ro_concurrent_tests [
        ( $setup:expr $(, #[$extra:meta])? ) => {
            $crate::db::testutils::generate_tests!(
                $( #[$extra], )?
                $setup,
                $crate::db::tests,
                test_concurrent_executors
            );
        }
    ];

    #[cfg(any(feature = "postgres", feature = "sqlite"))]
    pub(super) use generate_db_ro_concurrent_tests;
}
