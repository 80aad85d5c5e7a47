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

//! REST service that exposes the customer records of the CRM.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use crm_core::db::Db;
#[cfg(feature = "postgres")]
use crm_core::db::postgres::{PostgresDb, PostgresOptions};
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto;
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use log::{debug, error, info, warn};
#[cfg(feature = "postgres")]
use std::error::Error;
use std::future::Future;
use std::io;
#[cfg(feature = "postgres")]
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
#[cfg(feature = "postgres")]
use std::time::Instant;
use tokio::net::TcpListener;

pub mod db;
mod driver;
use driver::Driver;
pub mod model;
mod rest;
use rest::{REQUEST_TIMEOUT, app};

/// Pause after a failed `accept` so that persistent errors do not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Serves the application on `listener` using `db` for persistence until `shutdown` completes.
///
/// Clients get `REQUEST_TIMEOUT` to send a request head before their connection is dropped, and
/// the same amount of time again for the handler to respond.  In-flight requests are allowed to
/// finish after `shutdown` fires.  The caller retains ownership of `db` and is responsible for
/// closing it.
pub async fn run<F>(
    listener: TcpListener,
    db: Arc<dyn Db + Send + Sync>,
    shutdown: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let driver = Driver::new(db);
    let app = app(Arc::new(driver));

    let mut builder = auto::Builder::new(TokioExecutor::new());
    builder.http1().timer(TokioTimer::new()).header_read_timeout(REQUEST_TIMEOUT);
    let graceful = GracefulShutdown::new();

    info!("Listening for requests on {}", listener.local_addr()?);
    tokio::pin!(shutdown);
    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Cannot accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            },
            () = &mut shutdown => break,
        };

        let service = TowerToHyperService::new(app.clone());
        let conn = builder.serve_connection(TokioIo::new(stream), service).into_owned();
        let conn = graceful.watch(conn);
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!("Connection from {} ended with error: {}", peer, e);
            }
        });
    }

    drop(listener);
    graceful.shutdown().await;
    Ok(())
}

/// Waits until the process is asked to terminate via Ctrl+C or `SIGTERM`.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C"),
        () = terminate => info!("Received SIGTERM"),
    }
    info!("Shutting down; waiting for in-flight requests to complete");
}

/// Instantiates all resources to serve the application on `bind_addr`.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to expose many
/// crate-internal types to the public, which in turn would make dead code detection harder.
#[cfg(feature = "postgres")]
pub async fn serve(
    bind_addr: impl Into<SocketAddr>,
    db_opts: PostgresOptions,
) -> Result<(), Box<dyn Error>> {
    let started = Instant::now();

    let db = Arc::new(PostgresDb::connect(db_opts).await?);

    let bind_addr = bind_addr.into();
    let listener = match TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Cannot listen on {}: {}", bind_addr, e);
            db.close().await;
            return Err(e.into());
        }
    };

    let result = run(listener, db.clone(), shutdown_signal()).await;
    if let Err(e) = &result {
        error!("Server failed: {}", e);
    }

    db.close().await;
    info!("Server stopped after {}s of uptime", started.elapsed().as_secs());
    result?;
    Ok(())
}
