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

//! Entry point to the REST server.

use crate::driver::SharedRepository;
use axum::Router;
use axum::http::StatusCode;
use log::info;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

mod customers_get;
#[cfg(test)]
mod testutils;

/// Maximum time allowed to receive a request head, and separately to produce its response.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates the router for the application.
pub(crate) fn app(repo: SharedRepository) -> Router {
    use axum::routing::get;

    info!("Registering route GET /customers");
    Router::new()
        .route("/customers", get(customers_get::handler))
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, REQUEST_TIMEOUT))
        .with_state(repo)
}
