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

//! Entry point to the customers service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use crm_core::db::postgres::PostgresOptions;
use crm_customers::serve;
use log::error;
use std::net::Ipv4Addr;
use std::process;

/// Port on which the service listens on all interfaces.
const PORT: u16 = 8080;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let db_opts = match PostgresOptions::from_env("DATABASE") {
        Ok(db_opts) => db_opts,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = serve((Ipv4Addr::UNSPECIFIED, PORT), db_opts).await {
        error!("Cannot start server: {}", e);
        process::exit(1);
    }
}
