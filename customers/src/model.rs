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

//! High-level data types.

use derive_getters::Getters;
use derive_more::Constructor;
use serde::Serialize;
#[cfg(test)]
use serde::Deserialize;
use time::OffsetDateTime;

mod request;
pub use request::{Address, CustomerId, CustomerRequest, HashedPassword, PersonName, PhoneNumber};

/// A customer as returned by the read APIs.
///
/// The `full_name` is computed by the database as the first and last names joined by a single
/// space.  Both timestamps are in UTC.
#[derive(Clone, Constructor, Getters, Serialize)]
#[cfg_attr(test, derive(Debug, Deserialize, PartialEq))]
pub struct CustomerResponse {
    /// Unique identifier of the customer in textual form.
    id: String,

    /// First and last names of the customer.
    full_name: String,

    /// Email address of the customer, as stored.
    email: String,

    /// Phone number of the customer, as stored.
    phone: String,

    /// Postal address of the customer, as stored.
    address: String,

    /// When the customer was created.
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,

    /// When the customer was last modified.
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}
