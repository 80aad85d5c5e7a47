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

//! Input types to create or modify customers.

use crm_core::model::{EmailAddress, ModelError, ModelResult};
use derivative::Derivative;
use derive_getters::Getters;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::sync::LazyLock;

/// Minimum length of first and last names, in characters.
const MIN_NAME_LENGTH: usize = 2;

/// Maximum length of first and last names, in characters.
const MAX_NAME_LENGTH: usize = 100;

/// Shape of a phone number in E.164 format.
static E164_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9]?[0-9]{7,14}$").expect("Hardcoded regex must be valid"));

/// Identifier of an existing customer as supplied by a client.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(try_from = "String")]
pub struct CustomerId(String);

impl CustomerId {
    /// Creates a new identifier from an untrusted string `s`, making sure it is numeric.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(ModelError(format!("Customer id must be numeric but got '{}'", s)));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CustomerId {
    type Error = ModelError;

    fn try_from(s: String) -> ModelResult<Self> {
        Self::new(s)
    }
}

/// A first or last name.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(try_from = "String")]
pub struct PersonName(String);

impl PersonName {
    /// Creates a new name from an untrusted string `s`, making sure its length is within bounds.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        let length = s.chars().count();
        if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&length) {
            return Err(ModelError(format!(
                "Name must be between {} and {} characters long but '{}' has {}",
                MIN_NAME_LENGTH, MAX_NAME_LENGTH, s, length
            )));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PersonName {
    type Error = ModelError;

    fn try_from(s: String) -> ModelResult<Self> {
        Self::new(s)
    }
}

/// A phone number in E.164 format, such as `+14155552671`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(try_from = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Creates a new phone number from an untrusted string `s`, making sure it is in E.164 form.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if !E164_RE.is_match(&s) {
            return Err(ModelError(format!("Phone number '{}' is not in E.164 format", s)));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the phone number.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = ModelError;

    fn try_from(s: String) -> ModelResult<Self> {
        Self::new(s)
    }
}

/// A free-form postal address.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(try_from = "String")]
pub struct Address(String);

impl Address {
    /// Creates a new address from an untrusted string `s`, making sure it is not blank.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(ModelError("Address cannot be empty".to_owned()));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = ModelError;

    fn try_from(s: String) -> ModelResult<Self> {
        Self::new(s)
    }
}

/// A password that has already been hashed by the client.
#[derive(Clone, Deserialize, Eq, PartialEq)]
#[serde(try_from = "String")]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Creates a new hashed password from an untrusted string `s`, making sure it is not blank.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(ModelError("Hashed password cannot be empty".to_owned()));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the hash.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for HashedPassword {
    type Error = ModelError;

    fn try_from(s: String) -> ModelResult<Self> {
        Self::new(s)
    }
}

/// Deserializes an optional `CustomerId`, treating the empty string as absent.
fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<CustomerId>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => CustomerId::new(s).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Details of a customer as supplied by a client.
///
/// There is no API consuming this type yet.  Deserializing it validates every field, so holding
/// an instance is proof that the data is well-formed.
#[derive(Derivative, Deserialize, Getters)]
#[derivative(Debug)]
pub struct CustomerRequest {
    /// Identifier of the customer being modified, if any.
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    id: Option<CustomerId>,

    /// First name of the customer.
    first_name: PersonName,

    /// Last name of the customer.
    last_name: PersonName,

    /// Email address of the customer.
    email: EmailAddress,

    /// Phone number of the customer.
    phone: PhoneNumber,

    /// Postal address of the customer.
    address: Address,

    /// Hash of the customer's password.
    #[derivative(Debug = "ignore")]
    hashed_password: HashedPassword,
}
