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

//! Operations on the collection of customers.

use crate::db;
use crate::driver::{CustomerRepository, Driver};
use crate::model::CustomerResponse;
use async_trait::async_trait;
use crm_core::driver::DriverResult;
use log::{error, info};

#[async_trait]
impl CustomerRepository for Driver {
    async fn get_all(&self) -> DriverResult<Vec<CustomerResponse>> {
        let customers = async {
            let mut ex = self.db.ex().await?;
            db::get_customers(&mut ex).await
        }
        .await
        .inspect_err(|e| error!("Failed to get customers: {}", e))?;
        info!("Returning {} customers", customers.len());
        Ok(customers)
    }
}
