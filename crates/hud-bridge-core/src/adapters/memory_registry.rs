//! # In-Memory Installation Registry
//!
//! Process-lifetime registry backed by a `HashMap`. Records are lost on
//! restart and never evicted.

use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};
use tracing::{debug, info};

use crate::registry::{CustomerRecord, InstallationRegistry, RegistryError};
use crate::{CustomerId, InstallationId, ValidationError};

/// Thread-safe in-memory registry.
///
/// Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct InMemoryInstallationRegistry {
    records: Arc<RwLock<HashMap<CustomerId, CustomerRecord>>>,
}

impl InMemoryInstallationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> RegistryError {
    RegistryError::Storage {
        message: "registry lock poisoned".to_string(),
    }
}

#[async_trait]
impl InstallationRegistry for InMemoryInstallationRegistry {
    async fn register(
        &self,
        customer_id: CustomerId,
        installation_id: InstallationId,
        repos: Vec<String>,
    ) -> Result<CustomerRecord, RegistryError> {
        let installation_id = InstallationId::try_new(installation_id.as_u64())
            .map_err(ValidationError::from)?;

        let record = CustomerRecord::new(customer_id.clone(), installation_id, repos);

        let previous = self
            .records
            .write()
            .map_err(poisoned)?
            .insert(customer_id.clone(), record.clone());

        if previous.is_some() {
            info!(
                customer_id = %customer_id,
                installation_id = %installation_id,
                "Customer registration replaced"
            );
        } else {
            info!(
                customer_id = %customer_id,
                installation_id = %installation_id,
                "Customer registered"
            );
        }

        Ok(record)
    }

    async fn lookup(&self, customer_id: &CustomerId) -> Result<CustomerRecord, RegistryError> {
        let record = self
            .records
            .read()
            .map_err(poisoned)?
            .get(customer_id)
            .cloned();

        match record {
            Some(record) => Ok(record),
            None => {
                debug!(customer_id = %customer_id, "Customer lookup missed");
                Err(RegistryError::NotFound {
                    customer_id: customer_id.clone(),
                })
            }
        }
    }

    async fn count(&self) -> Result<usize, RegistryError> {
        Ok(self.records.read().map_err(poisoned)?.len())
    }
}

#[cfg(test)]
#[path = "memory_registry_tests.rs"]
mod tests;
