use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use super::store::StoreError;

/// The global `cities` collection, one document per normalized city name.
pub struct CityCatalog<E> {
    context: CapabilityContext<CatalogOperation, E>,
}

impl<Ev> Capability<Ev> for CityCatalog<Ev> {
    type Operation = CatalogOperation;
    type MappedSelf<MappedEv> = CityCatalog<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        CityCatalog::new(self.context.map_event(f))
    }
}

impl<E> CityCatalog<E>
where
    E: Send + 'static,
{
    pub fn new(context: CapabilityContext<CatalogOperation, E>) -> Self {
        Self { context }
    }

    /// Read every city name in the catalog, in the order the backend
    /// returns them.
    pub fn list_cities<F>(&self, callback: F)
    where
        F: FnOnce(Result<Vec<String>, StoreError>) -> E + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = match ctx.request_from_shell(CatalogOperation::ListCities).await {
                Ok(CatalogOutput::Cities(cities)) => Ok(cities),
                Ok(_) => Err(StoreError::UnexpectedOutput {
                    operation: "list_cities".into(),
                }),
                Err(e) => Err(e),
            };
            ctx.update_app(callback(result));
        });
    }

    /// Create the document for `normalized_name` unless it already exists.
    /// An existing document is a success.
    pub fn create_city_if_absent<F>(&self, normalized_name: String, original_name: String, callback: F)
    where
        F: FnOnce(Result<(), StoreError>) -> E + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let operation = CatalogOperation::CreateCityIfAbsent {
                normalized_name,
                original_name,
            };
            let result = match ctx.request_from_shell(operation).await {
                Ok(CatalogOutput::Written) => Ok(()),
                Ok(_) => Err(StoreError::UnexpectedOutput {
                    operation: "create_city_if_absent".into(),
                }),
                Err(e) => Err(e),
            };
            ctx.update_app(callback(result));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CatalogOperation {
    ListCities,
    CreateCityIfAbsent {
        normalized_name: String,
        original_name: String,
    },
}

impl Operation for CatalogOperation {
    type Output = CatalogResult;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CatalogOutput {
    Cities(Vec<String>),
    Written,
}

pub type CatalogResult = Result<CatalogOutput, StoreError>;
