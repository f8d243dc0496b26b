use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use super::store::StoreError;
use crate::model::{LocationId, LocationRecord, NewLocation};

/// Points of interest stored under each city document.
pub struct LocationStore<E> {
    context: CapabilityContext<LocationOperation, E>,
}

impl<Ev> Capability<Ev> for LocationStore<Ev> {
    type Operation = LocationOperation;
    type MappedSelf<MappedEv> = LocationStore<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        LocationStore::new(self.context.map_event(f))
    }
}

impl<E> LocationStore<E>
where
    E: Send + 'static,
{
    pub fn new(context: CapabilityContext<LocationOperation, E>) -> Self {
        Self { context }
    }

    pub fn list_locations<F>(&self, city: String, callback: F)
    where
        F: FnOnce(Result<Vec<LocationRecord>, StoreError>) -> E + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = match ctx
                .request_from_shell(LocationOperation::ListLocations { city })
                .await
            {
                Ok(LocationOutput::Locations(locations)) => Ok(locations),
                Ok(_) => Err(StoreError::UnexpectedOutput {
                    operation: "list_locations".into(),
                }),
                Err(e) => Err(e),
            };
            ctx.update_app(callback(result));
        });
    }

    /// Add a document under `location.city`. The backend assigns the id.
    pub fn create_location<F>(&self, location: NewLocation, callback: F)
    where
        F: FnOnce(Result<LocationId, StoreError>) -> E + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = match ctx
                .request_from_shell(LocationOperation::CreateLocation { location })
                .await
            {
                Ok(LocationOutput::Created(id)) => Ok(id),
                Ok(_) => Err(StoreError::UnexpectedOutput {
                    operation: "create_location".into(),
                }),
                Err(e) => Err(e),
            };
            ctx.update_app(callback(result));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LocationOperation {
    ListLocations { city: String },
    CreateLocation { location: NewLocation },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LocationOutput {
    Locations(Vec<LocationRecord>),
    Created(LocationId),
}

impl Operation for LocationOperation {
    type Output = LocationResult;
}

pub type LocationResult = Result<LocationOutput, StoreError>;
