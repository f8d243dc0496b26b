//! Side effects the core asks the shell to perform.
//!
//! Each backend collaborator is a Crux capability whose operation is
//! serialized across the FFI boundary; the shell answers with the
//! operation's output and the core turns it into an [`Event`].

mod catalog;
mod geolocation;
mod locations;
mod store;

pub use self::catalog::{CatalogOperation, CatalogOutput, CatalogResult, CityCatalog};
pub use self::geolocation::{
    Geolocation, GeolocationError, GeolocationOperation, GeolocationResult,
};
pub use self::locations::{LocationOperation, LocationOutput, LocationResult, LocationStore};
pub use self::store::StoreError;

// Crux's built-in Render and Http capabilities are used as they are.
pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "crate::App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub geolocation: Geolocation<Event>,
    pub cities: CityCatalog<Event>,
    pub locations: LocationStore<Event>,
}
