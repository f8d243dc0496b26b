use serde::{Deserialize, Serialize};

use crate::capabilities::{GeolocationError, StoreError};
use crate::city::FetchTicket;
use crate::geocode::{GeocodeError, ResolvedAddress};
use crate::model::{LatLon, LocationDraft, LocationId, LocationRecord, NewLocation};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub enum Event {
    #[default]
    Noop,

    AppStarted,

    /// For shells that resolve the address natively instead of handing the
    /// core a position.
    DeviceAddressResolved {
        address: Option<String>,
    },

    RefreshCatalog,

    OpenCityPicker,
    CloseCityPicker,
    CitySelected {
        city: String,
    },
    AddCityRequested {
        name: String,
    },

    CategorySelected {
        category: Option<String>,
    },

    AddLocationRequested {
        draft: LocationDraft,
    },

    DismissError,
    DismissToast,

    // --- capability responses, never sent by the shell ---
    #[serde(skip)]
    DevicePositionResolved(Result<LatLon, GeolocationError>),
    #[serde(skip)]
    ReverseGeocoded(Result<Option<String>, GeocodeError>),
    #[serde(skip)]
    CatalogFetched(Result<Vec<String>, StoreError>),
    #[serde(skip)]
    CityCreated {
        name: String,
        result: Result<(), StoreError>,
    },
    #[serde(skip)]
    LocationsFetched {
        ticket: FetchTicket,
        result: Result<Vec<LocationRecord>, StoreError>,
    },
    #[serde(skip)]
    CityGeocoded {
        city: String,
        result: Result<Option<LatLon>, GeocodeError>,
    },
    #[serde(skip)]
    LocationAddressResolved {
        draft: LocationDraft,
        result: Result<Option<ResolvedAddress>, GeocodeError>,
    },
    #[serde(skip)]
    LocationCityEnsured {
        location: NewLocation,
        result: Result<(), StoreError>,
    },
    #[serde(skip)]
    LocationCreated {
        city: String,
        result: Result<LocationId, StoreError>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::AppStarted => "app_started",
            Self::DeviceAddressResolved { .. } => "device_address_resolved",
            Self::RefreshCatalog => "refresh_catalog",
            Self::OpenCityPicker => "open_city_picker",
            Self::CloseCityPicker => "close_city_picker",
            Self::CitySelected { .. } => "city_selected",
            Self::AddCityRequested { .. } => "add_city_requested",
            Self::CategorySelected { .. } => "category_selected",
            Self::AddLocationRequested { .. } => "add_location_requested",
            Self::DismissError => "dismiss_error",
            Self::DismissToast => "dismiss_toast",
            Self::DevicePositionResolved(_) => "device_position_resolved",
            Self::ReverseGeocoded(_) => "reverse_geocoded",
            Self::CatalogFetched(_) => "catalog_fetched",
            Self::CityCreated { .. } => "city_created",
            Self::LocationsFetched { .. } => "locations_fetched",
            Self::CityGeocoded { .. } => "city_geocoded",
            Self::LocationAddressResolved { .. } => "location_address_resolved",
            Self::LocationCityEnsured { .. } => "location_city_ensured",
            Self::LocationCreated { .. } => "location_created",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::RefreshCatalog
                | Self::OpenCityPicker
                | Self::CloseCityPicker
                | Self::CitySelected { .. }
                | Self::AddCityRequested { .. }
                | Self::CategorySelected { .. }
                | Self::AddLocationRequested { .. }
                | Self::DismissError
                | Self::DismissToast
        )
    }
}
