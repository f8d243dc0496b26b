// lib.rs - CityShare shared core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]

pub mod capabilities;
pub mod city;
pub mod event;
pub mod geocode;
pub mod map;
pub mod model;
pub mod normalize;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use city::{auto_select, filtered, CityState, FetchTicket};
pub use event::Event;
pub use model::{LatLon, LocationRecord, Model};
pub use normalize::normalize_city_name;

use capabilities::{GeolocationError, StoreError};
use geocode::GeocodeError;
use normalize::CityNameError;

/// Selected city before anything is known, and whenever the catalog is
/// empty. No locations are ever queried for it.
pub const UNKNOWN_CITY: &str = "Unknown";
pub const NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const GEOCODER_USER_AGENT: &str = "CityShareApp/1.0";
pub const DEFAULT_MAP_ZOOM: f64 = 12.0;
pub const CITY_MAP_ZOOM: f64 = 13.0;

/// Categories offered when adding or filtering locations. Filtering is an
/// exact match and is not restricted to this list.
pub const KNOWN_CATEGORIES: &[&str] = &[
    "Restaurant",
    "Museum",
    "Club/Nightlife",
    "Park/Nature",
    "Shopping",
    "Entertainment",
    "Cafe/Bar",
    "Historic Site",
    "Sports/Recreation",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Authorization,
    Validation,
    NotFound,
    Deserialization,
    Location,
    LocationPermissionDenied,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Authorization => "FORBIDDEN",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Location => "LOCATION_ERROR",
            Self::LocationPermissionDenied => "LOCATION_PERMISSION_DENIED",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Timeout | Self::Location => ErrorSeverity::Transient,

            Self::Authorization
            | Self::Validation
            | Self::NotFound
            | Self::Deserialization
            | Self::LocationPermissionDenied
            | Self::Unknown => ErrorSeverity::Permanent,
        }
    }

    /// Whether asking again (reselecting the city, refreshing) may help.
    /// The core itself never retries.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Location)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Authorization => {
                "You don't have permission to perform this action.".into()
            }
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::NotFound => "The requested item could not be found.".into(),
            ErrorKind::Deserialization => {
                "Some data could not be read. Please try again later.".into()
            }
            ErrorKind::Location => {
                "Unable to determine your location. Please check your GPS settings.".into()
            }
            ErrorKind::LocationPermissionDenied => {
                "Location access is off. Pick your city manually or enable location in Settings."
                    .into()
            }
            ErrorKind::Unknown => {
                "An unexpected error occurred. Please try again.".into()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoordinateError {
    #[error("Latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("Longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("Coordinate value is not finite (NaN or Infinity)")]
    NonFinite,
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        let kind = match &e {
            StoreError::Unavailable(_) => ErrorKind::Network,
            StoreError::Timeout => ErrorKind::Timeout,
            StoreError::PermissionDenied(_) => ErrorKind::Authorization,
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Malformed { .. } => ErrorKind::Deserialization,
            StoreError::UnexpectedOutput { .. } => ErrorKind::Unknown,
        };
        AppError::new(kind, "Backend request failed").with_internal(e.to_string())
    }
}

impl From<GeocodeError> for AppError {
    fn from(e: GeocodeError) -> Self {
        let kind = match &e {
            GeocodeError::Request(_) | GeocodeError::Status(_) => ErrorKind::Network,
            GeocodeError::EmptyBody | GeocodeError::Parse(_) => ErrorKind::Deserialization,
            GeocodeError::InvalidUrl(_) => ErrorKind::Unknown,
        };
        AppError::new(kind, "Geocoding failed").with_internal(e.to_string())
    }
}

impl From<GeolocationError> for AppError {
    fn from(e: GeolocationError) -> Self {
        let kind = match &e {
            GeolocationError::PermissionDenied => ErrorKind::LocationPermissionDenied,
            GeolocationError::Unavailable | GeolocationError::Failed { .. } => ErrorKind::Location,
        };
        AppError::new(kind, e.to_string())
    }
}

impl From<CityNameError> for AppError {
    fn from(e: CityNameError) -> Self {
        match e {
            CityNameError::Empty => AppError::new(ErrorKind::Validation, "Please enter a city name."),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LocationCard {
    pub id: String,
    pub name: String,
    pub category: String,
    pub address: String,
    pub rating_text: String,
    pub image_url: Option<String>,
}

impl From<&LocationRecord> for LocationCard {
    fn from(l: &LocationRecord) -> Self {
        Self {
            id: l.id.to_string(),
            name: l.name.clone(),
            category: l.category.clone(),
            address: l.address.clone(),
            rating_text: l.rating_text(),
            image_url: l.image_urls.first().cloned(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToastView {
    pub message: String,
    pub kind: model::ToastKind,
    pub duration_ms: u64,
}

impl From<&model::ToastMessage> for ToastView {
    fn from(t: &model::ToastMessage) -> Self {
        Self {
            message: t.message.clone(),
            kind: t.kind,
            duration_ms: t.duration_ms,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    /// Device address as resolved (a locality or a full street address),
    /// `"Unknown"` if not (yet) available.
    pub detected_address: String,
    pub selected_city: String,
    pub cities: Vec<String>,
    pub show_city_picker: bool,
    pub selected_category: Option<String>,
    pub categories: Vec<String>,
    pub locations: Vec<LocationCard>,
    pub total_location_count: usize,
    pub is_loading: bool,
    pub is_submitting_location: bool,
    pub map_center_lat: Option<f64>,
    pub map_center_lon: Option<f64>,
    pub map_zoom: f64,
    pub map_geojson: String,
    pub error: Option<UserFacingError>,
    pub toast: Option<ToastView>,
}

pub mod app {
    use tracing::{debug, info, warn};

    use super::*;
    use crate::city::FetchOutcome;
    use crate::geocode::{self, GeocodeError, ResolvedAddress};
    use crate::model::{LocationDraft, ToastKind};

    #[derive(Default)]
    pub struct App;

    impl App {
        fn apply_address(address: Option<String>, model: &mut Model, caps: &Capabilities) {
            let ticket = model.city.apply_address(address);
            Self::start_fetch(ticket, caps);
        }

        /// Query locations for a newly selected city and look up where to
        /// centre the map on it.
        fn start_fetch(ticket: Option<FetchTicket>, caps: &Capabilities) {
            let Some(ticket) = ticket else {
                return;
            };

            Self::request_city_geocode(&ticket.city, caps);
            Self::query_locations(ticket, caps);
        }

        fn query_locations(ticket: FetchTicket, caps: &Capabilities) {
            info!(city = %ticket.city, generation = ticket.generation, "fetching locations");

            let city = ticket.city.clone();
            caps.locations
                .list_locations(city, move |result| Event::LocationsFetched { ticket, result });
        }

        fn request_address_lookup(draft: LocationDraft, model: &mut Model, caps: &Capabilities) {
            let url = match geocode::address_search_url(&draft.address) {
                Ok(url) => url,
                Err(e) => {
                    warn!(error = %e, "cannot build address lookup request");
                    model.is_submitting_location = false;
                    model.set_error(AppError::from(e));
                    return;
                }
            };

            model.is_submitting_location = true;
            caps.http
                .get(url.as_str())
                .header("User-Agent", GEOCODER_USER_AGENT)
                .send(move |result| Event::LocationAddressResolved {
                    draft,
                    result: geocode::address_search_outcome(result),
                });
        }

        /// Catalog key, raw locality and position for a looked-up address.
        /// An address without a locality cannot be filed under a city.
        fn locate(
            result: Result<Option<ResolvedAddress>, GeocodeError>,
        ) -> AppResult<(String, String, LatLon)> {
            let invalid = || {
                AppError::new(
                    ErrorKind::Validation,
                    "Invalid address. Please enter a valid address.",
                )
            };

            let resolved = result.map_err(AppError::from)?.ok_or_else(invalid)?;
            let locality = resolved.locality.ok_or_else(invalid)?;
            let city = normalize_city_name(&locality).map_err(|_| invalid())?;
            Ok((city, locality, resolved.position))
        }

        fn request_reverse_geocode(position: LatLon, model: &mut Model, caps: &Capabilities) {
            let url = match geocode::reverse_url(position) {
                Ok(url) => url,
                Err(e) => {
                    warn!(error = %e, "cannot build reverse geocoding request");
                    Self::apply_address(None, model, caps);
                    return;
                }
            };

            caps.http
                .get(url.as_str())
                .header("User-Agent", GEOCODER_USER_AGENT)
                .send(|result| Event::ReverseGeocoded(geocode::reverse_outcome(result)));
        }

        fn request_city_geocode(city: &str, caps: &Capabilities) {
            let url = match geocode::search_url(city) {
                Ok(url) => url,
                Err(e) => {
                    warn!(city, error = %e, "cannot build city geocoding request");
                    return;
                }
            };

            let city = city.to_string();
            caps.http
                .get(url.as_str())
                .header("User-Agent", GEOCODER_USER_AGENT)
                .send(move |result| Event::CityGeocoded {
                    city,
                    result: geocode::search_outcome(result),
                });
        }

        fn request_catalog(caps: &Capabilities) {
            caps.cities.list_cities(Event::CatalogFetched);
        }

        fn build_view(model: &Model) -> ViewModel {
            let city = &model.city;
            let visible = city.filtered_locations();

            let map_geojson =
                crate::map::to_geojson_string(&crate::map::feature_collection(visible.iter().copied()));

            ViewModel {
                detected_address: city
                    .detected_address()
                    .unwrap_or(UNKNOWN_CITY)
                    .to_string(),
                selected_city: city.selected_city().to_string(),
                cities: city.catalog().to_vec(),
                show_city_picker: model.show_city_picker,
                selected_category: city.category().map(str::to_string),
                categories: KNOWN_CATEGORIES.iter().map(|c| (*c).to_string()).collect(),
                locations: visible.iter().map(|l| LocationCard::from(*l)).collect(),
                total_location_count: city.locations().len(),
                is_loading: city.is_loading(),
                is_submitting_location: model.is_submitting_location,
                map_center_lat: model.map_center.map(|c| c.lat),
                map_center_lon: model.map_center.map(|c| c.lon),
                map_zoom: model.map_zoom,
                map_geojson,
                error: model.active_error.as_ref().map(UserFacingError::from),
                toast: model.active_toast.as_ref().map(ToastView::from),
            }
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            let _span = tracing::debug_span!("update", event = event.name()).entered();

            if event.is_user_initiated() {
                debug!("user action");
            }

            match event {
                Event::Noop => {}

                Event::AppStarted => {
                    caps.geolocation
                        .current_position(Event::DevicePositionResolved);
                    Self::request_catalog(caps);
                }

                Event::DevicePositionResolved(Ok(position)) => match position.validated() {
                    Ok(position) => {
                        model.device_position = Some(position);
                        if model.map_center.is_none() {
                            model.map_center = Some(position);
                            model.map_zoom = DEFAULT_MAP_ZOOM;
                        }
                        Self::request_reverse_geocode(position, model, caps);
                    }
                    Err(e) => {
                        warn!(error = %e, "device reported an invalid position");
                        Self::apply_address(None, model, caps);
                    }
                },

                Event::DevicePositionResolved(Err(e)) => {
                    warn!(error = %e, "device position unavailable");
                    let notice = AppError::from(e);
                    model.show_toast(notice.user_facing_message(), ToastKind::Info);
                    Self::apply_address(None, model, caps);
                }

                Event::ReverseGeocoded(Ok(address)) | Event::DeviceAddressResolved { address } => {
                    Self::apply_address(address, model, caps);
                }

                Event::ReverseGeocoded(Err(e)) => {
                    warn!(error = %e, "reverse geocoding failed");
                    Self::apply_address(None, model, caps);
                }

                Event::RefreshCatalog => {
                    Self::request_catalog(caps);
                }

                Event::CatalogFetched(Ok(cities)) => {
                    let ticket = model.city.apply_catalog(cities);
                    Self::start_fetch(ticket, caps);
                }

                Event::CatalogFetched(Err(e)) => {
                    warn!(error = %e, "city catalog fetch failed");
                    if !model.city.is_catalog_loaded() {
                        let ticket = model.city.apply_catalog(Vec::new());
                        Self::start_fetch(ticket, caps);
                    }
                    model.set_error(AppError::from(e));
                }

                Event::OpenCityPicker => {
                    model.show_city_picker = true;
                }

                Event::CloseCityPicker => {
                    model.show_city_picker = false;
                }

                Event::CitySelected { city } => {
                    model.show_city_picker = false;
                    let ticket = model.city.select_city(&city);
                    Self::start_fetch(ticket, caps);
                }

                Event::AddCityRequested { name } => match model.city.add_city(&name) {
                    Ok(added) => {
                        model.show_city_picker = false;

                        let city = added.name.clone();
                        caps.cities.create_city_if_absent(
                            added.name,
                            added.original,
                            move |result| Event::CityCreated { name: city, result },
                        );
                        Self::start_fetch(added.fetch, caps);
                    }
                    Err(e) => {
                        debug!(error = %e, "rejected city name");
                        model.set_error(AppError::from(e).with_context("input", name));
                    }
                },

                Event::CityCreated { name, result: Ok(()) } => {
                    info!(city = %name, "city saved to catalog");
                    model.show_toast(format!("{name} added"), ToastKind::Success);
                    Self::request_catalog(caps);
                }

                Event::CityCreated { name, result: Err(e) } => {
                    warn!(city = %name, error = %e, "saving city failed");
                    model.show_toast(
                        format!("Could not save {name}: {e}"),
                        ToastKind::Error,
                    );
                }

                Event::LocationsFetched { ticket, result } => {
                    match model.city.apply_fetch_result(&ticket, result) {
                        FetchOutcome::Committed { count } => {
                            debug!(city = %ticket.city, count, "location list updated");
                        }
                        FetchOutcome::Failed(e) => {
                            model.set_error(
                                AppError::from(e).with_context("city", ticket.city),
                            );
                        }
                        FetchOutcome::Stale => {}
                    }
                }

                Event::CityGeocoded { city, result } => {
                    if city != model.city.selected_city() {
                        debug!(city = %city, "discarding map centre for a city no longer selected");
                    } else {
                        match result {
                            Ok(Some(center)) => {
                                model.map_center = Some(center);
                                model.map_zoom = CITY_MAP_ZOOM;
                            }
                            Ok(None) => debug!(city = %city, "geocoder found no match"),
                            Err(e) => warn!(city = %city, error = %e, "city geocoding failed"),
                        }
                    }
                }

                Event::CategorySelected { category } => {
                    model.city.set_category(category);
                }

                Event::AddLocationRequested { draft } => {
                    if model.is_submitting_location {
                        debug!("a location is already being added");
                    } else if let Err(e) = draft.validate() {
                        model.set_error(e);
                    } else {
                        Self::request_address_lookup(draft, model, caps);
                    }
                }

                Event::LocationAddressResolved { draft, result } => match Self::locate(result) {
                    Ok((city, locality, position)) => {
                        debug!(city = %city, locality = %locality, "address resolved");
                        let location = draft.into_new_location(city.clone(), position);
                        caps.cities.create_city_if_absent(city, locality, move |result| {
                            Event::LocationCityEnsured { location, result }
                        });
                    }
                    Err(e) => {
                        model.is_submitting_location = false;
                        model.set_error(e.with_context("address", draft.address));
                    }
                },

                Event::LocationCityEnsured { location, result: Ok(()) } => {
                    let key = location.city.to_lowercase();
                    if !model.city.catalog().iter().any(|c| c.to_lowercase() == key) {
                        Self::request_catalog(caps);
                    }

                    let city = location.city.clone();
                    caps.locations
                        .create_location(location, move |result| Event::LocationCreated { city, result });
                }

                Event::LocationCityEnsured { location, result: Err(e) } => {
                    warn!(city = %location.city, error = %e, "saving city for new location failed");
                    model.is_submitting_location = false;
                    model.set_error(AppError::from(e).with_context("city", location.city));
                }

                Event::LocationCreated { city, result: Ok(id) } => {
                    info!(city = %city, id = %id, "location added");
                    model.is_submitting_location = false;
                    model.show_toast("Location added successfully!", ToastKind::Success);

                    if city == model.city.selected_city() {
                        if let Some(ticket) = model.city.refresh_selected() {
                            Self::query_locations(ticket, caps);
                        }
                    }
                }

                Event::LocationCreated { city, result: Err(e) } => {
                    warn!(city = %city, error = %e, "saving location failed");
                    model.is_submitting_location = false;
                    model.set_error(AppError::from(e).with_context("city", city));
                }

                Event::DismissError => model.clear_error(),

                Event::DismissToast => model.clear_toast(),
            }

            caps.render.render();
        }

        fn view(&self, model: &Model) -> ViewModel {
            Self::build_view(model)
        }
    }
}
