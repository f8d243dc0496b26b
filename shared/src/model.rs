use serde::{Deserialize, Serialize};
use std::fmt;

use crate::city::CityState;
use crate::{AppError, AppResult, CoordinateError, ErrorKind, DEFAULT_MAP_ZOOM};

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, Default)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(LocationId);
typed_id!(UserId);

/// WGS84 position. Values arriving from the shell or a geocoder are
/// unchecked until passed through [`LatLon::validated`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }

    pub fn validated(self) -> Result<Self, CoordinateError> {
        Self::new(self.lat, self.lon)
    }
}

/// A point of interest as stored under its city in the backend.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub id: LocationId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub address: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_ratings: u32,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub added_by: UserId,
    #[serde(default)]
    pub created_at_ms: Option<u64>,
}

impl LocationRecord {
    pub fn position(&self) -> Option<LatLon> {
        LatLon::new(self.latitude, self.longitude).ok()
    }

    pub fn rating_text(&self) -> String {
        if self.total_ratings > 0 {
            format!("{:.1} ({})", self.average_rating, self.total_ratings)
        } else {
            "No ratings yet".into()
        }
    }
}

/// What the user filled in on the add-location form. Images are uploaded
/// by the shell beforehand; only their URLs reach the core.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct LocationDraft {
    pub name: String,
    pub description: String,
    pub address: String,
    pub category: String,
    pub price_range: String,
    pub image_urls: Vec<String>,
    pub added_by: UserId,
}

impl LocationDraft {
    /// Every text field is required.
    pub fn validate(&self) -> AppResult<()> {
        let required = [
            &self.name,
            &self.description,
            &self.address,
            &self.category,
            &self.price_range,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(AppError::new(
                ErrorKind::Validation,
                "Please fill in all required fields",
            ));
        }
        if self.added_by.as_str().is_empty() {
            return Err(AppError::new(ErrorKind::Validation, "Please sign in to add a location"));
        }
        Ok(())
    }

    /// The document to write once the address resolved to `position` in
    /// `city`. New locations start without ratings.
    pub fn into_new_location(self, city: String, position: LatLon) -> NewLocation {
        NewLocation {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category.trim().to_string(),
            address: self.address.trim().to_string(),
            city,
            latitude: position.lat,
            longitude: position.lon,
            price_range: self.price_range.trim().to_string(),
            average_rating: 0.0,
            total_ratings: 0,
            image_urls: self.image_urls,
            added_by: self.added_by,
        }
    }
}

/// A location document before the backend has assigned it an id.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
    pub name: String,
    pub description: String,
    pub category: String,
    pub address: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub price_range: String,
    pub average_rating: f64,
    pub total_ratings: u32,
    pub image_urls: Vec<String>,
    pub added_by: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastMessage {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl ToastMessage {
    #[must_use]
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            duration_ms: kind.default_duration_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    #[must_use]
    pub const fn default_duration_ms(self) -> u64 {
        match self {
            Self::Info => 3000,
            Self::Success => 2000,
            Self::Warning => 4000,
            Self::Error => 5000,
        }
    }
}

pub struct Model {
    pub city: CityState,
    pub show_city_picker: bool,
    pub device_position: Option<LatLon>,
    pub map_center: Option<LatLon>,
    pub map_zoom: f64,
    pub active_error: Option<AppError>,
    pub active_toast: Option<ToastMessage>,
    /// An add-location submission is between validation and the write.
    pub is_submitting_location: bool,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            city: CityState::new(),
            show_city_picker: false,
            device_position: None,
            map_center: None,
            map_zoom: DEFAULT_MAP_ZOOM,
            active_error: None,
            active_toast: None,
            is_submitting_location: false,
        }
    }
}

impl Model {
    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.active_toast = Some(ToastMessage::new(message, kind));
    }

    pub fn clear_toast(&mut self) {
        self.active_toast = None;
    }
}
