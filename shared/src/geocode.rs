//! Nominatim reverse and forward geocoding.
//!
//! Requests go out through `crux_http`; responses are reduced to plain
//! results right in the HTTP callback so events never carry raw responses.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::LatLon;
use crate::NOMINATIM_BASE_URL;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeocodeError {
    #[error("invalid geocoder url: {0}")]
    InvalidUrl(String),

    #[error("geocoding request failed: {0}")]
    Request(String),

    #[error("geocoder returned HTTP {0}")]
    Status(u16),

    #[error("geocoder returned an empty body")]
    EmptyBody,

    #[error("geocoder response could not be parsed: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<ReverseAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
}

impl ReverseAddress {
    fn locality(self) -> Option<String> {
        self.city
            .or(self.town)
            .or(self.village)
            .or(self.municipality)
            .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    #[serde(default)]
    address: Option<ReverseAddress>,
}

impl SearchHit {
    fn position(&self) -> Result<LatLon, GeocodeError> {
        let lat: f64 = self
            .lat
            .parse()
            .map_err(|_| GeocodeError::Parse(format!("latitude '{}'", self.lat)))?;
        let lon: f64 = self
            .lon
            .parse()
            .map_err(|_| GeocodeError::Parse(format!("longitude '{}'", self.lon)))?;

        LatLon::new(lat, lon).map_err(|e| GeocodeError::Parse(e.to_string()))
    }
}

/// A user-entered address as Nominatim resolved it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAddress {
    pub position: LatLon,
    /// Raw locality name, not yet normalized.
    pub locality: Option<String>,
}

pub fn reverse_url(position: LatLon) -> Result<Url, GeocodeError> {
    let mut url = Url::parse(&format!("{NOMINATIM_BASE_URL}/reverse"))
        .map_err(|e| GeocodeError::InvalidUrl(e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("lat", &position.lat.to_string())
        .append_pair("lon", &position.lon.to_string())
        .append_pair("format", "json")
        .append_pair("addressdetails", "1");
    Ok(url)
}

pub fn search_url(city: &str) -> Result<Url, GeocodeError> {
    let mut url = Url::parse(&format!("{NOMINATIM_BASE_URL}/search"))
        .map_err(|e| GeocodeError::InvalidUrl(e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("q", city)
        .append_pair("format", "json")
        .append_pair("limit", "1");
    Ok(url)
}

/// Like [`search_url`] but with address details, so the locality of a
/// street address can be read back.
pub fn address_search_url(address: &str) -> Result<Url, GeocodeError> {
    let mut url = search_url(address)?;
    url.query_pairs_mut().append_pair("addressdetails", "1");
    Ok(url)
}

/// Extract the device address from a `/reverse` body: the locality name
/// (city, town, village, municipality in that order), else the full
/// display name. Nominatim's `{"error": ...}` body yields `None`.
pub fn address_from_reverse_json(body: &[u8]) -> Result<Option<String>, GeocodeError> {
    let response: ReverseResponse =
        serde_json::from_slice(body).map_err(|e| GeocodeError::Parse(e.to_string()))?;

    let locality = response.address.and_then(ReverseAddress::locality);
    Ok(locality.or_else(|| response.display_name.filter(|s| !s.trim().is_empty())))
}

/// First hit of a `/search` body as a validated position.
pub fn position_from_search_json(body: &[u8]) -> Result<Option<LatLon>, GeocodeError> {
    let hits: Vec<SearchHit> =
        serde_json::from_slice(body).map_err(|e| GeocodeError::Parse(e.to_string()))?;

    hits.first().map(SearchHit::position).transpose()
}

/// First hit of an [`address_search_url`] body with its locality.
pub fn address_from_search_json(body: &[u8]) -> Result<Option<ResolvedAddress>, GeocodeError> {
    let hits: Vec<SearchHit> =
        serde_json::from_slice(body).map_err(|e| GeocodeError::Parse(e.to_string()))?;

    let Some(hit) = hits.into_iter().next() else {
        return Ok(None);
    };

    let position = hit.position()?;
    Ok(Some(ResolvedAddress {
        position,
        locality: hit.address.and_then(ReverseAddress::locality),
    }))
}

pub(crate) fn response_body(
    result: crux_http::Result<crux_http::Response<Vec<u8>>>,
) -> Result<Vec<u8>, GeocodeError> {
    let mut response = result.map_err(|e| GeocodeError::Request(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(GeocodeError::Status(u16::from(status)));
    }

    response.take_body().ok_or(GeocodeError::EmptyBody)
}

/// Reduce a `/reverse` response to the device address.
pub fn reverse_outcome(
    result: crux_http::Result<crux_http::Response<Vec<u8>>>,
) -> Result<Option<String>, GeocodeError> {
    response_body(result).and_then(|body| address_from_reverse_json(&body))
}

pub fn search_outcome(
    result: crux_http::Result<crux_http::Response<Vec<u8>>>,
) -> Result<Option<LatLon>, GeocodeError> {
    response_body(result).and_then(|body| position_from_search_json(&body))
}

pub fn address_search_outcome(
    result: crux_http::Result<crux_http::Response<Vec<u8>>>,
) -> Result<Option<ResolvedAddress>, GeocodeError> {
    response_body(result).and_then(|body| address_from_search_json(&body))
}
