//! City selection and location sync state.
//!
//! [`CityState`] owns the detected device address, the city catalog, the
//! selected city and the locations shown for it. Every mutation goes
//! through a transition method; transitions that change the selected city
//! hand back a [`FetchTicket`] which the caller turns into a location
//! query. Results are committed only against the ticket that is still
//! outstanding, so a slow answer for a city the user already left can never
//! overwrite the current list.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::capabilities::StoreError;
use crate::model::LocationRecord;
use crate::normalize::{normalize_city_name, CityNameError};
use crate::UNKNOWN_CITY;

/// Identifies one location query. `generation` increases with every query
/// issued, so two queries for the same city are still distinguishable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchTicket {
    pub city: String,
    pub generation: u64,
}

/// How the current selection came about.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum SelectionSource {
    /// Nothing has been decided yet.
    #[default]
    Bootstrap,
    /// Chosen by [`auto_select`] from these inputs.
    Auto {
        address_known: bool,
        catalog_revision: u64,
    },
    /// Picked or added by the user. Auto-selection is off for the session.
    Manual,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum FetchState {
    Idle,
    InFlight(FetchTicket),
    Loaded,
    Failed,
}

#[derive(Debug)]
pub enum FetchOutcome {
    Committed { count: usize },
    Failed(StoreError),
    Stale,
}

/// Result of [`CityState::add_city`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddedCity {
    /// Catalog key, also the new selection.
    pub name: String,
    /// What the user typed, trimmed.
    pub original: String,
    /// False when the catalog already held this city.
    pub appended: bool,
    pub fetch: Option<FetchTicket>,
}

#[derive(Clone, Debug)]
pub struct CityState {
    detected_address: Option<String>,
    address_resolved: bool,
    catalog: Vec<String>,
    catalog_revision: u64,
    catalog_loaded: bool,
    selected: String,
    source: SelectionSource,
    locations: Vec<LocationRecord>,
    fetch: FetchState,
    next_generation: u64,
    category: Option<String>,
}

impl Default for CityState {
    fn default() -> Self {
        Self::new()
    }
}

impl CityState {
    pub fn new() -> Self {
        Self {
            detected_address: None,
            address_resolved: false,
            catalog: Vec::new(),
            catalog_revision: 0,
            catalog_loaded: false,
            selected: UNKNOWN_CITY.to_string(),
            source: SelectionSource::Bootstrap,
            locations: Vec::new(),
            fetch: FetchState::Idle,
            next_generation: 0,
            category: None,
        }
    }

    pub fn detected_address(&self) -> Option<&str> {
        self.detected_address.as_deref()
    }

    pub fn catalog(&self) -> &[String] {
        &self.catalog
    }

    pub fn is_catalog_loaded(&self) -> bool {
        self.catalog_loaded
    }

    pub fn selected_city(&self) -> &str {
        &self.selected
    }

    pub fn has_selection(&self) -> bool {
        self.selected != UNKNOWN_CITY
    }

    pub fn selection_source(&self) -> &SelectionSource {
        &self.source
    }

    pub fn locations(&self) -> &[LocationRecord] {
        &self.locations
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category;
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.fetch, FetchState::InFlight(_))
    }

    pub fn pending_fetch(&self) -> Option<&FetchTicket> {
        match &self.fetch {
            FetchState::InFlight(ticket) => Some(ticket),
            _ => None,
        }
    }

    /// Locations for the selected city narrowed by the active category.
    pub fn filtered_locations(&self) -> Vec<&LocationRecord> {
        filtered(&self.locations, self.category.as_deref())
    }

    /// Record the device address. Only the first call has any effect; the
    /// address is never re-resolved within a session.
    #[must_use]
    pub fn apply_address(&mut self, address: Option<String>) -> Option<FetchTicket> {
        if self.address_resolved {
            debug!("device address already resolved, ignoring update");
            return None;
        }

        self.address_resolved = true;
        self.detected_address = address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        info!(address = ?self.detected_address, "device address applied");
        self.run_auto_select()
    }

    /// Replace the catalog wholesale, keeping arrival order and dropping
    /// blank and case-insensitive duplicate names.
    #[must_use]
    pub fn apply_catalog(&mut self, cities: Vec<String>) -> Option<FetchTicket> {
        let mut catalog: Vec<String> = Vec::with_capacity(cities.len());
        for city in cities {
            let city = city.trim();
            if city.is_empty() || contains_city(&catalog, city) {
                continue;
            }
            catalog.push(city.to_string());
        }

        if catalog != self.catalog {
            self.catalog = catalog;
            self.catalog_revision += 1;
        }
        self.catalog_loaded = true;

        info!(
            count = self.catalog.len(),
            revision = self.catalog_revision,
            "city catalog applied"
        );
        self.run_auto_select()
    }

    /// Select `name` as chosen by the user. The city does not need to be in
    /// the catalog yet.
    #[must_use]
    pub fn select_city(&mut self, name: &str) -> Option<FetchTicket> {
        let name = name.trim();
        if name.is_empty() {
            warn!("ignoring selection of a blank city name");
            return None;
        }

        self.source = SelectionSource::Manual;
        self.set_selected(name.to_string(), true)
    }

    /// Normalize and register a user-entered city, then select it.
    ///
    /// The catalog gets the name appended immediately; the caller is
    /// responsible for asking the backend to create it.
    pub fn add_city(&mut self, raw: &str) -> Result<AddedCity, CityNameError> {
        let normalized = normalize_city_name(raw)?;

        let key = normalized.to_lowercase();
        let existing = self.catalog.iter().find(|c| c.to_lowercase() == key).cloned();

        let (name, appended) = match existing {
            Some(existing) => (existing, false),
            None => {
                self.catalog.push(normalized.clone());
                self.catalog_revision += 1;
                (normalized, true)
            }
        };

        info!(city = %name, appended, "city added by user");

        self.source = SelectionSource::Manual;
        let fetch = self.set_selected(name.clone(), true);

        Ok(AddedCity {
            name,
            original: raw.trim().to_string(),
            appended,
            fetch,
        })
    }

    /// Query the selected city again, e.g. after a location was added to
    /// it. The current list stays visible until the new result commits and
    /// any older outstanding query becomes stale.
    #[must_use]
    pub fn refresh_selected(&mut self) -> Option<FetchTicket> {
        if !self.has_selection() {
            return None;
        }

        self.next_generation += 1;
        let ticket = FetchTicket {
            city: self.selected.clone(),
            generation: self.next_generation,
        };
        self.fetch = FetchState::InFlight(ticket.clone());

        debug!(city = %ticket.city, generation = ticket.generation, "location query refreshed");
        Some(ticket)
    }

    /// Commit a location query result if `ticket` is still the outstanding
    /// query. A failure empties the list.
    pub fn apply_fetch_result(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<LocationRecord>, StoreError>,
    ) -> FetchOutcome {
        if self.pending_fetch() != Some(ticket) {
            debug!(
                city = %ticket.city,
                generation = ticket.generation,
                selected = %self.selected,
                "discarding stale location result"
            );
            return FetchOutcome::Stale;
        }

        match result {
            Ok(locations) => {
                let count = locations.len();
                self.locations = locations;
                self.fetch = FetchState::Loaded;
                info!(city = %ticket.city, count, "locations loaded");
                FetchOutcome::Committed { count }
            }
            Err(e) => {
                self.locations.clear();
                self.fetch = FetchState::Failed;
                warn!(city = %ticket.city, error = %e, "location query failed");
                FetchOutcome::Failed(e)
            }
        }
    }

    fn run_auto_select(&mut self) -> Option<FetchTicket> {
        let inputs = SelectionSource::Auto {
            address_known: self.address_resolved,
            catalog_revision: self.catalog_revision,
        };

        match &self.source {
            SelectionSource::Manual => {
                debug!("selection was made by the user, skipping auto-selection");
                return None;
            }
            source if *source == inputs && self.has_selection() => {
                debug!("auto-selection inputs unchanged, keeping current city");
                return None;
            }
            _ => {}
        }

        let city = auto_select(self.detected_address.as_deref(), &self.catalog);
        info!(city = %city, "auto-selected city");

        self.source = inputs;
        self.set_selected(city, false)
    }

    fn set_selected(&mut self, city: String, allow_retry: bool) -> Option<FetchTicket> {
        let changed = city != self.selected;
        let retry = !changed && allow_retry && self.fetch == FetchState::Failed;

        if !changed && !retry {
            return None;
        }

        self.selected = city;
        self.locations.clear();

        if !self.has_selection() {
            self.fetch = FetchState::Idle;
            return None;
        }

        self.next_generation += 1;
        let ticket = FetchTicket {
            city: self.selected.clone(),
            generation: self.next_generation,
        };
        self.fetch = FetchState::InFlight(ticket.clone());

        debug!(city = %ticket.city, generation = ticket.generation, retry, "location query issued");
        Some(ticket)
    }
}

fn contains_city(catalog: &[String], city: &str) -> bool {
    let city = city.to_lowercase();
    catalog.iter().any(|c| c.to_lowercase() == city)
}

/// First catalog entry (in catalog order) that appears in `address`,
/// compared case-insensitively as a plain substring.
pub fn find_matching_city<'a>(address: Option<&str>, catalog: &'a [String]) -> Option<&'a str> {
    let address = address?.to_lowercase();
    catalog
        .iter()
        .filter(|city| !city.trim().is_empty())
        .find(|city| address.contains(&city.to_lowercase()))
        .map(String::as_str)
}

/// Pick a city from the device address and the catalog: the first
/// substring match, else the first catalog entry, else [`UNKNOWN_CITY`].
pub fn auto_select(address: Option<&str>, catalog: &[String]) -> String {
    if let Some(city) = find_matching_city(address, catalog) {
        return city.to_string();
    }
    catalog
        .first()
        .cloned()
        .unwrap_or_else(|| UNKNOWN_CITY.to_string())
}

/// Locations whose category equals `category` exactly, in their original
/// order. No category means no filtering.
pub fn filtered<'a>(locations: &'a [LocationRecord], category: Option<&str>) -> Vec<&'a LocationRecord> {
    match category {
        None => locations.iter().collect(),
        Some(category) => locations.iter().filter(|l| l.category == category).collect(),
    }
}
