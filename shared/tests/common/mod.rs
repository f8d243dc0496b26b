#![allow(dead_code)]

use crux_core::testing::AppTester;
use crux_core::Request;
use crux_http::protocol::{HttpRequest, HttpResponse};
use shared::capabilities::{
    CatalogOperation, GeolocationOperation, LocationOperation, LocationOutput, LocationResult,
};
use shared::model::{LocationId, UserId};
use shared::{App, Effect, Event, LocationRecord, Model};

pub type Tester = AppTester<App, Effect>;

/// Effects of one or more updates, sorted by capability.
#[derive(Default)]
pub struct Effects {
    pub geolocation: Vec<Request<GeolocationOperation>>,
    pub catalog: Vec<Request<CatalogOperation>>,
    pub locations: Vec<Request<LocationOperation>>,
    pub http: Vec<Request<HttpRequest>>,
    pub renders: usize,
}

impl Effects {
    pub fn extend(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Geolocation(r) => self.geolocation.push(r),
                Effect::CityCatalog(r) => self.catalog.push(r),
                Effect::LocationStore(r) => self.locations.push(r),
                Effect::Http(r) => self.http.push(r),
                Effect::Render(_) => self.renders += 1,
            }
        }
    }

    pub fn location_cities(&self) -> Vec<String> {
        self.locations
            .iter()
            .filter_map(|r| match &r.operation {
                LocationOperation::ListLocations { city } => Some(city.clone()),
                LocationOperation::CreateLocation { .. } => None,
            })
            .collect()
    }

    pub fn http_urls(&self) -> Vec<String> {
        self.http.iter().map(|r| r.operation.url.clone()).collect()
    }
}

/// Send `event` and every event it produces synchronously.
pub fn send(app: &Tester, model: &mut Model, event: Event) -> Effects {
    let mut effects = Effects::default();
    let update = app.update(event, model);
    effects.extend(update.effects);
    for event in update.events {
        effects.extend(app.update(event, model).effects);
    }
    effects
}

/// Answer a capability request and feed the resulting events back in.
pub fn resolve<Op>(
    app: &Tester,
    model: &mut Model,
    request: &mut Request<Op>,
    output: Op::Output,
) -> Effects
where
    Op: crux_core::capability::Operation,
{
    let update = app.resolve(request, output).expect("request resolves");
    let mut effects = Effects::default();
    effects.extend(update.effects);
    for event in update.events {
        effects.extend(app.update(event, model).effects);
    }
    effects
}

pub fn location(id: &str, city: &str, category: &str) -> LocationRecord {
    LocationRecord {
        id: LocationId::new(id),
        name: format!("Place {id}"),
        description: String::new(),
        category: category.into(),
        address: String::new(),
        city: city.into(),
        latitude: 51.0,
        longitude: 4.0,
        price_range: None,
        average_rating: 0.0,
        total_ratings: 0,
        image_urls: Vec::new(),
        added_by: UserId::new("tester"),
        created_at_ms: None,
    }
}

/// What the shell hands back for an HTTP request.
pub fn http_response(status: u16, body: &str) -> HttpResponse {
    HttpResponse::status(status).body(body.as_bytes().to_vec()).build()
}

pub fn listed(locations: Vec<LocationRecord>) -> LocationResult {
    Ok(LocationOutput::Locations(locations))
}

pub fn cities(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}
