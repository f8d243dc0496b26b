mod common;

use crux_http::protocol::HttpResult;

use common::{cities, http_response, listed, location, resolve, send, Tester};
use crux_core::App as _;
use shared::capabilities::{CatalogOutput, GeolocationError, StoreError};
use shared::model::ToastKind;
use shared::{App, Event, LatLon, Model, CITY_MAP_ZOOM, UNKNOWN_CITY};

#[test]
fn startup_asks_for_position_and_catalog() {
    let app = Tester::default();
    let mut model = Model::default();

    let effects = send(&app, &mut model, Event::AppStarted);

    assert_eq!(effects.geolocation.len(), 1);
    assert_eq!(effects.catalog.len(), 1);
    assert!(effects.locations.is_empty());
    assert!(effects.renders >= 1);
    assert_eq!(model.city.selected_city(), UNKNOWN_CITY);
}

#[test]
fn address_matching_catalog_selects_that_city() {
    let app = Tester::default();
    let mut model = Model::default();
    let mut started = send(&app, &mut model, Event::AppStarted);

    let antwerp = LatLon::new(51.2194, 4.4025).unwrap();
    let mut positioned = resolve(&app, &mut model, &mut started.geolocation[0], Ok(antwerp));
    assert_eq!(model.device_position, Some(antwerp));
    assert_eq!(positioned.http.len(), 1);
    assert!(positioned.http_urls()[0].contains("/reverse"));

    let geocoded = resolve(
        &app,
        &mut model,
        &mut positioned.http[0],
        HttpResult::Ok(http_response(
            200,
            r#"{"display_name":"Meir 1, 2000 Antwerp, Belgium","address":{"road":"Meir"}}"#,
        )),
    );
    // Catalog still empty.
    assert!(geocoded.locations.is_empty());
    assert_eq!(model.city.selected_city(), UNKNOWN_CITY);

    let mut loaded = resolve(
        &app,
        &mut model,
        &mut started.catalog[0],
        Ok(CatalogOutput::Cities(cities(&["Brussels", "Antwerp"]))),
    );
    assert_eq!(model.city.selected_city(), "Antwerp");
    assert_eq!(loaded.location_cities(), vec!["Antwerp".to_string()]);

    resolve(
        &app,
        &mut model,
        &mut loaded.locations[0],
        listed(vec![location("a", "Antwerp", "Museum"), location("b", "Antwerp", "Park/Nature")]),
    );

    let view = App.view(&model);
    assert_eq!(view.detected_address, "Meir 1, 2000 Antwerp, Belgium");
    assert_eq!(view.selected_city, "Antwerp");
    assert_eq!(view.locations.len(), 2);
    assert!(!view.is_loading);
}

/// Start the app, hand it a position and answer the reverse geocoding
/// request with `status` and `body`. The startup catalog request is left
/// pending in the returned effects.
fn start_with_geocoder_reply(
    app: &Tester,
    model: &mut Model,
    status: u16,
    body: &str,
) -> common::Effects {
    let mut started = send(app, model, Event::AppStarted);
    let position = LatLon::new(48.8566, 2.3522).unwrap();
    let mut positioned = resolve(app, model, &mut started.geolocation[0], Ok(position));
    assert_eq!(positioned.http.len(), 1);

    resolve(app, model, &mut positioned.http[0], HttpResult::Ok(http_response(status, body)));
    started
}

#[test]
fn reverse_geocoded_locality_drives_selection() {
    let app = Tester::default();
    let mut model = Model::default();
    let mut started = start_with_geocoder_reply(
        &app,
        &mut model,
        200,
        r#"{"display_name":"Korenmarkt, Gent, Belgium","address":{"city":"Ghent"}}"#,
    );
    assert_eq!(model.city.detected_address(), Some("Ghent"));

    let loaded = resolve(
        &app,
        &mut model,
        &mut started.catalog[0],
        Ok(CatalogOutput::Cities(cities(&["Antwerp", "Ghent"]))),
    );
    assert_eq!(model.city.selected_city(), "Ghent");
    assert_eq!(loaded.location_cities(), vec!["Ghent".to_string()]);
}

#[test]
fn geocoder_error_status_still_lets_fallback_fire() {
    let app = Tester::default();
    let mut model = Model::default();
    let mut started = start_with_geocoder_reply(&app, &mut model, 503, "Service Unavailable");
    assert_eq!(model.city.detected_address(), None);

    let loaded = resolve(
        &app,
        &mut model,
        &mut started.catalog[0],
        Ok(CatalogOutput::Cities(cities(&["Antwerp", "Ghent"]))),
    );
    assert_eq!(model.city.selected_city(), "Antwerp");
    assert_eq!(loaded.location_cities(), vec!["Antwerp".to_string()]);
    assert_eq!(App.view(&model).detected_address, UNKNOWN_CITY);
}

#[test]
fn unreadable_geocoder_body_counts_as_no_address() {
    let app = Tester::default();
    let mut model = Model::default();
    let mut started =
        start_with_geocoder_reply(&app, &mut model, 200, "<html>Too many requests</html>");
    assert_eq!(model.city.detected_address(), None);

    // The address is settled, so a later native address is ignored.
    send(
        &app,
        &mut model,
        Event::DeviceAddressResolved {
            address: Some("Ghent".into()),
        },
    );
    resolve(
        &app,
        &mut model,
        &mut started.catalog[0],
        Ok(CatalogOutput::Cities(cities(&["Antwerp", "Ghent"]))),
    );
    assert_eq!(model.city.selected_city(), "Antwerp");
}

#[test]
fn denied_location_shows_notice_and_falls_back() {
    let app = Tester::default();
    let mut model = Model::default();
    let mut started = send(&app, &mut model, Event::AppStarted);

    resolve(
        &app,
        &mut model,
        &mut started.geolocation[0],
        Err(GeolocationError::PermissionDenied),
    );
    let toast = App.view(&model).toast.expect("notice shown");
    assert_eq!(toast.kind, ToastKind::Info);
    assert!(toast.message.contains("enable location in Settings"));
    assert!(App.view(&model).error.is_none());

    resolve(
        &app,
        &mut model,
        &mut started.catalog[0],
        Ok(CatalogOutput::Cities(cities(&["Leuven"]))),
    );
    assert_eq!(model.city.selected_city(), "Leuven");
}

#[test]
fn unmatched_address_falls_back_to_first_city() {
    let app = Tester::default();
    let mut model = Model::default();

    send(
        &app,
        &mut model,
        Event::DeviceAddressResolved {
            address: Some("Grand Place, Lille, France".into()),
        },
    );
    let effects = send(
        &app,
        &mut model,
        Event::CatalogFetched(Ok(cities(&["Ghent", "Antwerp"]))),
    );

    assert_eq!(model.city.selected_city(), "Ghent");
    assert_eq!(effects.location_cities(), vec!["Ghent".to_string()]);
}

#[test]
fn empty_catalog_stays_unknown_and_never_queries() {
    let app = Tester::default();
    let mut model = Model::default();
    let mut started = send(&app, &mut model, Event::AppStarted);

    let denied = resolve(
        &app,
        &mut model,
        &mut started.geolocation[0],
        Err(GeolocationError::PermissionDenied),
    );
    assert!(denied.http.is_empty());

    let loaded = resolve(
        &app,
        &mut model,
        &mut started.catalog[0],
        Ok(CatalogOutput::Cities(Vec::new())),
    );

    assert!(loaded.locations.is_empty());
    let view = App.view(&model);
    assert_eq!(view.selected_city, UNKNOWN_CITY);
    assert_eq!(view.detected_address, UNKNOWN_CITY);
    assert!(view.locations.is_empty());
    assert!(!view.is_loading);
}

#[test]
fn result_for_previous_city_is_discarded() {
    let app = Tester::default();
    let mut model = Model::default();

    // Catalog first: the first entry is picked before the address is known.
    let mut first = send(
        &app,
        &mut model,
        Event::CatalogFetched(Ok(cities(&["Brussels", "Antwerp"]))),
    );
    assert_eq!(first.location_cities(), vec!["Brussels".to_string()]);

    let mut second = send(
        &app,
        &mut model,
        Event::DeviceAddressResolved {
            address: Some("Antwerp".into()),
        },
    );
    assert_eq!(second.location_cities(), vec!["Antwerp".to_string()]);

    resolve(
        &app,
        &mut model,
        &mut first.locations[0],
        listed(vec![location("b1", "Brussels", "Museum")]),
    );
    assert!(model.city.locations().is_empty());
    assert!(model.city.is_loading());

    resolve(
        &app,
        &mut model,
        &mut second.locations[0],
        listed(vec![location("a1", "Antwerp", "Museum"), location("a2", "Antwerp", "Shopping")]),
    );
    assert_eq!(model.city.locations().len(), 2);
    assert!(model.city.locations().iter().all(|l| l.city == "Antwerp"));
}

#[test]
fn user_choice_survives_late_address() {
    let app = Tester::default();
    let mut model = Model::default();

    send(
        &app,
        &mut model,
        Event::CatalogFetched(Ok(cities(&["Brussels", "Antwerp"]))),
    );
    send(&app, &mut model, Event::OpenCityPicker);
    let picked = send(
        &app,
        &mut model,
        Event::CitySelected {
            city: "Antwerp".into(),
        },
    );
    assert!(!model.show_city_picker);
    assert_eq!(picked.location_cities(), vec!["Antwerp".to_string()]);

    let late = send(
        &app,
        &mut model,
        Event::DeviceAddressResolved {
            address: Some("Rue Neuve, Brussels".into()),
        },
    );
    assert!(late.locations.is_empty());
    assert_eq!(model.city.selected_city(), "Antwerp");
}

#[test]
fn first_catalog_failure_reports_error_and_stays_unknown() {
    let app = Tester::default();
    let mut model = Model::default();

    let effects = send(
        &app,
        &mut model,
        Event::CatalogFetched(Err(StoreError::Unavailable("offline".into()))),
    );

    assert!(effects.locations.is_empty());
    assert!(model.city.is_catalog_loaded());
    let view = App.view(&model);
    assert_eq!(view.selected_city, UNKNOWN_CITY);
    let error = view.error.expect("error shown");
    assert_eq!(error.error_code, "NETWORK_ERROR");
    assert!(error.is_retryable);

    send(&app, &mut model, Event::DismissError);
    assert!(App.view(&model).error.is_none());
}

#[test]
fn failed_query_surfaces_error_and_reselect_retries() {
    let app = Tester::default();
    let mut model = Model::default();
    let mut loaded = send(&app, &mut model, Event::CatalogFetched(Ok(cities(&["Ghent"]))));

    resolve(
        &app,
        &mut model,
        &mut loaded.locations[0],
        Err(StoreError::Timeout),
    );
    let view = App.view(&model);
    assert_eq!(view.error.expect("error shown").error_code, "TIMEOUT");
    assert!(view.locations.is_empty());

    let retried = send(&app, &mut model, Event::CitySelected { city: "Ghent".into() });
    assert_eq!(retried.location_cities(), vec!["Ghent".to_string()]);
}

#[test]
fn reselecting_loaded_city_does_not_query_again() {
    let app = Tester::default();
    let mut model = Model::default();
    let mut loaded = send(&app, &mut model, Event::CatalogFetched(Ok(cities(&["Ghent"]))));
    resolve(
        &app,
        &mut model,
        &mut loaded.locations[0],
        listed(vec![location("1", "Ghent", "Museum")]),
    );

    let again = send(&app, &mut model, Event::CitySelected { city: "Ghent".into() });
    assert!(again.locations.is_empty());
    assert_eq!(model.city.locations().len(), 1);

    let refreshed = send(&app, &mut model, Event::RefreshCatalog);
    assert_eq!(refreshed.catalog.len(), 1);
    let reloaded = send(
        &app,
        &mut model,
        Event::CatalogFetched(Ok(cities(&["Ghent", "Bruges"]))),
    );
    assert!(reloaded.locations.is_empty());
    assert_eq!(model.city.selected_city(), "Ghent");
}

#[test]
fn city_geocode_centres_map_only_for_selected_city() {
    let app = Tester::default();
    let mut model = Model::default();

    let selected = send(&app, &mut model, Event::CitySelected { city: "Ghent".into() });
    assert!(selected.http_urls().iter().any(|u| u.contains("/search") && u.contains("Ghent")));

    let elsewhere = LatLon::new(50.85, 4.35).unwrap();
    send(
        &app,
        &mut model,
        Event::CityGeocoded {
            city: "Brussels".into(),
            result: Ok(Some(elsewhere)),
        },
    );
    assert_eq!(model.map_center, None);

    let ghent = LatLon::new(51.0543, 3.7174).unwrap();
    send(
        &app,
        &mut model,
        Event::CityGeocoded {
            city: "Ghent".into(),
            result: Ok(Some(ghent)),
        },
    );
    let view = App.view(&model);
    assert_eq!(view.map_center_lat, Some(51.0543));
    assert_eq!(view.map_center_lon, Some(3.7174));
    assert_eq!(view.map_zoom, CITY_MAP_ZOOM);
}

#[test]
fn category_filter_narrows_visible_locations() {
    let app = Tester::default();
    let mut model = Model::default();
    let mut loaded = send(&app, &mut model, Event::CatalogFetched(Ok(cities(&["Bruges"]))));
    resolve(
        &app,
        &mut model,
        &mut loaded.locations[0],
        listed(vec![
            location("1", "Bruges", "Museum"),
            location("2", "Bruges", "Cafe/Bar"),
            location("3", "Bruges", "Museum"),
        ]),
    );

    send(
        &app,
        &mut model,
        Event::CategorySelected {
            category: Some("Museum".into()),
        },
    );
    let view = App.view(&model);
    assert_eq!(view.locations.len(), 2);
    assert_eq!(view.total_location_count, 3);

    send(&app, &mut model, Event::CategorySelected { category: None });
    assert_eq!(App.view(&model).locations.len(), 3);
}
