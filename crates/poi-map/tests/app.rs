use approx::assert_abs_diff_eq;
use poi_map::{
    App, AppError, Config, LoadSource,
    bbox::{BboxMode, BoundingBox},
    geocode::{Geocode, GeocodeError},
    map::{HeadlessMap, MapError, MapSurface, MarkerIcon, MarkerId, Selection},
    notify::Notice,
    store::{self, LOCATION_KEY, POI_DATA_KEY, Store},
    types::{AddressQuery, Location, PoiDataSet},
};

mod common;

use common::{
    RecordingNotifier, ScriptedGeocoder, ScriptedSource, SharedStore, krakow, record,
};

type TestApp = App<ScriptedGeocoder, ScriptedSource, HeadlessMap>;

fn app(geocoder: ScriptedGeocoder, source: ScriptedSource) -> (TestApp, RecordingNotifier) {
    common::init_logger();
    let notifier = RecordingNotifier::default();
    let app = App::new(Config::default(), geocoder, source, HeadlessMap::default())
        .with_notifier(notifier.clone());
    (app, notifier)
}

fn form() -> Option<AddressQuery> {
    Some(AddressQuery::from_fields([
        ("country", "Polska"),
        ("city", "Kraków"),
        ("street", "Wawel"),
    ]))
}

fn visible(app: &TestApp) -> Vec<&str> {
    app.map()
        .visible_markers()
        .into_iter()
        .map(MarkerId::as_str)
        .collect()
}

#[tokio::test]
async fn unknown_address_alerts_and_fetches_nothing() {
    let (mut app, notifier) = app(ScriptedGeocoder::not_found(), ScriptedSource::partial());

    let result = app.load_location(form()).await;

    assert!(matches!(
        result,
        Err(AppError::Geocode(GeocodeError::NotFound))
    ));
    assert_eq!(notifier.notices(), vec![Notice::location_not_found()]);
    assert_eq!(app.source().request_count(), 0);
    assert!(app.location().is_none());
    assert_eq!(app.store().get(LOCATION_KEY).unwrap(), None);
    assert_eq!(app.store().get(POI_DATA_KEY).unwrap(), None);
}

#[tokio::test]
async fn failed_geocoding_keeps_the_loaded_session() {
    let geocoder = ScriptedGeocoder::found_for(form().unwrap(), krakow());
    let (mut app, notifier) = app(geocoder, ScriptedSource::partial());
    app.load_location(form()).await.unwrap();

    let pod = MarkerId::from("restaurant:0");
    app.toggle_marker(&pod).unwrap();
    app.set_layer_active("fast_food", false).unwrap();
    let stored_location = app.store().get(LOCATION_KEY).unwrap();
    let stored_data = app.store().get(POI_DATA_KEY).unwrap();
    let shown = visible(&app).into_iter().map(str::to_owned).collect::<Vec<_>>();

    let elsewhere = AddressQuery::from_fields([("country", "Atlantis")]);
    let result = app.load_location(Some(elsewhere)).await;

    assert!(matches!(
        result,
        Err(AppError::Geocode(GeocodeError::NotFound))
    ));
    assert_eq!(notifier.notices(), vec![Notice::location_not_found()]);
    assert_eq!(app.source().request_count(), 4);

    assert_eq!(app.location(), Some(&krakow()));
    assert_eq!(app.state().layers().len(), 2);
    assert_eq!(app.state().marker_count(), 3);
    assert_eq!(app.state().selected().unwrap().id(), &pod);
    assert!(!app.state().layer("fast_food").unwrap().is_active());
    assert_eq!(app.map().icon(&pod), MarkerIcon::Selected);
    assert_eq!(app.map().open_popup(), Some(&pod));
    assert_eq!(visible(&app), shown);
    assert_eq!(app.store().get(LOCATION_KEY).unwrap(), stored_location);
    assert_eq!(app.store().get(POI_DATA_KEY).unwrap(), stored_data);
}

#[tokio::test]
async fn failed_types_are_missing_and_warned_about() {
    let (mut app, notifier) = app(ScriptedGeocoder::found(krakow()), ScriptedSource::partial());

    let report = app.load_location(form()).await.unwrap();

    assert_eq!(report.source, LoadSource::Geocoded);
    assert_eq!(report.layers, 2);
    assert_eq!(report.markers, 3);
    let mut failed: Vec<_> = report.failed.iter().map(|t| t.subtype.as_str()).collect();
    failed.sort();
    assert_eq!(failed, vec!["cafe", "pub"]);

    let mut notices = notifier.notices();
    notices.sort_by(|a, b| a.message().cmp(b.message()));
    assert_eq!(
        notices,
        vec![Notice::fetch_failed("cafe"), Notice::fetch_failed("pub")]
    );

    // every type was requested, with the same box around the location
    let requests = app.source().requests.lock().clone();
    assert_eq!(requests.len(), 4);
    let bbox = requests[0].1;
    assert!(requests.iter().all(|(_, other)| *other == bbox));
    assert!(bbox.contains(krakow().coord()));
    assert_abs_diff_eq!(bbox.diagonal(), 1500. * 2f64.sqrt(), epsilon = 1.);

    assert_eq!(app.location(), Some(&krakow()));
    assert_eq!(
        visible(&app),
        vec!["fast_food:0", "restaurant:0", "restaurant:1"]
    );
    assert_eq!(
        app.map().placed("restaurant", &MarkerId::from("restaurant:1")),
        Some(("Wierzynek", record(3, None).position()))
    );

    let stored: PoiDataSet = store::load(app.store(), POI_DATA_KEY).unwrap().unwrap();
    assert_eq!(stored.subtypes().collect::<Vec<_>>(), vec!["fast_food", "restaurant"]);
    assert_eq!(stored.record_count(), 3);
    let stored: Location = store::load(app.store(), LOCATION_KEY).unwrap().unwrap();
    assert_eq!(stored, krakow());
}

#[tokio::test]
async fn stored_session_is_restored_without_network() {
    let store = SharedStore::default();
    let (first, _) = app(ScriptedGeocoder::found(krakow()), ScriptedSource::partial());
    let mut first = first.with_store(store.clone());
    first.load_location(form()).await.unwrap();

    let (second, notifier) = app(ScriptedGeocoder::not_found(), ScriptedSource::default());
    let mut second = second.with_store(store);
    let report = second.load_location(None).await.unwrap();

    assert_eq!(report.source, LoadSource::Restored);
    assert_eq!(report.layers, 2);
    assert_eq!(report.markers, 3);
    assert!(report.failed.is_empty());
    assert!(second.geocoder().queries.lock().is_empty());
    assert_eq!(second.source().request_count(), 0);
    assert!(notifier.notices().is_empty());

    assert_eq!(second.location(), Some(&krakow()));
    assert_eq!(second.map().center(), Some(krakow().coord()));
    assert_eq!(second.map().zoom(), Config::default().zoom);
    assert_eq!(visible(&second), visible(&first));
}

#[tokio::test]
async fn default_address_without_session_or_with_empty_form() {
    let (mut app, _) = app(ScriptedGeocoder::found(krakow()), ScriptedSource::partial());

    app.load_location(None).await.unwrap();
    app.load_location(Some(AddressQuery::default())).await.unwrap();
    // the session is stored now, but an explicit form still geocodes
    app.load_location(form()).await.unwrap();

    let queries = app.geocoder().queries.lock().clone();
    let default = Config::default().default_address;
    assert_eq!(queries, vec![default.clone(), default, form().unwrap()]);
}

#[tokio::test]
async fn search_clears_selection_and_filters_markers() {
    let (mut app, _) = app(ScriptedGeocoder::found(krakow()), ScriptedSource::partial());
    app.load_location(form()).await.unwrap();

    let wierzynek = MarkerId::from("restaurant:1");
    assert_eq!(
        app.toggle_marker(&wierzynek).unwrap(),
        Selection::Selected(wierzynek.clone())
    );
    assert_eq!(app.map().icon(&wierzynek), MarkerIcon::Selected);

    assert_eq!(app.search_markers("POD"), 1);
    assert!(app.state().selected().is_none());
    assert_eq!(app.map().icon(&wierzynek), MarkerIcon::Standard);
    assert_eq!(visible(&app), vec!["restaurant:0"]);
    assert!(!app.state().marker(&wierzynek).unwrap().is_active());

    assert!(matches!(
        app.toggle_marker(&wierzynek),
        Err(AppError::Map(MapError::MarkerInactive(_)))
    ));

    assert_eq!(app.search_markers(""), 3);
    assert_eq!(visible(&app).len(), 3);
}

#[tokio::test]
async fn selecting_toggles_icon_and_popup() {
    let (mut app, _) = app(ScriptedGeocoder::found(krakow()), ScriptedSource::partial());
    app.load_location(form()).await.unwrap();

    let pod = MarkerId::from("restaurant:0");
    let zapiekanki = MarkerId::from("fast_food:0");

    app.toggle_marker(&pod).unwrap();
    assert_eq!(app.map().open_popup(), Some(&pod));

    app.toggle_marker(&zapiekanki).unwrap();
    assert_eq!(app.state().selected().unwrap().id(), &zapiekanki);
    assert_eq!(app.map().icon(&pod), MarkerIcon::Standard);
    assert_eq!(app.map().icon(&zapiekanki), MarkerIcon::Selected);
    assert_eq!(app.map().open_popup(), Some(&zapiekanki));

    assert_eq!(
        app.toggle_marker(&zapiekanki).unwrap(),
        Selection::Unselected(zapiekanki.clone())
    );
    assert!(app.state().selected().is_none());
    assert_eq!(app.map().open_popup(), None);

    assert!(matches!(
        app.toggle_marker(&MarkerId::from("pub:0")),
        Err(AppError::Map(MapError::MarkerNotFound(_)))
    ));
}

#[tokio::test]
async fn layer_visibility_and_search_are_independent() {
    let (mut app, _) = app(ScriptedGeocoder::found(krakow()), ScriptedSource::partial());
    app.load_location(form()).await.unwrap();

    assert_eq!(app.set_layer_active("fast_food", false).unwrap(), 1);
    assert_eq!(app.set_layer_active("fast_food", false).unwrap(), 0);
    assert!(!app.map().has_layer("fast_food"));
    assert_eq!(visible(&app), vec!["restaurant:0", "restaurant:1"]);

    // markers of the hidden layer are still filtered
    assert_eq!(app.search_markers("zapiek"), 1);
    assert!(visible(&app).is_empty());

    assert_eq!(app.set_layer_active("fast_food", true).unwrap(), 1);
    assert_eq!(visible(&app), vec!["fast_food:0"]);

    assert!(matches!(
        app.set_layer_active("pub", true),
        Err(AppError::Map(MapError::LayerNotFound(_)))
    ));
    assert_eq!(app.state().layer("restaurant").unwrap().info(), "restaurant (0)");
    assert_eq!(app.state().layer("fast_food").unwrap().info(), "fast_food (1)");
}

#[tokio::test]
async fn marker_lists_start_collapsed() {
    let (mut app, _) = app(ScriptedGeocoder::found(krakow()), ScriptedSource::partial());
    app.load_location(form()).await.unwrap();

    assert!(app.state().layer("restaurant").unwrap().is_collapsed());
    assert!(!app.toggle_list("restaurant").unwrap());
    assert!(app.toggle_list("restaurant").unwrap());
    assert!(app.toggle_list("cafe").is_err());
}

#[tokio::test]
async fn viewport_mode_queries_the_visible_map() {
    common::init_logger();
    let config = Config {
        bbox: BboxMode::Viewport,
        ..Config::default()
    };
    let mut app = App::new(
        config,
        ScriptedGeocoder::found(krakow()),
        ScriptedSource::partial(),
        HeadlessMap::new(800, 600),
    );

    app.load_location(form()).await.unwrap();

    let viewport = app.map().viewport().unwrap();
    let requests = app.source().requests.lock().clone();
    assert_eq!(requests.len(), 4);
    assert!(requests.iter().all(|(_, bbox)| *bbox == viewport));
    assert_ne!(viewport, BoundingBox::around(krakow().coord(), 1500.));
}

#[tokio::test]
async fn reloading_replaces_layers_and_selection() {
    let (mut app, _) = app(ScriptedGeocoder::found(krakow()), ScriptedSource::partial());
    app.load_location(form()).await.unwrap();

    let pod = MarkerId::from("restaurant:0");
    app.toggle_marker(&pod).unwrap();
    app.search_markers("pod");
    app.set_layer_active("fast_food", false).unwrap();

    let report = app.load_location(form()).await.unwrap();

    assert_eq!(report.layers, 2);
    assert_eq!(app.state().marker_count(), 3);
    assert!(app.state().selected().is_none());
    assert!(app.state().layers().iter().all(|layer| layer.is_active()));
    assert_eq!(app.map().open_popup(), None);
    assert_eq!(visible(&app).len(), 3);
}

struct SilentGeocoder;

impl Geocode for SilentGeocoder {
    async fn geocode(&self, _query: &AddressQuery) -> Result<Location, GeocodeError> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn geocoding_times_out() {
    common::init_logger();
    let notifier = RecordingNotifier::default();
    let mut app = App::new(
        Config::default(),
        SilentGeocoder,
        ScriptedSource::partial(),
        HeadlessMap::default(),
    )
    .with_notifier(notifier.clone());

    let result = app.load_location(form()).await;

    assert!(matches!(result, Err(AppError::Geocode(GeocodeError::Timeout))));
    assert_eq!(notifier.notices(), vec![Notice::geocoding_failed()]);
    assert_eq!(app.source().request_count(), 0);
}
