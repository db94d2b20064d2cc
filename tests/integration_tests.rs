use bikeshare_traffic::config::Sources;
use bikeshare_traffic::fetch::BasicClient;
use bikeshare_traffic::filter::TimeFilter;
use bikeshare_traffic::loader::{load_dataset, parse_stations, parse_trips};
use bikeshare_traffic::pipeline::PipelineState;
use bikeshare_traffic::projection::{Projector, ViewEvent, Viewport};
use bikeshare_traffic::{Error, model::LngLat};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn fixture_state() -> PipelineState {
    let stations = parse_stations(include_bytes!("fixtures/stations.json")).expect("stations");
    let (trips, dropped) = parse_trips(&include_bytes!("fixtures/trips.csv")[..]).expect("trips");
    assert_eq!(dropped, 1);
    PipelineState::new(stations, trips, Viewport::default())
}

fn totals(state: &PipelineState) -> Vec<(String, usize, usize, usize)> {
    state
        .frame()
        .markers
        .iter()
        .map(|m| (m.id.clone(), m.arrivals, m.departures, m.total_traffic))
        .collect()
}

#[test]
fn test_full_pipeline_unfiltered() {
    let state = fixture_state();
    let frame = state.frame();

    assert_eq!(frame.cutoff, -1);
    assert_eq!(frame.trip_count, 8);
    assert_eq!(frame.max_traffic, 7);
    assert_eq!(frame.orphan_references, 1);
    assert_eq!(
        totals(&state),
        vec![
            ("M32006".to_string(), 2, 2, 4),
            ("M32011".to_string(), 2, 2, 4),
            ("D32000".to_string(), 3, 4, 7),
            ("C32094".to_string(), 0, 0, 0),
        ]
    );

    let south = frame.marker("D32000").unwrap();
    assert!((south.radius - 25.0).abs() < 1e-9);
    assert_eq!(frame.marker("C32094").unwrap().radius, 0.0);
}

#[test]
fn test_morning_commute_window() {
    let mut state = fixture_state();
    let frame = state.on_slider(480).unwrap();

    assert_eq!(frame.label, "8:00 AM");
    assert_eq!(frame.trip_count, 3);
    assert_eq!(frame.max_traffic, 2);

    let mit = frame.marker("M32006").unwrap();
    assert_eq!((mit.departures, mit.arrivals), (2, 0));
    assert_eq!(mit.flow, 1.0);
    assert!((mit.radius - 50.0).abs() < 1e-9);

    let central = frame.marker("M32011").unwrap();
    assert_eq!(central.flow, 0.5);

    let south = frame.marker("D32000").unwrap();
    assert_eq!((south.departures, south.arrivals), (0, 2));
    assert_eq!(south.flow, 0.0);

    let navy_yard = frame.marker("C32094").unwrap();
    assert_eq!(navy_yard.total_traffic, 0);
    assert_eq!(navy_yard.radius, 3.0);
    assert_eq!(navy_yard.departure_ratio, 0.0);
}

#[test]
fn test_evening_window_and_back_to_any_time() {
    let mut state = fixture_state();
    let unfiltered = totals(&state);

    let frame = state.on_slider(1080).unwrap();
    assert_eq!(frame.trip_count, 3);
    assert_eq!(frame.orphan_references, 1);
    assert_eq!(frame.marker("D32000").unwrap().departures, 3);

    state.on_slider(-1).unwrap();
    assert_eq!(state.filter(), TimeFilter::Unfiltered);
    assert_eq!(totals(&state), unfiltered);
}

#[test]
fn test_trip_crossing_midnight_uses_clock_minutes() {
    let mut state = fixture_state();

    // r09 runs 23:40 -> 00:05; its end time sits in the 00:00 window
    let frame = state.on_slider(0).unwrap();
    assert_eq!(frame.trip_count, 1);
    assert_eq!(frame.marker("M32006").unwrap().arrivals, 1);

    // 03:00 has nothing within an hour either side
    let frame = state.on_slider(180).unwrap();
    assert_eq!(frame.trip_count, 0);
    assert!(frame.markers.iter().all(|m| m.total_traffic == 0));
    // no traffic anywhere: every station stays a small dot
    assert!(frame.markers.iter().all(|m| m.radius == 3.0));
}

#[test]
fn test_view_change_moves_markers() {
    let mut state = fixture_state();
    let south = LngLat::new(-71.055547, 42.352175);

    let frame = state.on_view_event(ViewEvent::Move { center: south });
    let marker = frame.marker("D32000").unwrap();
    assert!((marker.cx - 512.0).abs() < 1e-6);
    assert!((marker.cy - 384.0).abs() < 1e-6);

    let expected = state.viewport().project(LngLat::new(-71.093198, 42.3581));
    let mit = state.frame().marker("M32006").unwrap();
    assert_eq!((mit.cx, mit.cy), (expected.x, expected.y));
}

#[test]
fn test_rejects_out_of_range_slider() {
    let mut state = fixture_state();
    assert!(matches!(state.on_slider(1440), Err(Error::InvalidCutoff(1440))));
}

#[tokio::test]
async fn test_load_dataset_from_files() {
    let sources = Sources {
        stations: fixture("stations.json"),
        trips: fixture("trips.csv"),
        ..Sources::default()
    };
    let dataset = load_dataset(&BasicClient::new(), &sources).await.unwrap();

    assert_eq!(dataset.summary.stations, 4);
    assert_eq!(dataset.summary.trips, 8);
    assert_eq!(dataset.summary.dropped_rows, 1);
    assert_eq!(dataset.stations[2].lat, 42.352175);
}

#[tokio::test]
async fn test_load_dataset_gzipped_trips() {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let path = std::env::temp_dir().join("bikeshare_traffic_trips.csv.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(include_bytes!("fixtures/trips.csv")).unwrap();
    std::fs::write(&path, encoder.finish().unwrap()).unwrap();

    let sources = Sources {
        stations: fixture("stations.json"),
        trips: path.to_string_lossy().into_owned(),
        ..Sources::default()
    };
    let dataset = load_dataset(&BasicClient::new(), &sources).await.unwrap();
    assert_eq!(dataset.trips.len(), 8);

    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_missing_source_is_a_data_load_error() {
    let sources = Sources {
        stations: fixture("no_such_file.json"),
        trips: fixture("trips.csv"),
        ..Sources::default()
    };
    let err = load_dataset(&BasicClient::new(), &sources).await.unwrap_err();
    match err {
        Error::DataLoad { source_id, .. } => assert!(source_id.ends_with("no_such_file.json")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unparseable_station_list_is_a_data_load_error() {
    let sources = Sources {
        stations: fixture("trips.csv"),
        trips: fixture("trips.csv"),
        ..Sources::default()
    };
    let err = load_dataset(&BasicClient::new(), &sources).await.unwrap_err();
    assert!(matches!(err, Error::DataLoad { .. }));
}
