//! Dataset locations.
//!
//! Each source resolves from, in order: an explicit value (CLI flag), an
//! environment variable (a `.env` file is honoured by the binary), then the
//! built-in default pointing at the March 2024 Bluebikes extracts.

pub const STATIONS_ENV: &str = "BIKESHARE_STATIONS_URL";
pub const TRIPS_ENV: &str = "BIKESHARE_TRIPS_URL";
pub const BIKE_LANES_ENV: &str = "BIKESHARE_BIKE_LANES_URL";

pub const DEFAULT_STATIONS: &str = "https://dsc106.com/labs/lab07/data/bluebikes-stations.json";
pub const DEFAULT_TRIPS: &str = "https://dsc106.com/labs/lab07/data/bluebikes-traffic-2024-03.csv";
pub const DEFAULT_BIKE_LANES: &str =
    "https://bostonopendata-boston.opendata.arcgis.com/datasets/boston::existing-bike-network-2022.geojson";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub stations: String,
    pub trips: String,
    /// GeoJSON for the bike-lane layer. Passed through to the map untouched.
    pub bike_lanes: String,
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            stations: DEFAULT_STATIONS.to_string(),
            trips: DEFAULT_TRIPS.to_string(),
            bike_lanes: DEFAULT_BIKE_LANES.to_string(),
        }
    }
}

impl Sources {
    /// Resolves each source from the given override, the process environment,
    /// or the default.
    pub fn resolve(
        stations: Option<String>,
        trips: Option<String>,
        bike_lanes: Option<String>,
    ) -> Self {
        Self::resolve_with(stations, trips, bike_lanes, |key| std::env::var(key).ok())
    }

    pub fn resolve_with<F>(
        stations: Option<String>,
        trips: Option<String>,
        bike_lanes: Option<String>,
        env: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |v: &String| !v.trim().is_empty();
        let pick = |explicit: Option<String>, key: &str, default: &str| {
            explicit
                .filter(non_blank)
                .or_else(|| env(key).filter(non_blank))
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            stations: pick(stations, STATIONS_ENV, DEFAULT_STATIONS),
            trips: pick(trips, TRIPS_ENV, DEFAULT_TRIPS),
            bike_lanes: pick(bike_lanes, BIKE_LANES_ENV, DEFAULT_BIKE_LANES),
        }
    }
}
