//! Loading the station list and trip log.
//!
//! The station list is JSON, the trip log CSV. Either may be a URL or a local
//! path and either may be gzip-compressed (see [`crate::fetch`]). The two
//! fetches run one after the other, station list first; a failure in either
//! aborts the load with [`Error::DataLoad`].
//!
//! Individual trip rows that cannot be read, most often because a timestamp
//! does not parse, are dropped and counted in [`LoadSummary::dropped_rows`].

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::config::Sources;
use crate::error::{Error, Result};
use crate::fetch::{HttpClient, read_source};
use crate::model::{Station, Trip};

/// Timestamp layouts seen in trip exports, tried in order before RFC 3339.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub stations: usize,
    pub trips: usize,
    pub dropped_rows: usize,
}

#[derive(Debug)]
pub struct Dataset {
    pub stations: Vec<Station>,
    pub trips: Vec<Trip>,
    pub summary: LoadSummary,
}

#[derive(Deserialize)]
struct StationEnvelope {
    data: StationData,
}

#[derive(Deserialize)]
struct StationData {
    stations: Vec<Station>,
}

#[derive(Deserialize)]
struct TripRecord {
    #[serde(default)]
    ride_id: Option<String>,
    start_station_id: String,
    end_station_id: String,
    started_at: String,
    ended_at: String,
}

/// Fetches and parses both datasets.
#[tracing::instrument(skip_all, fields(stations = %sources.stations, trips = %sources.trips))]
pub async fn load_dataset<C: HttpClient>(client: &C, sources: &Sources) -> Result<Dataset> {
    let stations = load_stations(client, &sources.stations).await?;

    info!("Loading trip data, this can take a while for a full month");
    let (trips, dropped_rows) = load_trips(client, &sources.trips).await?;

    let summary = LoadSummary {
        stations: stations.len(),
        trips: trips.len(),
        dropped_rows,
    };
    info!(
        stations = summary.stations,
        trips = summary.trips,
        dropped_rows = summary.dropped_rows,
        "Datasets loaded"
    );

    Ok(Dataset {
        stations,
        trips,
        summary,
    })
}

pub async fn load_stations<C: HttpClient>(client: &C, source: &str) -> Result<Vec<Station>> {
    let bytes = read_source(client, source).await.map_err(|e| {
        error!(source, error = %e, "Error loading station data");
        Error::data_load(source, e)
    })?;

    parse_stations(&bytes).map_err(|e| {
        error!(source, error = %e, "Error parsing station data");
        Error::data_load(source, e)
    })
}

pub async fn load_trips<C: HttpClient>(client: &C, source: &str) -> Result<(Vec<Trip>, usize)> {
    let bytes = read_source(client, source).await.map_err(|e| {
        error!(source, error = %e, "Error loading trip data");
        Error::data_load(source, e)
    })?;

    parse_trips(bytes.as_slice()).map_err(|e| {
        error!(source, error = %e, "Error parsing trip data");
        Error::data_load(source, e)
    })
}

/// Parses a station list in either the `{"data": {"stations": [...]}}`
/// envelope or as a bare array. The shape is picked from the first token so a
/// bad record reports its own field error.
pub fn parse_stations(bytes: &[u8]) -> serde_json::Result<Vec<Station>> {
    let is_object = bytes.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{');
    let stations = if is_object {
        serde_json::from_slice::<StationEnvelope>(bytes)?.data.stations
    } else {
        serde_json::from_slice::<Vec<Station>>(bytes)?
    };
    debug!(count = stations.len(), "Stations parsed");
    Ok(stations)
}

/// Parses a trip log, returning the trips that survived and how many rows were
/// dropped. Only a structurally broken file (bad header, I/O) is an error.
///
/// Rows are read as raw bytes, so stray encodings in columns that are never
/// read (station names, mostly) do not cost the row.
pub fn parse_trips<R: std::io::Read>(reader: R) -> csv::Result<(Vec<Trip>, usize)> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.byte_headers()?.clone();

    let mut trips = Vec::new();
    let mut dropped = 0usize;

    for (row, result) in rdr.byte_records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => {
                debug!(row, error = %e, "Dropping unreadable trip row");
                dropped += 1;
                continue;
            }
        };
        let parsed: TripRecord = match record.deserialize(Some(&headers)) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(row, error = %e, "Dropping unreadable trip row");
                dropped += 1;
                continue;
            }
        };

        match into_trip(parsed) {
            Some(trip) => trips.push(trip),
            None => {
                debug!(row, "Dropping trip row with malformed timestamp");
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        warn!(dropped, kept = trips.len(), "Trip rows dropped during parsing");
    }

    Ok((trips, dropped))
}

fn into_trip(record: TripRecord) -> Option<Trip> {
    Some(Trip {
        started_at: parse_timestamp(&record.started_at)?,
        ended_at: parse_timestamp(&record.ended_at)?,
        ride_id: record.ride_id.filter(|id| !id.is_empty()),
        start_station_id: record.start_station_id,
        end_station_id: record.end_station_id,
    })
}

/// Parses a trip timestamp into wall-clock time. Offsets in RFC 3339 input are
/// dropped, keeping the local time as written.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.naive_local()))
}
