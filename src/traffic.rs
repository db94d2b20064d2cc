//! Per-station arrival and departure counts.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::filter::TripView;
use crate::model::Station;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StationTraffic {
    pub arrivals: usize,
    pub departures: usize,
}

impl StationTraffic {
    pub fn total(&self) -> usize {
        self.arrivals + self.departures
    }
}

/// Trip counts grouped by start station (departures) and end station
/// (arrivals).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TrafficIndex {
    departures: HashMap<String, usize>,
    arrivals: HashMap<String, usize>,
}

impl TrafficIndex {
    pub fn build(trips: &TripView<'_>) -> Self {
        let mut index = TrafficIndex::default();
        for trip in trips.iter() {
            *index.departures.entry(trip.start_station_id.clone()).or_default() += 1;
            *index.arrivals.entry(trip.end_station_id.clone()).or_default() += 1;
        }
        index
    }

    pub fn departures(&self, station_id: &str) -> usize {
        self.departures.get(station_id).copied().unwrap_or(0)
    }

    pub fn arrivals(&self, station_id: &str) -> usize {
        self.arrivals.get(station_id).copied().unwrap_or(0)
    }

    pub fn get(&self, station_id: &str) -> StationTraffic {
        StationTraffic {
            arrivals: self.arrivals(station_id),
            departures: self.departures(station_id),
        }
    }

    /// Number of trip endpoints counted under ids outside `known`.
    pub fn unmatched(&self, known: &HashSet<&str>) -> usize {
        self.departures
            .iter()
            .chain(self.arrivals.iter())
            .filter(|(id, _)| !known.contains(id.as_str()))
            .map(|(_, count)| count)
            .sum()
    }
}

/// Traffic for every station, in station-list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficTable {
    pub per_station: Vec<StationTraffic>,
    /// Trip endpoints whose station id is not in the station list.
    pub orphan_references: usize,
}

impl TrafficTable {
    pub fn max_total(&self) -> usize {
        self.per_station.iter().map(StationTraffic::total).max().unwrap_or(0)
    }
}

/// Counts arrivals and departures for each station over `trips`.
///
/// Stations nobody rode to or from get zeros. Trips whose endpoints are
/// unknown stations add nothing to any station.
pub fn compute_traffic(stations: &[Station], trips: &TripView<'_>) -> TrafficTable {
    let index = TrafficIndex::build(trips);

    let per_station: Vec<StationTraffic> = stations.iter().map(|s| index.get(&s.id)).collect();

    let known: HashSet<&str> = stations.iter().map(|s| s.id.as_str()).collect();
    let orphan_references = index.unmatched(&known);
    if orphan_references > 0 {
        debug!(orphan_references, "Trip endpoints reference unknown stations");
    }

    TrafficTable {
        per_station,
        orphan_references,
    }
}
