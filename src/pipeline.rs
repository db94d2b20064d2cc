//! Filter, aggregate, scale and project in one pass.
//!
//! [`PipelineState`] owns everything a UI event handler needs: the loaded
//! stations and trips, the current filter and the current view. Each slider
//! change runs the whole pipeline again over the full trip log; each view
//! change only re-projects.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::filter::{TimeFilter, filter_trips};
use crate::loader::Dataset;
use crate::model::{LngLat, Station, Trip};
use crate::projection::{Projector, ViewEvent, Viewport};
use crate::scale::{Quantize, RadiusRange, SqrtScale, flow_ratio, flow_scale};
use crate::traffic::{StationTraffic, compute_traffic};

/// Everything needed to draw one station's circle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationMarker {
    pub id: String,
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    pub cx: f64,
    pub cy: f64,
    pub arrivals: usize,
    pub departures: usize,
    pub total_traffic: usize,
    pub radius: f64,
    pub departure_ratio: f64,
    /// Quantized departure ratio, used as the colour-mix fraction.
    pub flow: f64,
    pub tooltip: String,
}

impl StationMarker {
    fn new(
        station: &Station,
        traffic: StationTraffic,
        radius: &SqrtScale,
        flow: &Quantize<f64>,
    ) -> Self {
        let total = traffic.total();
        let ratio = flow_ratio(traffic.departures, total);
        Self {
            id: station.id.clone(),
            name: station.name.clone(),
            lon: station.lon,
            lat: station.lat,
            cx: 0.0,
            cy: 0.0,
            arrivals: traffic.arrivals,
            departures: traffic.departures,
            total_traffic: total,
            radius: radius.radius(total),
            departure_ratio: ratio,
            flow: flow.apply(ratio),
            tooltip: tooltip(&traffic),
        }
    }
}

pub fn tooltip(traffic: &StationTraffic) -> String {
    format!(
        "{} trips ({} departures, {} arrivals)",
        traffic.total(),
        traffic.departures,
        traffic.arrivals
    )
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    /// `-1` when unfiltered, otherwise the cutoff minute.
    pub cutoff: i32,
    pub label: String,
    pub trip_count: usize,
    pub max_traffic: usize,
    pub radius_range: RadiusRange,
    pub orphan_references: usize,
    pub markers: Vec<StationMarker>,
}

impl Frame {
    pub fn marker(&self, id: &str) -> Option<&StationMarker> {
        self.markers.iter().find(|m| m.id == id)
    }

    /// Recomputes screen positions, leaving traffic and scale untouched.
    pub fn reproject<P: Projector + ?Sized>(&mut self, projector: &P) {
        for marker in &mut self.markers {
            let p = projector.project(LngLat::new(marker.lon, marker.lat));
            marker.cx = p.x;
            marker.cy = p.y;
        }
    }
}

/// Runs filter → aggregate → scale for `filter` and projects with `projector`.
///
/// The radius domain is the busiest station in this run, so the same count can
/// draw at different sizes under different filters.
pub fn run<P: Projector + ?Sized>(
    stations: &[Station],
    trips: &[Trip],
    filter: TimeFilter,
    projector: &P,
) -> Frame {
    let view = filter_trips(trips, filter);
    let table = compute_traffic(stations, &view);
    let max_traffic = table.max_total();
    let radius = SqrtScale::new(max_traffic, RadiusRange::for_filter(&filter));
    let flow = flow_scale();

    let markers = stations
        .iter()
        .zip(table.per_station.iter())
        .map(|(station, traffic)| StationMarker::new(station, *traffic, &radius, &flow))
        .collect();

    let mut frame = Frame {
        cutoff: filter.slider_value(),
        label: filter.label(),
        trip_count: view.len(),
        max_traffic,
        radius_range: radius.range(),
        orphan_references: table.orphan_references,
        markers,
    };
    frame.reproject(projector);

    debug!(
        cutoff = frame.cutoff,
        trips = frame.trip_count,
        max_traffic,
        "Pipeline run complete"
    );
    frame
}

/// Explicit state for an interactive session.
#[derive(Debug)]
pub struct PipelineState {
    stations: Vec<Station>,
    trips: Vec<Trip>,
    filter: TimeFilter,
    viewport: Viewport,
    frame: Frame,
}

impl PipelineState {
    pub fn new(stations: Vec<Station>, trips: Vec<Trip>, viewport: Viewport) -> Self {
        let filter = TimeFilter::Unfiltered;
        let frame = run(&stations, &trips, filter, &viewport);
        info!(
            stations = stations.len(),
            trips = trips.len(),
            max_traffic = frame.max_traffic,
            "Initial traffic computed"
        );
        Self {
            stations,
            trips,
            filter,
            viewport,
            frame,
        }
    }

    pub fn from_dataset(dataset: Dataset, viewport: Viewport) -> Self {
        Self::new(dataset.stations, dataset.trips, viewport)
    }

    pub fn filter(&self) -> TimeFilter {
        self.filter
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Applies a filter and returns the freshly computed frame.
    pub fn update(&mut self, filter: TimeFilter) -> &Frame {
        self.filter = filter;
        self.frame = run(&self.stations, &self.trips, filter, &self.viewport);
        &self.frame
    }

    /// Handles a raw slider value; `-1` clears the filter.
    pub fn on_slider(&mut self, value: i32) -> Result<&Frame> {
        let filter = TimeFilter::from_slider(value)?;
        Ok(self.update(filter))
    }

    /// Handles a pan/zoom/resize by re-projecting the current frame.
    pub fn on_view_event(&mut self, event: ViewEvent) -> &Frame {
        self.viewport.apply(event);
        self.frame.reproject(&self.viewport);
        &self.frame
    }
}
