//! Output formatting and persistence for computed frames.
//!
//! Supports pretty-printing, JSON serialization, and CSV append (one row per
//! station per frame).

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::pipeline::{Frame, StationMarker};
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// One CSV row: a station marker tagged with the filter that produced it.
#[derive(Debug, Serialize)]
pub struct MarkerRecord<'a> {
    pub cutoff: i32,
    pub label: &'a str,
    pub id: &'a str,
    pub name: &'a str,
    pub lon: f64,
    pub lat: f64,
    pub cx: f64,
    pub cy: f64,
    pub arrivals: usize,
    pub departures: usize,
    pub total_traffic: usize,
    pub radius: f64,
    pub departure_ratio: f64,
    pub flow: f64,
}

impl<'a> MarkerRecord<'a> {
    pub fn new(frame: &'a Frame, marker: &'a StationMarker) -> Self {
        Self {
            cutoff: frame.cutoff,
            label: &frame.label,
            id: &marker.id,
            name: &marker.name,
            lon: marker.lon,
            lat: marker.lat,
            cx: marker.cx,
            cy: marker.cy,
            arrivals: marker.arrivals,
            departures: marker.departures,
            total_traffic: marker.total_traffic,
            radius: marker.radius,
            departure_ratio: marker.departure_ratio,
            flow: marker.flow,
        }
    }
}

/// A frame plus the bike-lane layer the map should draw beneath it.
#[derive(Debug, Serialize)]
pub struct FrameDocument<'a> {
    pub bike_lanes: &'a str,
    #[serde(flatten)]
    pub frame: &'a Frame,
}

/// Logs a frame using Rust's debug pretty-print format.
pub fn print_pretty(frame: &Frame) {
    debug!("{:#?}", frame);
}

/// Logs a frame as pretty-printed JSON.
pub fn print_json(frame: &Frame) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(frame)?);
    Ok(())
}

/// Writes a frame document as JSON, replacing `path` if it exists.
pub fn write_json(path: &str, document: &FrameDocument<'_>) -> Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, document)?;
    debug!(path, markers = document.frame.markers.len(), "Frame JSON written");
    Ok(())
}

/// Appends every marker of `frame` as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_frame(path: &str, frame: &Frame) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = frame.markers.len(), "Appending CSV rows");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // header only on a fresh file
        .from_writer(file);

    for marker in &frame.markers {
        writer.serialize(MarkerRecord::new(frame, marker))?;
    }
    writer.flush()?;

    Ok(())
}
