//! Stations and trips as they come out of the loader.
//!
//! Both are immutable once loaded. Per-run traffic counts live in
//! [`crate::traffic::TrafficTable`], indexed the same way as the station list.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};

/// A WGS84 coordinate, longitude first as map libraries expect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LngLat {
    pub lon: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// A dock location.
///
/// The join key against the trip log is the station's `short_name`; older
/// station exports call it `Number` and use `Lat`/`Long` for the coordinate.
/// Coordinates are sometimes published as strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Station {
    #[serde(rename = "short_name", alias = "Number", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, alias = "Name")]
    pub name: String,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(alias = "Lat", deserialize_with = "f64_or_string")]
    pub lat: f64,
    #[serde(alias = "Long", alias = "lng", deserialize_with = "f64_or_string")]
    pub lon: f64,
}

impl Station {
    pub fn new(id: &str, lon: f64, lat: f64) -> Self {
        Self {
            id: id.to_string(),
            name: String::new(),
            capacity: None,
            lat,
            lon,
        }
    }

    pub fn coord(&self) -> LngLat {
        LngLat::new(self.lon, self.lat)
    }
}

/// One rental, from undocking at `start_station_id` to docking at
/// `end_station_id`. Either id may be missing from the station list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub ride_id: Option<String>,
    pub start_station_id: String,
    pub end_station_id: String,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
}

impl Trip {
    pub fn start_minutes(&self) -> u32 {
        minutes_since_midnight(&self.started_at)
    }

    pub fn end_minutes(&self) -> u32 {
        minutes_since_midnight(&self.ended_at)
    }
}

/// Minute of the day, 0..=1439. Seconds are truncated.
pub fn minutes_since_midnight(t: &NaiveDateTime) -> u32 {
    t.hour() * 60 + t.minute()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    String(String),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n.to_string(),
        NumberOrString::String(s) => s,
    })
}

fn f64_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom(format!("{n} is not representable as f64"))),
        NumberOrString::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("{s:?} is not a number"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_minutes_since_midnight() {
        assert_eq!(minutes_since_midnight(&at(0, 0, 0)), 0);
        assert_eq!(minutes_since_midnight(&at(8, 5, 59)), 485);
        assert_eq!(minutes_since_midnight(&at(23, 59, 59)), 1439);
    }

    #[test]
    fn test_station_from_gbfs_record() {
        let json = r#"{
            "station_id": "a1b2",
            "short_name": "A32000",
            "name": "Fan Pier",
            "capacity": 15,
            "lat": 42.353391,
            "lon": -71.044571
        }"#;
        let station: Station = serde_json::from_str(json).unwrap();
        assert_eq!(station.id, "A32000");
        assert_eq!(station.name, "Fan Pier");
        assert_eq!(station.capacity, Some(15));
        assert_eq!(station.coord(), LngLat::new(-71.044571, 42.353391));
    }

    #[test]
    fn test_station_from_legacy_record_with_string_coords() {
        let json = r#"{"Number": 67, "Name": "MIT at Mass Ave", "Lat": "42.3581", "Long": "-71.093198"}"#;
        let station: Station = serde_json::from_str(json).unwrap();
        assert_eq!(station.id, "67");
        assert_eq!(station.lat, 42.3581);
        assert_eq!(station.lon, -71.093198);
        assert_eq!(station.capacity, None);
    }

    #[test]
    fn test_station_with_garbage_coordinate_fails() {
        let json = r#"{"short_name": "A1", "lat": "north", "lon": -71.0}"#;
        assert!(serde_json::from_str::<Station>(json).is_err());
    }
}
