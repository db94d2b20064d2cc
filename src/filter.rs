//! Time-of-day filtering of the trip log.
//!
//! A cutoff selects every trip that started or ended within an hour of it.
//! The window does not wrap around midnight: a cutoff of 00:10 will not pick
//! up a trip that ended at 23:50.

use chrono::NaiveTime;

use crate::error::{Error, Result};
use crate::model::Trip;

/// Half-width of the filter window, in minutes. Both ends are inclusive.
pub const WINDOW_MINUTES: u32 = 60;

/// Slider value that means "no filter".
pub const UNFILTERED_SLIDER_VALUE: i32 = -1;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeFilter {
    #[default]
    Unfiltered,
    /// Minute of the day, 0..=1439.
    Cutoff(u32),
}

impl TimeFilter {
    /// Interprets a raw slider value: `-1` for any time, otherwise a minute of
    /// the day.
    pub fn from_slider(value: i32) -> Result<Self> {
        match value {
            UNFILTERED_SLIDER_VALUE => Ok(TimeFilter::Unfiltered),
            v if (0..MINUTES_PER_DAY as i32).contains(&v) => Ok(TimeFilter::Cutoff(v as u32)),
            v => Err(Error::InvalidCutoff(v)),
        }
    }

    pub fn slider_value(&self) -> i32 {
        match self {
            TimeFilter::Unfiltered => UNFILTERED_SLIDER_VALUE,
            TimeFilter::Cutoff(m) => *m as i32,
        }
    }

    pub fn is_filtered(&self) -> bool {
        matches!(self, TimeFilter::Cutoff(_))
    }

    /// Whether a trip falls inside this filter's window.
    pub fn admits(&self, trip: &Trip) -> bool {
        match self {
            TimeFilter::Unfiltered => true,
            TimeFilter::Cutoff(cutoff) => {
                trip.start_minutes().abs_diff(*cutoff) <= WINDOW_MINUTES
                    || trip.end_minutes().abs_diff(*cutoff) <= WINDOW_MINUTES
            }
        }
    }

    /// Caption for the slider: `8:05 AM` style, or `any time`.
    pub fn label(&self) -> String {
        match self {
            TimeFilter::Unfiltered => "any time".to_string(),
            TimeFilter::Cutoff(m) => format_minutes(*m),
        }
    }
}

/// Formats a minute of the day as a short en-US clock time.
pub fn format_minutes(minutes: u32) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
        .map(|t| t.format("%-I:%M %p").to_string())
        .unwrap_or_default()
}

/// The trips selected by a [`TimeFilter`].
///
/// `All` borrows the loaded trip log as-is; `Subset` holds references to the
/// admitted trips in their original order.
#[derive(Debug, Clone)]
pub enum TripView<'a> {
    All(&'a [Trip]),
    Subset(Vec<&'a Trip>),
}

impl<'a> TripView<'a> {
    pub fn len(&self) -> usize {
        match self {
            TripView::All(trips) => trips.len(),
            TripView::Subset(trips) => trips.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &'a Trip> + '_> {
        match self {
            TripView::All(trips) => {
                let trips: &'a [Trip] = trips;
                Box::new(trips.iter())
            }
            TripView::Subset(trips) => Box::new(trips.iter().copied()),
        }
    }
}

/// Selects the trips admitted by `filter` in a single pass.
pub fn filter_trips(trips: &[Trip], filter: TimeFilter) -> TripView<'_> {
    match filter {
        TimeFilter::Unfiltered => TripView::All(trips),
        TimeFilter::Cutoff(_) => TripView::Subset(trips.iter().filter(|t| filter.admits(t)).collect()),
    }
}
