//! Mapping traffic counts to marker size and flow colour.
//!
//! Both scales mirror the d3 scales the map front end was designed around:
//! an unclamped square-root scale for radius, and a quantize scale that cuts
//! the departure ratio into three equal buckets.

use serde::Serialize;

use crate::filter::TimeFilter;

/// Output range of the radius scale, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadiusRange {
    pub min: f64,
    pub max: f64,
}

impl RadiusRange {
    pub const UNFILTERED: RadiusRange = RadiusRange { min: 0.0, max: 25.0 };
    /// Filtered views get a non-zero floor so quiet stations stay visible.
    pub const FILTERED: RadiusRange = RadiusRange { min: 3.0, max: 50.0 };

    pub fn for_filter(filter: &TimeFilter) -> Self {
        if filter.is_filtered() {
            Self::FILTERED
        } else {
            Self::UNFILTERED
        }
    }
}

/// Square-root scale from `[0, domain_max]` onto a [`RadiusRange`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SqrtScale {
    domain_max: f64,
    range: RadiusRange,
}

impl SqrtScale {
    pub fn new(domain_max: usize, range: RadiusRange) -> Self {
        Self {
            domain_max: domain_max as f64,
            range,
        }
    }

    pub fn range(&self) -> RadiusRange {
        self.range
    }

    /// Values above the domain extrapolate past `range.max`. With an empty
    /// domain every value sits at `range.min`, so quiet stations stay small.
    pub fn radius(&self, value: usize) -> f64 {
        let RadiusRange { min, max } = self.range;
        let span = self.domain_max.sqrt();
        let t = if span == 0.0 {
            0.0
        } else {
            (value as f64).sqrt() / span
        };
        min + t * (max - min)
    }
}

/// Quantize scale: splits a continuous domain into `range.len()` equal-width
/// segments. Inputs outside the domain clamp to the first or last bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantize<T> {
    domain: (f64, f64),
    range: Vec<T>,
}

impl<T: Copy> Quantize<T> {
    /// Panics if `range` is empty.
    pub fn new(domain: (f64, f64), range: Vec<T>) -> Self {
        assert!(!range.is_empty(), "quantize scale needs at least one bucket");
        Self { domain, range }
    }

    /// Inner bucket boundaries. A value equal to a threshold falls in the
    /// upper bucket.
    pub fn thresholds(&self) -> Vec<f64> {
        let (lo, hi) = self.domain;
        let n = self.range.len();
        (1..n).map(|i| lo + (hi - lo) * i as f64 / n as f64).collect()
    }

    pub fn apply(&self, value: f64) -> T {
        let bucket = self.thresholds().iter().take_while(|&&t| t <= value).count();
        self.range[bucket]
    }
}

/// The three-step flow scale: mostly arrivals, balanced, mostly departures.
pub fn flow_scale() -> Quantize<f64> {
    Quantize::new((0.0, 1.0), vec![0.0, 0.5, 1.0])
}

/// Share of a station's traffic that is departures. Zero when the station saw
/// no traffic at all.
pub fn flow_ratio(departures: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        departures as f64 / total as f64
    }
}
