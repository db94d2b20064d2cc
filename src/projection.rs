//! Geographic to screen coordinates.
//!
//! The map engine owns the real camera; it hands us a [`Projector`] and tells
//! us when the view changes so every marker can be re-projected. [`Viewport`]
//! is a standalone Web Mercator camera with the same 512px tile convention,
//! used when no engine is attached (CLI output, tests).

use serde::Serialize;
use std::f64::consts::PI;

use crate::model::LngLat;

pub const TILE_SIZE: f64 = 512.0;

/// Latitude bound of the square Web Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

pub trait Projector {
    fn project(&self, coord: LngLat) -> ScreenPoint;
}

impl<F> Projector for F
where
    F: Fn(LngLat) -> ScreenPoint,
{
    fn project(&self, coord: LngLat) -> ScreenPoint {
        self(coord)
    }
}

/// View changes that invalidate every projected position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewEvent {
    Move { center: LngLat },
    Zoom { zoom: f64 },
    Resize { width: f64, height: f64 },
    MoveEnd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: LngLat,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for Viewport {
    /// Cambridge/Boston, at neighbourhood zoom.
    fn default() -> Self {
        Self {
            center: LngLat::new(-71.09415, 42.36027),
            zoom: 12.0,
            width: 1024.0,
            height: 768.0,
            min_zoom: 5.0,
            max_zoom: 18.0,
        }
    }
}

impl Viewport {
    pub fn apply(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Move { center } => self.center = center,
            ViewEvent::Zoom { zoom } => self.zoom = zoom.clamp(self.min_zoom, self.max_zoom),
            ViewEvent::Resize { width, height } => {
                self.width = width;
                self.height = height;
            }
            ViewEvent::MoveEnd => {}
        }
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * self.zoom.clamp(self.min_zoom, self.max_zoom).exp2()
    }
}

impl Projector for Viewport {
    fn project(&self, coord: LngLat) -> ScreenPoint {
        let size = self.world_size();
        let (px, py) = mercator(coord);
        let (cx, cy) = mercator(self.center);
        ScreenPoint {
            x: (px - cx) * size + self.width / 2.0,
            y: (py - cy) * size + self.height / 2.0,
        }
    }
}

/// Normalised Web Mercator position: x and y in `[0, 1]`, y growing south.
pub fn mercator(coord: LngLat) -> (f64, f64) {
    let lat = coord.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (coord.lon + 180.0) / 360.0;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_mercator_corners() {
        let (x, y) = mercator(LngLat::new(0.0, 0.0));
        assert!(approx(x, 0.5) && approx(y, 0.5));

        let (x, y) = mercator(LngLat::new(-180.0, MAX_LATITUDE));
        assert!(approx(x, 0.0) && approx(y, 0.0));

        let (x, y) = mercator(LngLat::new(180.0, -MAX_LATITUDE));
        assert!(approx(x, 1.0) && approx(y, 1.0));
    }

    #[test]
    fn test_center_projects_to_middle_of_screen() {
        let view = Viewport::default();
        let p = view.project(view.center);
        assert!(approx(p.x, 512.0));
        assert!(approx(p.y, 384.0));
    }

    #[test]
    fn test_north_east_is_up_right() {
        let view = Viewport::default();
        let ne = view.project(LngLat::new(view.center.lon + 0.01, view.center.lat + 0.01));
        assert!(ne.x > 512.0);
        assert!(ne.y < 384.0);
    }

    #[test]
    fn test_zoom_doubles_offsets() {
        let mut view = Viewport::default();
        let point = LngLat::new(-71.06, 42.35);
        let before = view.project(point);

        view.apply(ViewEvent::Zoom { zoom: 13.0 });
        let after = view.project(point);

        assert!(approx(after.x - 512.0, 2.0 * (before.x - 512.0)));
        assert!(approx(after.y - 384.0, 2.0 * (before.y - 384.0)));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut view = Viewport::default();
        view.apply(ViewEvent::Zoom { zoom: 30.0 });
        assert_eq!(view.zoom, 18.0);
        view.apply(ViewEvent::Zoom { zoom: 1.0 });
        assert_eq!(view.zoom, 5.0);
    }

    #[test]
    fn test_move_and_resize() {
        let mut view = Viewport::default();
        let target = LngLat::new(-71.0589, 42.3601);
        view.apply(ViewEvent::Move { center: target });
        view.apply(ViewEvent::Resize { width: 400.0, height: 300.0 });
        view.apply(ViewEvent::MoveEnd);

        let p = view.project(target);
        assert!(approx(p.x, 200.0));
        assert!(approx(p.y, 150.0));
    }

    #[test]
    fn test_closure_projector() {
        let flat = |c: LngLat| ScreenPoint { x: c.lon, y: -c.lat };
        let p = flat.project(LngLat::new(3.0, 4.0));
        assert_eq!(p, ScreenPoint { x: 3.0, y: -4.0 });
    }
}
