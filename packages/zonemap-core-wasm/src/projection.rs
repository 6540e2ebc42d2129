use crate::config::MapConfig;

/// Local equirectangular projection around a fixed reference center.
///
/// Only valid for extents that are small compared to the Earth radius (a few
/// tens of kilometers). There is no curvature correction and no antimeridian
/// handling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateProjector {
    center_lat: f64,
    center_lon: f64,
    radius: f64,
    scale: f64,
    cos_center_lat: f64,
}

impl CoordinateProjector {
    pub fn new(center_lat: f64, center_lon: f64, radius: f64, scale: f64) -> Self {
        Self {
            center_lat,
            center_lon,
            radius,
            scale,
            cos_center_lat: center_lat.to_radians().cos(),
        }
    }

    pub fn from_config(config: &MapConfig) -> Self {
        Self::new(
            config.center_lat,
            config.center_lon,
            config.earth_radius,
            config.scale,
        )
    }

    /// Map (lat, lon) in degrees to planar scene units `(x, y)`.
    ///
    /// The degree offsets are multiplied by the radius as-is, so the scene is
    /// uniformly stretched relative to true meters; every consumer shares the
    /// same factor so relative geometry is preserved.
    pub fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        let x = (lon - self.center_lon) * (self.radius * self.cos_center_lat);
        let y = (lat - self.center_lat) * self.radius;
        (x / self.scale, y / self.scale)
    }
}
