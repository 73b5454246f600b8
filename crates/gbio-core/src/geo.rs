//! Geodesy helpers for building geofences and tile grids.

use crate::error::Result;
use crate::models::{BoundingPolygon, Coordinate};

/// Kilometres per degree of latitude (spherical approximation).
pub const KM_PER_DEG_LAT: f64 = 111.0;

/// Kilometres per degree of longitude at the equator.
pub const KM_PER_DEG_LON_EQUATOR: f64 = 111.320;

/// Convert a distance in kilometres to degree offsets at a given latitude.
///
/// # Arguments
/// * `km` - Distance in kilometres
/// * `lat_deg` - Reference latitude in decimal degrees
///
/// # Returns
/// (lon_deg, lat_deg). The longitude offset grows without bound towards the
/// poles; no clamping is applied.
pub fn km_to_degrees(km: f64, lat_deg: f64) -> (f64, f64) {
    let lat_offset = km / KM_PER_DEG_LAT;
    let lon_offset = km / (KM_PER_DEG_LON_EQUATOR * lat_deg.to_radians().cos());
    (lon_offset, lat_offset)
}

/// Build an axis-aligned rectangle centred on a point.
///
/// `width_lon_deg` and `width_lat_deg` are the full extents, not half-widths.
pub fn bounding_polygon(
    center_lon: f64,
    center_lat: f64,
    width_lon_deg: f64,
    width_lat_deg: f64,
) -> BoundingPolygon {
    let lon_half = width_lon_deg / 2.0;
    let lat_half = width_lat_deg / 2.0;

    BoundingPolygon {
        lon_min: center_lon - lon_half,
        lat_min: center_lat - lat_half,
        lon_max: center_lon + lon_half,
        lat_max: center_lat + lat_half,
    }
}

/// Square geofence of side `2 * radius_km` around a coordinate.
pub fn geofence(center: Coordinate, radius_km: f64) -> BoundingPolygon {
    let (lon_deg, lat_deg) = km_to_degrees(radius_km, center.lat);
    bounding_polygon(center.lon, center.lat, lon_deg * 2.0, lat_deg * 2.0)
}

/// Centres of an `n x n` grid of tiles, each `tile_width_km` wide, around `center`.
///
/// Spacing is computed once at the centre latitude. With an even `tiles_per_side`
/// the grid still spans `-n/2..=n/2`, so it has one extra row and column.
/// A grid reaching past a pole or the antimeridian is an `InvalidCoordinate` error.
pub fn tile_grid(
    center: Coordinate,
    tile_width_km: f64,
    tiles_per_side: usize,
) -> Result<Vec<Coordinate>> {
    let (lon_step, lat_step) = km_to_degrees(tile_width_km, center.lat);
    let half = (tiles_per_side / 2) as i64;

    let mut centers = Vec::with_capacity(((2 * half + 1) * (2 * half + 1)) as usize);
    for i in -half..=half {
        let lon = center.lon + i as f64 * lon_step;
        for j in -half..=half {
            let lat = center.lat + j as f64 * lat_step;
            centers.push(Coordinate::new(lat, lon)?);
        }
    }
    Ok(centers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use approx::assert_relative_eq;

    #[test]
    fn km_to_degrees_latitude_is_exact() {
        for &(km, lat) in &[(1.0, 0.0), (0.75, 51.53), (12.5, -33.9), (3.0, 89.0)] {
            let (lon_deg, lat_deg) = km_to_degrees(km, lat);
            assert_eq!(lat_deg, km / 111.0);
            assert!(lon_deg > 0.0);
            assert!(lat_deg > 0.0);
        }
    }

    #[test]
    fn km_to_degrees_widens_longitude_with_latitude() {
        let (equator, _) = km_to_degrees(1.0, 0.0);
        let (london, _) = km_to_degrees(1.0, 51.5);
        assert_relative_eq!(equator, 1.0 / 111.320, epsilon = 1e-12);
        assert!(london > equator);
    }

    #[test]
    fn km_to_degrees_near_pole_is_large_not_error() {
        let (lon_deg, _) = km_to_degrees(1.0, 90.0);
        assert!(lon_deg.abs() > 1e6 || lon_deg.is_infinite());
    }

    #[test]
    fn bounding_polygon_is_symmetric() {
        let polygon = bounding_polygon(-0.2165, 51.5306, 0.0288, 0.018);
        let (lon, lat) = polygon.center();
        assert_relative_eq!(lon, -0.2165, epsilon = 1e-12);
        assert_relative_eq!(lat, 51.5306, epsilon = 1e-12);
        assert!(polygon.lon_min < polygon.lon_max);
        assert!(polygon.lat_min < polygon.lat_max);
        assert_relative_eq!(polygon.lon_max - polygon.lon_min, 0.0288, epsilon = 1e-12);
    }

    #[test]
    fn bounding_polygon_ring_order() {
        let polygon = bounding_polygon(10.0, 20.0, 2.0, 4.0);
        assert_eq!(
            polygon.ring(),
            [(9.0, 18.0), (9.0, 22.0), (11.0, 22.0), (11.0, 18.0), (9.0, 18.0)]
        );
    }

    #[test]
    fn geofence_spans_twice_the_radius() {
        let center = Coordinate::new(51.530583, -0.216498).unwrap();
        let fence = geofence(center, 1.0);
        let (lon_deg, lat_deg) = km_to_degrees(1.0, center.lat);
        assert_relative_eq!(fence.lat_max - fence.lat_min, 2.0 * lat_deg, epsilon = 1e-12);
        assert_relative_eq!(fence.lon_max - fence.lon_min, 2.0 * lon_deg, epsilon = 1e-12);
    }

    #[test]
    fn tile_grid_layout() {
        let center = Coordinate::new(53.48, -2.24).unwrap();
        let grid = tile_grid(center, 1.5, 3).unwrap();
        assert_eq!(grid.len(), 9);

        let (lon_step, lat_step) = km_to_degrees(1.5, center.lat);
        // longitude outer, latitude inner
        assert_relative_eq!(grid[0].lon, center.lon - lon_step, epsilon = 1e-12);
        assert_relative_eq!(grid[0].lat, center.lat - lat_step, epsilon = 1e-12);
        assert_relative_eq!(grid[1].lon, center.lon - lon_step, epsilon = 1e-12);
        assert_relative_eq!(grid[1].lat, center.lat, epsilon = 1e-12);
        assert_eq!(grid[4], center);
    }

    #[test]
    fn tile_grid_even_count_includes_center() {
        let center = Coordinate::new(0.0, 0.0).unwrap();
        let grid = tile_grid(center, 1.0, 14).unwrap();
        assert_eq!(grid.len(), 15 * 15);
        assert!(grid.contains(&center));
    }

    #[test]
    fn tile_grid_past_antimeridian_is_rejected() {
        let center = Coordinate::new(0.0, 179.99).unwrap();
        assert!(matches!(
            tile_grid(center, 10.0, 3),
            Err(CoreError::InvalidCoordinate { .. })
        ));

        let polar = Coordinate::new(89.95, 10.0).unwrap();
        assert!(tile_grid(polar, 10.0, 3).is_err());

        // every point of an accepted grid is a valid coordinate
        let inland = Coordinate::new(0.0, 179.0).unwrap();
        for point in tile_grid(inland, 10.0, 3).unwrap() {
            assert_eq!(Coordinate::new(point.lat, point.lon).unwrap(), point);
        }
    }
}
