use anyhow::Result;
use geojson::{Feature, Geometry, JsonObject, Value};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use shared::models::{FlightPoint, LngLat};

/// Equirectangular raster covering the whole world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldRaster {
    pub width: f64,
    pub height: f64,
}

impl Default for WorldRaster {
    fn default() -> Self {
        WorldRaster {
            width: 256.0,
            height: 256.0,
        }
    }
}

impl WorldRaster {
    /// Pixel position of a coordinate. Nothing is clamped, positions outside
    /// of [-180, 180] x [-90, 90] land outside of the raster.
    pub fn to_pixel(&self, position: LngLat) -> LngLat {
        let x = (position.lng() + 180.0) * (self.width / 360.0);
        let y = (position.lat() + 90.0) * (self.height / 180.0);
        LngLat(x, y)
    }
}

/// Serialize with four space indentation.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Points ordered by time of day, as a JSON array.
pub fn sorted_json(mut points: Vec<FlightPoint>) -> Result<Vec<u8>> {
    points.sort_by_key(|p| p.time);
    to_pretty_json(&points)
}

/// A single LineString feature through the positions, in the given order.
pub fn line_feature(positions: &[LngLat]) -> Feature {
    let line = positions.iter().map(|p| vec![p.lng(), p.lat()]).collect();
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(line))),
        id: None,
        properties: Some(JsonObject::new()),
        foreign_members: None,
    }
}

pub fn geojson(positions: &[LngLat]) -> Result<Vec<u8>> {
    to_pretty_json(&line_feature(positions))
}

pub fn pixel_geojson(positions: &[LngLat], raster: &WorldRaster) -> Result<Vec<u8>> {
    let pixels: Vec<LngLat> = positions.iter().map(|p| raster.to_pixel(*p)).collect();
    geojson(&pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn point(h: u32, m: u32, lng: f64, lat: f64) -> FlightPoint {
        FlightPoint {
            time: NaiveTime::from_hms_opt(h, m, 0).unwrap(),
            latitude: lat,
            longitude: lng,
            course: String::new(),
            speed_kts: 0.0,
            speed_mph: 0.0,
            altitude_feet: 0.0,
            reporting_facility: String::new(),
        }
    }

    fn line_coordinates(body: &[u8]) -> Vec<Vec<f64>> {
        let feature: Feature = serde_json::from_slice(body).unwrap();
        match feature.geometry.unwrap().value {
            Value::LineString(line) => line,
            other => panic!("unexpected geometry: {:?}", other),
        }
    }

    #[test]
    fn test_origin_is_center_pixel() {
        let pixel = WorldRaster::default().to_pixel(LngLat(0.0, 0.0));
        assert_eq!(pixel, LngLat(128.0, 128.0));
    }

    #[test]
    fn test_pixel_corners() {
        let raster = WorldRaster::default();
        assert_eq!(raster.to_pixel(LngLat(-180.0, -90.0)), LngLat(0.0, 0.0));
        assert_eq!(raster.to_pixel(LngLat(180.0, 90.0)), LngLat(256.0, 256.0));
    }

    #[test]
    fn test_pixel_not_clamped() {
        let pixel = WorldRaster::default().to_pixel(LngLat(360.0, 180.0));
        assert!(pixel.0 > 256.0);
        assert!(pixel.1 > 256.0);
    }

    #[test]
    fn test_custom_raster_size() {
        let raster = WorldRaster {
            width: 512.0,
            height: 512.0,
        };
        assert_eq!(raster.to_pixel(LngLat(0.0, 0.0)), LngLat(256.0, 256.0));
    }

    #[test]
    fn test_sorted_json_orders_by_time() {
        let points = vec![
            point(14, 0, 1.0, 1.0),
            point(9, 30, 2.0, 2.0),
            point(23, 59, 3.0, 3.0),
            point(9, 30, 4.0, 4.0),
        ];
        let body = sorted_json(points).unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        let times: Vec<&str> = records.iter().map(|r| r["time"].as_str().unwrap()).collect();
        assert_eq!(times, vec!["09:30:00", "09:30:00", "14:00:00", "23:59:00"]);
        // stable for equal times
        assert_eq!(records[0]["longitude"], 2.0);
        assert_eq!(records[1]["longitude"], 4.0);
    }

    #[test]
    fn test_pretty_json_uses_four_spaces() {
        let body = to_pretty_json(&vec![1, 2]).unwrap();
        assert_eq!(String::from_utf8(body).unwrap(), "[\n    1,\n    2\n]");
    }

    #[test]
    fn test_geojson_feature_shape() {
        let body = geojson(&[LngLat(-73.5, 40.5)]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["type"], "Feature");
        assert_eq!(value["geometry"]["type"], "LineString");
        assert_eq!(value["properties"], serde_json::json!({}));
    }

    #[test]
    fn test_geojson_round_trip_keeps_order() {
        let positions = vec![
            LngLat(-73.7781, 40.6413),
            LngLat(2.5479, 49.0097),
            LngLat(-0.4543, 51.47),
        ];
        let coordinates = line_coordinates(&geojson(&positions).unwrap());
        let decoded: Vec<LngLat> = coordinates.iter().map(|c| LngLat(c[0], c[1])).collect();
        assert_eq!(decoded, positions);
    }

    #[test]
    fn test_pixel_geojson_transforms_every_position() {
        let positions = vec![LngLat(0.0, 0.0), LngLat(-180.0, 90.0)];
        let coordinates =
            line_coordinates(&pixel_geojson(&positions, &WorldRaster::default()).unwrap());
        assert_eq!(coordinates, vec![vec![128.0, 128.0], vec![0.0, 256.0]]);
    }
}
