use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// A geographic position, longitude first.
///
/// Serializes as a `[lng, lat]` pair, the GeoJSON axis order.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct LngLat(pub f64, pub f64);

impl LngLat {
    pub fn lng(&self) -> f64 {
        self.0
    }

    pub fn lat(&self) -> f64 {
        self.1
    }
}

/// One row of a flight track CSV.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FlightPoint {
    pub time: NaiveTime,
    pub latitude: f64,
    pub longitude: f64,
    pub course: String,
    pub speed_kts: f64,
    pub speed_mph: f64,
    pub altitude_feet: f64,
    pub reporting_facility: String,
}

impl FlightPoint {
    pub fn position(&self) -> LngLat {
        LngLat(self.longitude, self.latitude)
    }
}
