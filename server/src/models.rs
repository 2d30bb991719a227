use chrono::NaiveTime;
use postgis::ewkb;
use serde::Serialize;
use shared::models::LngLat;
use tokio_postgres::Row;

pub const SRID: i32 = 4326;

pub fn to_ewkb(position: LngLat) -> ewkb::Point {
    ewkb::Point::new(position.lng(), position.lat(), Some(SRID))
}

pub fn from_ewkb(point: &ewkb::Point) -> LngLat {
    LngLat(point.x, point.y)
}

#[derive(Clone, Debug, Serialize)]
pub struct FlightRecord {
    pub id: i64,
    pub time: NaiveTime,
    pub latitude: f64,
    pub longitude: f64,
    pub course: String,
    pub speed_kts: f64,
    pub speed_mph: f64,
    pub altitude_feet: f64,
    pub reporting_facility: String,
}

impl TryFrom<&Row> for FlightRecord {
    type Error = tokio_postgres::Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(FlightRecord {
            id: row.try_get("id")?,
            time: row.try_get("time")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            course: row.try_get("course")?,
            speed_kts: row.try_get("speed_kts")?,
            speed_mph: row.try_get("speed_mph")?,
            altitude_feet: row.try_get("altitude_feet")?,
            reporting_facility: row.try_get("reporting_facility")?,
        })
    }
}

/// Named geography point.
#[derive(Clone, Debug, Serialize)]
pub struct Location {
    pub id: i64,
    pub name: Option<String>,
    pub point: LngLat,
}

impl TryFrom<&Row> for Location {
    type Error = tokio_postgres::Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let point: ewkb::Point = row.try_get("point")?;
        Ok(Location {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            point: from_ewkb(&point),
        })
    }
}

/// Named polyline.
#[derive(Clone, Debug)]
pub struct Route {
    pub id: i64,
    pub name: String,
    pub path: Vec<LngLat>,
}

impl TryFrom<&Row> for Route {
    type Error = tokio_postgres::Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let path: ewkb::LineString = row.try_get("path")?;
        Ok(Route {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            path: path.points.iter().map(from_ewkb).collect(),
        })
    }
}
