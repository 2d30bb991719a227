use chrono::NaiveTime;
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use shared::models::{FlightPoint, LngLat};
use thiserror::Error;

// 12-hour clock, e.g. "02:15:30 PM"
const TIME_FORMAT: &str = "%I:%M:%S %p";

pub const TIME: &str = "Time";
pub const LATITUDE: &str = "Latitude";
pub const LONGITUDE: &str = "Longitude";
pub const COURSE: &str = "Course";
pub const SPEED_KTS: &str = "SpeedKts";
pub const SPEED_MPH: &str = "SpeedMph";
pub const ALTITUDE_FEET: &str = "AltitudeFeet";
pub const REPORTING_FACILITY: &str = "Reporting Facility";
pub const NAME: &str = "Name";

/// Longest name a location or route may carry.
pub const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("Invalid time format: {0}")]
    InvalidTime(String),
    #[error("'{0}'")]
    MissingColumn(&'static str),
    #[error("could not convert string to float: '{0}'")]
    InvalidNumber(String),
    #[error("Location name cannot exceed {0} characters")]
    NameTooLong(usize),
    #[error("Malformed CSV: {0}")]
    Malformed(#[from] csv::Error),
}

struct Columns {
    headers: StringRecord,
}

impl Columns {
    fn index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

fn records(text: &str) -> Result<(Columns, StringRecordsIntoIter<&[u8]>), CsvError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    Ok((Columns { headers }, reader.into_records()))
}

/// Absent columns and short rows read as empty cells.
fn cell<'r>(record: &'r StringRecord, index: Option<usize>) -> &'r str {
    index.and_then(|i| record.get(i)).unwrap_or("")
}

/// NaN and infinities count as unparsable.
fn parse_float(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

// chrono skips surrounding whitespace, time cells must match exactly
fn parse_time(value: &str) -> Result<NaiveTime, CsvError> {
    if value.trim() != value {
        return Err(CsvError::InvalidTime(value.to_string()));
    }
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|_| CsvError::InvalidTime(value.to_string()))
}

/// Parse a flight track CSV into points, in file order.
///
/// A time cell that does not parse fails the whole batch. Numeric cells that
/// do not parse become 0.0; latitude and longitude fall back together.
pub fn parse_flight_points(text: &str) -> Result<Vec<FlightPoint>, CsvError> {
    let (columns, records) = records(text)?;
    let time = columns.index(TIME);
    let latitude = columns.index(LATITUDE);
    let longitude = columns.index(LONGITUDE);
    let course = columns.index(COURSE);
    let speed_kts = columns.index(SPEED_KTS);
    let speed_mph = columns.index(SPEED_MPH);
    let altitude_feet = columns.index(ALTITUDE_FEET);
    let reporting_facility = columns.index(REPORTING_FACILITY);

    let mut points = Vec::new();
    for record in records {
        let record = record?;
        let (lat, lng) = match (
            parse_float(cell(&record, latitude)),
            parse_float(cell(&record, longitude)),
        ) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => (0.0, 0.0),
        };

        points.push(FlightPoint {
            time: parse_time(cell(&record, time))?,
            latitude: lat,
            longitude: lng,
            course: cell(&record, course).to_string(),
            speed_kts: parse_float(cell(&record, speed_kts)).unwrap_or(0.0),
            speed_mph: parse_float(cell(&record, speed_mph)).unwrap_or(0.0),
            altitude_feet: parse_float(cell(&record, altitude_feet)).unwrap_or(0.0),
            reporting_facility: cell(&record, reporting_facility).trim().to_string(),
        });
    }
    Ok(points)
}

/// Positions of every row, with unparsable pairs at (0, 0).
pub fn parse_positions_lenient(text: &str) -> Result<Vec<LngLat>, CsvError> {
    let (columns, records) = records(text)?;
    let latitude = columns.index(LATITUDE);
    let longitude = columns.index(LONGITUDE);

    records
        .map(|record| -> Result<LngLat, CsvError> {
            let record = record?;
            let position = match (
                parse_float(cell(&record, latitude)),
                parse_float(cell(&record, longitude)),
            ) {
                (Some(lat), Some(lng)) => LngLat(lng, lat),
                _ => LngLat(0.0, 0.0),
            };
            Ok(position)
        })
        .collect()
}

/// A strictly parsed row, with the optional `Name` cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Waypoint {
    pub position: LngLat,
    pub name: Option<String>,
}

/// Row by row positions that must all be present and numeric.
pub struct Positions<'a> {
    records: StringRecordsIntoIter<&'a [u8]>,
    latitude: Option<usize>,
    longitude: Option<usize>,
    name: Option<usize>,
}

impl<'a> Positions<'a> {
    pub fn new(text: &'a str) -> Result<Self, CsvError> {
        let (columns, records) = records(text)?;
        Ok(Positions {
            latitude: columns.index(LATITUDE),
            longitude: columns.index(LONGITUDE),
            name: columns.index(NAME),
            records,
        })
    }

    fn waypoint(&self, record: &StringRecord) -> Result<Waypoint, CsvError> {
        let lat = strict_float(record, self.latitude, LATITUDE)?;
        let lng = strict_float(record, self.longitude, LONGITUDE)?;
        let name = cell(record, self.name).trim();
        if name.chars().count() > MAX_NAME_LEN {
            return Err(CsvError::NameTooLong(MAX_NAME_LEN));
        }
        Ok(Waypoint {
            position: LngLat(lng, lat),
            name: (!name.is_empty()).then(|| name.to_string()),
        })
    }
}

fn strict_float(
    record: &StringRecord,
    index: Option<usize>,
    name: &'static str,
) -> Result<f64, CsvError> {
    let index = index.ok_or(CsvError::MissingColumn(name))?;
    let value = record.get(index).unwrap_or("");
    parse_float(value).ok_or_else(|| CsvError::InvalidNumber(value.to_string()))
}

impl Iterator for Positions<'_> {
    type Item = Result<Waypoint, CsvError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };
        Some(self.waypoint(&record))
    }
}

/// All positions of a CSV, failing on the first missing column or bad value.
pub fn parse_positions(text: &str) -> Result<Vec<LngLat>, CsvError> {
    Positions::new(text)?
        .map(|waypoint| waypoint.map(|w| w.position))
        .collect()
}
