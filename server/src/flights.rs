use serde::Deserialize;
use shared::messages::StatusMessage;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use warp::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use warp::http::Response;
use warp::multipart::FormData;
use warp::{Rejection, Reply};

use crate::db;
use crate::encoders::{self, WorldRaster};
use crate::error::{internal, ApiError};
use crate::flight_csv::{self, CsvError};
use crate::geotiff;
use crate::repos;
use crate::trajectory;
use crate::uploads::{self, Upload};

const FILE: &str = "file";
const TIFF_FILE: &str = "tifffile";
const CSV_FILE: &str = "csvfile";
const NO_FILE: &str = "No file uploaded.";
const NO_TRAJECTORY_FILES: &str = "Both GeoTIFF and CSV files are required.";

fn attachment(body: Vec<u8>, filename: &str) -> Result<Response<Vec<u8>>, ApiError> {
    Response::builder()
        .header(CONTENT_TYPE, "application/json")
        .header(CONTENT_DISPOSITION, format!("attachment; filename={}", filename))
        .body(body)
        .map_err(internal)
}

pub async fn import(form: FormData, pool: db::Pool) -> Result<impl Reply, Rejection> {
    let upload = Upload::read(form).await?;
    let points = flight_csv::parse_flight_points(upload.required_text(FILE, NO_FILE)?)
        .map_err(ApiError::from)?;

    let mut client = pool.get().await.map_err(internal)?;
    let count = repos::flight_records::create_all(&mut client, &points)
        .await
        .map_err(ApiError::Internal)?;
    log::info!("Imported {} flight records", count);

    Ok(warp::reply::json(&StatusMessage::new(
        "CSV data successfully uploaded.",
    )))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

pub async fn list(query: ListQuery, pool: db::Pool) -> Result<impl Reply, Rejection> {
    let client = pool.get().await.map_err(internal)?;
    let records = repos::flight_records::list_recent(&client, query.limit.clamp(0, 10_000))
        .await
        .map_err(ApiError::Internal)?;
    Ok(warp::reply::json(&records))
}

pub async fn to_json(form: FormData) -> Result<impl Reply, Rejection> {
    let upload = Upload::read(form).await?;
    let points = flight_csv::parse_flight_points(upload.required_text(FILE, NO_FILE)?)
        .map_err(ApiError::from)?;
    log::info!("Converting {} flight points to JSON", points.len());

    let body = encoders::sorted_json(points).map_err(ApiError::Internal)?;
    Ok(attachment(body, "sorted_data.json")?)
}

pub async fn to_geojson(form: FormData) -> Result<impl Reply, Rejection> {
    let upload = Upload::read(form).await?;
    let positions = flight_csv::parse_positions_lenient(upload.required_text(FILE, NO_FILE)?)
        .map_err(ApiError::from)?;
    log::info!("Converting {} positions to GeoJSON", positions.len());

    let body = encoders::geojson(&positions).map_err(ApiError::Internal)?;
    Ok(attachment(body, "sorted_data.geojson")?)
}

pub async fn to_pixel_geojson(form: FormData, world: WorldRaster) -> Result<impl Reply, Rejection> {
    let upload = Upload::read(form).await?;
    let positions = flight_csv::parse_positions_lenient(upload.required_text(FILE, NO_FILE)?)
        .map_err(ApiError::from)?;
    log::info!(
        "Converting {} positions to {}x{} pixel GeoJSON",
        positions.len(),
        world.width,
        world.height
    );

    let body = encoders::pixel_geojson(&positions, &world).map_err(ApiError::Internal)?;
    Ok(attachment(body, "sorted_transformed_data.geojson")?)
}

pub async fn draw_trajectory(form: FormData, upload_dir: PathBuf) -> Result<impl Reply, Rejection> {
    let upload = Upload::read(form).await?;
    let (tiff, csv) = match (upload.file(TIFF_FILE), upload.file(CSV_FILE)) {
        (Some(tiff), Some(csv)) => (tiff, csv),
        _ => return Err(ApiError::MissingUpload(NO_TRAJECTORY_FILES).into()),
    };

    let png = render_trajectory(&upload_dir, tiff, csv)?;

    let response = Response::builder()
        .header(CONTENT_TYPE, "image/png")
        .header(CONTENT_DISPOSITION, "inline; filename=\"trajectory.png\"")
        .body(png)
        .map_err(internal)?;
    Ok(response)
}

fn trajectory_csv_error(err: CsvError) -> ApiError {
    match err {
        CsvError::MissingColumn(_) => {
            ApiError::BadRequest(format!("Missing required column in CSV: {}", err))
        }
        CsvError::InvalidNumber(_) => {
            ApiError::BadRequest(format!("Invalid data in CSV file: {}", err))
        }
        other => other.into(),
    }
}

fn render_trajectory(upload_dir: &Path, tiff: &[u8], csv: &[u8]) -> Result<Vec<u8>, ApiError> {
    let tiff_path = uploads::persist(upload_dir, "world", ".tif", tiff)?;
    let csv_path = uploads::persist(upload_dir, "flight_data", ".csv", csv)?;
    log::debug!("Stored uploads at {:?} and {:?}", tiff_path, csv_path);

    let file = File::open(&tiff_path).map_err(internal)?;
    let geotiff = geotiff::decode(BufReader::new(file)).map_err(|e| ApiError::Raster(e.to_string()))?;

    let data = std::fs::read(&csv_path).map_err(internal)?;
    let positions =
        flight_csv::parse_positions(uploads::decode_text(&data)?).map_err(trajectory_csv_error)?;

    let (width, height) = geotiff.raster.dimensions();
    log::info!(
        "Drawing {} positions over a {}x{} raster",
        positions.len(),
        width,
        height
    );
    trajectory::render(geotiff, &positions).map_err(ApiError::Internal)
}
