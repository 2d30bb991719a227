use anyhow::Context;
use shared::messages::ErrorMessage;
use std::convert::Infallible;
use std::path::PathBuf;
use warp::http::StatusCode;
use warp::multipart::FormData;
use warp::{Filter, Rejection, Reply};

use crate::config::Config;
use crate::db;
use crate::encoders::WorldRaster;
use crate::error::ApiError;
use crate::{flights, geometries};

pub async fn run(address: std::net::SocketAddr, database_url: &str, config: &Config) -> anyhow::Result<()> {
    let pool = db::pool(database_url)
        .await
        .with_context(|| format!("Failed to connect to DB: {}", database_url))?;

    log::info!("Listening on {}", address);
    warp::serve(routes(pool, config)).run(address).await;
    Ok(())
}

pub fn routes(
    pool: db::Pool,
    config: &Config,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let health_route = warp::path!("health")
        .and(warp::get())
        .and(with_db(pool.clone()))
        .and_then(health);

    let import_route = warp::path!("flights" / "import")
        .and(warp::post())
        .and(upload(config.max_upload_bytes))
        .and(with_db(pool.clone()))
        .and_then(flights::import);

    let list_route = warp::path!("flights")
        .and(warp::get())
        .and(warp::query::<flights::ListQuery>())
        .and(with_db(pool.clone()))
        .and_then(flights::list);

    let create_locations_route = warp::path!("locations")
        .and(warp::post())
        .and(upload(config.max_upload_bytes))
        .and(with_db(pool.clone()))
        .and_then(geometries::create_locations);

    let location_route = warp::path!("locations" / i64)
        .and(warp::get())
        .and(with_db(pool.clone()))
        .and_then(geometries::get_location);

    let create_route_route = warp::path!("routes")
        .and(warp::post())
        .and(upload(config.max_upload_bytes))
        .and(with_db(pool.clone()))
        .and_then(geometries::create_route);

    let route_route = warp::path!("routes" / i64)
        .and(warp::get())
        .and(with_db(pool))
        .and_then(geometries::get_route);

    health_route
        .or(import_route)
        .or(list_route)
        .or(conversion_routes(config))
        .or(create_locations_route)
        .or(location_route)
        .or(create_route_route)
        .or(route_route)
        .recover(rejection)
}

/// Actions that only transform an upload, without touching the database.
pub fn conversion_routes(config: &Config) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let json_route = warp::path!("flights" / "json")
        .and(warp::post())
        .and(upload(config.max_upload_bytes))
        .and_then(flights::to_json);

    let geojson_route = warp::path!("flights" / "geojson")
        .and(warp::post())
        .and(upload(config.max_upload_bytes))
        .and_then(flights::to_geojson);

    let pixels_route = warp::path!("flights" / "geojson" / "pixels")
        .and(warp::post())
        .and(upload(config.max_upload_bytes))
        .and(with_world(config.world_raster()))
        .and_then(flights::to_pixel_geojson);

    let trajectory_route = warp::path!("flights" / "trajectory")
        .and(warp::post())
        .and(upload(config.max_upload_bytes))
        .and(with_upload_dir(config.upload_dir.clone()))
        .and_then(flights::draw_trajectory);

    json_route
        .or(geojson_route)
        .or(pixels_route)
        .or(trajectory_route)
}

fn upload(max_length: u64) -> impl Filter<Extract = (FormData,), Error = Rejection> + Clone {
    warp::multipart::form().max_length(max_length)
}

fn with_db(db_pool: db::Pool) -> impl Filter<Extract = (db::Pool,), Error = Infallible> + Clone {
    warp::any().map(move || db_pool.clone())
}

fn with_world(world: WorldRaster) -> impl Filter<Extract = (WorldRaster,), Error = Infallible> + Clone {
    warp::any().map(move || world)
}

fn with_upload_dir(dir: PathBuf) -> impl Filter<Extract = (PathBuf,), Error = Infallible> + Clone {
    warp::any().map(move || dir.clone())
}

pub async fn health(pool: db::Pool) -> Result<impl Reply, Rejection> {
    db::health(&pool)
        .await
        .map_err(|e| warp::reject::custom(ApiError::Internal(e)))
        .map(|_| StatusCode::OK)
}

pub async fn rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if let Some(e) = err.find::<ApiError>() {
        (e.status(), e.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found.".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed.".to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Upload too large.".to_string())
    } else {
        (StatusCode::BAD_REQUEST, "Invalid request.".to_string())
    };

    if code.is_server_error() {
        log::error!("Error: {:?}", err);
    } else {
        log::warn!("Rejected with {}: {}", code, message);
    }

    let json = warp::reply::json(&ErrorMessage {
        code: code.as_u16(),
        error: message,
    });

    Ok(warp::reply::with_status(json, code))
}
