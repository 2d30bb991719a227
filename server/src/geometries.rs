use shared::messages::StatusMessage;
use warp::http::StatusCode;
use warp::multipart::FormData;
use warp::{Rejection, Reply};

use crate::db;
use crate::encoders;
use crate::error::{internal, ApiError};
use crate::flight_csv::{self, Positions, Waypoint, MAX_NAME_LEN};
use crate::repos;
use crate::uploads::Upload;

const FILE: &str = "file";
const NAME: &str = "name";
const NO_FILE: &str = "No file uploaded";
const DEFAULT_ROUTE_NAME: &str = "Unnamed Route";

fn created(status: &str) -> impl Reply {
    warp::reply::with_status(
        warp::reply::json(&StatusMessage::new(status)),
        StatusCode::CREATED,
    )
}

/// Store one geography point per CSV row, each as its own insert.
///
/// Every row is checked before the first insert.
pub async fn create_locations(form: FormData, pool: db::Pool) -> Result<impl Reply, Rejection> {
    let upload = Upload::read(form).await?;
    let waypoints: Vec<Waypoint> = Positions::new(upload.required_text(FILE, NO_FILE)?)
        .and_then(|rows| rows.collect())
        .map_err(ApiError::from)?;

    let client = pool.get().await.map_err(internal)?;
    let mut count = 0;
    for waypoint in waypoints {
        let location = repos::locations::create(&client, waypoint.name.as_deref(), waypoint.position)
            .await
            .map_err(ApiError::Internal)?;
        log::debug!("Created location {:?}", location);
        count += 1;
    }
    log::info!("Created {} locations", count);

    Ok(created("Geometry points created successfully"))
}

pub async fn get_location(id: i64, pool: db::Pool) -> Result<impl Reply, Rejection> {
    let client = pool.get().await.map_err(internal)?;
    match repos::locations::get(&client, id)
        .await
        .map_err(ApiError::Internal)?
    {
        Some(location) => Ok(warp::reply::json(&location)),
        None => Err(warp::reject::not_found()),
    }
}

fn route_name(upload: &Upload) -> Result<String, ApiError> {
    let name = upload
        .field(NAME)
        .unwrap_or_else(|| DEFAULT_ROUTE_NAME.to_string());
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "Route name cannot exceed {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name)
}

/// Store every CSV row, in order, as a single named LineString.
pub async fn create_route(form: FormData, pool: db::Pool) -> Result<impl Reply, Rejection> {
    let upload = Upload::read(form).await?;
    let path =
        flight_csv::parse_positions(upload.required_text(FILE, NO_FILE)?).map_err(ApiError::from)?;

    match path.len() {
        0 => return Err(ApiError::BadRequest("No valid data found in the file".into()).into()),
        1 => return Err(ApiError::BadRequest("A route needs at least two positions".into()).into()),
        _ => {}
    }
    let name = route_name(&upload)?;

    let client = pool.get().await.map_err(internal)?;
    let route = repos::routes::create(&client, &name, &path)
        .await
        .map_err(ApiError::Internal)?;
    log::info!("Created route {} '{}' with {} points", route.id, route.name, route.path.len());

    Ok(created("LineString created successfully"))
}

pub async fn get_route(id: i64, pool: db::Pool) -> Result<impl Reply, Rejection> {
    let client = pool.get().await.map_err(internal)?;
    let route = repos::routes::get(&client, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(warp::reject::not_found)?;

    let mut feature = encoders::line_feature(&route.path);
    feature.set_property("id", route.id);
    feature.set_property("name", route.name);
    Ok(warp::reply::json(&feature))
}
