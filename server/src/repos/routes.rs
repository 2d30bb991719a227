use postgis::ewkb;
use shared::models::LngLat;

use crate::db;
use crate::models::{to_ewkb, Route, SRID};

const INSERT_STMT: &str = "INSERT INTO routes (name, path) VALUES ($1, $2) RETURNING id, name, path";

pub async fn create<'a>(client: &db::Client<'a>, name: &str, path: &[LngLat]) -> anyhow::Result<Route> {
    let line = ewkb::LineString {
        points: path.iter().map(|p| to_ewkb(*p)).collect(),
        srid: Some(SRID),
    };
    let row = client.query_one(INSERT_STMT, &[&name, &line]).await?;
    let route = Route::try_from(&row)?;
    Ok(route)
}

pub async fn get<'a>(client: &db::Client<'a>, id: i64) -> anyhow::Result<Option<Route>> {
    let stmt = "SELECT id, name, path FROM routes WHERE id = $1";
    match client.query_opt(stmt, &[&id]).await? {
        Some(row) => Ok(Some(Route::try_from(&row)?)),
        None => Ok(None),
    }
}
