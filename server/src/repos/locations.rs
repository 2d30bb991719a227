use shared::models::LngLat;

use crate::db;
use crate::models::{to_ewkb, Location};

// Reserving the id up front lets a default name be written with the row.
const NEXT_ID_STMT: &str = "SELECT nextval(pg_get_serial_sequence('locations', 'id'))";

const INSERT_STMT: &str = "INSERT INTO locations (id, name, point) \
    VALUES ($1, $2, $3) \
    RETURNING id, name, point";

pub fn default_name(id: i64) -> String {
    format!("Location {}", id)
}

pub async fn create<'a>(
    client: &db::Client<'a>,
    name: Option<&str>,
    position: LngLat,
) -> anyhow::Result<Location> {
    let id: i64 = client.query_one(NEXT_ID_STMT, &[]).await?.try_get(0)?;
    let name = name.map(str::to_string).unwrap_or_else(|| default_name(id));

    let row = client
        .query_one(INSERT_STMT, &[&id, &name, &to_ewkb(position)])
        .await?;
    let location = Location::try_from(&row)?;
    Ok(location)
}

pub async fn get<'a>(client: &db::Client<'a>, id: i64) -> anyhow::Result<Option<Location>> {
    let stmt = "SELECT id, name, point FROM locations WHERE id = $1";
    match client.query_opt(stmt, &[&id]).await? {
        Some(row) => Ok(Some(Location::try_from(&row)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_name() {
        assert_eq!(default_name(42), "Location 42");
    }
}
