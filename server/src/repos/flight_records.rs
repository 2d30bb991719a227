use shared::models::FlightPoint;

use crate::db;
use crate::models::FlightRecord;

const INSERT_STMT: &str = "INSERT INTO flight_records \
    (time, latitude, longitude, course, speed_kts, speed_mph, altitude_feet, reporting_facility) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

/// Insert a parsed batch, all rows or none.
pub async fn create_all<'a>(client: &mut db::Client<'a>, points: &[FlightPoint]) -> anyhow::Result<u64> {
    let tx = client.transaction().await?;
    let stmt = tx.prepare(INSERT_STMT).await?;

    let mut count = 0;
    for p in points {
        count += tx
            .execute(
                &stmt,
                &[&p.time, &p.latitude, &p.longitude, &p.course, &p.speed_kts, &p.speed_mph, &p.altitude_feet, &p.reporting_facility],
            )
            .await?;
    }

    tx.commit().await?;
    Ok(count)
}

pub async fn list_recent<'a>(client: &db::Client<'a>, limit: i64) -> anyhow::Result<Vec<FlightRecord>> {
    let stmt = "SELECT * FROM flight_records ORDER BY id DESC LIMIT $1";
    let rows = client.query(stmt, &[&limit]).await?;
    let records = super::from_rows(rows)?;
    Ok(records)
}
