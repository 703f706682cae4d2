// src/catalog.rs
//
// Loads the point list for a data source from the system database.

use tokio_postgres::NoTls;

use crate::config::DbConfig;
use crate::error::OuterFault;
use crate::model::{ObjectType, Point};

/// Query `tbl_points` for `data_source_id`, ordered by `id`.
///
/// Opens a fresh connection for this one query and lets it drop once the
/// rows are collected, per the per-cycle-frozen catalog lifecycle: the
/// point list is refreshed only by an outer-loop restart, so there is no
/// reason to hold the system-DB connection open between loads.
pub async fn load(config: &DbConfig, data_source_id: i64) -> Result<Vec<Point>, OuterFault> {
    let conn_str = config.to_connection_string();
    let (client, connection) = tokio_postgres::connect(&conn_str, NoTls)
        .await
        .map_err(OuterFault::CatalogUnavailable)?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("system database connection error: {e}");
        }
    });

    let rows = client
        .query(
            "SELECT id, name, object_type, is_trend, ratio, address \
             FROM tbl_points WHERE data_source_id = $1 ORDER BY id",
            &[&data_source_id],
        )
        .await
        .map_err(OuterFault::CatalogUnavailable)?;

    let mut points = Vec::with_capacity(rows.len());
    for row in &rows {
        let object_type_raw: String = row.get("object_type");
        let Some(object_type) = ObjectType::from_db_str(&object_type_raw) else {
            continue;
        };
        points.push(Point {
            id: row.get("id"),
            name: row.get("name"),
            object_type,
            is_trend: row.get("is_trend"),
            ratio: row.get("ratio"),
            address_raw: row.get("address"),
        });
    }

    if points.is_empty() {
        return Err(OuterFault::CatalogEmpty);
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_host_is_catalog_unavailable() {
        let config = DbConfig {
            host: "127.0.0.1".into(),
            port: 1, // nothing listens here
            database: "nope".into(),
            username: "nope".into(),
            password: "nope".into(),
        };
        let err = load(&config, 1).await.unwrap_err();
        assert!(matches!(err, OuterFault::CatalogUnavailable(_)));
    }
}
