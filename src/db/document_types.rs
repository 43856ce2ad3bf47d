//! Document type catalog queries
//!
//! The page query and the count query share one WHERE clause so the total can
//! never disagree with the items. Both run inside one deferred read
//! transaction so they observe the same snapshot.

use rusqlite::types::Type;
use rusqlite::{named_params, Connection, Row};
use tracing::debug;
use uuid::Uuid;

use crate::catalog::{fold, CatalogEntry, CatalogFilter, CatalogPage};
use crate::types::GateError;

/// Visibility, active and search predicate shared by page and count.
///
/// Parameters: `:org_id`, `:active_only` (0/1), `:needle` (folded term or NULL).
const FILTER_PREDICATE: &str = r#"
    (dt.scope IS NULL OR dt.scope = 'project')
    AND (dt.org_id IS NULL OR dt.org_id = :org_id)
    AND (:active_only = 0 OR dt.is_active = 1)
    AND (:needle IS NULL
         OR instr(fold_text(dt.code), :needle) > 0
         OR instr(fold_text(dt.name), :needle) > 0)
"#;

/// Effective display order; entries with neither column count as 0
const DISPLAY_ORDER: &str = r#"COALESCE(dt."order", dt.sort_order, 0)"#;

fn page_sql() -> String {
    format!(
        r#"SELECT dt.id, dt.code, dt.name, dt.is_active,
       {DISPLAY_ORDER} AS display_order
FROM document_types dt
WHERE {FILTER_PREDICATE}
ORDER BY {DISPLAY_ORDER}, dt.name, dt.id
LIMIT :limit"#
    )
}

fn count_sql() -> String {
    format!("SELECT COUNT(1) FROM document_types dt WHERE {FILTER_PREDICATE}")
}

fn entry_from_row(row: &Row) -> Result<CatalogEntry, rusqlite::Error> {
    let raw_id: String = row.get("id")?;
    let id = Uuid::parse_str(&raw_id)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;

    Ok(CatalogEntry {
        id,
        code: row.get::<_, Option<String>>("code")?.unwrap_or_default(),
        name: row.get::<_, Option<String>>("name")?.unwrap_or_default(),
        is_active: row.get("is_active")?,
        order: row.get("display_order")?,
    })
}

/// Run the filtered page and count queries
pub fn list_document_types(
    conn: &Connection,
    filter: &CatalogFilter,
) -> Result<CatalogPage, GateError> {
    let org_id = filter.organization_id.to_string();
    let active_only = i64::from(filter.active_only);
    let needle = filter.search.as_deref().map(fold);
    let limit = i64::from(filter.limit);

    debug!(
        project_id = %filter.project_id,
        org_id = %org_id,
        active_only = filter.active_only,
        search = ?filter.search,
        limit,
        "Querying document types"
    );

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| GateError::Database(format!("Transaction failed: {e}")))?;

    let items = {
        let mut stmt = tx
            .prepare(&page_sql())
            .map_err(|e| GateError::Database(format!("Prepare failed: {e}")))?;
        let rows = stmt
            .query_map(
                named_params! {
                    ":org_id": org_id,
                    ":active_only": active_only,
                    ":needle": needle,
                    ":limit": limit,
                },
                entry_from_row,
            )
            .map_err(|e| GateError::Database(format!("Query failed: {e}")))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| GateError::Database(format!("Row parse failed: {e}")))?
    };

    let total: i64 = tx
        .query_row(
            &count_sql(),
            named_params! {
                ":org_id": org_id,
                ":active_only": active_only,
                ":needle": needle,
            },
            |row| row.get(0),
        )
        .map_err(|e| GateError::Database(format!("Count failed: {e}")))?;

    tx.finish()
        .map_err(|e| GateError::Database(format!("Transaction finish failed: {e}")))?;

    Ok(CatalogPage {
        items,
        total: u64::try_from(total).unwrap_or_default(),
    })
}
