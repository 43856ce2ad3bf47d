//! Project → organization lookup

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::types::GateError;

/// Owning organization of a project.
///
/// `Ok(None)` when the project row is missing or has no organization.
pub fn org_for_project(conn: &Connection, project_id: Uuid) -> Result<Option<Uuid>, GateError> {
    let org: Option<Option<String>> = conn
        .query_row(
            "SELECT org_id FROM projects WHERE id = ?1",
            params![project_id.to_string()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| GateError::Database(format!("Project lookup failed: {e}")))?;

    match org.flatten() {
        Some(raw) => Uuid::parse_str(&raw).map(Some).map_err(|e| {
            GateError::Database(format!(
                "Project {project_id} has malformed org_id {raw:?}: {e}"
            ))
        }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::init_schema;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_existing_project() {
        let conn = conn();
        let project = Uuid::new_v4();
        let org = Uuid::new_v4();
        conn.execute(
            "INSERT INTO projects (id, org_id) VALUES (?1, ?2)",
            params![project.to_string(), org.to_string()],
        )
        .unwrap();

        assert_eq!(org_for_project(&conn, project).unwrap(), Some(org));
    }

    #[test]
    fn test_missing_project() {
        let conn = conn();
        assert_eq!(org_for_project(&conn, Uuid::new_v4()).unwrap(), None);
    }

    #[test]
    fn test_project_without_org() {
        let conn = conn();
        let project = Uuid::new_v4();
        conn.execute(
            "INSERT INTO projects (id, org_id) VALUES (?1, NULL)",
            params![project.to_string()],
        )
        .unwrap();
        assert_eq!(org_for_project(&conn, project).unwrap(), None);
    }

    #[test]
    fn test_corrupt_org_is_retrieval_failure() {
        let conn = conn();
        let project = Uuid::new_v4();
        conn.execute(
            "INSERT INTO projects (id, org_id) VALUES (?1, 'garbage')",
            params![project.to_string()],
        )
        .unwrap();
        let err = org_for_project(&conn, project).unwrap_err();
        assert!(err.is_retrieval_failure());
    }
}
