//! SQLite-backed catalog storage
//!
//! ## Tables
//!
//! - `projects` - project id → owning organization id
//! - `document_types` - catalog entries with optional scope and org binding
//!
//! ## Concurrency
//!
//! Reads run on the blocking pool through [`CatalogDb::run`]. If the awaiting
//! future is dropped (client disconnect, caller timeout) before the statement
//! finishes, the statement is interrupted through the connection's interrupt
//! handle; if it has not started yet it is skipped.

pub mod document_types;
pub mod projects;
pub mod schema;

use async_trait::async_trait;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, InterruptHandle};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::search::{fold, FOLD_SQL_FUNCTION};
use crate::catalog::{CatalogFilter, CatalogPage, CatalogStore, ProjectOrgLookup};
use crate::types::{GateError, Result};

/// Lifecycle of one blocking catalog task.
///
/// Transitions happen under the task's state lock. The task leaves `Running`
/// while it still holds the connection, so an interrupt issued under the
/// state lock in `Running` can only reach this task's own statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskState {
    Pending,
    Running,
    Cancelled,
    Done,
}

/// Register the search fold function and create the schema
pub fn configure_connection(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        FOLD_SQL_FUNCTION,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| fold(&t)))
        },
    )
    .map_err(|e| GateError::Database(format!("Failed to register {FOLD_SQL_FUNCTION}: {e}")))?;

    schema::init_schema(conn)
}

/// SQLite catalog database
pub struct CatalogDb {
    conn: Arc<Mutex<Connection>>,
    interrupt: Arc<InterruptHandle>,
}

impl CatalogDb {
    /// Open or create the catalog database file
    pub fn open(path: &Path) -> Result<Self> {
        info!("Opening catalog database at {:?}", path);

        let conn = Connection::open(path)
            .map_err(|e| GateError::Database(format!("Failed to open SQLite: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| GateError::Database(format!("Failed to set PRAGMA: {e}")))?;

        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        debug!("Opening in-memory catalog database");

        let conn = Connection::open_in_memory()
            .map_err(|e| GateError::Database(format!("Failed to open in-memory SQLite: {e}")))?;

        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        configure_connection(&conn)?;
        let interrupt = Arc::new(conn.get_interrupt_handle());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            interrupt,
        })
    }

    /// Synchronous access to the connection (startup checks, fixtures)
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| GateError::Database(format!("Lock poisoned: {e}")))?;
        f(&conn)
    }

    /// Run `op` on the blocking pool. Dropping the returned future cancels it.
    pub async fn run<F, T>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let state = Arc::new(Mutex::new(TaskState::Pending));
        let mut guard = CancelOnDrop {
            state: Arc::clone(&state),
            interrupt: Arc::clone(&self.interrupt),
            armed: true,
        };

        let task = tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| GateError::Database(format!("Lock poisoned: {e}")))?;
            {
                let mut current = lock_state(&state)?;
                if *current != TaskState::Pending {
                    return Err(GateError::Database("Query cancelled before start".into()));
                }
                *current = TaskState::Running;
            }
            let result = op(&conn);
            *lock_state(&state)? = TaskState::Done;
            drop(conn);
            result
        });

        let joined = task.await;
        guard.armed = false;
        joined.map_err(|e| GateError::Internal(format!("Catalog task failed: {e}")))?
    }

    /// Liveness check for readiness probes
    pub async fn ping(&self) -> Result<()> {
        self.run(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map(|_| ())
                .map_err(|e| GateError::Database(format!("Ping failed: {e}")))
        })
        .await
    }
}

fn lock_state(state: &Mutex<TaskState>) -> Result<std::sync::MutexGuard<'_, TaskState>> {
    state
        .lock()
        .map_err(|e| GateError::Internal(format!("Task state poisoned: {e}")))
}

/// Cancels or interrupts a catalog task whose caller went away
struct CancelOnDrop {
    state: Arc<Mutex<TaskState>>,
    interrupt: Arc<InterruptHandle>,
    armed: bool,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Ok(mut current) = self.state.lock() else {
            return;
        };
        match *current {
            TaskState::Pending => {
                debug!("Catalog query cancelled before start");
                *current = TaskState::Cancelled;
            }
            TaskState::Running => {
                // Still holding the state lock: the task cannot reach Done
                // (and release the connection) until the interrupt is issued.
                debug!("Interrupting in-flight catalog query");
                self.interrupt.interrupt();
            }
            TaskState::Cancelled | TaskState::Done => {}
        }
    }
}

/// [`ProjectOrgLookup`] and [`CatalogStore`] over a [`CatalogDb`]
#[derive(Clone)]
pub struct SqliteCatalog {
    db: Arc<CatalogDb>,
}

impl SqliteCatalog {
    pub fn new(db: Arc<CatalogDb>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Arc<CatalogDb> {
        &self.db
    }
}

#[async_trait]
impl ProjectOrgLookup for SqliteCatalog {
    async fn org_for_project(&self, project_id: Uuid) -> Result<Option<Uuid>> {
        self.db
            .run(move |conn| projects::org_for_project(conn, project_id))
            .await
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn query(&self, filter: &CatalogFilter) -> Result<CatalogPage> {
        let filter = filter.clone();
        self.db
            .run(move |conn| document_types::list_document_types(conn, &filter))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_ping_in_memory() {
        let db = CatalogDb::open_in_memory().unwrap();
        tokio_test::assert_ok!(db.ping().await);
    }

    #[tokio::test]
    async fn test_fold_function_registered() {
        let db = CatalogDb::open_in_memory().unwrap();
        let folded: String = db
            .run(|conn| {
                conn.query_row("SELECT fold_text('Éclair')", [], |row| row.get(0))
                    .map_err(GateError::from)
            })
            .await
            .unwrap();
        assert_eq!(folded, "eclair");
    }

    #[tokio::test]
    async fn test_sqlite_catalog_lookup() {
        let db = Arc::new(CatalogDb::open_in_memory().unwrap());
        let project = Uuid::new_v4();
        let org = Uuid::new_v4();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO projects (id, org_id) VALUES (?1, ?2)",
                params![project.to_string(), org.to_string()],
            )?;
            Ok(())
        })
        .unwrap();

        let catalog = SqliteCatalog::new(db);
        assert_eq!(catalog.org_for_project(project).await.unwrap(), Some(org));
        assert_eq!(catalog.org_for_project(Uuid::new_v4()).await.unwrap(), None);
    }

    /// Never terminates unless interrupted
    const RUNAWAY_SQL: &str =
        "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n) SELECT COUNT(*) FROM n";

    fn runaway(conn: &Connection) -> Result<i64> {
        conn.query_row(RUNAWAY_SQL, [], |row| row.get(0))
            .map_err(GateError::from)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_dropped_query_is_interrupted() {
        let db = Arc::new(CatalogDb::open_in_memory().unwrap());

        let outcome = tokio::time::timeout(Duration::from_millis(100), db.run(runaway)).await;
        assert!(outcome.is_err());

        // The connection is released as soon as the statement is interrupted
        let ping = tokio::time::timeout(Duration::from_secs(5), db.ping()).await;
        tokio_test::assert_ok!(ping.expect("ping should not wait on the runaway query"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_queued_query_cancelled_before_start() {
        let db = Arc::new(CatalogDb::open_in_memory().unwrap());

        let holder = {
            let db = Arc::clone(&db);
            tokio::spawn(async move { db.run(runaway).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let executed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&executed);
        let queued = tokio::time::timeout(
            Duration::from_millis(50),
            db.run(move |_conn| {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }),
        )
        .await;
        assert!(queued.is_err());

        holder.abort();
        let ping = tokio::time::timeout(Duration::from_secs(5), db.ping()).await;
        tokio_test::assert_ok!(ping.expect("ping should not wait on the runaway query"));

        // Give the skipped task time to observe its cancellation
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!executed.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stale_guard_does_not_interrupt_other_query() {
        let db = Arc::new(CatalogDb::open_in_memory().unwrap());

        let slow = {
            let db = Arc::clone(&db);
            tokio::spawn(async move {
                db.run(|conn| {
                    conn.query_row(
                        "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 2000000) SELECT COUNT(*) FROM n",
                        [],
                        |row| row.get::<_, i64>(0),
                    )
                    .map_err(GateError::from)
                })
                .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Guard of a task that already finished, dropped while another
        // request's statement is running
        drop(CancelOnDrop {
            state: Arc::new(Mutex::new(TaskState::Done)),
            interrupt: Arc::clone(&db.interrupt),
            armed: true,
        });

        assert_eq!(slow.await.unwrap().unwrap(), 2_000_000);
    }

    #[test]
    fn test_pending_guard_marks_cancelled() {
        let db = CatalogDb::open_in_memory().unwrap();
        let state = Arc::new(Mutex::new(TaskState::Pending));
        drop(CancelOnDrop {
            state: Arc::clone(&state),
            interrupt: Arc::clone(&db.interrupt),
            armed: true,
        });
        assert_eq!(*state.lock().unwrap(), TaskState::Cancelled);
    }

    #[tokio::test]
    async fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        {
            let db = CatalogDb::open(&path).unwrap();
            db.ping().await.unwrap();
        }
        // Reopening an existing file keeps the schema
        let db = CatalogDb::open(&path).unwrap();
        let count: i64 = db
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM document_types", [], |row| row.get(0))
                    .map_err(GateError::from)
            })
            .unwrap();
        assert_eq!(count, 0);
    }
}
