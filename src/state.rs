use crate::commands::db::get_db_connection;
use crate::error::ApiError;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppState {
    db_path: Arc<PathBuf>,
}

impl AppState {
    /// Opens the database once so the schema exists before requests arrive.
    pub fn open(db_path: PathBuf) -> rusqlite::Result<Self> {
        get_db_connection(&db_path)?;
        Ok(Self {
            db_path: Arc::new(db_path),
        })
    }

    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Runs one store operation on its own connection, off the async workers.
    pub async fn with_connection<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db_path = Arc::clone(&self.db_path);
        let result = tokio::task::spawn_blocking(move || {
            let conn = get_db_connection(&db_path)?;
            op(&conn)
        })
        .await?;

        Ok(result?)
    }
}
