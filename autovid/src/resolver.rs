//! Terminal-to-site resolution.
//!
//! A terminal identifier is matched by substring against the camera names in
//! the DVR inventory database; the joined site row gives the site name the
//! target app's dashboard search understands. Exactly-one is the only good
//! outcome: zero rows is a clean "not found", more than one is an error the
//! caller must not guess around.

use std::env;
use std::path::Path;

use rusqlite::Connection;
use tracing::debug;

use crate::errors::AutomationError;

/// Environment variable naming the DVR inventory database.
pub const DB_PATH_ENV: &str = "AUTOVID_DB_PATH";

const SITE_QUERY: &str = "SELECT B.SiteName \
     FROM DvrCameras AS A \
     LEFT JOIN Sites AS B ON A.Dvr_ID = B.ID \
     WHERE A.Name LIKE '%' || ?1 || '%'";

#[derive(Debug)]
pub struct SiteResolver {
    conn: Connection,
}

impl SiteResolver {
    /// Fails fast with `Configuration` before any query when the environment
    /// does not name a database.
    pub fn from_env() -> Result<Self, AutomationError> {
        let path = env::var(DB_PATH_ENV).map_err(|_| {
            AutomationError::Configuration(format!(
                "required environment variable {DB_PATH_ENV} is not set"
            ))
        })?;
        Self::open(Path::new(&path))
    }

    pub fn open(path: &Path) -> Result<Self, AutomationError> {
        if !path.exists() {
            return Err(AutomationError::Configuration(format!(
                "site database does not exist: {}",
                path.display()
            )));
        }
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn with_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Resolve one terminal identifier to its site name.
    ///
    /// Zero matches is `Ok(None)`; more than one fails with `AmbiguousMatch`
    /// carrying the count. The single-row site name comes back trimmed.
    pub fn resolve(&self, terminal: &str) -> Result<Option<String>, AutomationError> {
        debug!(terminal, "resolving terminal to site");
        let mut stmt = self.conn.prepare(SITE_QUERY)?;
        let names: Vec<Option<String>> = stmt
            .query_map([terminal], |row| row.get::<_, Option<String>>(0))?
            .collect::<Result<_, _>>()?;

        match names.len() {
            0 => Ok(None),
            1 => Ok(names
                .into_iter()
                .next()
                .flatten()
                .map(|name| name.trim().to_string())),
            count => Err(AutomationError::AmbiguousMatch {
                terminal: terminal.to_string(),
                count,
            }),
        }
    }

    /// Batch resolution is not supported; callers resolve one terminal per
    /// task.
    pub fn resolve_many(&self, _terminals: &[&str]) -> Result<Vec<String>, AutomationError> {
        Err(AutomationError::NotImplemented(
            "batch terminal resolution".to_string(),
        ))
    }
}
