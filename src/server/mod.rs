//! REST API serving the cafeteria dashboard

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;

use crate::dataset::Dataset;
use crate::sqlite_source::{SqliteTransactionSource, DEFAULT_TABLE};
use tracing_subscriber::EnvFilter;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server host address (default: "127.0.0.1")
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
    /// Path to SQLite database
    pub database_path: String,
    /// Transaction table name (default: "cafteria")
    pub table: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_path: "cafeteria.db".to_string(),
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database_path: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        ServerConfig {
            host: host.into(),
            port,
            database_path: database_path.into(),
            table: table.into(),
        }
    }

    /// Reads `HOST`, `PORT`, `DATABASE_PATH` and `CAFETERIA_TABLE`, falling
    /// back to the defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = ServerConfig::default();
        ServerConfig {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(defaults.port),
            database_path: lookup("DATABASE_PATH").unwrap_or(defaults.database_path),
            table: lookup("CAFETERIA_TABLE").unwrap_or(defaults.table),
        }
    }
}

/// Runs the API server
///
/// Loads the whole transaction table once before binding; a failed load
/// aborts startup.
///
/// # Example
/// ```rust,no_run
/// use cafeteria::server::{run_server, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     run_server(ServerConfig::from_env()).await?;
///     Ok(())
/// }
/// ```
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let source = SqliteTransactionSource::open(&config.database_path, config.table.clone())?;
    let dataset = Dataset::load(&source)?;
    tracing::info!(
        rows = dataset.len(),
        invalid = dataset.invalid_count(),
        table = %config.table,
        "transactions loaded"
    );

    let state = AppState::new(source, dataset);
    let app = routes::create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
