use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable pointing at the database file.
pub const DATABASE_ENV: &str = "FINANCAS_DB";

const APP_DIR_NAME: &str = "financas";
const DATABASE_FILE_NAME: &str = "financas.db";

/// Where the ledger lives and how it is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_path: PathBuf,
    pub max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(env::var_os(DATABASE_ENV), dirs::data_dir()),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl Config {
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;

    /// Resolve the configuration, letting an explicit path win over everything else.
    pub fn resolve(database_override: Option<PathBuf>) -> Self {
        let mut config = Self::default();
        if let Some(path) = database_override {
            config.database_path = path;
        }
        config
    }
}

/// `$FINANCAS_DB`, then `<data dir>/financas/financas.db`, then `./financas.db`.
fn default_database_path(from_env: Option<OsString>, data_dir: Option<PathBuf>) -> PathBuf {
    if let Some(path) = from_env.filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    match data_dir {
        Some(dir) => dir.join(APP_DIR_NAME).join(DATABASE_FILE_NAME),
        None => PathBuf::from(DATABASE_FILE_NAME),
    }
}
