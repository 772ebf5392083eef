use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub migrations_path: PathBuf,
    /// ISO currency code used when formatting amounts.
    pub currency: String,
    pub locale: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 7070,
            database_path: PathBuf::from("data/provisio.db"),
            migrations_path: PathBuf::from("migrations"),
            currency: "BRL".into(),
            locale: "pt-BR".into(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Self {
            host: env::var("PROVISIO_HOST").unwrap_or(defaults.host),
            port: env::var("PROVISIO_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_path: env::var("PROVISIO_DATABASE_URL")
                .map(|v| parse_database_url(&v))
                .unwrap_or(defaults.database_path),
            migrations_path: env::var("PROVISIO_MIGRATIONS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.migrations_path),
            currency: env::var("PROVISIO_CURRENCY")
                .ok()
                .filter(|c| !c.trim().is_empty())
                .map(|c| c.trim().to_uppercase())
                .unwrap_or(defaults.currency),
            locale: env::var("PROVISIO_LOCALE")
                .ok()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or(defaults.locale),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_database_url(value: &str) -> PathBuf {
    PathBuf::from(
        value
            .strip_prefix("sqlite://")
            .or_else(|| value.strip_prefix("sqlite:"))
            .unwrap_or(value),
    )
}
