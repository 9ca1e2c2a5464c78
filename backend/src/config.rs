use anyhow::Context;

const DEFAULT_DATABASE_URL: &str = "sqlite:database.sqlite";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub port: u16,
    pub log_level: tracing::Level,
}

impl Config {
    /// Read `DATABASE_URL`, `BIND_ADDR`, `PORT` and `LOG_LEVEL`, loading `.env` first.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let port = match lookup("PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("PORT {port:?} is not a valid port number"))?,
            None => DEFAULT_PORT,
        };

        let log_level = match lookup("LOG_LEVEL") {
            Some(level) => level
                .parse()
                .with_context(|| format!("LOG_LEVEL {level:?} is not a valid level"))?,
            None => tracing::Level::INFO,
        };

        Ok(Self {
            database_url,
            bind_addr,
            port,
            log_level,
        })
    }

    /// Install the global tracing subscriber.
    pub fn setup_logging(&self) -> anyhow::Result<()> {
        let subscriber = tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(self.log_level)
            .with_ansi(true)
            .with_file(false)
            .pretty()
            .finish();
        tracing::subscriber::set_global_default(subscriber).context("fail to setup logging")
    }
}

#[test]
fn test_defaults() {
    let config = Config::from_lookup(|_| None).unwrap();
    assert_eq!(config.database_url, "sqlite:database.sqlite");
    assert_eq!(config.bind_addr, "127.0.0.1");
    assert_eq!(config.port, 3000);
    assert_eq!(config.log_level, tracing::Level::INFO);
}

#[test]
fn test_overrides() {
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("sqlite:/tmp/food.sqlite".to_string()),
        "PORT" => Some("8080".to_string()),
        "LOG_LEVEL" => Some("debug".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.database_url, "sqlite:/tmp/food.sqlite");
    assert_eq!(config.port, 8080);
    assert_eq!(config.log_level, tracing::Level::DEBUG);
}

#[test]
fn test_invalid_values() {
    let err = Config::from_lookup(|key| (key == "PORT").then(|| "http".to_string()))
        .unwrap_err();
    assert!(err.to_string().contains("PORT"));

    let err = Config::from_lookup(|key| (key == "LOG_LEVEL").then(|| "loud".to_string()))
        .unwrap_err();
    assert!(err.to_string().contains("LOG_LEVEL"));
}
