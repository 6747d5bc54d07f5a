use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub llm: LLMConfig,
    pub search: SearchConfig,
    pub worker: WorkerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: u8,
    pub queue_name: String,
    pub result_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: String,
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub serpapi_key: String,
    pub max_results: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    pub concurrency: usize,
    pub hard_time_limit_secs: u64,
    pub soft_time_limit_secs: u64,
    pub poll_interval_secs: u64,
    pub upload_dir: PathBuf,
    pub outputs_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
}

impl RedisConfig {
    /// Connection URL in the `redis://[:password@]host:port/db` form.
    pub fn url(&self) -> String {
        match self.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

impl LLMConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl WorkerConfig {
    pub fn hard_time_limit(&self) -> Duration {
        Duration::from_secs(self.hard_time_limit_secs)
    }

    pub fn soft_time_limit(&self) -> Duration {
        Duration::from_secs(self.soft_time_limit_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            db: 0,
            queue_name: "financial_analysis".to_string(),
            result_ttl_secs: 24 * 60 * 60,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            api_key: String::new(),
            model: "gemini/gemini-2.0-flash".to_string(),
            base_url: None,
            max_tokens: 2048,
            temperature: 0.3,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            serpapi_key: String::new(),
            max_results: 5,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            hard_time_limit_secs: 30 * 60,
            soft_time_limit_secs: 25 * 60,
            poll_interval_secs: 5,
            upload_dir: PathBuf::from("data"),
            outputs_dir: PathBuf::from("outputs"),
        }
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// First non-empty variable among `names`.
fn first_var(names: &[&str], default: &str) -> String {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_var<T>(name: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var_or(name, default)
        .trim()
        .parse()
        .with_context(|| format!("{} has an invalid value", name))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: parse_var("PORT", "8000")?,
                host: var_or("HOST", "0.0.0.0"),
                cors_allowed_origins: var_or("ALLOWED_ORIGINS", "*")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", "52428800")?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_default(),
                max_connections: parse_var("DB_MAX_CONNECTIONS", "10")?,
                min_connections: parse_var("DB_MIN_CONNECTIONS", "1")?,
            },
            redis: RedisConfig {
                host: var_or("REDIS_HOST", "localhost"),
                port: parse_var("REDIS_PORT", "6379")?,
                password: env::var("REDIS_PASSWORD").ok().filter(|p| !p.is_empty()),
                db: parse_var("REDIS_DB", "0")?,
                queue_name: var_or("QUEUE_NAME", "financial_analysis"),
                result_ttl_secs: parse_var("RESULT_TTL_SECS", "86400")?,
            },
            llm: LLMConfig {
                provider: var_or("LLM_PROVIDER", "gemini").to_lowercase(),
                api_key: env::var("GEMINI_API_KEY")
                    .or_else(|_| env::var("LLM_API_KEY"))
                    .unwrap_or_default(),
                model: first_var(&["LLM_MODEL", "GEMINI_MODEL"], "gemini/gemini-2.0-flash"),
                base_url: env::var("LLM_BASE_URL").ok().filter(|u| !u.is_empty()),
                max_tokens: parse_var("LLM_MAX_TOKENS", "2048")?,
                temperature: parse_var("LLM_TEMPERATURE", "0.3")?,
            },
            search: SearchConfig {
                serpapi_key: env::var("SERPAPI_API_KEY").unwrap_or_default(),
                max_results: parse_var("SEARCH_MAX_RESULTS", "5")?,
            },
            worker: WorkerConfig {
                concurrency: parse_var("WORKER_CONCURRENCY", "1")?,
                hard_time_limit_secs: parse_var("TASK_TIME_LIMIT_SECS", "1800")?,
                soft_time_limit_secs: parse_var("TASK_SOFT_TIME_LIMIT_SECS", "1500")?,
                poll_interval_secs: parse_var("WORKER_POLL_SECS", "5")?,
                upload_dir: PathBuf::from(var_or("UPLOAD_DIR", "data")),
                outputs_dir: PathBuf::from(var_or("OUTPUTS_DIR", "outputs")),
            },
            logging: LoggingConfig {
                dir: env::var("LOG_DIR").ok().filter(|d| !d.is_empty()).map(PathBuf::from),
            },
        })
    }

    /// Configuration for local runs that never touch Postgres or Redis.
    pub fn local(upload_dir: PathBuf, outputs_dir: PathBuf) -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 1,
                min_connections: 0,
            },
            redis: RedisConfig::default(),
            llm: LLMConfig::default(),
            search: SearchConfig::default(),
            worker: WorkerConfig {
                upload_dir,
                outputs_dir,
                ..WorkerConfig::default()
            },
            logging: LoggingConfig::default(),
        }
    }
}
