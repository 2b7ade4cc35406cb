use clap::{Parser, ValueEnum};
use jiff::SignedDuration;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "TETHER_LISTEN_ADDR";
pub const BASE_URL_ENV: &str = "TETHER_BASE_URL";
pub const GENERATOR_ENV: &str = "TETHER_GENERATOR";
pub const CODE_LENGTH_ENV: &str = "TETHER_CODE_LENGTH";
pub const SEQ_PREFIX_ENV: &str = "TETHER_SEQ_PREFIX";
pub const SEQ_START_ENV: &str = "TETHER_SEQ_START";
pub const DEFAULT_EXPIRATION_ENV: &str = "TETHER_DEFAULT_EXPIRATION";
pub const CLEANUP_INTERVAL_ENV: &str = "TETHER_CLEANUP_INTERVAL";
pub const STORAGE_BACKEND_ENV: &str = "TETHER_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "TETHER_MYSQL_DSN";
pub const CACHE_BACKEND_ENV: &str = "TETHER_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "TETHER_REDIS_URL";
pub const CACHE_CAPACITY_ENV: &str = "TETHER_CACHE_CAPACITY";
pub const LOG_LEVEL_ENV: &str = "TETHER_LOG_LEVEL";
pub const LOG_FORMAT_ENV: &str = "TETHER_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_CODE_LENGTH: &str = "6";
pub const DEFAULT_SEQ_PREFIX: &str = "dev";
pub const DEFAULT_EXPIRATION: &str = "24h";
pub const DEFAULT_CLEANUP_INTERVAL: &str = "1h";
pub const DEFAULT_CACHE_CAPACITY: &str = "10000";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "redis")]
    Redis,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::InMemory => write!(f, "in-memory"),
            CacheBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GeneratorArg {
    Random,
    Sequential,
}

impl Display for GeneratorArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorArg::Random => write!(f, "random"),
            GeneratorArg::Sequential => write!(f, "sequential"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "tether-gateway", version, about = "Time-limited short links over HTTP")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Public origin prepended to codes in returned short URLs.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = GENERATOR_ENV, value_enum, default_value_t = GeneratorArg::Random)]
    pub generator: GeneratorArg,

    /// Length of random codes.
    #[arg(long, env = CODE_LENGTH_ENV, default_value = DEFAULT_CODE_LENGTH)]
    pub code_length: usize,

    /// Prefix of sequential codes.
    #[arg(long, env = SEQ_PREFIX_ENV, default_value = DEFAULT_SEQ_PREFIX)]
    pub seq_prefix: String,

    /// First counter value of sequential codes. Set it past the codes a
    /// durable store already holds.
    #[arg(long, env = SEQ_START_ENV, default_value = "0")]
    pub seq_start: u64,

    /// Lifetime of links created without a duration, e.g. "24h" or "90m".
    #[arg(long, env = DEFAULT_EXPIRATION_ENV, default_value = DEFAULT_EXPIRATION)]
    pub default_expiration: SignedDuration,

    #[arg(long, env = CLEANUP_INTERVAL_ENV, default_value = DEFAULT_CLEANUP_INTERVAL)]
    pub cleanup_interval: SignedDuration,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::InMemory
    )]
    pub cache: CacheBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("cache", "redis"))]
    pub redis_url: Option<String>,

    /// Maximum entries held by the in-memory cache.
    #[arg(long, env = CACHE_CAPACITY_ENV, default_value = DEFAULT_CACHE_CAPACITY)]
    pub cache_capacity: u64,

    /// Default filter when RUST_LOG is unset.
    #[arg(long, env = LOG_LEVEL_ENV, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,
}
