mod cli;

use crate::cli::{CacheBackendArg, GeneratorArg, LogFormatArg, StorageBackendArg, CLI};
use anyhow::{ensure, Context};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tether_cache::{MokaUrlCache, RedisUrlCache};
use tether_gateway::{App, AppState};
use tether_core::UrlCache;
use tether_generator::{GeneratorConfig, RandomGenerator, SeqConfig, SeqGenerator};
use tether_resolver::{CleanupSweeper, ResolutionService, Resolver, ResolverConfig};
use tether_storage::{InMemoryRepository, MySqlRepository, Repository};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(&config.log_level, config.log_format);

    ensure!(
        config.default_expiration.is_positive(),
        "default expiration must be positive, got {}",
        config.default_expiration
    );
    let cleanup_interval = Duration::try_from(config.cleanup_interval)
        .ok()
        .filter(|interval| !interval.is_zero())
        .with_context(|| {
            format!(
                "cleanup interval must be positive, got {}",
                config.cleanup_interval
            )
        })?;

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        storage_backend = %config.storage,
        cache_backend = %config.cache,
        generator = %config.generator,
        default_expiration = %config.default_expiration,
        cleanup_interval = %config.cleanup_interval,
        "starting gateway server"
    );

    let resolver = build_resolver(&config).await?;
    let sweeper = CleanupSweeper::spawn(Arc::clone(&resolver), cleanup_interval);

    let app = App::router(AppState::new(resolver, config.base_url.clone()));
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.shutdown().await;
    info!("gateway stopped");
    Ok(())
}

fn init_tracing(level: &str, format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormatArg::Text => registry.with(fmt::layer()).init(),
        LogFormatArg::Json => registry.with(fmt::layer().json()).init(),
    }
}

async fn build_resolver(config: &CLI) -> anyhow::Result<Arc<dyn Resolver>> {
    match config.storage {
        StorageBackendArg::InMemory => with_cache(config, InMemoryRepository::new()).await,
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let repository = MySqlRepository::connect(mysql_dsn).await?;
            repository.ensure_schema().await?;
            with_cache(config, repository).await
        }
    }
}

async fn with_cache<R: Repository>(
    config: &CLI,
    repository: R,
) -> anyhow::Result<Arc<dyn Resolver>> {
    match config.cache {
        CacheBackendArg::InMemory => with_generator(
            config,
            repository,
            MokaUrlCache::with_capacity(config.cache_capacity),
        ),
        CacheBackendArg::Redis => {
            let redis_url = config
                .redis_url
                .as_deref()
                .context("redis url is required when cache backend is redis")?;
            with_generator(config, repository, RedisUrlCache::connect(redis_url).await?)
        }
    }
}

fn with_generator<R: Repository, C: UrlCache>(
    config: &CLI,
    repository: R,
    cache: C,
) -> anyhow::Result<Arc<dyn Resolver>> {
    let resolver_config = ResolverConfig::builder()
        .default_expiration(config.default_expiration)
        .build();

    let resolver: Arc<dyn Resolver> = match config.generator {
        GeneratorArg::Random => {
            let generator = RandomGenerator::new(
                GeneratorConfig::builder()
                    .code_length(config.code_length)
                    .build(),
            )?;
            Arc::new(ResolutionService::new(
                resolver_config,
                repository,
                cache,
                generator,
            ))
        }
        GeneratorArg::Sequential => {
            let generator = SeqGenerator::new(
                SeqConfig::builder()
                    .prefix(config.seq_prefix.as_str())
                    .start(config.seq_start)
                    .build(),
            )
            .context("invalid sequential generator settings")?;
            Arc::new(ResolutionService::new(
                resolver_config,
                repository,
                cache,
                generator,
            ))
        }
    };
    Ok(resolver)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
