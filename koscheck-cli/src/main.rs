//! koscheck entry point.

use std::sync::Arc;

use chrono::Local;
use koscheck_cli::config::KosConfig;
use koscheck_cli::error::CliError;
use koscheck_cli::{logs, report, telemetry};
use koscheck_core::KosError;
use koscheck_engine::{EntryProcessor, EntryReport, KosWatcher, LogTailer, Resolver, TailEntry};
use koscheck_remote::HttpLookupClient;
use koscheck_storage::ExpiringCache;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let config = KosConfig::load()?;
    telemetry::init_logging(config.log_format)?;

    let log_file = logs::locate_chat_log(&config, Local::now().date_naive())?;

    let cache = ExpiringCache::open(&config.cache.path, config.cache.max_size_mb)
        .map_err(KosError::from)?;
    let cache = Arc::new(cache);
    let remote = HttpLookupClient::new(&config.remote.to_remote_config(), Some(cache.clone()))
        .map_err(KosError::from)?;
    let resolver = Resolver::new(remote, cache.clone()).with_kos_ttl(config.cache.kos_ttl_secs);

    let tailer = if config.start_at_end {
        LogTailer::open_at_end(&log_file)?
    } else {
        LogTailer::open(&log_file)?
    };
    let mut watcher = KosWatcher::new(tailer, EntryProcessor::new(resolver))
        .with_idle_delay(config.poll_interval());

    let mut handler = |entry: &TailEntry, report: &EntryReport| {
        print!("{}", report::render(entry, report));
    };

    tokio::select! {
        result = watcher.run(&mut handler) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
        }
    }

    let stats = cache.stats();
    tracing::info!(
        hits = stats.hits,
        misses = stats.misses,
        stores = stats.stores,
        evictions = stats.evictions,
        hit_rate = stats.hit_rate(),
        "Cache statistics"
    );
    Ok(())
}
