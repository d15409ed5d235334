use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use fetchflow::config::Config;
use fetchflow::error::AnyError;
use fetchflow::fetch::{FetchResponse, HttpFetcher, UriFetcher};
use fetchflow::{AsyncDispatcher, BulkFetcher};

const TERMINATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Bulk fetch every URL; returns whether all of them succeeded
pub async fn fetch(config: &Config, urls: Vec<Url>) -> Result<bool, AnyError> {
    let fetcher: Arc<dyn UriFetcher> = Arc::new(HttpFetcher::new(config.http.clone())?);
    let bulk = BulkFetcher::new(fetcher, &config.bulk);

    let result = bulk.get(urls).await?;
    for response in result.details().values() {
        println!("{}", describe(response));
    }

    let failed = result.failed().len();
    println!(
        "{} fetched, {} succeeded, {} failed",
        result.len(),
        result.successful().len(),
        failed
    );

    Ok(failed == 0)
}

/// Dispatch every URL asynchronously, printing responses as callbacks fire
pub async fn dispatch(config: &Config, urls: Vec<Url>) -> Result<(), AnyError> {
    let fetcher: Arc<dyn UriFetcher> = Arc::new(HttpFetcher::new(config.http.clone())?);
    let dispatcher = AsyncDispatcher::start(fetcher, &config.dispatcher);

    for url in urls {
        dispatcher.get(url, |response| {
            println!("{}", describe(&response));
            Ok(())
        })?;
    }

    tokio::select! {
        _ = dispatcher.await_idleness() => {
            dispatcher.shutdown();
        }
        _ = shutdown_signal() => {
            let abandoned = dispatcher.shutdown_now().await;
            warn!(abandoned, "Interrupted, abandoning queued jobs");
        }
    }

    if !dispatcher.await_termination(TERMINATION_TIMEOUT).await {
        warn!("Workers did not stop in time");
    }

    let metrics = dispatcher.metrics();
    info!(
        submitted = metrics.jobs_submitted,
        completed = metrics.jobs_completed,
        callback_failures = metrics.callback_failures,
        "Dispatch finished"
    );

    Ok(())
}

fn describe(response: &FetchResponse) -> String {
    match (response.status(), response.failure_cause()) {
        (_, Some(cause)) => format!("FAIL {} {}", response.uri(), cause),
        (Some(status), None) => format!(
            "OK   {} {} ({} bytes)",
            response.uri(),
            status,
            response.content().map_or(0, |c| c.len())
        ),
        (None, None) => format!("OK   {}", response.uri()),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
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
    info!("Shutdown signal received");
}
