mod config;

use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use orderbell_api::events::{EventOutcome, handle_event, parse_event};
use orderbell_api::{AppState, router};
use orderbell_push::{FcmGateway, LoggingGateway, Notifier, PushGateway, ServiceAccount};
use orderbell_scheduler::{POLL_INTERVAL, Scheduler, TickPipeline};
use orderbell_upstream::{UpstreamClient, UpstreamConfig};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "orderbell=debug,orderbell_scheduler=debug,orderbell_api=debug,\
                 orderbell_upstream=info,orderbell_push=info,push=info,tower_http=debug"
                    .into()
            }),
        )
        .init();

    let config = Config::from_env()?;
    let scheduler = Scheduler::new(build_pipeline(&config)?);
    info!(interval = ?POLL_INTERVAL, "scheduler ready");

    match &config.event_path {
        Some(path) => run_event(&scheduler, path).await?,
        None => serve(&config, scheduler.clone()).await?,
    }

    scheduler.shutdown().await;
    info!("stopped");
    Ok(())
}

fn build_pipeline(config: &Config) -> anyhow::Result<TickPipeline> {
    let upstream = Arc::new(UpstreamClient::new(UpstreamConfig {
        base_url: config.api_base_url.clone(),
        security_key: config.security_key.clone(),
        portal_origin: config.portal_origin.clone(),
    }));

    let gateway: Arc<dyn PushGateway> = match &config.firebase_credentials {
        Some(raw) => {
            let account = ServiceAccount::from_json(raw).context("FIREBASE_CREDENTIALS")?;
            let fcm = FcmGateway::new(account, config.firebase_project_id.clone())
                .context("FIREBASE_CREDENTIALS")?;
            info!(project = fcm.project_id(), "push via FCM");
            Arc::new(fcm)
        }
        None => {
            warn!("FIREBASE_CREDENTIALS unset; notifications will only be logged");
            Arc::new(LoggingGateway)
        }
    };

    Ok(TickPipeline::new(upstream.clone(), upstream, Notifier::new(gateway)))
}

async fn serve(config: &Config, scheduler: Scheduler) -> anyhow::Result<()> {
    let app = router(AppState { scheduler })
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("orderbell listening on {}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// One trigger event per launch. A registration keeps polling until the
/// process is signalled.
async fn run_event(scheduler: &Scheduler, path: &std::path::Path) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading event {}", path.display()))?;
    let event = parse_event(&raw)?;

    match handle_event(scheduler, event).await? {
        EventOutcome::Registered => {
            info!("registration active, polling until shutdown");
            shutdown_signal().await;
        }
        EventOutcome::Unregistered { existed } => {
            info!(existed, "unregistration processed");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
