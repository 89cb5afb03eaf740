//! pagesmith-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Create the scratch directory.
//! 4. Wire Ghostscript into the document service.
//! 5. Build the Axum router and start the HTTP server with graceful shutdown.

mod config;
mod error;
mod middleware;
mod routes;
mod schemas;
mod state;

use std::sync::Arc;

use pagesmith_core::{Ghostscript, PdfService, ScratchDir};
use tracing::{info, warn};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    // Build the log-level filter, warning loudly if the configured value is
    // not a valid tracing filter expression.
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: PAGESMITH_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "pagesmith-server starting");

    // ── 3. Scratch directory ───────────────────────────────────────────────────
    let scratch = ScratchDir::create(&cfg.scratch_dir).map_err(|e| {
        anyhow::anyhow!(
            "failed to create scratch directory {}: {e}",
            cfg.scratch_dir.display()
        )
    })?;
    info!(scratch_dir = %scratch.path().display(), "scratch directory ready");

    // ── 4. Document service ────────────────────────────────────────────────────
    let gs = Ghostscript::new(cfg.ghostscript());
    probe_ghostscript(&gs).await;

    let state = Arc::new(AppState {
        config: Arc::new(cfg.clone()),
        pdf: Arc::new(PdfService::new(scratch, Arc::new(gs))),
    });

    // ── 5. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(cfg.bind_address()).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("pagesmith-server stopped");
    Ok(())
}

/// Log whether the configured Ghostscript binary can be started.
///
/// A missing binary is not fatal: the health endpoint keeps answering and
/// document requests fail individually.
async fn probe_ghostscript(gs: &Ghostscript) {
    let binary = &gs.options().binary;
    match tokio::process::Command::new(binary)
        .arg("--version")
        .output()
        .await
    {
        Ok(out) if out.status.success() => info!(
            binary = %binary.display(),
            version = %String::from_utf8_lossy(&out.stdout).trim(),
            "ghostscript available"
        ),
        Ok(out) => warn!(
            binary = %binary.display(),
            status = %out.status,
            "ghostscript --version failed; document requests will fail"
        ),
        Err(e) => warn!(
            binary = %binary.display(),
            error = %e,
            "ghostscript not found; document requests will fail"
        ),
    }
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c   => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
