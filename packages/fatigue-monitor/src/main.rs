use std::process::ExitCode;

use fatigue_monitor::config::Config;
use fatigue_monitor::logging;
use fatigue_monitor::notifier::AlarmNotifier;
use fatigue_monitor::runner::run_session_until;
use fatigue_monitor::source::open_input;
use fatigue_monitor::state::SnapshotStore;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config);

    let input = match open_input(&config.input).await {
        Ok(input) => input,
        Err(e) => {
            tracing::error!(error = %e, input = ?config.input, "failed to open landmark input");
            return ExitCode::FAILURE;
        }
    };

    let store = SnapshotStore::new();
    let notifier = AlarmNotifier::spawn(config.webhook_url.clone(), config.notify_queue);

    let result = run_session_until(&config, input, &store, &notifier, shutdown_signal()).await;

    let delivered = notifier.shutdown().await;
    tracing::info!(delivered, "alarm worker drained");

    match result {
        Ok(_) => {
            let last = store.load();
            tracing::info!(
                runtime = %last.runtime,
                level = %last.detection.fatigue_level,
                score = last.detection.fatigue_score,
                "shutdown complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "session aborted");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
}
