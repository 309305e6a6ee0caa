//! Finish-Recorder: finish-line video recorder control from the console.

mod app;
mod app_command;
mod config;
mod console_handler;
mod error;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    console_handler::ConsoleHandler,
    error::{AppError, Result as AppResult},
};

use crate::config::Config;

use finish_recorder_core::{
    AppState, RecorderClient,
    recorder::{NullRecorder, RecorderBus, push_channel, register_recorder},
    visca::ViscaController,
};

use std::{sync::Arc, time::Duration};

use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "finish_recorder=debug,finish_recorder_core=debug";
const LOG_FILE_PREFIX: &str = "finish-recorder.log";

/// Application entry point.
fn main() {
    // Held for the process lifetime; dropping it flushes the log file.
    let _log_guard = init_logging();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    let config = rt.block_on(run(config));

    if let Err(e) = config.save() {
        error!(error = ?e, "Failed to save settings");
    }

    // Stdin reads block a runtime thread until the next line; don't wait for it.
    rt.shutdown_timeout(Duration::from_secs(1));
}

async fn run(config: Config) -> Config {
    let bus = Arc::new(RecorderBus::new());
    let (push_tx, push_rx) = push_channel();
    register_recorder(&bus, Arc::new(NullRecorder::new(push_tx))).await;
    info!("Null recorder attached");

    let state = Arc::new(AppState::new(&config.settings, config.visca.target()));
    let client = Arc::new(
        RecorderClient::new(bus, state).with_visca_reply_timeout(config.visca.reply_timeout()),
    );
    let push_listener = client.spawn_push_listener(push_rx);

    let (command_tx, command_rx) = mpsc::channel(32);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let console = ConsoleHandler::new(command_tx);
    let app = App {
        client: Arc::clone(&client),
        visca: ViscaController::new(Arc::clone(&client)),
        config: config.clone(),
        command_rx,
        shutdown_tx,
    };

    let (_, final_config) = tokio::join!(
        async {
            if let Err(e) = console.run(shutdown_rx).await {
                error!(error = ?e, "Console handler error");
            }
        },
        async {
            match app.run().await {
                Ok(c) => c,
                Err(e) => {
                    error!(error = ?e, "App error");
                    config
                }
            }
        }
    );

    push_listener.abort();
    final_config
}

fn init_logging() -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    match Config::log_dir() {
        Ok(log_dir) => {
            let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();

            info!(log_dir = ?log_dir, "Logging to file");
            Some(guard)
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .init();

            warn!(error = ?e, "File logging unavailable");
            None
        }
    }
}
