//! Console command reader.
//!
//! Reads commands from stdin one line at a time and forwards them to the main
//! application over an async channel. End of input requests shutdown.

use crate::{AppCommand, AppError, AppResult, app_command::USAGE};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::{mpsc, watch},
};
use tracing::{debug, info, instrument, warn};

/// Line-oriented console front end.
pub struct ConsoleHandler {
    command_tx: mpsc::Sender<AppCommand>,
}

impl ConsoleHandler {
    /// Create a handler that sends parsed commands on `command_tx`.
    pub fn new(command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self { command_tx }
    }

    /// Read stdin until shutdown or end of input.
    pub async fn run(&self, shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        self.run_with(BufReader::new(tokio::io::stdin()), shutdown_rx)
            .await
    }

    /// Read commands from `input` until shutdown or end of input.
    #[instrument(skip(self, input, shutdown_rx))]
    pub async fn run_with<R>(
        &self,
        input: R,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Console handler shutting down");
                    break;
                }
                line = lines.next_line() => {
                    match line? {
                        Some(line) => self.handle_line(&line).await?,
                        None => {
                            debug!("Console input closed");
                            self.send(AppCommand::Shutdown).await?;
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    async fn handle_line(&self, line: &str) -> AppResult<()> {
        if line.trim().is_empty() {
            return Ok(());
        }

        match line.parse::<AppCommand>() {
            Ok(cmd) => self.send(cmd).await,
            Err(e) => {
                warn!(error = %e, "Ignoring console input");
                println!("{}", USAGE);
                Ok(())
            }
        }
    }

    async fn send(&self, cmd: AppCommand) -> AppResult<()> {
        match self.command_tx.send(cmd).await {
            Ok(()) => Ok(()),
            Err(e) => Err(AppError::ChannelSendFailed {
                message: format!("Failed to send console command: {}", e),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
