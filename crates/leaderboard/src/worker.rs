//! Background worker and the host-facing handle.
//!
//! The worker task is the only owner of the protocol client: nothing else
//! ever touches the socket, the roster, or the aggregate. Hosts talk to it
//! through [`LeaderboardClient`], whose commands each carry their own
//! one-shot reply slot — every request is answered exactly once, at most one
//! snapshot is in flight per request, and shutdown cannot deadlock on a
//! backed-up data channel.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::client::ProtocolClient;
use crate::config::BroadcastConfig;
use crate::snapshot::LeaderboardSnapshot;

enum WorkerCommand {
    Snapshot {
        reply: oneshot::Sender<Arc<LeaderboardSnapshot>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to the background worker.
///
/// Dropping the handle without calling [`Self::stop`] also shuts the worker
/// down (the command channel closes), but only `stop` waits for the
/// disconnect command to go out and the task to finish.
pub struct LeaderboardClient {
    commands: mpsc::Sender<WorkerCommand>,
    worker: JoinHandle<()>,
}

impl LeaderboardClient {
    /// Bind the socket and launch the receive/dispatch loop on a background
    /// task. Registration with the game happens on the worker's first
    /// iteration and is retried there on failure.
    ///
    /// # Errors
    /// Fails when the UDP socket cannot be bound or connected.
    pub async fn start(config: BroadcastConfig) -> Result<Self> {
        let client = ProtocolClient::connect(config).await?;
        let (commands, command_rx) = mpsc::channel(8);
        let worker = tokio::spawn(run_worker(client, command_rx));
        Ok(Self { commands, worker })
    }

    /// Latest leaderboard snapshot, via the request/reply handshake.
    ///
    /// The worker answers on its next loop iteration, so the wait is capped
    /// by the bounded socket receive. Returns `None` once the worker has
    /// stopped.
    pub async fn snapshot(&self) -> Option<Arc<LeaderboardSnapshot>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(WorkerCommand::Snapshot { reply: reply_tx })
            .await
            .ok()?;
        reply_rx.await.ok()
    }

    /// Shut the worker down: it exits its loop, sends the protocol
    /// disconnect command, releases the socket, and acknowledges
    /// termination before this returns.
    ///
    /// # Errors
    /// Fails when the worker is already gone or its task panicked.
    pub async fn stop(self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(WorkerCommand::Stop { reply: reply_tx })
            .await
            .map_err(|_| anyhow!("worker already stopped"))?;
        reply_rx
            .await
            .context("worker dropped the termination acknowledgement")?;
        self.worker.await.context("worker task failed")?;
        Ok(())
    }
}

async fn run_worker(mut client: ProtocolClient, mut commands: mpsc::Receiver<WorkerCommand>) {
    info!("leaderboard worker started");
    let mut stop_ack = None;

    'run: loop {
        // Drain pending commands between protocol iterations.
        loop {
            match commands.try_recv() {
                Ok(WorkerCommand::Snapshot { reply }) => {
                    if reply.send(client.snapshot()).is_err() {
                        debug!("snapshot requester went away before the reply");
                    }
                }
                Ok(WorkerCommand::Stop { reply }) => {
                    stop_ack = Some(reply);
                    break 'run;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'run,
            }
        }

        client.run_once().await;
    }

    client.disconnect().await;
    // Release the socket before acknowledging so a stopped worker never
    // holds the port.
    drop(client);

    if let Some(ack) = stop_ack {
        if ack.send(()).is_err() {
            debug!("stop requester went away before the acknowledgement");
        }
    }
    info!("leaderboard worker terminated");
}
