use std::process::Stdio;

use chess::{Position, ResultSet};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

use crate::actor::{run_engine_actor, EngineActor};
use crate::commands::{EngineCommand, Search};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::transport::{spawn_reader, spawn_writer};
use crate::uci::{parse_uci_message, UciCommand, UciMessage};

const COMMAND_BUFFER: usize = 32;
const PROGRESS_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Idle,
    Searching,
    Stopping,
    Closed,
}

/// Cheap, cloneable handle to one engine subprocess.
///
/// Every handle talks to the same actor. The process is shut down by
/// [`EngineSession::destroy`] or when the last handle is dropped.
#[derive(Clone)]
pub struct EngineSession {
    id: Uuid,
    name: Option<String>,
    cmd_tx: mpsc::Sender<EngineCommand>,
    status: watch::Receiver<EngineStatus>,
}

/// An analysis in flight.
///
/// Progress snapshots arrive on a bounded channel; a slow reader may miss
/// some, but [`PendingAnalysis::finish`] always yields the final set.
pub struct PendingAnalysis {
    progress: ReceiverStream<ResultSet>,
    result: oneshot::Receiver<Result<ResultSet, EngineError>>,
}

impl PendingAnalysis {
    /// Next progress snapshot, or `None` once the request has resolved.
    pub async fn next_progress(&mut self) -> Option<ResultSet> {
        self.progress.next().await
    }

    pub fn progress(&mut self) -> &mut ReceiverStream<ResultSet> {
        &mut self.progress
    }

    pub async fn finish(self) -> Result<ResultSet, EngineError> {
        self.result
            .await
            .map_err(|_| EngineError::unavailable("engine session ended"))?
    }
}

impl EngineSession {
    /// Locate, launch and handshake an engine binary.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn start(config: EngineConfig) -> Result<Self, EngineError> {
        let path = config
            .resolve_path()
            .ok_or_else(|| EngineError::unavailable("no engine binary found"))?;
        tracing::info!("Starting engine at {:?}", path);

        let mut child = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn engine: {}", e);
                EngineError::unavailable(format!("failed to spawn {}: {}", path.display(), e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::unavailable("engine has no stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::unavailable("engine has no stdout"))?;

        Self::connect(stdout, stdin, Some(child), config).await
    }

    /// Handshake over an arbitrary byte stream pair instead of a subprocess.
    pub async fn with_transport<R, W>(
        reader: R,
        writer: W,
        config: EngineConfig,
    ) -> Result<Self, EngineError>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self::connect(reader, writer, None, config).await
    }

    async fn connect<R, W>(
        reader: R,
        writer: W,
        child: Option<Child>,
        config: EngineConfig,
    ) -> Result<Self, EngineError>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut lines = spawn_reader(reader);
        let writer = spawn_writer(writer);

        let name = tokio::time::timeout(
            config.handshake_timeout,
            handshake(&mut lines, &writer, &config),
        )
        .await
        .map_err(|_| {
            tracing::error!("Timeout waiting for engine handshake");
            EngineError::unavailable("engine did not complete the handshake in time")
        })??;

        let id = Uuid::new_v4();
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (status_tx, status_rx) = watch::channel(EngineStatus::Idle);
        let actor = EngineActor::new(
            cmd_rx,
            lines,
            writer,
            child,
            status_tx,
            config.stop_timeout,
        );
        tokio::spawn(run_engine_actor(actor, id));

        tracing::info!(%id, engine = ?name, "Engine session ready");
        Ok(Self {
            id,
            name,
            cmd_tx,
            status: status_rx,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name the engine reported in `id name`, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn status(&self) -> EngineStatus {
        *self.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<EngineStatus> {
        self.status.clone()
    }

    /// Start analysing `position` to `max_depth`, superseding any search in
    /// flight. The superseded request resolves with what it had gathered.
    #[tracing::instrument(level = "debug", skip(self, position), fields(session = %self.id))]
    pub async fn start_analysis(
        &self,
        position: &Position,
        max_depth: u32,
    ) -> Result<PendingAnalysis, EngineError> {
        let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_BUFFER);
        let (reply_tx, reply_rx) = oneshot::channel();
        let search = Search::new(position, max_depth, progress_tx, reply_tx);
        self.send(EngineCommand::Analyze { search }).await?;
        Ok(PendingAnalysis {
            progress: ReceiverStream::new(progress_rx),
            result: reply_rx,
        })
    }

    /// Analyse and wait for the engine's `bestmove`.
    pub async fn analyze(
        &self,
        position: &Position,
        max_depth: u32,
    ) -> Result<ResultSet, EngineError> {
        self.start_analysis(position, max_depth).await?.finish().await
    }

    /// Ask the engine to stop. The pending request resolves with what it has
    /// once `bestmove` arrives. No-op when idle or already closed.
    pub async fn stop(&self) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        if self.send(EngineCommand::Stop { reply: tx }).await.is_err() {
            return Ok(());
        }
        let _ = rx.await;
        Ok(())
    }

    /// Quit and kill the process. Safe to call more than once.
    pub async fn destroy(&self) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        if self.send(EngineCommand::Destroy { reply: tx }).await.is_err() {
            return Ok(());
        }
        let _ = rx.await;
        Ok(())
    }

    async fn send(&self, cmd: EngineCommand) -> Result<(), EngineError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| EngineError::unavailable("engine session closed"))
    }
}

/// `uci` → `uciok`, options, `isready` → `readyok`. Returns the engine name.
async fn handshake(
    lines: &mut mpsc::Receiver<String>,
    writer: &mpsc::Sender<UciCommand>,
    config: &EngineConfig,
) -> Result<Option<String>, EngineError> {
    let mut name = None;

    send_command(writer, UciCommand::Uci).await?;
    expect(lines, UciMessage::UciOk, &mut name).await?;

    send_command(writer, UciCommand::set_option("MultiPV", config.multipv)).await?;
    if let Some(threads) = config.threads {
        let threads = threads.clamp(1, 16);
        tracing::info!("Setting Threads to {}", threads);
        send_command(writer, UciCommand::set_option("Threads", threads)).await?;
    }
    if let Some(hash_mb) = config.hash_mb {
        let hash_mb = hash_mb.clamp(1, 2048);
        tracing::info!("Setting Hash to {} MB", hash_mb);
        send_command(writer, UciCommand::set_option("Hash", hash_mb)).await?;
    }

    send_command(writer, UciCommand::IsReady).await?;
    expect(lines, UciMessage::ReadyOk, &mut name).await?;

    Ok(name)
}

async fn send_command(
    writer: &mpsc::Sender<UciCommand>,
    cmd: UciCommand,
) -> Result<(), EngineError> {
    writer
        .send(cmd)
        .await
        .map_err(|_| EngineError::unavailable("engine stdin closed"))
}

async fn expect(
    lines: &mut mpsc::Receiver<String>,
    wanted: UciMessage,
    name: &mut Option<String>,
) -> Result<(), EngineError> {
    while let Some(line) = lines.recv().await {
        match parse_uci_message(&line) {
            Ok(msg) if msg == wanted => {
                tracing::debug!("Received {:?}", wanted);
                return Ok(());
            }
            Ok(UciMessage::Id { name: key, value }) if key == "name" => *name = Some(value),
            _ => {}
        }
    }
    Err(EngineError::unavailable(format!(
        "engine closed before {:?}",
        wanted
    )))
}
