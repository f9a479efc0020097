use std::ops::ControlFlow;
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::commands::{EngineCommand, Search};
use crate::error::EngineError;
use crate::session::EngineStatus;
use crate::uci::{parse_uci_message, UciCommand, UciError, UciMessage};

/// Grace period between `quit` and killing the process.
const QUIT_GRACE: Duration = Duration::from_secs(1);

/// What the engine process is doing on our behalf.
enum SearchState {
    Idle,
    /// Searching for `Search`.
    Running(Search),
    /// `stop` sent; `Search` resolves on the next `bestmove`.
    Stopping(Search),
    /// `stop` sent for a superseded search whose owner was already answered.
    /// Output is discarded up to its `bestmove`, then `queued` starts.
    Draining { queued: Option<Search> },
}

pub(crate) struct EngineActor {
    commands: mpsc::Receiver<EngineCommand>,
    lines: mpsc::Receiver<String>,
    writer: mpsc::Sender<UciCommand>,
    child: Option<Child>,
    status: watch::Sender<EngineStatus>,
    stop_timeout: Duration,
    state: SearchState,
    deadline: Option<Instant>,
    /// Set once a write to the engine fails. The loop then tears down.
    broken: bool,
}

impl EngineActor {
    pub fn new(
        commands: mpsc::Receiver<EngineCommand>,
        lines: mpsc::Receiver<String>,
        writer: mpsc::Sender<UciCommand>,
        child: Option<Child>,
        status: watch::Sender<EngineStatus>,
        stop_timeout: Duration,
    ) -> Self {
        Self {
            commands,
            lines,
            writer,
            child,
            status,
            stop_timeout,
            state: SearchState::Idle,
            deadline: None,
            broken: false,
        }
    }
}

/// The engine actor loop.
/// Owns the process and all search state. Processes commands, engine output
/// and the stop deadline sequentially.
pub(crate) async fn run_engine_actor(actor: EngineActor, session_id: Uuid) {
    run_engine_actor_inner(actor)
        .instrument(tracing::info_span!("engine", id = %session_id))
        .await;
}

async fn run_engine_actor_inner(mut actor: EngineActor) {
    tracing::info!("Engine actor started");

    loop {
        let deadline = actor.deadline;

        tokio::select! {
            biased;

            cmd = actor.commands.recv() => {
                match cmd {
                    Some(cmd) => {
                        if actor.handle_command(cmd).await.is_break() {
                            break;
                        }
                    }
                    None => {
                        tracing::info!("All engine handles dropped");
                        actor.release_pending();
                        actor.shutdown().await;
                        break;
                    }
                }
            }

            line = actor.lines.recv() => {
                match line {
                    Some(line) => actor.handle_line(&line).await,
                    None => {
                        tracing::error!("Engine output closed");
                        actor.fail_pending(EngineError::unavailable("engine process exited"));
                        actor.shutdown().await;
                        break;
                    }
                }
            }

            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                tracing::warn!("Engine did not answer stop within {:?}", actor.stop_timeout);
                actor.expire_stop();
                actor.shutdown().await;
                break;
            }
        }

        if actor.broken {
            actor.fail_pending(EngineError::unavailable("engine input closed"));
            actor.shutdown().await;
            break;
        }
    }

    tracing::info!("Engine actor exited");
}

impl EngineActor {
    async fn handle_command(&mut self, cmd: EngineCommand) -> ControlFlow<()> {
        match cmd {
            EngineCommand::Analyze { search } => self.analyze(search).await,
            EngineCommand::Stop { reply } => {
                self.stop().await;
                let _ = reply.send(());
            }
            EngineCommand::Destroy { reply } => {
                tracing::info!("Engine destroy requested");
                self.release_pending();
                self.shutdown().await;
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    async fn analyze(&mut self, search: Search) {
        tracing::debug!(fen = %search.fen, depth = search.depth, "Analysis requested");

        match std::mem::replace(&mut self.state, SearchState::Idle) {
            SearchState::Idle => self.begin(search).await,
            SearchState::Running(old) => {
                tracing::debug!("Superseding running search");
                old.finish();
                self.send_stop().await;
                self.state = SearchState::Draining {
                    queued: Some(search),
                };
            }
            SearchState::Stopping(old) => {
                old.finish();
                self.state = SearchState::Draining {
                    queued: Some(search),
                };
            }
            SearchState::Draining { queued } => {
                if let Some(stale) = queued {
                    stale.finish();
                }
                self.state = SearchState::Draining {
                    queued: Some(search),
                };
            }
        }
    }

    async fn stop(&mut self) {
        match std::mem::replace(&mut self.state, SearchState::Idle) {
            SearchState::Running(search) => {
                tracing::info!("Stopping search");
                self.send_stop().await;
                self.state = SearchState::Stopping(search);
            }
            SearchState::Draining { queued } => {
                if let Some(stale) = queued {
                    stale.finish();
                }
                self.state = SearchState::Draining { queued: None };
            }
            other => self.state = other,
        }
    }

    async fn begin(&mut self, search: Search) {
        tracing::info!(depth = search.depth, "Starting search");
        let position = UciCommand::Position {
            fen: search.fen.clone(),
        };
        if !self.write(position).await || !self.write(UciCommand::GoDepth(search.depth)).await {
            search.fail(EngineError::unavailable("engine input closed"));
            return;
        }
        self.status.send_replace(EngineStatus::Searching);
        self.state = SearchState::Running(search);
    }

    /// Queue a command for the writer task. On failure the actor is marked
    /// broken and `false` is returned.
    async fn write(&mut self, cmd: UciCommand) -> bool {
        if self.writer.send(cmd).await.is_err() {
            tracing::error!("Engine writer closed");
            self.broken = true;
            return false;
        }
        true
    }

    async fn send_stop(&mut self) {
        self.write(UciCommand::Stop).await;
        if self.deadline.is_none() {
            self.deadline = Some(Instant::now() + self.stop_timeout);
        }
        self.status.send_replace(EngineStatus::Stopping);
    }

    async fn handle_line(&mut self, line: &str) {
        match parse_uci_message(line) {
            Ok(UciMessage::Info(info)) => match &mut self.state {
                SearchState::Running(search) | SearchState::Stopping(search) => {
                    let ranked = info.into_analysis_line(search.side_to_move);
                    if search.results.record(ranked) {
                        search.publish();
                    }
                }
                _ => tracing::trace!("Discarding stale info line"),
            },
            Ok(UciMessage::BestMove { mv, .. }) => self.search_finished(mv).await,
            Ok(UciMessage::ReadyOk) => {
                if matches!(self.state, SearchState::Idle) {
                    self.status.send_replace(EngineStatus::Idle);
                }
            }
            Ok(msg) => tracing::trace!("Ignoring UCI message: {:?}", msg),
            Err(UciError::SkippedInfo(_)) => tracing::trace!("Skipped info line: {}", line),
            Err(e) => tracing::trace!("Failed to parse UCI message: {}", e),
        }
    }

    async fn search_finished(&mut self, best_move: Option<String>) {
        self.deadline = None;

        match std::mem::replace(&mut self.state, SearchState::Idle) {
            SearchState::Running(mut search) | SearchState::Stopping(mut search) => {
                tracing::info!("Search finished: bestmove {:?}", best_move);
                search.results.best_move = best_move;
                search.finish();
                self.await_ready().await;
            }
            SearchState::Draining {
                queued: Some(search),
            } => self.begin(search).await,
            SearchState::Draining { queued: None } => self.await_ready().await,
            SearchState::Idle => tracing::debug!("Stray bestmove ignored"),
        }
    }

    async fn await_ready(&mut self) {
        self.write(UciCommand::IsReady).await;
    }

    /// Stop deadline passed: hand back partial results and give up on the
    /// process.
    fn expire_stop(&mut self) {
        match std::mem::replace(&mut self.state, SearchState::Idle) {
            SearchState::Running(search) | SearchState::Stopping(search) => search.finish(),
            SearchState::Draining { queued } => {
                if let Some(search) = queued {
                    search.fail(EngineError::unavailable("engine did not acknowledge stop"));
                }
            }
            SearchState::Idle => {}
        }
    }

    fn release_pending(&mut self) {
        match std::mem::replace(&mut self.state, SearchState::Idle) {
            SearchState::Running(search) | SearchState::Stopping(search) => search.finish(),
            SearchState::Draining {
                queued: Some(search),
            } => search.finish(),
            _ => {}
        }
    }

    fn fail_pending(&mut self, err: EngineError) {
        match std::mem::replace(&mut self.state, SearchState::Idle) {
            SearchState::Running(search) | SearchState::Stopping(search) => search.fail(err),
            SearchState::Draining {
                queued: Some(search),
            } => search.fail(err),
            _ => {}
        }
    }

    async fn shutdown(&mut self) {
        self.deadline = None;
        let _ = self.writer.send(UciCommand::Quit).await;
        if let Some(mut child) = self.child.take() {
            let _ = tokio::time::timeout(QUIT_GRACE, child.wait()).await;
            let _ = child.kill().await;
        }
        self.status.send_replace(EngineStatus::Closed);
    }
}
