//! Line-oriented plumbing between the actor and the engine's byte streams.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::uci::UciCommand;

const LINE_BUFFER: usize = 256;
const COMMAND_BUFFER: usize = 32;

/// Forward every non-empty output line. The channel closes on EOF or read
/// error, which the actor treats as the engine going away.
pub(crate) fn spawn_reader<R>(reader: R) -> mpsc::Receiver<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    tracing::warn!("Engine stdout EOF - engine closed");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    tracing::trace!("UCI << {}", trimmed);
                    if tx.send(trimmed.to_string()).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Error reading from engine stdout: {}", e);
                    break;
                }
            }
        }
        tracing::debug!("Output reader task exiting");
    });
    rx
}

/// Serialise commands onto the engine's stdin, one per line.
pub(crate) fn spawn_writer<W>(mut writer: W) -> mpsc::Sender<UciCommand>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<UciCommand>(COMMAND_BUFFER);
    tokio::spawn(async move {
        while let Some(cmd) = rx.recv().await {
            let line = format!("{}\n", cmd);
            tracing::trace!("UCI >> {}", line.trim_end());

            if let Err(e) = writer.write_all(line.as_bytes()).await {
                tracing::error!("Failed to write to engine stdin: {}", e);
                break;
            }
            if let Err(e) = writer.flush().await {
                tracing::error!("Failed to flush engine stdin: {}", e);
                break;
            }
        }
        tracing::debug!("Stdin writer task exiting");
    });
    tx
}
