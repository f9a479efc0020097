//! Scripted in-process UCI engine for actor tests.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

/// Candidate moves by rank, best first.
const RANKED_MOVES: [&str; 4] = ["e2e4", "d2d4", "g1f3", "c2c4"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Script {
    /// Search every depth up to the limit, then report `bestmove`.
    Complete,
    /// Report depth 1, then wait for `stop`.
    WaitForStop,
    /// Report depth 1 and never answer `stop`.
    IgnoreStop,
    /// Never answer `uci`.
    Silent,
    /// Exit as soon as a search starts.
    CrashOnGo,
}

pub(crate) async fn fake_engine(stream: DuplexStream, script: Script) {
    let (read, mut write) = tokio::io::split(stream);
    let mut lines = BufReader::new(read).lines();
    let mut multipv = 1u32;
    let mut searching = false;

    while let Ok(Some(line)) = lines.next_line().await {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let reply = match tokens.as_slice() {
            ["uci"] if script == Script::Silent => continue,
            ["uci"] => "id name Fake Engine\nid author nobody\nuciok\n".to_string(),
            ["setoption", "name", "MultiPV", "value", n] => {
                multipv = n.parse().unwrap_or(1);
                continue;
            }
            ["isready"] => "readyok\n".to_string(),
            ["go", "depth", d] => {
                let depth: u32 = d.parse().unwrap_or(1);
                match script {
                    Script::CrashOnGo => return,
                    Script::Complete => {
                        let mut out = info_block(1..=depth, multipv);
                        out.push_str(&format!("bestmove {} ponder e7e5\n", RANKED_MOVES[0]));
                        out
                    }
                    _ => {
                        searching = true;
                        info_block(1..=1, multipv)
                    }
                }
            }
            ["stop"] if searching && script == Script::WaitForStop => {
                searching = false;
                format!("bestmove {}\n", RANKED_MOVES[0])
            }
            ["quit"] => return,
            _ => continue,
        };

        if write.write_all(reply.as_bytes()).await.is_err() {
            return;
        }
        let _ = write.flush().await;
    }
}

fn info_block(depths: std::ops::RangeInclusive<u32>, multipv: u32) -> String {
    let mut out = String::new();
    for depth in depths {
        for rank in 1..=multipv {
            let mv = RANKED_MOVES[(rank as usize - 1) % RANKED_MOVES.len()];
            let cp = 30 - 10 * rank as i32;
            out.push_str(&format!(
                "info depth {depth} seldepth {} multipv {rank} score cp {cp} nodes {} nps 1000000 time {depth} pv {mv} e7e5\n",
                depth + 2,
                depth * 1000,
            ));
        }
    }
    out.push_str("info string search done\n");
    out
}
