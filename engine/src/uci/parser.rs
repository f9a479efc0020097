use chess::{AnalysisLine, Move, PieceColor, Score};

use super::UciError;

/// Incoming message from a UCI engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    /// `mv` is `None` for `bestmove (none)`.
    BestMove {
        mv: Option<String>,
        ponder: Option<String>,
    },
    Info(InfoLine),
}

/// A ranked `info` line, score still from the side to move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoLine {
    pub depth: u32,
    pub multipv: u32,
    pub seldepth: Option<u32>,
    pub score: Score,
    pub pv: Vec<String>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub time_ms: Option<u64>,
}

impl InfoLine {
    /// Convert to an [`AnalysisLine`] with the score seen from White.
    pub fn into_analysis_line(self, side_to_move: PieceColor) -> AnalysisLine {
        AnalysisLine {
            rank: self.multipv,
            depth: self.depth,
            seldepth: self.seldepth,
            score: Score::from_side_to_move(self.score, side_to_move),
            pv: self.pv,
            nodes: self.nodes,
            nps: self.nps,
            time_ms: self.time_ms,
        }
    }
}

/// Outgoing command to a UCI engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    SetOption { name: String, value: String },
    IsReady,
    Position { fen: String },
    GoDepth(u32),
    Stop,
    Quit,
}

impl UciCommand {
    pub fn set_option(name: &str, value: impl ToString) -> Self {
        Self::SetOption {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

impl std::fmt::Display for UciCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uci => write!(f, "uci"),
            Self::SetOption { name, value } => write!(f, "setoption name {} value {}", name, value),
            Self::IsReady => write!(f, "isready"),
            Self::Position { fen } => write!(f, "position fen {}", fen),
            Self::GoDepth(depth) => write!(f, "go depth {}", depth),
            Self::Stop => write!(f, "stop"),
            Self::Quit => write!(f, "quit"),
        }
    }
}

/// Parse a UCI message line.
pub fn parse_uci_message(line: &str) -> Result<UciMessage, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => Ok(UciMessage::UciOk),
        Some(&"readyok") => Ok(UciMessage::ReadyOk),

        Some(&"id") => {
            if tokens.len() < 3 {
                return Err(UciError::MalformedMessage(line.to_string()));
            }
            let name = tokens[1].to_string();
            let value = tokens[2..].join(" ");
            Ok(UciMessage::Id { name, value })
        }

        Some(&"bestmove") => {
            let Some(&token) = tokens.get(1) else {
                return Err(UciError::MalformedMessage(line.to_string()));
            };
            let mv = match token {
                "(none)" => None,
                other => Some(parse_coordinate_move(other)?),
            };
            let ponder = match (tokens.get(2), tokens.get(3)) {
                (Some(&"ponder"), Some(p)) => Some(parse_coordinate_move(p)?),
                _ => None,
            };
            Ok(UciMessage::BestMove { mv, ponder })
        }

        Some(&"info") => parse_info_line(&tokens[1..])
            .map(UciMessage::Info)
            .ok_or_else(|| UciError::SkippedInfo(line.to_string())),

        _ => Err(UciError::UnknownMessage(line.to_string())),
    }
}

/// Parse the tokens after `info`. Lines without `depth`, `multipv`, a score
/// or a non-empty `pv` yield `None`. `pv` runs to the end of the line.
fn parse_info_line(tokens: &[&str]) -> Option<InfoLine> {
    let mut depth = None;
    let mut multipv = None;
    let mut seldepth = None;
    let mut score = None;
    let mut nodes = None;
    let mut nps = None;
    let mut time_ms = None;
    let mut pv = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "seldepth" => {
                i += 1;
                seldepth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "multipv" => {
                i += 1;
                multipv = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "time" => {
                i += 1;
                time_ms = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nodes" => {
                i += 1;
                nodes = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nps" => {
                i += 1;
                nps = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "score" => {
                let kind = tokens.get(i + 1);
                let value = tokens.get(i + 2).and_then(|s| s.parse::<i32>().ok());
                score = match (kind, value) {
                    (Some(&"cp"), Some(v)) => Some(Score::Centipawns(v)),
                    (Some(&"mate"), Some(v)) => Some(Score::Mate(v)),
                    _ => None,
                };
                i += 2;
            }
            "pv" => {
                pv = tokens[i + 1..].iter().map(|s| s.to_string()).collect();
                break;
            }
            "string" => break,
            _ => {}
        }
        i += 1;
    }

    if pv.is_empty() {
        return None;
    }

    Some(InfoLine {
        depth: depth?,
        multipv: multipv?,
        seldepth,
        score: score?,
        pv,
        nodes,
        nps,
        time_ms,
    })
}

fn parse_coordinate_move(s: &str) -> Result<String, UciError> {
    s.parse::<Move>()
        .map(|mv| mv.to_uci())
        .map_err(|_| UciError::InvalidMove(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bestmove() {
        let msg = parse_uci_message("bestmove e2e4 ponder e7e5").unwrap();
        assert_eq!(
            msg,
            UciMessage::BestMove {
                mv: Some("e2e4".into()),
                ponder: Some("e7e5".into()),
            }
        );
    }

    #[test]
    fn test_parse_bestmove_none() {
        let msg = parse_uci_message("bestmove (none)").unwrap();
        assert_eq!(
            msg,
            UciMessage::BestMove {
                mv: None,
                ponder: None
            }
        );
        assert!(matches!(
            parse_uci_message("bestmove"),
            Err(UciError::MalformedMessage(_))
        ));
        assert!(matches!(
            parse_uci_message("bestmove z9z9"),
            Err(UciError::InvalidMove(_))
        ));
    }

    #[test]
    fn test_parse_info() {
        let msg = parse_uci_message(
            "info depth 12 seldepth 18 multipv 2 score cp 35 nodes 15234 nps 900000 time 17 pv e2e4 e7e5 g1f3",
        )
        .unwrap();
        let UciMessage::Info(info) = msg else {
            panic!("Wrong message type");
        };
        assert_eq!(info.depth, 12);
        assert_eq!(info.multipv, 2);
        assert_eq!(info.seldepth, Some(18));
        assert_eq!(info.score, Score::Centipawns(35));
        assert_eq!(info.nodes, Some(15234));
        assert_eq!(info.nps, Some(900000));
        assert_eq!(info.time_ms, Some(17));
        assert_eq!(info.pv, vec!["e2e4", "e7e5", "g1f3"]);
    }

    #[test]
    fn test_parse_mate_with_bound() {
        let msg =
            parse_uci_message("info depth 20 multipv 1 score mate -3 upperbound pv h7h8 g8h8")
                .unwrap();
        let UciMessage::Info(info) = msg else {
            panic!("Wrong message type");
        };
        assert_eq!(info.score, Score::Mate(-3));
        assert_eq!(info.pv.len(), 2);
    }

    #[test]
    fn incomplete_info_lines_are_skipped() {
        for line in [
            "info depth 5 score cp 10 pv e2e4",
            "info multipv 1 score cp 10 pv e2e4",
            "info depth 5 multipv 1 score cp 10",
            "info depth 5 multipv 1 score cp 10 pv",
            "info depth 5 currmove e2e4 currmovenumber 1",
            "info string NNUE evaluation using nn-big.nnue",
        ] {
            assert!(
                matches!(parse_uci_message(line), Err(UciError::SkippedInfo(_))),
                "{line}"
            );
        }
    }

    #[test]
    fn black_to_move_scores_are_negated() {
        let UciMessage::Info(info) =
            parse_uci_message("info depth 3 multipv 1 score cp 50 pv e7e5").unwrap()
        else {
            panic!("Wrong message type");
        };
        let line = info.into_analysis_line(PieceColor::Black);
        assert_eq!(line.score, Score::Centipawns(-50));
        assert_eq!(line.rank, 1);
        assert_eq!(line.best_move(), Some("e7e5"));
    }

    #[test]
    fn test_parse_handshake_lines() {
        assert_eq!(parse_uci_message("uciok").unwrap(), UciMessage::UciOk);
        assert_eq!(parse_uci_message("readyok").unwrap(), UciMessage::ReadyOk);
        assert_eq!(
            parse_uci_message("id name Stockfish 17").unwrap(),
            UciMessage::Id {
                name: "name".into(),
                value: "Stockfish 17".into()
            }
        );
        assert!(matches!(
            parse_uci_message("option name Hash type spin"),
            Err(UciError::UnknownMessage(_))
        ));
    }

    #[test]
    fn test_format_commands() {
        assert_eq!(
            UciCommand::set_option("MultiPV", 3).to_string(),
            "setoption name MultiPV value 3"
        );
        assert_eq!(UciCommand::GoDepth(10).to_string(), "go depth 10");
        assert_eq!(
            UciCommand::Position {
                fen: chess::STARTING_FEN.into()
            }
            .to_string(),
            format!("position fen {}", chess::STARTING_FEN)
        );
    }
}
