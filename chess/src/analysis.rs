//! Engine analysis types shared by the engine session and the coordinator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::PieceColor;

/// Magnitude of the surrogate centipawn value for forced mates.
pub const MATE_SCORE: i32 = 100_000;

/// Engine evaluation, always from White's point of view.
///
/// Centipawns: positive = White is better.
/// Mate: positive N = White mates in N, negative N = Black mates in |N|.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Score {
    Centipawns(i32),
    Mate(i32),
}

impl Score {
    /// Convert a score reported from the side to move's perspective.
    pub fn from_side_to_move(raw: Score, side_to_move: PieceColor) -> Self {
        match side_to_move {
            PieceColor::White => raw,
            PieceColor::Black => raw.negate(),
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Self::Centipawns(cp) => Self::Centipawns(-cp),
            Self::Mate(m) => Self::Mate(-m),
        }
    }

    /// Single comparable number: centipawns, or `±100000 - n` for mates.
    pub fn to_cp(self) -> i32 {
        match self {
            Self::Centipawns(cp) => cp,
            Self::Mate(m) if m > 0 => MATE_SCORE - m,
            Self::Mate(m) => -MATE_SCORE - m,
        }
    }

    pub fn mate_in(self) -> Option<i32> {
        match self {
            Self::Mate(m) => Some(m),
            Self::Centipawns(_) => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Centipawns(cp) => format!("{:+.2}", *cp as f64 / 100.0),
            Self::Mate(m) if *m > 0 => format!("+M{}", m),
            Self::Mate(m) => format!("-M{}", m.abs()),
        }
    }

    fn order_key(self) -> (i8, i32) {
        match self {
            Self::Mate(m) if m > 0 => (1, -m),
            Self::Mate(m) => (-1, -m),
            Self::Centipawns(cp) => (0, cp),
        }
    }
}

impl Ord for Score {
    /// Better for White sorts greater. Mate-for is above every centipawn
    /// value and a shorter mate beats a longer one.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// One ranked variation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisLine {
    /// 1-based variation rank as reported by the engine.
    pub rank: u32,
    pub depth: u32,
    pub seldepth: Option<u32>,
    pub score: Score,
    /// Principal variation in coordinate notation.
    pub pv: Vec<String>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub time_ms: Option<u64>,
}

impl AnalysisLine {
    pub fn best_move(&self) -> Option<&str> {
        self.pv.first().map(String::as_str)
    }

    pub fn score_cp(&self) -> i32 {
        self.score.to_cp()
    }

    pub fn mate_in(&self) -> Option<i32> {
        self.score.mate_in()
    }
}

/// Latest line per rank for one analysis request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    lines: BTreeMap<u32, AnalysisLine>,
    pub best_move: Option<String>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `line` unless a deeper line for the same rank is already held.
    /// Returns whether the set changed.
    pub fn record(&mut self, line: AnalysisLine) -> bool {
        match self.lines.get(&line.rank) {
            Some(stored) if stored.depth > line.depth => false,
            _ => {
                self.lines.insert(line.rank, line);
                true
            }
        }
    }

    pub fn get(&self, rank: u32) -> Option<&AnalysisLine> {
        self.lines.get(&rank)
    }

    /// Lines in rank order.
    pub fn lines(&self) -> impl Iterator<Item = &AnalysisLine> {
        self.lines.values()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Deepest depth any rank has reached.
    pub fn depth(&self) -> u32 {
        self.lines.values().map(|l| l.depth).max().unwrap_or(0)
    }

    pub fn top(&self) -> Option<&AnalysisLine> {
        self.lines.values().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(rank: u32, depth: u32, cp: i32, pv: &[&str]) -> AnalysisLine {
        AnalysisLine {
            rank,
            depth,
            seldepth: None,
            score: Score::Centipawns(cp),
            pv: pv.iter().map(|s| s.to_string()).collect(),
            nodes: None,
            nps: None,
            time_ms: None,
        }
    }

    #[test]
    fn mate_surrogate_values() {
        assert_eq!(Score::Mate(3).to_cp(), 99_997);
        assert_eq!(Score::Mate(-2).to_cp(), -99_998);
        assert_eq!(Score::Centipawns(-35).to_cp(), -35);
    }

    #[test]
    fn black_scores_are_flipped() {
        assert_eq!(
            Score::from_side_to_move(Score::Centipawns(40), PieceColor::Black),
            Score::Centipawns(-40)
        );
        assert_eq!(
            Score::from_side_to_move(Score::Mate(2), PieceColor::Black),
            Score::Mate(-2)
        );
        assert_eq!(
            Score::from_side_to_move(Score::Mate(2), PieceColor::White),
            Score::Mate(2)
        );
    }

    #[test]
    fn ordering_never_aliases_mates_and_centipawns() {
        let mut scores = vec![
            Score::Centipawns(99_999),
            Score::Mate(1),
            Score::Mate(5),
            Score::Mate(-1),
            Score::Mate(-4),
            Score::Centipawns(-99_999),
            Score::Centipawns(0),
        ];
        scores.sort();
        assert_eq!(
            scores,
            vec![
                Score::Mate(-1),
                Score::Mate(-4),
                Score::Centipawns(-99_999),
                Score::Centipawns(0),
                Score::Centipawns(99_999),
                Score::Mate(5),
                Score::Mate(1),
            ]
        );
    }

    #[test]
    fn display_format() {
        assert_eq!(Score::Centipawns(35).to_string(), "+0.35");
        assert_eq!(Score::Centipawns(-120).to_string(), "-1.20");
        assert_eq!(Score::Mate(-3).to_string(), "-M3");
    }

    #[test]
    fn deeper_or_equal_lines_replace_per_rank() {
        let mut set = ResultSet::new();
        assert!(set.record(line(1, 8, 30, &["e2e4"])));
        assert!(set.record(line(2, 8, 10, &["d2d4"])));
        assert!(set.record(line(1, 9, 25, &["g1f3"])));
        assert!(!set.record(line(1, 7, 90, &["a2a3"])));
        assert!(set.record(line(1, 9, 28, &["e2e4", "e7e5"])));

        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).unwrap().best_move(), Some("e2e4"));
        assert_eq!(set.get(1).unwrap().score_cp(), 28);
        assert_eq!(set.get(2).unwrap().depth, 8);
        assert_eq!(set.depth(), 9);
        let ranks: Vec<u32> = set.lines().map(|l| l.rank).collect();
        assert_eq!(ranks, vec![1, 2]);
    }

    #[test]
    fn serialises_scores_with_a_tag() {
        let json = serde_json::to_string(&Score::Mate(2)).unwrap();
        assert_eq!(json, r#"{"kind":"mate","value":2}"#);
    }
}
