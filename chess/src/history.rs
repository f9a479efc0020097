//! Branch-truncating move log with a navigation cursor.

use serde::{Deserialize, Serialize};

use crate::moves::Move;
use crate::position::Position;
use crate::rules::{Rules, RulesError};

/// One played move and the position it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub position: Position,
    pub mv: Move,
    pub san: String,
    pub uci: String,
}

/// Moves played from an origin position.
///
/// `cursor` is `None` while viewing the origin, otherwise the index of the
/// entry whose resulting position is current. Applying a move from the
/// middle of the log drops every later entry first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveHistory {
    origin: Position,
    entries: Vec<HistoryEntry>,
    cursor: Option<usize>,
}

impl MoveHistory {
    pub fn new(origin: Position) -> Self {
        Self {
            origin,
            entries: Vec::new(),
            cursor: None,
        }
    }

    pub fn origin(&self) -> &Position {
        &self.origin
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of half-moves from the origin to the current position.
    pub fn ply(&self) -> usize {
        self.cursor.map_or(0, |i| i + 1)
    }

    pub fn current(&self) -> &Position {
        match self.cursor {
            Some(i) => &self.entries[i].position,
            None => &self.origin,
        }
    }

    pub fn at_end(&self) -> bool {
        self.ply() == self.entries.len()
    }

    /// Play `mv` from the current position.
    ///
    /// The move is checked and applied before anything is touched, so an
    /// illegal move leaves the history as it was.
    pub fn apply_move<R: Rules + ?Sized>(
        &mut self,
        rules: &R,
        mv: Move,
    ) -> Result<&HistoryEntry, RulesError> {
        let before = self.current();
        let san = rules.to_san(before, mv)?;
        let position = rules.apply(before, mv)?;

        self.entries.truncate(self.ply());
        self.entries.push(HistoryEntry {
            position,
            mv,
            san,
            uci: mv.to_uci(),
        });
        let last = self.entries.len() - 1;
        self.cursor = Some(last);

        tracing::debug!(uci = %mv, ply = last + 1, "Move applied");
        Ok(&self.entries[last])
    }

    /// Jump to `target` (`None` = origin). Out-of-range targets are ignored.
    pub fn go_to(&mut self, target: Option<usize>) -> bool {
        match target {
            Some(i) if i >= self.entries.len() => false,
            _ => {
                self.cursor = target;
                true
            }
        }
    }

    pub fn undo(&mut self) -> bool {
        match self.cursor {
            Some(0) => self.go_to(None),
            Some(i) => self.go_to(Some(i - 1)),
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let next = self.cursor.map_or(0, |i| i + 1);
        self.go_to(Some(next))
    }

    pub fn go_to_end(&mut self) -> bool {
        match self.entries.len() {
            0 => self.go_to(None),
            n => self.go_to(Some(n - 1)),
        }
    }

    /// Replay every entry from the origin and compare stored positions.
    ///
    /// Returns the index of the first entry that does not reproduce.
    pub fn verify<R: Rules + ?Sized>(&self, rules: &R) -> Result<(), usize> {
        let mut position = self.origin.clone();
        for (i, entry) in self.entries.iter().enumerate() {
            match rules.apply(&position, entry.mv) {
                Ok(next) if next == entry.position => position = next,
                _ => return Err(i),
            }
        }
        Ok(())
    }

    /// Coordinate moves from the origin up to the cursor.
    pub fn uci_moves(&self) -> Vec<String> {
        self.entries[..self.ply()]
            .iter()
            .map(|e| e.uci.clone())
            .collect()
    }
}
