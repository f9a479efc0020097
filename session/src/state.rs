use chess::{
    CastlingRight, CozyRules, HistoryEntry, Move, MoveHistory, Piece, PieceColor, Position,
    PositionModel, ResultSet, Rules, Square,
};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::snapshot::{MoveRecord, SessionSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Looking at an analysed position; nothing has been played.
    Viewing,
    /// Playing moves from the analysed position.
    Playing,
    /// Editing squares and fields directly.
    Editing,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Viewing => "viewing",
            Self::Playing => "playing",
            Self::Editing => "editing",
        })
    }
}

struct CachedAnalysis {
    position: Position,
    results: ResultSet,
}

/// Position, history and mode for one session. The only writer of any of
/// them; every mutation goes through `&mut self`.
pub struct SessionState {
    mode: Mode,
    model: PositionModel,
    history: Option<MoveHistory>,
    selected: Option<Square>,
    edited: bool,
    analysis: Option<CachedAnalysis>,
    rules: Box<dyn Rules + Send + Sync>,
}

impl SessionState {
    pub fn new(position: Position) -> Self {
        Self::with_rules(position, Box::new(CozyRules))
    }

    pub fn with_rules(position: Position, rules: Box<dyn Rules + Send + Sync>) -> Self {
        Self {
            mode: Mode::Viewing,
            model: PositionModel::new(position),
            history: None,
            selected: None,
            edited: false,
            analysis: None,
            rules,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn position(&self) -> &Position {
        self.model.position()
    }

    pub fn history(&self) -> Option<&MoveHistory> {
        self.history.as_ref()
    }

    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    pub fn rules(&self) -> &dyn Rules {
        self.rules.as_ref()
    }

    /// Start over from `position` in Viewing mode, dropping history, edits
    /// and any cached analysis.
    pub fn reset(&mut self, position: Position) {
        tracing::debug!(fen = %position, "Session reset");
        self.mode = Mode::Viewing;
        self.model.replace(position);
        self.history = None;
        self.selected = None;
        self.edited = false;
        self.analysis = None;
    }

    /// Replace the position from a literal and start over. On error nothing
    /// changes.
    pub fn load_literal(&mut self, text: &str) -> Result<&Position, SessionError> {
        let position: Position = text.parse()?;
        self.reset(position);
        Ok(self.model.position())
    }

    /// Enter Playing.
    ///
    /// From Viewing the current position becomes the history origin. From
    /// Editing, an edited board must validate and restarts the history;
    /// an untouched one resumes where play left off.
    pub fn start_playing(&mut self) -> Result<(), SessionError> {
        match self.mode {
            Mode::Playing => return Ok(()),
            Mode::Viewing => {
                self.model.position().validate()?;
                self.history = Some(MoveHistory::new(self.model.snapshot()));
            }
            Mode::Editing => {
                if self.edited || self.history.is_none() {
                    self.model.position().validate()?;
                    self.history = Some(MoveHistory::new(self.model.snapshot()));
                    self.analysis = None;
                } else if let Some(history) = &self.history {
                    self.model.replace(history.current().clone());
                }
                self.edited = false;
            }
        }
        tracing::debug!(from = %self.mode, "Entering playing mode");
        self.mode = Mode::Playing;
        Ok(())
    }

    /// Enter Editing from Playing. Clears the square selection.
    pub fn start_editing(&mut self) -> Result<(), SessionError> {
        match self.mode {
            Mode::Editing => Ok(()),
            Mode::Playing => {
                self.mode = Mode::Editing;
                self.selected = None;
                self.edited = false;
                Ok(())
            }
            Mode::Viewing => Err(SessionError::InvalidTransition {
                from: Mode::Viewing,
                to: Mode::Editing,
            }),
        }
    }

    pub fn select_square(&mut self, square: Option<Square>) {
        self.selected = square;
    }

    pub fn edit_square(
        &mut self,
        square: Square,
        piece: Option<Piece>,
    ) -> Result<(), SessionError> {
        self.require(Mode::Editing)?;
        self.model.set_square(square, piece);
        self.mark_edited();
        Ok(())
    }

    pub fn toggle_castling_right(&mut self, right: CastlingRight) -> Result<(), SessionError> {
        self.require(Mode::Editing)?;
        self.model.toggle_castling_right(right);
        self.mark_edited();
        Ok(())
    }

    pub fn set_side_to_move(&mut self, color: PieceColor) -> Result<(), SessionError> {
        self.require(Mode::Editing)?;
        self.model.set_side_to_move(color);
        self.mark_edited();
        Ok(())
    }

    /// Replace the board being edited from a literal.
    pub fn edit_literal(&mut self, text: &str) -> Result<(), SessionError> {
        self.require(Mode::Editing)?;
        self.model.set_from_literal(text)?;
        self.mark_edited();
        Ok(())
    }

    pub fn apply_move(&mut self, mv: Move) -> Result<HistoryEntry, SessionError> {
        self.require(Mode::Playing)?;
        let history = self.history.as_mut().ok_or(SessionError::WrongMode(self.mode))?;
        let entry = history.apply_move(self.rules.as_ref(), mv)?.clone();
        self.model.replace(entry.position.clone());
        self.analysis = None;
        Ok(entry)
    }

    /// Apply a move given in algebraic notation ("Nf3", "O-O").
    pub fn apply_san(&mut self, san: &str) -> Result<HistoryEntry, SessionError> {
        let mv = self.rules.parse_san(self.model.position(), san)?;
        self.apply_move(mv)
    }

    pub fn undo(&mut self) -> Result<bool, SessionError> {
        self.navigate(MoveHistory::undo)
    }

    pub fn redo(&mut self) -> Result<bool, SessionError> {
        self.navigate(MoveHistory::redo)
    }

    pub fn go_to(&mut self, target: Option<usize>) -> Result<bool, SessionError> {
        self.navigate(|h| h.go_to(target))
    }

    pub fn go_to_end(&mut self) -> Result<bool, SessionError> {
        self.navigate(MoveHistory::go_to_end)
    }

    fn navigate(
        &mut self,
        step: impl FnOnce(&mut MoveHistory) -> bool,
    ) -> Result<bool, SessionError> {
        self.require(Mode::Playing)?;
        let history = self.history.as_mut().ok_or(SessionError::WrongMode(self.mode))?;
        if !step(history) {
            return Ok(false);
        }
        self.model.replace(history.current().clone());
        self.analysis = None;
        Ok(true)
    }

    /// Cache `results` if they belong to the live position. Returns whether
    /// they were kept.
    pub fn record_analysis(&mut self, analysed: &Position, results: ResultSet) -> bool {
        if analysed != self.model.position() {
            tracing::debug!("Discarding analysis of a position no longer shown");
            return false;
        }
        self.analysis = Some(CachedAnalysis {
            position: analysed.clone(),
            results,
        });
        true
    }

    pub fn analysis(&self) -> Option<&ResultSet> {
        self.analysis
            .as_ref()
            .filter(|cached| &cached.position == self.model.position())
            .map(|cached| &cached.results)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let position = self.model.position();
        let (history, cursor) = match &self.history {
            Some(h) => (
                h.entries().iter().map(MoveRecord::from).collect(),
                h.cursor(),
            ),
            None => (Vec::new(), None),
        };

        SessionSnapshot {
            session_id: None,
            mode: self.mode,
            fen: position.to_fen(),
            side_to_move: position.side_to_move,
            defects: position.defects().iter().map(|d| d.to_string()).collect(),
            ply: self.history.as_ref().map_or(0, MoveHistory::ply),
            history,
            cursor,
            selected: self.selected,
            analysis: self.analysis().cloned(),
            engine_ready: false,
        }
    }

    fn require(&self, mode: Mode) -> Result<(), SessionError> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(SessionError::WrongMode(self.mode))
        }
    }

    fn mark_edited(&mut self) {
        self.edited = true;
        self.analysis = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{AnalysisLine, PieceKind, Score};

    fn mv(s: &str) -> Move {
        s.parse().unwrap()
    }

    fn results(best: &str) -> ResultSet {
        let mut set = ResultSet::new();
        set.record(AnalysisLine {
            rank: 1,
            depth: 10,
            seldepth: None,
            score: Score::Centipawns(25),
            pv: vec![best.to_string()],
            nodes: None,
            nps: None,
            time_ms: None,
        });
        set.best_move = Some(best.to_string());
        set
    }

    #[test]
    fn test_viewing_to_playing_captures_origin() {
        let mut state = SessionState::new(Position::starting());
        assert_eq!(state.mode(), Mode::Viewing);
        assert!(matches!(
            state.apply_move(mv("e2e4")),
            Err(SessionError::WrongMode(Mode::Viewing))
        ));

        state.start_playing().unwrap();
        state.apply_move(mv("e2e4")).unwrap();
        state.apply_san("e5").unwrap();
        assert_eq!(state.history().unwrap().origin(), &Position::starting());
        assert_eq!(state.snapshot().ply, 2);
    }

    #[test]
    fn test_viewing_cannot_enter_editing() {
        let mut state = SessionState::new(Position::starting());
        assert!(matches!(
            state.start_editing(),
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_editing_restarts_history_after_changes() {
        let mut state = SessionState::new(Position::starting());
        state.start_playing().unwrap();
        state.apply_move(mv("e2e4")).unwrap();

        state.select_square(Some("e4".parse().unwrap()));
        state.start_editing().unwrap();
        assert_eq!(state.selected(), None);

        state.edit_square("d1".parse().unwrap(), None).unwrap();
        state.start_playing().unwrap();

        let history = state.history().unwrap();
        assert!(history.is_empty());
        assert!(history
            .origin()
            .to_fen()
            .starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNB1KBNR b"));
    }

    #[test]
    fn test_untouched_edit_keeps_history() {
        let mut state = SessionState::new(Position::starting());
        state.start_playing().unwrap();
        state.apply_move(mv("d2d4")).unwrap();
        state.start_editing().unwrap();
        state.start_playing().unwrap();
        assert_eq!(state.history().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_edit_cannot_be_played() {
        let mut state = SessionState::new(Position::starting());
        state.start_playing().unwrap();
        state.start_editing().unwrap();
        state.edit_square("e1".parse().unwrap(), None).unwrap();
        assert!(matches!(
            state.start_playing(),
            Err(SessionError::InvalidPosition(_))
        ));
        assert_eq!(state.mode(), Mode::Editing);

        state
            .edit_square(
                "e1".parse().unwrap(),
                Some(Piece::new(PieceKind::King, PieceColor::White)),
            )
            .unwrap();
        state.start_playing().unwrap();
    }

    #[test]
    fn test_moves_and_navigation_invalidate_analysis() {
        let mut state = SessionState::new(Position::starting());
        let start = Position::starting();
        assert!(state.record_analysis(&start, results("e2e4")));
        assert!(state.analysis().is_some());

        state.start_playing().unwrap();
        state.apply_move(mv("e2e4")).unwrap();
        assert!(state.analysis().is_none());

        // Late result for the old position is not cached.
        assert!(!state.record_analysis(&start, results("d2d4")));

        let current = state.position().clone();
        assert!(state.record_analysis(&current, results("e7e5")));
        assert!(state.undo().unwrap());
        assert!(state.analysis().is_none());
        assert!(!state.undo().unwrap());
    }

    #[test]
    fn test_reset_returns_to_viewing() {
        let mut state = SessionState::new(Position::starting());
        state.start_playing().unwrap();
        state.start_editing().unwrap();
        state.reset(Position::starting());
        assert_eq!(state.mode(), Mode::Viewing);
        assert!(state.history().is_none());
    }

    #[test]
    fn test_load_literal_is_atomic() {
        let mut state = SessionState::new(Position::starting());
        assert!(state.load_literal("4k3/8/8/8/8/8/8/8").is_err());
        assert_eq!(state.position(), &Position::starting());
        state.load_literal("4k3/8/8/8/8/8/8/4K3").unwrap();
        assert_eq!(state.position().to_fen(), "4k3/8/8/8/8/8/8/4K3 w - - 0 1");
    }

    #[test]
    fn test_field_edits_need_editing_mode() {
        let mut state = SessionState::new(Position::starting());
        assert!(state
            .toggle_castling_right(CastlingRight::WhiteKingside)
            .is_err());
        state.start_playing().unwrap();
        state.start_editing().unwrap();
        state
            .toggle_castling_right(CastlingRight::WhiteKingside)
            .unwrap();
        state.set_side_to_move(PieceColor::Black).unwrap();
        assert!(state.position().to_fen().ends_with(" b Qkq - 0 1"));
        state.edit_literal("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(state.edit_literal("bogus").is_err());
    }
}
