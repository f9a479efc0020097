//! Rules capability: legality, move application and notation.
//!
//! Everything rule-related is delegated to `cozy-chess`. The position model
//! never encodes chess rules itself; it only consumes this trait.

use cozy_chess::{Board, Color, GameStatus, Piece};

use chess_common::{
    convert_cozy_castling_to_uci, convert_uci_castling_to_cozy, format_file, format_piece_upper,
    format_rank,
};

use crate::moves::Move;
use crate::position::Position;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    #[error("illegal move {mv} in position {fen}")]
    IllegalMove { mv: String, fen: String },
    #[error("position is not playable: {0}")]
    UnplayablePosition(String),
    #[error("no legal move matches '{0}'")]
    UnknownSan(String),
    #[error("ambiguous move '{0}'")]
    AmbiguousSan(String),
}

pub trait Rules {
    /// All legal moves, castling in king-two-squares form.
    fn legal_moves(&self, position: &Position) -> Result<Vec<Move>, RulesError>;

    /// The position after `mv`, or `IllegalMove`.
    fn apply(&self, position: &Position, mv: Move) -> Result<Position, RulesError>;

    /// Standard algebraic notation for a legal move.
    fn to_san(&self, position: &Position, mv: Move) -> Result<String, RulesError>;

    /// Resolve algebraic notation ("Nf3", "exd5", "O-O", "e8=Q+") to a move.
    fn parse_san(&self, position: &Position, san: &str) -> Result<Move, RulesError>;

    fn is_legal(&self, position: &Position, mv: Move) -> bool {
        self.legal_moves(position)
            .map(|moves| moves.contains(&mv))
            .unwrap_or(false)
    }
}

/// [`Rules`] backed by `cozy-chess`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CozyRules;

impl Rules for CozyRules {
    fn legal_moves(&self, position: &Position) -> Result<Vec<Move>, RulesError> {
        let board = to_board(position)?;
        Ok(cozy_legal_moves(&board)
            .into_iter()
            .map(|mv| from_cozy(convert_cozy_castling_to_uci(mv, &board)))
            .collect())
    }

    fn apply(&self, position: &Position, mv: Move) -> Result<Position, RulesError> {
        let mut board = to_board(position)?;
        let cozy_mv = to_legal_cozy(&board, position, mv)?;
        board.play_unchecked(cozy_mv);
        Position::parse_unvalidated(&board.to_string())
            .map_err(|e| RulesError::UnplayablePosition(e.to_string()))
    }

    fn to_san(&self, position: &Position, mv: Move) -> Result<String, RulesError> {
        let board = to_board(position)?;
        let cozy_mv = to_legal_cozy(&board, position, mv)?;
        Ok(generate_san(&board, cozy_mv, &cozy_legal_moves(&board)))
    }

    fn parse_san(&self, position: &Position, san: &str) -> Result<Move, RulesError> {
        let board = to_board(position)?;
        let wanted = normalize_san(san);
        let legal = cozy_legal_moves(&board);

        let mut matches = legal
            .iter()
            .filter(|mv| normalize_san(&generate_san(&board, **mv, &legal)) == wanted);

        match (matches.next(), matches.next()) {
            (Some(mv), None) => Ok(from_cozy(convert_cozy_castling_to_uci(*mv, &board))),
            (Some(_), Some(_)) => Err(RulesError::AmbiguousSan(san.to_string())),
            (None, _) => Err(RulesError::UnknownSan(san.to_string())),
        }
    }
}

fn to_board(position: &Position) -> Result<Board, RulesError> {
    Board::from_fen(&position.to_string(), false)
        .map_err(|e| RulesError::UnplayablePosition(format!("{:?}", e)))
}

fn cozy_legal_moves(board: &Board) -> Vec<cozy_chess::Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}

fn to_cozy(mv: Move) -> cozy_chess::Move {
    cozy_chess::Move {
        from: mv.from.into(),
        to: mv.to.into(),
        promotion: mv.promotion.map(Into::into),
    }
}

fn from_cozy(mv: cozy_chess::Move) -> Move {
    Move {
        from: mv.from.into(),
        to: mv.to.into(),
        promotion: mv.promotion.map(Into::into),
    }
}

fn to_legal_cozy(
    board: &Board,
    position: &Position,
    mv: Move,
) -> Result<cozy_chess::Move, RulesError> {
    let legal = cozy_legal_moves(board);
    let cozy_mv = convert_uci_castling_to_cozy(to_cozy(mv), board, &legal);
    if legal.contains(&cozy_mv) {
        Ok(cozy_mv)
    } else {
        Err(RulesError::IllegalMove {
            mv: mv.to_uci(),
            fen: position.to_string(),
        })
    }
}

/// Generate SAN for a legal move (cozy castling form accepted).
fn generate_san(board: &Board, mv: cozy_chess::Move, legal: &[cozy_chess::Move]) -> String {
    let side = board.side_to_move();
    let piece = board.piece_on(mv.from).unwrap_or(Piece::Pawn);
    let mut san = String::new();

    if piece == Piece::King && board.color_on(mv.to) == Some(side) {
        if mv.to.file() as u8 > mv.from.file() as u8 {
            san.push_str("O-O");
        } else {
            san.push_str("O-O-O");
        }
    } else {
        let is_capture = board.color_on(mv.to) == Some(opponent(side))
            || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

        match piece {
            Piece::Pawn => {
                if is_capture {
                    san.push(format_file(mv.from.file()));
                }
            }
            _ => {
                san.push(format_piece_upper(piece));
                push_disambiguation(&mut san, board, mv, piece, legal);
            }
        }

        if is_capture {
            san.push('x');
        }
        san.push(format_file(mv.to.file()));
        san.push(format_rank(mv.to.rank()));

        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(format_piece_upper(promo));
        }
    }

    let mut after = board.clone();
    after.play_unchecked(mv);
    if after.status() == GameStatus::Won {
        san.push('#');
    } else if !after.checkers().is_empty() {
        san.push('+');
    }

    san
}

fn push_disambiguation(
    san: &mut String,
    board: &Board,
    mv: cozy_chess::Move,
    piece: Piece,
    legal: &[cozy_chess::Move],
) {
    let rivals: Vec<cozy_chess::Square> = legal
        .iter()
        .filter(|o| o.to == mv.to && o.from != mv.from && board.piece_on(o.from) == Some(piece))
        .map(|o| o.from)
        .collect();
    if rivals.is_empty() {
        return;
    }

    let shares_file = rivals.iter().any(|sq| sq.file() == mv.from.file());
    let shares_rank = rivals.iter().any(|sq| sq.rank() == mv.from.rank());
    if !shares_file {
        san.push(format_file(mv.from.file()));
    } else if !shares_rank {
        san.push(format_rank(mv.from.rank()));
    } else {
        san.push(format_file(mv.from.file()));
        san.push(format_rank(mv.from.rank()));
    }
}

fn normalize_san(san: &str) -> String {
    san.trim()
        .trim_end_matches(['+', '#', '!', '?'])
        .replace('0', "O")
}

fn opponent(color: Color) -> Color {
    match color {
        Color::White => Color::Black,
        Color::Black => Color::White,
    }
}
