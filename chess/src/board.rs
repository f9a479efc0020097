//! 64-cell piece placement, the working form for every board edit.
//!
//! The compressed run-length text ("rnbqkbnr/pppppppp/8/...") only exists at
//! the boundary: [`Board::from_placement`] expands it and
//! [`Board::to_placement`] compresses it again.

use smallvec::SmallVec;

use crate::position::PositionError;
use crate::types::{Piece, PieceColor, PieceKind, Square};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Option<Piece>; 64],
}

impl Board {
    pub fn empty() -> Self {
        Self { cells: [None; 64] }
    }

    pub fn starting() -> Self {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        let mut cells = [None; 64];
        for (file, kind) in BACK_RANK.into_iter().enumerate() {
            cells[file] = Some(Piece::new(kind, PieceColor::White));
            cells[8 + file] = Some(Piece::new(PieceKind::Pawn, PieceColor::White));
            cells[48 + file] = Some(Piece::new(PieceKind::Pawn, PieceColor::Black));
            cells[56 + file] = Some(Piece::new(kind, PieceColor::Black));
        }
        Self { cells }
    }

    /// Expand the placement field of a position literal.
    ///
    /// Ranks are listed from the eighth down to the first. Every rank must
    /// expand to exactly eight cells.
    pub fn from_placement(placement: &str) -> Result<Self, PositionError> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(PositionError::WrongRankCount(ranks.len()));
        }

        let mut cells = [None; 64];
        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx as u8;
            let mut file = 0usize;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(PositionError::InvalidPiece(c));
                    }
                    file += skip as usize;
                } else {
                    let piece = Piece::from_fen_char(c).ok_or(PositionError::InvalidPiece(c))?;
                    if file < 8 {
                        cells[rank as usize * 8 + file] = Some(piece);
                    }
                    file += 1;
                }
            }
            if file != 8 {
                return Err(PositionError::WrongSquareCount {
                    rank: rank + 1,
                    count: file,
                });
            }
        }

        Ok(Self { cells })
    }

    /// Compress back to placement text, run-length encoding empty cells.
    pub fn to_placement(&self) -> String {
        let mut out = String::with_capacity(72);
        for rank in (0..8u8).rev() {
            let mut empty = 0u8;
            for file in 0..8u8 {
                match self.cells[(rank * 8 + file) as usize] {
                    Some(piece) => {
                        if empty > 0 {
                            out.push((b'0' + empty) as char);
                            empty = 0;
                        }
                        out.push(piece.to_fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push((b'0' + empty) as char);
            }
            if rank > 0 {
                out.push('/');
            }
        }
        out
    }

    pub fn piece_on(&self, square: Square) -> Option<Piece> {
        self.cells[square.index()]
    }

    pub fn piece_at(&self, file: u8, rank: u8) -> Option<Piece> {
        Square::new(file, rank).and_then(|sq| self.piece_on(sq))
    }

    /// Put `piece` on `square` (or clear it), returning what was there.
    pub fn set(&mut self, square: Square, piece: Option<Piece>) -> Option<Piece> {
        std::mem::replace(&mut self.cells[square.index()], piece)
    }

    pub fn occupied(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_on(sq).map(|p| (sq, p)))
    }

    pub fn count(&self, kind: PieceKind, color: PieceColor) -> usize {
        let target = Piece::new(kind, color);
        self.cells.iter().filter(|c| **c == Some(target)).count()
    }

    pub fn count_color(&self, color: PieceColor) -> usize {
        self.cells
            .iter()
            .filter(|c| c.map(|p| p.color) == Some(color))
            .count()
    }

    pub fn kings(&self, color: PieceColor) -> SmallVec<[Square; 2]> {
        let king = Some(Piece::new(PieceKind::King, color));
        Square::all().filter(|sq| self.piece_on(*sq) == king).collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

    #[test]
    fn test_starting_position() {
        let board = Board::from_placement(START).unwrap();
        assert_eq!(
            board.piece_at(0, 0),
            Some(Piece::new(PieceKind::Rook, PieceColor::White))
        );
        assert_eq!(
            board.piece_at(4, 0),
            Some(Piece::new(PieceKind::King, PieceColor::White))
        );
        assert_eq!(
            board.piece_at(3, 7),
            Some(Piece::new(PieceKind::Queen, PieceColor::Black))
        );
        assert_eq!(board.piece_at(4, 4), None);
        assert_eq!(board.to_placement(), START);
        assert_eq!(board, Board::starting());
    }

    #[test]
    fn test_empty_board() {
        let board = Board::from_placement("8/8/8/8/8/8/8/8").unwrap();
        assert_eq!(board.occupied().count(), 0);
        assert_eq!(board.to_placement(), "8/8/8/8/8/8/8/8");
    }

    #[test]
    fn rank_count_is_checked() {
        assert_eq!(
            Board::from_placement("8/8/8/8/8/8/8"),
            Err(PositionError::WrongRankCount(7))
        );
        assert_eq!(
            Board::from_placement("8/8/8/8/8/8/8/8/8"),
            Err(PositionError::WrongRankCount(9))
        );
    }

    #[test]
    fn square_count_is_checked_per_rank() {
        assert_eq!(
            Board::from_placement("rnbqkbnr/ppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"),
            Err(PositionError::WrongSquareCount { rank: 7, count: 7 })
        );
        assert_eq!(
            Board::from_placement("8/8/8/8/8/8/8/44P"),
            Err(PositionError::WrongSquareCount { rank: 1, count: 9 })
        );
    }

    #[test]
    fn bad_symbols_are_reported() {
        assert_eq!(
            Board::from_placement("8/8/8/8/8/8/8/7X"),
            Err(PositionError::InvalidPiece('X'))
        );
        assert_eq!(
            Board::from_placement("8/8/8/8/8/8/8/09"),
            Err(PositionError::InvalidPiece('0'))
        );
    }

    #[test]
    fn edits_recompress() {
        let mut board = Board::from_placement(START).unwrap();
        let e2: Square = "e2".parse().unwrap();
        let e4: Square = "e4".parse().unwrap();
        let pawn = board.set(e2, None);
        board.set(e4, pawn);
        assert_eq!(
            board.to_placement(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR"
        );
    }

    #[test]
    fn counts_and_kings() {
        let board = Board::from_placement("4k3/8/8/8/8/8/PP6/K3K3").unwrap();
        assert_eq!(board.kings(PieceColor::White).len(), 2);
        assert_eq!(board.kings(PieceColor::Black).len(), 1);
        assert_eq!(board.count(PieceKind::Pawn, PieceColor::White), 2);
        assert_eq!(board.count_color(PieceColor::White), 4);
    }
}
