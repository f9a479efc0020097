//! Castling comes in two encodings: engines and humans move the king two
//! squares (e1g1), `cozy-chess` has the king capture its own rook (e1h1).

use cozy_chess::{Board, File, Move, Piece, Square};

/// Rewrite a king-two-squares castle into `cozy-chess` form.
///
/// Only a king standing on its e-file home square, moving two files along
/// its rank, is rewritten, and only when the rewritten move is in
/// `legal_moves`. Everything else is returned unchanged.
pub fn convert_uci_castling_to_cozy(mv: Move, board: &Board, legal_moves: &[Move]) -> Move {
    let side = board.side_to_move();
    let king_moves =
        board.piece_on(mv.from) == Some(Piece::King) && board.color_on(mv.from) == Some(side);
    let two_files = mv.from.file() == File::E
        && matches!(mv.to.file(), File::G | File::C)
        && mv.to.rank() == mv.from.rank();

    if !king_moves || !two_files || mv.promotion.is_some() {
        return mv;
    }

    let rook_file = if mv.to.file() == File::G {
        File::H
    } else {
        File::A
    };
    let converted = Move {
        from: mv.from,
        to: Square::new(rook_file, mv.from.rank()),
        promotion: None,
    };

    if legal_moves.contains(&converted) {
        converted
    } else {
        mv
    }
}

/// Rewrite a `cozy-chess` castle (king takes own rook) into the
/// king-two-squares form. Other moves pass through.
pub fn convert_cozy_castling_to_uci(mv: Move, board: &Board) -> Move {
    let side = board.side_to_move();
    let is_king = board.piece_on(mv.from) == Some(Piece::King);
    let onto_own_rook =
        board.piece_on(mv.to) == Some(Piece::Rook) && board.color_on(mv.to) == Some(side);

    if !(is_king && onto_own_rook) {
        return mv;
    }

    let king_file = if mv.to.file() as u8 > mv.from.file() as u8 {
        File::G
    } else {
        File::C
    };

    Move {
        from: mv.from,
        to: Square::new(king_file, mv.from.rank()),
        promotion: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legal(board: &Board) -> Vec<Move> {
        let mut moves = Vec::new();
        board.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    fn mv(from: Square, to: Square) -> Move {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    #[test]
    fn castling_converts_both_ways() {
        let board: Board = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();
        let moves = legal(&board);

        let short = mv(Square::E1, Square::G1);
        let cozy = convert_uci_castling_to_cozy(short, &board, &moves);
        assert_eq!(cozy, mv(Square::E1, Square::H1));
        assert_eq!(convert_cozy_castling_to_uci(cozy, &board), short);

        let long = mv(Square::E1, Square::C1);
        let cozy = convert_uci_castling_to_cozy(long, &board, &moves);
        assert_eq!(cozy, mv(Square::E1, Square::A1));
        assert_eq!(convert_cozy_castling_to_uci(cozy, &board), long);
    }

    #[test]
    fn rook_on_the_king_file_is_not_castling() {
        let board: Board = "2k5/8/8/8/8/8/8/2K1R3 w - - 0 1".parse().unwrap();
        let moves = legal(&board);
        let rook_slide = mv(Square::E1, Square::G1);
        assert!(moves.contains(&rook_slide));
        assert!(moves.contains(&mv(Square::E1, Square::H1)));
        assert_eq!(convert_uci_castling_to_cozy(rook_slide, &board, &moves), rook_slide);
        assert_eq!(convert_cozy_castling_to_uci(rook_slide, &board), rook_slide);
    }

    #[test]
    fn ordinary_king_move_is_untouched() {
        let board: Board = "4k3/8/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let step = mv(Square::E1, Square::F1);
        assert_eq!(convert_uci_castling_to_cozy(step, &board, &legal(&board)), step);
        assert_eq!(convert_cozy_castling_to_uci(step, &board), step);
    }
}
