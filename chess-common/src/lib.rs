//! Notation helpers over `cozy-chess` types for the rules layer: SAN letters
//! and the two castling encodings.

mod castling;
mod notation;

pub use castling::{convert_cozy_castling_to_uci, convert_uci_castling_to_cozy};
pub use notation::{format_file, format_piece_upper, format_rank};
