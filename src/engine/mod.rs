pub mod augmented;
pub mod board;
pub mod control;
pub mod fen;
pub mod game;
pub mod movegen;
pub mod piece;
pub mod piece_list;
pub mod types;

pub use augmented::AugmentedBoard;
pub use control::ControlMap;
pub use game::{ChessGame, GameStateRepresentation, MoveRecord, PieceInfo};
pub use movegen::MoveGenerator;
pub use piece::Piece;
pub use types::*;
