use crate::types::PieceType;

/// Furthest a sliding piece may travel in one move.
pub const MAX_SLIDE_DISTANCE: i32 = 7;

/// Largest board side a catalog accepts; a slide can always cross it.
pub const MAX_BOARD_SIDE: i32 = MAX_SLIDE_DISTANCE + 1;

pub const PLAYER_ENTITY_ID: &str = "player";
pub const EXIT_ENTITY_ID: &str = "exit";

pub const LEVEL_PACK_VERSION: u8 = 1;
pub const LEVEL_PACK_ENV: &str = "CHESS_QUEST_LEVELS";

pub const SOLVER_MAX_DEPTH: usize = 64;
pub const SOLVER_MAX_STATES: usize = 200_000;

pub const DEFAULT_PLAYOUTS: usize = 32;
pub const DEFAULT_PLAYOUT_MAX_MOVES: usize = 48;

pub fn is_sliding_piece(piece_type: PieceType) -> bool {
    matches!(
        piece_type,
        PieceType::Rook | PieceType::Bishop | PieceType::Queen
    )
}

pub fn piece_display_name(piece_type: PieceType) -> &'static str {
    match piece_type {
        PieceType::Pawn => "Pawn",
        PieceType::Knight => "Knight",
        PieceType::Rook => "Rook",
        PieceType::Bishop => "Bishop",
        PieceType::Queen => "Queen",
        PieceType::King => "King",
    }
}
