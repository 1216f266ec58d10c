use std::sync::LazyLock;

use crate::constants::{is_sliding_piece, MAX_SLIDE_DISTANCE};
use crate::geometry::{in_bounds, squares_between};
use crate::types::{BoardSize, MoveRule, PieceType, Position};

const PAWN_MOVES: [MoveRule; 4] = [
    MoveRule::step(0, -1),
    MoveRule::capture(-1, -1),
    MoveRule::capture(1, -1),
    MoveRule::opener(0, -2),
];

const KNIGHT_MOVES: [MoveRule; 8] = [
    MoveRule::step(2, 1),
    MoveRule::step(2, -1),
    MoveRule::step(-2, 1),
    MoveRule::step(-2, -1),
    MoveRule::step(1, 2),
    MoveRule::step(1, -2),
    MoveRule::step(-1, 2),
    MoveRule::step(-1, -2),
];

// up, down, left, right
const ORTHOGONAL_DIRECTIONS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
// up-left, up-right, down-left, down-right
const DIAGONAL_DIRECTIONS: [(i32, i32); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

const KING_MOVES: [MoveRule; 8] = [
    MoveRule::step(0, -1),
    MoveRule::step(0, 1),
    MoveRule::step(-1, 0),
    MoveRule::step(1, 0),
    MoveRule::step(-1, -1),
    MoveRule::step(1, -1),
    MoveRule::step(-1, 1),
    MoveRule::step(1, 1),
];

static ROOK_MOVES: LazyLock<Vec<MoveRule>> =
    LazyLock::new(|| expand_directions(&ORTHOGONAL_DIRECTIONS));
static BISHOP_MOVES: LazyLock<Vec<MoveRule>> =
    LazyLock::new(|| expand_directions(&DIAGONAL_DIRECTIONS));
static QUEEN_MOVES: LazyLock<Vec<MoveRule>> = LazyLock::new(|| {
    let mut moves = expand_directions(&ORTHOGONAL_DIRECTIONS);
    moves.extend(expand_directions(&DIAGONAL_DIRECTIONS));
    moves
});

fn expand_directions(directions: &[(i32, i32)]) -> Vec<MoveRule> {
    directions
        .iter()
        .flat_map(|&(dx, dy)| {
            (1..=MAX_SLIDE_DISTANCE).map(move |distance| MoveRule::step(dx * distance, dy * distance))
        })
        .collect()
}

pub fn moves_for(piece_type: PieceType) -> &'static [MoveRule] {
    match piece_type {
        PieceType::Pawn => &PAWN_MOVES,
        PieceType::Knight => &KNIGHT_MOVES,
        PieceType::Rook => ROOK_MOVES.as_slice(),
        PieceType::Bishop => BISHOP_MOVES.as_slice(),
        PieceType::Queen => QUEEN_MOVES.as_slice(),
        PieceType::King => &KING_MOVES,
    }
}

pub fn matching_rule(from: Position, to: Position, piece_type: PieceType) -> Option<MoveRule> {
    let (dx, dy) = from.delta_to(to);
    moves_for(piece_type)
        .iter()
        .copied()
        .find(|rule| rule.dx == dx && rule.dy == dy)
}

pub fn has_clear_path<F>(from: Position, to: Position, has_enemy_at: F) -> bool
where
    F: Fn(Position) -> bool,
{
    squares_between(from, to)
        .into_iter()
        .all(|square| !has_enemy_at(square))
}

pub fn is_legal<F>(
    from: Position,
    to: Position,
    piece_type: PieceType,
    board: BoardSize,
    has_enemy_at: F,
    is_first_move: bool,
) -> bool
where
    F: Fn(Position) -> bool,
{
    if !in_bounds(from, board) || !in_bounds(to, board) {
        return false;
    }
    let Some(rule) = matching_rule(from, to, piece_type) else {
        return false;
    };
    if rule.first_move_only && !is_first_move {
        return false;
    }

    if is_sliding_piece(piece_type) {
        return has_clear_path(from, to, &has_enemy_at);
    }

    match piece_type {
        PieceType::Pawn => {
            if rule.can_capture {
                return has_enemy_at(to);
            }
            if rule.first_move_only && !has_clear_path(from, to, &has_enemy_at) {
                return false;
            }
            !has_enemy_at(to)
        }
        // Leapers land on empty squares and enemies alike.
        _ => true,
    }
}

pub fn valid_destinations<F>(
    from: Position,
    piece_type: PieceType,
    board: BoardSize,
    has_enemy_at: F,
    is_first_move: bool,
) -> Vec<Position>
where
    F: Fn(Position) -> bool,
{
    if !in_bounds(from, board) {
        return Vec::new();
    }
    moves_for(piece_type)
        .iter()
        .map(|rule| from.offset(rule.dx, rule.dy))
        .filter(|&to| is_legal(from, to, piece_type, board, &has_enemy_at, is_first_move))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_enemies(_: Position) -> bool {
        false
    }

    fn enemy_at(target: Position) -> impl Fn(Position) -> bool {
        move |pos| pos == target
    }

    #[test]
    fn tables_have_fixed_sizes() {
        assert_eq!(moves_for(PieceType::Pawn).len(), 4);
        assert_eq!(moves_for(PieceType::Knight).len(), 8);
        assert_eq!(moves_for(PieceType::Rook).len(), 28);
        assert_eq!(moves_for(PieceType::Bishop).len(), 28);
        assert_eq!(moves_for(PieceType::Queen).len(), 56);
        assert_eq!(moves_for(PieceType::King).len(), 8);
    }

    #[test]
    fn knight_offsets_are_l_shapes() {
        for rule in moves_for(PieceType::Knight) {
            let (ax, ay) = (rule.dx.abs(), rule.dy.abs());
            assert!((ax, ay) == (1, 2) || (ax, ay) == (2, 1), "{rule:?}");
            assert!(!rule.can_capture && !rule.first_move_only);
        }
    }

    #[test]
    fn pawn_table_has_forward_captures_and_opener() {
        let pawn = moves_for(PieceType::Pawn);
        assert_eq!(pawn[0], MoveRule::step(0, -1));
        assert_eq!(pawn[1], MoveRule::capture(-1, -1));
        assert_eq!(pawn[2], MoveRule::capture(1, -1));
        assert_eq!(pawn[3], MoveRule::opener(0, -2));
    }

    #[test]
    fn zero_delta_is_never_legal() {
        let board = BoardSize::new(5, 4);
        for piece_type in PieceType::ALL {
            for y in 0..board.height {
                for x in 0..board.width {
                    let pos = Position::new(x, y);
                    assert!(!is_legal(pos, pos, piece_type, board, no_enemies, true));
                    assert!(!is_legal(pos, pos, piece_type, board, |_| true, false));
                }
            }
        }
    }

    #[test]
    fn destinations_stay_on_the_board() {
        let board = BoardSize::new(5, 4);
        for piece_type in PieceType::ALL {
            for y in 0..board.height {
                for x in 0..board.width {
                    let from = Position::new(x, y);
                    for first in [true, false] {
                        for to in valid_destinations(from, piece_type, board, |_| true, first) {
                            assert!(board.contains(to), "{piece_type:?} {from} -> {to}");
                        }
                        for to in valid_destinations(from, piece_type, board, no_enemies, first) {
                            assert!(board.contains(to), "{piece_type:?} {from} -> {to}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn out_of_bounds_destination_is_rejected_not_clamped() {
        let board = BoardSize::new(4, 4);
        assert!(!is_legal(
            Position::new(0, 0),
            Position::new(0, -1),
            PieceType::Rook,
            board,
            no_enemies,
            false
        ));
        assert!(!is_legal(
            Position::new(-1, 0),
            Position::new(0, 0),
            PieceType::Rook,
            board,
            no_enemies,
            false
        ));
    }

    #[test]
    fn sliding_piece_is_blocked_by_any_enemy_on_the_line() {
        let board = BoardSize::new(8, 8);
        let from = Position::new(0, 7);
        let to = Position::new(5, 7);
        assert!(is_legal(from, to, PieceType::Rook, board, no_enemies, false));
        for x in 1..5 {
            let blocker = Position::new(x, 7);
            assert!(
                !is_legal(from, to, PieceType::Rook, board, enemy_at(blocker), false),
                "blocker at {blocker}"
            );
            assert!(!is_legal(from, to, PieceType::Queen, board, enemy_at(blocker), false));
        }
        // capture by landing
        assert!(is_legal(from, to, PieceType::Rook, board, enemy_at(to), false));

        let diag_to = Position::new(4, 3);
        for i in 1..4 {
            let blocker = Position::new(i, 7 - i);
            assert!(!is_legal(from, diag_to, PieceType::Bishop, board, enemy_at(blocker), false));
        }
        assert!(is_legal(from, diag_to, PieceType::Bishop, board, no_enemies, false));
    }

    #[test]
    fn sliding_piece_ignores_non_matching_offsets() {
        let board = BoardSize::new(8, 8);
        assert!(!is_legal(
            Position::new(0, 0),
            Position::new(1, 2),
            PieceType::Queen,
            board,
            no_enemies,
            false
        ));
        assert!(!is_legal(
            Position::new(0, 0),
            Position::new(1, 1),
            PieceType::Rook,
            board,
            no_enemies,
            false
        ));
        assert!(!is_legal(
            Position::new(0, 0),
            Position::new(2, 0),
            PieceType::Bishop,
            board,
            no_enemies,
            false
        ));
    }

    #[test]
    fn pawn_diagonal_requires_enemy_and_forward_requires_empty() {
        let board = BoardSize::new(4, 4);
        let from = Position::new(2, 2);
        for diag in [Position::new(1, 1), Position::new(3, 1)] {
            assert!(!is_legal(from, diag, PieceType::Pawn, board, no_enemies, false));
            assert!(is_legal(from, diag, PieceType::Pawn, board, enemy_at(diag), false));
        }
        let forward = Position::new(2, 1);
        assert!(is_legal(from, forward, PieceType::Pawn, board, no_enemies, false));
        assert!(!is_legal(from, forward, PieceType::Pawn, board, enemy_at(forward), false));
        // never backwards
        assert!(!is_legal(from, Position::new(2, 3), PieceType::Pawn, board, no_enemies, false));
    }

    #[test]
    fn pawn_double_step_only_on_first_move_and_cannot_jump() {
        let board = BoardSize::new(4, 4);
        let from = Position::new(1, 3);
        let to = Position::new(1, 1);
        assert!(is_legal(from, to, PieceType::Pawn, board, no_enemies, true));
        assert!(!is_legal(from, to, PieceType::Pawn, board, no_enemies, false));
        assert!(!is_legal(from, to, PieceType::Pawn, board, enemy_at(Position::new(1, 2)), true));
        assert!(!is_legal(from, to, PieceType::Pawn, board, enemy_at(to), true));
    }

    #[test]
    fn knight_and_king_land_on_enemies_or_empty_squares() {
        let board = BoardSize::new(5, 5);
        let knight = Position::new(2, 3);
        let slime = Position::new(2, 2);
        assert!(is_legal(knight, Position::new(4, 4), PieceType::Knight, board, enemy_at(slime), false));
        assert!(!is_legal(knight, Position::new(3, 4), PieceType::Knight, board, enemy_at(slime), false));
        assert!(is_legal(Position::new(0, 1), slime, PieceType::Knight, board, enemy_at(slime), false));

        assert!(is_legal(Position::new(2, 3), slime, PieceType::King, board, enemy_at(slime), false));
        assert!(is_legal(Position::new(2, 3), Position::new(3, 4), PieceType::King, board, no_enemies, false));
        assert!(!is_legal(Position::new(2, 3), Position::new(2, 1), PieceType::King, board, no_enemies, false));
    }

    #[test]
    fn destinations_near_the_integer_limit_stay_on_the_board() {
        let board = BoardSize::new(i32::MAX, i32::MAX);
        let corner = Position::new(i32::MAX - 1, i32::MAX - 1);
        for piece_type in PieceType::ALL {
            for to in valid_destinations(corner, piece_type, board, no_enemies, true) {
                assert!(board.contains(to), "{piece_type:?} -> {to}");
            }
        }
        assert!(!is_legal(
            Position::new(0, 0),
            Position::new(i32::MAX - 1, 0),
            PieceType::Rook,
            board,
            no_enemies,
            false
        ));
    }

    #[test]
    fn destinations_follow_table_order() {
        let board = BoardSize::new(3, 3);
        let got = valid_destinations(Position::new(1, 1), PieceType::Rook, board, no_enemies, false);
        assert_eq!(
            got,
            vec![
                Position::new(1, 0),
                Position::new(1, 2),
                Position::new(0, 1),
                Position::new(2, 1),
            ]
        );

        let pawn = valid_destinations(
            Position::new(1, 3),
            PieceType::Pawn,
            BoardSize::new(4, 4),
            enemy_at(Position::new(2, 2)),
            true,
        );
        assert_eq!(
            pawn,
            vec![Position::new(1, 2), Position::new(2, 2), Position::new(1, 1)]
        );
    }

    #[test]
    fn destinations_are_repeatable() {
        let board = BoardSize::new(6, 5);
        let enemy = enemy_at(Position::new(3, 2));
        let first = valid_destinations(Position::new(1, 4), PieceType::Queen, board, &enemy, false);
        let second = valid_destinations(Position::new(1, 4), PieceType::Queen, board, &enemy, false);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn pawn_capture_path_reaches_exit() {
        let board = BoardSize::new(4, 4);
        let start = Position::new(1, 3);
        let slime = Position::new(2, 2);
        let exit = Position::new(2, 0);

        assert!(is_legal(start, slime, PieceType::Pawn, board, enemy_at(slime), false));
        assert!(!is_legal(start, exit, PieceType::Pawn, board, enemy_at(slime), false));
        // slime captured
        let step = Position::new(2, 1);
        assert!(is_legal(slime, step, PieceType::Pawn, board, no_enemies, false));
        assert!(is_legal(step, exit, PieceType::Pawn, board, no_enemies, false));
    }
}
