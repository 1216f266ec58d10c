use crate::types::{BoardSize, Position};

pub fn in_bounds(pos: Position, board: BoardSize) -> bool {
    !board.is_empty() && board.contains(pos)
}

/// Unit step along a straight (orthogonal or diagonal) line, or `None` when
/// the delta is zero or not a straight line.
pub fn line_step(dx: i32, dy: i32) -> Option<(i32, i32)> {
    if dx == 0 && dy == 0 {
        return None;
    }
    if dx != 0 && dy != 0 && dx.unsigned_abs() != dy.unsigned_abs() {
        return None;
    }
    Some((dx.signum(), dy.signum()))
}

/// Squares strictly between `from` and `to` on a straight line. Empty for
/// adjacent squares and for deltas that are not straight lines.
pub fn squares_between(from: Position, to: Position) -> Vec<Position> {
    let (dx, dy) = from.delta_to(to);
    let Some((sx, sy)) = line_step(dx, dy) else {
        return Vec::new();
    };
    let steps = dx.saturating_abs().max(dy.saturating_abs());
    (1..steps).map(|i| from.offset(sx * i, sy * i)).collect()
}

/// One orthogonal step from `from` toward `target`. Horizontal wins when both
/// axes differ; `None` when already on the target.
pub fn step_toward(from: Position, target: Position) -> Option<Position> {
    let (dx, dy) = from.delta_to(target);
    if dx != 0 {
        return Some(from.offset(dx.signum(), 0));
    }
    if dy != 0 {
        return Some(from.offset(0, dy.signum()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squares_between_walks_straight_lines_only() {
        assert_eq!(
            squares_between(Position::new(0, 0), Position::new(3, 0)),
            vec![Position::new(1, 0), Position::new(2, 0)]
        );
        assert_eq!(
            squares_between(Position::new(4, 4), Position::new(1, 1)),
            vec![Position::new(3, 3), Position::new(2, 2)]
        );
        assert!(squares_between(Position::new(0, 0), Position::new(1, 1)).is_empty());
        assert!(squares_between(Position::new(0, 0), Position::new(1, 2)).is_empty());
        assert!(squares_between(Position::new(2, 2), Position::new(2, 2)).is_empty());
    }

    #[test]
    fn step_toward_prefers_horizontal_axis() {
        assert_eq!(
            step_toward(Position::new(1, 1), Position::new(3, 4)),
            Some(Position::new(2, 1))
        );
        assert_eq!(
            step_toward(Position::new(3, 4), Position::new(3, 1)),
            Some(Position::new(3, 3))
        );
        assert_eq!(step_toward(Position::new(2, 2), Position::new(2, 2)), None);
    }

    #[test]
    fn empty_board_contains_nothing() {
        assert!(!in_bounds(Position::new(0, 0), BoardSize::new(0, 3)));
        assert!(in_bounds(Position::new(0, 0), BoardSize::new(1, 1)));
    }
}
