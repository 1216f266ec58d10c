use std::collections::{BTreeMap, HashSet};

use crate::geometry::{in_bounds, step_toward};
use crate::types::{BoardSize, Entity, EntityType, Position};

// `entity_at` must describe the board after the player's move. Two pursuers
// never claim the same square in one resolution: the later one in `enemies`
// order waits.
pub fn resolve_enemy_moves<F>(
    enemies: &[Entity],
    player_position: Position,
    board: BoardSize,
    entity_at: F,
) -> BTreeMap<String, Position>
where
    F: Fn(Position) -> Option<EntityType>,
{
    let mut moves = BTreeMap::new();
    let mut claimed: HashSet<Position> = HashSet::new();

    for enemy in enemies {
        let next = if enemy.entity_type.is_pursuer() {
            pursue(enemy.position, player_position, board, &entity_at, &claimed)
        } else {
            enemy.position
        };
        if next != enemy.position {
            claimed.insert(next);
        }
        moves.insert(enemy.id.clone(), next);
    }
    moves
}

fn pursue<F>(
    from: Position,
    player_position: Position,
    board: BoardSize,
    entity_at: &F,
    claimed: &HashSet<Position>,
) -> Position
where
    F: Fn(Position) -> Option<EntityType>,
{
    if !in_bounds(from, board) {
        return from;
    }
    let Some(candidate) = step_toward(from, player_position) else {
        return from;
    };
    if !in_bounds(candidate, board) {
        return from;
    }
    if candidate == player_position {
        return candidate;
    }
    if claimed.contains(&candidate) {
        return from;
    }
    match entity_at(candidate) {
        None | Some(EntityType::Player) => candidate,
        Some(_) => from,
    }
}

pub fn check_player_captured(player_position: Position, enemies: &[Entity]) -> bool {
    enemies
        .iter()
        .any(|enemy| enemy.position == player_position)
}
