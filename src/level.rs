use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{EXIT_ENTITY_ID, PLAYER_ENTITY_ID};
use crate::geometry::in_bounds;
use crate::types::{BoardSize, EnemyKind, Entity, EntityType, LevelObjective, PieceType, Position};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStart {
    pub position: Position,
    #[serde(rename = "pieceType")]
    pub piece_type: PieceType,
    #[serde(rename = "canDoublePawnMove", default = "default_true")]
    pub can_double_pawn_move: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySpec {
    #[serde(rename = "type")]
    pub kind: EnemyKind,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DangerSquare {
    pub position: Position,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterIntro {
    pub piece: PieceType,
    pub name: String,
    pub greeting: String,
    pub ability: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelMeta {
    #[serde(rename = "tutorialText", default, skip_serializing_if = "Option::is_none")]
    pub tutorial_text: Option<String>,
    #[serde(rename = "characterIntro", default, skip_serializing_if = "Option::is_none")]
    pub character_intro: Option<CharacterIntro>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "worldId")]
    pub world_id: String,
    #[serde(rename = "levelNumber")]
    pub level_number: u32,
    #[serde(rename = "boardSize")]
    pub board_size: BoardSize,
    pub player: PlayerStart,
    #[serde(default)]
    pub objectives: Vec<LevelObjective>,
    #[serde(default)]
    pub coins: Vec<Position>,
    #[serde(default)]
    pub treasures: Vec<Position>,
    #[serde(default)]
    pub friends: Vec<Position>,
    pub exit: Position,
    #[serde(rename = "exitLocked", default)]
    pub exit_locked: bool,
    #[serde(default)]
    pub enemies: Vec<EnemySpec>,
    #[serde(rename = "dangerSquares", default)]
    pub danger_squares: Vec<DangerSquare>,
    #[serde(flatten)]
    pub meta: LevelMeta,
}

impl Level {
    pub fn total_collectibles(&self) -> u32 {
        let total = self.coins.len() + self.treasures.len() + self.friends.len();
        u32::try_from(total).unwrap_or(u32::MAX)
    }

    pub fn collectibles(&self) -> impl Iterator<Item = (EntityType, Position)> + '_ {
        let coins = self.coins.iter().map(|pos| (EntityType::Coin, *pos));
        let treasures = self.treasures.iter().map(|pos| (EntityType::Treasure, *pos));
        let friends = self.friends.iter().map(|pos| (EntityType::Friend, *pos));
        coins.chain(treasures).chain(friends)
    }

    pub fn instantiate_board(&self) -> Vec<Entity> {
        let mut board = vec![Entity::player(
            PLAYER_ENTITY_ID,
            self.player.position,
            self.player.piece_type,
        )];

        for (index, pos) in self.coins.iter().enumerate() {
            board.push(Entity::new(format!("coin-{index}"), EntityType::Coin, *pos));
        }
        for (index, pos) in self.treasures.iter().enumerate() {
            board.push(Entity::new(format!("treasure-{index}"), EntityType::Treasure, *pos));
        }
        for (index, pos) in self.friends.iter().enumerate() {
            board.push(Entity::new(format!("friend-{index}"), EntityType::Friend, *pos));
        }
        board.push(Entity::new(EXIT_ENTITY_ID, EntityType::Exit, self.exit));
        for (index, enemy) in self.enemies.iter().enumerate() {
            board.push(Entity::new(
                format!("{}-{index}", enemy.kind.id_prefix()),
                enemy.kind.entity_type(),
                enemy.position,
            ));
        }
        for (index, danger) in self.danger_squares.iter().enumerate() {
            board.push(Entity::new(
                format!("danger-{index}"),
                EntityType::Danger,
                danger.position,
            ));
        }
        board
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    #[default]
    Warn,
    Reject,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Overlap {
    pub position: Position,
    pub first: String,
    pub second: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub overlaps: Vec<Overlap>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("invalid board size {width}x{height}")]
    InvalidBoardSize { width: i32, height: i32 },
    #[error("{role} position {position} is outside the {width}x{height} board")]
    OutOfBounds {
        role: String,
        position: Position,
        width: i32,
        height: i32,
    },
    #[error("{first} and {second} overlap at {position}")]
    Overlap {
        position: Position,
        first: String,
        second: String,
    },
}

// Order: board size, player start, exit, coins, treasures, friends, enemies,
// danger squares, then overlaps. The first failure is returned.
pub fn validate(level: &Level, policy: OverlapPolicy) -> Result<ValidationReport, LevelError> {
    let result = check_level(level, policy);
    if let Err(error) = &result {
        tracing::warn!(level_id = %level.id, %error, "level validation failed");
    }
    result
}

pub fn is_valid(level: &Level) -> bool {
    validate(level, OverlapPolicy::Warn).is_ok()
}

fn check_level(level: &Level, policy: OverlapPolicy) -> Result<ValidationReport, LevelError> {
    let board = level.board_size;
    if board.is_empty() {
        return Err(LevelError::InvalidBoardSize {
            width: board.width,
            height: board.height,
        });
    }

    let placed = authored_positions(level);
    for (role, position) in &placed {
        if !in_bounds(*position, board) {
            return Err(LevelError::OutOfBounds {
                role: role.clone(),
                position: *position,
                width: board.width,
                height: board.height,
            });
        }
    }

    let mut report = ValidationReport::default();
    let mut seen: HashMap<Position, &str> = HashMap::new();
    for (role, position) in &placed {
        match seen.get(position) {
            Some(first) => {
                let overlap = Overlap {
                    position: *position,
                    first: first.to_string(),
                    second: role.clone(),
                };
                if policy == OverlapPolicy::Reject {
                    return Err(LevelError::Overlap {
                        position: overlap.position,
                        first: overlap.first,
                        second: overlap.second,
                    });
                }
                tracing::info!(
                    level_id = %level.id,
                    position = %position,
                    first = %overlap.first,
                    second = %overlap.second,
                    "authored positions overlap"
                );
                report.overlaps.push(overlap);
            }
            None => {
                seen.insert(*position, role.as_str());
            }
        }
    }
    Ok(report)
}

fn authored_positions(level: &Level) -> Vec<(String, Position)> {
    let mut placed = vec![
        ("player".to_string(), level.player.position),
        ("exit".to_string(), level.exit),
    ];
    placed.extend(
        level
            .coins
            .iter()
            .enumerate()
            .map(|(i, pos)| (format!("coin {i}"), *pos)),
    );
    placed.extend(
        level
            .treasures
            .iter()
            .enumerate()
            .map(|(i, pos)| (format!("treasure {i}"), *pos)),
    );
    placed.extend(
        level
            .friends
            .iter()
            .enumerate()
            .map(|(i, pos)| (format!("friend {i}"), *pos)),
    );
    placed.extend(
        level
            .enemies
            .iter()
            .enumerate()
            .map(|(i, enemy)| (format!("enemy {i}"), enemy.position)),
    );
    placed.extend(
        level
            .danger_squares
            .iter()
            .enumerate()
            .map(|(i, danger)| (format!("danger {i}"), danger.position)),
    );
    placed
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_level() -> Level {
        Level {
            id: "sample".to_string(),
            name: "Sample".to_string(),
            description: String::new(),
            world_id: "test-world".to_string(),
            level_number: 1,
            board_size: BoardSize::new(4, 4),
            player: PlayerStart {
                position: Position::new(1, 3),
                piece_type: PieceType::Pawn,
                can_double_pawn_move: true,
            },
            objectives: vec![LevelObjective::ReachExit],
            coins: Vec::new(),
            treasures: vec![Position::new(0, 0)],
            friends: Vec::new(),
            exit: Position::new(2, 0),
            exit_locked: false,
            enemies: vec![EnemySpec {
                kind: EnemyKind::Slime,
                position: Position::new(2, 2),
                name: None,
            }],
            danger_squares: Vec::new(),
            meta: LevelMeta::default(),
        }
    }

    #[test]
    fn total_collectibles_counts_every_kind() {
        let mut level = sample_level();
        level.coins = vec![Position::new(0, 1), Position::new(0, 2)];
        level.friends = vec![Position::new(3, 3)];
        assert_eq!(level.total_collectibles(), 4);
        assert_eq!(level.collectibles().count(), 4);
    }

    #[test]
    fn sample_level_is_valid() {
        let report = validate(&sample_level(), OverlapPolicy::Reject).expect("valid level");
        assert!(report.overlaps.is_empty());
        assert!(is_valid(&sample_level()));
    }

    #[test]
    fn rejects_non_positive_board() {
        let mut level = sample_level();
        level.board_size = BoardSize::new(0, 4);
        assert_eq!(
            validate(&level, OverlapPolicy::Warn),
            Err(LevelError::InvalidBoardSize { width: 0, height: 4 })
        );
        level.board_size = BoardSize::new(4, -1);
        assert!(!is_valid(&level));
    }

    #[test]
    fn rejects_out_of_bounds_positions_by_role() {
        let mut level = sample_level();
        level.player.position = Position::new(10, 10);
        assert!(matches!(
            validate(&level, OverlapPolicy::Warn),
            Err(LevelError::OutOfBounds { ref role, .. }) if role == "player"
        ));

        let mut level = sample_level();
        level.exit = Position::new(-1, 0);
        assert!(matches!(
            validate(&level, OverlapPolicy::Warn),
            Err(LevelError::OutOfBounds { ref role, .. }) if role == "exit"
        ));

        let mut level = sample_level();
        level.friends.push(Position::new(4, 0));
        assert!(matches!(
            validate(&level, OverlapPolicy::Warn),
            Err(LevelError::OutOfBounds { ref role, .. }) if role == "friend 0"
        ));

        let mut level = sample_level();
        level.enemies[0].position = Position::new(1, 4);
        assert!(matches!(
            validate(&level, OverlapPolicy::Warn),
            Err(LevelError::OutOfBounds { ref role, .. }) if role == "enemy 0"
        ));

        let mut level = sample_level();
        level.danger_squares.push(DangerSquare {
            position: Position::new(0, 7),
        });
        assert!(matches!(
            validate(&level, OverlapPolicy::Warn),
            Err(LevelError::OutOfBounds { ref role, .. }) if role == "danger 0"
        ));
    }

    #[test]
    fn player_is_checked_before_exit() {
        let mut level = sample_level();
        level.player.position = Position::new(9, 9);
        level.exit = Position::new(9, 9);
        let error = validate(&level, OverlapPolicy::Warn).expect_err("invalid");
        assert!(error.to_string().starts_with("player position"));
    }

    #[test]
    fn overlap_policy_controls_strictness() {
        let mut level = sample_level();
        level.treasures.push(level.exit);

        let report = validate(&level, OverlapPolicy::Warn).expect("warn accepts overlaps");
        assert_eq!(report.overlaps.len(), 1);
        assert_eq!(report.overlaps[0].first, "exit");
        assert_eq!(report.overlaps[0].second, "treasure 1");

        assert_eq!(
            validate(&level, OverlapPolicy::Reject),
            Err(LevelError::Overlap {
                position: Position::new(2, 0),
                first: "exit".to_string(),
                second: "treasure 1".to_string(),
            })
        );
    }

    #[test]
    fn instantiation_copies_positions_and_names_entities() {
        let mut level = sample_level();
        level.danger_squares.push(DangerSquare {
            position: Position::new(3, 1),
        });
        let board = level.instantiate_board();
        let ids: Vec<&str> = board.iter().map(|entity| entity.id.as_str()).collect();
        assert_eq!(ids, vec!["player", "treasure-0", "exit", "slime-0", "danger-0"]);
        assert_eq!(board[0].piece_type, Some(PieceType::Pawn));
        assert_eq!(level.total_collectibles(), 1);

        let mut board = board;
        board[0].position = Position::new(0, 0);
        assert_eq!(level.player.position, Position::new(1, 3));
    }

    #[test]
    fn deserializes_authoring_format() {
        let raw = r#"{
            "id": "json-level",
            "name": "From JSON",
            "worldId": "meadow-tutorial",
            "levelNumber": 3,
            "boardSize": { "width": 4, "height": 4 },
            "player": { "position": { "x": 0, "y": 3 }, "pieceType": "knight" },
            "objectives": ["reach-exit", "collect-treasures"],
            "treasures": [{ "x": 2, "y": 1 }],
            "exit": { "x": 3, "y": 0 },
            "enemies": [{ "type": "goblin", "position": { "x": 1, "y": 1 }, "name": "Gob" }],
            "tutorialText": "Jump!"
        }"#;
        let level: Level = serde_json::from_str(raw).expect("level should parse");
        assert_eq!(level.player.piece_type, PieceType::Knight);
        assert!(level.player.can_double_pawn_move);
        assert!(level.coins.is_empty());
        assert!(!level.exit_locked);
        assert_eq!(level.enemies[0].kind, EnemyKind::Goblin);
        assert_eq!(level.meta.tutorial_text.as_deref(), Some("Jump!"));
        assert_eq!(
            level.objectives,
            vec![LevelObjective::ReachExit, LevelObjective::CollectTreasures]
        );
        assert!(is_valid(&level));
    }
}
