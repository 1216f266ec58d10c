use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    // Saturates at the i32 edges; a saturated square is never on a board.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    pub fn delta_to(self, other: Position) -> (i32, i32) {
        (other.x.saturating_sub(self.x), other.y.saturating_sub(self.y))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardSize {
    pub width: i32,
    pub height: i32,
}

impl BoardSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn area(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.width as usize).saturating_mul(self.height as usize)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" | "w" | "ArrowUp" => Some(Self::Up),
            "down" | "s" | "ArrowDown" => Some(Self::Down),
            "left" | "a" | "ArrowLeft" => Some(Self::Left),
            "right" | "d" | "ArrowRight" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn apply(self, pos: Position) -> Position {
        match self {
            Self::Up => pos.offset(0, -1),
            Self::Down => pos.offset(0, 1),
            Self::Left => pos.offset(-1, 0),
            Self::Right => pos.offset(1, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceType {
    Pawn,
    Knight,
    Rook,
    Bishop,
    Queen,
    King,
}

impl PieceType {
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Queen,
        PieceType::King,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pawn" => Some(Self::Pawn),
            "knight" => Some(Self::Knight),
            "rook" => Some(Self::Rook),
            "bishop" => Some(Self::Bishop),
            "queen" => Some(Self::Queen),
            "king" => Some(Self::King),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Player,
    Coin,
    Treasure,
    Friend,
    Exit,
    Slime,
    Goblin,
    Boss,
    Danger,
}

impl EntityType {
    /// Blocks sliding pieces and can be captured by landing on it.
    pub fn is_enemy(self) -> bool {
        matches!(self, Self::Slime | Self::Goblin | Self::Boss)
    }

    /// Steps toward the player after every accepted move.
    pub fn is_pursuer(self) -> bool {
        matches!(self, Self::Goblin | Self::Boss)
    }

    pub fn is_collectible(self) -> bool {
        matches!(self, Self::Coin | Self::Treasure | Self::Friend)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Slime,
    Goblin,
    Boss,
}

impl EnemyKind {
    pub fn entity_type(self) -> EntityType {
        match self {
            Self::Slime => EntityType::Slime,
            Self::Goblin => EntityType::Goblin,
            Self::Boss => EntityType::Boss,
        }
    }

    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Slime => "slime",
            Self::Goblin => "goblin",
            Self::Boss => "boss",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub position: Position,
    #[serde(rename = "pieceType", default, skip_serializing_if = "Option::is_none")]
    pub piece_type: Option<PieceType>,
}

impl Entity {
    pub fn new(id: impl Into<String>, entity_type: EntityType, position: Position) -> Self {
        Self {
            id: id.into(),
            entity_type,
            position,
            piece_type: None,
        }
    }

    pub fn player(id: impl Into<String>, position: Position, piece_type: PieceType) -> Self {
        Self {
            id: id.into(),
            entity_type: EntityType::Player,
            position,
            piece_type: Some(piece_type),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRule {
    pub dx: i32,
    pub dy: i32,
    /// Only legal when an enemy sits on the destination.
    #[serde(rename = "canCapture", default)]
    pub can_capture: bool,
    /// Only legal while the piece has not moved yet.
    #[serde(rename = "firstMoveOnly", default)]
    pub first_move_only: bool,
}

impl MoveRule {
    pub const fn step(dx: i32, dy: i32) -> Self {
        Self {
            dx,
            dy,
            can_capture: false,
            first_move_only: false,
        }
    }

    pub const fn capture(dx: i32, dy: i32) -> Self {
        Self {
            dx,
            dy,
            can_capture: true,
            first_move_only: false,
        }
    }

    pub const fn opener(dx: i32, dy: i32) -> Self {
        Self {
            dx,
            dy,
            can_capture: false,
            first_move_only: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Menu,
    Playing,
    Won,
    Lost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LevelObjective {
    ReachExit,
    CollectTreasures,
    RescueFriends,
    CaptureSpecific,
    CaptureAll,
    AvoidDanger,
    Checkmate,
    CreateTactic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    Captured,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    LevelStarted {
        #[serde(rename = "levelId")]
        level_id: String,
    },
    PlayerMoved {
        from: Position,
        to: Position,
    },
    ItemCollected {
        #[serde(rename = "entityId")]
        entity_id: String,
        #[serde(rename = "entityType")]
        entity_type: EntityType,
        at: Position,
    },
    EnemyCaptured {
        #[serde(rename = "entityId")]
        entity_id: String,
        at: Position,
    },
    EnemyMoved {
        #[serde(rename = "entityId")]
        entity_id: String,
        from: Position,
        to: Position,
    },
    ExitUnlocked,
    LevelWon {
        moves: u32,
    },
    LevelLost {
        reason: LossReason,
        at: Position,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    #[serde(rename = "levelId")]
    pub level_id: String,
    #[serde(rename = "gameState")]
    pub game_state: GameState,
    #[serde(rename = "boardSize")]
    pub board_size: BoardSize,
    #[serde(rename = "playerPosition")]
    pub player_position: Position,
    #[serde(rename = "pieceType")]
    pub piece_type: PieceType,
    #[serde(rename = "itemsCollected")]
    pub items_collected: u32,
    #[serde(rename = "totalCollectibles")]
    pub total_collectibles: u32,
    #[serde(rename = "moveCount")]
    pub move_count: u32,
    #[serde(rename = "exitUnlocked")]
    pub exit_unlocked: bool,
    #[serde(rename = "validMoves")]
    pub valid_moves: Vec<Position>,
    pub board: Vec<Entity>,
}
