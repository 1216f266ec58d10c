use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::MAX_BOARD_SIDE;
use crate::level::{
    validate, CharacterIntro, DangerSquare, EnemySpec, Level, LevelError, LevelMeta,
    OverlapPolicy, PlayerStart,
};
use crate::types::{BoardSize, EnemyKind, LevelObjective, PieceType, Position};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported level pack version {version}")]
    UnsupportedVersion { version: u8 },
    #[error("level catalog is empty")]
    Empty,
    #[error("duplicate level id '{0}'")]
    DuplicateId(String),
    #[error("level '{id}' board {width}x{height} exceeds the {max}x{max} limit")]
    BoardTooLarge {
        id: String,
        width: i32,
        height: i32,
        max: i32,
    },
    #[error("level '{id}' is invalid: {source}")]
    InvalidLevel {
        id: String,
        #[source]
        source: LevelError,
    },
}

#[derive(Clone, Debug)]
pub struct LevelCatalog {
    levels: Vec<Level>,
    worlds: Vec<World>,
}

impl LevelCatalog {
    pub fn builtin() -> Self {
        let levels = builtin_levels();
        let worlds = worlds_for(&levels);
        Self { levels, worlds }
    }

    /// Builds a catalog from authored levels, refusing the whole set when any
    /// level is malformed or two levels share an id.
    pub fn from_levels(levels: Vec<Level>) -> Result<Self, CatalogError> {
        check_levels(&levels)?;
        let worlds = worlds_for(&levels);
        Ok(Self { levels, worlds })
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn worlds(&self) -> &[World] {
        &self.worlds
    }

    pub fn total_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn get_level(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    pub fn get_level_by_id(&self, id: &str) -> Option<&Level> {
        self.levels.iter().find(|level| level.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.levels.iter().position(|level| level.id == id)
    }

    pub fn levels_by_world(&self, world_id: &str) -> Vec<&Level> {
        self.levels
            .iter()
            .filter(|level| level.world_id == world_id)
            .collect()
    }

    pub fn next_level(&self, index: usize) -> Option<&Level> {
        self.get_level(index.checked_add(1)?)
    }

    pub fn previous_level(&self, index: usize) -> Option<&Level> {
        self.get_level(index.checked_sub(1)?)
    }

    pub fn is_first_level(&self, index: usize) -> bool {
        index == 0
    }

    pub fn is_last_level(&self, index: usize) -> bool {
        index + 1 >= self.levels.len()
    }

    pub fn world_of_level(&self, index: usize) -> Option<&World> {
        let level = self.get_level(index)?;
        self.worlds.iter().find(|world| world.id == level.world_id)
    }

    /// Pieces whose character has been introduced up to and including
    /// `through`, in order of first appearance.
    pub fn introduced_pieces(&self, through: usize) -> Vec<PieceType> {
        let mut pieces = Vec::new();
        for level in self.levels.iter().take(through.saturating_add(1)) {
            if let Some(intro) = &level.meta.character_intro {
                if !pieces.contains(&intro.piece) {
                    pieces.push(intro.piece);
                }
            }
        }
        pieces
    }

    pub fn mastered_objectives(&self, through: usize) -> Vec<LevelObjective> {
        let mut objectives = Vec::new();
        for level in self.levels.iter().take(through.saturating_add(1)) {
            for objective in &level.objectives {
                if !objectives.contains(objective) {
                    objectives.push(*objective);
                }
            }
        }
        objectives
    }
}

fn check_levels(levels: &[Level]) -> Result<(), CatalogError> {
    if levels.is_empty() {
        return Err(CatalogError::Empty);
    }
    let mut ids = HashSet::new();
    for level in levels {
        if !ids.insert(level.id.as_str()) {
            return Err(CatalogError::DuplicateId(level.id.clone()));
        }
        validate(level, OverlapPolicy::Warn).map_err(|source| CatalogError::InvalidLevel {
            id: level.id.clone(),
            source,
        })?;
        if level.board_size.width > MAX_BOARD_SIDE || level.board_size.height > MAX_BOARD_SIDE {
            return Err(CatalogError::BoardTooLarge {
                id: level.id.clone(),
                width: level.board_size.width,
                height: level.board_size.height,
                max: MAX_BOARD_SIDE,
            });
        }
    }
    Ok(())
}

fn known_world(id: &str) -> Option<World> {
    let (name, description) = match id {
        "meadow-tutorial" => (
            "Meadow Tutorial",
            "Meet the chess friends and learn how each of them moves.",
        ),
        "goblin-woods" => (
            "Goblin Woods",
            "Capture the goblins that chase you through the forest.",
        ),
        "glow-caves" => (
            "Glow Caves",
            "Find safe paths around the glowing danger squares.",
        ),
        "royal-keep" => ("Royal Keep", "The king steps carefully through the keep."),
        _ => return None,
    };
    Some(World {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
    })
}

fn worlds_for(levels: &[Level]) -> Vec<World> {
    let mut worlds: Vec<World> = Vec::new();
    for level in levels {
        if worlds.iter().any(|world| world.id == level.world_id) {
            continue;
        }
        worlds.push(known_world(&level.world_id).unwrap_or_else(|| World {
            id: level.world_id.clone(),
            name: level.world_id.clone(),
            description: String::new(),
        }));
    }
    worlds
}

struct LevelBuilder {
    level: Level,
}

impl LevelBuilder {
    fn new(id: &str, world_id: &str, level_number: u32, name: &str) -> Self {
        Self {
            level: Level {
                id: id.to_string(),
                name: name.to_string(),
                description: String::new(),
                world_id: world_id.to_string(),
                level_number,
                board_size: BoardSize::new(4, 4),
                player: PlayerStart {
                    position: Position::new(0, 3),
                    piece_type: PieceType::Pawn,
                    can_double_pawn_move: true,
                },
                objectives: vec![LevelObjective::ReachExit],
                coins: Vec::new(),
                treasures: Vec::new(),
                friends: Vec::new(),
                exit: Position::new(0, 0),
                exit_locked: false,
                enemies: Vec::new(),
                danger_squares: Vec::new(),
                meta: LevelMeta::default(),
            },
        }
    }

    fn describe(mut self, description: &str) -> Self {
        self.level.description = description.to_string();
        self
    }

    fn board(mut self, width: i32, height: i32) -> Self {
        self.level.board_size = BoardSize::new(width, height);
        self
    }

    fn player(mut self, x: i32, y: i32, piece_type: PieceType) -> Self {
        self.level.player.position = Position::new(x, y);
        self.level.player.piece_type = piece_type;
        self
    }

    fn exit(mut self, x: i32, y: i32) -> Self {
        self.level.exit = Position::new(x, y);
        self
    }

    fn locked(mut self) -> Self {
        self.level.exit_locked = true;
        self
    }

    fn objectives(mut self, objectives: &[LevelObjective]) -> Self {
        self.level.objectives = objectives.to_vec();
        self
    }

    fn treasure(mut self, x: i32, y: i32) -> Self {
        self.level.treasures.push(Position::new(x, y));
        self
    }

    fn enemy(mut self, kind: EnemyKind, x: i32, y: i32, name: &str) -> Self {
        self.level.enemies.push(EnemySpec {
            kind,
            position: Position::new(x, y),
            name: Some(name.to_string()),
        });
        self
    }

    fn danger(mut self, x: i32, y: i32) -> Self {
        self.level.danger_squares.push(DangerSquare {
            position: Position::new(x, y),
        });
        self
    }

    fn tutorial(mut self, text: &str) -> Self {
        self.level.meta.tutorial_text = Some(text.to_string());
        self
    }

    fn intro(mut self, piece: PieceType, name: &str, greeting: &str, ability: &str) -> Self {
        self.level.meta.character_intro = Some(CharacterIntro {
            piece,
            name: name.to_string(),
            greeting: greeting.to_string(),
            ability: ability.to_string(),
        });
        self
    }

    fn build(self) -> Level {
        self.level
    }
}

pub fn builtin_levels() -> Vec<Level> {
    use EnemyKind::{Boss, Goblin, Slime};
    use LevelObjective::*;
    use PieceType::*;

    vec![
        // Meadow Tutorial
        LevelBuilder::new("meadow-1-pawn-first-steps", "meadow-tutorial", 1, "Pawn Pete's First Steps")
            .describe("Help Pawn Pete walk forward across the meadow.")
            .board(4, 4)
            .player(1, 3, Pawn)
            .treasure(1, 1)
            .exit(1, 0)
            .tutorial("Pawns move forward one square, or two from their starting square.")
            .intro(Pawn, "Pawn Pete", "Hi there! I love to march forward.", "One square forward, two from the start.")
            .build(),
        LevelBuilder::new("meadow-2-double-step", "meadow-tutorial", 2, "Double Step Power")
            .describe("Pete can take a big double step from where he starts.")
            .board(5, 5)
            .player(2, 4, Pawn)
            .objectives(&[ReachExit, CollectTreasures])
            .treasure(2, 2)
            .treasure(1, 1)
            .exit(2, 0)
            .tutorial("From the starting square, move two squares forward in one go.")
            .build(),
        LevelBuilder::new("meadow-3-knight-big-jump", "meadow-tutorial", 3, "Knight Nelly's Big Jump")
            .describe("Knight Nelly jumps in L-shapes.")
            .board(4, 4)
            .player(0, 3, Knight)
            .treasure(2, 1)
            .exit(3, 0)
            .tutorial("Knights jump two squares one way and one square sideways.")
            .intro(Knight, "Knight Nelly", "Watch me jump in L-shapes!", "Two squares one way, one square sideways.")
            .build(),
        LevelBuilder::new("meadow-4-rook-races", "meadow-tutorial", 4, "Rook Ruby Races")
            .describe("Rook Ruby zooms along straight lines.")
            .board(5, 4)
            .player(0, 3, Rook)
            .treasure(2, 3)
            .treasure(4, 1)
            .exit(4, 0)
            .tutorial("Rooks move up, down, left, or right as far as they like.")
            .intro(Rook, "Rook Ruby", "Vroom! I race in straight lines.", "Any distance up, down, left, or right.")
            .build(),
        LevelBuilder::new("meadow-5-bishop-glides", "meadow-tutorial", 5, "Bishop Barry Glides")
            .describe("Bishop Barry glides along diagonals.")
            .board(5, 5)
            .player(0, 4, Bishop)
            .treasure(1, 3)
            .treasure(3, 1)
            .exit(4, 0)
            .tutorial("Bishops glide diagonally from corner to corner.")
            .intro(Bishop, "Bishop Barry", "I dance along diagonal paths.", "Any distance diagonally.")
            .build(),
        LevelBuilder::new("meadow-6-queen-can-do-all", "meadow-tutorial", 6, "Queen Quinn Can Do It All")
            .describe("Queen Quinn moves like a rook and a bishop together.")
            .board(6, 5)
            .player(0, 4, Queen)
            .objectives(&[ReachExit, CollectTreasures])
            .treasure(2, 4)
            .treasure(3, 1)
            .treasure(5, 2)
            .exit(5, 0)
            .tutorial("Queens move in straight lines and along diagonals.")
            .intro(Queen, "Queen Quinn", "I have the powers of all my friends!", "Straight lines and diagonals.")
            .build(),
        // Goblin Woods
        LevelBuilder::new("goblin-7-first-capture", "goblin-woods", 7, "First Capture")
            .describe("A goblin blocks the path. Capture it diagonally!")
            .board(4, 4)
            .player(1, 3, Pawn)
            .objectives(&[CaptureSpecific, ReachExit])
            .treasure(0, 0)
            .exit(2, 0)
            .locked()
            .enemy(Goblin, 2, 2, "Giggly Goblin")
            .tutorial("Pawns capture diagonally forward. The exit opens once the goblin is gone.")
            .build(),
        LevelBuilder::new("goblin-8-knight-takedown", "goblin-woods", 8, "Knight's First Takedown")
            .describe("Jump onto the goblin with an L-shaped leap.")
            .board(5, 4)
            .player(0, 3, Knight)
            .objectives(&[CaptureSpecific, ReachExit])
            .treasure(2, 1)
            .treasure(4, 0)
            .exit(4, 0)
            .enemy(Goblin, 2, 2, "Clumsy Goblin")
            .tutorial("Knights capture anything they can jump onto.")
            .build(),
        LevelBuilder::new("goblin-9-rook-chase", "goblin-woods", 9, "Rook Chase")
            .describe("Line up with the goblin and race straight at it.")
            .board(5, 4)
            .player(0, 2, Rook)
            .objectives(&[CaptureSpecific, ReachExit])
            .treasure(3, 0)
            .exit(4, 0)
            .enemy(Goblin, 3, 2, "Speedy Goblin")
            .tutorial("Rooks capture along their straight-line paths.")
            .build(),
        LevelBuilder::new("goblin-10-bishop-ambush", "goblin-woods", 10, "Bishop Ambush")
            .describe("Glide along the diagonal to surprise the goblin.")
            .board(5, 5)
            .player(0, 4, Bishop)
            .objectives(&[CaptureSpecific, ReachExit])
            .treasure(2, 2)
            .exit(4, 0)
            .enemy(Goblin, 3, 1, "Sneaky Goblin")
            .tutorial("Bishops capture along diagonal lines. Treasures never block the way.")
            .build(),
        LevelBuilder::new("goblin-11-queen-sweep", "goblin-woods", 11, "Queen Sweep")
            .describe("Capture two goblins with the queen's royal powers.")
            .board(6, 5)
            .player(1, 4, Queen)
            .objectives(&[CaptureAll, ReachExit])
            .treasure(0, 0)
            .exit(5, 0)
            .enemy(Goblin, 1, 2, "First Goblin")
            .enemy(Goblin, 3, 2, "Second Goblin")
            .tutorial("Use straight lines and diagonals to catch both goblins.")
            .build(),
        LevelBuilder::new("goblin-12-goblin-guard", "goblin-woods", 12, "Goblin Guard")
            .describe("The exit is locked until the guard is defeated.")
            .board(5, 4)
            .player(2, 3, Pawn)
            .objectives(&[CaptureSpecific, ReachExit])
            .treasure(1, 1)
            .exit(3, 0)
            .locked()
            .enemy(Goblin, 4, 1, "Gate Guard Goblin")
            .tutorial("Let the guard come to you, then capture it diagonally.")
            .build(),
        LevelBuilder::new("goblin-13-two-in-a-row", "goblin-woods", 13, "Two in a Row")
            .describe("Capture the first goblin, then outjump the second.")
            .board(5, 5)
            .player(0, 4, Knight)
            .objectives(&[CaptureAll, ReachExit])
            .treasure(2, 2)
            .treasure(4, 0)
            .exit(4, 0)
            .enemy(Goblin, 1, 2, "Goblin A")
            .enemy(Goblin, 3, 1, "Goblin B")
            .tutorial("Goblins cannot walk through treasures. Use that to line up a jump.")
            .build(),
        LevelBuilder::new("goblin-14-capture-and-exit", "goblin-woods", 14, "Capture and Exit")
            .describe("Capture the target goblin, then race to the far exit.")
            .board(6, 4)
            .player(0, 2, Rook)
            .objectives(&[CaptureSpecific, ReachExit])
            .treasure(2, 1)
            .treasure(5, 3)
            .exit(5, 3)
            .enemy(Goblin, 3, 2, "Target Goblin")
            .tutorial("Capture first, then plan your route to the exit.")
            .build(),
        // Glow Caves
        LevelBuilder::new("glow-15-rook-bridges", "glow-caves", 15, "Glowing Bridges")
            .describe("Slide past the glowing squares without stopping on one.")
            .board(5, 5)
            .player(0, 4, Rook)
            .objectives(&[AvoidDanger, ReachExit])
            .treasure(4, 1)
            .exit(4, 0)
            .danger(4, 4)
            .danger(0, 0)
            .danger(2, 2)
            .tutorial("Sliding over a glowing square is safe. Stopping on one is not.")
            .build(),
        LevelBuilder::new("glow-16-knight-stepping-stones", "glow-caves", 16, "Stepping Stones")
            .describe("Hop between the safe stones of the cave.")
            .board(5, 5)
            .player(0, 4, Knight)
            .objectives(&[AvoidDanger, ReachExit])
            .treasure(0, 0)
            .exit(4, 0)
            .enemy(Slime, 2, 2, "Sleepy Slime")
            .danger(2, 3)
            .danger(3, 2)
            .build(),
        LevelBuilder::new("glow-17-pawn-trap", "glow-caves", 17, "Pawn Trap")
            .describe("The big double step leads straight into a dead end.")
            .board(5, 5)
            .player(1, 4, Pawn)
            .objectives(&[AvoidDanger, ReachExit])
            .exit(2, 0)
            .enemy(Slime, 2, 2, "Glow Slime")
            .danger(1, 1)
            .build(),
        // Royal Keep
        LevelBuilder::new("royal-22-king-steps", "royal-keep", 22, "The King Steps Out")
            .describe("The king moves one square in any direction.")
            .board(4, 4)
            .player(0, 3, King)
            .objectives(&[AvoidDanger, ReachExit])
            .exit(3, 0)
            .enemy(Slime, 1, 1, "Moat Slime")
            .enemy(Slime, 2, 2, "Gate Slime")
            .danger(0, 2)
            .intro(King, "King Kit", "One careful step at a time.", "One square in any direction.")
            .build(),
        LevelBuilder::new("royal-23-boss-in-the-hall", "royal-keep", 23, "Boss in the Hall")
            .describe("The boss chases the king. Let it come close, then strike.")
            .board(5, 5)
            .player(0, 4, King)
            .objectives(&[CaptureSpecific, ReachExit])
            .exit(4, 0)
            .locked()
            .enemy(Boss, 4, 2, "Hall Boss")
            .build(),
    ]
}
