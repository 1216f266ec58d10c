use crate::enemy_ai::{check_player_captured, resolve_enemy_moves};
use crate::level::{validate, Level, LevelError, OverlapPolicy};
use crate::movement::{is_legal, valid_destinations};
use crate::types::{
    BoardSize, Direction, Entity, EntityType, GameState, LossReason, PieceType, Position,
    RuntimeEvent, SessionSnapshot,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Rejected,
    Accepted(GameState),
}

impl MoveOutcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Identity of a board position for search: player square, whether the
/// opener is still available, and every remaining entity.
pub(crate) type StateKey = (Position, bool, Vec<(String, Position)>);

#[derive(Clone, Debug)]
pub struct PuzzleSession {
    level: Level,
    board: Vec<Entity>,
    player_position: Position,
    piece_type: PieceType,
    has_moved: bool,
    items_collected: u32,
    total_collectibles: u32,
    move_count: u32,
    state: GameState,
    loss_reason: Option<LossReason>,
    events: Vec<RuntimeEvent>,
}

impl PuzzleSession {
    pub fn new(level: Level) -> Result<Self, LevelError> {
        Self::with_policy(level, OverlapPolicy::Warn)
    }

    pub fn with_policy(level: Level, policy: OverlapPolicy) -> Result<Self, LevelError> {
        validate(&level, policy)?;
        let mut session = Self {
            board: Vec::new(),
            player_position: level.player.position,
            piece_type: level.player.piece_type,
            has_moved: false,
            items_collected: 0,
            total_collectibles: level.total_collectibles(),
            move_count: 0,
            state: GameState::Playing,
            loss_reason: None,
            events: Vec::new(),
            level,
        };
        session.reset();
        Ok(session)
    }

    pub fn reset(&mut self) {
        self.board = self.level.instantiate_board();
        self.player_position = self.level.player.position;
        self.piece_type = self.level.player.piece_type;
        self.has_moved = false;
        self.items_collected = 0;
        self.total_collectibles = self.level.total_collectibles();
        self.move_count = 0;
        self.state = GameState::Playing;
        self.loss_reason = None;
        self.events.clear();
        self.events.push(RuntimeEvent::LevelStarted {
            level_id: self.level.id.clone(),
        });
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn board(&self) -> &[Entity] {
        &self.board
    }

    pub fn board_size(&self) -> BoardSize {
        self.level.board_size
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.state, GameState::Won | GameState::Lost)
    }

    pub fn loss_reason(&self) -> Option<LossReason> {
        self.loss_reason
    }

    pub fn player_position(&self) -> Position {
        self.player_position
    }

    pub fn piece_type(&self) -> PieceType {
        self.piece_type
    }

    pub fn items_collected(&self) -> u32 {
        self.items_collected
    }

    pub fn total_collectibles(&self) -> u32 {
        self.total_collectibles
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn is_first_move(&self) -> bool {
        !self.has_moved && self.level.player.can_double_pawn_move
    }

    pub fn entity_at(&self, pos: Position) -> Option<&Entity> {
        self.board.iter().find(|entity| entity.position == pos)
    }

    pub fn has_enemy_at(&self, pos: Position) -> bool {
        self.board
            .iter()
            .any(|entity| entity.position == pos && entity.entity_type.is_enemy())
    }

    pub fn enemies(&self) -> Vec<&Entity> {
        self.board
            .iter()
            .filter(|entity| entity.entity_type.is_enemy())
            .collect()
    }

    pub fn is_exit_unlocked(&self) -> bool {
        !self.level.exit_locked || self.enemies().is_empty()
    }

    pub fn valid_moves(&self) -> Vec<Position> {
        if self.state != GameState::Playing {
            return Vec::new();
        }
        valid_destinations(
            self.player_position,
            self.piece_type,
            self.level.board_size,
            |pos| self.has_enemy_at(pos),
            self.is_first_move(),
        )
    }

    pub fn is_valid_move(&self, to: Position) -> bool {
        self.state == GameState::Playing
            && is_legal(
                self.player_position,
                to,
                self.piece_type,
                self.level.board_size,
                |pos| self.has_enemy_at(pos),
                self.is_first_move(),
            )
    }

    pub fn move_in_direction(&mut self, direction: Direction) -> MoveOutcome {
        let to = direction.apply(self.player_position);
        self.move_player(to)
    }

    pub fn move_player(&mut self, to: Position) -> MoveOutcome {
        if !self.is_valid_move(to) {
            tracing::debug!(
                level_id = %self.level.id,
                from = %self.player_position,
                to = %to,
                "move rejected"
            );
            return MoveOutcome::Rejected;
        }

        let from = self.player_position;
        let exit_was_unlocked = self.is_exit_unlocked();
        self.player_position = to;
        self.has_moved = true;
        self.move_count += 1;
        if let Some(player) = self
            .board
            .iter_mut()
            .find(|entity| entity.entity_type == EntityType::Player)
        {
            player.position = to;
        }
        self.events.push(RuntimeEvent::PlayerMoved { from, to });

        self.collect_at(to);
        self.capture_at(to);
        if !exit_was_unlocked && self.is_exit_unlocked() {
            self.events.push(RuntimeEvent::ExitUnlocked);
        }

        self.advance_enemies();

        let enemies: Vec<Entity> = self.enemies().into_iter().cloned().collect();
        let captured = check_player_captured(to, &enemies);
        let on_danger = self
            .board
            .iter()
            .any(|entity| entity.entity_type == EntityType::Danger && entity.position == to);
        let on_exit = self
            .board
            .iter()
            .any(|entity| entity.entity_type == EntityType::Exit && entity.position == to);

        if captured {
            self.finish_lost(LossReason::Captured, to);
        } else if on_danger {
            self.finish_lost(LossReason::Danger, to);
        } else if on_exit && self.is_exit_unlocked() {
            self.state = GameState::Won;
            self.events.push(RuntimeEvent::LevelWon {
                moves: self.move_count,
            });
            tracing::info!(
                level_id = %self.level.id,
                moves = self.move_count,
                collected = self.items_collected,
                "level won"
            );
        }

        tracing::debug!(
            level_id = %self.level.id,
            from = %from,
            to = %to,
            state = ?self.state,
            "move applied"
        );
        MoveOutcome::Accepted(self.state)
    }

    fn take_at<F>(&mut self, pos: Position, matches: F) -> Vec<Entity>
    where
        F: Fn(EntityType) -> bool,
    {
        let (taken, kept): (Vec<Entity>, Vec<Entity>) = std::mem::take(&mut self.board)
            .into_iter()
            .partition(|entity| entity.position == pos && matches(entity.entity_type));
        self.board = kept;
        taken
    }

    // Overlapping authored items are all picked up together.
    fn collect_at(&mut self, pos: Position) {
        for item in self.take_at(pos, EntityType::is_collectible) {
            self.items_collected = self.items_collected.saturating_add(1);
            self.events.push(RuntimeEvent::ItemCollected {
                entity_id: item.id,
                entity_type: item.entity_type,
                at: pos,
            });
        }
    }

    fn capture_at(&mut self, pos: Position) {
        for enemy in self.take_at(pos, EntityType::is_enemy) {
            self.events.push(RuntimeEvent::EnemyCaptured {
                entity_id: enemy.id,
                at: pos,
            });
        }
    }

    fn advance_enemies(&mut self) {
        let enemies: Vec<Entity> = self.enemies().into_iter().cloned().collect();
        if enemies.is_empty() {
            return;
        }
        let moves = resolve_enemy_moves(
            &enemies,
            self.player_position,
            self.level.board_size,
            |pos| self.entity_at(pos).map(|entity| entity.entity_type),
        );

        for entity in self.board.iter_mut() {
            let Some(next) = moves.get(&entity.id) else {
                continue;
            };
            if *next == entity.position {
                continue;
            }
            self.events.push(RuntimeEvent::EnemyMoved {
                entity_id: entity.id.clone(),
                from: entity.position,
                to: *next,
            });
            entity.position = *next;
        }
    }

    fn finish_lost(&mut self, reason: LossReason, at: Position) {
        self.state = GameState::Lost;
        self.loss_reason = Some(reason);
        self.events.push(RuntimeEvent::LevelLost { reason, at });
        tracing::info!(
            level_id = %self.level.id,
            reason = ?reason,
            at = %at,
            "level lost"
        );
    }

    pub fn drain_events(&mut self) -> Vec<RuntimeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            level_id: self.level.id.clone(),
            game_state: self.state,
            board_size: self.level.board_size,
            player_position: self.player_position,
            piece_type: self.piece_type,
            items_collected: self.items_collected,
            total_collectibles: self.total_collectibles,
            move_count: self.move_count,
            exit_unlocked: self.is_exit_unlocked(),
            valid_moves: self.valid_moves(),
            board: self.board.clone(),
        }
    }

    pub(crate) fn state_key(&self) -> StateKey {
        let mut entities: Vec<(String, Position)> = self
            .board
            .iter()
            .filter(|entity| entity.entity_type != EntityType::Player)
            .map(|entity| (entity.id.clone(), entity.position))
            .collect();
        entities.sort();
        (self.player_position, self.is_first_move(), entities)
    }
}
