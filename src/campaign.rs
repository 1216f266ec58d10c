use thiserror::Error;

use crate::catalog::{LevelCatalog, World};
use crate::level::LevelError;
use crate::session::{MoveOutcome, PuzzleSession};
use crate::types::{Direction, GameState, Position};

#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("no level at index {0}")]
    LevelNotFound(usize),
    #[error("no level with id {0:?}")]
    UnknownLevelId(String),
    #[error(transparent)]
    InvalidLevel(#[from] LevelError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// 1-based position of the current level.
    pub current: usize,
    pub total: usize,
}

#[derive(Debug)]
pub struct Campaign {
    catalog: LevelCatalog,
    current_index: usize,
    session: Option<PuzzleSession>,
    in_menu: bool,
}

impl Campaign {
    pub fn new(catalog: LevelCatalog) -> Self {
        Self {
            catalog,
            current_index: 0,
            session: None,
            in_menu: true,
        }
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn session(&self) -> Option<&PuzzleSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut PuzzleSession> {
        self.session.as_mut()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_world(&self) -> Option<&World> {
        self.catalog.world_of_level(self.current_index)
    }

    pub fn game_state(&self) -> GameState {
        match (&self.session, self.in_menu) {
            (Some(session), false) => session.state(),
            _ => GameState::Menu,
        }
    }

    pub fn start_level(&mut self, index: usize) -> Result<&PuzzleSession, CampaignError> {
        let level = self
            .catalog
            .get_level(index)
            .cloned()
            .ok_or(CampaignError::LevelNotFound(index))?;
        let session = PuzzleSession::new(level)?;
        tracing::info!(
            level_id = %session.level().id,
            index,
            total = self.catalog.total_levels(),
            "starting level"
        );
        self.current_index = index;
        self.in_menu = false;
        Ok(&*self.session.insert(session))
    }

    pub fn start_level_by_id(&mut self, id: &str) -> Result<&PuzzleSession, CampaignError> {
        let index = self
            .catalog
            .index_of(id)
            .ok_or_else(|| CampaignError::UnknownLevelId(id.to_string()))?;
        self.start_level(index)
    }

    pub fn reset_level(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.reset();
            self.in_menu = false;
        }
    }

    pub fn next_level(&mut self) -> Result<GameState, CampaignError> {
        if self.catalog.next_level(self.current_index).is_none() {
            tracing::info!(total = self.catalog.total_levels(), "campaign complete");
            self.session = None;
            self.in_menu = true;
            return Ok(GameState::Menu);
        }
        self.start_level(self.current_index + 1)?;
        Ok(self.game_state())
    }

    pub fn return_to_menu(&mut self) {
        self.in_menu = true;
    }

    pub fn resume(&mut self) -> bool {
        if self.session.is_none() {
            return false;
        }
        self.in_menu = false;
        true
    }

    pub fn move_player(&mut self, to: Position) -> MoveOutcome {
        if self.in_menu {
            return MoveOutcome::Rejected;
        }
        match self.session.as_mut() {
            Some(session) => session.move_player(to),
            None => MoveOutcome::Rejected,
        }
    }

    pub fn move_in_direction(&mut self, direction: Direction) -> MoveOutcome {
        if self.in_menu {
            return MoveOutcome::Rejected;
        }
        match self.session.as_mut() {
            Some(session) => session.move_in_direction(direction),
            None => MoveOutcome::Rejected,
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            current: self.current_index + 1,
            total: self.catalog.total_levels(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::tests::sample_level;

    fn two_level_campaign() -> Campaign {
        let first = sample_level();
        let mut second = sample_level();
        second.id = "sample-2".to_string();
        second.level_number = 2;
        Campaign::new(LevelCatalog::from_levels(vec![first, second]).expect("valid catalog"))
    }

    fn win_sample(campaign: &mut Campaign) {
        for to in [Position::new(2, 2), Position::new(2, 1), Position::new(2, 0)] {
            assert!(campaign.move_player(to).is_accepted());
        }
        assert_eq!(campaign.game_state(), GameState::Won);
    }

    #[test]
    fn starts_in_menu_and_rejects_moves() {
        let mut campaign = two_level_campaign();
        assert_eq!(campaign.game_state(), GameState::Menu);
        assert_eq!(
            campaign.move_player(Position::new(1, 2)),
            MoveOutcome::Rejected
        );
        assert!(!campaign.resume());
    }

    #[test]
    fn next_level_walks_the_catalog_then_returns_to_menu() {
        let mut campaign = two_level_campaign();
        campaign.start_level(0).expect("level 0");
        assert_eq!(campaign.progress(), Progress { current: 1, total: 2 });
        win_sample(&mut campaign);

        assert_eq!(campaign.next_level().expect("next"), GameState::Playing);
        assert_eq!(campaign.progress().current, 2);
        assert_eq!(
            campaign.session().map(|session| session.level().id.as_str()),
            Some("sample-2")
        );
        win_sample(&mut campaign);

        assert_eq!(campaign.next_level().expect("next"), GameState::Menu);
        assert!(campaign.session().is_none());
    }

    #[test]
    fn reset_level_replays_from_the_start() {
        let mut campaign = two_level_campaign();
        campaign.start_level_by_id("sample").expect("known id");
        assert!(campaign.move_player(Position::new(2, 2)).is_accepted());
        campaign.reset_level();
        let session = campaign.session().expect("session");
        assert_eq!(session.player_position(), Position::new(1, 3));
        assert_eq!(session.move_count(), 0);
    }

    #[test]
    fn menu_pauses_the_current_level() {
        let mut campaign = two_level_campaign();
        campaign.start_level(1).expect("level 1");
        campaign.return_to_menu();
        assert_eq!(campaign.game_state(), GameState::Menu);
        assert_eq!(
            campaign.move_in_direction(Direction::Up),
            MoveOutcome::Rejected
        );
        assert!(campaign.resume());
        assert!(campaign.move_in_direction(Direction::Up).is_accepted());
    }

    #[test]
    fn unknown_levels_are_errors() {
        let mut campaign = two_level_campaign();
        assert!(matches!(
            campaign.start_level(5),
            Err(CampaignError::LevelNotFound(5))
        ));
        assert!(matches!(
            campaign.start_level_by_id("missing"),
            Err(CampaignError::UnknownLevelId(_))
        ));
    }

    #[test]
    fn builtin_campaign_starts_on_the_first_meadow_level() {
        let mut campaign = Campaign::new(LevelCatalog::builtin());
        campaign.start_level(0).expect("first level");
        assert_eq!(
            campaign.current_world().map(|world| world.id.as_str()),
            Some("meadow-tutorial")
        );
    }
}
