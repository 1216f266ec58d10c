use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::constants::{SOLVER_MAX_DEPTH, SOLVER_MAX_STATES};
use crate::level::{Level, LevelError};
use crate::session::{MoveOutcome, PuzzleSession};
use crate::types::{GameState, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SolverLimits {
    #[serde(rename = "maxDepth")]
    pub max_depth: usize,
    #[serde(rename = "maxStates")]
    pub max_states: usize,
}

impl Default for SolverLimits {
    fn default() -> Self {
        Self {
            max_depth: SOLVER_MAX_DEPTH,
            max_states: SOLVER_MAX_STATES,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SolveOutcome {
    Solved { moves: Vec<Position>, explored: usize },
    /// Every reachable position was searched without a win.
    Unsolvable { explored: usize },
    LimitReached { explored: usize },
}

impl SolveOutcome {
    pub fn moves(&self) -> Option<&[Position]> {
        match self {
            Self::Solved { moves, .. } => Some(moves),
            _ => None,
        }
    }

    pub fn explored(&self) -> usize {
        match self {
            Self::Solved { explored, .. }
            | Self::Unsolvable { explored }
            | Self::LimitReached { explored } => *explored,
        }
    }
}

// Breadth-first over full session clones, so the first win found is shortest.
pub fn solve(level: &Level, limits: SolverLimits) -> Result<SolveOutcome, LevelError> {
    let start = PuzzleSession::new(level.clone())?;
    let mut seen = HashSet::new();
    seen.insert(start.state_key());
    let mut queue = VecDeque::from([(start, Vec::<Position>::new())]);
    let mut explored = 0usize;
    let mut truncated = false;

    while let Some((session, path)) = queue.pop_front() {
        explored += 1;
        if explored > limits.max_states {
            tracing::debug!(level_id = %level.id, explored, "solver state limit reached");
            return Ok(SolveOutcome::LimitReached { explored });
        }
        if path.len() >= limits.max_depth {
            truncated = true;
            continue;
        }

        for to in session.valid_moves() {
            let mut next = session.clone();
            next.drain_events();
            match next.move_player(to) {
                MoveOutcome::Accepted(GameState::Won) => {
                    let mut moves = path.clone();
                    moves.push(to);
                    tracing::debug!(
                        level_id = %level.id,
                        moves = moves.len(),
                        explored,
                        "solver found a win"
                    );
                    return Ok(SolveOutcome::Solved { moves, explored });
                }
                MoveOutcome::Accepted(GameState::Playing) => {
                    if seen.insert(next.state_key()) {
                        let mut moves = path.clone();
                        moves.push(to);
                        queue.push_back((next, moves));
                    }
                }
                _ => {}
            }
        }
    }

    if truncated {
        Ok(SolveOutcome::LimitReached { explored })
    } else {
        Ok(SolveOutcome::Unsolvable { explored })
    }
}
