pub mod campaign;
pub mod catalog;
pub mod catalog_store;
pub mod constants;
pub mod enemy_ai;
pub mod geometry;
pub mod level;
pub mod movement;
pub mod session;
pub mod solver;
pub mod types;
