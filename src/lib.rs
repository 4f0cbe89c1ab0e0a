//! Flappy-bird simulation core shared by a terminal play loop and a
//! population loop for evolved agents.

pub mod brain;
pub mod config;
pub mod difficulty;
pub mod episode;
pub mod geometry;
pub mod player;
pub mod population;
pub mod render;
pub mod scoring;
pub mod sensors;
pub mod session;
pub mod sound;
pub mod stream;
pub mod tube;

pub use config::GameConfig;
pub use difficulty::{Difficulty, DifficultyController};
pub use episode::{Episode, Event};
pub use player::Player;
pub use scoring::{Evaluation, evaluate};
pub use stream::TubeStream;
pub use tube::Tube;
