pub mod event;
pub mod highscores;
pub mod level;
pub mod step;
pub mod world;
