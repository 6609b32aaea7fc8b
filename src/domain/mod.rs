pub mod ai;
pub mod combat;
pub mod difficulty;
pub mod entity;
pub mod grid;
pub mod ledger;
pub mod physics;
pub mod rules;
pub mod tile;
