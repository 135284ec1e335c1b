pub mod ai;
pub mod collision;
pub mod movement;
pub mod player;
pub mod stations;
pub mod weapons;
