pub mod astar;
pub mod cost;
