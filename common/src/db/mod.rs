pub mod core;
pub mod drc;
pub mod obstacle;
pub mod route;
