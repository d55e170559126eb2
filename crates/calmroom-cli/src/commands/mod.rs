pub mod breathe;
pub mod color_tap;
pub mod config;
pub mod memory;
pub mod pattern;
pub mod reaction;
pub mod scramble;
pub mod session;
pub mod stretch;
