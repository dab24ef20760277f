pub mod markers;
pub mod pattern;
