pub mod feed;
pub mod scheduler;
pub mod sequence;
