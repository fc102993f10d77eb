pub mod config;
pub mod geometry;
pub mod locate;
pub mod post;
