pub mod annotate;
pub mod config;
pub mod detector;
pub mod input;
pub mod locator;
pub mod matching;
pub mod outputs;
pub mod pipeline;
pub mod posts;
pub mod retry;
pub mod screen;
pub mod window;
