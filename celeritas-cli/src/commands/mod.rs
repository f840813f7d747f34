pub mod config;
pub mod new;
pub mod render;
