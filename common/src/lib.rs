pub mod classify;
pub mod config;
pub mod error;
pub mod locate;
pub mod parse;
pub mod plot;
pub mod render;
pub mod stats;
