pub mod aws;
pub mod cli;
pub mod console;
pub mod load_config;
pub mod portal;

pub use cli::{run, Cli, Commands};
