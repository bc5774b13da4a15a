pub mod config;
pub mod feed;

pub use config::{HookConfig, HooksConfig};
pub use feed::*;
