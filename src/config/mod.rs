//! Configuration and CLI handling

pub mod cli;
pub mod settings;

pub use cli::{Cli, CollisionArg};
pub use settings::{CollisionPolicy, PipelineOptions, Settings};
