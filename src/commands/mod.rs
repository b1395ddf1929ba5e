//! Command implementations behind the CLI subcommands.

mod auth;
pub mod config;
mod feedback;
mod paths;
mod photos;
mod profile;
mod report;

pub use auth::{demo, login, logout, signup, whoami};
pub use feedback::feedback;
pub use photos::{delete, edit, list, upload};
pub use profile::{ProfileChanges, profile};

pub use config::Config;
pub use paths::default_state_dir;
