//! CLI commands

mod changelog;
mod generate;
mod versions;

pub use changelog::{changelog, ChangelogArgs, ChangelogFormat};
pub use generate::{generate, GenerateArgs};
pub use versions::{versions, VersionsArgs};
