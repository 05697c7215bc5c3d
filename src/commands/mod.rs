//! CLI commands implementation

pub mod cache;
pub mod check;
pub mod dump;
pub mod extract;
pub mod import;
pub mod init;
pub mod media;
pub mod show;

pub use cache::*;
pub use check::*;
pub use dump::*;
pub use extract::*;
pub use import::*;
pub use init::*;
pub use media::*;
pub use show::*;
