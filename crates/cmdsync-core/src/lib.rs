pub mod adapter;
pub mod availability;
pub mod backup;
pub mod command;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod io;
pub mod paths;
pub mod store;
pub mod sync;
pub mod types;

pub use command::Command;
pub use error::{Result, SyncError};
pub use store::CommandStore;
pub use sync::SyncEngine;
pub use types::{ActivationMode, Scope, Service};
