//! Database schema, settings and row models

pub mod init;
pub mod models;
pub mod settings;

pub use init::*;
pub use models::*;
pub use settings::{get_setting, set_setting};
