pub mod api;
pub mod core;
pub mod error;
pub mod model;

// Important functions and structs
pub use crate::api::{CurseClient, ModRepository};
pub use crate::core::{install_file, minecraft_dir, mods_dir};
pub use crate::model::{ModFile, ModsManifest, ModSummary};
