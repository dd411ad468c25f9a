pub mod install;
pub mod utils;

pub use install::install_file;
pub use utils::{minecraft_dir, mods_dir};
