//! Configuration files
//!
//! - Generic YAML load/save
//! - Standard paths under the platform config directory
//! - [`TurntableConfig`]: persisted turntable settings

mod io;
mod paths;
mod turntable;

pub use io::{load_config, save_config, try_load_config};
pub use paths::{default_config_dir, default_config_path, CONFIG_DIR_NAME};
pub use turntable::TurntableConfig;
