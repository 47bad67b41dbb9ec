//! Unified configuration system.
//!
//! Consolidates configuration from tiers with field-by-field YAML merging:
//! 1. **Defaults** - `Config::default()`
//! 2. **Project** - `$CWD/taskboard/config.yaml`
//! 3. **User** - `~/.taskboard/config.yaml`
//! 4. **Environment** - variables listed below
//!
//! Command-line flags are applied on top by the binary.
//!
//! ## Environment Variables
//! - `TASKBOARD_CONFIG_PATH` - Explicit config file (replaces project and user tiers)
//! - `TASKBOARD_DB_PATH` - Database path
//! - `TASKBOARD_BIND`, `TASKBOARD_PORT` (or `PORT`) - Listener
//! - `TASKBOARD_USER_DIR` - User config dir (default: `~/.taskboard`)
//! - `TASKBOARD_PROJECT_DIR` - Project config dir (default: `./taskboard`)
//! - `JWT_SECRET` - Token signing secret
//! - `DEFAULT_MODEL_PROVIDER`, `OPENAI_MODEL`, `WATSONX_MODEL`, `WATSONX_AI_PROJECT_ID`

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
