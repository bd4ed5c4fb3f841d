#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::missing_crate_level_docs)]
#![doc = include_str!("../README.md")]

pub mod config;
pub mod engine;
pub mod hack;
pub mod host;
pub mod logging;
pub mod patch;
pub mod res;
pub mod variant;

pub use engine::{EngineContext, EngineError, Stage, StageReport};
pub use patch::{PatchContext, PatchError};

/// Package name of this module. The module's own settings live in this package's data directory.
pub const MODULE_PACKAGE: &str = "io.github.appopsrestore";

/// Canonical package of the Settings app we patch
pub const SETTINGS_PACKAGE: &str = "com.android.settings";

/// Main settings activity, which hosts the header list and validates fragments
pub const SETTINGS_MAIN_ACTIVITY: &str = "com.android.settings.Settings";

/// Fragment showing the per-app ops list
pub const APP_OPS_FRAGMENT: &str = "com.android.settings.applications.AppOpsSummary";

/// Fragment showing the ops of a single app
pub const APP_OPS_DETAILS_FRAGMENT: &str = "com.android.settings.applications.AppOpsDetails";
