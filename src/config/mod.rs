//! # Config
//!
//! This module covers the module's settings.
//! They are written by the settings UI, in another process, and only ever read here.

pub mod prefs;

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

/// Enables failsafe mode
pub const FAILSAFE_MODE: &str = "failsafe_mode";
/// Name of the variant to apply instead of probing. Empty means probing.
pub const FORCE_VARIANT: &str = "force_variant";
/// Replace the App Ops details layout with ours
pub const USE_LAYOUT_FIX: &str = "use_layout_fix";

/// Errors while loading the settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file exists but can't be read from this process
    #[error("settings at {path} are unavailable")]
    ConfigUnavailable {
        /// Path of the settings file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
    /// The settings file is not a valid preferences document
    #[error("malformed settings: {0}")]
    Parse(String),
}

/// A stored setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefValue {
    /// `<boolean>`
    Bool(bool),
    /// `<string>`
    String(String),
    /// `<int>` or `<long>`
    Int(i64),
}

/// Read-only view of the settings, loaded once per process
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    /// Settings by name
    values: HashMap<String, PrefValue>,
}

impl ConfigStore {
    /// Default location of the settings file of `package`
    pub fn default_path(package: &str) -> PathBuf {
        PathBuf::from(format!(
            "/data/data/{package}/shared_prefs/{package}_preferences.xml"
        ))
    }

    /// Creates a store from already parsed values
    pub fn from_values(values: HashMap<String, PrefValue>) -> Self {
        Self { values }
    }

    /// Loads the settings at `path`.
    ///
    /// A missing file is not an error; every setting then has its default. Any other failure to
    /// read it, including a directory we can't traverse, is [`ConfigError::ConfigUnavailable`].
    /// The file is made world-readable first so that privileged processes can read what the UI wrote.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match make_world_readable(path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                warn!("failed to make {} world-readable: {e}", path.display())
            }
            _ => {}
        }

        let xml = match fs::read_to_string(path) {
            Ok(xml) => xml,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::ConfigUnavailable {
                    path: path.to_owned(),
                    source,
                })
            }
        };
        prefs::parse(&xml).map(Self::from_values)
    }

    /// Same as [`ConfigStore::load`], but logs errors and falls back to the defaults
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            crate::logging::log_error(&e);
            Self::default()
        })
    }

    /// Boolean setting `name`, or `default` if it's absent or not a boolean
    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        match self.values.get(name) {
            Some(PrefValue::Bool(v)) => *v,
            _ => default,
        }
    }

    /// String setting `name`, or `default` if it's absent or not a string
    pub fn get_string<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        match self.values.get(name) {
            Some(PrefValue::String(v)) => v.as_str(),
            _ => default,
        }
    }

    /// Integer setting `name`, or `default` if it's absent or not an integer
    pub fn get_int(&self, name: &str, default: i64) -> i64 {
        match self.values.get(name) {
            Some(PrefValue::Int(v)) => *v,
            _ => default,
        }
    }

    /// Whether failsafe mode is on
    pub fn failsafe_mode(&self) -> bool {
        self.get_bool(FAILSAFE_MODE, false)
    }

    /// The forced variant's name, trimmed. Empty means probing.
    pub fn force_variant(&self) -> &str {
        self.get_string(FORCE_VARIANT, "").trim()
    }

    /// Whether the details layout should be replaced
    pub fn use_layout_fix(&self) -> bool {
        self.get_bool(USE_LAYOUT_FIX, true)
    }
}

/// Adds read permission for others to `path`
#[cfg(unix)]
fn make_world_readable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    let mode = perms.mode();
    if mode & 0o004 == 0 {
        perms.set_mode(mode | 0o004);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}

/// No permission model to relax
#[cfg(not(unix))]
fn make_world_readable(_path: &Path) -> io::Result<()> {
    Ok(())
}
