//! # Hacks
//!
//! This module contains the independent patch units.
//!
//! Unlike variants, every enabled hack is applied; none of them depends on another or on the
//! layout of the settings app. Each one is switched on by its own setting.

pub mod boot_completed;
pub mod pm_crash;
pub mod wake_lock;

use log::debug;

use crate::config::ConfigStore;
use crate::host::{BootstrapInfo, CodeLoadInfo, ResourceInitInfo};
use crate::patch::{PatchContext, PatchError};

pub use boot_completed::BootCompletedHack;
pub use pm_crash::PmCrashHack;
pub use wake_lock::WakeLockHack;

/// Package of the framework process
pub const FRAMEWORK_PACKAGE: &str = "android";
/// Service that checks and records app ops in the framework process
pub const APP_OPS_SERVICE: &str = "com.android.server.AppOpsService";
/// Client-side view of app ops, available on the boot class path
pub const APP_OPS_MANAGER: &str = "android.app.AppOpsManager";

/// `AppOpsManager.OP_VIBRATE`
pub const OP_VIBRATE: i64 = 3;
/// `AppOpsManager.OP_POST_NOTIFICATION`
pub const OP_POST_NOTIFICATION: i64 = 11;
/// `AppOpsManager.OP_WAKE_LOCK`
pub const OP_WAKE_LOCK: i64 = 40;

/// `AppOpsManager.MODE_ALLOWED`
pub const MODE_ALLOWED: i64 = 0;
/// `AppOpsManager.MODE_IGNORED`
pub const MODE_IGNORED: i64 = 1;
/// `AppOpsManager.MODE_ERRORED`
pub const MODE_ERRORED: i64 = 2;

/// An independent patch unit.
///
/// Every stage hook does nothing by default. A fresh instance is created for every stage it runs
/// in, so state that has to outlive a stage must live in the installed callbacks.
pub trait Hack {
    /// Name used in logs and reports
    fn name(&self) -> &'static str;

    /// Runs once per boot, before any app process exists
    fn on_process_bootstrap(
        &mut self,
        _ctx: &mut PatchContext<'_>,
        _info: &BootstrapInfo,
    ) -> Result<(), PatchError> {
        Ok(())
    }

    /// Runs while the resource table of a settings package is built
    fn on_resource_init(
        &mut self,
        _ctx: &mut PatchContext<'_>,
        _info: &mut ResourceInitInfo<'_>,
    ) -> Result<(), PatchError> {
        Ok(())
    }

    /// Runs whenever a package's code is loaded
    fn on_code_load(
        &mut self,
        _ctx: &mut PatchContext<'_>,
        _info: &CodeLoadInfo,
    ) -> Result<(), PatchError> {
        Ok(())
    }
}

/// Creates a hack instance
pub type HackFactory = Box<dyn Fn() -> Box<dyn Hack>>;

/// A hack in the catalog, along with the setting that enables it
pub struct HackEntry {
    /// Setting that enables the hack. Without one the hack is always `enabled_by_default`.
    pref_key: Option<&'static str>,
    /// Whether the hack is on when its setting is absent
    enabled_by_default: bool,
    /// Whether the hack does anything in the resource-init or code-load stages
    requires_code_load: bool,
    /// Instantiates the hack
    factory: HackFactory,
}

impl HackEntry {
    /// Creates an entry that's enabled and runs in every stage
    pub fn new(factory: impl Fn() -> Box<dyn Hack> + 'static) -> Self {
        Self {
            pref_key: None,
            enabled_by_default: true,
            requires_code_load: true,
            factory: Box::new(factory),
        }
    }

    /// Makes the hack depend on the boolean setting `key`
    pub fn pref_key(mut self, key: &'static str) -> Self {
        self.pref_key = Some(key);
        self
    }

    /// Sets whether the hack is on when its setting is absent
    pub fn enabled_by_default(mut self, enabled: bool) -> Self {
        self.enabled_by_default = enabled;
        self
    }

    /// Restricts the hack to process bootstrap
    pub fn bootstrap_only(mut self) -> Self {
        self.requires_code_load = false;
        self
    }

    /// Whether `config` enables the hack
    pub fn is_enabled(&self, config: &ConfigStore) -> bool {
        match self.pref_key {
            Some(key) => config.get_bool(key, self.enabled_by_default),
            None => self.enabled_by_default,
        }
    }

    /// Whether the hack does anything after bootstrap
    pub fn requires_code_load(&self) -> bool {
        self.requires_code_load
    }

    /// Creates a fresh instance
    pub fn instantiate(&self) -> Box<dyn Hack> {
        (self.factory)()
    }
}

/// Ordered list of hacks. Order is insertion order and is the order hacks are applied in.
#[derive(Default)]
pub struct HackCatalog {
    /// Entries, in application order
    entries: Vec<HackEntry>,
}

impl HackCatalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// The hacks shipped with the module. All of them are off unless the user enables them.
    pub fn builtin() -> Self {
        Self::new()
            .with(
                HackEntry::new(|| Box::new(BootCompletedHack::new()))
                    .pref_key("use_hack_boot_completed")
                    .enabled_by_default(false),
            )
            .with(
                HackEntry::new(|| Box::new(WakeLockHack))
                    .pref_key("use_hack_wake_lock")
                    .enabled_by_default(false),
            )
            .with(
                HackEntry::new(|| Box::new(PmCrashHack))
                    .pref_key("use_hack_pm_crash")
                    .enabled_by_default(false)
                    .bootstrap_only(),
            )
    }

    /// Appends `entry`
    pub fn push(&mut self, entry: HackEntry) {
        self.entries.push(entry);
    }

    /// Appends `entry` and returns the catalog
    pub fn with(mut self, entry: HackEntry) -> Self {
        self.push(entry);
        self
    }

    /// All entries, in order
    pub fn entries(&self) -> &[HackEntry] {
        &self.entries
    }

    /// Instantiates the hacks `config` enables, in catalog order.
    ///
    /// With `require_code_load`, hacks that only act at bootstrap are left out.
    pub fn get_all_enabled(&self, config: &ConfigStore, require_code_load: bool) -> Vec<Box<dyn Hack>> {
        let hacks: Vec<_> = self
            .entries
            .iter()
            .filter(|e| e.is_enabled(config))
            .filter(|e| !require_code_load || e.requires_code_load)
            .map(HackEntry::instantiate)
            .collect();
        debug!("{} of {} hacks enabled", hacks.len(), self.entries.len());
        hacks
    }
}
