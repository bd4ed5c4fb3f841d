//! # Resources
//!
//! This module bridges our own resource bundle and the target's.
//! Own resources are registered in the target's table while it is being built; target
//! resources are looked up by name once the target's code is loaded.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::host::{Host, HostError};
use crate::patch::PatchError;
use crate::{MODULE_PACKAGE, SETTINGS_PACKAGE};

/// A loaded resource bundle, either ours or the target's
pub trait ResourceBundle {
    /// Path of the binary the bundle was loaded from
    fn path(&self) -> &Path;
    /// Resolves `category/name` in `package` to a resource id
    fn identifier(&self, name: &str, package: &str) -> Option<u32>;
    /// Reads a string resource
    fn string(&self, id: u32) -> Option<String>;
}

/// The target's resource table, while it is being constructed
pub trait ResourceTable {
    /// Copies resource `id` of `bundle` into the table and returns the id it got there
    fn add_resource(&mut self, bundle: &dyn ResourceBundle, id: u32) -> Result<u32, HostError>;
    /// Makes lookups of `category/name` in `package` resolve to resource `id` of `bundle`
    fn set_replacement(
        &mut self,
        package: &str,
        category: &str,
        name: &str,
        bundle: &dyn ResourceBundle,
        id: u32,
    ) -> Result<(), HostError>;
}

/// Symbolic name of one of our own resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceName {
    /// Resource category, e.g. `drawable`
    pub category: &'static str,
    /// Entry name within the category
    pub name: &'static str,
}
impl ResourceName {
    /// Creates a resource name
    pub const fn new(category: &'static str, name: &'static str) -> Self {
        Self { category, name }
    }
}
impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

/// Header icon for light themes
pub const ICON_WHITE: ResourceName = ResourceName::new("drawable", "ic_appops_white");
/// Header icon for dark themes
pub const ICON_BLACK: ResourceName = ResourceName::new("drawable", "ic_appops_black");
/// Header icon matching HTC Sense
pub const ICON_SENSE: ResourceName = ResourceName::new("drawable", "ic_appops_sense6");
/// Launcher icon
pub const LAUNCHER_ICON: ResourceName = ResourceName::new("drawable", "ic_launcher2");
/// Replacement layout for a row of the App Ops details screen
pub const DETAILS_ITEM_LAYOUT: ResourceName = ResourceName::new("layout", "app_ops_details_item");

/// Icons registered in every target resource table
pub const ICONS: [ResourceName; 4] = [ICON_WHITE, ICON_BLACK, ICON_SENSE, LAUNCHER_ICON];

/// Holds our bundle, the target's bundle and the ids our resources got in the target's table
#[derive(Default)]
pub struct ResourceBridge {
    /// This module's bundle, loaded at bootstrap
    own: Option<Arc<dyn ResourceBundle>>,
    /// The target's bundle and its package, loaded the first time its code is loaded
    target: Option<(String, Arc<dyn ResourceBundle>)>,
    /// Ids handed out by the table currently being built. Entries are never changed while that
    /// table is built.
    registered: BTreeMap<ResourceName, u32>,
}

impl ResourceBridge {
    /// Creates an empty bridge
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads this module's bundle. Calling this again is a no-op.
    pub fn load_own<H: Host + ?Sized>(
        &mut self,
        host: &H,
        module_path: &Path,
    ) -> Result<&Arc<dyn ResourceBundle>, HostError> {
        let own = match &mut self.own {
            Some(own) => own,
            slot => slot.insert(host.open_bundle(module_path)?),
        };
        Ok(&*own)
    }

    /// Loads the bundle of the target `package` on the first call; later calls return the
    /// cached bundle.
    ///
    /// Lookups in the target resolve names in `package`.
    pub fn load_target<H: Host + ?Sized>(
        &mut self,
        host: &H,
        package: &str,
        target_path: &Path,
    ) -> Result<&Arc<dyn ResourceBundle>, HostError> {
        let (_, target) = match &mut self.target {
            Some(target) => target,
            slot => {
                debug!("loading {package} resources from {}", target_path.display());
                slot.insert((package.to_owned(), host.open_bundle(target_path)?))
            }
        };
        Ok(&*target)
    }

    /// Our bundle, if loaded
    pub fn own(&self) -> Option<&Arc<dyn ResourceBundle>> {
        self.own.as_ref()
    }

    /// The target's bundle, if loaded
    pub fn target(&self) -> Option<&Arc<dyn ResourceBundle>> {
        self.target.as_ref().map(|(_, bundle)| bundle)
    }

    /// Package of the target, if its bundle is loaded
    pub fn target_package(&self) -> Option<&str> {
        self.target.as_ref().map(|(package, _)| package.as_str())
    }

    /// Starts registering into a new resource table.
    ///
    /// Ids handed out by the previous table mean nothing in the new one, so they're forgotten.
    pub fn begin_table(&mut self) {
        self.registered.clear();
    }

    /// Registers one of our resources in the target's table and returns its id there.
    ///
    /// Registering the same name again in the same table returns the first id without touching
    /// the table. See [`ResourceBridge::begin_table`].
    pub fn register(
        &mut self,
        table: &mut dyn ResourceTable,
        name: ResourceName,
    ) -> Result<u32, PatchError> {
        if let Some(&id) = self.registered.get(&name) {
            return Ok(id);
        }

        let own = self.own.as_deref().ok_or(PatchError::BundleNotLoaded("module"))?;
        let own_id = own_id(own, name)?;
        let id = table.add_resource(own, own_id)?;
        debug!("registered {name} as 0x{id:08x}");

        self.registered.insert(name, id);
        Ok(id)
    }

    /// Makes the target's `target_category/target_name` resolve to our resource `name`
    pub fn register_replacement(
        &self,
        table: &mut dyn ResourceTable,
        name: ResourceName,
        target_category: &str,
        target_name: &str,
    ) -> Result<(), PatchError> {
        let own = self.own.as_deref().ok_or(PatchError::BundleNotLoaded("module"))?;
        let own_id = own_id(own, name)?;
        table.set_replacement(SETTINGS_PACKAGE, target_category, target_name, own, own_id)?;
        Ok(())
    }

    /// Id our resource `name` got in the target's table, or 0 if it isn't registered
    pub fn registered_id(&self, name: ResourceName) -> u32 {
        self.registered.get(&name).copied().unwrap_or(0)
    }

    /// Looks up `category/name` in the target's bundle. Returns 0 if it's not there or the bundle isn't loaded.
    pub fn lookup_target_resource_id(&self, name: &str) -> u32 {
        self.target
            .as_ref()
            .and_then(|(package, target)| target.identifier(name, package))
            .unwrap_or(0)
    }

    /// Reads the target's string resource `string/name`
    pub fn target_string(&self, name: &str) -> Option<String> {
        let id = self.lookup_target_resource_id(&format!("string/{name}"));
        if id == 0 {
            return None;
        }
        self.target()?.string(id)
    }
}

/// Resolves one of our resources in our own bundle
fn own_id(own: &dyn ResourceBundle, name: ResourceName) -> Result<u32, PatchError> {
    own.identifier(&name.to_string(), MODULE_PACKAGE)
        .filter(|&id| id != 0)
        .ok_or_else(|| PatchError::MissingResource(name.to_string()))
}
