//! # Patch
//!
//! This module covers what hacks and variants work with while applying their patches, and how they fail

use log::debug;
use thiserror::Error;

use crate::config::ConfigStore;
use crate::host::{ClassLoader, HookHandle, Host, HostError, MethodTarget, Replacement};
use crate::res::ResourceBridge;

/// Error returned from any patch hook.
///
/// The engine never lets one of these escape a stage, except when the user forced a variant.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The host refused or failed a hooking request
    #[error(transparent)]
    Host(#[from] HostError),
    /// A resource the patch depends on is not present in the bundle that should provide it
    #[error("resource `{0}` not found")]
    MissingResource(String),
    /// A required bundle has not been loaded yet
    #[error("{0} resources are not loaded")]
    BundleNotLoaded(&'static str),
    /// The patch panicked; the payload message is kept if it was a string
    #[error("panicked: {0}")]
    Panicked(String),
}

/// Everything a patch may use while it runs
pub struct PatchContext<'a> {
    /// Hooking primitives
    pub host: &'a dyn Host,
    /// The module's settings
    pub config: &'a ConfigStore,
    /// Our resources and the target's
    pub resources: &'a mut ResourceBridge,
}

impl PatchContext<'_> {
    /// Installs `replacement` on `target`, see [`Host::hook_method`]
    pub fn hook(
        &self,
        loader: Option<&ClassLoader>,
        target: MethodTarget,
        replacement: Replacement,
    ) -> Result<HookHandle, PatchError> {
        let handle = self.host.hook_method(loader, &target, replacement)?;
        debug!("hooked {target}");
        Ok(handle)
    }
}
