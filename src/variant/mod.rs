//! # Variants
//!
//! This module contains the layout adapters for the settings app.
//!
//! Vendors ship their own settings app, so the classes we need to hook differ between devices.
//! Each [`ApkVariant`] knows one of those layouts. They are mutually exclusive: the catalog is
//! probed from the most specific variant to the most generic one, and the first that applies
//! successfully wins.

pub mod aosp;
pub mod htc;
pub mod samsung;

use std::fmt;
use std::sync::Arc;

use crate::host::{
    ClassLoader, CodeLoadInfo, DeviceInfo, HookValue, MethodCall, MethodTarget, Replacement,
    ResourceInitInfo, SettingsHeader,
};
use crate::patch::{PatchContext, PatchError};
use crate::res::ResourceName;
use crate::{APP_OPS_FRAGMENT, SETTINGS_MAIN_ACTIVITY, SETTINGS_PACKAGE};

pub use aosp::{Aosp, AospKitKat};
pub use htc::Htc;
pub use samsung::Samsung;

/// Packages we patch. The first one is the canonical settings app.
pub const TARGET_PACKAGES: [&str; 2] = [SETTINGS_PACKAGE, "com.htc.settings"];

/// Name of the string resource holding the App Ops title in the settings app
pub const APP_OPS_TITLE: &str = "app_ops_settings";

/// Whether `package` is a settings app we patch
pub fn is_target_of_interest(package: &str) -> bool {
    TARGET_PACKAGES.contains(&package)
}

/// A layout adapter for one family of settings apps
pub trait ApkVariant {
    /// Name used in logs and to force the variant
    fn name(&self) -> &'static str;

    /// Whether our replacement layout for the details screen fits this layout
    fn supports_layout_fix(&self) -> bool {
        false
    }

    /// Runs while the settings app's resource table is built
    fn on_resource_init(
        &mut self,
        _ctx: &mut PatchContext<'_>,
        _info: &mut ResourceInitInfo<'_>,
    ) -> Result<(), PatchError> {
        Ok(())
    }

    /// Installs the variant's hooks into the loaded settings app.
    ///
    /// An error means the layout isn't the one this variant knows, and the next one is tried.
    fn on_code_load(&mut self, ctx: &mut PatchContext<'_>, info: &CodeLoadInfo) -> Result<(), PatchError>;
}

/// What variants are matched against
#[derive(Debug, Clone, Copy)]
pub struct TargetInfo<'a> {
    /// Package of the settings app
    pub package_name: &'a str,
    /// The device it runs on
    pub device: &'a DeviceInfo,
}

/// Statically known variant: a name, a predicate and a constructor
#[derive(Clone, Copy)]
pub struct VariantDescriptor {
    /// Name of the variant, as it's entered to force it
    pub name: &'static str,
    /// Whether the variant may apply to a target
    pub matches: fn(&TargetInfo<'_>) -> bool,
    /// Creates an instance
    pub create: fn() -> Box<dyn ApkVariant>,
}
impl fmt::Debug for VariantDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VariantDescriptor").field(&self.name).finish()
    }
}

/// Every variant shipped with the module, from most to least specific
pub const BUILTIN: [VariantDescriptor; 4] = [
    samsung::DESCRIPTOR,
    htc::DESCRIPTOR,
    aosp::KITKAT_DESCRIPTOR,
    aosp::DESCRIPTOR,
];

/// Ordered list of variants.
///
/// Order is the probing order. Names are unique; forcing a variant looks it up by name.
#[derive(Debug, Clone, Default)]
pub struct VariantCatalog {
    /// Variants, most specific first
    entries: Vec<VariantDescriptor>,
}

impl VariantCatalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// The variants shipped with the module
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN.to_vec(),
        }
    }

    /// Appends `entry`, which is then probed after every variant already in the catalog
    pub fn with(mut self, entry: VariantDescriptor) -> Self {
        self.entries.push(entry);
        self
    }

    /// All variants, in probing order
    pub fn entries(&self) -> &[VariantDescriptor] {
        &self.entries
    }

    /// Variants whose predicate accepts `target`, in probing order
    pub fn get_all_matching(&self, target: &TargetInfo<'_>) -> Vec<&VariantDescriptor> {
        self.entries.iter().filter(|e| (e.matches)(target)).collect()
    }

    /// Looks up a variant by its exact name
    pub fn resolve(&self, name: &str) -> Option<&VariantDescriptor> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Lets the main settings activity host any fragment.
///
/// This is the only hook installed in failsafe mode. It keeps the App Ops fragments usable
/// when launched directly, without touching the header list.
pub fn hook_is_valid_fragment(ctx: &mut PatchContext<'_>, loader: &ClassLoader) -> Result<(), PatchError> {
    ctx.hook(
        Some(loader),
        MethodTarget::new(SETTINGS_MAIN_ACTIVITY, "isValidFragment").param("java.lang.String"),
        Replacement::ReturnConstant(HookValue::Bool(true)),
    )?;
    Ok(())
}

/// Adds the App Ops header to the list built by `class#onBuildHeaders`.
///
/// The title is the target's own string if it has one. With `require_title`, a target without
/// it is not the layout we're looking for.
pub(crate) fn hook_build_headers(
    ctx: &mut PatchContext<'_>,
    loader: &ClassLoader,
    class: &str,
    icon: ResourceName,
    require_title: bool,
) -> Result<(), PatchError> {
    let title = match ctx.resources.target_string(APP_OPS_TITLE) {
        Some(title) => title,
        None if require_title => {
            return Err(PatchError::MissingResource(format!("string/{APP_OPS_TITLE}")))
        }
        None => "App ops".to_owned(),
    };
    let header = HookValue::Header(SettingsHeader {
        fragment: APP_OPS_FRAGMENT.to_owned(),
        title,
        icon_id: ctx.resources.registered_id(icon),
    });

    ctx.hook(
        Some(loader),
        MethodTarget::new(class, "onBuildHeaders").param("java.util.List"),
        Replacement::After(Arc::new(move |call: &mut MethodCall| {
            if let Some(HookValue::List(headers)) = call.args.first_mut() {
                if !headers.contains(&header) {
                    headers.push(header.clone());
                }
            }
        })),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::host::DeviceInfo;
    use crate::variant::{is_target_of_interest, TargetInfo, VariantCatalog};

    /// Names of the built-in variants matching `package` on `device`
    fn matching(package: &str, manufacturer: &str, sdk_level: u32) -> Vec<&'static str> {
        let device = DeviceInfo {
            manufacturer: manufacturer.to_owned(),
            sdk_level,
        };
        let target = TargetInfo {
            package_name: package,
            device: &device,
        };
        VariantCatalog::builtin()
            .get_all_matching(&target)
            .iter()
            .map(|e| e.name)
            .collect()
    }

    #[test]
    /// Only settings apps are patched
    fn test_target_of_interest() {
        assert!(is_target_of_interest("com.android.settings"));
        assert!(is_target_of_interest("com.htc.settings"));
        assert!(!is_target_of_interest("com.android.settings.intelligence"));
        assert!(!is_target_of_interest("android"));
    }

    #[test]
    /// Vendor variants come before the generic ones, which are ordered by API level
    fn test_matching_order() {
        assert_eq!(
            matching("com.android.settings", "samsung", 19),
            ["Samsung", "AOSP.KitKat", "AOSP"]
        );
        assert_eq!(matching("com.android.settings", "HTC", 18), ["HTC", "AOSP"]);
        assert_eq!(matching("com.android.settings", "Google", 19), ["AOSP.KitKat", "AOSP"]);
        assert!(matching("com.android.settings", "Google", 17).is_empty());
        assert!(matching("com.android.launcher", "Google", 19).is_empty());
    }

    #[test]
    /// Forced names are matched exactly against the catalog
    fn test_resolve() {
        let catalog = VariantCatalog::builtin();

        assert_eq!(catalog.resolve("AOSP.KitKat").map(|e| e.name), Some("AOSP.KitKat"));
        assert_eq!(catalog.resolve("HTC").map(|e| (e.create)().name()), Some("HTC"));
        assert!(catalog.resolve("aosp").is_none());
        assert!(catalog.resolve("AOSP$KitKat").is_none());
        assert!(catalog.resolve("").is_none());
    }
}
