//! HTC's Sense settings app

use crate::host::CodeLoadInfo;
use crate::patch::{PatchContext, PatchError};
use crate::res::ICON_SENSE;
use crate::variant::aosp::MIN_SDK;
use crate::variant::{hook_build_headers, is_target_of_interest, ApkVariant, TargetInfo, VariantDescriptor};
use crate::SETTINGS_MAIN_ACTIVITY;

/// Registry entry of [`Htc`]
pub const DESCRIPTOR: VariantDescriptor = VariantDescriptor {
    name: "HTC",
    matches,
    create,
};

/// Sense keeps the AOSP activity but uses its own icon style
#[derive(Debug, Default)]
pub struct Htc;

impl ApkVariant for Htc {
    fn name(&self) -> &'static str {
        DESCRIPTOR.name
    }

    fn on_code_load(&mut self, ctx: &mut PatchContext<'_>, info: &CodeLoadInfo) -> Result<(), PatchError> {
        hook_build_headers(ctx, &info.class_loader, SETTINGS_MAIN_ACTIVITY, ICON_SENSE, true)
    }
}

/// Settings apps on HTC devices
fn matches(target: &TargetInfo<'_>) -> bool {
    is_target_of_interest(target.package_name)
        && target.device.sdk_level >= MIN_SDK
        && target.device.manufacturer.eq_ignore_ascii_case("htc")
}

/// Creates an [`Htc`]
fn create() -> Box<dyn ApkVariant> {
    Box::new(Htc)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::config::ConfigStore;
    use crate::host::mock::{code_load, MockHost, MockTable};
    use crate::host::{HookValue, SettingsHeader};
    use crate::res::{ResourceBridge, ICONS, ICON_SENSE};
    use crate::variant::htc::Htc;
    use crate::variant::ApkVariant;
    use crate::{PatchContext, APP_OPS_FRAGMENT, SETTINGS_MAIN_ACTIVITY};

    #[test]
    /// The header uses the Sense icon registered at resource-init
    fn test_sense_icon() {
        let host = MockHost::new().with_manufacturer("HTC");
        let config = ConfigStore::default();
        let mut resources = ResourceBridge::new();
        resources.load_own(&host, Path::new(MockHost::MODULE_PATH)).unwrap();
        let mut table = MockTable::new();
        for icon in ICONS {
            resources.register(&mut table, icon).unwrap();
        }
        resources
            .load_target(&host, "com.android.settings", Path::new(MockHost::SETTINGS_PATH))
            .unwrap();
        let sense = resources.registered_id(ICON_SENSE);

        let mut ctx = PatchContext {
            host: &host,
            config: &config,
            resources: &mut resources,
        };
        Htc.on_code_load(&mut ctx, &code_load("com.android.settings")).unwrap();

        let call = host.call(
            SETTINGS_MAIN_ACTIVITY,
            "onBuildHeaders",
            vec![HookValue::List(Vec::new())],
            HookValue::Null,
        );
        assert_eq!(
            call.args[0],
            HookValue::List(vec![HookValue::Header(SettingsHeader {
                fragment: APP_OPS_FRAGMENT.to_owned(),
                title: "App ops".to_owned(),
                icon_id: sense,
            })])
        );
        assert_ne!(sense, 0);
    }
}
