//! Samsung's TouchWiz settings app

use crate::host::CodeLoadInfo;
use crate::patch::{PatchContext, PatchError};
use crate::res::ICON_BLACK;
use crate::variant::aosp::MIN_SDK;
use crate::variant::{hook_build_headers, is_target_of_interest, ApkVariant, TargetInfo, VariantDescriptor};

/// Registry entry of [`Samsung`]
pub const DESCRIPTOR: VariantDescriptor = VariantDescriptor {
    name: "Samsung",
    matches,
    create,
};

/// Activity building the header list in grid view
pub const GRID_SETTINGS: &str = "com.android.settings.GridSettings";

/// TouchWiz shows the headers in a grid activity and themes icons dark
#[derive(Debug, Default)]
pub struct Samsung;

impl ApkVariant for Samsung {
    fn name(&self) -> &'static str {
        DESCRIPTOR.name
    }

    fn on_code_load(&mut self, ctx: &mut PatchContext<'_>, info: &CodeLoadInfo) -> Result<(), PatchError> {
        hook_build_headers(ctx, &info.class_loader, GRID_SETTINGS, ICON_BLACK, true)
    }
}

/// Settings apps on Samsung devices
fn matches(target: &TargetInfo<'_>) -> bool {
    is_target_of_interest(target.package_name)
        && target.device.sdk_level >= MIN_SDK
        && target.device.manufacturer.eq_ignore_ascii_case("samsung")
}

/// Creates a [`Samsung`]
fn create() -> Box<dyn ApkVariant> {
    Box::new(Samsung)
}
