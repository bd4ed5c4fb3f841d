//! Variants for the settings app as shipped by AOSP

use std::sync::Arc;

use crate::host::{CodeLoadInfo, HookValue, MethodCall, MethodTarget, Replacement};
use crate::patch::{PatchContext, PatchError};
use crate::res::ICON_WHITE;
use crate::variant::{
    hook_build_headers, is_target_of_interest, ApkVariant, TargetInfo, VariantDescriptor,
};
use crate::{APP_OPS_DETAILS_FRAGMENT, APP_OPS_FRAGMENT, SETTINGS_MAIN_ACTIVITY};

/// First API level with App Ops
pub const MIN_SDK: u32 = 18;
/// First API level that validates fragments hosted by the settings activity
pub const KITKAT_SDK: u32 = 19;

/// Registry entry of [`Aosp`]
pub const DESCRIPTOR: VariantDescriptor = VariantDescriptor {
    name: "AOSP",
    matches: matches_aosp,
    create: create_aosp,
};

/// Registry entry of [`AospKitKat`]
pub const KITKAT_DESCRIPTOR: VariantDescriptor = VariantDescriptor {
    name: "AOSP.KitKat",
    matches: matches_kitkat,
    create: create_kitkat,
};

/// Generic variant: adds the App Ops header to the main settings activity
#[derive(Debug, Default)]
pub struct Aosp;

impl ApkVariant for Aosp {
    fn name(&self) -> &'static str {
        DESCRIPTOR.name
    }

    fn supports_layout_fix(&self) -> bool {
        true
    }

    fn on_code_load(&mut self, ctx: &mut PatchContext<'_>, info: &CodeLoadInfo) -> Result<(), PatchError> {
        hook_build_headers(ctx, &info.class_loader, SETTINGS_MAIN_ACTIVITY, ICON_WHITE, false)
    }
}

/// [`Aosp`], plus allowing the App Ops fragments through fragment validation
#[derive(Debug, Default)]
pub struct AospKitKat;

impl ApkVariant for AospKitKat {
    fn name(&self) -> &'static str {
        KITKAT_DESCRIPTOR.name
    }

    fn supports_layout_fix(&self) -> bool {
        true
    }

    fn on_code_load(&mut self, ctx: &mut PatchContext<'_>, info: &CodeLoadInfo) -> Result<(), PatchError> {
        ctx.hook(
            Some(&info.class_loader),
            MethodTarget::new(SETTINGS_MAIN_ACTIVITY, "isValidFragment").param("java.lang.String"),
            Replacement::After(Arc::new(|call: &mut MethodCall| {
                if matches!(call.str_arg(0), Some(APP_OPS_FRAGMENT | APP_OPS_DETAILS_FRAGMENT)) {
                    call.result = Some(HookValue::Bool(true));
                }
            })),
        )?;
        Aosp.on_code_load(ctx, info)
    }
}

/// Any settings app on a device with App Ops
fn matches_aosp(target: &TargetInfo<'_>) -> bool {
    is_target_of_interest(target.package_name) && target.device.sdk_level >= MIN_SDK
}

/// Any settings app on KitKat or later
fn matches_kitkat(target: &TargetInfo<'_>) -> bool {
    is_target_of_interest(target.package_name) && target.device.sdk_level >= KITKAT_SDK
}

/// Creates an [`Aosp`]
fn create_aosp() -> Box<dyn ApkVariant> {
    Box::new(Aosp)
}

/// Creates an [`AospKitKat`]
fn create_kitkat() -> Box<dyn ApkVariant> {
    Box::new(AospKitKat)
}
