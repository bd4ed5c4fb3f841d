//! Keeps apps with a denied wake lock from crashing

use std::sync::Arc;

use crate::hack::{
    Hack, APP_OPS_SERVICE, FRAMEWORK_PACKAGE, MODE_ERRORED, MODE_IGNORED, OP_WAKE_LOCK,
};
use crate::host::{CodeLoadInfo, HookValue, MethodCall, MethodTarget, Replacement};
use crate::patch::{PatchContext, PatchError};

/// Turns an "errored" wake lock op into "ignored".
///
/// Apps get a security exception for errored ops, which most of them don't expect when
/// acquiring a wake lock. Ignored ops fail silently instead.
#[derive(Debug, Default)]
pub struct WakeLockHack;

impl Hack for WakeLockHack {
    fn name(&self) -> &'static str {
        "WakeLockHack"
    }

    fn on_code_load(
        &mut self,
        ctx: &mut PatchContext<'_>,
        info: &CodeLoadInfo,
    ) -> Result<(), PatchError> {
        if info.package_name != FRAMEWORK_PACKAGE {
            return Ok(());
        }

        ctx.hook(
            Some(&info.class_loader),
            MethodTarget::new(APP_OPS_SERVICE, "noteOperation")
                .param("int")
                .param("int")
                .param("java.lang.String"),
            Replacement::After(Arc::new(|call: &mut MethodCall| {
                if call.int_arg(0) == Some(OP_WAKE_LOCK)
                    && call.result == Some(HookValue::Int(MODE_ERRORED))
                {
                    call.result = Some(HookValue::Int(MODE_IGNORED));
                }
            })),
        )?;
        Ok(())
    }
}
