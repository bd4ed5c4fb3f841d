//! Keeps the App Ops screen from crashing on ops without a permission

use std::sync::Arc;

use crate::hack::{Hack, APP_OPS_MANAGER};
use crate::host::{BootstrapInfo, HookValue, MethodCall, MethodTarget, Replacement};
use crate::patch::{PatchContext, PatchError};

/// Reports an empty permission name for ops that have none.
///
/// The App Ops screen passes the permission of each op to the package manager, which crashes
/// on `null`. The hook is installed at bootstrap so every process inherits it.
#[derive(Debug, Default)]
pub struct PmCrashHack;

impl Hack for PmCrashHack {
    fn name(&self) -> &'static str {
        "PmCrashHack"
    }

    fn on_process_bootstrap(
        &mut self,
        ctx: &mut PatchContext<'_>,
        _info: &BootstrapInfo,
    ) -> Result<(), PatchError> {
        ctx.hook(
            None,
            MethodTarget::new(APP_OPS_MANAGER, "opToPermission").param("int"),
            Replacement::After(Arc::new(|call: &mut MethodCall| {
                if matches!(call.result, None | Some(HookValue::Null)) {
                    call.result = Some(HookValue::Str(String::new()));
                }
            })),
        )?;
        Ok(())
    }
}
