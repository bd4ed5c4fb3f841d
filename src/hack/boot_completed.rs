//! Lets notification and vibrate ops through until boot completes

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::hack::{
    Hack, APP_OPS_SERVICE, FRAMEWORK_PACKAGE, MODE_ALLOWED, OP_POST_NOTIFICATION, OP_VIBRATE,
};
use crate::host::{CodeLoadInfo, HookValue, MethodCall, MethodTarget, Replacement};
use crate::patch::{PatchContext, PatchError};

/// Service whose `finishBooting` marks the end of boot
pub const ACTIVITY_MANAGER_SERVICE: &str = "com.android.server.am.ActivityManagerService";

/// Ops that are checked before settings are fully restored during boot, causing them to be
/// denied even when the user allowed them
pub const EARLY_OPS: [i64; 2] = [OP_POST_NOTIFICATION, OP_VIBRATE];

/// Reports [`EARLY_OPS`] as allowed until the framework finishes booting
#[derive(Debug, Default)]
pub struct BootCompletedHack {
    /// Set once boot has completed; shared with both installed callbacks
    booted: Arc<AtomicBool>,
}

impl BootCompletedHack {
    /// Creates the hack for a process that hasn't finished booting
    pub fn new() -> Self {
        Self::default()
    }
}

impl Hack for BootCompletedHack {
    fn name(&self) -> &'static str {
        "BootCompletedHack"
    }

    fn on_code_load(
        &mut self,
        ctx: &mut PatchContext<'_>,
        info: &CodeLoadInfo,
    ) -> Result<(), PatchError> {
        if info.package_name != FRAMEWORK_PACKAGE {
            return Ok(());
        }
        let loader = Some(&info.class_loader);

        let booted = self.booted.clone();
        ctx.hook(
            loader,
            MethodTarget::new(ACTIVITY_MANAGER_SERVICE, "finishBooting"),
            Replacement::After(Arc::new(move |_: &mut MethodCall| booted.store(true, Ordering::Release))),
        )?;

        let booted = self.booted.clone();
        ctx.hook(
            loader,
            MethodTarget::new(APP_OPS_SERVICE, "checkOperation")
                .param("int")
                .param("int")
                .param("java.lang.String"),
            Replacement::After(Arc::new(move |call: &mut MethodCall| {
                if booted.load(Ordering::Acquire) {
                    return;
                }
                if call.int_arg(0).is_some_and(|op| EARLY_OPS.contains(&op)) {
                    call.result = Some(HookValue::Int(MODE_ALLOWED));
                }
            })),
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ConfigStore;
    use crate::hack::boot_completed::{BootCompletedHack, ACTIVITY_MANAGER_SERVICE};
    use crate::hack::{
        Hack, APP_OPS_SERVICE, MODE_ALLOWED, MODE_ERRORED, MODE_IGNORED, OP_VIBRATE, OP_WAKE_LOCK,
    };
    use crate::host::mock::{code_load, MockHost};
    use crate::host::HookValue;
    use crate::res::ResourceBridge;
    use crate::PatchContext;

    /// Result of `checkOperation(op, ..)` when the original returned `original`
    fn check(host: &MockHost, op: i64, original: i64) -> Option<HookValue> {
        host.call(
            APP_OPS_SERVICE,
            "checkOperation",
            vec![HookValue::Int(op), HookValue::Int(1000), HookValue::Str("app".into())],
            HookValue::Int(original),
        )
        .result
    }

    #[test]
    /// Early ops are allowed until `finishBooting` ran, other ops are never touched
    fn test_allows_until_booted() {
        let host = MockHost::new();
        let config = ConfigStore::default();
        let mut resources = ResourceBridge::new();
        let mut ctx = PatchContext {
            host: &host,
            config: &config,
            resources: &mut resources,
        };

        BootCompletedHack::new()
            .on_code_load(&mut ctx, &code_load("android"))
            .unwrap();
        assert_eq!(host.hooks().len(), 2);

        assert_eq!(check(&host, OP_VIBRATE, MODE_IGNORED), Some(HookValue::Int(MODE_ALLOWED)));
        assert_eq!(check(&host, OP_WAKE_LOCK, MODE_ERRORED), Some(HookValue::Int(MODE_ERRORED)));

        host.call(ACTIVITY_MANAGER_SERVICE, "finishBooting", vec![], HookValue::Null);

        assert_eq!(check(&host, OP_VIBRATE, MODE_IGNORED), Some(HookValue::Int(MODE_IGNORED)));
    }

    #[test]
    /// Nothing is hooked outside the framework process
    fn test_other_package() {
        let host = MockHost::new();
        let config = ConfigStore::default();
        let mut resources = ResourceBridge::new();
        let mut ctx = PatchContext {
            host: &host,
            config: &config,
            resources: &mut resources,
        };

        BootCompletedHack::new()
            .on_code_load(&mut ctx, &code_load("com.android.settings"))
            .unwrap();
        assert!(host.hooks().is_empty());
    }
}
