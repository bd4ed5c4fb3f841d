//! # Engine
//!
//! This module dispatches hacks and variants across the host's lifecycle stages.
//!
//! The host calls one of the `on_*` methods of [`EngineContext`] at every stage. Each patch runs
//! inside a failure boundary: errors and panics are logged, recorded in the [`StageReport`] and
//! then ignored, so one broken patch never keeps the others from running. The only exception is a
//! variant forced by the user, whose failure is returned to the host.

pub mod report;

use std::path::Path;

use log::{debug, info, warn};
use thiserror::Error;

use crate::config::ConfigStore;
use crate::hack::{Hack, HackCatalog};
use crate::host::{
    BootstrapInfo, CodeLoadInfo, HookValue, Host, MethodTarget, Replacement, ResourceInitInfo,
};
use crate::logging::log_error;
use crate::patch::{PatchContext, PatchError};
use crate::res::{self, ResourceBridge};
use crate::variant::{self, TargetInfo, VariantCatalog};
use crate::{MODULE_PACKAGE, SETTINGS_PACKAGE};

pub use report::{EntryKind, ReportEntry, Stage, StageReport};

use report::isolate;

/// Class of the module's UI holding the "is the module active" query
pub const MODULE_STATUS_CLASS: &str = "io.github.appopsrestore.util.Util";
/// The "is the module active" query; it returns `false` unless we hook it
pub const MODULE_STATUS_METHOD: &str = "isModuleActive";

/// Errors returned to the host
#[derive(Debug, Error)]
pub enum EngineError {
    /// The forced variant's name isn't in the catalog
    #[error("unknown variant `{0}`")]
    UnknownVariant(String),
    /// The forced variant failed to apply
    #[error("forced variant `{name}` failed")]
    ForcedVariant {
        /// Name of the variant
        name: String,
        /// Why it failed
        #[source]
        source: PatchError,
    },
}

/// State of the engine in one process
pub struct EngineContext<H> {
    /// Hooking primitives
    host: H,
    /// Settings, loaded once
    config: ConfigStore,
    /// Our resources and the target's
    resources: ResourceBridge,
    /// Independent patches
    hacks: HackCatalog,
    /// Layout adapters, most specific first
    variants: VariantCatalog,
}

impl<H: Host> EngineContext<H> {
    /// Creates an engine with the built-in hacks and variants
    pub fn new(host: H, config: ConfigStore) -> Self {
        Self::with_catalogs(host, config, HackCatalog::builtin(), VariantCatalog::builtin())
    }

    /// Creates an engine with custom catalogs
    pub fn with_catalogs(host: H, config: ConfigStore, hacks: HackCatalog, variants: VariantCatalog) -> Self {
        Self {
            host,
            config,
            resources: ResourceBridge::new(),
            hacks,
            variants,
        }
    }

    /// Creates an engine with the built-in catalogs and the settings stored at `prefs_path`.
    ///
    /// Unreadable settings are logged and replaced by the defaults.
    pub fn load(host: H, prefs_path: &Path) -> Self {
        Self::new(host, ConfigStore::load_or_default(prefs_path))
    }

    /// The host
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The settings
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// The resource bridge
    pub fn resources(&self) -> &ResourceBridge {
        &self.resources
    }

    /// Process bootstrap: loads our resources and runs the hacks' bootstrap hooks.
    ///
    /// Failing to load our resources is logged; hacks still run.
    pub fn on_process_bootstrap(&mut self, info: &BootstrapInfo) -> StageReport {
        let mut report = StageReport::new(Stage::ProcessBootstrap);

        if let Err(e) = self.resources.load_own(&self.host, &info.module_path) {
            settle(&mut report, EntryKind::Resource, "module", Err(e.into()));
        }

        if self.config.failsafe_mode() {
            info!("Running in failsafe mode");
            return report;
        }

        let (mut ctx, hacks, _) = self.split();
        dispatch_hacks(&mut report, &mut ctx, hacks, false, |hack, ctx| {
            hack.on_process_bootstrap(ctx, info)
        });
        report
    }

    /// Resource-table construction: registers our icons and the first matching variant's
    /// resources, then runs the hacks' resource hooks.
    ///
    /// Every call registers into the fresh table in `info`. Packages other than the settings app
    /// are left alone.
    pub fn on_resource_init(&mut self, info: &mut ResourceInitInfo<'_>) -> StageReport {
        let mut report = StageReport::new(Stage::ResourceInit);
        if self.config.failsafe_mode() || !variant::is_target_of_interest(&info.package_name) {
            return report;
        }

        let device = self.host.device();
        let (mut ctx, hacks, variants) = self.split();

        ctx.resources.begin_table();
        for icon in res::ICONS {
            let result = isolate(|| ctx.resources.register(&mut *info.res, icon).map(drop));
            settle(&mut report, EntryKind::Resource, icon.name, result);
        }

        let use_layout_fix = info.package_name == SETTINGS_PACKAGE && ctx.config.use_layout_fix();
        let matching = variants.get_all_matching(&TargetInfo {
            package_name: &info.package_name,
            device: &device,
        });
        if let Some(descriptor) = matching.first() {
            let mut variant = (descriptor.create)();
            if use_layout_fix && variant.supports_layout_fix() {
                let layout = res::DETAILS_ITEM_LAYOUT;
                let result = isolate(|| {
                    ctx.resources
                        .register_replacement(&mut *info.res, layout, layout.category, layout.name)
                });
                settle(&mut report, EntryKind::Resource, layout.name, result);
            }

            let result = isolate(|| variant.on_resource_init(&mut ctx, info));
            settle(&mut report, EntryKind::Variant, variant.name(), result);
        }

        dispatch_hacks(&mut report, &mut ctx, hacks, true, |hack, ctx| {
            hack.on_resource_init(ctx, info)
        });
        report
    }

    /// Code load: runs the hacks' code hooks, then applies a variant if the package is the
    /// settings app.
    ///
    /// Without a forced variant, matching variants are probed until one applies. A forced variant
    /// is applied without probing, and its failure is returned.
    pub fn on_code_load(&mut self, info: &CodeLoadInfo) -> Result<StageReport, EngineError> {
        let mut report = StageReport::new(Stage::CodeLoad);
        let is_target = variant::is_target_of_interest(&info.package_name);
        let (mut ctx, hacks, variants) = self.split();
        let config = ctx.config;

        if info.package_name == MODULE_PACKAGE {
            let result = isolate(|| report_module_active(&mut ctx, info));
            settle(&mut report, EntryKind::SelfPatch, MODULE_STATUS_METHOD, result);
        }

        if config.failsafe_mode() {
            if is_target {
                info!("Running in failsafe mode");
                let result = isolate(|| variant::hook_is_valid_fragment(&mut ctx, &info.class_loader));
                settle(&mut report, EntryKind::Fallback, "isValidFragment", result);
            }
            return Ok(report);
        }

        dispatch_hacks(&mut report, &mut ctx, hacks, true, |hack, ctx| {
            hack.on_code_load(ctx, info)
        });
        if !is_target {
            return Ok(report);
        }

        let target = ctx.resources.load_target(ctx.host, &info.package_name, &info.source_dir);
        if let Err(e) = target {
            settle(&mut report, EntryKind::Resource, "target", Err(e.into()));
        }

        let forced = config.force_variant();
        if forced.is_empty() {
            let device = ctx.host.device();
            let target = TargetInfo {
                package_name: &info.package_name,
                device: &device,
            };
            probe_variants(&mut report, &mut ctx, variants, &target, info);
            return Ok(report);
        }

        info!("Using forced variant: {forced}");
        let descriptor = variants
            .resolve(forced)
            .ok_or_else(|| EngineError::UnknownVariant(forced.to_owned()))?;
        let mut variant = (descriptor.create)();
        variant
            .on_code_load(&mut ctx, info)
            .map_err(|source| EngineError::ForcedVariant {
                name: forced.to_owned(),
                source,
            })?;
        info!("  {}: [OK]", variant.name());
        report.record(EntryKind::Variant, variant.name(), Ok(()));
        Ok(report)
    }

    /// Borrows the patch context and both catalogs at once
    fn split(&mut self) -> (PatchContext<'_>, &HackCatalog, &VariantCatalog) {
        let ctx = PatchContext {
            host: &self.host,
            config: &self.config,
            resources: &mut self.resources,
        };
        (ctx, &self.hacks, &self.variants)
    }
}

/// Runs `hook` on every enabled hack, each inside a failure boundary
fn dispatch_hacks<F>(
    report: &mut StageReport,
    ctx: &mut PatchContext<'_>,
    hacks: &HackCatalog,
    require_code_load: bool,
    mut hook: F,
) where
    F: FnMut(&mut dyn Hack, &mut PatchContext<'_>) -> Result<(), PatchError>,
{
    for mut hack in hacks.get_all_enabled(ctx.config, require_code_load) {
        let name = hack.name();
        let result = isolate(|| hook(hack.as_mut(), ctx));
        settle(report, EntryKind::Hack, name, result);
    }
}

/// Tries the variants matching `target` in order, until one applies
fn probe_variants(
    report: &mut StageReport,
    ctx: &mut PatchContext<'_>,
    variants: &VariantCatalog,
    target: &TargetInfo<'_>,
    info: &CodeLoadInfo,
) {
    info!("Trying variants...");
    for descriptor in variants.get_all_matching(target) {
        let mut variant = (descriptor.create)();
        let name = variant.name();
        match isolate(|| variant.on_code_load(ctx, info)) {
            Ok(()) => {
                info!("  {name}: [OK]");
                report.record(EntryKind::Variant, name, Ok(()));
                return;
            }
            Err(e) => {
                warn!("  {name}: [!!]");
                log_error(&e);
                report.record(EntryKind::Variant, name, Err(e));
            }
        }
    }
    warn!("no variant applies to {}, leaving it unpatched", target.package_name);
}

/// Makes the module's UI see the module as active
fn report_module_active(ctx: &mut PatchContext<'_>, info: &CodeLoadInfo) -> Result<(), PatchError> {
    ctx.hook(
        Some(&info.class_loader),
        MethodTarget::new(MODULE_STATUS_CLASS, MODULE_STATUS_METHOD),
        Replacement::ReturnConstant(HookValue::Bool(true)),
    )?;
    debug!("module reports itself active");
    Ok(())
}

/// Logs a failed attempt and records the outcome
fn settle(report: &mut StageReport, kind: EntryKind, name: &'static str, result: Result<(), PatchError>) {
    if let Err(e) = &result {
        warn!("{name}: [!!]");
        log_error(e);
    }
    report.record(kind, name, result);
}
