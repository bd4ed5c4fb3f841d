//! Recording host used by the tests

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::host::{
    ClassLoader, CodeLoadInfo, DeviceInfo, HookHandle, HookValue, Host, HostError, MethodCall,
    MethodTarget, Replacement,
};
use crate::res::{ResourceBundle, ResourceTable};
use crate::{MODULE_PACKAGE, SETTINGS_PACKAGE};

/// A hook the engine asked for
#[derive(Debug, Clone)]
pub(crate) struct InstalledHook {
    /// Class loading context it was installed in
    pub(crate) loader: Option<ClassLoader>,
    /// Intercepted method
    pub(crate) target: MethodTarget,
    /// Replacement logic
    pub(crate) replacement: Replacement,
}

/// Host that records hooks instead of installing them
pub(crate) struct MockHost {
    /// Hooks installed so far
    hooks: RefCell<Vec<InstalledHook>>,
    /// Bundles that can be opened, by path
    bundles: HashMap<PathBuf, Arc<MockBundle>>,
    /// Classes that "don't exist" in the target
    missing_classes: HashSet<String>,
    /// Number of successful `open_bundle` calls
    opened: Cell<usize>,
    /// Device reported to variants
    device: DeviceInfo,
}

impl MockHost {
    /// Path of this module's binary
    pub(crate) const MODULE_PATH: &'static str = "/data/app/io.github.appopsrestore/base.apk";
    /// Path of the settings app's binary
    pub(crate) const SETTINGS_PATH: &'static str = "/system/priv-app/Settings/Settings.apk";

    /// Creates a host running a plain API 19 device with both bundles available
    pub(crate) fn new() -> Self {
        let own = MockBundle::new(Self::MODULE_PATH, MODULE_PACKAGE)
            .with("drawable/ic_appops_white", 0x7f02_0001, None)
            .with("drawable/ic_appops_black", 0x7f02_0002, None)
            .with("drawable/ic_appops_sense6", 0x7f02_0003, None)
            .with("drawable/ic_launcher2", 0x7f02_0004, None)
            .with("layout/app_ops_details_item", 0x7f03_0001, None);
        let settings = MockBundle::new(Self::SETTINGS_PATH, SETTINGS_PACKAGE)
            .with("string/app_ops_settings", 0x7f0b_0001, Some("App ops"));

        let mut bundles = HashMap::new();
        bundles.insert(PathBuf::from(Self::MODULE_PATH), Arc::new(own));
        bundles.insert(PathBuf::from(Self::SETTINGS_PATH), Arc::new(settings));

        Self {
            hooks: RefCell::new(Vec::new()),
            bundles,
            missing_classes: HashSet::new(),
            opened: Cell::new(0),
            device: DeviceInfo {
                manufacturer: "Google".to_owned(),
                sdk_level: 19,
            },
        }
    }

    /// Reports `manufacturer` instead of the default
    pub(crate) fn with_manufacturer(mut self, manufacturer: &str) -> Self {
        self.device.manufacturer = manufacturer.to_owned();
        self
    }

    /// Reports `sdk_level` instead of the default
    pub(crate) fn with_sdk(mut self, sdk_level: u32) -> Self {
        self.device.sdk_level = sdk_level;
        self
    }

    /// Makes hooking any method of `class` fail
    pub(crate) fn without_class(mut self, class: &str) -> Self {
        self.missing_classes.insert(class.to_owned());
        self
    }

    /// Replaces the settings bundle with one that lacks every string
    pub(crate) fn without_settings_strings(mut self) -> Self {
        self.bundles.insert(
            PathBuf::from(Self::SETTINGS_PATH),
            Arc::new(MockBundle::new(Self::SETTINGS_PATH, SETTINGS_PACKAGE)),
        );
        self
    }

    /// Makes `bundle` available at its path, replacing any bundle already there
    pub(crate) fn with_bundle(mut self, bundle: MockBundle) -> Self {
        self.bundles.insert(bundle.path.clone(), Arc::new(bundle));
        self
    }

    /// Removes our own bundle, as if the module's binary was corrupt
    pub(crate) fn without_module_bundle(mut self) -> Self {
        self.bundles.remove(Path::new(Self::MODULE_PATH));
        self
    }

    /// All hooks installed so far, in order
    pub(crate) fn hooks(&self) -> Vec<InstalledHook> {
        self.hooks.borrow().clone()
    }

    /// The hook installed on `class#method`, if any
    pub(crate) fn hook_for(&self, class: &str, method: &str) -> Option<InstalledHook> {
        self.hooks
            .borrow()
            .iter()
            .find(|h| h.target.class == class && h.target.method == method)
            .cloned()
    }

    /// Simulates a call to a hooked method whose original returns `original`
    pub(crate) fn call(
        &self,
        class: &str,
        method: &str,
        args: Vec<HookValue>,
        original: HookValue,
    ) -> MethodCall {
        let hook = self.hook_for(class, method).expect("method is not hooked");
        let mut call = MethodCall::new(args);
        match hook.replacement {
            Replacement::ReturnConstant(v) => call.result = Some(v),
            Replacement::Before(cb) => {
                cb(&mut call);
                if call.result.is_none() {
                    call.result = Some(original);
                }
            }
            Replacement::After(cb) => {
                call.result = Some(original);
                cb(&mut call);
            }
        }
        call
    }

    /// Number of bundles opened so far
    pub(crate) fn opened_bundles(&self) -> usize {
        self.opened.get()
    }
}

impl Host for MockHost {
    fn hook_method(
        &self,
        loader: Option<&ClassLoader>,
        target: &MethodTarget,
        replacement: Replacement,
    ) -> Result<HookHandle, HostError> {
        if self.missing_classes.contains(&target.class) {
            return Err(HostError::ClassNotFound(target.class.clone()));
        }
        let mut hooks = self.hooks.borrow_mut();
        hooks.push(InstalledHook {
            loader: loader.copied(),
            target: target.clone(),
            replacement,
        });
        Ok(HookHandle(hooks.len() as u64))
    }

    fn open_bundle(&self, path: &Path) -> Result<Arc<dyn ResourceBundle>, HostError> {
        let bundle = self.bundles.get(path).ok_or_else(|| HostError::Bundle {
            path: path.to_owned(),
            reason: "no such file".to_owned(),
        })?;
        self.opened.set(self.opened.get() + 1);
        Ok(bundle.clone())
    }

    fn device(&self) -> DeviceInfo {
        self.device.clone()
    }
}

/// In-memory resource bundle
pub(crate) struct MockBundle {
    /// Path it pretends to be loaded from
    path: PathBuf,
    /// Package owning the resources
    package: &'static str,
    /// `category/name` => id
    ids: HashMap<String, u32>,
    /// id => string value
    strings: HashMap<u32, String>,
}

impl MockBundle {
    /// Creates an empty bundle
    pub(crate) fn new(path: &str, package: &'static str) -> Self {
        Self {
            path: PathBuf::from(path),
            package,
            ids: HashMap::new(),
            strings: HashMap::new(),
        }
    }

    /// Adds a resource, optionally with a string value
    pub(crate) fn with(mut self, name: &str, id: u32, value: Option<&str>) -> Self {
        self.ids.insert(name.to_owned(), id);
        if let Some(value) = value {
            self.strings.insert(id, value.to_owned());
        }
        self
    }
}

impl ResourceBundle for MockBundle {
    fn path(&self) -> &Path {
        &self.path
    }

    fn identifier(&self, name: &str, package: &str) -> Option<u32> {
        if package != self.package {
            return None;
        }
        self.ids.get(name).copied()
    }

    fn string(&self, id: u32) -> Option<String> {
        self.strings.get(&id).cloned()
    }
}

/// Resource table recording what was registered in it
#[derive(Default)]
pub(crate) struct MockTable {
    /// (bundle path, own id) of every added resource
    pub(crate) added: Vec<(PathBuf, u32)>,
    /// (package, category, name, own id) of every replacement
    pub(crate) replacements: Vec<(String, String, String, u32)>,
}

impl MockTable {
    /// First id handed out by the table
    const FIRST_ID: u32 = 0x7e01_0000;

    /// Creates an empty table
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl ResourceTable for MockTable {
    fn add_resource(&mut self, bundle: &dyn ResourceBundle, id: u32) -> Result<u32, HostError> {
        self.added.push((bundle.path().to_owned(), id));
        Ok(Self::FIRST_ID + self.added.len() as u32)
    }

    fn set_replacement(
        &mut self,
        package: &str,
        category: &str,
        name: &str,
        _bundle: &dyn ResourceBundle,
        id: u32,
    ) -> Result<(), HostError> {
        self.replacements
            .push((package.to_owned(), category.to_owned(), name.to_owned(), id));
        Ok(())
    }
}

/// Code-load parameters for `package`
pub(crate) fn code_load(package: &str) -> CodeLoadInfo {
    CodeLoadInfo {
        package_name: package.to_owned(),
        process_name: package.to_owned(),
        source_dir: PathBuf::from(MockHost::SETTINGS_PATH),
        class_loader: ClassLoader(7),
        is_first_application: true,
    }
}
