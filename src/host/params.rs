//! Parameters handed to the engine at each lifecycle stage

use std::path::PathBuf;

use crate::res::ResourceTable;

/// Opaque handle to the class loading context of a loaded binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassLoader(pub u64);

/// Basic facts about the device, used by variants to recognize a layout
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceInfo {
    /// Manufacturer string as reported by the build properties
    pub manufacturer: String,
    /// Platform API level
    pub sdk_level: u32,
}

/// Process bootstrap, run once per boot before any app process is forked
#[derive(Debug, Clone)]
pub struct BootstrapInfo {
    /// Path of this module's own binary
    pub module_path: PathBuf,
    /// Whether the framework process will be started from here
    pub start_system_server: bool,
}

/// Resource-table construction for a package
pub struct ResourceInitInfo<'a> {
    /// Package whose resource table is being built
    pub package_name: String,
    /// The table being built. Registrations are only honored while this stage runs.
    pub res: &'a mut dyn ResourceTable,
}

/// A package's code being loaded into a process
#[derive(Debug, Clone)]
pub struct CodeLoadInfo {
    /// Package being loaded
    pub package_name: String,
    /// Name of the process it's being loaded into
    pub process_name: String,
    /// Path of the package's binary
    pub source_dir: PathBuf,
    /// Class loading context of the package
    pub class_loader: ClassLoader,
    /// Whether this is the first package loaded into the process
    pub is_first_application: bool,
}
