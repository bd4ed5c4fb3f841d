//! # Host
//!
//! This module covers the primitives the hooking framework hands to us.
//! The engine never intercepts anything itself; hacks and variants describe *what* to replace
//! and the host performs the replacement.

#[cfg(test)]
pub(crate) mod mock;
pub mod params;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::res::ResourceBundle;

pub use params::{BootstrapInfo, ClassLoader, CodeLoadInfo, DeviceInfo, ResourceInitInfo};

/// Errors reported by the host when a primitive can't be carried out
#[derive(Debug, Error)]
pub enum HostError {
    /// The class is not visible through the given class loader
    #[error("class `{0}` not found")]
    ClassNotFound(String),
    /// The class exists, but no method matches the signature
    #[error("method `{0}` not found")]
    MethodNotFound(MethodTarget),
    /// A resource bundle could not be opened or is corrupt
    #[error("can't open resource bundle {path}: {reason}")]
    Bundle {
        /// Path of the bundle
        path: PathBuf,
        /// Host-provided description of the failure
        reason: String,
    },
    /// The target's resource table refused a registration
    #[error("resource table rejected `{0}`")]
    Rejected(String),
}

/// The primitives a hooking framework provides to the engine
pub trait Host {
    /// Intercepts calls to `target` and runs `replacement` instead of, or around, the original.
    ///
    /// `loader` is the class loading context of the loaded binary; `None` means the boot class path.
    /// Hooks stay installed for the rest of the process' life.
    fn hook_method(
        &self,
        loader: Option<&ClassLoader>,
        target: &MethodTarget,
        replacement: Replacement,
    ) -> Result<HookHandle, HostError>;

    /// Opens the resource bundle of the binary at `path`
    fn open_bundle(&self, path: &Path) -> Result<Arc<dyn ResourceBundle>, HostError>;

    /// Describes the device we're running on
    fn device(&self) -> DeviceInfo;
}

/// Opaque id of an installed hook, as handed out by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(pub u64);

/// A method signature to intercept
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodTarget {
    /// Fully qualified class name
    pub class: String,
    /// Method name
    pub method: String,
    /// Fully qualified parameter types, in order
    pub params: Vec<String>,
}
impl MethodTarget {
    /// Creates a target for a method without parameters
    pub fn new(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
            params: Vec::new(),
        }
    }

    /// Appends a parameter type to the signature
    pub fn param(mut self, ty: impl Into<String>) -> Self {
        self.params.push(ty.into());
        self
    }
}
impl fmt::Display for MethodTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}({})", self.class, self.method, self.params.join(", "))
    }
}

/// Replacement logic for an intercepted method
#[derive(Clone)]
pub enum Replacement {
    /// Skip the original and return this value
    ReturnConstant(HookValue),
    /// Runs before the original. Setting [`MethodCall::result`] skips the original.
    Before(Callback),
    /// Runs after the original with [`MethodCall::result`] holding its return value
    After(Callback),
}
impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReturnConstant(v) => f.debug_tuple("ReturnConstant").field(v).finish(),
            Self::Before(_) => f.write_str("Before(..)"),
            Self::After(_) => f.write_str("After(..)"),
        }
    }
}

/// Callback run by the host, possibly on any thread
pub type Callback = Arc<dyn Fn(&mut MethodCall) + Send + Sync>;

/// One intercepted invocation, as seen by a [`Callback`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodCall {
    /// Arguments of the call
    pub args: Vec<HookValue>,
    /// Return value; see [`Replacement`] for its meaning in each position
    pub result: Option<HookValue>,
}
impl MethodCall {
    /// Creates a call with the given arguments and no result yet
    pub fn new(args: Vec<HookValue>) -> Self {
        Self { args, result: None }
    }

    /// Integer argument at `index`, if there is one
    pub fn int_arg(&self, index: usize) -> Option<i64> {
        self.args.get(index).and_then(HookValue::as_int)
    }

    /// String argument at `index`, if there is one
    pub fn str_arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).and_then(HookValue::as_str)
    }
}

/// Values crossing the hook boundary
#[derive(Debug, Clone, PartialEq)]
pub enum HookValue {
    /// `null`
    Null,
    /// A boolean
    Bool(bool),
    /// Any integral value
    Int(i64),
    /// A string
    Str(String),
    /// A mutable list, such as the header list passed to `onBuildHeaders`
    List(Vec<HookValue>),
    /// A settings header entry
    Header(SettingsHeader),
}
impl HookValue {
    /// Returns the integer, if this is one
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string, if this is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }
}

/// An entry in the settings header list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsHeader {
    /// Fragment opened by the header
    pub fragment: String,
    /// Title shown for the header
    pub title: String,
    /// Icon id, already registered in the target's resource table (0 for none)
    pub icon_id: u32,
}
