//! Seam to the external statistical runtime
//!
//! The runtime itself lives outside this crate. A [`RuntimeBridge`] resolves a
//! `(package, function)` pair to a callable handle; "does the package expose
//! this function" is answered by [`Resolution::NotFound`] rather than an error
//! so callers can tell a missing capability from a broken runtime.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BridgeError {
    #[error("Statistical runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("Failed to load package '{package}': {reason}")]
    PackageUnavailable { package: String, reason: String },

    #[error("{0}")]
    Invocation(String),
}

/// Callable entry point exposed by the runtime
pub trait BridgeFunction: Send + Sync {
    fn call(&self, args: &[Value], kwargs: &Map<String, Value>) -> Result<Value, BridgeError>;
}

impl<F> BridgeFunction for F
where
    F: Fn(&[Value], &Map<String, Value>) -> Result<Value, BridgeError> + Send + Sync,
{
    fn call(&self, args: &[Value], kwargs: &Map<String, Value>) -> Result<Value, BridgeError> {
        self(args, kwargs)
    }
}

pub enum Resolution {
    Found(Arc<dyn BridgeFunction>),
    /// The package loaded but has no function by that name
    NotFound,
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Found(_) => f.write_str("Found(<function>)"),
            Resolution::NotFound => f.write_str("NotFound"),
        }
    }
}

pub trait RuntimeBridge: Send + Sync {
    /// Locate `function` in `package`.
    ///
    /// `Err` means the runtime or the package could not be loaded at all.
    fn resolve(&self, package: &str, function: &str) -> Result<Resolution, BridgeError>;
}

/// Bridge used when no runtime is installed
#[derive(Debug, Clone)]
pub struct UnavailableBridge {
    reason: String,
}

impl UnavailableBridge {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for UnavailableBridge {
    fn default() -> Self {
        Self::new("no runtime bridge configured")
    }
}

impl RuntimeBridge for UnavailableBridge {
    fn resolve(&self, _package: &str, _function: &str) -> Result<Resolution, BridgeError> {
        Err(BridgeError::RuntimeUnavailable(self.reason.clone()))
    }
}

/// Bridge backed by functions registered in-process.
///
/// Packages are known once any function was registered for them; resolving
/// an unknown package fails with [`BridgeError::PackageUnavailable`].
#[derive(Default)]
pub struct InProcessBridge {
    packages: HashMap<String, HashMap<String, Arc<dyn BridgeFunction>>>,
}

impl InProcessBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, package: &str, function: &str, handler: F) -> &mut Self
    where
        F: BridgeFunction + 'static,
    {
        self.packages
            .entry(package.to_string())
            .or_default()
            .insert(function.to_string(), Arc::new(handler));
        self
    }

    pub fn with_function<F>(mut self, package: &str, function: &str, handler: F) -> Self
    where
        F: BridgeFunction + 'static,
    {
        self.register(package, function, handler);
        self
    }
}

impl RuntimeBridge for InProcessBridge {
    fn resolve(&self, package: &str, function: &str) -> Result<Resolution, BridgeError> {
        let functions = self
            .packages
            .get(package)
            .ok_or_else(|| BridgeError::PackageUnavailable {
                package: package.to_string(),
                reason: "package is not installed".to_string(),
            })?;
        Ok(match functions.get(function) {
            Some(handle) => Resolution::Found(Arc::clone(handle)),
            None => Resolution::NotFound,
        })
    }
}
