//! Execution adapter
//!
//! Invokes `(package, function)` through the runtime bridge, falling back to
//! a local implementation when the runtime cannot provide the function. Every
//! outcome is folded into a [`ToolResult`]; nothing here returns `Err` or
//! panics on bad input.
//!
//! Resolution order:
//! 1. resolve through the bridge; a missing runtime, package or function is
//!    remembered as the unavailability reason
//! 2. a resolved function is invoked directly and its failure is final
//! 3. otherwise a registered fallback runs with the same arguments
//! 4. with neither, the remembered reason becomes the error message

pub mod bridge;
pub mod fallbacks;
pub mod result;

use crate::catalog::{Catalog, RepoSource};
use crate::router::{PackageMatch, Router, RouterOptions};
use crate::table::normalize_value;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub use bridge::{
    BridgeError, BridgeFunction, InProcessBridge, Resolution, RuntimeBridge, UnavailableBridge,
};
pub use fallbacks::{FallbackError, FallbackFn, FallbackKey, FallbackRegistry};
pub use result::{ToolResult, ToolStatus};

pub const NOT_IN_CATALOG_NOTE: &str = "Executed function successfully but the package was not present in the local registry. Consider refreshing the package list.";

pub struct ExecutionAdapter {
    catalog: Arc<Catalog>,
    bridge: Arc<dyn RuntimeBridge>,
    fallbacks: FallbackRegistry,
    router: Router,
    router_options: RouterOptions,
    repo_source: Option<Arc<dyn RepoSource>>,
    organisations: Vec<String>,
}

impl ExecutionAdapter {
    /// Adapter without a runtime; only the built-in fallbacks can execute
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            bridge: Arc::new(UnavailableBridge::default()),
            fallbacks: FallbackRegistry::with_defaults(),
            router: Router::new(),
            router_options: RouterOptions::default(),
            repo_source: None,
            organisations: Vec::new(),
        }
    }

    pub fn with_bridge(mut self, bridge: Arc<dyn RuntimeBridge>) -> Self {
        self.bridge = bridge;
        self
    }

    pub fn with_fallbacks(mut self, fallbacks: FallbackRegistry) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    pub fn with_router_options(mut self, options: RouterOptions) -> Self {
        self.router_options = options;
        self
    }

    /// Source and organisations used by `list_packages(true)`
    pub fn with_repo_source(
        mut self,
        source: Arc<dyn RepoSource>,
        organisations: Vec<String>,
    ) -> Self {
        self.repo_source = Some(source);
        self.organisations = organisations;
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn fallbacks(&self) -> &FallbackRegistry {
        &self.fallbacks
    }

    /// Whether either the bridge or a fallback can serve the function
    pub fn can_execute(&self, package: &str, function: &str) -> bool {
        self.fallbacks.contains(package, function)
            || matches!(
                self.bridge.resolve(package, function),
                Ok(Resolution::Found(_))
            )
    }

    /// Invoke `package::function` with positional and named arguments.
    ///
    /// With `auto_convert`, tabular arguments and results are marshalled
    /// into the dataframe envelope.
    pub fn call_function(
        &self,
        package: &str,
        function: &str,
        args: &[Value],
        kwargs: &Map<String, Value>,
        auto_convert: bool,
    ) -> ToolResult {
        let package_known = self.catalog.has_package(package);

        let unavailable = match self.bridge.resolve(package, function) {
            Ok(Resolution::Found(handle)) => {
                log::debug!("Invoking {}::{} through the runtime bridge", package, function);
                return self.invoke_bridge(handle.as_ref(), args, kwargs, auto_convert, package_known);
            }
            Ok(Resolution::NotFound) => format!(
                "Package '{}' does not expose a callable named '{}'",
                package, function
            ),
            Err(e) => e.to_string(),
        };

        let Some(fallback) = self.fallbacks.get(package, function) else {
            log::debug!("No runtime or fallback for {}::{}: {}", package, function, unavailable);
            return ToolResult::error(unavailable);
        };

        log::info!(
            "Using local fallback for {}::{} ({})",
            package,
            function,
            unavailable
        );
        match fallback(args, kwargs) {
            Ok(data) => {
                let mut notes = vec![format!(
                    "Executed local fallback for {}::{} because the runtime was unavailable: {}.",
                    package, function, unavailable
                )];
                if !package_known {
                    notes.push(NOT_IN_CATALOG_NOTE.to_string());
                }
                ToolResult::success(data).with_message(notes.join(" "))
            }
            Err(e) => ToolResult::error(format!(
                "Local fallback for {}::{} failed: {}",
                package, function, e
            )),
        }
    }

    fn invoke_bridge(
        &self,
        handle: &dyn BridgeFunction,
        args: &[Value],
        kwargs: &Map<String, Value>,
        auto_convert: bool,
        package_known: bool,
    ) -> ToolResult {
        let outcome = if auto_convert {
            let args: Vec<Value> = args.iter().cloned().map(normalize_value).collect();
            let kwargs: Map<String, Value> = kwargs
                .iter()
                .map(|(k, v)| (k.clone(), normalize_value(v.clone())))
                .collect();
            handle.call(&args, &kwargs).map(normalize_value)
        } else {
            handle.call(args, kwargs)
        };

        match outcome {
            Ok(data) => {
                let result = ToolResult::success(data);
                if package_known {
                    result
                } else {
                    result.with_message(NOT_IN_CATALOG_NOTE)
                }
            }
            Err(e) => ToolResult::error(e.to_string()),
        }
    }

    /// Catalogue listing, optionally refreshed from the remote source first
    pub async fn list_packages(&self, refresh: bool) -> ToolResult {
        let packages = if refresh {
            let Some(source) = &self.repo_source else {
                return ToolResult::error("No repository source configured for refresh");
            };
            match self.catalog.refresh(source.as_ref(), &self.organisations).await {
                Ok(packages) => packages,
                Err(e) => return ToolResult::error(e.to_string()),
            }
        } else {
            self.catalog.sorted_packages()
        };

        let payloads: Vec<Value> = packages.iter().map(|p| p.to_payload()).collect();
        ToolResult::success(json!({ "packages": payloads }))
    }

    pub fn find_matches(&self, query: &str) -> Vec<PackageMatch> {
        self.router
            .find_relevant_packages(query, &self.catalog, &self.router_options)
    }

    /// Router matches for `query` as payloads
    pub fn find_tools(&self, query: &str) -> Vec<Value> {
        self.find_matches(query)
            .iter()
            .map(PackageMatch::to_payload)
            .collect()
    }
}
