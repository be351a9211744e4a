//! The kernel bootstrap state machine.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use ignition_cache::{
    ArtifactCache, ArtifactDumper, CacheError, FreshnessPolicy, GenerationManager, LoadedArtifact,
};
use ignition_common::IdentityHasher;
use ignition_container::{AssemblyError, CompiledGraph, GraphBuilder, Resource};

use crate::container::{Container, KernelInfo};
use crate::deprecation::DeprecationCollector;
use crate::error::BootError;
use crate::hooks::KernelHooks;
use crate::http::{Request, RequestHandler, Response, REQUEST_HANDLER_ID};

/// Environment variable set to `3` on debug boots when the surrounding
/// environment hasn't set it. Informational only; nothing in the kernel
/// reads it back.
pub(crate) const VERBOSITY_ENV: &str = "IGNITION_VERBOSITY";

enum State {
    Unbooted,
    Booted {
        container: Arc<Container>,
        start_time: Option<SystemTime>,
    },
}

/// The bootstrap orchestrator.
///
/// Lifecycle is a single transition, `Unbooted -> Booted`, taken on the
/// first [`boot`](Self::boot); later calls are no-ops for the rest of the
/// process lifetime. Cloning yields an `Unbooted` kernel with no container
/// and no recorded start time.
pub struct Kernel<H: KernelHooks> {
    hooks: H,
    name: String,
    environment: String,
    debug: bool,
    project_dir: PathBuf,
    cache_dir_override: Option<PathBuf>,
    freshness_override: Option<FreshnessPolicy>,
    state: State,
    handler: Option<Box<dyn RequestHandler>>,
    handler_resolved: bool,
}

impl<H: KernelHooks> Kernel<H> {
    /// Creates an unbooted kernel.
    ///
    /// The project directory defaults to the nearest ancestor of the
    /// current directory containing a `Cargo.toml`, derived once here;
    /// override it with [`with_project_dir`](Self::with_project_dir).
    pub fn new(
        name: impl Into<String>,
        environment: impl Into<String>,
        debug: bool,
        hooks: H,
    ) -> Self {
        Self {
            hooks,
            name: name.into(),
            environment: environment.into(),
            debug,
            project_dir: default_project_dir(),
            cache_dir_override: None,
            freshness_override: None,
            state: State::Unbooted,
            handler: None,
            handler_resolved: false,
        }
    }

    /// Overrides the project root directory.
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = dir.into();
        self
    }

    /// Overrides the cache directory (default
    /// `{project_dir}/var/cache/{environment}`).
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir_override = Some(dir.into());
        self
    }

    /// Overrides the freshness policy (default: resource checks in debug
    /// mode, trust-existing otherwise).
    pub fn with_freshness_policy(mut self, policy: FreshnessPolicy) -> Self {
        self.freshness_override = Some(policy);
        self
    }

    /// The environment name.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Whether debug mode is enabled.
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// The project root directory.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// The cache directory artifacts are published under.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir_override.clone().unwrap_or_else(|| {
            self.project_dir
                .join("var")
                .join("cache")
                .join(&self.environment)
        })
    }

    /// Returns `true` once [`boot`](Self::boot) has succeeded.
    pub fn is_booted(&self) -> bool {
        matches!(self.state, State::Booted { .. })
    }

    /// The adopted container, if booted.
    pub fn container(&self) -> Option<Arc<Container>> {
        match &self.state {
            State::Booted { container, .. } => Some(Arc::clone(container)),
            State::Unbooted => None,
        }
    }

    /// The boot time; recorded only on debug boots.
    pub fn start_time(&self) -> Option<SystemTime> {
        match &self.state {
            State::Booted { start_time, .. } => *start_time,
            State::Unbooted => None,
        }
    }

    /// The stable container class name for this kernel's identity.
    ///
    /// Derived from the kernel name, environment, and debug flag, e.g.
    /// `AppDevDebugContainer` for (`app`, `dev`, debug).
    pub fn container_class(&self) -> String {
        format!(
            "{}{}{}Container",
            camelize(&self.name),
            camelize(&self.environment),
            if self.debug { "Debug" } else { "" }
        )
    }

    /// Boots the kernel, producing and adopting the container.
    ///
    /// Re-entrant: once booted, returns immediately. On the slow path this
    /// runs the full assemble → dump → publish → reload cycle described in
    /// the crate docs.
    pub fn boot(&mut self) -> Result<(), BootError> {
        if self.is_booted() {
            return Ok(());
        }

        let start_time = if self.debug {
            if std::env::var_os(VERBOSITY_ENV).is_none() {
                std::env::set_var(VERBOSITY_ENV, "3");
            }
            Some(SystemTime::now())
        } else {
            None
        };

        let container = self.initialize_container()?;
        self.state = State::Booted {
            container: Arc::new(container),
            start_time,
        };
        Ok(())
    }

    /// Handles a request through the container's handler component, or the
    /// built-in fallback when none is registered. Boots first if needed.
    pub fn handle(&mut self, request: &Request) -> Result<Response, BootError> {
        self.boot()?;

        if !self.handler_resolved {
            self.handler = self.resolve_handler();
            self.handler_resolved = true;
        }

        Ok(match &self.handler {
            Some(handler) => handler.handle(request),
            None => Response::fallback(),
        })
    }

    fn resolve_handler(&self) -> Option<Box<dyn RequestHandler>> {
        let container = self.container()?;
        if !container.has(REQUEST_HANDLER_ID) {
            return None;
        }
        self.hooks.request_handler(&container)
    }

    /// Loads the cached container when fresh, otherwise compiles, dumps,
    /// and publishes a new generation.
    fn initialize_container(&self) -> Result<Container, BootError> {
        let class = self.container_class();
        let cache_dir = self.cache_dir();
        let root_path = cache_dir.join(format!("{class}.root"));
        let policy = self
            .freshness_override
            .unwrap_or_else(|| FreshnessPolicy::for_debug(self.debug));

        let cache = ArtifactCache::new(root_path.clone(), policy);
        if cache.is_fresh() {
            if let Some(loaded) = LoadedArtifact::load(&root_path) {
                return Ok(Container::new(loaded, self.kernel_info(&class, &cache_dir)));
            }
            // Root exists but won't load: corrupt artifact, treat as stale.
            tracing::warn!(path = %root_path.display(), "cached artifact failed to load, recompiling");
        }

        prepare_cache_dir(&cache_dir)?;

        // Remember which generation is being superseded before the dump
        // overwrites the root file.
        let previous_generation =
            LoadedArtifact::load(&root_path).map(|a| a.manifest().generation.clone());

        let graph = self.assemble(&class, &cache_dir)?;

        let artifact = ArtifactDumper::new(&cache_dir).dump(&graph, &class)?;
        let loaded =
            LoadedArtifact::load(artifact.root_path()).ok_or_else(|| BootError::ArtifactReload {
                path: artifact.root_path().to_path_buf(),
            })?;

        GenerationManager::new(&cache_dir)
            .publish(artifact.generation(), previous_generation.as_deref());

        Ok(Container::new(loaded, self.kernel_info(&class, &cache_dir)))
    }

    /// Runs the hooks and compiler passes to produce a compiled graph.
    ///
    /// In debug mode the deprecation and compiler logs are written in both
    /// the success and the failure path.
    fn assemble(&self, class: &str, cache_dir: &Path) -> Result<CompiledGraph, BootError> {
        let mut builder = GraphBuilder::new();
        builder.set_parameter(
            "kernel.project_dir",
            self.project_dir.to_string_lossy().to_string(),
        );
        builder.set_parameter("kernel.environment", self.environment.clone());
        builder.set_parameter("kernel.debug", self.debug);
        builder.set_parameter("kernel.cache_dir", cache_dir.to_string_lossy().to_string());
        builder.set_parameter("kernel.container_class", class.to_string());

        // The artifact depends on the kernel's own identity.
        let mut identity = IdentityHasher::new();
        identity
            .update_str(&self.name)
            .update_str(&self.environment)
            .update(&[self.debug as u8]);
        builder.add_resource(Resource::opaque(
            "kernel",
            identity.finish().to_string().as_bytes(),
        ));

        let result = (|| -> Result<CompiledGraph, AssemblyError> {
            self.hooks.build(&mut builder);
            self.hooks.configure(&mut builder)?;
            builder.compile()
        })();

        if self.debug {
            self.write_diagnostics(class, cache_dir, &builder);
        }

        result.map_err(BootError::from)
    }

    /// Writes `{Class}Deprecations.log` and `{Class}Compiler.log`.
    ///
    /// Write failures are logged and swallowed; diagnostics never decide
    /// whether a boot succeeds.
    fn write_diagnostics(&self, class: &str, cache_dir: &Path, builder: &GraphBuilder) {
        let collector = DeprecationCollector::collect(builder.deprecations());
        let dep_path = cache_dir.join(format!("{class}Deprecations.log"));
        if let Err(e) = collector.write_log(&dep_path) {
            tracing::warn!(path = %dep_path.display(), error = %e, "failed to write deprecations log");
        }

        let log_path = cache_dir.join(format!("{class}Compiler.log"));
        if let Err(e) = std::fs::write(&log_path, builder.compiler_log().join("\n")) {
            tracing::warn!(path = %log_path.display(), error = %e, "failed to write compiler log");
        }
    }

    fn kernel_info(&self, class: &str, cache_dir: &Path) -> KernelInfo {
        KernelInfo {
            name: self.name.clone(),
            environment: self.environment.clone(),
            debug: self.debug,
            project_dir: self.project_dir.clone(),
            cache_dir: cache_dir.to_path_buf(),
            container_class: class.to_string(),
        }
    }
}

impl<H: KernelHooks + Clone> Clone for Kernel<H> {
    /// Clones the kernel's identity and configuration, resetting it to
    /// `Unbooted`: clones share no booted state.
    fn clone(&self) -> Self {
        Self {
            hooks: self.hooks.clone(),
            name: self.name.clone(),
            environment: self.environment.clone(),
            debug: self.debug,
            project_dir: self.project_dir.clone(),
            cache_dir_override: self.cache_dir_override.clone(),
            freshness_override: self.freshness_override,
            state: State::Unbooted,
            handler: None,
            handler_resolved: false,
        }
    }
}

/// Creates the cache directory and verifies it is writable.
fn prepare_cache_dir(dir: &Path) -> Result<(), CacheError> {
    std::fs::create_dir_all(dir).map_err(|e| CacheError::CacheDirUnavailable {
        path: dir.to_path_buf(),
        source: e,
    })?;

    // Probe writability with a short-lived file; a read-only mount fails
    // here rather than midway through a dump.
    let probe = dir.join(format!(".probe{}", std::process::id()));
    std::fs::write(&probe, b"").map_err(|e| CacheError::CacheDirUnavailable {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let _ = std::fs::remove_file(&probe);
    Ok(())
}

/// Walks up from the current directory to the nearest `Cargo.toml`.
fn default_project_dir() -> PathBuf {
    let start = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut dir = start.clone();
    loop {
        if dir.join("Cargo.toml").exists() {
            return dir;
        }
        if !dir.pop() {
            return start;
        }
    }
}

/// Upper-camel-cases a name, discarding non-alphanumeric separators.
fn camelize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper_next = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if upper_next {
                out.extend(c.to_uppercase());
                upper_next = false;
            } else {
                out.push(c);
            }
        } else {
            upper_next = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct NoHooks;
    impl KernelHooks for NoHooks {}

    #[test]
    fn camelize_names() {
        assert_eq!(camelize("app"), "App");
        assert_eq!(camelize("my-app"), "MyApp");
        assert_eq!(camelize("my_app_2"), "MyApp2");
        assert_eq!(camelize("dev"), "Dev");
    }

    #[test]
    fn container_class_shape() {
        let debug = Kernel::new("my-app", "dev", true, NoHooks);
        assert_eq!(debug.container_class(), "MyAppDevDebugContainer");

        let prod = Kernel::new("my-app", "prod", false, NoHooks);
        assert_eq!(prod.container_class(), "MyAppProdContainer");
    }

    #[test]
    fn cache_dir_default_and_override() {
        let kernel = Kernel::new("app", "dev", true, NoHooks)
            .with_project_dir("/project");
        assert_eq!(kernel.cache_dir(), PathBuf::from("/project/var/cache/dev"));

        let kernel = kernel.with_cache_dir("/elsewhere");
        assert_eq!(kernel.cache_dir(), PathBuf::from("/elsewhere"));
    }

    #[test]
    fn unbooted_kernel_has_no_container() {
        let kernel = Kernel::new("app", "dev", true, NoHooks);
        assert!(!kernel.is_booted());
        assert!(kernel.container().is_none());
        assert!(kernel.start_time().is_none());
    }

    #[test]
    fn clone_resets_booted_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut kernel = Kernel::new("app", "dev", true, NoHooks)
            .with_project_dir(dir.path())
            .with_cache_dir(dir.path().join("cache"));
        kernel.boot().unwrap();
        assert!(kernel.is_booted());

        let clone = kernel.clone();
        assert!(!clone.is_booted());
        assert!(clone.container().is_none());
        assert!(clone.start_time().is_none());
    }

    #[test]
    fn default_project_dir_is_absolute_or_current() {
        let dir = default_project_dir();
        assert!(!dir.as_os_str().is_empty());
    }

    #[test]
    fn cache_dir_unavailable_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("cache");
        // A file where the cache directory should be.
        std::fs::write(&blocker, b"").unwrap();

        let mut kernel = Kernel::new("app", "dev", true, NoHooks)
            .with_project_dir(dir.path())
            .with_cache_dir(&blocker);
        let err = kernel.boot().unwrap_err();
        assert!(matches!(
            err,
            BootError::Cache(CacheError::CacheDirUnavailable { .. })
        ));
        assert!(!kernel.is_booted());
    }
}
