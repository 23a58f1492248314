//! Per-module state: the registry, cached host terms, and load/upgrade/unload.

use std::sync::Arc;

use tracing::debug;

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::registry::BufferRegistry;

/// Opaque host value (an atom or other term) as seen from native code.
pub type Term = u64;

/// Name under which the tensor resource type is registered with the host.
pub const RESOURCE_TYPE_NAME: &str = "Numy.Tensor";

/// The part of the host environment needed at module load.
pub trait HostEnv {
    /// Intern `name` as a host atom.
    fn make_atom(&self, name: &str) -> Term;
}

/// Environment used when the host supplies none: `ok` and `false` are 0,
/// `true` is 1, matching C conventions.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticTerms;

impl HostEnv for StaticTerms {
    fn make_atom(&self, name: &str) -> Term {
        match name {
            "true" => 1,
            _ => 0,
        }
    }
}

/// Atoms interned once at load and reused by every call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachedTerms {
    /// The `ok` atom.
    pub ok: Term,
    /// The `true` atom.
    pub true_term: Term,
    /// The `false` atom.
    pub false_term: Term,
}

impl CachedTerms {
    fn capture(env: &dyn HostEnv) -> Self {
        Self {
            ok: env.make_atom("ok"),
            true_term: env.make_atom("true"),
            false_term: env.make_atom("false"),
        }
    }

    /// The host term for `value`.
    pub fn boolean(&self, value: bool) -> Term {
        if value {
            self.true_term
        } else {
            self.false_term
        }
    }
}

/// State owned by one loaded instance of the native module.
#[derive(Debug)]
pub struct ModuleContext {
    registry: Arc<BufferRegistry>,
    terms: CachedTerms,
    epoch: u32,
}

impl ModuleContext {
    /// Initialise a fresh module: validate `config`, create an empty
    /// registry and intern the cached atoms.
    pub fn load(env: &dyn HostEnv, config: RegistryConfig) -> Result<Self, RegistryError> {
        let registry = Arc::new(BufferRegistry::new(config)?);
        let terms = CachedTerms::capture(env);
        debug!(resource_type = RESOURCE_TYPE_NAME, "module loaded");
        Ok(Self {
            registry,
            terms,
            epoch: 0,
        })
    }

    /// Hot upgrade: the new instance takes over `previous`'s registry, so
    /// every outstanding handle stays valid. Atoms are re-interned.
    pub fn upgrade(previous: &ModuleContext, env: &dyn HostEnv) -> Self {
        let epoch = previous.epoch.wrapping_add(1);
        debug!(epoch, "module upgraded; registry taken over");
        Self {
            registry: Arc::clone(&previous.registry),
            terms: CachedTerms::capture(env),
            epoch,
        }
    }

    /// Tear down this instance.
    ///
    /// Live buffers are destroyed only when nothing else (an upgraded
    /// instance or an outstanding [`TensorResource`](crate::TensorResource))
    /// still shares the registry. Returns the number of buffers freed.
    pub fn unload(self) -> Result<usize, RegistryError> {
        if Arc::strong_count(&self.registry) > 1 {
            debug!(epoch = self.epoch, "module unloaded; registry still shared");
            return Ok(0);
        }
        let freed = self.registry.destroy_all()?;
        debug!(epoch = self.epoch, freed, "module unloaded");
        Ok(freed)
    }

    /// The registry of this instance.
    pub fn registry(&self) -> &Arc<BufferRegistry> {
        &self.registry
    }

    /// Atoms cached at load.
    pub fn terms(&self) -> CachedTerms {
        self.terms
    }

    /// Number of upgrades since the original load.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Host-visible name of the tensor resource type.
    pub fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE_NAME
    }
}
