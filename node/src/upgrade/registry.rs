use std::collections::BTreeMap;
use std::sync::Arc;

use gala_api::upgrade::{Plan, VersionMap};
use log::debug;

use crate::store::BlockContext;
use crate::upgrade::{UpgradeEnv, UpgradeError};

/// Code run inside the block that reaches a plan's height.
///
/// Handlers only read committed state and the plan. The returned version map
/// replaces the stored one.
pub trait UpgradeHandler: Send + Sync {
    fn name(&self) -> &str;

    fn handle(
        &self,
        ctx: &mut BlockContext<'_>,
        plan: &Plan,
        from: VersionMap,
        env: &UpgradeEnv<'_>,
    ) -> Result<VersionMap, UpgradeError>;
}

/// Collects handlers during startup. Registering the same name twice keeps
/// the later handler.
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: BTreeMap<String, Arc<dyn UpgradeHandler>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn UpgradeHandler>) -> &mut Self {
        let name = handler.name().to_string();
        if self.handlers.insert(name.clone(), handler).is_some() {
            debug!("upgrade handler {name} registered again");
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}

/// Plan name to handler, fixed once block processing starts.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn UpgradeHandler>>,
}

impl HandlerRegistry {
    pub fn get(&self, name: &str) -> Option<&Arc<dyn UpgradeHandler>> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
