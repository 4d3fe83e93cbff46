use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Module name to consensus version.
pub type VersionMap = BTreeMap<String, u64>;

/// When a migration becomes eligible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// The node schedules the plan itself once the chain reaches this height.
    Height(u64),
    /// The plan is scheduled on-chain; the node only provides the handler.
    Governance,
}

/// A versioned migration compiled into the binary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationDescriptor {
    pub name: &'static str,
    pub trigger: Trigger,
    pub info: &'static str,
    /// May be passed over when a later migration already ran.
    pub skippable: bool,
}

impl MigrationDescriptor {
    pub const fn at_height(name: &'static str, height: u64, info: &'static str) -> Self {
        Self {
            name,
            trigger: Trigger::Height(height),
            info,
            skippable: false,
        }
    }

    pub const fn governance(name: &'static str, info: &'static str) -> Self {
        Self {
            name,
            trigger: Trigger::Governance,
            info,
            skippable: false,
        }
    }

    pub const fn skippable(mut self) -> Self {
        self.skippable = true;
        self
    }

    pub fn trigger_height(&self) -> Option<u64> {
        match self.trigger {
            Trigger::Height(height) => Some(height),
            Trigger::Governance => None,
        }
    }

    /// The plan to schedule given the last committed height. A trigger
    /// that already passed lands on the next block.
    pub fn plan_at(&self, current_height: u64) -> Option<Plan> {
        let trigger = self.trigger_height()?;
        Some(Plan {
            name: self.name.to_string(),
            height: trigger.max(current_height + 1),
            info: self.info.to_string(),
        })
    }
}

/// A live, not yet applied intention to upgrade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    pub height: u64,
    #[serde(default)]
    pub info: String,
}

impl Plan {
    pub fn new(name: impl Into<String>, height: u64, info: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            height,
            info: info.into(),
        }
    }
}

/// Durable record of a completed upgrade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedUpgrade {
    pub height: u64,
    pub info: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_uses_trigger_when_ahead() {
        let descriptor = MigrationDescriptor::at_height("0.1.2", 16951, "power index");
        let plan = descriptor.plan_at(100).unwrap();
        assert_eq!(plan, Plan::new("0.1.2", 16951, "power index"));
    }

    #[test]
    fn passed_trigger_moves_to_next_block() {
        let descriptor = MigrationDescriptor::at_height("0.2.3", 1, "");
        assert_eq!(descriptor.plan_at(500).unwrap().height, 501);
        assert_eq!(descriptor.plan_at(0).unwrap().height, 1);
    }

    #[test]
    fn governance_has_no_plan() {
        let descriptor = MigrationDescriptor::governance("0.2.4", "");
        assert!(descriptor.plan_at(10).is_none());
        assert!(!descriptor.skippable);
        assert!(descriptor.skippable().skippable);
    }
}
