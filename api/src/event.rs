use serde::{Deserialize, Serialize};

pub const EVENT_TYPE_MINT: &str = "mint";
pub const EVENT_TYPE_INFLATION_SKIPPED: &str = "inflation_skipped";
pub const EVENT_TYPE_EPOCH_START: &str = "epoch_start";
pub const EVENT_TYPE_EPOCH_END: &str = "epoch_end";
pub const EVENT_TYPE_UPGRADE: &str = "upgrade";
pub const EVENT_TYPE_POWER_INDEX_REPAIR: &str = "power_index_repair";
pub const EVENT_TYPE_MODULE_MIGRATION: &str = "module_migration";

pub const ATTRIBUTE_EPOCH_NUMBER: &str = "epoch_number";
pub const ATTRIBUTE_EPOCH_PROVISIONS: &str = "epoch_provisions";
pub const ATTRIBUTE_AMOUNT: &str = "amount";
pub const ATTRIBUTE_PERIOD: &str = "period";
pub const ATTRIBUTE_REASON: &str = "reason";
pub const ATTRIBUTE_IDENTIFIER: &str = "identifier";
pub const ATTRIBUTE_START_TIME: &str = "start_time";
pub const ATTRIBUTE_NAME: &str = "name";
pub const ATTRIBUTE_HEIGHT: &str = "height";
pub const ATTRIBUTE_VALIDATOR: &str = "validator";
pub const ATTRIBUTE_POWER: &str = "power";
pub const ATTRIBUTE_REMOVED: &str = "removed";
pub const ATTRIBUTE_MODULE: &str = "module";
pub const ATTRIBUTE_FROM_VERSION: &str = "from_version";
pub const ATTRIBUTE_TO_VERSION: &str = "to_version";

/// Structured record of a state change made outside transaction processing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: String,
    pub attributes: Vec<(String, String)>,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((key.into(), value.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_keep_order() {
        let event = Event::new(EVENT_TYPE_MINT)
            .attr(ATTRIBUTE_EPOCH_NUMBER, 3)
            .attr(ATTRIBUTE_AMOUNT, "1000");
        assert_eq!(event.attributes[0].0, ATTRIBUTE_EPOCH_NUMBER);
        assert_eq!(event.get(ATTRIBUTE_EPOCH_NUMBER), Some("3"));
        assert_eq!(event.get(ATTRIBUTE_AMOUNT), Some("1000"));
        assert_eq!(event.get(ATTRIBUTE_PERIOD), None);
    }
}
