//! Batch expansion: turn a routed payload entry into trackable job units.
//!
//! Synchronous handlers get one unit per value so each value succeeds or
//! fails on its own. Batch-capable handlers get the whole list in one unit.

use std::sync::Arc;

use crate::models::{JobMessage, PayloadValue};
use crate::registry::HandlerDescriptor;
use crate::router::RoutedEntry;

/// How a unit's values are handed to the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitMode {
    Single,
    Batch,
}

/// One independently tracked piece of work.
#[derive(Debug, Clone)]
pub struct JobUnit {
    pub handler: Arc<HandlerDescriptor>,
    pub mode: UnitMode,
    /// Copy of the original message whose payload holds only this unit's values.
    pub message: JobMessage,
}

impl JobUnit {
    /// The values carried by this unit, in payload order.
    pub fn values(&self) -> Vec<String> {
        self.message
            .payload
            .as_ref()
            .and_then(|p| p.get(&self.handler.type_key))
            .map(PayloadValue::to_list)
            .unwrap_or_default()
    }
}

/// Expand one routed entry into job units.
///
/// An empty value list yields no units.
pub fn expand(original: &JobMessage, entry: &RoutedEntry) -> Vec<JobUnit> {
    let handler = &entry.handler;
    let values = entry.value.to_list();
    if values.is_empty() {
        return Vec::new();
    }

    if handler.synchronous {
        values
            .into_iter()
            .map(|value| JobUnit {
                handler: Arc::clone(handler),
                mode: UnitMode::Single,
                message: original.reshell(&handler.type_key, PayloadValue::One(value)),
            })
            .collect()
    } else {
        vec![JobUnit {
            handler: Arc::clone(handler),
            mode: UnitMode::Batch,
            message: original.reshell(&handler.type_key, PayloadValue::Many(values)),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ParserKind, StorageLocation};

    fn entry(synchronous: bool, values: &[&str]) -> RoutedEntry {
        RoutedEntry {
            handler: Arc::new(HandlerDescriptor {
                type_key: "siteA".to_string(),
                synchronous,
                storage: StorageLocation {
                    bucket: "b".to_string(),
                    prefix: "siteA/".to_string(),
                },
                collector_name: "site_a".to_string(),
                parser: ParserKind::Summary,
            }),
            value: PayloadValue::Many(values.iter().map(|v| v.to_string()).collect()),
        }
    }

    fn message() -> JobMessage {
        serde_json::from_str(r#"{"payload": {"siteA": ["u1","u2","u3"]}, "trace_id": "t-9"}"#)
            .unwrap()
    }

    #[test]
    fn test_synchronous_one_unit_per_value() {
        let units = expand(&message(), &entry(true, &["u1", "u2", "u3"]));
        assert_eq!(units.len(), 3);
        for (unit, expected) in units.iter().zip(["u1", "u2", "u3"]) {
            assert_eq!(unit.mode, UnitMode::Single);
            assert_eq!(unit.values(), vec![expected.to_string()]);
            assert_eq!(
                unit.message.payload.as_ref().unwrap()["siteA"],
                PayloadValue::One(expected.to_string())
            );
            assert_eq!(unit.message.extra["trace_id"], "t-9");
        }
    }

    #[test]
    fn test_batch_single_unit_with_all_values() {
        let units = expand(&message(), &entry(false, &["u1", "u2", "u3"]));
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].mode, UnitMode::Batch);
        assert_eq!(units[0].values(), vec!["u1", "u2", "u3"]);
    }

    #[test]
    fn test_single_value_normalized_to_list() {
        let mut e = entry(false, &[]);
        e.value = PayloadValue::One("u1".to_string());
        let units = expand(&message(), &e);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].values(), vec!["u1"]);
    }

    #[test]
    fn test_empty_list_yields_no_units() {
        assert!(expand(&message(), &entry(true, &[])).is_empty());
        assert!(expand(&message(), &entry(false, &[])).is_empty());
    }

    #[test]
    fn test_original_message_untouched() {
        let original = message();
        let _ = expand(&original, &entry(true, &["u1", "u2", "u3"]));
        assert_eq!(original, message());
    }
}
