//! Payload routing: map each payload entry of a job message to its handler.
//!
//! Every payload key is processed. A key with no registered handler is
//! reported as [`RouteSignal::NoHandlerFound`] and skipped, as is a key whose
//! value is neither a string nor a list of strings
//! ([`RouteSignal::InvalidValue`]). The remaining keys still route. A
//! message without a payload routes nothing and reports
//! [`RouteSignal::EmptyPayload`].

use std::sync::Arc;

use crate::models::{JobMessage, PayloadValue};
use crate::registry::{HandlerDescriptor, HandlerRegistry};

/// Non-fatal conditions observed while routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSignal {
    NoHandlerFound { type_key: String },
    InvalidValue { type_key: String },
    EmptyPayload,
}

/// A payload entry paired with the handler that will process it.
#[derive(Debug, Clone)]
pub struct RoutedEntry {
    pub handler: Arc<HandlerDescriptor>,
    pub value: PayloadValue,
}

/// Result of routing one message.
#[derive(Debug, Clone, Default)]
pub struct Routed {
    pub entries: Vec<RoutedEntry>,
    pub signals: Vec<RouteSignal>,
}

/// Route a job message against a registry.
pub fn route(message: &JobMessage, registry: &HandlerRegistry) -> Routed {
    let mut routed = Routed::default();

    let payload = match message.payload.as_ref() {
        Some(p) if !p.is_empty() => p,
        _ => {
            tracing::warn!(stage = %registry.stage(), "message payload is empty, skipping");
            routed.signals.push(RouteSignal::EmptyPayload);
            return routed;
        }
    };

    for (type_key, value) in payload {
        if !value.is_valid() {
            tracing::error!(
                stage = %registry.stage(),
                type_key = %type_key,
                "payload value is not a string or list of strings, skipping"
            );
            routed.signals.push(RouteSignal::InvalidValue {
                type_key: type_key.clone(),
            });
            continue;
        }
        match registry.get(type_key) {
            Some(handler) => routed.entries.push(RoutedEntry {
                handler,
                value: value.clone(),
            }),
            None => {
                tracing::error!(
                    stage = %registry.stage(),
                    type_key = %type_key,
                    "no handler registered for payload key, skipping"
                );
                routed.signals.push(RouteSignal::NoHandlerFound {
                    type_key: type_key.clone(),
                });
            }
        }
    }

    routed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ParserKind, Stage, StorageLocation};
    use std::collections::BTreeMap;

    fn registry() -> HandlerRegistry {
        let mut r = HandlerRegistry::new(Stage::Crawl);
        r.register(HandlerDescriptor {
            type_key: "siteA".to_string(),
            synchronous: true,
            storage: StorageLocation {
                bucket: "b".to_string(),
                prefix: "siteA/".to_string(),
            },
            collector_name: "site_a".to_string(),
            parser: ParserKind::Summary,
        });
        r
    }

    #[test]
    fn test_known_key_routes() {
        let msg: JobMessage = serde_json::from_str(r#"{"payload": {"siteA": "u1"}}"#).unwrap();
        let routed = route(&msg, &registry());
        assert_eq!(routed.entries.len(), 1);
        assert_eq!(routed.entries[0].handler.type_key, "siteA");
        assert!(routed.signals.is_empty());
    }

    #[test]
    fn test_unknown_key_skipped_known_key_kept() {
        let msg: JobMessage =
            serde_json::from_str(r#"{"payload": {"siteA": ["u1"], "siteZ": ["u2"]}}"#).unwrap();
        let routed = route(&msg, &registry());
        assert_eq!(routed.entries.len(), 1);
        assert_eq!(routed.entries[0].handler.type_key, "siteA");
        assert_eq!(
            routed.signals,
            vec![RouteSignal::NoHandlerFound {
                type_key: "siteZ".to_string()
            }]
        );
    }

    #[test]
    fn test_invalid_value_skipped_other_keys_kept() {
        let msg: JobMessage =
            serde_json::from_str(r#"{"payload": {"siteA": ["u1"], "siteB": 42}}"#).unwrap();
        let routed = route(&msg, &registry());
        assert_eq!(routed.entries.len(), 1);
        assert_eq!(routed.entries[0].handler.type_key, "siteA");
        assert_eq!(
            routed.signals,
            vec![RouteSignal::InvalidValue {
                type_key: "siteB".to_string()
            }]
        );
    }

    #[test]
    fn test_missing_payload_signals_empty() {
        let routed = route(&JobMessage::default(), &registry());
        assert!(routed.entries.is_empty());
        assert_eq!(routed.signals, vec![RouteSignal::EmptyPayload]);
    }

    #[test]
    fn test_empty_payload_map_signals_empty() {
        let msg = JobMessage {
            payload: Some(BTreeMap::new()),
            ..Default::default()
        };
        let routed = route(&msg, &registry());
        assert!(routed.entries.is_empty());
        assert_eq!(routed.signals, vec![RouteSignal::EmptyPayload]);
    }
}
