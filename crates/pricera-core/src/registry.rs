//! Handler registry: the closed table of type keys the pipeline understands.
//!
//! A registry is built once at startup for one [`Stage`] and consulted by the
//! payload router and the batch expander. Each entry is a plain
//! [`HandlerDescriptor`] value; the storage location and collector name are
//! fields on the descriptor rather than behaviour shared through a base type.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Which pipeline a registry serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Crawl,
    Parse,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Crawl => f.write_str("crawl"),
            Stage::Parse => f.write_str("parse"),
        }
    }
}

/// Built-in content parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// Page count, final URL, status codes and content length.
    #[default]
    Summary,
    /// Top-level fields of the last response body parsed as a JSON object.
    Json,
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserKind::Summary => f.write_str("summary"),
            ParserKind::Json => f.write_str("json"),
        }
    }
}

/// Bucket and key prefix a handler stores its chains under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocation {
    pub bucket: String,
    pub prefix: String,
}

/// Everything the pipeline needs to know about one type key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerDescriptor {
    pub type_key: String,
    /// When true, the handler receives exactly one value per invocation.
    pub synchronous: bool,
    pub storage: StorageLocation,
    /// Name used in the namespaced status field of each record.
    pub collector_name: String,
    pub parser: ParserKind,
}

/// Lookup table from type key to handler descriptor.
#[derive(Debug, Clone)]
pub struct HandlerRegistry {
    stage: Stage,
    handlers: BTreeMap<String, Arc<HandlerDescriptor>>,
}

impl HandlerRegistry {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            handlers: BTreeMap::new(),
        }
    }

    /// Register a handler. A later registration for the same type key
    /// replaces the earlier one.
    pub fn register(&mut self, descriptor: HandlerDescriptor) {
        self.handlers
            .insert(descriptor.type_key.clone(), Arc::new(descriptor));
    }

    pub fn get(&self, type_key: &str) -> Option<Arc<HandlerDescriptor>> {
        self.handlers.get(type_key).cloned()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handlers in type-key order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<HandlerDescriptor>> {
        self.handlers.values()
    }
}
