//! Session-scoped anchor allocation for extension URIs and functions.
//!
//! Anchors are small integers standing in for a URI or a `(uri, name)` pair
//! on the wire. A registry hands them out in first-use order starting at 1.
//! It is owned by one builder session and mutated through `&mut self`; a
//! session shared between threads must be wrapped in a lock by the caller.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{PlanError, Result};

/// Reference to an extension function with its anchors resolved.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FunctionRef {
    uri: String,
    uri_anchor: u32,
    name: String,
    anchor: u32,
}

impl FunctionRef {
    /// Declaring URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Anchor of the declaring URI.
    pub fn uri_anchor(&self) -> u32 {
        self.uri_anchor
    }

    /// Function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Function anchor referenced by expressions and measures.
    pub fn anchor(&self) -> u32 {
        self.anchor
    }
}

/// Entry of the plan's extension-URI table.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ExtensionUri {
    /// URI anchor.
    pub anchor: u32,
    /// URI text.
    pub uri: String,
}

/// Entry of the plan's extension-function table.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ExtensionFunction {
    /// Anchor of the declaring URI.
    pub uri_anchor: u32,
    /// Function anchor.
    pub anchor: u32,
    /// Function name.
    pub name: String,
}

/// Extension tables carried by a plan.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct ExtensionTable {
    /// URIs in anchor order.
    pub uris: Vec<ExtensionUri>,
    /// Functions in anchor order.
    pub functions: Vec<ExtensionFunction>,
}

impl ExtensionTable {
    /// Builds the tables for exactly the referenced functions.
    pub fn from_refs<'a, I>(refs: I) -> Self
    where
        I: IntoIterator<Item = &'a FunctionRef>,
    {
        let mut uris: FxHashMap<u32, &str> = FxHashMap::default();
        let mut functions: FxHashMap<u32, &FunctionRef> = FxHashMap::default();
        for func in refs {
            uris.entry(func.uri_anchor).or_insert(&func.uri);
            functions.entry(func.anchor).or_insert(func);
        }

        let mut uris: Vec<ExtensionUri> = uris
            .into_iter()
            .map(|(anchor, uri)| ExtensionUri {
                anchor,
                uri: uri.to_owned(),
            })
            .collect();
        uris.sort_by_key(|u| u.anchor);

        let mut functions: Vec<ExtensionFunction> = functions
            .into_values()
            .map(|f| ExtensionFunction {
                uri_anchor: f.uri_anchor,
                anchor: f.anchor,
                name: f.name.clone(),
            })
            .collect();
        functions.sort_by_key(|f| f.anchor);

        Self { uris, functions }
    }

    /// Whether both tables are empty.
    pub fn is_empty(&self) -> bool {
        self.uris.is_empty() && self.functions.is_empty()
    }
}

/// Mutable anchor allocator for one plan-building session.
#[derive(Clone, Debug)]
pub struct ExtensionRegistry {
    uri_anchors: FxHashMap<String, u32>,
    uris: FxHashMap<u32, String>,
    function_anchors: FxHashMap<(u32, String), u32>,
    functions: FxHashMap<u32, (u32, String)>,
    next_uri: u32,
    next_function: u32,
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionRegistry {
    /// Creates an empty registry; the first anchors handed out are 1.
    pub fn new() -> Self {
        Self {
            uri_anchors: FxHashMap::default(),
            uris: FxHashMap::default(),
            function_anchors: FxHashMap::default(),
            functions: FxHashMap::default(),
            next_uri: 1,
            next_function: 1,
        }
    }

    /// Rebuilds a registry from decoded tables, keeping their anchors.
    ///
    /// Fresh anchors continue after the largest one seen.
    pub fn from_table(table: &ExtensionTable) -> Result<Self> {
        let mut registry = Self::new();
        for entry in &table.uris {
            if registry.uris.contains_key(&entry.anchor) {
                return Err(PlanError::decode(format!(
                    "duplicate extension uri anchor {}",
                    entry.anchor
                )));
            }
            registry.uris.insert(entry.anchor, entry.uri.clone());
            registry
                .uri_anchors
                .entry(entry.uri.clone())
                .or_insert(entry.anchor);
            registry.next_uri = registry.next_uri.max(entry.anchor.saturating_add(1));
        }
        for entry in &table.functions {
            if !registry.uris.contains_key(&entry.uri_anchor) {
                return Err(PlanError::decode(format!(
                    "extension function {} references undeclared uri anchor {}",
                    entry.name, entry.uri_anchor
                )));
            }
            if registry.functions.contains_key(&entry.anchor) {
                return Err(PlanError::decode(format!(
                    "duplicate extension function anchor {}",
                    entry.anchor
                )));
            }
            registry
                .functions
                .insert(entry.anchor, (entry.uri_anchor, entry.name.clone()));
            registry
                .function_anchors
                .entry((entry.uri_anchor, entry.name.clone()))
                .or_insert(entry.anchor);
            registry.next_function = registry
                .next_function
                .max(entry.anchor.saturating_add(1));
        }
        Ok(registry)
    }

    /// Returns the reference for `(uri, name)`, assigning anchors on first use.
    pub fn register(&mut self, uri: &str, name: &str) -> FunctionRef {
        let uri_anchor = match self.uri_anchors.get(uri) {
            Some(anchor) => *anchor,
            None => {
                let anchor = self.next_uri;
                self.next_uri += 1;
                self.uri_anchors.insert(uri.to_owned(), anchor);
                self.uris.insert(anchor, uri.to_owned());
                debug!(uri, anchor, "registered extension uri");
                anchor
            }
        };
        let key = (uri_anchor, name.to_owned());
        let anchor = match self.function_anchors.get(&key) {
            Some(anchor) => *anchor,
            None => {
                let anchor = self.next_function;
                self.next_function += 1;
                self.function_anchors.insert(key, anchor);
                self.functions.insert(anchor, (uri_anchor, name.to_owned()));
                debug!(uri, name, anchor, "registered extension function");
                anchor
            }
        };
        FunctionRef {
            uri: uri.to_owned(),
            uri_anchor,
            name: name.to_owned(),
            anchor,
        }
    }

    /// Resolves a function anchor back to its reference.
    pub fn resolve(&self, anchor: u32) -> Option<FunctionRef> {
        let (uri_anchor, name) = self.functions.get(&anchor)?;
        let uri = self.uris.get(uri_anchor)?;
        Some(FunctionRef {
            uri: uri.clone(),
            uri_anchor: *uri_anchor,
            name: name.clone(),
            anchor,
        })
    }

    /// Number of function anchors handed out or seeded.
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }
}
