#![forbid(unsafe_code)]

//! Relation trees and the plans that carry them.

pub mod builder;
pub mod relation;
pub mod schema;

pub use builder::{Builder, BuilderOptions};
pub use relation::{
    AggRelMeasure, AggregateCall, AggregateRel, AggregationInvocation, AggregationPhase, CrossRel,
    Emit, FetchRel, FilterRel, Grouping, JoinRel, JoinType, ReadRel, RelOp, Relation,
};

use std::fmt;

use crate::extensions::ExtensionTable;
use crate::types::RecordType;

/// Producer string stamped on plans built with default options.
pub const DEFAULT_PRODUCER: &str = "relplan";

/// IR version metadata carried by every plan.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Version {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version.
    pub patch: u32,
    /// Tool that produced the plan.
    pub producer: String,
}

impl Default for Version {
    fn default() -> Self {
        Self {
            major: 0,
            minor: 29,
            patch: 0,
            producer: DEFAULT_PRODUCER.to_owned(),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.producer.is_empty() {
            write!(f, " ({})", self.producer)?;
        }
        Ok(())
    }
}

/// Root relation plus its output column names.
#[derive(Clone, Debug, PartialEq)]
pub struct Root {
    pub(crate) input: Relation,
    pub(crate) names: Vec<String>,
}

impl Root {
    /// Root relation.
    pub fn input(&self) -> &Relation {
        &self.input
    }

    /// Output column names, one per visible column.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Visible record type of the root renamed with the output names.
    pub fn record_type(&self) -> RecordType {
        self.input.record_type().renamed(&self.names)
    }
}

/// Serializable unit: version, referenced extensions and roots.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    pub(crate) version: Version,
    pub(crate) extensions: ExtensionTable,
    pub(crate) roots: Vec<Root>,
}

impl Plan {
    /// Version metadata carried on the wire.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Extension URIs and functions referenced by the roots.
    pub fn extensions(&self) -> &ExtensionTable {
        &self.extensions
    }

    /// Roots in declaration order.
    pub fn roots(&self) -> &[Root] {
        &self.roots
    }
}
