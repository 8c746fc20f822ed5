#![forbid(unsafe_code)]

//! Wire codec.
//!
//! [`encode`] and [`decode`] convert between [`Plan`] and the serde message
//! set in [`messages`]; [`to_bytes`] and [`from_bytes`] add the canonical
//! JSON rendering on top.

pub mod decode;
pub mod encode;
pub mod messages;

pub use decode::decode;
pub use encode::encode;
pub use messages::PlanMsg;

use crate::error::{PlanError, Result};
use crate::extensions::FunctionCatalog;
use crate::plan::Plan;

/// Serializes `plan` to canonical JSON bytes.
pub fn to_bytes(plan: &Plan) -> Result<Vec<u8>> {
    serde_json::to_vec(&encode(plan)).map_err(|err| PlanError::Encode(err.to_string()))
}

/// Parses canonical JSON bytes and rebuilds the plan.
pub fn from_bytes(bytes: &[u8], catalog: &dyn FunctionCatalog) -> Result<Plan> {
    let msg: PlanMsg =
        serde_json::from_slice(bytes).map_err(|err| PlanError::decode(err.to_string()))?;
    decode(&msg, catalog)
}
