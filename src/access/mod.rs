//! Access control: the per-operation context carrier and the row policy
//! evaluator.

pub mod context;
pub mod policy;

pub use context::{ContextCarrier, SessionContext};
pub use policy::{check_admin, Decision, GrantSource, PolicyEvaluator};
