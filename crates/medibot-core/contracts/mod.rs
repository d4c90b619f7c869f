//! MediBot Contracts
//!
//! Input and output shapes shared by the classifier, the agents and the
//! HTTP layer.

mod assessment;
mod vitals;

pub use assessment::*;
pub use vitals::*;
