//! Concurrency primitives.
//!
//! - `ConcurrencyGate`: caps in-flight requests per identity
//! - `WorkerPool`: fixed-size pool for merge/transform work

mod gate;
mod workers;

pub use gate::{ConcurrencyGate, GatePermit};
pub use workers::WorkerPool;
