// Pure classification over already-aggregated inputs. Nothing in this module
// performs I/O or returns an error: upstream gaps have been normalized to
// defaults by the collector and aggregator before classification runs.

pub mod databases;
pub mod functions;
pub mod logs;
pub mod support;

pub use databases::DatabaseObservation;
pub use functions::FunctionObservation;
