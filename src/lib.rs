//! A hierarchical control plane for a factory robot fleet: Fleet routes
//! work orders to Areas, Areas fan out to Zones, Zones dispatch to Edge
//! robots, and status/summary reports flow back up -- all over a
//! publish/subscribe [`bus`].

pub mod area;
pub mod bus;
pub mod edge;
pub mod error;
pub mod fleet;
pub mod ids;
pub mod model;
pub mod runtime;
pub mod time;
pub mod zone;
