//! Configuration-time generator for the interconnect topology of a simulated
//! multi-core memory hierarchy: per-core L1 caches, a shared bus, a shared L2
//! and a memory controller, wired with numbered bus ports and link latencies.

pub mod config;
pub mod hierarchy;
pub mod topology;
