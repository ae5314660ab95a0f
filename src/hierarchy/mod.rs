pub mod alloc;
pub mod assemble;
pub mod cache;
pub mod core;

pub use self::alloc::PortAllocator;
pub use self::assemble::assemble;
pub use self::cache::{attach_l1, core_connector, CacheRole};
pub use self::core::build_core;

/// Fixed component names. The processor model name and its connector strings
/// are part of the contract with the engine-side processor integration.
pub const PROCESSOR: &str = "system";
pub const BUS: &str = "membus";
pub const SYSBUS_CACHE: &str = "Gem5SysBus";
pub const L2_CACHE: &str = "l2cache";
pub const MEMORY: &str = "memory";

/// Connector the processor model exposes for its system-memory traffic.
pub const SYSTEM_CONNECTOR: &str = "system.mem_ctrls.connector";
