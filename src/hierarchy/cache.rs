use crate::config::TopologyConfig;
use crate::topology::{BuildError, Component, ComponentKind, Endpoint, Link, Topology};

/// Port names every cache exposes: `high_network_0` faces the traffic
/// source, `low_network_0` faces the next tier down.
pub const CACHE_UP_PORT: &str = "high_network_0";
pub const CACHE_DOWN_PORT: &str = "low_network_0";

/// The four memory-access streams each core routes through a private L1.
///
/// Bus ports are allocated in the order of `IN_PORT_ORDER`; regression
/// baselines depend on the resulting port-to-role mapping, so the order is
/// part of the external contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheRole {
    Instruction,
    Data,
    InstructionTlb,
    DataTlb,
}

impl CacheRole {
    pub const IN_PORT_ORDER: [CacheRole; 4] = [
        CacheRole::Instruction,
        CacheRole::Data,
        CacheRole::InstructionTlb,
        CacheRole::DataTlb,
    ];

    /// Cache component name within one core's namespace.
    pub fn cache_name(self) -> &'static str {
        match self {
            CacheRole::Instruction => "l1iCache",
            CacheRole::Data => "l1dCache",
            CacheRole::InstructionTlb => "itlbCache",
            CacheRole::DataTlb => "dtlbCache",
        }
    }

    /// Connector suffix on the processor model for this stream.
    pub fn connector(self) -> &'static str {
        match self {
            CacheRole::Instruction => "icache",
            CacheRole::Data => "dcache",
            CacheRole::InstructionTlb => "itb_walker_cache",
            CacheRole::DataTlb => "dtb_walker_cache",
        }
    }
}

/// Connector name on the processor model for one core's access stream.
pub fn core_connector(core: usize, role: CacheRole) -> String {
    format!("system.cpu{}.{}", core, role.connector())
}

/// Creates one L1 cache with merged base+tier parameters and wires its
/// upstream port to `source`, a connector on the processor model.
pub fn attach_l1(
    topo: &mut Topology,
    cfg: &TopologyConfig,
    name: &str,
    source: Endpoint,
) -> Result<(), BuildError> {
    topo.add_component(Component::new(name, ComponentKind::Cache, cfg.l1_cache_params()))?;
    let latency = source.latency.clone();
    topo.add_link(Link::new(
        format!("cpu_{name}_link"),
        source,
        Endpoint::new(name, CACHE_UP_PORT, latency),
    ))?;
    Ok(())
}
