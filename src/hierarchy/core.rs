use log::debug;

use crate::config::TopologyConfig;
use crate::hierarchy::alloc::PortAllocator;
use crate::hierarchy::cache::{attach_l1, core_connector, CacheRole};
use crate::hierarchy::{BUS, PROCESSOR};
use crate::topology::{BuildError, Endpoint, Topology};

/// Builds the four private caches of one core and attaches each to the next
/// free bus port. Roles go in the fixed order instruction, data,
/// instruction-TLB, data-TLB; core `i` therefore lands on ports
/// `4i+1..=4i+4`.
pub fn build_core(
    topo: &mut Topology,
    cfg: &TopologyConfig,
    core: usize,
    mut ports: PortAllocator,
) -> Result<PortAllocator, BuildError> {
    for role in CacheRole::IN_PORT_ORDER {
        let name = format!("c{}.{}", core, role.cache_name());
        let connector = core_connector(core, role);
        attach_l1(
            topo,
            cfg,
            &name,
            Endpoint::new(PROCESSOR, connector, &cfg.link_latency),
        )?;
        let (port, rest) = ports.next();
        debug!("core {}: {} on bus port {}", core, name, port.0);
        topo.attach_to_bus(BUS, &name, port, &cfg.bus_latency)?;
        ports = rest;
    }
    Ok(ports)
}
