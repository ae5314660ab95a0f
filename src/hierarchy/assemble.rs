use log::info;

use crate::config::TopologyConfig;
use crate::hierarchy::alloc::PortAllocator;
use crate::hierarchy::cache::{attach_l1, CACHE_DOWN_PORT, CACHE_UP_PORT};
use crate::hierarchy::core::build_core;
use crate::hierarchy::{BUS, L2_CACHE, MEMORY, PROCESSOR, SYSBUS_CACHE, SYSTEM_CONNECTOR};
use crate::topology::{BuildError, BusPort, Component, ComponentKind, Endpoint, Link, Topology};

/// The memory controller's single port.
const MEMORY_PORT: &str = "direct_link";

/// Produces the complete topology for `cfg.cores` cores: the processor model
/// and its connector list, the shared bus, the system-memory bridge cache,
/// four leaf caches per core, the shared L2 on the reserved bus port, and
/// the memory controller behind the L2.
///
/// Cores are wired in index order and roles in their fixed order; downstream
/// tooling depends on the resulting port numbering.
pub fn assemble(cfg: &TopologyConfig) -> Result<Topology, BuildError> {
    if cfg.cores < 1 {
        return Err(BuildError::InvalidCoreCount(cfg.cores));
    }
    info!("assembling topology for {} cores", cfg.cores);

    let mut topo = Topology::new();

    topo.add_component(Component::new(
        PROCESSOR,
        ComponentKind::Processor,
        cfg.processor_params(),
    ))?;
    topo.add_component(Component::new(BUS, ComponentKind::Bus, cfg.bus_params()))?;

    // System-memory bridge; bus port 0 stays reserved for the L2.
    attach_l1(
        &mut topo,
        cfg,
        SYSBUS_CACHE,
        Endpoint::new(PROCESSOR, SYSTEM_CONNECTOR, &cfg.link_latency),
    )?;

    let mut ports = PortAllocator::new();
    for core in 0..cfg.cores {
        ports = build_core(&mut topo, cfg, core, ports)?;
    }

    topo.add_component(Component::new(
        L2_CACHE,
        ComponentKind::Cache,
        cfg.l2_cache_params(),
    ))?;
    // The link itself occupies the reserved port, so a stray attachment at
    // index 0 still surfaces as a conflict.
    topo.add_link(Link::new(
        "l2cache_bus_link",
        Endpoint::new(L2_CACHE, CACHE_UP_PORT, &cfg.bus_latency),
        Endpoint::new(BUS, BusPort::RESERVED.port_name(), &cfg.bus_latency),
    ))?;

    topo.add_component(Component::new(
        MEMORY,
        ComponentKind::MemoryController,
        cfg.memory_params(),
    ))?;
    topo.add_link(Link::new(
        "l2cache_mem_link",
        Endpoint::new(L2_CACHE, CACHE_DOWN_PORT, &cfg.link_latency),
        Endpoint::new(MEMORY, MEMORY_PORT, &cfg.link_latency),
    ))?;

    Ok(topo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::cache::CacheRole;
    use crate::topology::{Link, ParamValue};

    fn config(cores: usize) -> TopologyConfig {
        let mut cfg = TopologyConfig::default();
        cfg.cores = cores;
        cfg
    }

    fn param_str<'a>(topo: &'a Topology, component: &str, key: &str) -> &'a str {
        match topo.component(component).unwrap().params.get(key) {
            Some(ParamValue::Str(s)) => s,
            other => panic!("{}.{} should be a string, got {:?}", component, key, other),
        }
    }

    #[test]
    fn component_and_link_counts_scale_with_cores() {
        for cores in 1..=8 {
            let topo = assemble(&config(cores)).unwrap();
            assert_eq!(topo.components().len(), 4 * cores + 5, "cores={}", cores);
            assert_eq!(topo.links().len(), 4 * cores + 3, "cores={}", cores);
            assert_eq!(topo.attachments().len(), 4 * cores, "cores={}", cores);
            let unique: std::collections::HashSet<u32> =
                topo.attachments().iter().map(|att| att.port.0).collect();
            assert_eq!(unique.len(), topo.attachments().len(), "cores={}", cores);
        }
    }

    #[test]
    fn per_core_ports_follow_role_order() {
        let topo = assemble(&config(3)).unwrap();
        for core in 0..3usize {
            for (slot, role) in CacheRole::IN_PORT_ORDER.iter().enumerate() {
                let name = format!("c{}.{}", core, role.cache_name());
                let att = topo
                    .attachments()
                    .iter()
                    .find(|att| att.cache == name)
                    .unwrap();
                assert_eq!(att.port.0 as usize, 4 * core + slot + 1, "{}", name);
            }
        }
    }

    #[test]
    fn four_cores_fill_ports_zero_through_sixteen() {
        let topo = assemble(&config(4)).unwrap();
        let mut ports: Vec<u32> = topo.attachments().iter().map(|att| att.port.0).collect();
        ports.sort_unstable();
        assert_eq!(ports, (1..=16).collect::<Vec<u32>>());
        let l2_bus = topo
            .links()
            .iter()
            .find(|l| l.name == "l2cache_bus_link")
            .unwrap();
        assert_eq!(l2_bus.b.port, BusPort::RESERVED.port_name());
    }

    #[test]
    fn l2_owns_the_reserved_port() {
        let topo = assemble(&config(4)).unwrap();
        let l2_bus = topo
            .links()
            .iter()
            .find(|l| l.name == "l2cache_bus_link")
            .unwrap();
        assert_eq!(l2_bus.a.component, L2_CACHE);
        assert_eq!(l2_bus.b.component, BUS);
        assert_eq!(l2_bus.b.port, "high_network_0");
        assert!(topo
            .attachments()
            .iter()
            .all(|att| att.port != BusPort::RESERVED));
    }

    #[test]
    fn component_and_link_names_are_pairwise_distinct() {
        let topo = assemble(&config(5)).unwrap();
        let mut names: Vec<&str> = topo
            .components()
            .iter()
            .map(|c| c.name.as_str())
            .chain(topo.links().iter().map(|l| l.name.as_str()))
            .collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn rebuild_is_structurally_identical() {
        let cfg = config(4);
        assert_eq!(assemble(&cfg).unwrap(), assemble(&cfg).unwrap());
    }

    #[test]
    fn zero_cores_is_rejected() {
        assert_eq!(assemble(&config(0)), Err(BuildError::InvalidCoreCount(0)));
    }

    #[test]
    fn four_core_processor_lists_seventeen_connectors() {
        let topo = assemble(&config(4)).unwrap();
        let connectors = param_str(&topo, PROCESSOR, "connectors");
        let entries: Vec<&str> = connectors.split(' ').collect();
        assert_eq!(entries.len(), 17);
        assert_eq!(entries[0], SYSTEM_CONNECTOR);
        assert_eq!(entries[1], "system.cpu0.icache");
        assert_eq!(entries[2], "system.cpu0.dcache");
        assert_eq!(entries[3], "system.cpu0.itb_walker_cache");
        assert_eq!(entries[4], "system.cpu0.dtb_walker_cache");
        assert_eq!(entries[16], "system.cpu3.dtb_walker_cache");
    }

    #[test]
    fn memory_controller_reaches_only_the_l2() {
        let topo = assemble(&config(4)).unwrap();
        let touching: Vec<&Link> = topo
            .links()
            .iter()
            .filter(|l| l.a.component == MEMORY || l.b.component == MEMORY)
            .collect();
        assert_eq!(touching.len(), 1);
        assert_eq!(touching[0].name, "l2cache_mem_link");
        assert_eq!(touching[0].a.component, L2_CACHE);
        assert_eq!(touching[0].b.port, MEMORY_PORT);
        assert!(topo.attachments().iter().all(|att| att.cache != MEMORY));
    }

    #[test]
    fn sysbus_bridge_is_wired_from_the_system_connector() {
        let topo = assemble(&config(2)).unwrap();
        let wire = topo
            .links()
            .iter()
            .find(|l| l.name == "cpu_Gem5SysBus_link")
            .unwrap();
        assert_eq!(wire.a.component, PROCESSOR);
        assert_eq!(wire.a.port, SYSTEM_CONNECTOR);
        assert_eq!(wire.b.component, SYSBUS_CACHE);
        assert!(topo
            .attachments()
            .iter()
            .all(|att| att.cache != SYSBUS_CACHE));
    }

    #[test]
    fn tier_parameters_are_merged_per_cache() {
        let topo = assemble(&config(1)).unwrap();
        let leaf = topo.component("c0.l1iCache").unwrap();
        assert_eq!(leaf.params.get("L1"), Some(&ParamValue::Int(1)));
        assert_eq!(
            leaf.params.get("coherence_protocol"),
            Some(&ParamValue::Str("MSI".into()))
        );
        assert_eq!(
            leaf.params.get("cache_size"),
            Some(&ParamValue::Str("64 KB".into()))
        );
        let l2 = topo.component(L2_CACHE).unwrap();
        assert_eq!(l2.params.get("L1"), Some(&ParamValue::Int(0)));
        assert_eq!(
            l2.params.get("cache_size"),
            Some(&ParamValue::Str("256 KB".into()))
        );
        assert_eq!(l2.params.get("high_network_links"), Some(&ParamValue::Int(1)));
    }

    #[test]
    fn cmd_carries_the_core_count() {
        let topo = assemble(&config(4)).unwrap();
        assert_eq!(
            param_str(&topo, PROCESSOR, "cmd"),
            "test_fs.py --disk-image=linux-x86.img \
             --kernel=x86_64-vmlinux-2.6.22.9.smp --mem-size=512MB \
             --cpu-type=timing --external-caches --mem-type=InitializerMemory \
             --num-cpus=4"
        );
    }

    #[test]
    fn link_latencies_match_the_engine_contract() {
        let topo = assemble(&config(2)).unwrap();
        let cpu_link = topo
            .links()
            .iter()
            .find(|l| l.name == "cpu_c0.l1iCache_link")
            .unwrap();
        assert_eq!(cpu_link.a.latency, "1 ns");
        assert_eq!(cpu_link.b.latency, "1 ns");
        assert_eq!(cpu_link.b.port, CACHE_UP_PORT);

        let l2_bus = topo
            .links()
            .iter()
            .find(|l| l.name == "l2cache_bus_link")
            .unwrap();
        assert_eq!(l2_bus.a.latency, "2 ns");
        assert_eq!(l2_bus.b.latency, "2 ns");

        let l2_mem = topo
            .links()
            .iter()
            .find(|l| l.name == "l2cache_mem_link")
            .unwrap();
        assert_eq!(l2_mem.a.latency, "1 ns");

        assert!(topo.attachments().iter().all(|att| att.latency == "2 ns"));
    }
}
