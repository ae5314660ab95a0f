use std::env;

use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use toml::Value;

use crate::hierarchy::cache::{core_connector, CacheRole};
use crate::hierarchy::SYSTEM_CONNECTOR;
use crate::topology::ParamSet;

/// One TOML table per config struct; a missing table falls back to defaults.
pub trait Config: DeserializeOwned + Default {
    fn from_section(section: Option<&Value>) -> Self {
        match section {
            Some(value) => value.clone().try_into().expect("cannot deserialize config"),
            None => {
                warn!("config section not found");
                Self::default()
            }
        }
    }
}

/// Top-level knobs plus the per-tier parameter tables.
///
/// The latency and frequency strings are forwarded verbatim to the engine
/// and must keep their exact spelling (`"1 ns"`, not `"1ns"`).
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TopologyConfig {
    pub cores: usize,
    pub clock_rate: String,
    pub link_latency: String,
    pub bus_latency: String,
    #[serde(skip)]
    pub base_cache: BaseCacheConfig,
    #[serde(skip)]
    pub l1_cache: L1CacheConfig,
    #[serde(skip)]
    pub l2_cache: L2CacheConfig,
    #[serde(skip)]
    pub bus: BusConfig,
    #[serde(skip)]
    pub memory: MemoryConfig,
    #[serde(skip)]
    pub processor: ProcessorConfig,
    #[serde(skip)]
    pub debug: DebugFlags,
}

impl Config for TopologyConfig {}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            cores: 4,
            clock_rate: "1GHz".to_string(),
            link_latency: "1 ns".to_string(),
            bus_latency: "2 ns".to_string(),
            base_cache: BaseCacheConfig::default(),
            l1_cache: L1CacheConfig::default(),
            l2_cache: L2CacheConfig::default(),
            bus: BusConfig::default(),
            memory: MemoryConfig::default(),
            processor: ProcessorConfig::default(),
            debug: DebugFlags::default(),
        }
    }
}

impl TopologyConfig {
    pub fn l1_cache_params(&self) -> ParamSet {
        self.base_cache
            .to_params(&self.clock_rate)
            .merged(&self.l1_cache.to_params())
    }

    pub fn l2_cache_params(&self) -> ParamSet {
        self.base_cache
            .to_params(&self.clock_rate)
            .merged(&self.l2_cache.to_params())
    }

    pub fn bus_params(&self) -> ParamSet {
        self.bus.to_params(&self.debug.debug)
    }

    pub fn memory_params(&self) -> ParamSet {
        self.memory.to_params(&self.debug.debug)
    }

    pub fn processor_params(&self) -> ParamSet {
        let mut params = ParamSet::new();
        params.set("comp_debug", self.debug.comp_debug.as_str());
        params.set("gem5DebugFlags", self.debug.model_flags.as_str());
        params.set("frequency", self.clock_rate.as_str());
        params.set("cmd", self.processor.cmd_line(self.cores));
        params.set("connectors", self.connectors().join(" "));
        params
    }

    /// External connector list: the system-memory connector first, then each
    /// core's four access streams in bus-port order.
    pub fn connectors(&self) -> Vec<String> {
        let mut list = vec![SYSTEM_CONNECTOR.to_string()];
        for core in 0..self.cores {
            for role in CacheRole::IN_PORT_ORDER {
                list.push(core_connector(core, role));
            }
        }
        list
    }
}

/// Parameters every cache tier shares.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BaseCacheConfig {
    pub debug: i64,
    pub debug_level: i64,
    pub coherence_protocol: String,
    pub replacement_policy: String,
    pub cache_line_size: i64,
    pub mshr_num_entries: i64,
    pub statistics: i64,
}

impl Config for BaseCacheConfig {}

impl Default for BaseCacheConfig {
    fn default() -> Self {
        Self {
            debug: 0,
            debug_level: 7,
            coherence_protocol: "MSI".to_string(),
            replacement_policy: "LRU".to_string(),
            cache_line_size: 64,
            mshr_num_entries: 4096,
            statistics: 1,
        }
    }
}

impl BaseCacheConfig {
    // Key order matches the engine-side parameter table.
    pub fn to_params(&self, cache_frequency: &str) -> ParamSet {
        let mut params = ParamSet::new();
        params.set("debug", self.debug);
        params.set("debug_level", self.debug_level);
        params.set("coherence_protocol", self.coherence_protocol.as_str());
        params.set("replacement_policy", self.replacement_policy.as_str());
        params.set("cache_line_size", self.cache_line_size);
        params.set("mshr_num_entries", self.mshr_num_entries);
        params.set("cache_frequency", cache_frequency);
        params.set("statistics", self.statistics);
        params
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct L1CacheConfig {
    pub cache_size: String,
    pub associativity: i64,
    pub access_latency_cycles: i64,
    pub mshr_latency_cycles: i64,
    pub low_network_links: i64,
}

impl Config for L1CacheConfig {}

impl Default for L1CacheConfig {
    fn default() -> Self {
        Self {
            cache_size: "64 KB".to_string(),
            associativity: 4,
            access_latency_cycles: 2,
            mshr_latency_cycles: 1,
            low_network_links: 1,
        }
    }
}

impl L1CacheConfig {
    pub fn to_params(&self) -> ParamSet {
        let mut params = ParamSet::new();
        params.set("L1", 1);
        params.set("cache_size", self.cache_size.as_str());
        params.set("associativity", self.associativity);
        params.set("access_latency_cycles", self.access_latency_cycles);
        params.set("mshr_latency_cycles", self.mshr_latency_cycles);
        params.set("low_network_links", self.low_network_links);
        params
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct L2CacheConfig {
    pub cache_size: String,
    pub associativity: i64,
    pub access_latency_cycles: i64,
    pub mshr_latency_cycles: i64,
    pub high_network_links: i64,
    pub low_network_links: i64,
}

impl Config for L2CacheConfig {}

impl Default for L2CacheConfig {
    fn default() -> Self {
        Self {
            cache_size: "256 KB".to_string(),
            associativity: 8,
            access_latency_cycles: 8,
            mshr_latency_cycles: 2,
            high_network_links: 1,
            low_network_links: 1,
        }
    }
}

impl L2CacheConfig {
    pub fn to_params(&self) -> ParamSet {
        let mut params = ParamSet::new();
        params.set("L1", 0);
        params.set("cache_size", self.cache_size.as_str());
        params.set("associativity", self.associativity);
        params.set("access_latency_cycles", self.access_latency_cycles);
        params.set("mshr_latency_cycles", self.mshr_latency_cycles);
        params.set("high_network_links", self.high_network_links);
        params.set("low_network_links", self.low_network_links);
        params
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BusConfig {
    pub bus_frequency: String,
}

impl Config for BusConfig {}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            bus_frequency: "2GHz".to_string(),
        }
    }
}

impl BusConfig {
    pub fn to_params(&self, debug: &str) -> ParamSet {
        let mut params = ParamSet::new();
        params.set("bus_frequency", self.bus_frequency.as_str());
        params.set("debug", debug);
        params
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MemoryConfig {
    pub request_width: i64,
    pub coherence_protocol: String,
    pub access_time: String,
    pub mem_size: i64,
    pub clock: String,
}

impl Config for MemoryConfig {}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            request_width: 64,
            coherence_protocol: "MSI".to_string(),
            access_time: "25 ns".to_string(),
            mem_size: 512,
            clock: "2GHz".to_string(),
        }
    }
}

impl MemoryConfig {
    pub fn to_params(&self, debug: &str) -> ParamSet {
        let mut params = ParamSet::new();
        params.set("request_width", self.request_width);
        params.set("coherence_protocol", self.coherence_protocol.as_str());
        params.set("access_time", self.access_time.as_str());
        params.set("mem_size", self.mem_size);
        params.set("clock", self.clock.as_str());
        params.set("debug", debug);
        params
    }
}

/// Pieces of the boot command handed to the processor model. The command is
/// an opaque pass-through; only `--num-cpus` is derived here.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProcessorConfig {
    pub boot_script: String,
    pub disk_image: String,
    pub kernel: String,
    pub mem_size: String,
    pub cpu_type: String,
    pub mem_type: String,
    pub script: Option<String>,
}

impl Config for ProcessorConfig {}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            boot_script: "test_fs.py".to_string(),
            disk_image: "linux-x86.img".to_string(),
            kernel: "x86_64-vmlinux-2.6.22.9.smp".to_string(),
            mem_size: "512MB".to_string(),
            cpu_type: "timing".to_string(),
            mem_type: "InitializerMemory".to_string(),
            script: None,
        }
    }
}

impl ProcessorConfig {
    pub fn cmd_line(&self, cores: usize) -> String {
        let mut cmd = format!(
            "{} --disk-image={} --kernel={}",
            self.boot_script, self.disk_image, self.kernel
        );
        if let Some(script) = &self.script {
            cmd.push_str(&format!(" --script={}", script));
        }
        cmd.push_str(&format!(
            " --mem-size={} --cpu-type={} --external-caches --mem-type={} --num-cpus={}",
            self.mem_size, self.cpu_type, self.mem_type, cores
        ));
        cmd
    }
}

/// Debug switches read from the environment and forwarded opaquely to the
/// engine-side components. A missing variable reads as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugFlags {
    /// GEM5_DEBUG
    pub comp_debug: String,
    /// M5_DEBUG
    pub model_flags: String,
    /// DEBUG, shared by the bus and the memory controller
    pub debug: String,
}

impl DebugFlags {
    pub fn from_env() -> Self {
        Self {
            comp_debug: getenv("GEM5_DEBUG"),
            model_flags: getenv("M5_DEBUG"),
            debug: getenv("DEBUG"),
        }
    }
}

fn getenv(name: &str) -> String {
    env::var(name).unwrap_or_default()
}
