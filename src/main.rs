use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use toml::Table;

use memtopo::config::{
    BaseCacheConfig, BusConfig, Config, DebugFlags, L1CacheConfig, L2CacheConfig, MemoryConfig,
    ProcessorConfig, TopologyConfig,
};
use memtopo::hierarchy::assemble;

#[derive(Parser)]
#[command(version, about)]
struct MemtopoArgs {
    #[arg(help = "Path to config.toml")]
    config_path: Option<PathBuf>,
    #[arg(long, help = "Override number of cores")]
    cores: Option<usize>,
    #[arg(long, help = "Write the topology to a file instead of stdout")]
    output: Option<PathBuf>,
    #[arg(long, help = "Pretty-print the emitted JSON")]
    pretty: bool,
}

pub fn main() -> anyhow::Result<()> {
    env_logger::init();

    let argv = MemtopoArgs::parse();
    let mut cfg = match &argv.config_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            let table: Table = toml::from_str(&raw).context("cannot parse config toml")?;
            let mut cfg = TopologyConfig::from_section(table.get("topology"));
            cfg.base_cache = BaseCacheConfig::from_section(table.get("base_cache"));
            cfg.l1_cache = L1CacheConfig::from_section(table.get("l1_cache"));
            cfg.l2_cache = L2CacheConfig::from_section(table.get("l2_cache"));
            cfg.bus = BusConfig::from_section(table.get("bus"));
            cfg.memory = MemoryConfig::from_section(table.get("memory"));
            cfg.processor = ProcessorConfig::from_section(table.get("processor"));
            cfg
        }
        None => TopologyConfig::default(),
    };

    // override toml configs with argv and the environment
    cfg.cores = argv.cores.unwrap_or(cfg.cores);
    cfg.debug = DebugFlags::from_env();

    let topo = assemble(&cfg)?;
    let rendered = if argv.pretty {
        serde_json::to_string_pretty(&topo)?
    } else {
        serde_json::to_string(&topo)?
    };
    match &argv.output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("failed to write topology to {}", path.display()))?,
        None => println!("{}", rendered),
    }
    Ok(())
}
