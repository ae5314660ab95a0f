use std::collections::HashSet;

use serde::Serialize;

use crate::topology::params::ParamSet;
use crate::topology::BuildError;

/// Engine type tags. The serialized strings are the engine's registry ids
/// and must be emitted verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComponentKind {
    #[serde(rename = "gem5.Gem5")]
    Processor,
    #[serde(rename = "memHierarchy.Cache")]
    Cache,
    #[serde(rename = "memHierarchy.Bus")]
    Bus,
    #[serde(rename = "memHierarchy.MemController")]
    MemoryController,
}

/// One simulated unit. Parameters are attached at creation and never change
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub params: ParamSet,
}

impl Component {
    pub fn new(name: impl Into<String>, kind: ComponentKind, params: ParamSet) -> Self {
        Self {
            name: name.into(),
            kind,
            params,
        }
    }
}

/// One side of a link: a named port on a component, plus the wire latency
/// the engine models on that side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    pub component: String,
    pub port: String,
    pub latency: String,
}

impl Endpoint {
    pub fn new(
        component: impl Into<String>,
        port: impl Into<String>,
        latency: impl Into<String>,
    ) -> Self {
        Self {
            component: component.into(),
            port: port.into(),
            latency: latency.into(),
        }
    }
}

/// Named bidirectional connection between exactly two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub name: String,
    pub a: Endpoint,
    pub b: Endpoint,
}

impl Link {
    pub fn new(name: impl Into<String>, a: Endpoint, b: Endpoint) -> Self {
        Self {
            name: name.into(),
            a,
            b,
        }
    }
}

/// Indexed attachment point on the shared bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BusPort(pub u32);

impl BusPort {
    /// Index 0 is never handed to a leaf cache; the shared L2 attaches here.
    pub const RESERVED: BusPort = BusPort(0);

    /// Bus-side port name the engine binds this attachment to.
    pub fn port_name(self) -> String {
        format!("high_network_{}", self.0)
    }
}

/// A leaf cache claiming one numbered port on the shared bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusAttachment {
    pub port: BusPort,
    pub cache: String,
    pub latency: String,
}

/// Component/link/attachment registry built up during assembly and handed to
/// the external engine as an immutable configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Topology {
    components: Vec<Component>,
    links: Vec<Link>,
    attachments: Vec<BusAttachment>,
    #[serde(skip)]
    component_names: HashSet<String>,
    #[serde(skip)]
    link_names: HashSet<String>,
    // (component, port) pairs already wired, links and bus attachments alike
    #[serde(skip)]
    occupied: HashSet<(String, String)>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_component(&mut self, component: Component) -> Result<(), BuildError> {
        if !self.component_names.insert(component.name.clone()) {
            return Err(BuildError::DuplicateComponentName(component.name));
        }
        self.components.push(component);
        Ok(())
    }

    pub fn add_link(&mut self, link: Link) -> Result<(), BuildError> {
        if self.link_names.contains(&link.name) {
            return Err(BuildError::DuplicateLinkName(link.name));
        }
        self.require_component(&link.a.component)?;
        self.require_component(&link.b.component)?;
        let a_key = (link.a.component.clone(), link.a.port.clone());
        let b_key = (link.b.component.clone(), link.b.port.clone());
        if self.occupied.contains(&a_key) || a_key == b_key {
            return Err(BuildError::PortConflict {
                component: link.a.component,
                port: link.a.port,
            });
        }
        if self.occupied.contains(&b_key) {
            return Err(BuildError::PortConflict {
                component: link.b.component,
                port: link.b.port,
            });
        }
        self.occupied.insert(a_key);
        self.occupied.insert(b_key);
        self.link_names.insert(link.name.clone());
        self.links.push(link);
        Ok(())
    }

    /// Claims `port` on `bus` for `cache`. Each numbered port takes exactly
    /// one attachment.
    pub fn attach_to_bus(
        &mut self,
        bus: &str,
        cache: &str,
        port: BusPort,
        latency: &str,
    ) -> Result<(), BuildError> {
        self.require_component(bus)?;
        self.require_component(cache)?;
        if !self.occupied.insert((bus.to_string(), port.port_name())) {
            return Err(BuildError::PortConflict {
                component: bus.to_string(),
                port: port.port_name(),
            });
        }
        self.attachments.push(BusAttachment {
            port,
            cache: cache.to_string(),
            latency: latency.to_string(),
        });
        Ok(())
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn attachments(&self) -> &[BusAttachment] {
        &self.attachments
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    fn require_component(&self, name: &str) -> Result<(), BuildError> {
        if self.component_names.contains(name) {
            Ok(())
        } else {
            Err(BuildError::UnknownComponent(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(name: &str) -> Component {
        Component::new(name, ComponentKind::Cache, ParamSet::new())
    }

    fn link(name: &str, a: (&str, &str), b: (&str, &str)) -> Link {
        Link::new(
            name,
            Endpoint::new(a.0, a.1, "1 ns"),
            Endpoint::new(b.0, b.1, "1 ns"),
        )
    }

    #[test]
    fn duplicate_component_names_are_rejected() {
        let mut topo = Topology::new();
        topo.add_component(cache("l1")).unwrap();
        assert_eq!(
            topo.add_component(cache("l1")),
            Err(BuildError::DuplicateComponentName("l1".into()))
        );
        assert_eq!(topo.components().len(), 1);
    }

    #[test]
    fn duplicate_link_names_are_rejected() {
        let mut topo = Topology::new();
        topo.add_component(cache("a")).unwrap();
        topo.add_component(cache("b")).unwrap();
        topo.add_link(link("wire", ("a", "p0"), ("b", "p0"))).unwrap();
        assert_eq!(
            topo.add_link(link("wire", ("a", "p1"), ("b", "p1"))),
            Err(BuildError::DuplicateLinkName("wire".into()))
        );
    }

    #[test]
    fn links_may_not_share_an_endpoint() {
        let mut topo = Topology::new();
        topo.add_component(cache("a")).unwrap();
        topo.add_component(cache("b")).unwrap();
        topo.add_component(cache("c")).unwrap();
        topo.add_link(link("first", ("a", "p0"), ("b", "p0"))).unwrap();
        assert_eq!(
            topo.add_link(link("second", ("c", "p0"), ("b", "p0"))),
            Err(BuildError::PortConflict {
                component: "b".into(),
                port: "p0".into(),
            })
        );
        assert_eq!(topo.links().len(), 1);
    }

    #[test]
    fn links_require_known_components() {
        let mut topo = Topology::new();
        topo.add_component(cache("a")).unwrap();
        assert_eq!(
            topo.add_link(link("wire", ("a", "p0"), ("ghost", "p0"))),
            Err(BuildError::UnknownComponent("ghost".into()))
        );
    }

    #[test]
    fn bus_port_claims_are_exclusive() {
        let mut topo = Topology::new();
        topo.add_component(Component::new("membus", ComponentKind::Bus, ParamSet::new()))
            .unwrap();
        topo.add_component(cache("l1a")).unwrap();
        topo.add_component(cache("l1b")).unwrap();
        topo.attach_to_bus("membus", "l1a", BusPort(3), "2 ns").unwrap();
        assert_eq!(
            topo.attach_to_bus("membus", "l1b", BusPort(3), "2 ns"),
            Err(BuildError::PortConflict {
                component: "membus".into(),
                port: "high_network_3".into(),
            })
        );
        assert_eq!(topo.attachments().len(), 1);
    }
}
