//! Flat netlists.

use std::fmt::{Display, Formatter};

use arcstr::ArcStr;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// The pseudo-device type connecting a net to ground.
pub const GROUND: &str = "ground";

/// The pseudo-device type shorting several nets together.
pub const CONNECT: &str = "connect";

/// The connections of a [`Device`].
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Connections {
    /// A map from terminal name to net, used by regular devices.
    Ports(IndexMap<ArcStr, ArcStr>),
    /// An ordered list of nets, used by [`GROUND`] and [`CONNECT`] devices.
    Nets(Vec<ArcStr>),
}

impl Connections {
    /// Iterates over the connected nets.
    pub fn nets(&self) -> Box<dyn Iterator<Item = &ArcStr> + '_> {
        match self {
            Self::Ports(ports) => Box::new(ports.values()),
            Self::Nets(nets) => Box::new(nets.iter()),
        }
    }
}

/// A primitive device in a flat netlist.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "type")]
    kind: ArcStr,
    connections: Connections,
    #[serde(default)]
    properties: IndexMap<ArcStr, ArcStr>,
}

impl Device {
    /// Creates a new device.
    pub fn new(
        kind: impl Into<ArcStr>,
        connections: Connections,
        properties: IndexMap<ArcStr, ArcStr>,
    ) -> Self {
        Self {
            kind: kind.into(),
            connections,
            properties,
        }
    }

    /// Creates a device connecting `net` to ground.
    pub fn ground(net: impl Into<ArcStr>) -> Self {
        Self::new(
            GROUND,
            Connections::Nets(vec![net.into()]),
            IndexMap::new(),
        )
    }

    /// Creates a device shorting the given nets together.
    pub fn connect(nets: Vec<ArcStr>) -> Self {
        Self::new(CONNECT, Connections::Nets(nets), IndexMap::new())
    }

    /// The device type.
    #[inline]
    pub fn kind(&self) -> &ArcStr {
        &self.kind
    }

    /// The nets this device connects to.
    #[inline]
    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    /// The device properties.
    #[inline]
    pub fn properties(&self) -> &IndexMap<ArcStr, ArcStr> {
        &self.properties
    }

    /// The hierarchical name of this device, if it has one.
    pub fn name(&self) -> Option<&ArcStr> {
        self.properties.get("name")
    }
}

impl Display for Device {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(name) = self.name() {
            write!(f, " {}", name)?;
        }
        match &self.connections {
            Connections::Ports(ports) => {
                for (terminal, net) in ports.iter() {
                    write!(f, " {}={}", terminal, net)?;
                }
            }
            Connections::Nets(nets) => {
                for net in nets.iter() {
                    write!(f, " {}", net)?;
                }
            }
        }
        for (key, value) in self.properties.iter().filter(|(key, _)| key.as_str() != "name") {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

/// An ordered list of primitive devices.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Netlist {
    devices: Vec<Device>,
}

impl Netlist {
    /// Creates an empty netlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a device.
    #[inline]
    pub fn push(&mut self, device: Device) {
        self.devices.push(device);
    }

    /// The number of devices.
    #[inline]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns `true` if the netlist has no devices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Iterates over the devices, in emission order.
    pub fn iter(&self) -> std::slice::Iter<'_, Device> {
        self.devices.iter()
    }

    /// The devices of this netlist.
    #[inline]
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// The distinct nets of this netlist, lower-cased, in order of first appearance.
    pub fn nodes(&self) -> IndexSet<ArcStr> {
        self.devices
            .iter()
            .flat_map(|device| device.connections.nets())
            .map(|net| ArcStr::from(net.to_lowercase()))
            .collect()
    }
}

impl Extend<Device> for Netlist {
    fn extend<T: IntoIterator<Item = Device>>(&mut self, iter: T) {
        self.devices.extend(iter);
    }
}

impl FromIterator<Device> for Netlist {
    fn from_iter<T: IntoIterator<Item = Device>>(iter: T) -> Self {
        Self {
            devices: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Netlist {
    type Item = Device;
    type IntoIter = std::vec::IntoIter<Device>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.into_iter()
    }
}

impl<'a> IntoIterator for &'a Netlist {
    type Item = &'a Device;
    type IntoIter = std::slice::Iter<'a, Device>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}

impl Display for Netlist {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for device in self.devices.iter() {
            writeln!(f, "{}", device)?;
        }
        write!(f, "{} devices", self.devices.len())
    }
}
