//! The module/component graph consumed by flattening.
//!
//! The graph is authored by an editor and is read-only while a netlist is
//! extracted. An [`Aspect`] stores its components in an arena addressed by
//! [`ComponentId`], and derives from them an arena of connection points
//! addressed by [`PointId`], together with a map from each schematic
//! [`Location`] to the connection points placed there.

use std::fmt::{Display, Formatter};
use std::ops::Range;

use arcstr::ArcStr;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The name of the aspect that is flattened.
pub const SCHEMATIC: &str = "schematic";

/// The global signal that [`ComponentKind::Ground`] connects to.
pub const GROUND_SIGNAL: &str = "gnd";

/// The default global signal of a [`ComponentKind::Vdd`] supply.
pub const SUPPLY_SIGNAL: &str = "vdd";

/// A point on the schematic grid.
#[derive(
    Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct Location(pub i64, pub i64);

impl From<(i64, i64)> for Location {
    #[inline]
    fn from(value: (i64, i64)) -> Self {
        Self(value.0, value.1)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.0, self.1)
    }
}

/// An opaque component identifier.
///
/// A component ID is only meaningful in the context of the [`Aspect`]
/// that created it.
#[derive(
    Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct ComponentId(usize);

impl ComponentId {
    /// The position of the component in declaration order.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Display for ComponentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "comp{}", self.0)
    }
}

/// An opaque connection point identifier.
///
/// A point ID is only meaningful in the context of the [`Aspect`]
/// that created it.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct PointId(usize);

impl PointId {
    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.0
    }
}

/// The per-kind configuration of a component.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentKind {
    /// A wire.
    ///
    /// Both ends of a wire always carry the same label.
    Wire {
        /// An optional local signal name for the net.
        #[serde(default)]
        signal: Option<ArcStr>,
        /// An optional fixed width for the net.
        #[serde(default)]
        width: Option<usize>,
    },
    /// A connection to the global ground signal.
    Ground,
    /// A connection to a global supply signal.
    Vdd {
        /// The global signal list, `vdd` by default.
        #[serde(default = "default_supply")]
        global_signal: ArcStr,
    },
    /// A named connection to the enclosing module's interface.
    Port {
        /// The local signal list bound by this port.
        signal: ArcStr,
    },
    /// A bitwise connection between two nets of equal width.
    Jumper,
    /// An instance of a module or of a leaf device type.
    Instance {
        /// The name of the instantiated module.
        module: ArcStr,
    },
}

fn default_supply() -> ArcStr {
    ArcStr::from(SUPPLY_SIGNAL)
}

/// A named terminal of a component, placed at a schematic location.
///
/// The terminal name is a signal list (e.g. `d[3:0]`);
/// its expansion gives the terminal's per-bit names and arity.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    name: ArcStr,
    location: Location,
}

impl Terminal {
    /// Creates a new terminal.
    pub fn new(name: impl Into<ArcStr>, location: impl Into<Location>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }

    /// The name of this terminal, as written.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The location of this terminal.
    #[inline]
    pub fn location(&self) -> Location {
        self.location
    }

    /// The single-bit names of this terminal.
    pub fn bits(&self) -> siglist::Result<Vec<ArcStr>> {
        siglist::parse_signal(&self.name)
    }

    /// The number of bits of this terminal.
    #[inline]
    pub fn arity(&self) -> siglist::Result<usize> {
        siglist::width(&self.name)
    }
}

/// A component placed in an [`Aspect`].
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(flatten)]
    kind: ComponentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<ArcStr>,
    #[serde(default)]
    terminals: Vec<Terminal>,
    /// Properties passed through to emitted devices.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    properties: IndexMap<ArcStr, ArcStr>,
}

impl Component {
    /// Creates a component of the given kind with no terminals.
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            name: None,
            terminals: Vec::new(),
            properties: IndexMap::new(),
        }
    }

    /// Creates an unnamed wire between two locations.
    pub fn wire(from: impl Into<Location>, to: impl Into<Location>) -> Self {
        Self::new(ComponentKind::Wire {
            signal: None,
            width: None,
        })
        .with_terminal("n1", from)
        .with_terminal("n2", to)
    }

    /// Creates a wire whose net carries the given local signal list.
    pub fn named_wire(
        signal: impl Into<ArcStr>,
        from: impl Into<Location>,
        to: impl Into<Location>,
    ) -> Self {
        Self::new(ComponentKind::Wire {
            signal: Some(signal.into()),
            width: None,
        })
        .with_terminal("n1", from)
        .with_terminal("n2", to)
    }

    /// Creates a wire that fixes the width of its net.
    pub fn bus_wire(width: usize, from: impl Into<Location>, to: impl Into<Location>) -> Self {
        Self::new(ComponentKind::Wire {
            signal: None,
            width: Some(width),
        })
        .with_terminal("n1", from)
        .with_terminal("n2", to)
    }

    /// Creates a ground connection.
    pub fn ground(at: impl Into<Location>) -> Self {
        Self::new(ComponentKind::Ground).with_terminal(GROUND_SIGNAL, at)
    }

    /// Creates a connection to the default `vdd` supply.
    pub fn vdd(at: impl Into<Location>) -> Self {
        Self::global(SUPPLY_SIGNAL, at)
    }

    /// Creates a connection to the given global signal list.
    pub fn global(signal: impl Into<ArcStr>, at: impl Into<Location>) -> Self {
        Self::new(ComponentKind::Vdd {
            global_signal: signal.into(),
        })
        .with_terminal("n", at)
    }

    /// Creates an interface port binding the given local signal list.
    pub fn port(signal: impl Into<ArcStr>, at: impl Into<Location>) -> Self {
        Self::new(ComponentKind::Port {
            signal: signal.into(),
        })
        .with_terminal("n", at)
    }

    /// Creates a jumper between two locations.
    pub fn jumper(n1: impl Into<Location>, n2: impl Into<Location>) -> Self {
        Self::new(ComponentKind::Jumper)
            .with_terminal("n1", n1)
            .with_terminal("n2", n2)
    }

    /// Creates an instance of the given module with no terminals.
    pub fn instance(module: impl Into<ArcStr>) -> Self {
        Self::new(ComponentKind::Instance {
            module: module.into(),
        })
    }

    /// Adds a terminal.
    pub fn with_terminal(mut self, name: impl Into<ArcStr>, at: impl Into<Location>) -> Self {
        self.terminals.push(Terminal::new(name, at));
        self
    }

    /// Sets an explicit name.
    pub fn with_name(mut self, name: impl Into<ArcStr>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets a passthrough property.
    pub fn with_property(mut self, key: impl Into<ArcStr>, value: impl Into<ArcStr>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The kind of this component.
    #[inline]
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// The explicit name of this component, if any.
    #[inline]
    pub fn name(&self) -> Option<&ArcStr> {
        self.name.as_ref().filter(|name| !name.is_empty())
    }

    /// The instantiated module, if this component is an instance.
    pub fn module(&self) -> Option<&ArcStr> {
        match &self.kind {
            ComponentKind::Instance { module } => Some(module),
            _ => None,
        }
    }

    /// Iterate over the terminals of this component.
    #[inline]
    pub fn terminals(&self) -> impl Iterator<Item = &Terminal> {
        self.terminals.iter()
    }

    /// The terminal at the given position.
    ///
    /// # Panics
    ///
    /// Panics if the component has fewer than `idx + 1` terminals.
    #[inline]
    pub fn terminal(&self, idx: usize) -> &Terminal {
        &self.terminals[idx]
    }

    /// The passthrough properties of this component.
    #[inline]
    pub fn properties(&self) -> &IndexMap<ArcStr, ArcStr> {
        &self.properties
    }

    /// Whether a label on one terminal must be carried by all the others.
    #[inline]
    pub(crate) fn links_terminals(&self) -> bool {
        matches!(self.kind, ComponentKind::Wire { .. })
    }
}

/// One terminal endpoint of a component, at a schematic location.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ConnectionPoint {
    component: ComponentId,
    terminal: usize,
    location: Location,
}

impl ConnectionPoint {
    /// The component this point belongs to.
    #[inline]
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// The position of the terminal within its component.
    #[inline]
    pub fn terminal(&self) -> usize {
        self.terminal
    }

    /// The location of this point.
    #[inline]
    pub fn location(&self) -> Location {
        self.location
    }
}

/// A graph view of a module: an ordered list of components
/// and the connection points they place on the schematic grid.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Component>", into = "Vec<Component>")]
pub struct Aspect {
    components: Vec<Component>,
    /// Index of each component's first connection point in `points`.
    offsets: Vec<usize>,
    points: Vec<ConnectionPoint>,
    adjacency: IndexMap<Location, Vec<PointId>>,
}

impl Aspect {
    /// Creates a new, empty aspect.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the given component.
    ///
    /// Returns the ID of the newly added component.
    pub fn add_component(&mut self, component: Component) -> ComponentId {
        let id = ComponentId(self.components.len());
        self.offsets.push(self.points.len());
        for (terminal, t) in component.terminals.iter().enumerate() {
            let point = PointId(self.points.len());
            self.points.push(ConnectionPoint {
                component: id,
                terminal,
                location: t.location,
            });
            self.adjacency.entry(t.location).or_default().push(point);
        }
        self.components.push(component);
        id
    }

    /// The number of components in this aspect.
    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if this aspect has no components.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Gets the component with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no component has the given ID.
    /// For a non-panicking alternative, see [`try_component`](Aspect::try_component).
    #[inline]
    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id.0]
    }

    /// Gets the component with the given ID.
    #[inline]
    pub fn try_component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.0)
    }

    /// Iterates over the components of this aspect, in declaration order.
    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.components
            .iter()
            .enumerate()
            .map(|(i, c)| (ComponentId(i), c))
    }

    /// Gets the connection point with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no connection point has the given ID.
    #[inline]
    pub fn point(&self, id: PointId) -> &ConnectionPoint {
        &self.points[id.0]
    }

    /// Iterates over all connection points of this aspect.
    pub fn points(&self) -> impl Iterator<Item = (PointId, &ConnectionPoint)> {
        self.points.iter().enumerate().map(|(i, p)| (PointId(i), p))
    }

    /// The number of connection points in this aspect.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// The connection points of the given component, in terminal order.
    ///
    /// # Panics
    ///
    /// Panics if no component has the given ID.
    pub fn component_points(&self, id: ComponentId) -> impl Iterator<Item = PointId> {
        self.point_range(id).map(PointId)
    }

    fn point_range(&self, id: ComponentId) -> Range<usize> {
        let start = self.offsets[id.0];
        start..start + self.components[id.0].terminals.len()
    }

    /// The connection points located at the given location.
    pub fn coincident(&self, location: Location) -> &[PointId] {
        self.adjacency
            .get(&location)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterates over every occupied location and the connection points there.
    pub fn locations(&self) -> impl Iterator<Item = (Location, &[PointId])> {
        self.adjacency
            .iter()
            .map(|(location, points)| (*location, points.as_slice()))
    }
}

impl From<Vec<Component>> for Aspect {
    fn from(value: Vec<Component>) -> Self {
        value.into_iter().collect()
    }
}

impl From<Aspect> for Vec<Component> {
    fn from(value: Aspect) -> Self {
        value.components
    }
}

impl FromIterator<Component> for Aspect {
    fn from_iter<T: IntoIterator<Item = Component>>(iter: T) -> Self {
        let mut aspect = Aspect::new();
        for component in iter {
            aspect.add_component(component);
        }
        aspect
    }
}

/// A named circuit definition with ports and one or more aspects.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Module {
    name: ArcStr,
    #[serde(default)]
    ports: Vec<ArcStr>,
    #[serde(default)]
    aspects: IndexMap<ArcStr, Aspect>,
}

impl Module {
    /// Creates a new module with no ports and no aspects.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            ports: Vec::new(),
            aspects: IndexMap::new(),
        }
    }

    /// Creates a new module whose schematic is the given aspect.
    pub fn with_schematic(name: impl Into<ArcStr>, schematic: Aspect) -> Self {
        let mut module = Self::new(name);
        module.set_aspect(SCHEMATIC, schematic);
        module
    }

    /// Adds a port, named by a signal list.
    pub fn add_port(&mut self, port: impl Into<ArcStr>) {
        self.ports.push(port.into());
    }

    /// Sets the aspect with the given name, replacing any existing one.
    pub fn set_aspect(&mut self, name: impl Into<ArcStr>, aspect: Aspect) {
        self.aspects.insert(name.into(), aspect);
    }

    /// The name of this module.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The ports of this module.
    #[inline]
    pub fn ports(&self) -> &[ArcStr] {
        &self.ports
    }

    /// Gets the aspect with the given name.
    #[inline]
    pub fn aspect(&self, name: &str) -> Option<&Aspect> {
        self.aspects.get(name)
    }

    /// Gets the schematic aspect, if there is one.
    #[inline]
    pub fn schematic(&self) -> Option<&Aspect> {
        self.aspect(SCHEMATIC)
    }

    /// The name used as a base for auto-generated instance names.
    ///
    /// This is the last `/`-separated segment of the module name, lower-cased.
    pub fn base_name(&self) -> String {
        base_name(&self.name)
    }
}

pub(crate) fn base_name(module: &str) -> String {
    module.rsplit('/').next().unwrap_or(module).to_lowercase()
}

/// A collection of modules, keyed by name.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Module>", into = "Vec<Module>")]
pub struct Library {
    modules: IndexMap<ArcStr, Module>,
}

impl Library {
    /// Creates a new, empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the given module, replacing any module with the same name.
    ///
    /// Returns the replaced module, if any.
    pub fn add_module(&mut self, module: Module) -> Option<Module> {
        self.modules.insert(module.name.clone(), module)
    }

    /// Gets the module with the given name.
    #[inline]
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Iterates over the modules of this library, in insertion order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }
}

impl From<Vec<Module>> for Library {
    fn from(value: Vec<Module>) -> Self {
        value.into_iter().collect()
    }
}

impl From<Library> for Vec<Module> {
    fn from(value: Library) -> Self {
        value.modules.into_values().collect()
    }
}

impl FromIterator<Module> for Library {
    fn from_iter<T: IntoIterator<Item = Module>>(iter: T) -> Self {
        let mut lib = Library::new();
        for module in iter {
            lib.add_module(module);
        }
        lib
    }
}
