//! Hierarchical netlist flattening.
//!
//! A [`Library`] holds modules whose schematics are graphs of components
//! placed on a grid. Flattening a module walks its schematic, assigns a
//! label (a list of signal names, one per bit) to every net, names every
//! instance, and replaces each instance either with primitive [`Device`]s
//! (if its module is a leaf) or with the flattened contents of the
//! instantiated module's own schematic.
//!
//! Hierarchical names are joined with `.`, and replicated instances are
//! indexed most significant bit first: an inverter named `x` connected to
//! the 3-bit bus `[a, b, c]` becomes `x[2]` (on `a`), `x[1]` and `x[0]`.
//!
//! # Examples
//!
//! ```
//! use netflat::{Aspect, Component, FlattenOptions, Library, Module};
//!
//! let mut top = Aspect::new();
//! top.add_component(Component::named_wire("a, b", (0, 0), (0, 10)));
//! top.add_component(
//!     Component::instance("inv")
//!         .with_terminal("in", (0, 10))
//!         .with_terminal("out", (10, 10)),
//! );
//!
//! let lib = Library::from_iter([Module::with_schematic("top", top)]);
//! let options = FlattenOptions::new().with_leaf("inv");
//! let extraction = lib.flatten("top", &options).unwrap();
//! assert_eq!(extraction.netlist.len(), 2);
//! ```
#![warn(missing_docs)]

use arcstr::ArcStr;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::{span, Level};

pub mod error;
mod expand;
pub mod graph;
pub mod label;
mod naming;
pub mod netlist;
mod walker;


pub use error::{ComponentRef, ErrorKind, FlattenError, Highlighter, Result};
pub use graph::{
    Aspect, Component, ComponentId, ComponentKind, ConnectionPoint, Library, Location, Module,
    PointId, Terminal,
};
pub use label::Label;
pub use netlist::{Connections, Device, Netlist};

use walker::Context;

/// Options controlling a flatten operation.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenOptions {
    /// Module names emitted as primitive devices rather than flattened.
    pub leaves: IndexSet<ArcStr>,
    /// Signal lists of signals that are global from the start.
    pub globals: Vec<ArcStr>,
}

impl FlattenOptions {
    /// Creates options with no leaves and no initial globals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a leaf module.
    pub fn with_leaf(mut self, leaf: impl Into<ArcStr>) -> Self {
        self.leaves.insert(leaf.into());
        self
    }

    /// Adds leaf modules.
    pub fn with_leaves<T: Into<ArcStr>>(mut self, leaves: impl IntoIterator<Item = T>) -> Self {
        self.leaves.extend(leaves.into_iter().map(Into::into));
        self
    }

    /// Adds an initial global signal list.
    pub fn with_global(mut self, global: impl Into<ArcStr>) -> Self {
        self.globals.push(global.into());
        self
    }
}

/// The result of a successful flatten operation.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// The flat list of devices, in emission order.
    pub netlist: Netlist,
    /// The global signals, in order of discovery.
    pub globals: IndexSet<ArcStr>,
}

impl Library {
    /// Flattens the schematic of the module named `top`.
    ///
    /// The library is only read, so it can be flattened from several
    /// threads at once.
    pub fn flatten(&self, top: &str, options: &FlattenOptions) -> Result<Extraction> {
        let module = self
            .module(top)
            .ok_or_else(|| ErrorKind::UnknownModule(ArcStr::from(top)))?;
        let schematic = module
            .schematic()
            .ok_or_else(|| ErrorKind::MissingImplementation {
                component: module.name().clone(),
                module: module.name().clone(),
            })?;
        self.flatten_aspect(module.name(), schematic, options)
    }

    /// Flattens the given aspect as if it were the schematic of `module`.
    ///
    /// Instances within the aspect are resolved against this library.
    pub fn flatten_aspect(
        &self,
        module: &ArcStr,
        aspect: &Aspect,
        options: &FlattenOptions,
    ) -> Result<Extraction> {
        let span = span!(Level::INFO, "flatten", top = %module);
        let _guard = span.enter();

        let res = Context::new(self, options).and_then(|mut ctx| {
            ctx.flatten(module, aspect, "", &IndexMap::new())?;
            Ok(Extraction {
                netlist: ctx.netlist,
                globals: ctx.globals,
            })
        });

        match &res {
            Ok(extraction) => tracing::debug!(
                devices = extraction.netlist.len(),
                globals = extraction.globals.len(),
                "flatten complete"
            ),
            Err(err) => tracing::error!(
                error = %err,
                component = ?err.component().map(ToString::to_string),
                "flatten failed"
            ),
        }
        res
    }
}
