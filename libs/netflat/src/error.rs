//! Flattening errors.

use std::fmt::{Display, Formatter};

use arcstr::ArcStr;
use thiserror::Error;

use crate::graph::ComponentId;
use crate::label::Label;

/// A flattening result.
pub type Result<T> = std::result::Result<T, FlattenError>;

/// The reason a flatten operation failed.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ErrorKind {
    /// A module instantiates itself, directly or transitively.
    ///
    /// Holds the ancestor path, starting at the top module
    /// and ending with the repeated module.
    #[error("recursive inclusion of module: {}", join_path(.0))]
    RecursiveInclusion(Vec<ArcStr>),
    /// Two different labels reached the same net.
    #[error("label conflict: {existing} vs. {new}")]
    LabelConflict {
        /// The label already on the net.
        existing: Label,
        /// The label that was being assigned.
        new: Label,
    },
    /// Two different widths reached the same net.
    #[error("width conflict: {existing} vs. {new}")]
    WidthConflict {
        /// The width already on the net.
        existing: usize,
        /// The width that was being assigned.
        new: usize,
    },
    /// Two components in the same aspect share an explicit name.
    #[error("duplicate component name: `{0}`")]
    DuplicateComponentName(ArcStr),
    /// A terminal is connected to a number of signals that is
    /// not a multiple of its arity.
    #[error(
        "{component}: number of connections to terminal `{terminal}` ({got}) is not a multiple of {expected}"
    )]
    MalformedConnectionCount {
        /// The name of the component.
        component: ArcStr,
        /// The name of the terminal.
        terminal: ArcStr,
        /// The number of signals connected to the terminal.
        got: usize,
        /// The arity of the terminal.
        expected: usize,
    },
    /// A terminal's connections cannot be split evenly among the instances
    /// of a replicated component.
    #[error(
        "{component}: connections to terminal `{terminal}` cannot be split among {instances} instances"
    )]
    NonIntegralReplication {
        /// The name of the component.
        component: ArcStr,
        /// The name of the terminal.
        terminal: ArcStr,
        /// The number of instances.
        instances: usize,
    },
    /// The two nets of a jumper have different widths.
    #[error("jumper connects nets of different widths: {n1} and {n2}")]
    JumperWidthMismatch {
        /// The width of the net on terminal `n1`.
        n1: usize,
        /// The width of the net on terminal `n2`.
        n2: usize,
    },
    /// An instantiated module is neither a leaf nor has a schematic.
    #[error("{component}: no implementation for module `{module}`")]
    MissingImplementation {
        /// The name of the component.
        component: ArcStr,
        /// The instantiated module.
        module: ArcStr,
    },
    /// The module to flatten does not exist.
    #[error("no module named `{0}`")]
    UnknownModule(ArcStr),
    /// A terminal name or signal property is not a valid signal list.
    #[error(transparent)]
    InvalidSignal(#[from] siglist::ParseError),
}

fn join_path(path: &[ArcStr]) -> String {
    path.iter()
        .map(ArcStr::as_str)
        .collect::<Vec<_>>()
        .join(" → ")
}

impl From<uniquify::DuplicateName> for ErrorKind {
    fn from(value: uniquify::DuplicateName) -> Self {
        Self::DuplicateComponentName(value.0)
    }
}

/// A reference to a component of a module's schematic.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct ComponentRef {
    module: ArcStr,
    id: ComponentId,
}

impl ComponentRef {
    /// Creates a reference to component `id` of `module`.
    #[inline]
    pub fn new(module: impl Into<ArcStr>, id: ComponentId) -> Self {
        Self {
            module: module.into(),
            id,
        }
    }

    /// The module containing the component.
    #[inline]
    pub fn module(&self) -> &ArcStr {
        &self.module
    }

    /// The ID of the component within the module's schematic.
    #[inline]
    pub fn id(&self) -> ComponentId {
        self.id
    }
}

impl Display for ComponentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.module, self.id)
    }
}

/// A collaborator that visually flags components involved in a failure.
pub trait Highlighter {
    /// Marks the given component as selected.
    fn mark_selected(&mut self, component: &ComponentRef);
}

impl<F: FnMut(&ComponentRef)> Highlighter for F {
    fn mark_selected(&mut self, component: &ComponentRef) {
        self(component)
    }
}

/// An error encountered while flattening.
///
/// In addition to the [`ErrorKind`], the error records the chain of
/// components being expanded when the failure occurred, outermost first.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
#[error("{kind}")]
pub struct FlattenError {
    kind: ErrorKind,
    trail: Vec<ComponentRef>,
}

impl FlattenError {
    /// The reason for the failure.
    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The components being expanded when the failure occurred, outermost first.
    #[inline]
    pub fn trail(&self) -> &[ComponentRef] {
        &self.trail
    }

    /// The innermost component involved in the failure, if any.
    #[inline]
    pub fn component(&self) -> Option<&ComponentRef> {
        self.trail.last()
    }

    /// Calls [`Highlighter::mark_selected`] on each component of the trail.
    pub fn highlight(&self, highlighter: &mut impl Highlighter) {
        for component in self.trail.iter() {
            highlighter.mark_selected(component);
        }
    }

    /// Records that the failure happened while expanding the given component.
    pub(crate) fn within(mut self, component: ComponentRef) -> Self {
        self.trail.insert(0, component);
        self
    }
}

impl From<ErrorKind> for FlattenError {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            trail: Vec::new(),
        }
    }
}
