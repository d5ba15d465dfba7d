//! Net labeling.
//!
//! Connection points that share a location, or that sit on the two ends of
//! a wire, belong to the same net. Nets are tracked in a union-find table
//! keyed by connection point; a net's value holds its label and width,
//! and assigning a value to any member point assigns it to the whole net.
//! Since nets are merged before any label is assigned, the final label of
//! each point does not depend on the order in which components are visited.

use std::fmt::{Display, Formatter};
use std::ops::Deref;

use arcstr::ArcStr;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, FlattenError};
use crate::graph::{Aspect, ComponentId, ComponentKind, PointId};
use crate::ComponentRef;

/// An ordered list of signal names, one per bit.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(Vec<ArcStr>);

impl Label {
    /// Creates a label from the given signal names.
    #[inline]
    pub fn new(signals: Vec<ArcStr>) -> Self {
        Self(signals)
    }

    /// The signal names of this label.
    #[inline]
    pub fn signals(&self) -> &[ArcStr] {
        &self.0
    }
}

impl Deref for Label {
    type Target = [ArcStr];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<ArcStr>> for Label {
    #[inline]
    fn from(value: Vec<ArcStr>) -> Self {
        Self(value)
    }
}

impl FromIterator<ArcStr> for Label {
    fn from_iter<T: IntoIterator<Item = ArcStr>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, signal) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", signal)?;
        }
        write!(f, "]")
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
struct NetKey(u32);

/// The label and width shared by all points of a net.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct Net {
    label: Option<Label>,
    width: Option<usize>,
}

impl ena::unify::UnifyKey for NetKey {
    type Value = Net;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        Self(u)
    }

    fn tag() -> &'static str {
        "NetKey"
    }
}

impl ena::unify::UnifyValue for Net {
    type Error = ErrorKind;

    fn unify_values(existing: &Self, new: &Self) -> Result<Self, Self::Error> {
        let width = match (existing.width, new.width) {
            (Some(existing), Some(new)) if existing != new => {
                return Err(ErrorKind::WidthConflict { existing, new });
            }
            (existing, new) => existing.or(new),
        };
        let label = match (&existing.label, &new.label) {
            (Some(existing), Some(new)) if existing != new => {
                return Err(ErrorKind::LabelConflict {
                    existing: existing.clone(),
                    new: new.clone(),
                });
            }
            (existing, new) => existing.as_ref().or(new.as_ref()).cloned(),
        };
        if let (Some(width), Some(label)) = (width, &label) {
            if label.len() != width {
                return Err(ErrorKind::WidthConflict {
                    existing: width,
                    new: label.len(),
                });
            }
        }
        Ok(Net { label, width })
    }
}

impl From<PointId> for NetKey {
    #[inline]
    fn from(value: PointId) -> Self {
        Self(value.index() as u32)
    }
}

/// The nets of one aspect during one extraction.
pub(crate) struct Nets {
    uf: ena::unify::InPlaceUnificationTable<NetKey>,
}

impl Nets {
    /// Groups the connection points of the aspect into nets.
    fn new(aspect: &Aspect) -> Result<Self, ErrorKind> {
        let mut uf = ena::unify::InPlaceUnificationTable::new();
        for _ in 0..aspect.num_points() {
            uf.new_key(Net::default());
        }
        let mut nets = Self { uf };
        for (_, points) in aspect.locations() {
            for pair in points.windows(2) {
                nets.merge(pair[0], pair[1])?;
            }
        }
        for (id, component) in aspect.components() {
            if component.links_terminals() {
                let points = aspect.component_points(id).collect::<Vec<_>>();
                for pair in points.windows(2) {
                    nets.merge(pair[0], pair[1])?;
                }
            }
        }
        Ok(nets)
    }

    fn merge(&mut self, a: PointId, b: PointId) -> Result<(), ErrorKind> {
        self.uf.unify_var_var(NetKey::from(a), NetKey::from(b))
    }

    /// The label of the net containing the given point.
    pub(crate) fn label(&mut self, point: PointId) -> Option<Label> {
        self.uf.probe_value(NetKey::from(point)).label
    }

    /// The width of the net containing the given point, if it is fixed.
    pub(crate) fn width(&mut self, point: PointId) -> Option<usize> {
        self.uf.probe_value(NetKey::from(point)).width
    }

    fn assign_label(&mut self, point: PointId, label: Label) -> Result<(), ErrorKind> {
        self.uf.unify_var_value(
            NetKey::from(point),
            Net {
                label: Some(label),
                width: None,
            },
        )
    }

    fn assign_width(&mut self, point: PointId, width: usize) -> Result<(), ErrorKind> {
        self.uf.unify_var_value(
            NetKey::from(point),
            Net {
                label: None,
                width: Some(width),
            },
        )
    }
}

/// Assigns labels to every net of an aspect.
pub(crate) struct Labeler<'a> {
    pub(crate) module: &'a ArcStr,
    pub(crate) aspect: &'a Aspect,
    /// Hierarchical prefix for local signal names.
    pub(crate) prefix: &'a str,
    /// Maps local port signals to the signals they are bound to by the parent.
    pub(crate) port_map: &'a IndexMap<ArcStr, ArcStr>,
    pub(crate) globals: &'a mut IndexSet<ArcStr>,
}

impl Labeler<'_> {
    /// Labels all nets of the aspect.
    ///
    /// Fixed widths are propagated first, then labels derived from signal
    /// names, then fresh labels for every net that is still unlabeled.
    /// Every global signal declared in the aspect is known before any
    /// local signal name is resolved.
    pub(crate) fn run(mut self) -> Result<Nets, FlattenError> {
        let mut nets = Nets::new(self.aspect)?;
        self.collect_globals()?;
        self.propagate_widths(&mut nets)?;
        self.add_default_labels(&mut nets)?;
        self.add_synthetic_labels(&mut nets)?;
        Ok(nets)
    }

    fn fail(&self, id: ComponentId, kind: impl Into<ErrorKind>) -> FlattenError {
        FlattenError::from(kind.into()).within(ComponentRef::new(self.module.clone(), id))
    }

    fn collect_globals(&mut self) -> Result<(), FlattenError> {
        let aspect = self.aspect;
        for (id, component) in aspect.components() {
            let signal = match component.kind() {
                ComponentKind::Ground => crate::graph::GROUND_SIGNAL,
                ComponentKind::Vdd { global_signal } => global_signal.as_str(),
                _ => continue,
            };
            for signal in siglist::parse_signal(signal).map_err(|err| self.fail(id, err))? {
                if self.globals.insert(signal.clone()) {
                    tracing::debug!(%signal, "discovered global signal");
                }
            }
        }
        Ok(())
    }

    fn propagate_widths(&self, nets: &mut Nets) -> Result<(), FlattenError> {
        for (id, component) in self.aspect.components() {
            if let ComponentKind::Wire {
                width: Some(width), ..
            } = component.kind()
            {
                // A zero width is treated as unspecified.
                if *width == 0 {
                    continue;
                }
                for point in self.aspect.component_points(id) {
                    nets.assign_width(point, *width)
                        .map_err(|err| self.fail(id, err))?;
                }
            }
        }
        Ok(())
    }

    fn add_default_labels(&self, nets: &mut Nets) -> Result<(), FlattenError> {
        let aspect = self.aspect;
        for (id, component) in aspect.components() {
            let label = match component.kind() {
                ComponentKind::Ground => self.global_label(id, crate::graph::GROUND_SIGNAL, nets)?,
                ComponentKind::Vdd { global_signal } => self.global_label(id, global_signal, nets)?,
                ComponentKind::Port { signal }
                | ComponentKind::Wire {
                    signal: Some(signal),
                    ..
                } => self.local_label(id, signal)?,
                _ => continue,
            };
            if label.is_empty() {
                continue;
            }
            tracing::trace!(component = %id, %label, "default label");
            for point in aspect.component_points(id) {
                nets.assign_label(point, label.clone())
                    .map_err(|err| self.fail(id, err))?;
            }
        }
        Ok(())
    }

    /// Global signals are neither mapped nor prefixed.
    ///
    /// A single global signal on a net of fixed width is replicated
    /// to that width.
    fn global_label(
        &self,
        id: ComponentId,
        signal: &str,
        nets: &mut Nets,
    ) -> Result<Label, FlattenError> {
        let mut signals = siglist::parse_signal(signal).map_err(|err| self.fail(id, err))?;
        let width = self
            .aspect
            .component_points(id)
            .next()
            .and_then(|point| nets.width(point));
        if let (Some(width), [signal]) = (width, signals.as_slice()) {
            if width > 1 {
                signals = vec![signal.clone(); width];
            }
        }
        Ok(Label::new(signals))
    }

    /// Local signals bound to a port take the external name;
    /// known global signals pass through; everything else is prefixed.
    fn local_label(&self, id: ComponentId, signal: &str) -> Result<Label, FlattenError> {
        let signals = siglist::parse_signal(signal).map_err(|err| self.fail(id, err))?;
        Ok(signals
            .into_iter()
            .map(|name| {
                if let Some(external) = self.port_map.get(&name) {
                    external.clone()
                } else if self.globals.contains(&name) {
                    name
                } else {
                    arcstr::format!("{}{}", self.prefix, name)
                }
            })
            .collect())
    }

    fn add_synthetic_labels(&self, nets: &mut Nets) -> Result<(), FlattenError> {
        let mut counter = 0usize;
        for (id, component) in self.aspect.components() {
            // Wires only carry labels produced elsewhere.
            if component.links_terminals() {
                continue;
            }
            for (point, terminal) in self.aspect.component_points(id).zip(component.terminals()) {
                if nets.label(point).is_some() {
                    continue;
                }
                let width = match nets.width(point) {
                    Some(width) => width,
                    None => terminal.arity().map_err(|err| self.fail(id, err))?,
                };
                let label = (0..width)
                    .map(|_| {
                        counter += 1;
                        arcstr::format!("{}{}", self.prefix, counter)
                    })
                    .collect::<Label>();
                tracing::trace!(component = %id, terminal = %terminal.name(), %label, "synthetic label");
                nets.assign_label(point, label)
                    .map_err(|err| self.fail(id, err))?;
            }
        }
        Ok(())
    }
}
