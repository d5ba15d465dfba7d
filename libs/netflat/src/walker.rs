//! Hierarchy traversal.

use arcstr::ArcStr;
use indexmap::{IndexMap, IndexSet};
use tracing::Level;

use crate::error::{ErrorKind, Result};
use crate::expand::{self, Binding, Replication};
use crate::graph::{Aspect, Component, ComponentId, ComponentKind, Library};
use crate::label::{Labeler, Nets};
use crate::naming::name_components;
use crate::netlist::{Connections, Device, Netlist};
use crate::{ComponentRef, FlattenOptions};

/// The state of a single extraction.
///
/// A context is created fresh for every flatten call and discarded when
/// the call returns, so the library itself is never mutated.
pub(crate) struct Context<'a> {
    lib: &'a Library,
    leaves: &'a IndexSet<ArcStr>,
    pub(crate) globals: IndexSet<ArcStr>,
    /// Names of the modules currently being flattened, outermost first.
    stack: Vec<ArcStr>,
    pub(crate) netlist: Netlist,
}

impl<'a> Context<'a> {
    pub(crate) fn new(lib: &'a Library, options: &'a FlattenOptions) -> Result<Self> {
        let mut globals = IndexSet::new();
        for global in options.globals.iter() {
            globals.extend(siglist::parse_signal(global).map_err(ErrorKind::from)?);
        }
        Ok(Self {
            lib,
            leaves: &options.leaves,
            globals,
            stack: Vec::new(),
            netlist: Netlist::new(),
        })
    }

    #[cfg(test)]
    pub(crate) fn stack(&self) -> &[ArcStr] {
        &self.stack
    }

    /// Flattens the given aspect of `module` into the netlist.
    ///
    /// Local signals are prefixed with `prefix`, except for those bound
    /// by `port_map` to signals of the enclosing module.
    pub(crate) fn flatten(
        &mut self,
        module: &ArcStr,
        aspect: &Aspect,
        prefix: &str,
        port_map: &IndexMap<ArcStr, ArcStr>,
    ) -> Result<()> {
        if self.stack.contains(module) {
            let mut path = self.stack.clone();
            path.push(module.clone());
            return Err(ErrorKind::RecursiveInclusion(path).into());
        }

        self.stack.push(module.clone());
        let res = self.flatten_inner(module, aspect, prefix, port_map);
        self.stack.pop();
        res
    }

    fn flatten_inner(
        &mut self,
        module: &ArcStr,
        aspect: &Aspect,
        prefix: &str,
        port_map: &IndexMap<ArcStr, ArcStr>,
    ) -> Result<()> {
        let span = tracing::span!(Level::DEBUG, "module", name = %module, prefix = %prefix);
        let _guard = span.enter();

        let mut nets = Labeler {
            module,
            aspect,
            prefix,
            port_map,
            globals: &mut self.globals,
        }
        .run()?;
        let names = name_components(module, aspect)?;

        for ((id, component), name) in aspect.components().zip(names) {
            self.expand(aspect, &mut nets, id, component, name, prefix)
                .map_err(|err| err.within(ComponentRef::new(module.clone(), id)))?;
        }
        Ok(())
    }

    fn expand(
        &mut self,
        aspect: &Aspect,
        nets: &mut Nets,
        id: ComponentId,
        component: &Component,
        name: Option<ArcStr>,
        prefix: &str,
    ) -> Result<()> {
        let mut labels = aspect
            .component_points(id)
            .map(|point| nets.label(point).unwrap_or_default());

        let instantiated = match component.kind() {
            ComponentKind::Wire { .. } | ComponentKind::Vdd { .. } | ComponentKind::Port { .. } => {
                return Ok(())
            }
            ComponentKind::Jumper => {
                let n1 = labels.next().unwrap_or_default();
                let n2 = labels.next().unwrap_or_default();
                self.netlist.extend(expand::jumper(&n1, &n2)?);
                return Ok(());
            }
            ComponentKind::Ground => None,
            ComponentKind::Instance { module } => Some(module),
        };

        let full_name = match &name {
            Some(name) => arcstr::format!("{}{}", prefix, name),
            None => arcstr::format!("{}{}", prefix, id),
        };
        let bindings = component
            .terminals()
            .zip(labels)
            .map(|(terminal, label)| {
                Ok(Binding {
                    terminal: terminal.name(),
                    bits: terminal.bits().map_err(ErrorKind::from)?,
                    label,
                })
            })
            .collect::<std::result::Result<Vec<_>, ErrorKind>>()?;
        let replication = Replication::new(&full_name, &bindings)?;

        let Some(instantiated) = instantiated else {
            for ports in replication.instances.iter() {
                self.netlist
                    .extend(ports.values().map(|net| Device::ground(net.clone())));
            }
            return Ok(());
        };

        if self.leaves.contains(instantiated) {
            for (i, ports) in replication.instances.iter().enumerate() {
                let device_name = arcstr::format!("{}{}", full_name, replication.suffix(i));
                tracing::trace!(device = %instantiated, name = %device_name, "emitting leaf device");
                let mut properties = component.properties().clone();
                properties.insert(arcstr::literal!("name"), device_name);
                self.netlist.push(Device::new(
                    instantiated.clone(),
                    Connections::Ports(ports.clone()),
                    properties,
                ));
            }
            return Ok(());
        }

        let lib = self.lib;
        let Some(schematic) = lib.module(instantiated).and_then(|m| m.schematic()) else {
            return Err(ErrorKind::MissingImplementation {
                component: full_name,
                module: instantiated.clone(),
            }
            .into());
        };
        for (i, ports) in replication.instances.iter().enumerate() {
            let child_prefix = format!("{}{}.", full_name, replication.suffix(i));
            self.flatten(instantiated, schematic, &child_prefix, ports)?;
        }
        Ok(())
    }
}
