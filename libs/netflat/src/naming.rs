//! Component naming.

use arcstr::ArcStr;
use uniquify::Names;

use crate::error::{ErrorKind, FlattenError};
use crate::graph::{base_name, Aspect};
use crate::ComponentRef;

/// Assigns a unique name to each instance in the aspect.
///
/// Explicit names are reserved first, in declaration order, so that
/// generated names never collide with them. Unnamed instances are then
/// named after their module. Built-in components without an explicit
/// name stay unnamed.
///
/// The returned vector is indexed by component position.
pub(crate) fn name_components(
    module: &ArcStr,
    aspect: &Aspect,
) -> Result<Vec<Option<ArcStr>>, FlattenError> {
    let mut names = Names::new();
    let mut assigned = Vec::with_capacity(aspect.len());
    for (id, component) in aspect.components() {
        let name = match component.name() {
            Some(name) => Some(names.reserve(name).map_err(|err| {
                FlattenError::from(ErrorKind::from(err))
                    .within(ComponentRef::new(module.clone(), id))
            })?),
            None => None,
        };
        assigned.push(name);
    }
    for ((id, component), name) in aspect.components().zip(assigned.iter_mut()) {
        if name.is_some() {
            continue;
        }
        if let Some(instantiated) = component.module() {
            let generated = names.allocate(&base_name(instantiated));
            tracing::trace!(component = %id, name = %generated, "generated instance name");
            *name = Some(generated);
        }
    }
    Ok(assigned)
}
