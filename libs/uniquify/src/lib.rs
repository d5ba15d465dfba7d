//! A library for assigning unique names.
//!
//! Names are compared case-insensitively and stored in lower case.

use std::collections::{HashMap, HashSet};

use arcstr::ArcStr;
use thiserror::Error;

#[cfg(test)]
mod tests;

/// A name was reserved more than once.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("duplicate name: `{0}`")]
pub struct DuplicateName(pub ArcStr);

/// A set of unique names.
///
/// Explicit names are recorded with [`Names::reserve`];
/// fresh names are generated from a base name with [`Names::allocate`].
#[derive(Debug, Clone, Default)]
pub struct Names {
    taken: HashSet<ArcStr>,
    /// The last suffix handed out for each base name.
    counters: HashMap<ArcStr, usize>,
}

impl Names {
    /// Creates a new, empty name set.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns `true` if the given name is already in use.
    pub fn contains(&self, name: &str) -> bool {
        self.taken.contains(name.to_lowercase().as_str())
    }

    /// The number of names in use.
    #[inline]
    pub fn len(&self) -> usize {
        self.taken.len()
    }

    /// Returns `true` if no names are in use.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }

    /// Marks the given name as used.
    ///
    /// Returns the canonical (lower-case) form of the name,
    /// or an error if the name is already in use.
    pub fn reserve(&mut self, name: &str) -> Result<ArcStr, DuplicateName> {
        let name = ArcStr::from(name.to_lowercase());
        if self.taken.insert(name.clone()) {
            Ok(name)
        } else {
            Err(DuplicateName(name))
        }
    }

    /// Allocates a new, unique name of the form `<base>_<n>`.
    ///
    /// `n` starts at 1 and only grows for a given base,
    /// skipping any number whose name has already been reserved.
    pub fn allocate(&mut self, base: &str) -> ArcStr {
        let base = ArcStr::from(base.to_lowercase());
        let counter = self.counters.entry(base.clone()).or_default();
        loop {
            *counter += 1;
            let name = arcstr::format!("{}_{}", base, counter);
            if self.taken.insert(name.clone()) {
                break name;
            }
        }
    }
}
