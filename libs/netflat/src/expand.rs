//! Replication of components connected to buses.
//!
//! A component whose terminal of arity `k` is connected to a net of
//! `n * k` signals stands for `n` instances. Instance `i` binds terminal
//! bit `j` to signal `(i mod b) + j * b` of the net, where `b` is the
//! number of signals per terminal bit. Nets narrower than `n * k`
//! are reused cyclically.

use arcstr::ArcStr;
use indexmap::IndexMap;

use crate::error::ErrorKind;
use crate::label::Label;
use crate::netlist::Device;

/// A terminal of a component together with the label of its net.
pub(crate) struct Binding<'a> {
    /// The terminal name, as written.
    pub(crate) terminal: &'a ArcStr,
    /// The single-bit names of the terminal.
    pub(crate) bits: Vec<ArcStr>,
    pub(crate) label: Label,
}

/// The instances a component expands to.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct Replication {
    /// A port map for each instance, from terminal bit name to signal.
    pub(crate) instances: Vec<IndexMap<ArcStr, ArcStr>>,
}

impl Replication {
    /// Computes the instances of the component named `component`.
    pub(crate) fn new(component: &ArcStr, bindings: &[Binding<'_>]) -> Result<Self, ErrorKind> {
        let mut count = 1;
        for binding in bindings {
            let got = binding.label.len();
            let expected = binding.bits.len();
            if expected == 0 || got == 0 || got % expected != 0 {
                return Err(ErrorKind::MalformedConnectionCount {
                    component: component.clone(),
                    terminal: binding.terminal.clone(),
                    got,
                    expected,
                });
            }
            count = count.max(got / expected);
        }

        for binding in bindings {
            if (count * binding.bits.len()) % binding.label.len() != 0 {
                return Err(ErrorKind::NonIntegralReplication {
                    component: component.clone(),
                    terminal: binding.terminal.clone(),
                    instances: count,
                });
            }
        }

        let instances = (0..count)
            .map(|i| {
                let mut ports = IndexMap::new();
                for binding in bindings {
                    let block = binding.label.len() / binding.bits.len();
                    for (j, bit) in binding.bits.iter().enumerate() {
                        ports.insert(bit.clone(), binding.label[(i % block) + j * block].clone());
                    }
                }
                ports
            })
            .collect();
        Ok(Self { instances })
    }

    /// The number of instances.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.instances.len()
    }

    /// The name suffix of instance `i`.
    ///
    /// Instances are indexed most significant first: the first instance,
    /// bound to the first signal of each net, gets the highest index.
    /// An unreplicated component has no suffix.
    pub(crate) fn suffix(&self, i: usize) -> String {
        if self.len() > 1 {
            format!("[{}]", self.len() - 1 - i)
        } else {
            String::new()
        }
    }
}

/// Expands a jumper between two nets into one `connect` device per bit.
pub(crate) fn jumper(n1: &Label, n2: &Label) -> Result<Vec<Device>, ErrorKind> {
    if n1.len() != n2.len() {
        return Err(ErrorKind::JumperWidthMismatch {
            n1: n1.len(),
            n2: n2.len(),
        });
    }
    Ok(n1
        .iter()
        .zip(n2.iter())
        .map(|(a, b)| Device::connect(vec![a.clone(), b.clone()]))
        .collect())
}
