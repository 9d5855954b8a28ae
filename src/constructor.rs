//! Best-fit constructor ranking.
//!
//! ## Key Invariants
//!
//! 1. **Immutable properties are covered**: a constructor is only a candidate when its named parameters
//!    include every declared property that cannot be applied after construction.
//! 2. **Lexicographic fit**: candidates are ordered by (undefined parameters, leftover mutable properties);
//!    only the best pair survives.
//! 3. **Stable ties**: tied candidates keep the declaration order of the constructors.
//!
//! Ranking is pure. Trying the candidates is the node processor's job.

use std::collections::HashSet;

use tracing::debug;

use crate::method_resolver::NamedArgValue;

/// How well a constructor matches the declared properties of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ConstructorFit {
    /// Parameters no declared property supplies.
    pub undefined_parameters: usize,
    /// Mutable properties the constructor leaves to setters.
    pub leftover_setters: usize,
}

/// Declared instance properties of a node split by whether they can be applied after construction.
#[derive(Debug, Clone, Default)]
pub struct PropertyPartition {
    pub defined: Vec<String>,
    pub mutable: HashSet<String>,
}

impl PropertyPartition {
    pub fn immutable(&self) -> impl Iterator<Item = &str> {
        self.defined
            .iter()
            .filter(|property| !self.mutable.contains(*property))
            .map(String::as_str)
    }
}

/// Fit of one candidate, `None` when it cannot receive every immutable property.
pub fn fit(parameters: &[NamedArgValue], properties: &PropertyPartition) -> Option<ConstructorFit> {
    let names: HashSet<&str> = parameters.iter().map(|p| p.name.as_str()).collect();
    if !properties.immutable().all(|property| names.contains(property)) {
        return None;
    }

    let undefined_parameters = names
        .iter()
        .filter(|name| !properties.defined.iter().any(|defined| defined == *name))
        .count();
    let leftover_setters = properties
        .mutable
        .iter()
        .filter(|property| !names.contains(property.as_str()))
        .count();

    Some(ConstructorFit {
        undefined_parameters,
        leftover_setters,
    })
}

/// The best-fitting candidates, in declaration order.
pub fn rank_constructors(
    candidates: Vec<Vec<NamedArgValue>>,
    properties: &PropertyPartition,
) -> Vec<Vec<NamedArgValue>> {
    let mut best: Option<ConstructorFit> = None;
    let mut selected = Vec::new();

    for parameters in candidates {
        let Some(candidate_fit) = fit(&parameters, properties) else {
            debug!(parameters = parameters.len(), "constructor cannot take every immutable property");
            continue;
        };
        match best {
            Some(current) if candidate_fit > current => continue,
            Some(current) if candidate_fit == current => {
                if !selected.contains(&parameters) {
                    selected.push(parameters);
                }
            }
            _ => {
                best = Some(candidate_fit);
                selected.clear();
                selected.push(parameters);
            }
        }
    }

    selected
}
