use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use log::debug;

use super::dependency::DependencyGraph;

/// One named schema in its final declaration position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedSchema {
    /// Position in the schema table (document order).
    pub index: usize,
    pub name: String,
    /// Must be wrapped in a lazy binding: member of a mutual cycle or
    /// directly self-referential.
    pub lazy: bool,
    /// Emission order of the strongly connected component it belongs to.
    pub group: usize,
}

/// Declaration sequence for one document.
///
/// For every edge `A → B` with `A` and `B` in different components, `B`
/// appears strictly before `A`.
#[derive(Debug, Clone, Default)]
pub struct DeclarationOrder {
    entries: Vec<OrderedSchema>,
}

impl DeclarationOrder {
    pub fn iter(&self) -> impl Iterator<Item = &OrderedSchema> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&OrderedSchema> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn is_lazy(&self, name: &str) -> bool {
        self.get(name).is_some_and(|e| e.lazy)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Members of each component, in emission order.
    pub fn groups(&self) -> Vec<Vec<&OrderedSchema>> {
        let mut groups: Vec<Vec<&OrderedSchema>> = Vec::new();
        for entry in &self.entries {
            match groups.last_mut() {
                Some(group) if group[0].group == entry.group => group.push(entry),
                _ => groups.push(vec![entry]),
            }
        }
        groups
    }
}

/// Order declarations so that every identifier is declared before use,
/// except inside lazily bound cycles.
///
/// Components of the condensation are emitted with Kahn's algorithm; among
/// ready components the one whose earliest member comes first in the
/// document wins, which keeps the output reproducible. A document that is
/// one giant cycle simply comes out fully lazy.
pub fn order_declarations(graph: &DependencyGraph) -> DeclarationOrder {
    let components = graph.strongly_connected_components();

    let mut component_of = vec![0; graph.len()];
    for (c, members) in components.iter().enumerate() {
        for &m in members {
            component_of[m] = c;
        }
    }

    // Component-level edges: `requires[c]` must be emitted before `c`.
    let mut requires: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); components.len()];
    let mut required_by: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); components.len()];
    for edge in graph.edges() {
        let (from, to) = (component_of[edge.from], component_of[edge.to]);
        if from != to {
            requires[from].insert(to);
            required_by[to].insert(from);
        }
    }

    let mut pending: Vec<usize> = requires.iter().map(BTreeSet::len).collect();
    let mut ready: BinaryHeap<Reverse<(usize, usize)>> = components
        .iter()
        .enumerate()
        .filter(|(c, _)| pending[*c] == 0)
        .map(|(c, members)| Reverse((members[0], c)))
        .collect();

    let mut entries = Vec::with_capacity(graph.len());
    let mut group = 0;
    while let Some(Reverse((_, c))) = ready.pop() {
        let members = &components[c];
        let lazy = graph.is_cyclic_component(members);
        if lazy {
            debug!(
                "cyclic group {:?} will be lazily bound",
                members.iter().map(|&m| graph.name(m)).collect::<Vec<_>>()
            );
        }
        for &m in members {
            entries.push(OrderedSchema {
                index: m,
                name: graph.name(m).to_string(),
                lazy,
                group,
            });
        }
        group += 1;

        for &dependent in &required_by[c] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.push(Reverse((components[dependent][0], dependent)));
            }
        }
    }

    DeclarationOrder { entries }
}
