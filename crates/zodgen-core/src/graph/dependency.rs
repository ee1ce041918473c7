use indexmap::IndexSet;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::ir::SchemaTable;

/// `from` textually requires `to`'s identifier to exist. Indices are
/// positions in the schema table (document order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    pub from: usize,
    pub to: usize,
}

/// Directed "requires" graph over the named schemas of one document.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    names: Vec<String>,
    /// Outgoing edges per node, deduplicated, in first-seen order.
    edges: Vec<IndexSet<usize>>,
}

impl DependencyGraph {
    /// Walk every named schema once and record an edge per distinct resolved
    /// reference. Unresolved references are skipped; the resolver has
    /// already rejected documents containing them.
    pub fn build(table: &SchemaTable) -> Self {
        let names: Vec<String> = table.iter().map(|s| s.name.clone()).collect();
        let mut edges = vec![IndexSet::new(); names.len()];

        for (from, schema) in table.iter().enumerate() {
            schema.node.for_each_reference(&mut |reference| {
                if let Some(to) = reference
                    .target
                    .as_deref()
                    .and_then(|target| table.index_of(target))
                {
                    edges[from].insert(to);
                }
            });
        }

        Self { names, edges }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn dependencies(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges[index].iter().copied()
    }

    pub fn edges(&self) -> impl Iterator<Item = DependencyEdge> + '_ {
        self.edges.iter().enumerate().flat_map(|(from, targets)| {
            targets.iter().map(move |&to| DependencyEdge { from, to })
        })
    }

    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.edges[from].contains(&to)
    }

    pub fn has_self_edge(&self, index: usize) -> bool {
        self.has_edge(index, index)
    }

    /// Strongly connected components, each sorted by document order.
    pub fn strongly_connected_components(&self) -> Vec<Vec<usize>> {
        let mut graph = DiGraph::<(), ()>::with_capacity(self.len(), 0);
        let nodes: Vec<NodeIndex> = (0..self.len()).map(|_| graph.add_node(())).collect();
        for edge in self.edges() {
            graph.add_edge(nodes[edge.from], nodes[edge.to], ());
        }

        tarjan_scc(&graph)
            .into_iter()
            .map(|scc| {
                let mut members: Vec<usize> = scc.into_iter().map(|n| n.index()).collect();
                members.sort_unstable();
                members
            })
            .collect()
    }

    /// Components that cannot be declared without a forward reference:
    /// mutual cycles and direct self-references.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        self.strongly_connected_components()
            .into_iter()
            .filter(|scc| self.is_cyclic_component(scc))
            .map(|scc| scc.into_iter().map(|i| self.names[i].clone()).collect())
            .collect()
    }

    pub fn is_cyclic_component(&self, members: &[usize]) -> bool {
        members.len() > 1 || members.first().is_some_and(|&m| self.has_self_edge(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{
        ArraySchema, NamedSchema, NodeKind, ObjectSchema, Reference, SchemaNode,
    };

    fn reference(name: &str) -> SchemaNode {
        SchemaNode::new(NodeKind::Reference(Reference {
            pointer: format!("#/components/schemas/{name}"),
            target: Some(name.to_string()),
        }))
    }

    fn object(props: &[(&str, SchemaNode)]) -> SchemaNode {
        let mut obj = ObjectSchema::default();
        for (name, node) in props {
            obj.properties.insert(name.to_string(), node.clone());
        }
        SchemaNode::new(NodeKind::Object(obj))
    }

    fn named(name: &str, node: SchemaNode) -> NamedSchema {
        NamedSchema {
            name: name.to_string(),
            node,
        }
    }

    #[test]
    fn test_edges_are_deduplicated_per_source() {
        let table: SchemaTable = [
            named("A", object(&[("x", reference("B")), ("y", reference("B"))])),
            named("B", SchemaNode::unknown()),
        ]
        .into_iter()
        .collect();

        let graph = DependencyGraph::build(&table);
        let edges: Vec<_> = graph.edges().collect();
        assert_eq!(edges, vec![DependencyEdge { from: 0, to: 1 }]);
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let children = SchemaNode::new(NodeKind::Array(ArraySchema {
            items: Box::new(reference("Node")),
            min_items: None,
            max_items: None,
            unique_items: false,
        }));
        let table: SchemaTable = [named("Node", object(&[("children", children)]))]
            .into_iter()
            .collect();

        let graph = DependencyGraph::build(&table);
        assert!(graph.has_self_edge(0));
        assert_eq!(graph.cycles(), vec![vec!["Node".to_string()]]);
    }

    #[test]
    fn test_mutual_cycle_detected() {
        let table: SchemaTable = [
            named("A", object(&[("b", reference("B"))])),
            named("B", object(&[("a", reference("A"))])),
            named("C", object(&[("a", reference("A"))])),
        ]
        .into_iter()
        .collect();

        let graph = DependencyGraph::build(&table);
        let cycles = graph.cycles();
        assert_eq!(cycles, vec![vec!["A".to_string(), "B".to_string()]]);
    }
}
