// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graph of resource types and the abstract parents they inherit grants from.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::resource::ResourceName;

/// Directed graph with an edge from every type to each of its direct parents.
#[derive(Clone, Debug, Default)]
pub struct TypeHierarchy {
    graph: DiGraph<ResourceName, ()>,
    indices: HashMap<ResourceName, NodeIndex>,
}

impl TypeHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type to the graph, returning its node. Adding a type twice is a no-op.
    pub fn add_type(&mut self, name: &ResourceName) -> NodeIndex {
        if let Some(index) = self.indices.get(name) {
            return *index;
        }

        let index = self.graph.add_node(name.clone());
        self.indices.insert(name.clone(), index);
        index
    }

    /// Declare `parent` as a direct parent of `child`, adding both types if needed.
    pub fn add_parent(&mut self, child: &ResourceName, parent: &ResourceName) {
        let child = self.add_type(child);
        let parent = self.add_type(parent);
        self.graph.update_edge(child, parent, ());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    /// Returns a type taking part in an inheritance cycle, if there is any.
    pub fn find_cycle(&self) -> Option<ResourceName> {
        toposort(&self.graph, None)
            .err()
            .map(|cycle| self.graph[cycle.node_id()].clone())
    }

    /// The type itself followed by all its ancestors, most specific first.
    ///
    /// Ancestors are visited breadth-first, parents in the order they were declared. A type
    /// reachable over several paths is only listed once, at its nearest position.
    pub fn type_chain(&self, name: &str) -> Vec<ResourceName> {
        let Some(start) = self.indices.get(name) else {
            return Vec::new();
        };

        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([*start]);

        while let Some(index) = queue.pop_front() {
            if !visited.insert(index) {
                continue;
            }
            chain.push(self.graph[index].clone());

            let mut parents: Vec<_> = self.graph.edges(index).collect();
            parents.sort_by_key(|edge| edge.id());
            queue.extend(parents.into_iter().map(|edge| edge.target()));
        }

        chain
    }

    /// Return `true` if `ancestor` is the type itself or one of its (transitive) parents.
    pub fn is_a(&self, name: &str, ancestor: &str) -> bool {
        match (self.indices.get(name), self.indices.get(ancestor)) {
            (Some(from), Some(to)) => has_path_connecting(&self.graph, *from, *to, None),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TypeHierarchy;
    use crate::resource::ResourceName;

    fn name(value: &str) -> ResourceName {
        ResourceName::from(value)
    }

    fn names(chain: Vec<ResourceName>) -> Vec<String> {
        chain.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn linear_chain_most_specific_first() {
        let mut hierarchy = TypeHierarchy::new();
        hierarchy.add_parent(&name("DirectScriptureProduct"), &name("Product"));
        hierarchy.add_parent(&name("Product"), &name("Producible"));

        assert_eq!(
            names(hierarchy.type_chain("DirectScriptureProduct")),
            vec!["DirectScriptureProduct", "Product", "Producible"]
        );
        assert_eq!(names(hierarchy.type_chain("Producible")), vec!["Producible"]);
        assert!(hierarchy.type_chain("Unknown").is_empty());
    }

    #[test]
    fn parents_in_declaration_order_and_deduplicated() {
        //        Resource
        //        /      \
        //  Commentable  Pinnable
        //        \      /
        //         Project
        let mut hierarchy = TypeHierarchy::new();
        hierarchy.add_parent(&name("Project"), &name("Commentable"));
        hierarchy.add_parent(&name("Project"), &name("Pinnable"));
        hierarchy.add_parent(&name("Commentable"), &name("Resource"));
        hierarchy.add_parent(&name("Pinnable"), &name("Resource"));

        assert_eq!(
            names(hierarchy.type_chain("Project")),
            vec!["Project", "Commentable", "Pinnable", "Resource"]
        );
    }

    #[test]
    fn detects_cycles() {
        let mut hierarchy = TypeHierarchy::new();
        hierarchy.add_parent(&name("A"), &name("B"));
        assert!(hierarchy.find_cycle().is_none());

        hierarchy.add_parent(&name("B"), &name("C"));
        hierarchy.add_parent(&name("C"), &name("A"));
        assert!(hierarchy.find_cycle().is_some());
    }

    #[test]
    fn is_a_follows_transitive_parents() {
        let mut hierarchy = TypeHierarchy::new();
        hierarchy.add_parent(&name("LanguageEngagement"), &name("Engagement"));
        hierarchy.add_type(&name("Project"));

        assert!(hierarchy.is_a("LanguageEngagement", "Engagement"));
        assert!(hierarchy.is_a("LanguageEngagement", "LanguageEngagement"));
        assert!(!hierarchy.is_a("Engagement", "LanguageEngagement"));
        assert!(!hierarchy.is_a("Project", "Engagement"));
        assert!(hierarchy.contains("Project"));
    }
}
