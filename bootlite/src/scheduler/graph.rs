//! Dependency graph of one parallel phase.

use crate::config::ComponentSpec;
use crate::registry::ComponentRegistry;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    /// Blocked on at least one dependency.
    Waiting,
    /// In the ready queue or in flight.
    Queued,
    Done,
}

#[derive(Debug)]
struct Node<'a> {
    spec: &'a ComponentSpec,
    /// Declared dependencies plus widget mount and connect targets.
    dependencies: Vec<String>,
    /// Unfinished dependencies declared in the same phase.
    in_degree: usize,
    /// Indices of same-phase components that depend on this one.
    dependents: Vec<usize>,
    state: NodeState,
}

/// In-degree graph over the enabled components of a phase.
///
/// Dependencies already in the registry are satisfied up front. Same-phase
/// dependencies become edges. Anything else is an external wait, checked
/// against the registry whenever a node's edges are exhausted.
#[derive(Debug)]
pub(crate) struct DependencyGraph<'a> {
    nodes: Vec<Node<'a>>,
}

impl<'a> DependencyGraph<'a> {
    /// `components` must already be in load-priority order.
    pub(crate) fn build(components: &[&'a ComponentSpec], registry: &ComponentRegistry) -> Self {
        let index: HashMap<&str, usize> = components
            .iter()
            .enumerate()
            .map(|(i, spec)| (spec.name.as_str(), i))
            .collect();

        let mut nodes: Vec<Node<'a>> = components
            .iter()
            .map(|spec| Node {
                spec,
                dependencies: spec.load_dependencies(),
                in_degree: 0,
                dependents: Vec::new(),
                state: NodeState::Waiting,
            })
            .collect();

        for i in 0..nodes.len() {
            let edges: Vec<usize> = nodes[i]
                .dependencies
                .iter()
                .filter(|dep| !registry.contains(dep))
                .filter_map(|dep| index.get(dep.as_str()).copied())
                .collect();
            for j in edges {
                nodes[i].in_degree += 1;
                nodes[j].dependents.push(i);
            }
        }

        Self { nodes }
    }

    pub(crate) fn spec(&self, index: usize) -> &'a ComponentSpec {
        self.nodes[index].spec
    }

    /// Nodes loadable right now, in priority order. Marks them queued.
    pub(crate) fn take_ready(&mut self, registry: &ComponentRegistry) -> VecDeque<usize> {
        let mut ready = VecDeque::new();
        for i in 0..self.nodes.len() {
            if self.is_ready(i, registry) {
                self.nodes[i].state = NodeState::Queued;
                ready.push_back(i);
            }
        }
        ready
    }

    /// Record a finished attempt and return dependents that became loadable.
    ///
    /// Dependents of a component that ended up unregistered keep their edge
    /// and stay waiting.
    pub(crate) fn complete(
        &mut self,
        index: usize,
        registered: bool,
        registry: &ComponentRegistry,
    ) -> Vec<usize> {
        self.nodes[index].state = NodeState::Done;
        if !registered {
            return Vec::new();
        }

        let dependents = std::mem::take(&mut self.nodes[index].dependents);
        let mut ready = Vec::new();
        for d in dependents {
            let node = &mut self.nodes[d];
            node.in_degree = node.in_degree.saturating_sub(1);
            if self.is_ready(d, registry) {
                self.nodes[d].state = NodeState::Queued;
                ready.push(d);
            }
        }
        ready
    }

    /// Re-check every waiting node against the registry alone.
    ///
    /// Used by retry rounds: a dependency may have been registered by a
    /// phase running concurrently, which the edge counts cannot see.
    pub(crate) fn revive(&mut self, registry: &ComponentRegistry) -> VecDeque<usize> {
        let mut ready = VecDeque::new();
        for (i, node) in self.nodes.iter_mut().enumerate() {
            if node.state == NodeState::Waiting && registry.contains_all(&node.dependencies) {
                node.in_degree = 0;
                node.state = NodeState::Queued;
                ready.push_back(i);
            }
        }
        ready
    }

    pub(crate) fn has_waiting(&self) -> bool {
        self.nodes.iter().any(|n| n.state == NodeState::Waiting)
    }

    /// Waiting components with the dependencies they still lack.
    pub(crate) fn waiting(
        &self,
        registry: &ComponentRegistry,
    ) -> Vec<(&'a ComponentSpec, Vec<String>)> {
        self.nodes
            .iter()
            .filter(|n| n.state == NodeState::Waiting)
            .map(|n| {
                let missing = registry
                    .missing(&n.dependencies)
                    .into_iter()
                    .map(String::from)
                    .collect();
                (n.spec, missing)
            })
            .collect()
    }

    fn is_ready(&self, index: usize, registry: &ComponentRegistry) -> bool {
        let node = &self.nodes[index];
        node.state == NodeState::Waiting
            && node.in_degree == 0
            && registry.contains_all(&node.dependencies)
    }
}

/// Topological waves of a phase, ignoring dependencies outside it.
///
/// Widget mount and connect targets count as dependencies.
///
/// Components in the same wave have no same-phase dependencies on each
/// other. Members of a cycle end up in a final wave of their own.
pub fn plan_waves(components: &[&ComponentSpec]) -> Vec<Vec<String>> {
    let index: HashMap<&str, usize> = components
        .iter()
        .enumerate()
        .map(|(i, spec)| (spec.name.as_str(), i))
        .collect();

    let mut in_degree = vec![0usize; components.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); components.len()];
    for (i, spec) in components.iter().enumerate() {
        for dep in spec.load_dependencies() {
            if let Some(&j) = index.get(dep.as_str()) {
                in_degree[i] += 1;
                dependents[j].push(i);
            }
        }
    }

    let mut placed = vec![false; components.len()];
    let mut waves = Vec::new();
    let mut current: Vec<usize> = (0..components.len())
        .filter(|&i| in_degree[i] == 0)
        .collect();

    while !current.is_empty() {
        let mut next = Vec::new();
        for &i in &current {
            placed[i] = true;
            for &d in &dependents[i] {
                in_degree[d] -= 1;
                if in_degree[d] == 0 {
                    next.push(d);
                }
            }
        }
        next.sort_unstable();
        waves.push(
            current
                .iter()
                .map(|&i| components[i].name.clone())
                .collect(),
        );
        current = next;
    }

    let stuck: Vec<String> = (0..components.len())
        .filter(|&i| !placed[i])
        .map(|i| components[i].name.clone())
        .collect();
    if !stuck.is_empty() {
        waves.push(stuck);
    }

    waves
}
