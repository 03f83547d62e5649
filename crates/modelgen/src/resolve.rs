//! Reference resolution.
//!
//! Every `$ref` node in a [`SchemaGraph`] is bound to the node it names. A
//! reference reached while its target is still being walked closes a cycle
//! and becomes a [`Link::BackRef`]: later stages relate the two by name
//! instead of expanding the target again.

use crate::error::{Error, Result};
use crate::node::{NodeId, NodeKind, SchemaGraph};
use std::collections::HashMap;

/// Binding of one reference node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Direct(NodeId),
    /// The target encloses this reference.
    BackRef(NodeId),
}

impl Link {
    pub fn target(self) -> NodeId {
        match self {
            Link::Direct(id) | Link::BackRef(id) => id,
        }
    }

    pub fn is_back_reference(self) -> bool {
        matches!(self, Link::BackRef(_))
    }
}

/// A schema graph whose references are all bound.
#[derive(Debug)]
pub struct ResolvedGraph<'g> {
    graph: &'g SchemaGraph,
    links: HashMap<NodeId, Link>,
}

impl<'g> ResolvedGraph<'g> {
    pub fn graph(&self) -> &'g SchemaGraph {
        self.graph
    }

    /// Binding of a reference node; `None` for any other node.
    pub fn link(&self, id: NodeId) -> Option<Link> {
        self.links.get(&id).copied()
    }

    /// Follow references from `id` to the first node that is not one.
    pub fn target(&self, mut id: NodeId) -> NodeId {
        // Pure reference loops are rejected during resolution, so this ends.
        while let Some(link) = self.link(id) {
            id = link.target();
        }
        id
    }

    /// Whether any reference on the chain starting at `id` is a back-reference.
    pub fn reaches_back(&self, mut id: NodeId) -> bool {
        while let Some(link) = self.link(id) {
            if link.is_back_reference() {
                return true;
            }
            id = link.target();
        }
        false
    }

    pub fn back_references(&self) -> usize {
        self.links.values().filter(|l| l.is_back_reference()).count()
    }
}

/// Bind every reference in `graph`.
pub fn resolve(graph: &SchemaGraph) -> Result<ResolvedGraph<'_>> {
    let mut targets = HashMap::new();
    for (id, node) in graph.iter() {
        if let NodeKind::Reference(reference) = &node.kind {
            targets.insert(id, lookup(graph, reference, &node.pointer)?);
        }
    }
    reject_reference_loops(graph, &targets)?;

    let mut walk = Walk {
        graph,
        targets: &targets,
        state: vec![State::Unvisited; graph.len()],
        links: HashMap::with_capacity(targets.len()),
    };
    walk.visit(graph.root());
    for &definition in graph.definitions() {
        walk.visit(definition);
    }
    // Nodes unreachable from the root or any definition still get bindings.
    for (id, _) in graph.iter() {
        walk.visit(id);
    }

    let resolved = ResolvedGraph {
        graph,
        links: walk.links,
    };
    tracing::debug!(
        references = resolved.links.len(),
        back_references = resolved.back_references(),
        "resolved references"
    );
    Ok(resolved)
}

fn lookup(graph: &SchemaGraph, reference: &str, pointer: &str) -> Result<NodeId> {
    let unresolved = || Error::UnresolvedReference {
        reference: reference.to_string(),
        pointer: pointer.to_string(),
    };
    if !reference.starts_with('#') {
        return Err(Error::UnsupportedReference {
            reference: reference.to_string(),
            pointer: pointer.to_string(),
        });
    }
    let found = match reference {
        "#" => Some(graph.root()),
        r if r.starts_with("#/") => graph.lookup(r),
        r => graph.anchor(r),
    };
    found.ok_or_else(unresolved)
}

/// A reference whose chain only ever reaches other references names no schema.
fn reject_reference_loops(graph: &SchemaGraph, targets: &HashMap<NodeId, NodeId>) -> Result<()> {
    for (start, node) in graph.iter() {
        let NodeKind::Reference(reference) = &node.kind else {
            continue;
        };
        let mut seen = vec![start];
        let mut current = targets[&start];
        while let Some(&next) = targets.get(&current) {
            if seen.contains(&current) {
                return Err(Error::UnresolvedReference {
                    reference: format!("{reference} (reference cycle without a schema)"),
                    pointer: node.pointer.clone(),
                });
            }
            seen.push(current);
            current = next;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unvisited,
    Visiting,
    Done,
}

struct Walk<'a> {
    graph: &'a SchemaGraph,
    targets: &'a HashMap<NodeId, NodeId>,
    state: Vec<State>,
    links: HashMap<NodeId, Link>,
}

impl Walk<'_> {
    fn visit(&mut self, id: NodeId) {
        if self.state[id.index()] != State::Unvisited {
            return;
        }
        self.state[id.index()] = State::Visiting;

        if let Some(&target) = self.targets.get(&id) {
            let link = if self.state[target.index()] == State::Visiting {
                Link::BackRef(target)
            } else {
                self.visit(target);
                Link::Direct(target)
            };
            self.links.insert(id, link);
        }
        for child in self.graph.children(id) {
            self.visit(child);
        }

        self.state[id.index()] = State::Done;
    }
}
