//! Dependency ordering for the stacks of one manifest.

use std::collections::HashSet;

/// A node to order: its artifact id and the ids it depends on.
pub(crate) struct Node<T> {
    pub id: String,
    pub dependencies: Vec<String>,
    pub value: T,
}

/// Sort nodes so every node follows its dependencies.
///
/// Works in waves: each pass emits, in declaration order, every node whose
/// dependencies have all been emitted. Dependencies that name no node in the
/// input are ignored. Returns the ids left over when a cycle blocks progress.
pub(crate) fn topological_sort<T>(nodes: Vec<Node<T>>) -> Result<Vec<T>, Vec<String>> {
    let known: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
    let mut remaining: Vec<Node<T>> = nodes
        .into_iter()
        .map(|mut n| {
            n.dependencies.retain(|d| known.contains(d) && *d != n.id);
            n
        })
        .collect();

    let mut emitted: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let (ready, blocked): (Vec<_>, Vec<_>) = remaining
            .into_iter()
            .partition(|n| n.dependencies.iter().all(|d| emitted.contains(d)));

        if ready.is_empty() {
            return Err(blocked.into_iter().map(|n| n.id).collect());
        }

        for node in ready {
            emitted.insert(node.id);
            out.push(node.value);
        }
        remaining = blocked;
    }

    Ok(out)
}
