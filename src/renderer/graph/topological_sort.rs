//! Kahn's algorithm over dense pass indices.
//!
//! Ties are broken by the lowest index, so passes whose dependencies allow it
//! keep their declaration order. This keeps frame-to-frame schedules stable
//! and makes the output deterministic for tests.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// A cycle was found. `node` is one of the nodes that could not be ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleError {
    pub node: usize,
}

/// Orders `0..node_count` so that for every edge `(a, b)`, `a` precedes `b`.
///
/// Duplicate edges are allowed.
pub fn topological_sort(
    node_count: usize,
    edges: impl IntoIterator<Item = (usize, usize)>,
) -> Result<Vec<usize>, CycleError> {
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut in_degree = vec![0usize; node_count];

    for (parent, child) in edges {
        debug_assert!(parent < node_count && child < node_count);
        children[parent].push(child);
        in_degree[child] += 1;
    }

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(node, _)| Reverse(node))
        .collect();

    let mut sorted = Vec::with_capacity(node_count);
    while let Some(Reverse(node)) = ready.pop() {
        sorted.push(node);
        for &child in &children[node] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                ready.push(Reverse(child));
            }
        }
    }

    if sorted.len() == node_count {
        Ok(sorted)
    } else {
        let node = in_degree
            .iter()
            .position(|&degree| degree > 0)
            .unwrap_or_default();
        Err(CycleError { node })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_nodes_keep_declaration_order() {
        assert_eq!(topological_sort(4, []).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn edges_override_declaration_order() {
        // 2 must run before 0, 0 before 1
        let order = topological_sort(3, [(2, 0), (0, 1)]).unwrap();
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn diamond_with_duplicate_edges() {
        let order = topological_sort(4, [(0, 1), (0, 2), (1, 3), (2, 3), (0, 1)]).unwrap();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn cycle_is_reported() {
        let err = topological_sort(3, [(0, 1), (1, 2), (2, 1)]).unwrap_err();
        assert!(err.node == 1 || err.node == 2);
    }
}
