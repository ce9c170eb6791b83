//! Parent-track hierarchy: cycle detection and evaluation order.
//!
//! Parent links are back-references by name (child -> parent). Once validated
//! they are lowered into an index array over document tracks so per-frame
//! composition never touches names.

use hashbrown::{HashMap, HashSet};

/// Return the first track found on a cycle of the child -> parent map, if any.
///
/// Depth-first walk from every track with a `visited` set and a recursion
/// stack. Each node has at most one parent, so the walk from a start node is a
/// chain; nodes are never entered twice, which bounds the work by the map size
/// and keeps the traversal iterative.
pub fn find_parent_cycle(parents: &HashMap<String, String>) -> Option<String> {
    let mut starts: Vec<&str> = parents.keys().map(String::as_str).collect();
    // Deterministic offender regardless of hash order.
    starts.sort_unstable();

    let mut visited: HashSet<&str> = HashSet::with_capacity(parents.len());
    let mut recursion_stack: HashSet<&str> = HashSet::new();

    for start in starts {
        if visited.contains(start) {
            continue;
        }
        recursion_stack.clear();
        let mut current = Some(start);
        while let Some(node) = current {
            if recursion_stack.contains(node) {
                return Some(node.to_string());
            }
            if !visited.insert(node) {
                // Reached a chain explored from an earlier start: no cycle through it.
                break;
            }
            recursion_stack.insert(node);
            current = parents.get(node).map(String::as_str);
        }
    }
    None
}

/// Resolved parent links over document track indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HierarchyIndex {
    parents: Vec<Option<usize>>,
    order: Vec<usize>,
}

impl HierarchyIndex {
    /// Build from a per-track parent index array. The links must be acyclic;
    /// a cycle is reported as the name-independent index of an offending track.
    pub fn new(parents: Vec<Option<usize>>) -> Result<Self, usize> {
        let n = parents.len();
        let mut depth: Vec<Option<usize>> = vec![None; n];
        let mut chain: Vec<usize> = Vec::new();

        for start in 0..n {
            if depth[start].is_some() {
                continue;
            }
            chain.clear();
            let mut node = start;
            let base = loop {
                if let Some(d) = depth[node] {
                    break d + 1;
                }
                if chain.len() > n {
                    return Err(node);
                }
                chain.push(node);
                match parents[node] {
                    Some(p) if p < n => node = p,
                    _ => break 0,
                }
            };
            for (offset, &idx) in chain.iter().rev().enumerate() {
                depth[idx] = Some(base + offset);
            }
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| (depth[i].unwrap_or(0), i));
        Ok(Self { parents, order })
    }

    #[inline]
    pub fn parent(&self, track: usize) -> Option<usize> {
        self.parents.get(track).copied().flatten()
    }

    /// Track indices with every parent ahead of its children.
    #[inline]
    pub fn evaluation_order(&self) -> &[usize] {
        &self.order
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(c, p)| (c.to_string(), p.to_string()))
            .collect()
    }

    #[test]
    fn forest_has_no_cycle() {
        let parents = map(&[("head", "body"), ("arm", "body"), ("hand", "arm")]);
        assert_eq!(find_parent_cycle(&parents), None);
    }

    #[test]
    fn two_cycle_is_reported() {
        let parents = map(&[("a", "b"), ("b", "a")]);
        assert_eq!(find_parent_cycle(&parents).as_deref(), Some("a"));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let parents = map(&[("a", "a")]);
        assert_eq!(find_parent_cycle(&parents).as_deref(), Some("a"));
    }

    #[test]
    fn tail_into_cycle_reports_cycle_member() {
        let parents = map(&[("a", "b"), ("b", "c"), ("c", "b")]);
        assert_eq!(find_parent_cycle(&parents).as_deref(), Some("b"));
    }

    #[test]
    fn evaluation_order_puts_parents_first() {
        // 0 <- 2 <- 1, 3 root
        let idx = HierarchyIndex::new(vec![None, Some(2), Some(0), None]).unwrap();
        let order = idx.evaluation_order();
        let pos = |t: usize| order.iter().position(|&x| x == t).unwrap();
        assert!(pos(0) < pos(2));
        assert!(pos(2) < pos(1));
        assert_eq!(idx.parent(1), Some(2));
        assert_eq!(idx.parent(3), None);
    }

    #[test]
    fn index_cycle_is_rejected() {
        assert!(HierarchyIndex::new(vec![Some(1), Some(0)]).is_err());
    }
}
