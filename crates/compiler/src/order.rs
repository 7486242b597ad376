//! Node dependency analysis
//!
//! Builds the "needs the output of" relation between nodes of a graph and
//! answers the two questions the compiler asks of it:
//!
//! 1. **Cycles**: Tarjan's SCC algorithm, O(V + E). Any SCC with more than
//!    one node, or a single node linked to itself, makes the graph
//!    uncompilable.
//! 2. **Evaluation order**: depth-first post-order from the output node.
//!    Every node appears after all nodes it reads from; nodes the output
//!    does not depend on are left out.
//!
//! Nodes are identified by their index in the graph's node list, so the
//! order and the reported cycles are deterministic for a given graph file.

use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct NodeDependencies {
    /// `edges[n]` holds the nodes whose outputs feed inputs of `n`
    edges: Vec<BTreeSet<usize>>,
    cycles: Vec<Vec<usize>>,
}

impl NodeDependencies {
    /// Build from `(producer, consumer)` pairs over `node_count` nodes
    pub fn build(node_count: usize, links: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut edges = vec![BTreeSet::new(); node_count];
        for (producer, consumer) in links {
            edges[consumer].insert(producer);
        }
        let mut deps = NodeDependencies {
            edges,
            cycles: Vec::new(),
        };
        deps.cycles = deps.find_cycles();
        deps
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes that `node` reads from
    pub fn inputs_of(&self, node: usize) -> Option<&BTreeSet<usize>> {
        self.edges.get(node)
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    /// Cyclic node groups, each sorted by node index
    pub fn cycles(&self) -> &[Vec<usize>] {
        &self.cycles
    }

    /// Nodes `root` transitively depends on, then `root`, in evaluation order
    ///
    /// Must only be called on an acyclic graph.
    pub fn evaluation_order(&self, root: usize) -> Vec<usize> {
        debug_assert!(!self.has_cycles());
        let mut visited = vec![false; self.edges.len()];
        let mut order = Vec::new();
        // (node, inputs not yet visited)
        let mut work = vec![(root, self.edges[root].iter())];
        visited[root] = true;
        while let Some((node, inputs)) = work.last_mut() {
            let node = *node;
            match inputs.find(|&&input| !visited[input]) {
                Some(&input) => {
                    visited[input] = true;
                    work.push((input, self.edges[input].iter()));
                }
                None => {
                    work.pop();
                    order.push(node);
                }
            }
        }
        order
    }

    fn find_cycles(&self) -> Vec<Vec<usize>> {
        let mut state = TarjanState {
            index_counter: 0,
            stack: Vec::new(),
            on_stack: vec![false; self.edges.len()],
            indices: vec![None; self.edges.len()],
            lowlinks: vec![0; self.edges.len()],
            sccs: Vec::new(),
        };

        for node in 0..self.edges.len() {
            if state.indices[node].is_none() {
                self.tarjan_visit(node, &mut state);
            }
        }

        state
            .sccs
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.edges[scc[0]].contains(&scc[0]))
            .map(|mut scc| {
                scc.sort_unstable();
                scc
            })
            .collect()
    }

    /// Tarjan from `start` with an explicit frame stack
    ///
    /// Each frame keeps its node's edge iterator, so a long chain of nodes
    /// costs heap, not call stack.
    fn tarjan_visit(&self, start: usize, state: &mut TarjanState) {
        state.open(start);
        let mut frames = vec![(start, self.edges[start].iter())];

        while let Some((node, inputs)) = frames.last_mut() {
            let node = *node;
            match inputs.next() {
                Some(&input) => match state.indices[input] {
                    None => {
                        state.open(input);
                        frames.push((input, self.edges[input].iter()));
                    }
                    Some(input_index) if state.on_stack[input] => {
                        state.lowlinks[node] = state.lowlinks[node].min(input_index);
                    }
                    Some(_) => {}
                },
                None => {
                    frames.pop();
                    if let Some((parent, _)) = frames.last() {
                        state.lowlinks[*parent] = state.lowlinks[*parent].min(state.lowlinks[node]);
                    }
                    state.close(node);
                }
            }
        }
    }
}

struct TarjanState {
    index_counter: usize,
    stack: Vec<usize>,
    on_stack: Vec<bool>,
    indices: Vec<Option<usize>>,
    lowlinks: Vec<usize>,
    sccs: Vec<Vec<usize>>,
}

impl TarjanState {
    fn open(&mut self, node: usize) {
        let index = self.index_counter;
        self.index_counter += 1;
        self.indices[node] = Some(index);
        self.lowlinks[node] = index;
        self.stack.push(node);
        self.on_stack[node] = true;
    }

    /// Pop the SCC rooted at `node`, if it is a root
    fn close(&mut self, node: usize) {
        if self.indices[node] != Some(self.lowlinks[node]) {
            return;
        }
        let mut scc = Vec::new();
        while let Some(n) = self.stack.pop() {
            self.on_stack[n] = false;
            scc.push(n);
            if n == node {
                break;
            }
        }
        self.sccs.push(scc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cycles() {
        // 0 -> 1 -> 2, 3 -> 2
        let deps = NodeDependencies::build(4, [(0, 1), (1, 2), (3, 2)]);
        assert!(!deps.has_cycles());
        assert!(deps.cycles().is_empty());
    }

    #[test]
    fn test_self_link() {
        let deps = NodeDependencies::build(2, [(0, 0), (0, 1)]);
        assert_eq!(deps.cycles(), &[vec![0]]);
    }

    #[test]
    fn test_cycle_pair() {
        let deps = NodeDependencies::build(3, [(0, 1), (1, 0), (1, 2)]);
        assert_eq!(deps.cycles(), &[vec![0, 1]]);
    }

    #[test]
    fn test_cycle_triple() {
        let deps = NodeDependencies::build(3, [(0, 1), (1, 2), (2, 0)]);
        assert_eq!(deps.cycles().len(), 1);
        assert_eq!(deps.cycles()[0], vec![0, 1, 2]);
    }

    #[test]
    fn test_multiple_independent_cycles() {
        let deps = NodeDependencies::build(5, [(0, 1), (1, 0), (2, 3), (3, 2), (1, 4), (3, 4)]);
        assert_eq!(deps.cycles().len(), 2);
        assert!(deps.cycles().contains(&vec![0, 1]));
        assert!(deps.cycles().contains(&vec![2, 3]));
    }

    #[test]
    fn test_evaluation_order_respects_links() {
        // diamond: 0 -> 1, 0 -> 2, 1 -> 3, 2 -> 3
        let deps = NodeDependencies::build(4, [(0, 1), (0, 2), (1, 3), (2, 3)]);
        let order = deps.evaluation_order(3);
        assert_eq!(order.len(), 4);
        let pos = |n| order.iter().position(|&x| x == n).unwrap();
        assert!(pos(0) < pos(1));
        assert!(pos(0) < pos(2));
        assert!(pos(1) < pos(3));
        assert!(pos(2) < pos(3));
        assert_eq!(order.last(), Some(&3));
    }

    #[test]
    fn test_evaluation_order_skips_unreachable() {
        let deps = NodeDependencies::build(4, [(0, 2), (1, 3)]);
        assert_eq!(deps.evaluation_order(2), vec![0, 2]);
    }

    #[test]
    fn test_long_chain() {
        const N: usize = 200_000;
        let deps = NodeDependencies::build(N, (1..N).map(|n| (n - 1, n)));
        assert!(!deps.has_cycles());
        let order = deps.evaluation_order(N - 1);
        assert_eq!(order.len(), N);
        assert!(order.iter().copied().eq(0..N));
    }

    #[test]
    fn test_long_cycle() {
        const N: usize = 100_000;
        let deps = NodeDependencies::build(N, (0..N).map(|n| (n, (n + 1) % N)));
        assert_eq!(deps.cycles().len(), 1);
        assert_eq!(deps.cycles()[0].len(), N);
    }
}
