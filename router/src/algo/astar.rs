use crate::algo::cost::{Axis, CostModel, heading_after};
use crate::cancel::CancelToken;
use crate::grid::RoutingGrid;
use icroute_common::geom::coord::GridKey;
use priority_queue::PriorityQueue;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Open-set priority: lowest f first, earliest insertion on ties.
#[derive(Copy, Clone, Debug)]
struct Priority {
    f_score: f64,
    seq: u64,
}

impl PartialEq for Priority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Priority {}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    /// Keys from start to end inclusive.
    Found(Vec<GridKey>),
    /// Open set ran dry: no path exists inside the search window.
    Exhausted,
    IterationLimit,
    Cancelled,
}

/// Search state. Bend costs depend on how a key was entered, so the
/// heading of the last planar run is part of the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct Node {
    key: GridKey,
    heading: Option<Axis>,
}

/// A* over the layered lattice. Buffers are reused across searches.
pub struct AStar {
    open: PriorityQueue<Node, Priority>,
    g_score: HashMap<Node, f64>,
    came_from: HashMap<Node, Node>,
    closed: HashSet<Node>,
    seq: u64,
    max_iterations: usize,
    expansions: usize,
}

impl AStar {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            open: PriorityQueue::new(),
            g_score: HashMap::new(),
            came_from: HashMap::new(),
            closed: HashSet::new(),
            seq: 0,
            max_iterations,
            expansions: 0,
        }
    }

    fn reset(&mut self) {
        self.open.clear();
        self.g_score.clear();
        self.came_from.clear();
        self.closed.clear();
        self.seq = 0;
        self.expansions = 0;
    }

    /// Nodes expanded by the last search.
    pub fn expansions(&self) -> usize {
        self.expansions
    }

    fn push(&mut self, node: Node, f_score: f64) {
        self.seq += 1;
        self.open.push(
            node,
            Priority {
                f_score,
                seq: self.seq,
            },
        );
    }

    pub fn find_path<G: RoutingGrid + ?Sized>(
        &mut self,
        grid: &G,
        cost: &CostModel,
        start: GridKey,
        end: GridKey,
        cancel: &CancelToken,
    ) -> SearchOutcome {
        self.reset();

        if start == end {
            return SearchOutcome::Found(vec![start]);
        }
        if !grid.contains(start) || !grid.contains(end) {
            return SearchOutcome::Exhausted;
        }

        let origin = Node {
            key: start,
            heading: None,
        };
        self.g_score.insert(origin, 0.0);
        self.push(origin, cost.heuristic(start, end));

        let mut neighbors: Vec<GridKey> = Vec::with_capacity(4 + grid.layers() as usize);

        while let Some((current, _)) = self.open.pop() {
            if current.key == end {
                log::trace!("A* reached {:?} after {} expansions", end, self.expansions);
                return SearchOutcome::Found(self.reconstruct_path(current));
            }
            if cancel.is_cancelled() {
                return SearchOutcome::Cancelled;
            }
            self.expansions += 1;
            if self.expansions > self.max_iterations {
                log::debug!(
                    "A* gave up after {} expansions ({:?} -> {:?})",
                    self.max_iterations,
                    start,
                    end
                );
                return SearchOutcome::IterationLimit;
            }

            self.closed.insert(current);
            let current_g = self.g_score[&current];

            collect_neighbors(grid, current.key, &mut neighbors);

            for &key in &neighbors {
                // The target is reachable even when it sits inside an obstacle.
                if key != end && grid.is_blocked(key) {
                    continue;
                }
                let next = Node {
                    key,
                    heading: heading_after(current.heading, current.key, key),
                };
                if self.closed.contains(&next) {
                    continue;
                }

                let tentative_g =
                    current_g + cost.transition_cost(current.heading, current.key, key);
                let improves = self.g_score.get(&next).is_none_or(|&g| tentative_g < g);
                if improves {
                    self.came_from.insert(next, current);
                    self.g_score.insert(next, tentative_g);
                    self.push(next, tentative_g + cost.heuristic(key, end));
                }
            }
        }

        SearchOutcome::Exhausted
    }

    fn reconstruct_path(&self, end: Node) -> Vec<GridKey> {
        let mut path = vec![end.key];
        let mut curr = end;
        while let Some(&parent) = self.came_from.get(&curr) {
            path.push(parent.key);
            curr = parent;
        }
        path.reverse();
        path
    }
}

/// Four planar neighbours on the current layer, then the same site on every other layer.
fn collect_neighbors<G: RoutingGrid + ?Sized>(grid: &G, at: GridKey, out: &mut Vec<GridKey>) {
    out.clear();
    let planar = [
        GridKey::new(at.x.saturating_add(1), at.y, at.layer),
        GridKey::new(at.x.saturating_sub(1), at.y, at.layer),
        GridKey::new(at.x, at.y.saturating_add(1), at.layer),
        GridKey::new(at.x, at.y.saturating_sub(1), at.layer),
    ];
    out.extend(planar.into_iter().filter(|&k| k != at && grid.contains(k)));
    out.extend(
        (0..grid.layers())
            .filter(|&l| l != at.layer)
            .map(|l| GridKey::new(at.x, at.y, l))
            .filter(|&k| grid.contains(k)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::conversion::GridConverter;
    use icroute_common::util::config::RoutingConfig;
    use std::collections::HashSet;

    /// Bounded lattice with an explicit blocked set.
    struct TestGrid {
        size: i32,
        layers: u8,
        blocked: HashSet<GridKey>,
    }

    impl RoutingGrid for TestGrid {
        fn layers(&self) -> u8 {
            self.layers
        }
        fn contains(&self, k: GridKey) -> bool {
            k.x >= 0 && k.y >= 0 && k.x < self.size && k.y < self.size && k.layer < self.layers
        }
        fn is_blocked(&self, k: GridKey) -> bool {
            self.blocked.contains(&k)
        }
    }

    fn grid(size: i32, layers: u8) -> TestGrid {
        TestGrid {
            size,
            layers,
            blocked: HashSet::new(),
        }
    }

    fn model(bend_cost: f64) -> CostModel {
        CostModel::new(&RoutingConfig {
            grid_size: 1.0,
            layers: vec!["m1".into(), "m2".into()],
            via_cost: 4.0,
            bend_cost,
            ..Default::default()
        })
    }

    fn path_cost(model: &CostModel, keys: &[GridKey]) -> f64 {
        keys.windows(2).map(|w| model.step_cost(w[0], w[1])).sum()
    }

    fn found(outcome: SearchOutcome) -> Vec<GridKey> {
        match outcome {
            SearchOutcome::Found(keys) => keys,
            other => panic!("expected a path, got {:?}", other),
        }
    }

    #[test]
    fn straight_line_on_empty_grid() {
        let mut astar = AStar::new(10_000);
        let keys = found(astar.find_path(
            &grid(10, 2),
            &model(0.0),
            GridKey::new(1, 1, 0),
            GridKey::new(6, 1, 0),
            &CancelToken::new(),
        ));
        assert_eq!(keys.len(), 6);
        assert!(keys.iter().all(|k| k.y == 1 && k.layer == 0));
    }

    #[test]
    fn start_equals_end_is_trivial() {
        let mut astar = AStar::new(10);
        let k = GridKey::new(3, 3, 1);
        assert_eq!(
            astar.find_path(&grid(5, 2), &model(0.0), k, k, &CancelToken::new()),
            SearchOutcome::Found(vec![k])
        );
    }

    #[test]
    fn hops_layers_to_cross_a_wall() {
        let mut g = grid(7, 2);
        for y in 0..7 {
            g.blocked.insert(GridKey::new(3, y, 0));
        }
        let m = model(0.0);
        let keys = found(AStar::new(10_000).find_path(
            &g,
            &m,
            GridKey::new(0, 3, 0),
            GridKey::new(6, 3, 0),
            &CancelToken::new(),
        ));
        assert!(keys.iter().all(|k| !g.blocked.contains(k)));
        assert!(keys.iter().any(|k| k.layer == 1));
        // 6 planar steps and two vias.
        assert_eq!(path_cost(&m, &keys), 6.0 + 2.0 * 4.0);
    }

    #[test]
    fn matches_exhaustive_optimum_around_obstacles() {
        let mut g = grid(8, 2);
        for y in 1..8 {
            g.blocked.insert(GridKey::new(2, y, 0));
            g.blocked.insert(GridKey::new(5, 7 - y, 0));
        }
        for x in 0..7 {
            g.blocked.insert(GridKey::new(x, 4, 1));
        }
        let m = model(0.0);
        let start = GridKey::new(0, 7, 0);
        let end = GridKey::new(7, 0, 0);
        let keys = found(AStar::new(100_000).find_path(&g, &m, start, end, &CancelToken::new()));

        // Bellman-Ford style relaxation over the whole grid for the reference cost.
        let mut best: HashMap<GridKey, f64> = HashMap::new();
        best.insert(start, 0.0);
        let mut scratch = Vec::new();
        loop {
            let mut changed = false;
            let snapshot: Vec<(GridKey, f64)> = best.iter().map(|(k, v)| (*k, *v)).collect();
            for (k, d) in snapshot {
                collect_neighbors(&g, k, &mut scratch);
                for &n in &scratch {
                    if g.is_blocked(n) {
                        continue;
                    }
                    let nd = d + m.step_cost(k, n);
                    if best.get(&n).is_none_or(|&b| nd < b) {
                        best.insert(n, nd);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        assert_eq!(path_cost(&m, &keys), best[&end]);
    }

    #[test]
    fn enclosed_target_exhausts() {
        let mut g = grid(9, 2);
        for layer in 0..2 {
            for i in 2..=6 {
                for k in [
                    GridKey::new(i, 2, layer),
                    GridKey::new(i, 6, layer),
                    GridKey::new(2, i, layer),
                    GridKey::new(6, i, layer),
                ] {
                    g.blocked.insert(k);
                }
            }
        }
        let outcome = AStar::new(100_000).find_path(
            &g,
            &model(0.0),
            GridKey::new(0, 0, 0),
            GridKey::new(4, 4, 0),
            &CancelToken::new(),
        );
        assert_eq!(outcome, SearchOutcome::Exhausted);
    }

    #[test]
    fn blocked_target_is_still_reachable() {
        let mut g = grid(5, 1);
        let end = GridKey::new(4, 0, 0);
        g.blocked.insert(end);
        let keys = found(AStar::new(1_000).find_path(
            &g,
            &model(0.0),
            GridKey::new(0, 0, 0),
            end,
            &CancelToken::new(),
        ));
        assert_eq!(keys.last(), Some(&end));
    }

    #[test]
    fn iteration_cap_and_cancellation_stop_the_search() {
        let g = grid(50, 2);
        let m = model(0.0);
        let start = GridKey::new(0, 0, 0);
        let end = GridKey::new(49, 49, 0);
        assert_eq!(
            AStar::new(5).find_path(&g, &m, start, end, &CancelToken::new()),
            SearchOutcome::IterationLimit
        );

        let token = CancelToken::new();
        token.cancel();
        assert_eq!(
            AStar::new(100_000).find_path(&g, &m, start, end, &token),
            SearchOutcome::Cancelled
        );
    }

    #[test]
    fn search_is_deterministic() {
        let g = grid(12, 2);
        let m = model(1.0);
        let a = AStar::new(100_000).find_path(&g, &m, GridKey::new(0, 0, 0), GridKey::new(9, 7, 0), &CancelToken::new());
        for _ in 0..5 {
            let b = AStar::new(100_000).find_path(&g, &m, GridKey::new(0, 0, 0), GridKey::new(9, 7, 0), &CancelToken::new());
            assert_eq!(a, b);
        }
    }

    /// Cheapest cost to `end` over (key, heading) states, by repeated relaxation.
    fn heading_aware_optimum(g: &TestGrid, m: &CostModel, start: GridKey, end: GridKey) -> Option<f64> {
        let mut best: HashMap<(GridKey, Option<Axis>), f64> = HashMap::new();
        best.insert((start, None), 0.0);
        let mut scratch = Vec::new();
        loop {
            let mut changed = false;
            let snapshot: Vec<_> = best.iter().map(|(s, d)| (*s, *d)).collect();
            for ((k, heading), d) in snapshot {
                if k == end {
                    continue;
                }
                collect_neighbors(g, k, &mut scratch);
                for &n in &scratch {
                    if n != end && g.is_blocked(n) {
                        continue;
                    }
                    let state = (n, heading_after(heading, k, n));
                    let nd = d + m.transition_cost(heading, k, n);
                    if best.get(&state).is_none_or(|&b| nd < b) {
                        best.insert(state, nd);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        best.iter()
            .filter(|((k, _), _)| *k == end)
            .map(|(_, d)| *d)
            .min_by(f64::total_cmp)
    }

    /// Replays a key sequence through the cost model: (total cost, bends charged).
    fn replay(m: &CostModel, keys: &[GridKey]) -> (f64, usize) {
        let mut heading = None;
        let mut total = 0.0;
        let mut bends = 0;
        for w in keys.windows(2) {
            let out = crate::algo::cost::axis(w[0], w[1]);
            if heading.is_some() && out.is_some() && heading != out {
                bends += 1;
            }
            total += m.transition_cost(heading, w[0], w[1]);
            heading = heading_after(heading, w[0], w[1]);
        }
        (total, bends)
    }

    #[test]
    fn bend_costs_stay_optimal_on_random_grids() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let m = model(5.0);
        let converter = GridConverter::new(1.0, vec!["m1".into(), "m2".into()]);
        let start = GridKey::new(0, 0, 0);
        let end = GridKey::new(5, 5, 0);

        for seed in 0..300u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut g = grid(6, 2);
            for layer in 0..2u8 {
                for x in 0..6 {
                    for y in 0..6 {
                        let k = GridKey::new(x, y, layer);
                        if k != start && k != end && rng.gen_bool(0.25) {
                            g.blocked.insert(k);
                        }
                    }
                }
            }

            let outcome = AStar::new(100_000).find_path(&g, &m, start, end, &CancelToken::new());
            match heading_aware_optimum(&g, &m, start, end) {
                None => assert_eq!(outcome, SearchOutcome::Exhausted, "seed {}", seed),
                Some(optimum) => {
                    let keys = found(outcome);
                    let (total, bends) = replay(&m, &keys);
                    assert_eq!(total, optimum, "seed {}", seed);
                    // The bends the search paid for are the bends the router counts.
                    let world = crate::path::path_from_keys("n", &keys, &converter, 1.0);
                    assert_eq!(crate::path::count_bends(&world.points), bends, "seed {}", seed);
                }
            }
        }
    }

    #[test]
    fn bend_cost_prefers_a_single_corner() {
        let keys = found(AStar::new(100_000).find_path(
            &grid(10, 2),
            &model(5.0),
            GridKey::new(0, 0, 0),
            GridKey::new(3, 2, 0),
            &CancelToken::new(),
        ));
        let corners = keys
            .windows(3)
            .filter(|w| {
                let a = crate::algo::cost::axis(w[0], w[1]);
                let b = crate::algo::cost::axis(w[1], w[2]);
                a.is_some() && b.is_some() && a != b
            })
            .count();
        assert_eq!(corners, 1);
        assert_eq!(keys.len(), 6);
    }
}
