//! Same-colour cluster discovery and cluster-local annealing
//!
//! Clusters are grown breadth-first through same-coloured adjacency, taking
//! neighbours that keep the cluster's bounding box square first. Large clusters
//! are cut into sub-clusters by a wave-front grow. Each cluster is then
//! optimized on a private grid holding only its patterns, and the grid receives
//! the result only when the cluster's own cost strictly drops.

use std::collections::{BTreeSet, VecDeque};
use std::time::{Duration, Instant};

use bitvec::prelude::*;
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, warn};

use crate::algorithm::cost::CostFunction;
use crate::algorithm::moves::{Move, MoveGenerator};
use crate::io::configuration::{
    CLUSTER_MOVE_ATTEMPTS, CLUSTER_SPLIT_THRESHOLD, MAX_SUB_CLUSTERS, MIN_SUB_CLUSTERS,
    SUB_CLUSTER_BASE_RANGE, SUB_CLUSTER_MULTIPLIERS,
};
use crate::math::probability::{accept_with_probability, metropolis_acceptance};
use crate::spatial::grid::{BoundingBox, Grid, PatternCounts};
use crate::spatial::pattern::{Pattern, Position};

/// Connected group of same-coloured patterns
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    patterns: BTreeSet<Pattern>,
    boundary_patterns: BTreeSet<Pattern>,
    center_of_mass: (f64, f64),
}

impl Cluster {
    /// Create a cluster; the centre of mass is the mean pattern anchor
    pub fn new(patterns: BTreeSet<Pattern>, boundary_patterns: BTreeSet<Pattern>) -> Self {
        let center_of_mass = if patterns.is_empty() {
            (0.0, 0.0)
        } else {
            let count = patterns.len() as f64;
            let (sum_x, sum_y) = patterns.iter().fold((0.0, 0.0), |(x, y), pattern| {
                (x + f64::from(pattern.min_x()), y + f64::from(pattern.min_y()))
            });
            (sum_x / count, sum_y / count)
        };
        Self {
            patterns,
            boundary_patterns,
            center_of_mass,
        }
    }

    /// Member patterns
    pub const fn patterns(&self) -> &BTreeSet<Pattern> {
        &self.patterns
    }

    /// Adjacent patterns outside the cluster
    pub const fn boundary_patterns(&self) -> &BTreeSet<Pattern> {
        &self.boundary_patterns
    }

    /// Mean anchor of the member patterns
    pub const fn center_of_mass(&self) -> (f64, f64) {
        self.center_of_mass
    }

    /// Number of member patterns
    pub fn size(&self) -> usize {
        self.patterns.len()
    }

    /// Member count per shape
    pub fn pattern_distribution(&self) -> PatternCounts {
        PatternCounts::of(&self.patterns)
    }

    /// Bounding box of the members, `None` for an empty cluster
    pub fn bounds(&self) -> Option<BoundingBox> {
        let mut members = self.patterns.iter();
        let first = BoundingBox::of_pattern(members.next()?);
        Some(members.fold(first, |bounds, pattern| bounds.including(pattern)))
    }

    /// Pixels covered by the members
    pub fn pixels(&self) -> BTreeSet<Position> {
        self.patterns
            .iter()
            .flat_map(|pattern| pattern.pixels())
            .collect()
    }

    /// Row-major membership mask of the cluster's pixels on a canvas
    pub fn pixel_mask(&self, width: usize, height: usize) -> BitVec {
        let mut mask = bitvec![0; width * height];
        for pos in self.pixels() {
            if let Some(index) = mask_index(pos, width, height) {
                mask.set(index, true);
            }
        }
        mask
    }
}

fn mask_index(pos: Position, width: usize, height: usize) -> Option<usize> {
    let x = usize::try_from(pos.x).ok()?;
    let y = usize::try_from(pos.y).ok()?;
    (x < width && y < height).then_some(y * width + x)
}

/// Summary of one cluster
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterStats {
    /// Number of member patterns
    pub size: usize,
    /// Member count per shape
    pub distribution: PatternCounts,
    /// Bounding box of the members
    pub bounds: Option<BoundingBox>,
    /// Number of boundary patterns
    pub boundary_size: usize,
    /// Mean member anchor
    pub center_of_mass: (f64, f64),
}

/// Outcome of one cluster interlude
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterStageResult {
    /// Clusters optimized
    pub clusters_processed: usize,
    /// Clusters whose patterns were replaced
    pub clusters_improved: usize,
    /// Grid cost before the interlude
    pub initial_cost: f64,
    /// Grid cost after the interlude
    pub final_cost: f64,
    /// Wall time of the interlude
    pub execution_time: Duration,
    /// Live patterns after the interlude
    pub pattern_count: usize,
}

/// Finds clusters and anneals each one in isolation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterOptimizer {
    cost_function: CostFunction,
    move_generator: MoveGenerator,
    move_attempts: usize,
}

impl Default for ClusterOptimizer {
    fn default() -> Self {
        Self::new(CostFunction::default(), CLUSTER_MOVE_ATTEMPTS)
    }
}

impl ClusterOptimizer {
    /// Create an optimizer proposing up to `move_attempts` moves per iteration
    pub fn new(cost_function: CostFunction, move_attempts: usize) -> Self {
        Self {
            cost_function,
            move_generator: MoveGenerator::default(),
            move_attempts: move_attempts.max(1),
        }
    }

    /// Cost function used for cluster-local scores
    pub const fn cost_function(&self) -> &CostFunction {
        &self.cost_function
    }

    /// Partition the grid's patterns into clusters, largest first
    ///
    /// Every live pattern belongs to exactly one returned cluster.
    pub fn find_clusters<R: Rng + ?Sized>(&self, grid: &Grid, rng: &mut R) -> Vec<Cluster> {
        let mut visited = BTreeSet::new();
        let mut clusters = Vec::new();

        for seed in grid.patterns() {
            if visited.contains(seed) {
                continue;
            }
            let (members, boundary) = Self::grow_cluster(grid, *seed, &mut visited);
            let cluster = Cluster::new(members, boundary);

            if cluster.size() > CLUSTER_SPLIT_THRESHOLD {
                clusters.extend(Self::split_large_cluster(grid, &cluster, rng));
            } else {
                clusters.push(cluster);
            }
        }

        clusters.sort_by(|a, b| b.size().cmp(&a.size()));
        clusters
    }

    fn grow_cluster(
        grid: &Grid,
        seed: Pattern,
        visited: &mut BTreeSet<Pattern>,
    ) -> (BTreeSet<Pattern>, BTreeSet<Pattern>) {
        let mut members = BTreeSet::new();
        let mut boundary = BTreeSet::new();
        let mut bounds = BoundingBox::of_pattern(&seed);
        let mut queue = VecDeque::from([seed]);

        while let Some(pattern) = queue.pop_front() {
            if !visited.insert(pattern) {
                continue;
            }
            members.insert(pattern);
            bounds = bounds.including(&pattern);

            let mut candidates = Vec::new();
            for neighbor in grid.adjacent_patterns(&pattern) {
                if visited.contains(&neighbor) {
                    continue;
                }
                if neighbor.color() == pattern.color() {
                    candidates.push((bounds.including(&neighbor).squareness(), neighbor));
                } else {
                    boundary.insert(neighbor);
                }
            }
            candidates.sort_by_key(|(squareness, _)| *squareness);
            queue.extend(candidates.into_iter().map(|(_, neighbor)| neighbor));
        }

        (members, boundary)
    }

    fn split_large_cluster<R: Rng + ?Sized>(
        grid: &Grid,
        cluster: &Cluster,
        rng: &mut R,
    ) -> Vec<Cluster> {
        let (low, high) = SUB_CLUSTER_BASE_RANGE;
        let base = rng.random_range(low..=high);
        let multiplier = SUB_CLUSTER_MULTIPLIERS.choose(rng).copied().unwrap_or(1);
        let count = (base * multiplier)
            .clamp(MIN_SUB_CLUSTERS, MAX_SUB_CLUSTERS)
            .min(cluster.size());
        let target_size = (cluster.size() / count.max(1)).max(1);

        let mut remaining = cluster.patterns().clone();
        let mut sub_clusters = Vec::with_capacity(count);

        while sub_clusters.len() + 1 < count && !remaining.is_empty() {
            let pool: Vec<Pattern> = remaining.iter().copied().collect();
            let Some(&seed) = pool.choose(rng) else {
                break;
            };
            let members = Self::grow_sub_cluster(grid, seed, &remaining, target_size);
            remaining.retain(|pattern| !members.contains(pattern));
            sub_clusters.push(Self::with_neighbor_boundary(grid, members));
        }
        if !remaining.is_empty() {
            sub_clusters.push(Self::with_neighbor_boundary(grid, remaining));
        }

        sub_clusters
    }

    // Wave-front grow restricted to `available`, squarest candidates first
    fn grow_sub_cluster(
        grid: &Grid,
        seed: Pattern,
        available: &BTreeSet<Pattern>,
        target_size: usize,
    ) -> BTreeSet<Pattern> {
        let mut members = BTreeSet::from([seed]);
        let mut bounds = BoundingBox::of_pattern(&seed);
        let mut frontier = VecDeque::from([seed]);

        while members.len() < target_size {
            let Some(current) = frontier.pop_front() else {
                break;
            };
            let mut candidates: Vec<(i32, Pattern)> = grid
                .adjacent_patterns(&current)
                .into_iter()
                .filter(|neighbor| {
                    neighbor.color() == current.color()
                        && available.contains(neighbor)
                        && !members.contains(neighbor)
                })
                .map(|neighbor| (bounds.including(&neighbor).squareness(), neighbor))
                .collect();
            candidates.sort_by_key(|(squareness, _)| *squareness);

            for (_, neighbor) in candidates {
                if members.len() >= target_size {
                    break;
                }
                if members.insert(neighbor) {
                    bounds = bounds.including(&neighbor);
                    frontier.push_back(neighbor);
                }
            }
        }

        members
    }

    fn with_neighbor_boundary(grid: &Grid, members: BTreeSet<Pattern>) -> Cluster {
        let boundary = members
            .iter()
            .flat_map(|pattern| grid.adjacent_patterns(pattern))
            .filter(|neighbor| !members.contains(neighbor))
            .collect();
        Cluster::new(members, boundary)
    }

    /// Anneal one cluster on a private grid of the same canvas size
    ///
    /// Moves must stay inside the cluster's pixels. Returns the best pattern set
    /// found, only when its cost is strictly below the cluster's starting cost.
    pub fn optimize_cluster<R: Rng + ?Sized>(
        &self,
        grid: &Grid,
        cluster: &Cluster,
        temperature: f64,
        iterations: usize,
        rng: &mut R,
    ) -> Option<Vec<Pattern>> {
        let mut local = Grid::new(grid.width(), grid.height());
        for pattern in cluster.patterns() {
            if !local.add_pattern(*pattern).is_valid() {
                return None;
            }
        }
        let mask = cluster.pixel_mask(grid.width(), grid.height());

        let start_cost = self.cost_function.calculate(&local);
        let mut current_cost = start_cost;
        let mut best_cost = start_cost;
        let mut best = None;

        for _ in 0..iterations {
            let Some(candidate) = self.generate_cluster_move(&local, &mask, rng) else {
                continue;
            };
            if !candidate.apply(&mut local).is_valid() {
                continue;
            }

            let delta = self.cost_function.calculate_delta(
                &local,
                candidate.patterns_removed(),
                candidate.patterns_added(),
                candidate.affected_positions(),
            );
            if accept_with_probability(rng, metropolis_acceptance(delta, temperature)) {
                current_cost += delta;
                if current_cost < best_cost {
                    best_cost = current_cost;
                    best = Some(local.patterns().copied().collect());
                }
            } else {
                candidate.undo(&mut local);
            }
        }

        best
    }

    fn generate_cluster_move<R: Rng + ?Sized>(
        &self,
        local: &Grid,
        mask: &BitSlice,
        rng: &mut R,
    ) -> Option<Move> {
        let (width, height) = (local.width(), local.height());
        for _ in 0..self.move_attempts {
            let Some(candidate) = self.move_generator.generate_move(local, rng) else {
                continue;
            };
            let inside = candidate.affected_positions().iter().all(|pos| {
                mask_index(*pos, width, height)
                    .and_then(|index| mask.get(index).as_deref().copied())
                    .unwrap_or(false)
            });
            if inside {
                return Some(candidate);
            }
        }
        None
    }

    /// Summaries of the given clusters
    pub fn cluster_stats(clusters: &[Cluster]) -> Vec<ClusterStats> {
        clusters
            .iter()
            .map(|cluster| ClusterStats {
                size: cluster.size(),
                distribution: cluster.pattern_distribution(),
                bounds: cluster.bounds(),
                boundary_size: cluster.boundary_patterns().len(),
                center_of_mass: cluster.center_of_mass(),
            })
            .collect()
    }
}

/// One cluster interlude bound to the grid it rewrites
pub struct ClusterStage<'a> {
    grid: &'a mut Grid,
    optimizer: &'a ClusterOptimizer,
}

impl<'a> ClusterStage<'a> {
    /// Bind an optimizer to a grid
    pub const fn new(grid: &'a mut Grid, optimizer: &'a ClusterOptimizer) -> Self {
        Self { grid, optimizer }
    }

    /// Optimize every cluster and write improvements back to the grid
    pub fn run_cluster_stage<R: Rng + ?Sized>(
        &mut self,
        temperature: f64,
        iterations_per_cluster: usize,
        rng: &mut R,
    ) -> ClusterStageResult {
        let started = Instant::now();
        let cost_function = self.optimizer.cost_function();
        let initial_cost = cost_function.calculate(self.grid);
        let clusters = self.optimizer.find_clusters(self.grid, rng);

        let mut clusters_improved = 0;
        for cluster in &clusters {
            let Some(optimized) = self.optimizer.optimize_cluster(
                self.grid,
                cluster,
                temperature,
                iterations_per_cluster,
                rng,
            ) else {
                continue;
            };

            let original: Vec<Pattern> = cluster.patterns().iter().copied().collect();
            let validation = self.grid.swap_patterns(&original, &optimized);
            if validation.is_valid() {
                clusters_improved += 1;
            } else {
                warn!(
                    "Discarding optimized cluster of {} patterns: {validation:?}",
                    cluster.size()
                );
            }
        }

        let final_cost = cost_function.calculate(self.grid);
        debug!(
            "Cluster stage: {clusters_improved}/{} clusters improved, cost {initial_cost:.1} -> {final_cost:.1}",
            clusters.len()
        );

        ClusterStageResult {
            clusters_processed: clusters.len(),
            clusters_improved,
            initial_cost,
            final_cost,
            execution_time: started.elapsed(),
            pattern_count: self.grid.len(),
        }
    }
}
