//! Kernel density evaluation over mesh vertices

use crate::density::kernel::DensityKernel;
use crate::mesh::adjacency::Adjacency;
use crate::mesh::types::Point;
use crate::periodic::PeriodicBox;
use kiddo::ImmutableKdTree;
use std::collections::{HashSet, VecDeque};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How contributing vertices are found for a query vertex
enum Search<'a> {
    /// Every source vertex contributes
    Scan,
    /// Breadth-first search over the neighbor graph
    Hops {
        neighbors: &'a Adjacency,
        max_hops: usize,
        is_source: Vec<bool>,
    },
    /// Radius query on a k-d tree of the source vertices
    Tree {
        tree: ImmutableKdTree<f64, 3>,
        radius: f64,
    },
}

/// Density estimator bound to one vertex set and one kernel
pub struct DensityEstimator<'a> {
    vertices: &'a [Point],
    kernel: &'a DensityKernel,
    sources: Vec<usize>,
    periodic: Option<&'a PeriodicBox>,
    search: Search<'a>,
}

impl<'a> DensityEstimator<'a> {
    /// Create an estimator
    ///
    /// `sources` are the contributing vertices (all when `None`); a vertex
    /// listed more than once still contributes once. A neighbor
    /// graph must be supplied when the kernel limits contributions by hops.
    /// With a periodic box, distances use the minimum image convention.
    /// Indices must already be validated.
    pub fn new(
        vertices: &'a [Point],
        kernel: &'a DensityKernel,
        sources: Option<&[usize]>,
        neighbors: Option<&'a Adjacency>,
        periodic: Option<&'a PeriodicBox>,
    ) -> Self {
        let sources: Vec<usize> = match sources {
            Some(ids) => {
                let mut ids = ids.to_vec();
                ids.sort_unstable();
                ids.dedup();
                ids
            }
            None => (0..vertices.len()).collect(),
        };

        let search = match (kernel.max_hops, neighbors) {
            (Some(max_hops), Some(neighbors)) => {
                let mut is_source = vec![false; vertices.len()];
                for &s in &sources {
                    is_source[s] = true;
                }
                Search::Hops {
                    neighbors,
                    max_hops,
                    is_source,
                }
            }
            _ => match kernel.support_radius() {
                // Radius queries cannot see periodic images
                Some(radius) if periodic.is_none() && !sources.is_empty() => {
                    let points: Vec<[f64; 3]> = sources
                        .iter()
                        .map(|&s| {
                            let p = &vertices[s];
                            [p.x, p.y, p.z]
                        })
                        .collect();
                    Search::Tree {
                        tree: ImmutableKdTree::new_from_slice(&points),
                        radius,
                    }
                }
                _ => Search::Scan,
            },
        };

        Self {
            vertices,
            kernel,
            sources,
            periodic,
            search,
        }
    }

    fn distance(&self, a: &Point, b: &Point) -> f64 {
        match self.periodic {
            Some(bbox) => bbox.periodic_distance(a, b),
            None => (b - a).norm(),
        }
    }

    /// Density at one vertex; the vertex's own contribution is included
    pub fn density_at(&self, query: usize) -> f64 {
        let q = &self.vertices[query];

        match &self.search {
            Search::Scan => self
                .sources
                .iter()
                .map(|&s| self.kernel.evaluate(self.distance(q, &self.vertices[s])))
                .sum(),

            Search::Hops {
                neighbors,
                max_hops,
                is_source,
            } => {
                let mut visited = HashSet::from([query]);
                let mut frontier = VecDeque::from([(query, 0usize)]);
                let mut density = 0.0;

                while let Some((v, hops)) = frontier.pop_front() {
                    if is_source[v] {
                        density += self.kernel.evaluate(self.distance(q, &self.vertices[v]));
                    }
                    if hops == *max_hops {
                        continue;
                    }
                    for &w in neighbors.get(v) {
                        if visited.insert(w) {
                            frontier.push_back((w, hops + 1));
                        }
                    }
                }

                density
            }

            Search::Tree { tree, radius } => tree
                .within::<kiddo::SquaredEuclidean>(&[q.x, q.y, q.z], radius * radius)
                .iter()
                .map(|hit| {
                    let s = self.sources[hit.item as usize];
                    self.kernel.evaluate(self.distance(q, &self.vertices[s]))
                })
                .sum(),
        }
    }

    /// Density at each query vertex, in query order
    pub fn evaluate(&self, queries: &[usize]) -> Vec<f64> {
        // Threshold for parallelization (below this, overhead isn't worth it)
        #[cfg(feature = "parallel")]
        const PARALLEL_THRESHOLD: usize = 2000;

        #[cfg(feature = "parallel")]
        let values = if queries.len() >= PARALLEL_THRESHOLD {
            queries.par_iter().map(|&q| self.density_at(q)).collect()
        } else {
            queries.iter().map(|&q| self.density_at(q)).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let values = queries.iter().map(|&q| self.density_at(q)).collect();

        values
    }
}
