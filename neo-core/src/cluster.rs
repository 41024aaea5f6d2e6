//! Velocity clustering (one-dimensional k-means)

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{NeoError, Result};
use crate::types::{ApproachRecord, ClusterMember, ClusterReport};

pub const DEFAULT_CLUSTER_COUNT: usize = 3;
pub const DEFAULT_SEED: u64 = 42;
const MAX_ITERATIONS: usize = 300;

/// Cluster records by velocity with the default seed.
pub fn cluster(records: &[ApproachRecord], k: usize) -> Result<ClusterReport> {
    cluster_with_seed(records, k, DEFAULT_SEED)
}

/// Cluster records by velocity into `k` groups.
///
/// Records without a velocity are dropped first. Initial centers are `k`
/// distinct velocities drawn with a seeded RNG, so the same input and seed
/// always give the same report. Centers keep the order the algorithm
/// produced them in.
pub fn cluster_with_seed(records: &[ApproachRecord], k: usize, seed: u64) -> Result<ClusterReport> {
    let points: Vec<(&str, f64)> = records
        .iter()
        .filter_map(|r| r.velocity_kph.map(|v| (r.name.as_str(), v)))
        .collect();

    let mut distinct: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();

    if k == 0 || distinct.len() < k {
        return Err(NeoError::InsufficientData {
            needed: k.max(1),
            available: distinct.len(),
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centers: Vec<f64> = rand::seq::index::sample(&mut rng, distinct.len(), k)
        .into_iter()
        .map(|i| distinct[i])
        .collect();

    let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    let mut labels = vec![usize::MAX; values.len()];
    let mut iterations = 0;

    while iterations < MAX_ITERATIONS {
        iterations += 1;

        let mut changed = false;
        for (label, &value) in labels.iter_mut().zip(&values) {
            let nearest = nearest_center(&centers, value);
            if *label != nearest {
                *label = nearest;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        let mut sums = vec![0.0; k];
        let mut counts = vec![0usize; k];
        for (&label, &value) in labels.iter().zip(&values) {
            sums[label] += value;
            counts[label] += 1;
        }
        // An emptied cluster keeps its previous center
        for ((center, sum), count) in centers.iter_mut().zip(sums).zip(counts) {
            if count > 0 {
                *center = sum / count as f64;
            }
        }
    }

    let mut counts: BTreeMap<usize, usize> = (0..k).map(|id| (id, 0)).collect();
    for &label in &labels {
        *counts.entry(label).or_insert(0) += 1;
    }

    let assignments = points
        .iter()
        .zip(&labels)
        .map(|(&(name, velocity_kph), &cluster)| ClusterMember {
            name: name.to_string(),
            velocity_kph,
            cluster,
        })
        .collect();

    debug!(
        "Clustered {} velocities into {} groups after {} iterations",
        values.len(),
        k,
        iterations
    );

    Ok(ClusterReport {
        centers,
        counts,
        assignments,
        iterations,
    })
}

/// Index of the closest center; the lower index wins a tie.
fn nearest_center(centers: &[f64], value: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (index, center) in centers.iter().enumerate() {
        let distance = (value - center).abs();
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }
    best
}
