//! Merging of overlapping detections from consecutive segments.
//!
//! Within each `(filename, category)` partition, detections whose start
//! times chain together within the threshold share a start group, and the
//! same for end times. Any two detections linked through shared start or end
//! groups form one merged group, of which only the most confident row is
//! kept.

use crate::output::Detection;
use std::collections::BTreeMap;
use tracing::debug;

/// Remove duplicate detections of the same call.
///
/// Rows whose category equals `sentinel` are dropped first. The result is
/// sorted by filename, category and start time.
pub fn dedup(detections: Vec<Detection>, threshold_ms: i64, sentinel: &str) -> Vec<Detection> {
    let before = detections.len();

    let mut partitions: BTreeMap<(String, String), Vec<Detection>> = BTreeMap::new();
    for detection in detections {
        if detection.category == sentinel {
            continue;
        }
        partitions
            .entry((detection.filename.clone(), detection.category.clone()))
            .or_default()
            .push(detection);
    }

    let mut kept = Vec::new();
    for rows in partitions.into_values() {
        kept.extend(dedup_partition(rows, threshold_ms));
    }

    debug!("Deduplicated {} detections into {}", before, kept.len());
    kept
}

fn dedup_partition(mut rows: Vec<Detection>, threshold_ms: i64) -> Vec<Detection> {
    let n = rows.len();
    let start_groups = chain_groups(&rows, threshold_ms, |d| d.start_time_ms);
    let end_groups = chain_groups(&rows, threshold_ms, |d| d.end_time_ms);
    let start_count = start_groups.iter().max().map_or(0, |g| g + 1);

    // Nodes 0..start_count are start groups, the rest are end groups.
    let end_count = end_groups.iter().max().map_or(0, |g| g + 1);
    let mut components = DisjointSet::new(start_count + end_count);
    for (&start, &end) in start_groups.iter().zip(&end_groups) {
        components.union(start, start_count + end);
    }

    let mut best: BTreeMap<usize, usize> = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        let root = components.find(start_groups[i]);
        best.entry(root)
            .and_modify(|current| {
                if row.cmp_confidence(&rows[*current]).is_gt() {
                    *current = i;
                }
            })
            .or_insert(i);
    }

    let mut keep = vec![false; n];
    for index in best.into_values() {
        keep[index] = true;
    }
    let mut flags = keep.into_iter();
    rows.retain(|_| flags.next().unwrap_or(false));
    rows.sort_by_key(|d| (d.start_time_ms, d.end_time_ms));
    rows
}

/// Assign each row a group id, starting a new group whenever the sorted key
/// jumps by more than `threshold_ms`.
fn chain_groups(
    rows: &[Detection],
    threshold_ms: i64,
    key: impl Fn(&Detection) -> i64,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by_key(|&i| key(&rows[i]));

    let mut groups = vec![0; rows.len()];
    let mut group = 0;
    let mut previous: Option<i64> = None;
    for i in order {
        let value = key(&rows[i]);
        if let Some(prev) = previous
            && value.saturating_sub(prev) > threshold_ms
        {
            group += 1;
        }
        groups[i] = group;
        previous = Some(value);
    }
    groups
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}
