//! Majority vote of cluster labels over fixed instruction windows
use std::collections::{BTreeMap, HashMap};

/// Most frequent label, lowest label wins a tie. `None` for no labels.
pub fn majority_label<I: IntoIterator<Item = usize>>(labels: I) -> Option<usize> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    // iterate in ascending label order and only replace on a strictly larger count
    let mut best: Option<(usize, usize)> = None;
    for (label, count) in counts {
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((label, count)),
        }
    }
    best.map(|(label, _)| label)
}

/// Replace every label by the majority label of its bucket.
///
/// A sample belongs to bucket `cumulative_instructions / bucket_size`.
pub fn smooth_labels(
    cumulative_instructions: &[u64],
    labels: &[usize],
    bucket_size: u64,
) -> Vec<usize> {
    assert_eq!(cumulative_instructions.len(), labels.len());
    assert!(bucket_size > 0);

    let mut buckets: HashMap<u64, Vec<usize>> = HashMap::new();
    for (insn, label) in cumulative_instructions.iter().zip(labels) {
        buckets.entry(insn / bucket_size).or_default().push(*label);
    }

    let winners: HashMap<u64, usize> = buckets
        .into_iter()
        .filter_map(|(bucket, members)| majority_label(members).map(|label| (bucket, label)))
        .collect();

    cumulative_instructions
        .iter()
        .map(|insn| winners[&(insn / bucket_size)])
        .collect()
}
