use crate::Sample;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Phase: a contiguous instruction range of one configuration with one stable cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// first instruction of the phase, 1-based
    pub start_insn: u64,
    /// last instruction of the phase, inclusive
    pub end_insn: u64,
    /// raw mixture component of the first sample of the phase
    pub cluster_id: usize,
    pub mean_rate: f64,
    pub std_rate: f64,
    /// std_rate / mean_rate, 0 when the mean rate is 0
    pub coefficient_of_variation: f64,
    pub mean_l3_req: f64,
    pub mean_l3_miss: f64,
}

/// Indices where the label differs from its predecessor, plus 0 and `labels.len()`
pub fn change_points(labels: &[usize]) -> Vec<usize> {
    let mut points = vec![0];
    for i in 1..labels.len() {
        if labels[i] != labels[i - 1] {
            points.push(i);
        }
    }
    points.push(labels.len());
    points
}

/// Sample indices that make up one phase
#[derive(Debug, Clone)]
struct PhaseSpan {
    range: Range<usize>,
    /// first sample of the first span that was long enough to survive
    anchor: usize,
    label: usize,
}

/// Split one configuration into phases.
///
/// `samples`, `raw_labels` and `smoothed_labels` are parallel and ordered by
/// cumulative instructions. Runs of equal smoothed labels shorter than
/// `min_span_len` are treated as noise: their samples join the next phase (the
/// previous one at the tail), and phases that end up neighbouring with the same
/// label are merged.
pub fn segment(
    samples: &[Sample],
    raw_labels: &[usize],
    smoothed_labels: &[usize],
    min_span_len: usize,
) -> Vec<Phase> {
    assert_eq!(samples.len(), raw_labels.len());
    assert_eq!(samples.len(), smoothed_labels.len());

    let points = change_points(smoothed_labels);
    let mut spans: Vec<PhaseSpan> = vec![];
    for window in points.windows(2) {
        let (start, end) = (window[0], window[1]);
        if end - start < min_span_len.max(1) {
            continue;
        }
        let label = smoothed_labels[start];
        match spans.last_mut() {
            Some(last) if last.label == label => last.range.end = end,
            Some(last) => {
                let range_start = last.range.end;
                spans.push(PhaseSpan {
                    range: range_start..end,
                    anchor: start,
                    label,
                });
            }
            None => spans.push(PhaseSpan {
                range: 0..end,
                anchor: start,
                label,
            }),
        }
    }

    let Some(last) = spans.last_mut() else {
        return vec![];
    };
    last.range.end = samples.len();

    // pooled runs may repeat a cumulative count, never emit an empty instruction range
    let mut merged: Vec<PhaseSpan> = vec![];
    for span in spans {
        let end_insn = samples[span.range.end - 1].cumulative_instructions;
        match merged.last_mut() {
            Some(prev) if samples[prev.range.end - 1].cumulative_instructions >= end_insn => {
                prev.range.end = span.range.end;
            }
            _ => merged.push(span),
        }
    }

    let mut phases = vec![];
    let mut start_insn = 1;
    for span in merged {
        let members = &samples[span.range.clone()];
        let end_insn = members[members.len() - 1].cumulative_instructions;
        let phase = phase_statistics(members, start_insn, end_insn, raw_labels[span.anchor]);
        start_insn = end_insn + 1;
        phases.push(phase);
    }
    phases
}

fn phase_statistics(
    members: &[Sample],
    start_insn: u64,
    end_insn: u64,
    cluster_id: usize,
) -> Phase {
    let n = members.len() as f64;
    let mean = |value: fn(&Sample) -> f64| members.iter().map(value).sum::<f64>() / n;

    let mean_rate = mean(|sample| sample.instruction_rate);
    let std_rate = if members.len() > 1 {
        let sum_sq: f64 = members
            .iter()
            .map(|sample| (sample.instruction_rate - mean_rate).powi(2))
            .sum();
        (sum_sq / (n - 1.0)).sqrt()
    } else {
        0.0
    };
    let coefficient_of_variation = if mean_rate > 0.0 {
        std_rate / mean_rate
    } else {
        0.0
    };

    Phase {
        start_insn,
        end_insn,
        cluster_id,
        mean_rate,
        std_rate,
        coefficient_of_variation,
        mean_l3_req: mean(|sample| sample.l3_requests as f64),
        mean_l3_miss: mean(|sample| sample.l3_misses as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Configuration;

    /// one instruction per sample, rate equals the index
    fn samples(n: usize) -> Vec<Sample> {
        (1..=n as u64)
            .map(|i| Sample {
                timestamp: i as f64,
                instruction_count: 1,
                l3_requests: 2 * i,
                l3_misses: i,
                configuration: Configuration::new(1, 72),
                instruction_rate: i as f64,
                cumulative_instructions: i,
            })
            .collect()
    }

    fn ranges(phases: &[Phase]) -> Vec<(u64, u64, usize)> {
        phases
            .iter()
            .map(|phase| (phase.start_insn, phase.end_insn, phase.cluster_id))
            .collect()
    }

    #[test]
    fn test_change_points() {
        assert_eq!(change_points(&[0, 0, 1, 1, 0]), vec![0, 2, 4, 5]);
        assert_eq!(change_points(&[]), vec![0, 0]);
    }

    #[test]
    fn test_three_phases() {
        let labels = [0, 0, 0, 1, 1, 2, 2, 2, 2];
        let phases = segment(&samples(9), &labels, &labels, 2);
        assert_eq!(ranges(&phases), vec![(1, 3, 0), (4, 5, 1), (6, 9, 2)]);

        assert_eq!(phases[0].mean_rate, 2.0);
        assert_eq!(phases[0].std_rate, 1.0);
        assert_eq!(phases[0].coefficient_of_variation, 0.5);
        assert_eq!(phases[0].mean_l3_req, 4.0);
        assert_eq!(phases[0].mean_l3_miss, 2.0);
        assert_eq!(phases[1].mean_rate, 4.5);
    }

    #[test]
    fn test_singleton_is_dropped() {
        let labels = [0, 0, 1, 0, 0];
        let raw = [3, 0, 1, 0, 0];
        let phases = segment(&samples(5), &raw, &labels, 2);
        assert_eq!(ranges(&phases), vec![(1, 5, 3)]);
        assert_eq!(phases[0].mean_rate, 3.0);
    }

    #[test]
    fn test_singleton_joins_next_phase() {
        let labels = [0, 0, 1, 2, 2];
        let raw = [0, 0, 4, 2, 2];
        let phases = segment(&samples(5), &raw, &labels, 2);
        // cluster id comes from the surviving span, not the absorbed sample
        assert_eq!(ranges(&phases), vec![(1, 2, 0), (3, 5, 2)]);
        assert_eq!(phases[1].mean_rate, 4.0);
    }

    #[test]
    fn test_leading_and_trailing_singletons() {
        let labels = [5, 0, 0, 1, 1, 7];
        let phases = segment(&samples(6), &labels, &labels, 2);
        assert_eq!(ranges(&phases), vec![(1, 3, 0), (4, 6, 1)]);
    }

    #[test]
    fn test_nothing_survives() {
        let labels = [0, 1, 2];
        assert!(segment(&samples(3), &labels, &labels, 2).is_empty());
        assert!(segment(&[], &[], &[], 2).is_empty());
    }

    #[test]
    fn test_zero_rate() {
        let mut data = samples(2);
        for sample in &mut data {
            sample.instruction_rate = 0.0;
        }
        let phases = segment(&data, &[0, 0], &[0, 0], 2);
        assert_eq!(phases[0].coefficient_of_variation, 0.0);
    }

    #[test]
    fn test_repeated_cumulative_count() {
        let mut data = samples(4);
        data[2].cumulative_instructions = 2;
        data[3].cumulative_instructions = 2;
        let labels = [0, 0, 1, 1];
        let phases = segment(&data, &labels, &labels, 2);
        assert_eq!(ranges(&phases), vec![(1, 2, 0)]);
    }
}
