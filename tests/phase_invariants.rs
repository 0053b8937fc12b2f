use dna_phase::{
    Configuration, CounterRow, Sample, build_samples, change_points, segment, smooth_labels,
};
use proptest::prelude::*;

fn samples_from_steps(steps: &[u64]) -> Vec<Sample> {
    let mut cumulative = 0;
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            cumulative += step;
            Sample {
                timestamp: i as f64,
                instruction_count: *step,
                l3_requests: 0,
                l3_misses: 0,
                configuration: Configuration::new(1, 72),
                instruction_rate: *step as f64,
                cumulative_instructions: cumulative,
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn phases_cover_every_instruction(
        labelled in prop::collection::vec((1u64..50, 0usize..3), 1..200),
        bucket_size in 1u64..200,
    ) {
        let steps: Vec<u64> = labelled.iter().map(|(step, _)| *step).collect();
        let raw: Vec<usize> = labelled.iter().map(|(_, label)| *label).collect();
        let samples = samples_from_steps(&steps);
        let cumulative: Vec<u64> = samples.iter().map(|s| s.cumulative_instructions).collect();
        let smoothed = smooth_labels(&cumulative, &raw, bucket_size);

        let phases = segment(&samples, &raw, &smoothed, 2);
        let longest_span = change_points(&smoothed)
            .windows(2)
            .map(|window| window[1] - window[0])
            .max()
            .unwrap_or(0);
        prop_assert_eq!(phases.is_empty(), longest_span < 2);

        if let (Some(first), Some(last)) = (phases.first(), phases.last()) {
            prop_assert_eq!(first.start_insn, 1);
            prop_assert_eq!(last.end_insn, *cumulative.last().unwrap());
        }
        for pair in phases.windows(2) {
            prop_assert_eq!(pair[1].start_insn, pair[0].end_insn + 1);
        }
        for phase in &phases {
            prop_assert!(phase.start_insn <= phase.end_insn);
            prop_assert!(phase.std_rate >= 0.0);
            prop_assert!(phase.coefficient_of_variation >= 0.0);
        }
    }

    #[test]
    fn smoothing_is_idempotent(
        labelled in prop::collection::vec((0u64..40, 0usize..5), 0..200),
        bucket_size in 1u64..100,
    ) {
        let mut cumulative = 0;
        let insn: Vec<u64> = labelled
            .iter()
            .map(|(step, _)| {
                cumulative += step;
                cumulative
            })
            .collect();
        let raw: Vec<usize> = labelled.iter().map(|(_, label)| *label).collect();

        let once = smooth_labels(&insn, &raw, bucket_size);
        let twice = smooth_labels(&insn, &once, bucket_size);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn rates_are_never_negative(
        rows in prop::collection::vec((0.0f64..10.0, 0u64..1_000_000), 0..100),
    ) {
        let rows: Vec<CounterRow> = rows
            .iter()
            .map(|(time, instructions)| CounterRow {
                time: *time,
                instructions: *instructions,
                l3_requests: 0,
                l3_misses: 0,
            })
            .collect();
        let samples = build_samples(Configuration::new(1, 72), &rows);

        let mut last = 0;
        for sample in &samples {
            prop_assert!(sample.instruction_rate >= 0.0);
            prop_assert!(sample.instruction_count > 0);
            prop_assert!(sample.cumulative_instructions >= last);
            last = sample.cumulative_instructions;
        }
    }
}

#[test]
fn label_transitions_become_boundaries() {
    let labels = [0, 0, 0, 1, 1, 2, 2, 2, 2];
    let samples = samples_from_steps(&[1; 9]);
    let phases = segment(&samples, &labels, &labels, 2);
    let ranges: Vec<(u64, u64, usize)> = phases
        .iter()
        .map(|phase| (phase.start_insn, phase.end_insn, phase.cluster_id))
        .collect();
    assert_eq!(ranges, vec![(1, 3, 0), (4, 5, 1), (6, 9, 2)]);
}

#[test]
fn lone_label_merges_neighbours() {
    let labels = [0, 0, 1, 0, 0];
    let samples = samples_from_steps(&[1; 5]);
    let phases = segment(&samples, &labels, &labels, 2);
    assert_eq!(phases.len(), 1);
    assert_eq!((phases[0].start_insn, phases[0].end_insn), (1, 5));
    assert_eq!(phases[0].cluster_id, 0);
}
