//! Property-based tests for scoring and ranking.
//!
//! These tests check invariants that hold for every input: precision stays
//! in range, the top-k list stays sorted and bounded, and the grid
//! enumerates each configuration exactly once.

use saidi_forecast::models::ModelSpec;
use saidi_forecast::search::{rank_order, ParameterGrid, Scorecard, TopKTracker};
use saidi_forecast::utils::metrics::{composite_precision, PrecisionBreakdown};
use saidi_forecast::utils::calculate_metrics;
use proptest::prelude::*;
use std::collections::HashSet;

fn spec_strategy() -> impl Strategy<Value = ModelSpec> {
    (0..5usize, 0..3usize, 0..5usize, 0..3usize, 0..2usize, 0..3usize, 1..16usize)
        .prop_map(|(p, d, q, cp, cd, cq, s)| ModelSpec::new((p, d, q), (cp, cd, cq, s)))
}

fn scorecard_strategy() -> impl Strategy<Value = Scorecard> {
    prop_oneof![
        1 => Just(Scorecard::sentinel()),
        4 => (0.0..50.0_f64, 0.0..100.0_f64, 0.0..100.0_f64, 0.0..100.0_f64, 0usize..12).prop_map(
            |(rmse, pm, pr2, prmse, n_params)| {
                let mut card = Scorecard::sentinel();
                card.rmse = rmse;
                card.precision = PrecisionBreakdown::from_components(pm, pr2, prmse);
                card.composite_score = rmse + 0.1 * n_params as f64;
                card.n_params = n_params;
                card
            }
        ),
    ]
}

proptest! {
    #[test]
    fn composite_precision_is_bounded(
        pm in -1000.0..1000.0_f64,
        pr2 in -1000.0..1000.0_f64,
        prmse in -1000.0..1000.0_f64,
    ) {
        let precision = composite_precision(pm, pr2, prmse);
        prop_assert!((0.0..=100.0).contains(&precision));
    }

    #[test]
    fn precision_from_metrics_is_bounded(
        actual in prop::collection::vec(0.5..100.0_f64, 6..30),
        noise in prop::collection::vec(-50.0..50.0_f64, 30),
    ) {
        let predicted: Vec<f64> = actual
            .iter()
            .zip(&noise)
            .map(|(a, e)| a + e)
            .collect();
        let metrics = calculate_metrics(&actual, &predicted).unwrap();
        let breakdown = PrecisionBreakdown::from_metrics(&metrics);
        prop_assert!((0.0..=100.0).contains(&breakdown.precision_final));
        prop_assert!(breakdown.precision_mape >= 0.0);
        prop_assert!(breakdown.precision_r2 >= 0.0);
        prop_assert!(breakdown.precision_rmse >= 0.0);
    }

    #[test]
    fn topk_stays_sorted_and_bounded(
        offers in prop::collection::vec((spec_strategy(), scorecard_strategy()), 0..40),
    ) {
        let mut tracker = TopKTracker::new();
        for (spec, card) in &offers {
            tracker.offer(*spec, card.clone());
        }

        let snapshot = tracker.snapshot();
        prop_assert_eq!(snapshot.len(), offers.len().min(3));
        for pair in snapshot.windows(2) {
            prop_assert_ne!(rank_order(&pair[0], &pair[1]), std::cmp::Ordering::Greater);
            prop_assert!(
                pair[0].scorecard.precision_final() >= pair[1].scorecard.precision_final()
            );
        }

        // Nothing offered ranks above the best kept entry.
        if let Some(best) = tracker.best() {
            let best_precision = best.scorecard.precision_final();
            for (_, card) in &offers {
                prop_assert!(card.precision_final() <= best_precision);
            }
        }
    }

    #[test]
    fn grid_enumerates_each_spec_once(
        p in 1..3usize,
        d in 1..3usize,
        q in 1..3usize,
        cp in 1..3usize,
        cd in 1..2usize,
        cq in 1..3usize,
        s_start in 1..13usize,
        s_len in 1..3usize,
    ) {
        let grid = ParameterGrid::default()
            .with_order(0..p, 0..d, 0..q)
            .with_seasonal_order(0..cp, 0..cd, 0..cq)
            .with_periods(s_start..s_start + s_len);
        let specs: Vec<ModelSpec> = grid.iter().collect();
        let unique: HashSet<ModelSpec> = specs.iter().copied().collect();

        prop_assert_eq!(specs.len(), grid.total_combinations());
        prop_assert_eq!(unique.len(), specs.len());
        prop_assert_eq!(grid.spec_at(0), specs.first().copied());
    }
}
