//! Integration tests for registry + evaluator over grouped tables.
//!
//! Tests cover:
//! - Overwrite-in-place registration and derived comparison keys
//! - Max-guard suppression and Indeterminate propagation through the table
//! - Per-symbol independence on a two-symbol grouped table
//! - Determinism and row independence (property tests)
//! - Evaluating from a rule snapshot across threads

mod common;

use common::*;
use proptest::prelude::*;
use signalbook::adapters::csv_report_adapter::CsvReportAdapter;
use signalbook::domain::error::SignalbookError;
use signalbook::domain::evaluator::{SignalEvaluator, SignalState};
use signalbook::domain::frame::{PriceFrame, SymbolFrame};
use signalbook::domain::registry::{SignalRegistry, ThresholdParams};
use signalbook::domain::rel_op::Verdict;
use signalbook::domain::signal_rule::SignalRule;
use signalbook::ports::report_port::ReportPort;
use signalbook::ports::table_port::TimeSeriesTable;

mod registry_semantics {
    use super::*;

    #[test]
    fn same_threshold_name_overwrites_in_place() {
        let mut registry = sample_registry();
        let before = registry.list_all().count();

        registry
            .register_threshold("TSF", ThresholdParams::new(50.0, 40.0, ">=", "<="))
            .unwrap();

        assert_eq!(registry.list_all().count(), before);
        assert_eq!(registry.list_all().next().unwrap().0, "TSF");
        match registry.get("TSF") {
            Some(SignalRule::Threshold(t)) => {
                assert_eq!(t.buy, 50.0);
                assert_eq!(t.sell, 40.0);
                assert!(t.buy_max.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn comparison_pairs_are_distinct_entries() {
        let mut registry = SignalRegistry::new();
        registry.register_comparison("X", "Y", ">", "<").unwrap();
        registry.register_comparison("Y", "X", ">", "<").unwrap();

        let keys: Vec<&str> = registry.list_all().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["X_comp_Y", "Y_comp_X"]);
    }

    #[test]
    fn dangling_buy_max_raises_invalid_config() {
        let mut registry = SignalRegistry::new();
        let mut params = ThresholdParams::new(10.0, 5.0, ">", "<");
        params.buy_max = Some(20.0);

        let err = registry.register_threshold("TSF", params).unwrap_err();

        assert!(matches!(err, SignalbookError::InvalidConfig { .. }));
        assert!(registry.get("TSF").is_none());
    }

    #[test]
    fn unknown_rule_is_absent() {
        let registry = sample_registry();
        assert!(registry.get("never_registered").is_none());
        assert!(registry.get_signal(Some("never_registered")).is_none());
    }
}

mod evaluation_semantics {
    use super::*;

    fn tsf_buy(value: f64) -> Verdict {
        let frame = PriceFrame::single(symbol_frame("SPY", vec![("TSF", vec![value])]));
        let registry = sample_registry();
        let report = SignalEvaluator::new(&registry).evaluate(&frame);
        report.lookup("SPY", ts(1), "TSF").unwrap().buy
    }

    #[test]
    fn max_guard_examples() {
        assert_eq!(tsf_buy(15.0), Verdict::True);
        assert_eq!(tsf_buy(25.0), Verdict::False);
        assert_eq!(tsf_buy(5.0), Verdict::False);
        assert_eq!(tsf_buy(f64::NAN), Verdict::Indeterminate);
    }

    #[test]
    fn comparison_examples() {
        let frame = PriceFrame::single(symbol_frame(
            "SPY",
            vec![("A", vec![5.0, 3.0, f64::NAN]), ("B", vec![3.0, 5.0, 5.0])],
        ));
        let registry = sample_registry();
        let report = SignalEvaluator::new(&registry).evaluate(&frame);

        assert_eq!(report.lookup("SPY", ts(1), "A_comp_B").unwrap().buy, Verdict::True);
        assert_eq!(report.lookup("SPY", ts(2), "A_comp_B").unwrap().buy, Verdict::False);
        assert_eq!(
            report.lookup("SPY", ts(3), "A_comp_B").unwrap().buy,
            Verdict::Indeterminate
        );
    }

    #[test]
    fn absent_indicator_column_is_indeterminate_not_false() {
        let frame = PriceFrame::single(symbol_frame("SPY", vec![("close", vec![100.0])]));
        let registry = sample_registry();
        let report = SignalEvaluator::new(&registry).evaluate(&frame);

        assert_eq!(
            report.lookup("SPY", ts(1), "TSF").unwrap(),
            SignalState::INDETERMINATE
        );
        assert_eq!(
            report.lookup("SPY", ts(1), "A_comp_B").unwrap(),
            SignalState::INDETERMINATE
        );
    }

    #[test]
    fn both_sides_may_fire() {
        let mut registry = SignalRegistry::new();
        registry
            .register_threshold("RSI", ThresholdParams::new(50.0, 40.0, ">", ">"))
            .unwrap();
        let frame = PriceFrame::single(symbol_frame("SPY", vec![("RSI", vec![60.0])]));

        let state = SignalEvaluator::new(&registry)
            .evaluate(&frame)
            .lookup("SPY", ts(1), "RSI")
            .unwrap();

        assert_eq!(state.buy, Verdict::True);
        assert_eq!(state.sell, Verdict::True);
        assert!(state.is_contradictory());
    }
}

mod multi_symbol {
    use super::*;

    fn two_symbol_frame(msft_tsf: Vec<f64>) -> PriceFrame {
        grouped(vec![
            symbol_frame(
                "AAPL",
                vec![
                    ("TSF", vec![15.0, 25.0, 1.0]),
                    ("A", vec![5.0, 3.0, 4.0]),
                    ("B", vec![3.0, 5.0, 4.0]),
                ],
            ),
            symbol_frame(
                "MSFT",
                vec![
                    ("TSF", msft_tsf),
                    ("A", vec![0.0, 0.0, 0.0]),
                    ("B", vec![1.0, 1.0, 1.0]),
                ],
            ),
        ])
    }

    #[test]
    fn verdicts_are_per_symbol() {
        let frame = two_symbol_frame(vec![f64::NAN, 12.0, 30.0]);
        let registry = sample_registry();
        let report = SignalEvaluator::new(&registry).evaluate(&frame);

        assert!(report.multi_index);
        assert_eq!(report.symbols.len(), 2);

        let aapl: Vec<Verdict> = (1..=3)
            .map(|d| report.lookup("AAPL", ts(d), "TSF").unwrap().buy)
            .collect();
        assert_eq!(aapl, vec![Verdict::True, Verdict::False, Verdict::False]);
        assert_eq!(
            report.lookup("AAPL", ts(3), "TSF").unwrap().sell,
            Verdict::True
        );

        let msft: Vec<Verdict> = (1..=3)
            .map(|d| report.lookup("MSFT", ts(d), "TSF").unwrap().buy)
            .collect();
        assert_eq!(msft, vec![Verdict::Indeterminate, Verdict::True, Verdict::False]);
    }

    #[test]
    fn changing_one_symbol_leaves_the_other_untouched() {
        let registry = sample_registry();
        let evaluator = SignalEvaluator::new(&registry);

        let first = evaluator.evaluate(&two_symbol_frame(vec![15.0, 15.0, 15.0]));
        let second = evaluator.evaluate(&two_symbol_frame(vec![f64::NAN, 0.0, 99.0]));

        assert_eq!(first.symbol("AAPL"), second.symbol("AAPL"));
        assert_ne!(first.symbol("MSFT"), second.symbol("MSFT"));
    }

    #[test]
    fn symbols_with_different_lengths() {
        let frame = grouped(vec![
            symbol_frame("AAPL", vec![("TSF", vec![15.0])]),
            symbol_frame("MSFT", vec![("TSF", vec![1.0, 2.0, 15.0])]),
        ]);
        let registry = sample_registry();
        let report = SignalEvaluator::new(&registry).evaluate(&frame);

        let latest = report.latest();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].symbol, "AAPL");
        assert_eq!(latest[0].timestamp, ts(1));
        assert_eq!(latest[1].symbol, "MSFT");
        assert_eq!(latest[1].timestamp, ts(3));
        assert_eq!(latest[1].signals[0].1.buy, Verdict::True);
    }

    #[test]
    fn snapshot_evaluation_across_threads_matches_sequential() {
        let frame = two_symbol_frame(vec![f64::NAN, 12.0, 30.0]);
        let registry = sample_registry();
        let sequential = SignalEvaluator::new(&registry).evaluate(&frame);

        let rules = registry.snapshot_rules();
        let parallel: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = frame
                .symbols()
                .into_iter()
                .map(|symbol| {
                    let rules = &rules;
                    let frame = &frame;
                    scope.spawn(move || {
                        SignalEvaluator::from_rules(rules).evaluate_symbol(frame, symbol)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(parallel, sequential.symbols);
    }
}

mod determinism {
    use super::*;

    fn value() -> impl Strategy<Value = f64> {
        prop_oneof![1 => Just(f64::NAN), 6 => -30.0..30.0f64]
    }

    fn frame_from(rows: &[(f64, f64, f64)]) -> PriceFrame {
        PriceFrame::single(symbol_frame(
            "SPY",
            vec![
                ("TSF", rows.iter().map(|r| r.0).collect()),
                ("A", rows.iter().map(|r| r.1).collect()),
                ("B", rows.iter().map(|r| r.2).collect()),
            ],
        ))
    }

    proptest! {
        #[test]
        fn evaluating_twice_is_identical(
            rows in prop::collection::vec((value(), value(), value()), 1..25)
        ) {
            let frame = frame_from(&rows);
            let registry = sample_registry();
            let evaluator = SignalEvaluator::new(&registry);

            let first = evaluator.evaluate(&frame);
            let second = evaluator.evaluate(&frame);

            prop_assert_eq!(&first, &second);
            let first_records: Vec<_> = first.iter().collect();
            let second_records: Vec<_> = second.iter().collect();
            prop_assert_eq!(first_records, second_records);

            let mut first_csv = Vec::new();
            let mut second_csv = Vec::new();
            CsvReportAdapter.write(&first, false, &mut first_csv).unwrap();
            CsvReportAdapter.write(&second, false, &mut second_csv).unwrap();
            prop_assert_eq!(first_csv, second_csv);
        }

        #[test]
        fn each_row_matches_isolated_evaluation(
            rows in prop::collection::vec((value(), value(), value()), 1..25)
        ) {
            let registry = sample_registry();
            let evaluator = SignalEvaluator::new(&registry);
            let full = evaluator.evaluate(&frame_from(&rows));

            for (i, row) in rows.iter().enumerate() {
                let single = SymbolFrame::new("SPY", vec![ts(1)])
                    .unwrap()
                    .with_column("TSF", vec![row.0])
                    .unwrap()
                    .with_column("A", vec![row.1])
                    .unwrap()
                    .with_column("B", vec![row.2])
                    .unwrap();
                let isolated = evaluator.evaluate(&PriceFrame::single(single));
                prop_assert_eq!(&isolated.symbols[0].states[0], &full.symbols[0].states[i]);
            }
        }
    }
}
