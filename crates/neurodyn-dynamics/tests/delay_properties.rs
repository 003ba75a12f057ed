// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Property tests for delay lines and collection bounds

use ndarray::{Array1, ArrayD, IxDyn};
use neurodyn_dynamics::{into_node, Collect, CollectOptions, ConstantDelay, Container, NodeRef};
use proptest::prelude::*;

/// Step sizes, including ones whose multiples do not divide back exactly
fn step_dt() -> impl Strategy<Value = f64> {
    prop::sample::select(vec![0.1, 0.2, 0.25, 0.5, 1.0, 2.0])
}

fn tree(branching: usize, depth: usize) -> NodeRef {
    let mut container = Container::new();
    if depth > 0 {
        for i in 0..branching {
            container.add_node(format!("c{i}"), tree(branching, depth - 1)).unwrap();
        }
    }
    into_node(container)
}

proptest! {
    #[test]
    fn uniform_delay_returns_pushed_slice_after_exact_steps(
        steps in 0usize..8,
        dt in step_dt(),
        signal in prop::collection::vec(-100.0f64..100.0, 1..6),
    ) {
        let size = [signal.len()];
        let mut delay = ConstantDelay::new(&size, steps as f64 * dt, dt).unwrap();
        let input = Array1::from_vec(signal).into_dyn();

        delay.push(&input);
        for _ in 0..steps {
            prop_assert_eq!(delay.pull(), ArrayD::<f64>::zeros(IxDyn(&size)));
            delay.advance();
        }
        prop_assert_eq!(delay.pull(), input);
    }

    #[test]
    fn heterogeneous_channels_wrap_independently(
        steps in prop::collection::vec(0usize..6, 1..6),
        dt in step_dt(),
    ) {
        let times: Vec<f64> = steps.iter().map(|&d| d as f64 * dt).collect();
        let mut delay = ConstantDelay::new(&[steps.len()], times, dt).unwrap();
        prop_assert_eq!(delay.capacity(), steps.iter().max().unwrap() + 1);

        delay.push(&ndarray::arr0(1.0));
        let horizon = 2 * steps.iter().max().unwrap() + 2;
        for k in 0..horizon {
            let out = delay.pull();
            for (channel, &d) in steps.iter().enumerate() {
                let expected = if k % (d + 1) == d { 1.0 } else { 0.0 };
                prop_assert_eq!(out[[channel]], expected, "channel {} at step {}", channel, k);
            }
            delay.advance();
        }
    }

    #[test]
    fn reset_restores_fresh_state_and_is_idempotent(
        steps in 0usize..6,
        ops in prop::collection::vec(any::<bool>(), 0..20),
    ) {
        let fresh = ConstantDelay::new(&[3], steps as f64, 1.0).unwrap();
        let mut delay = ConstantDelay::new(&[3], steps as f64, 1.0).unwrap();
        for (i, advance) in ops.into_iter().enumerate() {
            if advance {
                delay.advance();
            } else {
                delay.push(&ndarray::arr0(i as f64 + 1.0));
            }
        }

        delay.clear();
        prop_assert_eq!(delay.in_idx(), fresh.in_idx());
        prop_assert_eq!(delay.out_idx(), fresh.out_idx());
        prop_assert_eq!(delay.data().value(), fresh.data().value());

        let snapshot = delay.data().value();
        delay.clear();
        prop_assert_eq!(delay.data().value(), snapshot);
        prop_assert_eq!(delay.in_idx(), fresh.in_idx());
    }

    #[test]
    fn collected_node_count_is_monotone_in_level(
        branching in 1usize..4,
        depth in 0usize..4,
    ) {
        let root = tree(branching, depth);
        let total: usize = (0..=depth).map(|k| branching.pow(k as u32)).sum();

        let mut previous = 0;
        for level in 0..=depth + 2 {
            let count = root.nodes(CollectOptions::new().level(level)).len();
            prop_assert!(count >= previous);
            if level >= depth {
                prop_assert_eq!(count, total);
            }
            previous = count;
        }
    }
}
