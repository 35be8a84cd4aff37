// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Dependency Graph
//!
//! Edges are declared in random order between random units. Whatever the
//! input, an accepted graph is acyclic, its stages respect every edge, and
//! every rejected edge would have closed a cycle.

use igdb_stacks::composition::{CompositionBuilder, CompositionError, StackUnit};
use igdb_stacks::domain::StackName;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

const UNITS: usize = 8;

fn name(i: usize) -> StackName {
    StackName::new(format!("unit-{i}")).unwrap()
}

fn builder() -> CompositionBuilder {
    let mut b = CompositionBuilder::new();
    for i in 0..UNITS {
        b.add_unit(StackUnit::new(name(i), format!("unit {i}"))).unwrap();
    }
    b
}

fn reachable(edges: &BTreeMap<usize, BTreeSet<usize>>, from: usize, to: usize) -> bool {
    let mut stack = vec![from];
    let mut seen = BTreeSet::new();
    while let Some(n) = stack.pop() {
        if n == to {
            return true;
        }
        if seen.insert(n) {
            stack.extend(edges.get(&n).into_iter().flatten().copied());
        }
    }
    false
}

fn edge_strategy() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..UNITS, 0..UNITS), 0..40)
}

proptest! {
    /// Accepted edges never form a cycle and stages honour every edge
    #[test]
    fn prop_accepted_graph_is_acyclic(edges in edge_strategy()) {
        let mut b = builder();
        let mut accepted: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();

        for (consumer, producer) in edges {
            match b.depends_on(&name(consumer), &name(producer)) {
                Ok(_) => {
                    accepted.entry(consumer).or_default().insert(producer);
                }
                Err(CompositionError::SelfDependency(_)) => prop_assert_eq!(consumer, producer),
                Err(CompositionError::Cycle { path }) => {
                    prop_assert!(reachable(&accepted, producer, consumer));
                    prop_assert_eq!(path.first(), path.last());
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }

        let plan = b.build().unwrap();
        let stage_of: BTreeMap<StackName, usize> = plan
            .stages()
            .iter()
            .enumerate()
            .flat_map(|(i, stage)| stage.iter().map(move |n| (n.clone(), i)))
            .collect();
        prop_assert_eq!(stage_of.len(), UNITS);
        for (consumer, producers) in &accepted {
            for producer in producers {
                prop_assert!(stage_of[&name(*producer)] < stage_of[&name(*consumer)]);
            }
        }
    }

    /// Applying units in any order permitted by `ready` reaches every unit
    #[test]
    fn prop_ready_drives_full_rollout(edges in edge_strategy(), picks in prop::collection::vec(any::<prop::sample::Index>(), UNITS)) {
        let mut b = builder();
        for (consumer, producer) in edges {
            let _ = b.depends_on(&name(consumer), &name(producer));
        }
        let plan = b.build().unwrap();

        let mut applied = BTreeSet::new();
        for pick in picks {
            let ready: Vec<StackName> = plan.ready(&applied).into_iter().cloned().collect();
            prop_assert!(!ready.is_empty());
            let next = pick.get(&ready).clone();
            prop_assert!(plan.is_satisfied(&next, &applied));
            applied.insert(next);
        }
        prop_assert_eq!(applied.len(), UNITS);
    }

    /// A group consumer becomes ready only after every member, in any order
    #[test]
    fn prop_group_satisfied_regardless_of_order(reverse in any::<bool>()) {
        let mut b = builder();
        let members = [name(1), name(2), name(3)];
        let group = b.group("data", &[&members[0], &members[1], &members[2]]).unwrap();
        b.depends_on_group(&name(0), &group).unwrap();
        let plan = b.build().unwrap();

        let mut order = members.to_vec();
        if reverse {
            order.reverse();
        }
        let mut applied = BTreeSet::new();
        for (i, member) in order.into_iter().enumerate() {
            prop_assert!(!plan.is_satisfied(&name(0), &applied));
            applied.insert(member);
            prop_assert_eq!(plan.is_satisfied(&name(0), &applied), i == 2);
        }
    }
}
