use std::collections::BTreeSet;

use apriori::{
    AssociationRule, ItemBase, Miner, MinerConfig, RuleSupport, Support, Target, TransactionBag,
};
use proptest::prelude::*;

const ITEMS: usize = 6;

fn build(data: &[BTreeSet<usize>]) -> (ItemBase, TransactionBag) {
    let mut base = ItemBase::new();
    let mut bag = TransactionBag::new();
    for transaction in data {
        let names: Vec<String> = transaction.iter().map(|item| item.to_string()).collect();
        bag.push(base.register(&names, 1));
    }
    (base, bag)
}

fn mask(items: &[usize]) -> u32 {
    items.iter().fold(0, |mask, &item| mask | 1 << item)
}

fn brute_support(data: &[BTreeSet<usize>], set: u32) -> Support {
    data.iter()
        .filter(|t| {
            let items: Vec<usize> = t.iter().copied().collect();
            mask(&items) & set == set
        })
        .count() as Support
}

fn members(set: u32) -> Vec<usize> {
    (0..ITEMS).filter(|&item| set & 1 << item != 0).collect()
}

/// All non-empty frequent itemsets as (column mask, support).
fn brute_frequent(data: &[BTreeSet<usize>], min_support: Support) -> Vec<(u32, Support)> {
    (1u32..1 << ITEMS)
        .map(|set| (set, brute_support(data, set)))
        .filter(|&(_, support)| support >= min_support)
        .collect()
}

fn config(target: Target, min_support: Support) -> MinerConfig {
    MinerConfig {
        target,
        min_support: -(min_support as f64),
        ..MinerConfig::default()
    }
}

fn columns(base: &ItemBase, ids: &[usize]) -> u32 {
    let columns: Vec<usize> = ids
        .iter()
        .map(|&id| base.name(id).parse().unwrap())
        .collect();
    mask(&columns)
}

fn mine_sets(data: &[BTreeSet<usize>], config: MinerConfig) -> Vec<(u32, Support)> {
    let (base, bag) = build(data);
    let mined = match Miner::new(config).unwrap().mine(base, bag) {
        Ok(mined) => mined,
        Err(err) if err.is_empty_result() => return Vec::new(),
        Err(err) => panic!("mining failed: {err}"),
    };
    let mut sets: Vec<(u32, Support)> = mined
        .frequent_levels()
        .iter()
        .flat_map(|level| {
            (0..level.len()).map(move |idx| (level.get_itemset(idx).to_vec(), level.support(idx)))
        })
        .map(|(items, support)| (columns(&mined.base, &items), support))
        .collect();
    sets.sort_unstable();
    sets
}

fn transactions() -> impl Strategy<Value = Vec<BTreeSet<usize>>> {
    prop::collection::vec(prop::collection::btree_set(0..ITEMS, 0..ITEMS), 1..14)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn frequent_sets_match_brute_force(data in transactions(), min_support in 1u64..4) {
        let found = mine_sets(&data, config(Target::Sets, min_support));
        let expected = brute_frequent(&data, min_support);
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn tree_and_bag_counting_agree(data in transactions(), min_support in 1u64..4) {
        let by_tree = mine_sets(&data, config(Target::Sets, min_support));
        let by_bag = mine_sets(&data, MinerConfig {
            use_tree: false,
            prune_counters: false,
            filter: 0.0,
            ..config(Target::Sets, min_support)
        });
        prop_assert_eq!(by_tree, by_bag);
    }

    #[test]
    fn closed_sets_have_no_equal_superset(data in transactions(), min_support in 1u64..4) {
        let found = mine_sets(&data, config(Target::Closed, min_support));
        let expected: Vec<(u32, Support)> = brute_frequent(&data, min_support)
            .into_iter()
            .filter(|&(set, support)| {
                (0..ITEMS)
                    .filter(|&item| set & 1 << item == 0)
                    .all(|item| brute_support(&data, set | 1 << item) < support)
            })
            .collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn maximal_sets_have_no_frequent_superset(data in transactions(), min_support in 1u64..4) {
        let found = mine_sets(&data, config(Target::Maximal, min_support));
        let expected: Vec<(u32, Support)> = brute_frequent(&data, min_support)
            .into_iter()
            .filter(|&(set, _)| {
                (0..ITEMS)
                    .filter(|&item| set & 1 << item == 0)
                    .all(|item| brute_support(&data, set | 1 << item) < min_support)
            })
            .collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn rules_have_exact_confidence(data in transactions(), min_support in 1u64..4) {
        let (base, bag) = build(&data);
        let config = MinerConfig {
            min_confidence: 0.5,
            rule_support: RuleSupport::Both,
            ..config(Target::Rules, min_support)
        };
        let mined = match Miner::new(config).unwrap().mine(base, bag) {
            Ok(mined) => mined,
            Err(err) => {
                prop_assert!(err.is_empty_result());
                return Ok(());
            }
        };
        let rules: Vec<AssociationRule> = mined.rules().collect();
        for rule in &rules {
            let body = columns(&mined.base, &rule.body);
            let set = body | columns(&mined.base, &[rule.head]);
            prop_assert_eq!(rule.support, brute_support(&data, set));
            prop_assert_eq!(rule.body_support, brute_support(&data, body));
            prop_assert!(rule.support >= min_support);
            prop_assert!(2 * rule.support >= rule.body_support);
        }

        let expected: usize = brute_frequent(&data, min_support)
            .into_iter()
            .map(|(set, support)| {
                members(set)
                    .into_iter()
                    .filter(|&head| 2 * support >= brute_support(&data, set & !(1 << head)))
                    .count()
            })
            .sum();
        prop_assert_eq!(rules.len(), expected);
    }

    #[test]
    fn perfect_extensions_report_every_set(data in transactions(), min_support in 1u64..4) {
        let (base, bag) = build(&data);
        let config = MinerConfig {
            format: Some(" %a".to_string()),
            ..config(Target::Sets, min_support)
        };
        let mut out = Vec::new();
        let expected = brute_frequent(&data, min_support);
        match Miner::new(config).unwrap().run(base, bag, &mut out) {
            Ok(summary) => prop_assert_eq!(summary.written, expected.len()),
            Err(err) => {
                prop_assert!(err.is_empty_result());
                prop_assert!(expected.is_empty());
                return Ok(());
            }
        }

        let mut found: Vec<(u32, Support)> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| {
                let mut fields: Vec<&str> = line.split(' ').collect();
                let support = fields.pop().unwrap().parse().unwrap();
                let items: Vec<usize> = fields.iter().map(|name| name.parse().unwrap()).collect();
                (mask(&items), support)
            })
            .collect();
        found.sort_unstable();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn reduce_is_idempotent(data in transactions()) {
        let (_, mut bag) = build(&data);
        bag.sort(apriori::tract::bag::SortDirection::Ascending, true);
        let once = bag.reduce();
        let weight: Support = bag.iter().map(|t| t.weight).sum();
        prop_assert_eq!(bag.reduce(), once);
        prop_assert_eq!(weight, data.len() as Support);
    }
}
