//! Statistical check of the weighted draw.
//!
//! A key with known integer weights is sampled many times and the observed
//! frequencies are compared against the expected multinomial distribution
//! with a chi-squared goodness-of-fit test.

use clyde_chain::{Chain, Prefix, SuffixCounts};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

fn weighted_chain() -> Chain {
    let mut table = HashMap::new();
    table.insert(
        "x".to_string(),
        SuffixCounts::from([
            ("a".to_string(), 1),
            ("b".to_string(), 2),
            ("c".to_string(), 3),
            ("d".to_string(), 4),
        ]),
    );
    Chain::from_table(table, 1).unwrap()
}

#[test]
fn weighted_sampling_matches_multinomial() {
    let chain = weighted_chain();
    let prefix = Prefix::from_words(&["x"], 1);
    let mut rng = StdRng::seed_from_u64(2016);

    const TRIALS: usize = 40_000;
    let mut observed: HashMap<String, usize> = HashMap::new();
    for _ in 0..TRIALS {
        let word = chain.next_word(&prefix, &mut rng).unwrap();
        *observed.entry(word.to_string()).or_insert(0) += 1;
    }

    let weights = [("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)];
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    let chi2: f64 = weights
        .iter()
        .map(|(word, w)| {
            let expected = TRIALS as f64 * w / total;
            let got = *observed.get(*word).unwrap_or(&0) as f64;
            (got - expected).powi(2) / expected
        })
        .sum();

    // 3 degrees of freedom; p = 0.001 critical value is 16.27
    assert!(chi2 < 16.27, "chi-squared {} too large: {:?}", chi2, observed);
}

#[test]
fn sampling_is_reproducible_for_a_seed() {
    let chain = weighted_chain();
    let prefix = Prefix::from_words(&["x"], 1);

    let draw = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..50)
            .map(|_| chain.next_word(&prefix, &mut rng).unwrap().to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(draw(9), draw(9));
}

#[test]
fn single_candidate_always_wins() {
    let mut chain = Chain::new(2);
    chain.train("alpha beta gamma");
    let prefix = Prefix::from_words(&["alpha", "beta"], 2);
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..100 {
        assert_eq!(chain.next_word(&prefix, &mut rng), Some("gamma"));
    }
}
