use engram_tokens::TokenCounter;
use proptest::prelude::*;

proptest! {
    #[test]
    fn count_is_bounded(s in ".{0,400}") {
        let counter = TokenCounter::default();
        let count = counter.count(&s);
        prop_assert!(count <= s.chars().count() * 2 + 10);
    }

    #[test]
    fn cached_equals_uncached(s in ".{0,200}") {
        let counter = TokenCounter::default();
        prop_assert_eq!(counter.count(&s), counter.count_cached(&s));
    }

    #[test]
    fn subadditivity(a in ".{0,100}", b in ".{0,100}") {
        let counter = TokenCounter::default();
        let combined = format!("{}{}", a, b);
        let count_a = counter.count(&a);
        let count_b = counter.count(&b);
        let count_combined = counter.count(&combined);
        prop_assert!(
            count_combined <= count_a + count_b + 1,
            "subadditivity: {} <= {} + {} + 1",
            count_combined, count_a, count_b
        );
    }
}
