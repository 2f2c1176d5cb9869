use engram_fingerprint::FingerprintClassifier;
use proptest::prelude::*;

proptest! {
    /// The guard is structural: a fingerprint is only ever emitted
    /// together with a passing value signature.
    #[test]
    fn fingerprint_implies_signature(s in ".{0,300}") {
        let classifier = FingerprintClassifier::new();
        let decision = classifier.classify(&s);
        if decision.fingerprint.is_some() {
            prop_assert!(decision.value_signature);
        }
    }

    #[test]
    fn confidence_stays_in_unit_interval(s in ".{0,300}") {
        let classifier = FingerprintClassifier::new();
        let decision = classifier.classify(&s);
        prop_assert!((0.0..=1.0).contains(&decision.confidence));
    }

    /// The deterministic pass handles arbitrary unicode without
    /// panicking or emitting out-of-set keys.
    #[test]
    fn emitted_keys_come_from_the_closed_set(s in "\\PC{0,200}") {
        let classifier = FingerprintClassifier::new();
        let decision = classifier.classify(&s);
        if let Some(fp) = &decision.fingerprint {
            prop_assert!(engram_fingerprint::known_fingerprints().contains(&fp.as_str()));
        }
    }
}
