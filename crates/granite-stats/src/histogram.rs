//! Fixed-width histograms over a single column's value domain.
//!
//! [`IntHistogram`] is the workhorse: `buckets` equal-width ranges over
//! `[min, max]`, O(1) ingest, O(buckets) estimation, space independent of the
//! number of values seen. [`StringHistogram`] reuses it over an integer
//! encoding of 4-byte string prefixes.

use serde::{Deserialize, Serialize};

use granite_types::PredicateOp;

/// Fixed-width frequency histogram over an integer domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntHistogram {
    buckets: usize,
    min: i64,
    max: i64,
    width: i64,
    counts: Vec<u64>,
    total: u64,
}

impl IntHistogram {
    /// Create a histogram with `buckets` buckets over the inclusive domain
    /// `[min, max]`.
    ///
    /// Bucket width is `max(1, (max − min + 1) / buckets)`; with a domain
    /// narrower than the bucket count, trailing buckets simply stay empty.
    ///
    /// # Panics
    ///
    /// Panics if `buckets` is 0 or `min > max`.
    #[must_use]
    pub fn new(buckets: usize, min: i64, max: i64) -> Self {
        assert!(buckets > 0, "histogram needs at least one bucket");
        assert!(min <= max, "inverted histogram domain");
        let span = i128::from(max) - i128::from(min) + 1;
        let width = i64::try_from((span / buckets as i128).max(1)).unwrap_or(i64::MAX);
        Self {
            buckets,
            min,
            max,
            width,
            counts: vec![0; buckets],
            total: 0,
        }
    }

    /// Record one occurrence of `v`.
    ///
    /// `v` must lie in `[min, max]`. O(1); the value itself is not retained.
    pub fn add_value(&mut self, v: i64) {
        let i = self.bucket_index(v);
        self.counts[i] += 1;
        self.total += 1;
    }

    /// Estimated fraction of recorded values satisfying `value op v`,
    /// in `[0, 1]`.
    ///
    /// Inside the domain the estimate assumes values are uniformly spread
    /// within each bucket: the probe's bucket contributes its average
    /// per-unit density (for `=`) or the linearly interpolated portion lying
    /// on the probe's side (for ranges), and every bucket fully on that side
    /// contributes its whole mass.
    #[must_use]
    pub fn estimate_selectivity(&self, op: PredicateOp, v: i64) -> f64 {
        use PredicateOp::{
            Equals, GreaterThan, GreaterThanOrEq, LessThan, LessThanOrEq, NotEquals,
        };

        if v > self.max {
            return match op {
                GreaterThan | GreaterThanOrEq | Equals => 0.0,
                _ => 1.0,
            };
        }
        if v < self.min {
            return match op {
                LessThan | LessThanOrEq | Equals => 0.0,
                _ => 1.0,
            };
        }
        if self.total == 0 {
            // No recorded mass: every predicate selects nothing.
            return 0.0;
        }

        let i = self.bucket_index(v);
        let height = self.counts[i] as f64;
        let width = self.width as f64;
        let total = self.total as f64;

        // Average per-unit density of the probe's bucket, read as the
        // probability mass at the single value v.
        let mut selectivity = match op {
            Equals | NotEquals | LessThanOrEq | GreaterThanOrEq => (height / width) / total,
            LessThan | GreaterThan => 0.0,
        };

        match op {
            Equals => {}
            NotEquals => selectivity = 1.0 - selectivity,
            GreaterThan | GreaterThanOrEq => {
                let fraction = height / total;
                let right_edge =
                    i128::from(self.min) + (i as i128 + 1) * i128::from(self.width) - 1;
                // The last bucket absorbs the domain remainder, so v can sit
                // past the nominal right edge; clamp the interpolated share.
                let part = ((right_edge - i128::from(v)) as f64 / width).clamp(0.0, 1.0);
                selectivity += fraction * part;
                for j in (i + 1)..self.buckets {
                    selectivity += self.counts[j] as f64 / total;
                }
            }
            LessThan | LessThanOrEq => {
                let fraction = height / total;
                let left_edge = i128::from(self.min) + i as i128 * i128::from(self.width);
                let part = ((i128::from(v) - left_edge) as f64 / width).clamp(0.0, 1.0);
                selectivity += fraction * part;
                for j in 0..i {
                    selectivity += self.counts[j] as f64 / total;
                }
            }
        }

        selectivity
    }

    /// Total number of values recorded.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Bucket width in domain units.
    #[must_use]
    pub fn bucket_width(&self) -> i64 {
        self.width
    }

    fn bucket_index(&self, v: i64) -> usize {
        debug_assert!(
            v >= self.min && v <= self.max,
            "value {v} outside histogram domain [{}, {}]",
            self.min,
            self.max
        );
        let offset = (i128::from(v) - i128::from(self.min)) / i128::from(self.width);
        (offset as usize).min(self.buckets - 1)
    }
}

// ---------------------------------------------------------------------------
// StringHistogram
// ---------------------------------------------------------------------------

/// Fixed-width histogram over string values.
///
/// Strings are folded to an integer by packing the first four bytes
/// big-endian, with `""` at the domain minimum and `"zzzz"` at the maximum;
/// anything outside that range (e.g. uppercase-heavy or non-ASCII prefixes)
/// clamps to the nearest edge. Strings sharing a 4-byte prefix collapse to
/// the same point, which is the precision this estimator trades for bounded
/// space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringHistogram {
    hist: IntHistogram,
}

impl StringHistogram {
    /// Encoding of `""`, the domain minimum.
    const MIN_VAL: i64 = 0;
    /// Encoding of `"zzzz"`, the domain maximum.
    const MAX_VAL: i64 = 0x7A7A_7A7A;

    /// Create a string histogram with `buckets` buckets.
    #[must_use]
    pub fn new(buckets: usize) -> Self {
        Self {
            hist: IntHistogram::new(buckets, Self::MIN_VAL, Self::MAX_VAL),
        }
    }

    /// Record one occurrence of `s`.
    pub fn add_value(&mut self, s: &str) {
        self.hist.add_value(Self::string_to_int(s));
    }

    /// Estimated fraction of recorded strings satisfying `value op s`.
    #[must_use]
    pub fn estimate_selectivity(&self, op: PredicateOp, s: &str) -> f64 {
        self.hist.estimate_selectivity(op, Self::string_to_int(s))
    }

    /// Total number of strings recorded.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.hist.total()
    }

    fn string_to_int(s: &str) -> i64 {
        let bytes = s.as_bytes();
        let mut v: i64 = 0;
        for (pos, shift) in (0..4).zip([24, 16, 8, 0]) {
            if let Some(&b) = bytes.get(pos) {
                v += i64::from(b) << shift;
            }
        }
        // Order-preserving only inside ["", "zzzz"]; clamp the rest so every
        // probe lands in the histogram domain.
        if !(s.is_empty() || s == "zzzz") {
            v = v.clamp(Self::MIN_VAL, Self::MAX_VAL);
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    /// 10 buckets over 0..=99, each integer inserted once: bucket width 10,
    /// every bucket count 10.
    fn uniform_100() -> IntHistogram {
        let mut h = IntHistogram::new(10, 0, 99);
        for v in 0..100 {
            h.add_value(v);
        }
        h
    }

    #[test]
    fn uniform_equality_probe() {
        let h = uniform_100();
        assert_eq!(h.bucket_width(), 10);
        // (10 / 10) / 100
        assert!((h.estimate_selectivity(PredicateOp::Equals, 50) - 0.01).abs() < EPS);
    }

    #[test]
    fn uniform_greater_than_interpolates() {
        let h = uniform_100();
        // Bucket 5 covers 50..=59: partial term (10/100) * (59 - 55)/10
        // = 0.04, buckets 6..=9 contribute 40/100 = 0.4.
        let sel = h.estimate_selectivity(PredicateOp::GreaterThan, 55);
        assert!((sel - 0.44).abs() < EPS, "got {sel}");
    }

    #[test]
    fn uniform_less_than_mirrors() {
        let h = uniform_100();
        // Bucket 5 left edge 50: partial (10/100) * (55 - 50)/10 = 0.05,
        // plus buckets 0..=4 = 0.5.
        let sel = h.estimate_selectivity(PredicateOp::LessThan, 55);
        assert!((sel - 0.55).abs() < EPS, "got {sel}");
    }

    #[test]
    fn boundary_laws() {
        let h = uniform_100();
        assert_eq!(h.estimate_selectivity(PredicateOp::GreaterThan, 99), 0.0);
        assert!((h.estimate_selectivity(PredicateOp::LessThanOrEq, 99) - 1.0).abs() < 1e-6);
        assert_eq!(h.estimate_selectivity(PredicateOp::LessThan, 0), 0.0);
    }

    #[test]
    fn out_of_domain_fast_paths() {
        let h = uniform_100();
        assert_eq!(h.estimate_selectivity(PredicateOp::Equals, 200), 0.0);
        assert_eq!(h.estimate_selectivity(PredicateOp::GreaterThan, 200), 0.0);
        assert_eq!(h.estimate_selectivity(PredicateOp::LessThan, 200), 1.0);
        assert_eq!(h.estimate_selectivity(PredicateOp::NotEquals, 200), 1.0);
        assert_eq!(h.estimate_selectivity(PredicateOp::Equals, -5), 0.0);
        assert_eq!(h.estimate_selectivity(PredicateOp::GreaterThanOrEq, -5), 1.0);
    }

    #[test]
    fn narrow_domain_clamps_width_to_one() {
        let mut h = IntHistogram::new(100, 0, 9);
        for v in 0..10 {
            h.add_value(v);
        }
        assert_eq!(h.bucket_width(), 1);
        // Exactly one value per occupied bucket.
        assert!((h.estimate_selectivity(PredicateOp::Equals, 3) - 0.1).abs() < EPS);
    }

    #[test]
    fn skewed_mass_lands_in_one_bucket() {
        let mut h = IntHistogram::new(10, 0, 99);
        for _ in 0..1000 {
            h.add_value(42);
        }
        assert_eq!(h.total(), 1000);
        // All mass in bucket 4: equality probe sees density 1000/10/1000.
        assert!((h.estimate_selectivity(PredicateOp::Equals, 42) - 0.1).abs() < EPS);
        // Probing an empty bucket sees nothing.
        assert!((h.estimate_selectivity(PredicateOp::Equals, 90)).abs() < EPS);
    }

    #[test]
    fn empty_histogram_estimates_zero_in_domain() {
        let h = IntHistogram::new(10, 0, 99);
        assert_eq!(h.estimate_selectivity(PredicateOp::Equals, 50), 0.0);
        assert_eq!(h.estimate_selectivity(PredicateOp::GreaterThan, 50), 0.0);
    }

    #[test]
    fn last_bucket_absorbs_domain_remainder() {
        // Domain of 105 values over 10 buckets: width 10, values 100..=104
        // spill into the last bucket by the index clamp.
        let mut h = IntHistogram::new(10, 0, 104);
        h.add_value(104);
        h.add_value(100);
        h.add_value(99);
        assert_eq!(h.total(), 3);
        assert!(h.estimate_selectivity(PredicateOp::Equals, 101) > 0.0);
    }

    #[test]
    fn remainder_region_probes_stay_in_range() {
        // 13 buckets over [-100, 100]: width 15, nominal coverage ends at
        // 94, so probes in 95..=100 sit past the last bucket's right edge.
        let mut h = IntHistogram::new(13, -100, 100);
        h.add_value(80);

        // All mass lies at or below the probe: exactly 1, never above.
        let below = h.estimate_selectivity(PredicateOp::LessThan, 96);
        assert_eq!(below, 1.0, "got {below}");

        // Nothing lies above the probe: exactly 0, never negative.
        let above = h.estimate_selectivity(PredicateOp::GreaterThan, 96);
        assert_eq!(above, 0.0, "got {above}");
    }

    #[test]
    fn string_encoding_fixpoints() {
        assert_eq!(StringHistogram::string_to_int(""), StringHistogram::MIN_VAL);
        assert_eq!(
            StringHistogram::string_to_int("zzzz"),
            StringHistogram::MAX_VAL
        );
        // Only the first four bytes matter.
        assert_eq!(
            StringHistogram::string_to_int("database"),
            StringHistogram::string_to_int("datastore")
        );
        assert!(StringHistogram::string_to_int("apple") < StringHistogram::string_to_int("bee"));
    }

    #[test]
    fn string_histogram_orders_prefixes() {
        let mut h = StringHistogram::new(100);
        for s in ["ant", "bat", "cow", "dog", "eel"] {
            h.add_value(s);
        }
        assert_eq!(h.total(), 5);
        let below = h.estimate_selectivity(PredicateOp::LessThan, "cat");
        let above = h.estimate_selectivity(PredicateOp::GreaterThan, "cat");
        assert!(below > 0.0);
        assert!(above > 0.0);
        assert!(below + above <= 1.0 + EPS);
    }

    proptest! {
        /// sum(counts) == total == number of add_value calls.
        #[test]
        fn mass_is_conserved(values in prop::collection::vec(-500i64..=500, 1..300)) {
            let mut h = IntHistogram::new(17, -500, 500);
            for &v in &values {
                h.add_value(v);
            }
            prop_assert_eq!(h.total(), values.len() as u64);
            prop_assert_eq!(h.counts.iter().sum::<u64>(), h.total());
        }

        /// Equals and NotEquals are complements for in-domain probes.
        #[test]
        fn complement_law(
            values in prop::collection::vec(0i64..=999, 1..200),
            probe in 0i64..=999,
        ) {
            let mut h = IntHistogram::new(25, 0, 999);
            for &v in &values {
                h.add_value(v);
            }
            let eq = h.estimate_selectivity(PredicateOp::Equals, probe);
            let ne = h.estimate_selectivity(PredicateOp::NotEquals, probe);
            prop_assert!((eq + ne - 1.0).abs() < 1e-9);
        }

        /// Every estimate is a valid fraction.
        #[test]
        fn estimates_are_fractions(
            values in prop::collection::vec(-100i64..=100, 1..100),
            probe in -150i64..=150,
            op_idx in 0usize..6,
        ) {
            let ops = [
                PredicateOp::Equals,
                PredicateOp::NotEquals,
                PredicateOp::LessThan,
                PredicateOp::LessThanOrEq,
                PredicateOp::GreaterThan,
                PredicateOp::GreaterThanOrEq,
            ];
            let mut h = IntHistogram::new(13, -100, 100);
            for &v in &values {
                h.add_value(v);
            }
            let sel = h.estimate_selectivity(ops[op_idx], probe);
            prop_assert!((0.0..=1.0 + 1e-9).contains(&sel), "sel = {}", sel);
        }
    }
}
