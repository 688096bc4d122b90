use crate::models::StatisticsSnapshot;

// Above 2^52 an f64 has no fractional bits left to round.
const NO_FRACTION_THRESHOLD: f64 = 4_503_599_627_370_496.0;

/// Rounds to two decimals, ties to even. Non-finite and very large values
/// come back unchanged.
pub(crate) fn round2(value: f64) -> f64 {
    if !value.is_finite() || value.abs() >= NO_FRACTION_THRESHOLD {
        return value;
    }
    (value * 100.0).round_ties_even() / 100.0
}

/// Online min/max/sum/count over the price measure.
///
/// Values are folded in as they arrive and nothing is retained, so an update
/// costs O(1). Every numeric input is accepted, including NaN and negatives.
///
/// The sum carries a Neumaier compensation term, stepped the same way SQLite
/// steps `SUM`/`AVG` over REAL columns, so the running average agrees with
/// the one recomputed from the fact table.
#[derive(Debug, Clone)]
pub struct StatisticsAccumulator {
    min_value: f64,
    max_value: f64,
    total_sum: f64,
    sum_error: f64,
    record_count: u64,
}

impl Default for StatisticsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsAccumulator {
    pub fn new() -> Self {
        Self {
            min_value: f64::INFINITY,
            max_value: f64::NEG_INFINITY,
            total_sum: 0.0,
            sum_error: 0.0,
            record_count: 0,
        }
    }

    pub fn update(&mut self, value: f64) {
        self.min_value = self.min_value.min(value);
        self.max_value = self.max_value.max(value);

        let sum = self.total_sum;
        let next = sum + value;
        if sum.abs() > value.abs() {
            self.sum_error += (sum - next) + value;
        } else {
            self.sum_error += (value - next) + sum;
        }
        self.total_sum = next;
        self.record_count += 1;
    }

    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Compensated sum of every value seen. An overflowed (NaN) error term is ignored.
    pub fn sum(&self) -> f64 {
        if self.sum_error.is_nan() {
            self.total_sum
        } else {
            self.total_sum + self.sum_error
        }
    }

    /// Returns `None` for min, max and average until at least one value was seen.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        if self.record_count == 0 {
            return StatisticsSnapshot::default();
        }
        StatisticsSnapshot {
            min: Some(round2(self.min_value)),
            max: Some(round2(self.max_value)),
            average: Some(round2(self.sum() / self.record_count as f64)),
            record_count: self.record_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_accumulator_has_no_data() {
        let stats = StatisticsAccumulator::new();
        assert_eq!(
            stats.snapshot(),
            StatisticsSnapshot {
                min: None,
                max: None,
                average: None,
                record_count: 0
            }
        );
    }

    #[test]
    fn zero_valued_data_is_not_empty() {
        let mut stats = StatisticsAccumulator::new();
        stats.update(0.0);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.min, Some(0.0));
        assert_eq!(snapshot.average, Some(0.0));
        assert_eq!(snapshot.record_count, 1);
    }

    #[test]
    fn tracks_extremes_and_average() {
        let mut stats = StatisticsAccumulator::new();
        for value in [10.0, 30.0, 20.0] {
            stats.update(value);
        }
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.min, Some(10.0));
        assert_eq!(snapshot.max, Some(30.0));
        assert_eq!(snapshot.average, Some(20.0));
        assert_eq!(snapshot.record_count, 3);
    }

    #[test]
    fn rounds_to_two_decimals() {
        let mut stats = StatisticsAccumulator::new();
        for value in [1.0, 2.0, 2.0] {
            stats.update(value);
        }
        assert_eq!(stats.snapshot().average, Some(1.67));

        let mut stats = StatisticsAccumulator::new();
        stats.update(3.14159);
        assert_eq!(stats.snapshot().min, Some(3.14));
    }

    #[test]
    fn ties_round_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(-0.125), -0.12);
    }

    #[test]
    fn huge_values_are_not_rounded_into_overflow() {
        let mut stats = StatisticsAccumulator::new();
        stats.update(1.0e307);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.min, Some(1.0e307));
        assert_eq!(snapshot.max, Some(1.0e307));
        assert_eq!(snapshot.average, Some(1.0e307));
        assert_eq!(round2(f64::INFINITY), f64::INFINITY);
        assert_eq!(round2(-1.0e300), -1.0e300);
    }

    #[test]
    fn compensated_sum_keeps_small_terms() {
        let mut stats = StatisticsAccumulator::new();
        for value in [1.0e16, 1.0, -1.0e16] {
            stats.update(value);
        }
        assert_eq!(stats.sum(), 1.0);
    }

    #[test]
    fn negative_values_are_accepted() {
        let mut stats = StatisticsAccumulator::new();
        stats.update(-5.0);
        stats.update(5.0);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.min, Some(-5.0));
        assert_eq!(snapshot.average, Some(0.0));
    }
}
