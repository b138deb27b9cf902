/// The random stream every probabilistic decision draws from.
///
/// Rule evaluation consumes numbers in a fixed order, so a given seed
/// replays a run exactly.
pub trait RandomSource {
    fn seed(&mut self, seed: u64);

    fn next_u64(&mut self) -> u64;

    /// Uniform integer in `lo..=hi` (bounds may be given in either order).
    fn range(&mut self, lo: i32, hi: i32) -> i32 {
        if lo == hi {
            return lo;
        }
        let (lo, hi) = if lo > hi { (hi, lo) } else { (lo, hi) };
        let span = (i64::from(hi) - i64::from(lo) + 1) as u64;
        (i64::from(lo) + (self.next_u64() % span) as i64) as i32
    }

    /// One draw in 1..=10000 against `percent` with two decimal places.
    fn percent_roll(&mut self, percent: f64) -> bool {
        f64::from(self.range(1, 10000)) <= 100.0 * percent
    }
}

const M: i64 = 2_147_483_647;
const Q: i64 = 127_773;
const A: i64 = 16_807;
const R: i64 = 2_836;

/// Park-Miller minimal standard generator (Schrage's method).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkMiller {
    state: i64,
}

impl ParkMiller {
    pub fn new(seed: u64) -> Self {
        let mut rng = Self { state: 1 };
        RandomSource::seed(&mut rng, seed);
        rng
    }

    /// Advance and return the next value in `1..M`.
    pub fn step(&mut self) -> u32 {
        let hi = self.state / Q;
        let lo = self.state % Q;
        let test = A * lo - R * hi;
        self.state = if test > 0 { test } else { test + M };
        self.state as u32
    }
}

impl RandomSource for ParkMiller {
    fn seed(&mut self, seed: u64) {
        // zero is a fixed point of the recurrence
        let state = (seed % M as u64) as i64;
        self.state = if state == 0 { 1 } else { state };
    }

    fn next_u64(&mut self) -> u64 {
        u64::from(self.step())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_minimal_standard_sequence() {
        // seed 1 -> 16807, 282475249, 1622650073, ...
        let mut rng = ParkMiller::new(1);
        assert_eq!(rng.step(), 16_807);
        assert_eq!(rng.step(), 282_475_249);
        assert_eq!(rng.step(), 1_622_650_073);
        assert_eq!(rng.step(), 984_943_658);
    }

    #[test]
    fn ten_thousandth_value_from_seed_one() {
        let mut rng = ParkMiller::new(1);
        let mut last = 0;
        for _ in 0..10_000 {
            last = rng.step();
        }
        assert_eq!(last, 1_043_618_065);
    }

    #[test]
    fn zero_seed_does_not_stall() {
        let mut rng = ParkMiller::new(0);
        assert_ne!(rng.step(), 0);
        let mut rng = ParkMiller::new(M as u64);
        assert_eq!(rng.step(), 16_807);
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = ParkMiller::new(1_700_000_000);
        let mut b = ParkMiller::new(1_700_000_000);
        for _ in 0..100 {
            assert_eq!(a.range(1, 10000), b.range(1, 10000));
        }
    }

    #[test]
    fn reseeding_restarts_the_stream() {
        let mut rng = ParkMiller::new(42);
        let first: Vec<u64> = (0..5).map(|_| RandomSource::next_u64(&mut rng)).collect();
        RandomSource::seed(&mut rng, 42);
        let again: Vec<u64> = (0..5).map(|_| RandomSource::next_u64(&mut rng)).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn range_stays_in_bounds_and_accepts_reversed_bounds() {
        let mut rng = ParkMiller::new(7);
        for _ in 0..1000 {
            let v = rng.range(1, 6);
            assert!((1..=6).contains(&v));
            let v = rng.range(6, 1);
            assert!((1..=6).contains(&v));
        }
        assert_eq!(rng.range(3, 3), 3);
    }

    #[test]
    fn range_equal_bounds_draws_nothing() {
        let mut a = ParkMiller::new(9);
        let mut b = ParkMiller::new(9);
        a.range(5, 5);
        assert_eq!(a.step(), b.step());
    }

    #[test]
    fn range_is_modulo_of_next_value() {
        let mut rng = ParkMiller::new(1);
        // 16807 % 2 + 0
        assert_eq!(rng.range(0, 1), 1);
        // 282475249 % 10000 + 1
        assert_eq!(rng.range(1, 10000), 5250);
    }

    #[test]
    fn percent_roll_boundaries() {
        let mut rng = ParkMiller::new(12345);
        for _ in 0..2000 {
            assert!(rng.percent_roll(100.0));
            assert!(!rng.percent_roll(0.0));
        }
    }

    #[test]
    fn percent_roll_rate_is_roughly_right() {
        let mut rng = ParkMiller::new(99);
        let hits = (0..20_000).filter(|_| rng.percent_roll(25.0)).count();
        assert!((4_000..6_000).contains(&hits), "hits = {}", hits);
    }
}
