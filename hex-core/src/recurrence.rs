//! Randomized re-arming timers for recurring jobs.
//!
//! Timers are polled by their owner with the current time; nothing here
//! sleeps or spawns threads.

use rand::Rng;

use crate::config::RecurrenceOptions;

/// Smallest delay ever scheduled, in milliseconds.
pub const MIN_DELAY_MS: f64 = 1.0;

/// Draws the delay until the next occurrence: the average plus a uniform
/// deviation in `[-range/2, range/2]`, never below [`MIN_DELAY_MS`].
pub fn next_delay_ms<R: Rng + ?Sized>(options: &RecurrenceOptions, rng: &mut R) -> f64 {
    let half = options.delay_deviation_range_ms.abs() / 2.0;
    let deviation = if half > 0.0 {
        rng.random_range(-half..=half)
    } else {
        0.0
    };
    (options.avg_delay_ms + deviation).max(MIN_DELAY_MS)
}

/// One-shot deadlines keyed by `K`, in seconds on the caller's clock.
#[derive(Clone, Debug)]
pub struct Timers<K> {
    deadlines: Vec<(K, f64)>,
}

impl<K> Default for Timers<K> {
    fn default() -> Self {
        Self {
            deadlines: Vec::new(),
        }
    }
}

impl<K: Copy + PartialEq> Timers<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `key` to fire `delay_ms` after `now`, replacing any pending
    /// deadline for the same key.
    pub fn schedule(&mut self, key: K, now: f64, delay_ms: f64) {
        self.cancel(key);
        self.deadlines.push((key, now + delay_ms / 1000.0));
    }

    /// Removes and returns every key whose deadline is at or before `now`,
    /// earliest first.
    pub fn poll(&mut self, now: f64) -> Vec<K> {
        let mut due: Vec<(K, f64)> = Vec::new();
        self.deadlines.retain(|&(key, at)| {
            if at <= now {
                due.push((key, at));
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.1.total_cmp(&b.1));
        due.into_iter().map(|(key, _)| key).collect()
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.deadlines
            .iter()
            .map(|&(_, at)| at)
            .min_by(f64::total_cmp)
    }

    pub fn is_scheduled(&self, key: K) -> bool {
        self.deadlines.iter().any(|&(k, _)| k == key)
    }

    pub fn cancel(&mut self, key: K) {
        self.deadlines.retain(|&(k, _)| k != key);
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn delays_never_drop_below_the_minimum() {
        let mut rng = StdRng::seed_from_u64(11);
        let options = RecurrenceOptions {
            enabled: true,
            avg_delay_ms: 100.0,
            delay_deviation_range_ms: 300.0,
        };
        let mut saw_clamped = false;
        for _ in 0..1000 {
            let delay = next_delay_ms(&options, &mut rng);
            assert!((MIN_DELAY_MS..=250.0).contains(&delay), "delay {delay}");
            saw_clamped |= delay == MIN_DELAY_MS;
        }
        assert!(saw_clamped);
    }

    #[test]
    fn negative_range_behaves_like_its_magnitude() {
        let mut rng = StdRng::seed_from_u64(5);
        let options = RecurrenceOptions {
            enabled: true,
            avg_delay_ms: 1000.0,
            delay_deviation_range_ms: -200.0,
        };
        for _ in 0..200 {
            let delay = next_delay_ms(&options, &mut rng);
            assert!((900.0..=1100.0).contains(&delay));
        }
    }

    #[test]
    fn zero_range_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(0);
        let options = RecurrenceOptions {
            enabled: true,
            avg_delay_ms: 40.0,
            delay_deviation_range_ms: 0.0,
        };
        assert_eq!(next_delay_ms(&options, &mut rng), 40.0);
    }

    #[test]
    fn timers_fire_once_in_deadline_order() {
        let mut timers = Timers::new();
        timers.schedule('a', 0.0, 500.0);
        timers.schedule('b', 0.0, 200.0);
        timers.schedule('c', 0.0, 5000.0);
        assert_eq!(timers.next_deadline(), Some(0.2));
        assert!(timers.poll(0.1).is_empty());
        assert_eq!(timers.poll(1.0), vec!['b', 'a']);
        assert!(timers.poll(1.0).is_empty());
        assert!(timers.is_scheduled('c'));
    }

    #[test]
    fn rescheduling_replaces_the_pending_deadline() {
        let mut timers = Timers::new();
        timers.schedule(1u8, 0.0, 100.0);
        timers.schedule(1u8, 0.0, 900.0);
        assert_eq!(timers.len(), 1);
        assert!(timers.poll(0.5).is_empty());
        timers.cancel(1);
        assert!(timers.is_empty());
        assert_eq!(timers.next_deadline(), None);
    }
}
