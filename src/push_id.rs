/// Chronological push ids.
///
/// A push id is 20 characters: 8 encode the creation time in milliseconds,
/// 12 are random. Ids sort lexicographically in creation order, including ids
/// created within the same millisecond by the same generator.
use chrono::Utc;
use rand::Rng;
use std::sync::Mutex;

/// Alphabet of push ids, in ascending ASCII order.
pub const PUSH_CHARS: &[u8; 64] =
    b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

/// Length of a push id.
pub const PUSH_ID_LEN: usize = TIME_CHARS + RANDOM_CHARS;

#[derive(Debug, Default)]
struct GeneratorState {
    last_time: i64,
    last_random: [u8; RANDOM_CHARS],
}

/// Generates push ids. Thread-safe.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<GeneratorState>,
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate an id for the current time.
    pub fn next_id(&self) -> String {
        self.next_id_at(Utc::now().timestamp_millis())
    }

    /// Generate an id for `millis` since the epoch.
    pub fn next_id_at(&self, millis: i64) -> String {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let duplicate = millis == state.last_time;
        state.last_time = millis;

        if duplicate {
            increment(&mut state.last_random);
        } else {
            let mut rng = rand::thread_rng();
            for slot in state.last_random.iter_mut() {
                *slot = rng.gen_range(0..64);
            }
        }

        let mut id = String::with_capacity(PUSH_ID_LEN);
        let mut time = millis.max(0);
        let mut time_chars = [0u8; TIME_CHARS];
        for slot in time_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[(time % 64) as usize];
            time /= 64;
        }
        id.extend(time_chars.iter().map(|&c| c as char));
        id.extend(
            state
                .last_random
                .iter()
                .map(|&i| PUSH_CHARS[i as usize] as char),
        );
        id
    }
}

/// Add one to a base-64 digit string, carrying leftwards.
fn increment(digits: &mut [u8; RANDOM_CHARS]) {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_id_shape() {
        let id = PushIdGenerator::new().next_id();
        assert_eq!(id.len(), PUSH_ID_LEN);
        assert!(id.bytes().all(|b| PUSH_CHARS.contains(&b)));
    }

    #[test]
    fn test_push_ids_are_ordered_across_time() {
        let generator = PushIdGenerator::new();
        let first = generator.next_id_at(1_000);
        let second = generator.next_id_at(2_000);
        assert!(first < second);
        assert_ne!(first[..8], second[..8]);
    }

    #[test]
    fn test_push_ids_are_ordered_within_a_millisecond() {
        let generator = PushIdGenerator::new();
        let ids: Vec<String> = (0..100).map(|_| generator.next_id_at(5_000)).collect();

        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
            assert_eq!(pair[0][..8], pair[1][..8]);
        }
    }

    #[test]
    fn test_increment_carries() {
        let mut digits = [0u8; RANDOM_CHARS];
        digits[RANDOM_CHARS - 1] = 63;
        increment(&mut digits);
        assert_eq!(digits[RANDOM_CHARS - 1], 0);
        assert_eq!(digits[RANDOM_CHARS - 2], 1);
    }
}
