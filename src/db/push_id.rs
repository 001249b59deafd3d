//! Chronologically ordered push keys
//!
//! A key is 20 characters: 8 encode the millisecond timestamp, 12 are
//! random. Keys generated within the same millisecond reuse the previous
//! random part incremented by one, so one generator never yields keys out
//! of order.

use rand::Rng;
use std::sync::Mutex;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIMESTAMP_LEN: usize = 8;
const RANDOM_LEN: usize = 12;

#[derive(Debug, Default)]
struct State {
    last_millis: i64,
    last_random: [u8; RANDOM_LEN],
}

#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<State>,
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        self.next_id_at(now, &mut rand::thread_rng())
    }

    pub fn next_id_at<R: Rng>(&self, millis: i64, rng: &mut R) -> String {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if millis == state.last_millis {
            increment(&mut state.last_random);
        } else {
            for digit in state.last_random.iter_mut() {
                *digit = rng.gen_range(0..64);
            }
        }
        state.last_millis = millis;

        let mut id = String::with_capacity(TIMESTAMP_LEN + RANDOM_LEN);
        let mut remaining = millis.max(0) as u64;
        let mut stamp = [0u8; TIMESTAMP_LEN];
        for slot in stamp.iter_mut().rev() {
            *slot = PUSH_CHARS[(remaining % 64) as usize];
            remaining /= 64;
        }
        id.extend(stamp.iter().map(|&c| c as char));
        id.extend(state.last_random.iter().map(|&d| PUSH_CHARS[d as usize] as char));
        id
    }
}

fn increment(digits: &mut [u8; RANDOM_LEN]) {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}
