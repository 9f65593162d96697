use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// Bounded signal history (oldest at index 0)
// ---------------------------------------------------------------------------

/// Fixed-capacity, chronologically ordered sample buffer.
///
/// Pushing past capacity drops samples from the front. Reads on an empty
/// buffer return 0.0.
#[derive(Debug, Clone)]
pub struct SignalHistory {
    samples: VecDeque<f64>,
    max_len: usize,
}

impl SignalHistory {
    pub fn new(max_len: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_len + 1),
            max_len,
        }
    }

    pub fn push(&mut self, sample: f64) {
        self.samples.push_back(sample);
        self.trim();
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Change the capacity; excess samples are dropped oldest-first.
    pub fn set_max_len(&mut self, max_len: usize) {
        self.max_len = max_len;
        self.trim();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample, 0.0 when empty.
    pub fn last(&self) -> f64 {
        self.samples.back().copied().unwrap_or(0.0)
    }

    /// Sample before the most recent one, 0.0 when absent.
    pub fn second_last(&self) -> f64 {
        let n = self.samples.len();
        if n < 2 {
            0.0
        } else {
            self.samples[n - 2]
        }
    }

    pub fn get(&self, idx: usize) -> Option<f64> {
        self.samples.get(idx).copied()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = f64> + ExactSizeIterator + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }

    fn trim(&mut self) {
        while self.samples.len() > self.max_len {
            self.samples.pop_front();
        }
    }
}
