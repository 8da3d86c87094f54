//! Rolling window of classification outcomes.

/// Fixed-capacity circular buffer of "was this result unknown?" samples.
#[derive(Debug, Clone)]
pub struct ErrorWindow {
    samples: Vec<bool>,
    position: usize,
}

impl ErrorWindow {
    /// Create a window of `denominator` samples, all initially successful.
    pub fn new(denominator: usize) -> Self {
        Self {
            samples: vec![false; denominator.max(1)],
            position: 0,
        }
    }

    /// Overwrite the oldest sample.
    pub fn record(&mut self, unknown: bool) {
        self.samples[self.position] = unknown;
        self.position = (self.position + 1) % self.samples.len();
    }

    /// Number of unknown samples in the window.
    pub fn unknowns(&self) -> usize {
        self.samples.iter().filter(|&&unknown| unknown).count()
    }

    pub fn denominator(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_overwrites_oldest() {
        let mut window = ErrorWindow::new(3);
        window.record(true);
        window.record(true);
        window.record(false);
        assert_eq!(window.unknowns(), 2);

        // overwrites the first `true`
        window.record(false);
        assert_eq!(window.unknowns(), 1);
        window.record(false);
        assert_eq!(window.unknowns(), 0);
        assert_eq!(window.denominator(), 3);
    }
}
