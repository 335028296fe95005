//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: n changes need n + 1 closes, so the output has `len - n` values.

pub fn rsi(closes: &[f64], period: usize) -> RsiIter<'_> {
    RsiIter {
        closes,
        period,
        next_change: 1,
        avg_gain: 0.0,
        avg_loss: 0.0,
    }
}

/// Lazy Wilder RSI over a close slice.
#[derive(Debug, Clone)]
pub struct RsiIter<'a> {
    closes: &'a [f64],
    period: usize,
    /// Index of the close whose change is consumed next.
    next_change: usize,
    avg_gain: f64,
    avg_loss: f64,
}

impl RsiIter<'_> {
    fn change(&self, i: usize) -> (f64, f64) {
        let change = self.closes[i] - self.closes[i - 1];
        if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, -change)
        }
    }

    fn value(&self) -> f64 {
        if self.avg_loss == 0.0 {
            100.0
        } else {
            100.0 - (100.0 / (1.0 + self.avg_gain / self.avg_loss))
        }
    }
}

impl Iterator for RsiIter<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.period == 0 || self.next_change >= self.closes.len() {
            return None;
        }

        if self.next_change == 1 {
            // Seed: simple averages over the first `period` changes.
            if self.closes.len() <= self.period {
                self.next_change = self.closes.len();
                return None;
            }
            let (mut gain_sum, mut loss_sum) = (0.0, 0.0);
            for i in 1..=self.period {
                let (gain, loss) = self.change(i);
                gain_sum += gain;
                loss_sum += loss;
            }
            self.avg_gain = gain_sum / self.period as f64;
            self.avg_loss = loss_sum / self.period as f64;
            self.next_change = self.period + 1;
            return Some(self.value());
        }

        let (gain, loss) = self.change(self.next_change);
        let n = self.period as f64;
        self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
        self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
        self.next_change += 1;
        Some(self.value())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.period == 0 || self.closes.len() <= self.period {
            0
        } else if self.next_change == 1 {
            self.closes.len() - self.period
        } else {
            self.closes.len().saturating_sub(self.next_change)
        };
        (remaining, Some(remaining))
    }
}
