//! Simple Moving Average.
//!
//! SMA[i] = mean(C[i..i+n]). One value per full window, so the output has
//! `len - n + 1` values and is empty when fewer than `n` closes are given.

pub fn sma(closes: &[f64], period: usize) -> impl Iterator<Item = f64> + '_ {
    // `windows(0)` panics, so a zero period gets an empty window source.
    let source: &[f64] = if period == 0 { &[] } else { closes };
    source
        .windows(period.max(1))
        .map(move |window| window.iter().sum::<f64>() / period as f64)
}
