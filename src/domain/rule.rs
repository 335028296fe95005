//! Trend-following signal rule.
//!
//! A ticker matches when both hold on its latest bar:
//! - trend: `close > ma_short > ma_long` (strict)
//! - momentum: `rsi_lower <= rsi <= rsi_upper` (inclusive)
//!
//! Minimum history and freshness are checked by the scan before a snapshot
//! ever reaches the rule.

use crate::domain::indicator::IndicatorSnapshot;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalRule {
    pub rsi_lower: f64,
    pub rsi_upper: f64,
}

impl Default for SignalRule {
    fn default() -> Self {
        Self {
            rsi_lower: 50.0,
            rsi_upper: 70.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Match,
    NoTrend,
    MomentumOutOfBand,
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleOutcome::Match => write!(f, "match"),
            RuleOutcome::NoTrend => write!(f, "no uptrend"),
            RuleOutcome::MomentumOutOfBand => write!(f, "momentum out of band"),
        }
    }
}

impl SignalRule {
    pub fn trend_holds(&self, snap: &IndicatorSnapshot) -> bool {
        snap.close > snap.ma_short && snap.ma_short > snap.ma_long
    }

    pub fn momentum_holds(&self, snap: &IndicatorSnapshot) -> bool {
        snap.rsi >= self.rsi_lower && snap.rsi <= self.rsi_upper
    }

    pub fn evaluate(&self, snap: &IndicatorSnapshot) -> RuleOutcome {
        if !self.trend_holds(snap) {
            RuleOutcome::NoTrend
        } else if !self.momentum_holds(snap) {
            RuleOutcome::MomentumOutOfBand
        } else {
            RuleOutcome::Match
        }
    }

    pub fn passes(&self, snap: &IndicatorSnapshot) -> bool {
        self.evaluate(snap) == RuleOutcome::Match
    }
}
