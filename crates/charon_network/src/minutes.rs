use std::{
    iter::Sum,
    ops::{Add, AddAssign, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};

/// Minutes since midnight for instants, plain minutes for durations.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Default)]
pub struct Minutes(f64);

impl Minutes {
    pub const ZERO: Minutes = Minutes(0.0);
    pub const DAY: Minutes = Minutes(24.0 * 60.0);

    pub fn new(value: f64) -> Self {
        Minutes(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    pub fn max(self, other: Minutes) -> Minutes {
        Minutes(self.0.max(other.0))
    }

    /// Renders the rounded minute count as an unpadded `H:M` clock string.
    pub fn format_clock(&self) -> String {
        let total = self.0.round() as i64;
        format!("{}:{}", total.div_euclid(60), total.rem_euclid(60))
    }
}

impl Eq for Minutes {}

impl PartialOrd for Minutes {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Minutes {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for Minutes {
    fn from(value: f64) -> Self {
        Minutes::new(value)
    }
}

impl Add for Minutes {
    type Output = Minutes;

    fn add(self, other: Minutes) -> Minutes {
        Minutes(self.0 + other.0)
    }
}

impl AddAssign for Minutes {
    fn add_assign(&mut self, other: Minutes) {
        self.0 += other.0;
    }
}

impl Sub for Minutes {
    type Output = Minutes;

    fn sub(self, other: Minutes) -> Minutes {
        Minutes(self.0 - other.0)
    }
}

impl SubAssign for Minutes {
    fn sub_assign(&mut self, other: Minutes) {
        self.0 -= other.0;
    }
}

impl Sum for Minutes {
    fn sum<I: Iterator<Item = Minutes>>(iter: I) -> Minutes {
        iter.fold(Minutes::ZERO, |acc, x| acc + x)
    }
}
