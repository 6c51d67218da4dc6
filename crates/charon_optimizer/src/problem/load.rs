use std::{
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};

/// Signed load units. Demands and capacities are non-negative; the signed
/// form also expresses the load delta of a delivery.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash,
)]
pub struct Load(i64);

impl Load {
    pub const ZERO: Load = Load(0);

    pub const fn new(value: i64) -> Self {
        Load(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn from_rounded(value: f64) -> Self {
        Load(value.round() as i64)
    }
}

impl std::fmt::Display for Load {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Load {
    fn from(value: i64) -> Self {
        Load(value)
    }
}

impl Add for Load {
    type Output = Load;

    fn add(self, other: Load) -> Load {
        Load(self.0 + other.0)
    }
}

impl AddAssign for Load {
    fn add_assign(&mut self, other: Load) {
        self.0 += other.0;
    }
}

impl Sub for Load {
    type Output = Load;

    fn sub(self, other: Load) -> Load {
        Load(self.0 - other.0)
    }
}

impl SubAssign for Load {
    fn sub_assign(&mut self, other: Load) {
        self.0 -= other.0;
    }
}

impl Neg for Load {
    type Output = Load;

    fn neg(self) -> Load {
        Load(-self.0)
    }
}

impl Sum for Load {
    fn sum<I: Iterator<Item = Load>>(iter: I) -> Load {
        iter.fold(Load::ZERO, |acc, x| acc + x)
    }
}
