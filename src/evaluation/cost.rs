use std::cmp::Ordering;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::utils::{approx_equal, compare_floats};

/// Lexicographic cost: capacity violation first, travel second.
///
/// Any capacity violation, however small, ranks worse than any feasible cost.
/// Derived `PartialEq` is exact; use [`Cost::is_approx_equal`] to absorb the
/// round-off of incremental updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub capacity_violation: f64,
    pub travel: f64,
}

impl Cost {
    pub const fn new(travel: f64, capacity_violation: f64) -> Self {
        Self {
            capacity_violation,
            travel,
        }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Sentinel for an unavailable option.
    pub const fn max() -> Self {
        Self::new(f64::MAX, f64::MAX)
    }

    pub fn set_zero(&mut self) {
        *self = Self::zero();
    }

    pub fn set_max(&mut self) {
        *self = Self::max();
    }

    pub fn set(&mut self, other: &Cost) {
        *self = *other;
    }

    pub fn is_max(&self) -> bool {
        self.travel == f64::MAX && self.capacity_violation == f64::MAX
    }

    pub fn negate(&mut self) {
        *self = -*self;
    }

    pub fn compare(&self, other: &Cost) -> Ordering {
        compare_floats(self.capacity_violation, other.capacity_violation)
            .then_with(|| compare_floats(self.travel, other.travel))
    }

    pub fn is_approx_equal(&self, other: &Cost) -> bool {
        approx_equal(self.capacity_violation, other.capacity_violation)
            && approx_equal(self.travel, other.travel)
    }

    /// Strictly lower and not within round-off of `other`.
    pub fn is_better_than(&self, other: &Cost) -> bool {
        self.compare(other) == Ordering::Less && !self.is_approx_equal(other)
    }

    /// Index of the lowest cost, `None` for an empty slice. Ties keep the first.
    pub fn lowest_cost_index(costs: &[Cost]) -> Option<usize> {
        costs
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, &Cost)>, (index, cost)| match best {
                Some((_, current)) if cost.compare(current) != Ordering::Less => best,
                _ => Some((index, cost)),
            })
            .map(|(index, _)| index)
    }
}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost::new(
            self.travel + rhs.travel,
            self.capacity_violation + rhs.capacity_violation,
        )
    }
}

impl Sub for Cost {
    type Output = Cost;

    fn sub(self, rhs: Cost) -> Cost {
        Cost::new(
            self.travel - rhs.travel,
            self.capacity_violation - rhs.capacity_violation,
        )
    }
}

impl Neg for Cost {
    type Output = Cost;

    fn neg(self) -> Cost {
        Cost::new(-self.travel, -self.capacity_violation)
    }
}

impl AddAssign for Cost {
    fn add_assign(&mut self, rhs: Cost) {
        *self = *self + rhs;
    }
}

impl SubAssign for Cost {
    fn sub_assign(&mut self, rhs: Cost) {
        *self = *self - rhs;
    }
}
