//! Closed integer bounds.

use std::fmt;

/// A closed integer interval `[lb, ub]`.
///
/// Used for time point domains, distance constraints and duration ranges.
///
/// # Example
///
/// ```
/// use timeforge_core::Bounds;
///
/// let window = Bounds::new(5, 20);
/// assert!(window.contains(10));
/// assert_eq!(window.intersect(Bounds::new(15, 40)), Some(Bounds::new(15, 20)));
/// assert_eq!(Bounds::point(3).width(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub lb: i64,
    pub ub: i64,
}

impl Bounds {
    #[inline]
    pub const fn new(lb: i64, ub: i64) -> Self {
        Self { lb, ub }
    }

    /// Degenerate bounds `[value, value]`.
    #[inline]
    pub const fn point(value: i64) -> Self {
        Self::new(value, value)
    }

    /// True if `lb > ub`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lb > self.ub
    }

    #[inline]
    pub fn is_point(&self) -> bool {
        self.lb == self.ub
    }

    #[inline]
    pub fn contains(&self, value: i64) -> bool {
        self.lb <= value && value <= self.ub
    }

    /// True if `other` lies entirely within `self`.
    pub fn covers(&self, other: Bounds) -> bool {
        self.lb <= other.lb && other.ub <= self.ub
    }

    /// `ub - lb`, saturating.
    #[inline]
    pub fn width(&self) -> i64 {
        self.ub.saturating_sub(self.lb)
    }

    /// Intersection, or `None` if disjoint.
    pub fn intersect(&self, other: Bounds) -> Option<Bounds> {
        let b = Bounds::new(self.lb.max(other.lb), self.ub.min(other.ub));
        (!b.is_empty()).then_some(b)
    }

    /// Bounds of `x + y` for `x` in `self` and `y` in `other`.
    pub fn add(&self, other: Bounds) -> Bounds {
        Bounds::new(
            self.lb.saturating_add(other.lb),
            self.ub.saturating_add(other.ub),
        )
    }

    /// Bounds of `-x` for `x` in `self`.
    pub fn negate(&self) -> Bounds {
        Bounds::new(self.ub.saturating_neg(), self.lb.saturating_neg())
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lb, self.ub)
    }
}

impl From<(i64, i64)> for Bounds {
    fn from((lb, ub): (i64, i64)) -> Self {
        Bounds::new(lb, ub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_point() {
        assert!(Bounds::new(3, 2).is_empty());
        assert!(!Bounds::new(2, 2).is_empty());
        assert!(Bounds::point(2).is_point());
    }

    #[test]
    fn test_intersect_disjoint() {
        assert_eq!(Bounds::new(0, 4).intersect(Bounds::new(5, 9)), None);
    }

    #[test]
    fn test_add_and_negate() {
        let b = Bounds::new(2, 5).add(Bounds::new(1, 1));
        assert_eq!(b, Bounds::new(3, 6));
        assert_eq!(b.negate(), Bounds::new(-6, -3));
    }

    #[test]
    fn test_covers() {
        assert!(Bounds::new(0, 10).covers(Bounds::new(2, 3)));
        assert!(!Bounds::new(0, 10).covers(Bounds::new(-1, 3)));
    }
}
