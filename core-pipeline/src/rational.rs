//! Exact ratios for frame periods and rates.

use std::fmt;
use std::ops::Mul;

/// A ratio of two integers, used for timebases in seconds per frame.
///
/// Equality is structural: `1/2` and `2/4` are different values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub numerator: i64,
    pub denominator: i64,
}

impl Rational {
    pub const fn new(numerator: i64, denominator: i64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn to_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Swaps numerator and denominator, turning a rate into a period.
    pub fn reciprocal(self) -> Self {
        Self::new(self.denominator, self.numerator)
    }
}

impl Mul<i64> for Rational {
    type Output = Rational;

    fn mul(self, scale: i64) -> Rational {
        Rational::new(self.numerator * scale, self.denominator)
    }
}

impl Mul<Rational> for i64 {
    type Output = Rational;

    fn mul(self, rational: Rational) -> Rational {
        rational * self
    }
}

impl From<Rational> for f64 {
    fn from(rational: Rational) -> f64 {
        rational.to_f64()
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Rational::new(3, 2).to_string(), "3/2");
    }

    #[test]
    fn test_multiplication() {
        assert_eq!(Rational::new(2, 3) * 5, Rational::new(10, 3));
        assert_eq!(5 * Rational::new(2, 3), Rational::new(10, 3));
    }

    #[test]
    fn test_to_f64() {
        assert_eq!(Rational::new(1, 2).to_f64(), 0.5);
        assert_eq!(f64::from(Rational::new(3, 4)), 0.75);
    }

    #[test]
    fn test_reciprocal() {
        assert_eq!(Rational::new(1, 60).reciprocal(), Rational::new(60, 1));
    }

    #[test]
    fn test_equality_is_structural() {
        assert_ne!(Rational::new(1, 2), Rational::new(2, 4));
    }
}
