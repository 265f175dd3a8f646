/// A closed range `[min, max]` along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// Create a new interval given min and max values.
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Returns true if the interval contains nothing (min > max).
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Grow the interval so it includes `x`. NaN is ignored.
    pub fn include(&self, x: f32) -> Interval {
        Interval::new(self.min.min(x), self.max.max(x))
    }

    /// An empty interval (min > max, contains nothing).
    pub const EMPTY: Interval = Interval {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_grows_from_empty() {
        let interval = Interval::EMPTY.include(3.0);
        assert_eq!(interval, Interval::new(3.0, 3.0));

        let interval = interval.include(-1.0).include(f32::NAN);
        assert_eq!(interval, Interval::new(-1.0, 3.0));
        assert!(!interval.is_empty());
        assert!(Interval::EMPTY.is_empty());
    }
}
