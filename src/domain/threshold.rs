// Threshold domain model
use super::alert::Severity;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    pub warning: f64,
    pub critical: f64,
}

impl Thresholds {
    pub fn new(warning: f64, critical: f64) -> Self {
        Self { warning, critical }
    }

    pub fn is_ordered(&self) -> bool {
        self.warning.is_finite() && self.critical.is_finite() && self.warning <= self.critical
    }

    /// Severity of a breach, if any. Both boundaries are exclusive.
    pub fn classify(&self, value: f64) -> Option<Severity> {
        if value > self.critical {
            Some(Severity::Critical)
        } else if value > self.warning {
            Some(Severity::Warning)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let t = Thresholds::new(70.0, 85.0);
        assert_eq!(t.classify(90.0), Some(Severity::Critical));
        assert_eq!(t.classify(85.0), Some(Severity::Warning));
        assert_eq!(t.classify(75.0), Some(Severity::Warning));
        assert_eq!(t.classify(70.0), None);
        assert_eq!(t.classify(10.0), None);
    }

    #[test]
    fn test_ordering_check() {
        assert!(Thresholds::new(70.0, 85.0).is_ordered());
        assert!(!Thresholds::new(90.0, 85.0).is_ordered());
        assert!(!Thresholds::new(f64::NAN, 85.0).is_ordered());
    }
}
