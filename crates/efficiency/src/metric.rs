//! Goodness-of-fit metrics supported by the efficiency engine.

use serde::Serialize;

/// A goodness-of-fit statistic comparing simulated against reference
/// discharge. Every metric is 1.0 for a perfect fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Nash-Sutcliffe efficiency.
    Ns,
    /// Nash-Sutcliffe efficiency of log-transformed series.
    Lns,
    /// Kling-Gupta efficiency.
    Kg,
    /// Pearson correlation.
    Pc,
    /// Spearman rank correlation.
    Sc,
    /// Slope of the least-squares regression of simulation on reference.
    Sp,
    /// Nash-Sutcliffe efficiency of cumulative sums.
    NsDc,
}

impl Metric {
    /// All metrics in reporting order.
    pub const ALL: [Metric; 7] = [
        Self::Ns,
        Self::Lns,
        Self::Kg,
        Self::Pc,
        Self::Sc,
        Self::Sp,
        Self::NsDc,
    ];

    /// Lowercase key, e.g. `"ns_dc"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ns => "ns",
            Self::Lns => "lns",
            Self::Kg => "kg",
            Self::Pc => "pc",
            Self::Sc => "sc",
            Self::Sp => "sp",
            Self::NsDc => "ns_dc",
        }
    }

    /// Uppercase report label, e.g. `"NS_DC"`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ns => "NS",
            Self::Lns => "LNS",
            Self::Kg => "KG",
            Self::Pc => "PC",
            Self::Sc => "SC",
            Self::Sp => "SP",
            Self::NsDc => "NS_DC",
        }
    }

    /// Parses a metric key, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_labels() {
        assert_eq!(Metric::NsDc.name(), "ns_dc");
        assert_eq!(Metric::NsDc.label(), "NS_DC");
        assert_eq!(Metric::Kg.to_string(), "KG");
    }

    #[test]
    fn from_name_ignores_case() {
        assert_eq!(Metric::from_name("LNS"), Some(Metric::Lns));
        assert_eq!(Metric::from_name("ns_dc"), Some(Metric::NsDc));
        assert_eq!(Metric::from_name("rmse"), None);
    }

    #[test]
    fn ordering_follows_all() {
        let mut sorted = Metric::ALL;
        sorted.sort();
        assert_eq!(sorted, Metric::ALL);
    }
}
