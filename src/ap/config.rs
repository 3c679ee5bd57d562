//! Miner configuration, loadable from TOML.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use super::error::{AprioriError, Result};
use super::istree::{Aggregation, Measure, RuleSupport};
use super::items::{Appearance, ItemBase, ItemOrder};
use super::report::{DEFAULT_IMPLICATION, DEFAULT_ITEM_SEPARATOR};
use super::tract::Support;

/// What the miner reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// All frequent itemsets
    #[default]
    Sets,
    /// Frequent itemsets without a superset of equal support
    Closed,
    /// Frequent itemsets without a frequent superset
    Maximal,
    /// Association rules with a single item head
    Rules,
}

impl Target {
    pub fn from_code(code: char) -> Result<Self> {
        match code {
            's' => Ok(Target::Sets),
            'c' => Ok(Target::Closed),
            'm' => Ok(Target::Maximal),
            'r' => Ok(Target::Rules),
            other => Err(AprioriError::InvalidTarget(other)),
        }
    }

    pub fn is_rules(self) -> bool {
        self == Target::Rules
    }

    /// Name used in log messages.
    pub fn noun(self) -> &'static str {
        match self {
            Target::Rules => "rule",
            _ => "set",
        }
    }
}

impl FromStr for Target {
    type Err = AprioriError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sets" | "frequent" => Ok(Target::Sets),
            "closed" => Ok(Target::Closed),
            "maximal" => Ok(Target::Maximal),
            "rules" => Ok(Target::Rules),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(code), None) => Target::from_code(code),
                    _ => Err(AprioriError::InvalidTarget(s.chars().next().unwrap_or(' '))),
                }
            }
        }
    }
}

impl FromStr for Measure {
    type Err = AprioriError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(code), None) => Measure::from_code(code),
            (None, _) => Ok(Measure::None),
            _ => Measure::deserialize(serde::de::value::StrDeserializer::<serde::de::value::Error>::new(s))
                .map_err(|_| AprioriError::InvalidMeasure(s.chars().next().unwrap_or(' '))),
        }
    }
}

impl FromStr for Aggregation {
    type Err = AprioriError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "none" => Ok(Aggregation::None),
            "min" | "minimum" => Ok(Aggregation::Min),
            "max" | "maximum" => Ok(Aggregation::Max),
            "avg" | "average" => Ok(Aggregation::Avg),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(code), None) => Aggregation::from_code(code),
                    _ => Err(AprioriError::InvalidAggregation(s.chars().next().unwrap_or(' '))),
                }
            }
        }
    }
}

/// Characters used to split the input into records and items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub blanks: String,
    pub field_separators: String,
    pub record_separators: String,
    pub comment: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            blanks: " \t\r".to_string(),
            field_separators: " \t,".to_string(),
            record_separators: "\n".to_string(),
            comment: "#".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    pub target: Target,
    pub min_size: usize,
    pub max_size: Option<usize>,
    /// Positive: fraction of the total weight, negative: absolute support
    pub min_support: f64,
    pub max_support: f64,
    pub min_confidence: f64,
    pub rule_support: RuleSupport,
    pub measure: Measure,
    pub aggregation: Aggregation,
    pub min_value: f64,
    /// Positive: prune candidates by the measure from this height on.
    /// Negative: use the measure when filtering closed/maximal sets.
    pub prune_level: i32,
    pub perfect_extensions: bool,
    pub item_order: ItemOrder,
    pub use_tree: bool,
    pub heap_sort: bool,
    /// Compact the deepest level before adding the next one
    pub prune_counters: bool,
    /// Item usage ratio below which the transactions are refreshed
    pub filter: f64,
    /// 0: recursive output, >0: ascending size, <0: descending size
    pub direction: i32,
    pub item_separator: String,
    pub implication: String,
    pub format: Option<String>,
    pub default_appearance: Appearance,
    pub appearances: BTreeMap<String, Appearance>,
    /// Byte budget for the itemset tree
    pub memory_limit: Option<usize>,
    pub input: InputConfig,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            target: Target::Sets,
            min_size: 1,
            max_size: None,
            min_support: 0.1,
            max_support: 1.0,
            min_confidence: 0.8,
            rule_support: RuleSupport::Body,
            measure: Measure::None,
            aggregation: Aggregation::None,
            min_value: 0.1,
            prune_level: 0,
            perfect_extensions: true,
            item_order: ItemOrder::AscendingExtended,
            use_tree: true,
            heap_sort: true,
            prune_counters: true,
            filter: 0.1,
            direction: 0,
            item_separator: DEFAULT_ITEM_SEPARATOR.to_string(),
            implication: DEFAULT_IMPLICATION.to_string(),
            format: None,
            default_appearance: Appearance::Both,
            appearances: BTreeMap::new(),
            memory_limit: None,
            input: InputConfig::default(),
        }
    }
}

/// Absolute thresholds for one transaction weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub min_support: Support,
    pub max_support: Support,
    pub min_confidence: f64,
}

impl MinerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: MinerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| AprioriError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|err| AprioriError::Config(err.to_string()))
    }

    /// Rejects thresholds and size ranges that cannot be mined.
    pub fn validate(&self) -> Result<()> {
        if !self.min_support.is_finite() || self.min_support > 1.0 {
            return Err(AprioriError::InvalidSupport(self.min_support));
        }
        if !self.max_support.is_finite() || self.max_support > 1.0 {
            return Err(AprioriError::InvalidSupport(self.max_support));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(AprioriError::InvalidConfidence(self.min_confidence));
        }
        if let Some(max) = self.max_size {
            if self.min_size > max {
                return Err(AprioriError::InvalidSize {
                    min: self.min_size,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Whether supports are given as absolute numbers.
    pub fn absolute_support(&self) -> bool {
        self.min_support < 0.0
    }

    pub fn is_set_target(&self) -> bool {
        !self.target.is_rules()
    }

    pub fn closed_or_maximal(&self) -> bool {
        matches!(self.target, Target::Closed | Target::Maximal)
    }

    /// Confidence and rule support actually used for the target.
    pub fn effective_rule_params(&self) -> (f64, RuleSupport) {
        if self.is_set_target() {
            (1.0, RuleSupport::Both)
        } else {
            (self.min_confidence, self.rule_support)
        }
    }

    /// Whether perfect extensions can be used for the configured output.
    pub fn effective_perfect_extensions(&self) -> bool {
        self.perfect_extensions
            && self.target == Target::Sets
            && matches!(self.measure, Measure::None | Measure::LogQuotient)
            && self.direction == 0
    }

    /// Item usage filter, disabled outside of `(-1, 1)`.
    pub fn effective_filter(&self) -> f64 {
        if self.filter <= -1.0 || self.filter >= 1.0 {
            0.0
        } else {
            self.filter
        }
    }

    pub fn prune_from(&self) -> Option<usize> {
        usize::try_from(self.prune_level).ok().filter(|&level| level > 0)
    }

    pub fn output_format(&self) -> String {
        if let Some(format) = &self.format {
            return format.clone();
        }
        let absolute = self.absolute_support();
        match (self.target.is_rules(), absolute) {
            (false, false) => "  (%1S)",
            (false, true) => "  (%a)",
            (true, false) => "  (%1X, %1C)",
            (true, true) => "  (%b, %1C)",
        }
        .to_string()
    }

    /// Converts the support thresholds for `total_weight`.
    pub fn thresholds(&self, total_weight: Support) -> Thresholds {
        let weight = total_weight as f64;
        let min_support = if self.min_support < 0.0 {
            (-self.min_support).ceil()
        } else {
            (weight * self.min_support).ceil()
        };
        let max_support = if self.max_support < 0.0 {
            (-self.max_support).floor()
        } else {
            (weight * self.max_support).floor()
        };
        Thresholds {
            min_support: min_support.max(0.0) as Support,
            max_support: max_support.max(0.0) as Support,
            min_confidence: self.effective_rule_params().0,
        }
    }

    /// Applies the default and per-item appearances to `base`.
    pub fn apply_appearances(&self, base: &mut ItemBase) {
        base.set_default_appearance(self.default_appearance);
        for (name, &appearance) in &self.appearances {
            let id = base.get_or_insert(name);
            base.set_appearance(id, appearance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MinerConfig::default();
        assert_eq!(config.target, Target::Sets);
        assert_eq!(config.min_size, 1);
        assert_eq!(config.item_order, ItemOrder::AscendingExtended);
        assert_eq!(config.output_format(), "  (%1S)");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_target_codes() {
        assert_eq!(Target::from_code('m').unwrap(), Target::Maximal);
        assert_eq!("r".parse::<Target>().unwrap(), Target::Rules);
        assert_eq!("closed".parse::<Target>().unwrap(), Target::Closed);
        assert!(matches!(
            "z".parse::<Target>(),
            Err(AprioriError::InvalidTarget('z'))
        ));
    }

    #[test]
    fn test_measure_and_aggregation_parse() {
        assert_eq!("b".parse::<Measure>().unwrap(), Measure::LogQuotient);
        assert_eq!("chi_square".parse::<Measure>().unwrap(), Measure::ChiSquare);
        assert_eq!("n".parse::<Aggregation>().unwrap(), Aggregation::Max);
        assert!("q".parse::<Aggregation>().is_err());
    }

    #[test]
    fn test_thresholds_relative_and_absolute() {
        let config = MinerConfig {
            min_support: 0.4,
            ..Default::default()
        };
        let t = config.thresholds(5);
        assert_eq!(t.min_support, 2);
        assert_eq!(t.max_support, 5);
        assert_eq!(t.min_confidence, 1.0);

        let config = MinerConfig {
            target: Target::Rules,
            min_support: -3.0,
            max_support: -4.0,
            ..Default::default()
        };
        let t = config.thresholds(100);
        assert_eq!((t.min_support, t.max_support), (3, 4));
        assert_eq!(t.min_confidence, 0.8);
        assert_eq!(config.output_format(), "  (%b, %1C)");
    }

    #[test]
    fn test_validate_rejects() {
        let bad = MinerConfig {
            min_support: 1.5,
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(AprioriError::InvalidSupport(_))));
        let bad = MinerConfig {
            min_confidence: -0.1,
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(AprioriError::InvalidConfidence(_))));
        let bad = MinerConfig {
            min_size: 3,
            max_size: Some(2),
            ..Default::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(AprioriError::InvalidSize { min: 3, max: 2 })
        ));
    }

    #[test]
    fn test_perfect_extensions_switch() {
        let mut config = MinerConfig::default();
        assert!(config.effective_perfect_extensions());
        config.direction = -1;
        assert!(!config.effective_perfect_extensions());
        config.direction = 0;
        config.measure = Measure::Lift;
        assert!(!config.effective_perfect_extensions());
        config.measure = Measure::LogQuotient;
        assert!(config.effective_perfect_extensions());
        config.target = Target::Closed;
        assert!(!config.effective_perfect_extensions());
    }

    #[test]
    fn test_from_toml() {
        let config = MinerConfig::from_toml_str(
            r#"
            target = "rules"
            min_support = 0.4
            min_confidence = 0.7
            measure = "lift"
            max_size = 3

            [appearances]
            c = "head"
            "#,
        )
        .unwrap();
        assert_eq!(config.target, Target::Rules);
        assert_eq!(config.measure, Measure::Lift);
        assert_eq!(config.max_size, Some(3));
        assert_eq!(config.appearances.get("c"), Some(&Appearance::Head));
        assert_eq!(config.input, InputConfig::default());
    }
}
