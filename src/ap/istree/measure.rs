use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::f64::consts::LN_2;

use crate::ap::error::{AprioriError, Result};
use crate::ap::tract::Support;

/// Additional rule evaluation measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    #[default]
    None,
    /// Rule confidence
    Confidence,
    /// Absolute difference of the confidence to the prior
    ConfidenceDifference,
    Lift,
    /// Absolute difference of the lift to 1
    LiftDifference,
    /// Difference of the lift quotient to 1
    LiftQuotient,
    /// Normalized chi-square measure
    ChiSquare,
    /// p-value of the chi-square measure
    ChiSquarePValue,
    /// Information gain in bits
    Information,
    /// p-value of the G statistic
    InformationPValue,
    /// Binary logarithm of the support quotient
    LogQuotient,
}

impl Measure {
    /// Classic single character selector.
    pub fn from_code(code: char) -> Result<Self> {
        match code {
            'x' | '0' => Ok(Measure::None),
            'c' => Ok(Measure::Confidence),
            'd' => Ok(Measure::ConfidenceDifference),
            'l' => Ok(Measure::Lift),
            'a' => Ok(Measure::LiftDifference),
            'q' => Ok(Measure::LiftQuotient),
            'n' => Ok(Measure::ChiSquare),
            'p' => Ok(Measure::ChiSquarePValue),
            'i' => Ok(Measure::Information),
            'g' => Ok(Measure::InformationPValue),
            'b' => Ok(Measure::LogQuotient),
            other => Err(AprioriError::InvalidMeasure(other)),
        }
    }

    pub fn is_none(self) -> bool {
        self == Measure::None
    }

    /// Value of the measure for a rule with the given supports.
    ///
    /// `supp` is the support of body and head together, `base` the total
    /// transaction weight. The log quotient is not a rule measure and
    /// evaluates to zero here.
    pub fn rule_value(self, supp: Support, body: Support, head: Support, base: Support) -> f64 {
        let (s, b, h, n) = (supp as f64, body as f64, head as f64, base as f64);
        match self {
            Measure::None | Measure::LogQuotient => 0.0,
            Measure::Confidence => {
                if body > 0 {
                    s / b
                } else {
                    0.0
                }
            }
            Measure::ConfidenceDifference => {
                if body == 0 || base == 0 {
                    0.0
                } else {
                    (s / b - h / n).abs()
                }
            }
            Measure::Lift => lift(s, b, h, n),
            Measure::LiftDifference => {
                if body == 0 || head == 0 {
                    0.0
                } else {
                    (lift(s, b, h, n) - 1.0).abs()
                }
            }
            Measure::LiftQuotient => {
                if body == 0 || head == 0 {
                    return 0.0;
                }
                let t = lift(s, b, h, n);
                1.0 - if t > 1.0 { 1.0 / t } else { t }
            }
            Measure::ChiSquare => chi_square(supp, body, head, base),
            Measure::ChiSquarePValue => chi2_cdf(n * chi_square(supp, body, head, base)),
            Measure::Information => information(supp, body, head, base),
            Measure::InformationPValue => {
                chi2_cdf(n * 2.0 * LN_2 * information(supp, body, head, base))
            }
        }
    }
}

fn lift(s: f64, b: f64, h: f64, n: f64) -> f64 {
    if b <= 0.0 || h <= 0.0 {
        0.0
    } else {
        (s * n) / (b * h)
    }
}

fn strictly_inside(head: Support, body: Support, base: Support) -> bool {
    head > 0 && head < base && body > 0 && body < base
}

fn chi_square(supp: Support, body: Support, head: Support, base: Support) -> f64 {
    if !strictly_inside(head, body, base) {
        return 0.0;
    }
    let (s, b, h, n) = (supp as f64, body as f64, head as f64, base as f64);
    let t = h * b - s * n;
    (t * t) / (h * (n - h) * b * (n - b))
}

fn information(supp: Support, body: Support, head: Support, base: Support) -> f64 {
    if !strictly_inside(head, body, base) {
        return 0.0;
    }
    let (s, b, h, n) = (supp as f64, body as f64, head as f64, base as f64);
    let cells = [
        (s, h * b),
        (b - s, (n - h) * b),
        (h - s, h * (n - b)),
        (n - h - b + s, (n - h) * (n - b)),
    ];
    let sum: f64 = cells
        .iter()
        .filter(|(t, _)| *t > 0.0)
        .map(|(t, e)| t * (t / e).ln())
        .sum();
    (n.ln() + sum / n) / LN_2
}

/// Lower cumulative chi-square distribution with one degree of freedom.
fn chi2_cdf(x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    ChiSquared::new(1.0).map(|dist| dist.cdf(x)).unwrap_or(0.0)
}

/// How measure values of the different rules of one itemset are combined.
///
/// Each rule with a single item head uses that item's own support as the
/// head support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Use the rule with the last item as head only
    #[default]
    None,
    Min,
    Max,
    Avg,
}

impl Aggregation {
    pub fn from_code(code: char) -> Result<Self> {
        match code {
            'x' | '0' => Ok(Aggregation::None),
            'm' => Ok(Aggregation::Min),
            'n' => Ok(Aggregation::Max),
            'a' => Ok(Aggregation::Avg),
            other => Err(AprioriError::InvalidAggregation(other)),
        }
    }

    pub(crate) fn combine(self, aggr: f64, val: f64) -> f64 {
        match self {
            Aggregation::None => aggr,
            Aggregation::Min => aggr.min(val),
            Aggregation::Max => aggr.max(val),
            Aggregation::Avg => aggr + val,
        }
    }
}

impl super::ItemsetTree {
    /// Measure value of the itemset `set(node) + item(index)`.
    pub(crate) fn evaluate(&self, node: super::NodeId, index: usize, path: &mut Vec<usize>) -> f64 {
        match self.measure {
            Measure::None => 0.0,
            Measure::LogQuotient => self.log_quotient(node, index),
            _ => self.aggregate(node, index, path),
        }
    }

    /// Support of the set represented by `node`.
    pub(crate) fn set_support(&self, node: super::NodeId) -> Support {
        match self.nodes[node].parent {
            None => self.total_weight,
            Some(parent) => self.nodes[parent]
                .counter(self.nodes[node].item)
                .map_or(0, |counter| counter.support),
        }
    }

    /// Rule measure with the last item as head, optionally combined over
    /// all rules with a single item head.
    fn aggregate(&self, node: super::NodeId, index: usize, path: &mut Vec<usize>) -> f64 {
        let item = self.nodes[node].item_at(index);
        let supp = self.nodes[node].counters[index].support;
        let base = self.total_weight;
        let mut value = self
            .measure
            .rule_value(supp, self.set_support(node), self.head_support(item), base);
        if self.aggregation == Aggregation::None {
            return value;
        }
        let mut rules = 1usize;
        path.clear();
        path.push(item);
        let mut current = node;
        while let Some(parent) = self.nodes[current].parent {
            let head = self.nodes[current].item;
            let body = self.lookup(parent, path).map_or(0, |counter| counter.support);
            let other = self
                .measure
                .rule_value(supp, body, self.head_support(head), base);
            value = self.aggregation.combine(value, other);
            rules += 1;
            path.insert(0, head);
            current = parent;
        }
        if self.aggregation == Aggregation::Avg {
            value / rules as f64
        } else {
            value
        }
    }

    /// Binary logarithm of the quotient of the itemset support and the
    /// support expected under full item independence.
    fn log_quotient(&self, node: super::NodeId, index: usize) -> f64 {
        let item = self.nodes[node].item_at(index);
        let supp = self.nodes[node].counters[index].support as f64;
        let mut sum = (self.head_support(item) as f64).ln();
        let mut size = 1usize;
        let mut current = node;
        while let Some(parent) = self.nodes[current].parent {
            sum += (self.head_support(self.nodes[current].item) as f64).ln();
            size += 1;
            current = parent;
        }
        let log_weight = (self.total_weight as f64).ln();
        (supp.ln() - sum + (size as f64 - 1.0) * log_weight) / LN_2
    }
}
