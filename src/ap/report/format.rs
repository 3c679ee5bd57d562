use std::fmt::Write;

use crate::ap::tract::Support;

/// Largest number of decimals a field may request.
pub const MAX_DECIMALS: usize = 32;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    /// `%` followed by up to two decimal digits and a code character
    Field {
        code: char,
        decimals: usize,
        raw: String,
    },
}

/// Parsed information format, e.g. `"  (%1S)"`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutputFormat {
    tokens: Vec<Token>,
}

/// Values an information format can refer to.
#[derive(Debug, Clone, Copy)]
pub struct Quantities {
    pub support: Support,
    pub body: Support,
    pub head: Support,
    pub total: Support,
    pub value: f64,
}

impl OutputFormat {
    pub fn parse(format: &str) -> Self {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut chars = format.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            let mut raw = String::from('%');
            let mut decimals = 0;
            for _ in 0..2 {
                match chars.peek().and_then(|d| d.to_digit(10)) {
                    Some(digit) => {
                        decimals = decimals * 10 + digit as usize;
                        raw.push(chars.next().unwrap_or('0'));
                    }
                    None => break,
                }
            }
            match chars.next() {
                Some('%') => literal.push('%'),
                Some(code) => {
                    raw.push(code);
                    if !literal.is_empty() {
                        tokens.push(Token::Literal(std::mem::take(&mut literal)));
                    }
                    tokens.push(Token::Field {
                        code,
                        decimals: decimals.min(MAX_DECIMALS),
                        raw,
                    });
                }
                None => literal.push_str(&raw),
            }
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Renders the format for an itemset. Rule specific codes are copied
    /// literally.
    pub fn render_set(&self, out: &mut String, support: Support, total: Support, value: f64) {
        let quantities = Quantities {
            support,
            body: 0,
            head: 0,
            total,
            value,
        };
        self.render(out, &quantities, false);
    }

    pub fn render_rule(&self, out: &mut String, quantities: &Quantities) {
        self.render(out, quantities, true);
    }

    fn render(&self, out: &mut String, q: &Quantities, rule: bool) {
        let total = q.total.max(1) as f64;
        let (supp, body, head) = (q.support as f64, q.body as f64, q.head as f64);
        for token in &self.tokens {
            let (code, decimals, raw) = match token {
                Token::Literal(text) => {
                    out.push_str(text);
                    continue;
                }
                Token::Field { code, decimals, raw } => (*code, *decimals, raw),
            };
            let confidence = if q.body > 0 { supp / body } else { 0.0 };
            let lift = if q.body > 0 && q.head > 0 {
                (supp * total) / (body * head)
            } else {
                0.0
            };
            match (code, rule) {
                ('a', _) => {
                    let _ = write!(out, "{}", q.support);
                }
                ('s', _) => write_decimal(out, supp / total, decimals),
                ('S', _) => write_decimal(out, 100.0 * (supp / total), decimals),
                ('e', _) => write_decimal(out, q.value, decimals),
                ('E', _) => write_decimal(out, 100.0 * q.value, decimals),
                ('b', true) => {
                    let _ = write!(out, "{}", q.body);
                }
                ('x', true) => write_decimal(out, body / total, decimals),
                ('X', true) => write_decimal(out, 100.0 * (body / total), decimals),
                ('h', true) => {
                    let _ = write!(out, "{}", q.head);
                }
                ('y', true) => write_decimal(out, head / total, decimals),
                ('Y', true) => write_decimal(out, 100.0 * (head / total), decimals),
                ('c', true) => write_decimal(out, confidence, decimals),
                ('C', true) => write_decimal(out, 100.0 * confidence, decimals),
                ('l', true) => write_decimal(out, lift, decimals),
                ('L', true) => write_decimal(out, 100.0 * lift, decimals),
                _ => out.push_str(raw),
            }
        }
    }
}

/// Writes `num` rounded half up to `decimals` places.
pub fn write_decimal(out: &mut String, num: f64, decimals: usize) {
    if !num.is_finite() {
        let _ = write!(out, "{num}");
        return;
    }
    let decimals = decimals.min(MAX_DECIMALS);
    if num < 0.0 {
        out.push('-');
    }
    let mut num = num.abs() + 0.5 * 10f64.powi(-(decimals as i32));
    let int = num.floor();
    num -= int;
    let _ = write!(out, "{int:.0}");
    if decimals == 0 {
        return;
    }
    out.push('.');
    for _ in 0..decimals {
        num *= 10.0;
        let digit = num.floor().clamp(0.0, 9.0);
        out.push(char::from(b'0' + digit as u8));
        num -= num.floor();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(format: &str, support: Support, total: Support, value: f64) -> String {
        let mut out = String::new();
        OutputFormat::parse(format).render_set(&mut out, support, total, value);
        out
    }

    #[test]
    fn test_decimal_rounding() {
        let mut out = String::new();
        write_decimal(&mut out, 66.6666, 1);
        assert_eq!(out, "66.7");
        out.clear();
        write_decimal(&mut out, 0.5, 0);
        assert_eq!(out, "1");
        out.clear();
        write_decimal(&mut out, -1.25, 2);
        assert_eq!(out, "-1.25");
    }

    #[test]
    fn test_set_codes() {
        assert_eq!(set("  (%1S)", 2, 3, 0.0), "  (66.7)");
        assert_eq!(set("%a/%s", 1, 4, 0.0), "1/0");
        assert_eq!(set("%2s", 1, 4, 0.0), "0.25");
        assert_eq!(set("%e", 1, 4, 2.4), "2");
    }

    #[test]
    fn test_zero_total_weight() {
        assert_eq!(set("%s %1S", 0, 0, 0.0), "0 0.0");
    }

    #[test]
    fn test_rule_codes_copied_in_set_context() {
        assert_eq!(set("%b %1C %%", 1, 2, 0.0), "%b %1C %");
    }

    #[test]
    fn test_trailing_percent_is_literal() {
        assert_eq!(set("x%", 1, 2, 0.0), "x%");
        assert_eq!(set("x%12", 1, 2, 0.0), "x%12");
    }

    #[test]
    fn test_rule_codes() {
        let q = Quantities {
            support: 2,
            body: 3,
            head: 2,
            total: 4,
            value: 0.0,
        };
        let mut out = String::new();
        OutputFormat::parse("%b %h %1C %2l %X").render_rule(&mut out, &q);
        assert_eq!(out, "3 2 66.7 1.33 75");
    }
}
