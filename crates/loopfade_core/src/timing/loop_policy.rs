//! Loop-count policy with per-track overrides.
//!
//! A track may override the batch default with either an exact count
//! (`3`, `"3"`) or an expression relative to the default
//! (`"+2"`, `"-1"`, `"*2"`, `"/2"`, `"%3"`).

use serde_json::Value;

/// Arithmetic applied to the batch default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl LoopOp {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(LoopOp::Add),
            '-' => Some(LoopOp::Sub),
            '*' => Some(LoopOp::Mul),
            '/' => Some(LoopOp::Div),
            '%' => Some(LoopOp::Rem),
            _ => None,
        }
    }

    fn apply(&self, lhs: f64, rhs: f64) -> f64 {
        match self {
            LoopOp::Add => lhs + rhs,
            LoopOp::Sub => lhs - rhs,
            LoopOp::Mul => lhs * rhs,
            LoopOp::Div => lhs / rhs,
            LoopOp::Rem => lhs % rhs,
        }
    }
}

/// Parsed loop-override expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopOverride {
    /// Use this count regardless of the default.
    Exact(f64),
    /// Combine the default with an operand.
    Relative { op: LoopOp, operand: f64 },
}

impl LoopOverride {
    /// Parse an override string. Returns `None` for anything malformed.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let mut chars = text.chars();
        let first = chars.next()?;

        match LoopOp::from_char(first) {
            Some(op) => {
                let operand = parse_number(chars.as_str())?;
                Some(LoopOverride::Relative { op, operand })
            }
            None => parse_number(text).map(LoopOverride::Exact),
        }
    }

    /// Parse the JSON value stored under the override key.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(LoopOverride::Exact),
            Value::String(s) => Self::parse(s),
            _ => None,
        }
    }

    /// Evaluate against the batch default. May be non-finite or negative.
    fn evaluate(&self, default: u32) -> f64 {
        match self {
            LoopOverride::Exact(count) => *count,
            LoopOverride::Relative { op, operand } => op.apply(f64::from(default), *operand),
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Effective loop count of one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopPlan {
    /// Extra repetitions of the loop body after the first play-through.
    pub effective_loop_count: u32,
}

/// Apply a track's override to the batch default.
///
/// Non-finite results fall back to the default, negative results clamp
/// to zero and fractions truncate toward zero.
pub fn effective_loop_count(default: u32, loop_override: Option<&LoopOverride>) -> LoopPlan {
    let count = match loop_override {
        None => default,
        Some(expr) => {
            let value = expr.evaluate(default);
            if !value.is_finite() {
                default
            } else if value <= 0.0 {
                0
            } else {
                value.trunc().min(f64::from(u32::MAX)) as u32
            }
        }
    };

    LoopPlan {
        effective_loop_count: count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(default: u32, text: &str) -> u32 {
        effective_loop_count(default, LoopOverride::parse(text).as_ref()).effective_loop_count
    }

    #[test]
    fn relative_operators() {
        for n in [0u32, 1, 4, 9] {
            for k in [1u32, 2, 3] {
                assert_eq!(eval(n, &format!("+{k}")), n + k);
                assert_eq!(eval(n, &format!("*{k}")), n * k);
                assert_eq!(eval(n, &format!("-{k}")), n.saturating_sub(k));
                assert_eq!(eval(n, &format!("/{k}")), n / k);
                assert_eq!(eval(n, &format!("%{k}")), n % k);
            }
        }
    }

    #[test]
    fn exact_values_are_used_verbatim() {
        assert_eq!(eval(1, "5"), 5);
        assert_eq!(eval(3, "0"), 0);
        let exact = LoopOverride::from_json(&serde_json::json!(7));
        assert_eq!(effective_loop_count(1, exact.as_ref()).effective_loop_count, 7);
    }

    #[test]
    fn malformed_overrides_fall_back_to_default() {
        assert_eq!(effective_loop_count(3, None).effective_loop_count, 3);
        assert_eq!(LoopOverride::parse(""), None);
        assert_eq!(LoopOverride::parse("+"), None);
        assert_eq!(LoopOverride::parse("twice"), None);
        assert_eq!(LoopOverride::parse("^2"), None);
        assert_eq!(LoopOverride::parse("NaN"), None);
        assert_eq!(LoopOverride::from_json(&serde_json::json!(true)), None);
        assert_eq!(LoopOverride::from_json(&serde_json::json!(null)), None);
    }

    #[test]
    fn non_finite_results_fall_back_to_default() {
        assert_eq!(eval(4, "/0"), 4);
        assert_eq!(eval(4, "%0"), 4);
        assert_eq!(eval(4, "*inf"), 4);
    }

    #[test]
    fn negative_and_fractional_results() {
        assert_eq!(eval(1, "-5"), 0);
        assert_eq!(eval(3, "/2"), 1);
        assert_eq!(eval(1, "2.9"), 2);
    }
}
