// equation/types.rs
// Contains the Equation enum, its constructors and arithmetic composition

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A scalar function of one variable, `y = f(x)`.
///
/// Equations are built once from chemistry constants when a phase is
/// configured and are never mutated afterwards. Evaluation is total:
/// a zero denominator in a [`Equation::Quotient`] and a non-positive
/// argument to [`Equation::Log10`] both evaluate to `0.0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", try_from = "EquationSpec")]
pub enum Equation {
    Constant {
        value: f64,
    },
    /// Straight line through `(x1, y1)` and `(x2, y2)`.
    Linear {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    /// `left` below `threshold`, `right` at or above it.
    Switching {
        threshold: f64,
        left: Box<Equation>,
        right: Box<Equation>,
    },
    Log10 {
        of: Box<Equation>,
    },
    /// `10^of(x)`, the inverse of [`Equation::Log10`].
    Pow10 {
        of: Box<Equation>,
    },
    Sum {
        terms: Vec<Equation>,
    },
    Product {
        factors: Vec<Equation>,
    },
    Quotient {
        numerator: Box<Equation>,
        denominator: Box<Equation>,
    },
    Scaled {
        factor: f64,
        of: Box<Equation>,
    },
    /// Clamps the inner equation to `[min, max]`.
    Within {
        min: f64,
        max: f64,
        of: Box<Equation>,
    },
}

/// Deserialized form of [`Equation`], checked against the same rules as
/// its constructors before it becomes one. Children are `Equation`s, so
/// nested terms are checked on the way in.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum EquationSpec {
    Constant { value: f64 },
    Linear { x1: f64, y1: f64, x2: f64, y2: f64 },
    Switching { threshold: f64, left: Box<Equation>, right: Box<Equation> },
    Log10 { of: Box<Equation> },
    Pow10 { of: Box<Equation> },
    Sum { terms: Vec<Equation> },
    Product { factors: Vec<Equation> },
    Quotient { numerator: Box<Equation>, denominator: Box<Equation> },
    Scaled { factor: f64, of: Box<Equation> },
    Within { min: f64, max: f64, of: Box<Equation> },
}

impl TryFrom<EquationSpec> for Equation {
    type Error = String;

    fn try_from(spec: EquationSpec) -> Result<Self, Self::Error> {
        Ok(match spec {
            EquationSpec::Constant { value } => Equation::Constant { value },
            EquationSpec::Linear { x1, y1, x2, y2 } => {
                if x1 == x2 {
                    return Err(format!("linear equation needs two distinct x values, got x1 = x2 = {x1}"));
                }
                Equation::Linear { x1, y1, x2, y2 }
            }
            EquationSpec::Switching { threshold, left, right } => Equation::Switching { threshold, left, right },
            EquationSpec::Log10 { of } => Equation::Log10 { of },
            EquationSpec::Pow10 { of } => Equation::Pow10 { of },
            EquationSpec::Sum { terms } => Equation::Sum { terms },
            EquationSpec::Product { factors } => Equation::Product { factors },
            EquationSpec::Quotient { numerator, denominator } => Equation::Quotient { numerator, denominator },
            EquationSpec::Scaled { factor, of } => Equation::Scaled { factor, of },
            EquationSpec::Within { min, max, of } => {
                if min > max || min.is_nan() || max.is_nan() {
                    return Err(format!("within({min}, {max}) has min above max"));
                }
                Equation::Within { min, max, of }
            }
        })
    }
}

impl Equation {
    pub fn constant(value: f64) -> Self {
        Equation::Constant { value }
    }

    /// Line through two points. The points must have distinct `x` values.
    pub fn linear(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        assert!(
            x1 != x2,
            "linear equation needs two distinct x values, got x1 = x2 = {x1}"
        );
        Equation::Linear { x1, y1, x2, y2 }
    }

    pub fn switching(threshold: f64, left: Equation, right: Equation) -> Self {
        Equation::Switching {
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn log10(of: Equation) -> Self {
        Equation::Log10 { of: Box::new(of) }
    }

    pub fn pow10(of: Equation) -> Self {
        Equation::Pow10 { of: Box::new(of) }
    }

    pub fn quotient(numerator: Equation, denominator: Equation) -> Self {
        Equation::Quotient {
            numerator: Box::new(numerator),
            denominator: Box::new(denominator),
        }
    }

    pub fn scaled(factor: f64, of: Equation) -> Self {
        Equation::Scaled {
            factor,
            of: Box::new(of),
        }
    }

    /// Restricts the output of this equation to `[min, max]`.
    pub fn within(self, min: f64, max: f64) -> Self {
        assert!(min <= max, "within({min}, {max}) has min above max");
        Equation::Within {
            min,
            max,
            of: Box::new(self),
        }
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        match self {
            Equation::Constant { value } => *value,
            Equation::Linear { x1, y1, x2, y2 } => y1 + (x - x1) * (y2 - y1) / (x2 - x1),
            Equation::Switching {
                threshold,
                left,
                right,
            } => {
                if x < *threshold {
                    left.evaluate(x)
                } else {
                    right.evaluate(x)
                }
            }
            Equation::Log10 { of } => {
                let value = of.evaluate(x);
                if value > 0.0 {
                    value.log10()
                } else {
                    0.0
                }
            }
            Equation::Pow10 { of } => 10f64.powf(of.evaluate(x)),
            Equation::Sum { terms } => terms.iter().map(|t| t.evaluate(x)).sum(),
            Equation::Product { factors } => factors.iter().map(|f| f.evaluate(x)).product(),
            Equation::Quotient {
                numerator,
                denominator,
            } => {
                let denom = denominator.evaluate(x);
                if denom == 0.0 {
                    0.0
                } else {
                    numerator.evaluate(x) / denom
                }
            }
            Equation::Scaled { factor, of } => factor * of.evaluate(x),
            Equation::Within { min, max, of } => of.evaluate(x).clamp(*min, *max),
        }
    }

    /// Evaluates and rounds to the nearest non-negative molecule count.
    pub fn evaluate_count(&self, x: f64) -> usize {
        let value = self.evaluate(x).round();
        if value.is_finite() && value > 0.0 {
            value as usize
        } else {
            0
        }
    }

    /// Checks that the equation never decreases across `points` evenly
    /// spaced samples of `[from, to]`.
    pub fn is_monotonic_on(&self, from: f64, to: f64, points: usize) -> bool {
        let points = points.max(2);
        let step = (to - from) / (points - 1) as f64;
        let mut last = self.evaluate(from);
        for i in 1..points {
            let next = self.evaluate(from + step * i as f64);
            if next + crate::config::EQUATION_TOLERANCE < last {
                return false;
            }
            last = next;
        }
        true
    }
}

impl From<f64> for Equation {
    fn from(value: f64) -> Self {
        Equation::constant(value)
    }
}

impl Add for Equation {
    type Output = Equation;

    fn add(self, rhs: Equation) -> Equation {
        match self {
            Equation::Sum { mut terms } => {
                terms.push(rhs);
                Equation::Sum { terms }
            }
            lhs => Equation::Sum {
                terms: vec![lhs, rhs],
            },
        }
    }
}

impl Add<f64> for Equation {
    type Output = Equation;

    fn add(self, rhs: f64) -> Equation {
        self + Equation::constant(rhs)
    }
}

impl Sub for Equation {
    type Output = Equation;

    fn sub(self, rhs: Equation) -> Equation {
        self + (-rhs)
    }
}

impl Sub<f64> for Equation {
    type Output = Equation;

    fn sub(self, rhs: f64) -> Equation {
        self + Equation::constant(-rhs)
    }
}

impl Mul for Equation {
    type Output = Equation;

    fn mul(self, rhs: Equation) -> Equation {
        match self {
            Equation::Product { mut factors } => {
                factors.push(rhs);
                Equation::Product { factors }
            }
            lhs => Equation::Product {
                factors: vec![lhs, rhs],
            },
        }
    }
}

impl Mul<f64> for Equation {
    type Output = Equation;

    fn mul(self, rhs: f64) -> Equation {
        Equation::scaled(rhs, self)
    }
}

impl Div for Equation {
    type Output = Equation;

    fn div(self, rhs: Equation) -> Equation {
        Equation::quotient(self, rhs)
    }
}

impl Neg for Equation {
    type Output = Equation;

    fn neg(self) -> Equation {
        Equation::scaled(-1.0, self)
    }
}
