// equation/series.rs
// Sampling equations into numeric series for charts and tables

use serde::{Deserialize, Serialize};

use super::Equation;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub x: f64,
    pub y: f64,
}

/// Evenly spaced samples of an equation over an input range.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<SeriesPoint> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<SeriesPoint> {
        self.points.last().copied()
    }

    /// Smallest and largest `y` in the series.
    pub fn y_range(&self) -> Option<(f64, f64)> {
        let first = self.points.first()?.y;
        Some(self.points.iter().fold((first, first), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        }))
    }
}

impl Equation {
    /// Samples `points` values of the equation between `from` and `to`
    /// inclusive. A request for 0 or 1 points still returns one point,
    /// the value at `from`.
    pub fn sample(&self, from: f64, to: f64, points: usize) -> Series {
        if points < 2 {
            return Series {
                points: vec![SeriesPoint {
                    x: from,
                    y: self.evaluate(from),
                }],
            };
        }
        let step = (to - from) / (points - 1) as f64;
        let points = (0..points)
            .map(|i| {
                // pin the final sample so float drift never skips `to`
                let x = if i == points - 1 { to } else { from + step * i as f64 };
                SeriesPoint {
                    x,
                    y: self.evaluate(x),
                }
            })
            .collect();
        Series { points }
    }
}
