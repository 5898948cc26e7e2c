//! Observation and action spaces.
use crate::error::BerryError;
use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// An element of a [`Space`].
#[derive(Debug, Clone, PartialEq)]
pub enum SpaceSample {
    /// An element of [`Space::Discrete`].
    Discrete(usize),

    /// An element of [`Space::Box`].
    Box(Vec<f32>),
}

/// A set of observations or actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Space {
    /// `{0, 1, ..., n - 1}`.
    Discrete {
        /// The number of elements.
        n: usize,
    },

    /// A box in `R^d`, where `d` is the product of `shape`.
    ///
    /// `low` and `high` are given per element and may be infinite.
    Box {
        /// Lower bounds.
        low: Vec<f32>,
        /// Upper bounds.
        high: Vec<f32>,
        /// Shape of an element.
        shape: Vec<usize>,
    },
}

impl Space {
    /// A discrete space with `n` elements.
    pub fn discrete(n: usize) -> Self {
        Space::Discrete { n }
    }

    /// A box space. `low` and `high` must have `shape.iter().product()` elements.
    pub fn boxed(low: Vec<f32>, high: Vec<f32>, shape: Vec<usize>) -> Result<Self> {
        let dim: usize = shape.iter().product();
        if low.len() != dim || high.len() != dim {
            return Err(BerryError::InvalidSpace(format!(
                "bounds of length {} and {} for shape {:?}",
                low.len(),
                high.len(),
                shape
            ))
            .into());
        }
        if low.iter().zip(high.iter()).any(|(l, h)| l > h) {
            return Err(BerryError::InvalidSpace("low > high".to_string()).into());
        }
        Ok(Space::Box { low, high, shape })
    }

    /// The number of elements of a discrete space.
    pub fn n(&self) -> Option<usize> {
        match self {
            Space::Discrete { n } => Some(*n),
            Space::Box { .. } => None,
        }
    }

    /// Samples an element uniformly.
    ///
    /// A dimension of a box that is unbounded on either side is sampled from
    /// the standard normal distribution, shifted into the bounded side if any.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SpaceSample {
        match self {
            Space::Discrete { n } => SpaceSample::Discrete(rng.gen_range(0..*n)),
            Space::Box { low, high, .. } => {
                let v = low
                    .iter()
                    .zip(high.iter())
                    .map(|(&l, &h)| {
                        if l.is_finite() && h.is_finite() {
                            let u: f64 = rng.gen();
                            let x = l as f64 + (h as f64 - l as f64) * u;
                            (x as f32).clamp(l, h)
                        } else {
                            let z = standard_normal(&mut *rng);
                            if l.is_finite() {
                                l + z.abs()
                            } else if h.is_finite() {
                                h - z.abs()
                            } else {
                                z
                            }
                        }
                    })
                    .collect();
                SpaceSample::Box(v)
            }
        }
    }

    /// Returns `true` if `x` is an element of the space.
    pub fn contains(&self, x: &SpaceSample) -> bool {
        match (self, x) {
            (Space::Discrete { n }, SpaceSample::Discrete(i)) => i < n,
            (Space::Box { low, high, .. }, SpaceSample::Box(v)) => {
                v.len() == low.len()
                    && v
                        .iter()
                        .zip(low.iter().zip(high.iter()))
                        .all(|(x, (l, h))| l <= x && x <= h)
            }
            _ => false,
        }
    }
}

/// Box-Muller transform on two uniform draws.
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let u1: f32 = rng.gen::<f32>().max(f32::MIN_POSITIVE);
    let u2: f32 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}
