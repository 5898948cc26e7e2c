//! Hyperparameter optimization by random search.
//!
//! A [`Trial`] hands out hyperparameters through its `suggest_*` methods and keeps
//! track of what it suggested. [`Agent::sample_parameters`](crate::Agent::sample_parameters)
//! turns a trial into an agent config, and a [`Study`] runs trials against an
//! objective and keeps the best one.
//!
//! ```rust
//! use berry_core::tuner::Study;
//!
//! let mut study = Study::new(0);
//! study
//!     .optimize(20, |trial| {
//!         let x = trial.suggest_float("x", -1.0, 1.0)?;
//!         Ok(-(x * x) as f32)
//!     })
//!     .unwrap();
//! let best = study.best_trial().unwrap();
//! assert!(best.value.unwrap() <= 0.0);
//! ```
use crate::{
    error::BerryError,
    record::{Record, RecordValue},
    seeding,
};
use anyhow::Result;
use log::{info, warn};
use rand::{rngs::SmallRng, Rng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A value suggested by a [`Trial`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A categorical value.
    String(String),
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

/// A single evaluation of the objective.
#[derive(Debug, Clone)]
pub struct Trial {
    /// Index of the trial in the study.
    pub number: usize,

    /// Suggested parameters.
    pub params: BTreeMap<String, ParamValue>,

    /// Objective value, set when the trial completes.
    pub value: Option<f32>,

    rng: SmallRng,
}

impl Trial {
    /// Constructs a trial.
    pub fn new(number: usize, rng: SmallRng) -> Self {
        Self {
            number,
            params: BTreeMap::new(),
            value: None,
            rng,
        }
    }

    fn check_range(name: &str, low: f64, high: f64) -> Result<()> {
        if low > high || !low.is_finite() || !high.is_finite() {
            return Err(BerryError::InvalidRange {
                name: name.to_string(),
                low,
                high,
            }
            .into());
        }
        Ok(())
    }

    /// Suggests a float in `[low, high]` uniformly.
    pub fn suggest_float(&mut self, name: &str, low: f64, high: f64) -> Result<f64> {
        Self::check_range(name, low, high)?;
        let v = if low == high {
            low
        } else {
            self.rng.gen_range(low..high)
        };
        self.params.insert(name.to_string(), ParamValue::Float(v));
        Ok(v)
    }

    /// Suggests a float in `[low, high]` uniformly in the log domain.
    pub fn suggest_loguniform(&mut self, name: &str, low: f64, high: f64) -> Result<f64> {
        Self::check_range(name, low, high)?;
        if low <= 0.0 {
            return Err(BerryError::InvalidRange {
                name: name.to_string(),
                low,
                high,
            }
            .into());
        }
        let v = if low == high {
            low
        } else {
            self.rng.gen_range(low.ln()..high.ln()).exp().min(high).max(low)
        };
        self.params.insert(name.to_string(), ParamValue::Float(v));
        Ok(v)
    }

    /// Suggests an integer in `[low, high]` uniformly.
    pub fn suggest_int(&mut self, name: &str, low: i64, high: i64) -> Result<i64> {
        Self::check_range(name, low as f64, high as f64)?;
        let v = self.rng.gen_range(low..=high);
        self.params.insert(name.to_string(), ParamValue::Int(v));
        Ok(v)
    }

    /// Suggests one of `choices` uniformly.
    pub fn suggest_categorical<T>(&mut self, name: &str, choices: &[T]) -> Result<T>
    where
        T: Clone + Into<ParamValue>,
    {
        if choices.is_empty() {
            return Err(BerryError::InvalidParameters(format!("no choice for {}", name)).into());
        }
        let v = choices[self.rng.gen_range(0..choices.len())].clone();
        self.params.insert(name.to_string(), v.clone().into());
        Ok(v)
    }

    /// The suggested parameters and the objective value as a [`Record`].
    pub fn to_record(&self) -> Record {
        let mut record = Record::from_scalar("trial", self.number as f32);
        for (k, v) in self.params.iter() {
            let v = match v {
                ParamValue::Int(v) => RecordValue::Scalar(*v as f32),
                ParamValue::Float(v) => RecordValue::Scalar(*v as f32),
                ParamValue::String(v) => RecordValue::String(v.clone()),
            };
            record.insert(k.clone(), v);
        }
        if let Some(value) = self.value {
            record.insert("objective", RecordValue::Scalar(value));
        }
        record
    }
}

/// A random search maximizing an objective.
pub struct Study {
    trials: Vec<Trial>,
    rng: SmallRng,
}

impl Study {
    /// Constructs a study whose trials are seeded from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            trials: vec![],
            rng: seeding::rng_from_seed(Some(seed)),
        }
    }

    /// Runs `n_trials` trials.
    ///
    /// Errors of the objective abort the study, except that a non-finite objective
    /// value only discards the trial.
    pub fn optimize<F>(&mut self, n_trials: usize, mut objective: F) -> Result<()>
    where
        F: FnMut(&mut Trial) -> Result<f32>,
    {
        for _ in 0..n_trials {
            let number = self.trials.len();
            let rng = seeding::rng_from_seed(Some(self.rng.gen()));
            let mut trial = Trial::new(number, rng);
            let value = objective(&mut trial)?;
            if value.is_finite() {
                info!("Trial {} finished with value {} and parameters {:?}", number, value, trial.params);
                trial.value = Some(value);
            } else {
                warn!("Trial {} discarded: objective value {}", number, value);
            }
            self.trials.push(trial);
        }
        Ok(())
    }

    /// All trials, completed or not.
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    /// The trial with the largest objective value.
    pub fn best_trial(&self) -> Result<&Trial> {
        self.trials
            .iter()
            .filter(|t| t.value.is_some())
            .max_by(|a, b| a.value.unwrap_or(f32::MIN).total_cmp(&b.value.unwrap_or(f32::MIN)))
            .ok_or_else(|| BerryError::NoCompletedTrial.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial() -> Trial {
        Trial::new(0, seeding::rng_from_seed(Some(1)))
    }

    #[test]
    fn test_suggestions_in_range() -> Result<()> {
        let mut t = trial();
        for _ in 0..50 {
            let x = t.suggest_float("x", 0.5, 0.9)?;
            assert!((0.5..=0.9).contains(&x));
            let y = t.suggest_loguniform("y", 1e-4, 1e-1)?;
            assert!((1e-4..=1e-1).contains(&y));
            let n = t.suggest_int("n", 1, 3)?;
            assert!((1..=3).contains(&n));
            let c = t.suggest_categorical("c", &["a", "b"])?;
            assert!(c == "a" || c == "b");
        }
        assert_eq!(t.params.len(), 4);
        Ok(())
    }

    #[test]
    fn test_invalid_ranges() {
        let mut t = trial();
        assert!(t.suggest_float("x", 1.0, 0.0).is_err());
        assert!(t.suggest_loguniform("x", 0.0, 1.0).is_err());
        assert!(t.suggest_categorical::<i64>("x", &[]).is_err());
    }

    #[test]
    fn test_study_keeps_best() -> Result<()> {
        let mut study = Study::new(3);
        study.optimize(10, |t| Ok(t.suggest_int("k", 0, 100)? as f32))?;
        let best = study.best_trial()?.value.unwrap();
        for t in study.trials() {
            assert!(t.value.unwrap() <= best);
        }
        Ok(())
    }

    #[test]
    fn test_study_without_completed_trial() -> Result<()> {
        let mut study = Study::new(0);
        study.optimize(2, |_| Ok(f32::NAN))?;
        assert!(study.best_trial().is_err());
        Ok(())
    }
}
