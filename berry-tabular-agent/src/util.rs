//! Tables and helpers shared by tabular agents.
use anyhow::Result;
use berry_core::{error::BerryError, record::RecordValue, Env, Space};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// A dense `n_rows x n_cols` table, e.g., action values indexed by state and action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    n_rows: usize,
    n_cols: usize,
    values: Vec<f32>,
}

impl Table {
    /// A table filled with zeros.
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            values: vec![0f32; n_rows * n_cols],
        }
    }

    /// The shape of the table.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Gets an entry.
    pub fn get(&self, r: usize, c: usize) -> f32 {
        self.values[r * self.n_cols + c]
    }

    /// Gets an entry.
    pub fn get_mut(&mut self, r: usize, c: usize) -> &mut f32 {
        &mut self.values[r * self.n_cols + c]
    }

    /// A row of the table.
    pub fn row(&self, r: usize) -> &[f32] {
        &self.values[r * self.n_cols..(r + 1) * self.n_cols]
    }

    /// A row of the table.
    pub fn row_mut(&mut self, r: usize) -> &mut [f32] {
        &mut self.values[r * self.n_cols..(r + 1) * self.n_cols]
    }

    /// Index of the largest entry of a row; the first one on ties.
    pub fn argmax(&self, r: usize) -> usize {
        argmax(self.row(r))
    }

    /// The largest entry of a row.
    pub fn max(&self, r: usize) -> f32 {
        self.row(r).iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Sets all entries to zero.
    pub fn fill_zero(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
    }

    /// The table as a value of a record.
    pub fn to_record_value(&self) -> RecordValue {
        RecordValue::Array2(self.values.clone(), [self.n_rows, self.n_cols])
    }

    /// Saves the table in bincode format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut wtr = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut wtr, self)?;
        wtr.flush()?;
        Ok(())
    }

    /// Loads a table saved with [`Table::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let rdr = BufReader::new(File::open(path)?);
        let table: Self = bincode::deserialize_from(rdr)?;
        if table.values.len() != table.n_rows * table.n_cols {
            return Err(BerryError::InvalidParameters("corrupted table".to_string()).into());
        }
        Ok(table)
    }
}

/// Index of the largest value; the first one on ties.
pub fn argmax(v: &[f32]) -> usize {
    let mut best = 0;
    for (i, x) in v.iter().enumerate() {
        if *x > v[best] {
            best = i;
        }
    }
    best
}

/// Softmax of `v / temperature`.
pub fn softmax(v: &[f32], temperature: f32) -> Vec<f32> {
    let max = v.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = v.iter().map(|x| ((x - max) / temperature).exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.into_iter().map(|x| x / sum).collect()
}

/// The sizes of the observation and action spaces, both required to be discrete.
pub fn discrete_sizes<E: Env>(env: &E) -> Result<(usize, usize)> {
    match (env.observation_space(), env.action_space()) {
        (Space::Discrete { n: n_obs }, Space::Discrete { n: n_act }) => Ok((*n_obs, *n_act)),
        (obs, act) => Err(BerryError::InvalidSpace(format!(
            "discrete spaces required, got {:?} and {:?}",
            obs, act
        ))
        .into()),
    }
}

/// Saves a config as `config.yaml` in `dir`.
pub fn save_config<C: Serialize>(config: &C, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut file = File::create(dir.join("config.yaml"))?;
    file.write_all(serde_yaml::to_string(config)?.as_bytes())?;
    Ok(())
}

/// Loads `config.yaml` in `dir`.
pub fn load_config<C: DeserializeOwned>(dir: &Path) -> Result<C> {
    let rdr = BufReader::new(File::open(dir.join("config.yaml"))?);
    Ok(serde_yaml::from_reader(rdr)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_argmax_first_on_ties() {
        assert_eq!(argmax(&[0.0, 1.0, 1.0]), 1);
        assert_eq!(argmax(&[2.0, 1.0]), 0);
    }

    #[test]
    fn test_softmax() {
        let p = softmax(&[0.0, 0.0], 1.0);
        assert_eq!(p, vec![0.5, 0.5]);
        let p = softmax(&[1000.0, 0.0], 1.0);
        assert!(p[0] > 0.99 && p[0].is_finite());
    }

    #[test]
    fn test_table_save_load() -> Result<()> {
        let mut table = Table::zeros(2, 3);
        *table.get_mut(1, 2) = 4.0;
        assert_eq!(table.argmax(1), 2);
        assert_eq!(table.max(1), 4.0);

        let dir = TempDir::new("table")?;
        let path = dir.path().join("table.bin");
        table.save(&path)?;
        assert_eq!(Table::load(&path)?, table);
        Ok(())
    }
}
