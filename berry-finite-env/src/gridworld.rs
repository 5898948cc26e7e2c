//! Grid world.
use crate::{FiniteMdp, FiniteMdpConfig};
use anyhow::Result;
use berry_core::error::BerryError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration of [`GridWorld`]. Cells are `(row, col)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridWorldConfig {
    /// The number of rows.
    pub nrows: usize,

    /// The number of columns.
    pub ncols: usize,

    /// The cell where episodes start.
    pub start: (usize, usize),

    /// Cells ending an episode when entered.
    pub terminal_states: Vec<(usize, usize)>,

    /// Reward of entering a cell.
    pub reward_at: Vec<((usize, usize), f32)>,

    /// Blocked cells.
    pub walls: Vec<(usize, usize)>,

    /// Probability of moving in the chosen direction.
    pub success_probability: f32,

    /// Episodes are truncated after this number of steps.
    pub horizon: Option<usize>,
}

impl Default for GridWorldConfig {
    fn default() -> Self {
        Self {
            nrows: 5,
            ncols: 5,
            start: (0, 0),
            terminal_states: vec![(4, 4)],
            reward_at: vec![((4, 4), 1.0)],
            walls: vec![(1, 1), (2, 2)],
            success_probability: 0.9,
            horizon: Some(50),
        }
    }
}

/// Directions of the actions `0..4`: left, right, up, down.
const MOVES: [(isize, isize); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// A grid with walls. States are the free cells in row-major order.
///
/// The chosen direction is followed with probability `success_probability`,
/// otherwise one of the three other directions is taken uniformly. Moves into
/// walls or out of the grid leave the agent in place. The reward of a state and
/// an action is the expected reward of the cell entered; terminal cells are
/// absorbing.
#[derive(Debug, Clone)]
pub struct GridWorld {
    config: GridWorldConfig,
    cells: Vec<(usize, usize)>,
    index: HashMap<(usize, usize), usize>,
}

impl GridWorld {
    /// Lays out the grid.
    pub fn new(config: &GridWorldConfig) -> Result<Self> {
        let inside = |c: &(usize, usize)| c.0 < config.nrows && c.1 < config.ncols;
        let invalid = |msg: String| -> anyhow::Error { BerryError::InvalidEnv(msg).into() };

        if config.nrows == 0 || config.ncols == 0 {
            return Err(invalid("empty grid".to_string()));
        }
        if !(0.0..=1.0).contains(&config.success_probability) {
            return Err(invalid(format!(
                "success_probability = {}",
                config.success_probability
            )));
        }
        for c in config
            .walls
            .iter()
            .chain(config.terminal_states.iter())
            .chain(config.reward_at.iter().map(|(c, _)| c))
            .chain(std::iter::once(&config.start))
        {
            if !inside(c) {
                return Err(invalid(format!("cell {:?} is out of the grid", c)));
            }
        }
        if config.walls.contains(&config.start) {
            return Err(invalid("start cell is a wall".to_string()));
        }
        for c in config
            .terminal_states
            .iter()
            .chain(config.reward_at.iter().map(|(c, _)| c))
        {
            if config.walls.contains(c) {
                return Err(invalid(format!("cell {:?} is a wall", c)));
            }
        }

        let mut cells = vec![];
        let mut index = HashMap::new();
        for r in 0..config.nrows {
            for c in 0..config.ncols {
                if !config.walls.contains(&(r, c)) {
                    index.insert((r, c), cells.len());
                    cells.push((r, c));
                }
            }
        }

        Ok(Self {
            config: config.clone(),
            cells,
            index,
        })
    }

    /// The number of states.
    pub fn n_states(&self) -> usize {
        self.cells.len()
    }

    /// The state of a free cell.
    pub fn state_of(&self, cell: (usize, usize)) -> Option<usize> {
        self.index.get(&cell).copied()
    }

    /// The cell of a state.
    pub fn cell_of(&self, state: usize) -> Option<(usize, usize)> {
        self.cells.get(state).copied()
    }

    fn neighbor(&self, state: usize, action: usize) -> usize {
        let (r, c) = self.cells[state];
        let (dr, dc) = MOVES[action];
        let (nr, nc) = (r as isize + dr, c as isize + dc);
        if nr < 0 || nc < 0 {
            return state;
        }
        self.state_of((nr as usize, nc as usize)).unwrap_or(state)
    }

    fn reward_of(&self, state: usize) -> f32 {
        let cell = self.cells[state];
        self.config
            .reward_at
            .iter()
            .filter(|(c, _)| *c == cell)
            .map(|(_, r)| *r)
            .sum()
    }

    /// Reward and transition tables of the grid.
    pub fn mdp_config(&self) -> FiniteMdpConfig {
        let n = self.n_states();
        let p_success = self.config.success_probability;
        let p_other = (1.0 - p_success) / 3.0;
        let terminal: Vec<usize> = self
            .config
            .terminal_states
            .iter()
            .filter_map(|c| self.state_of(*c))
            .collect();

        let mut rewards = vec![vec![0f32; MOVES.len()]; n];
        let mut transitions = vec![vec![vec![0f32; n]; MOVES.len()]; n];
        for s in 0..n {
            for a in 0..MOVES.len() {
                if terminal.contains(&s) {
                    transitions[s][a][s] = 1.0;
                    continue;
                }
                for b in 0..MOVES.len() {
                    let p = if a == b { p_success } else { p_other };
                    transitions[s][a][self.neighbor(s, b)] += p;
                }
                rewards[s][a] = (0..n)
                    .map(|next| transitions[s][a][next] * self.reward_of(next))
                    .sum();
            }
        }

        let mut initial_state_distribution = vec![0f32; n];
        initial_state_distribution[self.index[&self.config.start]] = 1.0;

        FiniteMdpConfig {
            rewards,
            transitions,
            initial_state_distribution: Some(initial_state_distribution),
            terminal_states: terminal,
            horizon: self.config.horizon,
        }
    }

    /// Builds the grid world as a [`FiniteMdp`].
    pub fn build(config: &GridWorldConfig, seed: u64) -> Result<FiniteMdp> {
        FiniteMdp::new(&Self::new(config)?.mdp_config(), seed)
    }
}
