//! Core engine for the segregate workspace: the Schelling segregation
//! model on a bordered rectangular grid.
//!
//! The engine owns the grid, the vacancy bookkeeping, and the per-round
//! update loop. Rendering and flag parsing live in `segregate-app`; the
//! accessors on [`WorldState`] are the whole surface a front-end needs.

use std::collections::VecDeque;
use std::fmt;

use rand::{Rng, SeedableRng, rngs::SmallRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// State of a single grid site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Red,
    Blue,
}

impl Cell {
    /// Whether the cell holds an agent.
    #[must_use]
    pub const fn is_agent(self) -> bool {
        !matches!(self, Cell::Empty)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SegregationError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Static configuration for a segregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegregationConfig {
    /// Interior grid rows (the stored grid adds a one-cell border).
    pub rows: usize,
    /// Interior grid columns.
    pub cols: usize,
    /// Percent of same-type neighbors required for satisfaction.
    pub similar: u32,
    /// Percent of populated sites holding red agents (blue = 100 - red).
    pub red: u32,
    /// Percent of all sites left vacant.
    pub empty: u32,
    /// Relocation strategy applied to unsatisfied agents.
    pub strategy: RelocationStrategy,
    /// Optional RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
    /// Maximum number of recent round summaries retained in-memory.
    pub history_capacity: usize,
}

impl Default for SegregationConfig {
    fn default() -> Self {
        Self {
            rows: 24,
            cols: 80,
            similar: 30,
            red: 50,
            empty: 10,
            strategy: RelocationStrategy::default(),
            rng_seed: None,
            history_capacity: 256,
        }
    }
}

impl SegregationConfig {
    /// Total interior sites.
    #[must_use]
    pub const fn sites(&self) -> usize {
        self.rows * self.cols
    }

    /// Number of populated sites, truncating toward zero.
    #[must_use]
    pub const fn populated(&self) -> usize {
        self.sites() * (100 - self.empty as usize) / 100
    }

    /// Number of red agents among the populated sites.
    #[must_use]
    pub const fn red_count(&self) -> usize {
        self.populated() * self.red as usize / 100
    }

    /// Number of blue agents among the populated sites.
    #[must_use]
    pub const fn blue_count(&self) -> usize {
        self.populated() - self.red_count()
    }

    fn validate(&self) -> Result<(), SegregationError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(SegregationError::InvalidConfig(
                "grid dimensions must be non-zero",
            ));
        }
        if self.similar > 100 || self.red > 100 || self.empty > 100 {
            return Err(SegregationError::InvalidConfig(
                "percent fields must not exceed 100",
            ));
        }
        if self.history_capacity == 0 {
            return Err(SegregationError::InvalidConfig(
                "history_capacity must be non-zero",
            ));
        }
        // Guards the rejection-sampling placement loops against an
        // over-count that would never find an empty site.
        if self.red_count() + self.blue_count() > self.sites() {
            return Err(SegregationError::InvalidConfig(
                "population exceeds available sites",
            ));
        }
        Ok(())
    }

    /// Returns the configured RNG seed, generating one from entropy if absent.
    fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

/// Bordered cell grid stored row-major as `(rows+2) x (cols+2)`.
///
/// The outer ring stays permanently [`Cell::Empty`] so the Moore-neighbor
/// scan never indexes out of range; interior sites are rows `1..=rows` and
/// cols `1..=cols`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Allocate an all-empty grid with the given interior dimensions.
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; (rows + 2) * (cols + 2)],
        }
    }

    /// Interior row count.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Interior column count.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Full bordered cell slice, row-major.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Encode `(row, col)` as a flat index into the bordered grid.
    #[must_use]
    pub const fn encode(&self, row: usize, col: usize) -> usize {
        row * (self.cols + 2) + col
    }

    /// Inverse of [`Grid::encode`].
    #[must_use]
    pub const fn coord(&self, index: usize) -> (usize, usize) {
        (index / (self.cols + 2), index % (self.cols + 2))
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[self.encode(row, col)]
    }

    fn set(&mut self, row: usize, col: usize, cell: Cell) {
        let index = self.encode(row, col);
        self.cells[index] = cell;
    }

    /// Same-type neighbor percentage for an agent of `kind` standing at
    /// `(row, col)`, truncated to an integer in `[0, 100]`.
    ///
    /// Scans the eight Moore neighbors; border cells are always empty and
    /// count toward neither type. An agent with no occupied neighbors has
    /// a utility of 0, and so does [`Cell::Empty`].
    #[must_use]
    pub fn utility(&self, kind: Cell, row: usize, col: usize) -> u32 {
        if kind == Cell::Empty {
            return 0;
        }

        let mut red_count = 0u32;
        let mut blue_count = 0u32;
        for r in row - 1..=row + 1 {
            for c in col - 1..=col + 1 {
                if r == row && c == col {
                    continue;
                }
                match self.get(r, c) {
                    Cell::Red => red_count += 1,
                    Cell::Blue => blue_count += 1,
                    Cell::Empty => {}
                }
            }
        }

        let total = red_count + blue_count;
        if total == 0 {
            return 0;
        }
        let same = if kind == Cell::Red {
            red_count
        } else {
            blue_count
        };
        same * 100 / total
    }

    /// Whether the occupant of `(row, col)` meets the similarity threshold.
    /// Empty cells are trivially satisfied.
    #[must_use]
    pub fn is_satisfied(&self, kind: Cell, row: usize, col: usize, threshold: u32) -> bool {
        if kind == Cell::Empty {
            return true;
        }
        self.utility(kind, row, col) >= threshold
    }
}

/// Ordered collection of currently-empty interior sites, stored as encoded
/// grid indices.
///
/// The initial row-major build order doubles as vacancy age for the
/// age-ordered strategies, so every removal here preserves the relative
/// order of the remaining entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacancyList {
    slots: Vec<usize>,
}

impl VacancyList {
    /// Build the list by scanning the grid interior in row-major order.
    #[must_use]
    pub fn from_grid(grid: &Grid) -> Self {
        let mut slots = Vec::new();
        for row in 1..=grid.rows() {
            for col in 1..=grid.cols() {
                if grid.get(row, col) == Cell::Empty {
                    slots.push(grid.encode(row, col));
                }
            }
        }
        Self { slots }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Entries in age order (oldest first, modulo the age-reset swap).
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.slots
    }

    /// Remove and return the entry at `position`, preserving the order of
    /// the rest.
    pub fn remove_at(&mut self, position: usize) -> usize {
        self.slots.remove(position)
    }

    /// Remove and return the oldest entry, if any.
    pub fn take_front(&mut self) -> Option<usize> {
        if self.slots.is_empty() {
            None
        } else {
            Some(self.slots.remove(0))
        }
    }

    /// Remove the entry matching an encoded index, if present.
    pub fn remove_value(&mut self, index: usize) -> bool {
        match self.slots.iter().position(|&slot| slot == index) {
            Some(position) => {
                self.slots.remove(position);
                true
            }
            None => false,
        }
    }

    /// Append a freshly vacated site.
    pub fn push(&mut self, index: usize) {
        self.slots.push(index);
    }

    /// Swap the newest entry with the oldest one.
    ///
    /// The age-ordered strategies apply this after every relocation; the
    /// resulting order is deliberately not a clean FIFO.
    pub fn swap_front_back(&mut self) {
        let len = self.slots.len();
        if len > 1 {
            self.slots.swap(0, len - 1);
        }
    }
}

/// Site-selection algorithm applied to each unsatisfied agent.
///
/// Strategies are selected by the configuration index 0-4; the default is
/// the exhaustive grid scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RelocationStrategy {
    /// 0: random vacancies, bounded attempts, accept the first strict
    /// improvement; otherwise fall back to a plain uniform pick.
    RandomImproving,
    /// 1: one uniform random vacancy, unconditionally.
    UniformRandom,
    /// 2: oldest-first vacancy scan, accept the first strict improvement.
    OldestImproving,
    /// 3: the oldest vacancy, unconditionally.
    OldestFirst,
    /// 4: row-major grid scan, accept the first empty site with a strict
    /// improvement.
    #[default]
    FirstImproving,
}

impl RelocationStrategy {
    /// Map a configuration index to a strategy.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::RandomImproving),
            1 => Some(Self::UniformRandom),
            2 => Some(Self::OldestImproving),
            3 => Some(Self::OldestFirst),
            4 => Some(Self::FirstImproving),
            _ => None,
        }
    }

    /// Configuration index of this strategy.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::RandomImproving => 0,
            Self::UniformRandom => 1,
            Self::OldestImproving => 2,
            Self::OldestFirst => 3,
            Self::FirstImproving => 4,
        }
    }

    /// Human-readable description shown in the status line.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::RandomImproving => "Pick a random available site with higher utility if possible",
            Self::UniformRandom => "Pick a random available site",
            Self::OldestImproving => {
                "Pick the first available site ordered by vacant time with higher utility"
            }
            Self::OldestFirst => "Pick the first available site ordered by vacant time",
            Self::FirstImproving => "Pick the first vacant site with higher utility",
        }
    }

    /// Whether the strategy treats the vacancy list as an age queue and
    /// wants the age-reset swap after each relocation.
    #[must_use]
    pub const fn is_age_ordered(self) -> bool {
        matches!(self, Self::OldestImproving | Self::OldestFirst)
    }

    /// Select a destination for an agent of `kind` standing at
    /// `(row, col)`.
    ///
    /// A returned site has already been removed from `vacancies`; `None`
    /// leaves the agent in place for this round. "Improvement" is always
    /// strict: equal utility does not justify a move.
    pub fn select_site(
        self,
        kind: Cell,
        row: usize,
        col: usize,
        grid: &Grid,
        vacancies: &mut VacancyList,
        rng: &mut SmallRng,
    ) -> Option<(usize, usize)> {
        match self {
            Self::RandomImproving => {
                let current = grid.utility(kind, row, col);
                // Attempts are bounded by the list length, not tracked
                // per-entry, so the same vacancy may be sampled twice.
                for _ in 0..vacancies.len() {
                    let position = rng.random_range(0..vacancies.len());
                    let (vr, vc) = grid.coord(vacancies.as_slice()[position]);
                    if grid.utility(kind, vr, vc) > current {
                        vacancies.remove_at(position);
                        return Some((vr, vc));
                    }
                }
                select_uniform(grid, vacancies, rng)
            }
            Self::UniformRandom => select_uniform(grid, vacancies, rng),
            Self::OldestImproving => {
                let current = grid.utility(kind, row, col);
                for position in 0..vacancies.len() {
                    let (vr, vc) = grid.coord(vacancies.as_slice()[position]);
                    if grid.utility(kind, vr, vc) > current {
                        vacancies.remove_at(position);
                        return Some((vr, vc));
                    }
                }
                None
            }
            Self::OldestFirst => vacancies.take_front().map(|slot| grid.coord(slot)),
            Self::FirstImproving => {
                let current = grid.utility(kind, row, col);
                for vr in 1..=grid.rows() {
                    for vc in 1..=grid.cols() {
                        if grid.get(vr, vc) == Cell::Empty
                            && grid.utility(kind, vr, vc) > current
                        {
                            vacancies.remove_value(grid.encode(vr, vc));
                            return Some((vr, vc));
                        }
                    }
                }
                None
            }
        }
    }
}

/// Uniform pick over the vacancy list; `None` only when the list is empty.
fn select_uniform(
    grid: &Grid,
    vacancies: &mut VacancyList,
    rng: &mut SmallRng,
) -> Option<(usize, usize)> {
    if vacancies.is_empty() {
        return None;
    }
    let position = rng.random_range(0..vacancies.len());
    Some(grid.coord(vacancies.remove_at(position)))
}

/// Statistics emitted by one round of the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: u64,
    pub satisfied: usize,
    pub unsatisfied: usize,
    pub relocated: usize,
}

/// Aggregate simulation state shared with the rendering layer.
pub struct WorldState {
    config: SegregationConfig,
    grid: Grid,
    vacancies: VacancyList,
    rng: SmallRng,
    round: u64,
    satisfied: usize,
    unsatisfied: Vec<usize>,
    history: VecDeque<RoundSummary>,
}

impl fmt::Debug for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldState")
            .field("config", &self.config)
            .field("round", &self.round)
            .field("satisfied", &self.satisfied)
            .field("vacancies", &self.vacancies.len())
            .finish()
    }
}

impl WorldState {
    /// Instantiate a world from the supplied configuration, placing the
    /// agent population at random.
    pub fn new(config: SegregationConfig) -> Result<Self, SegregationError> {
        config.validate()?;
        let mut rng = config.seeded_rng();
        let mut grid = Grid::new(config.rows, config.cols);

        place_agents(&mut grid, Cell::Red, config.red_count(), &mut rng);
        place_agents(&mut grid, Cell::Blue, config.blue_count(), &mut rng);

        let vacancies = VacancyList::from_grid(&grid);
        debug!(
            rows = config.rows,
            cols = config.cols,
            red = config.red_count(),
            blue = config.blue_count(),
            vacant = vacancies.len(),
            "world initialized",
        );

        let history_capacity = config.history_capacity;
        Ok(Self {
            config,
            grid,
            vacancies,
            rng,
            round: 0,
            satisfied: 0,
            unsatisfied: Vec::new(),
            history: VecDeque::with_capacity(history_capacity),
        })
    }

    /// Execute one round: scan for unsatisfied agents, relocate them in
    /// shuffled order, and return the round's statistics.
    pub fn step(&mut self) -> RoundSummary {
        self.round += 1;
        self.satisfied = 0;

        let mut movers = std::mem::take(&mut self.unsatisfied);
        movers.clear();
        self.stage_scan(&mut movers);
        movers.shuffle(&mut self.rng);
        let relocated = self.stage_relocate(&movers);

        let summary = RoundSummary {
            round: self.round,
            satisfied: self.satisfied,
            unsatisfied: movers.len(),
            relocated,
        };
        self.unsatisfied = movers;

        debug!(
            round = summary.round,
            satisfied = summary.satisfied,
            unsatisfied = summary.unsatisfied,
            relocated = summary.relocated,
            "round complete",
        );
        if self.history.len() >= self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(summary.clone());
        summary
    }

    /// Row-major satisfaction scan; fills `movers` with the encoded
    /// positions of unsatisfied agents.
    fn stage_scan(&mut self, movers: &mut Vec<usize>) {
        let threshold = self.config.similar;
        for row in 1..=self.config.rows {
            for col in 1..=self.config.cols {
                let kind = self.grid.get(row, col);
                if self.grid.is_satisfied(kind, row, col, threshold) {
                    self.satisfied += 1;
                } else {
                    movers.push(self.grid.encode(row, col));
                }
            }
        }
    }

    /// Attempt to relocate each mover, returning how many found a site.
    fn stage_relocate(&mut self, movers: &[usize]) -> usize {
        let mut relocated = 0;
        for &origin in movers {
            let (row, col) = self.grid.coord(origin);
            let kind = self.grid.get(row, col);
            let destination = self.config.strategy.select_site(
                kind,
                row,
                col,
                &self.grid,
                &mut self.vacancies,
                &mut self.rng,
            );
            let Some((new_row, new_col)) = destination else {
                continue;
            };

            self.grid.set(new_row, new_col, kind);
            self.grid.set(row, col, Cell::Empty);
            self.vacancies.push(origin);
            if self.config.strategy.is_age_ordered() {
                self.vacancies.swap_front_back();
            }
            relocated += 1;
        }
        relocated
    }

    /// Returns an immutable reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &SegregationConfig {
        &self.config
    }

    /// Read-only access to the bordered grid.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Full bordered cell slice, row-major.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        self.grid.cells()
    }

    /// Read-only access to the vacancy list.
    #[must_use]
    pub fn vacancies(&self) -> &VacancyList {
        &self.vacancies
    }

    /// Rounds completed so far.
    #[must_use]
    pub const fn round(&self) -> u64 {
        self.round
    }

    /// Satisfied interior sites as of the last round's scan.
    #[must_use]
    pub const fn satisfied_count(&self) -> usize {
        self.satisfied
    }

    /// Satisfied sites as an integer percentage of all interior sites.
    #[must_use]
    pub const fn satisfied_percent(&self) -> u32 {
        (self.satisfied * 100 / self.config.sites()) as u32
    }

    /// Whether every interior site was satisfied on the last scan.
    #[must_use]
    pub const fn is_converged(&self) -> bool {
        self.satisfied == self.config.sites()
    }

    /// Active strategy's human-readable description.
    #[must_use]
    pub const fn strategy_description(&self) -> &'static str {
        self.config.strategy.describe()
    }

    /// Iterate over retained round summaries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &RoundSummary> {
        self.history.iter()
    }
}

/// Place `count` agents of `kind` on distinct empty interior sites by
/// rejection sampling.
fn place_agents(grid: &mut Grid, kind: Cell, count: usize, rng: &mut SmallRng) {
    let sites = grid.rows() * grid.cols();
    for _ in 0..count {
        loop {
            let pick = rng.random_range(0..sites);
            let row = pick / grid.cols() + 1;
            let col = pick % grid.cols() + 1;
            if grid.get(row, col) == Cell::Empty {
                grid.set(row, col, kind);
                break;
            }
        }
    }
}
