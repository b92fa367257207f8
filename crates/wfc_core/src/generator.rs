//! Chunked collapse-and-narrow generator.
//!
//! The generator walks the chunk sequence and fills each chunk by repeated
//! minimum-entropy collapse:
//!
//! 1. Reset the chunk's cells to Open.
//! 2. Seed: narrow every owned cell against each collapsed neighbor that
//!    lies outside the chunk.
//! 3. Pick uniformly among the Open cells with the fewest possibilities,
//!    collapse it, and narrow its Open grid neighbors once (no further
//!    propagation).
//! 4. A cell with no possibilities left is a contradiction:
//!    - Planar: reset the chunk and retry, without limit.
//!    - Volumetric: retry, and after `max_fail_count` contradictions
//!      regenerate the previous chunk first. A chunk whose seeds contradict
//!      on its first attempt backs off at once. Backoff nests: the
//!      previous chunk may back off in turn.
//!
//! Generation is steppable. Each `step()` does one unit of work and
//! reports it as a `StepEvent`; nothing else touches the grid between
//! steps, so a scheduler can interleave steps with other work, pace chunks,
//! or cancel between any two steps.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wfc_core::{GenerationConfig, Generator, StepEvent};
//!
//! let mut generator = Generator::new(GenerationConfig::planar(16, 16, 5), Arc::new(catalog))?;
//! loop {
//!     match generator.step()? {
//!         StepEvent::Finished => break,
//!         event => println!("{:?}", event),
//!     }
//! }
//! let output = generator.into_output()?;
//! ```

use bevy_log::{debug, info, trace, warn};
use bevy_math::UVec3;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::catalog::{AdjacencyCatalog, TileId};
use crate::chunk::{Chunk, ChunkPartitioner};
use crate::config::GenerationConfig;
use crate::direction::Dimensionality;
use crate::error::{GenerationError, GenerationResult};
use crate::grid::{Grid, Placement};
use crate::rng::{StdRandom, TileRng};
use crate::terrain::{ElevationSeeder, TerrainSeeder};

/// Counters for diagnosing slow or runaway runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Cells collapsed by drawing, including work later thrown away
    pub collapses: u64,
    /// Open cells found with no possibilities
    pub contradictions: u64,
    /// Times a previous chunk was regenerated
    pub backoffs: u64,
    /// Chunk completions, including regenerated ones
    pub chunks_completed: u64,
    /// Deepest nesting of backoff seen
    pub max_backoff_depth: usize,
}

/// One unit of generation work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    /// A chunk was reset and seeded from its collapsed surroundings
    ChunkStarted {
        index: usize,
        origin: UVec3,
        /// 1 for the first try, incremented on every retry
        attempt: u32,
        /// Possibilities removed by seeding
        narrowed: usize,
    },
    /// A cell was collapsed and its neighbors narrowed
    Collapsed { position: UVec3, tile: TileId },
    /// An Open cell ran out of possibilities; the chunk will be retried
    Contradiction { chunk: usize, position: UVec3 },
    /// The current chunk is waiting while an earlier one is regenerated
    BackedOff { from: usize, to: usize },
    /// Every owned cell of the chunk is collapsed
    ChunkCompleted { index: usize },
    /// All chunks are done
    Finished,
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub grid: Grid,
    /// Collapsed cells to instantiate. Air is left out of volumetric runs.
    pub placements: Vec<Placement>,
    pub stats: GenerationStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Running,
    Finished,
    Failed,
    Cancelled,
}

/// A chunk being generated.
#[derive(Debug, Clone)]
struct ChunkJob {
    chunk: Chunk,
    /// Flat indices of the owned cells
    cells: Vec<usize>,
    /// Contradictions since the last backoff
    fail_count: u32,
    attempt: u32,
    /// Reset and seed before the next collapse
    needs_reset: bool,
    /// At least one cell was drawn since the last reset
    collapsed_this_attempt: bool,
}

impl ChunkJob {
    fn new(chunk: Chunk, grid: &Grid) -> GenerationResult<Self> {
        let cells = chunk
            .positions()
            .map(|p| grid.index_of(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            chunk,
            cells,
            fail_count: 0,
            attempt: 0,
            needs_reset: true,
            collapsed_this_attempt: false,
        })
    }
}

/// Steppable chunked generator. Owns the grid for one run.
pub struct Generator {
    config: GenerationConfig,
    catalog: Arc<AdjacencyCatalog>,
    grid: Grid,
    partitioner: ChunkPartitioner,
    rng: Box<dyn TileRng>,
    /// Next chunk of the main scan
    next_chunk: usize,
    /// Active chunk on top; chunks below are waiting on a backoff
    jobs: Vec<ChunkJob>,
    stats: GenerationStats,
    state: RunState,
}

impl Generator {
    /// Start a run. Volumetric runs pre-fill terrain with an
    /// [`ElevationSeeder`] built from the catalog sentinels.
    pub fn new(config: GenerationConfig, catalog: Arc<AdjacencyCatalog>) -> GenerationResult<Self> {
        match config.dimensionality {
            Dimensionality::Planar => Self::build(config, catalog, None),
            Dimensionality::Volumetric => {
                let seeder = ElevationSeeder::from_catalog(&catalog)?;
                Self::build(config, catalog, Some(&seeder))
            }
        }
    }

    /// Start a run with a custom terrain pre-fill.
    ///
    /// The seeder is applied to every cell before the first chunk, in both
    /// planar and volumetric runs.
    pub fn with_seeder(
        config: GenerationConfig,
        catalog: Arc<AdjacencyCatalog>,
        seeder: &dyn TerrainSeeder,
    ) -> GenerationResult<Self> {
        Self::build(config, catalog, Some(seeder))
    }

    fn build(
        config: GenerationConfig,
        catalog: Arc<AdjacencyCatalog>,
        seeder: Option<&dyn TerrainSeeder>,
    ) -> GenerationResult<Self> {
        config.validate()?;
        catalog.validate()?;

        let mut grid = Grid::new(config.grid_size, config.dimensionality, &catalog)?;
        if let Some(seeder) = seeder {
            for index in 0..grid.len() {
                let position = grid.position_of(index);
                if let Some(cell) = grid.cell_mut(index) {
                    cell.collapse_to(seeder.seed_tile(position));
                }
            }
        }

        let partitioner =
            ChunkPartitioner::new(config.grid_size, config.chunk_size, config.dimensionality)?;

        info!(
            "Starting {:?} generation: grid {}, chunk {}, {} chunks, {} tiles",
            config.dimensionality,
            config.grid_size,
            config.chunk_size,
            partitioner.len(),
            catalog.len()
        );

        Ok(Self {
            rng: Box::new(StdRandom::from_optional_seed(config.seed)),
            config,
            catalog,
            grid,
            partitioner,
            next_chunk: 0,
            jobs: Vec::new(),
            stats: GenerationStats::default(),
            state: RunState::Running,
        })
    }

    /// Replace the random source.
    pub fn with_rng(mut self, rng: Box<dyn TileRng>) -> Self {
        self.rng = rng;
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn catalog(&self) -> &AdjacencyCatalog {
        &self.catalog
    }

    /// Read-only view of the grid, for previews.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn stats(&self) -> GenerationStats {
        self.stats
    }

    pub fn chunk_count(&self) -> usize {
        self.partitioner.len()
    }

    /// Chunk currently being generated.
    pub fn current_chunk(&self) -> Option<Chunk> {
        self.jobs.last().map(|job| job.chunk)
    }

    /// Number of chunks waiting on a backoff.
    pub fn backoff_depth(&self) -> usize {
        self.jobs.len().saturating_sub(1)
    }

    pub fn is_finished(&self) -> bool {
        self.state == RunState::Finished
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Abandon the run. Further steps fail with `Cancelled`.
    pub fn cancel(&mut self) {
        if self.state == RunState::Running {
            info!(
                "Generation cancelled after {} of {} chunks",
                self.next_chunk.saturating_sub(self.jobs.len()),
                self.partitioner.len()
            );
            self.state = RunState::Cancelled;
            self.jobs.clear();
        }
    }

    /// Do one unit of work.
    pub fn step(&mut self) -> GenerationResult<StepEvent> {
        match self.state {
            RunState::Running => {}
            RunState::Cancelled => return Err(GenerationError::Cancelled),
            RunState::Finished | RunState::Failed => return Err(GenerationError::Finished),
        }

        if self.jobs.is_empty() {
            match self.partitioner.chunk(self.next_chunk) {
                Some(chunk) => {
                    self.next_chunk += 1;
                    let job = ChunkJob::new(chunk, &self.grid)?;
                    self.jobs.push(job);
                }
                None => return Ok(self.finish()),
            }
        }

        let top = self.jobs.len() - 1;
        if self.jobs[top].needs_reset {
            return self.start_attempt(top);
        }
        self.collapse_next(top)
    }

    /// Step until the run finishes.
    pub fn run_to_completion(&mut self) -> GenerationResult<GenerationStats> {
        loop {
            if let StepEvent::Finished = self.step()? {
                return Ok(self.stats);
            }
        }
    }

    /// Hand over the finished grid and its placements.
    pub fn into_output(self) -> GenerationResult<GenerationOutput> {
        if self.state != RunState::Finished {
            return Err(GenerationError::Incomplete);
        }

        let air = match self.config.dimensionality {
            Dimensionality::Volumetric => self.catalog.air_tile,
            Dimensionality::Planar => None,
        };
        let placements = self
            .grid
            .placements()
            .into_iter()
            .filter(|p| Some(p.tile) != air)
            .collect();

        Ok(GenerationOutput {
            grid: self.grid,
            placements,
            stats: self.stats,
        })
    }

    /// Reset and seed the chunk on top of the stack.
    fn start_attempt(&mut self, top: usize) -> GenerationResult<StepEvent> {
        self.open_cells(top);

        let dims = self.grid.dimensionality();
        let job = &mut self.jobs[top];
        let mut narrowed = 0;

        for &index in &job.cells {
            let position = self.grid.position_of(index);
            for &dir in dims.directions() {
                let Some(neighbor) = self.grid.neighbor(position, dir) else {
                    continue;
                };
                if job.chunk.contains(neighbor) {
                    continue;
                }
                let Some(neighbor_tile) = self.grid.cell_at(neighbor)?.tile() else {
                    continue;
                };
                if let Some(cell) = self.grid.cell_mut(index) {
                    narrowed += cell.narrow(&self.catalog, neighbor_tile, dir.opposite());
                }
            }
        }

        job.needs_reset = false;
        job.collapsed_this_attempt = false;
        job.attempt += 1;

        debug!(
            "Chunk {} at {} attempt {}: {} cells, seeding removed {} possibilities",
            job.chunk.index,
            job.chunk.origin,
            job.attempt,
            job.cells.len(),
            narrowed
        );

        Ok(StepEvent::ChunkStarted {
            index: job.chunk.index,
            origin: job.chunk.origin,
            attempt: job.attempt,
            narrowed,
        })
    }

    /// Collapse one minimum-entropy cell of the chunk on top of the stack.
    fn collapse_next(&mut self, top: usize) -> GenerationResult<StepEvent> {
        let mut lowest = usize::MAX;
        let mut candidates: Vec<usize> = Vec::new();
        for &index in &self.jobs[top].cells {
            let Some(cell) = self.grid.cell(index) else {
                continue;
            };
            if cell.is_collapsed() {
                continue;
            }
            let entropy = cell.entropy();
            if entropy < lowest {
                lowest = entropy;
                candidates.clear();
            }
            if entropy == lowest {
                candidates.push(index);
            }
        }

        if candidates.is_empty() {
            return Ok(self.complete_chunk());
        }
        if lowest == 0 {
            return self.handle_contradiction(top, candidates[0]);
        }

        let picked = candidates[self.rng.next_usize_max(candidates.len())];
        let position = self.grid.position_of(picked);
        let tile = self.grid.cell_at_mut(position)?.collapse(self.rng.as_mut())?;

        for &dir in self.grid.dimensionality().directions() {
            let Some(neighbor) = self.grid.neighbor(position, dir) else {
                continue;
            };
            let cell = self.grid.cell_at_mut(neighbor)?;
            if cell.is_open() {
                cell.narrow(&self.catalog, tile, dir);
            }
        }

        self.jobs[top].collapsed_this_attempt = true;
        self.stats.collapses += 1;
        trace!("Collapsed {} to tile {}", position, tile);

        Ok(StepEvent::Collapsed { position, tile })
    }

    fn handle_contradiction(&mut self, top: usize, cell: usize) -> GenerationResult<StepEvent> {
        self.stats.contradictions += 1;
        let position = self.grid.position_of(cell);
        let chunk = self.jobs[top].chunk;

        debug!(
            "Contradiction at {} in chunk {} (attempt {})",
            position, chunk.index, self.jobs[top].attempt
        );

        if let Some(limit) = self.config.retry_limit {
            if self.stats.contradictions >= limit {
                self.state = RunState::Failed;
                self.jobs.clear();
                return Err(GenerationError::RetryLimitExceeded {
                    limit,
                    chunk: chunk.index,
                });
            }
        }

        self.jobs[top].needs_reset = true;

        if self.grid.dimensionality() == Dimensionality::Volumetric {
            let job = &mut self.jobs[top];
            job.fail_count += 1;
            // Seeds that contradict on the very first try will never work.
            let first_try = job.attempt == 1 && !job.collapsed_this_attempt;

            if job.fail_count >= self.config.max_fail_count || first_try {
                job.fail_count = 0;
                if let Some(previous) = self.partitioner.previous(chunk.index) {
                    return self.back_off(top, previous);
                }
            }
        }

        Ok(StepEvent::Contradiction {
            chunk: chunk.index,
            position,
        })
    }

    /// Park the current chunk and regenerate `previous` first.
    fn back_off(&mut self, top: usize, previous: Chunk) -> GenerationResult<StepEvent> {
        // Open the parked chunk so it cannot seed the regenerated one.
        self.open_cells(top);
        let from = self.jobs[top].chunk.index;

        let job = ChunkJob::new(previous, &self.grid)?;
        self.jobs.push(job);

        self.stats.backoffs += 1;
        self.stats.max_backoff_depth = self.stats.max_backoff_depth.max(self.backoff_depth());

        warn!(
            "Chunk {} keeps contradicting, regenerating chunk {} first (depth {})",
            from,
            previous.index,
            self.backoff_depth()
        );

        Ok(StepEvent::BackedOff {
            from,
            to: previous.index,
        })
    }

    fn complete_chunk(&mut self) -> StepEvent {
        let Some(job) = self.jobs.pop() else {
            return StepEvent::Finished;
        };
        self.stats.chunks_completed += 1;

        // A parked chunk was opened when it backed off, so it starts over.
        if let Some(parked) = self.jobs.last_mut() {
            parked.needs_reset = true;
        }

        debug!(
            "Chunk {} complete after {} attempt(s)",
            job.chunk.index, job.attempt
        );
        StepEvent::ChunkCompleted {
            index: job.chunk.index,
        }
    }

    fn finish(&mut self) -> StepEvent {
        self.state = RunState::Finished;
        info!(
            "Generation finished: {} collapses, {} contradictions, {} backoffs",
            self.stats.collapses, self.stats.contradictions, self.stats.backoffs
        );
        StepEvent::Finished
    }

    fn open_cells(&mut self, top: usize) {
        for &index in &self.jobs[top].cells {
            if let Some(cell) = self.grid.cell_mut(index) {
                cell.initialize(&self.catalog);
            }
        }
    }
}

/// Run a whole generation without a scheduler.
pub fn generate(
    config: GenerationConfig,
    catalog: Arc<AdjacencyCatalog>,
) -> GenerationResult<GenerationOutput> {
    let mut generator = Generator::new(config, catalog)?;
    generator.run_to_completion()?;
    generator.into_output()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::direction::Direction;

    fn permissive(n: usize) -> AdjacencyCatalog {
        let all: Vec<TileId> = (0..n).collect();
        AdjacencyCatalog::new(
            (0..n)
                .map(|i| CatalogEntry::new(format!("t{}", i), 1.0).allow_all(&all))
                .collect(),
        )
    }

    #[test]
    fn test_planar_permissive_completes() {
        let config = GenerationConfig::planar(6, 5, 3).with_seed(1);
        let output = generate(config, Arc::new(permissive(3))).unwrap();
        assert!(output.grid.is_fully_collapsed());
        assert_eq!(output.placements.len(), 30);
        assert_eq!(output.stats.contradictions, 0);
        assert_eq!(output.stats.collapses, 30);
    }

    #[test]
    fn test_same_seed_same_result() {
        let catalog = Arc::new(permissive(4));
        let a = generate(GenerationConfig::planar(8, 8, 4).with_seed(77), catalog.clone()).unwrap();
        let b = generate(GenerationConfig::planar(8, 8, 4).with_seed(77), catalog).unwrap();
        assert_eq!(a.placements, b.placements);
    }

    #[test]
    fn test_first_step_starts_first_chunk() {
        let mut generator =
            Generator::new(GenerationConfig::planar(4, 4, 3).with_seed(3), Arc::new(permissive(2)))
                .unwrap();
        assert_eq!(
            generator.step().unwrap(),
            StepEvent::ChunkStarted {
                index: 0,
                origin: UVec3::ZERO,
                attempt: 1,
                narrowed: 0
            }
        );
        assert!(matches!(
            generator.step().unwrap(),
            StepEvent::Collapsed { .. }
        ));
    }

    #[test]
    fn test_step_after_finish_fails() {
        let mut generator =
            Generator::new(GenerationConfig::planar(2, 2, 2).with_seed(3), Arc::new(permissive(2)))
                .unwrap();
        generator.run_to_completion().unwrap();
        assert!(generator.is_finished());
        assert_eq!(generator.step(), Err(GenerationError::Finished));
    }

    #[test]
    fn test_cancel_discards_run() {
        let mut generator =
            Generator::new(GenerationConfig::planar(5, 5, 3).with_seed(3), Arc::new(permissive(2)))
                .unwrap();
        for _ in 0..4 {
            generator.step().unwrap();
        }
        generator.cancel();
        assert!(!generator.is_running());
        assert_eq!(generator.step(), Err(GenerationError::Cancelled));
        assert!(matches!(
            generator.into_output(),
            Err(GenerationError::Incomplete)
        ));
    }

    #[test]
    fn test_output_before_finish_is_incomplete() {
        let generator =
            Generator::new(GenerationConfig::planar(3, 3, 2), Arc::new(permissive(2))).unwrap();
        assert!(matches!(
            generator.into_output(),
            Err(GenerationError::Incomplete)
        ));
    }

    #[test]
    fn test_invalid_catalog_rejected() {
        let catalog =
            AdjacencyCatalog::new(vec![CatalogEntry::new("a", 1.0).allow(Direction::East, &[5])]);
        assert!(matches!(
            Generator::new(GenerationConfig::planar(3, 3, 2), Arc::new(catalog)),
            Err(GenerationError::Catalog(_))
        ));
    }

    #[test]
    fn test_volumetric_requires_sentinels() {
        let result = Generator::new(
            GenerationConfig::volumetric(UVec3::splat(3), 2),
            Arc::new(permissive(2)),
        );
        assert!(matches!(
            result,
            Err(GenerationError::MissingSentinel("default"))
        ));
    }

    #[test]
    fn test_volumetric_prefill_then_air_elided() {
        let catalog = permissive(3).with_air(0).with_default(1);
        let config = GenerationConfig::volumetric(UVec3::new(4, 3, 4), 3).with_seed(12);

        let generator = Generator::new(config.clone(), Arc::new(catalog.clone())).unwrap();
        for cell in generator.grid().cells() {
            let expected = if cell.position.y == 0 { 1 } else { 0 };
            assert_eq!(cell.tile(), Some(expected));
        }

        let output = generate(config, Arc::new(catalog)).unwrap();
        assert!(output.grid.is_fully_collapsed());
        assert!(output.placements.iter().all(|p| p.tile != 0));
        let air_cells = output
            .grid
            .cells()
            .iter()
            .filter(|c| c.tile() == Some(0))
            .count();
        assert_eq!(output.placements.len() + air_cells, output.grid.len());
    }

    struct Checkerboard;

    impl TerrainSeeder for Checkerboard {
        fn seed_tile(&self, position: UVec3) -> TileId {
            ((position.x + position.y) % 2) as TileId
        }
    }

    #[test]
    fn test_custom_seeder_prefills_every_cell() {
        let generator = Generator::with_seeder(
            GenerationConfig::planar(4, 4, 3),
            Arc::new(permissive(2)),
            &Checkerboard,
        )
        .unwrap();
        assert!(generator.grid().is_fully_collapsed());
        assert_eq!(
            generator.grid().cell_at(UVec3::new(1, 0, 0)).unwrap().tile(),
            Some(1)
        );
    }
}
