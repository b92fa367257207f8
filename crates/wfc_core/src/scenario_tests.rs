//! End-to-end generation scenarios driven through `Generator::step`.

use bevy_math::UVec3;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::catalog::{AdjacencyCatalog, CatalogEntry, TileId};
use crate::config::GenerationConfig;
use crate::direction::Direction;
use crate::error::GenerationError;
use crate::generator::{Generator, StepEvent};

/// Every tile only tolerates itself as a neighbor.
fn self_matching(n: usize) -> AdjacencyCatalog {
    AdjacencyCatalog::new(
        (0..n)
            .map(|i| CatalogEntry::new(format!("t{}", i), 1.0).allow_all(&[i]))
            .collect(),
    )
}

fn tile_at(generator: &Generator, x: u32) -> Option<TileId> {
    generator
        .grid()
        .cell_at(UVec3::new(x, 0, 0))
        .ok()
        .and_then(|cell| cell.tile())
}

#[test]
fn test_self_matching_line_is_uniform() {
    let config = GenerationConfig::planar(4, 1, 2).with_seed(21);
    let mut generator = Generator::new(config, Arc::new(self_matching(2))).unwrap();
    let stats = generator.run_to_completion().unwrap();

    let first = tile_at(&generator, 0);
    assert!(first.is_some());
    for x in 1..4 {
        assert_eq!(tile_at(&generator, x), first);
    }
    assert_eq!(stats.contradictions, 0);
}

#[test]
fn test_overlap_cell_seeds_next_chunk_and_is_collapsed_once() {
    let config = GenerationConfig::planar(5, 1, 3).with_seed(4);
    let mut generator = Generator::new(config, Arc::new(self_matching(3))).unwrap();

    let mut collapses = [0usize; 5];
    let mut checked_seed = false;
    loop {
        match generator.step().unwrap() {
            StepEvent::Finished => break,
            StepEvent::Collapsed { position, .. } => collapses[position.x as usize] += 1,
            StepEvent::ChunkStarted { index: 1, .. } => {
                let shared = tile_at(&generator, 2).unwrap();
                let seeded = generator
                    .grid()
                    .cell_at(UVec3::new(3, 0, 0))
                    .unwrap()
                    .possibilities()
                    .unwrap()
                    .ids()
                    .collect::<BTreeSet<_>>();
                assert_eq!(seeded, BTreeSet::from([shared]));
                checked_seed = true;
            }
            _ => {}
        }
    }

    assert!(checked_seed);
    assert_eq!(collapses, [1; 5]);
}

#[test]
fn test_unsatisfiable_plane_keeps_retrying() {
    let catalog = AdjacencyCatalog::new(vec![CatalogEntry::new("lonely", 1.0)]);
    let config = GenerationConfig::planar(3, 1, 3).with_seed(8);
    let mut generator = Generator::new(config, Arc::new(catalog)).unwrap();

    let mut last_attempt = 0;
    for _ in 0..1000 {
        match generator.step().unwrap() {
            StepEvent::ChunkStarted { attempt, .. } => last_attempt = attempt,
            StepEvent::Finished => panic!("an unsatisfiable plane cannot finish"),
            _ => {}
        }
    }

    assert!(generator.is_running());
    assert!(generator.stats().contradictions > 0);
    assert!(last_attempt > 1);
    assert_eq!(generator.stats().backoffs, 0);
}

#[test]
fn test_retry_limit_stops_unsatisfiable_plane() {
    let catalog = AdjacencyCatalog::new(vec![CatalogEntry::new("lonely", 1.0)]);
    let config = GenerationConfig::planar(3, 1, 3)
        .with_seed(8)
        .with_retry_limit(5);
    let mut generator = Generator::new(config, Arc::new(catalog)).unwrap();

    assert_eq!(
        generator.run_to_completion(),
        Err(GenerationError::RetryLimitExceeded { limit: 5, chunk: 0 })
    );
    assert_eq!(generator.stats().contradictions, 5);
    assert_eq!(generator.step(), Err(GenerationError::Finished));
}

/// Air (0) fits anywhere; floor (1) tolerates nothing to its east.
fn floor_edge_catalog() -> AdjacencyCatalog {
    AdjacencyCatalog::new(vec![
        CatalogEntry::new("air", 1.0)
            .allow(Direction::East, &[0, 1])
            .allow(Direction::West, &[0, 1]),
        CatalogEntry::new("floor", 1.0).allow(Direction::West, &[1]),
    ])
    .with_air(0)
    .with_default(1)
}

#[test]
fn test_volumetric_backoff_repairs_previous_chunk() {
    let config = GenerationConfig::volumetric(UVec3::new(3, 1, 1), 2)
        .with_seed(33)
        .with_max_fail_count(4)
        .with_retry_limit(1000);
    let mut generator = Generator::new(config, Arc::new(floor_edge_catalog())).unwrap();

    let mut backed_off = Vec::new();
    loop {
        match generator.step().unwrap() {
            StepEvent::Finished => break,
            StepEvent::BackedOff { from, to } => backed_off.push((from, to)),
            _ => {}
        }
    }

    // The pre-filled floor at x=2 forces floor at x=1 on the first pass,
    // which the second chunk can never seed from.
    assert_eq!(backed_off.first(), Some(&(1, 0)));
    assert!(generator.stats().max_backoff_depth >= 1);
    assert_eq!(tile_at(&generator, 1), Some(0));

    let output = generator.into_output().unwrap();
    assert!(output.grid.is_fully_collapsed());
    assert!(output.placements.iter().all(|p| p.tile == 1));
}

/// Drive a run to the end and record, for each backoff out of `chunk`, how
/// many contradictions that chunk reported since it last started counting.
fn contradictions_before_backoffs(generator: &mut Generator, chunk: usize) -> Vec<u32> {
    let mut since_backoff = 0;
    let mut counts = Vec::new();
    loop {
        match generator.step().unwrap() {
            StepEvent::Finished => return counts,
            StepEvent::Contradiction { chunk: c, .. } if c == chunk => since_backoff += 1,
            StepEvent::BackedOff { from, to } if from == chunk => {
                assert_eq!(to, chunk - 1);
                counts.push(since_backoff);
                since_backoff = 0;
            }
            _ => {}
        }
    }
}

#[test]
fn test_volumetric_backoff_after_max_fail_count() {
    // Air (0) rejects anything to its west, so chunk 1 only fails when x=4
    // collapses to air while x=3 is still open. Its seeds never contradict.
    let catalog = Arc::new(
        AdjacencyCatalog::new(vec![
            CatalogEntry::new("air", 1.0).allow(Direction::East, &[0, 1]),
            CatalogEntry::new("floor", 1.0)
                .allow(Direction::East, &[0, 1])
                .allow(Direction::West, &[0, 1]),
        ])
        .with_air(0)
        .with_default(1),
    );

    let mut backoffs = 0;
    for seed in 0..400 {
        let config = GenerationConfig::volumetric(UVec3::new(5, 1, 1), 3)
            .with_seed(seed)
            .with_max_fail_count(3)
            .with_retry_limit(10_000);
        let mut generator = Generator::new(config, catalog.clone()).unwrap();
        assert_eq!(generator.chunk_count(), 2);

        let counts = contradictions_before_backoffs(&mut generator, 1);
        assert!(counts.iter().all(|&n| n == 2), "seed {}: {:?}", seed, counts);
        assert_eq!(generator.stats().backoffs, counts.len() as u64);
        assert!(generator.is_finished());
        backoffs += counts.len();
    }
    assert!(backoffs > 0);
}

#[test]
fn test_seed_contradiction_backs_off_at_once_only_on_first_attempt() {
    let mut repeated = 0;
    for seed in 0..200 {
        let config = GenerationConfig::volumetric(UVec3::new(3, 1, 1), 2)
            .with_seed(seed)
            .with_max_fail_count(4)
            .with_retry_limit(10_000);
        let mut generator = Generator::new(config, Arc::new(floor_edge_catalog())).unwrap();

        // The first pass always leaves floor at x=1, which chunk 1 cannot
        // seed from. Later passes that repeat it must count up to the limit.
        let counts = contradictions_before_backoffs(&mut generator, 1);
        assert_eq!(counts.first(), Some(&0), "seed {}", seed);
        assert!(counts[1..].iter().all(|&n| n == 3), "seed {}: {:?}", seed, counts);
        repeated += counts.len() - 1;
    }
    assert!(repeated > 0);
}

#[test]
fn test_volumetric_unsatisfiable_hits_retry_limit_after_backoff() {
    let catalog = AdjacencyCatalog::new(vec![
        CatalogEntry::new("floor", 1.0).allow(Direction::West, &[0])
    ])
    .with_air(0)
    .with_default(0);
    let config = GenerationConfig::volumetric(UVec3::new(3, 1, 1), 2)
        .with_seed(5)
        .with_max_fail_count(3)
        .with_retry_limit(20);
    let mut generator = Generator::new(config, Arc::new(catalog)).unwrap();

    assert!(matches!(
        generator.run_to_completion(),
        Err(GenerationError::RetryLimitExceeded { limit: 20, .. })
    ));
    assert!(generator.stats().backoffs > 0);
}

#[test]
fn test_scan_completes_every_chunk() {
    let all: Vec<TileId> = (0..3).collect();
    let catalog = AdjacencyCatalog::new(
        (0..3)
            .map(|i| CatalogEntry::new(format!("t{}", i), (i + 1) as f64).allow_all(&all))
            .collect(),
    );
    let config = GenerationConfig::planar(9, 7, 4).with_seed(2);
    let mut generator = Generator::new(config, Arc::new(catalog)).unwrap();
    let chunk_count = generator.chunk_count();

    let mut completed = Vec::new();
    loop {
        match generator.step().unwrap() {
            StepEvent::Finished => break,
            StepEvent::ChunkCompleted { index } => completed.push(index),
            _ => {}
        }
    }

    assert_eq!(completed, (0..chunk_count).collect::<Vec<_>>());
    assert!(generator.grid().is_fully_collapsed());
}
