//! Integration tests: the imaging simulator lifecycle against recording
//! collaborators.
//!
//! Every collaborator writes into one shared event log, so these tests
//! assert on the exact interleaving of generation, persistence, imager
//! updates, mode switches and finalisation.

use skyvis_core::{Algorithm, BlockIndex, Imager, PassKind, RunMode, Weighting};
use skyvis_engine::{ImagingSimulator, RunError, RunPhase, RunState, SimulatorConfig};
use skyvis_test_utils::{Event, EventLog, RecordingImager, RecordingPersister, ScriptedGenerator};

// ── Helpers ────────────────────────────────────────────────────────

fn imager(log: &EventLog, name: &str, w: Weighting, a: Algorithm) -> Box<dyn Imager> {
    Box::new(RecordingImager::new(name, w, a, log.clone()))
}

fn simulator(
    generator: ScriptedGenerator,
    imagers: Vec<Box<dyn Imager>>,
    log: &EventLog,
) -> ImagingSimulator {
    let config = SimulatorConfig::new(Box::new(generator), imagers)
        .with_persister(Box::new(RecordingPersister::new(log.clone())));
    ImagingSimulator::new(config).unwrap()
}

fn updates_of(log: &EventLog, name: &str, mode: RunMode) -> Vec<usize> {
    log.events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Update {
                imager,
                mode: m,
                index,
            } if imager == name && m == mode => Some(index.0),
            _ => None,
        })
        .collect()
}

fn persisted(log: &EventLog) -> Vec<usize> {
    log.events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Persist { index } => Some(index.0),
            _ => None,
        })
        .collect()
}

// ── Scenario 1: natural weighting, single pass ─────────────────────

#[test]
fn natural_weighting_runs_one_pass() {
    let log = EventLog::new();
    let n = 6;
    let mut sim = simulator(
        ScriptedGenerator::new(n, log.clone()),
        vec![imager(&log, "nat", Weighting::Natural, "None".parse().unwrap())],
        &log,
    );
    assert!(!sim.needs_coords_first());
    let report = sim.run().unwrap();

    assert_eq!(report.passes(), 1);
    assert_eq!(report.imagers[0].algorithm, Algorithm::None);
    assert_eq!(updates_of(&log, "nat", RunMode::Full), (0..n).collect::<Vec<_>>());
    assert!(updates_of(&log, "nat", RunMode::CoordsOnly).is_empty());
    assert_eq!(persisted(&log), (0..n).collect::<Vec<_>>());
    assert_eq!(
        log.count(|e| matches!(e, Event::Generate { mode: RunMode::CoordsOnly, .. })),
        0
    );
    assert_eq!(log.count(|e| matches!(e, Event::Finalise { .. })), 1);
    assert!(sim.state().is_finalised());
}

// ── Scenario 2: uniform + natural, two passes ──────────────────────

#[test]
fn uniform_weighting_adds_coordinate_pass() {
    let log = EventLog::new();
    let n = 5;
    let mut sim = simulator(
        ScriptedGenerator::new(n, log.clone()),
        vec![
            imager(&log, "uni", Weighting::Uniform, Algorithm::Fft),
            imager(&log, "nat", Weighting::Natural, Algorithm::Fft),
        ],
        &log,
    );
    let report = sim.run().unwrap();
    assert_eq!(report.passes(), 2);

    let all: Vec<usize> = (0..n).collect();
    for name in ["uni", "nat"] {
        assert_eq!(updates_of(&log, name, RunMode::CoordsOnly), all, "{name}");
        assert_eq!(updates_of(&log, name, RunMode::Full), all, "{name}");
    }
    assert_eq!(persisted(&log), all);

    // Nothing is persisted until the coordinate pass has finished.
    let events = log.events();
    let last_coords = events
        .iter()
        .rposition(|e| matches!(e, Event::Update { mode: RunMode::CoordsOnly, .. }))
        .unwrap();
    let first_persist = events
        .iter()
        .position(|e| matches!(e, Event::Persist { .. }))
        .unwrap();
    assert!(last_coords < first_persist);

    // One finalise each, after the last dispatch.
    let last_update = events
        .iter()
        .rposition(|e| matches!(e, Event::Update { .. }))
        .unwrap();
    let finalises: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, Event::Finalise { .. }))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(finalises.len(), 2);
    assert!(finalises.iter().all(|i| *i > last_update));
}

#[test]
fn mode_switches_bracket_the_coordinate_pass() {
    let log = EventLog::new();
    let mut sim = simulator(
        ScriptedGenerator::new(2, log.clone()),
        vec![imager(&log, "w", Weighting::Natural, Algorithm::WProjection)],
        &log,
    );
    sim.run().unwrap();
    let modes: Vec<(String, RunMode)> = log
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::SetMode { component, mode } => Some((component, mode)),
            _ => None,
        })
        .collect();
    assert_eq!(
        modes,
        [
            ("generator".to_string(), RunMode::CoordsOnly),
            ("w".to_string(), RunMode::CoordsOnly),
            ("generator".to_string(), RunMode::Full),
            ("w".to_string(), RunMode::Full),
        ]
    );
}

// ── Scenario 3: generator failure mid-pass ─────────────────────────

#[test]
fn generator_failure_aborts_without_finalise() {
    for prefetch in [0, 2] {
        let log = EventLog::new();
        let generator =
            ScriptedGenerator::new(10, log.clone()).fail_on(RunMode::Full, BlockIndex(3));
        let config = SimulatorConfig::new(
            Box::new(generator),
            vec![imager(&log, "nat", Weighting::Natural, Algorithm::Fft)],
        )
        .with_persister(Box::new(RecordingPersister::new(log.clone())));
        let config = SimulatorConfig {
            prefetch_blocks: prefetch,
            ..config
        };
        let mut sim = ImagingSimulator::new(config).unwrap();

        match sim.run() {
            Err(RunError::Generate {
                pass: PassKind::Full,
                ..
            }) => {}
            other => panic!("prefetch {prefetch}: expected Generate error, got {other:?}"),
        }
        assert_eq!(sim.state(), RunState::Aborted(RunPhase::FullPass));
        assert_eq!(updates_of(&log, "nat", RunMode::Full), [0, 1, 2]);
        assert_eq!(persisted(&log), [0, 1, 2], "earlier writes stay");
        assert_eq!(log.count(|e| matches!(e, Event::Finalise { .. })), 0);
        assert_eq!(log.count(|e| matches!(e, Event::PersisterFinalise)), 0);
    }
}

// ── Failure policies ───────────────────────────────────────────────

#[test]
fn persist_failure_skips_imagers_for_that_block() {
    let log = EventLog::new();
    let config = SimulatorConfig::new(
        Box::new(ScriptedGenerator::new(5, log.clone())),
        vec![imager(&log, "nat", Weighting::Natural, Algorithm::Fft)],
    )
    .with_persister(Box::new(
        RecordingPersister::new(log.clone()).fail_on(BlockIndex(2)),
    ));
    let mut sim = ImagingSimulator::new(config).unwrap();
    match sim.run() {
        Err(RunError::Persist { index, .. }) => assert_eq!(index, BlockIndex(2)),
        other => panic!("expected Persist error, got {other:?}"),
    }
    assert_eq!(updates_of(&log, "nat", RunMode::Full), [0, 1]);
    assert_eq!(sim.state(), RunState::Aborted(RunPhase::FullPass));
}

#[test]
fn imager_failure_in_coordinate_pass_stops_later_imagers() {
    let log = EventLog::new();
    let failing = RecordingImager::new("uni", Weighting::Uniform, Algorithm::Fft, log.clone())
        .fail_on(RunMode::CoordsOnly, BlockIndex(1));
    let mut sim = simulator(
        ScriptedGenerator::new(4, log.clone()),
        vec![
            Box::new(failing),
            imager(&log, "nat", Weighting::Natural, Algorithm::Fft),
        ],
        &log,
    );
    match sim.run() {
        Err(RunError::Imager {
            name,
            pass: PassKind::Coords,
            index,
            ..
        }) => {
            assert_eq!(name, "uni");
            assert_eq!(index, BlockIndex(1));
        }
        other => panic!("expected Imager error, got {other:?}"),
    }
    assert_eq!(updates_of(&log, "nat", RunMode::CoordsOnly), [0]);
    assert!(persisted(&log).is_empty());
    assert_eq!(sim.mode(), RunMode::Full);
}

// ── Edge cases ─────────────────────────────────────────────────────

#[test]
fn empty_imager_list_still_persists_and_finalises() {
    let log = EventLog::new();
    let mut sim = simulator(ScriptedGenerator::new(3, log.clone()), Vec::new(), &log);
    assert!(!sim.needs_coords_first());
    let report = sim.run().unwrap();
    assert_eq!(report.passes(), 1);
    assert_eq!(persisted(&log), [0, 1, 2]);
    assert_eq!(log.count(|e| matches!(e, Event::PersisterFinalise)), 1);
}

#[test]
fn no_persister_is_not_an_error() {
    let log = EventLog::new();
    let config = SimulatorConfig::new(
        Box::new(ScriptedGenerator::new(3, log.clone())),
        vec![imager(&log, "nat", Weighting::Natural, Algorithm::Fft)],
    );
    let mut sim = ImagingSimulator::new(config).unwrap();
    let report = sim.run().unwrap();
    assert_eq!(report.blocks_persisted(), 0);
    assert_eq!(updates_of(&log, "nat", RunMode::Full), [0, 1, 2]);
}

#[test]
fn aborted_simulator_cannot_rerun() {
    let log = EventLog::new();
    let generator = ScriptedGenerator::new(2, log.clone()).fail_on(RunMode::Full, BlockIndex(0));
    let mut sim = simulator(generator, Vec::new(), &log);
    assert!(sim.run().is_err());
    match sim.run() {
        Err(RunError::InvalidState { state }) => assert!(state.is_aborted()),
        other => panic!("expected InvalidState, got {other:?}"),
    }
}

#[test]
fn prefetched_and_inline_runs_dispatch_identically() {
    let run = |prefetch: usize| {
        let log = EventLog::new();
        let config = SimulatorConfig::new(
            Box::new(ScriptedGenerator::new(9, log.clone())),
            vec![
                imager(&log, "uni", Weighting::Uniform, Algorithm::Dft2d),
                imager(&log, "nat", Weighting::Natural, Algorithm::Dft3d),
            ],
        )
        .with_persister(Box::new(RecordingPersister::new(log.clone())));
        let config = SimulatorConfig {
            prefetch_blocks: prefetch,
            ..config
        };
        ImagingSimulator::new(config).unwrap().run().unwrap();
        // Generation may run ahead of dispatch; compare the dispatch side only.
        log.events()
            .into_iter()
            .filter(|e| !matches!(e, Event::Generate { .. }))
            .collect::<Vec<_>>()
    };
    let inline = run(0);
    assert_eq!(run(1), inline);
    assert_eq!(run(4), inline);
}
