
use faer::Col;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::E;
use crate::blocks::{BlockRegistry, Category};
use crate::callback::NoOpCallback;
use crate::cost::{CostCalculator, WirelengthCost};
use crate::device::{BlockTypeInfo, Device};
use crate::netlist::{Net, Pin};
use crate::options::PlacerOptions;
use crate::placer::{PlacementSession, PlacementStatus};
use crate::random::StdRandomSource;
use fixtures::GridDevice;

fn run_session(
    device: &mut GridDevice,
    registry: BlockRegistry,
    nets: Vec<Net>,
    options: PlacerOptions,
    seed: u64,
) -> PlacementSession {
    let mut rng = StdRandomSource::new(StdRng::seed_from_u64(seed));
    let mut session = PlacementSession::new(registry, device, &mut rng, options).unwrap();
    let cost_calc = WirelengthCost::new(nets.clone());
    let mut callback = NoOpCallback;
    let status = session.run(device, &nets, &cost_calc, &mut callback).unwrap();
    assert_eq!(status, PlacementStatus::Committed);
    session
}

/// E1: 4 CLBs on a 6x6 grid with an I/O border, a single net connecting all
/// four. Each CLB should land on a distinct interior row/column site.
#[test]
fn e1_trivial_four_clb_single_net() {
    let mut device = GridDevice::new(6, 6, /*hard_column=*/ -1, /*num_io=*/ 4);
    let registry = fixtures::registry(4, 4, 0);
    let nets = vec![Net::new(vec![Pin { block: 4 }, Pin { block: 5 }, Pin { block: 6 }, Pin { block: 7 }])];
    let session = run_session(&mut device, registry, nets, PlacerOptions::default(), 1);

    let mut sites: Vec<(i32, i32)> = (4..8).map(|i| (session.best_legal_x()[i], session.best_legal_y()[i])).collect();
    sites.sort();
    sites.dedup();
    assert_eq!(sites.len(), 4, "every CLB must land on a distinct site");
    for &(x, y) in &sites {
        assert!(x >= 1 && x <= 4, "CLBs must land on interior columns, got x={x}");
        assert!((1..=4).contains(&y), "CLBs must land within the interior rows, got y={y}");
    }
}

/// E2: two CLBs each wired to a fixed corner I/O; anchoring should pull them
/// toward opposite sides of the grid rather than collapsing to one spot.
#[test]
fn e2_fixed_io_anchoring_separates_blocks() {
    let mut device = GridDevice::new(6, 6, -1, 2);
    device.set_io_positions(vec![(0, 0), (5, 5)]);
    let registry = fixtures::registry(2, 2, 0);
    let nets = vec![
        Net::new(vec![Pin { block: 0 }, Pin { block: 2 }]),
        Net::new(vec![Pin { block: 1 }, Pin { block: 3 }]),
    ];
    let session = run_session(&mut device, registry, nets, PlacerOptions::default(), 2);

    let (x0, y0) = (session.best_legal_x()[2], session.best_legal_y()[2]);
    let (x1, y1) = (session.best_legal_x()[3], session.best_legal_y()[3]);
    assert_ne!((x0, y0), (x1, y1), "the two anchored CLBs should not collapse onto the same site");

    // Anchored to (0,0) and (5,5) respectively: the block closer to the
    // bottom-left corner must actually sit closer to it than the other.
    let dist0_to_origin = (x0 as f64).hypot(y0 as f64);
    let dist1_to_origin = (x1 as f64).hypot(y1 as f64);
    assert!(
        dist0_to_origin < dist1_to_origin,
        "block anchored to (0,0) should land nearer the origin than the block anchored to (5,5): \
         got ({x0},{y0}) vs ({x1},{y1})"
    );
}

/// E3: hard blocks with a fixed lattice should all land exactly on lattice
/// sites once legalized at tile capacity 1.0.
#[test]
fn e3_hard_block_lattice_sites() {
    let mut device = GridDevice::new(10, 10, 4, 0);
    device.set_lattice(vec![BlockTypeInfo {
        category: Category::Hard(0),
        start: 2,
        repeat: 3,
        height: 2,
    }]);
    let registry = BlockRegistry::new(0, vec![0, 0, 3], vec![Category::Clb, Category::Hard(0)]).unwrap();
    let nets: Vec<Net> = Vec::new();
    let session = run_session(&mut device, registry, nets, PlacerOptions::default(), 3);

    for i in 0..3 {
        let x = session.best_legal_x()[i];
        let y = session.best_legal_y()[i];
        assert_eq!((x - 2) % 3, 0, "hard block x={x} must sit on the repeat-3 lattice from start=2");
        assert_eq!((y - 1) % 2, 0, "hard block y={y} must sit on the height-2 lattice");
    }
}

/// E4: 10 CLBs clustered near the center of a 10x10 grid (8 interior CLB
/// columns). The seeded center area must grow, absorb neighboring areas, and
/// still bipartition down to 10 distinct, non-colliding legal sites.
#[test]
fn e4_area_absorption_converges_to_a_legal_placement() {
    let mut device = GridDevice::new(10, 10, -1, 0);
    let registry = fixtures::registry(0, 10, 0);
    let nets = vec![Net::new((0..10).map(|b| Pin { block: b }).collect())];
    let session = run_session(&mut device, registry, nets, PlacerOptions::default(), 4);

    let mut sites: Vec<(i32, i32)> = (0..10).map(|i| (session.best_legal_x()[i], session.best_legal_y()[i])).collect();
    sites.sort();
    sites.dedup();
    assert_eq!(sites.len(), 10, "all 10 CLBs must land on distinct sites after absorption and bipartition");
    for &(x, y) in &sites {
        assert!(x >= 1 && x <= 8, "CLB x={x} must stay within the 8 interior columns");
        assert!(y >= 1 && y <= 8, "CLB y={y} must stay within the interior rows");
    }
}

/// E5: bestCost must never increase across the main iteration schedule.
#[test]
fn e5_cost_is_monotonically_non_increasing() {
    let mut device = GridDevice::new(12, 12, -1, 6);
    let registry = fixtures::registry(6, 10, 0);
    let nets = vec![Net::new((6..16).map(|b| Pin { block: b }).collect())];
    let mut rng = StdRandomSource::new(StdRng::seed_from_u64(5));
    let mut session = PlacementSession::new(registry, &device, &mut rng, PlacerOptions::default()).unwrap();
    let cost_calc = WirelengthCost::new(nets.clone());

    struct RecordingCallback {
        costs: Vec<f64>,
    }
    impl crate::callback::Callback for RecordingCallback {
        fn call(&mut self, report: &crate::callback::IterationReport) {
            self.costs.push(report.best_cost);
        }
    }
    let mut callback = RecordingCallback { costs: Vec::new() };

    session.run(&mut device, &nets, &cost_calc, &mut callback).unwrap();

    for window in callback.costs.windows(2) {
        assert!(window[1] <= window[0] + 1e-9, "bestCost increased: {} -> {}", window[0], window[1]);
    }
}

/// E6: solve_mode must cycle through 0..=numTypes in order, and
/// pseudoWeightFactor must grow exactly when solve_mode <= 1.
#[test]
fn e6_solve_mode_rotation_and_pseudo_weight_growth() {
    let mut device = GridDevice::new(10, 10, -1, 4);
    let registry = fixtures::registry(4, 4, 2);
    let nets: Vec<Net> = Vec::new();
    let mut rng = StdRandomSource::new(StdRng::seed_from_u64(6));
    let mut session = PlacementSession::new(registry, &device, &mut rng, PlacerOptions::default()).unwrap();
    let cost_calc = WirelengthCost::new(nets.clone());

    struct RecordingCallback {
        modes: Vec<usize>,
        weights: Vec<E>,
    }
    impl crate::callback::Callback for RecordingCallback {
        fn call(&mut self, report: &crate::callback::IterationReport) {
            self.modes.push(report.solve_mode);
            self.weights.push(report.pseudo_weight_factor);
        }
    }
    let mut callback = RecordingCallback { modes: Vec::new(), weights: Vec::new() };

    session.run(&mut device, &nets, &cost_calc, &mut callback).unwrap();

    let warmup = PlacerOptions::default().warmup_iterations;
    let main_modes = &callback.modes[warmup..];
    let main_weights = &callback.weights[warmup..];

    let num_modes = 2 + 1; // CLB + 1 hard type + "all"
    let mut expected = 0usize;
    for (i, &mode) in main_modes.iter().enumerate() {
        expected = (expected + 1) % num_modes;
        assert_eq!(mode, expected, "solve_mode at main iteration {i} did not follow the expected rotation");
    }

    let mut expected_weight: E = 0.0;
    let alpha = PlacerOptions::default().pseudo_weight_growth;
    for (i, &mode) in main_modes.iter().enumerate() {
        if mode <= 1 {
            expected_weight += alpha;
        }
        assert!(
            (main_weights[i] - expected_weight).abs() < 1e-9,
            "pseudo_weight_factor at iteration {i} was {} expected {}",
            main_weights[i],
            expected_weight
        );
    }
}

/// Determinism law: identical seeds and inputs must reproduce an identical
/// bestLegal* placement across two independent runs.
#[test]
fn same_seed_yields_identical_placement() {
    let nets = vec![Net::new((6..16).map(|b| Pin { block: b }).collect())];

    let mut device_a = GridDevice::new(12, 12, -1, 6);
    let registry_a = fixtures::registry(6, 10, 0);
    let session_a = run_session(&mut device_a, registry_a, nets.clone(), PlacerOptions::default(), 42);

    let mut device_b = GridDevice::new(12, 12, -1, 6);
    let registry_b = fixtures::registry(6, 10, 0);
    let session_b = run_session(&mut device_b, registry_b, nets, PlacerOptions::default(), 42);

    assert_eq!(session_a.best_legal_x(), session_b.best_legal_x());
    assert_eq!(session_a.best_legal_y(), session_b.best_legal_y());
    assert_eq!(session_a.best_cost(), session_b.best_cost());
}

/// Round-trip law: recomputing cost from the committed bestLegal* positions
/// must reproduce the bestCost recorded by the session.
#[test]
fn best_cost_matches_recalculation_from_best_legal() {
    let mut device = GridDevice::new(10, 10, -1, 4);
    let registry = fixtures::registry(4, 6, 0);
    let nets = vec![Net::new((4..10).map(|b| Pin { block: b }).collect())];
    let session = run_session(&mut device, registry, nets.clone(), PlacerOptions::default(), 9);

    let cost_calc = WirelengthCost::new(nets);
    let recalculated = cost_calc.calculate(session.best_legal_x(), session.best_legal_y());
    assert!(
        (recalculated - session.best_cost()).abs() < 1e-9,
        "recalculated cost {recalculated} does not match recorded bestCost {}",
        session.best_cost()
    );
}

#[test]
fn commit_is_idempotent() {
    let mut device = GridDevice::new(8, 8, -1, 2);
    let registry = fixtures::registry(2, 4, 0);
    let nets = vec![Net::new(vec![Pin { block: 2 }, Pin { block: 3 }])];
    let session = run_session(&mut device, registry, nets, PlacerOptions::default(), 7);

    let first = device.committed_positions().to_vec();
    // Commit a second time via the same bestLegal* arrays and confirm the
    // resulting device state is unchanged.
    for i in 2..6 {
        device.set_position(i, session.best_legal_x()[i], session.best_legal_y()[i]).unwrap();
    }
    let mut second: Vec<(usize, i32, i32)> = device.committed_positions().to_vec();
    second.drain(0..first.len());
    assert_eq!(
        second.iter().map(|&(_, x, y)| (x, y)).collect::<Vec<_>>(),
        first.iter().map(|&(_, x, y)| (x, y)).collect::<Vec<_>>()
    );
}

#[test]
fn net_with_single_pin_contributes_nothing() {
    use crate::blocks::BlockRegistry as Registry;
    use crate::solve;

    let registry = Registry::new(0, vec![0, 2], vec![Category::Clb]).unwrap();
    let device = GridDevice::new(8, 8, -1, 0);
    let nets = vec![Net::new(vec![Pin { block: 0 }])];
    let mut linear_x = Col::from_fn(2, |_| 3.0);
    let mut linear_y = Col::from_fn(2, |_| 3.0);
    let options = PlacerOptions::default();

    let before_x = linear_x.clone();
    solve::solve(
        &registry,
        &device,
        &nets,
        &[0, 0],
        &[0, 0],
        &mut linear_x,
        &mut linear_y,
        0,
        true,
        0.0,
        &options,
    )
    .unwrap();

    // With only a one-pin net and no anchors (firstSolve), the system is
    // all-zero and CG leaves the (already-zero) RHS solution at zero.
    assert_eq!(linear_x[0], 0.0);
    assert_eq!(linear_x[1], 0.0);
    let _ = before_x;
}
