//! Strategy selection and call ordering, observed through recording engines

mod common;

use p1rad_core::amr::MultiFab;
use p1rad_core::elliptic::{
    AbecOperator, EllipticEngine, EngineError, LinOpBcType, MlmgControls, SolveReport,
};
use p1rad_core::solver::{
    EllipticSolveOrchestrator, LevelOutcome, P1Coefficients, SolveError, SolveStrategy,
    SolveSummary,
};
use p1rad_core::{MlmgParams, RadiationFieldSet};
use std::cell::RefCell;

/// What the engine saw on one call
#[derive(Debug, Clone, PartialEq)]
struct Call {
    levels: usize,
    coarse_link: Option<(f64, i32)>,
    bc: [(LinOpBcType, LinOpBcType); 3],
    scalars: (f64, f64),
    controls: MlmgControls,
    tolerances: (f64, f64),
}

/// Writes `call number + 1` into every level it is asked to solve
#[derive(Default)]
struct RecordingEngine {
    calls: RefCell<Vec<Call>>,
    fail_on_call: Option<usize>,
}

const REPORT: SolveReport = SolveReport {
    iterations: 3,
    initial_residual: 1.0,
    final_residual: 1.0e-12,
};

impl EllipticEngine for RecordingEngine {
    fn solve(
        &self,
        op: &AbecOperator<'_>,
        controls: &MlmgControls,
        solution: &mut [&mut MultiFab],
        rhs: &[&MultiFab],
        rel_tol: f64,
        abs_tol: f64,
    ) -> Result<SolveReport, EngineError> {
        assert_eq!(solution.len(), op.num_levels());
        assert_eq!(rhs.len(), op.num_levels());
        op.check_complete()?;

        let mut calls = self.calls.borrow_mut();
        let call_index = calls.len();
        calls.push(Call {
            levels: op.num_levels(),
            coarse_link: op
                .coarse_fine_bc()
                .map(|cf| (cf.coarse.norm0(0), cf.ref_ratio)),
            bc: std::array::from_fn(|dir| op.domain_bc(dir)),
            scalars: op.scalars(),
            controls: *controls,
            tolerances: (rel_tol, abs_tol),
        });

        if self.fail_on_call == Some(call_index) {
            return Err(EngineError::NotConverged {
                iterations: controls.max_iter,
                residual: 1.0,
                target: abs_tol,
            });
        }
        for phi in solution.iter_mut() {
            phi.fill_valid(0, |_| (call_index + 1) as f64);
        }
        Ok(REPORT)
    }
}

fn params(composite: bool, fine_only: bool) -> MlmgParams {
    MlmgParams {
        composite_solve: composite,
        fine_level_solve_only: fine_only,
        max_iter: 17,
        max_fmg_iter: 2,
        verbose: 1,
        reltol: 1.0e-9,
        abstol: 1.0e-14,
        ..MlmgParams::default()
    }
}

fn fields(h: &p1rad_core::AmrHierarchy) -> RadiationFieldSet {
    let mut fs = RadiationFieldSet::init_data(h);
    for level in 0..h.num_levels() {
        fs.acoef_mut()[level].set_val(1.0);
        fs.bcoef_mut()[level].set_val(1.0);
        fs.phi_exact_mut()[level].set_val(-7.5);
    }
    fs
}

#[test]
fn test_strategy_from_params() {
    assert_eq!(
        SolveStrategy::from_params(&params(true, true)),
        SolveStrategy::Composite
    );
    assert_eq!(
        SolveStrategy::from_params(&params(false, true)),
        SolveStrategy::PerLevel {
            fine_level_only: true
        }
    );
}

#[test]
fn test_composite_is_one_call_over_all_levels() {
    let h = common::two_level();
    let mut fs = fields(&h);
    let orch = EllipticSolveOrchestrator::new(RecordingEngine::default(), params(true, false))
        .unwrap();

    let summary = fs.solve_with(&orch, &h).unwrap();
    assert_eq!(summary, SolveSummary::Composite(REPORT));

    let calls = orch.engine().calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].levels, 2);
    assert_eq!(calls[0].coarse_link, None);
    assert_eq!(calls[0].scalars, (1.0, 1.0 / 3.0));
    assert_eq!(calls[0].tolerances, (1.0e-9, 1.0e-14));
    assert_eq!(calls[0].controls.max_iter, 17);
    assert_eq!(calls[0].controls.max_fmg_iter, 2);
    assert_eq!(calls[0].controls.verbose, 1);
    assert_eq!(calls[0].controls.bottom_solver, None);
    assert!(fs.phi().iter().all(|mf| mf.all_valid(0, |_, v| v == 1.0)));
}

#[test]
fn test_per_level_solves_coarse_to_fine() {
    let h = common::two_level();
    let mut fs = fields(&h);
    let orch = EllipticSolveOrchestrator::new(RecordingEngine::default(), params(false, false))
        .unwrap();

    let summary = fs.solve_with(&orch, &h).unwrap();
    assert_eq!(
        summary,
        SolveSummary::PerLevel(vec![
            LevelOutcome::Solved(REPORT),
            LevelOutcome::Solved(REPORT)
        ])
    );

    let calls = orch.engine().calls.borrow();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.levels == 1));
    assert_eq!(calls[0].coarse_link, None);
    // Level 1 sees level 0 already holding the first call's result
    assert_eq!(calls[1].coarse_link, Some((1.0, 2)));
    assert!(fs.phi()[0].all_valid(0, |_, v| v == 1.0));
    assert!(fs.phi()[1].all_valid(0, |_, v| v == 2.0));
}

#[test]
fn test_fine_level_only_copies_reference() {
    let h = common::two_level();
    let mut fs = fields(&h);
    let orch = EllipticSolveOrchestrator::new(RecordingEngine::default(), params(false, true))
        .unwrap();

    let summary = fs.solve_with(&orch, &h).unwrap();
    assert_eq!(
        summary,
        SolveSummary::PerLevel(vec![
            LevelOutcome::CopiedFromReference,
            LevelOutcome::Solved(REPORT)
        ])
    );

    let calls = orch.engine().calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].coarse_link, Some((7.5, 2)));
    assert!(fs.phi()[0].all_valid(0, |_, v| v == -7.5));
    assert!(fs.phi()[1].all_valid(0, |_, v| v == 1.0));
}

#[test]
fn test_fine_level_only_on_single_level_solves_it() {
    let h = common::single_level(4, 4, [false; 3]);
    let mut fs = fields(&h);
    let orch = EllipticSolveOrchestrator::new(RecordingEngine::default(), params(false, true))
        .unwrap();

    let summary = fs.solve_with(&orch, &h).unwrap();
    assert_eq!(summary, SolveSummary::PerLevel(vec![LevelOutcome::Solved(REPORT)]));
}

#[test]
fn test_boundary_types_follow_level_zero_periodicity() {
    let h = common::single_level(4, 2, [true, false, true]);
    let mut fs = fields(&h);
    let orch = EllipticSolveOrchestrator::new(RecordingEngine::default(), params(true, false))
        .unwrap();
    fs.solve_with(&orch, &h).unwrap();

    let calls = orch.engine().calls.borrow();
    assert_eq!(
        calls[0].bc,
        [
            (LinOpBcType::Periodic, LinOpBcType::Periodic),
            (LinOpBcType::Dirichlet, LinOpBcType::Dirichlet),
            (LinOpBcType::Periodic, LinOpBcType::Periodic),
        ]
    );
}

#[test]
fn test_custom_coefficients_reach_operator() {
    let h = common::single_level(4, 4, [false; 3]);
    let mut fs = fields(&h);
    let orch = EllipticSolveOrchestrator::with_coefficients(
        RecordingEngine::default(),
        params(true, false),
        P1Coefficients { a: 2.0, b: 0.5 },
    )
    .unwrap();
    fs.solve_with(&orch, &h).unwrap();
    assert_eq!(orch.engine().calls.borrow()[0].scalars, (2.0, 0.5));
}

#[test]
fn test_engine_failure_stops_the_level_loop() {
    let h = common::two_level();
    let mut fs = fields(&h);
    let engine = RecordingEngine {
        fail_on_call: Some(0),
        ..RecordingEngine::default()
    };
    let orch = EllipticSolveOrchestrator::new(engine, params(false, false)).unwrap();

    let err = fs.solve_with(&orch, &h).unwrap_err();
    assert_eq!(
        err,
        SolveError::Engine {
            level: Some(0),
            source: EngineError::NotConverged {
                iterations: 17,
                residual: 1.0,
                target: 1.0e-14,
            },
        }
    );
    assert_eq!(orch.engine().calls.borrow().len(), 1);
    assert!(fs.phi()[1].all_valid(0, |_, v| v == 0.0));
    assert!(err.to_string().starts_with("Solve failed on level 0"));
}

#[test]
fn test_composite_failure_has_no_level() {
    let h = common::two_level();
    let mut fs = fields(&h);
    let engine = RecordingEngine {
        fail_on_call: Some(0),
        ..RecordingEngine::default()
    };
    let orch = EllipticSolveOrchestrator::new(engine, params(true, false)).unwrap();
    assert!(matches!(
        fs.solve_with(&orch, &h),
        Err(SolveError::Engine { level: None, .. })
    ));
}

#[test]
fn test_mismatched_fields_rejected_before_engine_runs() {
    let h = common::two_level();
    let fs = fields(&h);
    let orch = EllipticSolveOrchestrator::new(RecordingEngine::default(), params(true, false))
        .unwrap();

    let mut phi = fs.phi().to_vec();
    let err = orch
        .solve(
            &h,
            &mut phi,
            fs.acoef(),
            &fs.bcoef()[..1],
            fs.rhs(),
            fs.phi_exact(),
        )
        .unwrap_err();
    assert_eq!(
        err,
        SolveError::FieldCountMismatch {
            field: "beta",
            expected: 2,
            found: 1
        }
    );

    let other = common::single_level(8, 8, [false; 3]);
    let mut swapped = fs.rhs().to_vec();
    swapped[0] = RadiationFieldSet::init_data(&other).rhs()[0].clone();
    let err = orch
        .solve(&h, &mut phi, fs.acoef(), fs.bcoef(), &swapped, fs.phi_exact())
        .unwrap_err();
    assert_eq!(
        err,
        SolveError::FieldLayoutMismatch {
            field: "rhs",
            level: 0
        }
    );
    assert!(orch.engine().calls.borrow().is_empty());
}

#[test]
fn test_invalid_params_rejected() {
    let bad = MlmgParams {
        max_iter: 0,
        ..MlmgParams::default()
    };
    assert!(EllipticSolveOrchestrator::new(RecordingEngine::default(), bad).is_err());
}
