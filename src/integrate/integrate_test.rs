use super::{Integrator, StepMode};
use crate::boundary::{set_boundaries, BoundaryKind};
use crate::diagnostics;
use crate::eos::EquationOfState;
use crate::grid::{BoxSize, Grid, GridSize};
use crate::{Float, NSCALARS};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

const PERIODIC: (BoundaryKind, BoundaryKind, BoundaryKind) = (
    BoundaryKind::Periodic,
    BoundaryKind::Periodic,
    BoundaryKind::Periodic,
);

fn adiabatic() -> EquationOfState {
    EquationOfState::Adiabatic { gamma: 5. / 3. }
}

fn cube(n: usize) -> Grid {
    Grid::new(
        GridSize { x: n, y: n, z: n },
        BoxSize {
            x: 1.,
            y: 1.,
            z: 1.,
        },
    )
}

/// Sets every padded cell from primitives, deriving the total energy from
/// the already assigned cell-centered field.
fn set_cells<F>(g: &mut Grid, eos: EquationOfState, mut f: F)
where
    F: FnMut(usize, usize, usize) -> (Float, Float, [Float; 3]),
{
    let gamma = match eos {
        EquationOfState::Adiabatic { gamma } => gamma,
        EquationOfState::Isothermal { .. } => 2.,
    };
    let (n3, n2, n1) = g.u.dim();
    for k in 0..n3 {
        for j in 0..n2 {
            for i in 0..n1 {
                let (d, p, v) = f(i, j, k);
                let u = &mut g.u[[k, j, i]];
                u.d = d;
                u.m1 = d * v[0];
                u.m2 = d * v[1];
                u.m3 = d * v[2];
                u.e = p / (gamma - 1.)
                    + 0.5 * d * (v[0] * v[0] + v[1] * v[1] + v[2] * v[2])
                    + 0.5 * (u.b1c * u.b1c + u.b2c * u.b2c + u.b3c * u.b3c);
                for n in 0..NSCALARS {
                    u.s[n] = d / (n + 1) as Float;
                }
            }
        }
    }
}

fn run_steps(g: &mut Grid, mode: &StepMode, steps: usize, cfl: Float) {
    let (nx1, nx2, nx3) = g.interior();
    let mut integrator = Integrator::new(nx1, nx2, nx3, mode);
    for _ in 0..steps {
        set_boundaries(g, PERIODIC);
        g.dt = g.new_dt(mode.eos, cfl);
        integrator.step(g, mode);
        g.time += g.dt;
    }
}

/// Divergence-free field from a periodic random vector potential on cell
/// edges.
fn seed_random_field(g: &mut Grid, amplitude: Float, seed: u64) {
    let (nx1, nx2, nx3) = g.interior();
    let mut rng = Pcg64::seed_from_u64(seed);

    let n = nx1 * nx2 * nx3;
    let mut pot = vec![[0.; 3]; n];
    for v in pot.iter_mut() {
        for c in v.iter_mut() {
            *c = rng.gen_range(-amplitude, amplitude);
        }
    }

    let (is, js, ks) = (g.is as isize, g.js as isize, g.ks as isize);
    let at = |c: usize, k: isize, j: isize, i: isize| -> Float {
        let w = |v: isize, n: usize| (((v % n as isize) + n as isize) % n as isize) as usize;
        pot[(w(k - ks, nx3) * nx2 + w(j - js, nx2)) * nx1 + w(i - is, nx1)][c]
    };

    let (n3, n2, n1) = g.u.dim();
    for k in 0..n3 as isize - 1 {
        for j in 0..n2 as isize - 1 {
            for i in 0..n1 as isize - 1 {
                let idx = [k as usize, j as usize, i as usize];
                g.b1i[idx] = (at(2, k, j + 1, i) - at(2, k, j, i)) / g.dx2
                    - (at(1, k + 1, j, i) - at(1, k, j, i)) / g.dx3;
                g.b2i[idx] = (at(0, k + 1, j, i) - at(0, k, j, i)) / g.dx3
                    - (at(2, k, j, i + 1) - at(2, k, j, i)) / g.dx1;
                g.b3i[idx] = (at(1, k, j, i + 1) - at(1, k, j, i)) / g.dx1
                    - (at(0, k, j + 1, i) - at(0, k, j, i)) / g.dx2;
            }
        }
    }
    g.cell_center_b((0, n3 - 2), (0, n2 - 2), (0, n1 - 2));
}

#[test]
fn constant_state_is_preserved() {
    let mut g = cube(8);
    g.b1i.fill(1.0);
    g.b2i.fill(0.5);
    g.b3i.fill(-0.25);
    let (n3, n2, n1) = g.u.dim();
    g.cell_center_b((0, n3 - 2), (0, n2 - 2), (0, n1 - 2));
    set_cells(&mut g, adiabatic(), |_, _, _| {
        (1.0, 0.6, [0.3, -0.2, 0.1])
    });

    let u0 = g.u.clone();
    let mode = StepMode::mhd(adiabatic());
    run_steps(&mut g, &mode, 10, 0.4);

    for k in g.ks..=g.ke {
        for j in g.js..=g.je {
            for i in g.is..=g.ie {
                let a = &g.u[[k, j, i]];
                let b = &u0[[k, j, i]];
                assert!((a.d - b.d).abs() < 1e-13);
                assert!((a.m1 - b.m1).abs() < 1e-13);
                assert!((a.m2 - b.m2).abs() < 1e-13);
                assert!((a.m3 - b.m3).abs() < 1e-13);
                assert!((a.e - b.e).abs() < 1e-13);
                assert!((a.b1c - b.b1c).abs() < 1e-13);
                assert!((a.b2c - b.b2c).abs() < 1e-13);
                assert!((a.b3c - b.b3c).abs() < 1e-13);
            }
        }
    }
}

#[test]
fn random_field_stays_divergence_free() {
    let mut g = cube(8);
    seed_random_field(&mut g, 0.05, 42);
    set_cells(&mut g, adiabatic(), |_, _, _| (1.0, 1.0, [0., 0., 0.]));

    set_boundaries(&mut g, PERIODIC);
    assert!(diagnostics::max_div_b(&g) < 1e-12);

    let mode = StepMode::mhd(adiabatic());
    run_steps(&mut g, &mode, 8, 0.4);

    assert!(diagnostics::max_div_b(&g) < 1e-11);
}

#[test]
fn conserved_totals_survive_a_periodic_run() {
    let mut g = cube(8);
    seed_random_field(&mut g, 0.02, 7);
    set_cells(&mut g, adiabatic(), |i, j, k| {
        let x = (i + 2 * j + 3 * k) as Float;
        (1.0 + 0.1 * (x * 0.7).sin(), 0.8, [0.2, -0.1, 0.05])
    });
    set_boundaries(&mut g, PERIODIC);

    let t0 = diagnostics::totals(&g);
    let mode = StepMode::mhd(adiabatic());
    run_steps(&mut g, &mode, 6, 0.4);
    let t1 = diagnostics::totals(&g);

    let n = g.interior().0 * g.interior().1 * g.interior().2;
    let scale = n as Float;
    assert!((t1.mass - t0.mass).abs() / scale < 1e-13);
    for c in 0..3 {
        assert!((t1.momentum[c] - t0.momentum[c]).abs() / scale < 1e-13);
    }
    assert!((t1.energy - t0.energy).abs() / scale < 1e-13);
}

#[test]
fn mhd_mode_with_zero_field_matches_hydro() {
    let init = |g: &mut Grid| {
        set_cells(g, adiabatic(), |i, j, k| {
            let x = i as Float * 0.5 + j as Float * 0.3 + k as Float * 0.2;
            (1.0 + 0.2 * x.sin(), 1.0 + 0.1 * x.cos(), [0.4, 0.1, -0.2])
        });
    };

    let mut ga = cube(8);
    init(&mut ga);
    run_steps(&mut ga, &StepMode::hydro(adiabatic()), 4, 0.4);

    let mut gb = cube(8);
    init(&mut gb);
    run_steps(&mut gb, &StepMode::mhd(adiabatic()), 4, 0.4);

    for k in ga.ks..=ga.ke {
        for j in ga.js..=ga.je {
            for i in ga.is..=ga.ie {
                let a = &ga.u[[k, j, i]];
                let b = &gb.u[[k, j, i]];
                assert!((a.d - b.d).abs() < 1e-14);
                assert!((a.m1 - b.m1).abs() < 1e-14);
                assert!((a.m2 - b.m2).abs() < 1e-14);
                assert!((a.m3 - b.m3).abs() < 1e-14);
                assert!((a.e - b.e).abs() < 1e-14);
                assert_eq!(b.b1c, 0.);
            }
        }
    }
}

#[test]
fn uniform_scalar_concentration_is_exactly_advected() {
    let mut g = cube(8);
    set_cells(&mut g, adiabatic(), |i, j, k| {
        let x = (i * j + k) as Float;
        (1.0 + 0.3 * (x * 0.9).sin(), 1.0, [0.5, 0.2, -0.3])
    });

    let mode = StepMode::hydro(adiabatic());
    run_steps(&mut g, &mode, 6, 0.4);

    for k in g.ks..=g.ke {
        for j in g.js..=g.je {
            for i in g.is..=g.ie {
                let u = &g.u[[k, j, i]];
                for n in 0..NSCALARS {
                    let r = u.s[n] / u.d;
                    assert!(
                        (r - 1.0 / (n + 1) as Float).abs() < 1e-12,
                        "scalar {} drifted: {}",
                        n,
                        r
                    );
                }
            }
        }
    }
}

#[test]
fn isothermal_constant_state_is_preserved() {
    let eos = EquationOfState::Isothermal { csound: 1.0 };
    let mut g = cube(8);
    g.b1i.fill(0.3);
    g.b2i.fill(0.3);
    g.b3i.fill(0.);
    let (n3, n2, n1) = g.u.dim();
    g.cell_center_b((0, n3 - 2), (0, n2 - 2), (0, n1 - 2));
    set_cells(&mut g, eos, |_, _, _| (2.0, 0., [0.1, 0., 0.]));

    let u0 = g.u.clone();
    let mode = StepMode::mhd(eos);
    run_steps(&mut g, &mode, 5, 0.4);

    for k in g.ks..=g.ke {
        for j in g.js..=g.je {
            for i in g.is..=g.ie {
                let a = &g.u[[k, j, i]];
                let b = &u0[[k, j, i]];
                assert!((a.d - b.d).abs() < 1e-13);
                assert!((a.m1 - b.m1).abs() < 1e-13);
            }
        }
    }
}
