//! Built-in initial conditions for the driver binary.

use mhdflow::boundary::BoundaryKind;
use mhdflow::eos::EquationOfState;
use mhdflow::grid::Grid;
use mhdflow::integrate::StepMode;
use mhdflow::settings::{Problem, Settings};
use mhdflow::{Float, NSCALARS};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

type Bc = (BoundaryKind, BoundaryKind, BoundaryKind);

/// Builds the grid, step mode and boundary kinds for the configured
/// problem.
pub fn setup(settings: &Settings) -> (Grid, StepMode, Bc) {
    let sim = settings.simulation;
    let mut g = Grid::new(sim.grid_size, sim.box_size);
    let eos = settings.physics.eos;

    let mut mode = if settings.physics.mhd {
        StepMode::mhd(eos)
    } else {
        StepMode::hydro(eos)
    };
    mode.h_correction = settings.physics.h_correction;

    let periodic = (
        BoundaryKind::Periodic,
        BoundaryKind::Periodic,
        BoundaryKind::Periodic,
    );

    let bc = match &settings.problem {
        Problem::Constant { d, p, v, b } => {
            fill_uniform(&mut g, eos, *d, *p, *v, *b);
            periodic
        }
        Problem::LinearWave { d0, p0, amplitude } => {
            linear_wave(&mut g, eos, *d0, *p0, *amplitude);
            periodic
        }
        Problem::RiemannX1 { left, right } => {
            riemann_x1(&mut g, eos, left, right);
            (
                BoundaryKind::Outflow,
                BoundaryKind::Periodic,
                BoundaryKind::Periodic,
            )
        }
        Problem::RandomField { d0, p0, amplitude } => {
            random_field(&mut g, eos, *d0, *p0, *amplitude, sim.seed);
            periodic
        }
    };

    (g, mode, bc)
}

fn total_energy(eos: EquationOfState, d: Float, p: Float, v: &[Float; 3], b: &[Float; 3]) -> Float {
    match eos {
        EquationOfState::Adiabatic { gamma } => {
            p / (gamma - 1.0)
                + 0.5 * d * (v[0] * v[0] + v[1] * v[1] + v[2] * v[2])
                + 0.5 * (b[0] * b[0] + b[1] * b[1] + b[2] * b[2])
        }
        EquationOfState::Isothermal { .. } => 0.,
    }
}

/// Reference scalar concentrations carried by every problem; a uniform
/// concentration has to stay uniform under pure advection.
fn scalar_concentrations() -> [Float; NSCALARS] {
    let mut r = [0.; NSCALARS];
    for (n, rn) in r.iter_mut().enumerate() {
        *rn = 1.0 / (n + 1) as Float;
    }
    r
}

fn set_cell(g: &mut Grid, idx: [usize; 3], eos: EquationOfState, d: Float, p: Float, v: [Float; 3]) {
    let r = scalar_concentrations();
    let u = &mut g.u[idx];
    u.d = d;
    u.m1 = d * v[0];
    u.m2 = d * v[1];
    u.m3 = d * v[2];
    let b = [u.b1c, u.b2c, u.b3c];
    u.e = total_energy(eos, d, p, &v, &b);
    for n in 0..NSCALARS {
        u.s[n] = d * r[n];
    }
}

fn fill_uniform(
    g: &mut Grid,
    eos: EquationOfState,
    d: Float,
    p: Float,
    v: [Float; 3],
    b: [Float; 3],
) {
    let (n3, n2, n1) = g.u.dim();
    g.b1i.fill(b[0]);
    g.b2i.fill(b[1]);
    g.b3i.fill(b[2]);
    for k in 0..n3 {
        for j in 0..n2 {
            for i in 0..n1 {
                let u = &mut g.u[[k, j, i]];
                u.b1c = b[0];
                u.b2c = b[1];
                u.b3c = b[2];
                set_cell(g, [k, j, i], eos, d, p, v);
            }
        }
    }
}

/// Right-moving sound wave along x1.
fn linear_wave(g: &mut Grid, eos: EquationOfState, d0: Float, p0: Float, amplitude: Float) {
    let cs = match eos {
        EquationOfState::Adiabatic { gamma } => (gamma * p0 / d0).sqrt(),
        EquationOfState::Isothermal { csound } => csound,
    };
    let gamma = match eos {
        EquationOfState::Adiabatic { gamma } => gamma,
        EquationOfState::Isothermal { .. } => 1.,
    };
    let (nx1, _, _) = g.interior();
    let lx = nx1 as Float * g.dx1;
    let (n3, n2, n1) = g.u.dim();

    for k in 0..n3 {
        for j in 0..n2 {
            for i in 0..n1 {
                let x1 = (i as Float - g.is as Float + 0.5) * g.dx1;
                let dd = amplitude * (2.0 * std::f64::consts::PI * x1 / lx).sin();
                let d = d0 * (1.0 + dd);
                let p = p0 * (1.0 + gamma * dd);
                set_cell(g, [k, j, i], eos, d, p, [cs * dd, 0., 0.]);
            }
        }
    }
}

/// Two uniform states split at the x1 midplane. The normal field b1 has to
/// agree between the two states.
fn riemann_x1(g: &mut Grid, eos: EquationOfState, left: &[Float; 8], right: &[Float; 8]) {
    let (nx1, _, _) = g.interior();
    let lx = nx1 as Float * g.dx1;
    g.set_origin(-0.5 * lx, 0., 0.);

    let (n3, n2, n1) = g.u.dim();
    for k in 0..n3 {
        for j in 0..n2 {
            for i in 0..n1 {
                let x1 = -0.5 * lx + (i as Float - g.is as Float + 0.5) * g.dx1;
                let s = if x1 < 0. { left } else { right };
                let (d, p, v, b) = (s[0], s[1], [s[2], s[3], s[4]], [s[5], s[6], s[7]]);
                g.b1i[[k, j, i]] = b[0];
                g.b2i[[k, j, i]] = b[1];
                g.b3i[[k, j, i]] = b[2];
                let u = &mut g.u[[k, j, i]];
                u.b1c = b[0];
                u.b2c = b[1];
                u.b3c = b[2];
                set_cell(g, [k, j, i], eos, d, p, v);
            }
        }
    }
}

/// Divergence-free random field: sample a vector potential on cell edges
/// with periodic structure and take its discrete curl, so every face
/// divergence starts at round-off.
fn random_field(
    g: &mut Grid,
    eos: EquationOfState,
    d0: Float,
    p0: Float,
    amplitude: Float,
    seed: [u64; 2],
) {
    let (nx1, nx2, nx3) = g.interior();
    let mut rng = Pcg64::seed_from_u64(seed[0] ^ seed[1].rotate_left(32));

    let n = nx1 * nx2 * nx3;
    let mut a1 = vec![0.; n];
    let mut a2 = vec![0.; n];
    let mut a3 = vec![0.; n];
    for v in a1.iter_mut().chain(a2.iter_mut()).chain(a3.iter_mut()) {
        *v = rng.gen_range(-amplitude, amplitude);
    }

    // periodic lookup of the potential at wrapped interior coordinates
    let (is, js, ks) = (g.is as isize, g.js as isize, g.ks as isize);
    let at = move |a: &[Float], k: isize, j: isize, i: isize| -> Float {
        let w = |v: isize, n: usize| (((v % n as isize) + n as isize) % n as isize) as usize;
        a[(w(k - ks, nx3) * nx2 + w(j - js, nx2)) * nx1 + w(i - is, nx1)]
    };

    let (n3, n2, n1) = g.u.dim();
    for k in 0..n3 as isize - 1 {
        for j in 0..n2 as isize - 1 {
            for i in 0..n1 as isize - 1 {
                let idx = [k as usize, j as usize, i as usize];
                g.b1i[idx] = (at(&a3, k, j + 1, i) - at(&a3, k, j, i)) / g.dx2
                    - (at(&a2, k + 1, j, i) - at(&a2, k, j, i)) / g.dx3;
                g.b2i[idx] = (at(&a1, k + 1, j, i) - at(&a1, k, j, i)) / g.dx3
                    - (at(&a3, k, j, i + 1) - at(&a3, k, j, i)) / g.dx1;
                g.b3i[idx] = (at(&a2, k, j, i + 1) - at(&a2, k, j, i)) / g.dx1
                    - (at(&a1, k, j + 1, i) - at(&a1, k, j, i)) / g.dx2;
            }
        }
    }

    g.cell_center_b((0, n3 - 2), (0, n2 - 2), (0, n1 - 2));

    for k in 0..n3 {
        for j in 0..n2 {
            for i in 0..n1 {
                set_cell(g, [k, j, i], eos, d0, p0, [0., 0., 0.]);
            }
        }
    }
}
