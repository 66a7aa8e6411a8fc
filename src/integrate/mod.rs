//! The unsplit corner-transport-upwind update with constrained transport.
//!
//! [`Integrator`] owns every scratch array of the scheme; allocate it once
//! per block size and reuse it for all steps. One call to
//! [`Integrator::step`] advances the grid by `grid.dt`, running the phases
//! in this fixed order: directional interface predictors, corner-EMF
//! integration and the half-step CT update, transverse-flux correction of
//! the interface states, the half-step cell-centered state, H-correction
//! widths, the second flux pass, the full-step CT update and finally the
//! full-step cell update with source terms.

mod corrector;
mod emf;
mod predictor;
mod sources;

// Move end-to-end step tests into own file
#[cfg(test)]
#[path = "./integrate_test.rs"]
mod integrate_test;

use crate::eos::{cfast, EquationOfState};
use crate::grid::Grid;
use crate::state::{Axis, Cons1D, Prim1D};
use crate::Float;
use ndarray::Array3;
use num_traits::Zero;

/// Static gravitational potential Phi(x1, x2, x3).
pub type GravPotFn = fn(Float, Float, Float) -> Float;

/// Optically thin cooling rate Lambda(d, p, dt), an energy loss per volume
/// per time.
pub type CoolingFn = fn(Float, Float, Float) -> Float;

/// Boundary remap of the y-EMF applied by the shearing-box caller before
/// the full-step CT update.
pub type RemapEyFn = fn(&Grid, &mut Array3<Float>);

/// Poisson-coupled gravity parameters. `grav_mean_rho` is the background
/// density subtracted under the Jeans swindle.
#[derive(Debug, Clone, Copy)]
pub struct SelfGravity {
    pub four_pi_g: Float,
    pub grav_mean_rho: Float,
}

/// Local rotating-frame parameters.
#[derive(Clone, Copy)]
pub struct ShearingBox {
    pub omega: Float,
    /// Background shear rate q = -dln Omega/dln r; 3/2 for Kepler.
    pub qshear: Float,
    /// When set, the background orbital shear is subtracted before
    /// integration and the tidal potential drops out.
    pub fargo: bool,
    pub remap_ey_ix1: Option<RemapEyFn>,
    pub remap_ey_ox1: Option<RemapEyFn>,
    /// Whether this block touches the inner/outer radial boundary of the
    /// domain decomposition.
    pub is_inner_x1: bool,
    pub is_outer_x1: bool,
}

/// Per-step physics configuration, evaluated once per step and never per
/// cell. Absent callables are skipped entirely.
#[derive(Clone, Copy)]
pub struct StepMode {
    pub eos: EquationOfState,
    pub mhd: bool,
    pub h_correction: bool,
    pub static_pot: Option<GravPotFn>,
    pub cooling: Option<CoolingFn>,
    pub self_gravity: Option<SelfGravity>,
    pub shearing: Option<ShearingBox>,
}

impl StepMode {
    pub fn hydro(eos: EquationOfState) -> StepMode {
        StepMode {
            eos,
            mhd: false,
            h_correction: false,
            static_pot: None,
            cooling: None,
            self_gravity: None,
            shearing: None,
        }
    }

    pub fn mhd(eos: EquationOfState) -> StepMode {
        StepMode {
            mhd: true,
            ..StepMode::hydro(eos)
        }
    }

    fn barotropic(&self) -> bool {
        self.eos.is_barotropic()
    }

    /// Whether the half-step cell-centered state has to be formed.
    fn needs_half_step(&self) -> bool {
        self.mhd
            || self.static_pot.is_some()
            || self.cooling.is_some()
            || self.self_gravity.is_some()
            || self.shearing.is_some()
    }
}

/// Scratch storage of the unsplit update for one block size.
pub struct Integrator {
    // rotated interface states and fluxes, one set per sweep direction
    ul_x1: Array3<Cons1D>,
    ur_x1: Array3<Cons1D>,
    f_x1: Array3<Cons1D>,
    ul_x2: Array3<Cons1D>,
    ur_x2: Array3<Cons1D>,
    f_x2: Array3<Cons1D>,
    ul_x3: Array3<Cons1D>,
    ur_x3: Array3<Cons1D>,
    f_x3: Array3<Cons1D>,

    // half-step predicted face fields
    b1_x1face: Array3<Float>,
    b2_x2face: Array3<Float>,
    b3_x3face: Array3<Float>,

    // edge-centered and cell-centered EMFs
    emf1: Array3<Float>,
    emf2: Array3<Float>,
    emf3: Array3<Float>,
    emf1_cc: Array3<Float>,
    emf2_cc: Array3<Float>,
    emf3_cc: Array3<Float>,

    // half-step cell diagnostics, present iff any consumer is configured
    dhalf: Option<Array3<Float>>,
    phalf: Option<Array3<Float>>,

    // H-correction dissipation widths, present iff enabled
    eta1: Option<Array3<Float>>,
    eta2: Option<Array3<Float>>,
    eta3: Option<Array3<Float>>,

    // 1-D line buffers of the predictor
    u1d: Vec<Cons1D>,
    w1d: Vec<Prim1D>,
    wl: Vec<Prim1D>,
    wr: Vec<Prim1D>,
    bxc: Vec<Float>,
    bxi: Vec<Float>,
}

impl Integrator {
    /// Preallocates all scratch arrays for an interior block of
    /// `(nx1, nx2, nx3)` cells, zero-initialized. Allocation failure
    /// aborts the process; there is no recoverable error at this point.
    /// Dropping the integrator releases all scratch storage.
    pub fn new(nx1: usize, nx2: usize, nx3: usize, mode: &StepMode) -> Integrator {
        let n1 = nx1 + 2 * crate::NGHOST;
        let n2 = nx2 + 2 * crate::NGHOST;
        let n3 = nx3 + 2 * crate::NGHOST;
        let sh = (n3, n2, n1);
        let nmax = n1.max(n2).max(n3);

        info!(
            "allocating CTU scratch for a {}x{}x{} block ({} padded cells)",
            nx1,
            nx2,
            nx3,
            n1 * n2 * n3
        );

        let zc = || Array3::from_elem(sh, Cons1D::zero());
        let zf = || Array3::<Float>::zeros(sh);

        let half = mode.needs_half_step();
        let etah = mode.h_correction;

        Integrator {
            ul_x1: zc(),
            ur_x1: zc(),
            f_x1: zc(),
            ul_x2: zc(),
            ur_x2: zc(),
            f_x2: zc(),
            ul_x3: zc(),
            ur_x3: zc(),
            f_x3: zc(),
            b1_x1face: zf(),
            b2_x2face: zf(),
            b3_x3face: zf(),
            emf1: zf(),
            emf2: zf(),
            emf3: zf(),
            emf1_cc: zf(),
            emf2_cc: zf(),
            emf3_cc: zf(),
            dhalf: if half { Some(zf()) } else { None },
            phalf: if half { Some(zf()) } else { None },
            eta1: if etah { Some(zf()) } else { None },
            eta2: if etah { Some(zf()) } else { None },
            eta3: if etah { Some(zf()) } else { None },
            u1d: vec![Cons1D::zero(); nmax],
            w1d: vec![Prim1D::zero(); nmax],
            wl: vec![Prim1D::zero(); nmax + 1],
            wr: vec![Prim1D::zero(); nmax + 1],
            bxc: vec![0.; nmax],
            bxi: vec![0.; nmax],
        }
    }

    /// Advances the grid by one time step `grid.dt`.
    ///
    /// The caller must have exchanged ghost cells (and, with self-gravity,
    /// refreshed the potential) beforehand.
    pub fn step(&mut self, g: &mut Grid, mode: &StepMode) {
        debug_assert!(g.dt > 0.);

        // interface predictors, one per sweep direction
        self.predict(g, mode, Axis::X1);
        self.predict(g, mode, Axis::X2);
        self.predict(g, mode, Axis::X3);

        if mode.mhd {
            // corner EMFs from cell-centered EMFs at t^n plus the
            // first-pass fluxes of B, then the half-step CT update of the
            // scratch face fields
            self.cell_centered_emfs(g);
            self.integrate_emf_corners(g);
            self.b1_x1face.assign(&g.b1i);
            self.b2_x2face.assign(&g.b2i);
            self.b3_x3face.assign(&g.b3i);
            self.ct_update_half(g);
        } else {
            self.b1_x1face.assign(&g.b1i);
            self.b2_x2face.assign(&g.b2i);
            self.b3_x3face.assign(&g.b3i);
        }

        // transverse-flux correction of the interface states
        self.correct_x1_faces(g, mode);
        self.correct_x2_faces(g, mode);
        self.correct_x3_faces(g, mode);

        if mode.needs_half_step() {
            self.half_step_cell_state(g, mode);
        }

        if mode.h_correction {
            self.compute_eta(g, mode);
        }

        // second flux pass on the corrected interface states
        self.second_pass_fluxes(g, mode);

        if mode.mhd {
            // corner EMFs from the half-step cell-centered EMFs and the
            // second-pass fluxes, remapped at shearing boundaries, then
            // the full-step CT update of the grid face fields
            self.integrate_emf_corners(g);
            if let Some(sb) = &mode.shearing {
                if sb.is_inner_x1 {
                    if let Some(remap) = sb.remap_ey_ix1 {
                        remap(g, &mut self.emf2);
                    }
                }
                if sb.is_outer_x1 {
                    if let Some(remap) = sb.remap_ey_ox1 {
                        remap(g, &mut self.emf2);
                    }
                }
            }
            self.ct_update_full(g);
        }

        // full-step source terms, then the conservative flux update
        self.full_step_sources(g, mode);
        self.flux_divergence_update(g, mode);

        if mode.mhd {
            let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
            g.cell_center_b((ks, ke), (js, je), (is, ie));
        }

        if let Some(sg) = &mut g.self_gravity {
            // keep the mass fluxes the Poisson caller flux-corrects with
            if mode.self_gravity.is_some() {
                let (n3, n2, n1) = sg.phi.dim();
                for k in 0..n3 {
                    for j in 0..n2 {
                        for i in 0..n1 {
                            sg.x1_mass_flux[[k, j, i]] = self.f_x1[[k, j, i]].d;
                            sg.x2_mass_flux[[k, j, i]] = self.f_x2[[k, j, i]].d;
                            sg.x3_mass_flux[[k, j, i]] = self.f_x3[[k, j, i]].d;
                        }
                    }
                }
            }
        }
    }

    /// H-correction widths: half the spread of the extreme face
    /// wavespeeds, per face family.
    fn compute_eta(&mut self, g: &Grid, mode: &StepMode) {
        let eos = mode.eos;
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);

        let eta1 = self.eta1.as_mut().unwrap();
        for k in ks - 1..=ke + 1 {
            for j in js - 1..=je + 1 {
                for i in is - 1..=ie + 2 {
                    let bx = self.b1_x1face[[k, j, i]];
                    let ul = &self.ul_x1[[k, j, i]];
                    let ur = &self.ur_x1[[k, j, i]];
                    let lr = ur.mx / ur.d + cfast(ur, bx, eos);
                    let ll = ul.mx / ul.d - cfast(ul, bx, eos);
                    eta1[[k, j, i]] = 0.5 * (lr - ll).abs();
                }
            }
        }

        let eta2 = self.eta2.as_mut().unwrap();
        for k in ks - 1..=ke + 1 {
            for j in js - 1..=je + 2 {
                for i in is - 1..=ie + 1 {
                    let bx = self.b2_x2face[[k, j, i]];
                    let ul = &self.ul_x2[[k, j, i]];
                    let ur = &self.ur_x2[[k, j, i]];
                    let lr = ur.mx / ur.d + cfast(ur, bx, eos);
                    let ll = ul.mx / ul.d - cfast(ul, bx, eos);
                    eta2[[k, j, i]] = 0.5 * (lr - ll).abs();
                }
            }
        }

        let eta3 = self.eta3.as_mut().unwrap();
        for k in ks - 1..=ke + 2 {
            for j in js - 1..=je + 1 {
                for i in is - 1..=ie + 1 {
                    let bx = self.b3_x3face[[k, j, i]];
                    let ul = &self.ul_x3[[k, j, i]];
                    let ur = &self.ur_x3[[k, j, i]];
                    let lr = ur.mx / ur.d + cfast(ur, bx, eos);
                    let ll = ul.mx / ul.d - cfast(ul, bx, eos);
                    eta3[[k, j, i]] = 0.5 * (lr - ll).abs();
                }
            }
        }
    }

    /// Maximum of the H-correction widths over the transverse cross
    /// stencil of a face, plus the face itself.
    fn etah_at(&self, axis: Axis, k: usize, j: usize, i: usize) -> Float {
        let (eta1, eta2, eta3) = match (&self.eta1, &self.eta2, &self.eta3) {
            (Some(e1), Some(e2), Some(e3)) => (e1, e2, e3),
            _ => return 0.,
        };

        let vals = match axis {
            Axis::X1 => [
                eta2[[k, j, i - 1]],
                eta2[[k, j, i]],
                eta2[[k, j + 1, i - 1]],
                eta2[[k, j + 1, i]],
                eta3[[k, j, i - 1]],
                eta3[[k, j, i]],
                eta3[[k + 1, j, i - 1]],
                eta3[[k + 1, j, i]],
                eta1[[k, j, i]],
            ],
            Axis::X2 => [
                eta3[[k, j - 1, i]],
                eta3[[k, j, i]],
                eta3[[k + 1, j - 1, i]],
                eta3[[k + 1, j, i]],
                eta1[[k, j - 1, i]],
                eta1[[k, j, i]],
                eta1[[k, j - 1, i + 1]],
                eta1[[k, j, i + 1]],
                eta2[[k, j, i]],
            ],
            Axis::X3 => [
                eta1[[k - 1, j, i]],
                eta1[[k, j, i]],
                eta1[[k - 1, j, i + 1]],
                eta1[[k, j, i + 1]],
                eta2[[k - 1, j, i]],
                eta2[[k, j, i]],
                eta2[[k - 1, j + 1, i]],
                eta2[[k, j + 1, i]],
                eta3[[k, j, i]],
            ],
        };

        vals.iter().cloned().fold(0., Float::max)
    }

    /// Re-solves the Riemann problem on the transverse-corrected states.
    fn second_pass_fluxes(&mut self, g: &Grid, mode: &StepMode) {
        use crate::riemann::get_fluxes;
        use crate::state::cons1d_to_prim1d;

        let eos = mode.eos;
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);

        for k in ks - 1..=ke + 1 {
            for j in js - 1..=je + 1 {
                for i in is..=ie + 1 {
                    let bx = self.b1_x1face[[k, j, i]];
                    let ul = self.ul_x1[[k, j, i]];
                    let ur = self.ur_x1[[k, j, i]];
                    let wl = cons1d_to_prim1d(&ul, bx, eos);
                    let wr = cons1d_to_prim1d(&ur, bx, eos);
                    let etah = if mode.h_correction {
                        self.etah_at(Axis::X1, k, j, i)
                    } else {
                        0.
                    };
                    self.f_x1[[k, j, i]] = get_fluxes(&ul, &ur, &wl, &wr, bx, etah, eos);
                }
            }
        }

        for k in ks - 1..=ke + 1 {
            for j in js..=je + 1 {
                for i in is - 1..=ie + 1 {
                    let bx = self.b2_x2face[[k, j, i]];
                    let ul = self.ul_x2[[k, j, i]];
                    let ur = self.ur_x2[[k, j, i]];
                    let wl = cons1d_to_prim1d(&ul, bx, eos);
                    let wr = cons1d_to_prim1d(&ur, bx, eos);
                    let etah = if mode.h_correction {
                        self.etah_at(Axis::X2, k, j, i)
                    } else {
                        0.
                    };
                    self.f_x2[[k, j, i]] = get_fluxes(&ul, &ur, &wl, &wr, bx, etah, eos);
                }
            }
        }

        for k in ks..=ke + 1 {
            for j in js - 1..=je + 1 {
                for i in is - 1..=ie + 1 {
                    let bx = self.b3_x3face[[k, j, i]];
                    let ul = self.ul_x3[[k, j, i]];
                    let ur = self.ur_x3[[k, j, i]];
                    let wl = cons1d_to_prim1d(&ul, bx, eos);
                    let wr = cons1d_to_prim1d(&ur, bx, eos);
                    let etah = if mode.h_correction {
                        self.etah_at(Axis::X3, k, j, i)
                    } else {
                        0.
                    };
                    self.f_x3[[k, j, i]] = get_fluxes(&ul, &ur, &wl, &wr, bx, etah, eos);
                }
            }
        }
    }

    /// Conservative update of the cell-centered state with the second-pass
    /// fluxes. Momentum components of the rotated fluxes are permuted back
    /// to the grid frame; scalars pass through untouched.
    fn flux_divergence_update(&mut self, g: &mut Grid, mode: &StepMode) {
        let dtodx1 = g.dt / g.dx1;
        let dtodx2 = g.dt / g.dx2;
        let dtodx3 = g.dt / g.dx3;
        let barotropic = mode.barotropic();
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);

        for k in ks..=ke {
            for j in js..=je {
                for i in is..=ie {
                    let u = &mut g.u[[k, j, i]];

                    for &(axis, q, lo, hi) in &[
                        (
                            Axis::X1,
                            dtodx1,
                            self.f_x1[[k, j, i]],
                            self.f_x1[[k, j, i + 1]],
                        ),
                        (
                            Axis::X2,
                            dtodx2,
                            self.f_x2[[k, j, i]],
                            self.f_x2[[k, j + 1, i]],
                        ),
                        (
                            Axis::X3,
                            dtodx3,
                            self.f_x3[[k, j, i]],
                            self.f_x3[[k + 1, j, i]],
                        ),
                    ] {
                        u.d -= q * (hi.d - lo.d);
                        let ml = lo.m_grid(axis);
                        let mh = hi.m_grid(axis);
                        u.m1 -= q * (mh[0] - ml[0]);
                        u.m2 -= q * (mh[1] - ml[1]);
                        u.m3 -= q * (mh[2] - ml[2]);
                        if !barotropic {
                            u.e -= q * (hi.e - lo.e);
                        }
                        for n in 0..crate::NSCALARS {
                            u.s[n] -= q * (hi.s[n] - lo.s[n]);
                        }
                    }
                }
            }
        }
    }
}
