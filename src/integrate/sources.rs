//! Source terms shared by the predictor, the transverse corrector, the
//! half-step cell state and the full-step update: static potential,
//! self-gravity Poisson coupling, optically thin cooling and the
//! shearing-box Coriolis/tidal forces.

use super::predictor::sweep_index;
use super::{Integrator, StepMode};
use crate::grid::Grid;
use crate::state::{Axis, Prim1D};
use crate::Float;

/// Whether any external (non-Poisson) potential acts on the half-step
/// interface states. The non-FARGO shearing box contributes its tidal
/// potential here; with FARGO the background shear is subtracted before
/// integration and the tidal term drops out.
pub(super) fn has_ext_pot(mode: &StepMode) -> bool {
    mode.static_pot.is_some() || matches!(&mode.shearing, Some(sb) if !sb.fargo)
}

/// External potential at a point: the caller-supplied static potential
/// plus, for a non-FARGO shearing box, the tidal potential -q Omega^2 x1^2.
pub(super) fn ext_pot(mode: &StepMode, x1: Float, x2: Float, x3: Float) -> Float {
    let mut phi = 0.;
    if let Some(pot) = mode.static_pot {
        phi += pot(x1, x2, x3);
    }
    if let Some(sb) = &mode.shearing {
        if !sb.fargo {
            phi -= sb.qshear * sb.omega * sb.omega * x1 * x1;
        }
    }
    phi
}

/// Sweep-frame velocity component accessors: slot 0 is vx, 1 vy, 2 vz.
fn vget(w: &Prim1D, slot: usize) -> Float {
    match slot {
        0 => w.vx,
        1 => w.vy,
        _ => w.vz,
    }
}

fn vadd(w: &mut Prim1D, slot: usize, dv: Float) {
    match slot {
        0 => w.vx += dv,
        1 => w.vy += dv,
        _ => w.vz += dv,
    }
}

/// Sweep-frame slots of the grid velocity components v1 and v2, which the
/// Coriolis force couples.
fn grid_v_slots(axis: Axis) -> (usize, usize) {
    match axis {
        Axis::X1 => (0, 1),
        Axis::X2 => (2, 0),
        Axis::X3 => (1, 2),
    }
}

/// Offsets a position along the sweep axis.
fn offset(axis: Axis, p: (Float, Float, Float), d: Float) -> (Float, Float, Float) {
    match axis {
        Axis::X1 => (p.0 + d, p.1, p.2),
        Axis::X2 => (p.0, p.1 + d, p.2),
        Axis::X3 => (p.0, p.1, p.2 + d),
    }
}

/// Half-step source terms applied to the reconstructed interface
/// primitives of one sweep line.
#[allow(clippy::too_many_arguments)]
pub(super) fn predictor_sources(
    g: &Grid,
    mode: &StepMode,
    axis: Axis,
    a: usize,
    b: usize,
    lo: usize,
    hi: usize,
    w1d: &[Prim1D],
    wl: &mut [Prim1D],
    wr: &mut [Prim1D],
) {
    let dt = g.dt;
    let hdt = 0.5 * dt;
    let dx = match axis {
        Axis::X1 => g.dx1,
        Axis::X2 => g.dx2,
        Axis::X3 => g.dx3,
    };
    let dtodx = dt / dx;
    let hdtodx = 0.5 * dtodx;

    // potential differences between the face and the adjacent cell centers
    if has_ext_pot(mode) {
        for s in lo..=hi + 1 {
            let [k, j, i] = sweep_index(axis, a, b, s);
            let (x1, x2, x3) = g.cc_pos(i, j, k);
            let pc = (x1, x2, x3);
            let phicr = ext_pot(mode, pc.0, pc.1, pc.2);
            let pl = offset(axis, pc, -dx);
            let phicl = ext_pot(mode, pl.0, pl.1, pl.2);
            let pf = offset(axis, pc, -0.5 * dx);
            let phifc = ext_pot(mode, pf.0, pf.1, pf.2);

            wl[s].vx -= dtodx * (phifc - phicl);
            wr[s].vx -= dtodx * (phicr - phifc);
        }
    }

    if mode.self_gravity.is_some() {
        let sg = g
            .self_gravity
            .as_ref()
            .expect("self-gravity enabled without grid potential arrays");
        for s in lo..=hi + 1 {
            let ic = sweep_index(axis, a, b, s);
            let im = sweep_index(axis, a, b, s - 1);
            let dphi = sg.phi[ic] - sg.phi[im];
            wl[s].vx -= hdtodx * dphi;
            wr[s].vx -= hdtodx * dphi;
        }
    }

    if let Some(cool) = mode.cooling {
        if !mode.eos.is_barotropic() {
            let gamma_1 = mode.eos.gamma_1();
            for s in lo..=hi + 1 {
                let coolfl = cool(wl[s].d, wl[s].p, hdt);
                let coolfr = cool(wr[s].d, wr[s].p, hdt);
                wl[s].p -= hdt * gamma_1 * coolfl;
                wr[s].p -= hdt * gamma_1 * coolfr;
            }
        }
    }

    // Coriolis force on the (v1, v2) pair, taken from the upwind cell
    if let Some(sb) = &mode.shearing {
        let (s1, s2) = grid_v_slots(axis);
        let cy = if sb.fargo { sb.qshear - 2.0 } else { -2.0 };
        for s in lo..=hi + 1 {
            let w0l = w1d[s - 1];
            let w0r = w1d[s];
            vadd(&mut wl[s], s1, dt * sb.omega * vget(&w0l, s2));
            vadd(&mut wl[s], s2, hdt * cy * sb.omega * vget(&w0l, s1));
            vadd(&mut wr[s], s1, dt * sb.omega * vget(&w0r, s2));
            vadd(&mut wr[s], s2, hdt * cy * sb.omega * vget(&w0r, s1));
        }
    }
}

impl Integrator {
    /// Cell-centered density, momenta and pressure at t^{n+1/2} from the
    /// first-pass flux divergence plus half-step source terms, and the
    /// cell-centered EMFs recomputed at the half step.
    pub(super) fn half_step_cell_state(&mut self, g: &Grid, mode: &StepMode) {
        let eos = mode.eos;
        let barotropic = eos.is_barotropic();
        let gamma_1 = eos.gamma_1();
        let dt = g.dt;
        let hdt = 0.5 * dt;
        let hdtodx1 = hdt / g.dx1;
        let hdtodx2 = hdt / g.dx2;
        let hdtodx3 = hdt / g.dx3;
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);

        let f1 = &self.f_x1;
        let f2 = &self.f_x2;
        let f3 = &self.f_x3;
        let bf1 = &self.b1_x1face;
        let bf2 = &self.b2_x2face;
        let bf3 = &self.b3_x3face;
        let dhalf = self.dhalf.as_mut().unwrap();
        let phalf = self.phalf.as_mut().unwrap();
        let emf1_cc = &mut self.emf1_cc;
        let emf2_cc = &mut self.emf2_cc;
        let emf3_cc = &mut self.emf3_cc;

        for k in ks - 1..=ke + 1 {
            for j in js - 1..=je + 1 {
                for i in is - 1..=ie + 1 {
                    let u = &g.u[[k, j, i]];

                    let dh = u.d
                        - hdtodx1 * (f1[[k, j, i + 1]].d - f1[[k, j, i]].d)
                        - hdtodx2 * (f2[[k, j + 1, i]].d - f2[[k, j, i]].d)
                        - hdtodx3 * (f3[[k + 1, j, i]].d - f3[[k, j, i]].d);
                    dhalf[[k, j, i]] = dh;

                    let mut m1h = u.m1
                        - hdtodx1 * (f1[[k, j, i + 1]].mx - f1[[k, j, i]].mx)
                        - hdtodx2 * (f2[[k, j + 1, i]].mz - f2[[k, j, i]].mz)
                        - hdtodx3 * (f3[[k + 1, j, i]].my - f3[[k, j, i]].my);
                    let mut m2h = u.m2
                        - hdtodx1 * (f1[[k, j, i + 1]].my - f1[[k, j, i]].my)
                        - hdtodx2 * (f2[[k, j + 1, i]].mx - f2[[k, j, i]].mx)
                        - hdtodx3 * (f3[[k + 1, j, i]].mz - f3[[k, j, i]].mz);
                    let mut m3h = u.m3
                        - hdtodx1 * (f1[[k, j, i + 1]].mz - f1[[k, j, i]].mz)
                        - hdtodx2 * (f2[[k, j + 1, i]].my - f2[[k, j, i]].my)
                        - hdtodx3 * (f3[[k + 1, j, i]].mx - f3[[k, j, i]].mx);

                    let (x1, x2, x3) = g.cc_pos(i, j, k);

                    if has_ext_pot(mode) {
                        let d1 = ext_pot(mode, x1 + 0.5 * g.dx1, x2, x3)
                            - ext_pot(mode, x1 - 0.5 * g.dx1, x2, x3);
                        let d2 = ext_pot(mode, x1, x2 + 0.5 * g.dx2, x3)
                            - ext_pot(mode, x1, x2 - 0.5 * g.dx2, x3);
                        let d3 = ext_pot(mode, x1, x2, x3 + 0.5 * g.dx3)
                            - ext_pot(mode, x1, x2, x3 - 0.5 * g.dx3);
                        m1h -= hdtodx1 * d1 * u.d;
                        m2h -= hdtodx2 * d2 * u.d;
                        m3h -= hdtodx3 * d3 * u.d;
                    }

                    if mode.self_gravity.is_some() {
                        let phi = &g.self_gravity.as_ref().unwrap().phi;
                        m1h -= hdtodx1 * 0.5 * (phi[[k, j, i + 1]] - phi[[k, j, i - 1]]) * u.d;
                        m2h -= hdtodx2 * 0.5 * (phi[[k, j + 1, i]] - phi[[k, j - 1, i]]) * u.d;
                        m3h -= hdtodx3 * 0.5 * (phi[[k + 1, j, i]] - phi[[k - 1, j, i]]) * u.d;
                    }

                    if let Some(sb) = &mode.shearing {
                        let cy = if sb.fargo { sb.qshear - 2.0 } else { -2.0 };
                        m1h += dt * sb.omega * u.m2;
                        m2h += hdt * cy * sb.omega * u.m1;
                    }

                    let (b1ch, b2ch, b3ch) = if mode.mhd {
                        (
                            0.5 * (bf1[[k, j, i]] + bf1[[k, j, i + 1]]),
                            0.5 * (bf2[[k, j, i]] + bf2[[k, j + 1, i]]),
                            0.5 * (bf3[[k, j, i]] + bf3[[k + 1, j, i]]),
                        )
                    } else {
                        (u.b1c, u.b2c, u.b3c)
                    };

                    if mode.mhd {
                        emf1_cc[[k, j, i]] = (b2ch * m3h - b3ch * m2h) / dh;
                        emf2_cc[[k, j, i]] = (b3ch * m1h - b1ch * m3h) / dh;
                        emf3_cc[[k, j, i]] = (b1ch * m2h - b2ch * m1h) / dh;
                    }

                    if !barotropic {
                        let mut eh = u.e
                            - hdtodx1 * (f1[[k, j, i + 1]].e - f1[[k, j, i]].e)
                            - hdtodx2 * (f2[[k, j + 1, i]].e - f2[[k, j, i]].e)
                            - hdtodx3 * (f3[[k + 1, j, i]].e - f3[[k, j, i]].e);

                        if has_ext_pot(mode) {
                            let phic = ext_pot(mode, x1, x2, x3);
                            let phil = ext_pot(mode, x1 - 0.5 * g.dx1, x2, x3);
                            let phir = ext_pot(mode, x1 + 0.5 * g.dx1, x2, x3);
                            eh -= hdtodx1
                                * (f1[[k, j, i]].d * (phic - phil)
                                    + f1[[k, j, i + 1]].d * (phir - phic));
                            let phil = ext_pot(mode, x1, x2 - 0.5 * g.dx2, x3);
                            let phir = ext_pot(mode, x1, x2 + 0.5 * g.dx2, x3);
                            eh -= hdtodx2
                                * (f2[[k, j, i]].d * (phic - phil)
                                    + f2[[k, j + 1, i]].d * (phir - phic));
                            let phil = ext_pot(mode, x1, x2, x3 - 0.5 * g.dx3);
                            let phir = ext_pot(mode, x1, x2, x3 + 0.5 * g.dx3);
                            eh -= hdtodx3
                                * (f3[[k, j, i]].d * (phic - phil)
                                    + f3[[k + 1, j, i]].d * (phir - phic));
                        }

                        if mode.self_gravity.is_some() {
                            let phi = &g.self_gravity.as_ref().unwrap().phi;
                            let phic = phi[[k, j, i]];
                            let phil = 0.5 * (phi[[k, j, i - 1]] + phic);
                            let phir = 0.5 * (phic + phi[[k, j, i + 1]]);
                            eh -= hdtodx1
                                * (f1[[k, j, i]].d * (phic - phil)
                                    + f1[[k, j, i + 1]].d * (phir - phic));
                            let phil = 0.5 * (phi[[k, j - 1, i]] + phic);
                            let phir = 0.5 * (phic + phi[[k, j + 1, i]]);
                            eh -= hdtodx2
                                * (f2[[k, j, i]].d * (phic - phil)
                                    + f2[[k, j + 1, i]].d * (phir - phic));
                            let phil = 0.5 * (phi[[k - 1, j, i]] + phic);
                            let phir = 0.5 * (phic + phi[[k + 1, j, i]]);
                            eh -= hdtodx3
                                * (f3[[k, j, i]].d * (phic - phil)
                                    + f3[[k + 1, j, i]].d * (phir - phic));
                        }

                        if let Some(cool) = mode.cooling {
                            let ke = 0.5 * (u.m1 * u.m1 + u.m2 * u.m2 + u.m3 * u.m3) / u.d;
                            let me = 0.5 * (u.b1c * u.b1c + u.b2c * u.b2c + u.b3c * u.b3c);
                            let pn = gamma_1 * (u.e - ke - me);
                            eh -= hdt * cool(u.d, pn, hdt);
                        }

                        let ke = 0.5 * (m1h * m1h + m2h * m2h + m3h * m3h) / dh;
                        let me = 0.5 * (b1ch * b1ch + b2ch * b2ch + b3ch * b3ch);
                        phalf[[k, j, i]] = gamma_1 * (eh - ke - me);
                    }
                }
            }
        }
    }

    /// Full-step source terms applied to the grid before the conservative
    /// flux update: static potential with half-step density, the non-FARGO
    /// tidal energy work, self-gravity in momentum-flux form, the
    /// shearing-box Crank-Nicholson pair update and cooling evaluated on
    /// the half-step state.
    pub(super) fn full_step_sources(&mut self, g: &mut Grid, mode: &StepMode) {
        let eos = mode.eos;
        let barotropic = eos.is_barotropic();
        let dt = g.dt;
        let dtodx1 = dt / g.dx1;
        let dtodx2 = dt / g.dx2;
        let dtodx3 = dt / g.dx3;
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        let (x1min, x2min, x3min) = g.origin();
        let (dx1, dx2, dx3) = (g.dx1, g.dx2, g.dx3);
        let cc = move |i: usize, j: usize, k: usize| {
            (
                x1min + (i as Float - is as Float + 0.5) * dx1,
                x2min + (j as Float - js as Float + 0.5) * dx2,
                x3min + (k as Float - ks as Float + 0.5) * dx3,
            )
        };

        let f1 = &self.f_x1;
        let f2 = &self.f_x2;
        let f3 = &self.f_x3;

        if let Some(pot) = mode.static_pot {
            let dhalf = self.dhalf.as_ref().unwrap();
            for k in ks..=ke {
                for j in js..=je {
                    for i in is..=ie {
                        let (x1, x2, x3) = cc(i, j, k);
                        let dh = dhalf[[k, j, i]];
                        let phic = pot(x1, x2, x3);
                        let u = &mut g.u[[k, j, i]];

                        let phil = pot(x1 - 0.5 * dx1, x2, x3);
                        let phir = pot(x1 + 0.5 * dx1, x2, x3);
                        u.m1 -= dtodx1 * (phir - phil) * dh;
                        if !barotropic {
                            u.e -= dtodx1
                                * (f1[[k, j, i]].d * (phic - phil)
                                    + f1[[k, j, i + 1]].d * (phir - phic));
                        }

                        let phil = pot(x1, x2 - 0.5 * dx2, x3);
                        let phir = pot(x1, x2 + 0.5 * dx2, x3);
                        u.m2 -= dtodx2 * (phir - phil) * dh;
                        if !barotropic {
                            u.e -= dtodx2
                                * (f2[[k, j, i]].d * (phic - phil)
                                    + f2[[k, j + 1, i]].d * (phir - phic));
                        }

                        let phil = pot(x1, x2, x3 - 0.5 * dx3);
                        let phir = pot(x1, x2, x3 + 0.5 * dx3);
                        u.m3 -= dtodx3 * (phir - phil) * dh;
                        if !barotropic {
                            u.e -= dtodx3
                                * (f3[[k, j, i]].d * (phic - phil)
                                    + f3[[k + 1, j, i]].d * (phir - phic));
                        }
                    }
                }
            }
        }

        // the tidal potential's energy work; its momentum is inside the
        // Crank-Nicholson pair through the definition of dM2
        if let Some(sb) = &mode.shearing {
            if !sb.fargo && !barotropic {
                let qo2 = sb.qshear * sb.omega * sb.omega;
                for k in ks..=ke {
                    for j in js..=je {
                        for i in is..=ie {
                            let (x1, _, _) = cc(i, j, k);
                            let phic = -qo2 * x1 * x1;
                            let xl = x1 - 0.5 * dx1;
                            let xr = x1 + 0.5 * dx1;
                            let phil = -qo2 * xl * xl;
                            let phir = -qo2 * xr * xr;
                            g.u[[k, j, i]].e -= dtodx1
                                * (f1[[k, j, i]].d * (phic - phil)
                                    + f1[[k, j, i + 1]].d * (phir - phic));
                        }
                    }
                }
            }
        }

        if let Some(sgp) = &mode.self_gravity {
            let four_pi_g = sgp.four_pi_g;
            let mean_rho = sgp.grav_mean_rho;
            let phi = &g
                .self_gravity
                .as_ref()
                .expect("self-gravity enabled without grid potential arrays")
                .phi;

            for k in ks..=ke {
                for j in js..=je {
                    for i in is..=ie {
                        let phic = phi[[k, j, i]];

                        // x1-direction stress-tensor fluxes on the two faces
                        let gxl = (phi[[k, j, i - 1]] - phic) / dx1;
                        let gxr = (phic - phi[[k, j, i + 1]]) / dx1;
                        let gyl = 0.25
                            * ((phi[[k, j - 1, i - 1]] - phi[[k, j + 1, i - 1]])
                                + (phi[[k, j - 1, i]] - phi[[k, j + 1, i]]))
                            / dx2;
                        let gyr = 0.25
                            * ((phi[[k, j - 1, i]] - phi[[k, j + 1, i]])
                                + (phi[[k, j - 1, i + 1]] - phi[[k, j + 1, i + 1]]))
                            / dx2;
                        let gzl = 0.25
                            * ((phi[[k - 1, j, i - 1]] - phi[[k + 1, j, i - 1]])
                                + (phi[[k - 1, j, i]] - phi[[k + 1, j, i]]))
                            / dx3;
                        let gzr = 0.25
                            * ((phi[[k - 1, j, i]] - phi[[k + 1, j, i]])
                                + (phi[[k - 1, j, i + 1]] - phi[[k + 1, j, i + 1]]))
                            / dx3;
                        let phil = 0.5 * (phi[[k, j, i - 1]] + phic);
                        let phir = 0.5 * (phic + phi[[k, j, i + 1]]);

                        let fm1l = 0.5 * (gxl * gxl - gyl * gyl - gzl * gzl) / four_pi_g
                            + mean_rho * phil;
                        let fm1r = 0.5 * (gxr * gxr - gyr * gyr - gzr * gzr) / four_pi_g
                            + mean_rho * phir;

                        let u = &mut g.u[[k, j, i]];
                        u.m1 -= dtodx1 * (fm1r - fm1l);
                        u.m2 -= dtodx1 * (gxr * gyr - gxl * gyl) / four_pi_g;
                        u.m3 -= dtodx1 * (gxr * gzr - gxl * gzl) / four_pi_g;
                        if !barotropic {
                            u.e -= dtodx1
                                * (f1[[k, j, i]].d * (phic - phil)
                                    + f1[[k, j, i + 1]].d * (phir - phic));
                        }

                        // x2-direction
                        let gyl = (phi[[k, j - 1, i]] - phic) / dx2;
                        let gyr = (phic - phi[[k, j + 1, i]]) / dx2;
                        let gxl = 0.25
                            * ((phi[[k, j - 1, i - 1]] - phi[[k, j - 1, i + 1]])
                                + (phi[[k, j, i - 1]] - phi[[k, j, i + 1]]))
                            / dx1;
                        let gxr = 0.25
                            * ((phi[[k, j, i - 1]] - phi[[k, j, i + 1]])
                                + (phi[[k, j + 1, i - 1]] - phi[[k, j + 1, i + 1]]))
                            / dx1;
                        let gzl = 0.25
                            * ((phi[[k - 1, j - 1, i]] - phi[[k + 1, j - 1, i]])
                                + (phi[[k - 1, j, i]] - phi[[k + 1, j, i]]))
                            / dx3;
                        let gzr = 0.25
                            * ((phi[[k - 1, j, i]] - phi[[k + 1, j, i]])
                                + (phi[[k - 1, j + 1, i]] - phi[[k + 1, j + 1, i]]))
                            / dx3;
                        let phil = 0.5 * (phi[[k, j - 1, i]] + phic);
                        let phir = 0.5 * (phic + phi[[k, j + 1, i]]);

                        let fm2l = 0.5 * (gyl * gyl - gxl * gxl - gzl * gzl) / four_pi_g
                            + mean_rho * phil;
                        let fm2r = 0.5 * (gyr * gyr - gxr * gxr - gzr * gzr) / four_pi_g
                            + mean_rho * phir;

                        let u = &mut g.u[[k, j, i]];
                        u.m2 -= dtodx2 * (fm2r - fm2l);
                        u.m1 -= dtodx2 * (gyr * gxr - gyl * gxl) / four_pi_g;
                        u.m3 -= dtodx2 * (gyr * gzr - gyl * gzl) / four_pi_g;
                        if !barotropic {
                            u.e -= dtodx2
                                * (f2[[k, j, i]].d * (phic - phil)
                                    + f2[[k, j + 1, i]].d * (phir - phic));
                        }

                        // x3-direction
                        let gzl = (phi[[k - 1, j, i]] - phic) / dx3;
                        let gzr = (phic - phi[[k + 1, j, i]]) / dx3;
                        let gxl = 0.25
                            * ((phi[[k - 1, j, i - 1]] - phi[[k - 1, j, i + 1]])
                                + (phi[[k, j, i - 1]] - phi[[k, j, i + 1]]))
                            / dx1;
                        let gxr = 0.25
                            * ((phi[[k, j, i - 1]] - phi[[k, j, i + 1]])
                                + (phi[[k + 1, j, i - 1]] - phi[[k + 1, j, i + 1]]))
                            / dx1;
                        let gyl = 0.25
                            * ((phi[[k - 1, j - 1, i]] - phi[[k - 1, j + 1, i]])
                                + (phi[[k, j - 1, i]] - phi[[k, j + 1, i]]))
                            / dx2;
                        let gyr = 0.25
                            * ((phi[[k, j - 1, i]] - phi[[k, j + 1, i]])
                                + (phi[[k + 1, j - 1, i]] - phi[[k + 1, j + 1, i]]))
                            / dx2;
                        let phil = 0.5 * (phi[[k - 1, j, i]] + phic);
                        let phir = 0.5 * (phic + phi[[k + 1, j, i]]);

                        let fm3l = 0.5 * (gzl * gzl - gxl * gxl - gyl * gyl) / four_pi_g
                            + mean_rho * phil;
                        let fm3r = 0.5 * (gzr * gzr - gxr * gxr - gyr * gyr) / four_pi_g
                            + mean_rho * phir;

                        let u = &mut g.u[[k, j, i]];
                        u.m3 -= dtodx3 * (fm3r - fm3l);
                        u.m1 -= dtodx3 * (gzr * gxr - gzl * gxl) / four_pi_g;
                        u.m2 -= dtodx3 * (gzr * gyr - gzl * gyl) / four_pi_g;
                        if !barotropic {
                            u.e -= dtodx3
                                * (f3[[k, j, i]].d * (phic - phil)
                                    + f3[[k + 1, j, i]].d * (phir - phic));
                        }
                    }
                }
            }
        }

        if let Some(sb) = &mode.shearing {
            let om_dt = sb.omega * dt;
            let fact = om_dt / (1.0 - 0.5 * (sb.qshear - 2.0) * om_dt * om_dt);
            let qom = sb.qshear * sb.omega;
            let hdtodx1 = 0.5 * dtodx1;
            let hdtodx2 = 0.5 * dtodx2;
            let hdtodx3 = 0.5 * dtodx3;

            for k in ks..=ke {
                for j in js..=je {
                    for i in is..=ie {
                        let (x1, _, _) = cc(i, j, k);
                        let u = &g.u[[k, j, i]];
                        let m1n = u.m1;
                        let dm2n = if sb.fargo {
                            u.m2
                        } else {
                            u.m2 + qom * x1 * u.d
                        };

                        // fluxes of the y-momentum fluctuation; the
                        // non-FARGO correction uses the face coordinate
                        let (qxl, qxr) = if sb.fargo {
                            (0., 0.)
                        } else {
                            (qom * (x1 - 0.5 * dx1), qom * (x1 + 0.5 * dx1))
                        };
                        let qc = if sb.fargo { 0. } else { qom * x1 };

                        let frx1_l = f1[[k, j, i]].my + qxl * f1[[k, j, i]].d;
                        let frx1_r = f1[[k, j, i + 1]].my + qxr * f1[[k, j, i + 1]].d;
                        let frx2_l = f2[[k, j, i]].mx + qc * f2[[k, j, i]].d;
                        let frx2_r = f2[[k, j + 1, i]].mx + qc * f2[[k, j + 1, i]].d;
                        let frx3_l = f3[[k, j, i]].mz + qc * f3[[k, j, i]].d;
                        let frx3_r = f3[[k + 1, j, i]].mz + qc * f3[[k + 1, j, i]].d;

                        // half-step flux-evolved pair, then the implicit
                        // rotation with factor fact
                        let m1e = m1n
                            - hdtodx1 * (f1[[k, j, i + 1]].mx - f1[[k, j, i]].mx)
                            - hdtodx2 * (f2[[k, j + 1, i]].mz - f2[[k, j, i]].mz)
                            - hdtodx3 * (f3[[k + 1, j, i]].my - f3[[k, j, i]].my);
                        let dm2e = dm2n
                            - hdtodx1 * (frx1_r - frx1_l)
                            - hdtodx2 * (frx2_r - frx2_l)
                            - hdtodx3 * (frx3_r - frx3_l);

                        let dm1 = fact * (2.0 * dm2e + (sb.qshear - 2.0) * om_dt * m1e);
                        let dm2 = 0.5 * (sb.qshear - 2.0) * om_dt * (2.0 * m1e + dm1);

                        let u = &mut g.u[[k, j, i]];
                        u.m1 += dm1;
                        u.m2 += dm2;
                    }
                }
            }
        }

        if let Some(cool) = mode.cooling {
            if !barotropic {
                let dhalf = self.dhalf.as_ref().unwrap();
                let phalf = self.phalf.as_ref().unwrap();
                for k in ks..=ke {
                    for j in js..=je {
                        for i in is..=ie {
                            let coolf = cool(dhalf[[k, j, i]], phalf[[k, j, i]], dt);
                            g.u[[k, j, i]].e -= dt * coolf;
                        }
                    }
                }
            }
        }
    }
}
