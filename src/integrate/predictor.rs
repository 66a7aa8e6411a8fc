//! Interface predictor: one 1-D sweep per direction producing left/right
//! interface states at the half step and the first-pass fluxes.

use super::sources;
use super::{Integrator, StepMode};
use crate::grid::Grid;
use crate::reconstruct::lr_states;
use crate::riemann::get_fluxes;
use crate::state::{cons1d_to_prim1d, prim1d_to_cons1d, Axis};
use crate::Float;

/// Grid index `[k, j, i]` of sweep position `s` on the transverse line
/// `(a, b)`. Lines run over (k, j) for x1 sweeps, (k, i) for x2 and (j, i)
/// for x3.
pub(super) fn sweep_index(axis: Axis, a: usize, b: usize, s: usize) -> [usize; 3] {
    match axis {
        Axis::X1 => [a, b, s],
        Axis::X2 => [a, s, b],
        Axis::X3 => [s, a, b],
    }
}

/// The three face-difference divergence pieces of B at one cell, in grid
/// order `(db1, db2, db3)`.
pub(super) fn db_at(g: &Grid, k: usize, j: usize, i: usize) -> (Float, Float, Float) {
    (
        (g.b1i[[k, j, i + 1]] - g.b1i[[k, j, i]]) / g.dx1,
        (g.b2i[[k, j + 1, i]] - g.b2i[[k, j, i]]) / g.dx2,
        (g.b3i[[k + 1, j, i]] - g.b3i[[k, j, i]]) / g.dx3,
    )
}

/// Cyclic rotation of a grid-frame triple into the sweep frame.
pub(super) fn rot3(axis: Axis, t: (Float, Float, Float)) -> (Float, Float, Float) {
    match axis {
        Axis::X1 => t,
        Axis::X2 => (t.1, t.2, t.0),
        Axis::X3 => (t.2, t.0, t.1),
    }
}

impl Integrator {
    pub(super) fn predict(&mut self, g: &Grid, mode: &StepMode, axis: Axis) {
        let eos = mode.eos;
        let dt = g.dt;
        let hdt = 0.5 * dt;

        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);

        // transverse line ranges, sweep face range, spacing
        let (a_range, b_range, lo, hi, dx) = match axis {
            Axis::X1 => ((ks - 2, ke + 2), (js - 2, je + 2), is - 1, ie + 1, g.dx1),
            Axis::X2 => ((ks - 2, ke + 2), (is - 2, ie + 2), js - 1, je + 1, g.dx2),
            Axis::X3 => ((js - 2, je + 2), (is - 2, ie + 2), ks - 1, ke + 1, g.dx3),
        };
        let dtodx = dt / dx;
        let nsweep = match axis {
            Axis::X1 => g.u.dim().2,
            Axis::X2 => g.u.dim().1,
            Axis::X3 => g.u.dim().0,
        };

        let (ul_arr, ur_arr, f_arr) = match axis {
            Axis::X1 => (&mut self.ul_x1, &mut self.ur_x1, &mut self.f_x1),
            Axis::X2 => (&mut self.ul_x2, &mut self.ur_x2, &mut self.f_x2),
            Axis::X3 => (&mut self.ul_x3, &mut self.ur_x3, &mut self.f_x3),
        };

        for a in a_range.0..=a_range.1 {
            for b in b_range.0..=b_range.1 {
                // load the line into the rotated 1-D buffers
                for s in 0..nsweep {
                    let [k, j, i] = sweep_index(axis, a, b, s);
                    let u = &g.u[[k, j, i]];
                    self.u1d[s] = u.to_sweep(axis);
                    let (bxc, _, _) = u.b_sweep(axis);
                    self.bxc[s] = bxc;
                    self.bxi[s] = match axis {
                        Axis::X1 => g.b1i[[k, j, i]],
                        Axis::X2 => g.b2i[[k, j, i]],
                        Axis::X3 => g.b3i[[k, j, i]],
                    };
                    self.w1d[s] = cons1d_to_prim1d(&self.u1d[s], self.bxc[s], eos);
                }

                lr_states(
                    &self.w1d,
                    &self.bxc,
                    dt,
                    dtodx,
                    lo,
                    hi,
                    eos,
                    &mut self.wl,
                    &mut self.wr,
                );

                // MHD source terms from the transverse field divergence.
                // The limiter clamps each transverse slope to the sign of
                // the sweep-direction divergence; reproduce it exactly.
                if mode.mhd {
                    for s in lo..=hi + 1 {
                        for (side, c) in &[(0usize, s - 1), (1usize, s)] {
                            let [k, j, i] = sweep_index(axis, a, b, *c);
                            let (dbx, dby, dbz) = rot3(axis, db_at(g, k, j, i));

                            let (ly, lz) = if dbx >= 0. {
                                (
                                    dbx.min(-dby).max(0.),
                                    dbx.min(-dbz).max(0.),
                                )
                            } else {
                                (
                                    dbx.max(-dby).min(0.),
                                    dbx.max(-dbz).min(0.),
                                )
                            };

                            let q = &self.u1d[*c];
                            let src_by = q.my / q.d * ly;
                            let src_bz = q.mz / q.d * lz;
                            let w = if *side == 0 {
                                &mut self.wl[s]
                            } else {
                                &mut self.wr[s]
                            };
                            w.by += hdt * src_by;
                            w.bz += hdt * src_bz;
                        }
                    }
                }

                sources::predictor_sources(
                    g,
                    mode,
                    axis,
                    a,
                    b,
                    lo,
                    hi,
                    &self.w1d,
                    &mut self.wl,
                    &mut self.wr,
                );

                // first flux pass; the H-correction applies only to the
                // second pass, so etah is zero here
                for s in lo..=hi + 1 {
                    let [k, j, i] = sweep_index(axis, a, b, s);
                    let bx = self.bxi[s];
                    let ul = prim1d_to_cons1d(&self.wl[s], bx, eos);
                    let ur = prim1d_to_cons1d(&self.wr[s], bx, eos);
                    ul_arr[[k, j, i]] = ul;
                    ur_arr[[k, j, i]] = ur;
                    f_arr[[k, j, i]] =
                        get_fluxes(&ul, &ur, &self.wl[s], &self.wr[s], bx, 0., eos);
                }
            }
        }
    }
}
