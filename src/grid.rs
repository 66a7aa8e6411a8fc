//! The uniform Cartesian block the integrator advances.
//!
//! Arrays are indexed `[[k, j, i]]` (x3 slowest, x1 fastest) and are padded
//! by [`NGHOST`](crate::NGHOST) layers on every face. The interior occupies
//! `[is..=ie] x [js..=je] x [ks..=ke]`. Face-centered fields live on the
//! lower face of their cell: `b1i[[k,j,i]]` sits on the x1-face between
//! cells `i-1` and `i`.

use crate::eos::{cfast, EquationOfState};
use crate::state::{Axis, Cons};
use crate::{Float, NGHOST};
use ndarray::Array3;
use serde_derive::{Deserialize, Serialize};

/// Interior cell count per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridSize {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

/// Physical extent of the block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoxSize {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

/// Self-gravity work arrays owned by the grid: the potential produced by
/// the caller's Poisson solve before each step, and the mass fluxes the
/// integrator writes back so the caller can flux-correct the next solve.
#[derive(Debug, Clone)]
pub struct SelfGravityArrays {
    pub phi: Array3<Float>,
    pub x1_mass_flux: Array3<Float>,
    pub x2_mass_flux: Array3<Float>,
    pub x3_mass_flux: Array3<Float>,
}

#[derive(Debug, Clone)]
pub struct Grid {
    /// Cell-centered conserved states, mutated by the full-step cell update.
    pub u: Array3<Cons>,
    /// Face-centered magnetic field components, mutated by the CT updates.
    pub b1i: Array3<Float>,
    pub b2i: Array3<Float>,
    pub b3i: Array3<Float>,
    /// Present iff the caller runs a Poisson solve between steps.
    pub self_gravity: Option<SelfGravityArrays>,

    pub is: usize,
    pub ie: usize,
    pub js: usize,
    pub je: usize,
    pub ks: usize,
    pub ke: usize,

    pub dx1: Float,
    pub dx2: Float,
    pub dx3: Float,
    /// Time step the next call to the integrator will take.
    pub dt: Float,
    pub time: Float,

    x1min: Float,
    x2min: Float,
    x3min: Float,
}

impl Grid {
    /// Allocates a zeroed block of `size` interior cells spanning `boxsize`
    /// with the lower corner at the origin.
    pub fn new(size: GridSize, boxsize: BoxSize) -> Grid {
        let n1 = size.x + 2 * NGHOST;
        let n2 = size.y + 2 * NGHOST;
        let n3 = size.z + 2 * NGHOST;
        let sh = (n3, n2, n1);

        Grid {
            u: Array3::from_elem(sh, Cons::zero()),
            b1i: Array3::zeros(sh),
            b2i: Array3::zeros(sh),
            b3i: Array3::zeros(sh),
            self_gravity: None,
            is: NGHOST,
            ie: NGHOST + size.x - 1,
            js: NGHOST,
            je: NGHOST + size.y - 1,
            ks: NGHOST,
            ke: NGHOST + size.z - 1,
            dx1: boxsize.x / size.x as Float,
            dx2: boxsize.y / size.y as Float,
            dx3: boxsize.z / size.z as Float,
            dt: 0.,
            time: 0.,
            x1min: 0.,
            x2min: 0.,
            x3min: 0.,
        }
    }

    /// Allocates the self-gravity potential and mass-flux arrays.
    pub fn enable_self_gravity(&mut self) {
        let sh = self.u.dim();
        self.self_gravity = Some(SelfGravityArrays {
            phi: Array3::zeros(sh),
            x1_mass_flux: Array3::zeros(sh),
            x2_mass_flux: Array3::zeros(sh),
            x3_mass_flux: Array3::zeros(sh),
        });
    }

    /// Interior cell counts `(nx1, nx2, nx3)`.
    pub fn interior(&self) -> (usize, usize, usize) {
        (
            self.ie - self.is + 1,
            self.je - self.js + 1,
            self.ke - self.ks + 1,
        )
    }

    /// Cell-center coordinates of cell `(i, j, k)`.
    pub fn cc_pos(&self, i: usize, j: usize, k: usize) -> (Float, Float, Float) {
        (
            self.x1min + (i as Float - self.is as Float + 0.5) * self.dx1,
            self.x2min + (j as Float - self.js as Float + 0.5) * self.dx2,
            self.x3min + (k as Float - self.ks as Float + 0.5) * self.dx3,
        )
    }

    /// Lower corner of the interior box.
    pub fn origin(&self) -> (Float, Float, Float) {
        (self.x1min, self.x2min, self.x3min)
    }

    /// Moves the coordinate origin, e.g. to center a box on zero.
    pub fn set_origin(&mut self, x1min: Float, x2min: Float, x3min: Float) {
        self.x1min = x1min;
        self.x2min = x2min;
        self.x3min = x3min;
    }

    /// CFL-limited time step from the per-cell maximum signal speed
    /// `max_d(|v_d| + cfast_d)`, taken over the interior.
    pub fn new_dt(&self, eos: EquationOfState, cfl: Float) -> Float {
        let mut max_dti: Float = 0.;

        for k in self.ks..=self.ke {
            for j in self.js..=self.je {
                for i in self.is..=self.ie {
                    let u = &self.u[[k, j, i]];
                    let di = 1.0 / u.d;

                    for &(axis, dx, m, bi) in &[
                        (Axis::X1, self.dx1, u.m1, self.b1i[[k, j, i]]),
                        (Axis::X2, self.dx2, u.m2, self.b2i[[k, j, i]]),
                        (Axis::X3, self.dx3, u.m3, self.b3i[[k, j, i]]),
                    ] {
                        let q = u.to_sweep(axis);
                        let cf = cfast(&q, bi, eos);
                        max_dti = max_dti.max(((m * di).abs() + cf) / dx);
                    }
                }
            }
        }

        cfl / max_dti
    }

    /// Averages the face-centered field to the cell centers over the given
    /// inclusive index box. Used at setup and by the final phase of a step.
    pub fn cell_center_b(
        &mut self,
        (ks, ke): (usize, usize),
        (js, je): (usize, usize),
        (is, ie): (usize, usize),
    ) {
        for k in ks..=ke {
            for j in js..=je {
                for i in is..=ie {
                    let u = &mut self.u[[k, j, i]];
                    u.b1c = 0.5 * (self.b1i[[k, j, i]] + self.b1i[[k, j, i + 1]]);
                    u.b2c = 0.5 * (self.b2i[[k, j, i]] + self.b2i[[k, j + 1, i]]);
                    u.b3c = 0.5 * (self.b3i[[k, j, i]] + self.b3i[[k + 1, j, i]]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helper::equal_floats;

    #[test]
    fn padding_and_interior_ranges() {
        let g = Grid::new(
            GridSize { x: 8, y: 6, z: 4 },
            BoxSize {
                x: 1.,
                y: 1.,
                z: 1.,
            },
        );
        assert_eq!(g.u.dim(), (4 + 2 * NGHOST, 6 + 2 * NGHOST, 8 + 2 * NGHOST));
        assert_eq!(g.interior(), (8, 6, 4));
        assert_eq!(g.is, NGHOST);
        assert_eq!(g.ie, NGHOST + 7);
    }

    #[test]
    fn cell_centers_are_half_spacings() {
        let mut g = Grid::new(
            GridSize { x: 4, y: 4, z: 4 },
            BoxSize {
                x: 1.,
                y: 2.,
                z: 4.,
            },
        );
        g.set_origin(-0.5, 0., 0.);
        let (x1, x2, x3) = g.cc_pos(g.is, g.js, g.ks);
        assert!(equal_floats(x1, -0.5 + 0.125));
        assert!(equal_floats(x2, 0.25));
        assert!(equal_floats(x3, 0.5));
    }
}
