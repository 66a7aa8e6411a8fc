//! Transverse-flux correction of the interface states.
//!
//! Each face state loses half a time step of the flux gradients in the two
//! directions transverse to its own sweep, with the momentum components
//! permuted between the rotated frames. Face field components are advanced
//! with corner-EMF averages, and the limited magnetic-divergence source
//! terms plus gravity and Coriolis corrections are added.

use super::predictor::{db_at, rot3};
use super::sources::{ext_pot, has_ext_pot};
use super::{Integrator, StepMode};
use crate::grid::Grid;
use crate::state::Axis;
use crate::{Float, NSCALARS};

/// Classic min-mod: the smaller-magnitude argument when signs agree, zero
/// otherwise.
pub(super) fn min_mod(x: Float, y: Float) -> Float {
    if x * y > 0. {
        if x.abs() <= y.abs() {
            x
        } else {
            y
        }
    } else {
        0.
    }
}

/// Sweep-frame increments of the limited magnetic-divergence source terms
/// for the face state adjacent to cell `(k, j, i)`:
/// `(d mx, d my, d mz, d by, d bz, d e)`.
fn mdb_src(
    g: &Grid,
    axis: Axis,
    k: usize,
    j: usize,
    i: usize,
    hdt: Float,
) -> (Float, Float, Float, Float, Float, Float) {
    let (dbx, dby, dbz) = rot3(axis, db_at(g, k, j, i));
    let u = &g.u[[k, j, i]];
    let q = u.to_sweep(axis);
    let (bxc, byc, bzc) = u.b_sweep(axis);
    let vy = q.my / q.d;
    let vz = q.mz / q.d;

    let mdbz = min_mod(-dbx, dbz);
    let mdby = min_mod(-dbx, dby);

    (
        hdt * bxc * dbx,
        hdt * byc * dbx,
        hdt * bzc * dbx,
        hdt * vy * (-mdbz),
        hdt * vz * (-mdby),
        hdt * (byc * vy * (-mdbz) + bzc * vz * (-mdby)),
    )
}

impl Integrator {
    pub(super) fn correct_x1_faces(&mut self, g: &Grid, mode: &StepMode) {
        let barotropic = mode.eos.is_barotropic();
        let dt = g.dt;
        let hdt = 0.5 * dt;
        let q2 = hdt / g.dx2;
        let q3 = hdt / g.dx3;
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);

        let f2 = &self.f_x2;
        let f3 = &self.f_x3;
        let emf1 = &self.emf1;

        for k in ks - 1..=ke + 1 {
            for j in js - 1..=je + 1 {
                for i in is - 1..=ie + 2 {
                    for side in 0..2 {
                        let c = if side == 0 { i - 1 } else { i };
                        let u = if side == 0 {
                            &mut self.ul_x1[[k, j, i]]
                        } else {
                            &mut self.ur_x1[[k, j, i]]
                        };

                        // x2-flux gradients; (x,y,z) here is (1,2,3), the
                        // fluxes carry (2,3,1)
                        let lo = &f2[[k, j, c]];
                        let hi = &f2[[k, j + 1, c]];
                        u.d -= q2 * (hi.d - lo.d);
                        u.mx -= q2 * (hi.mz - lo.mz);
                        u.my -= q2 * (hi.mx - lo.mx);
                        u.mz -= q2 * (hi.my - lo.my);
                        if !barotropic {
                            u.e -= q2 * (hi.e - lo.e);
                        }
                        for n in 0..NSCALARS {
                            u.s[n] -= q2 * (hi.s[n] - lo.s[n]);
                        }

                        // x3-flux gradients; the fluxes carry (3,1,2)
                        let lo = &f3[[k, j, c]];
                        let hi = &f3[[k + 1, j, c]];
                        u.d -= q3 * (hi.d - lo.d);
                        u.mx -= q3 * (hi.my - lo.my);
                        u.my -= q3 * (hi.mz - lo.mz);
                        u.mz -= q3 * (hi.mx - lo.mx);
                        if !barotropic {
                            u.e -= q3 * (hi.e - lo.e);
                        }
                        for n in 0..NSCALARS {
                            u.s[n] -= q3 * (hi.s[n] - lo.s[n]);
                        }

                        if mode.mhd {
                            // transverse derivatives of E1 advance the
                            // face components B2 (minus) and B3 (plus)
                            u.bz += q2
                                * 0.5
                                * ((emf1[[k, j + 1, c]] - emf1[[k, j, c]])
                                    + (emf1[[k + 1, j + 1, c]] - emf1[[k + 1, j, c]]));
                            u.by -= q3
                                * 0.5
                                * ((emf1[[k + 1, j, c]] - emf1[[k, j, c]])
                                    + (emf1[[k + 1, j + 1, c]] - emf1[[k, j + 1, c]]));

                            let (dmx, dmy, dmz, dby, dbz, de) =
                                mdb_src(g, Axis::X1, k, j, c, hdt);
                            u.mx += dmx;
                            u.my += dmy;
                            u.mz += dmz;
                            u.by += dby;
                            u.bz += dbz;
                            if !barotropic {
                                u.e += de;
                            }
                        }

                        if has_ext_pot(mode) {
                            let (x1, x2, x3) = g.cc_pos(c, j, k);
                            let phic = ext_pot(mode, x1, x2, x3);

                            let phir = ext_pot(mode, x1, x2 + 0.5 * g.dx2, x3);
                            let phil = ext_pot(mode, x1, x2 - 0.5 * g.dx2, x3);
                            u.my -= q2 * (phir - phil) * g.u[[k, j, c]].d;
                            if !barotropic {
                                u.e -= q2
                                    * (f2[[k, j, c]].d * (phic - phil)
                                        + f2[[k, j + 1, c]].d * (phir - phic));
                            }

                            let phir = ext_pot(mode, x1, x2, x3 + 0.5 * g.dx3);
                            let phil = ext_pot(mode, x1, x2, x3 - 0.5 * g.dx3);
                            u.mz -= q3 * (phir - phil) * g.u[[k, j, c]].d;
                            if !barotropic {
                                u.e -= q3
                                    * (f3[[k, j, c]].d * (phic - phil)
                                        + f3[[k + 1, j, c]].d * (phir - phic));
                            }
                        }

                        if mode.self_gravity.is_some() {
                            let phi = &g.self_gravity.as_ref().unwrap().phi;
                            let phic = phi[[k, j, c]];

                            let phir = 0.5 * (phic + phi[[k, j + 1, c]]);
                            let phil = 0.5 * (phi[[k, j - 1, c]] + phic);
                            u.my -= q2 * (phir - phil) * g.u[[k, j, c]].d;
                            if !barotropic {
                                u.e -= q2
                                    * (f2[[k, j, c]].d * (phic - phil)
                                        + f2[[k, j + 1, c]].d * (phir - phic));
                            }

                            let phir = 0.5 * (phic + phi[[k + 1, j, c]]);
                            let phil = 0.5 * (phi[[k - 1, j, c]] + phic);
                            u.mz -= q3 * (phir - phil) * g.u[[k, j, c]].d;
                            if !barotropic {
                                u.e -= q3
                                    * (f3[[k, j, c]].d * (phic - phil)
                                        + f3[[k + 1, j, c]].d * (phir - phic));
                            }
                        }

                        if let Some(sb) = &mode.shearing {
                            let cy = if sb.fargo { sb.qshear - 2.0 } else { -2.0 };
                            u.my += hdt * cy * sb.omega * g.u[[k, j, c]].m1;
                        }
                    }
                }
            }
        }
    }

    pub(super) fn correct_x2_faces(&mut self, g: &Grid, mode: &StepMode) {
        let barotropic = mode.eos.is_barotropic();
        let dt = g.dt;
        let hdt = 0.5 * dt;
        let q1 = hdt / g.dx1;
        let q3 = hdt / g.dx3;
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);

        let f1 = &self.f_x1;
        let f3 = &self.f_x3;
        let emf2 = &self.emf2;

        for k in ks - 1..=ke + 1 {
            for j in js - 1..=je + 2 {
                for i in is - 1..=ie + 1 {
                    for side in 0..2 {
                        let c = if side == 0 { j - 1 } else { j };
                        let u = if side == 0 {
                            &mut self.ul_x2[[k, j, i]]
                        } else {
                            &mut self.ur_x2[[k, j, i]]
                        };

                        // x3-flux gradients; (x,y,z) is (2,3,1), the
                        // fluxes carry (3,1,2)
                        let lo = &f3[[k, c, i]];
                        let hi = &f3[[k + 1, c, i]];
                        u.d -= q3 * (hi.d - lo.d);
                        u.mx -= q3 * (hi.mz - lo.mz);
                        u.my -= q3 * (hi.mx - lo.mx);
                        u.mz -= q3 * (hi.my - lo.my);
                        if !barotropic {
                            u.e -= q3 * (hi.e - lo.e);
                        }
                        for n in 0..NSCALARS {
                            u.s[n] -= q3 * (hi.s[n] - lo.s[n]);
                        }

                        // x1-flux gradients; the fluxes carry (1,2,3)
                        let lo = &f1[[k, c, i]];
                        let hi = &f1[[k, c, i + 1]];
                        u.d -= q1 * (hi.d - lo.d);
                        u.mx -= q1 * (hi.my - lo.my);
                        u.my -= q1 * (hi.mz - lo.mz);
                        u.mz -= q1 * (hi.mx - lo.mx);
                        if !barotropic {
                            u.e -= q1 * (hi.e - lo.e);
                        }
                        for n in 0..NSCALARS {
                            u.s[n] -= q1 * (hi.s[n] - lo.s[n]);
                        }

                        if mode.mhd {
                            // E2 derivatives advance B3 (minus, along x1)
                            // and B1 (plus, along x3)
                            u.by -= q1
                                * 0.5
                                * ((emf2[[k, c, i + 1]] - emf2[[k, c, i]])
                                    + (emf2[[k + 1, c, i + 1]] - emf2[[k + 1, c, i]]));
                            u.bz += q3
                                * 0.5
                                * ((emf2[[k + 1, c, i]] - emf2[[k, c, i]])
                                    + (emf2[[k + 1, c, i + 1]] - emf2[[k, c, i + 1]]));

                            let (dmx, dmy, dmz, dby, dbz, de) =
                                mdb_src(g, Axis::X2, k, c, i, hdt);
                            u.mx += dmx;
                            u.my += dmy;
                            u.mz += dmz;
                            u.by += dby;
                            u.bz += dbz;
                            if !barotropic {
                                u.e += de;
                            }
                        }

                        if has_ext_pot(mode) {
                            let (x1, x2, x3) = g.cc_pos(i, c, k);
                            let phic = ext_pot(mode, x1, x2, x3);

                            let phir = ext_pot(mode, x1, x2, x3 + 0.5 * g.dx3);
                            let phil = ext_pot(mode, x1, x2, x3 - 0.5 * g.dx3);
                            u.my -= q3 * (phir - phil) * g.u[[k, c, i]].d;
                            if !barotropic {
                                u.e -= q3
                                    * (f3[[k, c, i]].d * (phic - phil)
                                        + f3[[k + 1, c, i]].d * (phir - phic));
                            }

                            let phir = ext_pot(mode, x1 + 0.5 * g.dx1, x2, x3);
                            let phil = ext_pot(mode, x1 - 0.5 * g.dx1, x2, x3);
                            u.mz -= q1 * (phir - phil) * g.u[[k, c, i]].d;
                            if !barotropic {
                                u.e -= q1
                                    * (f1[[k, c, i]].d * (phic - phil)
                                        + f1[[k, c, i + 1]].d * (phir - phic));
                            }
                        }

                        if mode.self_gravity.is_some() {
                            let phi = &g.self_gravity.as_ref().unwrap().phi;
                            let phic = phi[[k, c, i]];

                            let phir = 0.5 * (phic + phi[[k + 1, c, i]]);
                            let phil = 0.5 * (phi[[k - 1, c, i]] + phic);
                            u.my -= q3 * (phir - phil) * g.u[[k, c, i]].d;
                            if !barotropic {
                                u.e -= q3
                                    * (f3[[k, c, i]].d * (phic - phil)
                                        + f3[[k + 1, c, i]].d * (phir - phic));
                            }

                            let phir = 0.5 * (phic + phi[[k, c, i + 1]]);
                            let phil = 0.5 * (phi[[k, c, i - 1]] + phic);
                            u.mz -= q1 * (phir - phil) * g.u[[k, c, i]].d;
                            if !barotropic {
                                u.e -= q1
                                    * (f1[[k, c, i]].d * (phic - phil)
                                        + f1[[k, c, i + 1]].d * (phir - phic));
                            }
                        }

                        if let Some(sb) = &mode.shearing {
                            u.mz += dt * sb.omega * g.u[[k, c, i]].m2;
                        }
                    }
                }
            }
        }
    }

    pub(super) fn correct_x3_faces(&mut self, g: &Grid, mode: &StepMode) {
        let barotropic = mode.eos.is_barotropic();
        let dt = g.dt;
        let hdt = 0.5 * dt;
        let q1 = hdt / g.dx1;
        let q2 = hdt / g.dx2;
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);

        let f1 = &self.f_x1;
        let f2 = &self.f_x2;
        let emf3 = &self.emf3;

        for k in ks - 1..=ke + 2 {
            for j in js - 1..=je + 1 {
                for i in is - 1..=ie + 1 {
                    for side in 0..2 {
                        let c = if side == 0 { k - 1 } else { k };
                        let u = if side == 0 {
                            &mut self.ul_x3[[k, j, i]]
                        } else {
                            &mut self.ur_x3[[k, j, i]]
                        };

                        // x1-flux gradients; (x,y,z) is (3,1,2), the
                        // fluxes carry (1,2,3)
                        let lo = &f1[[c, j, i]];
                        let hi = &f1[[c, j, i + 1]];
                        u.d -= q1 * (hi.d - lo.d);
                        u.mx -= q1 * (hi.mz - lo.mz);
                        u.my -= q1 * (hi.mx - lo.mx);
                        u.mz -= q1 * (hi.my - lo.my);
                        if !barotropic {
                            u.e -= q1 * (hi.e - lo.e);
                        }
                        for n in 0..NSCALARS {
                            u.s[n] -= q1 * (hi.s[n] - lo.s[n]);
                        }

                        // x2-flux gradients; the fluxes carry (2,3,1)
                        let lo = &f2[[c, j, i]];
                        let hi = &f2[[c, j + 1, i]];
                        u.d -= q2 * (hi.d - lo.d);
                        u.mx -= q2 * (hi.my - lo.my);
                        u.my -= q2 * (hi.mz - lo.mz);
                        u.mz -= q2 * (hi.mx - lo.mx);
                        if !barotropic {
                            u.e -= q2 * (hi.e - lo.e);
                        }
                        for n in 0..NSCALARS {
                            u.s[n] -= q2 * (hi.s[n] - lo.s[n]);
                        }

                        if mode.mhd {
                            // E3 derivatives advance B1 (minus, along x2)
                            // and B2 (plus, along x1)
                            u.by -= q2
                                * 0.5
                                * ((emf3[[c, j + 1, i]] - emf3[[c, j, i]])
                                    + (emf3[[c, j + 1, i + 1]] - emf3[[c, j, i + 1]]));
                            u.bz += q1
                                * 0.5
                                * ((emf3[[c, j, i + 1]] - emf3[[c, j, i]])
                                    + (emf3[[c, j + 1, i + 1]] - emf3[[c, j + 1, i]]));

                            let (dmx, dmy, dmz, dby, dbz, de) =
                                mdb_src(g, Axis::X3, c, j, i, hdt);
                            u.mx += dmx;
                            u.my += dmy;
                            u.mz += dmz;
                            u.by += dby;
                            u.bz += dbz;
                            if !barotropic {
                                u.e += de;
                            }
                        }

                        if has_ext_pot(mode) {
                            let (x1, x2, x3) = g.cc_pos(i, j, c);
                            let phic = ext_pot(mode, x1, x2, x3);

                            let phir = ext_pot(mode, x1 + 0.5 * g.dx1, x2, x3);
                            let phil = ext_pot(mode, x1 - 0.5 * g.dx1, x2, x3);
                            u.my -= q1 * (phir - phil) * g.u[[c, j, i]].d;
                            if !barotropic {
                                u.e -= q1
                                    * (f1[[c, j, i]].d * (phic - phil)
                                        + f1[[c, j, i + 1]].d * (phir - phic));
                            }

                            let phir = ext_pot(mode, x1, x2 + 0.5 * g.dx2, x3);
                            let phil = ext_pot(mode, x1, x2 - 0.5 * g.dx2, x3);
                            u.mz -= q2 * (phir - phil) * g.u[[c, j, i]].d;
                            if !barotropic {
                                u.e -= q2
                                    * (f2[[c, j, i]].d * (phic - phil)
                                        + f2[[c, j + 1, i]].d * (phir - phic));
                            }
                        }

                        if mode.self_gravity.is_some() {
                            let phi = &g.self_gravity.as_ref().unwrap().phi;
                            let phic = phi[[c, j, i]];

                            let phir = 0.5 * (phic + phi[[c, j, i + 1]]);
                            let phil = 0.5 * (phi[[c, j, i - 1]] + phic);
                            u.my -= q1 * (phir - phil) * g.u[[c, j, i]].d;
                            if !barotropic {
                                u.e -= q1
                                    * (f1[[c, j, i]].d * (phic - phil)
                                        + f1[[c, j, i + 1]].d * (phir - phic));
                            }

                            let phir = 0.5 * (phic + phi[[c, j + 1, i]]);
                            let phil = 0.5 * (phi[[c, j - 1, i]] + phic);
                            u.mz -= q2 * (phir - phil) * g.u[[c, j, i]].d;
                            if !barotropic {
                                u.e -= q2
                                    * (f2[[c, j, i]].d * (phic - phil)
                                        + f2[[c, j + 1, i]].d * (phir - phic));
                            }
                        }

                        if let Some(sb) = &mode.shearing {
                            let cy = if sb.fargo { sb.qshear - 2.0 } else { -2.0 };
                            u.my += dt * sb.omega * g.u[[c, j, i]].m2;
                            u.mz += hdt * cy * sb.omega * g.u[[c, j, i]].m1;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::min_mod;
    use quickcheck::quickcheck;

    #[test]
    fn min_mod_basic() {
        assert_eq!(min_mod(1.0, 2.0), 1.0);
        assert_eq!(min_mod(-2.0, -0.5), -0.5);
        assert_eq!(min_mod(1.0, -1.0), 0.0);
        assert_eq!(min_mod(0.0, 3.0), 0.0);
    }

    quickcheck! {
        fn min_mod_is_bounded(x: f64, y: f64) -> bool {
            let m = min_mod(x, y);
            m.abs() <= x.abs() && m.abs() <= y.abs()
        }

        fn min_mod_keeps_sign(x: f64, y: f64) -> bool {
            let m = min_mod(x, y);
            m == 0.0 || (m.signum() == x.signum() && m.signum() == y.signum())
        }
    }
}
