//! Cell states in the fixed grid frame and in the rotated 1-D sweep frame.
//!
//! A 1-D sweep along direction `d` relabels the axes cyclically, so that the
//! sweep axis is always "x" and the two transverse axes are "y" and "z":
//! d=1 maps to (1,2,3), d=2 to (2,3,1) and d=3 to (3,1,2). All interface
//! states and fluxes are stored in this rotated convention and only
//! permuted back when they touch the grid.

use crate::consts::TINY_NUMBER;
use crate::eos::EquationOfState;
use crate::{Float, NSCALARS};
use num_traits::Zero;
use serde_derive::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Sweep direction, naming the grid axis that plays the role of "x".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X1,
    X2,
    X3,
}

/// Cell-centered conserved state in the fixed grid frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cons {
    pub d: Float,
    pub m1: Float,
    pub m2: Float,
    pub m3: Float,
    /// Total energy density. Ignored for an isothermal equation of state.
    pub e: Float,
    pub b1c: Float,
    pub b2c: Float,
    pub b3c: Float,
    pub s: [Float; NSCALARS],
}

impl Cons {
    pub fn zero() -> Cons {
        Cons {
            d: 0.,
            m1: 0.,
            m2: 0.,
            m3: 0.,
            e: 0.,
            b1c: 0.,
            b2c: 0.,
            b3c: 0.,
            s: [0.; NSCALARS],
        }
    }

    /// Loads this cell into the rotated sweep frame of `axis`.
    pub fn to_sweep(&self, axis: Axis) -> Cons1D {
        let (mx, my, mz) = match axis {
            Axis::X1 => (self.m1, self.m2, self.m3),
            Axis::X2 => (self.m2, self.m3, self.m1),
            Axis::X3 => (self.m3, self.m1, self.m2),
        };
        let (by, bz) = match axis {
            Axis::X1 => (self.b2c, self.b3c),
            Axis::X2 => (self.b3c, self.b1c),
            Axis::X3 => (self.b1c, self.b2c),
        };
        Cons1D {
            d: self.d,
            mx,
            my,
            mz,
            e: self.e,
            by,
            bz,
            s: self.s,
        }
    }

    /// Cell-centered magnetic components in the sweep frame, normal first.
    pub fn b_sweep(&self, axis: Axis) -> (Float, Float, Float) {
        match axis {
            Axis::X1 => (self.b1c, self.b2c, self.b3c),
            Axis::X2 => (self.b2c, self.b3c, self.b1c),
            Axis::X3 => (self.b3c, self.b1c, self.b2c),
        }
    }
}

/// Conserved state (or flux) of a 1-D sweep in the rotated frame. `mx` is
/// the momentum normal to the face, `by`/`bz` the transverse field
/// components. The normal field is carried separately since it is
/// face-centered data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cons1D {
    pub d: Float,
    pub mx: Float,
    pub my: Float,
    pub mz: Float,
    pub e: Float,
    pub by: Float,
    pub bz: Float,
    pub s: [Float; NSCALARS],
}

impl Cons1D {
    /// Momentum components permuted back to the grid frame `(m1, m2, m3)`.
    pub fn m_grid(&self, axis: Axis) -> [Float; 3] {
        match axis {
            Axis::X1 => [self.mx, self.my, self.mz],
            Axis::X2 => [self.mz, self.mx, self.my],
            Axis::X3 => [self.my, self.mz, self.mx],
        }
    }
}

// componentwise arithmetic, mostly for assembling HLL-type flux
// combinations of states and fluxes

impl Add for Cons1D {
    type Output = Cons1D;

    fn add(self, o: Cons1D) -> Cons1D {
        let mut s = [0.; NSCALARS];
        for (sn, (a, b)) in s.iter_mut().zip(self.s.iter().zip(o.s.iter())) {
            *sn = a + b;
        }
        Cons1D {
            d: self.d + o.d,
            mx: self.mx + o.mx,
            my: self.my + o.my,
            mz: self.mz + o.mz,
            e: self.e + o.e,
            by: self.by + o.by,
            bz: self.bz + o.bz,
            s,
        }
    }
}

impl Sub for Cons1D {
    type Output = Cons1D;

    fn sub(self, o: Cons1D) -> Cons1D {
        let mut s = [0.; NSCALARS];
        for (sn, (a, b)) in s.iter_mut().zip(self.s.iter().zip(o.s.iter())) {
            *sn = a - b;
        }
        Cons1D {
            d: self.d - o.d,
            mx: self.mx - o.mx,
            my: self.my - o.my,
            mz: self.mz - o.mz,
            e: self.e - o.e,
            by: self.by - o.by,
            bz: self.bz - o.bz,
            s,
        }
    }
}

impl Mul<Float> for Cons1D {
    type Output = Cons1D;

    fn mul(self, f: Float) -> Cons1D {
        let mut s = [0.; NSCALARS];
        for (sn, a) in s.iter_mut().zip(self.s.iter()) {
            *sn = a * f;
        }
        Cons1D {
            d: self.d * f,
            mx: self.mx * f,
            my: self.my * f,
            mz: self.mz * f,
            e: self.e * f,
            by: self.by * f,
            bz: self.bz * f,
            s,
        }
    }
}

impl Zero for Cons1D {
    fn zero() -> Cons1D {
        Cons1D {
            d: 0.,
            mx: 0.,
            my: 0.,
            mz: 0.,
            e: 0.,
            by: 0.,
            bz: 0.,
            s: [0.; NSCALARS],
        }
    }

    fn is_zero(&self) -> bool {
        *self == Cons1D::zero()
    }
}

/// Primitive state of a 1-D sweep in the rotated frame. `r` holds the
/// mass-weighted scalar concentrations s/d.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prim1D {
    pub d: Float,
    pub vx: Float,
    pub vy: Float,
    pub vz: Float,
    pub p: Float,
    pub by: Float,
    pub bz: Float,
    pub r: [Float; NSCALARS],
}

impl Prim1D {
    pub fn zero() -> Prim1D {
        Prim1D {
            d: 0.,
            vx: 0.,
            vy: 0.,
            vz: 0.,
            p: 0.,
            by: 0.,
            bz: 0.,
            r: [0.; NSCALARS],
        }
    }
}

/// Converts a rotated conserved state to primitives. `bx` is the normal
/// field on the face (zero in pure hydrodynamics). The pressure is floored
/// at a tiny positive value; genuinely unphysical states are the caller's
/// problem to detect.
pub fn cons1d_to_prim1d(u: &Cons1D, bx: Float, eos: EquationOfState) -> Prim1D {
    let di = 1.0 / u.d;
    let vx = u.mx * di;
    let vy = u.my * di;
    let vz = u.mz * di;

    let p = match eos {
        EquationOfState::Adiabatic { gamma } => {
            let ke = 0.5 * di * (u.mx * u.mx + u.my * u.my + u.mz * u.mz);
            let me = 0.5 * (bx * bx + u.by * u.by + u.bz * u.bz);
            ((gamma - 1.0) * (u.e - ke - me)).max(TINY_NUMBER)
        }
        EquationOfState::Isothermal { csound } => csound * csound * u.d,
    };

    let mut r = [0.; NSCALARS];
    for (rn, sn) in r.iter_mut().zip(u.s.iter()) {
        *rn = sn * di;
    }

    Prim1D {
        d: u.d,
        vx,
        vy,
        vz,
        p,
        by: u.by,
        bz: u.bz,
        r,
    }
}

/// Inverse of [`cons1d_to_prim1d`].
pub fn prim1d_to_cons1d(w: &Prim1D, bx: Float, eos: EquationOfState) -> Cons1D {
    let e = match eos {
        EquationOfState::Adiabatic { gamma } => {
            w.p / (gamma - 1.0)
                + 0.5 * w.d * (w.vx * w.vx + w.vy * w.vy + w.vz * w.vz)
                + 0.5 * (bx * bx + w.by * w.by + w.bz * w.bz)
        }
        // unused; kept so the round trip is total
        EquationOfState::Isothermal { .. } => 0.,
    };

    let mut s = [0.; NSCALARS];
    for (sn, rn) in s.iter_mut().zip(w.r.iter()) {
        *sn = rn * w.d;
    }

    Cons1D {
        d: w.d,
        mx: w.d * w.vx,
        my: w.d * w.vy,
        mz: w.d * w.vz,
        e,
        by: w.by,
        bz: w.bz,
        s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helper::equal_floats;

    fn sample_cell() -> Cons {
        Cons {
            d: 1.3,
            m1: 0.4,
            m2: -0.7,
            m3: 0.1,
            e: 2.9,
            b1c: 0.5,
            b2c: -0.2,
            b3c: 0.8,
            s: [0.3, 0.9],
        }
    }

    #[test]
    fn sweep_rotation_is_cyclic() {
        let u = sample_cell();

        let q2 = u.to_sweep(Axis::X2);
        assert_eq!(q2.mx, u.m2);
        assert_eq!(q2.my, u.m3);
        assert_eq!(q2.mz, u.m1);
        assert_eq!(q2.by, u.b3c);
        assert_eq!(q2.bz, u.b1c);

        let q3 = u.to_sweep(Axis::X3);
        assert_eq!(q3.mx, u.m3);
        assert_eq!(q3.by, u.b1c);
        assert_eq!(q3.bz, u.b2c);
    }

    #[test]
    fn m_grid_inverts_to_sweep() {
        let u = sample_cell();
        for &axis in &[Axis::X1, Axis::X2, Axis::X3] {
            let m = u.to_sweep(axis).m_grid(axis);
            assert_eq!(m, [u.m1, u.m2, u.m3]);
        }
    }

    #[test]
    fn prim_cons_round_trip_adiabatic() {
        let eos = EquationOfState::Adiabatic { gamma: 5. / 3. };
        let bx = 0.5;
        let u = sample_cell().to_sweep(Axis::X1);

        let w = cons1d_to_prim1d(&u, bx, eos);
        let u2 = prim1d_to_cons1d(&w, bx, eos);

        assert!(equal_floats(u.d, u2.d));
        assert!(equal_floats(u.mx, u2.mx));
        assert!(equal_floats(u.my, u2.my));
        assert!(equal_floats(u.mz, u2.mz));
        assert!(equal_floats(u.e, u2.e));
        assert!(equal_floats(u.by, u2.by));
        assert!(equal_floats(u.bz, u2.bz));
        for n in 0..crate::NSCALARS {
            assert!(equal_floats(u.s[n], u2.s[n]));
        }
    }

    #[test]
    fn isothermal_pressure_tracks_density() {
        let eos = EquationOfState::Isothermal { csound: 2.0 };
        let u = sample_cell().to_sweep(Axis::X1);
        let w = cons1d_to_prim1d(&u, 0.5, eos);
        assert!(equal_floats(w.p, 4.0 * u.d));
    }
}
