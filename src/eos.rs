//! Equation of state and characteristic wave speeds.

use crate::consts::TINY_NUMBER;
use crate::state::Cons1D;
use crate::Float;
use serde_derive::{Deserialize, Serialize};

/// Caloric equation of state. The isothermal branch doubles as the
/// barotropic mode of the integrator: no energy field is evolved and
/// cooling is meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub enum EquationOfState {
    Adiabatic { gamma: Float },
    Isothermal { csound: Float },
}

impl EquationOfState {
    pub fn is_barotropic(&self) -> bool {
        match self {
            EquationOfState::Adiabatic { .. } => false,
            EquationOfState::Isothermal { .. } => true,
        }
    }

    /// gamma - 1, the factor multiplying internal energy density.
    pub fn gamma_1(&self) -> Float {
        match self {
            EquationOfState::Adiabatic { gamma } => gamma - 1.0,
            EquationOfState::Isothermal { .. } => 0.0,
        }
    }
}

/// Fast magnetosonic speed of a rotated conserved state with normal field
/// `bx`. Reduces to the adiabatic (or isothermal) sound speed when the
/// field vanishes.
pub fn cfast(u: &Cons1D, bx: Float, eos: EquationOfState) -> Float {
    let di = 1.0 / u.d;

    // gamma*p (or its isothermal stand-in cs^2*d), floored against
    // round-off-negative pressures from deep rarefactions
    let gp = match eos {
        EquationOfState::Adiabatic { gamma } => {
            let ke = 0.5 * di * (u.mx * u.mx + u.my * u.my + u.mz * u.mz);
            let me = 0.5 * (bx * bx + u.by * u.by + u.bz * u.bz);
            (gamma * (gamma - 1.0) * (u.e - ke - me)).max(TINY_NUMBER)
        }
        EquationOfState::Isothermal { csound } => csound * csound * u.d,
    };

    let bsq = bx * bx + u.by * u.by + u.bz * u.bz;
    let qsq = (gp + bsq) * di;
    let tmp = qsq * qsq - 4.0 * gp * bx * bx * di * di;

    (0.5 * (qsq + tmp.max(0.0).sqrt())).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{prim1d_to_cons1d, Prim1D};
    use crate::test_helper::equal_floats;
    use crate::NSCALARS;

    fn uniform(d: Float, p: Float, eos: EquationOfState) -> Cons1D {
        let w = Prim1D {
            d,
            vx: 0.,
            vy: 0.,
            vz: 0.,
            p,
            by: 0.,
            bz: 0.,
            r: [0.; NSCALARS],
        };
        prim1d_to_cons1d(&w, 0., eos)
    }

    #[test]
    fn reduces_to_sound_speed_without_field() {
        let eos = EquationOfState::Adiabatic { gamma: 5. / 3. };
        let u = uniform(1.0, 0.6, eos);
        let cs = (5. / 3. * 0.6f64).sqrt();
        assert!(equal_floats(cfast(&u, 0., eos), cs));
    }

    #[test]
    fn isothermal_sound_speed() {
        let eos = EquationOfState::Isothermal { csound: 0.5 };
        let u = uniform(2.0, 0., eos);
        assert!(equal_floats(cfast(&u, 0., eos), 0.5));
    }

    #[test]
    fn parallel_field_gives_alfven_or_sound_maximum() {
        // with B = (bx,0,0) the fast speed is max(cs, va)
        let eos = EquationOfState::Adiabatic { gamma: 5. / 3. };
        let bx = 3.0;
        let mut u = uniform(1.0, 0.6, eos);
        u.e += 0.5 * bx * bx;
        let cs = (5. / 3. * 0.6f64).sqrt();
        let va = bx;
        assert!(equal_floats(cfast(&u, bx, eos), cs.max(va)));
    }
}
