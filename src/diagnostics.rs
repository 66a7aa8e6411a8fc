//! Volume-integrated diagnostics over the interior block, used by the
//! driver's log output and by the conservation tests.

use crate::grid::Grid;
use crate::Float;
use serde_derive::{Deserialize, Serialize};

/// Interior sums of the conserved quantities, per unit cell volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub mass: Float,
    pub momentum: [Float; 3],
    pub energy: Float,
}

pub fn totals(g: &Grid) -> Totals {
    let mut t = Totals {
        mass: 0.,
        momentum: [0.; 3],
        energy: 0.,
    };
    for k in g.ks..=g.ke {
        for j in g.js..=g.je {
            for i in g.is..=g.ie {
                let u = &g.u[[k, j, i]];
                t.mass += u.d;
                t.momentum[0] += u.m1;
                t.momentum[1] += u.m2;
                t.momentum[2] += u.m3;
                t.energy += u.e;
            }
        }
    }
    t
}

/// Discrete divergence of the face field at one interior cell.
pub fn div_b(g: &Grid, i: usize, j: usize, k: usize) -> Float {
    (g.b1i[[k, j, i + 1]] - g.b1i[[k, j, i]]) / g.dx1
        + (g.b2i[[k, j + 1, i]] - g.b2i[[k, j, i]]) / g.dx2
        + (g.b3i[[k + 1, j, i]] - g.b3i[[k, j, i]]) / g.dx3
}

/// Maximum |div B| over the interior.
pub fn max_div_b(g: &Grid) -> Float {
    let mut m: Float = 0.;
    for k in g.ks..=g.ke {
        for j in g.js..=g.je {
            for i in g.is..=g.ie {
                m = m.max(div_b(g, i, j, k).abs());
            }
        }
    }
    m
}
