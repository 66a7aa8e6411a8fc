//! Ghost-cell fills for a single block.
//!
//! The integrator itself never touches boundaries; a distributed caller
//! exchanges ghost layers between blocks before each step. These fills
//! cover the single-block case the driver and the end-to-end tests run:
//! periodic wrap-around and zero-gradient outflow, applied per axis in the
//! order x1, x2, x3 so edge and corner ghosts are completed transitively.

use crate::grid::Grid;
use crate::NGHOST;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    Periodic,
    Outflow,
}

/// Fills all ghost layers of the cell-centered state, the face fields and,
/// when present, the self-gravity potential.
pub fn set_boundaries(g: &mut Grid, bc: (BoundaryKind, BoundaryKind, BoundaryKind)) {
    let (nx1, nx2, nx3) = g.interior();
    let (n3, n2, n1) = g.u.dim();

    // x1
    for k in 0..n3 {
        for j in 0..n2 {
            for l in 0..NGHOST {
                let (dst_l, dst_r) = (g.is - 1 - l, g.ie + 1 + l);
                let (src_l, src_r) = match bc.0 {
                    BoundaryKind::Periodic => (dst_l + nx1, dst_r - nx1),
                    BoundaryKind::Outflow => (g.is, g.ie),
                };
                g.u[[k, j, dst_l]] = g.u[[k, j, src_l]];
                g.u[[k, j, dst_r]] = g.u[[k, j, src_r]];
                g.b1i[[k, j, dst_l]] = g.b1i[[k, j, src_l]];
                g.b1i[[k, j, dst_r]] = g.b1i[[k, j, src_r]];
                g.b2i[[k, j, dst_l]] = g.b2i[[k, j, src_l]];
                g.b2i[[k, j, dst_r]] = g.b2i[[k, j, src_r]];
                g.b3i[[k, j, dst_l]] = g.b3i[[k, j, src_l]];
                g.b3i[[k, j, dst_r]] = g.b3i[[k, j, src_r]];
                if let Some(sg) = &mut g.self_gravity {
                    sg.phi[[k, j, dst_l]] = sg.phi[[k, j, src_l]];
                    sg.phi[[k, j, dst_r]] = sg.phi[[k, j, src_r]];
                }
            }
        }
    }

    // x2
    for k in 0..n3 {
        for l in 0..NGHOST {
            let (dst_l, dst_r) = (g.js - 1 - l, g.je + 1 + l);
            let (src_l, src_r) = match bc.1 {
                BoundaryKind::Periodic => (dst_l + nx2, dst_r - nx2),
                BoundaryKind::Outflow => (g.js, g.je),
            };
            for i in 0..n1 {
                g.u[[k, dst_l, i]] = g.u[[k, src_l, i]];
                g.u[[k, dst_r, i]] = g.u[[k, src_r, i]];
                g.b1i[[k, dst_l, i]] = g.b1i[[k, src_l, i]];
                g.b1i[[k, dst_r, i]] = g.b1i[[k, src_r, i]];
                g.b2i[[k, dst_l, i]] = g.b2i[[k, src_l, i]];
                g.b2i[[k, dst_r, i]] = g.b2i[[k, src_r, i]];
                g.b3i[[k, dst_l, i]] = g.b3i[[k, src_l, i]];
                g.b3i[[k, dst_r, i]] = g.b3i[[k, src_r, i]];
                if let Some(sg) = &mut g.self_gravity {
                    sg.phi[[k, dst_l, i]] = sg.phi[[k, src_l, i]];
                    sg.phi[[k, dst_r, i]] = sg.phi[[k, src_r, i]];
                }
            }
        }
    }

    // x3
    for l in 0..NGHOST {
        let (dst_l, dst_r) = (g.ks - 1 - l, g.ke + 1 + l);
        let (src_l, src_r) = match bc.2 {
            BoundaryKind::Periodic => (dst_l + nx3, dst_r - nx3),
            BoundaryKind::Outflow => (g.ks, g.ke),
        };
        for j in 0..n2 {
            for i in 0..n1 {
                g.u[[dst_l, j, i]] = g.u[[src_l, j, i]];
                g.u[[dst_r, j, i]] = g.u[[src_r, j, i]];
                g.b1i[[dst_l, j, i]] = g.b1i[[src_l, j, i]];
                g.b1i[[dst_r, j, i]] = g.b1i[[src_r, j, i]];
                g.b2i[[dst_l, j, i]] = g.b2i[[src_l, j, i]];
                g.b2i[[dst_r, j, i]] = g.b2i[[src_r, j, i]];
                g.b3i[[dst_l, j, i]] = g.b3i[[src_l, j, i]];
                g.b3i[[dst_r, j, i]] = g.b3i[[src_r, j, i]];
                if let Some(sg) = &mut g.self_gravity {
                    sg.phi[[dst_l, j, i]] = sg.phi[[src_l, j, i]];
                    sg.phi[[dst_r, j, i]] = sg.phi[[src_r, j, i]];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{BoxSize, GridSize};

    #[test]
    fn periodic_wraps_cell_data() {
        let mut g = Grid::new(
            GridSize { x: 4, y: 4, z: 4 },
            BoxSize {
                x: 1.,
                y: 1.,
                z: 1.,
            },
        );
        for i in g.is..=g.ie {
            g.u[[g.ks, g.js, i]].d = i as f64;
        }
        set_boundaries(
            &mut g,
            (
                BoundaryKind::Periodic,
                BoundaryKind::Periodic,
                BoundaryKind::Periodic,
            ),
        );
        assert_eq!(g.u[[g.ks, g.js, g.is - 1]].d, g.ie as f64);
        assert_eq!(g.u[[g.ks, g.js, g.ie + 1]].d, g.is as f64);
    }

    #[test]
    fn outflow_copies_edge_layer() {
        let mut g = Grid::new(
            GridSize { x: 4, y: 4, z: 4 },
            BoxSize {
                x: 1.,
                y: 1.,
                z: 1.,
            },
        );
        g.u[[g.ks, g.js, g.is]].d = 7.;
        set_boundaries(
            &mut g,
            (
                BoundaryKind::Outflow,
                BoundaryKind::Outflow,
                BoundaryKind::Outflow,
            ),
        );
        for l in 1..=crate::NGHOST {
            assert_eq!(g.u[[g.ks, g.js, g.is - l]].d, 7.);
        }
    }
}
