//! Corner EMF construction and the constrained-transport face updates.
//!
//! Edge values are assembled from the four adjacent face EMFs (carried by
//! the fluxes of B) plus four upwind-selected differences between face and
//! cell-centered EMFs, the Gardiner-Stone average. Face EMF sign
//! convention in the rotated flux structs: the By-flux of a sweep is minus
//! the edge EMF parallel to its second transverse axis, the Bz-flux is
//! plus the EMF parallel to its first transverse axis.

use super::Integrator;
use crate::grid::Grid;

impl Integrator {
    /// Cell-centered EMFs E = -v x B at t^n.
    pub(super) fn cell_centered_emfs(&mut self, g: &Grid) {
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);

        for k in ks - 2..=ke + 2 {
            for j in js - 2..=je + 2 {
                for i in is - 2..=ie + 2 {
                    let u = &g.u[[k, j, i]];
                    let di = 1.0 / u.d;
                    self.emf1_cc[[k, j, i]] = (u.b2c * u.m3 - u.b3c * u.m2) * di;
                    self.emf2_cc[[k, j, i]] = (u.b3c * u.m1 - u.b1c * u.m3) * di;
                    self.emf3_cc[[k, j, i]] = (u.b1c * u.m2 - u.b2c * u.m1) * di;
                }
            }
        }
    }

    /// Integrates the face EMFs to cell edges. Used twice per step: with
    /// the first-pass fluxes and t^n cell EMFs, then with the second-pass
    /// fluxes and the half-step cell EMFs.
    pub(super) fn integrate_emf_corners(&mut self, g: &Grid) {
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);
        let f1 = &self.f_x1;
        let f2 = &self.f_x2;
        let f3 = &self.f_x3;
        let cc1 = &self.emf1_cc;
        let cc2 = &self.emf2_cc;
        let cc3 = &self.emf3_cc;

        // E1 on x1-edges: plane (x2, x3), assembled from x2Flux.By (= -E1)
        // and x3Flux.Bz (= +E1)
        for k in ks - 1..=ke + 2 {
            for j in js - 1..=je + 2 {
                for i in is - 2..=ie + 2 {
                    let dbl = f3[[k, j - 1, i]].d;
                    let de_l1 = if dbl > 0. {
                        -f2[[k - 1, j, i]].by - cc1[[k - 1, j - 1, i]]
                    } else if dbl < 0. {
                        -f2[[k, j, i]].by - cc1[[k, j - 1, i]]
                    } else {
                        0.5 * (-f2[[k - 1, j, i]].by - cc1[[k - 1, j - 1, i]]
                            - f2[[k, j, i]].by
                            - cc1[[k, j - 1, i]])
                    };

                    let dbr = f3[[k, j, i]].d;
                    let de_r1 = if dbr > 0. {
                        -f2[[k - 1, j, i]].by - cc1[[k - 1, j, i]]
                    } else if dbr < 0. {
                        -f2[[k, j, i]].by - cc1[[k, j, i]]
                    } else {
                        0.5 * (-f2[[k - 1, j, i]].by - cc1[[k - 1, j, i]]
                            - f2[[k, j, i]].by
                            - cc1[[k, j, i]])
                    };

                    let dal = f2[[k - 1, j, i]].d;
                    let de_l2 = if dal > 0. {
                        f3[[k, j - 1, i]].bz - cc1[[k - 1, j - 1, i]]
                    } else if dal < 0. {
                        f3[[k, j, i]].bz - cc1[[k - 1, j, i]]
                    } else {
                        0.5 * (f3[[k, j - 1, i]].bz - cc1[[k - 1, j - 1, i]]
                            + f3[[k, j, i]].bz
                            - cc1[[k - 1, j, i]])
                    };

                    let dar = f2[[k, j, i]].d;
                    let de_r2 = if dar > 0. {
                        f3[[k, j - 1, i]].bz - cc1[[k, j - 1, i]]
                    } else if dar < 0. {
                        f3[[k, j, i]].bz - cc1[[k, j, i]]
                    } else {
                        0.5 * (f3[[k, j - 1, i]].bz - cc1[[k, j - 1, i]] + f3[[k, j, i]].bz
                            - cc1[[k, j, i]])
                    };

                    self.emf1[[k, j, i]] = 0.25
                        * (f3[[k, j, i]].bz + f3[[k, j - 1, i]].bz
                            - f2[[k, j, i]].by
                            - f2[[k - 1, j, i]].by
                            + de_l1
                            + de_r1
                            + de_l2
                            + de_r2);
                }
            }
        }

        // E2 on x2-edges: plane (x3, x1), from x3Flux.By (= -E2) and
        // x1Flux.Bz (= +E2)
        for k in ks - 1..=ke + 2 {
            for j in js - 2..=je + 2 {
                for i in is - 1..=ie + 2 {
                    let dbl = f1[[k - 1, j, i]].d;
                    let de_l1 = if dbl > 0. {
                        -f3[[k, j, i - 1]].by - cc2[[k - 1, j, i - 1]]
                    } else if dbl < 0. {
                        -f3[[k, j, i]].by - cc2[[k - 1, j, i]]
                    } else {
                        0.5 * (-f3[[k, j, i - 1]].by - cc2[[k - 1, j, i - 1]]
                            - f3[[k, j, i]].by
                            - cc2[[k - 1, j, i]])
                    };

                    let dbr = f1[[k, j, i]].d;
                    let de_r1 = if dbr > 0. {
                        -f3[[k, j, i - 1]].by - cc2[[k, j, i - 1]]
                    } else if dbr < 0. {
                        -f3[[k, j, i]].by - cc2[[k, j, i]]
                    } else {
                        0.5 * (-f3[[k, j, i - 1]].by - cc2[[k, j, i - 1]]
                            - f3[[k, j, i]].by
                            - cc2[[k, j, i]])
                    };

                    let dal = f3[[k, j, i - 1]].d;
                    let de_l2 = if dal > 0. {
                        f1[[k - 1, j, i]].bz - cc2[[k - 1, j, i - 1]]
                    } else if dal < 0. {
                        f1[[k, j, i]].bz - cc2[[k, j, i - 1]]
                    } else {
                        0.5 * (f1[[k - 1, j, i]].bz - cc2[[k - 1, j, i - 1]]
                            + f1[[k, j, i]].bz
                            - cc2[[k, j, i - 1]])
                    };

                    let dar = f3[[k, j, i]].d;
                    let de_r2 = if dar > 0. {
                        f1[[k - 1, j, i]].bz - cc2[[k - 1, j, i]]
                    } else if dar < 0. {
                        f1[[k, j, i]].bz - cc2[[k, j, i]]
                    } else {
                        0.5 * (f1[[k - 1, j, i]].bz - cc2[[k - 1, j, i]] + f1[[k, j, i]].bz
                            - cc2[[k, j, i]])
                    };

                    self.emf2[[k, j, i]] = 0.25
                        * (f1[[k, j, i]].bz + f1[[k - 1, j, i]].bz
                            - f3[[k, j, i]].by
                            - f3[[k, j, i - 1]].by
                            + de_l1
                            + de_r1
                            + de_l2
                            + de_r2);
                }
            }
        }

        // E3 on x3-edges: plane (x1, x2), from x1Flux.By (= -E3) and
        // x2Flux.Bz (= +E3)
        for k in ks - 2..=ke + 2 {
            for j in js - 1..=je + 2 {
                for i in is - 1..=ie + 2 {
                    let dbl = f2[[k, j, i - 1]].d;
                    let de_l1 = if dbl > 0. {
                        -f1[[k, j - 1, i]].by - cc3[[k, j - 1, i - 1]]
                    } else if dbl < 0. {
                        -f1[[k, j, i]].by - cc3[[k, j, i - 1]]
                    } else {
                        0.5 * (-f1[[k, j - 1, i]].by - cc3[[k, j - 1, i - 1]]
                            - f1[[k, j, i]].by
                            - cc3[[k, j, i - 1]])
                    };

                    let dbr = f2[[k, j, i]].d;
                    let de_r1 = if dbr > 0. {
                        -f1[[k, j - 1, i]].by - cc3[[k, j - 1, i]]
                    } else if dbr < 0. {
                        -f1[[k, j, i]].by - cc3[[k, j, i]]
                    } else {
                        0.5 * (-f1[[k, j - 1, i]].by - cc3[[k, j - 1, i]]
                            - f1[[k, j, i]].by
                            - cc3[[k, j, i]])
                    };

                    let dal = f1[[k, j - 1, i]].d;
                    let de_l2 = if dal > 0. {
                        f2[[k, j, i - 1]].bz - cc3[[k, j - 1, i - 1]]
                    } else if dal < 0. {
                        f2[[k, j, i]].bz - cc3[[k, j - 1, i]]
                    } else {
                        0.5 * (f2[[k, j, i - 1]].bz - cc3[[k, j - 1, i - 1]]
                            + f2[[k, j, i]].bz
                            - cc3[[k, j - 1, i]])
                    };

                    let dar = f1[[k, j, i]].d;
                    let de_r2 = if dar > 0. {
                        f2[[k, j, i - 1]].bz - cc3[[k, j, i - 1]]
                    } else if dar < 0. {
                        f2[[k, j, i]].bz - cc3[[k, j, i]]
                    } else {
                        0.5 * (f2[[k, j, i - 1]].bz - cc3[[k, j, i - 1]] + f2[[k, j, i]].bz
                            - cc3[[k, j, i]])
                    };

                    self.emf3[[k, j, i]] = 0.25
                        * (f2[[k, j, i]].bz + f2[[k, j, i - 1]].bz
                            - f1[[k, j, i]].by
                            - f1[[k, j - 1, i]].by
                            + de_l1
                            + de_r1
                            + de_l2
                            + de_r2);
                }
            }
        }
    }

    /// Half-step CT update of the scratch face fields by Stokes' theorem.
    pub(super) fn ct_update_half(&mut self, g: &Grid) {
        let hdt = 0.5 * g.dt;
        let q1 = hdt / g.dx1;
        let q2 = hdt / g.dx2;
        let q3 = hdt / g.dx3;
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);

        for k in ks - 1..=ke + 1 {
            for j in js - 1..=je + 1 {
                for i in is - 1..=ie + 2 {
                    self.b1_x1face[[k, j, i]] += q3
                        * (self.emf2[[k + 1, j, i]] - self.emf2[[k, j, i]])
                        - q2 * (self.emf3[[k, j + 1, i]] - self.emf3[[k, j, i]]);
                }
            }
        }
        for k in ks - 1..=ke + 1 {
            for j in js - 1..=je + 2 {
                for i in is - 1..=ie + 1 {
                    self.b2_x2face[[k, j, i]] += q1
                        * (self.emf3[[k, j, i + 1]] - self.emf3[[k, j, i]])
                        - q3 * (self.emf1[[k + 1, j, i]] - self.emf1[[k, j, i]]);
                }
            }
        }
        for k in ks - 1..=ke + 2 {
            for j in js - 1..=je + 1 {
                for i in is - 1..=ie + 1 {
                    self.b3_x3face[[k, j, i]] += q2
                        * (self.emf1[[k, j + 1, i]] - self.emf1[[k, j, i]])
                        - q1 * (self.emf2[[k, j, i + 1]] - self.emf2[[k, j, i]]);
                }
            }
        }
    }

    /// Full-step CT update written into the grid face fields, including
    /// the closing faces one past the interior so the discrete divergence
    /// stays defined for every interior cell.
    pub(super) fn ct_update_full(&mut self, g: &mut Grid) {
        let q1 = g.dt / g.dx1;
        let q2 = g.dt / g.dx2;
        let q3 = g.dt / g.dx3;
        let (is, ie, js, je, ks, ke) = (g.is, g.ie, g.js, g.je, g.ks, g.ke);

        for k in ks..=ke {
            for j in js..=je {
                for i in is..=ie + 1 {
                    g.b1i[[k, j, i]] += q3 * (self.emf2[[k + 1, j, i]] - self.emf2[[k, j, i]])
                        - q2 * (self.emf3[[k, j + 1, i]] - self.emf3[[k, j, i]]);
                }
            }
        }
        for k in ks..=ke {
            for j in js..=je + 1 {
                for i in is..=ie {
                    g.b2i[[k, j, i]] += q1 * (self.emf3[[k, j, i + 1]] - self.emf3[[k, j, i]])
                        - q3 * (self.emf1[[k + 1, j, i]] - self.emf1[[k, j, i]]);
                }
            }
        }
        for k in ks..=ke + 1 {
            for j in js..=je {
                for i in is..=ie {
                    g.b3i[[k, j, i]] += q2 * (self.emf1[[k, j + 1, i]] - self.emf1[[k, j, i]])
                        - q1 * (self.emf2[[k, j, i + 1]] - self.emf2[[k, j, i]]);
                }
            }
        }
    }
}
