//! This module handles a TOML settings file.

use crate::eos::EquationOfState;
use crate::grid::{BoxSize, GridSize};
use crate::Float;
use serde_derive::{Deserialize, Serialize};
use std::fs::File;
use std::io::prelude::*;
use toml;

error_chain! {
    foreign_links {
        TOMLError(toml::de::Error);
    }
}

/// Structure that holds settings, which are defined externally in a TOML
/// file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub simulation: SimulationSettings,
    pub physics: PhysicsSettings,
    pub problem: Problem,
    pub environment: EnvironmentSettings,
}

// scalar fields come first so the TOML serializer never emits a value
// after a sub-table
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationSettings {
    /// Courant number bounding the time step.
    pub cfl: Float,
    pub tlim: Float,
    pub max_steps: usize,
    /// Steps between output records; zero disables intermediate output.
    #[serde(default)]
    pub output_every: usize,
    pub seed: [u64; 2],
    pub grid_size: GridSize,
    pub box_size: BoxSize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhysicsSettings {
    pub mhd: bool,
    #[serde(default)]
    pub h_correction: bool,
    pub eos: EquationOfState,
}

/// Built-in initial conditions the driver can set up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Problem {
    /// Uniform state on a periodic box.
    Constant {
        d: Float,
        p: Float,
        v: [Float; 3],
        b: [Float; 3],
    },
    /// Grid-aligned sound wave of small amplitude on a uniform background.
    LinearWave {
        d0: Float,
        p0: Float,
        amplitude: Float,
    },
    /// Two uniform states separated at the x1 midplane, outflow in x1.
    /// State layout: (d, p, v1, v2, v3, b1, b2, b3).
    RiemannX1 {
        left: [Float; 8],
        right: [Float; 8],
    },
    /// Divergence-free random field from a vector potential on cell edges.
    RandomField {
        d0: Float,
        p0: Float,
        amplitude: Float,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentSettings {
    /// Prefix of every file the run writes.
    pub prefix: String,
    #[serde(default)]
    pub version: String,
}

/// Reads the content of a file `filename` into an string and return it.
fn read_from_file(filename: &str) -> Result<String> {
    let mut f = File::open(filename).chain_err(|| "Unable to open file.")?;
    let mut content = String::new();

    f.read_to_string(&mut content)
        .chain_err(|| "Unable to read file.")?;

    Ok(content)
}

/// Reads content of a file `param_file`, that should point to a valid TOML
/// file, and parses it. Then returns the deserialized data in form of a
/// Settings struct.
pub fn read_parameter_file(param_file: &str) -> Result<Settings> {
    // read .toml file into string
    let toml_string = read_from_file(param_file).chain_err(|| "Unable to read parameter file.")?;

    let mut settings: Settings =
        toml::from_str(&toml_string).chain_err(|| "Unable to parse parameter file.")?;

    settings.environment.version = "".to_string();

    check_settings(&settings)?;

    Ok(settings)
}

fn check_settings(s: &Settings) -> Result<()> {
    let bs = s.simulation.box_size;
    let gs = s.simulation.grid_size;

    if bs.x <= 0. || bs.y <= 0. || bs.z <= 0. {
        bail!("Box size is invalid. Must be bigger than 0: {:?}", bs)
    }
    if gs.x == 0 || gs.y == 0 || gs.z == 0 {
        bail!("Grid size is invalid. Every axis needs at least one cell.")
    }
    if s.simulation.cfl <= 0. || s.simulation.cfl > 1. {
        bail!(
            "Courant number must lie in (0, 1], got {}",
            s.simulation.cfl
        )
    }
    if s.simulation.tlim <= 0. {
        bail!("Time limit must be positive, got {}", s.simulation.tlim)
    }

    match s.physics.eos {
        EquationOfState::Adiabatic { gamma } if gamma <= 1. => {
            bail!("Adiabatic index must exceed 1, got {}", gamma)
        }
        EquationOfState::Isothermal { csound } if csound <= 0. => {
            bail!("Isothermal sound speed must be positive, got {}", csound)
        }
        _ => {}
    }

    Ok(())
}

impl Settings {
    pub fn set_version(&mut self, version: &str) {
        self.environment.version = version.to_string();
    }

    /// Writes the settings the run actually used next to its output.
    pub fn save_to_file(&self, filename: &str) -> Result<()> {
        let s = toml::to_string(self).chain_err(|| "Unable to serialize settings.")?;
        let mut f = File::create(filename).chain_err(|| "Unable to create settings file.")?;
        f.write_all(s.as_bytes())
            .chain_err(|| "Unable to write settings file.")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [simulation]
        grid_size = { x = 32, y = 32, z = 32 }
        box_size = { x = 1.0, y = 1.0, z = 1.0 }
        cfl = 0.8
        tlim = 0.2
        max_steps = 10000
        seed = [1, 2]

        [physics]
        eos = { adiabatic = { gamma = 1.6666666666666667 } }
        mhd = true

        [problem]
        kind = "constant"
        d = 1.0
        p = 0.6
        v = [0.0, 0.0, 0.0]
        b = [1.0, 0.0, 0.0]

        [environment]
        prefix = "test"
    "#;

    #[test]
    fn parses_sample_file() {
        let s: Settings = toml::from_str(SAMPLE).unwrap();
        assert_eq!(s.simulation.grid_size.x, 32);
        assert!(s.physics.mhd);
        assert!(!s.physics.h_correction);
        match s.problem {
            Problem::Constant { d, .. } => assert_eq!(d, 1.0),
            _ => panic!("wrong problem variant"),
        }
    }

    #[test]
    fn rejects_bad_courant_number() {
        let mut s: Settings = toml::from_str(SAMPLE).unwrap();
        s.simulation.cfl = 1.5;
        assert!(check_settings(&s).is_err());
    }
}
