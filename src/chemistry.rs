// chemistry.rs
// Acid/base constants and the closed-form relations the experiments build equations from

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::{KW, PH_SCALE};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AcidPreset {
    pub name: &'static str,
    pub formula: &'static str,
    pub ka: f64,
}

impl AcidPreset {
    pub fn pka(&self) -> f64 {
        pka(self.ka)
    }

    pub fn kb(&self) -> f64 {
        kb_from_ka(self.ka)
    }
}

pub static ACID_PRESETS: Lazy<HashMap<&'static str, AcidPreset>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for preset in [
        AcidPreset { name: "acetic", formula: "CH₃COOH", ka: 1.8e-5 },
        AcidPreset { name: "formic", formula: "HCOOH", ka: 1.8e-4 },
        AcidPreset { name: "hydrofluoric", formula: "HF", ka: 6.8e-4 },
        AcidPreset { name: "hypochlorous", formula: "HClO", ka: 3.0e-8 },
        AcidPreset { name: "benzoic", formula: "C₆H₅COOH", ka: 6.3e-5 },
        AcidPreset { name: "nitrous", formula: "HNO₂", ka: 4.5e-4 },
    ] {
        m.insert(preset.name, preset);
    }
    m
});

pub fn acid_preset(name: &str) -> Option<AcidPreset> {
    ACID_PRESETS.get(name).copied()
}

pub fn pka(ka: f64) -> f64 {
    -ka.log10()
}

pub fn kb_from_ka(ka: f64) -> f64 {
    KW / ka
}

/// pH (or pOH) of a given ion concentration.
pub fn ph_from_concentration(concentration: f64) -> f64 {
    -concentration.log10()
}

pub fn poh_to_ph(poh: f64) -> f64 {
    PH_SCALE - poh
}

/// Equilibrium ion concentration `x` of a weak acid (or base) with
/// initial concentration `c`, from `x² / (c - x) = k`.
pub fn weak_acid_ion_concentration(k: f64, c: f64) -> f64 {
    if c <= 0.0 {
        return 0.0;
    }
    (-k + (k * k + 4.0 * k * c).sqrt()) / 2.0
}

/// Henderson–Hasselbalch: `pH = pKa + log10([A⁻] / [HA])`.
/// Returns `pka` when either concentration is not positive.
pub fn henderson_hasselbalch(pka: f64, salt: f64, substance: f64) -> f64 {
    if salt <= 0.0 || substance <= 0.0 {
        return pka;
    }
    pka + (salt / substance).log10()
}

/// Maps molecule counts on the grid to molar concentrations.
///
/// A reference count of molecules represents a reference concentration,
/// so one molecule stands for `concentration / count` molar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoleculeScale {
    pub molarity_per_molecule: f64,
}

impl MoleculeScale {
    pub fn new(reference_count: usize, reference_concentration: f64) -> Self {
        assert!(reference_count > 0, "molecule scale needs a non-zero reference count");
        Self {
            molarity_per_molecule: reference_concentration / reference_count as f64,
        }
    }

    pub fn concentration(&self, count: f64) -> f64 {
        count * self.molarity_per_molecule
    }

    pub fn count(&self, concentration: f64) -> f64 {
        concentration / self.molarity_per_molecule
    }
}
