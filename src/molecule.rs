// molecule.rs
// Molecule kinds: the closed set of particle categories each experiment uses

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// A closed set of particle categories belonging to one experiment.
pub trait MoleculeKind: Copy + Eq + Ord + Hash + Debug + 'static {
    /// Every kind, in display order.
    const ALL: &'static [Self];

    fn name(&self) -> &'static str;
}

/// Particles of the acid/base screens (dissociation, buffer, titration).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Serialize, Deserialize)]
pub enum AcidBaseMolecule {
    /// The undissociated weak substance, e.g. HA.
    Substance,
    /// The ion shared with water, e.g. H⁺.
    PrimaryIon,
    /// The conjugate ion, e.g. A⁻.
    SecondaryIon,
}

impl MoleculeKind for AcidBaseMolecule {
    const ALL: &'static [Self] = &[
        AcidBaseMolecule::Substance,
        AcidBaseMolecule::PrimaryIon,
        AcidBaseMolecule::SecondaryIon,
    ];

    fn name(&self) -> &'static str {
        match self {
            AcidBaseMolecule::Substance => "substance",
            AcidBaseMolecule::PrimaryIon => "primary ion",
            AcidBaseMolecule::SecondaryIon => "secondary ion",
        }
    }
}

/// Particles of the precipitation screen.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Serialize, Deserialize)]
pub enum PrecipitationMolecule {
    KnownReactant,
    UnknownReactant,
    Product,
}

impl MoleculeKind for PrecipitationMolecule {
    const ALL: &'static [Self] = &[
        PrecipitationMolecule::KnownReactant,
        PrecipitationMolecule::UnknownReactant,
        PrecipitationMolecule::Product,
    ];

    fn name(&self) -> &'static str {
        match self {
            PrecipitationMolecule::KnownReactant => "known reactant",
            PrecipitationMolecule::UnknownReactant => "unknown reactant",
            PrecipitationMolecule::Product => "precipitate",
        }
    }
}

/// Particles of the titration screen.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Serialize, Deserialize)]
pub enum TitrationMolecule {
    Substance,
    SecondaryIon,
    /// Titrant left over once the substance is used up.
    Titrant,
}

impl MoleculeKind for TitrationMolecule {
    const ALL: &'static [Self] = &[
        TitrationMolecule::Substance,
        TitrationMolecule::SecondaryIon,
        TitrationMolecule::Titrant,
    ];

    fn name(&self) -> &'static str {
        match self {
            TitrationMolecule::Substance => "substance",
            TitrationMolecule::SecondaryIon => "secondary ion",
            TitrationMolecule::Titrant => "titrant",
        }
    }
}
