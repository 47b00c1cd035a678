//! movetpl-core — primitives partagées du codec de modules Move
//!
//! Fournit :
//! - Constantes du format (`MOVE_MAGIC`, bornes de version, masque de flavor)
//! - `TableKind` : tags de table du répertoire (1 octet)
//! - IO mémoire : `ByteReader`, `ByteWriter` (ULEB128 + entiers little-endian)
//! - `AccountAddress` (32 octets, affichage `0x` + hex)
//! - Erreurs `DecodeError` + alias `DecodeResult<T>`
//!
//! Features :
//! - `serde` (par défaut) : derive (dé)sérialisation sur les types publics

#![deny(missing_docs)]

/* ─────────────────────────── Imports ─────────────────────────── */

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ─────────────────────────── Modules publics ─────────────────────────── */

/// Adresses de compte (32 octets).
pub mod address;
/// Lecteur/écrivain séquentiels.
pub mod cursor;
/// Erreurs de décodage.
pub mod error;

pub use address::{AccountAddress, AddressParseError, ADDRESS_LENGTH};
pub use cursor::{ByteReader, ByteWriter};
pub use error::{DecodeError, DecodeResult};

/* ─────────────────────────── Format — Constantes ─────────────────────────── */

/// Magic d'un module Move compilé : `A1 1C EB 0B`.
pub const MOVE_MAGIC: [u8; 4] = [0xA1, 0x1C, 0xEB, 0x0B];

/// Plus ancienne version de format acceptée.
pub const VERSION_MIN: u32 = 1;

/// Plus récente version de format acceptée.
pub const VERSION_MAX: u32 = 7;

/// Première version qui sérialise l'index du module courant après les tables.
pub const VERSION_WITH_SELF_HANDLE: u32 = 5;

/// Les 24 bits de poids faible portent la version, l'octet haut la flavor.
pub const VERSION_MASK: u32 = 0x00FF_FFFF;

/// Taille de l'en-tête fixe : magic + version u32.
pub const HEADER_SIZE: usize = MOVE_MAGIC.len() + 4;

/// Tags de table du répertoire — exactement 1 octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum TableKind {
    /// Handles de modules (adresse + nom).
    ModuleHandles = 0x01,
    /// Handles de structs.
    StructHandles = 0x02,
    /// Handles de fonctions.
    FunctionHandles = 0x03,
    /// Instanciations de fonctions génériques.
    FunctionInstantiations = 0x04,
    /// Signatures.
    Signatures = 0x05,
    /// Pool de constantes typées.
    ConstantPool = 0x06,
    /// Identifiants (chaînes UTF-8).
    Identifiers = 0x07,
    /// Adresses référencées.
    AddressIdentifiers = 0x08,
    /// Définitions de structs.
    StructDefinitions = 0x0A,
    /// Instanciations de structs génériques.
    StructDefInstantiations = 0x0B,
    /// Définitions de fonctions (code inclus).
    FunctionDefinitions = 0x0C,
    /// Handles de champs.
    FieldHandles = 0x0D,
    /// Instanciations de champs.
    FieldInstantiations = 0x0E,
    /// Déclarations `friend`.
    FriendDeclarations = 0x0F,
    /// Métadonnées libres.
    Metadata = 0x10,
    /// Définitions d'enums (v7).
    EnumDefinitions = 0x11,
    /// Instanciations d'enums (v7).
    EnumDefInstantiations = 0x12,
    /// Handles de variantes (v7).
    VariantHandles = 0x13,
    /// Handles de variantes instanciées (v7).
    VariantInstantiationHandles = 0x14,
}

impl TableKind {
    /// Toutes les sortes connues, dans l'ordre des tags.
    pub const ALL: [Self; 19] = [
        Self::ModuleHandles,
        Self::StructHandles,
        Self::FunctionHandles,
        Self::FunctionInstantiations,
        Self::Signatures,
        Self::ConstantPool,
        Self::Identifiers,
        Self::AddressIdentifiers,
        Self::StructDefinitions,
        Self::StructDefInstantiations,
        Self::FunctionDefinitions,
        Self::FieldHandles,
        Self::FieldInstantiations,
        Self::FriendDeclarations,
        Self::Metadata,
        Self::EnumDefinitions,
        Self::EnumDefInstantiations,
        Self::VariantHandles,
        Self::VariantInstantiationHandles,
    ];

    /// Octet du tag tel qu'écrit dans le répertoire.
    pub const fn to_byte(self) -> u8 { self as u8 }

    /// Lit un tag depuis son octet.
    pub fn from_byte(b: u8) -> Option<Self> { Self::ALL.iter().copied().find(|k| k.to_byte() == b) }

    /// Vrai si le codec interprète le contenu de la table.
    pub const fn is_parsed(self) -> bool {
        matches!(self, Self::Identifiers | Self::AddressIdentifiers | Self::ConstantPool)
    }

    /// Nom lisible.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ModuleHandles => "MODULE_HANDLES",
            Self::StructHandles => "STRUCT_HANDLES",
            Self::FunctionHandles => "FUNCTION_HANDLES",
            Self::FunctionInstantiations => "FUNCTION_INST",
            Self::Signatures => "SIGNATURES",
            Self::ConstantPool => "CONSTANT_POOL",
            Self::Identifiers => "IDENTIFIERS",
            Self::AddressIdentifiers => "ADDRESS_IDENTIFIERS",
            Self::StructDefinitions => "STRUCT_DEFS",
            Self::StructDefInstantiations => "STRUCT_DEF_INST",
            Self::FunctionDefinitions => "FUNCTION_DEFS",
            Self::FieldHandles => "FIELD_HANDLES",
            Self::FieldInstantiations => "FIELD_INST",
            Self::FriendDeclarations => "FRIEND_DECLS",
            Self::Metadata => "METADATA",
            Self::EnumDefinitions => "ENUM_DEFS",
            Self::EnumDefInstantiations => "ENUM_DEF_INST",
            Self::VariantHandles => "VARIANT_HANDLES",
            Self::VariantInstantiationHandles => "VARIANT_INST_HANDLES",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/* ─────────────────────────── Prélude (reexports utiles) ─────────────────────────── */

/// Prélude pratique pour importer les types/funcs clés du crate.
pub mod prelude {
    /// Réexports utiles pour une importation rapide.
    pub use super::{
        AccountAddress, ByteReader, ByteWriter, DecodeError, DecodeResult, TableKind,
        ADDRESS_LENGTH, HEADER_SIZE, MOVE_MAGIC, VERSION_MAX, VERSION_MIN,
    };
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_kinds_roundtrip() {
        for kind in TableKind::ALL {
            assert_eq!(TableKind::from_byte(kind.to_byte()), Some(kind));
        }
    }

    #[test]
    fn gaps_in_tag_space_are_unknown() {
        assert_eq!(TableKind::from_byte(0x00), None);
        assert_eq!(TableKind::from_byte(0x09), None);
        assert_eq!(TableKind::from_byte(0x15), None);
    }

    #[test]
    fn only_three_tables_are_parsed() {
        let parsed: Vec<_> = TableKind::ALL.iter().filter(|k| k.is_parsed()).collect();
        assert_eq!(parsed.len(), 3);
    }
}
