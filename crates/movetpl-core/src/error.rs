//! Erreurs de décodage.
//!
//! Toutes signalent une entrée malformée ou non supportée : le décodage
//! s'arrête et aucun module partiel n'est rendu.

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::TableKind;

/// Alias résultat pour le décodage.
pub type DecodeResult<T> = core::result::Result<T, DecodeError>;

/// Erreurs de bas niveau rencontrées en lisant un module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DecodeError {
    /// Les 4 premiers octets ne sont pas `A1 1C EB 0B`.
    #[error("bad magic: expected a11ceb0b, found {found}")]
    BadMagic {
        /// Octets lus, en hex.
        found: String,
    },
    /// Version hors de `VERSION_MIN..=VERSION_MAX`.
    #[error("unsupported format version {version}")]
    UnsupportedVersion {
        /// Version lue (sans la flavor).
        version: u32,
    },
    /// Moins d'octets disponibles que nécessaire.
    #[error("out of bounds: need {needed} bytes at offset {at}, {remaining} remaining")]
    OutOfBounds {
        /// Nombre d'octets demandés.
        needed: usize,
        /// Offset de la lecture.
        at: usize,
        /// Octets restants.
        remaining: usize,
    },
    /// Les tables ne couvrent pas exactement l'entrée (trou, chevauchement, reste).
    #[error("trailing bytes or gap: {detail}")]
    TrailingBytesOrGap {
        /// Description de l'incohérence.
        detail: String,
    },
    /// ULEB128 non canonique ou trop grand pour la largeur cible.
    #[error("malformed ULEB128 at offset {at}")]
    MalformedUleb128 {
        /// Offset du premier octet.
        at: usize,
    },
    /// Octet de tag de table inconnu.
    #[error("unknown table kind 0x{raw:02x}")]
    UnknownTableKind {
        /// Octet brut.
        raw: u8,
    },
    /// Une même table apparaît deux fois dans le répertoire.
    #[error("duplicate table {kind}")]
    DuplicateTable {
        /// Table dupliquée.
        kind: TableKind,
    },
    /// Identifiant qui n'est pas de l'UTF-8.
    #[error("identifier {index} is not valid utf-8")]
    InvalidUtf8 {
        /// Index dans la table.
        index: usize,
    },
    /// Type de constante hors du sous-ensemble supporté.
    #[error("constant {index}: unsupported type tag 0x{raw:02x}")]
    UnsupportedConstantType {
        /// Index dans le pool.
        index: usize,
        /// Octet brut.
        raw: u8,
    },
    /// Vecteurs imbriqués au-delà de la limite.
    #[error("constant {index}: type nesting deeper than {limit}")]
    TypeNestingTooDeep {
        /// Index dans le pool.
        index: usize,
        /// Profondeur maximale.
        limit: usize,
    },
    /// Payload qui ne se décode pas sous son type (ou pas entièrement consommé).
    #[error("constant {index}: payload does not match its type ({detail})")]
    MalformedConstant {
        /// Index dans le pool.
        index: usize,
        /// Détail.
        detail: String,
    },
}

impl DecodeError {
    /// Construit une erreur « trou / reste ».
    pub fn gap(detail: impl Into<String>) -> Self { Self::TrailingBytesOrGap { detail: detail.into() } }
}
