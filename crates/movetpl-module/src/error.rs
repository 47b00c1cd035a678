//! Erreurs d'édition et d'encodage.
//!
//! Les erreurs de décodage sont dans `movetpl-core` ([`DecodeError`]) ; ici :
//! entrées refusées par les éditeurs, et échec d'auto-contrôle de l'encodeur.

use thiserror::Error;

use movetpl_core::{DecodeError, TableKind};

use crate::types::ParseValueError;

/// Entrée refusée par un éditeur. Le module reste inchangé.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Le texte ne se parse pas selon le type de la constante.
    #[error("constant {index}: {source}")]
    TypeMismatch {
        /// Indice dans le pool.
        index: usize,
        /// Échec de parsing.
        source: ParseValueError,
    },
    /// Nom vide, caractère hors `[A-Za-z0-9_]` ou chiffre en tête.
    #[error("invalid identifier `{name}`")]
    EmptyOrInvalidIdentifier {
        /// Nom refusé.
        name: String,
    },
    /// Indice au-delà de la fin d'une table.
    #[error("{table} index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Table visée.
        table: TableKind,
        /// Indice demandé.
        index: usize,
        /// Longueur de la table.
        len: usize,
    },
    /// Le nouveau nom est déjà pris par un autre identifiant.
    #[error("identifier `{name}` already exists at index {existing}")]
    DuplicateIdentifier {
        /// Nom en collision.
        name: String,
        /// Indice qui le porte déjà.
        existing: usize,
    },
    /// Clé de template qui ne désigne aucune constante (ni `constant_<i>`, ni alias connu).
    #[error("no constant named `{key}`")]
    UnknownConstant {
        /// Clé telle que donnée.
        key: String,
    },
    /// Renommage de template vers un identifiant absent du module.
    #[error("no identifier `{name}` in module")]
    UnknownIdentifier {
        /// Nom manquant.
        name: String,
    },
    /// Le module n'a pas de self module handle.
    #[error("module has no self module handle")]
    MissingModuleName,
    /// La table opaque des module handles n'a pas pu être parcourue.
    #[error("module handles unreadable: {0}")]
    UnreadableModuleHandles(#[source] DecodeError),
}

/// Échecs de l'encodeur. Jamais causés par l'entrée de l'appelant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Le redécodage de la sortie ne correspond pas au module.
    #[error("encode invariant violated: {detail}")]
    InvariantViolation {
        /// Ce qui diffère.
        detail: String,
    },
    /// Une table ou un offset ne tient plus dans les champs u32 du format.
    #[error("{kind} grew to {len} bytes, beyond the format limit")]
    TableTooLarge {
        /// Table concernée.
        kind: TableKind,
        /// Longueur ou offset de fin.
        len: usize,
    },
}

/// Toute erreur du codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// Octets d'entrée malformés.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Édition refusée.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Défaut de l'encodeur.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Alias de résultat de la crate.
pub type Result<T> = core::result::Result<T, TemplateError>;
