//! movetpl-module — décoder, éditer et ré-encoder des modules Move compilés
//!
//! Format :
//! ```text
//! En-tête   : A1 1C EB 0B + version u32 LE (24 bits bas = version, octet haut = flavor)
//! Répertoire: compte ULEB128, puis { kind u8, offset ULEB128, length ULEB128 }*
//! Tables    : contiguës, offsets relatifs au premier octet de table
//! Trailer   : self module handle ULEB128 (version >= 5)
//! ```
//!
//! Tables interprétées :
//! - IDENTIFIERS : chaînes UTF-8 préfixées ULEB128
//! - ADDRESS_IDENTIFIERS : adresses de 32 octets
//! - CONSTANT_POOL : type tag + charge BCS préfixée ULEB128
//!
//! Le reste est conservé tel quel : un module non modifié se ré-encode
//! exactement à l'identique.
//!
//! API :
//! - [`decode`] / [`encode`] (aussi [`Module::from_bytes`], [`Module::to_bytes`])
//! - [`get_replaceable_constants`], [`AliasTable`]
//! - [`rename_identifier`], [`replace_constant`], [`Module::rename_module`]
//! - [`TemplateEdits::apply`] pour instancier un template d'un coup
//! - [`ModuleView`] pour les listings et le JSON
//!
//! Features :
//! - `serde` (défaut) : `Serialize` sur les vues, `Deserialize` sur
//!   [`TemplateEdits`] et [`AliasTable`]

#![deny(missing_docs)]

/// Catalogue des constantes et alias.
pub mod catalog;
/// Éditeurs d'identifiants et de constantes.
pub mod edit;
/// Encodeur.
pub mod encode;
/// Erreurs d'édition et d'encodage.
pub mod error;
/// Modèle de module et décodeur.
pub mod module;
/// Éditions de template groupées.
pub mod template;
/// Types et valeurs des constantes.
pub mod types;
/// Vue d'inspection.
pub mod view;

pub use catalog::{parse_synthetic_name, synthetic_name, AliasTable, ReplaceableField};
pub use edit::is_valid_identifier;
pub use error::{EncodeError, Result, TemplateError, ValidationError};
pub use module::{Constant, Header, Module, TableEntry};
pub use movetpl_core::{AccountAddress, DecodeError, DecodeResult, TableKind};
pub use template::TemplateEdits;
pub use types::{ParseValueError, TypeTag, Value};
pub use view::{ConstantView, ModuleView, OpaqueTableView};

/// Décode un module compilé.
pub fn decode(bytes: &[u8]) -> DecodeResult<Module> { Module::from_bytes(bytes) }

/// Encode un module.
pub fn encode(module: &Module) -> core::result::Result<Vec<u8>, EncodeError> { module.to_bytes() }

/// Chaque constante comme champ éditable, dans l'ordre du pool.
pub fn get_replaceable_constants(module: &Module) -> Vec<ReplaceableField> { module.replaceable_constants() }

/// Voir [`Module::rename_identifier`].
pub fn rename_identifier(module: &mut Module, index: usize, new_name: &str) -> core::result::Result<(), ValidationError> {
    module.rename_identifier(index, new_name)
}

/// Voir [`Module::replace_constant`].
pub fn replace_constant(module: &mut Module, index: usize, text: &str) -> core::result::Result<(), ValidationError> {
    module.replace_constant(index, text)
}

/// Décode, applique, encode (vérifié).
pub fn instantiate(bytes: &[u8], edits: &TemplateEdits, aliases: &AliasTable) -> Result<Vec<u8>> {
    let module = decode(bytes)?;
    let edited = edits.apply(&module, aliases)?;
    Ok(edited.encode_checked()?)
}

/// Prelude.
pub mod prelude {
    pub use super::{
        decode, encode, get_replaceable_constants, instantiate, AliasTable, Module, ModuleView, ReplaceableField,
        TemplateEdits, TypeTag, Value,
    };
}
