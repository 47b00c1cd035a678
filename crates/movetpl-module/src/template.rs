//! Éditions groupées : tout ce que change une instanciation de template, appliqué d'un coup.

use indexmap::IndexMap;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{catalog::AliasTable, error::ValidationError, module::Module};

/// Éditions à appliquer à un module template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct TemplateEdits {
    /// Nouveau nom du module ; le one-time witness suit.
    pub module_name: Option<String>,
    /// Renommages d'identifiants, par nom actuel.
    pub identifiers: IndexMap<String, String>,
    /// Valeurs des constantes, par libellé ou `constant_<i>`.
    pub constants: IndexMap<String, String>,
}

impl TemplateEdits {
    /// Vrai si l'application ne changerait rien.
    pub fn is_empty(&self) -> bool {
        self.module_name.is_none() && self.identifiers.is_empty() && self.constants.is_empty()
    }

    /// Rend une copie éditée de `module`, ou la première erreur.
    ///
    /// Les clés d'identifiants sont cherchées dans `module` tel quel, avant
    /// le renommage du module ; un renommage explicite du même indice
    /// l'emporte. Les constantes sont appliquées dans l'ordre des clés.
    pub fn apply(&self, module: &Module, aliases: &AliasTable) -> Result<Module, ValidationError> {
        let mut next = module.clone();

        let mut renames = match &self.module_name {
            Some(name) => module.module_renames(name)?,
            None => Vec::new(),
        };
        for (old, new) in &self.identifiers {
            let index = module
                .identifier_index(old)
                .ok_or_else(|| ValidationError::UnknownIdentifier { name: old.clone() })?;
            renames.push((index, new.clone()));
        }
        next.rename_identifiers(renames)?;

        for (key, text) in &self.constants {
            let index = aliases
                .resolve(key)
                .filter(|&i| i < module.constants().len())
                .ok_or_else(|| ValidationError::UnknownConstant { key: key.clone() })?;
            next.replace_constant(index, text)?;
        }

        debug!(
            renames = self.identifiers.len() + usize::from(self.module_name.is_some()),
            constants = self.constants.len(),
            "template applied"
        );
        Ok(next)
    }
}
