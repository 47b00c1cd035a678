//! Fichier de configuration d'un template (JSON).
//!
//! ```json
//! {
//!   "module_name": "gold",
//!   "aliases": { "constant_0": "TOTAL_SUPPLY", "constant_2": "SYMBOL" },
//!   "constants": { "TOTAL_SUPPLY": "2100000000000000", "SYMBOL": "GLD" },
//!   "identifiers": { "init": "setup" },
//!   "modules": { "silver": { "constants": { "constant_1": "9" } } }
//! }
//! ```
//!
//! Tous les champs sont facultatifs. `modules` ne sert qu'à `package` : une
//! config par module du package, indexée par le nom actuel du module.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use movetpl_module::{AliasTable, TemplateEdits};

/// Configuration complète : alias + éditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateConfig {
    /// Nouveau nom de module.
    pub module_name: Option<String>,
    /// `constant_<i>` → libellé.
    pub aliases: AliasTable,
    /// Libellé ou `constant_<i>` → valeur texte.
    pub constants: IndexMap<String, String>,
    /// Ancien identifiant → nouveau.
    pub identifiers: IndexMap<String, String>,
    /// Nom de module → config propre (manifestes de package).
    pub modules: IndexMap<String, TemplateConfig>,
}

impl TemplateConfig {
    /// Parse depuis du texte JSON.
    pub fn from_json(text: &str) -> Result<Self> { serde_json::from_str(text).context("configuration JSON invalide") }

    /// Charge un fichier.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("lecture config: {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("config: {}", path.display()))
    }

    /// Vrai si la config de premier niveau modifie quelque chose.
    pub fn has_edits(&self) -> bool { !self.edits().is_empty() }

    /// Alias de cette config, ceux de `parent` si elle n'en a pas.
    pub fn aliases_or<'a>(&'a self, parent: &'a Self) -> &'a AliasTable {
        if self.aliases.is_empty() {
            &parent.aliases
        } else {
            &self.aliases
        }
    }

    /// Éditions à appliquer (sans les alias).
    pub fn edits(&self) -> TemplateEdits {
        TemplateEdits {
            module_name: self.module_name.clone(),
            identifiers: self.identifiers.clone(),
            constants: self.constants.clone(),
        }
    }
}
