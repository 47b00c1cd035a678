//! Manifeste de package, tel que produit par `sui move build --dump-bytecode-as-base64`.
//!
//! ```json
//! { "modules": ["oRzrCw..."], "dependencies": ["0x1", "0x2"], "digest": [12, 34, ...] }
//! ```

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use movetpl_core::AccountAddress;
use movetpl_module::{decode, AliasTable, TemplateEdits};

/// Contenu du manifeste. Les champs inconnus sont conservés tels quels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Modules compilés, en base64.
    pub modules: Vec<String>,
    /// Adresses des packages dépendants.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Empreinte du package source.
    #[serde(default)]
    pub digest: Vec<u8>,
    /// Autres champs.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PackageManifest {
    /// Parse depuis du texte JSON.
    pub fn from_json(text: &str) -> Result<Self> { serde_json::from_str(text).context("manifeste JSON invalide") }

    /// JSON indenté.
    pub fn to_json(&self) -> Result<String> { Ok(serde_json::to_string_pretty(self)?) }

    /// Réécrit chaque dépendance en `0x` + 64 chiffres hex.
    pub fn normalize_dependencies(&mut self) -> Result<()> {
        for dep in &mut self.dependencies {
            let addr = AccountAddress::from_short_hex(dep).with_context(|| format!("dépendance `{dep}`"))?;
            *dep = addr.to_string();
        }
        Ok(())
    }

    /// Nom de chaque module, dans l'ordre.
    pub fn module_names(&self) -> Result<Vec<Option<String>>> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, b64)| {
                let bytes = decode_base64(b64).with_context(|| format!("module #{i}"))?;
                let m = decode(&bytes).with_context(|| format!("module #{i}"))?;
                Ok(m.self_module_name()?.map(str::to_string))
            })
            .collect()
    }

    /// Index du module à éditer : celui nommé `name`, sinon l'unique module.
    pub fn select(&self, name: Option<&str>) -> Result<usize> {
        let names = self.module_names()?;
        match name {
            Some(wanted) => names
                .iter()
                .position(|n| n.as_deref() == Some(wanted))
                .with_context(|| format!("aucun module `{wanted}` dans le package")),
            None if names.len() == 1 => Ok(0),
            None => bail!("le package contient {} modules, choisir avec --module", names.len()),
        }
    }

    /// Applique `edits` au module `index`, les autres restent identiques.
    pub fn apply(&mut self, index: usize, edits: &TemplateEdits, aliases: &AliasTable) -> Result<()> {
        let slot = self.modules.get_mut(index).with_context(|| format!("module #{index} absent"))?;
        let bytes = decode_base64(slot)?;
        let out = movetpl_module::instantiate(&bytes, edits, aliases).with_context(|| format!("module #{index}"))?;
        *slot = STANDARD.encode(out);
        log::info!("module #{index} instancié");
        Ok(())
    }
}

/// Décodage base64 standard, espaces de bord ignorés.
pub fn decode_base64(text: &str) -> Result<Vec<u8>> { STANDARD.decode(text.trim()).context("base64 invalide") }

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TEMPLATE_B64: &str = include_str!("../../movetpl-module/tests/data/template_coin.b64");

    fn manifest(modules: &[&str]) -> PackageManifest {
        PackageManifest {
            modules: modules.iter().map(|m| m.trim().to_string()).collect(),
            dependencies: vec!["0x1".into(), "0x2".into()],
            digest: vec![1, 2, 3],
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn dependencies_are_widened() {
        let mut m = manifest(&[]);
        m.normalize_dependencies().unwrap();
        assert_eq!(m.dependencies[0], format!("0x{}1", "0".repeat(63)));
        assert_eq!(m.dependencies[1], format!("0x{}2", "0".repeat(63)));

        let mut bad = manifest(&[]);
        bad.dependencies.push("0xzz".into());
        assert!(bad.normalize_dependencies().is_err());
    }

    #[test]
    fn single_module_is_selected_by_default() {
        let m = manifest(&[TEMPLATE_B64]);
        assert_eq!(m.select(None).unwrap(), 0);
        assert_eq!(m.select(Some("template")).unwrap(), 0);
        assert!(m.select(Some("other")).is_err());

        let two = manifest(&[TEMPLATE_B64, TEMPLATE_B64]);
        assert!(two.select(None).is_err());
    }

    #[test]
    fn apply_edits_one_module() {
        let mut m = manifest(&[TEMPLATE_B64]);
        let edits = TemplateEdits { module_name: Some("gold".into()), ..TemplateEdits::default() };
        m.apply(0, &edits, &AliasTable::new()).unwrap();
        assert_eq!(m.module_names().unwrap(), [Some("gold".to_string())]);
        assert!(m.apply(3, &edits, &AliasTable::new()).is_err());
    }

    #[test]
    fn unknown_fields_survive() {
        let text = r#"{"modules": [], "dependencies": ["0x2"], "digest": [9], "note": "kept"}"#;
        let m = PackageManifest::from_json(text).unwrap();
        let back: serde_json::Value = serde_json::from_str(&m.to_json().unwrap()).unwrap();
        assert_eq!(back["note"], "kept");
        assert_eq!(back["digest"][0], 9);
    }
}
