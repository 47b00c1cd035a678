//! Vue inspectable d'un module, pour les listings et le JSON.

use core::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use movetpl_core::TableKind;

use crate::{
    catalog::{synthetic_name, AliasTable},
    error::Result,
    module::{Module, TableEntry},
};

/// Vue du module entier.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ModuleView {
    /// Version du format.
    pub version: u32,
    /// Octet de flavor.
    pub flavor: u8,
    /// Nom lu via le self module handle.
    pub module_name: Option<String>,
    /// Répertoire tel qu'il serait encodé.
    pub directory: Vec<TableEntry>,
    /// Table des identifiants.
    pub identifiers: Vec<String>,
    /// Pool d'adresses, forme affichée.
    pub address_identifiers: Vec<String>,
    /// Pool de constantes.
    pub constants: Vec<ConstantView>,
    /// Tailles des tables non interprétées.
    pub opaque_tables: Vec<OpaqueTableView>,
}

/// Une constante.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ConstantView {
    /// Indice dans le pool.
    pub index: usize,
    /// `constant_<index>`.
    pub name: String,
    /// Libellé de l'appelant.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub label: Option<String>,
    /// Type Move.
    pub type_tag: String,
    /// Valeur affichée.
    pub display_value: String,
}

/// Une table opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct OpaqueTableView {
    /// Type de table.
    pub kind: TableKind,
    /// Longueur en octets.
    pub length: usize,
}

impl ModuleView {
    /// Construit la vue. Une table des module handles illisible est une erreur.
    pub fn new(module: &Module, aliases: &AliasTable) -> Result<Self> {
        let constants = module
            .constants()
            .iter()
            .enumerate()
            .map(|(index, c)| {
                let name = synthetic_name(index);
                ConstantView {
                    index,
                    label: aliases.label_for(&name).map(str::to_string),
                    name,
                    type_tag: c.type_tag().to_string(),
                    display_value: c.display_value(),
                }
            })
            .collect();
        let opaque_tables = module
            .table_kinds()
            .iter()
            .filter_map(|&kind| module.opaque_table(kind).map(|t| OpaqueTableView { kind, length: t.len() }))
            .collect();
        Ok(Self {
            version: module.version(),
            flavor: module.header().flavor,
            module_name: module.self_module_name()?.map(str::to_string),
            directory: module.directory()?,
            identifiers: module.identifiers().to_vec(),
            address_identifiers: module.address_identifiers().iter().map(ToString::to_string).collect(),
            constants,
            opaque_tables,
        })
    }
}

impl fmt::Display for ModuleView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "module {} (v{})", self.module_name.as_deref().unwrap_or("?"), self.version)?;
        writeln!(f, "tables:")?;
        for e in &self.directory {
            writeln!(f, "  {:<22} @{:<6} {:>6} B", e.kind.name(), e.offset, e.length)?;
        }
        writeln!(f, "identifiers ({}):", self.identifiers.len())?;
        for (i, s) in self.identifiers.iter().enumerate() {
            writeln!(f, "  [{i:>3}] {s}")?;
        }
        writeln!(f, "addresses ({}):", self.address_identifiers.len())?;
        for (i, a) in self.address_identifiers.iter().enumerate() {
            writeln!(f, "  [{i:>3}] {a}")?;
        }
        writeln!(f, "constants ({}):", self.constants.len())?;
        for c in &self.constants {
            let label = c.label.as_deref().map(|l| format!(" ({l})")).unwrap_or_default();
            writeln!(f, "  {}{label}: {} = {}", c.name, c.type_tag, c.display_value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::TemplateError,
        module::tests::{build, sample, sample_tables},
    };
    use movetpl_core::DecodeError;
    use pretty_assertions::assert_eq;

    #[test]
    fn view_reflects_module() {
        let m = Module::from_bytes(&sample()).unwrap();
        let aliases: AliasTable = [("constant_0", "TOTAL_SUPPLY")].into_iter().collect();
        let v = ModuleView::new(&m, &aliases).unwrap();
        assert_eq!(v.module_name.as_deref(), Some("template"));
        assert_eq!(v.constants[0].label.as_deref(), Some("TOTAL_SUPPLY"));
        assert_eq!(v.constants[2].type_tag, "vector<u8>");
        assert_eq!(v.constants[2].display_value, "hello");
        assert_eq!(
            v.opaque_tables,
            [
                OpaqueTableView { kind: TableKind::ModuleHandles, length: 2 },
                OpaqueTableView { kind: TableKind::FunctionDefinitions, length: 4 },
            ]
        );

        let text = v.to_string();
        assert!(text.starts_with("module template (v6)\n"));
        assert!(text.contains("  constant_0 (TOTAL_SUPPLY): u64 = 1000000\n"));
    }

    #[test]
    fn unreadable_module_handles_fail_the_view() {
        let mut tables = sample_tables();
        // ULEB128 sans octet final
        tables[0].1 = vec![0x80];
        let m = Module::from_bytes(&build(6, &tables)).unwrap();
        assert!(matches!(
            ModuleView::new(&m, &AliasTable::new()),
            Err(TemplateError::Decode(DecodeError::OutOfBounds { .. }))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn view_serializes_to_json() {
        let m = Module::from_bytes(&sample()).unwrap();
        let v = ModuleView::new(&m, &AliasTable::new()).unwrap();
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["constants"][0]["display_value"], "1000000");
        assert_eq!(json["constants"][0]["type_tag"], "u64");
        assert!(json["constants"][0].get("label").is_none());
        assert_eq!(json["directory"][0]["kind"], "ModuleHandles");
        assert_eq!(json["identifiers"][1], "template");
    }
}
