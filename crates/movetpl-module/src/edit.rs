//! Éditeurs : renommage d'identifiants et remplacement de constantes.
//!
//! Chaque éditeur valide d'abord et modifie ensuite : sur `Err`, le module
//! est intact. Les autres tables référencent identifiants et constantes par
//! indice, rien d'autre n'est à réécrire.

use std::collections::BTreeMap;

use tracing::info;

use movetpl_core::TableKind;

use crate::{error::ValidationError, module::Module, types::Value};

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Module {
    /// Remplace l'identifiant d'indice `index`.
    ///
    /// Erreurs :
    /// - [`ValidationError::IndexOutOfRange`] si `index` dépasse la table ;
    /// - [`ValidationError::EmptyOrInvalidIdentifier`] hors de `[A-Za-z_][A-Za-z0-9_]*` ;
    /// - [`ValidationError::DuplicateIdentifier`] si le nom existe déjà à un autre
    ///   indice (le vérificateur Move refuse les identifiants en double).
    pub fn rename_identifier(&mut self, index: usize, new_name: &str) -> Result<(), ValidationError> {
        self.rename_identifiers([(index, new_name.to_string())])
    }

    /// Applique plusieurs renommages d'un coup ; pour un même indice, le dernier gagne.
    ///
    /// Les doublons sont cherchés dans la table telle qu'elle sera après tous
    /// les renommages : échanger deux noms en un appel est permis. Mêmes
    /// erreurs que [`Module::rename_identifier`].
    pub fn rename_identifiers<I>(&mut self, renames: I) -> Result<(), ValidationError>
    where
        I: IntoIterator<Item = (usize, String)>,
    {
        let renames: BTreeMap<usize, String> = renames.into_iter().collect();
        let len = self.identifiers.len();
        for (&index, name) in &renames {
            if index >= len {
                return Err(ValidationError::IndexOutOfRange { table: TableKind::Identifiers, index, len });
            }
            if !is_valid_identifier(name) {
                return Err(ValidationError::EmptyOrInvalidIdentifier { name: name.clone() });
            }
        }

        let next: Vec<&str> = self
            .identifiers
            .iter()
            .enumerate()
            .map(|(i, old)| renames.get(&i).map_or(old.as_str(), String::as_str))
            .collect();
        for (&index, name) in &renames {
            if let Some(existing) = next.iter().enumerate().position(|(i, s)| i != index && *s == name.as_str()) {
                return Err(ValidationError::DuplicateIdentifier { name: name.clone(), existing });
            }
        }

        for (index, name) in renames {
            if self.identifiers[index] != name {
                info!(index, from = %self.identifiers[index], to = %name, "identifier renamed");
            }
            self.identifiers[index] = name;
        }
        Ok(())
    }

    /// Renomme le module et sa struct one-time witness.
    ///
    /// Le witness est l'identifiant égal au nom du module en majuscules
    /// (`template` / `TEMPLATE`) ; il prend le nouveau nom en majuscules.
    pub fn rename_module(&mut self, new_name: &str) -> Result<(), ValidationError> {
        self.rename_identifiers(self.module_renames(new_name)?)
    }

    /// Renommages induits par [`Module::rename_module`], sans les appliquer.
    pub(crate) fn module_renames(&self, new_name: &str) -> Result<Vec<(usize, String)>, ValidationError> {
        let index = self
            .self_module_name_index()
            .map_err(ValidationError::UnreadableModuleHandles)?
            .filter(|&i| i < self.identifiers.len())
            .ok_or(ValidationError::MissingModuleName)?;
        let old = &self.identifiers[index];
        let mut renames = vec![(index, new_name.to_string())];
        let witness = old.to_ascii_uppercase();
        if let Some(w) = self.identifier_index(&witness).filter(|&w| w != index) {
            renames.push((w, new_name.to_ascii_uppercase()));
        }
        Ok(renames)
    }

    /// Remplace la valeur de la constante `index`, parsée selon son tag existant.
    ///
    /// Le tag ne change jamais ; la charge peut changer de taille.
    pub fn replace_constant(&mut self, index: usize, text: &str) -> Result<(), ValidationError> {
        let len = self.constants.len();
        let constant = self
            .constants
            .get_mut(index)
            .ok_or(ValidationError::IndexOutOfRange { table: TableKind::ConstantPool, index, len })?;
        let value = Value::parse(constant.type_tag(), text)
            .map_err(|source| ValidationError::TypeMismatch { index, source })?;
        let before = constant.payload().len();
        constant.set_value(value);
        let after = constant.payload().len();
        if before != after {
            info!(index, before, after, "constant payload resized");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::tests::{build, sample, sample_tables};
    use pretty_assertions::assert_eq;

    fn module() -> Module { Module::from_bytes(&sample()).unwrap() }

    #[test]
    fn identifier_grammar() {
        for ok in ["a", "_", "_x1", "MY_COIN", "coin2"] {
            assert!(is_valid_identifier(ok), "{ok}");
        }
        for bad in ["", "1abc", "my-coin", "my coin", "é", "a.b"] {
            assert!(!is_valid_identifier(bad), "{bad}");
        }
    }

    #[test]
    fn rename_keeps_other_entries() {
        let mut m = module();
        m.rename_identifier(2, "setup").unwrap();
        assert_eq!(m.identifiers(), ["TEMPLATE", "template", "setup", "coin"]);
        let back = Module::from_bytes(&m.to_bytes().unwrap()).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn rename_rejections_leave_module_untouched() {
        let mut m = module();
        let before = m.clone();
        assert_eq!(
            m.rename_identifier(9, "x"),
            Err(ValidationError::IndexOutOfRange { table: TableKind::Identifiers, index: 9, len: 4 })
        );
        assert_eq!(
            m.rename_identifier(0, "9lives"),
            Err(ValidationError::EmptyOrInvalidIdentifier { name: "9lives".into() })
        );
        assert_eq!(
            m.rename_identifier(0, ""),
            Err(ValidationError::EmptyOrInvalidIdentifier { name: String::new() })
        );
        assert_eq!(
            m.rename_identifier(2, "coin"),
            Err(ValidationError::DuplicateIdentifier { name: "coin".into(), existing: 3 })
        );
        assert_eq!(m, before);
    }

    #[test]
    fn swapping_two_names_is_allowed() {
        let mut m = module();
        m.rename_identifiers([(2, "coin".to_string()), (3, "init".to_string())]).unwrap();
        assert_eq!(m.identifiers(), ["TEMPLATE", "template", "coin", "init"]);
    }

    #[test]
    fn rename_module_carries_the_witness() {
        let mut m = module();
        m.rename_module("my_coin").unwrap();
        assert_eq!(m.identifiers(), ["MY_COIN", "my_coin", "init", "coin"]);
        assert_eq!(m.self_module_name().unwrap(), Some("my_coin"));
    }

    #[test]
    fn rename_module_without_witness() {
        let mut tables = sample_tables();
        let mut ids = movetpl_core::ByteWriter::new();
        for s in ["Other", "template", "init", "coin"] {
            ids.write_len_prefixed(s.as_bytes());
        }
        tables[1].1 = ids.into_vec();
        let mut m = Module::from_bytes(&build(6, &tables)).unwrap();
        m.rename_module("gold").unwrap();
        assert_eq!(m.identifiers(), ["Other", "gold", "init", "coin"]);
    }

    #[test]
    fn rename_module_needs_handles() {
        let tables: Vec<_> = sample_tables().into_iter().filter(|(k, _)| *k != TableKind::ModuleHandles).collect();
        let mut m = Module::from_bytes(&build(6, &tables)).unwrap();
        assert_eq!(m.rename_module("gold"), Err(ValidationError::MissingModuleName));
    }

    #[test]
    fn replace_constant_checks_type_and_index() {
        let mut m = module();
        let before = m.clone();
        assert!(matches!(m.replace_constant(1, "maybe"), Err(ValidationError::TypeMismatch { index: 1, .. })));
        assert!(matches!(
            m.replace_constant(0, "18446744073709551616"),
            Err(ValidationError::TypeMismatch { index: 0, .. })
        ));
        assert!(matches!(
            m.replace_constant(3, &"a".repeat(63)),
            Err(ValidationError::TypeMismatch { index: 3, .. })
        ));
        assert_eq!(
            m.replace_constant(4, "1"),
            Err(ValidationError::IndexOutOfRange { table: TableKind::ConstantPool, index: 4, len: 4 })
        );
        assert_eq!(m, before);
    }

    #[test]
    fn replace_constant_changes_only_the_payload() {
        let mut m = module();
        m.replace_constant(0, "2500000").unwrap();
        assert_eq!(m.constant(0).unwrap().display_value(), "2500000");
        assert_eq!(m.constant(0).unwrap().payload(), 2_500_000u64.to_le_bytes());
        assert_eq!(m.constant(0).unwrap().type_tag(), module().constant(0).unwrap().type_tag());
        assert_eq!(m.constants()[1..], module().constants()[1..]);
    }

    #[test]
    fn replacing_with_the_displayed_value_is_a_no_op() {
        let m = module();
        for (index, c) in m.constants().iter().enumerate() {
            let mut edited = m.clone();
            edited.replace_constant(index, &c.display_value()).unwrap();
            assert_eq!(edited.to_bytes().unwrap(), sample(), "constant {index}");
        }
    }

    #[test]
    fn replacing_twice_gives_the_same_bytes() {
        let mut once = module();
        once.replace_constant(2, "goodbye").unwrap();
        let mut twice = once.clone();
        twice.replace_constant(2, "goodbye").unwrap();
        assert_eq!(once.to_bytes().unwrap(), twice.to_bytes().unwrap());
    }
}
