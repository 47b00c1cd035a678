//! Catalogue des constantes et alias fournis par l'appelant.
//!
//! Le binaire ne nomme pas les constantes. Le catalogue les nomme par
//! position dans le pool (`constant_<i>`), ce qui suppose que le compilateur
//! émet le pool dans l'ordre du source ; les libellés restent donc dans la
//! configuration de l'appelant.

use indexmap::IndexMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{module::Module, types::TypeTag};

const SYNTHETIC_PREFIX: &str = "constant_";

/// `constant_<index>`
pub fn synthetic_name(index: usize) -> String { format!("{SYNTHETIC_PREFIX}{index}") }

/// Inverse de [`synthetic_name`]. Refuse signes et zéros de tête.
pub fn parse_synthetic_name(name: &str) -> Option<usize> {
    let digits = name.strip_prefix(SYNTHETIC_PREFIX)?;
    let canonical = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'));
    if canonical {
        digits.parse().ok()
    } else {
        None
    }
}

/// Une constante éditable.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ReplaceableField {
    /// Indice dans le pool.
    pub pool_index: usize,
    /// `constant_<pool_index>`.
    pub synthetic_name: String,
    /// Valeur actuelle, forme affichée.
    pub display_value: String,
    /// Type (fixe).
    pub type_tag: TypeTag,
}

impl Module {
    /// Toutes les constantes, dans l'ordre du pool, sans filtre.
    pub fn replaceable_constants(&self) -> Vec<ReplaceableField> {
        self.constants()
            .iter()
            .enumerate()
            .map(|(i, c)| ReplaceableField {
                pool_index: i,
                synthetic_name: synthetic_name(i),
                display_value: c.display_value(),
                type_tag: c.type_tag().clone(),
            })
            .collect()
    }
}

/// Nom synthétique → libellé (ex. `constant_0` → `TOTAL_SUPPLY`), ordre d'insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct AliasTable(IndexMap<String, String>);

impl AliasTable {
    /// Table vide.
    pub fn new() -> Self { Self::default() }

    /// Ajoute ou remplace le libellé de `synthetic`.
    pub fn insert(&mut self, synthetic: impl Into<String>, label: impl Into<String>) {
        self.0.insert(synthetic.into(), label.into());
    }

    /// Nombre d'alias.
    pub fn len(&self) -> usize { self.0.len() }

    /// Vrai si aucun alias.
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Paires `(synthétique, libellé)` dans l'ordre d'insertion.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> { self.0.iter().map(|(k, v)| (k.as_str(), v.as_str())) }

    /// Libellé d'un nom synthétique.
    pub fn label_for(&self, synthetic: &str) -> Option<&str> { self.0.get(synthetic).map(String::as_str) }

    /// Indice pour un libellé ou un nom synthétique. Les libellés priment.
    pub fn resolve(&self, key: &str) -> Option<usize> {
        self.0
            .iter()
            .find(|(_, label)| *label == key)
            .and_then(|(synthetic, _)| parse_synthetic_name(synthetic))
            .or_else(|| parse_synthetic_name(key))
    }

    /// Champs qui ont un libellé.
    pub fn filter<'a>(&self, fields: &'a [ReplaceableField]) -> Vec<&'a ReplaceableField> {
        fields.iter().filter(|f| self.0.contains_key(&f.synthetic_name)).collect()
    }

    /// Chaque champ avec son libellé éventuel.
    pub fn labelled<'a>(&'a self, fields: &'a [ReplaceableField]) -> Vec<(Option<&'a str>, &'a ReplaceableField)> {
        fields.iter().map(|f| (self.label_for(&f.synthetic_name), f)).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AliasTable {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::tests::sample;
    use pretty_assertions::assert_eq;

    fn aliases() -> AliasTable { [("constant_0", "TOTAL_SUPPLY"), ("constant_2", "SYMBOL")].into_iter().collect() }

    #[test]
    fn synthetic_names_roundtrip() {
        assert_eq!(synthetic_name(7), "constant_7");
        assert_eq!(parse_synthetic_name("constant_7"), Some(7));
        assert_eq!(parse_synthetic_name("constant_0"), Some(0));
        for bad in ["constant_", "constant_07", "constant_-1", "constant_+1", "const_1", "TOTAL_SUPPLY"] {
            assert_eq!(parse_synthetic_name(bad), None, "{bad}");
        }
    }

    #[test]
    fn catalog_lists_every_constant() {
        let m = Module::from_bytes(&sample()).unwrap();
        let fields = m.replaceable_constants();
        assert_eq!(fields.len(), 4);
        assert_eq!(
            fields[0],
            ReplaceableField {
                pool_index: 0,
                synthetic_name: "constant_0".into(),
                display_value: "1000000".into(),
                type_tag: TypeTag::U64,
            }
        );
        assert_eq!(fields[2].type_tag.to_string(), "vector<u8>");
    }

    #[test]
    fn resolve_prefers_labels() {
        let a = aliases();
        assert_eq!(a.resolve("TOTAL_SUPPLY"), Some(0));
        assert_eq!(a.resolve("SYMBOL"), Some(2));
        assert_eq!(a.resolve("constant_3"), Some(3));
        assert_eq!(a.resolve("NAME"), None);

        // un libellé qui ressemble à un autre nom synthétique
        let tricky: AliasTable = [("constant_1", "constant_0")].into_iter().collect();
        assert_eq!(tricky.resolve("constant_0"), Some(1));
    }

    #[test]
    fn filter_and_labelled() {
        let m = Module::from_bytes(&sample()).unwrap();
        let fields = m.replaceable_constants();
        let a = aliases();
        let kept: Vec<_> = a.filter(&fields).iter().map(|f| f.pool_index).collect();
        assert_eq!(kept, [0, 2]);
        let labels: Vec<_> = a.labelled(&fields).into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, [Some("TOTAL_SUPPLY"), None, Some("SYMBOL"), None]);
        assert!(AliasTable::new().filter(&fields).is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn aliases_read_as_a_json_object() {
        let a: AliasTable = serde_json::from_str(r#"{"constant_1": "DECIMALS", "constant_0": "TOTAL_SUPPLY"}"#).unwrap();
        let order: Vec<_> = a.iter().map(|(k, _)| k).collect();
        assert_eq!(order, ["constant_1", "constant_0"]);
        assert_eq!(a.label_for("constant_1"), Some("DECIMALS"));
    }
}
