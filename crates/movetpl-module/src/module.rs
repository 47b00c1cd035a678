//! Représentation d'un module Move en mémoire, et son décodeur.
//!
//! Seules trois tables sont interprétées : identifiants, adresses et pool de
//! constantes. Les autres gardent exactement leurs octets d'entrée ; un
//! module non modifié se ré-encode donc à l'identique.

use std::collections::BTreeMap;

use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::Serialize;

use movetpl_core::{
    AccountAddress, ByteReader, DecodeError, DecodeResult, TableKind, ADDRESS_LENGTH, MOVE_MAGIC,
    VERSION_MASK, VERSION_MAX, VERSION_MIN, VERSION_WITH_SELF_HANDLE,
};

use crate::types::{TagError, TypeTag, Value};

/* ─────────────────────────── Header ─────────────────────────── */

/// Mot de version du format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Header {
    /// Version du format (1..=7).
    pub version: u32,
    /// Octet de flavor (Sui en écrit un à partir de v7, 0 sinon).
    pub flavor: u8,
}

impl Header {
    /// Sépare et vérifie le u32 brut.
    pub fn from_raw(raw: u32) -> DecodeResult<Self> {
        let version = raw & VERSION_MASK;
        if !(VERSION_MIN..=VERSION_MAX).contains(&version) {
            return Err(DecodeError::UnsupportedVersion { version });
        }
        Ok(Self { version, flavor: (raw >> 24) as u8 })
    }

    /// u32 brut tel qu'écrit après le magic.
    pub const fn raw(self) -> u32 { self.version | ((self.flavor as u32) << 24) }

    /// Vrai si un indice de self module handle suit les tables.
    pub const fn has_self_handle(self) -> bool { self.version >= VERSION_WITH_SELF_HANDLE }
}

/* ─────────────────────────── Directory ─────────────────────────── */

/// Entrée du répertoire. Offsets relatifs au premier octet de table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TableEntry {
    /// Type de table.
    pub kind: TableKind,
    /// Offset de début.
    pub offset: u32,
    /// Longueur en octets.
    pub length: u32,
}

impl TableEntry {
    /// Fin exclusive.
    pub const fn end(&self) -> u64 { self.offset as u64 + self.length as u64 }
}

/* ─────────────────────────── Constant ─────────────────────────── */

/// Entrée du pool de constantes. Le tag ne change plus après décodage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant {
    type_tag: TypeTag,
    value: Value,
}

impl Constant {
    pub(crate) const fn new(type_tag: TypeTag, value: Value) -> Self { Self { type_tag, value } }

    /// Type de l'entrée.
    pub const fn type_tag(&self) -> &TypeTag { &self.type_tag }

    /// Valeur décodée.
    pub const fn value(&self) -> &Value { &self.value }

    /// Charge BCS telle qu'elle sera encodée.
    pub fn payload(&self) -> Vec<u8> { self.value.to_payload() }

    /// Forme affichée (voir [`Value::display`]).
    pub fn display_value(&self) -> String { self.value.display(&self.type_tag) }

    pub(crate) fn set_value(&mut self, value: Value) { self.value = value; }
}

/* ─────────────────────────── Module ─────────────────────────── */

/// Module décodé.
///
/// `directory` garde l'ordre de listing des entrées, `layout` l'ordre de
/// leurs octets. L'encodeur reproduit les deux.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub(crate) header: Header,
    pub(crate) directory: Vec<TableKind>,
    pub(crate) layout: Vec<TableKind>,
    pub(crate) identifiers: Vec<String>,
    pub(crate) address_identifiers: Vec<AccountAddress>,
    pub(crate) constants: Vec<Constant>,
    pub(crate) opaque: BTreeMap<TableKind, Vec<u8>>,
    pub(crate) self_handle: Option<u32>,
}

impl Module {
    /// Décode un module compilé.
    ///
    /// Échoue au premier élément malformé ; jamais de module partiel.
    pub fn from_bytes(bytes: &[u8]) -> DecodeResult<Self> {
        let mut r = ByteReader::new(bytes);

        let magic: [u8; 4] = r.read_fixed()?;
        if magic != MOVE_MAGIC {
            return Err(DecodeError::BadMagic { found: hex::encode(magic) });
        }
        let header = Header::from_raw(r.read_u32_le()?)?;

        let count = r.read_len()?;
        let mut entries: Vec<TableEntry> = Vec::with_capacity(count.min(TableKind::ALL.len()));
        for _ in 0..count {
            let raw = r.read_u8()?;
            let kind = TableKind::from_byte(raw).ok_or(DecodeError::UnknownTableKind { raw })?;
            if entries.iter().any(|e| e.kind == kind) {
                return Err(DecodeError::DuplicateTable { kind });
            }
            let offset = r.read_uleb128_u32()?;
            let length = r.read_uleb128_u32()?;
            trace!(%kind, offset, length, "directory entry");
            entries.push(TableEntry { kind, offset, length });
        }

        // tri stable : les tables vides au même offset gardent l'ordre du répertoire
        let mut layout = entries.clone();
        layout.sort_by_key(|e| e.offset);
        let mut expected = 0u64;
        for e in &layout {
            if u64::from(e.offset) != expected {
                return Err(DecodeError::gap(format!(
                    "{} starts at {} but the previous table ends at {expected}",
                    e.kind, e.offset
                )));
            }
            expected = e.end();
        }
        let area_len = usize::try_from(expected).map_err(|_| DecodeError::OutOfBounds {
            needed: usize::MAX,
            at: r.offset(),
            remaining: r.remaining(),
        })?;
        let area = r.read_bytes(area_len)?;

        let self_handle = if header.has_self_handle() { Some(r.read_uleb128_u32()?) } else { None };
        if !r.is_empty() {
            return Err(DecodeError::gap(format!("{} bytes after the module end", r.remaining())));
        }

        let mut module = Self {
            header,
            directory: entries.iter().map(|e| e.kind).collect(),
            layout: layout.iter().map(|e| e.kind).collect(),
            identifiers: Vec::new(),
            address_identifiers: Vec::new(),
            constants: Vec::new(),
            opaque: BTreeMap::new(),
            self_handle,
        };

        for e in &entries {
            // bornes déjà couvertes par `area_len`
            let table = &area[e.offset as usize..e.end() as usize];
            match e.kind {
                TableKind::Identifiers => module.identifiers = decode_identifiers(table)?,
                TableKind::AddressIdentifiers => module.address_identifiers = decode_addresses(table)?,
                TableKind::ConstantPool => module.constants = decode_constants(table)?,
                kind => {
                    module.opaque.insert(kind, table.to_vec());
                }
            }
            debug!(kind = %e.kind, offset = e.offset, length = e.length, "table decoded");
        }

        debug!(
            version = header.version,
            identifiers = module.identifiers.len(),
            constants = module.constants.len(),
            "module decoded"
        );
        Ok(module)
    }

    /// Mot de version.
    pub const fn header(&self) -> Header { self.header }

    /// Version du format.
    pub const fn version(&self) -> u32 { self.header.version }

    /// Identifiants, adressés par indice.
    pub fn identifiers(&self) -> &[String] { &self.identifiers }

    /// Identifiant d'indice `index`.
    pub fn identifier(&self, index: usize) -> Option<&str> { self.identifiers.get(index).map(String::as_str) }

    /// Indice de l'identifiant égal à `name`.
    pub fn identifier_index(&self, name: &str) -> Option<usize> { self.identifiers.iter().position(|s| s == name) }

    /// Pool d'adresses.
    pub fn address_identifiers(&self) -> &[AccountAddress] { &self.address_identifiers }

    /// Pool de constantes.
    pub fn constants(&self) -> &[Constant] { &self.constants }

    /// Constante d'indice `index`.
    pub fn constant(&self, index: usize) -> Option<&Constant> { self.constants.get(index) }

    /// Octets d'une table non interprétée.
    pub fn opaque_table(&self, kind: TableKind) -> Option<&[u8]> { self.opaque.get(&kind).map(Vec::as_slice) }

    /// Types de tables dans l'ordre du répertoire.
    pub fn table_kinds(&self) -> &[TableKind] { &self.directory }

    /// Vrai si le module liste `kind`.
    pub fn has_table(&self, kind: TableKind) -> bool { self.directory.contains(&kind) }

    /// Indice du self module handle lu dans le trailer (`None` avant v5).
    pub const fn self_handle(&self) -> Option<u32> { self.self_handle }

    /// Indice de l'identifiant qui nomme ce module.
    ///
    /// Parcourt la table opaque des module handles : chaque entrée = indice
    /// d'adresse ULEB128 puis indice d'identifiant ULEB128. Le self handle est
    /// celui du trailer, ou le premier avant v5. `Ok(None)` si la table manque.
    pub fn self_module_name_index(&self) -> DecodeResult<Option<usize>> {
        let Some(table) = self.opaque_table(TableKind::ModuleHandles) else {
            return Ok(None);
        };
        let target = self.self_handle.unwrap_or(0);
        let mut r = ByteReader::new(table);
        for i in 0..=target {
            let _address = r.read_uleb128_u32()?;
            let name = r.read_len()?;
            if i == target {
                return Ok(Some(name));
            }
        }
        Ok(None)
    }

    /// Nom de ce module (ex. `template`).
    pub fn self_module_name(&self) -> DecodeResult<Option<&str>> {
        Ok(self.self_module_name_index()?.and_then(|i| self.identifier(i)))
    }
}

/* ─────────────────────────── Table decoders ─────────────────────────── */

fn decode_identifiers(table: &[u8]) -> DecodeResult<Vec<String>> {
    let mut r = ByteReader::new(table);
    let mut out = Vec::new();
    while !r.is_empty() {
        let index = out.len();
        let raw = r.read_len_prefixed().map_err(|e| overrun(e, "identifier", index))?;
        let s = core::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8 { index })?;
        trace!(index, name = s, "identifier");
        out.push(s.to_string());
    }
    Ok(out)
}

fn decode_addresses(table: &[u8]) -> DecodeResult<Vec<AccountAddress>> {
    let chunks = table.chunks_exact(ADDRESS_LENGTH);
    if !chunks.remainder().is_empty() {
        return Err(DecodeError::gap(format!(
            "address table length {} is not a multiple of {ADDRESS_LENGTH}",
            table.len()
        )));
    }
    Ok(chunks
        .map(|c| {
            let mut a = [0u8; ADDRESS_LENGTH];
            a.copy_from_slice(c);
            AccountAddress::new(a)
        })
        .collect())
}

fn decode_constants(table: &[u8]) -> DecodeResult<Vec<Constant>> {
    let mut r = ByteReader::new(table);
    let mut out = Vec::new();
    while !r.is_empty() {
        let index = out.len();
        let tag = TypeTag::read(&mut r).map_err(|e| match e {
            TagError::Unsupported(raw) => DecodeError::UnsupportedConstantType { index, raw },
            TagError::TooDeep => {
                DecodeError::TypeNestingTooDeep { index, limit: crate::types::MAX_TYPE_NESTING }
            }
            TagError::Read(what) => DecodeError::gap(format!("constant {index}: {what}")),
        })?;
        let payload = r.read_len_prefixed().map_err(|e| overrun(e, "constant", index))?;
        let value = Value::from_payload(&tag, payload)
            .map_err(|e| DecodeError::MalformedConstant { index, detail: e.to_string() })?;
        trace!(index, %tag, "constant");
        out.push(Constant::new(tag, value));
    }
    Ok(out)
}

/// Une entrée qui déborde de sa table est une faute de layout, pas un manque d'octets.
fn overrun(e: DecodeError, what: &str, index: usize) -> DecodeError {
    match e {
        DecodeError::OutOfBounds { .. } => DecodeError::gap(format!("{what} {index} runs past its table")),
        other => other,
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
