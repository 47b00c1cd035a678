//! Encodeur.
//!
//! Les tables sont écrites dans l'ordre de layout vu au décodage ; les
//! offsets sont recalculés en somme courante des longueurs actuelles ; le
//! répertoire garde son ordre d'entrées d'origine.

use std::borrow::Cow;

use tracing::{debug, info};

use movetpl_core::{ByteWriter, TableKind, MOVE_MAGIC, HEADER_SIZE};

use crate::{
    error::EncodeError,
    module::{Module, TableEntry},
};

impl Module {
    fn table_bytes(&self, kind: TableKind) -> Cow<'_, [u8]> {
        match kind {
            TableKind::Identifiers => {
                let mut w = ByteWriter::new();
                for s in &self.identifiers {
                    w.write_len_prefixed(s.as_bytes());
                }
                Cow::Owned(w.into_vec())
            }
            TableKind::AddressIdentifiers => {
                Cow::Owned(self.address_identifiers.iter().flat_map(|a| *a.as_bytes()).collect())
            }
            TableKind::ConstantPool => {
                let mut w = ByteWriter::new();
                for c in &self.constants {
                    c.type_tag().write(&mut w);
                    w.write_len_prefixed(&c.payload());
                }
                Cow::Owned(w.into_vec())
            }
            other => Cow::Borrowed(self.opaque.get(&other).map_or(&[][..], Vec::as_slice)),
        }
    }

    /// Tables actuelles dans l'ordre de layout, avec leurs entrées recalculées.
    fn laid_out(&self) -> Result<Vec<(TableEntry, Cow<'_, [u8]>)>, EncodeError> {
        let mut running = 0usize;
        let mut out = Vec::with_capacity(self.layout.len());
        for &kind in &self.layout {
            let bytes = self.table_bytes(kind);
            let too_large = |len| EncodeError::TableTooLarge { kind, len };
            let offset = u32::try_from(running).map_err(|_| too_large(running))?;
            let length = u32::try_from(bytes.len()).map_err(|_| too_large(bytes.len()))?;
            running = running.checked_add(bytes.len()).ok_or_else(|| too_large(usize::MAX))?;
            out.push((TableEntry { kind, offset, length }, bytes));
        }
        Ok(out)
    }

    /// Répertoire que l'encodeur écrirait, dans l'ordre du répertoire.
    pub fn directory(&self) -> Result<Vec<TableEntry>, EncodeError> {
        let laid = self.laid_out()?;
        self.directory
            .iter()
            .map(|kind| {
                laid.iter().find(|(e, _)| e.kind == *kind).map(|(e, _)| *e).ok_or_else(|| {
                    EncodeError::InvariantViolation { detail: format!("{kind} listed but not laid out") }
                })
            })
            .collect()
    }

    /// Sérialise le module.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let laid = self.laid_out()?;
        let directory = self.directory()?;
        let area: usize = laid.iter().map(|(_, b)| b.len()).sum();

        let mut w = ByteWriter::with_capacity(HEADER_SIZE + directory.len() * 7 + area + 5);
        w.write_bytes(&MOVE_MAGIC);
        w.write_u32_le(self.header.raw());
        w.write_uleb128(directory.len() as u64);
        for e in &directory {
            w.write_u8(e.kind.to_byte());
            w.write_uleb128(u64::from(e.offset));
            w.write_uleb128(u64::from(e.length));
        }
        for (_, bytes) in &laid {
            w.write_bytes(bytes);
        }
        if let Some(handle) = self.self_handle {
            w.write_uleb128(u64::from(handle));
        }
        debug!(len = w.len(), tables = directory.len(), "module encoded");
        Ok(w.into_vec())
    }

    /// [`Module::to_bytes`], puis redécode la sortie et la compare à `self`.
    pub fn encode_checked(&self) -> Result<Vec<u8>, EncodeError> {
        let bytes = self.to_bytes()?;
        let back = Self::from_bytes(&bytes)
            .map_err(|e| EncodeError::InvariantViolation { detail: format!("output does not decode: {e}") })?;
        if back != *self {
            return Err(EncodeError::InvariantViolation { detail: first_difference(self, &back) });
        }
        info!(len = bytes.len(), "encode verified");
        Ok(bytes)
    }
}

fn first_difference(a: &Module, b: &Module) -> String {
    if a.header != b.header {
        return format!("header {:?} became {:?}", a.header, b.header);
    }
    if a.directory != b.directory || a.layout != b.layout {
        return "table order changed".into();
    }
    if a.identifiers != b.identifiers {
        return "identifiers changed".into();
    }
    if a.address_identifiers != b.address_identifiers {
        return "address identifiers changed".into();
    }
    if let Some(i) = (0..a.constants.len()).find(|&i| a.constants.get(i) != b.constants.get(i)) {
        return format!("constant {i} changed");
    }
    if a.constants.len() != b.constants.len() {
        return "constant count changed".into();
    }
    if a.opaque != b.opaque {
        return "opaque table changed".into();
    }
    "self handle changed".into()
}
