//! Curseurs binaires : lecture bornée et écriture dans un buffer extensible.
//!
//! Les entiers de taille fixe sont little-endian, les longueurs et compteurs
//! sont en ULEB128 canonique.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{DecodeError, DecodeResult};

/* ─────────────────────────── Byte Writer ─────────────────────────── */

/// Buffer d'écriture (croît automatiquement, aucune écriture ne peut échouer).
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Crée un writer vide.
    pub const fn new() -> Self { Self { buf: Vec::new() } }
    /// Crée un writer avec une capacité initiale.
    pub fn with_capacity(cap: usize) -> Self { Self { buf: Vec::with_capacity(cap) } }
    /// Octets écrits jusqu'ici.
    pub fn len(&self) -> usize { self.buf.len() }
    /// Vrai si rien n'a été écrit.
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }
    /// Accès en lecture au contenu.
    pub fn as_slice(&self) -> &[u8] { &self.buf }
    /// Récupère le buffer (consomme).
    pub fn into_vec(self) -> Vec<u8> { self.buf }

    /// Écrit un octet.
    pub fn write_u8(&mut self, v: u8) { self.buf.push(v); }
    /// Ajoute des octets bruts.
    pub fn write_bytes(&mut self, bytes: &[u8]) { self.buf.extend_from_slice(bytes); }

    /// Écrit un u16 little-endian.
    pub fn write_u16_le(&mut self, v: u16) {
        let mut b = [0u8; 2];
        LittleEndian::write_u16(&mut b, v);
        self.write_bytes(&b);
    }
    /// Écrit un u32 little-endian.
    pub fn write_u32_le(&mut self, v: u32) {
        let mut b = [0u8; 4];
        LittleEndian::write_u32(&mut b, v);
        self.write_bytes(&b);
    }
    /// Écrit un u64 little-endian.
    pub fn write_u64_le(&mut self, v: u64) {
        let mut b = [0u8; 8];
        LittleEndian::write_u64(&mut b, v);
        self.write_bytes(&b);
    }
    /// Écrit un u128 little-endian.
    pub fn write_u128_le(&mut self, v: u128) {
        let mut b = [0u8; 16];
        LittleEndian::write_u128(&mut b, v);
        self.write_bytes(&b);
    }

    /// Écrit un entier en ULEB128 (forme canonique, la plus courte).
    pub fn write_uleb128(&mut self, mut v: u64) {
        while v >= 0x80 {
            self.buf.push((v as u8 & 0x7F) | 0x80);
            v >>= 7;
        }
        self.buf.push(v as u8);
    }

    /// Écrit un préfixe de longueur ULEB128 puis les octets.
    pub fn write_len_prefixed(&mut self, bytes: &[u8]) {
        self.write_uleb128(bytes.len() as u64);
        self.write_bytes(bytes);
    }
}

/// Taille en octets de `v` une fois encodé en ULEB128.
pub const fn uleb128_len(mut v: u64) -> usize {
    let mut n = 1;
    while v >= 0x80 {
        v >>= 7;
        n += 1;
    }
    n
}

/* ─────────────────────────── Byte Reader ─────────────────────────── */

/// Lecteur séquentiel sur un slice d'octets.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    off: usize,
}

impl<'a> ByteReader<'a> {
    /// Construit un lecteur.
    pub const fn new(data: &'a [u8]) -> Self { Self { data, off: 0 } }
    /// Offset courant.
    pub const fn offset(&self) -> usize { self.off }
    /// Taille restante.
    pub const fn remaining(&self) -> usize { self.data.len().saturating_sub(self.off) }
    /// Vrai si tout a été consommé.
    pub const fn is_empty(&self) -> bool { self.remaining() == 0 }

    /// Lit `n` octets (ou `OutOfBounds`).
    pub fn read_bytes(&mut self, n: usize) -> DecodeResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(DecodeError::OutOfBounds { needed: n, at: self.off, remaining: self.remaining() });
        }
        let start = self.off;
        self.off += n;
        Ok(&self.data[start..self.off])
    }

    /// Lit exactement `N` octets dans un tableau.
    pub fn read_fixed<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let b = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(b);
        Ok(out)
    }

    /// Lit un octet.
    pub fn read_u8(&mut self) -> DecodeResult<u8> { Ok(self.read_bytes(1)?[0]) }

    /// Lit un u16 LE.
    pub fn read_u16_le(&mut self) -> DecodeResult<u16> { Ok(LittleEndian::read_u16(self.read_bytes(2)?)) }

    /// Lit un u32 LE.
    pub fn read_u32_le(&mut self) -> DecodeResult<u32> { Ok(LittleEndian::read_u32(self.read_bytes(4)?)) }

    /// Lit un u64 LE.
    pub fn read_u64_le(&mut self) -> DecodeResult<u64> { Ok(LittleEndian::read_u64(self.read_bytes(8)?)) }

    /// Lit un u128 LE.
    pub fn read_u128_le(&mut self) -> DecodeResult<u128> { Ok(LittleEndian::read_u128(self.read_bytes(16)?)) }

    /// Lit un ULEB128 sur 64 bits.
    ///
    /// Refuse les encodages non canoniques (groupe final nul) et les
    /// débordements : l'écrivain ne produit que la forme canonique, c'est ce
    /// qui garantit l'identité octet à octet au ré-encodage.
    pub fn read_uleb128_u64(&mut self) -> DecodeResult<u64> {
        let start = self.off;
        let mut value: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = self.read_u8()?;
            let digit = u64::from(byte & 0x7F);
            if shift == 63 && digit > 1 {
                return Err(DecodeError::MalformedUleb128 { at: start });
            }
            value |= digit << shift;
            if byte & 0x80 == 0 {
                if shift > 0 && digit == 0 {
                    return Err(DecodeError::MalformedUleb128 { at: start });
                }
                return Ok(value);
            }
            shift += 7;
            if shift > 63 {
                return Err(DecodeError::MalformedUleb128 { at: start });
            }
        }
    }

    /// Lit un ULEB128 qui doit tenir sur 32 bits.
    pub fn read_uleb128_u32(&mut self) -> DecodeResult<u32> {
        let start = self.off;
        let v = self.read_uleb128_u64()?;
        u32::try_from(v).map_err(|_| DecodeError::MalformedUleb128 { at: start })
    }

    /// Lit une longueur ULEB128 (u32) convertie en `usize`.
    pub fn read_len(&mut self) -> DecodeResult<usize> { Ok(self.read_uleb128_u32()? as usize) }

    /// Lit une longueur ULEB128 puis autant d'octets.
    pub fn read_len_prefixed(&mut self) -> DecodeResult<&'a [u8]> {
        let n = self.read_len()?;
        self.read_bytes(n)
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */
