//! Système de types du pool de constantes.
//!
//! Une constante = un type tag + une charge BCS. [`Value`] est la charge
//! décodée, une variante par tag : encodage, affichage et parsing sont des
//! `match` exhaustifs.

use core::fmt;

use num_bigint::BigUint;
use thiserror::Error;

use movetpl_core::{AccountAddress, ByteReader, ByteWriter, DecodeError, DecodeResult, ADDRESS_LENGTH};

const TAG_BOOL: u8 = 0x01;
const TAG_U8: u8 = 0x02;
const TAG_U64: u8 = 0x03;
const TAG_U128: u8 = 0x04;
const TAG_ADDRESS: u8 = 0x05;
const TAG_VECTOR: u8 = 0x0A;
const TAG_U16: u8 = 0x0D;
const TAG_U32: u8 = 0x0E;
const TAG_U256: u8 = 0x0F;

/// Imbrication `vector<vector<...>>` maximale acceptée pour une constante.
pub const MAX_TYPE_NESTING: usize = 32;

/// Type d'une entrée du pool de constantes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// `bool`
    Bool,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `u128`
    U128,
    /// `u256`
    U256,
    /// `address`
    Address,
    /// `vector<T>`
    Vector(Box<TypeTag>),
}

/// Rejet d'un type tag. Le décodeur y ajoute l'indice dans le pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagError {
    /// Signature token interdit dans une constante.
    Unsupported(u8),
    /// Plus de [`MAX_TYPE_NESTING`] niveaux de vecteur.
    TooDeep,
    /// Échec de lecture.
    Read(&'static str),
}

impl TypeTag {
    /// Lit un tag (et ses tags internes pour les vecteurs).
    pub fn read(r: &mut ByteReader<'_>) -> Result<Self, TagError> {
        let mut depth = 0usize;
        loop {
            let raw = r.read_u8().map_err(|_| TagError::Read("truncated type tag"))?;
            let leaf = match raw {
                TAG_BOOL => Self::Bool,
                TAG_U8 => Self::U8,
                TAG_U16 => Self::U16,
                TAG_U32 => Self::U32,
                TAG_U64 => Self::U64,
                TAG_U128 => Self::U128,
                TAG_U256 => Self::U256,
                TAG_ADDRESS => Self::Address,
                TAG_VECTOR => {
                    depth += 1;
                    if depth > MAX_TYPE_NESTING {
                        return Err(TagError::TooDeep);
                    }
                    continue;
                }
                other => return Err(TagError::Unsupported(other)),
            };
            return Ok((0..depth).fold(leaf, |inner, _| Self::Vector(Box::new(inner))));
        }
    }

    /// Écrit les octets du tag.
    pub fn write(&self, w: &mut ByteWriter) {
        match self {
            Self::Bool => w.write_u8(TAG_BOOL),
            Self::U8 => w.write_u8(TAG_U8),
            Self::U16 => w.write_u8(TAG_U16),
            Self::U32 => w.write_u8(TAG_U32),
            Self::U64 => w.write_u8(TAG_U64),
            Self::U128 => w.write_u8(TAG_U128),
            Self::U256 => w.write_u8(TAG_U256),
            Self::Address => w.write_u8(TAG_ADDRESS),
            Self::Vector(inner) => {
                w.write_u8(TAG_VECTOR);
                inner.write(w);
            }
        }
    }

    /// Vrai pour `vector<u8>` (chaîne d'octets).
    pub fn is_byte_vector(&self) -> bool { matches!(self, Self::Vector(inner) if **inner == Self::U8) }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::U8 => f.write_str("u8"),
            Self::U16 => f.write_str("u16"),
            Self::U32 => f.write_str("u32"),
            Self::U64 => f.write_str("u64"),
            Self::U128 => f.write_str("u128"),
            Self::U256 => f.write_str("u256"),
            Self::Address => f.write_str("address"),
            Self::Vector(inner) => write!(f, "vector<{inner}>"),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for TypeTag {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> { s.collect_str(self) }
}

/// Valeur décodée d'une constante.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `bool`
    Bool(bool),
    /// `u8`
    U8(u8),
    /// `u16`
    U16(u16),
    /// `u32`
    U32(u32),
    /// `u64`
    U64(u64),
    /// `u128`
    U128(u128),
    /// `u256`, toujours < 2^256.
    U256(BigUint),
    /// `address`
    Address(AccountAddress),
    /// `vector<T>`, éléments tous du tag interne.
    Vector(Vec<Value>),
}

/// Texte hors de la grammaire d'un tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{text}` is not a valid {expected}: {reason}")]
pub struct ParseValueError {
    /// Texte refusé.
    pub text: String,
    /// Type visé.
    pub expected: String,
    /// Raison courte.
    pub reason: &'static str,
}

impl ParseValueError {
    fn new(text: &str, tag: &TypeTag, reason: &'static str) -> Self {
        Self { text: text.to_string(), expected: tag.to_string(), reason }
    }
}

impl Value {
    /// Décode une valeur BCS de type `tag`.
    pub fn read(tag: &TypeTag, r: &mut ByteReader<'_>) -> DecodeResult<Self> {
        Ok(match tag {
            TypeTag::Bool => match r.read_u8()? {
                0 => Self::Bool(false),
                1 => Self::Bool(true),
                // l'indice réel est posé par le décodeur du pool
                other => {
                    return Err(DecodeError::MalformedConstant {
                        index: 0,
                        detail: format!("bool byte {other}"),
                    })
                }
            },
            TypeTag::U8 => Self::U8(r.read_u8()?),
            TypeTag::U16 => Self::U16(r.read_u16_le()?),
            TypeTag::U32 => Self::U32(r.read_u32_le()?),
            TypeTag::U64 => Self::U64(r.read_u64_le()?),
            TypeTag::U128 => Self::U128(r.read_u128_le()?),
            TypeTag::U256 => Self::U256(BigUint::from_bytes_le(&r.read_fixed::<32>()?)),
            TypeTag::Address => Self::Address(AccountAddress::new(r.read_fixed::<ADDRESS_LENGTH>()?)),
            TypeTag::Vector(inner) => {
                let count = r.read_len()?;
                let mut items = Vec::with_capacity(count.min(r.remaining()));
                for _ in 0..count {
                    items.push(Self::read(inner, r)?);
                }
                Self::Vector(items)
            }
        })
    }

    /// Décode une charge entière ; tous les octets doivent être consommés.
    pub fn from_payload(tag: &TypeTag, payload: &[u8]) -> DecodeResult<Self> {
        let mut r = ByteReader::new(payload);
        let v = Self::read(tag, &mut r)?;
        if !r.is_empty() {
            return Err(DecodeError::gap(format!("{} unread payload bytes", r.remaining())));
        }
        Ok(v)
    }

    /// Encode en BCS.
    pub fn write(&self, w: &mut ByteWriter) {
        match self {
            Self::Bool(b) => w.write_u8(u8::from(*b)),
            Self::U8(v) => w.write_u8(*v),
            Self::U16(v) => w.write_u16_le(*v),
            Self::U32(v) => w.write_u32_le(*v),
            Self::U64(v) => w.write_u64_le(*v),
            Self::U128(v) => w.write_u128_le(*v),
            Self::U256(v) => {
                let mut bytes = v.to_bytes_le();
                bytes.resize(32, 0);
                w.write_bytes(&bytes);
            }
            Self::Address(a) => w.write_bytes(a.as_bytes()),
            Self::Vector(items) => {
                w.write_uleb128(items.len() as u64);
                for item in items {
                    item.write(w);
                }
            }
        }
    }

    /// Octets BCS de la valeur.
    pub fn to_payload(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        self.write(&mut w);
        w.into_vec()
    }

    /// Forme lisible, inverse de [`Value::parse`].
    pub fn display(&self, tag: &TypeTag) -> String { self.render(tag, false) }

    fn render(&self, tag: &TypeTag, nested: bool) -> String {
        match (self, tag) {
            (Self::Bool(b), _) => b.to_string(),
            (Self::U8(v), _) => v.to_string(),
            (Self::U16(v), _) => v.to_string(),
            (Self::U32(v), _) => v.to_string(),
            (Self::U64(v), _) => v.to_string(),
            (Self::U128(v), _) => v.to_string(),
            (Self::U256(v), _) => v.to_string(),
            (Self::Address(a), _) => a.to_string(),
            (Self::Vector(items), TypeTag::Vector(inner)) if **inner == TypeTag::U8 => {
                let bytes = byte_elements(items);
                match core::str::from_utf8(&bytes) {
                    Ok(text) if !nested && !is_hex_literal(text) => text.to_string(),
                    _ => format!("0x{}", hex::encode(&bytes)),
                }
            }
            (Self::Vector(items), TypeTag::Vector(inner)) => {
                let parts: Vec<String> = items.iter().map(|v| v.render(inner, true)).collect();
                format!("[{}]", parts.join(", "))
            }
            // valeur et tag vont toujours ensemble ; branche gardée pour un match total
            (Self::Vector(items), _) => format!("[{} items]", items.len()),
        }
    }

    /// Parse `text` selon la grammaire de `tag`.
    pub fn parse(tag: &TypeTag, text: &str) -> Result<Self, ParseValueError> { Self::parse_inner(tag, text, false) }

    fn parse_inner(tag: &TypeTag, text: &str, nested: bool) -> Result<Self, ParseValueError> {
        let err = |reason| ParseValueError::new(text, tag, reason);
        match tag {
            TypeTag::Bool => match text {
                "true" => Ok(Self::Bool(true)),
                "false" => Ok(Self::Bool(false)),
                _ => Err(err("expected `true` or `false`")),
            },
            TypeTag::U8 => decimal(text).and_then(|d| d.parse().ok()).map(Self::U8).ok_or_else(|| err(OUT_OF_RANGE)),
            TypeTag::U16 => decimal(text).and_then(|d| d.parse().ok()).map(Self::U16).ok_or_else(|| err(OUT_OF_RANGE)),
            TypeTag::U32 => decimal(text).and_then(|d| d.parse().ok()).map(Self::U32).ok_or_else(|| err(OUT_OF_RANGE)),
            TypeTag::U64 => decimal(text).and_then(|d| d.parse().ok()).map(Self::U64).ok_or_else(|| err(OUT_OF_RANGE)),
            TypeTag::U128 => decimal(text).and_then(|d| d.parse().ok()).map(Self::U128).ok_or_else(|| err(OUT_OF_RANGE)),
            TypeTag::U256 => decimal(text)
                .and_then(|d| BigUint::parse_bytes(d.as_bytes(), 10))
                .filter(|n| n.bits() <= 256)
                .map(Self::U256)
                .ok_or_else(|| err(OUT_OF_RANGE)),
            TypeTag::Address => AccountAddress::from_hex_literal(text)
                .map(Self::Address)
                .map_err(|_| err("expected 64 hex digits, optionally prefixed by 0x")),
            TypeTag::Vector(inner) if **inner == TypeTag::U8 => {
                let bytes = if is_hex_literal(text) {
                    hex::decode(&text[2..]).map_err(|_| err("bad hex"))?
                } else if nested && text.contains([',', '[', ']']) {
                    return Err(err("list elements must be 0x-hex or plain text"));
                } else {
                    text.as_bytes().to_vec()
                };
                Ok(Self::Vector(bytes.into_iter().map(Self::U8).collect()))
            }
            TypeTag::Vector(inner) => {
                let body = text
                    .trim()
                    .strip_prefix('[')
                    .and_then(|s| s.strip_suffix(']'))
                    .ok_or_else(|| err("expected a bracketed list"))?;
                let items = split_top_level(body)
                    .ok_or_else(|| err("unbalanced brackets"))?
                    .into_iter()
                    .map(|item| Self::parse_inner(inner, item.trim(), true))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Vector(items))
            }
        }
    }
}

const OUT_OF_RANGE: &str = "expected decimal digits within the type's range";

fn decimal(text: &str) -> Option<&str> {
    (!text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())).then_some(text)
}

/// `0x` suivi d'un nombre pair de chiffres hexa (éventuellement aucun).
fn is_hex_literal(text: &str) -> bool {
    text.strip_prefix("0x")
        .is_some_and(|d| d.len() % 2 == 0 && d.bytes().all(|b| b.is_ascii_hexdigit()))
}

fn byte_elements(items: &[Value]) -> Vec<u8> {
    items
        .iter()
        .filter_map(|v| match v {
            Value::U8(b) => Some(*b),
            _ => None,
        })
        .collect()
}

/// Coupe sur les virgules hors crochets. `None` si les crochets ne sont pas équilibrés.
fn split_top_level(body: &str) -> Option<Vec<&str>> {
    if body.trim().is_empty() {
        return Some(Vec::new());
    }
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    parts.push(&body[start..]);
    Some(parts)
}
