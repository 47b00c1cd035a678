//! Données partagées des benchmarks.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Template de pièce Sui compilé, en base64.
pub const TEMPLATE_B64: &str = include_str!("../../crates/movetpl-module/tests/data/template_coin.b64");

/// Octets du template.
pub fn template() -> Result<Vec<u8>, base64::DecodeError> { STANDARD.decode(TEMPLATE_B64.trim()) }
