//! Transfer encoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 header encoding, plus the
//! layered body decoding used when extracting displayable content.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes strict Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Decodes Base64 after discarding every character outside the alphabet.
///
/// # Errors
///
/// Returns an error if what remains is not valid Base64.
pub fn decode_base64_lenient(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .collect();
    decode_base64(&cleaned)
}

/// Maximum line length for Quoted-Printable encoding.
const MAX_LINE_LENGTH: usize = 76;

/// Encodes text using Quoted-Printable encoding (RFC 2045).
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut result = String::new();
    let mut line_length = 0;

    for byte in text.as_bytes() {
        if line_length >= MAX_LINE_LENGTH - 3 {
            result.push_str("=\r\n");
            line_length = 0;
        }

        match byte {
            b'!'..=b'<' | b'>'..=b'~' | b' ' => {
                result.push(*byte as char);
                line_length += 1;
            }
            _ => {
                result.push('=');
                let _ = write!(result, "{byte:02X}");
                line_length += 3;
            }
        }
    }

    result
}

/// Decodes Quoted-Printable text (RFC 2045).
///
/// Works on bytes so that already-decoded UTF-8 passes through untouched.
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences or the
/// decoded bytes are not UTF-8.
pub fn decode_quoted_printable(text: &str) -> Result<String> {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'=' {
            result.push(bytes[i]);
            i += 1;
            continue;
        }

        match bytes.get(i + 1..) {
            Some([b'\r', b'\n', ..]) => i += 3,
            Some([b'\n', ..]) => i += 2,
            Some([hi, lo, ..]) => {
                let hex = [*hi, *lo];
                let byte = std::str::from_utf8(&hex)
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| {
                        Error::InvalidEncoding(format!(
                            "Invalid hex escape at byte {i}: ={}{}",
                            *hi as char, *lo as char
                        ))
                    })?;
                result.push(byte);
                i += 3;
            }
            _ => {
                return Err(Error::InvalidEncoding(
                    "Incomplete escape sequence".to_string(),
                ));
            }
        }
    }

    String::from_utf8(result).map_err(Into::into)
}

/// Content-Transfer-Encoding of a MIME entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferEncoding {
    /// 7-bit ASCII, the default when no header is present.
    #[default]
    SevenBit,
    /// 8-bit text.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses a `Content-Transfer-Encoding` header value.
    ///
    /// Unknown values read as 7-bit.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }
}

/// Decodes a leaf body according to its declared transfer encoding, then
/// unwraps an inner Base64 layer if one is present.
///
/// A body that fails its declared decoding is kept as-is.
#[must_use]
pub fn decode_body(raw: &str, encoding: TransferEncoding) -> String {
    let unwrapped = match encoding {
        TransferEncoding::QuotedPrintable => {
            decode_quoted_printable(raw).unwrap_or_else(|_| raw.to_string())
        }
        TransferEncoding::Base64 => decode_base64_lenient(raw).map_or_else(
            |_| raw.to_string(),
            |bytes| String::from_utf8_lossy(&bytes).into_owned(),
        ),
        TransferEncoding::SevenBit | TransferEncoding::EightBit | TransferEncoding::Binary => {
            raw.to_string()
        }
    };
    decode_base64_layer(&unwrapped).unwrap_or(unwrapped)
}

/// Attempts to read `text` as an inner Base64 layer.
///
/// Line breaks are removed before decoding. Returns `None` when the text is
/// not strict Base64 or does not decode to UTF-8.
#[must_use]
pub fn decode_base64_layer(text: &str) -> Option<String> {
    let joined: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    if joined.is_empty() {
        return None;
    }
    let bytes = decode_base64(&joined).ok()?;
    String::from_utf8(bytes).ok()
}

/// Decodes a body that may carry a Quoted-Printable layer wrapping a
/// Base64 layer.
///
/// Quoted-Printable failures fall back to the raw text; a Base64 layer is
/// only unwrapped when it decodes to UTF-8.
#[must_use]
pub fn decode_layers(raw: &str) -> String {
    let unwrapped = decode_quoted_printable(raw).unwrap_or_else(|_| raw.to_string());
    decode_base64_layer(&unwrapped).unwrap_or(unwrapped)
}

/// Encodes a header value using RFC 2047 encoding.
///
/// Format: `=?charset?B?encoded-text?=`. ASCII values are returned as-is.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if text.chars().all(|c| c.is_ascii() && c != '=' && c != '?') {
        return text.to_string();
    }

    let encoded = encode_base64(text.as_bytes());
    format!("=?{charset}?B?{encoded}?=")
}
