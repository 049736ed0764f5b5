//! # pgpmail-mime
//!
//! MIME parsing and display-content extraction for retrieved mail.
//!
//! ## Features
//!
//! - **Entity tree**: Parse nested multipart messages into an [`Entity`] tree
//! - **Encoding/Decoding**: Base64, Quoted-Printable, RFC 2047 header encoding
//! - **Extraction**: Pull the best HTML and plain-text bodies out of a message,
//!   falling back to a tolerant heuristic scan for malformed mail
//!
//! ## Quick Start
//!
//! ```ignore
//! use pgpmail_mime::MimeExtractor;
//!
//! let raw = "Content-Type: text/plain\r\n\r\nHello, World!";
//!
//! let extracted = MimeExtractor::new().extract(raw)?;
//! let (content, is_html) = extracted.into_display();
//! assert!(!is_html);
//! assert_eq!(content, "Hello, World!");
//! ```
//!
//! ### Encoding/Decoding
//!
//! ```ignore
//! use pgpmail_mime::encoding::{decode_layers, encode_rfc2047};
//!
//! // Quoted-Printable wrapping Base64, as some clients emit
//! let text = decode_layers("SGVs=\r\nbG8=");
//!
//! // RFC 2047 header encoding
//! let subject = encode_rfc2047("Héllo", "utf-8");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod entity;
mod error;
mod header;

pub mod encoding;
pub mod extract;

pub use content_type::ContentType;
pub use encoding::TransferEncoding;
pub use entity::{Body, Entity};
pub use error::{Error, Result};
pub use extract::{Extracted, HeuristicStrategy, MimeExtractor, Strategy, StructuredStrategy};
pub use header::Headers;
