//! Structured MIME entity tree.

use crate::content_type::ContentType;
use crate::encoding::TransferEncoding;
use crate::error::{Error, Result};
use crate::header::Headers;

/// Deepest multipart nesting accepted by the parser.
const MAX_DEPTH: usize = 32;

/// Body of a MIME entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Undecoded leaf content.
    Leaf(String),
    /// Child entities of a multipart container, in order.
    Multipart(Vec<Entity>),
}

/// A parsed MIME entity: headers plus a leaf body or child entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Declared content type, if any was present and well-formed.
    pub content_type: Option<ContentType>,
    /// Declared transfer encoding, 7-bit when absent.
    pub transfer_encoding: TransferEncoding,
    /// Entity body.
    pub body: Body,
}

impl Entity {
    /// Parses raw MIME text into an entity tree.
    ///
    /// Child parts that fail to parse are skipped rather than failing the
    /// whole message.
    ///
    /// # Errors
    ///
    /// Returns an error if a multipart container has no boundary parameter,
    /// its body contains no delimiter line, or nesting is too deep.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::parse_at_depth(raw, 0)
    }

    fn parse_at_depth(raw: &str, depth: usize) -> Result<Self> {
        if depth > MAX_DEPTH {
            return Err(Error::InvalidMultipart("nesting too deep".to_string()));
        }

        let (header_text, body) = split_headers_body(raw);
        let headers = Headers::parse(header_text);
        let content_type = headers
            .get("content-type")
            .and_then(|value| ContentType::parse(value).ok());
        let transfer_encoding = headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse);

        let Some(ct) = content_type.as_ref().filter(|ct| ct.is_multipart()) else {
            return Ok(Self {
                content_type,
                transfer_encoding,
                body: Body::Leaf(body.to_string()),
            });
        };

        let boundary = ct.boundary().ok_or(Error::MissingBoundary)?;
        let children = split_multipart(body, boundary)?
            .into_iter()
            .filter_map(|part| match Self::parse_at_depth(part, depth + 1) {
                Ok(child) => Some(child),
                Err(e) => {
                    tracing::debug!("Skipping unparsable MIME part: {e}");
                    None
                }
            })
            .collect();

        Ok(Self {
            content_type,
            transfer_encoding,
            body: Body::Multipart(children),
        })
    }

    /// Returns true if the declared content type is `main/sub`.
    #[must_use]
    pub fn is(&self, main: &str, sub: &str) -> bool {
        self.content_type.as_ref().is_some_and(|ct| ct.is(main, sub))
    }

    /// Returns true for `text/plain`, including entities whose content type
    /// is missing or malformed (RFC 2045 default).
    #[must_use]
    pub fn is_plain_text(&self) -> bool {
        self.content_type
            .as_ref()
            .is_none_or(|ct| ct.is("text", "plain"))
    }
}

/// Splits an entity into its header block and body at the first blank line.
fn split_headers_body(message: &str) -> (&str, &str) {
    if let Some(idx) = message.find("\r\n\r\n") {
        let lf = message.find("\n\n").filter(|&lf| lf < idx);
        match lf {
            Some(lf) => (&message[..lf], &message[lf + 2..]),
            None => (&message[..idx], &message[idx + 4..]),
        }
    } else if let Some(idx) = message.find("\n\n") {
        (&message[..idx], &message[idx + 2..])
    } else {
        (message, "")
    }
}

/// Splits a multipart body into the raw text of its parts.
///
/// The preamble and epilogue are discarded. A missing close delimiter is
/// tolerated: the last part then runs to the end of the body.
fn split_multipart<'a>(body: &'a str, boundary: &str) -> Result<Vec<&'a str>> {
    let open = format!("--{boundary}");
    let close = format!("--{boundary}--");

    let mut parts = Vec::new();
    let mut part_start: Option<usize> = None;
    let mut seen_delimiter = false;
    let mut closed = false;
    let mut offset = 0;

    for line in body.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == open || trimmed == close {
            seen_delimiter = true;
            if let Some(start) = part_start.take() {
                parts.push(strip_line_ending(&body[start..offset]));
            }
            if trimmed == close {
                closed = true;
                break;
            }
            part_start = Some(offset + line.len());
        }
        offset += line.len();
    }

    if !seen_delimiter {
        return Err(Error::InvalidMultipart(format!(
            "no delimiter for boundary {boundary}"
        )));
    }

    if !closed
        && let Some(start) = part_start
        && start < body.len()
    {
        parts.push(&body[start..]);
    }

    Ok(parts)
}

/// Drops the line break that belongs to the following delimiter.
fn strip_line_ending(part: &str) -> &str {
    part.strip_suffix("\r\n")
        .or_else(|| part.strip_suffix('\n'))
        .unwrap_or(part)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn leaf(entity: &Entity) -> &str {
        match &entity.body {
            Body::Leaf(text) => text,
            Body::Multipart(_) => panic!("expected leaf"),
        }
    }

    fn children(entity: &Entity) -> &[Entity] {
        match &entity.body {
            Body::Multipart(children) => children,
            Body::Leaf(_) => panic!("expected multipart"),
        }
    }

    #[test]
    fn test_records_transfer_encoding() {
        let entity = Entity::parse(
            "Content-Type: text/plain\r\nContent-Transfer-Encoding: Base64\r\n\r\nSGk=",
        )
        .unwrap();
        assert_eq!(entity.transfer_encoding, TransferEncoding::Base64);

        let plain = Entity::parse("Subject: hi\n\nbody").unwrap();
        assert_eq!(plain.transfer_encoding, TransferEncoding::SevenBit);
    }

    #[test]
    fn test_missing_or_malformed_type_is_plain_text() {
        assert!(Entity::parse("Subject: hi\n\nbody").unwrap().is_plain_text());
        assert!(
            Entity::parse("Content-Type: garbage\n\nbody")
                .unwrap()
                .is_plain_text()
        );
        assert!(
            !Entity::parse("Content-Type: text/html\n\n<p>x</p>")
                .unwrap()
                .is_plain_text()
        );
    }

    #[test]
    fn test_parse_single_part() {
        let entity = Entity::parse("Content-Type: text/plain\r\n\r\nHello, World!").unwrap();
        assert!(entity.is("text", "plain"));
        assert_eq!(leaf(&entity), "Hello, World!");
    }

    #[test]
    fn test_parse_without_content_type() {
        let entity = Entity::parse("Subject: hi\n\nbody").unwrap();
        assert!(entity.content_type.is_none());
        assert_eq!(leaf(&entity), "body");
    }

    #[test]
    fn test_parse_nested_multipart() {
        let raw = concat!(
            "Content-Type: multipart/mixed; boundary=outer\r\n",
            "\r\n",
            "preamble\r\n",
            "--outer\r\n",
            "Content-Type: multipart/alternative; boundary=inner\r\n",
            "\r\n",
            "--inner\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "plain body\r\n",
            "--inner\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<p>html body</p>\r\n",
            "--inner--\r\n",
            "--outer\r\n",
            "Content-Type: application/pdf\r\n",
            "\r\n",
            "JVBERi0=\r\n",
            "--outer--\r\n",
            "epilogue\r\n"
        );

        let entity = Entity::parse(raw).unwrap();
        let outer = children(&entity);
        assert_eq!(outer.len(), 2);
        assert!(outer[0].is("multipart", "alternative"));
        assert!(outer[1].is("application", "pdf"));

        let inner = children(&outer[0]);
        assert_eq!(leaf(&inner[0]), "plain body");
        assert_eq!(leaf(&inner[1]), "<p>html body</p>");
    }

    #[test]
    fn test_parse_unterminated_multipart() {
        let raw =
            "Content-Type: multipart/mixed; boundary=b\n\n--b\nContent-Type: text/plain\n\npartial";
        let entity = Entity::parse(raw).unwrap();
        assert_eq!(leaf(&children(&entity)[0]), "partial");
    }

    #[test]
    fn test_parse_missing_boundary() {
        let err = Entity::parse("Content-Type: multipart/mixed\n\nbody").unwrap_err();
        assert!(matches!(err, Error::MissingBoundary));
    }

    #[test]
    fn test_parse_boundary_never_used() {
        let err = Entity::parse("Content-Type: multipart/mixed; boundary=x\n\nbody").unwrap_err();
        assert!(matches!(err, Error::InvalidMultipart(_)));
    }
}
