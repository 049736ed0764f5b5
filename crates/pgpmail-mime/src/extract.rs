//! Displayable body extraction.
//!
//! Two strategies sit behind [`MimeExtractor`]: a structured walk of the
//! parsed entity tree, and a heuristic scraper for mail the structured
//! parser cannot make sense of. They are tried in order; each reports an
//! explicit "no result" instead of handing back empty bodies.

use crate::encoding::{
    decode_base64_layer, decode_base64_lenient, decode_body, decode_layers,
    decode_quoted_printable,
};
use crate::entity::{Body, Entity};
use crate::error::{Error, Result};

/// Delimiter assumed when no boundary line precedes a content-type marker.
const DEFAULT_DELIMITER: &str = "\n--";

/// How many lines before a marker are searched for a boundary line.
const BOUNDARY_LOOKBACK: usize = 3;

/// Bodies extracted from a MIME message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    /// HTML body, empty if none was found.
    pub html: String,
    /// Plain-text body, empty if none was found.
    pub text: String,
}

impl Extracted {
    /// Returns true if neither body was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.html.is_empty() && self.text.is_empty()
    }

    /// Returns the body a viewer should display and whether it is HTML.
    ///
    /// HTML wins and is wrapped in a minimal document.
    #[must_use]
    pub fn into_display(self) -> (String, bool) {
        if self.html.is_empty() {
            (self.text, false)
        } else {
            (format!("<html><body>{}</body></html>", self.html), true)
        }
    }
}

/// One way of pulling bodies out of raw MIME text.
pub trait Strategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns `None` when this strategy found nothing.
    fn extract(&self, raw: &str) -> Option<Extracted>;
}

/// Walks the parsed MIME tree and classifies leaf bodies by content type.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredStrategy;

impl StructuredStrategy {
    fn walk(entity: &Entity, out: &mut Extracted) {
        match &entity.body {
            Body::Multipart(children) => {
                for child in children {
                    Self::walk(child, out);
                }
            }
            Body::Leaf(raw) => {
                let slot = if entity.is_plain_text() {
                    &mut out.text
                } else if entity.is("text", "html") {
                    &mut out.html
                } else {
                    return;
                };

                if slot.is_empty() {
                    *slot = decode_body(raw, entity.transfer_encoding)
                        .trim_end_matches(['\r', '\n'])
                        .to_string();
                }
            }
        }
    }
}

impl Strategy for StructuredStrategy {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn extract(&self, raw: &str) -> Option<Extracted> {
        let entity = match Entity::parse(raw) {
            Ok(entity) => entity,
            Err(e) => {
                tracing::debug!("Structured MIME parse failed: {e}");
                return None;
            }
        };

        let mut out = Extracted::default();
        Self::walk(&entity, &mut out);
        (!out.is_empty()).then_some(out)
    }
}

/// Scrapes bodies by searching for literal content-type markers.
///
/// Tolerates truncated and malformed mail. The boundary is guessed as the
/// nearest `--` line at most three lines above the marker, else a bare
/// `"\n--"`; nested multipart mail can pick the wrong one.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicStrategy;

impl HeuristicStrategy {
    /// Returns the raw section following `marker`, or `None`.
    fn section(raw: &str, marker: &str) -> Option<String> {
        let mut segments = raw.split(marker);
        let before = segments.next()?;
        let after = segments.next()?;

        let delimiter = guess_delimiter(before);
        let normalized = after.replace("\r\n", "\n").replace('\r', "\n");

        let start = normalized.find("\n\n")?;
        let end = normalized.find(delimiter.as_str())?;
        if end < start {
            return None;
        }

        Some(normalized[start..end].trim_matches('\n').to_string())
    }

    fn text(raw: &str) -> String {
        Self::section(raw, ": text/plain")
            .map(|section| decode_layers(&section))
            .unwrap_or_default()
    }

    fn html(raw: &str) -> String {
        Self::section(raw, ": text/html")
            .map(|section| {
                let decoded = decode_base64_lenient(&section)
                    .ok()
                    .and_then(|bytes| String::from_utf8(bytes).ok())
                    .or_else(|| decode_quoted_printable(&section).ok())
                    .unwrap_or(section);
                decode_base64_layer(&decoded).unwrap_or(decoded)
            })
            .unwrap_or_default()
    }
}

impl Strategy for HeuristicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn extract(&self, raw: &str) -> Option<Extracted> {
        let out = Extracted {
            html: Self::html(raw),
            text: Self::text(raw),
        };
        (!out.is_empty()).then_some(out)
    }
}

/// Finds the boundary line closest above a marker.
fn guess_delimiter(before_marker: &str) -> String {
    before_marker
        .split(['\r', '\n'])
        .rev()
        .take(BOUNDARY_LOOKBACK)
        .find(|line| line.starts_with("--"))
        .map_or_else(|| DEFAULT_DELIMITER.to_string(), ToString::to_string)
}

/// Ordered chain of extraction strategies.
pub struct MimeExtractor {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Default for MimeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MimeExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("MimeExtractor")
            .field("strategies", &names)
            .finish()
    }
}

impl MimeExtractor {
    /// Structured parse first, heuristic scrape second.
    #[must_use]
    pub fn new() -> Self {
        Self::with_strategies(vec![Box::new(StructuredStrategy), Box::new(HeuristicStrategy)])
    }

    /// Builds an extractor from an explicit strategy order.
    #[must_use]
    pub fn with_strategies(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    /// Extracts the HTML and plain-text bodies of `raw`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoContent`] if every strategy came up empty.
    pub fn extract(&self, raw: &str) -> Result<Extracted> {
        for strategy in &self.strategies {
            if let Some(found) = strategy.extract(raw) {
                tracing::debug!(strategy = strategy.name(), "Extracted message body");
                return Ok(found);
            }
        }
        Err(Error::NoContent)
    }
}
