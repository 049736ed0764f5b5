//! Message domain types.

use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Body shown when a message is encrypted and no usable private key is set.
pub const KEY_UNAVAILABLE_TEXT: &str =
    "Unable to decrypt this message. You need to set up your PGP private key from the settings.";

/// Body shown when content could not be produced at all.
pub const UNABLE_TO_LOAD_TEXT: &str = "Unable to load content.";

bitflags! {
    /// Message flag bitmask.
    ///
    /// Bit values match the wire encoding used by the mail transport.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MessageFlags: u32 {
        /// Message has been read.
        const SEEN = 1 << 0;
        /// Message has been answered.
        const ANSWERED = 1 << 1;
        /// Message is flagged for attention.
        const FLAGGED = 1 << 2;
        /// Message is marked for deletion.
        const DELETED = 1 << 3;
        /// Message is a draft.
        const DRAFT = 1 << 4;
        /// A read receipt was sent.
        const MDN_SENT = 1 << 5;
        /// Message has been forwarded.
        const FORWARDED = 1 << 6;
        /// Message is queued for submission.
        const SUBMIT_PENDING = 1 << 7;
        /// Message has been submitted.
        const SUBMITTED = 1 << 8;
    }
}

impl Serialize for MessageFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MessageFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(Self::from_bits_retain)
    }
}

/// Direction of a flag change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagAction {
    /// Set the flags.
    Add,
    /// Clear the flags.
    Remove,
}

impl FlagAction {
    /// Applies this change to a local flag set.
    pub fn apply(self, flags: &mut MessageFlags, change: MessageFlags) {
        match self {
            Self::Add => flags.insert(change),
            Self::Remove => flags.remove(change),
        }
    }
}

/// A display name plus address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    /// Display name, possibly empty.
    pub name: String,
    /// Address.
    pub email: String,
}

impl Mailbox {
    /// Creates a mailbox.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Creates a mailbox from a sender display name, undoing `" at "`
    /// address obfuscation.
    #[must_use]
    pub fn from_display(name: &str, email: impl Into<String>) -> Self {
        Self::new(deobfuscate(name), email)
    }

    /// Name if present, otherwise the address.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

/// Rewrites `"user at example.com"` to `"user@example.com"`.
#[must_use]
pub fn deobfuscate(text: &str) -> String {
    text.replace(" at ", "@")
}

/// Extracts the `mailto:` target from a `List-Unsubscribe` header.
///
/// Returns the text after the first `mailto:` up to the next `>`, or an
/// empty string when either is missing.
#[must_use]
pub fn parse_unsubscribe_mailto(header: &str) -> String {
    header
        .split_once("mailto:")
        .and_then(|(_, rest)| rest.split_once('>'))
        .map(|(link, _)| link.to_string())
        .unwrap_or_default()
}

/// Header-level view of a message in a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    /// Identifier, unique within its folder.
    pub id: u32,
    /// Flag bitmask.
    pub flags: MessageFlags,
    /// Send timestamp.
    pub send_date: DateTime<Utc>,
    /// Sender.
    pub from: Mailbox,
    /// Primary recipients.
    pub to: Vec<Mailbox>,
    /// Carbon-copy recipients.
    pub cc: Vec<Mailbox>,
    /// Blind carbon-copy recipients.
    pub bcc: Vec<Mailbox>,
    /// Subject line.
    pub subject: String,
    /// Unsubscribe address, empty if the sender offers none.
    #[serde(default)]
    pub unsubscribe: String,
}

impl MessageSummary {
    /// Returns true if the message is marked for deletion.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.flags.contains(MessageFlags::DELETED)
    }

    /// Returns true if the message has been read.
    #[must_use]
    pub const fn is_seen(&self) -> bool {
        self.flags.contains(MessageFlags::SEEN)
    }

    /// Returns true if the message is flagged.
    #[must_use]
    pub const fn is_flagged(&self) -> bool {
        self.flags.contains(MessageFlags::FLAGGED)
    }

    /// Returns true if the sender offers a mail-to unsubscribe address.
    #[must_use]
    pub fn can_unsubscribe(&self) -> bool {
        !self.unsubscribe.is_empty()
    }
}

/// Displayable body of a message.
///
/// Empty `content` means the rendering failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedContent {
    /// Message identifier.
    pub id: u32,
    /// Whether the message arrived PGP-encrypted.
    pub encrypted: bool,
    /// Body text or HTML document.
    pub content: String,
    /// Whether `content` is HTML.
    #[serde(rename = "isHTML")]
    pub is_html: bool,
}

impl RenderedContent {
    /// Placeholder for encrypted mail when no usable private key is set.
    #[must_use]
    pub fn key_unavailable(id: u32) -> Self {
        Self {
            id,
            encrypted: true,
            content: KEY_UNAVAILABLE_TEXT.to_string(),
            is_html: false,
        }
    }

    /// Static rendering shown when a request could not be resolved.
    #[must_use]
    pub fn unable_to_load(id: u32) -> Self {
        Self {
            id,
            encrypted: false,
            content: UNABLE_TO_LOAD_TEXT.to_string(),
            is_html: false,
        }
    }

    /// Returns true if this rendering carries no content.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn summary(flags: MessageFlags) -> MessageSummary {
        MessageSummary {
            id: 7,
            flags,
            send_date: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            from: Mailbox::new("Alice", "alice@example.com"),
            to: vec![Mailbox::new("", "bob@example.com")],
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: "Hello".to_string(),
            unsubscribe: String::new(),
        }
    }

    #[test]
    fn test_flag_bits_match_wire_values() {
        assert_eq!(MessageFlags::SEEN.bits(), 1);
        assert_eq!(MessageFlags::FLAGGED.bits(), 4);
        assert_eq!(MessageFlags::DELETED.bits(), 8);
        assert_eq!(MessageFlags::SUBMITTED.bits(), 256);
        assert_eq!((MessageFlags::SEEN | MessageFlags::FLAGGED).bits(), 5);
    }

    #[test]
    fn test_flags_serialize_as_integer() {
        let json = serde_json::to_string(&(MessageFlags::SEEN | MessageFlags::DELETED)).unwrap();
        assert_eq!(json, "9");

        let flags: MessageFlags = serde_json::from_str("1029").unwrap();
        assert!(flags.contains(MessageFlags::SEEN | MessageFlags::FLAGGED));
        assert_eq!(flags.bits(), 1029);
    }

    #[test]
    fn test_flag_action_apply() {
        let mut flags = MessageFlags::SEEN;
        FlagAction::Add.apply(&mut flags, MessageFlags::FLAGGED);
        assert_eq!(flags, MessageFlags::SEEN | MessageFlags::FLAGGED);
        FlagAction::Remove.apply(&mut flags, MessageFlags::SEEN);
        assert_eq!(flags, MessageFlags::FLAGGED);
    }

    #[test]
    fn test_mailbox_from_display() {
        let mailbox = Mailbox::from_display("news at example.com", "news@example.com");
        assert_eq!(mailbox.name, "news@example.com");
        assert_eq!(Mailbox::new("", "a@b.c").label(), "a@b.c");
    }

    #[test]
    fn test_parse_unsubscribe_mailto() {
        assert_eq!(
            parse_unsubscribe_mailto(
                "<https://example.com/u>, <mailto:leave@example.com?subject=unsub>"
            ),
            "leave@example.com?subject=unsub"
        );
        assert_eq!(parse_unsubscribe_mailto("<https://example.com/u>"), "");
        assert_eq!(parse_unsubscribe_mailto("mailto:no-close@example.com"), "");
    }

    #[test]
    fn test_summary_json_field_names() {
        let json = serde_json::to_value(summary(MessageFlags::SEEN)).unwrap();
        assert_eq!(json["flags"], 1);
        assert!(json.get("sendDate").is_some());
        assert_eq!(json["from"]["email"], "alice@example.com");
    }

    #[test]
    fn test_summary_flag_queries() {
        let message = summary(MessageFlags::DELETED | MessageFlags::FLAGGED);
        assert!(message.is_deleted());
        assert!(message.is_flagged());
        assert!(!message.is_seen());
        assert!(!message.can_unsubscribe());
    }

    #[test]
    fn test_rendered_content_json_and_failure() {
        let content = RenderedContent {
            id: 3,
            encrypted: false,
            content: String::new(),
            is_html: true,
        };
        assert!(content.is_failure());

        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["isHTML"], true);

        let sentinel = RenderedContent::key_unavailable(3);
        assert!(sentinel.encrypted);
        assert!(!sentinel.is_html);
        assert!(sentinel.content.starts_with("Unable to decrypt"));
        assert!(!RenderedContent::unable_to_load(3).is_failure());
    }
}
