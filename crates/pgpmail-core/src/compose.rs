//! Outgoing message composition.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use pgpmail_mime::encoding::encode_rfc2047;

use crate::model::Mailbox;

/// A plain-text email message to send.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    /// Sender.
    pub from: Mailbox,
    /// Recipients.
    pub to: Vec<Mailbox>,
    /// CC recipients.
    pub cc: Vec<Mailbox>,
    /// BCC recipients, never written to the headers.
    pub bcc: Vec<Mailbox>,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
    /// `Date` header, the build time if unset.
    pub date: Option<DateTime<Utc>>,
}

impl OutgoingMessage {
    /// Creates a new outgoing message.
    #[must_use]
    pub fn new(from: Mailbox, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            from,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: subject.into(),
            body: body.into(),
            date: None,
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: Mailbox) -> Self {
        self.to.push(recipient);
        self
    }

    /// Adds a CC recipient.
    #[must_use]
    pub fn cc(mut self, recipient: Mailbox) -> Self {
        self.cc.push(recipient);
        self
    }

    /// Adds a BCC recipient.
    #[must_use]
    pub fn bcc(mut self, recipient: Mailbox) -> Self {
        self.bcc.push(recipient);
        self
    }

    /// Sets the `Date` header.
    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Returns all recipient addresses (to, cc, bcc).
    #[must_use]
    pub fn recipients(&self) -> Vec<&str> {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(|m| m.email.as_str())
            .collect()
    }

    /// Builds the RFC 5322 formatted message with CRLF line endings.
    #[must_use]
    pub fn to_rfc5322(&self) -> String {
        let mut message = String::new();
        let date = self.date.unwrap_or_else(Utc::now);

        // Headers
        let _ = write!(message, "Date: {}\r\n", date.to_rfc2822());
        let _ = write!(message, "From: {}\r\n", format_mailbox(&self.from));

        if !self.to.is_empty() {
            let _ = write!(message, "To: {}\r\n", format_list(&self.to));
        }

        if !self.cc.is_empty() {
            let _ = write!(message, "Cc: {}\r\n", format_list(&self.cc));
        }

        let _ = write!(
            message,
            "Subject: {}\r\n",
            encode_rfc2047(&self.subject, "utf-8")
        );
        message.push_str("MIME-Version: 1.0\r\n");
        message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        message.push_str("Content-Transfer-Encoding: 8bit\r\n");

        // Empty line between headers and body
        message.push_str("\r\n");

        // Body
        for line in self.body.lines() {
            message.push_str(line);
            message.push_str("\r\n");
        }

        message
    }
}

fn format_mailbox(mailbox: &Mailbox) -> String {
    if mailbox.name.is_empty() {
        format!("<{}>", mailbox.email)
    } else if mailbox.name.is_ascii() {
        format!(
            "\"{}\" <{}>",
            mailbox.name.replace('\\', "\\\\").replace('"', "\\\""),
            mailbox.email
        )
    } else {
        format!("{} <{}>", encode_rfc2047(&mailbox.name, "utf-8"), mailbox.email)
    }
}

fn format_list(mailboxes: &[Mailbox]) -> String {
    mailboxes
        .iter()
        .map(format_mailbox)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn message() -> OutgoingMessage {
        OutgoingMessage::new(
            Mailbox::new("Unsubscribe", "me@example.com"),
            "Héllo",
            "line one\nline two",
        )
        .to(Mailbox::new("Unsubscribe", "list@example.com"))
        .cc(Mailbox::new("", "cc@example.com"))
        .bcc(Mailbox::new("", "hidden@example.com"))
        .date(DateTime::from_timestamp(0, 0).unwrap())
    }

    #[test]
    fn test_rfc5322_headers() {
        let text = message().to_rfc5322();
        assert!(text.starts_with("Date: Thu, "));
        assert!(text.contains("Jan 1970 00:00:00 +0000\r\n"));
        assert!(text.contains("From: \"Unsubscribe\" <me@example.com>\r\n"));
        assert!(text.contains("To: \"Unsubscribe\" <list@example.com>\r\n"));
        assert!(text.contains("Cc: <cc@example.com>\r\n"));
        assert!(text.contains("Subject: =?utf-8?B?SMOpbGxv?=\r\n"));
        assert!(!text.contains("hidden@example.com"));
    }

    #[test]
    fn test_rfc5322_body_uses_crlf() {
        let text = message().to_rfc5322();
        assert!(text.ends_with("\r\n\r\nline one\r\nline two\r\n"));
        assert!(!text.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn test_recipients_include_bcc() {
        assert_eq!(
            message().recipients(),
            vec!["list@example.com", "cc@example.com", "hidden@example.com"]
        );
    }

    #[test]
    fn test_ascii_subject_is_verbatim() {
        let text = OutgoingMessage::new(Mailbox::new("", "a@b.c"), "Plain", "")
            .to_rfc5322();
        assert!(text.contains("Subject: Plain\r\n"));
    }
}
