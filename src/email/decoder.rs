use mailparse::{MailHeaderMap, ParsedMail, parse_mail};

use crate::error::IngestError;

/// Banners a mail client inserts above a manually forwarded message. The
/// original notification starts at the first one found.
const FORWARD_MARKERS: [&str; 3] = [
    "Forwarded Message",
    "---------- Forwarded message",
    "Begin forwarded message:",
];

#[derive(Debug)]
pub struct DecodedEmail {
    pub subject: String,
    pub date: String,
    pub text: String,
}

/// Turns raw transport bytes into header metadata plus normalized plain
/// text. Multipart trees are walked depth-first preferring text/plain
/// anywhere over text/html anywhere; each part is decoded per its own
/// transfer encoding.
pub fn decode(raw: &[u8]) -> Result<DecodedEmail, IngestError> {
    let mail = parse_mail(raw).map_err(|err| IngestError::Malformed(err.to_string()))?;

    let subject = mail.headers.get_first_value("Subject").unwrap_or_default();
    let date = mail.headers.get_first_value("Date").unwrap_or_default();

    let part = find_part(&mail, "text/plain")
        .or_else(|| find_part(&mail, "text/html"))
        .ok_or(IngestError::ContentNotFound)?;

    let body = part
        .get_body()
        .map_err(|err| IngestError::Unreadable(err.to_string()))?;

    Ok(DecodedEmail {
        subject,
        date,
        text: clean_forwarded(&body),
    })
}

fn find_part<'a>(part: &'a ParsedMail<'a>, mimetype: &str) -> Option<&'a ParsedMail<'a>> {
    if part.ctype.mimetype.eq_ignore_ascii_case(mimetype) {
        return Some(part);
    }

    part.subparts.iter().find_map(|sub| find_part(sub, mimetype))
}

/// Strips quote markers line by line, drops now-empty lines, then discards
/// everything before the first forwarding banner so template parsers see the
/// original notification content even on a manually forwarded copy.
fn clean_forwarded(text: &str) -> String {
    let mut lines = Vec::new();
    for line in text.lines() {
        let line = line.strip_prefix("> ").unwrap_or(line);
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }

    let clean = lines.join("\n");

    for marker in FORWARD_MARKERS {
        if let Some(idx) = clean.find(marker) {
            return clean[idx..].to_owned();
        }
    }

    clean
}
