use crate::error::IngestError;

mod decoder;
pub use decoder::decode;

/// Minimal view of one inbound message: the source-assigned id plus what the
/// decoder pulled out of the raw bytes.
#[derive(Debug, Clone)]
pub struct EmailMeta {
    pub id: String,
    pub subject: String,
    pub text: String,
    /// Transport date header, RFC3339 or RFC5322, possibly empty.
    pub date: String,
}

impl EmailMeta {
    pub fn from_raw(id: &str, raw: &[u8]) -> Result<Self, IngestError> {
        let decoded = decoder::decode(raw)?;

        Ok(Self {
            id: id.to_owned(),
            subject: decoded.subject,
            text: decoded.text,
            date: decoded.date,
        })
    }
}
