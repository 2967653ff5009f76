use base64::{engine::general_purpose, Engine as _};
use uuid::Uuid;

const CRLF: &str = "\r\n";
const MIME_LINE_WIDTH: usize = 76;

/// A named CSV attachment.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content: String,
}

/// One outbound report: an HTML body plus attachments, assembled and
/// sent as a single message.
#[derive(Debug, Clone)]
pub struct EmailReport {
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<Attachment>,
}

impl EmailReport {
    /// Assemble the raw `multipart/mixed` MIME message. All payloads are
    /// base64-encoded so non-ASCII resource names survive transport.
    pub fn to_raw_mime(&self, sender: &str, recipients: &[String]) -> String {
        let boundary = format!("=_tagscope_{}", Uuid::new_v4().simple());
        let mut msg = String::new();

        msg.push_str(&format!("From: {}{}", sender, CRLF));
        msg.push_str(&format!("To: {}{}", recipients.join(", "), CRLF));
        msg.push_str(&format!("Subject: {}{}", self.subject, CRLF));
        msg.push_str(&format!("MIME-Version: 1.0{}", CRLF));
        msg.push_str(&format!(
            "Content-Type: multipart/mixed; boundary=\"{}\"{}",
            boundary, CRLF
        ));
        msg.push_str(CRLF);

        msg.push_str(&format!("--{}{}", boundary, CRLF));
        msg.push_str(&format!(
            "Content-Type: text/html; charset=utf-8{}",
            CRLF
        ));
        msg.push_str(&format!("Content-Transfer-Encoding: base64{}", CRLF));
        msg.push_str(CRLF);
        msg.push_str(&encode_wrapped(self.html_body.as_bytes()));
        msg.push_str(CRLF);

        for attachment in &self.attachments {
            msg.push_str(&format!("--{}{}", boundary, CRLF));
            msg.push_str(&format!(
                "Content-Type: text/csv; charset=utf-8{}",
                CRLF
            ));
            msg.push_str(&format!(
                "Content-Disposition: attachment; filename=\"{}\"{}",
                attachment.filename, CRLF
            ));
            msg.push_str(&format!("Content-Transfer-Encoding: base64{}", CRLF));
            msg.push_str(CRLF);
            msg.push_str(&encode_wrapped(attachment.content.as_bytes()));
            msg.push_str(CRLF);
        }

        msg.push_str(&format!("--{}--{}", boundary, CRLF));
        msg
    }
}

/// Base64 with lines folded at the MIME limit.
fn encode_wrapped(data: &[u8]) -> String {
    let encoded = general_purpose::STANDARD.encode(data);
    let mut wrapped = String::with_capacity(encoded.len() + encoded.len() / MIME_LINE_WIDTH * 2);
    let bytes = encoded.as_bytes();
    for chunk in bytes.chunks(MIME_LINE_WIDTH) {
        // base64 output is always ASCII
        wrapped.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        wrapped.push_str(CRLF);
    }
    wrapped
}
