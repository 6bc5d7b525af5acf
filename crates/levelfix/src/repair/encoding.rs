//! Best-effort charset adapter at the byte boundary. The repair logic
//! only ever sees decoded text; nothing here is allowed to fail, a
//! hopeless byte stream decodes lossily with replacement characters.

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;

/// How far into the document the declaration is allowed to sit.
const SNIFF_WINDOW: usize = 256;

static DECLARED_ENCODING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"encoding\s*=\s*["']([A-Za-z0-9._-]+)["']"#).expect("encoding pattern compiles")
});

pub(crate) struct DecodedInput {
    pub(crate) text: String,
    pub(crate) encoding: &'static Encoding,
    /// Label exactly as written in the XML declaration, when one was
    /// found and recognized.
    pub(crate) declared_label: Option<String>,
}

/// What the serializer should produce. Differs from the input encoding
/// only when the source cannot be an output encoding (UTF-16 variants),
/// in which case UTF-8 is the safe fallback.
pub(crate) struct OutputEncoding {
    pub(crate) encoding: &'static Encoding,
    pub(crate) label: String,
}

/// Decodes raw document bytes: BOM first, then the declaration label,
/// then UTF-8. Undecodable sequences become replacement characters.
pub(crate) fn decode(input: &[u8]) -> DecodedInput {
    let (encoding, declared_label) = detect(input);
    let (text, encoding, _had_errors) = encoding.decode(input);
    DecodedInput {
        text: text.into_owned(),
        encoding,
        declared_label,
    }
}

fn detect(input: &[u8]) -> (&'static Encoding, Option<String>) {
    if let Some((encoding, _bom_length)) = Encoding::for_bom(input) {
        return (encoding, None);
    }
    if let Some(label) = sniff_declared_label(input) {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            return (encoding, Some(label));
        }
    }
    (UTF_8, None)
}

/// Reads the `encoding="…"` pseudo-attribute out of the XML declaration
/// with a pure-ASCII view of the head of the document.
fn sniff_declared_label(input: &[u8]) -> Option<String> {
    let head = &input[..input.len().min(SNIFF_WINDOW)];
    if !head.starts_with(b"<?xml") {
        return None;
    }
    let ascii: String = head
        .iter()
        .map(|&byte| if byte.is_ascii() { byte as char } else { ' ' })
        .collect();
    let declaration = ascii.split("?>").next()?;
    DECLARED_ENCODING
        .captures(declaration)
        .and_then(|captures| captures.get(1))
        .map(|label| label.as_str().to_string())
}

impl DecodedInput {
    pub(crate) fn output_encoding(&self) -> OutputEncoding {
        let output = self.encoding.output_encoding();
        let label = if output == self.encoding {
            self.declared_label
                .clone()
                .unwrap_or_else(|| output.name().to_string())
        } else {
            output.name().to_string()
        };
        OutputEncoding {
            encoding: output,
            label,
        }
    }
}

/// Encodes serialized text into the chosen output encoding. Unmappable
/// characters are emitted as numeric character references, which remain
/// well-formed XML.
pub(crate) fn encode(text: &str, output: &OutputEncoding) -> Vec<u8> {
    let (bytes, _encoding, _unmappable) = output.encoding.encode(text);
    bytes.into_owned()
}
