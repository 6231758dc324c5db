//! Fenced-block extraction from raw model output.
//!
//! Model replies interleave prose with fenced blocks; the stages only care
//! about the first block of each kind. A json fence carries a structured
//! object, a yaml fence carries a configuration document, and everything
//! else is plain text. Extraction never fails: malformed content falls
//! through to the next interpretation.

use serde_json::Value;

/// Classification of a model reply by its first usable fence.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    /// Parsed content of the first json-tagged fence.
    Json(Value),
    /// Trimmed content of the first yaml-tagged fence. A configuration
    /// document anywhere in the reply outranks a structured object, because
    /// a ready artifact is the highest-priority interpretation.
    Config(String),
    /// No usable fence; the reply as received.
    Plain(String),
}

impl ModelOutput {
    pub fn parse(text: &str) -> Self {
        if let Some(config) = extract_fenced_config(text) {
            return ModelOutput::Config(config);
        }
        if let Some(value) = extract_fenced_json(text) {
            return ModelOutput::Json(value);
        }
        ModelOutput::Plain(text.to_string())
    }
}

/// Parses the first json-tagged fence as a structured object. Returns `None`
/// when no such fence exists or its content does not parse.
pub fn extract_fenced_json(text: &str) -> Option<Value> {
    Fences::new(text)
        .find(|(tag, _)| tag.eq_ignore_ascii_case("json"))
        .and_then(|(_, body)| serde_json::from_str(body.trim()).ok())
}

/// Returns the trimmed content of the first yaml-tagged fence, if any.
pub fn extract_fenced_config(text: &str) -> Option<String> {
    Fences::new(text)
        .find(|(tag, _)| tag.eq_ignore_ascii_case("yaml") || tag.eq_ignore_ascii_case("yml"))
        .map(|(_, body)| body.trim().to_string())
}

/// Removes every fenced block (and stray fence markers) so the remaining
/// prose can be summarized.
pub fn strip_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("```") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 3..];
        // body starts after the tag line; an unterminated fence eats the tail
        let body_start = match after.find('\n') {
            Some(nl) => &after[nl + 1..],
            None => "",
        };
        match body_start.find("```") {
            Some(end) => rest = &body_start[end + 3..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out.replace("```", "")
}

/// Iterator over complete fenced blocks: `(tag, body)` pairs. A fence
/// without a closing marker is ignored, matching how the stages only trust
/// fully delimited output.
struct Fences<'a> {
    rest: &'a str,
}

impl<'a> Fences<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }
}

impl<'a> Iterator for Fences<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let start = self.rest.find("```")?;
            let after = &self.rest[start + 3..];
            let Some(tag_end) = after.find('\n') else {
                self.rest = "";
                return None;
            };
            let tag = after[..tag_end].trim();
            let body_start = &after[tag_end + 1..];
            let Some(body_end) = body_start.find("```") else {
                self.rest = "";
                return None;
            };
            self.rest = &body_start[body_end + 3..];
            if tag.is_empty() {
                continue;
            }
            return Some((tag, &body_start[..body_end]));
        }
    }
}
