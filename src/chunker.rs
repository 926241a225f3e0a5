//! Paragraph-preserving text chunking.
//!
//! The cloud API caps every synthesis request at a fixed character count,
//! so long texts are split on paragraph boundaries and greedily packed into
//! chunks that stay under the cap. Paragraphs are never split: a single
//! paragraph longer than the cap is passed through verbatim and left for
//! the service to reject.

/// Split `text` into request-sized chunks.
///
/// Paragraphs are the lines of `text`, trimmed, with blank lines dropped.
/// Each yielded chunk is one or more whole paragraphs rejoined with `\n`,
/// and every multi-paragraph chunk stays strictly under `cap` characters
/// (the joining newlines count). Lengths are Unicode character counts, the
/// unit the service meters usage in.
pub fn chunks(text: &str, cap: usize) -> ParagraphChunks<'_> {
    ParagraphChunks {
        paragraphs: text.split('\n'),
        carry: None,
        cap,
    }
}

/// Lazy, single-pass chunk iterator returned by [`chunks`].
pub struct ParagraphChunks<'a> {
    paragraphs: std::str::Split<'a, char>,
    /// Paragraph that overflowed the previous chunk; opens the next one.
    carry: Option<&'a str>,
    cap: usize,
}

impl Iterator for ParagraphChunks<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let mut parts: Vec<&str> = Vec::new();
        let mut used = 0usize;

        if let Some(paragraph) = self.carry.take() {
            used = paragraph.chars().count();
            parts.push(paragraph);
        }

        for raw in self.paragraphs.by_ref() {
            let paragraph = raw.trim();
            if paragraph.is_empty() {
                continue;
            }
            let chars = paragraph.chars().count();
            if parts.is_empty() {
                // A fresh chunk always accepts its first paragraph, even
                // one at or over the cap.
                used = chars;
                parts.push(paragraph);
                continue;
            }
            let joined = used + 1 + chars;
            if joined < self.cap {
                used = joined;
                parts.push(paragraph);
            } else {
                self.carry = Some(paragraph);
                return Some(parts.join("\n"));
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }
}
