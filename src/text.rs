/// Manuscript content with conversions between byte offsets (what `regex`
/// reports) and Unicode code-point offsets (what gets stored).
#[derive(Debug)]
pub struct SourceText<'a> {
    text: &'a str,
    // Byte offset of every char; `None` when the text is pure ASCII and both
    // offset kinds coincide.
    char_starts: Option<Vec<usize>>,
}

impl<'a> SourceText<'a> {
    pub fn new(text: &'a str) -> Self {
        let char_starts = if text.is_ascii() {
            None
        } else {
            Some(text.char_indices().map(|(index, _)| index).collect())
        };

        Self { text, char_starts }
    }

    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Length in code points.
    pub fn char_len(&self) -> usize {
        match &self.char_starts {
            Some(starts) => starts.len(),
            None => self.text.len(),
        }
    }

    /// Code-point offset of the char starting at (or containing) `byte`.
    pub fn char_offset(&self, byte: usize) -> usize {
        if byte >= self.text.len() {
            return self.char_len();
        }
        match &self.char_starts {
            Some(starts) => match starts.binary_search(&byte) {
                Ok(index) => index,
                Err(index) => index.saturating_sub(1),
            },
            None => byte,
        }
    }

    /// Byte offset of the code point at `char_offset`, clamped to the text end.
    pub fn byte_offset(&self, char_offset: usize) -> usize {
        match &self.char_starts {
            Some(starts) => starts.get(char_offset).copied().unwrap_or(self.text.len()),
            None => char_offset.min(self.text.len()),
        }
    }

    /// Slice by code-point range, clamping both ends.
    pub fn slice_chars(&self, start: usize, end: usize) -> &'a str {
        let start = self.byte_offset(start);
        let end = self.byte_offset(end).max(start);
        &self.text[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_offsets_are_identity() {
        let source = SourceText::new("Rom. viii. 13");
        assert_eq!(source.char_len(), 13);
        assert_eq!(source.char_offset(5), 5);
        assert_eq!(source.byte_offset(5), 5);
        assert_eq!(source.slice_chars(0, 4), "Rom.");
    }

    #[test]
    fn multibyte_text_maps_bytes_to_code_points() {
        let text = "« Ps. xxvii. » — Rom. 8";
        let source = SourceText::new(text);
        let byte = text.find("Rom").expect("Rom present");
        let chars = text[..byte].chars().count();

        assert_eq!(source.char_offset(byte), chars);
        assert_eq!(source.byte_offset(chars), byte);
        assert_eq!(source.char_offset(text.len()), source.char_len());
        assert_eq!(source.slice_chars(chars, chars + 3), "Rom");
    }

    #[test]
    fn slice_chars_clamps_out_of_range_bounds() {
        let source = SourceText::new("café au lait");
        assert_eq!(source.slice_chars(10, 500), "it");
        assert_eq!(source.slice_chars(40, 50), "");
        assert_eq!(source.slice_chars(5, 2), "");
    }
}
