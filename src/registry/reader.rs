use std::iter::Enumerate;
use std::str::Lines;

use crate::registry::RegistryError;

/// Line cursor over one world data file.
///
/// Keeps the 1-based number of the last line handed out so format errors can
/// point at it.
pub struct DataReader<'a> {
    file: String,
    lines: Enumerate<Lines<'a>>,
    line_no: usize,
}

impl<'a> DataReader<'a> {
    pub fn new(file: impl Into<String>, content: &'a str) -> Self {
        Self {
            file: file.into(),
            lines: content.lines().enumerate(),
            line_no: 0,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    fn raw_line(&mut self) -> Option<&'a str> {
        let (i, line) = self.lines.next()?;
        self.line_no = i + 1;
        Some(line.strip_suffix('\r').unwrap_or(line))
    }

    /// Next line that is neither blank nor a `*` comment.
    pub fn next_line(&mut self) -> Option<&'a str> {
        loop {
            let line = self.raw_line()?;
            if !line.is_empty() && !line.starts_with('*') {
                return Some(line);
            }
        }
    }

    /// Next significant line, or a format error naming `what` was expected.
    pub fn expect_line(&mut self, context: &str, what: &str) -> Result<&'a str, RegistryError> {
        match self.next_line() {
            Some(line) => Ok(line),
            None => Err(self.format_error(context, format!("file ended, expecting {}", what))),
        }
    }

    /// Read a `~`-terminated string that may span several lines.
    ///
    /// Inner lines lose trailing whitespace and are joined with `\r\n`; text
    /// before the closing `~` is kept as-is.
    pub fn read_string(&mut self, context: &str) -> Result<String, RegistryError> {
        let mut out = String::new();
        loop {
            let Some(line) = self.raw_line() else {
                return Err(self.format_error(context, "file ended inside a ~-terminated string"));
            };
            let trimmed = line.trim_end_matches([' ', '\t', '\r', '\n']);
            if let Some(text) = trimmed.strip_suffix('~') {
                out.push_str(text);
                return Ok(out);
            }
            out.push_str(trimmed);
            out.push_str("\r\n");
        }
    }

    /// Split `line` into exactly `count` whitespace-separated fields.
    pub fn fields(
        &self,
        line: &'a str,
        count: usize,
        context: &str,
        what: &str,
    ) -> Result<Vec<&'a str>, RegistryError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != count {
            return Err(self.format_error(
                context,
                format!(
                    "bad {}: expected {} fields, found {} in '{}'",
                    what,
                    count,
                    fields.len(),
                    line
                ),
            ));
        }
        Ok(fields)
    }

    /// Parse one numeric field.
    pub fn number<T: std::str::FromStr>(
        &self,
        field: &str,
        context: &str,
        what: &str,
    ) -> Result<T, RegistryError> {
        field
            .parse::<T>()
            .map_err(|_| self.format_error(context, format!("bad {}: '{}' is not a number", what, field)))
    }

    pub fn format_error(&self, context: &str, message: impl Into<String>) -> RegistryError {
        RegistryError::Format {
            file: self.file.clone(),
            line: self.line_no,
            context: context.to_string(),
            message: message.into(),
        }
    }
}

/// Decode a flag field written either as a decimal number or as letters.
///
/// `a`-`z` are bits 0-25, `A`-`Z` bits 26-51, and punctuation from `!`
/// upward starts at bit 52. Digits mixed in with letters are ignored.
pub fn ascii_flags(field: &str) -> u64 {
    if field.bytes().all(|b| b.is_ascii_digit()) {
        return field.parse::<u64>().unwrap_or(0);
    }

    let mut flags = 0u64;
    for b in field.bytes() {
        let bit = match b {
            b'0'..=b'9' => continue,
            b'a'..=b'z' => u32::from(b - b'a'),
            b'A'..=b'Z' => 26 + u32::from(b - b'A'),
            _ => match b.checked_sub(b'!') {
                Some(offset) => 52 + u32::from(offset),
                None => continue,
            },
        };
        flags |= 1u64.checked_shl(bit).unwrap_or(0);
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_line_skips_comments_and_blanks() {
        let mut r = DataReader::new("t", "* comment\n\nfirst\r\n*another\nsecond\n");
        assert_eq!(r.next_line(), Some("first"));
        assert_eq!(r.next_line(), Some("second"));
        assert_eq!(r.next_line(), None);
    }

    #[test]
    fn read_string_single_line() {
        let mut r = DataReader::new("t", "Plains~\nnext\n");
        assert_eq!(r.read_string("ctx").unwrap(), "Plains");
        assert_eq!(r.next_line(), Some("next"));
    }

    #[test]
    fn read_string_multi_line_joins_with_crlf() {
        let mut r = DataReader::new("t", "line one  \nline two\n~\n");
        assert_eq!(r.read_string("ctx").unwrap(), "line one\r\nline two\r\n");
    }

    #[test]
    fn read_string_does_not_skip_comment_lines() {
        let mut r = DataReader::new("t", "*starred~\n");
        assert_eq!(r.read_string("ctx").unwrap(), "*starred");
    }

    #[test]
    fn read_string_unterminated_is_error() {
        let mut r = DataReader::new("t", "no tilde here\n");
        let err = r.read_string("sector #4").unwrap_err();
        assert!(err.to_string().contains("sector #4"));
    }

    #[test]
    fn fields_checks_count() {
        let r = DataReader::new("t", "");
        assert_eq!(r.fields("1 2  3", 3, "ctx", "E line").unwrap(), vec!["1", "2", "3"]);
        let err = r.fields("1 2", 3, "ctx", "E line").unwrap_err();
        assert!(err.to_string().contains("expected 3 fields"));
    }

    #[test]
    fn errors_carry_line_numbers() {
        let mut r = DataReader::new("forest.sect", "a\nb\nc\n");
        r.next_line();
        r.next_line();
        let err = r.format_error("sector #1", "boom");
        assert_eq!(err.to_string(), "forest.sect:2: sector #1: boom");
    }

    #[test]
    fn ascii_flags_numeric_and_letters() {
        assert_eq!(ascii_flags("0"), 0);
        assert_eq!(ascii_flags("68"), 68);
        assert_eq!(ascii_flags("a"), 1);
        assert_eq!(ascii_flags("abc"), 0b111);
        assert_eq!(ascii_flags("g"), 1 << 6);
        assert_eq!(ascii_flags("A"), 1 << 26);
        assert_eq!(ascii_flags("a1"), 1);
        assert_eq!(ascii_flags("!"), 1 << 52);
    }
}
