//! Comma-delimited text codec for the backing file.
//!
//! The file is ISO-8859-1 encoded so that legacy spreadsheet exports open
//! without conversion. Quoting follows RFC 4180: a field containing a comma,
//! a double quote, CR or LF is wrapped in double quotes and inner quotes are
//! doubled.

use std::fmt;

/// Byte-order mark some tools prepend even to non-UTF-8 exports.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// A syntax error in delimited text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line on which the offending row starts.
    pub line: usize,
    /// Description of the problem.
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

/// A parsed row and the line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based line on which the row starts.
    pub line: usize,
    /// Field values.
    pub fields: Vec<String>,
}

/// Decode ISO-8859-1 bytes. Every byte maps to the code point of the same
/// value, so this cannot fail.
#[must_use]
pub fn decode_latin1(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Encode text as ISO-8859-1, or `None` if it holds a character above U+00FF.
#[must_use]
pub fn encode_latin1(text: &str) -> Option<Vec<u8>> {
    text.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect()
}

/// Check whether `text` can be stored in ISO-8859-1.
#[must_use]
pub fn is_latin1(text: &str) -> bool {
    text.chars().all(|c| u32::from(c) <= 0xFF)
}

/// Split delimited text into rows.
///
/// Blank lines are skipped. Both `\n` and `\r\n` terminate a row outside
/// quotes; inside quotes they are kept verbatim.
///
/// # Errors
///
/// Returns a [`ParseError`] for a quote that is never closed or for stray
/// characters after a closing quote.
pub fn parse(text: &str) -> Result<Vec<Row>, ParseError> {
    let mut rows = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut line = 1;
    let mut row_start = 1;
    let mut in_quotes = false;
    let mut after_quote = false;
    let mut row_quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => {
                    in_quotes = false;
                    after_quote = true;
                }
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            ',' => {
                fields.push(std::mem::take(&mut field));
                after_quote = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                push_row(&mut rows, std::mem::take(&mut fields), row_start, row_quoted);
                after_quote = false;
                row_quoted = false;
                line += 1;
                row_start = line;
            }
            '"' if field.is_empty() && !after_quote => {
                in_quotes = true;
                row_quoted = true;
            }
            _ if after_quote => {
                return Err(ParseError {
                    line,
                    message: format!("unexpected character {c:?} after closing quote"),
                });
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ParseError {
            line: row_start,
            message: "unterminated quoted field".to_string(),
        });
    }

    if !field.is_empty() || !fields.is_empty() || row_quoted {
        fields.push(field);
        push_row(&mut rows, fields, row_start, row_quoted);
    }

    Ok(rows)
}

fn push_row(rows: &mut Vec<Row>, fields: Vec<String>, line: usize, quoted: bool) {
    let blank = !quoted && fields.len() == 1 && fields[0].is_empty();
    if !blank {
        rows.push(Row { line, fields });
    }
}

/// Quote a single field if it needs it.
fn write_field(out: &mut String, value: &str) {
    if value.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&value.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(value);
    }
}

/// Append one row, terminated by `\n`.
pub fn write_row<'a, I>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = &'a str>,
{
    for (i, value) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_field(out, value);
    }
    out.push('\n');
}
