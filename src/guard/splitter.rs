/// Split a compound command line on `&&`, `||`, `;` and `|` outside quotes.
///
/// Single quotes, double quotes and backticks open a quoted span that only the
/// same character closes (no nesting, no backslash escapes). An unterminated
/// quote keeps the rest of the line literal, so operators after it never start
/// a new sub-command. Pieces are trimmed and empty pieces dropped.
pub fn split_compound_command(cmd: &str) -> Vec<&str> {
    let trimmed = cmd.trim();
    if trimmed.is_empty() {
        return vec![];
    }

    let mut results = Vec::new();
    let mut start = 0;
    let bytes = trimmed.as_bytes();
    let len = bytes.len();
    let mut i = 0;
    let mut quote: Option<u8> = None;

    while i < len {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        let delim_len = match b {
            b'"' | b'\'' | b'`' => {
                quote = Some(b);
                0
            }
            b'&' if i + 1 < len && bytes[i + 1] == b'&' => 2,
            b'|' if i + 1 < len && bytes[i + 1] == b'|' => 2,
            b'|' | b';' => 1,
            _ => 0,
        };

        if delim_len == 0 {
            i += 1;
            continue;
        }

        let segment = trimmed[start..i].trim();
        if !segment.is_empty() {
            results.push(segment);
        }
        i += delim_len;
        start = i;
    }

    if start < len {
        let segment = trimmed[start..].trim();
        if !segment.is_empty() {
            results.push(segment);
        }
    }

    results
}
