//! Classification of single physical S2K lines.
//!
//! Every line of an S2K export is one of: blank/comment noise, a continued
//! line (trailing `_`), a `TABLE:` header, or a run of `key=value` pairs.

/// Ordered `key -> value` pairs of one data row.
pub type RowValues = Vec<(String, String)>;

/// Closing marker written by the exporter after the last table.
pub const END_OF_DATA: &str = "END TABLE DATA";

/// Result of classifying one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Blank line or `File ...` banner.
    Empty,
    /// Line ends with `_`; `prefix` must be prepended to the next physical line.
    Continuation { prefix: String },
    /// `TABLE:  "NAME"` header.
    TableHeader { title: String },
    /// `key=value` pairs in source order.
    DataRow { values: RowValues },
}

/// Classify `raw`, first prepending the buffered continuation `pending` if any.
pub fn classify_line(raw: &str, pending: Option<&str>) -> LineKind {
    let merged;
    let line = match pending {
        Some(prefix) => {
            merged = format!("{prefix}{raw}");
            merged.as_str()
        }
        None => raw,
    };

    let normalized = normalize_whitespace(line);
    if normalized.is_empty()
        || starts_with_ignore_case(&normalized, "FILE")
        || normalized.eq_ignore_ascii_case(END_OF_DATA)
    {
        return LineKind::Empty;
    }

    if normalized.ends_with('_') {
        let trimmed = line.trim();
        let body = trimmed.strip_suffix('_').unwrap_or(trimmed).trim_end();
        let mut prefix = body.to_string();
        prefix.push(' ');
        return LineKind::Continuation { prefix };
    }

    if starts_with_ignore_case(&normalized, "TABLE") {
        let rest = normalized[5..].trim_start();
        let rest = rest.strip_prefix(':').unwrap_or(rest);
        let title = normalize_whitespace(&rest.replace('"', " "));
        return LineKind::TableHeader { title };
    }

    LineKind::DataRow {
        values: pair_tokens(tokenize(&normalized)),
    }
}

/// Split a data line into tokens.
///
/// `=` separates like whitespace. A word opening with `"` starts a quoted
/// span that runs up to the word closing with `"`; the span becomes one token
/// with its words joined by single spaces. An unterminated span is closed at
/// end of line.
pub fn tokenize(line: &str) -> Vec<String> {
    let replaced = line.replace('=', " ");
    let mut tokens = Vec::new();
    let mut span: Vec<&str> = Vec::new();
    let mut in_quote = false;

    for word in replaced.split_whitespace() {
        if in_quote {
            match word.strip_suffix('"') {
                Some(last) => {
                    if !last.is_empty() {
                        span.push(last);
                    }
                    tokens.push(span.join(" "));
                    span.clear();
                    in_quote = false;
                }
                None => span.push(word),
            }
        } else if let Some(rest) = word.strip_prefix('"') {
            match rest.strip_suffix('"') {
                Some(inner) => tokens.push(inner.to_string()),
                None => {
                    if !rest.is_empty() {
                        span.push(rest);
                    }
                    in_quote = true;
                }
            }
        } else {
            tokens.push(word.to_string());
        }
    }

    if in_quote {
        tokens.push(span.join(" "));
    }
    tokens
}

/// Pair tokens as alternating key/value. A trailing unpaired token is
/// dropped; a repeated key keeps its first position and takes the last value.
pub fn pair_tokens(tokens: Vec<String>) -> RowValues {
    let mut values = RowValues::with_capacity(tokens.len() / 2);
    let mut iter = tokens.into_iter();
    while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
        match values.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => values.push((key, value)),
        }
    }
    values
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn starts_with_ignore_case(s: &str, keyword: &str) -> bool {
    s.get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
}
