//! Line-prefix scanning of `---` delimited headers.
//!
//! Only single-line `key: value` scalars and indented lists of (optionally
//! quoted) strings are understood. This is not a YAML parser: the services
//! we read write these headers by hand and routinely produce text that a
//! strict YAML parser rejects (unquoted globs such as `*.ts`).

/// Split `text` into its header (between the leading `---` pair) and body.
///
/// The single blank line conventionally written after the closing delimiter
/// is consumed. Without a complete delimiter pair the whole text is body.
pub fn split(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return (None, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == "---" {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            let body = body
                .strip_prefix("\r\n")
                .or_else(|| body.strip_prefix('\n'))
                .unwrap_or(body);
            return (Some(header), body);
        }
        offset += line.len();
    }
    (None, text)
}

/// Value of the first top-level `key:` line, unquoted and trimmed.
pub fn scalar(header: &str, key: &str) -> Option<String> {
    header.lines().find_map(|line| {
        line.strip_prefix(key)
            .and_then(|r| r.strip_prefix(':'))
            .map(|v| unquote(v.trim()))
    })
}

pub fn boolean(header: &str, key: &str) -> Option<bool> {
    match scalar(header, key)?.to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

/// Items listed under `key:`, either inline (`key: a, b` or `key: [a, b]`) or
/// as indented `- item` lines directly below the key.
pub fn list(header: &str, key: &str) -> Vec<String> {
    let mut lines = header.lines();
    let inline = loop {
        let Some(line) = lines.next() else {
            return Vec::new();
        };
        if let Some(v) = line.strip_prefix(key).and_then(|r| r.strip_prefix(':')) {
            break v.trim();
        }
    };

    if !inline.is_empty() {
        let inline = inline
            .strip_prefix('[')
            .and_then(|v| v.strip_suffix(']'))
            .unwrap_or(inline);
        return inline
            .split(',')
            .map(|item| unquote(item.trim()))
            .filter(|item| !item.is_empty())
            .collect();
    }

    let mut items = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if !line.starts_with([' ', '\t']) {
            break;
        }
        match line.trim_start().strip_prefix('-') {
            Some(item) => {
                let item = unquote(item.trim());
                if !item.is_empty() {
                    items.push(item);
                }
            }
            None => break,
        }
    }
    items
}

/// Wrap `s` in double quotes, escaping backslashes and quotes.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Strip one layer of matching quotes, undoing [`quote`] for double quotes.
pub fn unquote(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        let inner = &s[1..s.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                    continue;
                }
            }
            out.push(c);
        }
        return out;
    }
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        return s[1..s.len() - 1].replace("''", "'");
    }
    s.to_string()
}

/// Collapse a free-text value onto one line so it survives a `key: value` header.
pub fn single_line(s: &str) -> String {
    s.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Free text as a header scalar that [`scalar`] reads back unchanged. Text that
/// opens with a quote character is itself quoted so the reader keeps it.
pub fn scalar_value(s: &str) -> String {
    let line = single_line(s);
    if line.starts_with(['"', '\'']) {
        quote(&line)
    } else {
        line
    }
}
