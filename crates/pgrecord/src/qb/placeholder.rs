//! `$n` placeholder rewriting for caller-supplied predicate fragments.

/// Add `offset` to every `$n` placeholder in `fragment`.
///
/// Single-quoted literals, double-quoted identifiers and dollar-quoted
/// (`$$...$$`, `$tag$...$tag$`) literals are copied unchanged, as is a `$`
/// that does not start a placeholder.
pub(crate) fn shift_placeholders(fragment: &str, offset: usize) -> String {
    if offset == 0 {
        return fragment.to_string();
    }

    let mut out = String::with_capacity(fragment.len() + 4);
    let mut rest = fragment;
    let mut prev: Option<char> = None;

    while let Some(c) = rest.chars().next() {
        let len = match c {
            '\'' | '"' => quoted_len(rest, c),
            '$' if !prev.is_some_and(is_ident_char) => {
                let digits = rest[1..].bytes().take_while(u8::is_ascii_digit).count();
                if digits > 0 {
                    let number = &rest[1..=digits];
                    out.push('$');
                    match number.parse::<usize>() {
                        Ok(n) => out.push_str(&(n + offset).to_string()),
                        Err(_) => out.push_str(number),
                    }
                    prev = number.chars().last();
                    rest = &rest[1 + digits..];
                    continue;
                }
                dollar_quoted_len(rest).unwrap_or(1)
            }
            _ => c.len_utf8(),
        };
        out.push_str(&rest[..len]);
        prev = rest[..len].chars().last();
        rest = &rest[len..];
    }
    out
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Length of the quoted run at the start of `s`, closing quote included.
/// An unterminated quote runs to the end.
fn quoted_len(s: &str, quote: char) -> usize {
    s[1..].find(quote).map_or(s.len(), |i| i + 2)
}

/// Length of the dollar-quoted literal at the start of `s`, if `s` opens one.
fn dollar_quoted_len(s: &str) -> Option<usize> {
    let body = &s[1..];
    let tag_end = body.find(|c: char| !is_ident_char(c))?;
    if !body[tag_end..].starts_with('$') {
        return None;
    }
    let tag = &s[..tag_end + 2];
    let content = &s[tag.len()..];
    Some(content.find(tag).map_or(s.len(), |i| tag.len() + i + tag.len()))
}
