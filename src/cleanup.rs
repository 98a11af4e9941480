//! Stylesheet text normalization, applied before any rule splitting.
//!
//! The passes run in a fixed order; later passes assume the earlier ones
//! already ran (comment removal expects flattened whitespace, the rule
//! splitter expects media blocks to be gone).

/// Normalize raw CSS text into the form the rule builder consumes.
///
/// In order: drop `@charset` declarations, drop `@media` blocks, flatten
/// newlines/tabs and collapse whitespace runs, turn double quotes into
/// single quotes (the attribute serializer delimits `style="..."` with
/// double quotes), strip `/* ... */` comments. Malformed input degrades
/// gracefully; this never fails.
pub(crate) fn clean(css: &str) -> String {
    let css = strip_charset(css);
    let css = strip_media_blocks(&css);
    let css = flatten_whitespace(&css);
    let css = css.replace('"', "'");
    let css = strip_comments(&css);
    css.trim().to_string()
}

fn strip_charset(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("@charset") {
        out.push_str(&rest[..start]);
        match rest[start..].find(';') {
            Some(semi) => rest = &rest[start + semi + 1..],
            None => {
                // unterminated declaration, drop the remainder of the line
                rest = &rest[start + "@charset".len()..];
                match rest.find('\n') {
                    Some(nl) => rest = &rest[nl..],
                    None => rest = "",
                }
            }
        }
    }
    out.push_str(rest);
    out
}

/// Byte ranges of well-formed `@media ... { ... }` blocks.
///
/// Balanced-brace scanning up to one nesting level, matching the shape
/// `@media` up to the first `{`, then content with at most one nested
/// `{...}` group open at a time, then the closing `}`. Deeper nesting or a
/// missing close brace leaves that occurrence untouched; this is a
/// best-effort scanner, not a CSS parser.
fn media_block_ranges(css: &str) -> Vec<std::ops::Range<usize>> {
    let bytes = css.as_bytes();
    let mut ranges = Vec::new();
    let mut search = 0usize;

    while let Some(found) = css[search..].find("@media") {
        let start = search + found;
        let Some(open_offset) = css[start..].find('{') else {
            break;
        };
        let open = start + open_offset;

        let mut depth = 1u32;
        let mut idx = open + 1;
        let mut closed_at = None;
        while idx < bytes.len() {
            match bytes[idx] {
                b'{' => {
                    depth += 1;
                    if depth > 2 {
                        break;
                    }
                }
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        closed_at = Some(idx);
                        break;
                    }
                }
                _ => {}
            }
            idx += 1;
        }

        match closed_at {
            Some(close) => {
                ranges.push(start..close + 1);
                search = close + 1;
            }
            None => {
                search = start + "@media".len();
            }
        }
    }

    ranges
}

pub(crate) fn strip_media_blocks(css: &str) -> String {
    let ranges = media_block_ranges(css);
    if ranges.is_empty() {
        return css.to_string();
    }
    let mut out = String::with_capacity(css.len());
    let mut cursor = 0usize;
    for range in ranges {
        out.push_str(&css[cursor..range.start]);
        cursor = range.end;
    }
    out.push_str(&css[cursor..]);
    out
}

/// The verbatim text of every well-formed `@media` block, concatenated.
/// Used to keep media queries alive in a surviving `<style>` tag after the
/// plain rules have been inlined.
pub(crate) fn extract_media_blocks(css: &str) -> String {
    media_block_ranges(css)
        .into_iter()
        .map(|range| &css[range])
        .collect()
}

fn flatten_whitespace(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut previous_space = false;
    for ch in css.chars() {
        if ch == '\n' || ch == '\r' || ch == '\t' || ch == ' ' {
            if !previous_space {
                out.push(' ');
            }
            previous_space = true;
        } else {
            out.push(ch);
            previous_space = false;
        }
    }
    out
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                // unterminated comment, keep it; the rule splitter will
                // drop whatever it mangles
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Legacy style blocks are sometimes wrapped in an HTML comment; peel the
/// wrapper off before treating the content as CSS.
pub(crate) fn trim_html_comments(css: &str) -> String {
    let mut css = css.trim();
    if let Some(stripped) = css.strip_prefix("<!--") {
        css = stripped;
    }
    if let Some(stripped) = css.strip_suffix("-->") {
        css = stripped;
    }
    css.trim().to_string()
}
