//! CSS identifier escaping
//!
//! Implements the identifier escaping grammar from CSS Syntax Level 3 so
//! generated class names are always legal identifier tokens, plus the
//! inverse transform for class names that arrive already escaped from a
//! parsed stylesheet.

/// Characters replaced by `-` before escaping a generated identifier
const FILENAME_RESERVED: &[char] = &['"', '*', '/', ':', '<', '>', '?', '\\', '|'];

/// Code points above the Unicode range, surrogates and NUL decode to this
const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

/// Whether a character belongs to the CSS single-escape punctuation class
fn is_single_escape(c: char) -> bool {
    matches!(c,
        ' '..=',' | '.' | '/' | ':'..='@' | '[' | ']' | '^' | '`' | '{'..='~')
}

fn is_control(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{0080}'..='\u{009F}')
}

/// Escape a string so it forms a valid CSS identifier.
pub fn escape(raw: &str) -> String {
    let mut output = String::with_capacity(raw.len() + 8);

    for c in raw.chars() {
        match c {
            '\t' | '\n' | '\u{000B}' | '\u{000C}' | '\r' => {
                output.push_str(&format!("\\{:X} ", c as u32));
            }
            c if c == '\\' || is_single_escape(c) => {
                output.push('\\');
                output.push(c);
            }
            c => output.push(c),
        }
    }

    let mut out_chars = output.chars();
    let first_out = out_chars.next();
    let second_out = out_chars.next();

    if first_out == Some('-') && matches!(second_out, Some(c) if c.is_ascii_digit() || c == '-') {
        output = format!("\\-{}", &output[1..]);
    } else if let Some(first) = raw.chars().next().filter(|c| c.is_ascii_digit()) {
        output = format!("\\3{} {}", first, &output[1..]);
    }

    strip_redundant_spaces(&output)
}

/// Drop the space that terminates a `\HEX` escape when nothing after it
/// could be mistaken for part of the escape. The space is kept when the
/// escape is preceded by an odd number of additional backslashes.
fn strip_redundant_spaces(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut output = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '\\' {
            output.push(chars[i]);
            i += 1;
            continue;
        }

        let run_start = i;
        while i < chars.len() && chars[i] == '\\' {
            i += 1;
        }
        let backslashes = i - run_start;

        let hex_start = i;
        while i < chars.len() && i - hex_start < 7 && matches!(chars[i], '0'..='9' | 'A'..='F') {
            i += 1;
        }
        let hex_len = i - hex_start;

        output.extend(&chars[run_start..i]);

        let terminated = hex_len >= 1 && hex_len <= 6 && chars.get(i) == Some(&' ');
        if !terminated {
            continue;
        }

        let next_disambiguates = matches!(
            chars.get(i + 1),
            Some('0'..='9' | 'A'..='F' | 'a'..='f' | ' ')
        );
        let extra_backslashes = backslashes - 1;
        if next_disambiguates || extra_backslashes % 2 == 1 {
            output.push(' ');
        }
        i += 1;
    }

    output
}

/// Consume up to six hex digits following a backslash.
///
/// Returns the decoded character and the number of input characters
/// consumed, including one terminating space.
fn gobble_hex(rest: &[char]) -> Option<(char, usize)> {
    let mut hex = String::new();
    let mut space_terminated = false;

    for c in rest {
        if hex.len() < 6 && c.is_ascii_hexdigit() {
            hex.push(c.to_ascii_lowercase());
            continue;
        }
        space_terminated = *c == ' ';
        break;
    }

    if hex.is_empty() {
        return None;
    }

    let consumed = hex.len() + usize::from(space_terminated);
    let decoded = u32::from_str_radix(&hex, 16)
        .ok()
        .filter(|cp| *cp != 0)
        .and_then(char::from_u32)
        .unwrap_or(REPLACEMENT_CHARACTER);

    Some((decoded, consumed))
}

/// Decode CSS escape sequences in an identifier.
///
/// Malformed escapes are handled permissively; this never fails.
pub fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }

    let chars: Vec<char> = raw.chars().collect();
    let mut output = String::with_capacity(raw.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '\\' {
            output.push(chars[i]);
            i += 1;
            continue;
        }

        let rest_end = (i + 8).min(chars.len());
        if let Some((decoded, consumed)) = gobble_hex(&chars[i + 1..rest_end]) {
            output.push(decoded);
            i += consumed + 1;
            continue;
        }

        match chars.get(i + 1) {
            // Double escaped backslash
            Some('\\') => {
                output.push('\\');
                i += 2;
            }
            // Trailing backslash is retained
            None => {
                output.push('\\');
                i += 1;
            }
            Some(_) => i += 1,
        }
    }

    output
}

/// Normalize a generated identifier and escape it.
///
/// Guards leading digits and dashes, and replaces reserved filename
/// characters, control characters and dots with `-`.
pub fn escape_local_ident(raw: &str) -> String {
    let mut chars = raw.chars();
    let needs_guard = match (chars.next(), chars.next()) {
        (Some(c), _) if c.is_ascii_digit() => true,
        (Some('-'), Some(c)) => c.is_ascii_digit() || c == '-',
        _ => false,
    };

    let normalized: String = raw
        .chars()
        .map(|c| {
            if FILENAME_RESERVED.contains(&c) || is_control(c) || c == '.' {
                '-'
            } else {
                c
            }
        })
        .collect();

    if needs_guard {
        escape(&format!("_{}", normalized))
    } else {
        escape(&normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn escape_plain_ident_unchanged() {
        assert_eq!(escape("button_primary-large"), "button_primary-large");
        assert_eq!(escape("ünïcødé"), "ünïcødé");
    }

    #[test]
    fn escape_single_escape_punctuation() {
        assert_eq!(escape("a.b"), "a\\.b");
        assert_eq!(escape("w-1/2"), "w-1\\/2");
        assert_eq!(escape("hover:bg"), "hover\\:bg");
        assert_eq!(escape("a b"), "a\\ b");
        assert_eq!(escape("a\\b"), "a\\\\b");
    }

    #[test]
    fn escape_leading_digit() {
        assert_eq!(escape("0abc"), "\\30 abc");
        assert_eq!(escape("1x"), "\\31x");
        assert_eq!(escape("9"), "\\39");
    }

    #[test]
    fn escape_leading_dash() {
        assert!(escape("--x").starts_with("\\-"));
        assert_eq!(escape("--x"), "\\--x");
        assert_eq!(escape("-1"), "\\-1");
        assert_eq!(escape("-a"), "-a");
    }

    #[test]
    fn escape_control_characters() {
        assert_eq!(escape("a\tb"), "a\\9 b");
        assert_eq!(escape("a\ng"), "a\\Ag");
        assert_eq!(escape("a\n"), "a\\A");
        assert_eq!(escape("\r1"), "\\D 1");
    }

    #[test]
    fn escape_tab_after_escaped_backslash() {
        // `\\` is an escaped backslash, `\9` is the tab escape
        assert_eq!(escape("\\\t"), "\\\\\\9");
    }

    #[test]
    fn unescape_hex_sequences() {
        assert_eq!(unescape("\\30 abc"), "0abc");
        assert_eq!(unescape("\\31x"), "1x");
        assert_eq!(unescape("a\\9 b"), "a\tb");
        assert_eq!(unescape("\\1F600"), "😀");
    }

    #[test]
    fn unescape_replacement_character() {
        assert_eq!(unescape("\\0"), "\u{FFFD}");
        assert_eq!(unescape("\\D800"), "\u{FFFD}");
        assert_eq!(unescape("\\110000"), "\u{FFFD}");
    }

    #[test]
    fn unescape_backslash_edge_cases() {
        assert_eq!(unescape("a\\\\b"), "a\\b");
        assert_eq!(unescape("abc\\"), "abc\\");
        assert_eq!(unescape("a\\.b"), "a.b");
        assert_eq!(unescape("plain"), "plain");
    }

    #[test]
    fn escape_local_ident_normalizes() {
        assert_eq!(escape_local_ident("src/components/Button"), "src-components-Button");
        assert_eq!(escape_local_ident("a.b:c"), "a-b-c");
        assert_eq!(escape_local_ident("1abc"), "_1abc");
        assert_eq!(escape_local_ident("-1abc"), "_-1abc");
        assert_eq!(escape_local_ident("--abc"), "_--abc");
        assert_eq!(escape_local_ident("-abc"), "-abc");
        assert_eq!(escape_local_ident("a\u{0001}b"), "a-b");
    }

    #[test]
    fn escape_local_ident_relative_parent_path() {
        assert_eq!(escape_local_ident("../lib/x"), "\\---lib-x");
    }

    proptest! {
        #[test]
        fn ascii_round_trip(s in "[ -~\t\n\r]{0,24}") {
            prop_assert_eq!(unescape(&escape(&s)), s);
        }

        #[test]
        fn unicode_round_trip(s in "\\PC{0,16}") {
            prop_assert_eq!(unescape(&escape(&s)), s);
        }
    }
}
