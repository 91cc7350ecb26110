//! Stylesheet parsing collaborator
//!
//! The resolver only needs two facts about a stylesheet: which classes it
//! declares and which `composes` declarations it contains. Any parser that
//! can provide them implements [`StylesheetParser`]. [`CssModuleParser`] is
//! a lightweight scanner for plain CSS Modules files; it understands
//! blocks, comments, strings, `:global`/`:local` and `composes`, but it is
//! not a CSS grammar.

use super::normalize_path;
use crate::error::{ScopeError, ScopeResult};
use std::path::{Path, PathBuf};

/// Where composed class names come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositionSource {
    /// Another stylesheet, as written and resolved to an absolute path
    File { specifier: String, path: PathBuf },
    /// A class declared in the same stylesheet
    Local,
    /// Unscoped global class names
    Global,
}

/// One `composes` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    /// The class in this file that receives the composed names
    pub local_alias: String,
    /// Class names taken from the source, in declaration order
    pub source_tokens: Vec<String>,
    pub source: CompositionSource,
}

/// What the resolver needs to know about one stylesheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedStylesheet {
    /// Locally scoped class names in declaration order, without duplicates
    pub local_names: Vec<String>,
    pub compositions: Vec<Composition>,
}

/// Parses a stylesheet into declared classes and compositions.
///
/// A missing file must be reported as [`ScopeError::StylesheetNotFound`]
/// carrying the requested path; malformed input as
/// [`ScopeError::StylesheetSyntax`].
pub trait StylesheetParser: Send + Sync {
    fn parse(&self, path: &Path) -> ScopeResult<ParsedStylesheet>;
}

/// Built-in scanner for CSS Modules stylesheets
#[derive(Debug, Clone, Copy, Default)]
pub struct CssModuleParser;

impl CssModuleParser {
    pub fn new() -> Self {
        Self
    }

    /// Scan stylesheet source text; `path` anchors relative `from` paths
    pub fn parse_source(&self, path: &Path, source: &str) -> ScopeResult<ParsedStylesheet> {
        Scanner::new(path).run(source)
    }
}

impl StylesheetParser for CssModuleParser {
    fn parse(&self, path: &Path) -> ScopeResult<ParsedStylesheet> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScopeError::StylesheetNotFound(path.to_path_buf())
            } else {
                ScopeError::io(format!("reading stylesheet {}", path.display()), e)
            }
        })?;
        self.parse_source(path, &source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    /// Style rule; declarations may compose
    Rule,
    /// Conditional group rule such as `@media`, containing rules
    Group,
    /// `@keyframes` and friends; frame selectors are not classes
    Keyframes,
    Other,
}

#[derive(Debug)]
struct Block {
    kind: BlockKind,
    /// The single class of a `.name` selector, when that is the whole selector
    sole_class: Option<String>,
    line: usize,
    column: usize,
}

struct Scanner<'a> {
    path: &'a Path,
    parsed: ParsedStylesheet,
    stack: Vec<Block>,
    buf: String,
    buf_line: usize,
    buf_column: usize,
    line: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            parsed: ParsedStylesheet::default(),
            stack: Vec::new(),
            buf: String::new(),
            buf_line: 1,
            buf_column: 1,
            line: 1,
            column: 0,
        }
    }

    fn error(&self, line: usize, column: usize, message: &str) -> ScopeError {
        ScopeError::syntax(self.path, line, column, message)
    }

    fn push_buf(&mut self, c: char) {
        if self.buf.trim().is_empty() && !c.is_whitespace() {
            self.buf_line = self.line;
            self.buf_column = self.column;
        }
        self.buf.push(c);
    }

    fn run(mut self, source: &str) -> ScopeResult<ParsedStylesheet> {
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }

            match c {
                '/' if chars.peek() == Some(&'*') => {
                    let (line, column) = (self.line, self.column);
                    chars.next();
                    self.column += 1;
                    let mut closed = false;
                    let mut prev = '\0';
                    for c in chars.by_ref() {
                        if c == '\n' {
                            self.line += 1;
                            self.column = 0;
                        } else {
                            self.column += 1;
                        }
                        if prev == '*' && c == '/' {
                            closed = true;
                            break;
                        }
                        prev = c;
                    }
                    if !closed {
                        return Err(self.error(line, column, "unterminated comment"));
                    }
                }
                '"' | '\'' => {
                    let (line, column) = (self.line, self.column);
                    self.push_buf(c);
                    let mut closed = false;
                    while let Some(s) = chars.next() {
                        self.column += 1;
                        self.buf.push(s);
                        if s == '\\' {
                            if let Some(escaped) = chars.next() {
                                self.column += 1;
                                self.buf.push(escaped);
                            }
                        } else if s == c {
                            closed = true;
                            break;
                        } else if s == '\n' {
                            break;
                        }
                    }
                    if !closed {
                        return Err(self.error(line, column, "unterminated string"));
                    }
                }
                '\\' => {
                    self.push_buf(c);
                    if let Some(escaped) = chars.next() {
                        self.column += 1;
                        self.buf.push(escaped);
                    }
                }
                '{' => self.open_block()?,
                ';' => {
                    self.declaration()?;
                    self.buf.clear();
                }
                '}' => {
                    self.declaration()?;
                    self.buf.clear();
                    if self.stack.pop().is_none() {
                        return Err(self.error(self.line, self.column, "unexpected '}'"));
                    }
                }
                c => self.push_buf(c),
            }
        }

        if let Some(block) = self.stack.last() {
            return Err(self.error(block.line, block.column, "unclosed block"));
        }

        Ok(self.parsed)
    }

    fn open_block(&mut self) -> ScopeResult<()> {
        let prelude = self.buf.trim().to_string();
        self.buf.clear();
        let parent = self.stack.last().map(|b| b.kind);

        let (kind, sole_class) = if let Some(at_rule) = prelude.strip_prefix('@') {
            let name = at_rule
                .split(|c: char| c.is_whitespace() || c == '(')
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase();
            let kind = match name.as_str() {
                n if n.ends_with("keyframes") => BlockKind::Keyframes,
                "media" | "supports" | "layer" | "container" | "document" | "scope" => {
                    BlockKind::Group
                }
                _ => BlockKind::Other,
            };
            (kind, None)
        } else if parent == Some(BlockKind::Keyframes) {
            (BlockKind::Other, None)
        } else {
            let classes = local_classes(&prelude);
            for class in &classes {
                if !self.parsed.local_names.contains(class) {
                    self.parsed.local_names.push(class.clone());
                }
            }
            let sole = match classes.as_slice() {
                [only] if prelude == format!(".{}", only) => Some(only.clone()),
                _ => None,
            };
            (BlockKind::Rule, sole)
        };

        self.stack.push(Block {
            kind,
            sole_class,
            line: self.line,
            column: self.column,
        });
        Ok(())
    }

    fn declaration(&mut self) -> ScopeResult<()> {
        let decl = self.buf.trim();
        let Some((property, value)) = decl.split_once(':') else {
            return Ok(());
        };
        let property = property.trim().to_ascii_lowercase();
        if property != "composes" && property != "compose-with" {
            return Ok(());
        }

        let (line, column) = (self.buf_line, self.buf_column);
        let alias = match self.stack.last() {
            Some(Block {
                kind: BlockKind::Rule,
                sole_class: Some(class),
                ..
            }) => class.clone(),
            _ => {
                return Err(self.error(
                    line,
                    column,
                    "composition is only allowed in a rule with a single class selector",
                ))
            }
        };

        let value = value.trim();
        let (names, source) = match split_from(value) {
            Some((names, "global")) => (names, CompositionSource::Global),
            Some((names, quoted)) => {
                let specifier = quoted[1..quoted.len() - 1].to_string();
                let base = self.path.parent().unwrap_or_else(|| Path::new(""));
                let source = CompositionSource::File {
                    path: normalize_path(&base.join(&specifier)),
                    specifier,
                };
                (names, source)
            }
            None => (value, CompositionSource::Local),
        };

        let source_tokens: Vec<String> = names
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if source_tokens.is_empty() {
            return Err(self.error(line, column, "composes without class names"));
        }

        self.parsed.compositions.push(Composition {
            local_alias: alias,
            source_tokens,
            source,
        });
        Ok(())
    }
}

/// Split `names from "file"` or `names from global` into its two halves
fn split_from(value: &str) -> Option<(&str, &str)> {
    let (at, _) = value.rmatch_indices("from").find(|(at, _)| {
        let before = value[..*at].chars().next_back();
        let after = value[at + 4..].chars().next();
        before.is_some_and(char::is_whitespace) && after.is_some_and(char::is_whitespace)
    })?;

    let names = value[..at].trim_end();
    let source = value[at + 4..].trim();
    let quoted = source.len() >= 2
        && (source.starts_with('"') && source.ends_with('"')
            || source.starts_with('\'') && source.ends_with('\''));
    (quoted || source == "global").then_some((names, source))
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

/// Class names in a selector list that are locally scoped.
///
/// `:global(...)` contents are skipped, a bare `:global` switches the rest
/// of that selector to global until `:local` or the next `,`.
fn local_classes(selector: &str) -> Vec<String> {
    let chars: Vec<char> = selector.chars().collect();
    let mut classes = Vec::new();
    let mut global = false;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            ',' => {
                global = false;
                i += 1;
            }
            '[' => {
                // Attribute selectors may contain dots
                while i < chars.len() && chars[i] != ']' {
                    i += 1;
                }
                i += 1;
            }
            ':' => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && is_name_char(chars[end]) {
                    end += 1;
                }
                let pseudo: String = chars[start..end].iter().collect::<String>().to_ascii_lowercase();
                let has_args = chars.get(end) == Some(&'(');
                match (pseudo.as_str(), has_args) {
                    ("global", true) => {
                        i = skip_parens(&chars, end);
                    }
                    ("global", false) => {
                        global = true;
                        i = end;
                    }
                    ("local", true) => i = end + 1,
                    ("local", false) => {
                        global = false;
                        i = end;
                    }
                    _ => i = end.max(start),
                }
            }
            '.' => {
                let (ident, next) = read_ident(&chars, i + 1);
                if !global && is_valid_class(&ident) && !classes.contains(&ident) {
                    classes.push(ident);
                }
                i = next;
            }
            _ => i += 1,
        }
    }

    classes
}

fn skip_parens(chars: &[char], open: usize) -> usize {
    let mut depth = 0;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    i
}

/// Read an identifier starting at `start`, keeping escapes as written
fn read_ident(chars: &[char], start: usize) -> (String, usize) {
    let mut ident = String::new();
    let mut i = start;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            ident.push(c);
            i += 1;
            let hex_start = i;
            while i < chars.len() && i - hex_start < 6 && chars[i].is_ascii_hexdigit() {
                ident.push(chars[i]);
                i += 1;
            }
            if i == hex_start {
                if let Some(&escaped) = chars.get(i) {
                    ident.push(escaped);
                    i += 1;
                }
            } else if chars.get(i) == Some(&' ') {
                ident.push(' ');
                i += 1;
            }
        } else if is_name_char(c) {
            ident.push(c);
            i += 1;
        } else {
            break;
        }
    }

    (ident, i)
}

fn is_valid_class(ident: &str) -> bool {
    let mut chars = ident.chars();
    match (chars.next(), chars.next()) {
        (None, _) => false,
        (Some(c), _) if c.is_ascii_digit() => false,
        (Some('-'), Some(c)) if c.is_ascii_digit() => false,
        (Some('-'), None) => false,
        _ => true,
    }
}
