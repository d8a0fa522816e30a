//! Comment stripping for C-like sources.
//!
//! Import extraction runs regexes over source text, so comments have to go
//! first or commented-out imports would be reported. String literals are
//! kept intact because specifiers live inside them.

/// Which constructs a dialect has.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Syntax {
    pub line_comments: bool,
    pub template_literals: bool,
    pub regex_literals: bool,
}

impl Syntax {
    pub const SCRIPT: Self = Self {
        line_comments: true,
        template_literals: true,
        regex_literals: true,
    };

    pub const CSS: Self = Self {
        line_comments: false,
        template_literals: false,
        regex_literals: false,
    };

    pub const SASS: Self = Self {
        line_comments: true,
        template_literals: false,
        regex_literals: false,
    };

    /// JSON with comments, as found in tsconfig files.
    pub const JSONC: Self = Self::SASS;
}

/// Replace comments with spaces, preserving newlines and string contents.
///
/// Returns `Err` only for constructs that make the rest of the file
/// unreadable: an unterminated block comment or template literal. Quoted
/// strings end at a newline instead, since JSX text such as `Don't` is
/// valid and would otherwise look unterminated.
pub(crate) fn strip_comments(src: &str, syntax: Syntax) -> Result<String, String> {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut i = 0;
    // Brace depth of each open `${` inside template literals.
    let mut template_stack: Vec<usize> = Vec::new();
    let mut brace_depth = 0usize;
    let mut last_significant: Option<char> = None;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match c {
            '/' if next == Some('*') => {
                let start_line = line_of(&chars, i);
                out.push_str("  ");
                i += 2;
                loop {
                    if i >= chars.len() {
                        return Err(format!(
                            "unterminated block comment starting on line {}",
                            start_line
                        ));
                    }
                    if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                        out.push_str("  ");
                        i += 2;
                        break;
                    }
                    out.push(if chars[i] == '\n' { '\n' } else { ' ' });
                    i += 1;
                }
            }
            '/' if next == Some('/') && syntax.line_comments && !follows_url_scheme(&out) => {
                while i < chars.len() && chars[i] != '\n' {
                    out.push(' ');
                    i += 1;
                }
            }
            '/' if syntax.regex_literals && regex_allowed(last_significant) => {
                i = copy_regex_literal(&chars, i, &mut out);
                last_significant = Some('/');
            }
            '"' | '\'' => {
                i = copy_quoted(&chars, i, c, &mut out);
                last_significant = Some(c);
            }
            '`' if syntax.template_literals => {
                let start_line = line_of(&chars, i);
                match copy_template(&chars, i, &mut out) {
                    TemplateEnd::Closed(end) => i = end,
                    TemplateEnd::Interpolation(end) => {
                        template_stack.push(brace_depth);
                        brace_depth += 1;
                        i = end;
                    }
                    TemplateEnd::Unterminated => {
                        return Err(format!(
                            "unterminated template literal starting on line {}",
                            start_line
                        ));
                    }
                }
                last_significant = Some('`');
            }
            '{' => {
                brace_depth += 1;
                out.push(c);
                i += 1;
                last_significant = Some(c);
            }
            '}' => {
                brace_depth = brace_depth.saturating_sub(1);
                out.push(c);
                i += 1;
                if template_stack.last() == Some(&brace_depth) {
                    // Back inside the template after `${ ... }`.
                    template_stack.pop();
                    let start_line = line_of(&chars, i);
                    match copy_template_body(&chars, i, &mut out) {
                        TemplateEnd::Closed(end) => i = end,
                        TemplateEnd::Interpolation(end) => {
                            template_stack.push(brace_depth);
                            brace_depth += 1;
                            i = end;
                        }
                        TemplateEnd::Unterminated => {
                            return Err(format!(
                                "unterminated template literal near line {}",
                                start_line
                            ));
                        }
                    }
                    last_significant = Some('`');
                } else {
                    last_significant = Some(c);
                }
            }
            _ => {
                out.push(c);
                i += 1;
                if !c.is_whitespace() {
                    last_significant = Some(c);
                }
            }
        }
    }

    Ok(out)
}

enum TemplateEnd {
    Closed(usize),
    Interpolation(usize),
    Unterminated,
}

fn line_of(chars: &[char], idx: usize) -> usize {
    chars[..idx.min(chars.len())]
        .iter()
        .filter(|c| **c == '\n')
        .count()
        + 1
}

/// `https://` inside unquoted CSS `url(...)` must not start a comment.
fn follows_url_scheme(out: &str) -> bool {
    out.ends_with(':')
}

/// A `/` starts a regex literal when it cannot be a division operator.
fn regex_allowed(last: Option<char>) -> bool {
    match last {
        None => true,
        Some(c) => "(,=:[!&|?{};+-*%<>~^".contains(c),
    }
}

fn copy_quoted(chars: &[char], start: usize, quote: char, out: &mut String) -> usize {
    out.push(quote);
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            out.push(c);
            if let Some(n) = chars.get(i + 1) {
                out.push(*n);
            }
            i += 2;
            continue;
        }
        if c == '\n' {
            return i;
        }
        out.push(c);
        i += 1;
        if c == quote {
            return i;
        }
    }
    i
}

fn copy_regex_literal(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('/');
    let mut i = start + 1;
    let mut in_class = false;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                out.push(c);
                if let Some(n) = chars.get(i + 1) {
                    out.push(*n);
                }
                i += 2;
                continue;
            }
            '\n' => return i,
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => {
                out.push(c);
                return i + 1;
            }
            _ => {}
        }
        out.push(c);
        i += 1;
    }
    i
}

fn copy_template(chars: &[char], start: usize, out: &mut String) -> TemplateEnd {
    out.push('`');
    copy_template_body(chars, start + 1, out)
}

fn copy_template_body(chars: &[char], start: usize, out: &mut String) -> TemplateEnd {
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            out.push(c);
            if let Some(n) = chars.get(i + 1) {
                out.push(*n);
            }
            i += 2;
            continue;
        }
        if c == '`' {
            out.push(c);
            return TemplateEnd::Closed(i + 1);
        }
        if c == '$' && chars.get(i + 1) == Some(&'{') {
            out.push_str("${");
            return TemplateEnd::Interpolation(i + 2);
        }
        out.push(c);
        i += 1;
    }
    TemplateEnd::Unterminated
}
