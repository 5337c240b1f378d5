//! Comment- and string-aware brace matching over source lines.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    BlockComment,
    /// Inside a literal opened by the given quote character.
    Str(char),
}

/// Find the line holding the `}` that closes the first `{` found at or
/// after `start` (0-based index into `lines`).
///
/// Returns the 1-based line number, or `None` if no `{` is found or the
/// input ends before nesting returns to zero. Braces inside `//` and
/// `/* */` comments and inside `"`/`'` literals are ignored.
#[must_use]
pub fn find_matching_close(lines: &[&str], start: usize) -> Option<usize> {
    let mut mode = Mode::Normal;
    let mut depth: usize = 0;
    let mut started = false;

    for (index, line) in lines.iter().enumerate().skip(start) {
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            match mode {
                Mode::BlockComment => {
                    if c == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        mode = Mode::Normal;
                    }
                }
                Mode::Str(quote) => {
                    if c == '\\' {
                        chars.next();
                    } else if c == quote {
                        mode = Mode::Normal;
                    }
                }
                Mode::Normal => match c {
                    '/' if chars.peek() == Some(&'/') => break,
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        mode = Mode::BlockComment;
                    }
                    '"' | '\'' => mode = Mode::Str(c),
                    '{' => {
                        depth += 1;
                        started = true;
                    }
                    '}' if started => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(index + 1);
                        }
                    }
                    _ => {}
                },
            }
        }
    }
    None
}
