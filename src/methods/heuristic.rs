//! Pattern-based method extraction for brace languages without a grammar.
//!
//! Lines are visited top to bottom. An unclaimed line that could start a
//! signature is joined with a few following lines until a `{` or `;`
//! appears, then matched against an ordered list of signature patterns.
//! A match is bounded with the brace scanner and its lines are claimed so
//! nested members are not reported twice.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{extension, ExtractedMethod, MethodExtractor};
use crate::error::Result;
use crate::scanner::find_matching_close;

/// Extra lines joined onto a candidate while looking for `{` or `;`.
const MAX_LOOKAHEAD: usize = 5;

const EXTENSIONS: &[&str] = &[
    "c", "h", "cc", "cpp", "cxx", "c++", "hh", "hpp", "hxx", "ino", "cs", "java", "kt", "kts",
    "swift", "scala", "dart", "groovy", "m", "mm",
];

const KEYWORDS: &[&str] = &[
    "if", "else", "for", "foreach", "while", "do", "switch", "case", "default", "catch", "try",
    "finally", "return", "sizeof", "alignof", "typeof", "decltype", "new", "delete", "throw",
    "throws", "goto", "using", "namespace", "class", "struct", "enum", "union", "typedef",
    "template", "typename", "static_assert", "instanceof", "lock", "synchronized", "when",
    "match", "guard", "defer", "repeat", "yield", "await", "assert", "super", "this", "base",
];

/// Signature patterns, most specific first. Each captures the method name
/// in group 1 and is matched against text truncated before the first `{`.
static PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("destructor", r"^\s*(?:virtual\s+)?((?:\w+::)*~\w+)\s*\("),
        (
            "qualified",
            r"^\s*(?:[\w:<>,*&]+[\s*&]+)*?((?:\w+::)+\w+)\s*\(",
        ),
        (
            "constructor",
            r"^\s*(?:(?:public|private|protected|internal|explicit|inline|static)\s+)*(\w+)\s*\([^)]*\)\s*(?::[^{]*)?(?:throws\s+[\w.,\s]+)?\s*$",
        ),
        (
            "operator",
            r"^\s*(?:[\w:<>,*&]+[\s*&]+)*?((?:\w+::)*operator\s*(?:\(\)|\[\]|[^\s\w(]+|\s+\w+))\s*\(",
        ),
        (
            "complex_return",
            r"^\s*[\w:<>,\s*&]*[>*&]\s*((?:\w+::)*\w+)\s*\(",
        ),
        (
            "member",
            r"^\s*(?:(?:public|private|protected|internal|static|virtual|override|final|abstract|async|synchronized|inline|extern|constexpr|open|fun|func|def|suspend|unsafe|sealed|partial|native|mutating)\s+)+(?:[\w<>\[\],.?:*&]+\s+)*?(\w+)\s*(?:<[^>]*>)?\s*\(",
        ),
        ("objc_method", r"^\s*[-+]\s*\([^)]*\)\s*(\w+)"),
        (
            "function",
            r"^\s*(?:[\w:<>\[\],.?*&]+\s+)+((?:\w+(?:::|\.))*\w+)\s*\(",
        ),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).unwrap()))
    .collect()
});

static BARE_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:(?:public|private|protected|internal|static|final|abstract|sealed|export|data|open|partial)\s+)*(?:class|struct|namespace|interface|enum|union|typedef|using|package|import|object|record|protocol|extension|trait)\b",
    )
    .unwrap()
});

static OBJC_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*@(?:implementation|interface|protocol|end|property|synthesize|dynamic|class)\b",
    )
    .unwrap()
});

static TEMPLATE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*template\s*<[^(]*$").unwrap());

static LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\w+\s*:\s*$").unwrap());

static ANNOTATIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:@[\w.]+(?:\([^)]*\))?\s*)+").unwrap());

/// Fallback extractor for C-family, JVM-family and Objective-C sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExtractor;

impl MethodExtractor for HeuristicExtractor {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn supports(&self, path: &Path) -> bool {
        extension(path).is_some_and(|ext| EXTENSIONS.contains(&ext.as_str()))
    }

    fn extract(&self, path: &Path, source: &str) -> Result<Vec<ExtractedMethod>> {
        let lines: Vec<&str> = source.lines().collect();
        let methods = Scan::new(&lines).run();
        debug!(
            "heuristic extractor found {} methods in {}",
            methods.len(),
            path.display()
        );
        Ok(methods)
    }
}

/// Line-consumption state: the cursor and which lines belong to a method
/// already reported.
struct Scan<'a> {
    lines: &'a [&'a str],
    claimed: Vec<bool>,
    cursor: usize,
}

impl<'a> Scan<'a> {
    fn new(lines: &'a [&'a str]) -> Self {
        Self {
            lines,
            claimed: vec![false; lines.len()],
            cursor: 0,
        }
    }

    fn run(mut self) -> Vec<ExtractedMethod> {
        let mut methods = Vec::new();
        while self.cursor < self.lines.len() {
            let index = self.cursor;
            self.cursor += 1;
            if self.claimed[index] || is_skippable(self.lines[index]) {
                continue;
            }
            let Some(signature) = self.signature(index) else {
                continue;
            };
            let Some(name) = match_name(&signature) else {
                continue;
            };
            // Unterminated bodies are dropped rather than guessed.
            let Some(end) = find_matching_close(self.lines, index) else {
                continue;
            };
            for claimed in &mut self.claimed[index..end] {
                *claimed = true;
            }
            methods.push(ExtractedMethod {
                name,
                start_line: (index + 1) as u32,
                end_line: end as u32,
                complexity: None,
            });
        }
        methods
    }

    /// Join `index` with up to `MAX_LOOKAHEAD` following lines until a `{`
    /// or `;` appears. Returns the text before the `{`, or `None` when the
    /// statement ends with `;` first or no terminator is found.
    fn signature(&self, index: usize) -> Option<String> {
        let mut combined = self.lines[index].to_string();
        let mut next = index + 1;
        while !combined.contains(['{', ';'])
            && next <= index + MAX_LOOKAHEAD
            && next < self.lines.len()
            && !self.claimed[next]
        {
            combined.push(' ');
            combined.push_str(self.lines[next]);
            next += 1;
        }

        let terminator = combined.find(['{', ';'])?;
        if combined[terminator..].starts_with(';') {
            return None;
        }
        combined.truncate(terminator);
        // A `{` inside an argument list opens an initializer, not a body.
        if combined.matches('(').count() != combined.matches(')').count() {
            return None;
        }
        Some(ANNOTATIONS.replace(&combined, "").into_owned())
    }
}

fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
        || trimmed.starts_with('#')
        || (trimmed.starts_with('@') && ANNOTATIONS.replace(trimmed, "").trim().is_empty())
        || (trimmed.ends_with(';') && !trimmed.contains('{'))
        || BARE_DECLARATION.is_match(trimmed)
        || OBJC_DIRECTIVE.is_match(trimmed)
        || TEMPLATE_HEADER.is_match(trimmed)
        || LABEL.is_match(trimmed)
}

/// First accepted name from the ordered patterns.
fn match_name(signature: &str) -> Option<String> {
    for (kind, pattern) in PATTERNS.iter() {
        let Some(caps) = pattern.captures(signature) else {
            continue;
        };
        let name = collapse_whitespace(&caps[1]);
        // `Type::operator()(...)` also fits the qualified pattern.
        if name.ends_with("::operator") {
            continue;
        }
        if !is_valid_name(&name) {
            return None;
        }
        debug!("Matched {} signature '{}'", kind, name);
        return Some(name);
    }
    None
}

fn is_valid_name(name: &str) -> bool {
    let head = name.find("operator").map_or(name, |i| &name[..i]);
    let last = name.rsplit([':', '.']).next().unwrap_or(name);
    !name.is_empty()
        && !last.is_empty()
        && !last.starts_with(|c: char| c.is_ascii_digit())
        && !KEYWORDS.contains(&last.trim_start_matches('~'))
        && head
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | ':' | '.' | '~'))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
