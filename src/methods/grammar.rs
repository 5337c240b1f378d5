//! Method extraction driven by tree-sitter grammars.
//!
//! A declaration query per language captures `@decl` (the whole
//! function/method node), `@name`, `@params`, and optionally `@owner`
//! (impl type, class, or receiver). When one declaration is matched by
//! several patterns, the one with an owner wins.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use super::{extension, ExtractedMethod, MethodExtractor};
use crate::error::{CovtreeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrammarLang {
    Rust,
    Python,
    TypeScript,
    Go,
}

impl GrammarLang {
    #[must_use]
    pub fn from_ext(ext: &str) -> Option<Self> {
        match ext {
            "rs" => Some(Self::Rust),
            "py" | "pyi" => Some(Self::Python),
            "ts" | "tsx" | "mts" | "cts" | "js" | "jsx" | "mjs" | "cjs" => Some(Self::TypeScript),
            "go" => Some(Self::Go),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Python => "python",
            Self::TypeScript => "typescript",
            Self::Go => "go",
        }
    }

    fn grammar(self, path: &Path) -> Language {
        match self {
            Self::Rust => tree_sitter_rust::language(),
            Self::Python => tree_sitter_python::language(),
            Self::TypeScript => match extension(path).as_deref() {
                Some("tsx" | "jsx") => tree_sitter_typescript::language_tsx(),
                _ => tree_sitter_typescript::language_typescript(),
            },
            Self::Go => tree_sitter_go::language(),
        }
    }

    fn declarations(self) -> &'static str {
        match self {
            Self::Rust => RUST_DECLS,
            Self::Python => PYTHON_DECLS,
            Self::TypeScript => TYPESCRIPT_DECLS,
            Self::Go => GO_DECLS,
        }
    }

    fn separator(self) -> &'static str {
        match self {
            Self::Rust => "::",
            _ => ".",
        }
    }

    /// Whether `node` is a decision point for cyclomatic complexity.
    fn is_decision(self, node: Node, source: &[u8]) -> bool {
        let kind = node.kind();
        match self {
            Self::Rust => match kind {
                "if_expression" | "if_let_expression" | "while_expression"
                | "while_let_expression" | "for_expression" | "loop_expression" => true,
                "match_arm" => !is_wildcard_arm(node, source),
                "binary_expression" => has_operator(node, &["&&", "||"]),
                _ => false,
            },
            Self::Python => match kind {
                "if_statement" | "elif_clause" | "for_statement" | "while_statement"
                | "conditional_expression" | "boolean_operator" | "except_clause" => true,
                "case_clause" => !is_wildcard_case(node, source),
                _ => false,
            },
            Self::TypeScript => match kind {
                "if_statement" | "for_statement" | "for_in_statement" | "while_statement"
                | "do_statement" | "switch_case" | "ternary_expression" | "catch_clause" => true,
                "binary_expression" => has_operator(node, &["&&", "||", "??"]),
                _ => false,
            },
            Self::Go => match kind {
                "if_statement" | "for_statement" | "expression_case" | "type_case"
                | "communication_case" => true,
                "binary_expression" => has_operator(node, &["&&", "||"]),
                _ => false,
            },
        }
    }

    /// Base 1 plus one per decision point inside the declaration's body.
    fn complexity(self, decl: Node, source: &[u8]) -> u32 {
        let Some(body) = decl.child_by_field_name("body") else {
            return 1;
        };
        let mut count = 1;
        let mut stack = vec![body];
        while let Some(node) = stack.pop() {
            if self.is_decision(node, source) {
                count += 1;
            }
            let mut cursor = node.walk();
            stack.extend(node.children(&mut cursor));
        }
        count
    }
}

const RUST_DECLS: &str = r"
(function_item
  name: (identifier) @name
  parameters: (parameters) @params) @decl

(impl_item
  type: (_) @owner
  body: (declaration_list
    (function_item
      name: (identifier) @name
      parameters: (parameters) @params) @decl))

(trait_item
  name: (type_identifier) @owner
  body: (declaration_list
    (function_item
      name: (identifier) @name
      parameters: (parameters) @params) @decl))
";

const PYTHON_DECLS: &str = r"
(function_definition
  name: (identifier) @name
  parameters: (parameters) @params) @decl

(class_definition
  name: (identifier) @owner
  body: (block
    (function_definition
      name: (identifier) @name
      parameters: (parameters) @params) @decl))

(class_definition
  name: (identifier) @owner
  body: (block
    (decorated_definition
      definition: (function_definition
        name: (identifier) @name
        parameters: (parameters) @params) @decl)))
";

const TYPESCRIPT_DECLS: &str = r"
(function_declaration
  name: (identifier) @name
  parameters: (formal_parameters) @params) @decl

(generator_function_declaration
  name: (identifier) @name
  parameters: (formal_parameters) @params) @decl

(method_definition
  name: (_) @name
  parameters: (formal_parameters) @params) @decl

(class_declaration
  name: (type_identifier) @owner
  body: (class_body
    (method_definition
      name: (_) @name
      parameters: (formal_parameters) @params) @decl))

(variable_declarator
  name: (identifier) @name
  value: (arrow_function
    parameters: (formal_parameters) @params) @decl)
";

const GO_DECLS: &str = r"
(function_declaration
  name: (identifier) @name
  parameters: (parameter_list) @params) @decl

(method_declaration
  name: (field_identifier) @name
  parameters: (parameter_list) @params) @decl

(method_declaration
  receiver: (parameter_list
    (parameter_declaration
      type: [
        (type_identifier) @owner
        (pointer_type (type_identifier) @owner)
      ]))
  name: (field_identifier) @name
  parameters: (parameter_list) @params) @decl
";

fn text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or_default()
}

fn has_operator(node: Node, operators: &[&str]) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && operators.contains(&child.kind()));
    found
}

fn is_wildcard_arm(node: Node, source: &[u8]) -> bool {
    node.child_by_field_name("pattern")
        .is_some_and(|p| text(p, source).trim() == "_")
}

fn is_wildcard_case(node: Node, source: &[u8]) -> bool {
    text(node, source)
        .trim_start()
        .strip_prefix("case")
        .and_then(|rest| rest.trim_start().strip_prefix('_'))
        .is_some_and(|rest| rest.trim_start().starts_with(':'))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct Candidate<'tree> {
    decl: Node<'tree>,
    name: String,
    qualified: bool,
}

/// Grammar-aware extractor for one language.
pub struct GrammarExtractor {
    lang: GrammarLang,
}

impl GrammarExtractor {
    pub fn new(lang: GrammarLang) -> Self {
        Self { lang }
    }

    fn failure(&self, path: &Path, reason: impl Into<String>) -> CovtreeError {
        CovtreeError::AnalysisFailed {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }
}

impl MethodExtractor for GrammarExtractor {
    fn name(&self) -> &'static str {
        self.lang.name()
    }

    fn supports(&self, path: &Path) -> bool {
        extension(path)
            .and_then(|ext| GrammarLang::from_ext(&ext))
            .is_some_and(|lang| lang == self.lang)
    }

    fn extract(&self, path: &Path, source: &str) -> Result<Vec<ExtractedMethod>> {
        let language = self.lang.grammar(path);

        let mut parser = Parser::new();
        parser
            .set_language(language)
            .map_err(|e| self.failure(path, format!("{e:?}")))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| self.failure(path, "parser produced no tree"))?;
        let query = Query::new(language, self.lang.declarations())
            .map_err(|e| self.failure(path, format!("{e:?}")))?;

        let decl_idx = query.capture_index_for_name("decl");
        let name_idx = query.capture_index_for_name("name");
        let owner_idx = query.capture_index_for_name("owner");
        let params_idx = query.capture_index_for_name("params");

        let bytes = source.as_bytes();
        let mut cursor = QueryCursor::new();
        let mut found: BTreeMap<(usize, usize), Candidate> = BTreeMap::new();

        for m in cursor.matches(&query, tree.root_node(), bytes) {
            let (mut decl, mut name, mut owner, mut params) = (None, None, None, None);
            for capture in m.captures {
                let index = Some(capture.index);
                if index == decl_idx {
                    decl = Some(capture.node);
                } else if index == name_idx {
                    name = Some(capture.node);
                } else if index == owner_idx {
                    owner = Some(capture.node);
                } else if index == params_idx {
                    params = Some(capture.node);
                }
            }
            let (Some(decl), Some(name)) = (decl, name) else {
                continue;
            };

            let key = (decl.start_byte(), decl.end_byte());
            let qualified = owner.is_some();
            if found.get(&key).is_some_and(|c| c.qualified || !qualified) {
                continue;
            }

            let mut full = match owner {
                Some(owner) => format!(
                    "{}{}{}",
                    text(owner, bytes),
                    self.lang.separator(),
                    text(name, bytes)
                ),
                None => text(name, bytes).to_string(),
            };
            if let Some(params) = params {
                full.push_str(&collapse_whitespace(text(params, bytes)));
            }
            found.insert(
                key,
                Candidate {
                    decl,
                    name: full,
                    qualified,
                },
            );
        }

        let methods: Vec<ExtractedMethod> = found
            .into_values()
            .map(|c| ExtractedMethod {
                name: c.name,
                start_line: (c.decl.start_position().row + 1) as u32,
                end_line: (c.decl.end_position().row + 1) as u32,
                complexity: Some(self.lang.complexity(c.decl, bytes)),
            })
            .collect();
        debug!(
            "{} extractor found {} methods in {}",
            self.lang.name(),
            methods.len(),
            path.display()
        );
        Ok(methods)
    }
}
