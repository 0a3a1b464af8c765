//! # packbound-ruby
//!
//! Tree-sitter based Ruby frontend for packbound.
//!
//! [`RubyParser`] lowers Ruby source files into the core's language-neutral
//! syntax IR: module/class bodies become namespace scopes, and constant
//! usages (bare constants, scope resolutions, superclasses) become constant
//! reference nodes. Definition names themselves are not references, and a
//! superclass expression is lowered into the enclosing scope, where Ruby
//! resolves it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use packbound_core::{Node as IrNode, ParseError, Parser, SourceLocation, SyntaxTree};
use std::fs;
use std::path::Path;
use tree_sitter::{Language, Node};

/// Parses Ruby source files into the core syntax IR.
pub struct RubyParser {
    language: Language,
}

impl RubyParser {
    /// Creates a new Ruby parser.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_ruby::LANGUAGE.into(),
        }
    }
}

impl Default for RubyParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for RubyParser {
    fn parse(&self, path: &Path) -> Result<SyntaxTree, ParseError> {
        let source = fs::read_to_string(path).map_err(|e| ParseError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ParseError::Syntax {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| ParseError::Syntax {
                path: path.to_path_buf(),
                message: "parser produced no tree".to_string(),
            })?;
        if tree.root_node().has_error() {
            return Err(ParseError::Syntax {
                path: path.to_path_buf(),
                message: "invalid syntax".to_string(),
            });
        }

        let mut nodes = Vec::new();
        lower_children(&tree.root_node(), source.as_bytes(), &mut nodes);
        Ok(SyntaxTree::new(nodes))
    }
}

fn text<'a>(node: &Node<'_>, src: &'a [u8]) -> &'a str {
    std::str::from_utf8(&src[node.start_byte()..node.end_byte()]).unwrap_or("")
}

fn location(node: &Node<'_>) -> SourceLocation {
    let start = node.start_position();
    SourceLocation::new(start.row + 1, start.column + 1)
}

fn lower_children(node: &Node<'_>, src: &[u8], out: &mut Vec<IrNode>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        lower_into(&child, src, out);
    }
}

fn lower_into(node: &Node<'_>, src: &[u8], out: &mut Vec<IrNode>) {
    match node.kind() {
        "module" | "class" => lower_definition(node, src, out),
        "constant" => {
            out.push(IrNode::constant(text(node, src), location(node)));
        }
        "scope_resolution" => match constant_path(node, src) {
            Some(name) => out.push(IrNode::constant(name, location(node))),
            // Dynamic scope (`something::Const`): only the scope expression
            // can contain real references.
            None => lower_children(node, src, out),
        },
        "assignment" => lower_assignment(node, src, out),
        _ => lower_children(node, src, out),
    }
}

/// Lowers a `module`/`class` definition into a namespace scope.
///
/// The definition name is not itself a reference; a superclass is lowered
/// into the enclosing scope rather than the new one.
fn lower_definition(node: &Node<'_>, src: &[u8], out: &mut Vec<IrNode>) {
    let name = node
        .child_by_field_name("name")
        .and_then(|n| definition_name(&n, src).map(|name| (n, name)));
    let Some((name_node, name)) = name else {
        lower_children(node, src, out);
        return;
    };

    let mut children = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.id() == name_node.id() {
            continue;
        }
        if child.kind() == "superclass" {
            lower_children(&child, src, out);
        } else {
            lower_into(&child, src, &mut children);
        }
    }

    out.push(IrNode::namespace(name, location(&name_node), children));
}

/// Constant assignment targets are definitions, not references.
fn lower_assignment(node: &Node<'_>, src: &[u8], out: &mut Vec<IrNode>) {
    let left = node.child_by_field_name("left");
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let is_constant_target = left.as_ref().is_some_and(|l| l.id() == child.id())
            && matches!(child.kind(), "constant" | "scope_resolution");
        if !is_constant_target {
            lower_into(&child, src, out);
        }
    }
}

fn definition_name(node: &Node<'_>, src: &[u8]) -> Option<String> {
    match node.kind() {
        "constant" => Some(text(node, src).to_owned()),
        "scope_resolution" => constant_path(node, src),
        _ => None,
    }
}

/// Composes `A::B::C` (or `::A`) from a scope resolution whose pieces are
/// all constants; `None` when any piece is a dynamic expression.
fn constant_path(node: &Node<'_>, src: &[u8]) -> Option<String> {
    let name = node.child_by_field_name("name")?;
    if name.kind() != "constant" {
        return None;
    }
    let name_text = text(&name, src);

    match node.child_by_field_name("scope") {
        None => Some(format!("::{name_text}")),
        Some(scope) => match scope.kind() {
            "constant" => Some(format!("{}::{name_text}", text(&scope, src))),
            "scope_resolution" => {
                constant_path(&scope, src).map(|prefix| format!("{prefix}::{name_text}"))
            }
            _ => None,
        },
    }
}
