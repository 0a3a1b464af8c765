//! Extraction of unresolved constant references from a parsed file.

use crate::reference::UnresolvedReference;
use crate::syntax::{Node, SyntaxTree};
use std::path::Path;

/// Extracts every constant reference from a parsed file, annotated with the
/// namespace nesting active at the point of use.
///
/// Purely mechanical: no validity decisions, no filesystem access, and
/// deterministic for a given tree. A compound namespace name (`A::B`)
/// contributes each of its segments to the nesting; an absolute namespace
/// name (`::A`) restarts the nesting at the top level for its body.
#[must_use]
pub fn extract(referencing_file: &Path, tree: &SyntaxTree) -> Vec<UnresolvedReference> {
    let mut references = Vec::new();
    let mut nesting = Vec::new();
    walk(&tree.nodes, referencing_file, &mut nesting, &mut references);
    references
}

fn walk(
    nodes: &[Node],
    referencing_file: &Path,
    nesting: &mut Vec<String>,
    references: &mut Vec<UnresolvedReference>,
) {
    for node in nodes {
        match node {
            Node::ConstantRef { name, location } => {
                references.push(UnresolvedReference {
                    constant_name: name.clone(),
                    namespace_path: nesting.clone(),
                    referencing_file: referencing_file.to_path_buf(),
                    location: *location,
                });
            }
            Node::Namespace { name, children, .. } => {
                if let Some(absolute) = name.strip_prefix("::") {
                    let saved = std::mem::take(nesting);
                    nesting.extend(segments(absolute));
                    walk(children, referencing_file, nesting, references);
                    *nesting = saved;
                } else {
                    let depth = nesting.len();
                    nesting.extend(segments(name));
                    walk(children, referencing_file, nesting, references);
                    nesting.truncate(depth);
                }
            }
        }
    }
}

fn segments(name: &str) -> impl Iterator<Item = String> + '_ {
    name.split("::").filter(|s| !s.is_empty()).map(String::from)
}
