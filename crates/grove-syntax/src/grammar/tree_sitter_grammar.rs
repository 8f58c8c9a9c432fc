//! Tree-sitter backed grammars.
//!
//! Each reparse hands the previous Tree-sitter tree, adjusted by the edit
//! hint, back to the parser so unchanged regions are reused. The resulting
//! tree is lowered into a [`SyntaxArena`] with a single cursor walk.

use tracing::debug;

use super::{Grammar, PARSE_TARGET, ParseBackend};
use crate::arena::{ArenaBuilder, NodeId, NodeSpec, SyntaxArena};
use crate::document::TextEdit;
use crate::error::SyntaxError;
use crate::language::SupportedLanguage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    Rust,
    Python,
    TypeScript,
}

/// A grammar provided by a Tree-sitter language crate.
#[derive(Debug, Clone, Copy)]
pub struct TreeSitterGrammar {
    binding: Binding,
}

impl TreeSitterGrammar {
    pub(crate) const fn rust() -> Self {
        Self {
            binding: Binding::Rust,
        }
    }

    pub(crate) const fn python() -> Self {
        Self {
            binding: Binding::Python,
        }
    }

    pub(crate) const fn typescript() -> Self {
        Self {
            binding: Binding::TypeScript,
        }
    }

    /// Returns the Tree-sitter language for this grammar.
    ///
    /// TypeScript uses the TSX dialect, which accepts plain TypeScript too.
    #[must_use]
    pub fn tree_sitter_language(&self) -> tree_sitter::Language {
        match self.binding {
            Binding::Rust => tree_sitter_rust::LANGUAGE.into(),
            Binding::Python => tree_sitter_python::LANGUAGE.into(),
            Binding::TypeScript => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

impl Grammar for TreeSitterGrammar {
    fn language(&self) -> SupportedLanguage {
        match self.binding {
            Binding::Rust => SupportedLanguage::Rust,
            Binding::Python => SupportedLanguage::Python,
            Binding::TypeScript => SupportedLanguage::TypeScript,
        }
    }

    fn has_node_kind(&self, kind: &str, named: bool) -> bool {
        (named && kind == "ERROR") || self.tree_sitter_language().id_for_node_kind(kind, named) != 0
    }

    fn has_field(&self, field: &str) -> bool {
        self.tree_sitter_language()
            .field_id_for_name(field)
            .is_some()
    }

    fn backend(&self) -> Result<Box<dyn ParseBackend>, SyntaxError> {
        let language = self.language();
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.tree_sitter_language())
            .map_err(|e| SyntaxError::parser_init(language, e.to_string()))?;
        Ok(Box::new(TreeSitterBackend {
            language,
            parser,
            previous: None,
        }))
    }
}

struct TreeSitterBackend {
    language: SupportedLanguage,
    parser: tree_sitter::Parser,
    previous: Option<tree_sitter::Tree>,
}

impl ParseBackend for TreeSitterBackend {
    fn language(&self) -> SupportedLanguage {
        self.language
    }

    fn parse(
        &mut self,
        source: &str,
        edit: Option<&TextEdit>,
    ) -> Result<SyntaxArena, SyntaxError> {
        let old_tree = match (self.previous.as_mut(), edit) {
            (Some(tree), Some(hint)) => {
                tree.edit(&tree_sitter::InputEdit::from(hint));
                Some(&*tree)
            }
            _ => None,
        };
        debug!(
            target: PARSE_TARGET,
            language = %self.language,
            incremental = old_tree.is_some(),
            source_bytes = source.len(),
            "running tree-sitter parse"
        );

        let Some(tree) = self.parser.parse(source, old_tree) else {
            self.previous = None;
            return Err(SyntaxError::parse(self.language, "parsing failed"));
        };
        let arena = lower(&tree, source);
        self.previous = Some(tree);
        Ok(arena)
    }
}

/// Copies a Tree-sitter tree into an arena in pre-order.
fn lower(tree: &tree_sitter::Tree, source: &str) -> SyntaxArena {
    let mut builder = ArenaBuilder::new(source);
    let mut parents: Vec<NodeId> = Vec::new();
    let mut cursor = tree.walk();

    loop {
        let node = cursor.node();
        let spec = NodeSpec::new(node.kind(), node.is_named(), node.byte_range())
            .with_field(cursor.field_name())
            .with_error(node.is_error())
            .with_missing(node.is_missing());
        let id = builder.push(parents.last().copied(), spec);

        if cursor.goto_first_child() {
            parents.push(id);
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return builder.finish();
            }
            parents.pop();
        }
    }
}
