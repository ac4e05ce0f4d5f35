//! Reversible search-term highlighting over a card's text subtree.
//!
//! A card's content is a small tree of text, element and highlight nodes.
//! [`Fragment::highlight`] splits text nodes around every case-insensitive
//! occurrence of a term and wraps each occurrence in a highlight node;
//! element nodes are descended into, never rewritten, so nested markup
//! survives. [`Fragment::clear`] turns highlights back into text and merges
//! adjacent text nodes, leaving the text content exactly as it was.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// One node of a card's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    Text(String),
    Element { tag: String, children: Vec<Node> },
    /// A highlighted occurrence of the search term
    Highlight(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn element(tag: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Element {
            tag: tag.into(),
            children,
        }
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Node::Text(s) | Node::Highlight(s) => out.push_str(s),
            Node::Element { children, .. } => children.iter().for_each(|c| c.push_text(out)),
        }
    }

    fn push_marked(&self, open: &str, close: &str, out: &mut String) {
        match self {
            Node::Text(s) => out.push_str(s),
            Node::Highlight(s) => {
                out.push_str(open);
                out.push_str(s);
                out.push_str(close);
            }
            Node::Element { children, .. } => children
                .iter()
                .for_each(|c| c.push_marked(open, close, out)),
        }
    }
}

/// The text subtree of one card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    nodes: Vec<Node>,
}

impl Fragment {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// A fragment holding a single text node
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![Node::text(text)])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Concatenated text of every node, highlights included
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.nodes.iter().for_each(|n| n.push_text(&mut out));
        out
    }

    /// Text content with each highlight wrapped in `open`/`close`
    pub fn marked_text(&self, open: &str, close: &str) -> String {
        let mut out = String::new();
        self.nodes
            .iter()
            .for_each(|n| n.push_marked(open, close, &mut out));
        out
    }

    pub fn has_highlights(&self) -> bool {
        fn any(nodes: &[Node]) -> bool {
            nodes.iter().any(|n| match n {
                Node::Highlight(_) => true,
                Node::Element { children, .. } => any(children),
                Node::Text(_) => false,
            })
        }
        any(&self.nodes)
    }

    /// Wrap every case-insensitive occurrence of `term` in a highlight node.
    ///
    /// The term is matched literally; regex metacharacters in it have no
    /// special meaning. Text already inside a highlight is left alone.
    /// Returns the number of occurrences wrapped.
    pub fn highlight(&mut self, term: &str) -> usize {
        let Some(pattern) = term_pattern(term) else {
            return 0;
        };
        highlight_nodes(&mut self.nodes, &pattern)
    }

    /// Undo every highlight and merge the resulting adjacent text nodes
    pub fn clear(&mut self) {
        clear_nodes(&mut self.nodes);
    }
}

fn term_pattern(term: &str) -> Option<Regex> {
    if term.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
        .map_err(|e| tracing::warn!(error = %e, "Could not build highlight pattern"))
        .ok()
}

fn highlight_nodes(nodes: &mut Vec<Node>, pattern: &Regex) -> usize {
    let mut count = 0;
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        match node {
            Node::Text(text) => {
                let mut last = 0;
                for m in pattern.find_iter(&text) {
                    if m.start() > last {
                        out.push(Node::Text(text[last..m.start()].to_string()));
                    }
                    out.push(Node::Highlight(m.as_str().to_string()));
                    last = m.end();
                    count += 1;
                }
                if last == 0 {
                    out.push(Node::Text(text));
                } else if last < text.len() {
                    out.push(Node::Text(text[last..].to_string()));
                }
            }
            Node::Element { tag, mut children } => {
                count += highlight_nodes(&mut children, pattern);
                out.push(Node::Element { tag, children });
            }
            highlight @ Node::Highlight(_) => out.push(highlight),
        }
    }
    *nodes = out;
    count
}

fn clear_nodes(nodes: &mut Vec<Node>) {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        let node = match node {
            Node::Highlight(text) => Node::Text(text),
            Node::Element { tag, mut children } => {
                clear_nodes(&mut children);
                Node::Element { tag, children }
            }
            text => text,
        };
        if let Node::Text(text) = &node {
            if text.is_empty() {
                continue;
            }
            if let Some(Node::Text(prev)) = out.last_mut() {
                prev.push_str(text);
                continue;
            }
        }
        out.push(node);
    }
    *nodes = out;
}

/// Highlight `term` in a plain string, wrapping matches in `open`/`close`
pub fn mark_plain(text: &str, term: &str, open: &str, close: &str) -> String {
    let mut fragment = Fragment::text(text);
    fragment.highlight(term);
    fragment.marked_text(open, close)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> Fragment {
        Fragment::new(vec![
            Node::element("h3", vec![Node::text("Análise Crítica do Discurso")]),
            Node::element(
                "p",
                vec![
                    Node::text("Org. "),
                    Node::element("strong", vec![Node::text("Ana Lima")]),
                    Node::text(" e análise de corpus"),
                ],
            ),
        ])
    }

    #[test]
    fn test_highlight_all_occurrences_case_insensitive() {
        let mut fragment = card();
        let count = fragment.highlight("análise");
        assert_eq!(count, 2);
        assert_eq!(
            fragment.marked_text("[", "]"),
            "[Análise] Crítica do DiscursoOrg. Ana Lima e [análise] de corpus"
        );
    }

    #[test]
    fn test_highlight_preserves_nested_markup() {
        let mut fragment = card();
        fragment.highlight("lima");
        let Node::Element { children, .. } = &fragment.nodes()[1] else {
            panic!("expected element");
        };
        assert_eq!(
            children[1],
            Node::element(
                "strong",
                vec![Node::text("Ana "), Node::Highlight("Lima".to_string())]
            )
        );
        assert_eq!(children[0], Node::text("Org. "));
    }

    #[test]
    fn test_clear_restores_original() {
        let original = card();
        let mut fragment = original.clone();
        fragment.highlight("a");
        assert!(fragment.has_highlights());
        fragment.clear();
        assert!(!fragment.has_highlights());
        assert_eq!(fragment, original);
        assert_eq!(fragment.text_content(), original.text_content());
    }

    #[test]
    fn test_regex_special_characters_are_literal() {
        for term in ["(", ".*", "a+b", "[x]", "\\d", "$", "?"] {
            let original = Fragment::text(format!("texto {term} com a+b e (x)"));
            let mut fragment = original.clone();
            fragment.highlight(term);
            assert_eq!(fragment.text_content(), original.text_content());
            fragment.clear();
            assert_eq!(fragment.text_content(), original.text_content());
        }

        let mut fragment = Fragment::text("um.dois");
        assert_eq!(fragment.highlight(".*"), 0);
        assert_eq!(fragment.highlight("."), 1);
    }

    #[test]
    fn test_empty_term_is_noop() {
        let mut fragment = card();
        assert_eq!(fragment.highlight(""), 0);
        assert_eq!(fragment, card());
    }

    #[test]
    fn test_existing_highlights_are_not_nested() {
        let mut fragment = Fragment::text("corpus corpus");
        fragment.highlight("corpus");
        assert_eq!(fragment.highlight("corpus"), 0);
        assert_eq!(fragment.marked_text("<", ">"), "<corpus> <corpus>");
    }

    #[test]
    fn test_mark_plain() {
        assert_eq!(
            mark_plain("Estudos do Discurso", "DISCURSO", "*", "*"),
            "Estudos do *Discurso*"
        );
    }
}
