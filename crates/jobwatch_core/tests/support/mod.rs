//! In-memory DOM used to drive the extractor without a parser or browser.
#![allow(dead_code)]

use std::sync::Once;

use jobwatch_core::{DomNode, NodeError};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(jobwatch_logging::initialize_for_tests);
}

/// Selector that makes every lookup fail, to exercise error paths.
pub const BROKEN_SELECTOR: &str = "!broken";

#[derive(Debug, Clone, Default)]
pub struct FakeNode {
    tag: String,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<FakeNode>,
}

impl FakeNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn child(mut self, child: FakeNode) -> Self {
        self.children.push(child);
        self
    }

    fn matches_compound(&self, compound: &str) -> bool {
        let mut parts = compound.split('.');
        let tag = parts.next().unwrap_or_default();
        if !tag.is_empty() && tag != self.tag {
            return false;
        }
        parts.all(|class| self.classes.iter().any(|c| c == class))
    }

    fn descendants(&self, out: &mut Vec<FakeNode>) {
        for child in &self.children {
            out.push(child.clone());
            child.descendants(out);
        }
    }

    fn select(&self, selector: &str) -> Result<Vec<FakeNode>, NodeError> {
        if selector == BROKEN_SELECTOR {
            return Err(NodeError::Backend("node went stale".to_string()));
        }
        let mut scope = vec![self.clone()];
        for compound in selector.split_whitespace() {
            let mut next = Vec::new();
            for node in &scope {
                let mut all = Vec::new();
                node.descendants(&mut all);
                next.extend(all.into_iter().filter(|n| n.matches_compound(compound)));
            }
            scope = next;
        }
        Ok(scope)
    }
}

impl DomNode for FakeNode {
    fn find_child(&self, selector: &str) -> Result<Option<Self>, NodeError> {
        Ok(self.select(selector)?.into_iter().next())
    }

    fn find_children(&self, selector: &str) -> Result<Vec<Self>, NodeError> {
        self.select(selector)
    }

    fn text(&self) -> Result<String, NodeError> {
        let mut parts = vec![self.text.clone()];
        for child in &self.children {
            parts.push(child.text()?);
        }
        Ok(parts
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn attribute(&self, name: &str) -> Result<Option<String>, NodeError> {
        Ok(self
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone()))
    }

    fn tag_name(&self) -> String {
        self.tag.clone()
    }
}
