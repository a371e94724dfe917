use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("invalid selector '{0}'")]
    InvalidSelector(String),
    /// The rendering backend failed while answering a query (stale node,
    /// dropped connection, ...).
    #[error("dom backend error: {0}")]
    Backend(String),
}

/// Read-only view of one element in a rendered page.
///
/// Both a parsed HTML tree and a live browser element can answer these
/// queries, which keeps field extraction independent of the backend.
pub trait DomNode: Sized {
    /// First descendant matching a CSS selector.
    fn find_child(&self, selector: &str) -> Result<Option<Self>, NodeError>;

    /// All descendants matching a CSS selector, in document order.
    fn find_children(&self, selector: &str) -> Result<Vec<Self>, NodeError>;

    /// Rendered text content, whitespace-collapsed.
    fn text(&self) -> Result<String, NodeError>;

    fn attribute(&self, name: &str) -> Result<Option<String>, NodeError>;

    /// Lower-case element name, e.g. `"a"`.
    fn tag_name(&self) -> String;
}
