//! `DomNode` over a parsed HTML snapshot of the rendered page.
use jobwatch_core::{DomNode, NodeError};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// One element of a [`PageSnapshot`].
#[derive(Debug, Clone, Copy)]
pub struct HtmlNode<'a>(ElementRef<'a>);

fn parse_selector(selector: &str) -> Result<Selector, NodeError> {
    Selector::parse(selector)
        .map_err(|err| NodeError::InvalidSelector(format!("{selector}: {err}")))
}

fn collapse_whitespace<'s>(parts: impl Iterator<Item = &'s str>) -> String {
    let mut out = String::new();
    for word in parts.flat_map(str::split_whitespace) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

impl<'a> DomNode for HtmlNode<'a> {
    fn find_child(&self, selector: &str) -> Result<Option<Self>, NodeError> {
        let selector = parse_selector(selector)?;
        Ok(self.0.select(&selector).next().map(HtmlNode))
    }

    fn find_children(&self, selector: &str) -> Result<Vec<Self>, NodeError> {
        let selector = parse_selector(selector)?;
        Ok(self.0.select(&selector).map(HtmlNode).collect())
    }

    fn text(&self) -> Result<String, NodeError> {
        Ok(collapse_whitespace(self.0.text()))
    }

    fn attribute(&self, name: &str) -> Result<Option<String>, NodeError> {
        Ok(self.0.value().attr(name).map(str::to_string))
    }

    fn tag_name(&self) -> String {
        self.0.value().name().to_ascii_lowercase()
    }
}

/// Page source parsed once so cards can be queried without further browser
/// round trips.
pub struct PageSnapshot {
    document: Html,
    base: Option<Url>,
}

impl PageSnapshot {
    /// `page_url` is used to resolve relative links; an unparseable URL
    /// leaves them unresolvable.
    pub fn parse(source: &str, page_url: Option<&str>) -> Self {
        Self {
            document: Html::parse_document(source),
            base: page_url.and_then(|url| Url::parse(url).ok()),
        }
    }

    pub fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    /// Every element matching the card selector, in document order.
    pub fn cards(&self, selector: &str) -> Result<Vec<HtmlNode<'_>>, NodeError> {
        let selector = parse_selector(selector)?;
        Ok(self.document.select(&selector).map(HtmlNode).collect())
    }

    /// Trimmed text of the first element matching `selector`, if non-empty.
    pub fn first_text(&self, selector: &str) -> Result<Option<String>, NodeError> {
        let selector = parse_selector(selector)?;
        Ok(self
            .document
            .select(&selector)
            .next()
            .map(|element| collapse_whitespace(element.text()))
            .filter(|text| !text.is_empty()))
    }
}
