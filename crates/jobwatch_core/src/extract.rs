//! Field extraction from one job card.
use jobwatch_logging::{watch_debug, watch_warn};
use url::Url;

use crate::dom::{DomNode, NodeError};
use crate::links::resolve_url;
use crate::record::{JobRecord, PostedDate};
use crate::site::{non_blank, SiteConfig};

/// Stands in for a posted date the card did not show.
pub const FALLBACK_DATE: &str = "Recently";

type LinkStrategy<N> = fn(&N, &N, &SiteConfig) -> Result<Option<String>, NodeError>;

/// Builds a record from one card, or `None` when the card has no title or
/// no resolvable link.
///
/// Every failure is local to the card: it is logged and the caller moves on
/// to the next one.
pub fn extract_job<N: DomNode>(card: &N, site: &SiteConfig, base: Option<&Url>) -> Option<JobRecord> {
    match extract_fields(card, site, base) {
        Ok(record) => record,
        Err(err) => {
            watch_warn!("Skipping job card on {}: {}", site.name, err);
            None
        }
    }
}

fn extract_fields<N: DomNode>(
    card: &N,
    site: &SiteConfig,
    base: Option<&Url>,
) -> Result<Option<JobRecord>, NodeError> {
    let Some(title_node) = card.find_child(&site.title_selector)? else {
        watch_warn!(
            "Title element not found on {} for a job card. Skipping card.",
            site.name
        );
        return Ok(None);
    };
    let title = title_node.text()?.trim().to_string();
    if title.is_empty() {
        watch_debug!("Empty title on {}. Skipping card.", site.name);
        return Ok(None);
    }

    let Some(link) = extract_link(card, &title_node, site, base) else {
        watch_warn!(
            "Could not find link for '{}' on {}. Skipping card.",
            title,
            site.name
        );
        return Ok(None);
    };

    Ok(Some(JobRecord {
        title,
        link: link.into(),
        description: extract_description(card, site),
        tags: extract_tags(card, site),
        source: site.name.clone(),
        posted_date: extract_date(card, site),
    }))
}

/// Tries the dedicated link selector, then the title element (itself or a
/// nested anchor), then the card itself. The first href that resolves wins.
fn extract_link<N: DomNode>(
    card: &N,
    title: &N,
    site: &SiteConfig,
    base: Option<&Url>,
) -> Option<Url> {
    let strategies: [(&str, LinkStrategy<N>); 3] = [
        ("link selector", link_from_selector::<N>),
        ("title element", link_from_title::<N>),
        ("card element", link_from_card::<N>),
    ];

    for (name, strategy) in strategies {
        match strategy(card, title, site) {
            Ok(Some(href)) => match resolve_url(&href, base) {
                Some(url) => return Some(url),
                None => watch_debug!("Unresolvable href '{}' from {} on {}", href, name, site.name),
            },
            Ok(None) => {}
            Err(err) => watch_debug!("Link lookup via {} failed on {}: {}", name, site.name, err),
        }
    }
    None
}

fn link_from_selector<N: DomNode>(
    card: &N,
    _title: &N,
    site: &SiteConfig,
) -> Result<Option<String>, NodeError> {
    let Some(selector) = non_blank(site.link_selector.as_ref()) else {
        return Ok(None);
    };
    match card.find_child(selector)? {
        Some(node) => href_of(&node),
        None => Ok(None),
    }
}

fn link_from_title<N: DomNode>(
    _card: &N,
    title: &N,
    _site: &SiteConfig,
) -> Result<Option<String>, NodeError> {
    if title.tag_name() == "a" {
        if let Some(href) = href_of(title)? {
            return Ok(Some(href));
        }
    }
    match title.find_child("a")? {
        Some(nested) => href_of(&nested),
        None => Ok(None),
    }
}

fn link_from_card<N: DomNode>(
    card: &N,
    _title: &N,
    _site: &SiteConfig,
) -> Result<Option<String>, NodeError> {
    if card.tag_name() == "a" {
        return href_of(card);
    }
    Ok(None)
}

fn href_of<N: DomNode>(node: &N) -> Result<Option<String>, NodeError> {
    Ok(node
        .attribute("href")?
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty()))
}

fn extract_description<N: DomNode>(card: &N, site: &SiteConfig) -> String {
    let Some(selector) = non_blank(site.description_selector.as_ref()) else {
        return String::new();
    };
    let text = card
        .find_child(selector)
        .and_then(|node| node.map(|n| n.text()).transpose());
    match text {
        Ok(Some(text)) => text.trim().to_string(),
        Ok(None) => {
            watch_debug!("Description not found on {} for a job card.", site.name);
            String::new()
        }
        Err(err) => {
            watch_debug!("Description lookup failed on {}: {}", site.name, err);
            String::new()
        }
    }
}

fn extract_tags<N: DomNode>(card: &N, site: &SiteConfig) -> Vec<String> {
    let Some(selector) = non_blank(site.tags_selector.as_ref()) else {
        return Vec::new();
    };
    let nodes = match card.find_children(selector) {
        Ok(nodes) => nodes,
        Err(err) => {
            watch_debug!("Tag lookup failed on {}: {}", site.name, err);
            return Vec::new();
        }
    };

    let mut tags: Vec<String> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let Ok(text) = node.text() else { continue };
        let tag = text.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

fn extract_date<N: DomNode>(card: &N, site: &SiteConfig) -> PostedDate {
    let Some(selector) = non_blank(site.date_selector.as_ref()) else {
        return PostedDate::Recently;
    };
    let node = match card.find_child(selector) {
        Ok(Some(node)) => node,
        Ok(None) => {
            watch_debug!(
                "Posted date not found on {} for a job card. Defaulting to '{}'.",
                site.name,
                FALLBACK_DATE
            );
            return PostedDate::Recently;
        }
        Err(err) => {
            watch_warn!(
                "Error reading date on {}: {}. Defaulting to '{}'.",
                site.name,
                err,
                FALLBACK_DATE
            );
            return PostedDate::Recently;
        }
    };

    let text = match node.text() {
        Ok(text) => text.trim().to_string(),
        Err(err) => {
            watch_warn!("Error reading date text on {}: {}", site.name, err);
            return PostedDate::Recently;
        }
    };
    if text.is_empty() {
        return PostedDate::Recently;
    }

    let datetime_attr = if node.tag_name() == "time" {
        node.attribute("datetime").ok().flatten()
    } else {
        None
    };
    PostedDate::Raw {
        text,
        datetime_attr,
    }
}
