//! Bookmark naming and anchor-link resolution

use log::{debug, warn};
use std::collections::HashMap;

use crate::document::models::{Inline, LinkTarget};
use crate::html::{NodeId, ParseTree, truncate_bookmark_name};

/// Class token marking an `<a>` as an internal anchor link
pub const ANCHOR_LINK_CLASS: &str = "anchor-link";

/// Bookmark ids for one conversion
///
/// Ids come from a monotonic counter keyed by the (truncated) bookmark
/// name, so every bookmark in a document has a unique numeric id and a
/// name is never bookmarked twice.
#[derive(Debug)]
pub struct BookmarkRegistry {
    max_len: usize,
    next_id: usize,
    ids: HashMap<String, usize>,
}

/// A bookmark ready to be emitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub name: String,
    pub id: usize,
}

impl Bookmark {
    pub fn start(&self) -> Inline {
        Inline::BookmarkStart {
            id: self.id,
            name: self.name.clone(),
        }
    }

    pub fn end(&self) -> Inline {
        Inline::BookmarkEnd { id: self.id }
    }
}

impl BookmarkRegistry {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            next_id: 0,
            ids: HashMap::new(),
        }
    }

    /// Normalise a source id into a bookmark name
    pub fn bookmark_name(&self, source: &str) -> String {
        truncate_bookmark_name(source.trim(), self.max_len)
    }

    /// Claim a bookmark for `source`
    ///
    /// Returns `None` for empty names and for names that were already
    /// claimed earlier in the document.
    pub fn register(&mut self, source: &str) -> Option<Bookmark> {
        let name = self.bookmark_name(source);
        if name.is_empty() {
            return None;
        }
        if self.ids.contains_key(&name) {
            warn!("duplicate bookmark {name:?}; keeping the first occurrence");
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(name.clone(), id);
        Some(Bookmark { name, id })
    }

    /// Number of bookmarks claimed so far
    pub fn count(&self) -> usize {
        self.ids.len()
    }
}

/// Resolve where an `<a>` element points
///
/// * `class="<key> anchor-link"`: the first class token is looked up as an
///   element id anywhere in the document; the link targets that element's
///   `name` attribute, falling back to its `id`.
/// * `href="#fragment"`: internal link to bookmark `fragment`.
/// * any other non-empty `href`: external link.
///
/// `None` means the link cannot be resolved and should render as text.
pub fn resolve_link(tree: &ParseTree, anchor: NodeId, registry: &BookmarkRegistry) -> Option<LinkTarget> {
    if tree.has_class(anchor, ANCHOR_LINK_CLASS) {
        let key = tree.classes(anchor).next()?;
        let Some(target) = tree.find_by_id(key) else {
            warn!("anchor link {key:?} has no matching element");
            return None;
        };
        let name = tree
            .attr(target, "name")
            .or_else(|| tree.attr(target, "id"))
            .unwrap_or(key);
        debug!("anchor link {key:?} resolved to bookmark {name:?}");
        return Some(LinkTarget::Internal(registry.bookmark_name(name)));
    }

    let href = tree.attr(anchor, "href")?.trim();
    if href.is_empty() {
        return None;
    }
    match href.strip_prefix('#') {
        Some(fragment) if !fragment.is_empty() => {
            Some(LinkTarget::Internal(registry.bookmark_name(fragment)))
        }
        Some(_) => None,
        None => Some(LinkTarget::External(href.to_string())),
    }
}
