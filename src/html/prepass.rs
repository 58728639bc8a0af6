//! Tree rewrites applied before conversion
//!
//! Both passes only touch `href`/`id` attributes. Once they have run the
//! tree is treated as read-only.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use super::tree::ParseTree;

// `onclick="jumptosection('some-id');"` style navigation handlers
static JUMP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"jumptosection\('([A-Za-z0-9-]+)'\);").unwrap());

/// Cut `name` down to its first `max_len` characters
pub fn truncate_bookmark_name(name: &str, max_len: usize) -> String {
    name.chars().take(max_len).collect()
}

/// Give every scripted jump link a plain `#fragment` href
///
/// Returns the number of anchors rewritten.
pub fn rewrite_jump_links(tree: &mut ParseTree) -> usize {
    let mut rewrites = Vec::new();

    for node in tree.find_all(tree.root(), "a") {
        let Some(onclick) = tree.attr(node, "onclick") else {
            continue;
        };
        if let Some(target) = JUMP_PATTERN.captures(onclick).and_then(|caps| caps.get(1)) {
            rewrites.push((node, format!("#{}", target.as_str())));
        }
    }

    let count = rewrites.len();
    for (node, href) in rewrites {
        debug!("rewriting scripted jump link to {href}");
        tree.set_attr(node, "href", href);
    }
    count
}

/// Truncate oversized fragment ids on both ends of internal links
///
/// A link `href="#<id>"` whose id is longer than `max_len` characters is
/// shortened to its first `max_len` characters, and so is the `id` of the
/// element it points at. Links whose target does not exist are left alone.
/// Every link to a renamed target is rewritten, not just the first.
///
/// Returns the number of target ids that were shortened.
pub fn truncate_long_anchor_ids(tree: &mut ParseTree, max_len: usize) -> usize {
    let links: Vec<_> = tree
        .find_all(tree.root(), "a")
        .into_iter()
        .filter_map(|node| {
            let fragment = tree.attr(node, "href")?.split_once('#')?.1;
            (fragment.chars().count() > max_len).then(|| (node, fragment.to_string()))
        })
        .collect();

    let mut renamed: HashSet<String> = HashSet::new();
    for (_, fragment) in &links {
        if renamed.contains(fragment) {
            continue;
        }
        if let Some(target) = tree.find_by_id(fragment) {
            let short = truncate_bookmark_name(fragment, max_len);
            debug!("truncating anchor id {fragment} to {short}");
            tree.set_attr(target, "id", short);
            renamed.insert(fragment.clone());
        }
    }

    for (node, fragment) in links {
        if renamed.contains(&fragment) {
            let short = truncate_bookmark_name(&fragment, max_len);
            tree.set_attr(node, "href", format!("#{short}"));
        }
    }

    renamed.len()
}
