//! HTML extraction helpers
//!
//! Small traversal and matching utilities over a parsed [`scraper::Html`]
//! document. All searches walk the tree depth-first in pre-order, so results
//! come back in document order.

use regex::Regex;
use scraper::{ElementRef, Html};

/// An attribute key/value pair an element must carry
pub type AttrPair = (String, String);

/// Walks the element tree below (and including) `element`
///
/// `pre` is called before an element's children are visited, `post` after.
/// Returning `false` from either visitor stops the whole walk; the function
/// then returns `false` as well.
pub fn walk_tree<'a>(
    element: ElementRef<'a>,
    pre: &mut dyn FnMut(ElementRef<'a>) -> bool,
    post: &mut dyn FnMut(ElementRef<'a>) -> bool,
) -> bool {
    if !pre(element) {
        return false;
    }
    for child in element.children().filter_map(ElementRef::wrap) {
        if !walk_tree(child, pre, post) {
            return false;
        }
    }
    post(element)
}

/// Returns the value of `attribute` on `element`
pub fn attr_val<'a>(element: ElementRef<'a>, attribute: &str) -> Option<&'a str> {
    element.value().attr(attribute)
}

/// Finds the first element whose `id` attribute equals `id`
pub fn element_by_id<'a>(root: ElementRef<'a>, id: &str) -> Option<ElementRef<'a>> {
    let mut found = None;
    walk_tree(
        root,
        &mut |element| {
            if attr_val(element, "id") == Some(id) {
                found = Some(element);
                return false;
            }
            true
        },
        &mut |_| true,
    );
    found
}

/// Collects all elements whose attribute `key` matches `pattern`
pub fn elements_by_attr_match<'a>(
    root: ElementRef<'a>,
    key: &str,
    pattern: &Regex,
) -> Vec<ElementRef<'a>> {
    let mut nodes = Vec::new();
    walk_tree(
        root,
        &mut |element| {
            if attr_val(element, key).is_some_and(|value| pattern.is_match(value)) {
                nodes.push(element);
            }
            true
        },
        &mut |_| true,
    );
    nodes
}

/// Collects all elements named like one of `tags`
pub fn elements_by_tag<'a>(root: ElementRef<'a>, tags: &[&str]) -> Vec<ElementRef<'a>> {
    let mut nodes = Vec::new();
    walk_tree(
        root,
        &mut |element| {
            if tags.contains(&element.value().name()) {
                nodes.push(element);
            }
            true
        },
        &mut |_| true,
    );
    nodes
}

/// Returns true if `element` carries every pair in `attrs`
pub fn match_attrs(element: ElementRef<'_>, attrs: &[AttrPair]) -> bool {
    attrs
        .iter()
        .all(|(key, value)| attr_val(element, key) == Some(value.as_str()))
}

/// Collects all `tag` elements that carry every pair in `attrs`
pub fn elements_by_tag_and_attrs<'a>(
    root: ElementRef<'a>,
    tag: &str,
    attrs: &[AttrPair],
) -> Vec<ElementRef<'a>> {
    elements_by_tag(root, &[tag])
        .into_iter()
        .filter(|element| match_attrs(*element, attrs))
        .collect()
}

/// Parses a page body into a document
pub fn parse_document(body: &str) -> Html {
    Html::parse_document(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <div id="posts">
            <div id="post_1"><a id="attachment11" href="/a.zip">a</a></div>
            <div id="post2"><img class="pic" src="x.jpg"><img src="y.png"></div>
        </div>
        <div id="sidebar"><img class="pic" alt="logo" src="logo.gif"></div>
    </body></html>"#;

    fn pair(key: &str, value: &str) -> AttrPair {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn test_element_by_id() {
        let doc = parse_document(PAGE);
        let posts = element_by_id(doc.root_element(), "posts").unwrap();
        assert_eq!(posts.value().name(), "div");
        assert!(element_by_id(doc.root_element(), "missing").is_none());
    }

    #[test]
    fn test_elements_by_attr_match() {
        let doc = parse_document(PAGE);
        let re = Regex::new("^post_?[0-9]+$").unwrap();
        let posts = elements_by_attr_match(doc.root_element(), "id", &re);
        let ids: Vec<_> = posts.iter().map(|p| attr_val(*p, "id").unwrap()).collect();
        assert_eq!(ids, vec!["post_1", "post2"]);
    }

    #[test]
    fn test_elements_by_tag_in_document_order() {
        let doc = parse_document(PAGE);
        let imgs = elements_by_tag(doc.root_element(), &["img"]);
        let srcs: Vec<_> = imgs.iter().map(|i| attr_val(*i, "src").unwrap()).collect();
        assert_eq!(srcs, vec!["x.jpg", "y.png", "logo.gif"]);
    }

    #[test]
    fn test_match_attrs_requires_all_pairs() {
        let doc = parse_document(PAGE);
        let root = doc.root_element();

        let by_class = elements_by_tag_and_attrs(root, "img", &[pair("class", "pic")]);
        assert_eq!(by_class.len(), 2);

        let by_both =
            elements_by_tag_and_attrs(root, "img", &[pair("class", "pic"), pair("alt", "logo")]);
        assert_eq!(by_both.len(), 1);
        assert_eq!(attr_val(by_both[0], "src"), Some("logo.gif"));

        let unfiltered = elements_by_tag_and_attrs(root, "img", &[]);
        assert_eq!(unfiltered.len(), 3);
    }

    #[test]
    fn test_walk_tree_stops_early() {
        let doc = parse_document(PAGE);
        let mut visited = 0;
        let completed = walk_tree(
            doc.root_element(),
            &mut |element| {
                visited += 1;
                element.value().name() != "img"
            },
            &mut |_| true,
        );
        assert!(!completed);

        let mut total = 0;
        walk_tree(
            doc.root_element(),
            &mut |_| {
                total += 1;
                true
            },
            &mut |_| true,
        );
        assert!(visited < total);
    }
}
