use regex::Regex;
use std::sync::LazyLock;
use wasm_bindgen::JsCast;

static TRAILING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)$").expect("valid regex"));

pub(crate) fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Parses the trailing run of digits of an element id (`SectionTextarea42` -> 42).
pub(crate) fn trailing_number(id: &str) -> Option<u64> {
    TRAILING_DIGITS
        .captures(id)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub(crate) fn document() -> Option<web_sys::Document> {
    web_sys::window().and_then(|w| w.document())
}

/// Snapshot of `getElementsByClassName`; the live collection must not be
/// iterated while we mutate the page.
pub(crate) fn elements_by_class(root: &web_sys::Element, class: &str) -> Vec<web_sys::Element> {
    collect(&root.get_elements_by_class_name(class))
}

pub(crate) fn document_elements_by_class(
    doc: &web_sys::Document,
    class: &str,
) -> Vec<web_sys::Element> {
    collect(&doc.get_elements_by_class_name(class))
}

pub(crate) fn element_children(el: &web_sys::Element) -> Vec<web_sys::Element> {
    collect(&el.children())
}

fn collect(list: &web_sys::HtmlCollection) -> Vec<web_sys::Element> {
    (0..list.length()).filter_map(|i| list.item(i)).collect()
}

pub(crate) fn set_styles(el: &web_sys::HtmlElement, styles: &[(&str, &str)]) {
    let style = el.style();
    for (name, value) in styles {
        let _ = style.set_property(name, value);
    }
}

pub(crate) fn as_html(el: &web_sys::Element) -> Option<web_sys::HtmlElement> {
    el.dyn_ref::<web_sys::HtmlElement>().cloned()
}

/// Deep-clones an element, keeping its concrete type.
pub(crate) fn deep_clone<T: JsCast>(el: &web_sys::Element) -> Option<T> {
    el.clone_node_with_deep(true).ok()?.dyn_into::<T>().ok()
}

pub(crate) fn append_class(el: &web_sys::Element, class: &str) {
    let _ = el.class_list().add_1(class);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_number() {
        assert_eq!(trailing_number("SectionTextarea42"), Some(42));
        assert_eq!(trailing_number("editRoadmapTextarea7"), Some(7));
        assert_eq!(trailing_number("a1b22"), Some(22));
    }

    #[test]
    fn test_trailing_number_missing() {
        assert_eq!(trailing_number("SectionTextarea"), None);
        assert_eq!(trailing_number("12abc"), None);
        assert_eq!(trailing_number(""), None);
    }
}
