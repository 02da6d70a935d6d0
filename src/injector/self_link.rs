//! "Self Link Image": toggles a link from an image to its own source.

use crate::config::EDITOR_MARKER_CLASS;
use crate::froala::{snapshot_undo_state, trigger_content_changed};
use crate::state::EnhancerState;
use crate::util::{append_class, as_html, deep_clone, document, document_elements_by_class, element_children};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

const SELF_LINK_TITLE: &str = "Self Link Image";
const SELF_LINK_ICON: &str = "fa fa-arrows-alt";
const IMAGE_REMOVE_PREFIX: &str = "imageRemove-";
const SELF_LINK_PREFIX: &str = "selfLink-";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LinkChange {
    /// Image was not linked; now wrapped in a link to itself.
    Wrapped,
    /// Image linked elsewhere; the link now points at the image.
    Retargeted,
    /// Image already linked to itself; the link was removed.
    Unwrapped,
}

/// Remembers the last image clicked inside `editor`.
pub(crate) fn track_image_selection(state: &EnhancerState, editor: &web_sys::HtmlElement) {
    let selected = state.selected_image.clone();
    let cb = Closure::<dyn FnMut(web_sys::Event)>::new(move |ev: web_sys::Event| {
        let Some(target) = ev.target().and_then(|t| t.dyn_into::<web_sys::Element>().ok()) else {
            return;
        };
        let image = target
            .closest("img")
            .ok()
            .flatten()
            .and_then(|img| img.dyn_into::<web_sys::HtmlImageElement>().ok());
        if let Some(image) = image {
            selected.select(image);
        }
    });
    let _ = editor.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref());
    cb.forget();
}

/// Adds the button to the image popup while it is open.
pub(crate) fn ensure_self_link_button(state: &EnhancerState, doc: &web_sys::Document) {
    let popups = document_elements_by_class(doc, "fr-popup fr-desktop fr-active");
    let popup = match popups.as_slice() {
        [] => return,
        [popup] => popup,
        _ => {
            tracing::debug!("Found more than one active popup");
            return;
        }
    };

    // The image popup is a layer holder plus one button row.
    if popup.child_element_count() != 2 {
        return;
    }
    let Some(row) = popup.last_element_child() else {
        return;
    };

    let buttons = element_children(&row);
    if buttons.iter().any(|b| b.class_list().contains(EDITOR_MARKER_CLASS)) {
        return;
    }

    let Some(separator) = buttons.iter().find(|b| b.class_list().contains("fr-separator")) else {
        tracing::debug!("Unable to find popup separator");
        return;
    };
    let Some(remove) = buttons.iter().find(|b| b.id().starts_with(IMAGE_REMOVE_PREFIX)) else {
        return;
    };

    let Some(button) = self_link_button_from(remove) else {
        return;
    };
    let Some(separator) = deep_clone::<web_sys::Element>(separator) else {
        return;
    };

    let state2 = state.clone();
    let button2 = button.clone();
    let cb = Closure::<dyn FnMut(web_sys::Event)>::new(move |_ev: web_sys::Event| {
        let _ = button2.class_list().remove_1("fr-selected");
        self_link_selected(&state2);
    });
    let _ = button.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref());
    cb.forget();

    let _ = row.append_child(&separator);
    let _ = row.append_child(&button);
}

fn self_link_button_from(remove: &web_sys::Element) -> Option<web_sys::HtmlElement> {
    let button: web_sys::HtmlElement = deep_clone(remove)?;
    append_class(&button, EDITOR_MARKER_CLASS);
    let _ = button.set_attribute("data-cmd", "");
    button.set_id(&remove.id().replacen(IMAGE_REMOVE_PREFIX, SELF_LINK_PREFIX, 1));
    button.set_title(SELF_LINK_TITLE);

    let parts = element_children(&button);
    if let Some(icon) = parts.first() {
        icon.set_class_name(SELF_LINK_ICON);
    }
    if let Some(text) = parts.get(1).and_then(as_html) {
        text.set_inner_text(SELF_LINK_TITLE);
    }

    Some(button)
}

fn self_link_selected(state: &EnhancerState) {
    let Some(image) = state.selected_image.current() else {
        tracing::error!("No image selected");
        return;
    };

    if let Some(change) = self_link_image(&image) {
        tracing::debug!(?change, "Self linked image");
        // Refreshes the popup for the new link state.
        image.click();
    }
}

/// Links `image` to its own source, or removes such a link if already present.
pub(crate) fn self_link_image(image: &web_sys::HtmlImageElement) -> Option<LinkChange> {
    let Some(src) = image.get_attribute("src").filter(|s| !s.is_empty()) else {
        tracing::error!("Selected image has no src attribute");
        return None;
    };
    let Some(parent) = image.parent_element() else {
        tracing::error!("Image has no parent");
        return None;
    };

    snapshot_undo_state(image, true);

    let change = match parent.dyn_ref::<web_sys::HtmlAnchorElement>() {
        // Both sides resolved, so relative and absolute sources compare equal.
        Some(link) if link.href() == image.src() => {
            let grandparent = parent.parent_node()?;
            grandparent.replace_child(image, &parent).ok()?;
            LinkChange::Unwrapped
        }
        Some(link) => {
            link.set_href(&src);
            LinkChange::Retargeted
        }
        None => {
            let link = document()?.create_element("a").ok()?;
            let _ = link.set_attribute("href", &src);
            let _ = link.set_attribute("target", "_blank");
            parent.replace_child(&link, image).ok()?;
            link.append_child(image).ok()?;
            LinkChange::Wrapped
        }
    };

    snapshot_undo_state(image, false);
    trigger_content_changed(image);
    Some(change)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const SRC: &str = "https://images.test/trophy.png";

    fn mount(html: &str) -> (web_sys::Element, web_sys::HtmlImageElement) {
        let doc = document().expect("document");
        let host = doc.create_element("div").expect("div");
        host.set_inner_html(html);
        doc.body().expect("body").append_child(&host).expect("append");
        let image = host
            .query_selector("img")
            .ok()
            .flatten()
            .expect("img")
            .unchecked_into();
        (host, image)
    }

    #[wasm_bindgen_test]
    fn test_unlinked_image_is_wrapped() {
        let (host, image) = mount(&format!(r#"<p><img src="{SRC}"></p>"#));

        assert_eq!(self_link_image(&image), Some(LinkChange::Wrapped));
        let link = image.parent_element().expect("link");
        assert_eq!(link.tag_name(), "A");
        assert_eq!(link.get_attribute("href").as_deref(), Some(SRC));
        assert_eq!(link.get_attribute("target").as_deref(), Some("_blank"));
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_self_linked_image_is_unwrapped() {
        let (host, image) = mount(&format!(r#"<p><a href="{SRC}"><img src="{SRC}"></a></p>"#));

        assert_eq!(self_link_image(&image), Some(LinkChange::Unwrapped));
        assert_eq!(image.parent_element().expect("p").tag_name(), "P");
        assert!(host.query_selector("a").ok().flatten().is_none());
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_foreign_link_is_retargeted() {
        let (host, image) = mount(&format!(
            r#"<p><a href="https://elsewhere.test/"><img src="{SRC}"></a></p>"#
        ));

        assert_eq!(self_link_image(&image), Some(LinkChange::Retargeted));
        let link = image.parent_element().expect("link");
        assert_eq!(link.get_attribute("href").as_deref(), Some(SRC));
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_toggling_twice_restores_markup() {
        let (host, image) = mount(&format!(r#"<p><img src="{SRC}"></p>"#));
        let before = host.inner_html();

        self_link_image(&image);
        self_link_image(&image);
        assert_eq!(host.inner_html(), before);
        host.remove();
    }

    #[wasm_bindgen_test]
    fn test_detached_image_is_ignored() {
        let image: web_sys::HtmlImageElement = document()
            .expect("document")
            .create_element("img")
            .expect("img")
            .unchecked_into();
        image.set_src(SRC);
        assert_eq!(self_link_image(&image), None);
    }

    #[wasm_bindgen_test]
    fn test_popup_gets_one_button() {
        let (host, _) = mount(
            r#"<img src="x.png">
            <div class="fr-popup fr-desktop fr-active">
                <span class="fr-layer"></span>
                <div class="fr-buttons">
                    <button id="imageReplace-1" class="fr-command fr-btn"><i class="fa fa-exchange"></i><span class="fr-sr-only">Replace</span></button>
                    <div class="fr-separator fr-vs"></div>
                    <button id="imageRemove-1" class="fr-command fr-btn" data-cmd="imageRemove"><i class="fa fa-trash"></i><span class="fr-sr-only">Remove</span></button>
                </div>
            </div>"#,
        );
        let doc = document().expect("document");
        let state = EnhancerState::new(Default::default(), Some(1));

        ensure_self_link_button(&state, &doc);
        ensure_self_link_button(&state, &doc);

        let added = host.query_selector_all("#selfLink-1").expect("query");
        assert_eq!(added.length(), 1);
        let row = host.query_selector(".fr-buttons").ok().flatten().expect("row");
        assert_eq!(row.child_element_count(), 5);
        host.remove();
    }
}
