//! Text color palette: default colors, the document's custom colors, and an
//! "Edit Colors" entry that opens the custom color dialog.

use crate::components::show_edit_colors_dialog;
use crate::froala::{editor_handle, EditorApi};
use crate::state::EnhancerState;
use crate::util::{as_html, deep_clone, document, document_elements_by_class, element_children};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// The site's stock palette, in display order.
pub(crate) const DEFAULT_COLORS: [&str; 9] = [
    "#41A85F", "#2C82C9", "#9365B8", "#F37934", "#D14841", "#667FB2", "#C2903E", "#777777",
    "#C46438",
];

const EDIT_COLORS_TITLE: &str = "Edit Colors";
const EDIT_COLORS_ICON: &str = "fa fa-pencil";
const CLEAR_FORMATTING_PARAM: &str = "REMOVE";
const PALETTE_COLUMNS: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PaletteSlot {
    Color(String),
    EditColors,
    ClearFormatting,
    RowBreak,
}

/// Places the colors row by row. The edit entry takes the last cell of the
/// first row and clear formatting the last cell of the second.
pub(crate) fn palette_layout(colors: &[String]) -> Vec<PaletteSlot> {
    let mut slots = Vec::with_capacity(colors.len() + colors.len() / PALETTE_COLUMNS + 2);
    let mut filled = 0;

    for color in colors {
        slots.push(PaletteSlot::Color(color.clone()));
        filled += 1;

        if filled == PALETTE_COLUMNS - 1 {
            slots.push(PaletteSlot::EditColors);
            filled += 1;
        } else if filled == PALETTE_COLUMNS * 2 - 1 {
            slots.push(PaletteSlot::ClearFormatting);
            filled += 1;
        }

        if filled % PALETTE_COLUMNS == 0 {
            slots.push(PaletteSlot::RowBreak);
        }
    }

    slots
}

fn text_color_panel(doc: &web_sys::Document) -> Option<web_sys::Element> {
    document_elements_by_class(doc, "fr-text-color").into_iter().next()
}

fn find_clear_formatting(panel: &web_sys::Element) -> Option<web_sys::Element> {
    element_children(panel)
        .into_iter()
        .find(|c| c.get_attribute("data-param1").as_deref() == Some(CLEAR_FORMATTING_PARAM))
}

fn find_edit_colors_button(panel: &web_sys::Element) -> Option<web_sys::Element> {
    element_children(panel)
        .into_iter()
        .find(|c| c.get_attribute("title").as_deref() == Some(EDIT_COLORS_TITLE))
}

fn find_swatch_template(panel: &web_sys::Element) -> Option<web_sys::Element> {
    element_children(panel).into_iter().find(|c| {
        !c.tag_name().eq_ignore_ascii_case("br") && !c.class_list().contains("fr-active-item")
    })
}

/// Adds the edit entry (and custom colors) the first time the palette shows up.
pub(crate) fn ensure_palette(state: &EnhancerState, doc: &web_sys::Document) {
    // Custom colors are per guide; without an id the stock palette stays.
    if state.guide_id.is_none() {
        return;
    }
    let Some(panel) = text_color_panel(doc) else {
        return;
    };
    if find_edit_colors_button(&panel).is_some() {
        return;
    }

    let Some(button) = edit_colors_button_from(&panel) else {
        return;
    };

    let state2 = state.clone();
    let anchor: web_sys::Element = button.clone().into();
    let cb = Closure::<dyn FnMut(web_sys::Event)>::new(move |_ev: web_sys::Event| {
        open_edit_colors(&state2, &anchor);
    });
    let _ = button.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref());
    cb.forget();

    rebuild_palette(state, Some(button.into()));
}

/// Clones clear formatting into the "Edit Colors" entry. The clone gets its
/// own `data-param1` so it is never mistaken for the original.
fn edit_colors_button_from(panel: &web_sys::Element) -> Option<web_sys::HtmlElement> {
    let Some(clear) = find_clear_formatting(panel) else {
        tracing::warn!("Could not find Clear Formatting button");
        return None;
    };

    let button: web_sys::HtmlElement = deep_clone(&clear)?;
    let _ = button.set_attribute("data-cmd", "");
    let _ = button.set_attribute("data-param1", "");
    button.set_title(EDIT_COLORS_TITLE);

    let parts = element_children(&button);
    let [icon, text] = parts.as_slice() else {
        tracing::warn!("Clear Formatting button had {} children, expected 2", parts.len());
        return None;
    };
    icon.set_class_name(EDIT_COLORS_ICON);
    if let Some(text) = as_html(text) {
        text.set_inner_text(EDIT_COLORS_TITLE);
    }

    Some(button)
}

/// Redraws the palette with the current custom colors. `edit_button` is used
/// when the entry has just been created and is not in the panel yet.
pub(crate) fn rebuild_palette(state: &EnhancerState, edit_button: Option<web_sys::Element>) {
    let Some(guide_id) = state.guide_id else {
        return;
    };
    let Some(doc) = document() else {
        return;
    };
    let Some(panel) = text_color_panel(&doc) else {
        return;
    };

    let colors: Vec<String> = DEFAULT_COLORS
        .iter()
        .map(|c| c.to_string())
        .chain(state.colors.borrow_mut().get_colors(guide_id))
        .collect();

    fill_panel(&doc, &panel, edit_button, &colors);
}

fn fill_panel(
    doc: &web_sys::Document,
    panel: &web_sys::Element,
    edit_button: Option<web_sys::Element>,
    colors: &[String],
) -> bool {
    let clear = find_clear_formatting(panel);
    let template = find_swatch_template(panel);
    let edit = edit_button.or_else(|| find_edit_colors_button(panel));

    let (Some(clear), Some(template), Some(edit)) = (clear, template, edit) else {
        tracing::debug!("Palette is missing a required entry, not rebuilding");
        return false;
    };

    while let Some(child) = panel.first_child() {
        let _ = panel.remove_child(&child);
    }

    for slot in palette_layout(colors) {
        let node = match slot {
            PaletteSlot::Color(color) => color_swatch(&template, &color),
            PaletteSlot::EditColors => Some(edit.clone()),
            PaletteSlot::ClearFormatting => Some(clear.clone()),
            PaletteSlot::RowBreak => doc.create_element("br").ok(),
        };
        if let Some(node) = node {
            let _ = panel.append_child(&node);
        }
    }
    true
}

fn color_swatch(template: &web_sys::Element, color: &str) -> Option<web_sys::Element> {
    let swatch: web_sys::HtmlElement = deep_clone(template)?;
    let hex = color.to_uppercase();

    let _ = swatch.style().set_property("background-color", color);
    let _ = swatch.set_attribute("data-param1", &hex);
    if let Some(inner) = swatch.first_element_child().as_ref().and_then(as_html) {
        inner.set_inner_text(&format!("Color {hex}"));
    }

    Some(swatch.into())
}

fn open_edit_colors(state: &EnhancerState, anchor: &web_sys::Element) {
    let Some(guide_id) = state.guide_id else {
        return;
    };

    let initial = state.colors.borrow_mut().get_colors(guide_id);
    let state = state.clone();
    let anchor = anchor.clone();

    show_edit_colors_dialog(initial, move |updated| {
        state.colors.borrow_mut().set_colors(guide_id, updated);
        rebuild_palette(&state, None);
        if let Some(editor) = editor_handle(&anchor) {
            editor.open_colors_popup();
        }
    });
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const PANEL: &str = r##"
        <span class="fr-command fr-select-color fr-active-item" data-cmd="textColor" data-param1="#61BD6D"><span class="fr-sr-only">Color #61BD6D</span></span>
        <span class="fr-command fr-select-color" data-cmd="textColor" data-param1="#1ABC9C"><span class="fr-sr-only">Color #1ABC9C</span></span>
        <span class="fr-command fr-select-color" data-cmd="textColor" data-param1="REMOVE" title="Clear Formatting"><i class="fa fa-eraser"></i><span class="fr-sr-only">Clear Formatting</span></span>
    "##;

    fn panel() -> web_sys::Element {
        let doc = document().expect("document");
        let panel = doc.create_element("div").expect("div");
        panel.set_class_name("fr-color-set fr-text-color");
        panel.set_inner_html(PANEL);
        panel
    }

    fn colors() -> Vec<String> {
        DEFAULT_COLORS
            .iter()
            .map(|c| c.to_string())
            .chain(["#ABCDEF".to_string()])
            .collect()
    }

    #[wasm_bindgen_test]
    fn test_edit_button_is_restyled_clone() {
        let p = panel();
        let button = edit_colors_button_from(&p).expect("edit button");

        assert_eq!(button.title(), EDIT_COLORS_TITLE);
        assert_eq!(button.get_attribute("data-cmd").as_deref(), Some(""));
        assert_eq!(button.get_attribute("data-param1").as_deref(), Some(""));
        let icon = button.first_element_child().expect("icon");
        assert_eq!(icon.class_name(), EDIT_COLORS_ICON);
    }

    #[wasm_bindgen_test]
    fn test_fill_panel_lays_out_swatches() {
        let doc = document().expect("document");
        let p = panel();
        let edit = edit_colors_button_from(&p).expect("edit button");

        assert!(fill_panel(&doc, &p, Some(edit.into()), &colors()));

        let children = element_children(&p);
        assert_eq!(children.len(), 10 + 2 + 2);
        assert_eq!(children[4].get_attribute("title").as_deref(), Some(EDIT_COLORS_TITLE));
        assert_eq!(children[5].tag_name(), "BR");
        assert_eq!(children[10].get_attribute("data-param1").as_deref(), Some("REMOVE"));
        assert_eq!(
            children[13].get_attribute("data-param1").as_deref(),
            Some("#ABCDEF")
        );
    }

    #[wasm_bindgen_test]
    fn test_rebuilding_twice_keeps_clear_formatting() {
        let doc = document().expect("document");
        let p = panel();
        let edit = edit_colors_button_from(&p).expect("edit button");
        fill_panel(&doc, &p, Some(edit.into()), &colors());

        let fewer: Vec<String> = DEFAULT_COLORS.iter().map(|c| c.to_string()).collect();
        assert!(fill_panel(&doc, &p, None, &fewer));

        let clear = find_clear_formatting(&p).expect("clear formatting");
        assert_eq!(clear.get_attribute("title").as_deref(), Some("Clear Formatting"));
        assert_eq!(element_children(&p).len(), 9 + 2 + 2);
    }

    fn mounted_panel() -> web_sys::Element {
        let p = panel();
        document()
            .and_then(|d| d.body())
            .expect("body")
            .append_child(&p)
            .expect("append");
        p
    }

    #[wasm_bindgen_test]
    fn test_palette_untouched_without_guide_id() {
        let doc = document().expect("document");
        let p = mounted_panel();
        let before = p.inner_html();

        let state = EnhancerState::new(Default::default(), None);
        ensure_palette(&state, &doc);

        assert_eq!(p.inner_html(), before);
        assert!(find_edit_colors_button(&p).is_none());
        p.remove();
    }

    #[wasm_bindgen_test]
    fn test_palette_gets_edit_entry_once() {
        let doc = document().expect("document");
        let p = mounted_panel();

        let state = EnhancerState::new(Default::default(), Some(424_242));
        ensure_palette(&state, &doc);
        let after_first = p.inner_html();
        ensure_palette(&state, &doc);

        assert!(find_edit_colors_button(&p).is_some());
        assert_eq!(p.inner_html(), after_first);
        p.remove();
    }
}
