//! Bindings to the host page's Froala 2.x editor instances.
//!
//! The page ships no types for this version; only what we call is bound here.
//! Instances hang off the hidden textarea as jQuery data.

use crate::locator::find_editor_info;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const INSTANCE_DATA_KEY: &str = "froala.editor";
const CONTENT_CHANGED_EVENT: &str = "froalaEditor.contentChanged";

#[wasm_bindgen]
extern "C" {
    type JQuery;

    #[wasm_bindgen(catch, js_name = jQuery)]
    fn jquery(selector: &str) -> Result<JQuery, JsValue>;

    #[wasm_bindgen(method)]
    fn data(this: &JQuery, key: &str) -> JsValue;

    #[wasm_bindgen(method)]
    fn trigger(this: &JQuery, event: &str, params: &js_sys::Array) -> JQuery;

    /// A live editor instance.
    pub(crate) type FroalaEditor;

    #[wasm_bindgen(method, getter, js_name = undoIndex)]
    fn undo_index(this: &FroalaEditor) -> f64;

    #[wasm_bindgen(method, getter)]
    fn undo(this: &FroalaEditor) -> FroalaUndo;

    #[wasm_bindgen(method, getter)]
    fn colors(this: &FroalaEditor) -> FroalaColors;

    #[wasm_bindgen(method, getter)]
    fn html(this: &FroalaEditor) -> FroalaHtml;

    #[wasm_bindgen(method, getter)]
    fn opts(this: &FroalaEditor) -> FroalaOptions;

    type FroalaUndo;

    #[wasm_bindgen(method, js_name = saveStep)]
    fn save_step(this: &FroalaUndo);

    type FroalaColors;

    #[wasm_bindgen(method, js_name = showColorsPopup)]
    fn show_colors_popup(this: &FroalaColors);

    type FroalaHtml;

    #[wasm_bindgen(method)]
    fn get(this: &FroalaHtml) -> String;

    type FroalaOptions;

    #[wasm_bindgen(method, getter, js_name = shortcutsEnabled)]
    fn shortcuts_enabled(this: &FroalaOptions) -> JsValue;

    #[wasm_bindgen(method, setter, js_name = shortcutsEnabled)]
    fn set_shortcuts_enabled(this: &FroalaOptions, value: &js_sys::Array);
}

/// What the enhancer needs from an editor instance.
pub(crate) trait EditorApi {
    fn content_html(&self) -> String;

    /// Position in the undo history; 0 until the first step is recorded.
    fn undo_cursor(&self) -> u32;

    fn save_undo_step(&self);
    fn open_colors_popup(&self);
    fn disable_shortcut(&self, name: &str);
}

impl EditorApi for FroalaEditor {
    fn content_html(&self) -> String {
        self.html().get()
    }

    fn undo_cursor(&self) -> u32 {
        self.undo_index().max(0.0) as u32
    }

    fn save_undo_step(&self) {
        self.undo().save_step();
    }

    fn open_colors_popup(&self) {
        self.colors().show_colors_popup();
    }

    fn disable_shortcut(&self, name: &str) {
        let opts = self.opts();
        let Ok(current) = opts.shortcuts_enabled().dyn_into::<js_sys::Array>() else {
            return;
        };

        let kept = current
            .iter()
            .filter(|v| v.as_string().as_deref() != Some(name))
            .collect::<js_sys::Array>();
        opts.set_shortcuts_enabled(&kept);
    }
}

fn jquery_for_editor_of(node: &web_sys::Element) -> Option<JQuery> {
    let info = find_editor_info(node)?;
    match jquery(&format!("#{}", info.dom_id)) {
        Ok(jq) => Some(jq),
        Err(e) => {
            tracing::warn!("jQuery unavailable: {e:?}");
            None
        }
    }
}

/// The editor instance owning `node`, if one is alive.
pub(crate) fn editor_handle(node: &web_sys::Element) -> Option<FroalaEditor> {
    let data = jquery_for_editor_of(node)?.data(INSTANCE_DATA_KEY);
    if data.is_undefined() || data.is_null() {
        tracing::debug!("No editor instance attached");
        return None;
    }
    Some(data.unchecked_into())
}

/// Lets the host page notice programmatic edits (it shows its save buttons
/// on this event).
pub(crate) fn trigger_content_changed(node: &web_sys::Element) {
    if let Some(jq) = jquery_for_editor_of(node) {
        jq.trigger(
            CONTENT_CHANGED_EVENT,
            &js_sys::Array::of1(&js_sys::Object::new()),
        );
    }
}

pub(crate) fn snapshot_undo_state(node: &web_sys::Element, only_if_empty: bool) {
    if let Some(editor) = editor_handle(node) {
        snapshot_undo(&editor, only_if_empty);
    }
}

/// Pushes an undo step. With `only_if_empty`, only when the history has not
/// been seeded yet: the widget does not record the initial state on its own.
pub(crate) fn snapshot_undo<E: EditorApi>(editor: &E, only_if_empty: bool) {
    if only_if_empty && editor.undo_cursor() > 0 {
        return;
    }
    editor.save_undo_step();
}
