use gloo_timers::callback::Timeout;
use leptos::callback::{Callable, UnsyncCallback};
use leptos::mount::mount_to;
use leptos::prelude::*;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;

use crate::util::document;

const DIALOG_TITLE: &str = "Edit Custom Colors";
const DEFAULT_PICK: &str = "#FF0000";

// The host page has its own stylesheet, so everything here is styled inline.
const OVERLAY_STYLE: &str = "position:fixed;inset:0;z-index:10000;display:flex;\
    align-items:center;justify-content:center;background:rgba(0,0,0,0.4);";
const PANEL_STYLE: &str = "background:#fff;color:#545454;border-radius:5px;padding:1.25em;\
    width:32em;max-width:90vw;box-shadow:0 4px 16px rgba(0,0,0,0.3);";
const TITLE_STYLE: &str = "margin:0 0 1rem 0;font-size:1.5em;font-weight:600;text-align:center;";
const PICKER_STYLE: &str = "width:100%;height:3rem;border:none;background:none;";
const PRIMARY_STYLE: &str = "background:#3085d6;color:#fff;border:none;border-radius:4px;\
    padding:0.5em 1.1em;cursor:pointer;";
const SECONDARY_STYLE: &str = "background:#6e7881;color:#fff;border:none;border-radius:4px;\
    padding:0.5em 1.1em;cursor:pointer;";
const CHIP_STYLE: &str = "display:flex;align-items:center;gap:0.25rem;border:1px solid #ccc;\
    padding:0.25rem 0.5rem;border-radius:4px;";
const REMOVE_STYLE: &str = "background:#e74c3c;color:white;border:none;border-radius:3px;\
    padding:0 0.4rem;cursor:pointer;";

/// Uppercased hex, or `None` for blank input.
pub(crate) fn normalize_color(color: &str) -> Option<String> {
    let color = color.trim();
    (!color.is_empty()).then(|| color.to_uppercase())
}

/// Appends `color` unless it is blank or already listed. Returns whether it was added.
pub(crate) fn add_custom_color(colors: &mut Vec<String>, color: &str) -> bool {
    let Some(color) = normalize_color(color) else {
        return false;
    };
    if colors.iter().any(|c| c.eq_ignore_ascii_case(&color)) {
        return false;
    }
    colors.push(color);
    true
}

pub(crate) fn remove_custom_color(colors: &mut Vec<String>, index: usize) -> Option<String> {
    (index < colors.len()).then(|| colors.remove(index))
}

/// Modal editor for a document's custom colors. `on_close` receives the edited
/// list on Save and `None` on Cancel.
#[component]
pub fn EditColorsDialog(
    initial: Vec<String>,
    on_close: UnsyncCallback<Option<Vec<String>>>,
) -> impl IntoView {
    let colors = RwSignal::new(initial);
    let picked = RwSignal::new(DEFAULT_PICK.to_string());
    let on_cancel = on_close.clone();

    view! {
        <div style=OVERLAY_STYLE data-name="EditColorsDialog">
            <div style=PANEL_STYLE role="dialog" aria-label=DIALOG_TITLE>
                <h2 style=TITLE_STYLE>{DIALOG_TITLE}</h2>
                <div style="display:flex;flex-direction:column;gap:1rem;">
                    <input
                        type="color"
                        style=PICKER_STYLE
                        prop:value=move || picked.get()
                        on:input=move |ev| picked.set(event_target_value(&ev))
                    />
                    <button
                        type="button"
                        style=PRIMARY_STYLE
                        data-action="add"
                        on:click=move |_| {
                            let color = picked.get_untracked();
                            colors.update(|list| {
                                add_custom_color(list, &color);
                            });
                        }
                    >
                        "Add Color"
                    </button>
                    <div style="display:flex;flex-wrap:wrap;gap:0.5rem;">
                        {move || {
                            colors
                                .get()
                                .into_iter()
                                .enumerate()
                                .map(|(index, color)| {
                                    let swatch = format!(
                                        "width:1.5rem;height:1.5rem;background:{color};border:1px solid #999;"
                                    );
                                    view! {
                                        <div style=CHIP_STYLE data-color=color.clone()>
                                            <div style=swatch></div>
                                            <span>{color.clone()}</span>
                                            <button
                                                type="button"
                                                style=REMOVE_STYLE
                                                data-action="remove"
                                                on:click=move |_| {
                                                    colors.update(|list| {
                                                        remove_custom_color(list, index);
                                                    });
                                                }
                                            >
                                                "×"
                                            </button>
                                        </div>
                                    }
                                })
                                .collect_view()
                        }}
                    </div>
                </div>
                <div style="display:flex;justify-content:center;gap:0.5rem;margin-top:1.5rem;">
                    <button
                        type="button"
                        style=PRIMARY_STYLE
                        data-action="save"
                        on:click=move |_| on_close.run(Some(colors.get_untracked()))
                    >
                        "Save"
                    </button>
                    <button
                        type="button"
                        style=SECONDARY_STYLE
                        data-action="cancel"
                        on:click=move |_| on_cancel.run(None)
                    >
                        "Cancel"
                    </button>
                </div>
            </div>
        </div>
    }
}

/// Mounts [`EditColorsDialog`] over the page. `on_save` runs only when the
/// user saves; the dialog removes itself either way.
pub(crate) fn show_edit_colors_dialog(initial: Vec<String>, on_save: impl Fn(Vec<String>) + 'static) {
    let Some(doc) = document() else {
        return;
    };
    let Some(body) = doc.body() else {
        return;
    };
    let Some(host) = doc
        .create_element("div")
        .ok()
        .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
    else {
        return;
    };
    if let Err(e) = body.append_child(&host) {
        tracing::warn!("Could not open color dialog: {e:?}");
        return;
    }

    let mounted: Rc<RefCell<Option<Box<dyn Any>>>> = Rc::default();

    let mounted2 = mounted.clone();
    let host2 = host.clone();
    let on_close = UnsyncCallback::new(move |result: Option<Vec<String>>| {
        let Some(handle) = mounted2.borrow_mut().take() else {
            return;
        };

        // We are inside one of the dialog's own click handlers; unmount after it returns.
        let host = host2.clone();
        Timeout::new(0, move || {
            drop(handle);
            host.remove();
        })
        .forget();

        if let Some(colors) = result {
            on_save(colors);
        }
    });

    let handle = mount_to(host, move || {
        view! { <EditColorsDialog initial=initial on_close=on_close /> }
    });
    *mounted.borrow_mut() = Some(Box::new(handle));
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use gloo_timers::future::TimeoutFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn click(action: &str) {
        let button: web_sys::HtmlElement = document()
            .and_then(|d| {
                d.query_selector(&format!(r#"[data-name="EditColorsDialog"] [data-action="{action}"]"#))
                    .ok()
                    .flatten()
            })
            .expect("dialog button")
            .unchecked_into();
        button.click();
    }

    fn dialog_open() -> bool {
        document()
            .and_then(|d| d.query_selector(r#"[data-name="EditColorsDialog"]"#).ok().flatten())
            .is_some()
    }

    #[wasm_bindgen_test]
    async fn test_add_then_save_reports_colors() {
        let saved: Rc<RefCell<Option<Vec<String>>>> = Rc::default();
        let saved2 = saved.clone();
        show_edit_colors_dialog(vec!["#123456".to_string()], move |colors| {
            *saved2.borrow_mut() = Some(colors);
        });

        click("add");
        click("save");
        TimeoutFuture::new(10).await;

        assert_eq!(
            saved.borrow().clone(),
            Some(vec!["#123456".to_string(), "#FF0000".to_string()])
        );
        assert!(!dialog_open());
    }

    #[wasm_bindgen_test]
    async fn test_cancel_discards_changes() {
        let saved = Rc::new(RefCell::new(false));
        let saved2 = saved.clone();
        show_edit_colors_dialog(vec![], move |_| *saved2.borrow_mut() = true);

        click("add");
        click("cancel");
        TimeoutFuture::new(10).await;

        assert!(!*saved.borrow());
        assert!(!dialog_open());
    }
}
