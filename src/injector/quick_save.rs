//! Quick Save: saves one section or roadmap step in place, without the page's
//! own save-and-close round trip.

use crate::api::{send_with_min_delay, ApiResult, SaveClient, SaveRequest, SaveTransport};
use crate::config::{SAVE_BUTTON_CLASS, SAVE_LABEL_CLASS};
use crate::froala::{editor_handle, EditorApi};
use crate::locator::find_editor_info;
use crate::models::{EditorInfo, EditorKind};
use crate::state::save_status::SaveStatusTracker;
use crate::state::EnhancerState;
use crate::util::{append_class, as_html, deep_clone, document, elements_by_class, set_styles};
use leptos::task::spawn_local;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

const QUICK_SAVE_TEXT: &str = "Quick Save";
const SAVING_TEXT: &str = "Saving...";
const SAVE_FAILED_MESSAGE: &str = "Failed to save.";

/// Conflicts with Ctrl+S in the widget's default key map.
const CONFLICTING_SHORTCUT: &str = "strikeThrough";

/// Everything needed to save one editor region.
#[derive(Clone, Debug)]
pub(crate) struct SaveTarget {
    pub guide_id: u64,
    pub info: EditorInfo,
    pub container: web_sys::HtmlElement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SaveOutcome {
    Saved,
    /// A save for this region is still running.
    InFlight,
    /// The region has no quick save button or no numeric id.
    Unavailable,
}

pub(crate) fn is_save_shortcut(key: &str, ctrl: bool, meta: bool, is_mac: bool) -> bool {
    let modifier = if is_mac { meta } else { ctrl };
    modifier && key.eq_ignore_ascii_case("s")
}

/// `SectionContainer<N>` or `roadmapStep<N>` for the editor.
pub(crate) fn section_container(info: &EditorInfo) -> Option<web_sys::HtmlElement> {
    let id = info.container_id()?;
    document()?.get_element_by_id(&id)?.dyn_into().ok()
}

fn save_target(state: &EnhancerState, editor: &web_sys::Element) -> Option<SaveTarget> {
    let guide_id = state.guide_id?;
    let info = find_editor_info(editor)?;
    let container = section_container(&info)?;
    Some(SaveTarget {
        guide_id,
        info,
        container,
    })
}

fn quick_save_button(container: &web_sys::HtmlElement) -> Option<web_sys::HtmlElement> {
    elements_by_class(container, SAVE_BUTTON_CLASS)
        .first()
        .and_then(as_html)
}

/// Value of the region's name input. Trophy descriptions have none.
fn section_name(container: &web_sys::HtmlElement) -> String {
    container
        .query_selector("input")
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<web_sys::HtmlInputElement>().ok())
        .map(|input| input.value())
        .unwrap_or_default()
}

/// The region's "Saved: ..." label, created in front of the button row on
/// first use.
pub(crate) fn save_label(
    container: &web_sys::HtmlElement,
    button: &web_sys::HtmlElement,
) -> Option<web_sys::HtmlElement> {
    if let Some(existing) = elements_by_class(container, SAVE_LABEL_CLASS).first() {
        return as_html(existing);
    }

    let row = button.parent_element()?;
    let label: web_sys::HtmlElement = document()?.create_element("span").ok()?.dyn_into().ok()?;
    label.set_class_name(SAVE_LABEL_CLASS);
    set_styles(
        &label,
        &[
            ("white-space", "nowrap"),
            ("margin-left", "0px"),
            ("margin-top", "2px"),
            ("display", "inline"),
        ],
    );
    row.insert_before(&label, row.first_child().as_ref()).ok()?;
    Some(label)
}

/// Adds the Quick Save button next to the region's own save button.
pub(crate) fn setup_quick_save(state: &EnhancerState, editor: &web_sys::HtmlElement) {
    let Some(info) = find_editor_info::<web_sys::Element>(editor) else {
        tracing::debug!("Failed to find editor info");
        return;
    };
    let Some(container) = section_container(&info) else {
        tracing::debug!("Failed to find section container for {}", info.dom_id);
        return;
    };
    let Some(handle) = editor_handle(editor) else {
        return;
    };

    handle.disable_shortcut(CONFLICTING_SHORTCUT);

    if quick_save_button(&container).is_some() {
        return;
    }

    let Some(row) = elements_by_class(&container, "floatr").first().and_then(as_html) else {
        return;
    };
    if let Some(row_parent) = row.parent_element().as_ref().and_then(as_html) {
        layout_button_row(&row_parent, &row, info.kind);
    }

    let Some(save_button) = elements_by_class(&container, "section-saveButton")
        .into_iter()
        .next()
    else {
        tracing::error!("Could not find save button for {}", info.dom_id);
        return;
    };

    let Some(quick) = deep_clone::<web_sys::HtmlElement>(&save_button) else {
        return;
    };
    quick.set_inner_text(QUICK_SAVE_TEXT);
    // Replaces the page's own inline handler and blocks navigation.
    let _ = quick.set_attribute("onclick", "return false;");
    append_class(&quick, SAVE_BUTTON_CLASS);

    let state2 = state.clone();
    let editor2: web_sys::Element = editor.clone().into();
    let cb = Closure::<dyn FnMut(web_sys::Event)>::new(move |_ev: web_sys::Event| {
        start_quick_save(&state2, &editor2);
    });
    let _ = quick.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref());
    cb.forget();

    if let Some(parent) = save_button.parent_node() {
        let _ = parent.insert_before(&quick, save_button.next_sibling().as_ref());
    }
}

/// Lays the name input, revision picker and buttons out on one line.
fn layout_button_row(parent: &web_sys::HtmlElement, row: &web_sys::HtmlElement, kind: EditorKind) {
    set_styles(
        parent,
        &[
            ("display", "flex"),
            ("flex-wrap", "nowrap"),
            ("flex-direction", "row"),
            ("gap", "4px"),
            ("align-items", "center"),
        ],
    );

    // Roadmap stages lead with their stage name.
    if let Some(stage_name) = parent.first_element_child().as_ref().and_then(as_html) {
        if stage_name.tag_name().eq_ignore_ascii_case("span") {
            set_styles(
                &stage_name,
                &[
                    ("white-space", "nowrap"),
                    ("align-self", "center"),
                    ("margin-bottom", "10px"),
                ],
            );
        }
    }

    if let Some(input) = parent.query_selector("input").ok().flatten().as_ref().and_then(as_html) {
        set_styles(&input, &[("flex-grow", "1"), ("min-width", "0"), ("width", "auto")]);
    }

    let revisions = elements_by_class(parent, "SectionRevisions");
    if let [revisions] = revisions.as_slice() {
        if let Some(revisions) = as_html(revisions) {
            set_styles(
                &revisions,
                &[
                    ("display", "flex"),
                    ("flex-wrap", "nowrap"),
                    ("gap", "4px"),
                    ("flex", "1"),
                    ("min-width", "0"),
                ],
            );
            if let Some(select) = revisions.first_element_child().as_ref().and_then(as_html) {
                set_styles(
                    &select,
                    &[("flex", "1"), ("min-width", "0"), ("width", "100%")],
                );
            }
        }
    }

    let margin_bottom = match kind {
        EditorKind::Roadmap => "10px",
        EditorKind::Section => "0px",
    };
    set_styles(
        row,
        &[
            ("display", "flex"),
            ("flex-wrap", "nowrap"),
            ("gap", "4px"),
            ("margin", "0"),
            ("margin-bottom", margin_bottom),
            ("margin-left", "50px"),
            ("justify-content", "flex-end"),
        ],
    );
}

/// Ctrl+S (Cmd+S on Mac) inside the editor quick-saves instead of saving the page.
pub(crate) fn listen_for_save_shortcut(state: &EnhancerState, editor: &web_sys::HtmlElement) {
    let is_mac = web_sys::window()
        .and_then(|w| w.navigator().platform().ok())
        .is_some_and(|p| p.to_uppercase().contains("MAC"));

    let state2 = state.clone();
    let editor2: web_sys::Element = editor.clone().into();
    let cb = Closure::<dyn FnMut(web_sys::KeyboardEvent)>::new(move |e: web_sys::KeyboardEvent| {
        if !is_save_shortcut(&e.key(), e.ctrl_key(), e.meta_key(), is_mac) {
            return;
        }
        e.prevent_default();
        e.stop_propagation();
        e.stop_immediate_propagation();

        start_quick_save(&state2, &editor2);
    });
    let _ = editor.add_event_listener_with_callback("keydown", cb.as_ref().unchecked_ref());
    cb.forget();
}

/// Kicks off a save in the background; failures end in an alert.
pub(crate) fn start_quick_save(state: &EnhancerState, editor: &web_sys::Element) {
    let (Some(target), Some(handle)) = (save_target(state, editor), editor_handle(editor)) else {
        tracing::debug!("Unable to find required information to save");
        return;
    };

    let tracker = state.save_status.clone();
    let client = SaveClient::from_page(&state.config);
    let min_delay_ms = state.config.min_save_delay_ms;

    spawn_local(async move {
        let result = run_quick_save(&tracker, &client, &handle, &target, min_delay_ms).await;
        report_save_result(&result, &BrowserAlert);
    });
}

/// Where a failed save is announced to the user.
pub(crate) trait FailureNotice {
    fn notify(&self, message: &str);
}

/// A blocking `window.alert`.
pub(crate) struct BrowserAlert;

impl FailureNotice for BrowserAlert {
    fn notify(&self, message: &str) {
        if let Some(win) = web_sys::window() {
            let _ = win.alert_with_message(message);
        }
    }
}

/// Every failure kind ends in the same single notice.
pub(crate) fn report_save_result<N: FailureNotice>(result: &ApiResult<SaveOutcome>, notice: &N) {
    match result {
        Ok(outcome) => tracing::debug!(?outcome, "Quick save finished"),
        Err(_) => notice.notify(SAVE_FAILED_MESSAGE),
    }
}

/// Saves the region's current content, driving the button and label.
///
/// The button's `disabled` attribute doubles as the in-flight guard: a second
/// request for the same region while one is pending is dropped.
pub(crate) async fn run_quick_save<T: SaveTransport, E: EditorApi>(
    tracker: &SaveStatusTracker,
    transport: &T,
    editor: &E,
    target: &SaveTarget,
    min_delay_ms: u32,
) -> ApiResult<SaveOutcome> {
    let Some(button) = quick_save_button(&target.container) else {
        return Ok(SaveOutcome::Unavailable);
    };
    let Some(number) = target.info.numeric_id else {
        return Ok(SaveOutcome::Unavailable);
    };
    if button.has_attribute("disabled") {
        return Ok(SaveOutcome::InFlight);
    }

    let _ = button.set_attribute("disabled", "");
    button.set_inner_text(SAVING_TEXT);

    let req = SaveRequest {
        guide_id: target.guide_id,
        kind: target.info.kind,
        target: number,
        content: editor.content_html(),
        name: section_name(&target.container),
    };
    tracing::debug!("Saving {} {} of guide {}", req.kind, req.target, req.guide_id);

    let result = send_with_min_delay(transport, &req, min_delay_ms).await;

    if result.is_ok() {
        if let Some(label) = save_label(&target.container, &button) {
            tracker.record_save(&target.info.dom_id, label, target.container.clone());
        }
    }

    let _ = button.remove_attribute("disabled");
    button.set_inner_text(QUICK_SAVE_TEXT);

    result.map(|_| SaveOutcome::Saved)
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::api::{ApiError, ApiErrorKind};
    use crate::froala::fake::FakeEditor;
    use super::tests::RecordingNotice;
    use std::cell::RefCell;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    struct MockTransport {
        fail: bool,
        sent: RefCell<Vec<SaveRequest>>,
    }

    impl MockTransport {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                sent: RefCell::new(vec![]),
            }
        }
    }

    impl SaveTransport for MockTransport {
        async fn send(&self, req: &SaveRequest) -> ApiResult<serde_json::Value> {
            self.sent.borrow_mut().push(req.clone());
            if self.fail {
                return Err(ApiError {
                    kind: ApiErrorKind::Http,
                    message: "HTTP 500".to_string(),
                });
            }
            Ok(serde_json::json!({ "success": true }))
        }
    }

    fn mount_section(n: u64) -> SaveTarget {
        let doc = document().expect("document");
        let container: web_sys::HtmlElement = doc.create_element("div").expect("div").unchecked_into();
        container.set_id(&format!("SectionContainer{n}"));
        container.set_inner_html(&format!(
            r#"<div class="section-header">
                <input type="text" value="Stage 2">
                <span class="floatr">
                    <a class="section-saveButton">Save</a>
                    <a class="section-saveButton {SAVE_BUTTON_CLASS}">Quick Save</a>
                </span>
            </div>
            <textarea id="SectionTextarea{n}"></textarea>"#
        ));
        doc.body().expect("body").append_child(&container).expect("append");

        SaveTarget {
            guide_id: 77,
            info: EditorInfo {
                kind: EditorKind::Section,
                dom_id: format!("SectionTextarea{n}"),
                numeric_id: Some(n),
            },
            container,
        }
    }

    fn editor() -> FakeEditor {
        FakeEditor {
            html: "<p>Collect everything</p>".to_string(),
            ..Default::default()
        }
    }

    #[wasm_bindgen_test]
    async fn test_successful_save_updates_label() {
        let target = mount_section(901);
        let tracker = SaveStatusTracker::new();
        let transport = MockTransport::new(false);

        let outcome = run_quick_save(&tracker, &transport, &editor(), &target, 0)
            .await
            .expect("save should succeed");
        assert_eq!(outcome, SaveOutcome::Saved);

        let sent = transport.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].guide_id, 77);
        assert_eq!(sent[0].target, 901);
        assert_eq!(sent[0].name, "Stage 2");
        assert_eq!(sent[0].content, "<p>Collect everything</p>");

        let label = elements_by_class(&target.container, SAVE_LABEL_CLASS);
        assert_eq!(label.len(), 1);
        assert_eq!(as_html(&label[0]).expect("label").inner_text(), "Saved: Just now");
        assert!(tracker.is_tracking("SectionTextarea901"));

        let button = quick_save_button(&target.container).expect("button");
        assert!(!button.has_attribute("disabled"));
        assert_eq!(button.inner_text(), QUICK_SAVE_TEXT);
        target.container.remove();
    }

    #[wasm_bindgen_test]
    async fn test_region_without_name_sends_blank_name() {
        let target = mount_section(905);
        if let Some(input) = target.container.query_selector("input").ok().flatten() {
            input.remove();
        }
        let tracker = SaveStatusTracker::new();
        let transport = MockTransport::new(false);

        run_quick_save(&tracker, &transport, &editor(), &target, 0)
            .await
            .expect("save should succeed");
        assert_eq!(transport.sent.borrow()[0].name, "");
        target.container.remove();
    }

    #[wasm_bindgen_test]
    async fn test_failed_save_restores_button() {
        let target = mount_section(902);
        let tracker = SaveStatusTracker::new();
        let transport = MockTransport::new(true);

        let result = run_quick_save(&tracker, &transport, &editor(), &target, 0).await;
        assert!(result.is_err());

        let notice = RecordingNotice::default();
        report_save_result(&result, &notice);
        assert_eq!(*notice.0.borrow(), vec![SAVE_FAILED_MESSAGE.to_string()]);

        assert!(elements_by_class(&target.container, SAVE_LABEL_CLASS).is_empty());
        assert!(!tracker.is_tracking("SectionTextarea902"));

        let button = quick_save_button(&target.container).expect("button");
        assert!(!button.has_attribute("disabled"));
        assert_eq!(button.inner_text(), QUICK_SAVE_TEXT);
        target.container.remove();
    }

    #[wasm_bindgen_test]
    async fn test_pending_save_blocks_another() {
        let target = mount_section(903);
        let tracker = SaveStatusTracker::new();
        let transport = MockTransport::new(false);

        let button = quick_save_button(&target.container).expect("button");
        let _ = button.set_attribute("disabled", "");

        let outcome = run_quick_save(&tracker, &transport, &editor(), &target, 0)
            .await
            .expect("no request made");
        assert_eq!(outcome, SaveOutcome::InFlight);
        assert!(transport.sent.borrow().is_empty());
        target.container.remove();
    }

    #[wasm_bindgen_test]
    async fn test_save_waits_for_minimum_delay() {
        let target = mount_section(904);
        let tracker = SaveStatusTracker::new();
        let transport = MockTransport::new(false);

        let started = crate::util::now_ms();
        run_quick_save(&tracker, &transport, &editor(), &target, 200)
            .await
            .expect("save should succeed");
        assert!(crate::util::now_ms() - started >= 190.0);
        target.container.remove();
    }
}
