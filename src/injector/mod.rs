//! Watches the page and adds our controls to the editor's UI as it appears.
//!
//! The widget builds its toolbars, dropdowns and popups lazily and rebuilds
//! them freely, so every pass re-checks everything. Each feature is a no-op
//! when its controls are already present.

pub(crate) mod grid;
pub(crate) mod palette;
pub(crate) mod quick_save;
pub(crate) mod self_link;

use crate::config::EDITOR_MARKER_CLASS;
use crate::state::EnhancerState;
use crate::util::{append_class, as_html, document, document_elements_by_class};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

const EDITOR_REGION_CLASS: &str = "fr-element fr-view";

#[derive(Clone)]
pub(crate) struct Injector {
    state: EnhancerState,
}

impl Injector {
    pub fn new(state: EnhancerState) -> Self {
        Self { state }
    }

    /// One pass over the page.
    pub fn reconcile(&self) {
        let Some(doc) = document() else {
            return;
        };

        grid::augment_grid_toolbars(&doc);
        palette::ensure_palette(&self.state, &doc);
        self_link::ensure_self_link_button(&self.state, &doc);
        self.wire_new_editors(&doc);
    }

    fn wire_new_editors(&self, doc: &web_sys::Document) {
        for region in document_elements_by_class(doc, EDITOR_REGION_CLASS) {
            if region.class_list().contains(EDITOR_MARKER_CLASS) {
                continue;
            }
            append_class(&region, EDITOR_MARKER_CLASS);

            let Some(region) = as_html(&region) else {
                continue;
            };
            tracing::debug!("Wiring editor region");

            self_link::track_image_selection(&self.state, &region);
            quick_save::setup_quick_save(&self.state, &region);
            quick_save::listen_for_save_shortcut(&self.state, &region);
        }
    }

    /// Reconciles after every DOM change under `<body>` for the rest of the page's life.
    pub fn observe(self) {
        let Some(body) = document().and_then(|d| d.body()) else {
            tracing::error!("No document body to observe");
            return;
        };

        let cb = Closure::<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>::new(
            move |_records: js_sys::Array, _observer: web_sys::MutationObserver| {
                self.reconcile();
            },
        )
        .into_js_value();

        let observer = match web_sys::MutationObserver::new(cb.unchecked_ref()) {
            Ok(o) => o,
            Err(e) => {
                tracing::error!("Could not create page observer: {e:?}");
                return;
            }
        };

        let init = web_sys::MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        if let Err(e) = observer.observe_with_options(&body, &init) {
            tracing::error!("Could not observe page: {e:?}");
        }
    }
}
