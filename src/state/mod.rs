pub(crate) mod save_status;

use crate::config::EnhancerConfig;
use crate::storage::{BrowserStorage, CustomColorStore};
use save_status::SaveStatusTracker;
use std::cell::RefCell;
use std::rc::Rc;

/// Page-session state shared by every injected feature.
#[derive(Clone)]
pub(crate) struct EnhancerState {
    pub config: Rc<EnhancerConfig>,

    /// Parsed from the URL; document-scoped features are off without it.
    pub guide_id: Option<u64>,

    pub colors: Rc<RefCell<CustomColorStore<BrowserStorage>>>,
    pub save_status: SaveStatusTracker,
    pub selected_image: SelectedImage,
}

impl EnhancerState {
    pub fn new(config: EnhancerConfig, guide_id: Option<u64>) -> Self {
        Self {
            config: Rc::new(config),
            guide_id,
            colors: Rc::new(RefCell::new(CustomColorStore::new(BrowserStorage))),
            save_status: SaveStatusTracker::new(),
            selected_image: SelectedImage::default(),
        }
    }
}

/// The image most recently clicked in any editor.
///
/// The DOM has no notion of a selected image, so we track clicks ourselves.
/// Only one image is selected page-wide.
#[derive(Clone, Default)]
pub(crate) struct SelectedImage(Rc<RefCell<Option<web_sys::HtmlImageElement>>>);

impl SelectedImage {
    pub fn select(&self, image: web_sys::HtmlImageElement) {
        *self.0.borrow_mut() = Some(image);
    }

    /// The selection, unless the image has since left the page.
    pub fn current(&self) -> Option<web_sys::HtmlImageElement> {
        let mut slot = self.0.borrow_mut();
        if slot.as_ref().is_some_and(|img| !img.is_connected()) {
            *slot = None;
        }
        slot.clone()
    }
}
