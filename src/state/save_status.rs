use crate::util::{document, now_ms};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

const FAST_REFRESH_MS: i32 = 5_000;
const SLOW_REFRESH_MS: i32 = 60_000;

/// Human readable age of a save, e.g. `45s ago`.
pub(crate) fn format_time_ago(elapsed_secs: u64) -> String {
    let seconds = elapsed_secs;
    if seconds < 5 {
        return "Just now".to_string();
    }
    if seconds < 60 {
        return format!("{seconds}s ago");
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }

    let days = hours / 24;
    if days < 7 {
        return format!("{days}d ago");
    }

    let weeks = days / 7;
    if weeks < 5 {
        return format!("{weeks}w ago");
    }

    let months = days / 30;
    if months < 12 {
        return format!("{months}mo ago");
    }

    format!("{}y ago", days / 365)
}

/// Label refresh period: every 5s for the first minute, then every minute.
pub(crate) fn refresh_interval_ms(elapsed_secs: u64) -> i32 {
    if elapsed_secs < 60 {
        FAST_REFRESH_MS
    } else {
        SLOW_REFRESH_MS
    }
}

fn elapsed_secs(since_ms: f64) -> u64 {
    ((now_ms() - since_ms) / 1000.0).floor().max(0.0) as u64
}

fn is_hidden(container: &web_sys::HtmlElement) -> bool {
    container
        .first_element_child()
        .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
        .map(|el| el.style().get_property_value("display").unwrap_or_default() == "none")
        .unwrap_or(false)
}

struct StatusEntry {
    last_saved_ms: f64,

    /// Bumped on every save so timers and watchers from an older save can
    /// tell they have been superseded.
    generation: u64,

    label: web_sys::HtmlElement,
    container: web_sys::HtmlElement,
    timer_id: Option<i32>,
    watcher: Option<web_sys::MutationObserver>,
}

impl StatusEntry {
    fn release(&mut self) {
        if let Some(tid) = self.timer_id.take() {
            if let Some(win) = web_sys::window() {
                win.clear_timeout_with_handle(tid);
            }
        }
        if let Some(observer) = self.watcher.take() {
            observer.disconnect();
        }
    }
}

/// "Saved: 2m ago" labels, one per editor region, keyed by the editor's dom id.
///
/// Entries live until their label leaves the page or the region is closed.
#[derive(Clone, Default)]
pub(crate) struct SaveStatusTracker {
    entries: Rc<RefCell<HashMap<String, StatusEntry>>>,
    generations: Rc<Cell<u64>>,
}

impl SaveStatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful save and (re)starts the label's refresh cycle.
    pub fn record_save(
        &self,
        dom_id: &str,
        label: web_sys::HtmlElement,
        container: web_sys::HtmlElement,
    ) {
        let generation = self.generations.get() + 1;
        self.generations.set(generation);

        let entry = StatusEntry {
            last_saved_ms: now_ms(),
            generation,
            label,
            container,
            timer_id: None,
            watcher: None,
        };

        let previous = self.entries.borrow_mut().insert(dom_id.to_string(), entry);
        if let Some(mut old) = previous {
            old.release();
        }

        self.render(dom_id, generation);
        self.schedule_refresh(dom_id, generation);
        self.watch_teardown(dom_id, generation);
    }

    #[cfg(test)]
    pub fn last_saved_ms(&self, dom_id: &str) -> Option<f64> {
        self.entries.borrow().get(dom_id).map(|e| e.last_saved_ms)
    }

    #[cfg(test)]
    pub fn is_tracking(&self, dom_id: &str) -> bool {
        self.entries.borrow().contains_key(dom_id)
    }

    /// Returns false when `generation` is no longer the active save.
    fn render(&self, dom_id: &str, generation: u64) -> bool {
        let entries = self.entries.borrow();
        let Some(entry) = entries.get(dom_id) else {
            return false;
        };
        if entry.generation != generation {
            return false;
        }

        let text = format!("Saved: {}", format_time_ago(elapsed_secs(entry.last_saved_ms)));
        entry.label.set_inner_text(&text);
        true
    }

    fn schedule_refresh(&self, dom_id: &str, generation: u64) {
        let Some(win) = web_sys::window() else {
            return;
        };

        let elapsed = {
            let entries = self.entries.borrow();
            match entries.get(dom_id) {
                Some(e) if e.generation == generation => elapsed_secs(e.last_saved_ms),
                _ => return,
            }
        };

        let s2 = self.clone();
        let dom_id2 = dom_id.to_string();
        let cb = Closure::once_into_js(move || {
            if s2.render(&dom_id2, generation) {
                s2.schedule_refresh(&dom_id2, generation);
            }
        });

        let tid = win
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                refresh_interval_ms(elapsed),
            )
            .unwrap_or(0);

        if let Some(entry) = self.entries.borrow_mut().get_mut(dom_id) {
            if entry.generation == generation {
                entry.timer_id = Some(tid);
            }
        }
    }

    fn watch_teardown(&self, dom_id: &str, generation: u64) {
        let Some(body) = document().and_then(|d| d.body()) else {
            return;
        };

        let s2 = self.clone();
        let dom_id2 = dom_id.to_string();
        let cb = Closure::<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>::new(
            move |_records: js_sys::Array, observer: web_sys::MutationObserver| {
                s2.check_teardown(&dom_id2, generation, &observer);
            },
        )
        .into_js_value();

        let observer = match web_sys::MutationObserver::new(cb.unchecked_ref()) {
            Ok(o) => o,
            Err(e) => {
                tracing::warn!("Could not watch save label: {e:?}");
                return;
            }
        };

        let init = web_sys::MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        init.set_attributes(true);
        init.set_attribute_filter(&js_sys::Array::of1(&"style".into()));
        if let Err(e) = observer.observe_with_options(&body, &init) {
            tracing::warn!("Could not watch save label: {e:?}");
            return;
        }

        if let Some(entry) = self.entries.borrow_mut().get_mut(dom_id) {
            if entry.generation == generation {
                entry.watcher = Some(observer);
                return;
            }
        }
        observer.disconnect();
    }

    fn check_teardown(&self, dom_id: &str, generation: u64, observer: &web_sys::MutationObserver) {
        let gone = {
            let entries = self.entries.borrow();
            match entries.get(dom_id) {
                Some(e) if e.generation == generation => {
                    !e.label.is_connected() || is_hidden(&e.container)
                }
                _ => {
                    // Superseded by a newer save.
                    observer.disconnect();
                    return;
                }
            }
        };

        if gone {
            let removed = self.entries.borrow_mut().remove(dom_id);
            if let Some(mut entry) = removed {
                entry.release();
            }
            tracing::debug!("Stopped tracking save status for {dom_id}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_time_ago(0), "Just now");
        assert_eq!(format_time_ago(3), "Just now");
        assert_eq!(format_time_ago(5), "5s ago");
        assert_eq!(format_time_ago(45), "45s ago");
        assert_eq!(format_time_ago(59), "59s ago");
    }

    #[test]
    fn test_format_minutes_hours() {
        assert_eq!(format_time_ago(60), "1m ago");
        assert_eq!(format_time_ago(125), "2m ago");
        assert_eq!(format_time_ago(3599), "59m ago");
        assert_eq!(format_time_ago(3700), "1h ago");
    }

    #[test]
    fn test_format_days_weeks() {
        let day = 24 * 3600;
        assert_eq!(format_time_ago(2 * day), "2d ago");
        assert_eq!(format_time_ago(6 * day), "6d ago");
        assert_eq!(format_time_ago(7 * day), "1w ago");
        assert_eq!(format_time_ago(20 * day), "2w ago");
        assert_eq!(format_time_ago(34 * day), "4w ago");
    }

    #[test]
    fn test_format_months_years() {
        let day = 24 * 3600;
        assert_eq!(format_time_ago(35 * day), "1mo ago");
        assert_eq!(format_time_ago(200 * day), "6mo ago");
        assert_eq!(format_time_ago(400 * day), "1y ago");
        assert_eq!(format_time_ago(800 * day), "2y ago");
    }

    #[test]
    fn test_refresh_interval() {
        assert_eq!(refresh_interval_ms(0), 5_000);
        assert_eq!(refresh_interval_ms(59), 5_000);
        assert_eq!(refresh_interval_ms(60), 60_000);
        assert_eq!(refresh_interval_ms(86_400), 60_000);
    }
}
