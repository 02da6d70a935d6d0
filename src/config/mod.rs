use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub(crate) const CUSTOM_COLORS_KEY: &str = "psnp-gee-customcolors";

/// Added to every editor content region once it has been wired up.
pub(crate) const EDITOR_MARKER_CLASS: &str = "psnp-gee-editor";
pub(crate) const SAVE_BUTTON_CLASS: &str = "psnp-gee-save-button";
pub(crate) const SAVE_LABEL_CLASS: &str = "psnp-gee-save-label";

const CONFIG_GLOBAL: &str = "PSNP_GEE";

static GUIDE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/guide/(\d+)-").expect("valid regex"));

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub(crate) struct EnhancerConfig {
    /// Prepended to save endpoints that are not already absolute paths.
    pub xhr_prefix: String,

    /// Lower bound on how long "Saving..." stays visible.
    pub min_save_delay_ms: u32,

    pub debug: bool,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            xhr_prefix: "/xhr/".to_string(),
            min_save_delay_ms: 750,
            debug: false,
        }
    }
}

impl EnhancerConfig {
    /// Reads overrides from `window.PSNP_GEE`, if the page (or a userscript
    /// manager) defined one.
    pub fn new() -> Self {
        let Some(window) = web_sys::window() else {
            return Self::default();
        };

        let Some(raw) = window.get(CONFIG_GLOBAL) else {
            return Self::default();
        };
        if raw.is_undefined() || !raw.is_object() {
            return Self::default();
        }

        let json = js_sys::JSON::stringify(&raw)
            .ok()
            .and_then(|s| s.as_string())
            .unwrap_or_default();

        Self::from_json(&json).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed {CONFIG_GLOBAL}: {e}");
            Self::default()
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The enhancer only runs on guide edit pages.
pub(crate) fn is_edit_page(pathname: &str) -> bool {
    pathname.ends_with("/edit")
}

pub(crate) fn parse_guide_id(href: &str) -> Option<u64> {
    GUIDE_ID
        .captures(href)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
