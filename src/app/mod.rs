use crate::config::{is_edit_page, parse_guide_id, EnhancerConfig};
use crate::injector::Injector;
use crate::state::EnhancerState;

/// Boots the enhancer on guide edit pages; does nothing anywhere else.
pub fn start() {
    let config = EnhancerConfig::new();
    init_tracing(&config);

    let Some(window) = web_sys::window() else {
        return;
    };
    let location = window.location();

    let path = location.pathname().unwrap_or_default();
    if !is_edit_page(&path) {
        tracing::debug!("Not a guide edit page: {path}");
        return;
    }

    // Background saves are spawned before any view is mounted.
    let _ = any_spawner::Executor::init_wasm_bindgen();

    let href = location.href().unwrap_or_default();
    let guide_id = parse_guide_id(&href);
    match guide_id {
        Some(id) => tracing::info!("Enhancing guide {id}"),
        None => tracing::error!("Unable to parse guide id from URL: {href}"),
    }

    let injector = Injector::new(EnhancerState::new(config, guide_id));
    injector.reconcile();
    injector.observe();
}

fn init_tracing(config: &EnhancerConfig) {
    #[cfg(target_arch = "wasm32")]
    {
        use tracing::subscriber::set_global_default;
        use tracing::Level;
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::Registry;

        let level = if config.debug { Level::DEBUG } else { Level::INFO };
        let wasm_layer = tracing_wasm::WASMLayer::new(
            tracing_wasm::WASMLayerConfigBuilder::new()
                .set_max_level(level)
                .build(),
        );

        let _ = set_global_default(Registry::default().with(wasm_layer));
    }

    #[cfg(not(target_arch = "wasm32"))]
    let _ = config;
}
