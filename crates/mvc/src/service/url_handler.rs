use once_cell::sync::Lazy;
use std::sync::Arc;

static URL_HANDLER: Lazy<Arc<UrlHandler>> = Lazy::new(|| Arc::new(UrlHandler::new()));

/// Builds action urls. There is one process wide instance, see
/// [`UrlHandler::get_global_instance`].
#[derive(Debug, Default)]
pub struct UrlHandler {
    _priv: (),
}

impl UrlHandler {
    fn new() -> Self {
        Self::default()
    }

    pub fn get_global_instance() -> Arc<UrlHandler> {
        Arc::clone(&URL_HANDLER)
    }

    /// `<base_url>?action_<name>=true&<params...>`
    pub fn action_url(&self, base_url: &str, action_name: &str, params: &[(&str, &str)]) -> String {
        let action_key = format!("action_{action_name}");
        let mut pairs = vec![(action_key.as_str(), "true")];
        pairs.extend_from_slice(params);
        let query = serde_urlencoded::to_string(pairs).unwrap_or_default();
        format!("{base_url}?{query}")
    }
}
