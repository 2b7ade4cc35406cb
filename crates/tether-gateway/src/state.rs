use std::sync::Arc;

use tether_core::ShortCode;
use tether_resolver::Resolver;

#[derive(Clone)]
pub struct AppState {
    resolver: Arc<dyn Resolver>,
    base_url: String,
}

impl AppState {
    /// Creates the state shared by every handler.
    ///
    /// # Arguments
    ///
    /// * `resolver` - Backs every link operation
    /// * `public_base_url` - Origin that short URLs are built on, e.g. "https://teth.er"
    pub fn new(resolver: Arc<dyn Resolver>, public_base_url: impl Into<String>) -> Self {
        Self {
            resolver,
            base_url: public_base_url.into(),
        }
    }

    /// The resolver handlers delegate to.
    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver.as_ref()
    }

    /// The public URL that redirects to `code`.
    pub fn short_url(&self, code: &ShortCode) -> String {
        code.to_url(&self.base_url)
    }
}
