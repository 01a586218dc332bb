//! Built-in extraction strategies.

mod anchors;
mod attributes;
mod iframes;
mod inline_scripts;
mod json_ld;
mod meta_tags;
mod platform_scripts;

pub use anchors::AnchorStrategy;
pub use attributes::AttributeStrategy;
pub use iframes::IframeStrategy;
pub use inline_scripts::InlineScriptStrategy;
pub use json_ld::JsonLdStrategy;
pub use meta_tags::MetaTagStrategy;
pub use platform_scripts::PlatformScriptStrategy;

use std::sync::Arc;

use super::ExtractionStrategy;

/// All built-in strategies, in run order.
pub fn builtin() -> Vec<Arc<dyn ExtractionStrategy>> {
    vec![
        Arc::new(AnchorStrategy),
        Arc::new(InlineScriptStrategy),
        Arc::new(MetaTagStrategy),
        Arc::new(IframeStrategy),
        Arc::new(AttributeStrategy),
        Arc::new(JsonLdStrategy),
        Arc::new(PlatformScriptStrategy),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use url::Url;

    use crate::discovery::{CandidateSet, ExtractionStrategy, Page};

    pub const BASE: &str = "https://librairie.ademe.fr/air/123-guide.html";

    pub fn run(strategy: &dyn ExtractionStrategy, html: &str) -> CandidateSet {
        let page = Page::parse(html, Url::parse(BASE).unwrap());
        strategy.extract(&page).unwrap()
    }
}
