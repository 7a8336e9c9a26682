//! Strategy selection
//!
//! Classifies a request into a [`ResourceClass`] and looks the class up in
//! the configured class → strategy table.

use lantern_domain::{Request, ResourceClass, Strategy, StrategyTable};

/// Maps requests to caching strategies.
#[derive(Debug, Clone, Default)]
pub struct StrategySelector {
    table: StrategyTable,
}

impl StrategySelector {
    /// Selector over a configured class table.
    pub fn new(table: StrategyTable) -> Self {
        Self { table }
    }

    /// Resource class of `request`.
    ///
    /// The declared destination wins when present and non-empty; otherwise
    /// the class is inferred from the URL path.
    pub fn classify(&self, request: &Request) -> ResourceClass {
        match request.destination() {
            Some(destination) => ResourceClass::from_destination(destination),
            None => ResourceClass::from_path(request.path()),
        }
    }

    /// Strategy configured for `class`, network-first when unmapped.
    pub fn strategy_for(&self, class: ResourceClass) -> Strategy {
        self.table.get(class)
    }

    /// Strategy for `request`. Never fails.
    pub fn select(&self, request: &Request) -> Strategy {
        self.strategy_for(self.classify(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(url: &str) -> Request {
        Request::get(url).unwrap()
    }

    #[test]
    fn destination_takes_precedence_over_extension() {
        let selector = StrategySelector::default();
        let request = get("https://app.test/logo.png").with_destination("document");
        assert_eq!(selector.classify(&request), ResourceClass::Document);
        assert_eq!(selector.select(&request), Strategy::NetworkFirst);
    }

    #[test]
    fn empty_destination_falls_back_to_path() {
        let selector = StrategySelector::default();
        let request = get("https://app.test/assets/js/main.js").with_destination("");
        assert_eq!(selector.classify(&request), ResourceClass::Script);
        assert_eq!(selector.select(&request), Strategy::StaleWhileRevalidate);
    }

    #[test]
    fn default_table_routes_each_class() {
        let selector = StrategySelector::default();
        let cases = [
            ("https://app.test/", Strategy::NetworkFirst),
            ("https://app.test/about.html", Strategy::NetworkFirst),
            ("https://app.test/main.css", Strategy::StaleWhileRevalidate),
            ("https://app.test/hero.JPG", Strategy::CacheFirst),
            ("https://app.test/f.woff2", Strategy::CacheFirst),
            ("https://app.test/api/data", Strategy::NetworkFirst),
        ];
        for (url, expected) in cases {
            assert_eq!(selector.select(&get(url)), expected, "{url}");
        }
    }

    #[test]
    fn unmapped_class_defaults_to_network_first() {
        let table = StrategyTable::empty().with(ResourceClass::Image, Strategy::CacheOnly);
        let selector = StrategySelector::new(table);
        assert_eq!(selector.select(&get("https://app.test/a.png")), Strategy::CacheOnly);
        assert_eq!(selector.select(&get("https://app.test/a.js")), Strategy::NetworkFirst);
    }
}
