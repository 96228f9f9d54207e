//! URL templating and category-fallback routing for store descriptors.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use pricescout_core::StoreDescriptor;

/// Characters left unescaped by JavaScript's `encodeURIComponent`; storefront
/// search endpoints are written against that encoding.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Builds the store's search URL for `query`.
#[must_use]
pub fn search_url(store: &StoreDescriptor, query: &str) -> String {
    let encoded = utf8_percent_encode(query.trim(), URI_COMPONENT).to_string();
    join_path(
        store.origin(),
        &store.search_path.replace("{query}", &encoded),
    )
}

/// Returns the category keyword that `query` mentions, if any.
///
/// A keyword matches when the lowercased query contains it. The longest
/// match wins so `"washing machine"` beats a shorter overlapping keyword.
#[must_use]
pub fn matching_category<'a>(store: &'a StoreDescriptor, query: &str) -> Option<&'a str> {
    let lower = query.to_lowercase();
    store
        .category_fallbacks
        .keys()
        .filter(|k| lower.contains(k.to_lowercase().trim()))
        .max_by_key(|k| k.len())
        .map(String::as_str)
}

/// Builds the category page URL for `query`, if the store maps a keyword in it.
#[must_use]
pub fn category_url(store: &StoreDescriptor, query: &str) -> Option<String> {
    let keyword = matching_category(store, query)?;
    let path = store.category_fallbacks.get(keyword)?;
    Some(join_path(store.origin(), path))
}

fn join_path(origin: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{origin}{path}")
    } else {
        format!("{origin}/{path}")
    }
}

/// Where to go for one store and query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationPlan {
    /// First URL to load.
    pub primary: String,
    /// URL to retry once if `primary` answers 404.
    pub on_not_found: Option<String>,
}

impl NavigationPlan {
    /// Stores marked `category_first` go straight to a matching category
    /// page. Everyone else tries search and keeps the category page (when one
    /// matches) as the 404 fallback.
    #[must_use]
    pub fn for_query(store: &StoreDescriptor, query: &str) -> Self {
        let category = category_url(store, query);
        match category {
            Some(url) if store.category_first => Self {
                primary: url,
                on_not_found: None,
            },
            fallback => Self {
                primary: search_url(store, query),
                on_not_found: fallback,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pricescout_core::{ExtractionMethod, SelectorSet};

    use super::*;

    fn make_store(category_first: bool) -> StoreDescriptor {
        let mut category_fallbacks = BTreeMap::new();
        category_fallbacks.insert("laptop".to_string(), "/cat/laptops".to_string());
        category_fallbacks.insert("washing machine".to_string(), "cat/washers".to_string());
        category_fallbacks.insert("machine".to_string(), "/cat/machines".to_string());
        StoreDescriptor {
            id: "shop".to_string(),
            name: "Shop".to_string(),
            base_url: "https://shop.test/".to_string(),
            search_path: "/search?q={query}&type=product".to_string(),
            method: ExtractionMethod::Markup,
            selectors: SelectorSet::default(),
            ready_selector: None,
            category_fallbacks,
            category_first,
            max_results: 12,
            currency: "EUR".to_string(),
            rating: None,
            delivery_speed: None,
            service_quality: None,
            city: None,
            location: None,
            covers_island: false,
        }
    }

    #[test]
    fn search_url_encodes_query_like_uri_component() {
        let store = make_store(false);
        assert_eq!(
            search_url(&store, "samsung tv 55\""),
            "https://shop.test/search?q=samsung%20tv%2055%22&type=product"
        );
        assert_eq!(
            search_url(&store, "usb-c (2m)"),
            "https://shop.test/search?q=usb-c%20(2m)&type=product"
        );
    }

    #[test]
    fn search_url_encodes_non_ascii() {
        let store = make_store(false);
        assert_eq!(
            search_url(&store, "τηλέφωνο"),
            "https://shop.test/search?q=%CF%84%CE%B7%CE%BB%CE%AD%CF%86%CF%89%CE%BD%CE%BF&type=product"
        );
    }

    #[test]
    fn category_match_is_substring_and_prefers_longest() {
        let store = make_store(false);
        assert_eq!(matching_category(&store, "Gaming Laptops"), Some("laptop"));
        assert_eq!(
            matching_category(&store, "bosch washing machine"),
            Some("washing machine")
        );
        assert_eq!(matching_category(&store, "headphones"), None);
    }

    #[test]
    fn category_url_handles_relative_paths() {
        let store = make_store(false);
        assert_eq!(
            category_url(&store, "washing machine").as_deref(),
            Some("https://shop.test/cat/washers")
        );
        assert_eq!(
            category_url(&store, "laptop").as_deref(),
            Some("https://shop.test/cat/laptops")
        );
    }

    #[test]
    fn plan_search_first_keeps_category_for_404() {
        let plan = NavigationPlan::for_query(&make_store(false), "laptop");
        assert_eq!(
            plan.primary,
            "https://shop.test/search?q=laptop&type=product"
        );
        assert_eq!(
            plan.on_not_found.as_deref(),
            Some("https://shop.test/cat/laptops")
        );
    }

    #[test]
    fn plan_category_first_navigates_directly() {
        let plan = NavigationPlan::for_query(&make_store(true), "laptop");
        assert_eq!(plan.primary, "https://shop.test/cat/laptops");
        assert!(plan.on_not_found.is_none());
    }

    #[test]
    fn plan_without_keyword_match_has_no_fallback() {
        let plan = NavigationPlan::for_query(&make_store(true), "headphones");
        assert_eq!(
            plan.primary,
            "https://shop.test/search?q=headphones&type=product"
        );
        assert!(plan.on_not_found.is_none());
    }
}
