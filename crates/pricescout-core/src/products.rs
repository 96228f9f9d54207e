use serde::{Deserialize, Serialize};

/// Merchandising snapshot of the store a [`Product`] came from.
///
/// Copied from the store descriptor at extraction time so a product can be
/// rendered without looking the store up again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_speed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_quality: Option<f64>,
    /// Lowercase city slug, e.g. `"nicosia"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Display label, e.g. `"Island-wide"` or `"Limassol"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Store delivers everywhere; location filtering never excludes it.
    #[serde(default)]
    pub covers_island: bool,
}

impl StoreSummary {
    /// Returns `true` when this store serves `location`.
    ///
    /// `None`, an empty string, and `"all"` match every store. Otherwise the
    /// store matches if it is island-wide or its city or location label equals
    /// the request, ignoring case.
    #[must_use]
    pub fn serves(&self, location: Option<&str>) -> bool {
        let Some(requested) = location.map(str::trim).filter(|l| !l.is_empty()) else {
            return true;
        };
        if requested.eq_ignore_ascii_case("all") || self.covers_island {
            return true;
        }
        let matches = |field: &Option<String>| {
            field
                .as_deref()
                .is_some_and(|v| v.trim().eq_ignore_ascii_case(requested))
        };
        matches(&self.city) || matches(&self.location)
    }
}

/// A product offer found on one storefront for one search call.
///
/// Never persisted; lives for the duration of a single response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Always strictly positive once a product leaves extraction.
    pub price: f64,
    /// ISO 4217 code, e.g. `"EUR"`.
    pub currency: String,
    pub store: StoreSummary,
    /// Absolute product page URL.
    pub url: String,
    /// Absolute image URL, or empty when the page had none.
    #[serde(default)]
    pub image_url: String,
    /// Rating on a 0–5 scale. `None` means the store showed no rating, which
    /// is not the same as a rating of zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_time: Option<String>,
    pub in_stock: bool,
}

impl Product {
    /// Checks the invariants every emitted product must hold: non-empty name,
    /// finite positive price, rating (if any) within `[0, 5]`, absolute URL.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let absolute = |u: &str| u.starts_with("http://") || u.starts_with("https://");
        !self.name.trim().is_empty()
            && self.price.is_finite()
            && self.price > 0.0
            && self.rating.is_none_or(|r| (0.0..=5.0).contains(&r))
            && absolute(&self.url)
            && (self.image_url.is_empty() || absolute(&self.image_url))
    }
}
