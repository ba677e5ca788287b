//! Remote paywall configuration, as returned by the configuration service.

use bon::Builder;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::{AnyJson, ColorToken, Record};

/// Paywall configuration fetched once per session.
///
/// Immutable after the fetch completes; the session shares it behind an `Arc`.
///
/// ```
/// use webpaywall_core::types::{Configuration, PresentationStyle};
///
/// let config: Configuration = serde_json::from_value(serde_json::json!({
///     "contentUrl": "https://paywalls.example.com/p/annual",
///     "substitutions": [{ "key": "price", "value": "$9.99" }],
///     "presentationStyle": "fullscreen",
///     "backgroundColor": "#000000"
/// })).unwrap();
///
/// assert_eq!(config.presentation_style, PresentationStyle::Fullscreen);
/// assert_eq!(config.substitutions.get("price"), Some("$9.99"));
/// ```
#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Location of the paywall content loaded into the surface.
    pub content_url: Url,
    /// Template substitutions pushed into the surface once it reports ready.
    #[serde(default)]
    #[builder(default, into)]
    pub substitutions: Substitutions,
    /// How the host should present the surface.
    #[serde(default)]
    #[builder(default)]
    pub presentation_style: PresentationStyle,
    /// Background shown behind the surface while it is hidden.
    #[serde(default)]
    #[builder(default, into)]
    pub background_color: ColorToken,
}

/// Presentation style requested by the paywall configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationStyle {
    #[default]
    Sheet,
    Modal,
    Fullscreen,
}

/// A single template substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub key: String,
    pub value: String,
}

impl Substitution {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Substitution {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered template substitutions.
///
/// Serialized as a list of `{key, value}` pairs in configuration responses, and flattened
/// into a JSON object (see [`Substitutions::to_record`]) when pushed into the surface.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Substitutions(pub Vec<Substitution>);

impl Substitutions {
    /// Look up the value of the first substitution with the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Substitution> {
        self.0.iter()
    }

    /// Flatten into an insertion-ordered JSON object.
    ///
    /// A repeated key keeps its first position and takes the last value.
    pub fn to_record(&self) -> Record {
        self.0
            .iter()
            .map(|s| (s.key.clone(), AnyJson::String(s.value.clone())))
            .collect()
    }
}

impl From<Vec<Substitution>> for Substitutions {
    fn from(value: Vec<Substitution>) -> Self {
        Substitutions(value)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Substitutions {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Substitutions(
            iter.into_iter()
                .map(|(k, v)| Substitution::new(k, v))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Substitutions {
    type Item = &'a Substitution;
    type IntoIter = std::slice::Iter<'a, Substitution>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
