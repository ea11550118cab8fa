//! Tag bidder partner configuration.
//!
//! This module defines the TOML-deserializable configuration of one tag
//! bidder partner: its endpoint template and the customisations applied to
//! its copy of the standard macro table.

use std::{collections::HashMap, path::Path};

use serde::Deserialize;
use url::Url;

use crate::{
    bidder::{Flags, MACRO_DELIMITER, MacroMapper},
    error::{Result, TagBidderError},
    vast::DEFAULT_CURRENCY,
};

/// Configuration of one tag bidder partner.
///
/// # Examples
///
/// ```
/// use tag_bidder::config::TagBidderConfig;
///
/// let config = TagBidderConfig::from_toml(r#"
///     name = "acme"
///     endpoint = "https://ads.acme.test/vast?tmax=%%timeout%%&ch=%%channel%%"
///     remove_empty_params = true
///     cached_macros = ["timeout"]
///
///     [[custom_macros]]
///     key = "channel"
/// "#)?;
///
/// let mapper = config.mapper();
/// assert!(mapper.get("timeout").unwrap().cacheable);
/// assert!(mapper.contains("channel"));
/// # Ok::<(), tag_bidder::TagBidderError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagBidderConfig {
    /// Partner name, unique within a registry.
    pub name: String,

    /// Endpoint URL template with `%%key%%` macro tokens.
    pub endpoint: String,

    /// Drop query parameters that render empty (see [`Flags`]).
    #[serde(default)]
    pub remove_empty_params: bool,

    /// Currency assumed when a response does not name one.
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Standard macros whose values are cached for the duration of one render.
    #[serde(default)]
    pub cached_macros: Vec<String>,

    /// Partner-specific macros resolved by the partner's capability surface.
    #[serde(default)]
    pub custom_macros: Vec<CustomMacro>,

    /// Fixed values substituted for `%%key%%` before any table lookup.
    #[serde(default)]
    pub bidder_keys: HashMap<String, String>,
}

/// A partner-specific macro.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CustomMacro {
    /// Bare macro key, written as `%%key%%` in the endpoint.
    pub key: String,

    /// Whether the value is cached for the duration of one render.
    #[serde(default)]
    pub cacheable: bool,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_owned()
}

impl TagBidderConfig {
    /// Creates a configuration with defaults for everything but name and endpoint.
    #[must_use]
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            remove_empty_params: false,
            default_currency: default_currency(),
            cached_macros: Vec::new(),
            custom_macros: Vec::new(),
            bidder_keys: HashMap::new(),
        }
    }

    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TagBidderError::InvalidConfig`] if the TOML is malformed or
    /// the configuration fails [`validate`](Self::validate).
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| TagBidderError::InvalidConfig(format!("invalid TOML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`TagBidderError::InvalidInput`] if the file cannot be read, and
    /// the errors of [`from_toml`](Self::from_toml) otherwise.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            TagBidderError::InvalidInput(format!(
                "cannot read config file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Validates the configuration.
    ///
    /// This method checks that:
    /// - the name is non-empty and made of ASCII letters, digits, `-` and `_`
    /// - the endpoint is an absolute `http` or `https` URL
    /// - the default currency is a three-letter code
    /// - custom macro keys are non-empty and contain no delimiter or whitespace
    ///
    /// Cached macro keys unknown to the table are reported but not rejected.
    ///
    /// # Errors
    ///
    /// Returns [`TagBidderError::InvalidConfig`] describing the first failure.
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        self.validate_endpoint()?;
        validate_currency(&self.default_currency)?;
        for custom in &self.custom_macros {
            validate_macro_key(&custom.key)?;
        }
        for key in self.bidder_keys.keys() {
            validate_macro_key(key)?;
        }

        let mapper = self.mapper();
        for key in self.cached_macros.iter().filter(|key| !mapper.contains(key)) {
            tracing::warn!(bidder = %self.name, key = %key, "cached macro is not in the macro table");
        }
        Ok(())
    }

    fn validate_endpoint(&self) -> Result<()> {
        let url = Url::parse(&self.endpoint).map_err(|e| {
            TagBidderError::InvalidConfig(format!("invalid endpoint '{}': {e}", self.endpoint))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TagBidderError::InvalidConfig(format!(
                "endpoint must use http or https, got: {}",
                url.scheme()
            )));
        }
        Ok(())
    }

    /// Builds this partner's macro table.
    ///
    /// Starts from a clone of the standard table, marks `cached_macros` as
    /// cacheable, then registers `custom_macros`.
    #[must_use]
    pub fn mapper(&self) -> MacroMapper {
        let mut mapper = MacroMapper::standard();
        for key in &self.cached_macros {
            mapper.set_cacheable(key, true);
        }
        for custom in &self.custom_macros {
            mapper.add_custom(custom.key.clone(), custom.cacheable);
        }
        mapper
    }

    /// Rendering flags for the endpoint.
    #[must_use]
    pub const fn flags(&self) -> Flags {
        Flags { remove_empty_params: self.remove_empty_params }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TagBidderError::InvalidConfig("bidder name must not be empty".to_owned()));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(TagBidderError::InvalidConfig(format!(
            "bidder name must be alphanumeric with '-' or '_': {name}"
        )));
    }
    Ok(())
}

fn validate_currency(currency: &str) -> Result<()> {
    if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(TagBidderError::InvalidConfig(format!(
            "default_currency must be a three-letter ISO 4217 code, got: {currency}"
        )));
    }
    Ok(())
}

fn validate_macro_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(TagBidderError::InvalidConfig("macro key must not be empty".to_owned()));
    }
    if key.contains(MACRO_DELIMITER) || key.contains(char::is_whitespace) {
        return Err(TagBidderError::InvalidConfig(format!(
            "macro key must be bare text without '{MACRO_DELIMITER}' or whitespace: {key}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::unreachable,
    reason = "test code uses unreachable for expected-path assertions"
)]
mod tests {
    use super::*;
    use crate::bidder::keys;

    #[test]
    fn test_minimal_config_defaults() {
        let config = TagBidderConfig::from_toml(
            r#"
            name = "acme"
            endpoint = "https://ads.acme.test/vast"
            "#,
        )
        .unwrap();

        assert!(!config.remove_empty_params);
        assert_eq!(config.default_currency, "USD");
        assert!(config.custom_macros.is_empty());
        assert_eq!(config.flags(), Flags::default());
        assert_eq!(config, TagBidderConfig::new("acme", "https://ads.acme.test/vast"));
    }

    #[test]
    fn test_full_config() {
        let config = TagBidderConfig::from_toml(
            r#"
            name = "acme_video"
            endpoint = "http://ads.acme.test/vast?c=%%channel%%&p=%%placement%%"
            remove_empty_params = true
            default_currency = "EUR"
            cached_macros = ["timeout", "cur"]

            [[custom_macros]]
            key = "channel"
            cacheable = true

            [bidder_keys]
            placement = "p-1"
            "#,
        )
        .unwrap();

        assert!(config.flags().remove_empty_params);
        assert_eq!(config.bidder_keys["placement"], "p-1");

        let mapper = config.mapper();
        assert!(mapper.get(keys::TIMEOUT).unwrap().cacheable);
        assert!(mapper.get(keys::CURRENCY).unwrap().cacheable);
        assert!(mapper.get("channel").unwrap().cacheable);
        assert_eq!(mapper.len(), keys::ALL.len() + 1);
    }

    #[test]
    fn test_mapper_does_not_touch_standard_table() {
        let mut config = TagBidderConfig::new("acme", "https://ads.acme.test/vast");
        config.cached_macros.push(keys::TIMEOUT.to_owned());
        let _ = config.mapper();

        assert!(!MacroMapper::standard().get(keys::TIMEOUT).unwrap().cacheable);
    }

    #[test]
    fn test_invalid_toml() {
        let result = TagBidderConfig::from_toml("name = ");
        let Err(TagBidderError::InvalidConfig(message)) = result else {
            unreachable!("malformed TOML must be rejected");
        };
        assert!(message.contains("invalid TOML"));
    }

    #[test]
    fn test_missing_endpoint() {
        assert!(TagBidderConfig::from_toml(r#"name = "acme""#).is_err());
    }

    #[test]
    fn test_rejects_bad_names() {
        for name in ["", "acme bidder", "acme/../x"] {
            let config = TagBidderConfig::new(name, "https://ads.acme.test/vast");
            assert!(config.validate().is_err(), "name {name:?}");
        }
    }

    #[test]
    fn test_rejects_bad_endpoints() {
        for endpoint in ["/relative/vast", "ftp://ads.acme.test/vast", "not a url"] {
            let config = TagBidderConfig::new("acme", endpoint);
            assert!(config.validate().is_err(), "endpoint {endpoint:?}");
        }
    }

    #[test]
    fn test_rejects_bad_currency() {
        let mut config = TagBidderConfig::new("acme", "https://ads.acme.test/vast");
        config.default_currency = "usd".to_owned();
        assert!(config.validate().is_err());
        config.default_currency = "DOLLAR".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_delimited_custom_key() {
        let mut config = TagBidderConfig::new("acme", "https://ads.acme.test/vast");
        config.custom_macros.push(CustomMacro { key: "%%channel%%".to_owned(), cacheable: false });
        let Err(TagBidderError::InvalidConfig(message)) = config.validate() else {
            unreachable!("delimited custom key must be rejected");
        };
        assert!(message.contains("bare text"));
    }

    #[test]
    fn test_unknown_cached_macro_is_accepted() {
        let mut config = TagBidderConfig::new("acme", "https://ads.acme.test/vast");
        config.cached_macros.push("not_a_macro".to_owned());
        assert!(config.validate().is_ok());
        assert!(!config.mapper().contains("not_a_macro"));
    }

    #[test]
    fn test_from_file_missing() {
        let result = TagBidderConfig::from_file("/nonexistent/acme.toml");
        assert!(matches!(result, Err(TagBidderError::InvalidInput(_))));
    }
}
