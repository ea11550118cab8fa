//! Partner registry.

use std::{collections::HashMap, path::Path};

use tracing::info;

use crate::{
    adapter::TagBidder,
    config::TagBidderConfig,
    error::{Result, TagBidderError},
    partners::spotx,
};

/// Tag bidders by partner name.
///
/// # Examples
///
/// ```
/// use tag_bidder::registry::BidderRegistry;
///
/// let registry = BidderRegistry::with_builtin()?;
/// assert!(registry.get("spotx").is_some());
/// assert!(registry.get("unknown").is_none());
/// # Ok::<(), tag_bidder::TagBidderError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct BidderRegistry {
    bidders: HashMap<String, TagBidder>,
}

impl BidderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in partner.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in partner fails to build.
    pub fn with_builtin() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(spotx::bidder()?)?;
        Ok(registry)
    }

    /// Adds `bidder` under its configured name.
    ///
    /// # Errors
    ///
    /// Returns [`TagBidderError::InvalidConfig`] if the name is already taken.
    pub fn register(&mut self, bidder: TagBidder) -> Result<()> {
        let name = bidder.name().to_owned();
        if self.bidders.contains_key(&name) {
            return Err(TagBidderError::InvalidConfig(format!("bidder already registered: {name}")));
        }
        info!(bidder = %name, endpoint = %bidder.config().endpoint, "tag bidder registered");
        self.bidders.insert(name, bidder);
        Ok(())
    }

    /// Builds a plain OpenRTB tag bidder from a TOML file and registers it.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`TagBidderConfig::from_file`] and
    /// [`register`](Self::register).
    pub fn register_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let config = TagBidderConfig::from_file(path)?;
        self.register(TagBidder::new(config)?)
    }

    /// Looks up a partner.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TagBidder> {
        self.bidders.get(name)
    }

    /// Registered partner names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bidders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered partners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bidders.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bidders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> TagBidder {
        TagBidder::new(TagBidderConfig::new("acme", "https://ads.acme.test/vast")).unwrap()
    }

    #[test]
    fn test_empty_registry() {
        let registry = BidderRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.names().is_empty());
    }

    #[test]
    fn test_builtin_partners() {
        let registry = BidderRegistry::with_builtin().unwrap();
        assert_eq!(registry.names(), vec![spotx::NAME]);
        assert_eq!(registry.get(spotx::NAME).unwrap().config().endpoint, spotx::ENDPOINT);
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = BidderRegistry::with_builtin().unwrap();
        registry.register(acme()).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["acme", "spotx"]);
        assert_eq!(registry.get("acme").unwrap().name(), "acme");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = BidderRegistry::new();
        registry.register(acme()).unwrap();
        assert!(matches!(registry.register(acme()), Err(TagBidderError::InvalidConfig(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_missing_file() {
        let mut registry = BidderRegistry::new();
        assert!(registry.register_file("/nonexistent/partner.toml").is_err());
        assert!(registry.is_empty());
    }
}
