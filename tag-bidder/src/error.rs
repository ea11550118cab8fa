//! Error types for tag bidder adapters.
//!
//! Rendering never fails: unresolved macros pass through as literal text. Every
//! other operation in this crate returns [`Result`], with [`TagBidderError`]
//! describing what went wrong.
//!
//! # Error Categories
//!
//! - **Decode errors** ([`TagBidderError::MalformedResponse`],
//!   [`TagBidderError::MissingAdElement`], [`TagBidderError::MissingPrice`],
//!   [`TagBidderError::Extension`]): the partner response cannot become a bid
//! - **Adapter errors** ([`TagBidderError::UnexpectedStatus`],
//!   [`TagBidderError::InvalidImpressionIndex`],
//!   [`TagBidderError::InvalidImpressionExt`]): request/response correlation failures
//! - **Configuration errors** ([`TagBidderError::InvalidConfig`],
//!   [`TagBidderError::InvalidInput`]): partner setup or caller input is wrong
//!
//! # Examples
//!
//! ```
//! use tag_bidder::error::{Result, TagBidderError};
//!
//! fn require_status(status: u16) -> Result<()> {
//!     if status != 200 {
//!         return Err(TagBidderError::UnexpectedStatus(status));
//!     }
//!     Ok(())
//! }
//!
//! assert!(require_status(204).unwrap_err().is_no_bid());
//! ```

use thiserror::Error;

/// Result type alias for tag bidder operations.
///
/// All fallible functions in this crate return this type.
pub type Result<T> = std::result::Result<T, TagBidderError>;

/// Errors that can occur while adapting a tag bidder.
///
/// # Error Recovery
///
/// - **No-bid errors** (see [`is_no_bid`](Self::is_no_bid)): drop the response,
///   the partner simply did not bid for this impression
/// - **Configuration errors** ([`InvalidConfig`](Self::InvalidConfig)): fix the
///   partner configuration before registering it
/// - **Input errors** ([`InvalidInput`](Self::InvalidInput),
///   [`InvalidImpressionExt`](Self::InvalidImpressionExt)): reject the auction
///   request for this partner
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum TagBidderError {
    /// The response body is not well-formed XML or has no `VAST` root element.
    ///
    /// # Recovery
    ///
    /// Treat as no bid. Repeated occurrences usually mean the partner endpoint
    /// returns an HTML error page or JSON instead of a VAST tag.
    #[error("malformed VAST response: {0}")]
    MalformedResponse(String),

    /// The VAST document contains neither an `Ad/Wrapper` nor an `Ad/InLine` element.
    ///
    /// Empty VAST documents are the usual way tag bidders signal no fill.
    #[error("VAST response has no Wrapper or InLine ad")]
    MissingAdElement,

    /// No positive price could be found for the ad.
    ///
    /// The extension parser did not set a price and the version-appropriate
    /// pricing node (`Pricing` for VAST 3.0+, `Extensions/Extension/Price` for
    /// VAST 2.0) is absent, unparsable or not positive.
    #[error("VAST response has no usable bid price")]
    MissingPrice,

    /// A partner extension parser rejected the ad element.
    #[error("VAST extension parsing failed: {0}")]
    Extension(String),

    /// The partner answered with a status other than `200 OK`.
    ///
    /// # Recovery
    ///
    /// `204 No Content` is a regular no-bid; anything else is worth logging.
    #[error("unexpected HTTP status from tag bidder: {0}")]
    UnexpectedStatus(u16),

    /// A response referenced an impression position that is not in the request.
    #[error("impression index {0} is out of range")]
    InvalidImpressionIndex(usize),

    /// The partner-specific impression extension could not be parsed.
    ///
    /// # Recovery
    ///
    /// The impression is skipped for this partner; the other impressions of
    /// the same request are still rendered.
    #[error("invalid impression extension: {0}")]
    InvalidImpressionExt(String),

    /// Partner configuration failed validation.
    ///
    /// # Recovery
    ///
    /// Fix the partner TOML configuration. Registration must not proceed
    /// with an invalid configuration.
    #[error("invalid tag bidder configuration: {0}")]
    InvalidConfig(String),

    /// Caller input is invalid (unreadable file, bad JSON, empty request).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl TagBidderError {
    /// Returns `true` if the auction should treat this error as "no bid from
    /// this partner" rather than as a fault.
    #[must_use]
    pub const fn is_no_bid(&self) -> bool {
        matches!(
            self,
            Self::MalformedResponse(_)
                | Self::MissingAdElement
                | Self::MissingPrice
                | Self::Extension(_)
                | Self::UnexpectedStatus(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = TagBidderError::MalformedResponse("unexpected end of file".into());
        assert_eq!(error.to_string(), "malformed VAST response: unexpected end of file");
    }

    #[test]
    fn test_missing_price_display() {
        let error = TagBidderError::MissingPrice;
        assert!(error.to_string().contains("price"));
    }

    #[test]
    fn test_unexpected_status_display() {
        let error = TagBidderError::UnexpectedStatus(503);
        assert_eq!(error.to_string(), "unexpected HTTP status from tag bidder: 503");
    }

    #[test]
    fn test_decode_errors_are_no_bid() {
        assert!(TagBidderError::MissingAdElement.is_no_bid());
        assert!(TagBidderError::MissingPrice.is_no_bid());
        assert!(TagBidderError::MalformedResponse(String::new()).is_no_bid());
        assert!(TagBidderError::UnexpectedStatus(204).is_no_bid());
    }

    #[test]
    fn test_config_errors_are_not_no_bid() {
        assert!(!TagBidderError::InvalidConfig("name".into()).is_no_bid());
        assert!(!TagBidderError::InvalidImpressionIndex(3).is_no_bid());
        assert!(!TagBidderError::InvalidInput("empty".into()).is_no_bid());
    }
}
