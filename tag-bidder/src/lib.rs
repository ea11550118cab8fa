//! Tag Bidder: OpenRTB adaptation for tag-based video demand partners
//!
//! Some demand partners do not speak OpenRTB. They expose a templated HTTP GET
//! endpoint and answer with a VAST document. This crate bridges an OpenRTB
//! auction to such partners in both directions.
//!
//! # How It Works
//!
//! ```text
//! ┌──────────────────┐
//! │  OpenRTB request │  site/app, device, user, impressions
//! └────────┬─────────┘
//!          │ one capability surface per request
//! ┌────────▼─────────────────────────────────────────┐
//! │                tag-bidder (this crate)           │
//! │  ┌───────────────┐        ┌───────────────────┐  │
//! │  │ MacroMapper + │        │   VastDecoder     │  │
//! │  │ MacroProcessor│        │ (price, currency, │  │
//! │  │ (%%key%% URL) │        │  ids, metadata)   │  │
//! │  └───────┬───────┘        └─────────▲─────────┘  │
//! └──────────┼──────────────────────────┼────────────┘
//!            │ GET per impression       │ VAST XML
//! ┌──────────▼──────────────────────────┴────────────┐
//! │                 Tag bidder partner               │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## 1. Render Partner Requests
//!
//! ```rust
//! use tag_bidder::{TagBidder, TagBidderConfig, openrtb::BidRequest};
//!
//! # fn example() -> tag_bidder::Result<()> {
//! let config = TagBidderConfig::from_toml(r#"
//!     name = "acme"
//!     endpoint = "https://ads.acme.test/vast?w=%%playerwidth%%&h=%%playerheight%%&page=%%page_ESC%%&dnt=%%dnt%%"
//!     remove_empty_params = true
//! "#)?;
//! let bidder = TagBidder::new(config)?;
//!
//! let request = BidRequest::from_json(r#"{
//!     "id": "auction-1",
//!     "imp": [{"id": "1", "video": {"w": 640, "h": 360}}],
//!     "site": {"page": "https://news.test/story"}
//! }"#)?;
//!
//! let requests = bidder.make_requests(&request)?;
//! assert_eq!(
//!     requests[0].uri,
//!     "https://ads.acme.test/vast?w=640&h=360&page=https%3A%2F%2Fnews.test%2Fstory"
//! );
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## 2. Decode the VAST Answer
//!
//! ```rust
//! use tag_bidder::vast::VastDecoder;
//!
//! # fn example() -> tag_bidder::Result<()> {
//! let body = br#"<VAST version="2.0"><Ad id="1"><InLine>
//!     <Extensions><Extension><Price currency="usd">0.05</Price></Extension></Extensions>
//! </InLine></Ad></VAST>"#;
//!
//! let bid = VastDecoder::new().decode(body, "imp-1")?;
//! assert_eq!(bid.price.to_string(), "0.05");
//! assert_eq!(bid.currency, "USD");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## 3. Partner-Specific Values
//!
//! Partners override single operations of the [`BidderMacro`] surface and
//! inherit everything else from a parent surface. See
//! [`partners::spotx`] for a partner reading its channel from the impression
//! extension.
//!
//! # Module Organization
//!
//! - [`bidder`]: macro keys, capability surface, macro tables and rendering
//! - [`vast`]: VAST parsing and bid normalisation
//! - [`adapter`]: per-partner request building and response decoding
//! - [`config`]: TOML partner configuration
//! - [`registry`]: partners by name
//! - [`partners`]: built-in partners
//! - [`openrtb`]: the read-only OpenRTB request model
//! - [`ids`]: injectable id source
//! - [`error`]: error type
//!
//! # Error Handling
//!
//! Rendering never fails: unresolvable tokens stay in the output. Decoding
//! returns [`TagBidderError`]; [`TagBidderError::is_no_bid`] tells a partner
//! that did not bid apart from a configuration problem:
//!
//! ```rust
//! use tag_bidder::{TagBidderError, vast::VastDecoder};
//!
//! match VastDecoder::new().decode(b"<VAST version=\"3.0\"/>", "imp-1") {
//!     Ok(bid) => println!("bid {}", bid.price),
//!     Err(e) if e.is_no_bid() => println!("no bid: {e}"),
//!     Err(e) => eprintln!("adapter error: {e}"),
//! }
//! # assert!(matches!(
//! #     VastDecoder::new().decode(b"<VAST/>", "imp-1"),
//! #     Err(TagBidderError::MissingAdElement)
//! # ));
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod adapter;
pub mod bidder;
pub mod config;
pub mod error;
pub mod ids;
pub mod openrtb;
pub mod partners;
pub mod registry;
pub mod vast;

pub use adapter::{RequestData, ResponseData, TagBidder};
pub use bidder::{BidderMacro, MacroMapper, MacroProcessor};
pub use config::TagBidderConfig;
pub use error::{Result, TagBidderError};
pub use registry::BidderRegistry;
pub use vast::{NormalizedBid, VastDecoder};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let bidder = TagBidder::new(TagBidderConfig::new("acme", "https://ads.acme.test/vast?t=%%tagid%%"))
            .unwrap();
        let request = openrtb::BidRequest::from_json(r#"{"id":"r","imp":[{"id":"1","tagid":"pre"}]}"#).unwrap();

        let requests: Vec<RequestData> = bidder.make_requests(&request).unwrap();
        assert_eq!(requests[0].uri, "https://ads.acme.test/vast?t=pre");

        let body = br#"<VAST version="3.0"><Ad><InLine><Pricing>2</Pricing></InLine></Ad></VAST>"#;
        let bid: NormalizedBid = bidder.make_bids(&request, &requests[0], &ResponseData::ok(&body[..])).unwrap();
        assert_eq!(bid.imp_id, "1");

        let registry = BidderRegistry::with_builtin().unwrap();
        assert!(!registry.is_empty());

        let error: TagBidderError = VastDecoder::new().decode(b"<VAST/>", "1").unwrap_err();
        assert!(error.is_no_bid());
    }
}
