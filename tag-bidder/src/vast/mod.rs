//! Tag response decoding.
//!
//! Tag bidders answer with a VAST document rather than an OpenRTB bid
//! response. [`VastDecoder`] turns one such document into exactly one
//! [`NormalizedBid`]:
//!
//! 1. the body must be well-formed XML with a `VAST` root
//! 2. the ad element is the first `Ad/Wrapper`, else the first `Ad/InLine`
//! 3. the version is the root's `version` attribute, `2.0` when absent
//! 4. a partner [`VastExtensionParser`] may set price, currency, id,
//!    impression id and markup
//! 5. otherwise the price comes from `Pricing` (VAST 3.0 and later) or
//!    `Extensions/Extension/Price` (VAST 2.0)
//! 6. missing ids and markup fall back to a generated id, the impression id of
//!    the originating request position, and the whole body

mod decoder;
mod duration;
pub mod xml;

pub use decoder::{
    BidDraft, BidExt, DEFAULT_CURRENCY, DEFAULT_VAST_VERSION, NoExtension, NormalizedBid,
    VastDecoder, VastExtensionParser,
};
pub use duration::parse_duration;
pub use xml::Element;
