//! Macro definition and resolution.
//!
//! Endpoint templates of tag bidders contain `%%key%%` tokens. Rendering a
//! template looks every key up in a [`MacroMapper`], calls the bound operation
//! of a [`BidderMacro`] capability surface and substitutes the result.
//!
//! # Components
//!
//! - [`keys`]: standard macro keys
//! - [`BidderMacro`]: capability surface, every operation defaulting to empty
//! - [`OpenRtbMacros`]: capability surface backed by an OpenRTB request
//! - [`MacroMapper`]: key to resolver table, cloned per partner
//! - [`MacroProcessor`]: template scanner with per-render cache and escaping
//!
//! # Examples
//!
//! ```
//! use tag_bidder::{
//!     bidder::{BidderMacro, MacroMapper, OpenRtbMacros, render},
//!     openrtb::BidRequest,
//! };
//!
//! let request = BidRequest::from_json(
//!     r#"{"imp":[{"id":"1","tagid":"slot"}],"app":{"bundle":"com.example"}}"#,
//! )?;
//! let mut macros = OpenRtbMacros::new(&request);
//! macros.load_impression(0)?;
//!
//! let url = render(
//!     "https://ads.test/vast?b=%%bundle%%&t=%%tagid%%&s=%%siteid%%",
//!     &MacroMapper::standard(),
//!     &macros,
//! );
//! assert_eq!(url, "https://ads.test/vast?b=com.example&t=slot&s=%%siteid%%");
//! # Ok::<(), tag_bidder::TagBidderError>(())
//! ```

pub mod keys;
mod mapper;
mod openrtb;
mod processor;
mod traits;

pub use mapper::{MacroEntry, MacroMapper, MacroResolver};
pub use openrtb::OpenRtbMacros;
pub use processor::{ESCAPE_SUFFIX, Flags, MACRO_DELIMITER, MacroProcessor, escape, macro_token, render};
pub use traits::{BidderMacro, EmptyMacros};
