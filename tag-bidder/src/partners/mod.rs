//! Built-in tag bidder partners.
//!
//! A partner contributes an endpoint template, a configuration and, when the
//! standard OpenRTB values are not enough, a capability surface that wraps
//! [`OpenRtbMacros`](crate::bidder::OpenRtbMacros) and overrides the
//! operations it needs.

pub mod spotx;
