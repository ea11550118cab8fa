//! Read-only OpenRTB 2.5 bid request model.
//!
//! Only the fields consumed by macro resolution are modelled. Unknown fields
//! are ignored during deserialization, and every field has a default so that
//! sparse requests from real exchanges deserialize cleanly.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, TagBidderError};

/// Top-level OpenRTB bid request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BidRequest {
    /// Auction id.
    pub id: String,
    /// Impressions offered, in auction order.
    pub imp: Vec<Imp>,
    /// Website context (mutually exclusive with `app`).
    pub site: Option<Site>,
    /// Application context (mutually exclusive with `site`).
    pub app: Option<App>,
    /// Device the impression is shown on.
    pub device: Option<Device>,
    /// Human user of the device.
    pub user: Option<User>,
    /// Test mode flag, `1` for test auctions.
    pub test: i8,
    /// Maximum time in milliseconds to submit a bid.
    pub tmax: i64,
    /// Seat allow list.
    pub wseat: Vec<String>,
    /// Language allow list.
    pub wlang: Vec<String>,
    /// Seat block list.
    pub bseat: Vec<String>,
    /// Allowed currencies.
    pub cur: Vec<String>,
    /// Blocked IAB categories.
    pub bcat: Vec<String>,
    /// Blocked advertiser domains.
    pub badv: Vec<String>,
    /// Blocked application bundles.
    pub bapp: Vec<String>,
    /// Inventory source.
    pub source: Option<Source>,
    /// Regulatory signals.
    pub regs: Option<Regs>,
}

impl BidRequest {
    /// Parses a bid request from OpenRTB JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TagBidderError::InvalidInput`] if the JSON is not a valid bid request.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| TagBidderError::InvalidInput(format!("invalid bid request JSON: {e}")))
    }

    /// Returns `true` when the request originates from an application.
    #[must_use]
    pub const fn is_app(&self) -> bool {
        self.app.is_some()
    }
}

/// Inventory source and supply-chain information.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Source {
    /// Final decision entity, `0` exchange, `1` upstream.
    pub fd: Option<i8>,
    /// Transaction id shared by all participants.
    pub tid: String,
    /// Payment id chain.
    pub pchain: String,
}

/// Regulatory signals.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Regs {
    /// COPPA flag.
    pub coppa: i8,
    /// GDPR and CCPA signals.
    pub ext: Option<RegsExt>,
}

/// Regulatory extension carrying privacy signals.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegsExt {
    /// GDPR applicability flag.
    pub gdpr: Option<i8>,
    /// IAB US privacy string.
    pub us_privacy: String,
}

/// A single impression offered in the auction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Imp {
    /// Impression id, unique within the request.
    pub id: String,
    /// Banner placement, if offered.
    pub banner: Option<Banner>,
    /// Video placement, if offered.
    pub video: Option<Video>,
    /// Native placement, if offered.
    pub native: Option<Native>,
    /// Ad rendering SDK name.
    pub displaymanager: String,
    /// Ad rendering SDK version.
    pub displaymanagerver: String,
    /// Interstitial flag.
    pub instl: i8,
    /// Placement identifier.
    pub tagid: String,
    /// Minimum bid in CPM.
    pub bidfloor: f64,
    /// Currency of `bidfloor`.
    pub bidfloorcur: String,
    /// Whether secure creatives are required.
    pub secure: Option<i8>,
    /// Private marketplace deals, kept as raw JSON.
    pub pmp: Option<Value>,
    /// Bidder-specific parameters.
    pub ext: Option<Value>,
}

/// Banner placement.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Banner {
    /// Width in pixels.
    pub w: Option<i64>,
    /// Height in pixels.
    pub h: Option<i64>,
}

/// Native placement.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Native {
    /// Native markup request payload.
    pub request: String,
}

/// Video placement.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Video {
    /// Supported content MIME types.
    pub mimes: Vec<String>,
    /// Minimum duration in seconds.
    pub minduration: i64,
    /// Maximum duration in seconds.
    pub maxduration: i64,
    /// Supported video protocols.
    pub protocols: Vec<i64>,
    /// Player width in pixels.
    pub w: i64,
    /// Player height in pixels.
    pub h: i64,
    /// Start delay in seconds, or a negative placement code.
    pub startdelay: Option<i64>,
    /// Placement type.
    pub placement: i64,
    /// Linear or non-linear.
    pub linearity: i64,
    /// Whether the player allows skipping.
    pub skip: Option<i8>,
    /// Minimum duration before skipping is allowed.
    pub skipmin: i64,
    /// Seconds before the skip button appears.
    pub skipafter: i64,
    /// Sequence number for multiple ads.
    pub sequence: i64,
    /// Blocked creative attributes.
    pub battr: Vec<i64>,
    /// Maximum extended duration.
    pub maxextended: i64,
    /// Minimum bit rate in Kbps.
    pub minbitrate: i64,
    /// Maximum bit rate in Kbps.
    pub maxbitrate: i64,
    /// Whether letterboxing is allowed.
    pub boxingallowed: Option<i8>,
    /// Allowed playback methods.
    pub playbackmethod: Vec<i64>,
    /// Supported delivery methods.
    pub delivery: Vec<i64>,
    /// Ad position on screen.
    pub pos: Option<i64>,
    /// Supported API frameworks.
    pub api: Vec<i64>,
}

/// Publisher of a site or app.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Publisher {
    /// Exchange-specific publisher id.
    pub id: String,
    /// Publisher name.
    pub name: String,
    /// Publisher domain.
    pub domain: String,
}

/// Content producer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Producer {
    /// Producer id.
    pub id: String,
    /// Producer name.
    pub name: String,
}

/// Content shown alongside the impression.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
#[allow(missing_docs, reason = "field names mirror the OpenRTB content object")]
pub struct Content {
    pub id: String,
    pub episode: i64,
    pub title: String,
    pub series: String,
    pub season: String,
    pub artist: String,
    pub genre: String,
    pub album: String,
    pub isrc: String,
    pub url: String,
    pub cat: Vec<String>,
    pub prodq: Option<i64>,
    pub videoquality: Option<i64>,
    pub context: i64,
    pub contentrating: String,
    pub userrating: String,
    pub qagmediarating: i64,
    pub keywords: String,
    pub livestream: Option<i8>,
    pub sourcerelationship: Option<i8>,
    pub len: i64,
    pub language: String,
    pub embeddable: Option<i8>,
    pub producer: Option<Producer>,
}

/// Website context.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Site {
    /// Exchange-specific site id.
    pub id: String,
    /// Site name.
    pub name: String,
    /// Site domain.
    pub domain: String,
    /// IAB categories of the site.
    pub cat: Vec<String>,
    /// IAB categories of the current section.
    pub sectioncat: Vec<String>,
    /// IAB categories of the current page.
    pub pagecat: Vec<String>,
    /// Page URL.
    pub page: String,
    /// Referrer URL.
    #[serde(rename = "ref")]
    pub referrer: String,
    /// Search string that led to the page.
    pub search: String,
    /// Mobile-optimised flag.
    pub mobile: Option<i8>,
    /// Privacy policy flag.
    pub privacypolicy: Option<i8>,
    /// Site publisher.
    pub publisher: Option<Publisher>,
    /// Page content.
    pub content: Option<Content>,
    /// Comma separated keywords.
    pub keywords: String,
}

/// Application context.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct App {
    /// Exchange-specific app id.
    pub id: String,
    /// App name.
    pub name: String,
    /// Bundle or package name.
    pub bundle: String,
    /// App domain.
    pub domain: String,
    /// Store URL.
    pub storeurl: String,
    /// IAB categories of the app.
    pub cat: Vec<String>,
    /// IAB categories of the current section.
    pub sectioncat: Vec<String>,
    /// IAB categories of the current page.
    pub pagecat: Vec<String>,
    /// App version.
    pub ver: String,
    /// Privacy policy flag.
    pub privacypolicy: Option<i8>,
    /// Paid version flag.
    pub paid: Option<i8>,
    /// App publisher.
    pub publisher: Option<Publisher>,
    /// In-app content.
    pub content: Option<Content>,
    /// Comma separated keywords.
    pub keywords: String,
}

/// Device information.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
#[allow(missing_docs, reason = "field names mirror the OpenRTB device object")]
pub struct Device {
    pub ua: String,
    pub geo: Option<Geo>,
    pub dnt: Option<i8>,
    pub lmt: Option<i8>,
    pub ip: String,
    pub ipv6: String,
    pub devicetype: i64,
    pub make: String,
    pub model: String,
    pub os: String,
    pub osv: String,
    pub h: i64,
    pub w: i64,
    pub js: Option<i8>,
    pub language: String,
    pub ifa: String,
    pub didsha1: String,
    pub didmd5: String,
    pub dpidsha1: String,
    pub dpidmd5: String,
    pub macsha1: String,
    pub macmd5: String,
    pub ext: Option<DeviceExt>,
}

/// Device extension.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceExt {
    /// Source of the advertising id (`aaid`, `idfa`, ...).
    pub ifa_type: String,
}

/// Geographic location.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
#[allow(missing_docs, reason = "field names mirror the OpenRTB geo object")]
pub struct Geo {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub country: String,
    pub region: String,
    pub city: String,
    pub zip: String,
    pub utcoffset: i64,
}

/// Human user of the device.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct User {
    /// Exchange-specific user id.
    pub id: String,
    /// Year of birth.
    pub yob: i64,
    /// `M`, `F` or `O`.
    pub gender: String,
    /// Consent extension.
    pub ext: Option<UserExt>,
}

/// User extension.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserExt {
    /// IAB TCF consent string.
    pub consent: String,
}
