//! Macro tables.
//!
//! A [`MacroMapper`] maps bare macro keys to resolvers on the
//! [`BidderMacro`] surface. The standard table is built once per process and
//! only ever handed out as a clone, so partner customisation at registration
//! time never leaks into other partners.

use std::{collections::HashMap, sync::LazyLock};

use crate::bidder::{BidderMacro, keys};

/// Resolver bound to one operation of the capability surface.
pub type MacroResolver = fn(&dyn BidderMacro, &str) -> String;

/// One macro table entry.
#[derive(Debug, Clone, Copy)]
pub struct MacroEntry {
    /// Whether a resolved value is reused for repeated tokens within one render.
    pub cacheable: bool,
    /// Operation producing the value.
    pub resolve: MacroResolver,
}

impl MacroEntry {
    /// Creates an entry.
    #[must_use]
    pub const fn new(cacheable: bool, resolve: MacroResolver) -> Self {
        Self { cacheable, resolve }
    }
}

/// Builds the standard table from `key => operation` pairs.
macro_rules! standard_table {
    ($($key:path => $op:ident,)*) => {{
        let mut entries = HashMap::with_capacity(keys::ALL.len());
        $(
            entries.insert($key.to_owned(), MacroEntry::new(false, |m, key| m.$op(key)));
        )*
        entries
    }};
}

static STANDARD: LazyLock<MacroMapper> = LazyLock::new(|| {
    let entries = standard_table! {
        keys::TEST => test,
        keys::TIMEOUT => timeout,
        keys::WHITELIST_SEAT => whitelist_seat,
        keys::WHITELIST_LANG => whitelist_lang,
        keys::BLOCKED_SEAT => blocked_seat,
        keys::CURRENCY => currency,
        keys::BLOCKED_CATEGORY => blocked_category,
        keys::BLOCKED_ADVERTISER => blocked_advertiser,
        keys::BLOCKED_APP => blocked_app,
        keys::FD => fd,
        keys::TRANSACTION_ID => transaction_id,
        keys::PAYMENT_ID_CHAIN => payment_id_chain,
        keys::COPPA => coppa,
        keys::DISPLAY_MANAGER => display_manager,
        keys::DISPLAY_MANAGER_VERSION => display_manager_version,
        keys::INTERSTITIAL => interstitial,
        keys::TAG_ID => tag_id,
        keys::BID_FLOOR => bid_floor,
        keys::BID_FLOOR_CURRENCY => bid_floor_currency,
        keys::SECURE => secure,
        keys::PMP => pmp,
        keys::VIDEO_MIMES => video_mimes,
        keys::VIDEO_MIN_DURATION => video_min_duration,
        keys::VIDEO_MAX_DURATION => video_max_duration,
        keys::VIDEO_PROTOCOLS => video_protocols,
        keys::VIDEO_PLAYER_WIDTH => video_player_width,
        keys::VIDEO_PLAYER_HEIGHT => video_player_height,
        keys::VIDEO_START_DELAY => video_start_delay,
        keys::VIDEO_PLACEMENT => video_placement,
        keys::VIDEO_LINEARITY => video_linearity,
        keys::VIDEO_SKIP => video_skip,
        keys::VIDEO_SKIP_MIN => video_skip_min,
        keys::VIDEO_SKIP_AFTER => video_skip_after,
        keys::VIDEO_SEQUENCE => video_sequence,
        keys::VIDEO_BLOCKED_ATTRIBUTE => video_blocked_attribute,
        keys::VIDEO_MAX_EXTENDED => video_max_extended,
        keys::VIDEO_MIN_BITRATE => video_min_bitrate,
        keys::VIDEO_MAX_BITRATE => video_max_bitrate,
        keys::VIDEO_BOXING_ALLOWED => video_boxing_allowed,
        keys::VIDEO_PLAYBACK_METHOD => video_playback_method,
        keys::VIDEO_DELIVERY => video_delivery,
        keys::VIDEO_POSITION => video_position,
        keys::VIDEO_API => video_api,
        keys::SITE_ID => site_id,
        keys::SITE_NAME => site_name,
        keys::SITE_PAGE => site_page,
        keys::SITE_REFERRER => site_referrer,
        keys::SITE_SEARCH => site_search,
        keys::SITE_MOBILE => site_mobile,
        keys::APP_ID => app_id,
        keys::APP_NAME => app_name,
        keys::APP_BUNDLE => app_bundle,
        keys::APP_STORE_URL => app_store_url,
        keys::APP_VERSION => app_version,
        keys::APP_PAID => app_paid,
        keys::CATEGORY => category,
        keys::DOMAIN => domain,
        keys::SECTION_CATEGORY => section_category,
        keys::PAGE_CATEGORY => page_category,
        keys::PRIVACY_POLICY => privacy_policy,
        keys::KEYWORDS => keywords,
        keys::PUB_ID => pub_id,
        keys::PUB_NAME => pub_name,
        keys::PUB_DOMAIN => pub_domain,
        keys::CONTENT_ID => content_id,
        keys::CONTENT_EPISODE => content_episode,
        keys::CONTENT_TITLE => content_title,
        keys::CONTENT_SERIES => content_series,
        keys::CONTENT_SEASON => content_season,
        keys::CONTENT_ARTIST => content_artist,
        keys::CONTENT_GENRE => content_genre,
        keys::CONTENT_ALBUM => content_album,
        keys::CONTENT_ISRC => content_isrc,
        keys::CONTENT_URL => content_url,
        keys::CONTENT_CATEGORY => content_category,
        keys::CONTENT_PRODUCTION_QUALITY => content_production_quality,
        keys::CONTENT_VIDEO_QUALITY => content_video_quality,
        keys::CONTENT_CONTEXT => content_context,
        keys::CONTENT_RATING => content_rating,
        keys::CONTENT_USER_RATING => content_user_rating,
        keys::CONTENT_QAG_MEDIA_RATING => content_qag_media_rating,
        keys::CONTENT_KEYWORDS => content_keywords,
        keys::CONTENT_LIVE_STREAM => content_live_stream,
        keys::CONTENT_SOURCE_RELATIONSHIP => content_source_relationship,
        keys::CONTENT_LENGTH => content_length,
        keys::CONTENT_LANGUAGE => content_language,
        keys::CONTENT_EMBEDDABLE => content_embeddable,
        keys::PRODUCER_ID => producer_id,
        keys::PRODUCER_NAME => producer_name,
        keys::USER_AGENT => user_agent,
        keys::DNT => dnt,
        keys::LMT => lmt,
        keys::IP => ip,
        keys::DEVICE_TYPE => device_type,
        keys::MAKE => make,
        keys::MODEL => model,
        keys::DEVICE_OS => device_os,
        keys::DEVICE_OS_VERSION => device_os_version,
        keys::DEVICE_WIDTH => device_width,
        keys::DEVICE_HEIGHT => device_height,
        keys::DEVICE_JS => device_js,
        keys::DEVICE_LANGUAGE => device_language,
        keys::DEVICE_IFA => device_ifa,
        keys::DEVICE_IFA_TYPE => device_ifa_type,
        keys::DEVICE_DIDSHA1 => device_didsha1,
        keys::DEVICE_DIDMD5 => device_didmd5,
        keys::DEVICE_DPIDSHA1 => device_dpidsha1,
        keys::DEVICE_DPIDMD5 => device_dpidmd5,
        keys::DEVICE_MACSHA1 => device_macsha1,
        keys::DEVICE_MACMD5 => device_macmd5,
        keys::LATITUDE => latitude,
        keys::LONGITUDE => longitude,
        keys::COUNTRY => country,
        keys::REGION => region,
        keys::CITY => city,
        keys::ZIP => zip,
        keys::UTC_OFFSET => utc_offset,
        keys::USER_ID => user_id,
        keys::YOB => yob,
        keys::GENDER => gender,
        keys::CONSENT => consent,
        keys::GDPR => gdpr,
        keys::US_PRIVACY => us_privacy,
        keys::CACHE_BUSTER => cache_buster,
    };
    let mut mapper = MacroMapper { entries };
    mapper.set_cacheable(keys::CACHE_BUSTER, true);
    mapper
});

/// Table of macro keys and their resolvers.
///
/// Keys are bare macro text without the `%%` delimiters, for standard and
/// custom macros alike.
///
/// # Examples
///
/// ```
/// use tag_bidder::bidder::{MacroMapper, keys};
///
/// let mut mapper = MacroMapper::standard();
/// mapper.set_cacheable(keys::TIMEOUT, true);
/// mapper.add_custom("channel_id", false);
///
/// assert!(mapper.get(keys::TIMEOUT).unwrap().cacheable);
/// assert!(!MacroMapper::standard().get(keys::TIMEOUT).unwrap().cacheable);
/// assert!(!MacroMapper::standard().contains("channel_id"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MacroMapper {
    entries: HashMap<String, MacroEntry>,
}

impl MacroMapper {
    /// Returns a fresh clone of the standard table.
    ///
    /// Every standard key is bound to its own operation. Only
    /// [`keys::CACHE_BUSTER`] is cacheable, so one render uses one cache buster.
    #[must_use]
    pub fn standard() -> Self {
        STANDARD.clone()
    }

    /// Sets the cacheable flag of `key`. Unknown keys are ignored.
    pub fn set_cacheable(&mut self, key: &str, cacheable: bool) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.cacheable = cacheable;
        }
    }

    /// Registers `key` as a custom macro resolved by [`BidderMacro::custom`].
    ///
    /// An existing entry for the same key is replaced.
    pub fn add_custom(&mut self, key: impl Into<String>, cacheable: bool) {
        self.entries.insert(key.into(), MacroEntry::new(cacheable, |m, key| m.custom(key)));
    }

    /// Inserts or replaces an entry with an arbitrary resolver.
    pub fn insert(&mut self, key: impl Into<String>, entry: MacroEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Looks up the entry for a bare key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MacroEntry> {
        self.entries.get(key)
    }

    /// Returns `true` if `key` is registered.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` for an empty table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the registered keys in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
