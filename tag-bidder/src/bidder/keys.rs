//! Standard macro keys.
//!
//! Keys are the bare text written between the `%%` delimiters of an endpoint
//! template, e.g. `%%timeout%%` resolves [`TIMEOUT`].

#![allow(missing_docs, reason = "each constant is named after the macro it keys")]

// Request
pub const TEST: &str = "test";
pub const TIMEOUT: &str = "timeout";
pub const WHITELIST_SEAT: &str = "wseat";
pub const WHITELIST_LANG: &str = "wlang";
pub const BLOCKED_SEAT: &str = "bseat";
pub const CURRENCY: &str = "cur";
pub const BLOCKED_CATEGORY: &str = "bcat";
pub const BLOCKED_ADVERTISER: &str = "badv";
pub const BLOCKED_APP: &str = "bapp";

// Source
pub const FD: &str = "fd";
pub const TRANSACTION_ID: &str = "tid";
pub const PAYMENT_ID_CHAIN: &str = "pchain";

// Regs
pub const COPPA: &str = "coppa";

// Impression
pub const DISPLAY_MANAGER: &str = "displaymanager";
pub const DISPLAY_MANAGER_VERSION: &str = "displaymanagerver";
pub const INTERSTITIAL: &str = "instl";
pub const TAG_ID: &str = "tagid";
pub const BID_FLOOR: &str = "bidfloor";
pub const BID_FLOOR_CURRENCY: &str = "bidfloorcur";
pub const SECURE: &str = "secure";
pub const PMP: &str = "pmp";

// Video
pub const VIDEO_MIMES: &str = "mimes";
pub const VIDEO_MIN_DURATION: &str = "minduration";
pub const VIDEO_MAX_DURATION: &str = "maxduration";
pub const VIDEO_PROTOCOLS: &str = "protocols";
pub const VIDEO_PLAYER_WIDTH: &str = "playerwidth";
pub const VIDEO_PLAYER_HEIGHT: &str = "playerheight";
pub const VIDEO_START_DELAY: &str = "startdelay";
pub const VIDEO_PLACEMENT: &str = "placement";
pub const VIDEO_LINEARITY: &str = "linearity";
pub const VIDEO_SKIP: &str = "skip";
pub const VIDEO_SKIP_MIN: &str = "skipmin";
pub const VIDEO_SKIP_AFTER: &str = "skipafter";
pub const VIDEO_SEQUENCE: &str = "sequence";
pub const VIDEO_BLOCKED_ATTRIBUTE: &str = "battr";
pub const VIDEO_MAX_EXTENDED: &str = "maxextended";
pub const VIDEO_MIN_BITRATE: &str = "minbitrate";
pub const VIDEO_MAX_BITRATE: &str = "maxbitrate";
pub const VIDEO_BOXING_ALLOWED: &str = "boxingallowed";
pub const VIDEO_PLAYBACK_METHOD: &str = "playbackmethod";
pub const VIDEO_DELIVERY: &str = "delivery";
pub const VIDEO_POSITION: &str = "position";
pub const VIDEO_API: &str = "api";

// Site
pub const SITE_ID: &str = "siteid";
pub const SITE_NAME: &str = "sitename";
pub const SITE_PAGE: &str = "page";
pub const SITE_REFERRER: &str = "ref";
pub const SITE_SEARCH: &str = "search";
pub const SITE_MOBILE: &str = "mobile";

// App
pub const APP_ID: &str = "appid";
pub const APP_NAME: &str = "appname";
pub const APP_BUNDLE: &str = "bundle";
pub const APP_STORE_URL: &str = "storeurl";
pub const APP_VERSION: &str = "appver";
pub const APP_PAID: &str = "paid";

// Site and app
pub const CATEGORY: &str = "cat";
pub const DOMAIN: &str = "domain";
pub const SECTION_CATEGORY: &str = "sectioncat";
pub const PAGE_CATEGORY: &str = "pagecat";
pub const PRIVACY_POLICY: &str = "privacypolicy";
pub const KEYWORDS: &str = "keywords";

// Publisher
pub const PUB_ID: &str = "pubid";
pub const PUB_NAME: &str = "pubname";
pub const PUB_DOMAIN: &str = "pubdomain";

// Content
pub const CONTENT_ID: &str = "contentid";
pub const CONTENT_EPISODE: &str = "episode";
pub const CONTENT_TITLE: &str = "title";
pub const CONTENT_SERIES: &str = "series";
pub const CONTENT_SEASON: &str = "season";
pub const CONTENT_ARTIST: &str = "artist";
pub const CONTENT_GENRE: &str = "genre";
pub const CONTENT_ALBUM: &str = "album";
pub const CONTENT_ISRC: &str = "isrc";
pub const CONTENT_URL: &str = "contenturl";
pub const CONTENT_CATEGORY: &str = "contentcat";
pub const CONTENT_PRODUCTION_QUALITY: &str = "contentprodq";
pub const CONTENT_VIDEO_QUALITY: &str = "contentvideoquality";
pub const CONTENT_CONTEXT: &str = "context";
pub const CONTENT_RATING: &str = "contentrating";
pub const CONTENT_USER_RATING: &str = "userrating";
pub const CONTENT_QAG_MEDIA_RATING: &str = "qagmediarating";
pub const CONTENT_KEYWORDS: &str = "contentkeywords";
pub const CONTENT_LIVE_STREAM: &str = "livestream";
pub const CONTENT_SOURCE_RELATIONSHIP: &str = "sourcerelationship";
pub const CONTENT_LENGTH: &str = "contentlen";
pub const CONTENT_LANGUAGE: &str = "contentlanguage";
pub const CONTENT_EMBEDDABLE: &str = "contentembeddable";

// Producer
pub const PRODUCER_ID: &str = "prodid";
pub const PRODUCER_NAME: &str = "prodname";

// Device
pub const USER_AGENT: &str = "useragent";
pub const DNT: &str = "dnt";
pub const LMT: &str = "lmt";
pub const IP: &str = "ip";
pub const DEVICE_TYPE: &str = "devicetype";
pub const MAKE: &str = "make";
pub const MODEL: &str = "model";
pub const DEVICE_OS: &str = "os";
pub const DEVICE_OS_VERSION: &str = "osv";
pub const DEVICE_WIDTH: &str = "devicewidth";
pub const DEVICE_HEIGHT: &str = "deviceheight";
pub const DEVICE_JS: &str = "js";
pub const DEVICE_LANGUAGE: &str = "lang";
pub const DEVICE_IFA: &str = "ifa";
pub const DEVICE_IFA_TYPE: &str = "ifa_type";
pub const DEVICE_DIDSHA1: &str = "didsha1";
pub const DEVICE_DIDMD5: &str = "didmd5";
pub const DEVICE_DPIDSHA1: &str = "dpidsha1";
pub const DEVICE_DPIDMD5: &str = "dpidmd5";
pub const DEVICE_MACSHA1: &str = "macsha1";
pub const DEVICE_MACMD5: &str = "macmd5";

// Geo
pub const LATITUDE: &str = "lat";
pub const LONGITUDE: &str = "lon";
pub const COUNTRY: &str = "country";
pub const REGION: &str = "region";
pub const CITY: &str = "city";
pub const ZIP: &str = "zip";
pub const UTC_OFFSET: &str = "utcoffset";

// User
pub const USER_ID: &str = "uid";
pub const YOB: &str = "yob";
pub const GENDER: &str = "gender";

// Privacy extensions
pub const CONSENT: &str = "consent";
pub const GDPR: &str = "gdpr";
pub const US_PRIVACY: &str = "usprivacy";

// Additional
pub const CACHE_BUSTER: &str = "cachebuster";

/// Every standard key, in category order.
pub const ALL: &[&str] = &[
    TEST,
    TIMEOUT,
    WHITELIST_SEAT,
    WHITELIST_LANG,
    BLOCKED_SEAT,
    CURRENCY,
    BLOCKED_CATEGORY,
    BLOCKED_ADVERTISER,
    BLOCKED_APP,
    FD,
    TRANSACTION_ID,
    PAYMENT_ID_CHAIN,
    COPPA,
    DISPLAY_MANAGER,
    DISPLAY_MANAGER_VERSION,
    INTERSTITIAL,
    TAG_ID,
    BID_FLOOR,
    BID_FLOOR_CURRENCY,
    SECURE,
    PMP,
    VIDEO_MIMES,
    VIDEO_MIN_DURATION,
    VIDEO_MAX_DURATION,
    VIDEO_PROTOCOLS,
    VIDEO_PLAYER_WIDTH,
    VIDEO_PLAYER_HEIGHT,
    VIDEO_START_DELAY,
    VIDEO_PLACEMENT,
    VIDEO_LINEARITY,
    VIDEO_SKIP,
    VIDEO_SKIP_MIN,
    VIDEO_SKIP_AFTER,
    VIDEO_SEQUENCE,
    VIDEO_BLOCKED_ATTRIBUTE,
    VIDEO_MAX_EXTENDED,
    VIDEO_MIN_BITRATE,
    VIDEO_MAX_BITRATE,
    VIDEO_BOXING_ALLOWED,
    VIDEO_PLAYBACK_METHOD,
    VIDEO_DELIVERY,
    VIDEO_POSITION,
    VIDEO_API,
    SITE_ID,
    SITE_NAME,
    SITE_PAGE,
    SITE_REFERRER,
    SITE_SEARCH,
    SITE_MOBILE,
    APP_ID,
    APP_NAME,
    APP_BUNDLE,
    APP_STORE_URL,
    APP_VERSION,
    APP_PAID,
    CATEGORY,
    DOMAIN,
    SECTION_CATEGORY,
    PAGE_CATEGORY,
    PRIVACY_POLICY,
    KEYWORDS,
    PUB_ID,
    PUB_NAME,
    PUB_DOMAIN,
    CONTENT_ID,
    CONTENT_EPISODE,
    CONTENT_TITLE,
    CONTENT_SERIES,
    CONTENT_SEASON,
    CONTENT_ARTIST,
    CONTENT_GENRE,
    CONTENT_ALBUM,
    CONTENT_ISRC,
    CONTENT_URL,
    CONTENT_CATEGORY,
    CONTENT_PRODUCTION_QUALITY,
    CONTENT_VIDEO_QUALITY,
    CONTENT_CONTEXT,
    CONTENT_RATING,
    CONTENT_USER_RATING,
    CONTENT_QAG_MEDIA_RATING,
    CONTENT_KEYWORDS,
    CONTENT_LIVE_STREAM,
    CONTENT_SOURCE_RELATIONSHIP,
    CONTENT_LENGTH,
    CONTENT_LANGUAGE,
    CONTENT_EMBEDDABLE,
    PRODUCER_ID,
    PRODUCER_NAME,
    USER_AGENT,
    DNT,
    LMT,
    IP,
    DEVICE_TYPE,
    MAKE,
    MODEL,
    DEVICE_OS,
    DEVICE_OS_VERSION,
    DEVICE_WIDTH,
    DEVICE_HEIGHT,
    DEVICE_JS,
    DEVICE_LANGUAGE,
    DEVICE_IFA,
    DEVICE_IFA_TYPE,
    DEVICE_DIDSHA1,
    DEVICE_DIDMD5,
    DEVICE_DPIDSHA1,
    DEVICE_DPIDMD5,
    DEVICE_MACSHA1,
    DEVICE_MACMD5,
    LATITUDE,
    LONGITUDE,
    COUNTRY,
    REGION,
    CITY,
    ZIP,
    UTC_OFFSET,
    USER_ID,
    YOB,
    GENDER,
    CONSENT,
    GDPR,
    US_PRIVACY,
    CACHE_BUSTER,
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_keys_are_unique() {
        let unique: HashSet<_> = ALL.iter().collect();
        assert_eq!(unique.len(), ALL.len());
    }

    #[test]
    fn test_keys_have_no_delimiters() {
        assert!(ALL.iter().all(|key| !key.contains('%') && !key.is_empty()));
    }
}
