//! The macro capability surface.
//!
//! [`BidderMacro`] is the set of value-producing operations a macro resolver
//! may call. Every operation has a default body, so partner types implement
//! only the operations they change and delegate the rest to a [`parent`]
//! surface, usually [`OpenRtbMacros`](super::OpenRtbMacros).
//!
//! [`parent`]: BidderMacro::parent

use crate::error::Result;

/// Declares [`BidderMacro`] with one delegating default method per standard macro.
macro_rules! capability_surface {
    ($($(#[$doc:meta])* fn $name:ident;)*) => {
        /// Operations a macro resolver calls to obtain request-derived values.
        ///
        /// Each operation receives the bare macro key that triggered it and
        /// returns the value to substitute. An empty string means "no value";
        /// the processor then leaves the token in the output unchanged.
        ///
        /// The default body of every operation delegates to [`parent`](Self::parent)
        /// and returns an empty string when there is no parent, which makes
        /// [`EmptyMacros`] the no-op surface.
        ///
        /// Implementations are bound to one bid request and are not shared
        /// between threads rendering different impressions.
        pub trait BidderMacro {
            /// Surface that receives every operation this type does not override.
            fn parent(&self) -> Option<&dyn BidderMacro> {
                None
            }

            /// Makes the impression at `index` the current one.
            ///
            /// Implementations that wrap a parent must load the parent as well.
            ///
            /// # Errors
            ///
            /// Returns an error when the index is out of range or the impression
            /// carries an extension the implementation cannot parse.
            fn load_impression(&mut self, index: usize) -> Result<()> {
                let _ = index;
                Ok(())
            }

            /// Value for a partner-registered custom key.
            fn custom(&self, key: &str) -> String {
                self.parent().map_or_else(String::new, |parent| parent.custom(key))
            }

            $(
                $(#[$doc])*
                fn $name(&self, key: &str) -> String {
                    self.parent().map_or_else(String::new, |parent| parent.$name(key))
                }
            )*
        }
    };
}

capability_surface! {
    /// `%%test%%`: `request.test`.
    fn test;
    /// `%%timeout%%`: `request.tmax`.
    fn timeout;
    /// `%%wseat%%`: `request.wseat`.
    fn whitelist_seat;
    /// `%%wlang%%`: `request.wlang`.
    fn whitelist_lang;
    /// `%%bseat%%`: `request.bseat`.
    fn blocked_seat;
    /// `%%cur%%`: `request.cur`.
    fn currency;
    /// `%%bcat%%`: `request.bcat`.
    fn blocked_category;
    /// `%%badv%%`: `request.badv`.
    fn blocked_advertiser;
    /// `%%bapp%%`: `request.bapp`.
    fn blocked_app;
    /// `%%fd%%`: `source.fd`.
    fn fd;
    /// `%%tid%%`: `source.tid`.
    fn transaction_id;
    /// `%%pchain%%`: `source.pchain`.
    fn payment_id_chain;
    /// `%%coppa%%`: `regs.coppa`.
    fn coppa;
    /// `%%displaymanager%%`: `imp.displaymanager`.
    fn display_manager;
    /// `%%displaymanagerver%%`: `imp.displaymanagerver`.
    fn display_manager_version;
    /// `%%instl%%`: `imp.instl`.
    fn interstitial;
    /// `%%tagid%%`: `imp.tagid`.
    fn tag_id;
    /// `%%bidfloor%%`: `imp.bidfloor`.
    fn bid_floor;
    /// `%%bidfloorcur%%`: `imp.bidfloorcur`.
    fn bid_floor_currency;
    /// `%%secure%%`: `imp.secure`.
    fn secure;
    /// `%%pmp%%`: `imp.pmp`.
    fn pmp;
    /// `%%mimes%%`: `imp.video.mimes`.
    fn video_mimes;
    /// `%%minduration%%`: `imp.video.minduration`.
    fn video_min_duration;
    /// `%%maxduration%%`: `imp.video.maxduration`.
    fn video_max_duration;
    /// `%%protocols%%`: `imp.video.protocols`.
    fn video_protocols;
    /// `%%playerwidth%%`: `imp.video.w`.
    fn video_player_width;
    /// `%%playerheight%%`: `imp.video.h`.
    fn video_player_height;
    /// `%%startdelay%%`: `imp.video.startdelay`.
    fn video_start_delay;
    /// `%%placement%%`: `imp.video.placement`.
    fn video_placement;
    /// `%%linearity%%`: `imp.video.linearity`.
    fn video_linearity;
    /// `%%skip%%`: `imp.video.skip`.
    fn video_skip;
    /// `%%skipmin%%`: `imp.video.skipmin`.
    fn video_skip_min;
    /// `%%skipafter%%`: `imp.video.skipafter`.
    fn video_skip_after;
    /// `%%sequence%%`: `imp.video.sequence`.
    fn video_sequence;
    /// `%%battr%%`: `imp.video.battr`.
    fn video_blocked_attribute;
    /// `%%maxextended%%`: `imp.video.maxextended`.
    fn video_max_extended;
    /// `%%minbitrate%%`: `imp.video.minbitrate`.
    fn video_min_bitrate;
    /// `%%maxbitrate%%`: `imp.video.maxbitrate`.
    fn video_max_bitrate;
    /// `%%boxingallowed%%`: `imp.video.boxingallowed`.
    fn video_boxing_allowed;
    /// `%%playbackmethod%%`: `imp.video.playbackmethod`.
    fn video_playback_method;
    /// `%%delivery%%`: `imp.video.delivery`.
    fn video_delivery;
    /// `%%position%%`: `imp.video.pos`.
    fn video_position;
    /// `%%api%%`: `imp.video.api`.
    fn video_api;
    /// `%%siteid%%`: `site.id`.
    fn site_id;
    /// `%%sitename%%`: `site.name`.
    fn site_name;
    /// `%%page%%`: `site.page`.
    fn site_page;
    /// `%%ref%%`: `site.ref`.
    fn site_referrer;
    /// `%%search%%`: `site.search`.
    fn site_search;
    /// `%%mobile%%`: `site.mobile`.
    fn site_mobile;
    /// `%%appid%%`: `app.id`.
    fn app_id;
    /// `%%appname%%`: `app.name`.
    fn app_name;
    /// `%%bundle%%`: `app.bundle`.
    fn app_bundle;
    /// `%%storeurl%%`: `app.storeurl`.
    fn app_store_url;
    /// `%%appver%%`: `app.ver`.
    fn app_version;
    /// `%%paid%%`: `app.paid`.
    fn app_paid;
    /// `%%cat%%`: `site.cat / app.cat`.
    fn category;
    /// `%%domain%%`: `site.domain / app.domain`.
    fn domain;
    /// `%%sectioncat%%`: `site.sectioncat / app.sectioncat`.
    fn section_category;
    /// `%%pagecat%%`: `site.pagecat / app.pagecat`.
    fn page_category;
    /// `%%privacypolicy%%`: `site.privacypolicy / app.privacypolicy`.
    fn privacy_policy;
    /// `%%keywords%%`: `site.keywords / app.keywords`.
    fn keywords;
    /// `%%pubid%%`: `publisher.id`.
    fn pub_id;
    /// `%%pubname%%`: `publisher.name`.
    fn pub_name;
    /// `%%pubdomain%%`: `publisher.domain`.
    fn pub_domain;
    /// `%%contentid%%`: `content.id`.
    fn content_id;
    /// `%%episode%%`: `content.episode`.
    fn content_episode;
    /// `%%title%%`: `content.title`.
    fn content_title;
    /// `%%series%%`: `content.series`.
    fn content_series;
    /// `%%season%%`: `content.season`.
    fn content_season;
    /// `%%artist%%`: `content.artist`.
    fn content_artist;
    /// `%%genre%%`: `content.genre`.
    fn content_genre;
    /// `%%album%%`: `content.album`.
    fn content_album;
    /// `%%isrc%%`: `content.isrc`.
    fn content_isrc;
    /// `%%contenturl%%`: `content.url`.
    fn content_url;
    /// `%%contentcat%%`: `content.cat`.
    fn content_category;
    /// `%%contentprodq%%`: `content.prodq`.
    fn content_production_quality;
    /// `%%contentvideoquality%%`: `content.videoquality`.
    fn content_video_quality;
    /// `%%context%%`: `content.context`.
    fn content_context;
    /// `%%contentrating%%`: `content.contentrating`.
    fn content_rating;
    /// `%%userrating%%`: `content.userrating`.
    fn content_user_rating;
    /// `%%qagmediarating%%`: `content.qagmediarating`.
    fn content_qag_media_rating;
    /// `%%contentkeywords%%`: `content.keywords`.
    fn content_keywords;
    /// `%%livestream%%`: `content.livestream`.
    fn content_live_stream;
    /// `%%sourcerelationship%%`: `content.sourcerelationship`.
    fn content_source_relationship;
    /// `%%contentlen%%`: `content.len`.
    fn content_length;
    /// `%%contentlanguage%%`: `content.language`.
    fn content_language;
    /// `%%contentembeddable%%`: `content.embeddable`.
    fn content_embeddable;
    /// `%%prodid%%`: `content.producer.id`.
    fn producer_id;
    /// `%%prodname%%`: `content.producer.name`.
    fn producer_name;
    /// `%%useragent%%`: `device.ua`.
    fn user_agent;
    /// `%%dnt%%`: `device.dnt`.
    fn dnt;
    /// `%%lmt%%`: `device.lmt`.
    fn lmt;
    /// `%%ip%%`: `device.ip (falls back to device.ipv6)`.
    fn ip;
    /// `%%devicetype%%`: `device.devicetype`.
    fn device_type;
    /// `%%make%%`: `device.make`.
    fn make;
    /// `%%model%%`: `device.model`.
    fn model;
    /// `%%os%%`: `device.os`.
    fn device_os;
    /// `%%osv%%`: `device.osv`.
    fn device_os_version;
    /// `%%devicewidth%%`: `device.w`.
    fn device_width;
    /// `%%deviceheight%%`: `device.h`.
    fn device_height;
    /// `%%js%%`: `device.js`.
    fn device_js;
    /// `%%lang%%`: `device.language`.
    fn device_language;
    /// `%%ifa%%`: `device.ifa`.
    fn device_ifa;
    /// `%%ifa_type%%`: `device.ext.ifa_type`.
    fn device_ifa_type;
    /// `%%didsha1%%`: `device.didsha1`.
    fn device_didsha1;
    /// `%%didmd5%%`: `device.didmd5`.
    fn device_didmd5;
    /// `%%dpidsha1%%`: `device.dpidsha1`.
    fn device_dpidsha1;
    /// `%%dpidmd5%%`: `device.dpidmd5`.
    fn device_dpidmd5;
    /// `%%macsha1%%`: `device.macsha1`.
    fn device_macsha1;
    /// `%%macmd5%%`: `device.macmd5`.
    fn device_macmd5;
    /// `%%lat%%`: `device.geo.lat`.
    fn latitude;
    /// `%%lon%%`: `device.geo.lon`.
    fn longitude;
    /// `%%country%%`: `device.geo.country`.
    fn country;
    /// `%%region%%`: `device.geo.region`.
    fn region;
    /// `%%city%%`: `device.geo.city`.
    fn city;
    /// `%%zip%%`: `device.geo.zip`.
    fn zip;
    /// `%%utcoffset%%`: `device.geo.utcoffset`.
    fn utc_offset;
    /// `%%uid%%`: `user.id`.
    fn user_id;
    /// `%%yob%%`: `user.yob`.
    fn yob;
    /// `%%gender%%`: `user.gender`.
    fn gender;
    /// `%%consent%%`: `user.ext.consent`.
    fn consent;
    /// `%%gdpr%%`: `regs.ext.gdpr`.
    fn gdpr;
    /// `%%usprivacy%%`: `regs.ext.us_privacy`.
    fn us_privacy;
    /// `%%cachebuster%%`: a fresh random value per render.
    fn cache_buster;
}

/// Capability surface that resolves nothing.
///
/// Rendering with it leaves every token in the template untouched, except for
/// values pre-seeded on the processor.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyMacros;

impl BidderMacro for EmptyMacros {}
