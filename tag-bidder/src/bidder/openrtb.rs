//! Capability surface backed by an OpenRTB bid request.

use std::{fmt, sync::Arc};

use crate::{
    bidder::BidderMacro,
    error::{Result, TagBidderError},
    ids::{IdGenerator, UuidGenerator},
    openrtb::{App, BidRequest, Content, Device, Geo, Imp, Publisher, Site, User, Video},
};

/// Resolves every standard macro from one [`BidRequest`].
///
/// Publisher and content are taken from the app when the request comes from an
/// application and from the site otherwise; this is decided once at
/// construction. Impression-level macros read the impression selected by the
/// last successful [`load_impression`](BidderMacro::load_impression) and are
/// empty before any impression is loaded.
///
/// Formatting follows the OpenRTB field types: zero-valued required integers
/// render empty, optional integers render whenever present, floats use their
/// shortest round-trip form and lists are joined with `,`.
///
/// # Examples
///
/// ```
/// use tag_bidder::{bidder::{BidderMacro, OpenRtbMacros, keys}, openrtb::BidRequest};
///
/// let request = BidRequest::from_json(r#"{"tmax":120,"imp":[{"id":"1","tagid":"slot-7"}]}"#)?;
/// let mut macros = OpenRtbMacros::new(&request);
/// macros.load_impression(0)?;
///
/// assert_eq!(macros.timeout(keys::TIMEOUT), "120");
/// assert_eq!(macros.tag_id(keys::TAG_ID), "slot-7");
/// # Ok::<(), tag_bidder::TagBidderError>(())
/// ```
pub struct OpenRtbMacros<'r> {
    request: &'r BidRequest,
    imp: Option<&'r Imp>,
    publisher: Option<&'r Publisher>,
    content: Option<&'r Content>,
    ids: Arc<dyn IdGenerator>,
}

impl<'r> OpenRtbMacros<'r> {
    /// Binds a surface to `request`.
    #[must_use]
    pub fn new(request: &'r BidRequest) -> Self {
        let (publisher, content) = match (&request.app, &request.site) {
            (Some(app), _) => (app.publisher.as_ref(), app.content.as_ref()),
            (None, Some(site)) => (site.publisher.as_ref(), site.content.as_ref()),
            (None, None) => (None, None),
        };
        Self { request, imp: None, publisher, content, ids: Arc::new(UuidGenerator) }
    }

    /// Replaces the id source used for cache busters.
    #[must_use]
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// The bound request.
    #[must_use]
    pub const fn request(&self) -> &'r BidRequest {
        self.request
    }

    /// The currently loaded impression.
    #[must_use]
    pub const fn impression(&self) -> Option<&'r Imp> {
        self.imp
    }

    fn video(&self) -> Option<&'r Video> {
        self.imp.and_then(|imp| imp.video.as_ref())
    }

    fn device(&self) -> Option<&'r Device> {
        self.request.device.as_ref()
    }

    fn geo(&self) -> Option<&'r Geo> {
        self.device().and_then(|device| device.geo.as_ref())
    }

    fn user(&self) -> Option<&'r User> {
        self.request.user.as_ref()
    }

    fn from_imp(&self, f: impl FnOnce(&'r Imp) -> String) -> String {
        self.imp.map_or_else(String::new, f)
    }

    fn from_video(&self, f: impl FnOnce(&'r Video) -> String) -> String {
        self.video().map_or_else(String::new, f)
    }

    fn from_site(&self, f: impl FnOnce(&'r Site) -> String) -> String {
        if self.request.is_app() {
            return String::new();
        }
        self.request.site.as_ref().map_or_else(String::new, f)
    }

    fn from_app(&self, f: impl FnOnce(&'r App) -> String) -> String {
        self.request.app.as_ref().map_or_else(String::new, f)
    }

    fn from_site_or_app(
        &self,
        site: impl FnOnce(&'r Site) -> String,
        app: impl FnOnce(&'r App) -> String,
    ) -> String {
        match (&self.request.app, &self.request.site) {
            (Some(a), _) => app(a),
            (None, Some(s)) => site(s),
            (None, None) => String::new(),
        }
    }

    fn from_publisher(&self, f: impl FnOnce(&'r Publisher) -> String) -> String {
        self.publisher.map_or_else(String::new, f)
    }

    fn from_content(&self, f: impl FnOnce(&'r Content) -> String) -> String {
        self.content.map_or_else(String::new, f)
    }

    fn from_device(&self, f: impl FnOnce(&'r Device) -> String) -> String {
        self.device().map_or_else(String::new, f)
    }

    fn from_geo(&self, f: impl FnOnce(&'r Geo) -> String) -> String {
        self.geo().map_or_else(String::new, f)
    }

    fn from_user(&self, f: impl FnOnce(&'r User) -> String) -> String {
        self.user().map_or_else(String::new, f)
    }
}

impl fmt::Debug for OpenRtbMacros<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRtbMacros")
            .field("request_id", &self.request.id)
            .field("imp_id", &self.imp.map(|imp| imp.id.as_str()))
            .field("is_app", &self.request.is_app())
            .finish_non_exhaustive()
    }
}

fn non_zero(value: i64) -> String {
    if value == 0 { String::new() } else { value.to_string() }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn join<T: ToString>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

fn positive_float(value: f64) -> String {
    if value > 0.0 { value.to_string() } else { String::new() }
}

impl BidderMacro for OpenRtbMacros<'_> {
    fn load_impression(&mut self, index: usize) -> Result<()> {
        let imp = self
            .request
            .imp
            .get(index)
            .ok_or(TagBidderError::InvalidImpressionIndex(index))?;
        self.imp = Some(imp);
        Ok(())
    }

    // Request

    fn test(&self, _key: &str) -> String {
        if self.request.test > 0 { "1".to_owned() } else { String::new() }
    }

    fn timeout(&self, _key: &str) -> String {
        non_zero(self.request.tmax)
    }

    fn whitelist_seat(&self, _key: &str) -> String {
        join(&self.request.wseat)
    }

    fn whitelist_lang(&self, _key: &str) -> String {
        join(&self.request.wlang)
    }

    fn blocked_seat(&self, _key: &str) -> String {
        join(&self.request.bseat)
    }

    fn currency(&self, _key: &str) -> String {
        join(&self.request.cur)
    }

    fn blocked_category(&self, _key: &str) -> String {
        join(&self.request.bcat)
    }

    fn blocked_advertiser(&self, _key: &str) -> String {
        join(&self.request.badv)
    }

    fn blocked_app(&self, _key: &str) -> String {
        join(&self.request.bapp)
    }

    // Source

    fn fd(&self, _key: &str) -> String {
        optional(self.request.source.as_ref().and_then(|source| source.fd))
    }

    fn transaction_id(&self, _key: &str) -> String {
        self.request.source.as_ref().map(|source| source.tid.clone()).unwrap_or_default()
    }

    fn payment_id_chain(&self, _key: &str) -> String {
        self.request.source.as_ref().map(|source| source.pchain.clone()).unwrap_or_default()
    }

    // Regs

    fn coppa(&self, _key: &str) -> String {
        self.request.regs.as_ref().map(|regs| non_zero(regs.coppa.into())).unwrap_or_default()
    }

    // Impression

    fn display_manager(&self, _key: &str) -> String {
        self.from_imp(|imp| imp.displaymanager.clone())
    }

    fn display_manager_version(&self, _key: &str) -> String {
        self.from_imp(|imp| imp.displaymanagerver.clone())
    }

    fn interstitial(&self, _key: &str) -> String {
        self.from_imp(|imp| non_zero(imp.instl.into()))
    }

    fn tag_id(&self, _key: &str) -> String {
        self.from_imp(|imp| imp.tagid.clone())
    }

    fn bid_floor(&self, _key: &str) -> String {
        self.from_imp(|imp| positive_float(imp.bidfloor))
    }

    fn bid_floor_currency(&self, _key: &str) -> String {
        self.from_imp(|imp| imp.bidfloorcur.clone())
    }

    fn secure(&self, _key: &str) -> String {
        self.from_imp(|imp| optional(imp.secure))
    }

    fn pmp(&self, _key: &str) -> String {
        self.from_imp(|imp| optional(imp.pmp.as_ref()))
    }

    // Video

    fn video_mimes(&self, _key: &str) -> String {
        self.from_video(|video| join(&video.mimes))
    }

    fn video_min_duration(&self, _key: &str) -> String {
        self.from_video(|video| non_zero(video.minduration))
    }

    fn video_max_duration(&self, _key: &str) -> String {
        self.from_video(|video| non_zero(video.maxduration))
    }

    fn video_protocols(&self, _key: &str) -> String {
        self.from_video(|video| join(&video.protocols))
    }

    fn video_player_width(&self, _key: &str) -> String {
        self.from_video(|video| non_zero(video.w))
    }

    fn video_player_height(&self, _key: &str) -> String {
        self.from_video(|video| non_zero(video.h))
    }

    fn video_start_delay(&self, _key: &str) -> String {
        self.from_video(|video| optional(video.startdelay))
    }

    fn video_placement(&self, _key: &str) -> String {
        self.from_video(|video| non_zero(video.placement))
    }

    fn video_linearity(&self, _key: &str) -> String {
        self.from_video(|video| non_zero(video.linearity))
    }

    fn video_skip(&self, _key: &str) -> String {
        self.from_video(|video| optional(video.skip))
    }

    fn video_skip_min(&self, _key: &str) -> String {
        self.from_video(|video| non_zero(video.skipmin))
    }

    fn video_skip_after(&self, _key: &str) -> String {
        self.from_video(|video| non_zero(video.skipafter))
    }

    fn video_sequence(&self, _key: &str) -> String {
        self.from_video(|video| non_zero(video.sequence))
    }

    fn video_blocked_attribute(&self, _key: &str) -> String {
        self.from_video(|video| join(&video.battr))
    }

    fn video_max_extended(&self, _key: &str) -> String {
        self.from_video(|video| non_zero(video.maxextended))
    }

    fn video_min_bitrate(&self, _key: &str) -> String {
        self.from_video(|video| non_zero(video.minbitrate))
    }

    fn video_max_bitrate(&self, _key: &str) -> String {
        self.from_video(|video| non_zero(video.maxbitrate))
    }

    fn video_boxing_allowed(&self, _key: &str) -> String {
        self.from_video(|video| optional(video.boxingallowed))
    }

    fn video_playback_method(&self, _key: &str) -> String {
        self.from_video(|video| join(&video.playbackmethod))
    }

    fn video_delivery(&self, _key: &str) -> String {
        self.from_video(|video| join(&video.delivery))
    }

    fn video_position(&self, _key: &str) -> String {
        self.from_video(|video| optional(video.pos))
    }

    fn video_api(&self, _key: &str) -> String {
        self.from_video(|video| join(&video.api))
    }

    // Site

    fn site_id(&self, _key: &str) -> String {
        self.from_site(|site| site.id.clone())
    }

    fn site_name(&self, _key: &str) -> String {
        self.from_site(|site| site.name.clone())
    }

    fn site_page(&self, _key: &str) -> String {
        self.from_site(|site| site.page.clone())
    }

    fn site_referrer(&self, _key: &str) -> String {
        self.from_site(|site| site.referrer.clone())
    }

    fn site_search(&self, _key: &str) -> String {
        self.from_site(|site| site.search.clone())
    }

    fn site_mobile(&self, _key: &str) -> String {
        self.from_site(|site| optional(site.mobile))
    }

    // App

    fn app_id(&self, _key: &str) -> String {
        self.from_app(|app| app.id.clone())
    }

    fn app_name(&self, _key: &str) -> String {
        self.from_app(|app| app.name.clone())
    }

    fn app_bundle(&self, _key: &str) -> String {
        self.from_app(|app| app.bundle.clone())
    }

    fn app_store_url(&self, _key: &str) -> String {
        self.from_app(|app| app.storeurl.clone())
    }

    fn app_version(&self, _key: &str) -> String {
        self.from_app(|app| app.ver.clone())
    }

    fn app_paid(&self, _key: &str) -> String {
        self.from_app(|app| optional(app.paid))
    }

    // Site and app

    fn category(&self, _key: &str) -> String {
        self.from_site_or_app(|site| join(&site.cat), |app| join(&app.cat))
    }

    fn domain(&self, _key: &str) -> String {
        self.from_site_or_app(|site| site.domain.clone(), |app| app.domain.clone())
    }

    fn section_category(&self, _key: &str) -> String {
        self.from_site_or_app(|site| join(&site.sectioncat), |app| join(&app.sectioncat))
    }

    fn page_category(&self, _key: &str) -> String {
        self.from_site_or_app(|site| join(&site.pagecat), |app| join(&app.pagecat))
    }

    fn privacy_policy(&self, _key: &str) -> String {
        self.from_site_or_app(|site| optional(site.privacypolicy), |app| optional(app.privacypolicy))
    }

    fn keywords(&self, _key: &str) -> String {
        self.from_site_or_app(|site| site.keywords.clone(), |app| app.keywords.clone())
    }

    // Publisher

    fn pub_id(&self, _key: &str) -> String {
        self.from_publisher(|publisher| publisher.id.clone())
    }

    fn pub_name(&self, _key: &str) -> String {
        self.from_publisher(|publisher| publisher.name.clone())
    }

    fn pub_domain(&self, _key: &str) -> String {
        self.from_publisher(|publisher| publisher.domain.clone())
    }

    // Content

    fn content_id(&self, _key: &str) -> String {
        self.from_content(|content| content.id.clone())
    }

    fn content_episode(&self, _key: &str) -> String {
        self.from_content(|content| non_zero(content.episode))
    }

    fn content_title(&self, _key: &str) -> String {
        self.from_content(|content| content.title.clone())
    }

    fn content_series(&self, _key: &str) -> String {
        self.from_content(|content| content.series.clone())
    }

    fn content_season(&self, _key: &str) -> String {
        self.from_content(|content| content.season.clone())
    }

    fn content_artist(&self, _key: &str) -> String {
        self.from_content(|content| content.artist.clone())
    }

    fn content_genre(&self, _key: &str) -> String {
        self.from_content(|content| content.genre.clone())
    }

    fn content_album(&self, _key: &str) -> String {
        self.from_content(|content| content.album.clone())
    }

    fn content_isrc(&self, _key: &str) -> String {
        self.from_content(|content| content.isrc.clone())
    }

    fn content_url(&self, _key: &str) -> String {
        self.from_content(|content| content.url.clone())
    }

    fn content_category(&self, _key: &str) -> String {
        self.from_content(|content| join(&content.cat))
    }

    fn content_production_quality(&self, _key: &str) -> String {
        self.from_content(|content| optional(content.prodq))
    }

    fn content_video_quality(&self, _key: &str) -> String {
        self.from_content(|content| optional(content.videoquality))
    }

    fn content_context(&self, _key: &str) -> String {
        self.from_content(|content| non_zero(content.context))
    }

    fn content_rating(&self, _key: &str) -> String {
        self.from_content(|content| content.contentrating.clone())
    }

    fn content_user_rating(&self, _key: &str) -> String {
        self.from_content(|content| content.userrating.clone())
    }

    fn content_qag_media_rating(&self, _key: &str) -> String {
        self.from_content(|content| non_zero(content.qagmediarating))
    }

    fn content_keywords(&self, _key: &str) -> String {
        self.from_content(|content| content.keywords.clone())
    }

    fn content_live_stream(&self, _key: &str) -> String {
        self.from_content(|content| optional(content.livestream))
    }

    fn content_source_relationship(&self, _key: &str) -> String {
        self.from_content(|content| optional(content.sourcerelationship))
    }

    fn content_length(&self, _key: &str) -> String {
        self.from_content(|content| non_zero(content.len))
    }

    fn content_language(&self, _key: &str) -> String {
        self.from_content(|content| content.language.clone())
    }

    fn content_embeddable(&self, _key: &str) -> String {
        self.from_content(|content| optional(content.embeddable))
    }

    // Producer

    fn producer_id(&self, _key: &str) -> String {
        self.from_content(|content| optional(content.producer.as_ref().map(|p| &p.id)))
    }

    fn producer_name(&self, _key: &str) -> String {
        self.from_content(|content| optional(content.producer.as_ref().map(|p| &p.name)))
    }

    // Device

    fn user_agent(&self, _key: &str) -> String {
        self.from_device(|device| device.ua.clone())
    }

    fn dnt(&self, _key: &str) -> String {
        self.from_device(|device| optional(device.dnt))
    }

    fn lmt(&self, _key: &str) -> String {
        self.from_device(|device| optional(device.lmt))
    }

    fn ip(&self, _key: &str) -> String {
        self.from_device(|device| {
            if device.ip.is_empty() { device.ipv6.clone() } else { device.ip.clone() }
        })
    }

    fn device_type(&self, _key: &str) -> String {
        self.from_device(|device| non_zero(device.devicetype))
    }

    fn make(&self, _key: &str) -> String {
        self.from_device(|device| device.make.clone())
    }

    fn model(&self, _key: &str) -> String {
        self.from_device(|device| device.model.clone())
    }

    fn device_os(&self, _key: &str) -> String {
        self.from_device(|device| device.os.clone())
    }

    fn device_os_version(&self, _key: &str) -> String {
        self.from_device(|device| device.osv.clone())
    }

    fn device_width(&self, _key: &str) -> String {
        self.from_device(|device| non_zero(device.w))
    }

    fn device_height(&self, _key: &str) -> String {
        self.from_device(|device| non_zero(device.h))
    }

    fn device_js(&self, _key: &str) -> String {
        self.from_device(|device| optional(device.js))
    }

    fn device_language(&self, _key: &str) -> String {
        self.from_device(|device| device.language.clone())
    }

    fn device_ifa(&self, _key: &str) -> String {
        self.from_device(|device| device.ifa.clone())
    }

    fn device_ifa_type(&self, _key: &str) -> String {
        self.from_device(|device| optional(device.ext.as_ref().map(|ext| &ext.ifa_type)))
    }

    fn device_didsha1(&self, _key: &str) -> String {
        self.from_device(|device| device.didsha1.clone())
    }

    fn device_didmd5(&self, _key: &str) -> String {
        self.from_device(|device| device.didmd5.clone())
    }

    fn device_dpidsha1(&self, _key: &str) -> String {
        self.from_device(|device| device.dpidsha1.clone())
    }

    fn device_dpidmd5(&self, _key: &str) -> String {
        self.from_device(|device| device.dpidmd5.clone())
    }

    fn device_macsha1(&self, _key: &str) -> String {
        self.from_device(|device| device.macsha1.clone())
    }

    fn device_macmd5(&self, _key: &str) -> String {
        self.from_device(|device| device.macmd5.clone())
    }

    // Geo

    fn latitude(&self, _key: &str) -> String {
        self.from_geo(|geo| optional(geo.lat))
    }

    fn longitude(&self, _key: &str) -> String {
        self.from_geo(|geo| optional(geo.lon))
    }

    fn country(&self, _key: &str) -> String {
        self.from_geo(|geo| geo.country.clone())
    }

    fn region(&self, _key: &str) -> String {
        self.from_geo(|geo| geo.region.clone())
    }

    fn city(&self, _key: &str) -> String {
        self.from_geo(|geo| geo.city.clone())
    }

    fn zip(&self, _key: &str) -> String {
        self.from_geo(|geo| geo.zip.clone())
    }

    fn utc_offset(&self, _key: &str) -> String {
        self.from_geo(|geo| non_zero(geo.utcoffset))
    }

    // User

    fn user_id(&self, _key: &str) -> String {
        self.from_user(|user| user.id.clone())
    }

    fn yob(&self, _key: &str) -> String {
        self.from_user(|user| non_zero(user.yob))
    }

    fn gender(&self, _key: &str) -> String {
        self.from_user(|user| user.gender.clone())
    }

    // Privacy extensions

    fn consent(&self, _key: &str) -> String {
        self.from_user(|user| optional(user.ext.as_ref().map(|ext| &ext.consent)))
    }

    fn gdpr(&self, _key: &str) -> String {
        optional(self.request.regs.as_ref().and_then(|regs| regs.ext.as_ref()?.gdpr))
    }

    fn us_privacy(&self, _key: &str) -> String {
        optional(self.request.regs.as_ref().and_then(|regs| regs.ext.as_ref()).map(|ext| &ext.us_privacy))
    }

    // Additional

    fn cache_buster(&self, _key: &str) -> String {
        self.ids.generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bidder::keys, ids::FixedId};

    const SITE_REQUEST: &str = r#"{
        "id": "req-1",
        "tmax": 120,
        "cur": ["USD", "EUR"],
        "bcat": ["IAB25", "IAB26"],
        "source": {"tid": "tx-9", "fd": 0},
        "regs": {"coppa": 0, "ext": {"gdpr": 1, "us_privacy": "1YNN"}},
        "imp": [
            {"id": "imp-1", "tagid": "slot-1", "bidfloor": 3.0, "secure": 0,
             "video": {"mimes": ["video/mp4", "video/webm"], "minduration": 5,
                       "maxduration": 30, "protocols": [2, 3], "w": 640, "h": 480,
                       "startdelay": 0, "api": [1, 2]},
             "pmp": {"private_auction": 1}},
            {"id": "imp-2", "tagid": "slot-2", "bidfloor": 1.1}
        ],
        "site": {"id": "site-1", "name": "News", "page": "https://news.test/a",
                 "domain": "news.test", "cat": ["IAB12"],
                 "publisher": {"id": "pub-1", "name": "Publisher"},
                 "content": {"title": "Evening", "episode": 0, "livestream": 1,
                             "producer": {"id": "prod-1"}}},
        "device": {"ua": "Mozilla/5.0", "ip": "", "ipv6": "2001:db8::1",
                   "devicetype": 2, "dnt": 0, "ext": {"ifa_type": "aaid"},
                   "geo": {"lat": 40.5, "country": "USA"}},
        "user": {"id": "u-1", "yob": 0, "ext": {"consent": "CO-consent"}}
    }"#;

    const APP_REQUEST: &str = r#"{
        "imp": [{"id": "imp-1"}],
        "app": {"id": "app-1", "bundle": "com.example.game", "paid": 0,
                "domain": "game.test", "cat": ["IAB9"],
                "publisher": {"id": "app-pub"}}
    }"#;

    fn loaded(request: &BidRequest, index: usize) -> OpenRtbMacros<'_> {
        let mut macros = OpenRtbMacros::new(request);
        macros.load_impression(index).unwrap();
        macros
    }

    #[test]
    fn test_request_level_values() {
        let request = BidRequest::from_json(SITE_REQUEST).unwrap();
        let macros = OpenRtbMacros::new(&request);

        assert_eq!(macros.timeout(keys::TIMEOUT), "120");
        assert_eq!(macros.currency(keys::CURRENCY), "USD,EUR");
        assert_eq!(macros.blocked_category(keys::BLOCKED_CATEGORY), "IAB25,IAB26");
        assert_eq!(macros.transaction_id(keys::TRANSACTION_ID), "tx-9");
        assert_eq!(macros.fd(keys::FD), "0");
        assert!(macros.test(keys::TEST).is_empty());
        assert!(macros.coppa(keys::COPPA).is_empty());
    }

    #[test]
    fn test_impression_values_follow_loaded_impression() {
        let request = BidRequest::from_json(SITE_REQUEST).unwrap();
        let mut macros = loaded(&request, 0);

        assert_eq!(macros.tag_id(keys::TAG_ID), "slot-1");
        assert_eq!(macros.bid_floor(keys::BID_FLOOR), "3");
        assert_eq!(macros.secure(keys::SECURE), "0");
        assert_eq!(macros.pmp(keys::PMP), r#"{"private_auction":1}"#);

        macros.load_impression(1).unwrap();
        assert_eq!(macros.tag_id(keys::TAG_ID), "slot-2");
        assert_eq!(macros.bid_floor(keys::BID_FLOOR), "1.1");
        assert!(macros.video_mimes(keys::VIDEO_MIMES).is_empty());
    }

    #[test]
    fn test_impression_values_empty_before_load() {
        let request = BidRequest::from_json(SITE_REQUEST).unwrap();
        let macros = OpenRtbMacros::new(&request);
        assert!(macros.tag_id(keys::TAG_ID).is_empty());
        assert!(macros.impression().is_none());
    }

    #[test]
    fn test_load_impression_out_of_range() {
        let request = BidRequest::from_json(SITE_REQUEST).unwrap();
        let mut macros = OpenRtbMacros::new(&request);

        let Err(TagBidderError::InvalidImpressionIndex(index)) = macros.load_impression(5) else {
            unreachable!("loading a missing impression must fail");
        };
        assert_eq!(index, 5);
    }

    #[test]
    fn test_video_values() {
        let request = BidRequest::from_json(SITE_REQUEST).unwrap();
        let macros = loaded(&request, 0);

        assert_eq!(macros.video_mimes(keys::VIDEO_MIMES), "video/mp4,video/webm");
        assert_eq!(macros.video_min_duration(keys::VIDEO_MIN_DURATION), "5");
        assert_eq!(macros.video_protocols(keys::VIDEO_PROTOCOLS), "2,3");
        assert_eq!(macros.video_player_width(keys::VIDEO_PLAYER_WIDTH), "640");
        assert_eq!(macros.video_start_delay(keys::VIDEO_START_DELAY), "0");
        assert_eq!(macros.video_api(keys::VIDEO_API), "1,2");
        assert!(macros.video_skip(keys::VIDEO_SKIP).is_empty());
    }

    #[test]
    fn test_site_request_values() {
        let request = BidRequest::from_json(SITE_REQUEST).unwrap();
        let macros = OpenRtbMacros::new(&request);

        assert_eq!(macros.site_id(keys::SITE_ID), "site-1");
        assert_eq!(macros.site_page(keys::SITE_PAGE), "https://news.test/a");
        assert_eq!(macros.domain(keys::DOMAIN), "news.test");
        assert_eq!(macros.category(keys::CATEGORY), "IAB12");
        assert_eq!(macros.pub_id(keys::PUB_ID), "pub-1");
        assert_eq!(macros.content_title(keys::CONTENT_TITLE), "Evening");
        assert_eq!(macros.content_live_stream(keys::CONTENT_LIVE_STREAM), "1");
        assert_eq!(macros.producer_id(keys::PRODUCER_ID), "prod-1");
        assert!(macros.content_episode(keys::CONTENT_EPISODE).is_empty());
        assert!(macros.app_id(keys::APP_ID).is_empty());
    }

    #[test]
    fn test_app_request_values() {
        let request = BidRequest::from_json(APP_REQUEST).unwrap();
        let macros = OpenRtbMacros::new(&request);

        assert_eq!(macros.app_id(keys::APP_ID), "app-1");
        assert_eq!(macros.app_bundle(keys::APP_BUNDLE), "com.example.game");
        assert_eq!(macros.app_paid(keys::APP_PAID), "0");
        assert_eq!(macros.domain(keys::DOMAIN), "game.test");
        assert_eq!(macros.category(keys::CATEGORY), "IAB9");
        assert_eq!(macros.pub_id(keys::PUB_ID), "app-pub");
        assert!(macros.site_id(keys::SITE_ID).is_empty());
        assert!(macros.content_title(keys::CONTENT_TITLE).is_empty());
    }

    #[test]
    fn test_device_geo_user_values() {
        let request = BidRequest::from_json(SITE_REQUEST).unwrap();
        let macros = OpenRtbMacros::new(&request);

        assert_eq!(macros.user_agent(keys::USER_AGENT), "Mozilla/5.0");
        assert_eq!(macros.ip(keys::IP), "2001:db8::1");
        assert_eq!(macros.device_type(keys::DEVICE_TYPE), "2");
        assert_eq!(macros.dnt(keys::DNT), "0");
        assert_eq!(macros.device_ifa_type(keys::DEVICE_IFA_TYPE), "aaid");
        assert_eq!(macros.latitude(keys::LATITUDE), "40.5");
        assert!(macros.longitude(keys::LONGITUDE).is_empty());
        assert_eq!(macros.country(keys::COUNTRY), "USA");
        assert_eq!(macros.user_id(keys::USER_ID), "u-1");
        assert!(macros.yob(keys::YOB).is_empty());
    }

    #[test]
    fn test_privacy_values() {
        let request = BidRequest::from_json(SITE_REQUEST).unwrap();
        let macros = OpenRtbMacros::new(&request);

        assert_eq!(macros.gdpr(keys::GDPR), "1");
        assert_eq!(macros.us_privacy(keys::US_PRIVACY), "1YNN");
        assert_eq!(macros.consent(keys::CONSENT), "CO-consent");
    }

    #[test]
    fn test_cache_buster_uses_injected_ids() {
        let request = BidRequest::default();
        let macros = OpenRtbMacros::new(&request).with_id_generator(Arc::new(FixedId::new("42")));
        assert_eq!(macros.cache_buster(keys::CACHE_BUSTER), "42");
    }

    #[test]
    fn test_custom_is_empty_without_partner() {
        let request = BidRequest::default();
        let macros = OpenRtbMacros::new(&request);
        assert!(macros.custom("channel_id").is_empty());
    }
}
