//! SpotX video tag partner.
//!
//! SpotX serves VAST 2.0 from a per-channel endpoint. The channel comes from
//! the impression's `ext.bidder.channel_id`; every other value is standard
//! OpenRTB data, except the player API which SpotX expects as `MP4`.

use serde::Deserialize;

use crate::{
    adapter::TagBidder,
    bidder::{BidderMacro, OpenRtbMacros},
    config::{CustomMacro, TagBidderConfig},
    error::{Result, TagBidderError},
    openrtb::BidRequest,
};

/// Partner name.
pub const NAME: &str = "spotx";

/// Endpoint template.
pub const ENDPOINT: &str = "https://search.spotxchange.com/vast/2.00/%%channel_id%%?VPI=%%api%%\
    &app[bundle]=%%bundle%%&app[name]=%%appname%%&app[cat]=%%cat%%&app[domain]=%%domain_ESC%%\
    &app[privacypolicy]=%%privacypolicy%%&app[storeurl]=%%storeurl_ESC%%&app[ver]=%%appver%%\
    &cb=%%cachebuster%%&device[devicetype]=%%devicetype%%&device[ifa]=%%ifa%%\
    &device[make]=%%make%%&device[model]=%%model%%&device[dnt]=%%dnt%%\
    &player_height=%%playerheight%%&player_width=%%playerwidth%%&ip_addr=%%ip%%\
    &device[ua]=%%useragent_ESC%%";

/// Custom macro carrying the SpotX channel.
pub const CHANNEL_ID: &str = "channel_id";

/// Custom macro carrying the SpotX ad unit.
pub const AD_UNIT: &str = "ad_unit";

const VIDEO_API: &str = "MP4";

/// Bidder parameters from `imp.ext.bidder`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SpotxImpExt {
    /// Publisher channel, the last path segment of the endpoint.
    pub channel_id: String,
    /// Ad unit type, e.g. `instream`.
    #[serde(default)]
    pub ad_unit: String,
    /// Whether secure creatives are required.
    #[serde(default)]
    pub secure: bool,
    /// Floor price overriding `imp.bidfloor` when positive.
    #[serde(default)]
    pub price_floor: f64,
}

#[derive(Deserialize)]
struct ImpExt {
    bidder: SpotxImpExt,
}

/// SpotX capability surface, layered over [`OpenRtbMacros`].
#[derive(Debug)]
pub struct SpotxMacros<'r> {
    base: OpenRtbMacros<'r>,
    ext: Option<SpotxImpExt>,
}

impl<'r> SpotxMacros<'r> {
    /// Wraps a request-bound surface.
    #[must_use]
    pub const fn new(base: OpenRtbMacros<'r>) -> Self {
        Self { base, ext: None }
    }

    /// Bidder parameters of the loaded impression.
    #[must_use]
    pub const fn impression_ext(&self) -> Option<&SpotxImpExt> {
        self.ext.as_ref()
    }
}

impl BidderMacro for SpotxMacros<'_> {
    fn parent(&self) -> Option<&dyn BidderMacro> {
        Some(&self.base)
    }

    fn load_impression(&mut self, index: usize) -> Result<()> {
        self.ext = None;
        self.base.load_impression(index)?;

        let imp = self.base.impression().ok_or(TagBidderError::InvalidImpressionIndex(index))?;
        let raw = imp.ext.as_ref().ok_or_else(|| {
            TagBidderError::InvalidImpressionExt(format!("impression {} has no ext", imp.id))
        })?;
        let ext = ImpExt::deserialize(raw).map_err(|e| {
            TagBidderError::InvalidImpressionExt(format!("impression {}: {e}", imp.id))
        })?;
        if ext.bidder.channel_id.trim().is_empty() {
            return Err(TagBidderError::InvalidImpressionExt(format!(
                "impression {}: channel_id is empty",
                imp.id
            )));
        }
        self.ext = Some(ext.bidder);
        Ok(())
    }

    fn custom(&self, key: &str) -> String {
        let Some(ext) = &self.ext else {
            return String::new();
        };
        match key {
            CHANNEL_ID => ext.channel_id.clone(),
            AD_UNIT => ext.ad_unit.clone(),
            _ => self.base.custom(key),
        }
    }

    fn video_api(&self, _key: &str) -> String {
        VIDEO_API.to_owned()
    }

    fn secure(&self, key: &str) -> String {
        match &self.ext {
            Some(ext) if ext.secure => "1".to_owned(),
            _ => self.base.secure(key),
        }
    }

    fn bid_floor(&self, key: &str) -> String {
        match &self.ext {
            Some(ext) if ext.price_floor > 0.0 => ext.price_floor.to_string(),
            _ => self.base.bid_floor(key),
        }
    }
}

/// Builds the SpotX surface for `request`.
#[must_use]
pub fn macros(request: &BidRequest) -> Box<dyn BidderMacro + '_> {
    Box::new(SpotxMacros::new(OpenRtbMacros::new(request)))
}

/// SpotX partner configuration.
#[must_use]
pub fn config() -> TagBidderConfig {
    let mut config = TagBidderConfig::new(NAME, ENDPOINT);
    config.remove_empty_params = true;
    config.custom_macros = vec![
        CustomMacro { key: CHANNEL_ID.to_owned(), cacheable: true },
        CustomMacro { key: AD_UNIT.to_owned(), cacheable: false },
    ];
    config
}

/// Builds the SpotX tag bidder.
///
/// # Errors
///
/// Returns [`TagBidderError::InvalidConfig`] if the built-in configuration
/// fails validation.
pub fn bidder() -> Result<TagBidder> {
    Ok(TagBidder::new(config())?.with_macro_factory(macros))
}

#[cfg(test)]
#[allow(
    clippy::unreachable,
    reason = "test code uses unreachable for expected-path assertions"
)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        bidder::{MacroProcessor, keys},
        ids::FixedId,
    };

    const APP_REQUEST: &str = r#"{
        "id": "req-1",
        "imp": [
            {
                "id": "imp-1",
                "video": {"mimes": ["video/mp4"], "w": 640, "h": 480, "api": [1, 2]},
                "ext": {"bidder": {"channel_id": "85394", "ad_unit": "instream"}}
            },
            {"id": "imp-2", "video": {"w": 320, "h": 240}},
            {"id": "imp-3", "ext": {"bidder": {"channel_id": 7}}}
        ],
        "app": {
            "bundle": "com.example.game",
            "name": "ExampleGame",
            "cat": ["IAB9", "IAB9-30"],
            "domain": "example.com",
            "privacypolicy": 1,
            "storeurl": "https://play.example.com/store?id=game",
            "ver": "1.2"
        },
        "device": {
            "ua": "Mozilla/5.0 (Linux)",
            "ip": "203.0.113.9",
            "devicetype": 4,
            "make": "Acme",
            "model": "X1",
            "ifa": "ifa-1",
            "dnt": 0
        }
    }"#;

    fn request() -> BidRequest {
        BidRequest::from_json(APP_REQUEST).unwrap()
    }

    #[test]
    fn test_channel_id_from_impression_ext() {
        let request = request();
        let mut spotx = SpotxMacros::new(OpenRtbMacros::new(&request));
        spotx.load_impression(0).unwrap();

        assert_eq!(spotx.custom(CHANNEL_ID), "85394");
        assert_eq!(spotx.custom(AD_UNIT), "instream");
        assert_eq!(spotx.custom("unknown"), "");
        assert_eq!(spotx.impression_ext().unwrap().channel_id, "85394");
    }

    #[test]
    fn test_video_api_is_mp4() {
        let request = request();
        let mut spotx = SpotxMacros::new(OpenRtbMacros::new(&request));
        spotx.load_impression(0).unwrap();

        assert_eq!(spotx.video_api(keys::VIDEO_API), "MP4");
    }

    #[test]
    fn test_standard_values_come_from_parent() {
        let request = request();
        let mut spotx = SpotxMacros::new(OpenRtbMacros::new(&request));
        spotx.load_impression(0).unwrap();

        assert_eq!(spotx.app_bundle(keys::APP_BUNDLE), "com.example.game");
        assert_eq!(spotx.video_player_width(keys::VIDEO_PLAYER_WIDTH), "640");
        assert_eq!(spotx.make(keys::MAKE), "Acme");
    }

    #[test]
    fn test_missing_ext_is_rejected() {
        let request = request();
        let mut spotx = SpotxMacros::new(OpenRtbMacros::new(&request));

        let Err(TagBidderError::InvalidImpressionExt(message)) = spotx.load_impression(1) else {
            unreachable!("impression without ext must be rejected");
        };
        assert!(message.contains("imp-2"));
        assert!(spotx.impression_ext().is_none());
    }

    #[test]
    fn test_malformed_ext_is_rejected() {
        let request = request();
        let mut spotx = SpotxMacros::new(OpenRtbMacros::new(&request));
        spotx.load_impression(0).unwrap();

        assert!(matches!(spotx.load_impression(2), Err(TagBidderError::InvalidImpressionExt(_))));
        assert!(spotx.impression_ext().is_none());
        assert_eq!(spotx.custom(CHANNEL_ID), "");
    }

    #[test]
    fn test_out_of_range_impression() {
        let request = request();
        let mut spotx = SpotxMacros::new(OpenRtbMacros::new(&request));
        assert!(matches!(spotx.load_impression(9), Err(TagBidderError::InvalidImpressionIndex(9))));
    }

    #[test]
    fn test_rendered_endpoint() {
        let request = request();
        let base = OpenRtbMacros::new(&request).with_id_generator(Arc::new(FixedId::new("cb-1")));
        let mut spotx = SpotxMacros::new(base);
        spotx.load_impression(0).unwrap();

        let config = config();
        let mapper = config.mapper();
        let url = MacroProcessor::new(&mapper).process_url(&spotx, ENDPOINT, config.flags());

        assert_eq!(
            url,
            "https://search.spotxchange.com/vast/2.00/85394?VPI=MP4\
             &app[bundle]=com.example.game&app[name]=ExampleGame&app[cat]=IAB9,IAB9-30\
             &app[domain]=example.com&app[privacypolicy]=1\
             &app[storeurl]=https%3A%2F%2Fplay.example.com%2Fstore%3Fid%3Dgame&app[ver]=1.2\
             &cb=cb-1&device[devicetype]=4&device[ifa]=ifa-1&device[make]=Acme&device[model]=X1\
             &device[dnt]=0&player_height=480&player_width=640&ip_addr=203.0.113.9\
             &device[ua]=Mozilla%2F5.0+%28Linux%29"
        );
    }

    #[test]
    fn test_config_is_valid() {
        let config = config();
        assert!(config.validate().is_ok());
        assert!(config.flags().remove_empty_params);
        assert!(config.mapper().contains(CHANNEL_ID));
    }
}
