//! Tag bidder adapter.
//!
//! A [`TagBidder`] turns an OpenRTB request into one GET request per
//! impression by rendering the partner's endpoint template, and decodes the
//! VAST answer to each of those requests into a bid.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    bidder::{BidderMacro, MacroMapper, MacroProcessor, OpenRtbMacros},
    config::TagBidderConfig,
    error::{Result, TagBidderError},
    openrtb::BidRequest,
    vast::{NormalizedBid, VastDecoder, VastExtensionParser},
};

/// HTTP method of every outbound tag request.
pub const METHOD_GET: &str = "GET";

/// Builds the capability surface used to render one request.
pub type MacroFactory = for<'r> fn(&'r BidRequest) -> Box<dyn BidderMacro + 'r>;

/// Default factory: the plain OpenRTB surface.
#[must_use]
pub fn openrtb_macros(request: &BidRequest) -> Box<dyn BidderMacro + '_> {
    Box::new(OpenRtbMacros::new(request))
}

/// An outbound tag request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestData {
    /// Position of the impression in the bid request.
    pub imp_index: usize,
    /// HTTP method.
    pub method: String,
    /// Rendered endpoint URL.
    pub uri: String,
}

/// The partner's answer to one [`RequestData`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseData {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl ResponseData {
    /// A `200 OK` response carrying `body`.
    #[must_use]
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self { status: 200, body: body.into() }
    }
}

/// One configured tag bidder partner.
///
/// The macro table is built once from the configuration; rendering and
/// decoding only read it, so a `TagBidder` can be shared across threads.
///
/// # Examples
///
/// ```
/// use tag_bidder::{
///     adapter::{ResponseData, TagBidder},
///     config::TagBidderConfig,
///     openrtb::BidRequest,
/// };
///
/// let bidder = TagBidder::new(TagBidderConfig::new(
///     "acme",
///     "https://ads.acme.test/vast?slot=%%tagid%%",
/// ))?;
/// let request = BidRequest::from_json(r#"{"imp":[{"id":"imp-1","tagid":"top"}]}"#)?;
///
/// let requests = bidder.make_requests(&request)?;
/// assert_eq!(requests[0].uri, "https://ads.acme.test/vast?slot=top");
///
/// let response = ResponseData::ok(
///     r#"<VAST version="3.0"><Ad><InLine><Pricing>2.5</Pricing></InLine></Ad></VAST>"#,
/// );
/// let bid = bidder.make_bids(&request, &requests[0], &response)?;
/// assert_eq!(bid.imp_id, "imp-1");
/// # Ok::<(), tag_bidder::TagBidderError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TagBidder {
    config: TagBidderConfig,
    mapper: MacroMapper,
    factory: MacroFactory,
    decoder: VastDecoder,
}

impl TagBidder {
    /// Creates a bidder rendering with [`OpenRtbMacros`].
    ///
    /// # Errors
    ///
    /// Returns [`TagBidderError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: TagBidderConfig) -> Result<Self> {
        config.validate()?;
        let mapper = config.mapper();
        let decoder = VastDecoder::new().with_default_currency(config.default_currency.clone());
        Ok(Self { config, mapper, factory: openrtb_macros, decoder })
    }

    /// Replaces the capability surface factory.
    #[must_use]
    pub fn with_macro_factory(mut self, factory: MacroFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Installs a partner VAST extension parser.
    #[must_use]
    pub fn with_extension(mut self, extension: Arc<dyn VastExtensionParser>) -> Self {
        self.decoder = self.decoder.with_extension(extension);
        self
    }

    /// Replaces the response decoder.
    #[must_use]
    pub fn with_decoder(mut self, decoder: VastDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Partner name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Partner configuration.
    #[must_use]
    pub const fn config(&self) -> &TagBidderConfig {
        &self.config
    }

    /// Partner macro table.
    #[must_use]
    pub const fn mapper(&self) -> &MacroMapper {
        &self.mapper
    }

    /// Renders one GET request per impression.
    ///
    /// Impressions the capability surface cannot load, for example because
    /// their bidder parameters are malformed, are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`TagBidderError::InvalidInput`] if the request has no
    /// impressions.
    #[instrument(skip(self, request), fields(bidder = %self.config.name, request_id = %request.id))]
    pub fn make_requests(&self, request: &BidRequest) -> Result<Vec<RequestData>> {
        if request.imp.is_empty() {
            return Err(TagBidderError::InvalidInput("bid request has no impressions".to_owned()));
        }

        let mut macros = (self.factory)(request);
        let flags = self.config.flags();
        let mut requests = Vec::with_capacity(request.imp.len());

        for index in 0..request.imp.len() {
            if let Err(error) = macros.load_impression(index) {
                warn!(imp_index = index, %error, "skipping impression");
                continue;
            }

            let mut processor = MacroProcessor::new(&self.mapper);
            processor.set_bidder_keys(&self.config.bidder_keys);
            let uri = processor.process_url(&*macros, &self.config.endpoint, flags);
            debug!(imp_index = index, uri = %uri, "tag request rendered");

            requests.push(RequestData { imp_index: index, method: METHOD_GET.to_owned(), uri });
        }

        info!(
            impressions = request.imp.len(),
            requests = requests.len(),
            "tag requests built"
        );
        Ok(requests)
    }

    /// Decodes the partner's answer to `request_data` into a bid.
    ///
    /// # Errors
    ///
    /// - [`TagBidderError::UnexpectedStatus`]: status other than 200
    /// - [`TagBidderError::InvalidImpressionIndex`]: `request_data` points
    ///   outside `request.imp`
    /// - any error of [`VastDecoder::decode`]
    #[instrument(
        skip(self, request, request_data, response),
        fields(bidder = %self.config.name, imp_index = request_data.imp_index, status = response.status)
    )]
    pub fn make_bids(
        &self,
        request: &BidRequest,
        request_data: &RequestData,
        response: &ResponseData,
    ) -> Result<NormalizedBid> {
        if response.status != 200 {
            return Err(TagBidderError::UnexpectedStatus(response.status));
        }
        let imp = request
            .imp
            .get(request_data.imp_index)
            .ok_or(TagBidderError::InvalidImpressionIndex(request_data.imp_index))?;

        self.decoder.decode(&response.body, &imp.id)
    }
}

#[cfg(test)]
#[allow(
    clippy::unreachable,
    reason = "test code uses unreachable for expected-path assertions"
)]
mod tests {
    use std::{collections::HashMap, str::FromStr};

    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        bidder::EmptyMacros,
        config::CustomMacro,
        ids::FixedId,
        vast::{BidDraft, Element},
    };

    const REQUEST: &str = r#"{
        "id": "req-9",
        "tmax": 250,
        "imp": [
            {"id": "imp-a", "tagid": "top"},
            {"id": "imp-b", "tagid": ""}
        ],
        "site": {"page": "https://news.test/a?b=1"}
    }"#;

    const VAST: &str = r#"<VAST version="2.0"><Ad><InLine><Extensions><Extension><Price currency="EUR">0.75</Price></Extension></Extensions></InLine></Ad></VAST>"#;

    fn request() -> BidRequest {
        BidRequest::from_json(REQUEST).unwrap()
    }

    fn bidder(endpoint: &str) -> TagBidder {
        TagBidder::new(TagBidderConfig::new("acme", endpoint)).unwrap()
    }

    fn request_data(imp_index: usize) -> RequestData {
        RequestData { imp_index, method: METHOD_GET.to_owned(), uri: String::new() }
    }

    #[test]
    fn test_one_request_per_impression() {
        let bidder = bidder("https://ads.acme.test/vast?t=%%timeout%%&slot=%%tagid%%&u=%%page_ESC%%");
        let requests = bidder.make_requests(&request()).unwrap();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].imp_index, 0);
        assert_eq!(
            requests[0].uri,
            "https://ads.acme.test/vast?t=250&slot=top&u=https%3A%2F%2Fnews.test%2Fa%3Fb%3D1"
        );
        assert_eq!(
            requests[1].uri,
            "https://ads.acme.test/vast?t=250&slot=%%tagid%%&u=https%3A%2F%2Fnews.test%2Fa%3Fb%3D1"
        );
    }

    #[test]
    fn test_remove_empty_params() {
        let mut config = TagBidderConfig::new("acme", "https://ads.acme.test/vast?slot=%%tagid%%&t=%%timeout%%");
        config.remove_empty_params = true;
        let bidder = TagBidder::new(config).unwrap();

        let requests = bidder.make_requests(&request()).unwrap();
        assert_eq!(requests[0].uri, "https://ads.acme.test/vast?slot=top&t=250");
        assert_eq!(requests[1].uri, "https://ads.acme.test/vast?t=250");
    }

    #[test]
    fn test_bidder_keys_seed_every_request() {
        let mut config = TagBidderConfig::new("acme", "https://ads.acme.test/vast?p=%%placement%%&s=%%tagid%%");
        config.bidder_keys = HashMap::from([("placement".to_owned(), "p-1".to_owned())]);
        let bidder = TagBidder::new(config).unwrap();

        let requests = bidder.make_requests(&request()).unwrap();
        assert!(requests.iter().all(|r| r.uri.contains("p=p-1")));
    }

    #[test]
    fn test_custom_macros_use_factory_surface() {
        fn channel_macros(_request: &BidRequest) -> Box<dyn BidderMacro + '_> {
            #[derive(Debug)]
            struct Channel;
            impl BidderMacro for Channel {
                fn custom(&self, key: &str) -> String {
                    format!("{key}-42")
                }
            }
            Box::new(Channel)
        }

        let mut config = TagBidderConfig::new("acme", "https://ads.acme.test/vast?c=%%channel%%&t=%%timeout%%");
        config.custom_macros.push(CustomMacro { key: "channel".to_owned(), cacheable: false });
        let bidder = TagBidder::new(config).unwrap().with_macro_factory(channel_macros);

        let requests = bidder.make_requests(&request()).unwrap();
        assert_eq!(requests[0].uri, "https://ads.acme.test/vast?c=channel-42&t=%%timeout%%");
    }

    #[test]
    fn test_unloadable_impressions_are_skipped() {
        fn first_only(_request: &BidRequest) -> Box<dyn BidderMacro + '_> {
            #[derive(Debug)]
            struct FirstOnly;
            impl BidderMacro for FirstOnly {
                fn load_impression(&mut self, index: usize) -> Result<()> {
                    if index == 0 {
                        Ok(())
                    } else {
                        Err(TagBidderError::InvalidImpressionExt(format!("imp {index}")))
                    }
                }
            }
            Box::new(FirstOnly)
        }

        let bidder = bidder("https://ads.acme.test/vast").with_macro_factory(first_only);
        let requests = bidder.make_requests(&request()).unwrap();

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].imp_index, 0);
    }

    #[test]
    fn test_no_impressions() {
        let request = BidRequest::from_json(r#"{"id":"empty","imp":[]}"#).unwrap();
        let result = bidder("https://ads.acme.test/vast").make_requests(&request);
        assert!(matches!(result, Err(TagBidderError::InvalidInput(_))));
    }

    #[test]
    fn test_make_bids_uses_impression_id() {
        let bidder = bidder("https://ads.acme.test/vast")
            .with_decoder(VastDecoder::new().with_id_generator(Arc::new(FixedId::new("bid-1"))));
        let bid = bidder.make_bids(&request(), &request_data(1), &ResponseData::ok(VAST)).unwrap();

        assert_eq!(bid.id, "bid-1");
        assert_eq!(bid.imp_id, "imp-b");
        assert_eq!(bid.price, Decimal::from_str("0.75").unwrap());
        assert_eq!(bid.currency, "EUR");
    }

    #[test]
    fn test_make_bids_default_currency_from_config() {
        let mut config = TagBidderConfig::new("acme", "https://ads.acme.test/vast");
        config.default_currency = "JPY".to_owned();
        let bidder = TagBidder::new(config).unwrap();

        let body = r#"<VAST version="3.0"><Ad><InLine><Pricing>100</Pricing></InLine></Ad></VAST>"#;
        let bid = bidder.make_bids(&request(), &request_data(0), &ResponseData::ok(body)).unwrap();
        assert_eq!(bid.currency, "JPY");
    }

    #[test]
    fn test_make_bids_rejects_non_200() {
        let response = ResponseData { status: 204, body: Vec::new() };
        let result = bidder("https://ads.acme.test/vast").make_bids(&request(), &request_data(0), &response);

        let Err(error) = result else {
            unreachable!("204 must not produce a bid");
        };
        assert!(matches!(error, TagBidderError::UnexpectedStatus(204)));
        assert!(error.is_no_bid());
    }

    #[test]
    fn test_make_bids_rejects_unknown_impression() {
        let result =
            bidder("https://ads.acme.test/vast").make_bids(&request(), &request_data(5), &ResponseData::ok(VAST));
        assert!(matches!(result, Err(TagBidderError::InvalidImpressionIndex(5))));
    }

    #[test]
    fn test_make_bids_uses_extension() {
        #[derive(Debug)]
        struct FixedPrice;
        impl VastExtensionParser for FixedPrice {
            fn parse_extension(&self, _version: &str, _ad: &Element, bid: &mut BidDraft) -> Result<()> {
                bid.price = Some(Decimal::from(3));
                Ok(())
            }
        }

        let bidder = bidder("https://ads.acme.test/vast").with_extension(Arc::new(FixedPrice));
        let bid = bidder.make_bids(&request(), &request_data(0), &ResponseData::ok(VAST)).unwrap();
        assert_eq!(bid.price, Decimal::from(3));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = TagBidder::new(TagBidderConfig::new("", "https://ads.acme.test/vast"));
        assert!(matches!(result, Err(TagBidderError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_surface_leaves_tokens() {
        fn empty(_request: &BidRequest) -> Box<dyn BidderMacro + '_> {
            Box::new(EmptyMacros)
        }

        let bidder = bidder("https://ads.acme.test/vast?t=%%timeout%%").with_macro_factory(empty);
        let requests = bidder.make_requests(&request()).unwrap();
        assert_eq!(requests[0].uri, "https://ads.acme.test/vast?t=%%timeout%%");
    }
}
