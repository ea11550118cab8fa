//! VAST response decoding.

use std::{fmt::Debug, str::FromStr, sync::Arc};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::{
    error::{Result, TagBidderError},
    ids::{IdGenerator, UuidGenerator},
    vast::{parse_duration, xml::{self, Element}},
};

/// Version assumed when the `VAST` root has no `version` attribute.
pub const DEFAULT_VAST_VERSION: &str = "2.0";

/// Currency assumed when the response does not name one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Bid fields an extension parser may fill in before the fallbacks run.
///
/// Anything left `None` is populated by [`VastDecoder::decode`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BidDraft {
    /// Bid id.
    pub id: Option<String>,
    /// Id of the impression the bid is for.
    pub imp_id: Option<String>,
    /// Price in CPM. Values that are not positive are ignored.
    pub price: Option<Decimal>,
    /// ISO 4217 currency of `price`.
    pub currency: Option<String>,
    /// Creative markup.
    pub markup: Option<String>,
}

/// Partner hook that reads non-standard pricing or ids from the ad element.
pub trait VastExtensionParser: Debug + Send + Sync {
    /// Inspects the selected `Wrapper` or `InLine` element.
    ///
    /// # Errors
    ///
    /// An error aborts decoding; return [`TagBidderError::Extension`] for
    /// extension content the partner considers invalid.
    fn parse_extension(&self, version: &str, ad: &Element, bid: &mut BidDraft) -> Result<()>;
}

/// Extension parser that sets nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtension;

impl VastExtensionParser for NoExtension {
    fn parse_extension(&self, _version: &str, _ad: &Element, _bid: &mut BidDraft) -> Result<()> {
        Ok(())
    }
}

/// Video metadata recovered from the VAST document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BidExt {
    /// `id` of the first creative, or a generated `cr_` id.
    pub creative_id: String,
    /// Linear duration of the first creative in whole seconds.
    pub duration: Option<u32>,
    /// Advertiser domains declared by the ad.
    pub advertiser_domains: Vec<String>,
    /// VAST version of the response.
    pub vast_version: String,
}

/// A bid decoded from one tag response.
///
/// The price is always positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedBid {
    /// Bid id.
    pub id: String,
    /// Id of the impression the bid is for.
    pub imp_id: String,
    /// Price in CPM.
    pub price: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Creative markup, usually the VAST document itself.
    pub markup: String,
    /// Video metadata.
    pub ext: BidExt,
}

/// Decodes VAST tag responses into a single [`NormalizedBid`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use tag_bidder::{ids::FixedId, vast::VastDecoder};
///
/// let body = r#"<VAST version="3.0"><Ad><InLine>
///     <Pricing model="CPM" currency="EUR">1.25</Pricing>
/// </InLine></Ad></VAST>"#;
///
/// let decoder = VastDecoder::new().with_id_generator(Arc::new(FixedId::new("bid-1")));
/// let bid = decoder.decode(body.as_bytes(), "imp-1")?;
///
/// assert_eq!(bid.id, "bid-1");
/// assert_eq!(bid.imp_id, "imp-1");
/// assert_eq!(bid.price.to_string(), "1.25");
/// assert_eq!(bid.currency, "EUR");
/// assert_eq!(bid.markup, body);
/// # Ok::<(), tag_bidder::TagBidderError>(())
/// ```
#[derive(Debug, Clone)]
pub struct VastDecoder {
    extension: Arc<dyn VastExtensionParser>,
    ids: Arc<dyn IdGenerator>,
    default_currency: String,
}

impl VastDecoder {
    /// Creates a decoder with no extension parser, random UUID ids and USD.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extension: Arc::new(NoExtension),
            ids: Arc::new(UuidGenerator),
            default_currency: DEFAULT_CURRENCY.to_owned(),
        }
    }

    /// Installs a partner extension parser.
    #[must_use]
    pub fn with_extension(mut self, extension: Arc<dyn VastExtensionParser>) -> Self {
        self.extension = extension;
        self
    }

    /// Replaces the id source used for bid and creative ids.
    #[must_use]
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Sets the currency used when the response names none.
    #[must_use]
    pub fn with_default_currency(mut self, currency: impl Into<String>) -> Self {
        self.default_currency = currency.into();
        self
    }

    /// Decodes one bid from a VAST response body.
    ///
    /// `imp_id` is the id of the impression at the position of the outbound
    /// request that produced `body`; it is used when the extension parser does
    /// not set one. Only the first `Ad` carrying a `Wrapper`, or failing that an
    /// `InLine`, is considered.
    ///
    /// # Errors
    ///
    /// - [`TagBidderError::MalformedResponse`]: not UTF-8, not well-formed XML
    ///   or no `VAST` root element
    /// - [`TagBidderError::MissingAdElement`]: no `Ad/Wrapper` or `Ad/InLine`
    /// - [`TagBidderError::MissingPrice`]: no positive price from the extension
    ///   parser or the version-specific pricing node
    /// - any error returned by the extension parser
    #[instrument(skip(self, body), fields(body_len = body.len()))]
    pub fn decode(&self, body: &[u8], imp_id: &str) -> Result<NormalizedBid> {
        let document = std::str::from_utf8(body).map_err(|e| {
            TagBidderError::MalformedResponse(format!("response is not UTF-8: {e}"))
        })?;
        let vast = xml::parse(document)?;
        if vast.name() != "VAST" {
            return Err(TagBidderError::MalformedResponse(format!(
                "root element is <{}>, expected <VAST>",
                vast.name()
            )));
        }

        let ad = vast
            .find("Ad/Wrapper")
            .or_else(|| vast.find("Ad/InLine"))
            .ok_or(TagBidderError::MissingAdElement)?;
        let version = vast.attr("version").map_or(DEFAULT_VAST_VERSION, str::trim);

        let mut draft = BidDraft::default();
        self.extension.parse_extension(version, ad, &mut draft)?;

        let (price, currency) = match draft.price.filter(|price| *price > Decimal::ZERO) {
            Some(price) => (price, draft.currency),
            None => {
                let (price, currency) = pricing(version, ad).ok_or(TagBidderError::MissingPrice)?;
                (price, currency.or(draft.currency))
            }
        };
        let currency = self.normalize_currency(currency.as_deref());

        let bid = NormalizedBid {
            id: draft.id.filter(|id| !id.is_empty()).unwrap_or_else(|| self.ids.generate()),
            imp_id: draft.imp_id.filter(|id| !id.is_empty()).unwrap_or_else(|| imp_id.to_owned()),
            price,
            currency,
            markup: draft
                .markup
                .filter(|markup| !markup.is_empty())
                .unwrap_or_else(|| document.to_owned()),
            ext: self.bid_ext(version, ad),
        };
        debug!(
            bid_id = %bid.id,
            imp_id = %bid.imp_id,
            price = %bid.price,
            currency = %bid.currency,
            version,
            "decoded VAST bid"
        );
        Ok(bid)
    }

    fn normalize_currency(&self, currency: Option<&str>) -> String {
        let Some(raw) = currency.map(str::trim).filter(|c| !c.is_empty()) else {
            return self.default_currency.clone();
        };
        let code = raw.to_ascii_uppercase();
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
            code
        } else {
            warn!(currency = raw, fallback = %self.default_currency, "ignoring invalid currency code");
            self.default_currency.clone()
        }
    }

    fn bid_ext(&self, version: &str, ad: &Element) -> BidExt {
        let creative = ad.find("Creatives/Creative");
        let creative_id = creative
            .and_then(|creative| creative.attr("id"))
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map_or_else(|| format!("cr_{}", self.ids.generate()), str::to_owned);
        let duration = creative
            .and_then(|creative| creative.find("Linear/Duration"))
            .and_then(|node| parse_duration(node.text()));

        BidExt {
            creative_id,
            duration,
            advertiser_domains: advertisers(version, ad),
            vast_version: version.to_owned(),
        }
    }
}

impl Default for VastDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Major version number, `2` when unparsable.
fn major_version(version: &str) -> u32 {
    version
        .split('.')
        .next()
        .and_then(|major| major.trim().parse().ok())
        .unwrap_or(2)
}

/// Locates the pricing node for `version` and returns a positive price and the
/// node's currency attribute.
fn pricing(version: &str, ad: &Element) -> Option<(Decimal, Option<String>)> {
    let node = if major_version(version) >= 3 {
        ad.child("Pricing")
    } else {
        ad.find("Extensions/Extension/Price")
    }?;

    let text = node.text();
    let price = Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text)).ok()?;
    if price <= Decimal::ZERO {
        debug!(%price, "ignoring non-positive VAST price");
        return None;
    }
    Some((price.normalize(), node.attr("currency").map(str::to_owned)))
}

fn advertisers(version: &str, ad: &Element) -> Vec<String> {
    let text = |element: &Element| Some(element.text().to_owned()).filter(|t| !t.is_empty());
    if major_version(version) >= 4 {
        return ad.child("Advertiser").and_then(text).into_iter().collect();
    }
    ad.find_all("Extensions/Extension")
        .into_iter()
        .filter(|extension| extension.attr("type") == Some("advertiser"))
        .filter_map(|extension| extension.child("Advertiser").and_then(text))
        .collect()
}

#[cfg(test)]
#[allow(
    clippy::unreachable,
    reason = "test code uses unreachable for expected-path assertions"
)]
mod tests {
    use super::*;
    use crate::ids::FixedId;

    const VAST_2_INLINE: &str = r#"<VAST version="2.0"><Ad><InLine><Extensions><Extension type="x"><Price currency="USD">0.05</Price></Extension></Extensions></InLine></Ad></VAST>"#;

    fn decoder() -> VastDecoder {
        VastDecoder::new().with_id_generator(Arc::new(FixedId::new("1234")))
    }

    #[derive(Debug)]
    struct PriceExtension;

    impl VastExtensionParser for PriceExtension {
        fn parse_extension(&self, version: &str, ad: &Element, bid: &mut BidDraft) -> Result<()> {
            let Some(node) = ad.find("Extensions/Extension/BidPrice") else {
                return Err(TagBidderError::Extension(format!("no BidPrice in VAST {version}")));
            };
            bid.price = Decimal::from_str(node.text()).ok();
            bid.id = Some("ext-bid".to_owned());
            bid.markup = Some("<custom/>".to_owned());
            Ok(())
        }
    }

    #[test]
    fn test_vast_2_pricing() {
        let bid = decoder().decode(VAST_2_INLINE.as_bytes(), "imp_id_1").unwrap();

        assert_eq!(bid.price, Decimal::from_str("0.05").unwrap());
        assert_eq!(bid.currency, "USD");
        assert_eq!(bid.markup, VAST_2_INLINE);
        assert_eq!(bid.id, "1234");
        assert_eq!(bid.imp_id, "imp_id_1");
        assert_eq!(bid.ext.vast_version, "2.0");
    }

    #[test]
    fn test_vast_3_pricing() {
        let body = r#"<VAST version="3.0"><Ad><InLine><Pricing model="CPM" currency="EUR"> 1.25 </Pricing></InLine></Ad></VAST>"#;
        let bid = decoder().decode(body.as_bytes(), "imp").unwrap();

        assert_eq!(bid.price, Decimal::from_str("1.25").unwrap());
        assert_eq!(bid.currency, "EUR");
    }

    #[test]
    fn test_missing_ad_element() {
        let result = decoder().decode(br#"<VAST version="2.0"></VAST>"#, "imp");
        assert!(matches!(result, Err(TagBidderError::MissingAdElement)));
    }

    #[test]
    fn test_missing_price() {
        let body = r#"<VAST version="2.0"><Ad><InLine><AdTitle>t</AdTitle></InLine></Ad></VAST>"#;
        let result = decoder().decode(body.as_bytes(), "imp");
        assert!(matches!(result, Err(TagBidderError::MissingPrice)));
    }

    #[test]
    fn test_pricing_node_must_match_version() {
        let body = r#"<VAST version="2.0"><Ad><InLine><Pricing currency="USD">1.00</Pricing></InLine></Ad></VAST>"#;
        let result = decoder().decode(body.as_bytes(), "imp");
        assert!(matches!(result, Err(TagBidderError::MissingPrice)));
    }

    #[test]
    fn test_zero_and_unparsable_prices_rejected() {
        for price in ["0", "0.000", "-1.5", "free", ""] {
            let body = format!(
                r#"<VAST version="3.0"><Ad><InLine><Pricing>{price}</Pricing></InLine></Ad></VAST>"#
            );
            let result = decoder().decode(body.as_bytes(), "imp");
            assert!(matches!(result, Err(TagBidderError::MissingPrice)), "price {price:?}");
        }
    }

    #[test]
    fn test_scientific_price() {
        let body = r#"<VAST version="3.0"><Ad><InLine><Pricing>5e-2</Pricing></InLine></Ad></VAST>"#;
        let bid = decoder().decode(body.as_bytes(), "imp").unwrap();
        assert_eq!(bid.price, Decimal::from_str("0.05").unwrap());
    }

    #[test]
    fn test_missing_version_defaults_to_2() {
        let body = r#"<VAST><Ad><InLine><Extensions><Extension><Price>2.5</Price></Extension></Extensions></InLine></Ad></VAST>"#;
        let bid = decoder().decode(body.as_bytes(), "imp").unwrap();
        assert_eq!(bid.price, Decimal::from_str("2.5").unwrap());
        assert_eq!(bid.ext.vast_version, DEFAULT_VAST_VERSION);
    }

    #[test]
    fn test_vast_4_uses_pricing_node() {
        let body = r#"<VAST version="4.1"><Ad><InLine><Pricing currency="GBP">3</Pricing><Advertiser>brand.test</Advertiser></InLine></Ad></VAST>"#;
        let bid = decoder().decode(body.as_bytes(), "imp").unwrap();
        assert_eq!(bid.currency, "GBP");
        assert_eq!(bid.ext.advertiser_domains, vec!["brand.test"]);
    }

    #[test]
    fn test_wrapper_preferred_over_inline() {
        let body = r#"<VAST version="3.0">
            <Ad id="a"><InLine><Pricing>1.00</Pricing></InLine></Ad>
            <Ad id="b"><Wrapper><Pricing>2.00</Pricing></Wrapper></Ad>
        </VAST>"#;
        let bid = decoder().decode(body.as_bytes(), "imp").unwrap();
        assert_eq!(bid.price, Decimal::from_str("2").unwrap());
    }

    #[test]
    fn test_currency_defaults_and_normalization() {
        let body = r#"<VAST version="3.0"><Ad><InLine><Pricing currency="eur">1</Pricing></InLine></Ad></VAST>"#;
        assert_eq!(decoder().decode(body.as_bytes(), "imp").unwrap().currency, "EUR");

        let body = r#"<VAST version="3.0"><Ad><InLine><Pricing>1</Pricing></InLine></Ad></VAST>"#;
        let bid = decoder().with_default_currency("JPY").decode(body.as_bytes(), "imp").unwrap();
        assert_eq!(bid.currency, "JPY");

        let body = r#"<VAST version="3.0"><Ad><InLine><Pricing currency="dollars">1</Pricing></InLine></Ad></VAST>"#;
        assert_eq!(decoder().decode(body.as_bytes(), "imp").unwrap().currency, "USD");
    }

    #[test]
    fn test_extension_values_take_precedence() {
        let body = r#"<VAST version="2.0"><Ad><InLine><Extensions><Extension><BidPrice>4.5</BidPrice><Price>0.01</Price></Extension></Extensions></InLine></Ad></VAST>"#;
        let bid = decoder()
            .with_extension(Arc::new(PriceExtension))
            .decode(body.as_bytes(), "imp")
            .unwrap();

        assert_eq!(bid.price, Decimal::from_str("4.5").unwrap());
        assert_eq!(bid.id, "ext-bid");
        assert_eq!(bid.markup, "<custom/>");
        assert_eq!(bid.imp_id, "imp");
    }

    #[test]
    fn test_extension_zero_price_falls_back_to_node() {
        let body = r#"<VAST version="2.0"><Ad><InLine><Extensions><Extension><BidPrice>0</BidPrice><Price>0.01</Price></Extension></Extensions></InLine></Ad></VAST>"#;
        let bid = decoder()
            .with_extension(Arc::new(PriceExtension))
            .decode(body.as_bytes(), "imp")
            .unwrap();
        assert_eq!(bid.price, Decimal::from_str("0.01").unwrap());
    }

    #[test]
    fn test_extension_error_propagates() {
        let result = decoder()
            .with_extension(Arc::new(PriceExtension))
            .decode(VAST_2_INLINE.as_bytes(), "imp");

        let Err(TagBidderError::Extension(message)) = result else {
            unreachable!("extension failure must abort decoding");
        };
        assert!(message.contains("2.0"));
    }

    #[test]
    fn test_creative_metadata() {
        let body = r#"<VAST version="3.0"><Ad><InLine>
            <Pricing>1</Pricing>
            <Creatives>
              <Creative id="cr-7" sequence="1"><Linear><Duration>00:00:30.500</Duration></Linear></Creative>
              <Creative id="cr-8"/>
            </Creatives>
            <Extensions>
              <Extension type="advertiser"><Advertiser>brand.test</Advertiser></Extension>
              <Extension type="other"><Advertiser>ignored.test</Advertiser></Extension>
            </Extensions>
        </InLine></Ad></VAST>"#;
        let bid = decoder().decode(body.as_bytes(), "imp").unwrap();

        assert_eq!(bid.ext.creative_id, "cr-7");
        assert_eq!(bid.ext.duration, Some(30));
        assert_eq!(bid.ext.advertiser_domains, vec!["brand.test"]);
    }

    #[test]
    fn test_generated_creative_id() {
        let bid = decoder().decode(VAST_2_INLINE.as_bytes(), "imp").unwrap();
        assert_eq!(bid.ext.creative_id, "cr_1234");
        assert_eq!(bid.ext.duration, None);
        assert!(bid.ext.advertiser_domains.is_empty());
    }

    #[test]
    fn test_malformed_bodies() {
        for body in [&b""[..], b"not xml", b"<VAST><Ad>", b"<html><body/></html>", &[0xff_u8, 0xfe, 0x00][..]] {
            let result = decoder().decode(body, "imp");
            assert!(
                matches!(result, Err(TagBidderError::MalformedResponse(_))),
                "body {body:?} gave {result:?}"
            );
        }
    }

    #[test]
    fn test_major_version() {
        assert_eq!(major_version("2.0"), 2);
        assert_eq!(major_version("3.0"), 3);
        assert_eq!(major_version("4"), 4);
        assert_eq!(major_version("garbage"), 2);
    }
}
