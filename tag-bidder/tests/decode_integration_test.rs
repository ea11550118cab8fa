//! Integration tests for VAST response decoding through the adapter.

use std::{str::FromStr, sync::Arc};

use rust_decimal::Decimal;
use tag_bidder::{
    BidderRegistry, ResponseData, TagBidder, TagBidderConfig, TagBidderError, VastDecoder,
    ids::FixedId,
    openrtb::BidRequest,
    partners::spotx,
    vast::{BidDraft, Element, VastExtensionParser},
};

const REQUEST: &str = r#"{
    "id": "auction-3",
    "imp": [
        {"id": "imp_id_1", "video": {"w": 640, "h": 480}, "ext": {"bidder": {"channel_id": "85394"}}},
        {"id": "imp_id_2", "video": {"w": 640, "h": 480}, "ext": {"bidder": {"channel_id": "85394"}}}
    ],
    "app": {"bundle": "com.example.tv"}
}"#;

const VAST_2_WRAPPER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<VAST version="2.0">
  <Ad id="1">
    <Wrapper>
      <AdSystem>spotx</AdSystem>
      <VASTAdTagURI><![CDATA[https://cdn.spotx.test/vast/1234.xml]]></VASTAdTagURI>
      <Creatives>
        <Creative id="crv-1"><Linear><Duration>00:00:15</Duration></Linear></Creative>
      </Creatives>
      <Extensions>
        <Extension type="spotx"><Price currency="USD">0.05</Price></Extension>
        <Extension type="advertiser"><Advertiser>brand.test</Advertiser></Extension>
      </Extensions>
    </Wrapper>
  </Ad>
</VAST>"#;

fn request() -> BidRequest {
    BidRequest::from_json(REQUEST).expect("fixture request parses")
}

fn spotx_bidder() -> TagBidder {
    spotx::bidder()
        .expect("built-in partner")
        .with_decoder(VastDecoder::new().with_id_generator(Arc::new(FixedId::new("1234"))))
}

#[test]
fn test_spotx_request_and_response_cycle() {
    let bidder = spotx_bidder();
    let request = request();

    let requests = bidder.make_requests(&request).expect("requests render");
    assert_eq!(requests.len(), 2);

    let bid = bidder
        .make_bids(&request, &requests[1], &ResponseData::ok(VAST_2_WRAPPER))
        .expect("bid decodes");

    assert_eq!(bid.id, "1234");
    assert_eq!(bid.imp_id, "imp_id_2");
    assert_eq!(bid.price, Decimal::from_str("0.05").expect("decimal"));
    assert_eq!(bid.currency, "USD");
    assert_eq!(bid.markup, VAST_2_WRAPPER);
    assert_eq!(bid.ext.creative_id, "crv-1");
    assert_eq!(bid.ext.duration, Some(15));
    assert_eq!(bid.ext.advertiser_domains, vec!["brand.test"]);
    assert_eq!(bid.ext.vast_version, "2.0");
}

#[test]
fn test_decode_failures_are_no_bids() {
    let bidder = spotx_bidder();
    let request = request();
    let requests = bidder.make_requests(&request).expect("requests render");

    let bodies = [
        "",
        "<html><body>no ad</body></html>",
        r#"<VAST version="3.0"></VAST>"#,
        r#"<VAST version="3.0"><Ad><InLine><Pricing>0</Pricing></InLine></Ad></VAST>"#,
    ];
    for body in bodies {
        let error = bidder
            .make_bids(&request, &requests[0], &ResponseData::ok(body))
            .expect_err("no bid expected");
        assert!(error.is_no_bid(), "{body:?} gave {error}");
    }
}

#[test]
fn test_vast_3_pricing_through_config_currency() {
    let mut config = TagBidderConfig::new("euro", "https://ads.euro.test/vast?b=%%bundle%%");
    config.default_currency = "EUR".to_owned();
    let bidder = TagBidder::new(config).expect("valid bidder");
    let request = request();
    let requests = bidder.make_requests(&request).expect("requests render");

    assert_eq!(requests[0].uri, "https://ads.euro.test/vast?b=com.example.tv");

    let body = r#"<VAST version="3.0"><Ad><InLine><Pricing model="CPM"> 2.40 </Pricing></InLine></Ad></VAST>"#;
    let bid = bidder.make_bids(&request, &requests[0], &ResponseData::ok(body)).expect("bid decodes");

    assert_eq!(bid.price, Decimal::from_str("2.4").expect("decimal"));
    assert_eq!(bid.currency, "EUR");
    assert_eq!(bid.imp_id, "imp_id_1");
}

#[test]
fn test_partner_extension_hook() {
    #[derive(Debug)]
    struct BidPriceExtension;

    impl VastExtensionParser for BidPriceExtension {
        fn parse_extension(&self, _version: &str, ad: &Element, bid: &mut BidDraft) -> tag_bidder::Result<()> {
            let Some(node) = ad.find("Extensions/Extension/BidPrice") else {
                return Ok(());
            };
            let price = Decimal::from_str(node.text())
                .map_err(|e| TagBidderError::Extension(format!("bad BidPrice: {e}")))?;
            bid.price = Some(price);
            bid.currency = node.attr("currency").map(str::to_owned);
            bid.imp_id = Some("imp-from-extension".to_owned());
            Ok(())
        }
    }

    let bidder = TagBidder::new(TagBidderConfig::new("hooked", "https://ads.hooked.test/vast"))
        .expect("valid bidder")
        .with_extension(Arc::new(BidPriceExtension));
    let request = request();
    let requests = bidder.make_requests(&request).expect("requests render");

    let body = r#"<VAST version="2.0"><Ad><InLine><Extensions><Extension><BidPrice currency="gbp">7.5</BidPrice><Price>0.01</Price></Extension></Extensions></InLine></Ad></VAST>"#;
    let bid = bidder.make_bids(&request, &requests[0], &ResponseData::ok(body)).expect("bid decodes");
    assert_eq!(bid.price, Decimal::from_str("7.5").expect("decimal"));
    assert_eq!(bid.currency, "GBP");
    assert_eq!(bid.imp_id, "imp-from-extension");

    let body = r#"<VAST version="2.0"><Ad><InLine><Extensions><Extension><BidPrice>lots</BidPrice></Extension></Extensions></InLine></Ad></VAST>"#;
    let error = bidder
        .make_bids(&request, &requests[0], &ResponseData::ok(body))
        .expect_err("extension failure aborts");
    assert!(matches!(error, TagBidderError::Extension(_)));
    assert!(error.is_no_bid());
}

#[test]
fn test_non_200_status() {
    let bidder = spotx_bidder();
    let request = request();
    let requests = bidder.make_requests(&request).expect("requests render");

    let response = ResponseData { status: 500, body: VAST_2_WRAPPER.as_bytes().to_vec() };
    let result = bidder.make_bids(&request, &requests[0], &response);
    assert!(matches!(result, Err(TagBidderError::UnexpectedStatus(500))));
}

#[test]
fn test_registry_from_file() {
    let path = std::env::temp_dir().join(format!("tag-bidder-registry-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
        name = "filed"
        endpoint = "https://ads.filed.test/vast?b=%%bundle%%"
        "#,
    )
    .expect("temp file written");

    let mut registry = BidderRegistry::with_builtin().expect("built-in partners");
    let result = registry.register_file(&path);
    std::fs::remove_file(&path).expect("temp file removed");
    result.expect("partner registers");

    assert_eq!(registry.names(), vec!["filed", "spotx"]);
    let requests = registry.get("filed").expect("registered").make_requests(&request()).expect("render");
    assert_eq!(requests[1].uri, "https://ads.filed.test/vast?b=com.example.tv");
}
