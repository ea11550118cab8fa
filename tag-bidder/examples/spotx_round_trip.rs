//! SpotX round trip: render the partner URL, then decode a canned VAST answer.
//!
//! # Running this example
//!
//! ```bash
//! RUST_LOG=tag_bidder=debug cargo run --example spotx_round_trip
//! ```

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "examples are allowed to use println"
)]

use tag_bidder::{
    BidderRegistry, ResponseData, TagBidderError, openrtb::BidRequest, partners::spotx,
};

const REQUEST: &str = r#"{
    "id": "example-auction",
    "tmax": 400,
    "imp": [
        {"id": "preroll", "video": {"w": 1280, "h": 720}, "ext": {"bidder": {"channel_id": "85394"}}},
        {"id": "unmapped", "video": {"w": 640, "h": 360}}
    ],
    "app": {"bundle": "com.example.tv", "name": "ExampleTV", "storeurl": "https://store.test/tv?id=1"},
    "device": {"ua": "ExampleTV/3.1 (SmartTV)", "ip": "203.0.113.20", "devicetype": 3}
}"#;

const RESPONSE: &str = r#"<VAST version="3.0"><Ad id="1"><InLine>
    <AdSystem>spotx</AdSystem>
    <Pricing model="CPM" currency="USD">4.20</Pricing>
    <Creatives><Creative id="spot-1"><Linear><Duration>00:00:30</Duration></Linear></Creative></Creatives>
</InLine></Ad></VAST>"#;

fn main() -> Result<(), TagBidderError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let registry = BidderRegistry::with_builtin()?;
    let bidder = registry
        .get(spotx::NAME)
        .ok_or_else(|| TagBidderError::InvalidInput("spotx is not registered".to_owned()))?;
    let request = BidRequest::from_json(REQUEST)?;

    let requests = bidder.make_requests(&request)?;
    for data in &requests {
        println!("{} {}", data.method, data.uri);
    }

    let bid = bidder.make_bids(&request, &requests[0], &ResponseData::ok(RESPONSE))?;
    println!(
        "bid {} for {}: {} {} ({}s creative {})",
        bid.id,
        bid.imp_id,
        bid.price,
        bid.currency,
        bid.ext.duration.unwrap_or_default(),
        bid.ext.creative_id
    );

    match bidder.make_bids(&request, &requests[0], &ResponseData { status: 204, body: Vec::new() }) {
        Err(e) if e.is_no_bid() => println!("second attempt: no bid ({e})"),
        Err(e) => eprintln!("second attempt failed: {e}"),
        Ok(bid) => println!("unexpected bid {}", bid.id),
    }
    Ok(())
}
