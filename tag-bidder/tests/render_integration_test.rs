//! Integration tests for endpoint rendering.
//!
//! Tests macro resolution from TOML partner configuration through to rendered
//! partner URLs.

use std::{cell::Cell, sync::Arc};

use tag_bidder::{
    BidderMacro, BidderRegistry, MacroMapper, MacroProcessor, TagBidder, TagBidderConfig,
    bidder::{Flags, OpenRtbMacros, keys, render},
    ids::FixedId,
    openrtb::BidRequest,
    partners::spotx,
};

const VIDEO_REQUEST: &str = r#"{
    "id": "auction-7",
    "tmax": 500,
    "cur": ["USD", "EUR"],
    "imp": [
        {
            "id": "imp-1",
            "tagid": "preroll",
            "bidfloor": 1.5,
            "video": {"mimes": ["video/mp4", "video/webm"], "w": 640, "h": 360, "minduration": 5, "maxduration": 30},
            "ext": {"bidder": {"channel_id": "85394"}}
        },
        {
            "id": "imp-2",
            "tagid": "midroll",
            "video": {"w": 1280, "h": 720}
        }
    ],
    "site": {
        "id": "site-1",
        "page": "https://news.test/video?id=9",
        "domain": "news.test",
        "cat": ["IAB12"]
    },
    "device": {"ua": "Agent/1.0", "ip": "198.51.100.4", "dnt": 1},
    "user": {"id": "user-1"},
    "regs": {"ext": {"gdpr": 1}}
}"#;

fn request() -> BidRequest {
    BidRequest::from_json(VIDEO_REQUEST).expect("fixture request parses")
}

#[test]
fn test_full_partner_configuration_flow() {
    let toml = r#"
        name = "acme"
        endpoint = "https://ads.acme.test/vast/%%placement%%?tmax=%%timeout%%&slot=%%tagid%%&mimes=%%mimes_ESC%%&floor=%%bidfloor%%&page=%%page_ESC%%&gdpr=%%gdpr%%&consent=%%consent%%&ch=%%channel%%"
        remove_empty_params = true
        cached_macros = ["timeout"]

        [[custom_macros]]
        key = "channel"

        [bidder_keys]
        placement = "p-17"
    "#;

    let bidder = TagBidder::new(TagBidderConfig::from_toml(toml).expect("valid config"))
        .expect("valid bidder");
    let requests = bidder.make_requests(&request()).expect("requests render");

    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].uri,
        "https://ads.acme.test/vast/p-17?tmax=500&slot=preroll&mimes=video%2Fmp4%2Cvideo%2Fwebm\
         &floor=1.5&page=https%3A%2F%2Fnews.test%2Fvideo%3Fid%3D9&gdpr=1"
    );
    assert_eq!(
        requests[1].uri,
        "https://ads.acme.test/vast/p-17?tmax=500&slot=midroll\
         &page=https%3A%2F%2Fnews.test%2Fvideo%3Fid%3D9&gdpr=1"
    );
}

#[test]
fn test_plain_text_mode_keeps_unresolved_tokens() {
    let bidder = TagBidder::new(TagBidderConfig::new(
        "acme",
        "https://ads.acme.test/vast?app=%%bundle%%&site=%%siteid%%",
    ))
    .expect("valid bidder");

    let requests = bidder.make_requests(&request()).expect("requests render");
    assert_eq!(requests[0].uri, "https://ads.acme.test/vast?app=%%bundle%%&site=site-1");
}

#[test]
fn test_macros_without_tokens_pass_through() {
    let request = request();
    let macros = OpenRtbMacros::new(&request);
    let mapper = MacroMapper::standard();

    for template in ["", "https://ads.test/vast", "100% sure", "%", "%%"] {
        assert_eq!(render(template, &mapper, &macros), template);
    }
}

#[test]
fn test_escape_markers_stack() {
    let request = request();
    let mut macros = OpenRtbMacros::new(&request);
    macros.load_impression(0).expect("impression loads");
    let mapper = MacroMapper::standard();

    assert_eq!(render("%%domain%%", &mapper, &macros), "news.test");
    assert_eq!(render("%%page_ESC%%", &mapper, &macros), "https%3A%2F%2Fnews.test%2Fvideo%3Fid%3D9");
    assert_eq!(
        render("%%page_ESC_ESC%%", &mapper, &macros),
        "https%253A%252F%252Fnews.test%252Fvideo%253Fid%253D9"
    );
    assert_eq!(render("%%unknown_ESC%%", &mapper, &macros), "%%unknown_ESC%%");
}

#[test]
fn test_triple_percent_emits_single_percent() {
    let request = request();
    let mut macros = OpenRtbMacros::new(&request);
    macros.load_impression(0).expect("impression loads");
    let mapper = MacroMapper::standard();

    assert_eq!(render("%%%timeout%%", &mapper, &macros), "%500");
}

#[test]
fn test_cache_buster_is_stable_within_one_render() {
    let request = request();
    let macros = OpenRtbMacros::new(&request);
    let mapper = MacroMapper::standard();

    let rendered = render("%%cachebuster%%|%%cachebuster%%", &mapper, &macros);
    let (first, second) = rendered.split_once('|').expect("separator kept");
    assert!(!first.is_empty());
    assert_eq!(first, second);

    let next = render("%%cachebuster%%", &mapper, &macros);
    assert_ne!(next, first);
}

#[test]
fn test_cached_values_are_reused_within_one_render() {
    struct Counting<'a> {
        calls: &'a Cell<usize>,
    }

    impl BidderMacro for Counting<'_> {
        fn timeout(&self, _key: &str) -> String {
            self.calls.set(self.calls.get() + 1);
            "300".to_owned()
        }
    }

    let calls = Cell::new(0);
    let surface = Counting { calls: &calls };
    let mut mapper = MacroMapper::standard();

    let rendered = MacroProcessor::new(&mapper).process(&surface, "%%timeout%%-%%timeout%%");
    assert_eq!(rendered, "300-300");
    assert_eq!(calls.get(), 2);

    mapper.set_cacheable(keys::TIMEOUT, true);
    calls.set(0);
    let rendered = MacroProcessor::new(&mapper).process(&surface, "%%timeout%%-%%timeout%%");
    assert_eq!(rendered, "300-300");
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_seeded_values_apply_to_next_render_only() {
    let request = request();
    let macros = OpenRtbMacros::new(&request);
    let mapper = MacroMapper::standard();
    let mut processor = MacroProcessor::new(&mapper);

    processor.set_macro("%%timeout%%", "999");
    assert_eq!(processor.process(&macros, "%%timeout%%"), "999");
    assert_eq!(processor.process(&macros, "%%timeout%%"), "500");
}

#[test]
fn test_url_mode_without_query() {
    let request = request();
    let mut macros = OpenRtbMacros::new(&request);
    macros.load_impression(0).expect("impression loads");
    let mapper = MacroMapper::standard();
    let flags = Flags { remove_empty_params: true };

    let url = MacroProcessor::new(&mapper).process_url(&macros, "https://ads.test/vast/%%tagid%%", flags);
    assert_eq!(url, "https://ads.test/vast/preroll");

    let url = MacroProcessor::new(&mapper).process_url(&macros, "https://ads.test/vast?a=%%bundle%%", flags);
    assert_eq!(url, "https://ads.test/vast");
}

#[test]
fn test_spotx_end_to_end() {
    let registry = BidderRegistry::with_builtin().expect("built-in partners");
    let bidder = registry.get(spotx::NAME).expect("spotx registered");

    let requests = bidder.make_requests(&request()).expect("requests render");

    // imp-2 carries no SpotX channel and is skipped.
    assert_eq!(requests.len(), 1);
    let uri = &requests[0].uri;
    assert!(uri.starts_with("https://search.spotxchange.com/vast/2.00/85394?VPI=MP4&app[cat]=IAB12&app[domain]=news.test&cb="));
    assert!(uri.ends_with(
        "&device[dnt]=1&player_height=360&player_width=640&ip_addr=198.51.100.4&device[ua]=Agent%2F1.0"
    ));
    assert!(!uri.contains("app[bundle]"));
    assert!(!uri.contains("%%"));
}

#[test]
fn test_spotx_surface_with_pinned_cache_buster() {
    let request = request();
    let base = OpenRtbMacros::new(&request).with_id_generator(Arc::new(FixedId::new("42")));
    let mut surface = spotx::SpotxMacros::new(base);
    surface.load_impression(0).expect("impression loads");

    let config = spotx::config();
    let mapper = config.mapper();
    let url = MacroProcessor::new(&mapper).process_url(&surface, spotx::ENDPOINT, config.flags());

    assert_eq!(
        url,
        "https://search.spotxchange.com/vast/2.00/85394?VPI=MP4&app[cat]=IAB12&app[domain]=news.test\
         &cb=42&device[dnt]=1&player_height=360&player_width=640&ip_addr=198.51.100.4\
         &device[ua]=Agent%2F1.0"
    );
}
