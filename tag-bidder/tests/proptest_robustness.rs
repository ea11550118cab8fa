//! Property tests for rendering and decoding robustness.

use proptest::prelude::*;
use tag_bidder::{
    MacroMapper, TagBidderError, VastDecoder,
    bidder::{EmptyMacros, escape, render},
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn test_unresolvable_templates_render_unchanged(template in "[a-z0-9%_/?&=.:]{0,64}") {
        let mapper = MacroMapper::standard();
        prop_assert_eq!(render(&template, &mapper, &EmptyMacros), template);
    }

    #[test]
    fn test_rendering_is_idempotent_without_values(template in "(%%[a-z_]{0,12}%%|[a-z ]{0,6}|%){0,8}") {
        let mapper = MacroMapper::standard();
        let once = render(&template, &mapper, &EmptyMacros);
        let twice = render(&once, &mapper, &EmptyMacros);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_escaped_values_are_query_safe(value in any::<String>(), depth in 1usize..4) {
        let escaped = escape(&value, depth);
        prop_assert!(escaped.bytes().all(|b| b.is_ascii_alphanumeric() || b"%+*-._".contains(&b)));
    }

    #[test]
    fn test_decoder_never_panics_on_bytes(body in any::<Vec<u8>>()) {
        let _ = VastDecoder::new().decode(&body, "imp");
    }

    #[test]
    fn test_decoder_never_panics_on_markup(body in "(<[A-Za-z]{1,8}( [a-z]{1,4}=\"[^\"<&]{0,6}\")?/?>|</[A-Za-z]{1,8}>|[^<&]{0,8}){0,24}") {
        let _ = VastDecoder::new().decode(body.as_bytes(), "imp");
    }

    #[test]
    fn test_decoder_rejects_deep_nesting(depth in 65usize..4_096) {
        let body = format!(
            r#"<VAST version="3.0"><Ad><InLine><Pricing>1</Pricing>{}{}</InLine></Ad></VAST>"#,
            "<a>".repeat(depth),
            "</a>".repeat(depth),
        );
        let result = VastDecoder::new().decode(body.as_bytes(), "imp");
        prop_assert!(matches!(result, Err(TagBidderError::MalformedResponse(_))));
    }

    #[test]
    fn test_decoded_prices_are_positive(price in "-?[0-9]{1,4}(\\.[0-9]{1,4})?") {
        let body = format!(r#"<VAST version="3.0"><Ad><InLine><Pricing>{price}</Pricing></InLine></Ad></VAST>"#);
        if let Ok(bid) = VastDecoder::new().decode(body.as_bytes(), "imp") {
            prop_assert!(bid.price > rust_decimal::Decimal::ZERO);
        }
    }
}
