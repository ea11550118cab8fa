//! Macro template rendering.
//!
//! Tokens are written as `%%key%%`. A key may end with one or more `_ESC`
//! markers, each adding one round of query-string escaping to the resolved
//! value, so `%%page_ESC%%` substitutes the escaped page URL.
//!
//! Rendering never fails. Tokens that are unknown to the table, or whose
//! resolver returns an empty value, are copied to the output unchanged.

use std::collections::HashMap;

use url::{Url, form_urlencoded};

use crate::bidder::{BidderMacro, MacroMapper};

/// Opening and closing token delimiter.
pub const MACRO_DELIMITER: &str = "%%";

/// Suffix requesting one additional round of escaping.
pub const ESCAPE_SUFFIX: &str = "_ESC";

const DELIMITER_LEN: usize = MACRO_DELIMITER.len();
const DELIMITER_BYTE: u8 = MACRO_DELIMITER.as_bytes()[0];

/// Rendering options for [`MacroProcessor::process_url`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// Drop query parameters that render empty or stay unresolved.
    pub remove_empty_params: bool,
}

/// Wraps a bare key in delimiters, e.g. `timeout` becomes `%%timeout%%`.
#[must_use]
pub fn macro_token(key: &str) -> String {
    format!("{MACRO_DELIMITER}{key}{MACRO_DELIMITER}")
}

/// Applies query-string escaping `depth` times.
#[must_use]
pub fn escape(value: &str, depth: usize) -> String {
    let mut escaped = value.to_owned();
    for _ in 0..depth {
        escaped = form_urlencoded::byte_serialize(escaped.as_bytes()).collect();
    }
    escaped
}

/// Renders `template` once with a fresh processor.
#[must_use]
pub fn render(template: &str, mapper: &MacroMapper, ctx: &dyn BidderMacro) -> String {
    MacroProcessor::new(mapper).process(ctx, template)
}

/// Renders macro templates against a [`MacroMapper`].
///
/// Each render keeps a cache keyed by the full token text, delimiters
/// included, so `%%page%%` and `%%page_ESC%%` are cached independently. Values
/// from cacheable entries are stored on first use; values seeded with
/// [`set_macro`](Self::set_macro) take priority over the table. The cache is
/// consumed by the next render and dropped when it completes.
///
/// # Examples
///
/// ```
/// use tag_bidder::bidder::{BidderMacro, MacroMapper, MacroProcessor};
///
/// struct Page;
///
/// impl BidderMacro for Page {
///     fn site_page(&self, _key: &str) -> String {
///         "https://a.test/?q=1".to_owned()
///     }
/// }
///
/// let mapper = MacroMapper::standard();
/// let mut processor = MacroProcessor::new(&mapper);
/// let url = processor.process(&Page, "https://ads.test/vast?u=%%page_ESC%%&x=%%nope%%");
///
/// assert_eq!(url, "https://ads.test/vast?u=https%3A%2F%2Fa.test%2F%3Fq%3D1&x=%%nope%%");
/// ```
#[derive(Debug)]
pub struct MacroProcessor<'m> {
    mapper: &'m MacroMapper,
    cache: HashMap<String, String>,
}

impl<'m> MacroProcessor<'m> {
    /// Creates a processor over `mapper`.
    #[must_use]
    pub fn new(mapper: &'m MacroMapper) -> Self {
        Self { mapper, cache: HashMap::new() }
    }

    /// Seeds the next render with a fixed value for the exact token text.
    pub fn set_macro(&mut self, token: impl Into<String>, value: impl Into<String>) {
        self.cache.insert(token.into(), value.into());
    }

    /// Seeds `%%key%%` tokens from partner-level key/value parameters.
    pub fn set_bidder_keys(&mut self, bidder_keys: &HashMap<String, String>) {
        for (key, value) in bidder_keys {
            self.set_macro(macro_token(key), value.clone());
        }
    }

    /// Renders `template`, substituting every resolvable token.
    pub fn process(&mut self, ctx: &dyn BidderMacro, template: &str) -> String {
        let mut cache = std::mem::take(&mut self.cache);
        let rendered = self.render_into(&mut cache, ctx, template);
        tracing::debug!(template, rendered = %rendered, cached = cache.len(), "macro template rendered");
        rendered
    }

    /// Renders a URL template.
    ///
    /// With [`Flags::remove_empty_params`] set and a template that parses as an
    /// absolute URL, the path and each query value are rendered separately.
    /// Query parameters whose value renders empty or still holds an unresolved
    /// token are dropped; the rest keep their order. Otherwise this is
    /// [`process`](Self::process).
    pub fn process_url(&mut self, ctx: &dyn BidderMacro, template: &str, flags: Flags) -> String {
        if !flags.remove_empty_params {
            return self.process(ctx, template);
        }
        let Ok(mut url) = Url::parse(template) else {
            tracing::debug!(template, "endpoint is not an absolute URL, rendering as plain text");
            return self.process(ctx, template);
        };

        let mut cache = std::mem::take(&mut self.cache);
        let path = self.render_into(&mut cache, ctx, url.path());
        url.set_path(&path);

        if let Some(query) = url.query().map(str::to_owned) {
            let mut rendered = String::with_capacity(query.len());
            for pair in query.split('&').filter(|pair| !pair.is_empty()) {
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                let value = self.render_into(&mut cache, ctx, value);
                if value.is_empty() || value.contains(MACRO_DELIMITER) {
                    continue;
                }
                if !rendered.is_empty() {
                    rendered.push('&');
                }
                rendered.push_str(name);
                rendered.push('=');
                rendered.push_str(&value);
            }
            url.set_query((!rendered.is_empty()).then_some(rendered.as_str()));
        }

        let rendered = url.to_string();
        tracing::debug!(template, rendered = %rendered, "macro URL rendered");
        rendered
    }

    fn render_into(
        &self,
        cache: &mut HashMap<String, String>,
        ctx: &dyn BidderMacro,
        input: &str,
    ) -> String {
        let mut out = String::with_capacity(input.len());
        let mut pos = 0;
        let mut start = 0;
        // `start` already sits on a delimiter left behind by an unresolved token.
        let mut resume_at_start = false;

        while pos < input.len() {
            if !resume_at_start {
                let Some(offset) = input[pos..].find(MACRO_DELIMITER) else {
                    out.push_str(&input[pos..]);
                    break;
                };
                start = pos + offset;
                out.push_str(&input[pos..start]);
            }

            let Some(offset) = input[start + DELIMITER_LEN..].find(MACRO_DELIMITER) else {
                out.push_str(&input[start..]);
                break;
            };
            let end = start + DELIMITER_LEN + offset + DELIMITER_LEN;
            let token = &input[start..end];

            if let Some(value) = cache.get(token) {
                out.push_str(value);
                pos = end;
                resume_at_start = false;
                continue;
            }

            if let Some((value, cacheable)) = self.resolve(ctx, token) {
                out.push_str(&value);
                if cacheable {
                    cache.insert(token.to_owned(), value);
                }
                pos = end;
                resume_at_start = false;
                continue;
            }

            // Unresolved: a delimiter character right after the opener is a
            // literal, otherwise the closer may open the next token.
            let literal_end = if input.as_bytes()[start + DELIMITER_LEN] == DELIMITER_BYTE {
                start + 1
            } else {
                end - DELIMITER_LEN
            };
            out.push_str(&input[start..literal_end]);
            pos = literal_end;
            start = literal_end;
            resume_at_start = true;
        }

        out
    }

    /// Resolves a delimited token, returning the escaped value and its cacheable flag.
    fn resolve(&self, ctx: &dyn BidderMacro, token: &str) -> Option<(String, bool)> {
        let mut key = &token[DELIMITER_LEN..token.len() - DELIMITER_LEN];
        let mut depth = 0;
        loop {
            if let Some(entry) = self.mapper.get(key) {
                let value = (entry.resolve)(ctx, key);
                if value.is_empty() {
                    return None;
                }
                return Some((escape(&value, depth), entry.cacheable));
            }
            key = key.strip_suffix(ESCAPE_SUFFIX)?;
            depth += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::bidder::{EmptyMacros, keys};

    /// Counts how often each operation is invoked.
    #[derive(Default)]
    struct Counting {
        timeouts: Cell<usize>,
        customs: Cell<usize>,
    }

    impl BidderMacro for Counting {
        fn timeout(&self, _key: &str) -> String {
            self.timeouts.set(self.timeouts.get() + 1);
            "500".to_owned()
        }

        fn site_page(&self, _key: &str) -> String {
            "https://pub.test/a b?c=d&e".to_owned()
        }

        fn app_bundle(&self, _key: &str) -> String {
            String::new()
        }

        fn custom(&self, key: &str) -> String {
            self.customs.set(self.customs.get() + 1);
            format!("{key}-value")
        }
    }

    #[test]
    fn test_literal_passthrough_with_empty_table() {
        let mapper = MacroMapper::default();
        let rendered = render("id=%%UnknownKey%%&x=1", &mapper, &EmptyMacros);
        assert_eq!(rendered, "id=%%UnknownKey%%&x=1");
    }

    #[test]
    fn test_unresolved_tokens_are_idempotent() {
        let mapper = MacroMapper::standard();
        let template = "a=%%nope%%&b=%%nope_ESC%%&c=%%timeout%%";
        let first = render(template, &mapper, &EmptyMacros);
        let second = render(template, &mapper, &EmptyMacros);
        assert_eq!(first, template);
        assert_eq!(first, second);
    }

    #[test]
    fn test_substitutes_known_token() {
        let mapper = MacroMapper::standard();
        assert_eq!(render("t=%%timeout%%", &mapper, &Counting::default()), "t=500");
    }

    #[test]
    fn test_template_without_tokens() {
        let mapper = MacroMapper::standard();
        let template = "https://ads.test/vast?fixed=1";
        assert_eq!(render(template, &mapper, &Counting::default()), template);
    }

    #[test]
    fn test_unterminated_token_copied_verbatim() {
        let mapper = MacroMapper::standard();
        assert_eq!(render("a=%%timeout", &mapper, &Counting::default()), "a=%%timeout");
    }

    #[test]
    fn test_empty_value_left_unresolved() {
        let mapper = MacroMapper::standard();
        let rendered = render("b=%%bundle%%&t=%%timeout%%", &mapper, &Counting::default());
        assert_eq!(rendered, "b=%%bundle%%&t=500");
    }

    #[test]
    fn test_closing_delimiter_of_unknown_token_can_open_next() {
        let mapper = MacroMapper::standard();
        assert_eq!(render("%%nope%%timeout%%", &mapper, &Counting::default()), "%%nope500");
    }

    #[test]
    fn test_triple_delimiter_emits_single_percent() {
        let mapper = MacroMapper::standard();
        assert_eq!(render("x=%%%timeout%%", &mapper, &Counting::default()), "x=%500");
    }

    #[test]
    fn test_escape_depth() {
        let mapper = MacroMapper::standard();
        let ctx = Counting::default();
        assert_eq!(render("%%page%%", &mapper, &ctx), "https://pub.test/a b?c=d&e");
        assert_eq!(render("%%page_ESC%%", &mapper, &ctx), "https%3A%2F%2Fpub.test%2Fa+b%3Fc%3Dd%26e");
        assert_eq!(
            render("%%page_ESC_ESC%%", &mapper, &ctx),
            "https%253A%252F%252Fpub.test%252Fa%2Bb%253Fc%253Dd%2526e"
        );
    }

    #[test]
    fn test_escape_helper() {
        assert_eq!(escape("a b&c", 0), "a b&c");
        assert_eq!(escape("a b&c", 1), "a+b%26c");
        assert_eq!(escape("a b&c", 2), "a%2Bb%2526c");
    }

    #[test]
    fn test_cacheable_macro_resolved_once() {
        let mut mapper = MacroMapper::standard();
        mapper.set_cacheable(keys::TIMEOUT, true);
        let ctx = Counting::default();

        let rendered = render("a=%%timeout%%&b=%%timeout%%", &mapper, &ctx);
        assert_eq!(rendered, "a=500&b=500");
        assert_eq!(ctx.timeouts.get(), 1);
    }

    #[test]
    fn test_non_cacheable_macro_resolved_each_time() {
        let mapper = MacroMapper::standard();
        let ctx = Counting::default();

        render("a=%%timeout%%&b=%%timeout%%", &mapper, &ctx);
        assert_eq!(ctx.timeouts.get(), 2);
    }

    #[test]
    fn test_cache_keyed_by_full_token() {
        let mut mapper = MacroMapper::standard();
        mapper.set_cacheable(keys::TIMEOUT, true);
        let ctx = Counting::default();

        render("%%timeout%%%%timeout_ESC%%%%timeout%%%%timeout_ESC%%", &mapper, &ctx);
        assert_eq!(ctx.timeouts.get(), 2);
    }

    #[test]
    fn test_cache_does_not_survive_render() {
        let mut mapper = MacroMapper::standard();
        mapper.set_cacheable(keys::TIMEOUT, true);
        let ctx = Counting::default();
        let mut processor = MacroProcessor::new(&mapper);

        processor.process(&ctx, "%%timeout%%");
        processor.process(&ctx, "%%timeout%%");
        assert_eq!(ctx.timeouts.get(), 2);
    }

    #[test]
    fn test_custom_and_standard_keys_share_lookup_convention() {
        let mut mapper = MacroMapper::standard();
        mapper.add_custom("channel_id", false);
        let ctx = Counting::default();

        let rendered = render("c=%%channel_id%%&t=%%timeout%%&e=%%channel_id_ESC%%", &mapper, &ctx);
        assert_eq!(rendered, "c=channel_id-value&t=500&e=channel_id-value");
        assert_eq!(ctx.customs.get(), 2);
    }

    #[test]
    fn test_seeded_values_take_priority() {
        let mapper = MacroMapper::standard();
        let mut processor = MacroProcessor::new(&mapper);
        processor.set_macro("%%timeout%%", "42");

        let rendered = processor.process(&Counting::default(), "t=%%timeout%%");
        assert_eq!(rendered, "t=42");
        let rendered = processor.process(&Counting::default(), "t=%%timeout%%");
        assert_eq!(rendered, "t=500");
    }

    #[test]
    fn test_bidder_keys_seed_tokens() {
        let mapper = MacroMapper::default();
        let mut processor = MacroProcessor::new(&mapper);
        let bidder_keys = HashMap::from([("placement".to_owned(), "p-9".to_owned())]);
        processor.set_bidder_keys(&bidder_keys);

        assert_eq!(processor.process(&EmptyMacros, "pl=%%placement%%"), "pl=p-9");
    }

    #[test]
    fn test_process_url_removes_empty_params() {
        let mapper = MacroMapper::standard();
        let mut processor = MacroProcessor::new(&mapper);
        let flags = Flags { remove_empty_params: true };

        let rendered = processor.process_url(
            &Counting::default(),
            "https://ads.test/vast/%%timeout%%?t=%%timeout%%&b=%%bundle%%&fixed=1&u=%%ip%%",
            flags,
        );
        assert_eq!(rendered, "https://ads.test/vast/500?t=500&fixed=1");
    }

    #[test]
    fn test_process_url_without_flag_keeps_params() {
        let mapper = MacroMapper::standard();
        let mut processor = MacroProcessor::new(&mapper);

        let rendered = processor.process_url(
            &Counting::default(),
            "https://ads.test/vast?t=%%timeout%%&b=%%bundle%%",
            Flags::default(),
        );
        assert_eq!(rendered, "https://ads.test/vast?t=500&b=%%bundle%%");
    }

    #[test]
    fn test_process_url_all_params_removed() {
        let mapper = MacroMapper::standard();
        let mut processor = MacroProcessor::new(&mapper);
        let flags = Flags { remove_empty_params: true };

        let rendered = processor.process_url(&EmptyMacros, "https://ads.test/vast?b=%%bundle%%", flags);
        assert_eq!(rendered, "https://ads.test/vast");
    }

    #[test]
    fn test_macro_token() {
        assert_eq!(macro_token("timeout"), "%%timeout%%");
    }
}
