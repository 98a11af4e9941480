mod cascade;
mod cleanup;
mod debug;
mod error;
mod html;
mod property;
mod rule;
mod specificity;

pub use cascade::{
    DomMatcher, SelectorError, SelectorMatcher, inline_properties_on_element, inline_styles,
};
pub use error::InklineError;
pub use property::{
    Property, build_declaration_string, parse_declaration, parse_declarations,
    split_into_declarations,
};
pub use rule::Rule;
pub use specificity::Specificity;

// the tree handle callers need for the element-level entry points
pub use kuchiki::NodeRef;

use cascade::apply_rules;
use debug::DebugLogger;
use kuchiki::traits::TendrilSink;
use std::sync::Arc;

/// Serialization of the converted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain HTML via the tree library's serializer, as newsletters expect.
    Html,
    /// Minimal XML serialization with self-closing childless elements.
    Xhtml,
}

/// CSS-to-inline-styles converter.
///
/// Moves every stylesheet rule that applies to an element into that
/// element's `style` attribute, resolving the cascade (specificity, source
/// order, `!important`, pre-existing inline styles) along the way. Built for
/// email rendering, where `<style>` blocks are unreliable.
///
/// One `Inkline` is reusable across documents; each conversion is fully
/// independent (no caches, no shared state).
pub struct Inkline {
    cleanup: bool,
    use_inline_styles_block: bool,
    strip_original_style_tags: bool,
    exclude_media_queries: bool,
    debug: Option<Arc<DebugLogger>>,
}

#[derive(Clone)]
pub struct InklineBuilder {
    cleanup: bool,
    use_inline_styles_block: bool,
    strip_original_style_tags: bool,
    exclude_media_queries: bool,
    debug_path: Option<std::path::PathBuf>,
}

impl InklineBuilder {
    pub fn new() -> Self {
        Self {
            cleanup: false,
            use_inline_styles_block: true,
            strip_original_style_tags: false,
            exclude_media_queries: false,
            debug_path: None,
        }
    }

    /// Strip `class` and `id` attributes from the output.
    pub fn cleanup(mut self, enabled: bool) -> Self {
        self.cleanup = enabled;
        self
    }

    /// Fold `<style>` tag content into the effective stylesheet. On by
    /// default.
    pub fn use_inline_styles_block(mut self, enabled: bool) -> Self {
        self.use_inline_styles_block = enabled;
        self
    }

    /// Remove the original `<style>` tags after their rules are inlined.
    pub fn strip_original_style_tags(mut self, enabled: bool) -> Self {
        self.strip_original_style_tags = enabled;
        self
    }

    /// Keep `@media` blocks out of the output entirely. Media queries are
    /// never inlined either way; without this flag a stripped `<style>` tag
    /// whose text contains `@media` blocks survives holding that text.
    pub fn exclude_media_queries(mut self, enabled: bool) -> Self {
        self.exclude_media_queries = enabled;
        self
    }

    /// Write a JSON-lines trace of rule matching and cascade decisions.
    pub fn debug_log(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<Inkline, InklineError> {
        let debug = if let Some(path) = self.debug_path {
            Some(Arc::new(DebugLogger::new(path)?))
        } else {
            None
        };
        Ok(Inkline {
            cleanup: self.cleanup,
            use_inline_styles_block: self.use_inline_styles_block,
            strip_original_style_tags: self.strip_original_style_tags,
            exclude_media_queries: self.exclude_media_queries,
            debug,
        })
    }
}

impl Default for InklineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Inkline {
    /// Converter with default options.
    pub fn new() -> Self {
        Inkline {
            cleanup: false,
            use_inline_styles_block: true,
            strip_original_style_tags: false,
            exclude_media_queries: false,
            debug: None,
        }
    }

    pub fn builder() -> InklineBuilder {
        InklineBuilder::new()
    }

    /// Inline `css` (plus any `<style>` tag content) into `html` and return
    /// the serialized document.
    ///
    /// Style-tag CSS is concatenated before the explicit `css` argument, so
    /// on equal specificity the caller's stylesheet wins the source-order
    /// tie-break. Invalid selectors and malformed declarations degrade to
    /// skipped rules/declarations; only absent HTML is an error.
    pub fn convert(&self, html: &str, css: Option<&str>) -> Result<String, InklineError> {
        self.convert_with_format(html, css, OutputFormat::Html)
    }

    pub fn convert_with_format(
        &self,
        html: &str,
        css: Option<&str>,
        format: OutputFormat,
    ) -> Result<String, InklineError> {
        if html.trim().is_empty() {
            return Err(InklineError::NoHtmlProvided);
        }

        let document = kuchiki::parse_html().one(html);

        let mut stylesheet = String::new();
        if self.use_inline_styles_block {
            stylesheet.push_str(&html::collect_style_tag_css(&document));
        }
        if let Some(css) = css {
            stylesheet.push_str(css);
        }

        let cleaned = cleanup::clean(&stylesheet);
        let rules = rule::rules_from_css(&cleaned);

        let debug = self.debug.as_deref();
        if let Some(logger) = debug {
            logger.rules_parsed(rules.len());
        }

        apply_rules(&document, &rules, &DomMatcher, debug);

        if self.cleanup {
            html::remove_class_and_id_attributes(&document);
        }
        if self.strip_original_style_tags {
            html::strip_style_tags(&document, self.exclude_media_queries);
        }

        if let Some(logger) = debug {
            logger.finish();
        }

        Ok(match format {
            OutputFormat::Html => document.to_string(),
            OutputFormat::Xhtml => html::serialize_xhtml(&document),
        })
    }
}

impl Default for Inkline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inlines_rules_from_explicit_css() {
        let inkline = Inkline::new();
        let output = inkline
            .convert(
                "<html><body><p>hello</p></body></html>",
                Some("p { color: red; }"),
            )
            .expect("convert");
        assert!(
            output.contains(r#"<p style="color: red;">hello</p>"#),
            "{output}"
        );
    }

    #[test]
    fn empty_html_is_a_fatal_error() {
        let inkline = Inkline::new();
        assert!(matches!(
            inkline.convert("", None),
            Err(InklineError::NoHtmlProvided)
        ));
        assert!(matches!(
            inkline.convert("   \n ", Some("p { color: red; }")),
            Err(InklineError::NoHtmlProvided)
        ));
    }

    #[test]
    fn style_tag_rules_apply_by_default() {
        let inkline = Inkline::new();
        let output = inkline
            .convert(
                "<html><head><style>p { margin: 0; }</style></head>\
                 <body><p>hi</p></body></html>",
                None,
            )
            .expect("convert");
        assert!(output.contains(r#"<p style="margin: 0;">hi</p>"#), "{output}");
        assert!(output.contains("<style>"), "style tags stay by default: {output}");
    }

    #[test]
    fn style_tag_rules_can_be_ignored() {
        let inkline = Inkline::builder()
            .use_inline_styles_block(false)
            .build()
            .expect("build");
        let output = inkline
            .convert(
                "<html><head><style>p { margin: 0; }</style></head>\
                 <body><p>hi</p></body></html>",
                None,
            )
            .expect("convert");
        assert!(!output.contains("style=\""), "{output}");
    }

    #[test]
    fn explicit_css_wins_source_order_ties_against_style_tags() {
        let inkline = Inkline::new();
        let output = inkline
            .convert(
                "<html><head><style>p { color: red; }</style></head>\
                 <body><p>hi</p></body></html>",
                Some("p { color: blue; }"),
            )
            .expect("convert");
        assert!(output.contains(r#"style="color: blue;""#), "{output}");
    }

    #[test]
    fn html_comment_wrapped_style_blocks_are_honored() {
        let inkline = Inkline::new();
        let output = inkline
            .convert(
                "<html><head><style><!-- p { color: red; } --></style></head>\
                 <body><p>hi</p></body></html>",
                None,
            )
            .expect("convert");
        assert!(output.contains(r#"style="color: red;""#), "{output}");
    }

    #[test]
    fn cleanup_strips_class_and_id_attributes() {
        let inkline = Inkline::builder().cleanup(true).build().expect("build");
        let output = inkline
            .convert(
                r#"<html><body><p class="x" id="y">hi</p></body></html>"#,
                Some(".x { color: red; }"),
            )
            .expect("convert");
        assert!(!output.contains("class="), "{output}");
        assert!(!output.contains("id="), "{output}");
        assert!(output.contains(r#"style="color: red;""#), "{output}");
    }

    #[test]
    fn strip_option_removes_style_tags() {
        let inkline = Inkline::builder()
            .strip_original_style_tags(true)
            .build()
            .expect("build");
        let output = inkline
            .convert(
                "<html><head><style>p { margin: 0; }</style></head>\
                 <body><p>hi</p></body></html>",
                None,
            )
            .expect("convert");
        assert!(!output.contains("<style>"), "{output}");
        assert!(output.contains(r#"style="margin: 0;""#), "{output}");
    }

    #[test]
    fn strip_with_media_exclusion_keeps_only_media_text() {
        let inkline = Inkline::builder()
            .strip_original_style_tags(true)
            .exclude_media_queries(true)
            .build()
            .expect("build");
        let output = inkline
            .convert(
                "<html><head><style>p { margin: 0; } \
                 @media print { p { margin: 1cm; } }</style></head>\
                 <body><p>hi</p></body></html>",
                None,
            )
            .expect("convert");
        assert!(
            output.contains("<style>@media print { p { margin: 1cm; } }</style>"),
            "{output}"
        );
        assert!(output.contains(r#"style="margin: 0;""#), "{output}");
    }

    #[test]
    fn media_only_stylesheet_changes_nothing() {
        let inkline = Inkline::builder()
            .exclude_media_queries(true)
            .build()
            .expect("build");
        let output = inkline
            .convert(
                r#"<html><body><p class="x">hi</p></body></html>"#,
                Some("@media (max-width: 600px) { .x { display: none; } }"),
            )
            .expect("convert");
        assert!(!output.contains("style=\""), "{output}");
    }

    #[test]
    fn second_pass_with_no_css_is_identity() {
        let inkline = Inkline::new();
        let first = inkline
            .convert(
                r#"<html><body><a class="x" id="y">go</a></body></html>"#,
                Some("a { color: red } .x { color: blue } #y { color: green }"),
            )
            .expect("first pass");
        let second = inkline.convert(&first, None).expect("second pass");
        assert_eq!(first, second);
    }

    #[test]
    fn xhtml_output_self_closes_void_elements() {
        let inkline = Inkline::new();
        let output = inkline
            .convert_with_format(
                "<!DOCTYPE html><html><body><p>a<br>b</p></body></html>",
                Some("p { color: red; }"),
                OutputFormat::Xhtml,
            )
            .expect("convert");
        assert!(output.contains("<br />"), "{output}");
        assert!(!output.contains("<?xml"), "{output}");
        assert!(output.contains(r#"<p style="color: red;">"#), "{output}");
    }

    #[test]
    fn full_cascade_example_resolves_to_the_id_rule() {
        let inkline = Inkline::new();
        let output = inkline
            .convert(
                r#"<html><body><a class="x" id="y">go</a></body></html>"#,
                Some("a { color: red } .x { color: blue } #y { color: green }"),
            )
            .expect("convert");
        assert!(output.contains(r#"style="color: green;""#), "{output}");
    }
}
