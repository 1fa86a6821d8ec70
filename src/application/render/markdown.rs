use comrak::{markdown_to_html, options::Options};

/// CommonMark with raw HTML pass-through, autolinks and smart punctuation,
/// plus the GFM table and strikethrough extensions.
pub(crate) fn default_options() -> Options<'static> {
    let mut options = Options::default();

    let ext = &mut options.extension;
    ext.autolink = true;
    ext.table = true;
    ext.strikethrough = true;
    ext.tagfilter = false;

    options.parse.smart = true;
    options.render.r#unsafe = true;

    options
}

pub(crate) fn render_body(markdown: &str, options: &Options<'static>) -> String {
    markdown_to_html(markdown, options)
}
