use serde::{Deserialize, Serialize};
use url::Url;

/// One entry of the fallback link search.
///
/// In the config file:
///
/// ```toml
/// link_selectors = [
///     { css = "a[href$='.pdf']" },
///     { tag = "a", text = "PDF" },
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkSelector {
    /// First `tag` element whose text contains `text`, case-insensitively
    Text { tag: String, text: String },
    /// First element matching a CSS selector
    Css { css: String },
}

impl LinkSelector {
    pub fn css(css: &str) -> Self {
        LinkSelector::Css {
            css: css.to_string(),
        }
    }

    pub fn text(tag: &str, text: &str) -> Self {
        LinkSelector::Text {
            tag: tag.to_string(),
            text: text.to_string(),
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::css("a[href$='.pdf']"),
            Self::text("a", "PDF"),
            Self::text("a", "Download PDF"),
            Self::text("button", "PDF"),
            Self::css("i.fa-file-pdf"),
            Self::css(".pdf-link"),
        ]
    }
}

/// What the in-page search reports: the page's base URI and, per selector in
/// order, the raw `href` it found (or null).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchHits {
    pub base: String,
    pub hits: Vec<Option<String>>,
}

/// Builds the in-page script for the fallback link search and picks the
/// winning link from its result.
pub struct LinkFinder {
    selectors: Vec<LinkSelector>,
}

impl LinkFinder {
    pub fn new(selectors: Vec<LinkSelector>) -> Self {
        Self { selectors }
    }

    /// JavaScript evaluating to a [`SearchHits`] object.
    ///
    /// Elements without an `href` of their own (icons, buttons) report their
    /// closest enclosing link.
    pub fn search_script(&self) -> String {
        let selectors =
            serde_json::to_string(&self.selectors).unwrap_or_else(|_| "[]".to_string());

        format!(
            r#"
            (() => {{
                const selectors = {selectors};

                const hrefOf = (el) => {{
                    if (!el) return null;
                    const own = el.getAttribute('href');
                    if (own) return own;
                    const anchor = el.closest('a[href]');
                    return anchor ? anchor.getAttribute('href') : null;
                }};

                const hits = selectors.map((sel) => {{
                    try {{
                        if (sel.css) {{
                            return hrefOf(document.querySelector(sel.css));
                        }}
                        const needle = sel.text.toLowerCase();
                        const el = Array.from(document.querySelectorAll(sel.tag))
                            .find(e => (e.innerText || e.textContent || '').toLowerCase().includes(needle));
                        return hrefOf(el);
                    }} catch (e) {{
                        return null;
                    }}
                }});

                return {{ base: document.baseURI, hits }};
            }})()
            "#
        )
    }

    /// First hit, in selector order, that resolves to an absolute http(s)
    /// URL against the page base.
    pub fn pick(&self, found: &SearchHits) -> Option<String> {
        let base = Url::parse(&found.base).ok();

        found.hits.iter().flatten().find_map(|raw| {
            let url = match &base {
                Some(base) => base.join(raw).ok()?,
                None => Url::parse(raw).ok()?,
            };
            matches!(url.scheme(), "http" | "https").then(|| url.to_string())
        })
    }
}
