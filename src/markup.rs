//! Escaping policy and rich-content parsing.
//!
//! Backend strings reach the terminal through exactly two doors:
//!
//! - [`plain`] for every free-text field (titles, digests, sources, toast
//!   messages, backend error details). Terminal escape sequences and control
//!   characters are stripped so a scraped headline cannot repaint the screen.
//! - [`rich_to_text`] for `Article::content`, the single field the backend
//!   produces as HTML. It is parsed, flattened to text, and its images are
//!   replaced by slot markers.
//!
//! Render code never prints a backend string any other way.

use crate::models::Article;
use crate::state::ImageTarget;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node, Selector};
use std::borrow::Cow;

static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b(\[[0-?]*[ -/]*[@-~]|\][^\x07\x1b]*(\x07|\x1b\\)|.)").unwrap());

static FIGURE_INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/api/articles/figure/[^/?#]+/(\d+)").unwrap());

static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote",
    "pre", "tr", "figure",
];

/// Make a backend string safe to print on one line.
///
/// Escape sequences are removed, newlines and tabs become spaces, other
/// control characters are dropped.
pub fn plain(s: &str) -> Cow<'_, str> {
    let needs_work = s.chars().any(char::is_control);
    if !needs_work {
        return Cow::Borrowed(s);
    }
    let stripped = ANSI_ESCAPE.replace_all(s, "");
    let cleaned: String = stripped
        .chars()
        .filter_map(|c| match c {
            '\n' | '\r' | '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();
    Cow::Owned(cleaned)
}

/// Extract the 1-based figure index from an image URL.
///
/// ```ignore
/// assert_eq!(figure_index("/api/articles/figure/abc/3"), Some(3));
/// ```
pub fn figure_index(src: &str) -> Option<u32> {
    FIGURE_INDEX
        .captures(src)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .filter(|n| *n > 0)
}

/// An image of the article the user can ask to regenerate.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSlot {
    pub target: ImageTarget,
    pub src: String,
    /// Prompt the backend stored for this image, used to pre-fill the form.
    pub prompt: Option<String>,
}

/// Collect the regenerable images of an article: the cover first, then each
/// distinct inline figure in document order.
///
/// Inline images whose URL carries no figure index are not regenerable and
/// are skipped.
pub fn image_slots(article: &Article) -> Vec<ImageSlot> {
    let mut slots = Vec::new();

    if let Some(cover) = article.cover_url.as_deref().filter(|c| !c.is_empty()) {
        slots.push(ImageSlot {
            target: ImageTarget::Cover,
            src: cover.to_string(),
            prompt: article.cover_prompt.clone().filter(|p| !p.is_empty()),
        });
    }

    let fragment = Html::parse_fragment(&article.content);
    let figures = fragment
        .select(&IMG_SELECTOR)
        .filter_map(|img| img.value().attr("src"))
        .filter_map(|src| figure_index(src).map(|n| (n, src.to_string())))
        .unique_by(|(n, _)| *n)
        .map(|(n, src)| ImageSlot {
            target: ImageTarget::Figure(n),
            src,
            prompt: article.figure_prompt(n).map(str::to_string),
        });
    slots.extend(figures);
    slots
}

/// Flatten article HTML to readable text.
///
/// Block elements start a new line, `<br>` breaks the line, figures become
/// `[插图N]` markers and other images `[图片]`. Text nodes pass through
/// [`plain`].
pub fn rich_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();

    for node in fragment.tree.root().descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(&plain(text)),
            Node::Element(el) => {
                let name = el.name();
                if name == "br" || BLOCK_TAGS.contains(&name) {
                    out.push('\n');
                } else if name == "img" {
                    match el.attr("src").and_then(figure_index) {
                        Some(n) => out.push_str(&format!("[插图{n}]")),
                        None => out.push_str("[图片]"),
                    }
                }
            }
            _ => {}
        }
    }

    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(content: &str) -> Article {
        serde_json::from_value(serde_json::json!({
            "id": "a1",
            "title": "t",
            "content": content,
            "cover_url": "data/images/cover.png",
            "cover_prompt": "城市夜景",
            "figure_prompt_list": ["机器人", "数据图表"]
        }))
        .unwrap()
    }

    #[test]
    fn test_plain_passes_clean_text_borrowed() {
        assert!(matches!(plain("OpenAI 发布新模型"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_plain_strips_escapes_and_controls() {
        assert_eq!(plain("\x1b[31mred\x1b[0m title"), "red title");
        assert_eq!(plain("line1\nline2\tend"), "line1 line2 end");
        assert_eq!(plain("bell\x07!"), "bell!");
        assert_eq!(plain("\x1b]0;pwned\x07ok"), "ok");
    }

    #[test]
    fn test_figure_index() {
        assert_eq!(figure_index("/api/articles/figure/abc-123/2"), Some(2));
        assert_eq!(
            figure_index("http://host/api/articles/figure/a1/10?v=3"),
            Some(10)
        );
        assert_eq!(figure_index("/api/articles/figure/a1/0"), None);
        assert_eq!(figure_index("/api/articles/cover/a1"), None);
        assert_eq!(figure_index("https://cdn.example/x.png"), None);
    }

    #[test]
    fn test_image_slots_cover_then_unique_figures() {
        let content = r#"<p>intro</p>
            <p><img src="/api/articles/figure/a1/2" alt="插图2"></p>
            <p><img src="https://cdn.example/logo.png"></p>
            <p><img src="/api/articles/figure/a1/1"></p>
            <p><img src="/api/articles/figure/a1/2"></p>"#;
        let slots = image_slots(&article(content));

        let targets: Vec<_> = slots.iter().map(|s| s.target).collect();
        assert_eq!(
            targets,
            vec![
                ImageTarget::Cover,
                ImageTarget::Figure(2),
                ImageTarget::Figure(1)
            ]
        );
        assert_eq!(slots[0].prompt.as_deref(), Some("城市夜景"));
        assert_eq!(slots[1].prompt.as_deref(), Some("数据图表"));
        assert_eq!(slots[2].prompt.as_deref(), Some("机器人"));
    }

    #[test]
    fn test_image_slots_without_cover() {
        let mut a = article("<p>no images</p>");
        a.cover_url = None;
        assert!(image_slots(&a).is_empty());
    }

    #[test]
    fn test_rich_to_text_blocks_and_markers() {
        let html = r#"<h2>标题</h2><p>第一段<br>第二行</p>
            <p><img src="/api/articles/figure/a1/1"></p><p><img src="x.png"></p>
            <ul><li>要点一</li><li>要点二</li></ul>"#;
        let text = rich_to_text(html);
        assert_eq!(
            text,
            "标题\n第一段\n第二行\n[插图1]\n[图片]\n要点一\n要点二"
        );
    }

    #[test]
    fn test_rich_to_text_sanitizes_text_nodes() {
        let text = rich_to_text("<p>safe\x1b[2Jtext</p>");
        assert_eq!(text, "safetext");
    }
}
