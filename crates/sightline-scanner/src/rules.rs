//! Built-in WCAG rule engine.
//!
//! Static checks over a parsed document. Each check either produces a
//! violation with affected nodes, an `incomplete` entry when the answer
//! needs manual review, or a pass outcome when it ran clean. Rule ids and
//! severity classes follow the axe-core vocabulary so report consumers
//! can link findings to existing documentation.

use crate::error::{Result, ScanError};
use scraper::{ElementRef, Html, Selector};
use sightline_core::{Impact, RuleOutcome, RuleRun, Violation, ViolationNode};

const HELP_BASE: &str = "https://dequeuniversity.com/rules/axe/4.8";

/// Outer-HTML snippets in violation nodes are truncated to about this
/// many characters.
const SNIPPET_MAX: usize = 200;

/// Evaluates accessibility rules over a document.
///
/// Evaluation is pure CPU work over an in-memory parse tree, so the
/// trait is synchronous. It exists so the orchestrator can run against
/// stub engines in tests.
pub trait RuleEngine: Send + Sync {
    /// Run every rule over the document and categorize the outcomes.
    fn evaluate(&self, html: &str) -> Result<RuleRun>;
}

/// The bundled rule set.
#[derive(Debug, Default)]
pub struct BuiltinRules;

impl BuiltinRules {
    /// Create the built-in rule set.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RuleEngine for BuiltinRules {
    fn evaluate(&self, html: &str) -> Result<RuleRun> {
        let document = Html::parse_document(html);
        let mut run = RuleRun::default();

        check_image_alt(&document, &mut run)?;
        check_html_lang(&document, &mut run)?;
        check_document_title(&document, &mut run)?;
        check_labels(&document, &mut run)?;
        check_link_names(&document, &mut run)?;
        check_button_names(&document, &mut run)?;
        check_frame_titles(&document, &mut run)?;
        check_meta_viewport(&document, &mut run)?;
        check_heading_order(&document, &mut run)?;
        check_color_contrast(&document, &mut run)?;

        tracing::debug!(
            "Rule run complete: {} violations, {} passes, {} incomplete",
            run.violations.len(),
            run.passes.len(),
            run.incomplete.len()
        );
        Ok(run)
    }
}

fn sel(source: &str) -> Result<Selector> {
    Selector::parse(source)
        .map_err(|e| ScanError::RuleEngine(format!("invalid selector '{source}': {e}")))
}

fn node_for(element: ElementRef<'_>) -> ViolationNode {
    ViolationNode {
        selector: css_path(element),
        html: snippet(element),
    }
}

fn violation(
    rule_id: &str,
    description: &str,
    impact: Impact,
    tags: &[&str],
    nodes: Vec<ViolationNode>,
) -> Violation {
    Violation {
        rule_id: rule_id.to_string(),
        description: description.to_string(),
        help_url: format!("{HELP_BASE}/{rule_id}"),
        impact: Some(impact),
        tags: tags.iter().map(ToString::to_string).collect(),
        nodes,
    }
}

fn record(
    run: &mut RuleRun,
    rule_id: &str,
    description: &str,
    pass_description: &str,
    impact: Impact,
    tags: &[&str],
    nodes: Vec<ViolationNode>,
) {
    if nodes.is_empty() {
        run.passes.push(RuleOutcome {
            rule_id: rule_id.to_string(),
            description: pass_description.to_string(),
        });
    } else {
        run.violations
            .push(violation(rule_id, description, impact, tags, nodes));
    }
}

fn attr_non_empty(element: ElementRef<'_>, name: &str) -> bool {
    element
        .value()
        .attr(name)
        .is_some_and(|v| !v.trim().is_empty())
}

fn visible_text_empty(element: ElementRef<'_>) -> bool {
    element.text().all(|t| t.trim().is_empty())
}

/// `<img>` elements must carry a non-empty `alt` attribute. `alt=""`
/// marks a decorative image and is acceptable only when explicit.
fn check_image_alt(document: &Html, run: &mut RuleRun) -> Result<()> {
    let images = sel("img")?;
    let nodes: Vec<ViolationNode> = document
        .select(&images)
        .filter(|img| img.value().attr("alt").is_none())
        .map(node_for)
        .collect();

    record(
        run,
        "image-alt",
        "Images must have alternate text",
        "All images carry alternate text",
        Impact::Critical,
        &["wcag2a", "wcag111"],
        nodes,
    );
    Ok(())
}

fn check_html_lang(document: &Html, run: &mut RuleRun) -> Result<()> {
    let html = sel("html")?;
    let nodes: Vec<ViolationNode> = document
        .select(&html)
        .filter(|el| !attr_non_empty(*el, "lang"))
        .map(node_for)
        .collect();

    record(
        run,
        "html-has-lang",
        "The <html> element must have a lang attribute",
        "Document language is declared",
        Impact::Serious,
        &["wcag2a", "wcag311"],
        nodes,
    );
    Ok(())
}

fn check_document_title(document: &Html, run: &mut RuleRun) -> Result<()> {
    let title = sel("head > title")?;
    let has_title = document
        .select(&title)
        .any(|el| !visible_text_empty(el));

    let nodes = if has_title {
        Vec::new()
    } else {
        let html = sel("html")?;
        document.select(&html).map(node_for).collect()
    };

    record(
        run,
        "document-title",
        "Documents must have a non-empty <title>",
        "Document has a title",
        Impact::Serious,
        &["wcag2a", "wcag242"],
        nodes,
    );
    Ok(())
}

/// Form inputs need an accessible name: a `<label for>` pointing at them,
/// a wrapping `<label>`, or an ARIA/title attribute.
fn check_labels(document: &Html, run: &mut RuleRun) -> Result<()> {
    let inputs = sel("input, select, textarea")?;
    let labels = sel("label")?;

    let labeled_ids: Vec<String> = document
        .select(&labels)
        .filter_map(|label| label.value().attr("for").map(str::to_string))
        .collect();

    let mut nodes = Vec::new();
    for input in document.select(&inputs) {
        let input_type = input.value().attr("type").unwrap_or("text");
        if matches!(input_type, "hidden" | "submit" | "button" | "reset" | "image") {
            continue;
        }
        if attr_non_empty(input, "aria-label")
            || attr_non_empty(input, "aria-labelledby")
            || attr_non_empty(input, "title")
        {
            continue;
        }
        if input
            .value()
            .attr("id")
            .is_some_and(|id| labeled_ids.iter().any(|l| l == id))
        {
            continue;
        }
        let wrapped = std::iter::successors(input.parent(), |node| node.parent())
            .filter_map(ElementRef::wrap)
            .any(|ancestor| ancestor.value().name() == "label");
        if wrapped {
            continue;
        }
        nodes.push(node_for(input));
    }

    record(
        run,
        "label",
        "Form elements must have labels",
        "All form elements are labeled",
        Impact::Critical,
        &["wcag2a", "wcag412"],
        nodes,
    );
    Ok(())
}

fn check_link_names(document: &Html, run: &mut RuleRun) -> Result<()> {
    let links = sel("a[href]")?;
    let named_images = sel("img[alt]")?;

    let mut nodes = Vec::new();
    for link in document.select(&links) {
        if !visible_text_empty(link)
            || attr_non_empty(link, "aria-label")
            || attr_non_empty(link, "aria-labelledby")
            || attr_non_empty(link, "title")
        {
            continue;
        }
        let has_named_image = link
            .select(&named_images)
            .any(|img| attr_non_empty(img, "alt"));
        if has_named_image {
            continue;
        }
        nodes.push(node_for(link));
    }

    record(
        run,
        "link-name",
        "Links must have discernible text",
        "All links have discernible text",
        Impact::Serious,
        &["wcag2a", "wcag244"],
        nodes,
    );
    Ok(())
}

fn check_button_names(document: &Html, run: &mut RuleRun) -> Result<()> {
    let buttons = sel("button")?;
    let nodes: Vec<ViolationNode> = document
        .select(&buttons)
        .filter(|button| {
            visible_text_empty(*button)
                && !attr_non_empty(*button, "aria-label")
                && !attr_non_empty(*button, "aria-labelledby")
                && !attr_non_empty(*button, "title")
        })
        .map(node_for)
        .collect();

    record(
        run,
        "button-name",
        "Buttons must have discernible text",
        "All buttons have discernible text",
        Impact::Critical,
        &["wcag2a", "wcag412"],
        nodes,
    );
    Ok(())
}

fn check_frame_titles(document: &Html, run: &mut RuleRun) -> Result<()> {
    let frames = sel("iframe")?;
    let nodes: Vec<ViolationNode> = document
        .select(&frames)
        .filter(|frame| !attr_non_empty(*frame, "title"))
        .map(node_for)
        .collect();

    record(
        run,
        "frame-title",
        "Frames must have a title attribute",
        "All frames are titled",
        Impact::Serious,
        &["wcag2a", "wcag412"],
        nodes,
    );
    Ok(())
}

/// `user-scalable=no` (and a maximum-scale below 2) disables pinch zoom.
fn check_meta_viewport(document: &Html, run: &mut RuleRun) -> Result<()> {
    let viewports = sel(r#"meta[name="viewport"]"#)?;
    let nodes: Vec<ViolationNode> = document
        .select(&viewports)
        .filter(|meta| {
            meta.value()
                .attr("content")
                .is_some_and(viewport_blocks_zoom)
        })
        .map(node_for)
        .collect();

    record(
        run,
        "meta-viewport",
        "Zooming and scaling must not be disabled",
        "Zooming and scaling are not disabled",
        Impact::Critical,
        &["wcag2aa", "wcag144"],
        nodes,
    );
    Ok(())
}

fn viewport_blocks_zoom(content: &str) -> bool {
    content
        .split([',', ';'])
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((key.trim().to_ascii_lowercase(), value.trim().to_ascii_lowercase()))
        })
        .any(|(key, value)| match key.as_str() {
            "user-scalable" => value == "no" || value == "0",
            "maximum-scale" => value.parse::<f64>().is_ok_and(|scale| scale < 2.0),
            _ => false,
        })
}

/// Heading levels must not skip: an `<h3>` directly after an `<h1>` with
/// no intervening `<h2>` is flagged.
fn check_heading_order(document: &Html, run: &mut RuleRun) -> Result<()> {
    let headings = sel("h1, h2, h3, h4, h5, h6")?;

    let mut nodes = Vec::new();
    let mut previous_level: Option<u8> = None;
    for heading in document.select(&headings) {
        let level = match heading.value().name() {
            "h1" => 1,
            "h2" => 2,
            "h3" => 3,
            "h4" => 4,
            "h5" => 5,
            _ => 6,
        };
        if let Some(prev) = previous_level {
            if level > prev + 1 {
                nodes.push(node_for(heading));
            }
        }
        previous_level = Some(level);
    }

    record(
        run,
        "heading-order",
        "Heading levels should only increase by one",
        "Heading levels increase by at most one",
        Impact::Moderate,
        &["best-practice"],
        nodes,
    );
    Ok(())
}

/// Contrast ratios cannot be computed from markup alone; elements that
/// set inline colors are surfaced for manual review instead of being
/// judged.
fn check_color_contrast(document: &Html, run: &mut RuleRun) -> Result<()> {
    let styled = sel(r#"[style*="color"]"#)?;
    let nodes: Vec<ViolationNode> = document.select(&styled).map(node_for).collect();

    if nodes.is_empty() {
        run.passes.push(RuleOutcome {
            rule_id: "color-contrast".to_string(),
            description: "No inline color declarations to review".to_string(),
        });
    } else {
        run.incomplete.push(violation(
            "color-contrast",
            "Elements with inline colors need a manual contrast review",
            Impact::Serious,
            &["wcag2aa", "wcag143"],
            nodes,
        ));
    }
    Ok(())
}

/// Build a CSS selector path for an element, root first.
///
/// An `id` anywhere on the path short-circuits it; otherwise each segment
/// uses `:nth-of-type` so the path stays unambiguous.
fn css_path(element: ElementRef<'_>) -> String {
    let mut segments = Vec::new();
    let mut current = Some(element);

    while let Some(el) = current {
        let name = el.value().name();
        if name == "html" {
            segments.push("html".to_string());
            break;
        }
        if let Some(id) = el.value().id() {
            segments.push(format!("{name}#{id}"));
            break;
        }

        let position = el
            .prev_siblings()
            .filter_map(ElementRef::wrap)
            .filter(|sibling| sibling.value().name() == name)
            .count()
            + 1;
        segments.push(format!("{name}:nth-of-type({position})"));

        current = el.parent().and_then(ElementRef::wrap);
    }

    segments.reverse();
    segments.join(" > ")
}

fn snippet(element: ElementRef<'_>) -> String {
    let outer = element.html();
    if outer.len() <= SNIPPET_MAX {
        return outer;
    }
    let cut = outer
        .char_indices()
        .take_while(|(i, _)| *i < SNIPPET_MAX)
        .last()
        .map_or(0, |(i, c)| i + c.len_utf8());
    format!("{}…", &outer[..cut])
}
