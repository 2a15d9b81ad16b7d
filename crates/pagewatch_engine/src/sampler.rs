//! Signal samplers: ordered heuristics over a parsed page snapshot.
//!
//! Each heuristic is a plain function from a [`ParsedPage`] to an optional
//! value, so they can be exercised one by one against synthetic markup.

use pagewatch_core::PresenceLabel;
use scraper::{ElementRef, Html, Selector};

use crate::PageSnapshot;

const BELL_SELECTORS: &[&str] = &[
    r#"[data-icon-name="Bell"]"#,
    r#"button[aria-label*="notification"]"#,
    r#"button[aria-label*="Notification"]"#,
];
const BADGE_SELECTOR: &str = r#"[class*="badge"], [class*="counter"]"#;
const UNREAD_SELECTOR: &str =
    r#"[data-tid*="unread"], [aria-label*="unread"], [class*="unread"]"#;
const AVATAR_SELECTOR: &str =
    r#"[data-tid*="me-avatar"], [class*="avatar"], [class*="profile"]"#;
const PRESENCE_PROBES: &[&str] = &[
    r#"[data-tid*="presence-available"]"#,
    r#"[data-tid*="presence-away"]"#,
    r#"[data-tid*="presence-busy"]"#,
    r#"[data-tid*="presence-dnd"]"#,
    r#"[data-tid*="status"]"#,
    r#"[aria-label*="Available"]"#,
    r#"[aria-label*="Away"]"#,
    r#"[aria-label*="Busy"]"#,
    r#"[title*="Available"]"#,
    r#"[title*="Away"]"#,
    r#"[title*="Busy"]"#,
];

pub type CountHeuristic = fn(&ParsedPage<'_>) -> Option<u32>;
pub type PresenceHeuristic = fn(&ParsedPage<'_>) -> Option<PresenceLabel>;

/// A snapshot parsed once and shared by every heuristic of a tick.
pub struct ParsedPage<'a> {
    document: Html,
    title: &'a str,
}

impl<'a> ParsedPage<'a> {
    pub fn parse(snapshot: &'a PageSnapshot) -> Self {
        Self {
            document: Html::parse_document(&snapshot.html),
            title: &snapshot.title,
        }
    }

    pub fn title(&self) -> &str {
        self.title
    }

    /// First element in document order matching `selector`.
    pub fn first(&self, selector: &str) -> Option<ElementRef<'_>> {
        let selector = Selector::parse(selector).ok()?;
        self.document.select(&selector).next()
    }

    /// Number of distinct elements matching `selector`.
    pub fn count(&self, selector: &str) -> usize {
        match Selector::parse(selector) {
            Ok(selector) => self.document.select(&selector).count(),
            Err(_) => 0,
        }
    }
}

/// Unread count: the maximum over every heuristic that produced a number.
pub struct CountSampler {
    heuristics: Vec<CountHeuristic>,
}

impl Default for CountSampler {
    fn default() -> Self {
        Self::with_heuristics(vec![bell_badge_count, unread_element_count, title_count])
    }
}

impl CountSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_heuristics(heuristics: Vec<CountHeuristic>) -> Self {
        Self { heuristics }
    }

    pub fn sample(&self, snapshot: &PageSnapshot) -> u32 {
        let page = ParsedPage::parse(snapshot);
        self.heuristics
            .iter()
            .filter_map(|heuristic| heuristic(&page))
            .max()
            .unwrap_or(0)
    }
}

/// Presence label: the first heuristic with a confident answer wins.
pub struct PresenceSampler {
    heuristics: Vec<PresenceHeuristic>,
}

impl Default for PresenceSampler {
    fn default() -> Self {
        Self::with_heuristics(vec![avatar_presence, probe_presence])
    }
}

impl PresenceSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_heuristics(heuristics: Vec<PresenceHeuristic>) -> Self {
        Self { heuristics }
    }

    pub fn sample(&self, snapshot: &PageSnapshot) -> PresenceLabel {
        let page = ParsedPage::parse(snapshot);
        self.heuristics
            .iter()
            .find_map(|heuristic| heuristic(&page))
            .unwrap_or(PresenceLabel::Unknown)
    }
}

/// Numeric badge inside the notification bell.
pub fn bell_badge_count(page: &ParsedPage<'_>) -> Option<u32> {
    let bell = BELL_SELECTORS
        .iter()
        .find_map(|selector| page.first(selector))?;
    let badge_selector = Selector::parse(BADGE_SELECTOR).ok()?;
    let badge = bell.select(&badge_selector).next()?;
    parse_leading_int(&element_text(badge))
}

/// Number of elements tagged as unread.
pub fn unread_element_count(page: &ParsedPage<'_>) -> Option<u32> {
    u32::try_from(page.count(UNREAD_SELECTOR)).ok()
}

/// `(N)` in the page title.
pub fn title_count(page: &ParsedPage<'_>) -> Option<u32> {
    parenthesized_number(page.title())
}

/// The signed-in user's avatar: its text, or its aria-label when it has none.
pub fn avatar_presence(page: &ParsedPage<'_>) -> Option<PresenceLabel> {
    let avatar = page.first(AVATAR_SELECTOR)?;
    let mut text = element_text(avatar);
    if text.is_empty() {
        text = avatar.value().attr("aria-label").unwrap_or_default().to_string();
    }
    let label = PresenceLabel::infer(&text);
    label.is_confident().then_some(label)
}

/// Presence-specific test ids, aria-labels and titles, in priority order.
pub fn probe_presence(page: &ParsedPage<'_>) -> Option<PresenceLabel> {
    PRESENCE_PROBES.iter().find_map(|selector| {
        let element = page.first(selector)?;
        let label = PresenceLabel::infer(&describe(element));
        label.is_confident().then_some(label)
    })
}

/// `<title>` text of raw markup, if any.
pub(crate) fn document_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|title| !title.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text content, else aria-label, else title.
fn describe(element: ElementRef<'_>) -> String {
    let text = element_text(element);
    if !text.is_empty() {
        return text;
    }
    let value = element.value();
    value
        .attr("aria-label")
        .filter(|label| !label.is_empty())
        .or_else(|| value.attr("title"))
        .unwrap_or_default()
        .to_string()
}

fn parse_leading_int(text: &str) -> Option<u32> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn parenthesized_number(text: &str) -> Option<u32> {
    text.match_indices('(').find_map(|(idx, _)| {
        let rest = text.get(idx + 1..)?;
        let inner = rest.get(..rest.find(')')?)?;
        if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()) {
            inner.parse().ok()
        } else {
            None
        }
    })
}
