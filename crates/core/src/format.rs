//! Section and step formatting rules.
//!
//! Each row carries a `SECTION` label such as `"2. Wire Prep"` and a `STEPS`
//! text such as `"S1 (Strip Wire) Strip the wire 2 inches"`. Rows whose
//! section label does not parse reuse the last section seen, so the state is
//! threaded through the rows as a [`FormatState`] value.

use crate::types::Placeholder;
use regex::Regex;
use std::sync::LazyLock;

/// Section label: leading number, a period, then the title.
static SECTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\s*(.+)").unwrap());

/// Step number at the very start of the steps text (`S12`).
static STEP_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^S(\d+)").unwrap());

/// First parenthesized group, captured without the parentheses.
static STEP_TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((.*?)\)").unwrap());

/// Leading step number token with its trailing whitespace.
static STEP_PREFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^S\d+\s*").unwrap());

/// Parenthesized group with its trailing whitespace.
static STEP_TITLE_STRIP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*?\)\s*").unwrap());

/// Step number used when the steps text has no `S<digits>` prefix.
pub const DEFAULT_STEP_NUMBER: &str = "X";

/// Separator line between the heading and the step title.
pub const SECTION_RULE: &str = "-----------------------------------";

/// Outcome of parsing a section label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionMatch {
    Matched { number: String, title: String },
    Unmatched,
}

/// Parse a section label like `"3. Crimping"` into number and title.
pub fn extract_section(section_text: &str) -> SectionMatch {
    match SECTION_REGEX.captures(section_text) {
        Some(caps) => SectionMatch::Matched {
            number: caps[1].to_string(),
            title: caps[2].to_string(),
        },
        None => SectionMatch::Unmatched,
    }
}

/// Digits of a leading `S<digits>` token, if present.
pub fn match_step_number(steps_text: &str) -> Option<&str> {
    STEP_NUMBER_REGEX
        .captures(steps_text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Step number of a steps text, or [`DEFAULT_STEP_NUMBER`].
pub fn extract_step_number(steps_text: &str) -> String {
    match_step_number(steps_text)
        .unwrap_or(DEFAULT_STEP_NUMBER)
        .to_string()
}

/// Step title: the first parenthesized group, uppercased.
///
/// Without a parenthesized group the first whitespace-delimited token is
/// returned as-is, case untouched.
pub fn extract_step_title(steps_text: &str) -> String {
    match STEP_TITLE_REGEX.captures(steps_text) {
        Some(caps) => caps[1].to_uppercase(),
        None => steps_text
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Instruction part of a steps text: the step number and the first
/// parenthesized title are removed and the rest is trimmed.
pub fn format_steps(steps_text: &str) -> String {
    let without_number = STEP_PREFIX_REGEX.replace(steps_text, "");
    let without_title = STEP_TITLE_STRIP_REGEX.replacen(&without_number, 1, "");
    without_title.trim().to_string()
}

/// Section number and title resolved for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSection {
    pub number: String,
    pub title: String,
    /// False when the values came from the carried state.
    pub matched: bool,
}

/// Last successfully parsed section, carried from row to row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatState {
    last_number: Option<String>,
    last_title: Option<String>,
}

impl FormatState {
    /// Start with no section seen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of the last matched section.
    pub fn last_number(&self) -> Option<&str> {
        self.last_number.as_deref()
    }

    /// Title of the last matched section.
    pub fn last_title(&self) -> Option<&str> {
        self.last_title.as_deref()
    }

    /// Resolve a section label, falling back to the carried values when it
    /// does not parse. A parsed label replaces the carried values.
    pub fn resolve_section(self, section_text: &str) -> (ResolvedSection, FormatState) {
        match extract_section(section_text) {
            SectionMatch::Matched { number, title } => {
                let state = FormatState {
                    last_number: Some(number.clone()),
                    last_title: Some(title.clone()),
                };
                let resolved = ResolvedSection {
                    number,
                    title,
                    matched: true,
                };
                (resolved, state)
            }
            SectionMatch::Unmatched => {
                if self.last_number.is_none() {
                    log::warn!(
                        "Section '{}' does not parse and no earlier section to fall back on",
                        section_text
                    );
                }
                let resolved = ResolvedSection {
                    number: self.last_number.clone().unwrap_or_default(),
                    title: self.last_title.clone().unwrap_or_default(),
                    matched: false,
                };
                (resolved, self)
            }
        }
    }

    /// Render the `{SECTION TITLE}` block:
    ///
    /// ```text
    /// SECTION 1 - STEP 2
    /// -----------------------------------
    /// STRIP WIRE
    /// ```
    pub fn format_section_title(
        self,
        section_text: &str,
        steps_text: &str,
    ) -> (String, FormatState) {
        let (section, state) = self.resolve_section(section_text);
        (render_section_title(&section, steps_text), state)
    }

    /// Render the `{HEAD}` line: `(WIRE PREP) SEC 2 STEP 1`.
    pub fn format_head(self, section_text: &str, steps_text: &str) -> (String, FormatState) {
        let (section, state) = self.resolve_section(section_text);
        (render_head(&section, steps_text), state)
    }

    /// Render every placeholder value for one row, resolving the section once.
    pub fn format_row(self, section_text: &str, steps_text: &str) -> (RowText, FormatState) {
        let (section, state) = self.resolve_section(section_text);
        let text = RowText {
            section_title: render_section_title(&section, steps_text),
            head: render_head(&section, steps_text),
            steps: format_steps(steps_text),
        };
        (text, state)
    }
}

fn render_section_title(section: &ResolvedSection, steps_text: &str) -> String {
    format!(
        "SECTION {} - STEP {}\n{}\n{}",
        section.number,
        extract_step_number(steps_text),
        SECTION_RULE,
        extract_step_title(steps_text)
    )
}

fn render_head(section: &ResolvedSection, steps_text: &str) -> String {
    format!(
        "({}) SEC {} STEP {}",
        section.title.to_uppercase(),
        section.number,
        extract_step_number(steps_text)
    )
}

/// Placeholder values computed for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowText {
    pub section_title: String,
    pub head: String,
    pub steps: String,
}

impl RowText {
    /// Value substituted for a placeholder.
    pub fn value(&self, placeholder: Placeholder) -> &str {
        match placeholder {
            Placeholder::SectionTitle => &self.section_title,
            Placeholder::Head => &self.head,
            Placeholder::Steps => &self.steps,
        }
    }

    /// Substitute the first placeholder kind found in `text`.
    ///
    /// Returns `None` when `text` holds no placeholder. Text around the token
    /// is kept.
    pub fn substitute(&self, text: &str) -> Option<(Placeholder, String)> {
        Placeholder::ALL
            .into_iter()
            .find(|p| text.contains(p.token()))
            .map(|p| (p, text.replace(p.token(), self.value(p))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_section() {
        assert_eq!(
            extract_section("2. Wire Prep"),
            SectionMatch::Matched {
                number: "2".into(),
                title: "Wire Prep".into()
            }
        );
        assert_eq!(
            extract_section("12.Crimping"),
            SectionMatch::Matched {
                number: "12".into(),
                title: "Crimping".into()
            }
        );
        assert_eq!(extract_section("invalid text"), SectionMatch::Unmatched);
        assert_eq!(extract_section(". No Number"), SectionMatch::Unmatched);
        assert_eq!(extract_section("3."), SectionMatch::Unmatched);
    }

    #[test]
    fn test_section_title_stops_at_line_end() {
        assert_eq!(
            extract_section("4. Testing\nextra"),
            SectionMatch::Matched {
                number: "4".into(),
                title: "Testing".into()
            }
        );
    }

    #[test]
    fn test_extract_step_number() {
        assert_eq!(extract_step_number("S1 (Cut) Cut"), "1");
        assert_eq!(extract_step_number("S12"), "12");
        assert_eq!(extract_step_number("Step 1"), "X");
        assert_eq!(extract_step_number(" S1 leading space"), "X");
        assert_eq!(extract_step_number(""), "X");
        assert_eq!(match_step_number("s3 lowercase"), None);
    }

    #[test]
    fn test_extract_step_title() {
        assert_eq!(
            extract_step_title("S2 (Strip Wire) Strip the wire 2 inches"),
            "STRIP WIRE"
        );
        assert_eq!(extract_step_title("S1 (a) then (b)"), "A");
        assert_eq!(extract_step_title(""), "");
    }

    // Characterization: the fallback keeps the token's case while the
    // parenthesized title is uppercased.
    #[test]
    fn test_extract_step_title_fallback_keeps_case() {
        assert_eq!(extract_step_title("S5 plain text no parens"), "S5");
        assert_eq!(extract_step_title("plain text no parens"), "plain");
    }

    #[test]
    fn test_format_steps() {
        assert_eq!(
            format_steps("S1 (Cutting 6 AWG Wires)  Cut the 6 AWG Green wire to 4.5 inches"),
            "Cut the 6 AWG Green wire to 4.5 inches"
        );
        assert_eq!(format_steps("  Just do it  "), "Just do it");
        assert_eq!(format_steps("S3"), "");
    }

    #[test]
    fn test_format_steps_removes_only_first_group() {
        assert_eq!(
            format_steps("S4 (Crimp) Crimp the lug (use the 6 AWG die) firmly"),
            "Crimp the lug (use the 6 AWG die) firmly"
        );
    }

    #[test]
    fn test_format_section_title() {
        let (text, _) = FormatState::new().format_section_title(
            "1. Service Box Setup",
            "S2 (Strip Wire) Strip the wire 2 inches",
        );
        assert_eq!(
            text,
            "SECTION 1 - STEP 2\n-----------------------------------\nSTRIP WIRE"
        );
    }

    #[test]
    fn test_format_head() {
        let (text, _) = FormatState::new().format_head("2. Wire Prep", "S1 (Cut) Cut it");
        assert_eq!(text, "(WIRE PREP) SEC 2 STEP 1");
    }

    #[test]
    fn test_state_updates_on_match() {
        let (section, state) = FormatState::new().resolve_section("3. Crimping");
        assert!(section.matched);
        assert_eq!(section.number, "3");
        assert_eq!(section.title, "Crimping");
        assert_eq!(state.last_number(), Some("3"));
        assert_eq!(state.last_title(), Some("Crimping"));

        let (head, _) = state.format_head("3. Crimping", "S1 x");
        assert_eq!(head, "(CRIMPING) SEC 3 STEP 1");
    }

    #[test]
    fn test_fallback_uses_carried_section() {
        let (_, state) = FormatState::new().resolve_section("3. Crimping");
        let (section, state) = state.resolve_section("invalid text");
        assert!(!section.matched);
        assert_eq!(section.number, "3");
        assert_eq!(section.title, "Crimping");
        assert_eq!(state.last_number(), Some("3"));

        let (head, _) = state.format_head("", "S7 (Seat) Seat the lug");
        assert_eq!(head, "(CRIMPING) SEC 3 STEP 7");
    }

    #[test]
    fn test_later_match_replaces_state() {
        let state = FormatState::new();
        let (_, state) = state.resolve_section("5. Finish");
        let (_, state) = state.resolve_section("2. Back Again");
        assert_eq!(state.last_number(), Some("2"));
        assert_eq!(state.last_title(), Some("Back Again"));
    }

    #[test]
    fn test_fallback_without_prior_match_is_empty() {
        let (text, state) = FormatState::new().format_head("continued", "S1 x");
        assert_eq!(text, "() SEC  STEP 1");
        assert_eq!(state, FormatState::new());
    }

    #[test]
    fn test_format_row() {
        let (row, state) = FormatState::new().format_row(
            "1. Service Box Setup",
            "S1 (Cutting 6 AWG Wires)  Cut the 6 AWG Green wire to 4.5 inches",
        );
        assert_eq!(
            row.section_title,
            "SECTION 1 - STEP 1\n-----------------------------------\nCUTTING 6 AWG WIRES"
        );
        assert_eq!(row.head, "(SERVICE BOX SETUP) SEC 1 STEP 1");
        assert_eq!(row.steps, "Cut the 6 AWG Green wire to 4.5 inches");
        assert_eq!(state.last_number(), Some("1"));
    }

    #[test]
    fn test_substitute_keeps_surrounding_text() {
        let (row, _) = FormatState::new().format_row("2. Wire Prep", "S3 (Cut) Cut it");
        assert_eq!(
            row.substitute("Step: {STEPS}!"),
            Some((Placeholder::Steps, "Step: Cut it!".to_string()))
        );
        assert_eq!(row.substitute("no tokens here"), None);
    }

    #[test]
    fn test_substitute_priority() {
        let (row, _) = FormatState::new().format_row("2. Wire Prep", "S3 (Cut) Cut it");
        let (placeholder, text) = row.substitute("{HEAD} {STEPS}").unwrap();
        assert_eq!(placeholder, Placeholder::Head);
        assert_eq!(text, "(WIRE PREP) SEC 2 STEP 3 {STEPS}");
    }
}
