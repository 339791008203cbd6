//! Turns the free-text water-quality analysis into labelled sections.
//!
//! The model is asked for a fixed set of `LABEL:` headers but is free to
//! wrap them in markdown, number them, or append a parenthetical. Parsing
//! therefore happens in two passes: strip markdown, then scan once for every
//! known header and slice the text between consecutive matches. Each section
//! is handed to the extraction strategy registered for it in [`SECTIONS`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    OverallAssessment,
    EpaViolations,
    AreasOfConcern,
    DetectedContaminants,
    FilterRecommendations,
    RecommendedActions,
    AssistancePrograms,
    Disclaimer,
    RegulatoryCitations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    FreeText,
    /// `•`/`-`/`*` lines; with `labelled`, `Label: text` lines count too.
    Bullets { labelled: bool },
    Numbered,
    BulletsOrNumbered,
    ContaminantRecords,
    FilterArrows,
}

pub struct SectionRule {
    pub section: Section,
    pub label: &'static str,
    pub strategy: Strategy,
}

/// Known headers in report order. Adding a section means adding a row here
/// and a field on [`ParsedAnalysis`].
pub const SECTIONS: &[SectionRule] = &[
    SectionRule { section: Section::OverallAssessment, label: "OVERALL ASSESSMENT", strategy: Strategy::FreeText },
    SectionRule { section: Section::EpaViolations, label: "EPA VIOLATIONS", strategy: Strategy::Bullets { labelled: false } },
    SectionRule { section: Section::AreasOfConcern, label: "AREAS OF CONCERN", strategy: Strategy::Bullets { labelled: true } },
    SectionRule { section: Section::DetectedContaminants, label: "DETECTED CONTAMINANTS", strategy: Strategy::ContaminantRecords },
    SectionRule { section: Section::FilterRecommendations, label: "FILTER RECOMMENDATIONS", strategy: Strategy::FilterArrows },
    SectionRule { section: Section::RecommendedActions, label: "RECOMMENDED ACTIONS", strategy: Strategy::Numbered },
    SectionRule { section: Section::AssistancePrograms, label: "ASSISTANCE PROGRAMS", strategy: Strategy::BulletsOrNumbered },
    SectionRule { section: Section::Disclaimer, label: "DISCLAIMER", strategy: Strategy::FreeText },
    SectionRule { section: Section::RegulatoryCitations, label: "REGULATORY CITATIONS", strategy: Strategy::BulletsOrNumbered },
];

impl Section {
    pub fn from_label(label: &str) -> Option<Self> {
        SECTIONS
            .iter()
            .find(|rule| rule.label.eq_ignore_ascii_case(label.trim()))
            .map(|rule| rule.section)
    }

    pub fn rule(self) -> &'static SectionRule {
        // every variant has exactly one row
        SECTIONS.iter().find(|rule| rule.section == self).unwrap_or(&SECTIONS[0])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    #[default]
    Medium,
    Low,
    Informational,
}

impl Severity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Some(Self::High),
            "MEDIUM" => Some(Self::Medium),
            "LOW" => Some(Self::Low),
            "INFORMATIONAL" => Some(Self::Informational),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contaminant {
    pub name: String,
    pub detected_value: Option<String>,
    pub limit: Option<String>,
    pub health_effects: Option<String>,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRecommendation {
    pub contaminant: String,
    pub filter_type: String,
    pub description: Option<String>,
    pub cost: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityStatus {
    Poor,
    Fair,
    Good,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAnalysis {
    pub overall_assessment: Option<String>,
    pub epa_violations: Vec<String>,
    pub areas_of_concern: Vec<String>,
    pub detected_contaminants: Vec<Contaminant>,
    pub filter_recommendations: Vec<FilterRecommendation>,
    pub recommended_actions: Vec<String>,
    pub assistance_programs: Vec<String>,
    pub disclaimer: Option<String>,
    pub regulatory_citations: Vec<String>,
    /// Markdown-stripped input.
    pub raw_text: String,
}

impl ParsedAnalysis {
    fn is_empty(&self) -> bool {
        self.overall_assessment.is_none()
            && self.epa_violations.is_empty()
            && self.areas_of_concern.is_empty()
            && self.detected_contaminants.is_empty()
            && self.filter_recommendations.is_empty()
            && self.recommended_actions.is_empty()
            && self.assistance_programs.is_empty()
            && self.disclaimer.is_none()
            && self.regulatory_citations.is_empty()
    }

    /// Headline for the report: any violation is poor, concerns or a
    /// high-severity contaminant are fair.
    pub fn quality_status(&self) -> QualityStatus {
        if !self.epa_violations.is_empty() {
            QualityStatus::Poor
        } else if !self.areas_of_concern.is_empty()
            || self.detected_contaminants.iter().any(|c| c.severity == Severity::High)
        {
            QualityStatus::Fair
        } else {
            QualityStatus::Good
        }
    }

    fn apply(&mut self, section: Section, body: &str) {
        let strategy = section.rule().strategy;
        match section {
            Section::OverallAssessment => self.overall_assessment = free_text(body),
            Section::Disclaimer => self.disclaimer = free_text(body),
            Section::EpaViolations => self.epa_violations = list_items(body, strategy),
            Section::AreasOfConcern => self.areas_of_concern = list_items(body, strategy),
            Section::RecommendedActions => self.recommended_actions = list_items(body, strategy),
            Section::AssistancePrograms => self.assistance_programs = list_items(body, strategy),
            Section::RegulatoryCitations => self.regulatory_citations = list_items(body, strategy),
            Section::DetectedContaminants => self.detected_contaminants = contaminant_records(body),
            Section::FilterRecommendations => self.filter_recommendations = filter_arrows(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", rename_all = "camelCase")]
pub enum ParseOutcome {
    Structured(ParsedAnalysis),
    /// Nothing recognisable; show the original text verbatim.
    #[serde(rename_all = "camelCase")]
    Unstructured { raw_text: String },
}

impl ParseOutcome {
    pub fn structured(&self) -> Option<&ParsedAnalysis> {
        match self {
            Self::Structured(parsed) => Some(parsed),
            Self::Unstructured { .. } => None,
        }
    }

    pub fn raw_text(&self) -> &str {
        match self {
            Self::Structured(parsed) => &parsed.raw_text,
            Self::Unstructured { raw_text } => raw_text,
        }
    }
}

fn rx(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern is valid")
}

/// (pattern, replacement) applied in order.
static MARKDOWN_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        // fence markers only; the model sometimes fences the whole answer
        (rx(r"(?m)^[ \t]*```[^\n]*$"), ""),
        (rx(r"(?m)^([ \t]*)[*+][ \t]+"), "${1}- "),
        (rx(r"!\[[^\]\n]*\]\([^)\n]*\)"), ""),
        (rx(r"\[([^\]\n]+)\]\([^)\n]*\)"), "$1"),
        (rx(r"\*\*([^\n]+?)\*\*"), "$1"),
        (rx(r"__([^\n]+?)__"), "$1"),
        (rx(r"\*([^*\n]+)\*"), "$1"),
        (rx(r"(^|[^\w])_([^_\n]+)_([^\w]|$)"), "$1$2$3"),
        (rx(r"~~([^\n]+?)~~"), "$1"),
        (rx(r"`([^`\n]+)`"), "$1"),
        (rx(r"(?m)^[ \t]*#{1,6}[ \t]*"), ""),
        (rx(r"</?[A-Za-z!][^<>\n]*>"), ""),
        (rx(r"\*"), ""),
    ]
});

static SECTION_HEADER: Lazy<Regex> = Lazy::new(|| {
    let labels: Vec<&str> = SECTIONS.iter().map(|rule| rule.label).collect();
    rx(&format!(
        r"(?im)^[ \t]*(\d+[.)][ \t]*)?({})(?:[ \t]*\([^)\n]*\)|[ \t]+[-–][^:\n]*)?[ \t]*(?::|$)",
        labels.join("|")
    ))
});

static BULLET: Lazy<Regex> = Lazy::new(|| rx(r"^[•\-–—][ \t]*(.*)$"));
static NUMBERED: Lazy<Regex> = Lazy::new(|| rx(r"^\d+(?:[.)][ \t]+|[ \t]*[-–—][ \t]+)(.*)$"));
static LABELLED: Lazy<Regex> = Lazy::new(|| rx(r"^[^:]{1,80}:[ \t]*\S"));
static RECORD_SEPARATOR: Lazy<Regex> = Lazy::new(|| rx(r"(?m)^[ \t]*-{3,}[ \t]*$"));
static RECORD_START: Lazy<Regex> = Lazy::new(|| rx(r"(?im)^[ \t]*(?:- )?CONTAMINANT:"));
static RECORD_NAME: Lazy<Regex> = Lazy::new(|| rx(r"(?im)^[ \t]*(?:- )?CONTAMINANT:[ \t]*(.+)$"));
static RECORD_DETECTED: Lazy<Regex> =
    Lazy::new(|| rx(r"(?im)^[ \t]*(?:- )?DETECTED(?:[ \t]+(?:LEVEL|VALUE|AMOUNT))?:[ \t]*(.+)$"));
// `EPA LIMIT:`, `EPA LEGAL LIMIT (MCL):`, `ACTION LEVEL:`, `MCL:` ...
static RECORD_LIMIT: Lazy<Regex> = Lazy::new(|| {
    rx(r"(?im)^[ \t]*(?:- )?(?:(?:EPA|REGULATORY)[ \t]+)?(?:LEGAL[ \t]+)?(?:LIMIT|ACTION LEVEL|MCL)(?:[ \t]*\([^)\n]*\))?:[ \t]*(.+)$")
});
static RECORD_HEALTH: Lazy<Regex> =
    Lazy::new(|| rx(r"(?im)^[ \t]*(?:- )?HEALTH[ \t]+(?:EFFECTS|RISKS)(?:[ \t]*\([^)\n]*\))?:[ \t]*"));
// Any record field label; ends a multi-line health-effects value.
static RECORD_FIELD: Lazy<Regex> = Lazy::new(|| {
    rx(r"(?im)^[ \t]*(?:- )?(?:SEVERITY|CONTAMINANT|DETECTED|EPA|REGULATORY|LEGAL|ACTION LEVEL|LIMIT|MCL|HEALTH)\b[^:\n]*:")
});
static RECORD_SEVERITY: Lazy<Regex> = Lazy::new(|| rx(r"(?i)SEVERITY:[ \t]*(HIGH|MEDIUM|LOW|INFORMATIONAL)\b"));
static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| rx(r"\n[ \t]*\n"));
static ARROW: Lazy<Regex> = Lazy::new(|| rx(r"^(.+?)[ \t]*(?:->|→|>=|=>)[ \t]*(.+)$"));
static COST: Lazy<Regex> = Lazy::new(|| rx(r"(?i)^(?:estimated[ \t]+)?cost:[ \t]*(.+)$"));

/// Removes markdown emphasis, headers, links, images, code, strike-through
/// and HTML tags. `*`/`+` bullets become `-` bullets so list structure
/// survives.
pub fn strip_markdown(text: &str) -> String {
    let mut out = text.replace("\r\n", "\n");
    for (pattern, replacement) in MARKDOWN_RULES.iter() {
        out = pattern.replace_all(&out, *replacement).into_owned();
    }
    out
}

/// Parses a water analysis. Never fails: input without any recognised
/// section comes back as [`ParseOutcome::Unstructured`].
pub fn parse_analysis(text: &str) -> ParseOutcome {
    let clean = strip_markdown(text);

    let headers: Vec<(Section, usize, usize)> = SECTION_HEADER
        .captures_iter(&clean)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let label = caps.get(2)?.as_str();
            // `2. Assistance programs: apply ...` is a list item, not a header
            if caps.get(1).is_some() && !is_shouted(label) && !line_is_blank(&clean[whole.end()..]) {
                return None;
            }
            let section = Section::from_label(label)?;
            Some((section, whole.start(), whole.end()))
        })
        .collect();

    let mut parsed = ParsedAnalysis::default();
    let mut seen: Vec<Section> = Vec::with_capacity(headers.len());
    for (i, &(section, _, body_start)) in headers.iter().enumerate() {
        if seen.contains(&section) {
            continue;
        }
        seen.push(section);
        let body_end = headers.get(i + 1).map_or(clean.len(), |next| next.1);
        parsed.apply(section, &clean[body_start..body_end]);
    }

    if parsed.is_empty() {
        debug!("No labelled sections found in {} chars of analysis", text.len());
        return ParseOutcome::Unstructured { raw_text: text.to_string() };
    }
    debug!(
        "Parsed analysis: {} sections, {} contaminants, {} actions",
        seen.len(),
        parsed.detected_contaminants.len(),
        parsed.recommended_actions.len()
    );
    parsed.raw_text = clean;
    ParseOutcome::Structured(parsed)
}

fn is_shouted(label: &str) -> bool {
    !label.chars().any(|c| c.is_ascii_lowercase())
}

fn line_is_blank(rest: &str) -> bool {
    rest.lines().next().map_or(true, |line| line.trim().is_empty())
}

fn free_text(body: &str) -> Option<String> {
    let text = body.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn is_placeholder(item: &str) -> bool {
    matches!(item.trim_end_matches('.').to_ascii_lowercase().as_str(), "none" | "n/a" | "none found" | "none detected")
}

fn list_items(body: &str, strategy: Strategy) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| list_item(line, strategy))
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty() && !is_placeholder(item))
        .collect()
}

fn list_item(line: &str, strategy: Strategy) -> Option<&str> {
    let bullet = || BULLET.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str());
    let numbered = || NUMBERED.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str());
    match strategy {
        Strategy::Bullets { labelled } => bullet().or_else(|| (labelled && LABELLED.is_match(line)).then_some(line)),
        Strategy::Numbered => numbered(),
        Strategy::BulletsOrNumbered => numbered().or_else(bullet),
        Strategy::FreeText | Strategy::ContaminantRecords | Strategy::FilterArrows => None,
    }
}

fn captured(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn contaminant_records(body: &str) -> Vec<Contaminant> {
    RECORD_SEPARATOR
        .split(body)
        .flat_map(|chunk| {
            let starts: Vec<usize> = RECORD_START.find_iter(chunk).map(|m| m.start()).collect();
            let ends = starts.iter().skip(1).copied().chain(std::iter::once(chunk.len()));
            starts.iter().zip(ends).map(|(&s, e)| &chunk[s..e]).collect::<Vec<_>>()
        })
        .filter_map(contaminant)
        .collect()
}

fn contaminant(record: &str) -> Option<Contaminant> {
    let name = captured(&RECORD_NAME, record)?;
    let health_effects = RECORD_HEALTH.find(record).and_then(|m| {
        let rest = &record[m.end()..];
        let end = RECORD_FIELD.find(rest).map_or(rest.len(), |next| next.start());
        let joined = rest[..end].split_whitespace().collect::<Vec<_>>().join(" ");
        (!joined.is_empty()).then_some(joined)
    });
    let severity = captured(&RECORD_SEVERITY, record)
        .and_then(|s| Severity::parse(&s))
        .unwrap_or_default();
    Some(Contaminant {
        name,
        detected_value: captured(&RECORD_DETECTED, record),
        limit: captured(&RECORD_LIMIT, record),
        health_effects,
        severity,
    })
}

fn filter_arrows(body: &str) -> Vec<FilterRecommendation> {
    PARAGRAPH_BREAK.split(body).filter_map(filter_recommendation).collect()
}

fn filter_recommendation(paragraph: &str) -> Option<FilterRecommendation> {
    let mut lines = paragraph.lines().map(str::trim).filter(|l| !l.is_empty());
    let (contaminant, filter_type) = lines.by_ref().find_map(|line| {
        let line = BULLET.captures(line).and_then(|c| c.get(1)).map_or(line, |m| m.as_str());
        let caps = ARROW.captures(line)?;
        Some((caps[1].trim().to_string(), caps[2].trim().to_string()))
    })?;

    let mut description = None;
    let mut cost = None;
    for line in lines {
        if let Some(value) = captured(&COST, line) {
            cost.get_or_insert(value);
        } else if description.is_none() {
            description = Some(line.to_string());
        }
    }
    Some(FilterRecommendation { contaminant, filter_type, description, cost })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FIXTURE: &str = "\
## **OVERALL ASSESSMENT:**
Your water has two contaminants above federal limits.

**EPA VIOLATIONS:**
• Lead exceeds the EPA action level
- Nitrate exceeds the MCL
* Total coliform detected

AREAS OF CONCERN:
Hardness: elevated but not a health risk

DETECTED CONTAMINANTS:
CONTAMINANT: Lead
DETECTED: 22 ppb
EPA LIMIT: 15 ppb (action level)
HEALTH EFFECTS: Developmental delays in children,
kidney problems in adults
SEVERITY: HIGH
---
CONTAMINANT: Nitrate
DETECTED: 12 mg/L
EPA LIMIT: 10 mg/L
HEALTH EFFECTS: Blue baby syndrome
SEVERITY: medium

FILTER RECOMMENDATIONS:
Lead -> Reverse osmosis system
Removes 94-98% of lead at the tap
Cost: $200-$400

Nitrate → Ion exchange filter
Cost: $150

RECOMMENDED ACTIONS:
1. Stop drinking unfiltered tap water
2) Contact your water utility
3 - Retest in 30 days

ASSISTANCE PROGRAMS:
- State lead service line replacement fund

DISCLAIMER:
This is not a certified laboratory interpretation.
";

    fn structured(text: &str) -> ParsedAnalysis {
        match parse_analysis(text) {
            ParseOutcome::Structured(parsed) => parsed,
            other => panic!("expected structured outcome, got {other:?}"),
        }
    }

    #[test]
    fn fixture_parses_into_every_section() {
        let parsed = structured(FIXTURE);
        assert_eq!(
            parsed.overall_assessment.as_deref(),
            Some("Your water has two contaminants above federal limits.")
        );
        assert_eq!(
            parsed.epa_violations,
            vec!["Lead exceeds the EPA action level", "Nitrate exceeds the MCL", "Total coliform detected"]
        );
        assert_eq!(parsed.areas_of_concern, vec!["Hardness: elevated but not a health risk"]);
        assert_eq!(
            parsed.recommended_actions,
            vec!["Stop drinking unfiltered tap water", "Contact your water utility", "Retest in 30 days"]
        );
        assert_eq!(parsed.assistance_programs, vec!["State lead service line replacement fund"]);
        assert_eq!(parsed.disclaimer.as_deref(), Some("This is not a certified laboratory interpretation."));
        assert_eq!(parsed.quality_status(), QualityStatus::Poor);
    }

    #[test]
    fn contaminant_records_carry_every_field() {
        let parsed = structured(FIXTURE);
        assert_eq!(parsed.detected_contaminants.len(), 2);
        let lead = &parsed.detected_contaminants[0];
        assert_eq!(lead.name, "Lead");
        assert_eq!(lead.detected_value.as_deref(), Some("22 ppb"));
        assert_eq!(lead.limit.as_deref(), Some("15 ppb (action level)"));
        assert_eq!(
            lead.health_effects.as_deref(),
            Some("Developmental delays in children, kidney problems in adults")
        );
        assert_eq!(lead.severity, Severity::High);
        assert_eq!(parsed.detected_contaminants[1].severity, Severity::Medium);
    }

    #[test]
    fn filter_recommendations_accept_both_arrows() {
        let parsed = structured(FIXTURE);
        assert_eq!(
            parsed.filter_recommendations,
            vec![
                FilterRecommendation {
                    contaminant: "Lead".into(),
                    filter_type: "Reverse osmosis system".into(),
                    description: Some("Removes 94-98% of lead at the tap".into()),
                    cost: Some("$200-$400".into()),
                },
                FilterRecommendation {
                    contaminant: "Nitrate".into(),
                    filter_type: "Ion exchange filter".into(),
                    description: None,
                    cost: Some("$150".into()),
                },
            ]
        );
    }

    #[test]
    fn unlabelled_text_is_unstructured() {
        let text = "The water looks fine overall. Nothing stood out in the report.";
        assert_eq!(parse_analysis(text), ParseOutcome::Unstructured { raw_text: text.to_string() });
    }

    #[test]
    fn headers_without_content_are_unstructured() {
        let outcome = parse_analysis("EPA VIOLATIONS:\n\nRECOMMENDED ACTIONS:\nCall someone.\n");
        assert!(outcome.structured().is_none());
    }

    #[test]
    fn records_split_on_markers_without_separators() {
        let parsed = structured(
            "DETECTED CONTAMINANTS (if any):\nCONTAMINANT: Arsenic\nDETECTED: 4 ppb\nCONTAMINANT: Copper\nSEVERITY: LOW\n",
        );
        let names: Vec<_> = parsed.detected_contaminants.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Arsenic", "Copper"]);
        assert_eq!(parsed.detected_contaminants[0].severity, Severity::Medium);
        assert_eq!(parsed.detected_contaminants[1].severity, Severity::Low);
    }

    #[test]
    fn records_without_a_name_are_dropped() {
        let parsed = structured("OVERALL ASSESSMENT: ok\nDETECTED CONTAMINANTS:\nDETECTED: 3 ppb\nSEVERITY: HIGH\n");
        assert!(parsed.detected_contaminants.is_empty());
    }

    #[test]
    fn first_occurrence_of_a_header_wins() {
        let parsed = structured("OVERALL ASSESSMENT: first\n\nOVERALL ASSESSMENT: second\n");
        assert_eq!(parsed.overall_assessment.as_deref(), Some("first"));
    }

    #[test]
    fn numbered_and_parenthesised_headers_are_recognised() {
        let parsed = structured("1. Overall Assessment (summary):\nMostly clean.\n2) EPA VIOLATIONS\n- None\n");
        assert_eq!(parsed.overall_assessment.as_deref(), Some("Mostly clean."));
        assert!(parsed.epa_violations.is_empty());
        assert_eq!(parsed.quality_status(), QualityStatus::Good);
    }

    #[test]
    fn citations_accept_bullets_and_numbers() {
        let parsed = structured("REGULATORY CITATIONS:\n1. 40 CFR 141.80\n- Cal. Health & Safety Code 116275\n");
        assert_eq!(parsed.regulatory_citations, vec!["40 CFR 141.80", "Cal. Health & Safety Code 116275"]);
    }

    #[test]
    fn markdown_is_stripped() {
        assert_eq!(
            strip_markdown("# Title\n**bold** and _it_ with [link](http://x) ![img](a.png) `code` ~~gone~~ <b>tag</b>"),
            "Title\nbold and it with link  code gone tag"
        );
        assert_eq!(strip_markdown("* one\n* two"), "- one\n- two");
        assert_eq!(strip_markdown("MCL_value stays"), "MCL_value stays");
        assert_eq!(strip_markdown("Lead -> RO"), "Lead -> RO");
    }

    #[test]
    fn fenced_answers_still_parse() {
        let parsed = structured("```\nOVERALL ASSESSMENT: Safe to drink.\n```");
        assert_eq!(parsed.overall_assessment.as_deref(), Some("Safe to drink."));
    }

    #[test]
    fn arbitrary_input_never_panics() {
        for text in ["", "\n\n", "→→→", "CONTAMINANT:", "DISCLAIMER:", "• ", "1.", "--- \n---", "é ü ✓ 💧 OVERALL ASSESSMENT:"] {
            let _ = parse_analysis(text);
        }
    }

    const UTILITY_REPORT: &str = "
OVERALL ASSESSMENT:
Your water quality shows concerning levels of several contaminants that exceed EPA health guidelines.

EPA VIOLATIONS:
• No current violations of Maximum Contaminant Levels (MCLs)
• However, 3 contaminants exceed EPA Maximum Contaminant Level Goals (MCLGs)

DETECTED CONTAMINANTS:

CONTAMINANT: Lead
DETECTED: 12 parts per billion (ppb)
EPA LEGAL LIMIT (MCL): 15 ppb (Action Level)
EPA HEALTH GOAL (MCLG): 0 ppb
HEALTH RISKS: Developmental delays in children, learning difficulties, kidney damage, high blood pressure in adults. No safe level for children.
SEVERITY: Concerning
---

CONTAMINANT: Arsenic
DETECTED: 8 ppb
EPA LEGAL LIMIT (MCL): 10 ppb
EPA HEALTH GOAL (MCLG): 0 ppb
HEALTH RISKS: Increased cancer risk (bladder, lung, skin), cardiovascular disease, diabetes. Long-term exposure is cumulative.
SEVERITY: Concerning
---

CONTAMINANT: PFAS (PFOA + PFOS combined)
DETECTED: 6 parts per trillion (ppt)
EPA LEGAL LIMIT (MCL): 4 ppt (2024 final rule)
EPA HEALTH GOAL (MCLG): 0 ppt
HEALTH RISKS: Liver damage, thyroid disease, decreased fertility, increased cancer risk, reduced immune response in children
SEVERITY: Above Legal Limit
---

CONTAMINANT: Total Trihalomethanes (TTHMs)
DETECTED: 65 ppb
EPA LEGAL LIMIT (MCL): 80 ppb
EPA HEALTH GOAL (MCLG): 0 ppb (for some THMs)
HEALTH RISKS: Increased cancer risk with long-term exposure, liver and kidney effects
SEVERITY: Safe (within legal limits but above health goal)

FILTER RECOMMENDATIONS:
• Reverse Osmosis (RO) System - Removes 95-99% of arsenic, lead, and PFAS. NSF/ANSI Standard 58. Cost: $200-$500

DISCLAIMER:
This analysis is based on publicly available water quality reports.
";

    #[test]
    fn utility_report_labels_fill_every_contaminant_field() {
        let parsed = structured(UTILITY_REPORT);
        let rows: Vec<_> = parsed
            .detected_contaminants
            .iter()
            .map(|c| (c.name.as_str(), c.detected_value.as_deref(), c.limit.as_deref(), c.severity))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Lead", Some("12 parts per billion (ppb)"), Some("15 ppb (Action Level)"), Severity::Medium),
                ("Arsenic", Some("8 ppb"), Some("10 ppb"), Severity::Medium),
                ("PFAS (PFOA + PFOS combined)", Some("6 parts per trillion (ppt)"), Some("4 ppt (2024 final rule)"), Severity::Medium),
                ("Total Trihalomethanes (TTHMs)", Some("65 ppb"), Some("80 ppb"), Severity::Medium),
            ]
        );
        assert_eq!(
            parsed.detected_contaminants[0].health_effects.as_deref(),
            Some("Developmental delays in children, learning difficulties, kidney damage, high blood pressure in adults. No safe level for children.")
        );
        assert_eq!(
            parsed.detected_contaminants[3].health_effects.as_deref(),
            Some("Increased cancer risk with long-term exposure, liver and kidney effects")
        );
        assert_eq!(parsed.epa_violations.len(), 2);
        assert!(parsed.filter_recommendations.is_empty());
        assert!(parsed.disclaimer.is_some());
    }

    #[test]
    fn numbered_item_starting_with_a_label_stays_in_its_list() {
        let parsed = structured("RECOMMENDED ACTIONS:\n1. Flush pipes\n2. Assistance programs: apply for LIHWAP\n3. Retest\n");
        assert_eq!(
            parsed.recommended_actions,
            vec!["Flush pipes", "Assistance programs: apply for LIHWAP", "Retest"]
        );
        assert!(parsed.assistance_programs.is_empty());

        // shouted labels and bare labels still open a section
        let parsed = structured("RECOMMENDED ACTIONS:\n1. Flush pipes\n2. ASSISTANCE PROGRAMS: LIHWAP grants\n");
        assert_eq!(parsed.recommended_actions, vec!["Flush pipes"]);
    }

    #[test]
    fn greater_equal_counts_as_an_arrow() {
        let parsed = structured("FILTER RECOMMENDATIONS:\nArsenic >= Reverse osmosis\nCost: $300\n");
        assert_eq!(parsed.filter_recommendations[0].contaminant, "Arsenic");
        assert_eq!(parsed.filter_recommendations[0].filter_type, "Reverse osmosis");
        assert_eq!(parsed.filter_recommendations[0].cost.as_deref(), Some("$300"));
    }
}
