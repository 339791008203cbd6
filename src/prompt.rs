//! Prompt Builder.
//!
//! Pure string composition: identical input always produces identical output,
//! and nothing here touches the network or validates input.

use std::fmt::Write;

use crate::{
    encoder::PDF_MIME,
    models::{ActionSlot, AttachedDocument, DocumentKind, EscalationLevel, FormInput},
    regulations::{issue_label, recipient_label, Regulation},
};

/// Which fixed system prompt a request uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    EmailGeneration,
    DocumentAnalysis(DocumentKind),
    RegulationVerification,
    CodeLookup,
}

const EMAIL_SYSTEM_PROMPT: &str = "You are an experienced tenant and community health advocate who drafts clear, \
factual, persuasive emails on behalf of residents facing home health and safety problems such as mold, water \
contamination, lead, pests and ventilation failures. You cite relevant codes and regulations accurately, never \
invent facts, keep a tone appropriate to the requested escalation level, and always end with a specific, \
time-bound request. Output only the body of the email, starting with the salutation.";

const VERIFICATION_SYSTEM_PROMPT: &str = "You are a meticulous regulatory researcher. You verify housing, \
environmental and public health regulations for a given jurisdiction, distinguish federal, state and local \
requirements, flag anything that may be outdated, and state your confidence for each citation.";

const CODE_LOOKUP_SYSTEM_PROMPT: &str = "You are an expert in building codes, housing regulations, and \
environmental health standards. You have comprehensive knowledge of federal, state, and local regulations.";

pub fn system_prompt(task: TaskKind) -> &'static str {
    match task {
        TaskKind::EmailGeneration => EMAIL_SYSTEM_PROMPT,
        TaskKind::DocumentAnalysis(kind) => kind.descriptor().system_prompt,
        TaskKind::RegulationVerification => VERIFICATION_SYSTEM_PROMPT,
        TaskKind::CodeLookup => CODE_LOOKUP_SYSTEM_PROMPT,
    }
}

/// Per-document-type prompts and the slot the result lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentDescriptor {
    pub kind: DocumentKind,
    pub label: &'static str,
    pub system_prompt: &'static str,
    pub analysis_prompt: &'static str,
    pub slot: ActionSlot,
}

const WATER_ANALYSIS_PROMPT: &str = "Analyze the attached drinking water quality report against EPA National \
Primary and Secondary Drinking Water Regulations. Use plain text with no markdown and exactly these section \
labels, each on its own line:

OVERALL ASSESSMENT:
A short paragraph summarizing overall water safety.

EPA VIOLATIONS:
- One bullet per contaminant exceeding an enforceable MCL (write \"- None\" if there are none)

AREAS OF CONCERN:
- One bullet per contaminant below the MCL but above the health goal (MCLG) or otherwise notable

DETECTED CONTAMINANTS:
For each detected contaminant write a record separated by a line containing only ---
CONTAMINANT: name
DETECTED: measured value with unit
EPA LIMIT: MCL or action level with unit
HEALTH EFFECTS: one or two sentences
SEVERITY: HIGH, MEDIUM, LOW or INFORMATIONAL

FILTER RECOMMENDATIONS:
One paragraph per recommendation, separated by a blank line, starting with a line in the form
contaminant -> filter type
followed by a one line description and a line starting with Cost:

RECOMMENDED ACTIONS:
1. Numbered, concrete next steps

ASSISTANCE PROGRAMS:
- Programs that help with testing, filters or remediation

DISCLAIMER:
One sentence noting this is not a certified laboratory interpretation.";

const WARRANTY_ANALYSIS_PROMPT: &str = "Analyze the attached warranty document. Identify the product and \
warrantor, coverage period, what is covered and excluded, the claim procedure and deadlines, any implied \
warranty rights under the Magnuson-Moss Warranty Act or state law that cannot be waived, and practical next \
steps for filing a claim. Format the output clearly with headings and bullet points.";

const LEASE_ANALYSIS_PROMPT: &str = "Analyze the attached lease agreement. Extract key terms (dates, rent, \
deposit, fees, renewal notice), tenant and landlord maintenance and repair duties, entry and notice rules, \
termination and rent-increase clauses, and utilities. Flag red flags such as waived tenant rights or unusual \
fees, and recommend questions to ask and state-specific tenant protections. Format with headings and bullet \
points.";

const INSPECTION_ANALYSIS_PROMPT: &str = "Analyze the attached home inspection report. Group findings into \
critical safety hazards, major issues needing prompt attention, and minor issues. Give rough repair cost \
ranges, call out health concerns (lead, asbestos, radon, mold, water quality), items worth negotiating, \
further specialist inspections needed, and insurance or warranty implications. Format with clear priority \
levels.";

const INSURANCE_ANALYSIS_PROMPT: &str = "Analyze the attached homeowners or renters insurance policy. Summarize \
coverage types, limits, deductibles and premium; list covered perils and key exclusions (flood, earthquake, \
mold limits, wear and tear); surface hidden benefits and riders; explain the claim process and deadlines; and \
recommend coverage gaps to close. Format with actionable recommendations.";

const UTILITY_ANALYSIS_PROMPT: &str = "Analyze the attached utility bill. Extract billing period, charges, \
usage and rate structure; compare usage against prior periods when shown; flag unusual charges, estimated \
readings or possible leaks; list cost-saving and assistance programs; and explain dispute steps and the \
state utility commission's consumer protections. Format with clear findings and action steps.";

const DESCRIPTORS: [DocumentDescriptor; 6] = [
    DocumentDescriptor {
        kind: DocumentKind::Water,
        label: "Water Quality Report",
        system_prompt: "You are an expert water quality analyst with deep knowledge of EPA drinking water \
standards, state regulations, and health effects of water contaminants.",
        analysis_prompt: WATER_ANALYSIS_PROMPT,
        slot: ActionSlot::Analyze(DocumentKind::Water),
    },
    DocumentDescriptor {
        kind: DocumentKind::Warranty,
        label: "Warranty Document",
        system_prompt: "You are an expert in consumer warranty law and product warranties with knowledge of \
consumer protection rights, implied warranties, and claim procedures.",
        analysis_prompt: WARRANTY_ANALYSIS_PROMPT,
        slot: ActionSlot::Analyze(DocumentKind::Warranty),
    },
    DocumentDescriptor {
        kind: DocumentKind::Lease,
        label: "Lease Agreement",
        system_prompt: "You are an expert lease agreement and rental contract analyst.",
        analysis_prompt: LEASE_ANALYSIS_PROMPT,
        slot: ActionSlot::Analyze(DocumentKind::Lease),
    },
    DocumentDescriptor {
        kind: DocumentKind::Inspection,
        label: "Home Inspection Report",
        system_prompt: "You are an expert home inspector and building analyst.",
        analysis_prompt: INSPECTION_ANALYSIS_PROMPT,
        slot: ActionSlot::Analyze(DocumentKind::Inspection),
    },
    DocumentDescriptor {
        kind: DocumentKind::Insurance,
        label: "Insurance Policy",
        system_prompt: "You are an expert insurance policy analyst specializing in homeowners and renters \
insurance.",
        analysis_prompt: INSURANCE_ANALYSIS_PROMPT,
        slot: ActionSlot::Analyze(DocumentKind::Insurance),
    },
    DocumentDescriptor {
        kind: DocumentKind::Utility,
        label: "Utility Bill",
        system_prompt: "You are an expert utility billing analyst.",
        analysis_prompt: UTILITY_ANALYSIS_PROMPT,
        slot: ActionSlot::Analyze(DocumentKind::Utility),
    },
];

impl DocumentKind {
    pub fn descriptor(self) -> &'static DocumentDescriptor {
        // DESCRIPTORS is ordered like DocumentKind::ALL.
        &DESCRIPTORS[self as usize]
    }

    pub fn label(self) -> &'static str {
        self.descriptor().label
    }

    /// Only water reports come back in the labelled section format.
    pub fn has_structured_output(self) -> bool {
        matches!(self, DocumentKind::Water)
    }
}

/// User prompt for analyzing one attached document.
pub fn analysis_prompt(kind: DocumentKind, mime_type: &str) -> String {
    let descriptor = kind.descriptor();
    let form = if mime_type == PDF_MIME { "PDF" } else { "image" };
    format!(
        "DOCUMENT TYPE: {}\nSee attached {} {}.\n\n{}",
        descriptor.label,
        descriptor.label.to_lowercase(),
        form,
        descriptor.analysis_prompt
    )
}

/// Evidence text with the timeline and damages blocks appended.
pub fn enriched_evidence(form: &FormInput) -> String {
    let mut evidence = form.evidence.clone();

    let mut events: Vec<_> = form
        .timeline
        .iter()
        .filter(|e| e.date.is_some() && !e.description.trim().is_empty())
        .collect();
    events.sort_by_key(|e| e.date);
    if !events.is_empty() {
        evidence.push_str("\n\n=== TIMELINE ===");
        for event in events {
            let Some(date) = event.date else { continue };
            let _ = write!(evidence, "\n{}", date.format("%B %-d, %Y"));
            if let Some(time) = event.time.as_deref().filter(|t| !t.trim().is_empty()) {
                let _ = write!(evidence, " at {}", time.trim());
            }
            let _ = write!(evidence, ": {}", event.description.trim());
        }
    }

    if let Some(total) = form.estimated_damages.filter(|t| *t > 0.0) {
        let _ = write!(
            evidence,
            "\n\n=== ESTIMATED DAMAGES ===\nTotal estimated damages: {}",
            format_dollars(total)
        );
    }
    evidence
}

/// Email-generation user prompt.
pub fn email_prompt(form: &FormInput, regulations: &[Regulation], attachments: &[AttachedDocument]) -> String {
    let mut out = String::from("Draft an advocacy email using the case details below.\n\n=== CASE DETAILS ===\n");

    let issue = match issue_label(&form.issue_type) {
        Some(label) => format!("{} ({})", label, form.issue_type),
        None => form.issue_type.clone(),
    };
    let recipient = match recipient_label(&form.recipient) {
        Some(label) => format!("{} ({})", label, form.recipient),
        None => form.recipient.clone(),
    };
    let evidence = enriched_evidence(form);

    let lines: [(&str, &str); 15] = [
        ("Issue type", issue.as_str()),
        ("Recipient", recipient.as_str()),
        ("Location", form.location.as_str()),
        ("City", form.city.as_str()),
        ("State", form.state.as_str()),
        ("Evidence", evidence.as_str()),
        ("Measurements", form.measurements.as_str()),
        ("Previous contact", form.previous_contact.as_str()),
        ("Health impact", form.health_impact.as_str()),
        ("Regulations noted by resident", form.regulations.as_str()),
        ("Desired outcome", form.desired_outcome.as_str()),
        ("Affected residents", form.affected_residents.as_str()),
        ("Property age", form.property_age.as_str()),
        ("Escalation level", form.escalation_level.as_str()),
        ("Urgency level", form.urgency_level.as_str()),
    ];
    for (label, value) in lines {
        if !value.trim().is_empty() {
            let _ = writeln!(out, "{}: {}", label, value);
        }
    }

    out.push_str("\n=== SENDER ===\n");
    for (label, value) in [
        ("Name", &form.sender_name),
        ("Email", &form.sender_email),
        ("Phone", &form.sender_phone),
        ("Address", &form.sender_address),
    ] {
        if !value.trim().is_empty() {
            let _ = writeln!(out, "{}: {}", label, value);
        }
    }

    out.push_str("\n=== APPLICABLE REGULATIONS ===\n");
    for r in regulations {
        let _ = writeln!(out, "- [{}] {} ({}): {}", r.jurisdiction, r.title, r.citation, r.summary);
    }

    if !attachments.is_empty() {
        let _ = writeln!(out, "\n=== ATTACHED EVIDENCE ({} file(s)) ===", attachments.len());
        for doc in attachments {
            let _ = writeln!(out, "- {} ({}, {} KB)", doc.name, doc.mime_type, doc.size_bytes.div_ceil(1024));
        }
        out.push_str("Review the attached files and reference what they show.\n");
    }

    let _ = write!(
        out,
        "\n=== INSTRUCTIONS ===\n\
Tone: {}.\n\
Structure: a clear opening stating who is writing and about which property; a factual description of the \
problem with dates and measurements; the health and safety impact; the specific regulations or obligations \
involved; the requested remedy with a concrete deadline; and a professional closing with the sender's contact \
details. Keep it under 500 words and do not fabricate facts that are not in the case details.",
        form.escalation_level.tone()
    );
    out
}

pub fn subject_line(issue_type: &str, escalation: EscalationLevel, location: &str) -> String {
    let prefix = match escalation {
        EscalationLevel::Initial => "Request",
        EscalationLevel::Professional => "Follow-up",
        EscalationLevel::Formal => "Formal Complaint",
        EscalationLevel::Legal => "Legal Notice",
    };
    let issue = issue_label(issue_type).unwrap_or(issue_type);
    let location = location.trim();
    if location.is_empty() {
        format!("{}: {}", prefix, issue)
    } else {
        format!("{}: {} at {}", prefix, issue, location)
    }
}

pub fn codes_lookup_prompt(city: &str, state: &str, issue_type: &str) -> String {
    let issue = issue_label(issue_type).unwrap_or(issue_type);
    format!(
        "What are the specific building codes, health codes, and regulations that apply to {issue} issues in \
{city}, {state}?\n\nProvide:\n\
1. Relevant sections of the International Building Code (IBC) or International Residential Code (IRC)\n\
2. State-specific regulations for {state}\n\
3. Known local ordinances for {city} (if any)\n\
4. Applicable EPA, HUD, or OSHA standards\n\
5. Enforcement agencies and contact information\n\n\
Format with specific code sections and citations where possible."
    )
}

pub fn verification_prompt(issue_type: &str, state: &str, city: &str) -> String {
    let issue = issue_label(issue_type).unwrap_or(issue_type);
    format!(
        "Verify the current regulations governing {issue} in {city}, {state}. For each federal, state and local \
requirement list the citation, what it requires, the enforcing agency, and whether it may have changed \
recently. End with a CONFIDENCE line rating the overall reliability as HIGH, MEDIUM or LOW."
    )
}

pub fn cross_check_prompt(email: &str, issue_type: &str, state: &str, city: &str) -> String {
    let issue = issue_label(issue_type).unwrap_or(issue_type);
    format!(
        "{}\n\nNow cross-check the following draft email about {issue} against those regulations. List every \
citation or factual claim that is inaccurate, outdated or unsupported, suggest corrections, and confirm the \
claims that are accurate.\n\n=== DRAFT EMAIL ===\n{email}",
        verification_prompt(issue_type, state, city)
    )
}

/// `$1,234` or `$1,234.50`.
pub fn format_dollars(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let (whole, frac) = (cents / 100, cents % 100);
    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if frac == 0 {
        format!("${}", grouped)
    } else {
        format!("${}.{:02}", grouped, frac)
    }
}
