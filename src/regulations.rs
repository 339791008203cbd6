//! Static regulatory knowledge base.
//!
//! Snippets are keyed by issue category, state and recipient type and are
//! pasted into the email prompt as context. Nothing here is authoritative;
//! the verification action exists to cross-check it.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Regulation {
    pub jurisdiction: &'static str,
    pub title: &'static str,
    pub citation: &'static str,
    pub summary: &'static str,
}

const fn reg(
    jurisdiction: &'static str,
    title: &'static str,
    citation: &'static str,
    summary: &'static str,
) -> Regulation {
    Regulation { jurisdiction, title, citation, summary }
}

/// (form value, display label, category key)
const ISSUE_TYPES: &[(&str, &str, &str)] = &[
    ("air-quality", "Air Quality / Mold / VOCs", "airQuality"),
    ("water-quality", "Water Quality / Contamination", "waterQuality"),
    ("hvac-ventilation", "HVAC / Ventilation Issues", "hvac"),
    ("lead-asbestos", "Lead / Asbestos / Hazardous Materials", "leadAsbestos"),
    ("pest-infestation", "Pest Infestation", "pests"),
    ("structural", "Structural / Safety Hazards", "structural"),
    ("noise-pollution", "Noise Pollution", "noise"),
    ("utility-access", "Utility Access / Service Issues", "utilities"),
    ("radon", "Radon Detection", "radon"),
    ("carbon-monoxide", "Carbon Monoxide / Gas Leaks", "carbonMonoxide"),
    ("electromagnetic", "EMF / Electromagnetic Fields", "emf"),
];

const RECIPIENTS: &[(&str, &str)] = &[
    ("hoa", "Homeowners Association (HOA)"),
    ("property-mgmt", "Property Management / Landlord"),
    ("utility", "Utility Company"),
    ("local-govt", "Local Government / City Council"),
    ("state-agency", "State Environmental/Health Agency"),
    ("federal-agency", "Federal Agency (EPA, HUD, etc.)"),
    ("nonprofit", "Advocacy Nonprofit / Legal Aid"),
];

const FEDERAL: &[(&str, Regulation)] = &[
    ("airQuality", reg("Federal", "EPA Indoor Air Quality guidance", "EPA IAQ", "Moisture and mold should be remediated promptly; sources of VOCs controlled and ventilation provided.")),
    ("airQuality", reg("Federal", "HUD Healthy Homes principles", "HUD OLHCHH", "Housing should be kept dry, ventilated and free of contaminants.")),
    ("waterQuality", reg("Federal", "Safe Drinking Water Act", "42 U.S.C. 300f et seq.", "Public water systems must meet National Primary Drinking Water Regulations.")),
    ("waterQuality", reg("Federal", "National Primary Drinking Water Regulations", "40 CFR Part 141", "Sets maximum contaminant levels (MCLs) and treatment techniques; lead action level 15 ppb.")),
    ("waterQuality", reg("Federal", "Consumer Confidence Report Rule", "40 CFR Part 141 Subpart O", "Community water systems must publish annual water quality reports.")),
    ("hvac", reg("Federal", "ASHRAE Standard 62.2", "ASHRAE 62.2", "Minimum whole-dwelling ventilation rates for residential buildings.")),
    ("leadAsbestos", reg("Federal", "Lead-Based Paint Disclosure Rule", "40 CFR Part 745 Subpart F", "Known lead hazards in pre-1978 housing must be disclosed to tenants and buyers.")),
    ("leadAsbestos", reg("Federal", "HUD Lead Safe Housing Rule", "24 CFR Part 35", "Federally assisted pre-1978 housing requires lead hazard evaluation and control.")),
    ("leadAsbestos", reg("Federal", "Renovation, Repair and Painting Rule", "40 CFR Part 745 Subpart E", "Work disturbing lead paint must use certified firms and lead-safe practices.")),
    ("leadAsbestos", reg("Federal", "Asbestos NESHAP", "40 CFR Part 61 Subpart M", "Asbestos must be handled and removed under emission controls during renovation.")),
    ("pests", reg("Federal", "HUD Uniform Physical Condition Standards", "24 CFR 5.703", "Assisted housing must be free of infestation by rodents and insects.")),
    ("structural", reg("Federal", "International Property Maintenance Code", "IPMC Chapter 3", "Structural members, stairs and railings must be maintained in safe condition.")),
    ("noise", reg("Federal", "Noise Control Act", "42 U.S.C. 4901 et seq.", "Federal policy to limit noise that jeopardizes health and welfare.")),
    ("utilities", reg("Federal", "LIHEAP", "42 U.S.C. 8621 et seq.", "Federal energy assistance for low-income households facing shut-off.")),
    ("radon", reg("Federal", "Indoor Radon Abatement Act", "15 U.S.C. 2661 et seq.", "EPA recommends mitigation at or above 4 pCi/L.")),
    ("carbonMonoxide", reg("Federal", "CPSC carbon monoxide guidance", "CPSC CO Safety", "CO alarms should be installed on every level and outside sleeping areas.")),
    ("emf", reg("Federal", "FCC RF exposure limits", "47 CFR 1.1310", "Maximum permissible exposure limits for radio-frequency emissions.")),
];

/// (state, category, regulation). `"*"` matches every category.
const STATE: &[(&str, &str, Regulation)] = &[
    ("California", "*", reg("California", "Implied warranty of habitability", "Cal. Civ. Code 1941.1", "Rental units must be weatherproofed, have safe plumbing, heating and be free of vermin and mold.")),
    ("California", "airQuality", reg("California", "Toxic Mold Protection Act", "Cal. Health & Safety Code 26100", "Landlords must disclose known mold exceeding permissible limits.")),
    ("California", "waterQuality", reg("California", "Human Right to Water", "Cal. Water Code 106.3", "Every person has the right to safe, clean, affordable water.")),
    ("New York", "*", reg("New York", "Warranty of habitability", "N.Y. Real Prop. Law 235-b", "Landlords warrant premises are fit for habitation and free of dangerous conditions.")),
    ("Texas", "*", reg("Texas", "Landlord duty to repair", "Tex. Prop. Code 92.052", "Landlords must make diligent efforts to repair conditions affecting health or safety after notice.")),
    ("Illinois", "leadAsbestos", reg("Illinois", "Lead Poisoning Prevention Act", "410 ILCS 45", "Owners must mitigate lead hazards identified in dwellings with children.")),
    ("Massachusetts", "*", reg("Massachusetts", "State Sanitary Code", "105 CMR 410", "Minimum standards of fitness for human habitation.")),
    ("Florida", "*", reg("Florida", "Landlord obligation to maintain premises", "Fla. Stat. 83.51", "Landlords must comply with building, housing and health codes.")),
    ("Washington", "*", reg("Washington", "Residential Landlord-Tenant Act", "RCW 59.18.060", "Landlords must keep premises fit for human habitation.")),
];

const RECIPIENT_NOTES: &[(&str, Regulation)] = &[
    ("hoa", reg("Association", "Governing documents", "CC&Rs / bylaws", "HOAs must maintain common elements under their declaration and state common-interest law.")),
    ("property-mgmt", reg("Landlord", "Notice and repair obligations", "Lease / local housing code", "Written notice starts the landlord's statutory repair window.")),
    ("utility", reg("Utility", "Public utility commission oversight", "State PUC rules", "Service quality and shut-off disputes can be escalated to the state utility commission.")),
    ("local-govt", reg("Municipal", "Local housing and health codes", "Municipal code", "Code enforcement can inspect and cite violations.")),
    ("state-agency", reg("State", "State environmental health programs", "State administrative code", "State agencies enforce drinking water, air and lead programs delegated by EPA.")),
    ("federal-agency", reg("Federal", "Agency complaint procedures", "EPA / HUD", "Federal agencies accept complaints for federally regulated systems and assisted housing.")),
];

/// Category key for a form issue value.
pub fn issue_category(issue_type: &str) -> Option<&'static str> {
    ISSUE_TYPES.iter().find(|(value, _, _)| *value == issue_type).map(|(_, _, cat)| *cat)
}

pub fn issue_label(issue_type: &str) -> Option<&'static str> {
    ISSUE_TYPES.iter().find(|(value, _, _)| *value == issue_type).map(|(_, label, _)| *label)
}

pub fn recipient_label(recipient: &str) -> Option<&'static str> {
    RECIPIENTS.iter().find(|(value, _)| *value == recipient).map(|(_, label)| *label)
}

/// Snippets for `(category, state, recipient)`. Unknown keys contribute
/// nothing; an empty result is a normal outcome.
pub fn relevant_regulations(category: Option<&str>, state: &str, recipient: &str) -> Vec<Regulation> {
    let mut found = Vec::new();

    if let Some(category) = category {
        found.extend(FEDERAL.iter().filter(|(cat, _)| *cat == category).map(|(_, r)| *r));
        found.extend(
            STATE
                .iter()
                .filter(|(st, cat, _)| st.eq_ignore_ascii_case(state.trim()) && (*cat == "*" || *cat == category))
                .map(|(_, _, r)| *r),
        );
    }
    found.extend(RECIPIENT_NOTES.iter().filter(|(rcpt, _)| *rcpt == recipient).map(|(_, r)| *r));
    found
}
