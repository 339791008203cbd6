use proptest::prelude::*;

use crate::parser::{parse_analysis, ParseOutcome, SECTIONS};

/// Every section label contains an `a`, so text without one cannot hold a header.
fn arb_label_free_text() -> impl Strategy<Value = String> {
    "[b-zB-Z0-9 .,:;()\n•→-]{0,400}"
}

/// Noise with real headers and record markers mixed in.
fn arb_report_like_text() -> impl Strategy<Value = String> {
    let label = prop::sample::select(SECTIONS.iter().map(|rule| rule.label).collect::<Vec<_>>())
        .prop_map(|label| format!("\n{}:", label));
    let piece = prop_oneof![
        label,
        Just("\nCONTAMINANT:".to_string()),
        Just("\nHEALTH RISKS:".to_string()),
        Just("\n---\n".to_string()),
        Just("\n1. ".to_string()),
        Just(" -> ".to_string()),
        "\\PC{0,30}",
    ];
    prop::collection::vec(piece, 0..40).prop_map(|pieces| pieces.concat())
}

proptest! {
    #[test]
    fn prop_never_panics_on_arbitrary_text(text in any::<String>()) {
        let _ = parse_analysis(&text);
    }

    #[test]
    fn prop_never_panics_on_report_like_text(text in arb_report_like_text()) {
        if let ParseOutcome::Structured(parsed) = parse_analysis(&text) {
            let _ = parsed.quality_status();
            prop_assert!(parsed.detected_contaminants.iter().all(|c| !c.name.is_empty()));
        }
    }

    #[test]
    fn prop_label_free_text_is_unstructured(text in arb_label_free_text()) {
        prop_assert_eq!(parse_analysis(&text), ParseOutcome::Unstructured { raw_text: text.clone() });
    }
}
