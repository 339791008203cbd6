use proptest::prelude::*;

use crate::{models::FormInput, prompt::email_prompt};

/// Empty, or text that is not whitespace-only.
fn arb_field() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => Just(String::new()),
        4 => "[A-Za-z0-9.,#'/-][A-Za-z0-9 .,#'/-]{0,40}",
    ]
}

fn arb_form() -> impl Strategy<Value = FormInput> {
    prop::collection::vec(arb_field(), 18).prop_map(|v| {
        let mut it = v.into_iter();
        let mut next = || it.next().unwrap_or_default();
        FormInput {
            issue_type: next(),
            recipient: next(),
            location: next(),
            city: next(),
            state: next(),
            evidence: next(),
            measurements: next(),
            previous_contact: next(),
            health_impact: next(),
            regulations: next(),
            desired_outcome: next(),
            affected_residents: next(),
            property_age: next(),
            sender_name: next(),
            sender_email: next(),
            sender_phone: next(),
            sender_address: next(),
            ..FormInput::default()
        }
    })
}

proptest! {
    #[test]
    fn prop_non_empty_fields_appear_verbatim(form in arb_form()) {
        let prompt = email_prompt(&form, &[], &[]);
        let fields = [
            ("issueType", &form.issue_type),
            ("recipient", &form.recipient),
            ("location", &form.location),
            ("city", &form.city),
            ("state", &form.state),
            ("evidence", &form.evidence),
            ("measurements", &form.measurements),
            ("previousContact", &form.previous_contact),
            ("healthImpact", &form.health_impact),
            ("regulations", &form.regulations),
            ("desiredOutcome", &form.desired_outcome),
            ("affectedResidents", &form.affected_residents),
            ("propertyAge", &form.property_age),
            ("senderName", &form.sender_name),
            ("senderEmail", &form.sender_email),
            ("senderPhone", &form.sender_phone),
            ("senderAddress", &form.sender_address),
        ];
        for (name, value) in fields {
            if !value.trim().is_empty() {
                prop_assert!(prompt.contains(value.as_str()), "{} {:?} missing from prompt", name, value);
            }
        }
    }

    #[test]
    fn prop_prompt_is_deterministic(form in arb_form()) {
        prop_assert_eq!(email_prompt(&form, &[], &[]), email_prompt(&form, &[], &[]));
    }
}
