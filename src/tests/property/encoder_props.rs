use base64::Engine;
use proptest::prelude::*;

use crate::{
    anthropic::{build_content, ContentBlock},
    encoder::{encode_bytes, split_data_uri},
};

fn arb_mime() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("image/png"), Just("image/jpeg"), Just("image/webp"), Just("application/pdf")]
}

fn decode(payload: &str) -> Vec<u8> {
    base64::engine::general_purpose::STANDARD.decode(payload).unwrap_or_default()
}

proptest! {
    #[test]
    fn prop_payload_decodes_to_original_length(
        mime in arb_mime(),
        bytes in prop::collection::vec(any::<u8>(), 0..4096)
    ) {
        let doc = encode_bytes("upload", mime, &bytes).unwrap();
        let (embedded, payload) = split_data_uri(&doc.data).unwrap();
        prop_assert_eq!(embedded, mime);
        prop_assert_eq!(decode(payload).len() as u64, doc.size_bytes);
        prop_assert_eq!(doc.size_bytes, bytes.len() as u64);
    }

    #[test]
    fn prop_content_block_carries_the_exact_bytes(
        mime in arb_mime(),
        bytes in prop::collection::vec(any::<u8>(), 0..4096)
    ) {
        let doc = encode_bytes("upload", mime, &bytes).unwrap();
        let content = build_content(&[doc.to_payload()], "prompt").unwrap();
        prop_assert_eq!(content.len(), 2);
        let source = match &content[0] {
            ContentBlock::Document { source } | ContentBlock::Image { source } => source,
            ContentBlock::Text { .. } => return Err(TestCaseError::fail("document became a text block")),
        };
        prop_assert_eq!(source.media_type.as_str(), mime);
        prop_assert_eq!(decode(&source.data), bytes);
    }
}
