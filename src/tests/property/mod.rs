//! Property-based tests. Each module checks an invariant over generated
//! inputs rather than a single example.
//!
//! - `prompt_props`: every non-empty form field reaches the email prompt verbatim
//! - `encoder_props`: encoded payloads decode to the original bytes, also after
//!   being split back out of a content block
//! - `parser_props`: parsing never panics and label-free text stays unstructured

mod encoder_props;
mod parser_props;
mod prompt_props;
