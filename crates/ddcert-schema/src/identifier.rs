//! OData simple identifier grammar.
//!
//! A simple identifier starts with a letter or underscore, continues with
//! letters, digits or underscores, and is at most 128 characters long.
//! Letters and digits are taken from the Unicode letter and number classes.

/// Reference for the grammar, quoted in defect messages.
pub const ODATA_SIMPLE_IDENTIFIER_URL: &str =
    "https://docs.oasis-open.org/odata/odata-csdl-xml/v4.01/odata-csdl-xml-v4.01.html#sec_SimpleIdentifier";

const MAX_IDENTIFIER_CHARS: usize = 128;

/// True if `value` is a valid OData simple identifier.
pub fn is_simple_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first == '_' || first.is_alphabetic()) {
        return false;
    }
    let mut count = 1;
    for c in chars {
        if !(c == '_' || c.is_alphanumeric()) {
            return false;
        }
        count += 1;
        if count > MAX_IDENTIFIER_CHARS {
            return false;
        }
    }
    true
}
