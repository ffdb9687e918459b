//! Display formatting for Brazilian tax identifiers

/// Length of a CPF (natural person) number
pub const CPF_LEN: usize = 11;

/// Length of a CNPJ (legal entity) number
pub const CNPJ_LEN: usize = 14;

/// Format a CPF or CNPJ for display
///
/// Eleven digits become `XXX.XXX.XXX-XX`, fourteen digits become
/// `XX.XXX.XXX/XXXX-XX`. Anything else, including empty strings, values that
/// are already punctuated and digit strings of other lengths, is returned as
/// given.
#[must_use]
pub fn format_tax_id(value: &str) -> String {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return value.to_string();
    }

    // All bytes are ASCII digits here, so byte slicing is char slicing.
    match value.len() {
        CPF_LEN => format!(
            "{}.{}.{}-{}",
            &value[..3],
            &value[3..6],
            &value[6..9],
            &value[9..]
        ),
        CNPJ_LEN => format!(
            "{}.{}.{}/{}-{}",
            &value[..2],
            &value[2..5],
            &value[5..8],
            &value[8..12],
            &value[12..]
        ),
        _ => value.to_string(),
    }
}
