//! Typed-name signatures for consent forms and the code of conduct.

use crate::error::CoreError;

/// Collapse runs of whitespace and trim the ends.
fn canonical(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The typed signature must match the signer's name on file.
///
/// Comparison ignores surrounding and repeated whitespace but is otherwise
/// exact, including case.
pub fn verify_signature(signature: &str, name_on_file: &str) -> Result<(), CoreError> {
    let signed = canonical(signature);
    if signed.is_empty() {
        return Err(CoreError::Validation("A signature is required".into()));
    }
    if signed != canonical(name_on_file) {
        return Err(CoreError::Validation(
            "Signature must match the full name on your account".into(),
        ));
    }
    Ok(())
}
