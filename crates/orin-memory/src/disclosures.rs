/// Profile attribute key holding the user's stated name.
pub const PROFILE_ATTR_NAME: &str = "name";
/// Profile attribute key holding the user's stated location.
pub const PROFILE_ATTR_LOCATION: &str = "location";

const NAME_TRIGGER: &str = "my name is";
const NAME_CAPTURE_TOKEN: &str = "is";
const LOCATION_TRIGGER: &str = "i am from";
const LOCATION_CAPTURE_TOKEN: &str = "from";
const OWN_NAME_QUERY: &str = "what is my name";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Public struct `Disclosures` used across Orin components.
pub struct Disclosures {
    pub name: Option<String>,
    pub location: Option<String>,
}

impl Disclosures {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.location.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `UserIntent` values.
pub enum UserIntent {
    AskOwnName,
}

/// Extracts name and location disclosures from one user message.
///
/// Each capture runs independently against the full original text, so a
/// message disclosing both can fold one capture into the other.
pub fn extract_disclosures(text: &str) -> Disclosures {
    let lowered = text.to_lowercase();
    let name = lowered
        .contains(NAME_TRIGGER)
        .then(|| capture_after_last(text, NAME_CAPTURE_TOKEN));
    let location = lowered
        .contains(LOCATION_TRIGGER)
        .then(|| capture_after_last(text, LOCATION_CAPTURE_TOKEN));
    Disclosures { name, location }
}

/// Detects recall questions answered from the profile instead of the model.
pub fn detect_intent(text: &str) -> Option<UserIntent> {
    text.to_lowercase()
        .contains(OWN_NAME_QUERY)
        .then_some(UserIntent::AskOwnName)
}

/// Everything after the last case-sensitive `token`; the whole trimmed text
/// when the token never appears in the original casing.
fn capture_after_last(text: &str, token: &str) -> String {
    match text.rfind(token) {
        Some(index) => text[index + token.len()..].trim().to_string(),
        None => text.trim().to_string(),
    }
}
