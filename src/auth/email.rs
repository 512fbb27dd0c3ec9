use regex::Regex;

use super::AuthError;

/// Restricts login and registration to `first[.last]@<domain>` addresses
#[derive(Debug, Clone)]
pub struct EmailPolicy {
    pattern: Regex,
}

impl EmailPolicy {
    pub fn new(domain: &str) -> Result<Self, AuthError> {
        let pattern = format!(r"^[a-z]+(\.[a-z]+)?@{}$", regex::escape(&domain.trim().to_lowercase()));
        let pattern = Regex::new(&pattern).map_err(|e| AuthError::InvalidEmail(e.to_string()))?;
        Ok(Self { pattern })
    }

    /// Returns the normalized (trimmed, lowercased) address if it is allowed
    pub fn validate(&self, email: &str) -> Result<String, AuthError> {
        let normalized = email.trim().to_lowercase();
        if self.pattern.is_match(&normalized) {
            Ok(normalized)
        } else {
            Err(AuthError::InvalidEmail(email.trim().to_string()))
        }
    }
}

/// Display name derived from the local part: `john.doe@...` becomes `John Doe`
pub fn display_name(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    local
        .split('.')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
