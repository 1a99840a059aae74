use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();
    static ref JWT_REGEX: Regex = Regex::new(r"\beyJ[A-Za-z0-9_-]*\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+").unwrap();
    static ref BEARER_REGEX: Regex = Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9._~+/=-]+").unwrap();
}

/// PII redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub redact_tokens: bool,
    pub hash_for_correlation: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            redact_tokens: true,
            hash_for_correlation: true,
        }
    }
}

/// PII redactor for log messages
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        // Tokens first: a bearer header swallows the whole credential
        if self.config.redact_tokens {
            result = BEARER_REGEX.replace_all(&result, "Bearer [TOKEN]").to_string();
            result = JWT_REGEX.replace_all(&result, "[TOKEN]").to_string();
        }

        if self.config.redact_emails {
            result = self.redact_emails(&result);
        }

        result
    }

    fn redact_emails(&self, text: &str) -> String {
        EMAIL_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                let email = caps.get(0).map_or("", |m| m.as_str());
                if self.config.hash_for_correlation {
                    format!("EMAIL[{}]", self.hash_value(email))
                } else {
                    match email.split_once('@') {
                        Some((local, domain)) => format!(
                            "{}***@{}***",
                            local.chars().next().unwrap_or('*'),
                            domain.chars().next().unwrap_or('*')
                        ),
                        None => "***@***".to_string(),
                    }
                }
            })
            .to_string()
    }

    fn hash_value(&self, value: &str) -> String {
        let digest = Sha256::digest(value.as_bytes());
        // First 8 bytes are enough to correlate log lines
        general_purpose::STANDARD_NO_PAD.encode(digest.get(..8).unwrap_or_default())
    }
}

impl Default for PiiRedactor {
    fn default() -> Self {
        Self::new(RedactionConfig::default())
    }
}
