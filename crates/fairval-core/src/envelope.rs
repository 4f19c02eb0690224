use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{ProviderId, ValidationError};

pub const SCHEMA_VERSION: &str = "v1.0.0";

/// Standard response envelope for all `fairval` machine-readable outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub meta: EnvelopeMeta,
    pub data: T,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EnvelopeError>,
}

impl<T> Envelope<T> {
    pub fn success(meta: EnvelopeMeta, data: T) -> Self {
        Self {
            meta,
            data,
            errors: Vec::new(),
        }
    }

    pub fn with_errors(
        meta: EnvelopeMeta,
        data: T,
        errors: Vec<EnvelopeError>,
    ) -> Result<Self, ValidationError> {
        meta.validate_schema_compliance()?;
        for error in &errors {
            error.validate()?;
        }

        Ok(Self { meta, data, errors })
    }

    pub fn push_error(&mut self, error: EnvelopeError) -> Result<(), ValidationError> {
        error.validate()?;
        self.errors.push(error);
        Ok(())
    }
}

/// Metadata attached to every envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    pub request_id: String,
    pub schema_version: String,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    pub source_chain: Vec<ProviderId>,
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl EnvelopeMeta {
    pub fn new(
        request_id: impl Into<String>,
        source_chain: Vec<ProviderId>,
        latency_ms: u64,
    ) -> Result<Self, ValidationError> {
        let meta = Self {
            request_id: request_id.into(),
            schema_version: SCHEMA_VERSION.to_owned(),
            generated_at: OffsetDateTime::now_utc(),
            source_chain,
            latency_ms,
            warnings: Vec::new(),
        };
        meta.validate_schema_compliance()?;
        Ok(meta)
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn validate_schema_compliance(&self) -> Result<(), ValidationError> {
        if self.request_id.trim().len() < 8 {
            return Err(ValidationError::InvalidRequestId);
        }

        if !is_valid_schema_version(&self.schema_version) {
            return Err(ValidationError::InvalidSchemaVersion {
                value: self.schema_version.clone(),
            });
        }

        if self.source_chain.is_empty() {
            return Err(ValidationError::EmptySourceChain);
        }

        Ok(())
    }
}

/// Structured error payload for partial or failed responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ProviderId>,
}

impl EnvelopeError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let error = Self {
            code: code.into(),
            message: message.into(),
            source: None,
        };
        error.validate()?;
        Ok(error)
    }

    pub fn with_source(mut self, source: ProviderId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.code.trim().is_empty() {
            return Err(ValidationError::EmptyErrorCode);
        }

        if self.message.trim().is_empty() {
            return Err(ValidationError::EmptyErrorMessage);
        }

        Ok(())
    }
}

fn is_valid_schema_version(value: &str) -> bool {
    let Some(version) = value.strip_prefix('v') else {
        return false;
    };

    let mut parts = version.split('.');
    let major = parts.next();
    let minor = parts.next();
    let patch = parts.next();

    if parts.next().is_some() {
        return false;
    }

    [major, minor, patch].iter().all(|part| {
        part.is_some_and(|segment| {
            !segment.is_empty() && segment.chars().all(|ch| ch.is_ascii_digit())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamps_current_schema_version() {
        let meta = EnvelopeMeta::new("request-12345", vec![ProviderId::Yahoo], 11)
            .expect("meta should be valid");

        assert_eq!(meta.schema_version, "v1.0.0");
    }

    #[test]
    fn rejects_bad_schema_version() {
        let mut meta = EnvelopeMeta::new("request-12345", vec![ProviderId::Yahoo], 1)
            .expect("meta should be valid");
        meta.schema_version = String::from("1.0.0");

        let err = meta.validate_schema_compliance().expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidSchemaVersion { .. }));
    }

    #[test]
    fn rejects_short_request_id_and_empty_chain() {
        assert_eq!(
            EnvelopeMeta::new("short", vec![ProviderId::Yahoo], 1),
            Err(ValidationError::InvalidRequestId)
        );
        assert_eq!(
            EnvelopeMeta::new("request-12345", Vec::new(), 1),
            Err(ValidationError::EmptySourceChain)
        );
    }

    #[test]
    fn rejects_empty_error_code() {
        let err = EnvelopeError::new("", "message").expect_err("must fail");
        assert!(matches!(err, ValidationError::EmptyErrorCode));
    }

    #[test]
    fn generated_at_serializes_as_rfc3339() {
        let meta = EnvelopeMeta::new("request-12345", vec![ProviderId::Alphavantage], 3)
            .expect("meta should be valid");
        let json = serde_json::to_value(&meta).expect("serializes");
        let stamp = json["generated_at"].as_str().expect("string timestamp");
        assert!(stamp.ends_with('Z'));
        assert_eq!(json["source_chain"][0], "alphavantage");
    }
}
