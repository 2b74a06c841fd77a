//! Descriptors for the public ICD lookup APIs
//!
//! Nothing here performs I/O: [`ApiRequest::describe`] builds what a client
//! would send, and the response helpers interpret what it got back.

use std::fmt;

use serde_json::Value;

use crate::application::error::ApiError;
use crate::application::ApplicationResult;
use crate::domain::{Codex, DomainError, EntryId, EntryKind, Revision};

/// HTTP request describing an entry lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: String,
    pub uri: String,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    /// Request that fetches the description of entry `id`.
    pub fn describe(codex: &Codex, id: EntryId, language: &str) -> ApplicationResult<Self> {
        let entry = codex.get_entry(id).ok_or(DomainError::NotAnEntry(id))?;
        if entry.kind == EntryKind::Root {
            return Err(DomainError::IllegalOperation(format!("{} has no API description", entry.code)).into());
        }
        let revision = codex.revision().ok_or_else(|| {
            DomainError::IllegalOperation("codex has no revision to describe entries with".to_string())
        })?;
        let release = codex.release_of(id).ok_or_else(|| {
            DomainError::IllegalOperation(format!("{} is not attached to a root", entry.code))
        })?;

        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        let uri = match revision {
            Revision::Rev10 => {
                who_headers(&mut headers, language);
                format!("https://id.who.int/icd/release/10/{}/{}", release, entry.code)
            }
            Revision::Rev10Cm => format!(
                "https://clinicaltables.nlm.nih.gov/api/icd10cm/v3/search?sf=code,name&terms={}",
                entry.code
            ),
            Revision::Rev11 => {
                who_headers(&mut headers, language);
                entry
                    .linearization
                    .as_ref()
                    .and_then(|lin| lin.linearization_uri.clone())
                    .unwrap_or_else(|| {
                        format!(
                            "https://id.who.int/icd/release/11/{}/mms/codeinfo/{}",
                            release, entry.code
                        )
                    })
            }
        };

        Ok(Self {
            method: "GET".to_string(),
            uri,
            headers,
        })
    }
}

fn who_headers(headers: &mut Vec<(String, String)>, language: &str) {
    headers.push(("Accept-Language".to_string(), language.to_string()));
    headers.push(("API-Version".to_string(), "v2".to_string()));
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.uri)?;
        for (name, value) in &self.headers {
            write!(f, "\n{}: {}", name, value)?;
        }
        Ok(())
    }
}

/// Map a non-2xx status to an error.
pub fn check_status(status: u16) -> Result<(), ApiError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(ApiError::Http { status })
    }
}

/// `(code, name)` pairs of an NLM clinical-tables search response.
///
/// The response is a JSON array whose fourth element lists the requested
/// display fields per hit, here `[code, name]`.
pub fn parse_clinical_tables(body: &str) -> Result<Vec<(String, String)>, ApiError> {
    let value: Value = serde_json::from_str(body).map_err(|e| ApiError::Payload(e.to_string()))?;
    let hits = value
        .get(3)
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::Payload("missing display field list".to_string()))?;

    hits.iter()
        .map(|hit| match hit.as_array().map(Vec::as_slice) {
            Some([code, name, ..]) => match (code.as_str(), name.as_str()) {
                (Some(code), Some(name)) => Ok((code.to_string(), name.to_string())),
                _ => Err(ApiError::Payload(format!("non-string field in {}", hit))),
            },
            _ => Err(ApiError::Payload(format!("malformed hit {}", hit))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(200, true)]
    #[case(204, true)]
    #[case(301, false)]
    #[case(404, false)]
    #[case(500, false)]
    fn test_check_status(#[case] status: u16, #[case] ok: bool) {
        assert_eq!(check_status(status).is_ok(), ok);
    }

    #[test]
    fn test_parse_clinical_tables() {
        let body = r#"[2,["A00.0","A00.1"],null,[["A00.0","Cholera due to Vibrio cholerae 01, biovar cholerae"],["A00.1","Cholera due to Vibrio cholerae 01, biovar eltor"]]]"#;
        let hits = parse_clinical_tables(body).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, "A00.0");
        assert!(hits[1].1.ends_with("biovar eltor"));
    }

    #[test]
    fn test_parse_clinical_tables_rejects_garbage() {
        assert!(matches!(parse_clinical_tables("{}"), Err(ApiError::Payload(_))));
        assert!(matches!(parse_clinical_tables("not json"), Err(ApiError::Payload(_))));
        assert!(matches!(parse_clinical_tables(r#"[1,[],null,[["A00"]]]"#), Err(ApiError::Payload(_))));
    }
}
