use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// A single rejected value, addressed by its path from the document root
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub code: IssueCode,
    pub message: String,
    pub path: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidType,
    InvalidString,
    InvalidDate,
    TooSmall,
    TooBig,
    InvalidEnumValue,
    UnrecognizedKeys,
    InvalidUnion,
    InvalidJson,
}

/// Schema rejection carrying every issue found in one pass
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ValidationError {
    pub issues: Vec<Issue>,
}

impl ValidationError {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    pub fn single(code: IssueCode, message: impl Into<String>, path: Vec<Value>) -> Self {
        Self {
            issues: vec![Issue {
                code,
                message: message.into(),
                path,
            }],
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::single(IssueCode::InvalidJson, message, vec![])
    }

    /// Issue list as the `details` array of the error envelope
    pub fn details(&self) -> Value {
        serde_json::to_value(&self.issues).unwrap_or(Value::Array(vec![]))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .issues
            .iter()
            .map(|issue| {
                if issue.path.is_empty() {
                    issue.message.clone()
                } else {
                    let path: Vec<String> = issue
                        .path
                        .iter()
                        .map(|p| match p {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect();
                    format!("{}: {}", path.join("."), issue.message)
                }
            })
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}
