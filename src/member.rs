use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

pub type MemberId = i64;

pub const DEFAULT_COLOR: &str = "#3B82F6";

/// A person who can be given duties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    /// External messaging identity, e.g. a chat handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_handle: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_emoji: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_active() -> bool {
    true
}

impl Member {
    pub fn new(id: MemberId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            contact_handle: None,
            color: default_color(),
            avatar_emoji: None,
            active: true,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_contact_handle(mut self, handle: impl Into<String>) -> Self {
        self.contact_handle = Some(handle.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Member fields supplied by an admin before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_handle: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_emoji: Option<String>,
}

impl NewMember {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact_handle: None,
            color: default_color(),
            avatar_emoji: None,
        }
    }

    /// Trim fields, drop blank optionals and validate the result.
    pub fn normalized(self) -> Result<Self, MemberValidationError> {
        let blank_to_none = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let normalized = Self {
            name: self.name.trim().to_string(),
            contact_handle: blank_to_none(self.contact_handle),
            color: self.color.trim().to_string(),
            avatar_emoji: blank_to_none(self.avatar_emoji),
        };
        validate_fields(&normalized.name, &normalized.color)?;
        Ok(normalized)
    }

    pub fn into_member(self, id: MemberId) -> Member {
        Member {
            id,
            name: self.name,
            contact_handle: self.contact_handle,
            color: self.color,
            avatar_emoji: self.avatar_emoji,
            active: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemberValidationError {
    #[error("member name must not be empty")]
    EmptyName,
    #[error("invalid color '{0}' (expected #RRGGBB)")]
    InvalidColor(String),
    #[error("duplicate member id {0}")]
    DuplicateId(MemberId),
}

fn is_hex_color(color: &str) -> bool {
    let bytes = color.as_bytes();
    bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(u8::is_ascii_hexdigit)
}

fn validate_fields(name: &str, color: &str) -> Result<(), MemberValidationError> {
    if name.trim().is_empty() {
        return Err(MemberValidationError::EmptyName);
    }
    if !is_hex_color(color) {
        return Err(MemberValidationError::InvalidColor(color.to_string()));
    }
    Ok(())
}

pub fn validate_member(member: &Member) -> Result<(), MemberValidationError> {
    validate_fields(&member.name, &member.color)
}

pub fn validate_member_collection(members: &[Member]) -> Result<(), MemberValidationError> {
    let mut seen_ids = HashSet::with_capacity(members.len());
    for member in members {
        if !seen_ids.insert(member.id) {
            return Err(MemberValidationError::DuplicateId(member.id));
        }
        validate_member(member)?;
    }
    Ok(())
}
