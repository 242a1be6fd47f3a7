//! Record models shared by every store backend.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use crate::validation::ValidationError;

/// Business categories offered by the dashboard form. Free text is still accepted.
pub const BUSINESS_CATEGORIES: [&str; 5] = [
    "Insurance",
    "Real Estate",
    "E-commerce",
    "Healthcare",
    "Education",
];

/// Greeting used until the owner writes their own.
pub const DEFAULT_GREETING: &str = "Hello, how can I assist you today?";

/// Business information shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BusinessProfile {
    #[serde(default, deserialize_with = "nullable_text")]
    pub company_name: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub business_category: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub support_phone: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub business_email: String,
    /// Opening time, `HH:MM`.
    #[serde(default = "default_hours_start", deserialize_with = "nullable_hours_start")]
    pub operating_hours_start: String,
    /// Closing time, `HH:MM`.
    #[serde(default = "default_hours_end", deserialize_with = "nullable_hours_end")]
    pub operating_hours_end: String,
}

// Hosted tables allow NULL in the text columns; read those as the form defaults.
fn nullable_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn nullable_hours_start<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_hours_start))
}

fn nullable_hours_end<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_hours_end))
}

fn default_hours_start() -> String {
    "09:00".to_string()
}

fn default_hours_end() -> String {
    "17:00".to_string()
}

impl Default for BusinessProfile {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            business_category: String::new(),
            support_phone: String::new(),
            business_email: String::new(),
            operating_hours_start: default_hours_start(),
            operating_hours_end: default_hours_end(),
        }
    }
}

/// A stored business profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BusinessProfileRecord {
    /// Row identifier.
    pub id: String,
    /// Identity of the owning user.
    pub user_id: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub profile: BusinessProfile,
}

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                #[sqlx(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every accepted value, in display order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stored and displayed form of the value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| ValidationError::InvalidChoice {
                        field: $label.to_string(),
                        value: s.to_string(),
                        allowed: Self::ALL.iter().map(|v| v.as_str()).collect(),
                    })
            }
        }
    };
}

text_enum! {
    /// How the agent phrases its answers.
    ResponseTone, "response_tone" {
        Professional => "Professional",
        Friendly => "Friendly",
        Formal => "Formal",
    }
}

text_enum! {
    /// Language the agent speaks.
    Language, "language" {
        English => "English",
        Hindi => "Hindi",
        Hinglish => "Hinglish",
    }
}

text_enum! {
    /// Upper bound on how long the agent's answers run.
    ResponseLength, "max_response_length" {
        Short => "Short",
        Medium => "Medium",
        Long => "Long",
    }
}

text_enum! {
    /// Processing stage of an uploaded document.
    ///
    /// Variants are declared in pipeline order, so `Ord` follows the stage sequence.
    DocumentStatus, "status" {
        Processing => "processing",
        Indexed => "indexed",
        Ready => "ready",
    }
}

impl PartialOrd for DocumentStatus {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DocumentStatus {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (*self as u8).cmp(&(*other as u8))
    }
}

impl DocumentStatus {
    /// Stages a document may be in for a move to `self` to take effect.
    pub fn replaceable(self) -> impl Iterator<Item = DocumentStatus> {
        Self::ALL.iter().copied().filter(move |s| *s <= self)
    }
}

impl Default for ResponseTone {
    fn default() -> Self {
        ResponseTone::Professional
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}

impl Default for ResponseLength {
    fn default() -> Self {
        ResponseLength::Medium
    }
}

impl ResponseLength {
    /// Map a three-stop slider position (0, 1, 2) to a length.
    pub fn from_slider(position: u8) -> Option<Self> {
        match position {
            0 => Some(ResponseLength::Short),
            1 => Some(ResponseLength::Medium),
            2 => Some(ResponseLength::Long),
            _ => None,
        }
    }

    /// Slider position for this length.
    pub fn slider_position(&self) -> u8 {
        match self {
            ResponseLength::Short => 0,
            ResponseLength::Medium => 1,
            ResponseLength::Long => 2,
        }
    }
}

/// Parameters steering the simulated call agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AgentConfig {
    pub greeting_message: String,
    pub response_tone: ResponseTone,
    pub language: Language,
    pub max_response_length: ResponseLength,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            greeting_message: DEFAULT_GREETING.to_string(),
            response_tone: ResponseTone::default(),
            language: Language::default(),
            max_response_length: ResponseLength::default(),
        }
    }
}

/// A stored agent configuration row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AgentConfigRecord {
    pub id: String,
    pub business_id: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub config: AgentConfig,
}

/// Uploaded reference document metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct KnowledgeDocument {
    pub id: String,
    pub business_id: String,
    pub file_name: String,
    pub status: DocumentStatus,
    /// Percentage in `0..=100`.
    pub upload_progress: u8,
    #[serde(default)]
    pub created_at: String,
}

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ActivationStatus {
    pub is_active: bool,
    /// Fabricated number in the form `+1 437 NNN NNNN`.
    pub phone_number: String,
    /// RFC 3339 timestamp.
    pub activated_at: String,
}

/// A stored activation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ActivationRecord {
    pub id: String,
    pub business_id: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub status: ActivationStatus,
}
