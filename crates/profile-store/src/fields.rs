//! Field identifiers for single-column updates.

use std::str::FromStr;

use crate::models::{AgentConfig, BusinessProfile, Language, ResponseLength, ResponseTone};
use crate::validation::ValidationError;

/// Normalise `companyName` / `company-name` / `company_name` to one key.
fn field_key(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Business profile field identifiers for updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusinessField {
    CompanyName,
    BusinessCategory,
    SupportPhone,
    BusinessEmail,
    OperatingHoursStart,
    OperatingHoursEnd,
}

impl BusinessField {
    pub const ALL: [BusinessField; 6] = [
        BusinessField::CompanyName,
        BusinessField::BusinessCategory,
        BusinessField::SupportPhone,
        BusinessField::BusinessEmail,
        BusinessField::OperatingHoursStart,
        BusinessField::OperatingHoursEnd,
    ];

    /// Get the database column name for this field.
    pub fn column_name(&self) -> &'static str {
        match self {
            BusinessField::CompanyName => "company_name",
            BusinessField::BusinessCategory => "business_category",
            BusinessField::SupportPhone => "support_phone",
            BusinessField::BusinessEmail => "business_email",
            BusinessField::OperatingHoursStart => "operating_hours_start",
            BusinessField::OperatingHoursEnd => "operating_hours_end",
        }
    }

    /// Read this field from a profile.
    pub fn get<'a>(&self, profile: &'a BusinessProfile) -> &'a str {
        match self {
            BusinessField::CompanyName => &profile.company_name,
            BusinessField::BusinessCategory => &profile.business_category,
            BusinessField::SupportPhone => &profile.support_phone,
            BusinessField::BusinessEmail => &profile.business_email,
            BusinessField::OperatingHoursStart => &profile.operating_hours_start,
            BusinessField::OperatingHoursEnd => &profile.operating_hours_end,
        }
    }

    /// Write this field on a profile. Business fields are free text.
    pub fn apply(&self, profile: &mut BusinessProfile, value: &str) {
        let slot = match self {
            BusinessField::CompanyName => &mut profile.company_name,
            BusinessField::BusinessCategory => &mut profile.business_category,
            BusinessField::SupportPhone => &mut profile.support_phone,
            BusinessField::BusinessEmail => &mut profile.business_email,
            BusinessField::OperatingHoursStart => &mut profile.operating_hours_start,
            BusinessField::OperatingHoursEnd => &mut profile.operating_hours_end,
        };
        *slot = value.to_string();
    }
}

impl FromStr for BusinessField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = field_key(s);
        Self::ALL
            .iter()
            .copied()
            .find(|f| field_key(f.column_name()) == key)
            .ok_or_else(|| ValidationError::UnknownField(s.to_string()))
    }
}

/// Agent configuration field identifiers for updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentField {
    GreetingMessage,
    ResponseTone,
    Language,
    MaxResponseLength,
}

impl AgentField {
    pub const ALL: [AgentField; 4] = [
        AgentField::GreetingMessage,
        AgentField::ResponseTone,
        AgentField::Language,
        AgentField::MaxResponseLength,
    ];

    /// Get the database column name for this field.
    pub fn column_name(&self) -> &'static str {
        match self {
            AgentField::GreetingMessage => "greeting_message",
            AgentField::ResponseTone => "response_tone",
            AgentField::Language => "language",
            AgentField::MaxResponseLength => "max_response_length",
        }
    }

    /// Check a raw form value and return the canonical stored text.
    ///
    /// `max_response_length` also accepts the slider positions `0`, `1` and `2`.
    pub fn normalize(&self, value: &str) -> Result<String, ValidationError> {
        match self {
            AgentField::GreetingMessage => Ok(value.to_string()),
            AgentField::ResponseTone => Ok(value.parse::<ResponseTone>()?.to_string()),
            AgentField::Language => Ok(value.parse::<Language>()?.to_string()),
            AgentField::MaxResponseLength => {
                let slider = value
                    .trim()
                    .parse::<u8>()
                    .ok()
                    .and_then(ResponseLength::from_slider);
                match slider {
                    Some(length) => Ok(length.to_string()),
                    None => Ok(value.parse::<ResponseLength>()?.to_string()),
                }
            }
        }
    }

    /// Write this field on a config. The value must already be normalised.
    pub fn apply(&self, config: &mut AgentConfig, value: &str) -> Result<(), ValidationError> {
        match self {
            AgentField::GreetingMessage => config.greeting_message = value.to_string(),
            AgentField::ResponseTone => config.response_tone = value.parse()?,
            AgentField::Language => config.language = value.parse()?,
            AgentField::MaxResponseLength => config.max_response_length = value.parse()?,
        }
        Ok(())
    }
}

impl FromStr for AgentField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = field_key(s);
        Self::ALL
            .iter()
            .copied()
            .find(|f| field_key(f.column_name()) == key)
            .ok_or_else(|| ValidationError::UnknownField(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_field_from_str() {
        assert_eq!("companyName".parse(), Ok(BusinessField::CompanyName));
        assert_eq!("company_name".parse(), Ok(BusinessField::CompanyName));
        assert_eq!(
            "operatingHoursEnd".parse(),
            Ok(BusinessField::OperatingHoursEnd)
        );
        assert_eq!(
            "businessEmail".parse::<BusinessField>(),
            Ok(BusinessField::BusinessEmail)
        );
        assert!(matches!(
            "favouriteColour".parse::<BusinessField>(),
            Err(ValidationError::UnknownField(_))
        ));
    }

    #[test]
    fn test_business_field_apply() {
        let mut profile = BusinessProfile::default();
        BusinessField::CompanyName.apply(&mut profile, "ABC Insurance");
        BusinessField::OperatingHoursStart.apply(&mut profile, "08:30");

        assert_eq!(profile.company_name, "ABC Insurance");
        assert_eq!(BusinessField::CompanyName.get(&profile), "ABC Insurance");
        assert_eq!(profile.operating_hours_start, "08:30");
        assert_eq!(profile.operating_hours_end, "17:00");
    }

    #[test]
    fn test_agent_field_normalize() {
        assert_eq!(
            AgentField::ResponseTone.normalize("friendly").unwrap(),
            "Friendly"
        );
        assert_eq!(AgentField::Language.normalize("Hinglish").unwrap(), "Hinglish");
        assert_eq!(AgentField::MaxResponseLength.normalize("0").unwrap(), "Short");
        assert_eq!(AgentField::MaxResponseLength.normalize("2").unwrap(), "Long");
        assert_eq!(
            AgentField::MaxResponseLength.normalize("Medium").unwrap(),
            "Medium"
        );
        assert_eq!(
            AgentField::GreetingMessage.normalize("Hi, I am Rose").unwrap(),
            "Hi, I am Rose"
        );

        assert!(AgentField::Language.normalize("French").is_err());
        assert!(AgentField::MaxResponseLength.normalize("3").is_err());
    }

    #[test]
    fn test_agent_field_apply() {
        let mut config = AgentConfig::default();
        AgentField::ResponseTone.apply(&mut config, "Formal").unwrap();
        AgentField::MaxResponseLength.apply(&mut config, "Long").unwrap();

        assert_eq!(config.response_tone, ResponseTone::Formal);
        assert_eq!(config.max_response_length, ResponseLength::Long);
        assert_eq!(config.language, Language::English);
        assert!(AgentField::Language.apply(&mut config, "Klingon").is_err());
    }
}
