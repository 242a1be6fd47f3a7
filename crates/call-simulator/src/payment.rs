//! Payment form masks and the placeholder number generator.
//!
//! Nothing here talks to a payment gateway. The checks are shape-only: no
//! Luhn check and no expiry range check.

use profile_store::ValidationError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Digits in a card number.
pub const CARD_DIGITS: usize = 16;

/// Digits in an expiry date (`MMYY`).
pub const EXPIRY_DIGITS: usize = 4;

/// Digits in a CVV.
pub const CVV_DIGITS: usize = 3;

/// Group a card number in fours: `1234567890123456` → `1234 5678 9012 3456`.
///
/// Whitespace is ignored. Any other non-digit, or more than 16 digits, is refused.
pub fn format_card_number(input: &str) -> Result<String, ValidationError> {
    let digits: String = input.chars().filter(|c| !c.is_whitespace()).collect();

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "card_number".to_string(),
            reason: "only digits are allowed".to_string(),
        });
    }
    if digits.len() > CARD_DIGITS {
        return Err(ValidationError::TooLong {
            field: "card_number".to_string(),
            max: CARD_DIGITS,
            actual: digits.len(),
        });
    }

    let groups: Vec<&str> = digits
        .as_bytes()
        .chunks(4)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect();
    Ok(groups.join(" "))
}

/// Mask an expiry date: `1225` → `12/25`.
///
/// Non-digits are dropped first, so `12/25` stays `12/25`. More than four
/// digits is refused.
pub fn format_expiry(input: &str) -> Result<String, ValidationError> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() > EXPIRY_DIGITS {
        return Err(ValidationError::TooLong {
            field: "expiry".to_string(),
            max: EXPIRY_DIGITS,
            actual: digits.len(),
        });
    }

    if digits.len() >= 2 {
        Ok(format!("{}/{}", &digits[..2], &digits[2..]))
    } else {
        Ok(digits)
    }
}

/// Accept up to three CVV digits.
pub fn sanitize_cvv(input: &str) -> Result<String, ValidationError> {
    if !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "cvv".to_string(),
            reason: "only digits are allowed".to_string(),
        });
    }
    if input.len() > CVV_DIGITS {
        return Err(ValidationError::TooLong {
            field: "cvv".to_string(),
            max: CVV_DIGITS,
            actual: input.len(),
        });
    }
    Ok(input.to_string())
}

/// Whether a masked expiry has the full `MM/YY` shape.
pub fn is_expiry_shape(expiry: &str) -> bool {
    let bytes = expiry.as_bytes();
    bytes.len() == 5
        && bytes[2] == b'/'
        && bytes[..2].iter().all(u8::is_ascii_digit)
        && bytes[3..].iter().all(u8::is_ascii_digit)
}

/// The four payment form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    #[serde(default)]
    pub card_holder: String,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub expiry: String,
    #[serde(default)]
    pub cvv: String,
}

impl PaymentDetails {
    /// Apply the input masks to every field.
    pub fn masked(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            card_holder: self.card_holder.clone(),
            card_number: format_card_number(&self.card_number)?,
            expiry: format_expiry(&self.expiry)?,
            cvv: sanitize_cvv(&self.cvv)?,
        })
    }

    /// Whether every field has a value. The activate action is enabled only then.
    pub fn is_complete(&self) -> bool {
        [&self.card_holder, &self.card_number, &self.expiry, &self.cvv]
            .iter()
            .all(|f| !f.trim().is_empty())
    }

    /// Mask and check the form, returning the masked details.
    pub fn validate(&self) -> Result<Self, ValidationError> {
        let masked = self.masked()?;

        for (field, value) in [
            ("card_holder", &masked.card_holder),
            ("card_number", &masked.card_number),
            ("expiry", &masked.expiry),
            ("cvv", &masked.cvv),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::Empty(field.to_string()));
            }
        }

        if !is_expiry_shape(&masked.expiry) {
            return Err(ValidationError::InvalidFormat {
                field: "expiry".to_string(),
                reason: "expected MM/YY".to_string(),
            });
        }

        Ok(masked)
    }
}

/// Fabricate a placeholder number of the form `+1 437 NNN NNNN`.
pub fn generate_phone_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "+1 437 {} {}",
        rng.gen_range(100..=999),
        rng.gen_range(1000..=9999)
    )
}

/// Whether `number` has the `+1 437 NNN NNNN` shape.
pub fn is_placeholder_number(number: &str) -> bool {
    let mut parts = number.split(' ');
    let shape = [
        parts.next() == Some("+1"),
        parts.next() == Some("437"),
        parts
            .next()
            .is_some_and(|p| p.len() == 3 && p.bytes().all(|b| b.is_ascii_digit())),
        parts
            .next()
            .is_some_and(|p| p.len() == 4 && p.bytes().all(|b| b.is_ascii_digit())),
    ];
    shape.iter().all(|ok| *ok) && parts.next().is_none()
}
