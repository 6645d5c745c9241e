use lazy_static::lazy_static;
use regex::Regex;

use crate::response::FieldError;
use crate::users::dto::CreateUserRequest;
use crate::users::repo_types::Currency;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref NAME_RE: Regex = Regex::new(r"^[a-zA-Z\s'-]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[1-9]\d{7,14}$").unwrap();
    static ref IMAGE_EXT_RE: Regex = Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp|svg)$").unwrap();
}

/// Registration input after normalization: email lower-cased, phone stripped
/// of formatting, currency parsed. Password is still plaintext here; hashing
/// is the service layer's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone_number: String,
    pub profile_image_url: Option<String>,
    pub preferred_currency: Currency,
}

fn password_classes_ok(password: &str) -> bool {
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| c.is_ascii_punctuation());
    has_lower && has_upper && has_digit && has_special
}

/// Pure validation of raw registration input. Collects every error rather
/// than stopping at the first, so the client sees the full list.
pub fn validate_create_user(input: &CreateUserRequest) -> Result<ValidatedUser, Vec<FieldError>> {
    let mut errors = Vec::new();

    let email = input
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_default();
    if email.is_empty() {
        errors.push(FieldError::new("email", "Email is required"));
    } else if email.len() > 255 {
        errors.push(FieldError::new("email", "Email must not exceed 255 characters"));
    } else if !EMAIL_RE.is_match(&email) {
        errors.push(FieldError::new("email", "Invalid email format"));
    }

    let password = input.password.clone().unwrap_or_default();
    if password.is_empty() {
        errors.push(FieldError::new("password", "Password is required"));
    } else if password.len() < 8 {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 8 characters long",
        ));
    } else if password.len() > 128 {
        errors.push(FieldError::new(
            "password",
            "Password must not exceed 128 characters",
        ));
    } else if !password_classes_ok(&password) {
        errors.push(FieldError::new(
            "password",
            "Password must contain at least one uppercase letter, one lowercase letter, \
             one number, and one special character",
        ));
    }

    let full_name = input
        .full_name
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if full_name.is_empty() {
        errors.push(FieldError::new("full_name", "Full name is required"));
    } else if full_name.len() < 2 {
        errors.push(FieldError::new(
            "full_name",
            "Full name must be at least 2 characters long",
        ));
    } else if full_name.len() > 100 {
        errors.push(FieldError::new(
            "full_name",
            "Full name must not exceed 100 characters",
        ));
    } else if !NAME_RE.is_match(&full_name) {
        errors.push(FieldError::new(
            "full_name",
            "Full name can only contain letters, spaces, hyphens, and apostrophes",
        ));
    }

    // Common formatting characters are stripped before the shape check.
    let phone_number: String = input
        .phone_number
        .as_deref()
        .unwrap_or_default()
        .chars()
        .filter(|c| !matches!(*c, ' ' | '-' | '(' | ')' | '.'))
        .collect();
    if phone_number.is_empty() {
        errors.push(FieldError::new("phone_number", "Phone number is required"));
    } else if !PHONE_RE.is_match(&phone_number) {
        errors.push(FieldError::new(
            "phone_number",
            "Invalid phone number format. Must be 8-15 digits, optionally starting with +",
        ));
    }

    let profile_image_url = match input.profile_image_url.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(url) if url.len() > 500 => {
            errors.push(FieldError::new(
                "profile_image_url",
                "Profile image URL must not exceed 500 characters",
            ));
            None
        }
        Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
            errors.push(FieldError::new(
                "profile_image_url",
                "Invalid URL format for profile image",
            ));
            None
        }
        Some(url) if !IMAGE_EXT_RE.is_match(url) => {
            errors.push(FieldError::new(
                "profile_image_url",
                "Profile image URL must end with a valid image extension \
                 (.jpg, .jpeg, .png, .gif, .webp, .svg)",
            ));
            None
        }
        Some(url) => Some(url.to_string()),
    };

    let currency_raw = input
        .preferred_currency
        .as_deref()
        .map(|c| c.trim().to_uppercase())
        .unwrap_or_default();
    let preferred_currency = match parse_currency(&currency_raw) {
        Some(c) => Some(c),
        None => {
            if currency_raw.is_empty() {
                errors.push(FieldError::new(
                    "preferred_currency",
                    "Preferred currency is required",
                ));
            } else {
                errors.push(FieldError::new(
                    "preferred_currency",
                    "Preferred currency must be either NGN or USD",
                ));
            }
            None
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidatedUser {
        email,
        password,
        full_name,
        phone_number,
        profile_image_url,
        // Errors were empty, so the currency parsed.
        preferred_currency: preferred_currency.unwrap(),
    })
}

pub fn parse_currency(raw: &str) -> Option<Currency> {
    match raw.trim().to_uppercase().as_str() {
        "NGN" => Some(Currency::Ngn),
        "USD" => Some(Currency::Usd),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> CreateUserRequest {
        CreateUserRequest {
            email: Some("Ada.Obi@Example.COM".into()),
            password: Some("Str0ng!Pass".into()),
            full_name: Some("Ada Obi".into()),
            phone_number: Some("+234 801-234-5678".into()),
            profile_image_url: Some("https://cdn.example.com/ada.png".into()),
            preferred_currency: Some("ngn".into()),
        }
    }

    #[test]
    fn valid_input_is_normalized() {
        let validated = validate_create_user(&valid_input()).expect("input should validate");
        assert_eq!(validated.email, "ada.obi@example.com");
        assert_eq!(validated.phone_number, "+2348012345678");
        assert_eq!(validated.preferred_currency, Currency::Ngn);
        assert_eq!(
            validated.profile_image_url.as_deref(),
            Some("https://cdn.example.com/ada.png")
        );
    }

    #[test]
    fn empty_input_reports_every_required_field() {
        let input = CreateUserRequest {
            email: None,
            password: None,
            full_name: None,
            phone_number: None,
            profile_image_url: None,
            preferred_currency: None,
        };
        let errors = validate_create_user(&input).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["email", "password", "full_name", "phone_number", "preferred_currency"]
        );
        assert!(errors.iter().all(|e| e.message.contains("required")));
    }

    #[test]
    fn weak_passwords_are_rejected() {
        let mut input = valid_input();
        input.password = Some("short".into());
        let errors = validate_create_user(&input).unwrap_err();
        assert_eq!(errors[0].field, "password");
        assert!(errors[0].message.contains("at least 8"));

        input.password = Some("alllowercase1!".into());
        let errors = validate_create_user(&input).unwrap_err();
        assert!(errors[0].message.contains("uppercase"));
    }

    #[test]
    fn unknown_currency_is_rejected() {
        let mut input = valid_input();
        input.preferred_currency = Some("EUR".into());
        let errors = validate_create_user(&input).unwrap_err();
        assert_eq!(errors[0].field, "preferred_currency");
        assert!(errors[0].message.contains("NGN or USD"));
    }

    #[test]
    fn name_with_digits_is_rejected() {
        let mut input = valid_input();
        input.full_name = Some("Ada 0bi".into());
        let errors = validate_create_user(&input).unwrap_err();
        assert_eq!(errors[0].field, "full_name");
    }

    #[test]
    fn image_url_must_look_like_an_image() {
        let mut input = valid_input();
        input.profile_image_url = Some("https://cdn.example.com/ada.pdf".into());
        let errors = validate_create_user(&input).unwrap_err();
        assert_eq!(errors[0].field, "profile_image_url");

        input.profile_image_url = Some("ftp://cdn.example.com/ada.png".into());
        let errors = validate_create_user(&input).unwrap_err();
        assert!(errors[0].message.contains("Invalid URL"));

        // Empty string is treated as absent, not invalid.
        input.profile_image_url = Some("".into());
        let validated = validate_create_user(&input).expect("empty url should be dropped");
        assert!(validated.profile_image_url.is_none());
    }

    #[test]
    fn bad_phone_numbers_are_rejected() {
        let mut input = valid_input();
        input.phone_number = Some("0801".into());
        let errors = validate_create_user(&input).unwrap_err();
        assert_eq!(errors[0].field, "phone_number");
    }
}
