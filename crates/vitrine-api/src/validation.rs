/// Registration-time input checks, kept separate from moderation so the
/// password rules read in one place.

const PASSWORD_SPECIALS: &[char] = &['$', '%', '&', '!', ':', '.'];

/// Password policy: at least 8 characters, ASCII letters/digits plus the
/// allowed specials only, at least one uppercase letter and one special.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("password must be at least 8 characters long".to_string());
    }

    if !password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(&c))
    {
        return Err(
            "password may only contain latin letters, digits and $%&!:. specials".to_string(),
        );
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("password must contain at least one uppercase letter".to_string());
    }

    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(&c)) {
        return Err("password must contain at least one of $%&!:.".to_string());
    }

    Ok(())
}

/// Phone numbers are +7 followed by exactly 10 digits.
pub fn validate_phone(phone: &str) -> Result<(), String> {
    let rest = phone
        .strip_prefix("+7")
        .ok_or_else(|| "phone must start with +7".to_string())?;

    if rest.len() != 10 || !rest.chars().all(|c| c.is_ascii_digit()) {
        return Err("phone must be +7 followed by exactly 10 digits".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_conforming_password() {
        assert!(validate_password("Secret$123").is_ok());
    }

    #[test]
    fn rejects_short_passwords() {
        assert!(validate_password("Ab$1").is_err());
    }

    #[test]
    fn rejects_non_latin_characters() {
        assert!(validate_password("Пароль$123").is_err());
    }

    #[test]
    fn rejects_missing_uppercase() {
        assert!(validate_password("secret$123").is_err());
    }

    #[test]
    fn rejects_missing_special() {
        assert!(validate_password("Secret123").is_err());
    }

    #[test]
    fn accepts_a_conforming_phone() {
        assert!(validate_phone("+79161234567").is_ok());
    }

    #[test]
    fn rejects_wrong_prefix_and_length() {
        assert!(validate_phone("89161234567").is_err());
        assert!(validate_phone("+7916123456").is_err());
        assert!(validate_phone("+791612345678").is_err());
        assert!(validate_phone("+7916123456a").is_err());
    }
}
