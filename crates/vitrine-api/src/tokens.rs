use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use vitrine_db::models::UserRow;

type HmacSha256 = Hmac<Sha256>;

/// Signed single-purpose tokens for the email links. Each token is an HMAC
/// over the account state relevant to its purpose, so completing the action
/// (verifying the address, changing the password) invalidates the token that
/// performed it without any server-side token storage.
#[derive(Debug, Clone, Copy)]
pub enum TokenPurpose {
    VerifyEmail,
    ResetPassword,
}

impl TokenPurpose {
    fn as_str(self) -> &'static str {
        match self {
            TokenPurpose::VerifyEmail => "verify-email",
            TokenPurpose::ResetPassword => "reset-password",
        }
    }
}

fn fingerprint(purpose: TokenPurpose, user: &UserRow) -> String {
    match purpose {
        // Bound to the verified flag: flipping it kills outstanding links.
        TokenPurpose::VerifyEmail => format!(
            "{}:{}:{}:{}",
            purpose.as_str(),
            user.id,
            user.email,
            user.email_verified
        ),
        // Bound to the current hash: a successful reset kills the token.
        TokenPurpose::ResetPassword => format!(
            "{}:{}:{}:{}",
            purpose.as_str(),
            user.id,
            user.email,
            user.password
        ),
    }
}

pub fn issue_account_token(secret: &str, purpose: TokenPurpose, user: &UserRow) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid HMAC key: {}", e))?;
    mac.update(fingerprint(purpose, user).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check; any malformed input just fails the check.
pub fn check_account_token(
    secret: &str,
    purpose: TokenPurpose,
    user: &UserRow,
    token: &str,
) -> bool {
    let Ok(raw) = hex::decode(token) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(fingerprint(purpose, user).as_bytes());
    mac.verify_slice(&raw).is_ok()
}

/// User ids travel in links as URL-safe base64, mirroring the uid segment of
/// the original verification URLs.
pub fn encode_uid(id: Uuid) -> String {
    URL_SAFE_NO_PAD.encode(id.to_string())
}

pub fn decode_uid(encoded: &str) -> Option<Uuid> {
    let raw = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    let text = String::from_utf8(raw).ok()?;
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn user() -> UserRow {
        UserRow {
            id: Uuid::new_v4().to_string(),
            username: None,
            email: "user@example.com".to_string(),
            password: "$argon2id$stub".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            middle_name: None,
            message: None,
            phone: None,
            is_staff: false,
            is_superuser: false,
            email_verified: false,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn issued_tokens_verify() {
        let user = user();
        let token = issue_account_token(SECRET, TokenPurpose::VerifyEmail, &user).unwrap();
        assert!(check_account_token(
            SECRET,
            TokenPurpose::VerifyEmail,
            &user,
            &token
        ));
    }

    #[test]
    fn purpose_is_part_of_the_signature() {
        let user = user();
        let token = issue_account_token(SECRET, TokenPurpose::VerifyEmail, &user).unwrap();
        assert!(!check_account_token(
            SECRET,
            TokenPurpose::ResetPassword,
            &user,
            &token
        ));
    }

    #[test]
    fn tampered_tokens_fail() {
        let user = user();
        let mut token = issue_account_token(SECRET, TokenPurpose::VerifyEmail, &user).unwrap();
        token.replace_range(0..2, "ff");
        let tampered = token;
        // Either the flip changed the MAC or it happened to match the old
        // prefix; re-issue to compare.
        let original = issue_account_token(SECRET, TokenPurpose::VerifyEmail, &user).unwrap();
        if tampered != original {
            assert!(!check_account_token(
                SECRET,
                TokenPurpose::VerifyEmail,
                &user,
                &tampered
            ));
        }
        assert!(!check_account_token(
            SECRET,
            TokenPurpose::VerifyEmail,
            &user,
            "not-hex-at-all"
        ));
    }

    #[test]
    fn verification_token_dies_once_the_address_is_verified() {
        let mut user = user();
        let token = issue_account_token(SECRET, TokenPurpose::VerifyEmail, &user).unwrap();
        user.email_verified = true;
        assert!(!check_account_token(
            SECRET,
            TokenPurpose::VerifyEmail,
            &user,
            &token
        ));
    }

    #[test]
    fn reset_token_dies_with_the_old_password_hash() {
        let mut user = user();
        let token = issue_account_token(SECRET, TokenPurpose::ResetPassword, &user).unwrap();
        user.password = "$argon2id$new".to_string();
        assert!(!check_account_token(
            SECRET,
            TokenPurpose::ResetPassword,
            &user,
            &token
        ));
    }

    #[test]
    fn uid_roundtrips_and_rejects_garbage() {
        let id = Uuid::new_v4();
        assert_eq!(decode_uid(&encode_uid(id)), Some(id));
        assert_eq!(decode_uid("???not-base64"), None);
        assert_eq!(decode_uid(&URL_SAFE_NO_PAD.encode("not-a-uuid")), None);
    }
}
