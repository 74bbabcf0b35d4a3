use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

use crate::domain::entities::domain::VerificationType;

/// Random bytes per token; 24 bytes encode to 32 base64url characters.
const TOKEN_BYTES: usize = 24;

/// DNS challenge material issued for a custom domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeMaterial {
    pub verification_type: VerificationType,
    pub token: String,
    pub record_name: String,
    pub record_value: String,
}

/// Generate a fresh TXT challenge for `host`.
///
/// The record name is deterministic (`_<platform>-challenge.<host>`); the token
/// is `<platform>_` followed by 32 base64url characters from the OS RNG.
pub fn generate_challenge(platform_name: &str, host: &str) -> ChallengeMaterial {
    let token = generate_token(platform_name);
    ChallengeMaterial {
        verification_type: VerificationType::Txt,
        record_name: challenge_record_name(platform_name, host),
        record_value: format!("{platform_name}-verification={token}"),
        token,
    }
}

pub fn challenge_record_name(platform_name: &str, host: &str) -> String {
    format!("_{platform_name}-challenge.{host}")
}

fn generate_token(platform_name: &str) -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    format!("{}_{}", platform_name, URL_SAFE_NO_PAD.encode(bytes))
}
