//! Token command implementation.

use tagtrail_server::{AuthConfig, TokenIdentityProvider};

/// Issues a token for `subject` signed with `secret`.
pub fn issue(
    secret: &[u8],
    subject: &str,
    email: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let provider = TokenIdentityProvider::new(AuthConfig::new(secret.to_vec()));
    Ok(provider.issue_token(subject, email)?)
}

/// Runs the token command.
pub fn run(secret: &[u8], subject: &str, email: &str) -> Result<(), Box<dyn std::error::Error>> {
    let token = issue(secret, subject, email)?;
    eprintln!("Subject: {subject}");
    println!("{token}");
    Ok(())
}
