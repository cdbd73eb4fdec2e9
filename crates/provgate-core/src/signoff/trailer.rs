//! `Signed-off-by:` trailer parsing.
//!
//! Grammar, per line after leading whitespace is trimmed:
//!
//! ```text
//! Signed-off-by: <name> <<email>>
//! ```
//!
//! The name is everything between the prefix and the last `<`, trimmed, and
//! must be non-empty. The email sits in angle brackets at the end of the
//! line and must contain exactly one `@` with text on both sides. Lines that
//! do not match are ignored.

use super::Identity;

/// Literal prefix of a sign-off trailer.
pub const SIGN_OFF_PREFIX: &str = "Signed-off-by:";

/// First sign-off trailer in `message`, if any.
pub fn parse_sign_off(message: &str) -> Option<Identity> {
    message.lines().find_map(parse_line)
}

/// Every sign-off trailer in `message`, in order.
pub fn parse_sign_offs(message: &str) -> Vec<Identity> {
    message.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<Identity> {
    let rest = line.trim_start().strip_prefix(SIGN_OFF_PREFIX)?;
    let rest = rest.trim_end();

    let inner = rest.strip_suffix('>')?;
    let open = inner.rfind('<')?;
    let name = inner[..open].trim();
    let email = inner[open + 1..].trim();

    if name.is_empty() || !is_plausible_email(email) {
        return None;
    }

    Some(Identity {
        name: name.to_string(),
        email: email.to_string(),
    })
}

fn is_plausible_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.is_empty()
                && !email.chars().any(|c| c.is_whitespace() || c == '<' || c == '>')
        }
        _ => false,
    }
}
