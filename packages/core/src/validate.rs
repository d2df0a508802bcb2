//! Input validators
//!
//! Pure predicates over raw operator input. None of these touch the
//! filesystem or network.

/// Accept `https://...<anything>.git`
///
/// Only the scheme prefix and the `.git` suffix are checked, so the
/// degenerate `https://.git` passes. Whatever sits in between is left to
/// git and to project name derivation.
pub fn is_valid_repo_url(input: &str) -> bool {
    input
        .strip_prefix("https://")
        .is_some_and(|rest| rest.ends_with(".git"))
}

/// Accept four dot-separated groups of ASCII digits
///
/// Octets are not range checked: `999.999.999.999` is accepted.
pub fn is_valid_ipv4_syntax(input: &str) -> bool {
    let groups: Vec<&str> = input.split('.').collect();
    groups.len() == 4
        && groups
            .iter()
            .all(|g| !g.is_empty() && g.chars().all(|c| c.is_ascii_digit()))
}

/// Parse a port number in `1..=65535`
///
/// Only plain digit strings are accepted; signs, whitespace and empty
/// input are rejected.
pub fn parse_port(input: &str) -> Result<u16, String> {
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return Err("Invalid port number. Must be between 1 and 65535.".to_string());
    }

    let port: u16 = input
        .parse()
        .map_err(|_| "Invalid port number. Must be between 1 and 65535.".to_string())?;

    if port == 0 {
        return Err("Port 0 is reserved. Use a port between 1 and 65535.".to_string());
    }

    Ok(port)
}

pub fn is_valid_port(input: &str) -> bool {
    parse_port(input).is_ok()
}

/// Check that a name is usable as a single path segment and a Docker name
///
/// Must start with an ASCII alphanumeric and contain only ASCII
/// alphanumerics, `.`, `_` and `-`.
pub fn is_safe_project_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Accept a non-empty login name that cannot be mistaken for an ssh option
pub fn is_valid_ssh_user(user: &str) -> bool {
    !user.is_empty()
        && !user.starts_with('-')
        && user
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Accept a branch name that git can check out and that cannot be read
/// as a git option
///
/// Follows the `git check-ref-format --branch` rules that matter here: no
/// leading `-`, no whitespace or control characters, none of `~^:?*[\`,
/// no `..`, `@{` or `//`, no component starting with `.`, and no trailing
/// `/`, `.` or `.lock`.
pub fn is_valid_branch_name(name: &str) -> bool {
    if name.is_empty() || name == "@" || name.starts_with('-') {
        return false;
    }
    if name.starts_with('/') || name.ends_with('/') || name.ends_with('.') || name.ends_with(".lock") {
        return false;
    }
    if name.contains("..") || name.contains("@{") || name.contains("//") {
        return false;
    }
    if name.split('/').any(|part| part.starts_with('.')) {
        return false;
    }
    name.chars().all(|c| {
        !c.is_control()
            && !c.is_whitespace()
            && !matches!(c, '~' | '^' | ':' | '?' | '*' | '[' | '\\')
    })
}
