pub fn validate_account_name(name: &str) -> Result<(), String> {
    if !(2..=20).contains(&name.len()) {
        return Err(format!(
            "Failed account name length check: 2 <= length={} <= 20",
            name.len()
        ));
    }
    for c in name.chars() {
        if !char_allowed(c) {
            return Err(format!(
                "Disallowed characters found in account name: '{c}' code={:x}",
                c as u32
            ));
        }
    }
    Ok(())
}

pub fn validate_team_name(name: &str) -> Result<(), String> {
    validate_title("Team name", name, 40)
}

pub fn validate_season_name(name: &str) -> Result<(), String> {
    validate_title("Season name", name, 60)
}

pub fn validate_newsletter(title: &str, content: &str) -> Result<(), String> {
    validate_title("Newsletter title", title, 120)?;
    const MAX: usize = 20_000;
    if content.chars().count() > MAX {
        return Err(format!("Newsletter content must be at most {MAX} characters"));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), String> {
    const MAX: usize = 500;
    if description.chars().count() > MAX {
        return Err(format!("Description must be at most {MAX} characters"));
    }
    Ok(())
}

pub fn validate_image_url(url: &str) -> Result<(), String> {
    const MAX: usize = 2048;
    if url.len() > MAX {
        return Err(format!("Image URL must be at most {MAX} bytes"));
    }
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(format!("Image URL must be http(s): {url}"));
    }
    Ok(())
}

// Only the shape; deliverability is Kratos' business.
pub fn normalize_email(email: &str) -> Result<String, String> {
    let email = email.trim().to_lowercase();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(format!("Not an e-mail address: {email}"));
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') || email.len() > 254 {
        return Err(format!("Not an e-mail address: {email}"));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(format!("Not an e-mail address: {email}"));
    }
    Ok(email)
}

fn validate_title(what: &str, s: &str, max: usize) -> Result<(), String> {
    let len = s.chars().count();
    if !(1..=max).contains(&len) || s.trim().is_empty() {
        return Err(format!("{what} must be 1 to {max} characters, got {len}"));
    }
    if s.chars().any(char::is_control) {
        return Err(format!("{what} must not contain control characters"));
    }
    Ok(())
}

fn char_allowed(c: char) -> bool {
    c.is_alphanumeric() && c.is_ascii() || c == '-' || c == '_'
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn team_names() {
        assert!(validate_team_name("Net Results").is_ok());
        assert!(validate_team_name("").is_err());
        assert!(validate_team_name("   ").is_err());
        assert!(validate_team_name(&"x".repeat(40)).is_ok());
        assert!(validate_team_name(&"x".repeat(41)).is_err());
        assert!(validate_team_name("tab\there").is_err());
    }

    #[test]
    fn emails() {
        assert_eq!(
            normalize_email(" Spike@Example.COM ").as_deref(),
            Ok("spike@example.com")
        );
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("a@b@c").is_err());
        assert!(normalize_email("a b@c.com").is_err());
    }

    #[test]
    fn image_urls() {
        assert!(validate_image_url("https://cdn.example.com/gd/1.jpg").is_ok());
        assert!(validate_image_url("ftp://example.com/1.jpg").is_err());
    }
}
