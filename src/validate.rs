//! Form validation rules and due date parsing.
//!
//! These mirror the validation the Todoz backend's other clients apply
//! before submitting: sign-up field rules, sign-in requirements, and the
//! add-task text/date requirements. Each helper returns the message to show
//! in the status bar on failure.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Display name: required, 6 to 15 characters.
pub fn validate_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Name is required".to_string());
    }
    if name.chars().count() < 6 {
        return Err("Name must be at least 6 characters".to_string());
    }
    if name.chars().count() > 15 {
        return Err("Name must be at most 15 characters".to_string());
    }
    Ok(())
}

/// Email: required, shaped like an address.
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err("Enter a valid email".to_string())
    }
}

/// Password: at least 6 characters with one lowercase, one uppercase,
/// one digit, and one of `@$!%*?&`.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < 6 {
        return Err("Password must be at least 6 characters".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password needs a lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password needs an uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password needs a number".to_string());
    }
    if !password.chars().any(|c| "@$!%*?&".contains(c)) {
        return Err("Password needs a special character (@$!%*?&)".to_string());
    }
    Ok(())
}

/// Repeat password: required, must match.
pub fn validate_re_password(password: &str, re_password: &str) -> Result<(), String> {
    if re_password.is_empty() {
        return Err("Please repeat the password".to_string());
    }
    if password != re_password {
        return Err("Passwords must match".to_string());
    }
    Ok(())
}

/// Full sign-up form check, first failure wins.
pub fn validate_signup(
    name: &str,
    email: &str,
    password: &str,
    re_password: &str,
) -> Result<(), String> {
    validate_name(name)?;
    validate_email(email)?;
    validate_password(password)?;
    validate_re_password(password, re_password)
}

/// Sign-in form check: a shaped email and a password held to the same
/// rules the account was created under.
pub fn validate_signin(email: &str, password: &str) -> Result<(), String> {
    validate_email(email)?;
    if password.is_empty() {
        return Err("Password is required".to_string());
    }
    validate_password(password)
}

/// Add-task form check: non-empty text and a required, parseable due date.
/// Returns the parsed date on success.
pub fn validate_task_entry(text: &str, due_raw: &str) -> Result<DateTime<Utc>, String> {
    if text.trim().is_empty() {
        return Err("Please enter a task".to_string());
    }
    if due_raw.trim().is_empty() {
        return Err("Due date is required".to_string());
    }
    parse_due_input(due_raw).ok_or_else(|| "Invalid date".to_string())
}

/// Parse a due date entry into a UTC timestamp.
///
/// Accepts `YYYY-MM-DD HH:MM`, `YYYY-MM-DD` (start of day), and the
/// relative forms `today`, `tomorrow`, `in Nd`, `in Nw`.
pub fn parse_due_input(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim().to_lowercase();
    if s.is_empty() {
        return None;
    }
    let today = Local::now().date_naive();

    match s.as_str() {
        "today" => return start_of_day_utc(today),
        "tomorrow" => return start_of_day_utc(today + Duration::days(1)),
        _ => {}
    }

    // "in X" patterns
    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return start_of_day_utc(today + Duration::days(days));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return start_of_day_utc(today + Duration::weeks(weeks));
            }
        }
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M") {
        return local_to_utc(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        return start_of_day_utc(d);
    }
    None
}

fn start_of_day_utc(date: NaiveDate) -> Option<DateTime<Utc>> {
    local_to_utc(date.and_hms_opt(0, 0, 0)?)
}

fn local_to_utc(dt: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&dt)
        .single()
        .map(|local| local.with_timezone(&Utc))
}
