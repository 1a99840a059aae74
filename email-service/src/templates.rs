//! Transactional message bodies

pub const PASSWORD_RESET_SUBJECT: &str = "Password Reset Request";

/// Rendered subject and HTML body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html_body: String,
}

/// Reset instructions pointing at `reset_link`, which stays valid for
/// `valid_for_minutes`.
pub fn password_reset_email(reset_link: &str, valid_for_minutes: i64) -> RenderedEmail {
    let validity = if valid_for_minutes % 60 == 0 {
        match valid_for_minutes / 60 {
            1 => "1 hour".to_string(),
            hours => format!("{hours} hours"),
        }
    } else {
        format!("{valid_for_minutes} minutes")
    };

    let html_body = format!(
        r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Password Reset</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Password Reset Request</h2>
    <p>You requested a password reset. Click the link below to choose a new password:</p>
    <p><a href="{reset_link}" style="color: #667eea;">Reset Password</a></p>
    <p>This link will expire in {validity}.</p>
    <p>If you did not request a password reset, please ignore this email.</p>
</body>
</html>
"#
    );

    RenderedEmail {
        subject: PASSWORD_RESET_SUBJECT.to_string(),
        html_body,
    }
}
