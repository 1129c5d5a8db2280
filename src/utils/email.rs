use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use klassmata_config::EmailConfig;
use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;
use tracing::{instrument, warn};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("email delivery is disabled")]
    Disabled,
    #[error("invalid address: {0}")]
    Address(String),
    #[error("failed to build email: {0}")]
    Build(String),
    #[error("SMTP error: {0}")]
    Transport(String),
    #[error("mail task failed: {0}")]
    Task(String),
}

/// Outgoing mail collaborator.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<(), MailError>;
}

/// Builds the mailer for the configured environment. Falls back to
/// [`DisabledMailer`] when SMTP is switched off or cannot be set up.
pub fn mailer_from_config(config: &EmailConfig) -> Arc<dyn Mailer> {
    if !config.enabled {
        return Arc::new(DisabledMailer);
    }

    match SmtpMailer::new(config.clone()) {
        Ok(mailer) => Arc::new(mailer),
        Err(e) => {
            warn!(error = %e, smtp.host = %config.smtp_host, "SMTP setup failed, email delivery disabled");
            Arc::new(DisabledMailer)
        }
    }
}

/// Refuses every message; invites are still created, with `emailSent = false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, _to: &str, _subject: &str, _html: &str, _text: &str) -> Result<(), MailError> {
        Err(MailError::Disabled)
    }
}

pub struct SmtpMailer {
    config: EmailConfig,
    transport: SmtpTransport,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Result<Self, MailError> {
        let transport = if config.smtp_username.is_empty() {
            SmtpTransport::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

            SmtpTransport::relay(&config.smtp_host)
                .map_err(|e| MailError::Transport(e.to_string()))?
                .port(config.smtp_port)
                .credentials(creds)
                .build()
        };

        Ok(Self { config, transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip(self, html_body, text_body))]
    async fn send(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<(), MailError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(from.parse().map_err(|e| MailError::Address(format!("{}: {}", from, e)))?)
            .to(to.parse().map_err(|e| MailError::Address(format!("{}: {}", to, e)))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| MailError::Build(e.to_string()))?;

        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| MailError::Task(e.to_string()))?
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(())
    }
}

/// A rendered teacher invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteEmail {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

impl InviteEmail {
    pub fn render(
        first_name: &str,
        school_name: &str,
        code: &str,
        frontend_url: &str,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let link = format!("{}/invite?code={}", frontend_url.trim_end_matches('/'), code);
        let expires = expires_at.format("%B %-d, %Y").to_string();

        let subject = format!("You're invited to join {} on KlassMata", school_name);
        let text_body = format!(
            "Hi {first_name},\n\n\
             {school_name} has invited you to join KlassMata as a teacher.\n\n\
             Your invite code is: {code}\n\n\
             Accept the invitation here:\n\
             {link}\n\n\
             This invitation expires on {expires}.\n\n\
             If you weren't expecting this email, you can ignore it.\n\n\
             Best regards,\n\
             KlassMata Team"
        );
        let html_body = invite_template(
            &escape_html(first_name),
            &escape_html(school_name),
            code,
            &link,
            &expires,
        );

        Self {
            subject,
            html_body,
            text_body,
        }
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn invite_template(name: &str, school_name: &str, code: &str, link: &str, expires: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Teacher Invitation</title>
</head>
<body style="margin: 0; padding: 0; font-family: Arial, sans-serif; background-color: #f4f4f4;">
    <table width="100%" cellpadding="0" cellspacing="0" style="background-color: #f4f4f4; padding: 20px;">
        <tr>
            <td align="center">
                <table width="600" cellpadding="0" cellspacing="0" style="background-color: #ffffff; border-radius: 8px; overflow: hidden;">
                    <tr>
                        <td style="background-color: #2563EB; padding: 30px; text-align: center;">
                            <h1 style="margin: 0; color: #ffffff; font-size: 28px;">KlassMata</h1>
                        </td>
                    </tr>
                    <tr>
                        <td style="padding: 40px 30px;">
                            <p style="margin: 0 0 20px 0; color: #333333; font-size: 16px;">Hi <strong>{name}</strong>,</p>
                            <p style="margin: 0 0 20px 0; color: #666666; font-size: 16px; line-height: 1.5;">
                                <strong>{school_name}</strong> has invited you to join KlassMata as a teacher.
                            </p>
                            <p style="margin: 0 0 10px 0; color: #666666; font-size: 14px;">Your invite code:</p>
                            <p style="margin: 0 0 30px 0; font-size: 28px; letter-spacing: 4px; font-family: monospace; color: #111827;">{code}</p>
                            <table width="100%" cellpadding="0" cellspacing="0" style="margin: 0 0 30px 0;">
                                <tr>
                                    <td align="center">
                                        <a href="{link}" style="display: inline-block; padding: 14px 40px; background-color: #2563EB; color: #ffffff; text-decoration: none; border-radius: 6px; font-size: 16px; font-weight: bold;">Accept Invitation</a>
                                    </td>
                                </tr>
                            </table>
                            <p style="margin: 0 0 20px 0; color: #2563EB; font-size: 14px; word-break: break-all;">{link}</p>
                            <p style="margin: 0; color: #666666; font-size: 14px;"><strong>This invitation expires on {expires}.</strong></p>
                        </td>
                    </tr>
                    <tr>
                        <td style="background-color: #f8f9fa; padding: 20px 30px; text-align: center; border-top: 1px solid #e9ecef;">
                            <p style="margin: 0; color: #999999; font-size: 12px;">This is an automated email from KlassMata. Please do not reply.</p>
                        </td>
                    </tr>
                </table>
            </td>
        </tr>
    </table>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_render_invite_email() {
        let expires = Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();
        let email = InviteEmail::render(
            "Ada",
            "Springfield <High>",
            "ABCDE12345",
            "https://app.klassmata.com/",
            expires,
        );

        assert_eq!(
            email.subject,
            "You're invited to join Springfield <High> on KlassMata"
        );
        assert!(email.text_body.contains("ABCDE12345"));
        assert!(
            email
                .text_body
                .contains("https://app.klassmata.com/invite?code=ABCDE12345")
        );
        assert!(email.text_body.contains("March 9, 2025"));
        assert!(email.html_body.contains("Springfield &lt;High&gt;"));
        assert!(!email.html_body.contains("<High>"));
    }

    #[tokio::test]
    async fn test_disabled_mailer_refuses() {
        let result = DisabledMailer.send("a@b.com", "s", "h", "t").await;
        assert!(matches!(result, Err(MailError::Disabled)));
    }

    #[tokio::test]
    async fn test_disabled_config_yields_disabled_mailer() {
        let config = EmailConfig {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@klassmata.com".to_string(),
            from_name: "KlassMata".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
        };
        let mailer = mailer_from_config(&config);
        let result = mailer.send("a@b.com", "s", "h", "t").await;
        assert!(matches!(result, Err(MailError::Disabled)));
    }
}
