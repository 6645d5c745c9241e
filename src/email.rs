use axum::async_trait;
use lettre::{
    message::MultiPart, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info};

use crate::config::SmtpConfig;

/// Outbound mail boundary. The core only ever needs a success signal;
/// delivery problems are logged here and reported as `false`.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str, text: &str) -> bool;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        // `secure` means implicit TLS (port 465); otherwise STARTTLS upgrade.
        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        };
        let transport = builder.port(config.port).credentials(creds).build();
        let from = format!("{} <{}>", config.from_name, config.from_address);
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str, text: &str) -> bool {
        let from = match self.from.parse() {
            Ok(f) => f,
            Err(e) => {
                error!(error = %e, from = %self.from, "invalid from address");
                return false;
            }
        };
        let to_addr = match to.parse() {
            Ok(t) => t,
            Err(e) => {
                error!(error = %e, to = %to, "invalid recipient address");
                return false;
            }
        };
        let message = match Message::builder()
            .from(from)
            .to(to_addr)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(
                text.to_string(),
                html.to_string(),
            )) {
            Ok(m) => m,
            Err(e) => {
                error!(error = %e, "failed to build email");
                return false;
            }
        };
        match self.transport.send(message).await {
            Ok(_) => {
                info!(to = %to, subject = %subject, "email sent");
                true
            }
            Err(e) => {
                error!(error = %e, to = %to, "failed to send email");
                false
            }
        }
    }
}

fn otp_email(otp: &str, expiry_minutes: i64) -> (String, String) {
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="color: #333;">Password Reset Request</h1>
    <p>Hello,</p>
    <p>You have requested to reset your password. Please use the following One-Time Password (OTP) to proceed:</p>
    <div style="padding: 20px; text-align: center; font-size: 32px; font-weight: bold; letter-spacing: 8px; border: 2px dashed #4CAF50; margin: 20px 0;">{otp}</div>
    <p>This OTP is valid for <strong>{expiry_minutes} minutes</strong>.</p>
    <p style="color: #d32f2f;">If you did not request a password reset, please ignore this email or contact support.</p>
    <p>For security reasons, never share this OTP with anyone.</p>
    <p style="color: #999; font-size: 12px; margin-top: 30px;">This is an automated message, please do not reply to this email.</p>
</body>
</html>"#
    );
    let text = format!(
        "Password Reset OTP\n\n\
         You have requested to reset your password. Your OTP is: {otp}\n\n\
         This OTP is valid for {expiry_minutes} minutes.\n\n\
         If you did not request a password reset, please ignore this email.\n"
    );
    (html, text)
}

fn password_changed_email(name: &str) -> (String, String) {
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="color: #333;">Password Changed</h1>
    <p>Hello {name},</p>
    <p>Your password has been successfully changed.</p>
    <p style="background-color: #fff3cd; border-left: 4px solid #ffc107; padding: 15px;">
        <strong>Did you make this change?</strong>
        If you did not change your password, please contact our support team immediately and secure your account.
    </p>
    <p style="color: #999; font-size: 12px; margin-top: 30px;">This is an automated message, please do not reply to this email.</p>
</body>
</html>"#
    );
    let text = format!(
        "Password Changed Successfully\n\n\
         Hello {name},\n\n\
         Your password has been successfully changed.\n\n\
         If you did not make this change, please contact support immediately.\n"
    );
    (html, text)
}

pub async fn send_otp_email(mailer: &dyn Mailer, to: &str, otp: &str, expiry_minutes: i64) -> bool {
    let (html, text) = otp_email(otp, expiry_minutes);
    mailer.send(to, "Password Reset OTP", &html, &text).await
}

pub async fn send_password_changed_email(mailer: &dyn Mailer, to: &str, name: &str) -> bool {
    let (html, text) = password_changed_email(name);
    mailer
        .send(to, "Password Changed Successfully", &html, &text)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_email_embeds_code_and_expiry() {
        let (html, text) = otp_email("483920", 10);
        assert!(html.contains("483920"));
        assert!(html.contains("10 minutes"));
        assert!(text.contains("483920"));
        assert!(text.contains("10 minutes"));
    }

    #[test]
    fn password_changed_email_greets_by_name() {
        let (html, text) = password_changed_email("Ada Obi");
        assert!(html.contains("Hello Ada Obi"));
        assert!(text.contains("Hello Ada Obi"));
    }
}
