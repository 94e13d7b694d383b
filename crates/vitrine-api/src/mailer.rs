use std::path::Path;

use anyhow::Result;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::{AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

/// Outbound mail for verification and password-reset links. SMTP when
/// `VITRINE_SMTP_URL` is set; otherwise messages land as files in
/// `VITRINE_MAIL_DIR` (default `outbox/`), which is what development and the
/// tests use.
pub struct Mailer {
    transport: Transport,
    from: Mailbox,
}

enum Transport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl Mailer {
    pub fn from_env() -> Result<Self> {
        let from: Mailbox = std::env::var("VITRINE_MAIL_FROM")
            .unwrap_or_else(|_| "Vitrine <noreply@vitrine.local>".into())
            .parse()?;

        if let Ok(url) = std::env::var("VITRINE_SMTP_URL") {
            let transport = AsyncSmtpTransport::<Tokio1Executor>::from_url(&url)?.build();
            info!("Mailer using SMTP transport");
            return Ok(Self {
                transport: Transport::Smtp(transport),
                from,
            });
        }

        let dir = std::env::var("VITRINE_MAIL_DIR").unwrap_or_else(|_| "outbox".into());
        Self::file(Path::new(&dir), from)
    }

    /// File-transport mailer writing into `dir`.
    pub fn file(dir: &Path, from: Mailbox) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        info!("Mailer writing to {}", dir.display());
        Ok(Self {
            transport: Transport::File(AsyncFileTransport::new(dir)),
            from,
        })
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        match &self.transport {
            Transport::Smtp(t) => {
                t.send(message).await?;
            }
            Transport::File(t) => {
                t.send(message).await?;
            }
        }
        Ok(())
    }

    pub async fn send_verification(&self, to: &str, link: &str) -> Result<()> {
        self.send(
            to,
            "Confirm your email address",
            format!("Welcome! Open this link to confirm your address:\n\n{link}\n"),
        )
        .await
    }

    pub async fn send_password_reset(&self, to: &str, link: &str) -> Result<()> {
        self.send(
            to,
            "Password reset",
            format!(
                "Someone requested a password reset for this address. If that was you,\n\
                 open this link to choose a new password:\n\n{link}\n\n\
                 Otherwise you can ignore this message.\n"
            ),
        )
        .await
    }
}
