use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    message::Mailbox,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

/// Outbound mail seam. The auth flows only ever hand over
/// `(recipient, subject, body)`; delivery is fire-and-forget and failures
/// stay on this side of the boundary.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> color_eyre::Result<()>;
}

/// SMTP delivery over a TLS relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        username: String,
        password: String,
        from: &str,
    ) -> color_eyre::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
            .credentials(Credentials::new(username, password))
            .port(port)
            .build();

        Ok(Self {
            transport,
            from: from.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> color_eyre::Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        self.transport.send(email).await?;
        info!(%to, %subject, "sent mail");
        Ok(())
    }
}

/// Fallback used when SMTP is unconfigured: the message lands in the log
/// instead of a mailbox, which keeps local development usable.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> color_eyre::Result<()> {
        info!(%to, %subject, "mail transport unconfigured, logging message instead");
        info!("{body}");
        Ok(())
    }
}
