use crate::config::SmtpConfig;
use crate::domain::model::Notification;
use crate::domain::ports::Notifier;
use crate::utils::error::{ImportError, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

fn email_error(context: &str, error: impl std::fmt::Display) -> ImportError {
    ImportError::EmailError {
        message: format!("{}: {}", context, error),
    }
}

/// HTML notification mailer over STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    server: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let sender: Mailbox = config
            .sender
            .parse()
            .map_err(|e| email_error(&format!("invalid sender '{}'", config.sender), e))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
            .map_err(|e| email_error(&format!("invalid SMTP server '{}'", config.server), e))?
            .port(config.port);

        if let (Some(user), Some(password)) = (&config.user, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            sender,
            server: config.server.clone(),
        })
    }

    /// 連線並登入 SMTP 伺服器，確認設定可用
    pub async fn test_connection(&self) -> Result<()> {
        match self.transport.test_connection().await {
            Ok(true) => {
                tracing::info!("✓ SMTP connection to {} OK", self.server);
                Ok(())
            }
            Ok(false) => Err(email_error(
                &format!("SMTP server {}", self.server),
                "connection test failed",
            )),
            Err(e) => Err(email_error(&format!("SMTP server {}", self.server), e)),
        }
    }

    fn build_message(&self, notification: &Notification) -> Result<Message> {
        let address: Address = notification
            .recipient
            .parse()
            .map_err(|e| email_error(&format!("invalid recipient '{}'", notification.recipient), e))?;
        let recipient = Mailbox::new(Some(notification.recipient_name.clone()), address);

        Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(notification.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(notification.html_body.clone())
            .map_err(|e| email_error("cannot build message", e))
    }
}

#[async_trait]
impl Notifier for SmtpMailer {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let message = self.build_message(notification)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| email_error(&format!("sending to {}", notification.recipient), e))?;
        tracing::debug!("Email '{}' sent to {}", notification.subject, notification.recipient);
        Ok(())
    }
}
