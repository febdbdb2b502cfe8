// src/services/notify.rs

//! Notification sinks.
//!
//! A sink receives the structured [`Report`] and decides how to render it.
//! [`SmtpSink`] mails an HTML table with every recipient blind-copied;
//! [`LogSink`] only logs the payload and is used for dry runs.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::error::{AppError, Result};
use crate::models::{MailConfig, Report, ReportRow};

/// Port on which SMTP speaks TLS from the first byte.
const IMPLICIT_TLS_PORT: u16 = 465;

/// Delivers reports to recipients.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver `report`. `Ok` means the transport accepted it.
    async fn send(&self, recipients: &[String], report: &Report) -> Result<()>;
}

/// Mails reports through an authenticated SMTP relay.
pub struct SmtpSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpSink {
    /// Build the transport from mail settings. Nothing is sent yet.
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let username = config
            .username
            .clone()
            .ok_or_else(|| AppError::config("GMAIL_USER is not set"))?;
        let password = config
            .password
            .clone()
            .ok_or_else(|| AppError::config("GMAIL_PASSWORD is not set"))?;

        let sender: Mailbox = username
            .parse()
            .map_err(|e| AppError::config(format!("Invalid sender address '{username}': {e}")))?;

        let builder = if config.smtp_port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_server)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
        }
        .map_err(|e| AppError::config(format!("SMTP relay {}: {e}", config.smtp_server)))?;

        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(username, password))
            .build();

        Ok(Self { transport, sender })
    }

    /// One message addressed to the sender, every recipient in Bcc.
    fn build_message(&self, recipients: &[String], report: &Report) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.sender.clone())
            .to(self.sender.clone())
            .subject(report.subject.clone());

        for recipient in recipients {
            let mailbox: Mailbox = recipient
                .parse()
                .map_err(|e| AppError::delivery(format!("Invalid recipient '{recipient}': {e}")))?;
            builder = builder.bcc(mailbox);
        }

        builder
            .header(ContentType::TEXT_HTML)
            .body(render_html(report))
            .map_err(AppError::delivery)
    }
}

#[async_trait]
impl NotificationSink for SmtpSink {
    async fn send(&self, recipients: &[String], report: &Report) -> Result<()> {
        if recipients.is_empty() {
            return Err(AppError::delivery("no recipients"));
        }

        let message = self.build_message(recipients, report)?;
        self.transport
            .send(message)
            .await
            .map_err(AppError::delivery)?;

        log::info!("Email sent to {} BCC recipients", recipients.len());
        Ok(())
    }
}

/// Logs reports instead of sending them.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, recipients: &[String], report: &Report) -> Result<()> {
        let payload = serde_json::to_string_pretty(report)?;
        log::info!(
            "Dry run, report for {} recipients:\n{}",
            recipients.len(),
            payload
        );
        Ok(())
    }
}

/// Render a report as an HTML mail body.
pub fn render_html(report: &Report) -> String {
    let mut html = String::from(
        "<html>\n<head>\n<style>\n\
         table { border-collapse: collapse; }\n\
         th, td { border: 1px solid #ccc; padding: 4px 8px; }\n\
         th { background: #f2f2f2; }\n\
         </style>\n</head>\n<body>\n",
    );

    html.push_str(&format!("<p>{}</p>\n", escape(&report.summary)));

    if !report.new_rows.is_empty() {
        html.push_str("<h2>Apply for the following IPOs:</h2>\n");
        push_table(&mut html, report.new_rows.iter());
    }

    if !report.recent_rows.is_empty() {
        html.push_str("<h3>Recently notified</h3>\n");
        let (detailed, bare): (Vec<_>, Vec<_>) =
            report.recent_rows.iter().partition(|r| r.details.is_some());
        if !detailed.is_empty() {
            push_table(&mut html, detailed.iter().filter_map(|r| r.details.as_ref()));
        }
        if !bare.is_empty() {
            html.push_str("<ul>\n");
            for row in bare {
                html.push_str(&format!("<li>{}</li>\n", escape(&row.name)));
            }
            html.push_str("</ul>\n");
        }
    }

    if !report.links.is_empty() {
        html.push_str("<p>\n");
        for link in &report.links {
            html.push_str(&format!(
                "<a href=\"{}\" target=\"_blank\">{}</a>\n",
                escape(&link.url),
                escape(&link.label)
            ));
        }
        html.push_str("</p>\n");
    }

    html.push_str("<p>Happy Investing!</p>\n</body>\n</html>\n");
    html
}

fn push_table<'a>(html: &mut String, rows: impl Iterator<Item = &'a ReportRow>) {
    html.push_str(
        "<table>\n<thead>\n<tr><th>Name</th><th>Status</th><th>Est Listing Gain</th>\
         <th>Open Date</th><th>Close Date</th><th>Rating</th><th>Size</th></tr>\n\
         </thead>\n<tbody>\n",
    );
    for row in rows {
        html.push_str("<tr>");
        for cell in [
            &row.name,
            &row.status,
            &row.estimated_gain,
            &row.open_date,
            &row.close_date,
            &row.rating,
            &row.size,
        ] {
            html.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
