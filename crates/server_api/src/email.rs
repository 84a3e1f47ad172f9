use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::Serialize;
use tera::{Context, Tera};

pub const ESCROW_EMAIL_SUBJECT: &str = "[tronch.io] Your escrow has initiated!";

const ESCROW_EMAIL_TEMPLATE: &str = "escrow_email.txt";

const ESCROW_EMAIL_BODY: &str = "
Congrats {{ client_first_name }},

{{ user_first_name }} has initiated an escrow for your project! 🎉

We’re tronch, the escrow service that will be handling payment!
You can rest assured knowing your funds are completely secure and will be released only once the project milestones have been completed to your standards.

The requirements that are set to be programmed into your smart contract are as follows:
{{ requirements }}

Below, you’ll find two links:

- A secure link to make payment:\x20

{{ payment_link }}

- A link to your collaborative Dashboard, where you will confirm requirements, and check on project updates from a birds-eye view. We’ll email you as the project status changes:

{{ dashboard_link }}

Next steps would be to head over to the Dashboard, confirm the requirements, make payment, and leave the rest to us!
";

/// Notice sent to a client once an escrow has been opened on their behalf.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EscrowEmail {
    pub client_first_name: String,
    pub user_first_name: String,
    pub requirements: String,
    pub payment_link: String,
    pub dashboard_link: String,
}

impl EscrowEmail {
    /// Returns `(subject, body)`. Field values are HTML-escaped in the body.
    pub fn render(&self) -> Result<(String, String)> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".txt"]);
        tera.set_escape_fn(escape_html);
        tera.add_raw_template(ESCROW_EMAIL_TEMPLATE, ESCROW_EMAIL_BODY)
            .context("failed to parse email template")?;

        let context =
            Context::from_serialize(self).context("failed to build email template context")?;
        let body = tera
            .render(ESCROW_EMAIL_TEMPLATE, &context)
            .context("failed to execute email template")?;
        Ok((ESCROW_EMAIL_SUBJECT.to_string(), body))
    }
}

/// Escapes the characters an HTML text node cannot carry verbatim. `/` is
/// left alone so links stay readable.
fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\0' => escaped.push('\u{fffd}'),
            '"' => escaped.push_str("&#34;"),
            '&' => escaped.push_str("&amp;"),
            '\'' => escaped.push_str("&#39;"),
            '+' => escaped.push_str("&#43;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Writes `{stem}.txt` containing the subject, a blank line, then the body.
pub fn save_email_txt(stem: &Path, subject: &str, body: &str) -> Result<PathBuf> {
    let mut path = stem.as_os_str().to_owned();
    path.push(".txt");
    let path = PathBuf::from(path);
    std::fs::write(&path, format!("{subject}\n\n{body}"))
        .with_context(|| format!("failed to save email to '{}'", path.display()))?;
    Ok(path)
}
