//! Discord channel publisher.
//!
//! Posts reports as embeds through the REST API with a bot token, so no
//! gateway session is needed.
//!
//! API docs: https://discord.com/developers/docs/resources/message#create-message
//! Base URL: https://discord.com/api/v10
//! Auth: `Authorization: Bot {token}`
//! Limits: 25 fields and 6000 characters per embed, 1024 per field value.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, info};

use super::{Publisher, ReportField, ScanReport};
use crate::config::{DISCORD_MAX_FIELDS, DISCORD_MAX_FIELD_CHARS};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://discord.com/api/v10";

/// Combined character budget of one embed.
const MAX_EMBED_CHARS: usize = 6000;

const MAX_TITLE_CHARS: usize = 256;

// ---------------------------------------------------------------------------
// Request types (Rust -> Discord JSON)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
struct EmbedField {
    name: String,
    value: String,
    inline: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
struct Embed {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    color: u32,
    fields: Vec<EmbedField>,
}

impl Embed {
    fn char_len(&self) -> usize {
        self.title.chars().count()
            + self.description.as_deref().map_or(0, |d| d.chars().count())
            + self
                .fields
                .iter()
                .map(|f| f.name.chars().count() + f.value.chars().count())
                .sum::<usize>()
    }
}

#[derive(Debug, Serialize)]
struct CreateMessage {
    embeds: Vec<Embed>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct DiscordClient {
    http: Client,
    base_url: String,
    token: SecretString,
    channel_id: u64,
}

impl DiscordClient {
    pub fn new(token: SecretString, channel_id: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("DiscordBot (https://github.com/aots, 0.1.0)")
            .build()
            .context("Failed to build HTTP client for Discord")?;

        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            token,
            channel_id,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn send_embed(&self, embed: Embed) -> Result<()> {
        let url = format!("{}/channels/{}/messages", self.base_url, self.channel_id);
        let body = CreateMessage {
            embeds: vec![embed],
        };

        let resp = self
            .http
            .post(&url)
            .header(
                "Authorization",
                format!("Bot {}", self.token.expose_secret()),
            )
            .json(&body)
            .send()
            .await
            .context("Discord API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Discord API error {status}: {body}");
        }

        Ok(())
    }
}

#[async_trait]
impl Publisher for DiscordClient {
    async fn publish(&self, report: &ScanReport) -> Result<()> {
        let embeds = split_embeds(report);
        let parts = embeds.len();

        for (i, embed) in embeds.into_iter().enumerate() {
            debug!(
                part = i + 1,
                parts,
                fields = embed.fields.len(),
                chars = embed.char_len(),
                "Sending Discord embed"
            );
            self.send_embed(embed)
                .await
                .with_context(|| format!("Failed to send embed {} of {parts}", i + 1))?;
        }

        info!(
            channel = self.channel_id,
            parts,
            fields = report.fields.len(),
            "Report published to Discord"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Embed layout
// ---------------------------------------------------------------------------

/// Truncate to `max` characters, marking the cut with an ellipsis.
fn clamp_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Like [`clamp_chars`], but the last line survives the cut whole.
///
/// The packer appends its "...and N more" note as the last line of the
/// final chunk, past the chunk budget if it must.
fn clamp_keeping_last_line(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    match text.rsplit_once('\n') {
        Some((head, tail)) if tail.chars().count() + 2 <= max => {
            let mut out = clamp_chars(head, max - tail.chars().count() - 1);
            out.push('\n');
            out.push_str(tail);
            out
        }
        _ => clamp_chars(text, max),
    }
}

fn to_embed_field(field: &ReportField) -> EmbedField {
    EmbedField {
        name: clamp_chars(&field.name, MAX_TITLE_CHARS),
        value: clamp_keeping_last_line(&field.value, DISCORD_MAX_FIELD_CHARS),
        inline: false,
    }
}

/// Lay a report out over as many embeds as Discord's limits require.
///
/// The first embed carries title and description; continuations are
/// titled "{title} (cont.)". Field order is preserved.
fn split_embeds(report: &ScanReport) -> Vec<Embed> {
    let title = clamp_chars(&report.title, MAX_TITLE_CHARS);
    let cont_title = clamp_chars(&format!("{} (cont.)", report.title), MAX_TITLE_CHARS);

    let mut embeds = Vec::new();
    let mut current = Embed {
        title,
        description: Some(report.description.clone()),
        color: report.color,
        fields: Vec::new(),
    };
    let mut size = current.char_len();

    for field in &report.fields {
        let field = to_embed_field(field);
        let field_len = field.name.chars().count() + field.value.chars().count();

        let full = current.fields.len() >= DISCORD_MAX_FIELDS
            || (!current.fields.is_empty() && size + field_len > MAX_EMBED_CHARS);
        if full {
            let next = Embed {
                title: cont_title.clone(),
                description: None,
                color: report.color,
                fields: Vec::new(),
            };
            size = next.char_len();
            embeds.push(std::mem::replace(&mut current, next));
        }

        size += field_len;
        current.fields.push(field);
    }

    embeds.push(current);
    embeds
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
