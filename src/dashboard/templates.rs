use askama::Template;
use axum::response::Html;

use super::state::{ChatState, Notice};
use crate::api::MODELS;
use crate::dataset::{self, format_count, MuseumQuery, MuseumRecord};
use crate::roles::ROLE_PRESETS;
use crate::session::Role;
use crate::weather::WeatherSnapshot;

// ── View models ──────────────────────────────────────────────────────

pub struct RoleOption {
    pub index: usize,
    pub label: &'static str,
    pub selected: bool,
}

pub struct ModelOption {
    pub name: &'static str,
    pub selected: bool,
}

pub struct ChatMessageView {
    pub speaker: String,
    pub content: String,
    pub is_user: bool,
}

pub struct MuseumRow {
    pub name: &'static str,
    pub rating: String,
    pub visitors: String,
    pub location: &'static str,
}

pub struct BarView {
    pub label: String,
    pub width: String,
    pub value: String,
}

pub struct WeatherView {
    pub temperature: String,
    pub humidity: String,
    pub precipitation: String,
    pub condition: String,
}

impl From<&WeatherSnapshot> for WeatherView {
    fn from(w: &WeatherSnapshot) -> Self {
        Self {
            temperature: format!("{:.1} °C", w.temperature),
            humidity: format!("{:.0} %", w.humidity),
            precipitation: format!("{:.1} mm", w.precipitation),
            condition: w.condition.clone(),
        }
    }
}

// ── Askama Templates ─────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "chat.html")]
pub struct ChatTemplate<'a> {
    pub roles: Vec<RoleOption>,
    pub role_label: &'a str,
    pub role_prompt: &'a str,
    pub models: Vec<ModelOption>,
    pub temperature: String,
    pub max_tokens: u32,
    pub key_set: bool,
    pub question: &'a str,
    pub notice: Option<&'a Notice>,
    pub messages: Vec<ChatMessageView>,
    pub conversation_json: String,
}

#[derive(Template)]
#[template(path = "museums.html")]
pub struct MuseumsTemplate<'a> {
    pub query: &'a MuseumQuery,
    pub rows: Vec<MuseumRow>,
    pub bars: Vec<BarView>,
    pub weather: Option<WeatherView>,
}

// ── Render helpers (called from routes.rs) ───────────────────────────

pub fn chat_messages(chat: &ChatState) -> Vec<ChatMessageView> {
    let assistant = format!("{} (assistant)", chat.selection.label());
    chat.session
        .transcript()
        .map(|m| ChatMessageView {
            speaker: match m.role {
                Role::User => "You".to_string(),
                _ => assistant.clone(),
            },
            content: m.content.clone(),
            is_user: m.role == Role::User,
        })
        .collect()
}

pub fn render_chat(chat: &ChatState, question: &str, notice: Option<&Notice>) -> Html<String> {
    let template = ChatTemplate {
        roles: ROLE_PRESETS
            .iter()
            .enumerate()
            .map(|(index, preset)| RoleOption {
                index,
                label: preset.label,
                selected: index == chat.selection.index(),
            })
            .collect(),
        role_label: chat.selection.label(),
        role_prompt: chat.selection.system_prompt(),
        models: MODELS
            .iter()
            .map(|&name| ModelOption { name, selected: name == chat.params.model() })
            .collect(),
        temperature: format!("{:.2}", chat.params.temperature()),
        max_tokens: chat.params.max_tokens(),
        key_set: chat.typed_key.is_some(),
        question,
        notice,
        messages: chat_messages(chat),
        conversation_json: chat.session.to_json(chat.selection.system_prompt()),
    };
    render_page(&template)
}

pub fn render_museums(
    query: &MuseumQuery,
    records: &[MuseumRecord],
    weather: Option<&WeatherSnapshot>,
) -> Html<String> {
    let template = MuseumsTemplate {
        query,
        rows: records
            .iter()
            .map(|r| MuseumRow {
                name: r.name,
                rating: format!("{:.1}", r.rating),
                visitors: format_count(r.visitor_count),
                location: r.location,
            })
            .collect(),
        bars: dataset::visitor_chart(records)
            .into_iter()
            .map(|b| BarView {
                width: format!("{:.1}", b.percent),
                value: format_count(b.value),
                label: b.label,
            })
            .collect(),
        weather: weather.map(WeatherView::from),
    };
    render_page(&template)
}

fn render_page<T: Template>(template: &T) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        let msg = e
            .to_string()
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;");
        format!("<h1>Template error: {}</h1>", msg)
    }))
}
