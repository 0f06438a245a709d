use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
    Form,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::state::{ChatState, DashboardState, Notice};
use super::templates;
use crate::api::{resolve_credential, GenerationParams, OPENAI_KEY_VAR};
use crate::chat;
use crate::dataset::{self, MuseumQuery, MuseumRecord};
use crate::error::AppResult;
use crate::roles::RoleSelection;
use crate::session::Message;
use crate::weather::{WeatherSnapshot, WEATHER_KEY_VAR};

// ── GET / — chat page ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct IndexQuery {
    pub role: Option<usize>,
}

/// Render the chat page. `?role=n` selects a preset and restores its text.
pub async fn index(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<IndexQuery>,
) -> impl IntoResponse {
    let mut chat_state = state.chat.write().await;
    if let Some(role) = query.role {
        chat_state.selection = RoleSelection::preset(role);
    }
    templates::render_chat(&chat_state, "", None)
}

// ── POST /chat/generate — Generate button ───────────────────────────

#[derive(Deserialize)]
pub struct GenerateForm {
    pub role: usize,
    pub role_prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub question: String,
}

/// Copy the sidebar controls into the chat state. Nothing changes unless
/// every control is valid.
fn apply_settings(chat: &mut ChatState, form: &GenerateForm) -> AppResult<()> {
    let params = GenerationParams::new(&form.model, form.temperature, form.max_tokens)?;

    let mut selection = RoleSelection::preset(form.role);
    selection.set_instructions(&form.role_prompt);

    chat.params = params;
    chat.selection = selection;
    if let Some(key) = form.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        chat.typed_key = Some(key.to_string());
    }
    Ok(())
}

pub async fn generate(
    State(state): State<Arc<DashboardState>>,
    Form(form): Form<GenerateForm>,
) -> impl IntoResponse {
    // The write guard is held across the provider call: one Generate at a time.
    let mut chat_state = state.chat.write().await;

    if let Err(e) = apply_settings(&mut chat_state, &form) {
        return templates::render_chat(&chat_state, &form.question, Some(&Notice::from(&e)));
    }

    let credential = resolve_credential(chat_state.typed_key.as_deref(), OPENAI_KEY_VAR);
    if credential.is_some() && !form.question.trim().is_empty() {
        state.log(|l| l.log_api_request(chat_state.selection.label(), chat_state.params.model(), &form.question));
    }

    let ChatState { session, selection, params, .. } = &mut *chat_state;
    let result = chat::generate(
        session,
        selection,
        &form.question,
        params,
        credential.as_deref(),
        &state.completion,
    )
    .await;

    state.metrics.write().await.record_completion(&result);
    match result {
        Ok(reply) => {
            state.log(|l| l.log_api_response(&reply));
            templates::render_chat(&chat_state, "", None)
        }
        Err(e) => {
            state.log(|l| l.log_error(&e.to_string()));
            templates::render_chat(&chat_state, &form.question, Some(&Notice::from(&e)))
        }
    }
}

// ── POST /chat/reset — Reset button ─────────────────────────────────

#[derive(Deserialize)]
pub struct ResetForm {
    pub role: usize,
    pub role_prompt: String,
}

pub async fn reset(
    State(state): State<Arc<DashboardState>>,
    Form(form): Form<ResetForm>,
) -> impl IntoResponse {
    let mut chat_state = state.chat.write().await;
    let mut selection = RoleSelection::preset(form.role);
    selection.set_instructions(&form.role_prompt);
    chat_state.selection = selection;

    let ChatState { session, selection, .. } = &mut *chat_state;
    chat::reset(session, selection);
    state.log(|l| l.log_reset(chat_state.selection.label()));

    templates::render_chat(&chat_state, "", Some(&Notice::success("Conversation reset.")))
}

// ── GET /api/conversation — debug JSON ───────────────────────────────

pub async fn get_conversation(State(state): State<Arc<DashboardState>>) -> Json<Vec<Message>> {
    let chat_state = state.chat.read().await;
    if chat_state.session.is_initialized() {
        Json(chat_state.session.messages().to_vec())
    } else {
        Json(vec![Message::system(chat_state.selection.system_prompt())])
    }
}

// ── GET /api/stats — session metrics as JSON ─────────────────────────

#[derive(Serialize)]
pub struct StatsResponse {
    pub total_requests: usize,
    pub successful_completions: usize,
    pub api_errors: usize,
    pub weather_lookups: usize,
    pub success_rate: f64,
}

pub async fn get_stats(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    let m = state.metrics.read().await;
    Json(StatsResponse {
        total_requests: m.total_requests,
        successful_completions: m.successful_completions,
        api_errors: m.api_errors,
        weather_lookups: m.weather_lookups,
        success_rate: m.success_rate(),
    })
}

// ── GET /museums — museum dashboard ─────────────────────────────────

/// Raw sidebar form. Unchecked checkboxes are simply missing, so the toggles
/// only count once the form has been submitted.
#[derive(Deserialize, Default)]
pub struct MuseumForm {
    pub submitted: Option<String>,
    pub rows: Option<usize>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub weather_key: Option<String>,
    pub show_table: Option<String>,
    pub show_chart: Option<String>,
    pub show_weather: Option<String>,
}

impl MuseumForm {
    pub fn into_query(self, default_rows: usize, default_city: &str) -> MuseumQuery {
        let mut query = MuseumQuery::with_defaults(self.rows.unwrap_or(default_rows), default_city);
        if let Some(location) = self.location.filter(|l| !l.trim().is_empty()) {
            query.location = location;
        }
        if let Some(city) = self.city.filter(|c| !c.trim().is_empty()) {
            query.city = city;
        }
        query.weather_key = self.weather_key;
        if self.submitted.is_some() {
            query.show_table = self.show_table.is_some();
            query.show_chart = self.show_chart.is_some();
            query.show_weather = self.show_weather.is_some();
        }
        query.clamped()
    }
}

async fn lookup_weather(state: &DashboardState, city: &str, typed_key: Option<&str>) -> Option<WeatherSnapshot> {
    let key = resolve_credential(typed_key, WEATHER_KEY_VAR);
    let snapshot = state.weather.fetch(city, key.as_deref()).await;
    state.metrics.write().await.weather_lookups += 1;
    state.log(|l| l.log_weather(city, snapshot.is_some()));
    snapshot
}

pub async fn museums(
    State(state): State<Arc<DashboardState>>,
    Query(form): Query<MuseumForm>,
) -> impl IntoResponse {
    let query = form.into_query(state.config.museum_rows, &state.config.default_city);
    let records = dataset::museums(query.rows, &query.location);
    let weather = if query.show_weather {
        lookup_weather(&state, &query.city, query.weather_key.as_deref()).await
    } else {
        None
    };
    templates::render_museums(&query, &records, weather.as_ref())
}

// ── GET /api/museums, /api/weather — JSON equivalents ───────────────

pub async fn get_museums(
    State(state): State<Arc<DashboardState>>,
    Query(form): Query<MuseumForm>,
) -> Json<Vec<MuseumRecord>> {
    let query = form.into_query(state.config.museum_rows, &state.config.default_city);
    Json(dataset::museums(query.rows, &query.location))
}

#[derive(Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
    pub weather_key: Option<String>,
}

/// `null` when no data is available.
pub async fn get_weather(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<WeatherQuery>,
) -> Json<Option<WeatherSnapshot>> {
    let city = query
        .city
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| state.config.default_city.clone());
    Json(lookup_weather(&state, &city, query.weather_key.as_deref()).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn form(role: usize, prompt: &str) -> GenerateForm {
        GenerateForm {
            role,
            role_prompt: prompt.to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.3,
            max_tokens: 800,
            api_key: Some("  ".to_string()),
            question: "What should I wear to an opening?".to_string(),
        }
    }

    #[test]
    fn test_apply_settings() {
        let mut chat = ChatState::new(&AppConfig::default());
        apply_settings(&mut chat, &form(2, "Only suggest black outfits.")).unwrap();
        assert_eq!(chat.selection.label(), "👗 Fashion Stylist");
        assert_eq!(chat.selection.system_prompt(), "Only suggest black outfits.");
        assert_eq!(chat.params.model(), "gpt-4o");
        assert_eq!(chat.params.max_tokens(), 800);
        assert!(chat.typed_key.is_none());
    }

    #[test]
    fn test_apply_settings_rejects_out_of_range() {
        let mut chat = ChatState::new(&AppConfig::default());
        let mut bad = form(0, "x");
        bad.max_tokens = 4000;
        assert!(apply_settings(&mut chat, &bad).unwrap_err().is_warning());
    }

    #[test]
    fn test_rejected_form_leaves_state_untouched() {
        let mut chat = ChatState::new(&AppConfig::default());
        let before_params = chat.params.clone();
        let before_prompt = chat.selection.system_prompt().to_string();

        let mut bad = form(4, "Only talk about sculpture.");
        bad.api_key = Some("sk-typed".to_string());
        bad.temperature = 1.9;

        assert!(apply_settings(&mut chat, &bad).is_err());
        assert_eq!(chat.params, before_params);
        assert_eq!(chat.selection.index(), 0);
        assert_eq!(chat.selection.system_prompt(), before_prompt);
        assert!(chat.typed_key.is_none());
    }

    #[test]
    fn test_weather_key_parameter_matches_museum_form() {
        let uri: axum::http::Uri = "/api/weather?city=Rome&weather_key=wk-1".parse().unwrap();
        let Query(weather) = Query::<WeatherQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(weather.city.as_deref(), Some("Rome"));
        assert_eq!(weather.weather_key.as_deref(), Some("wk-1"));

        let uri: axum::http::Uri = "/museums?city=Rome&weather_key=wk-1".parse().unwrap();
        let Query(form) = Query::<MuseumForm>::try_from_uri(&uri).unwrap();
        assert_eq!(form.weather_key.as_deref(), Some("wk-1"));
    }

    #[test]
    fn test_museum_form_defaults_before_submit() {
        let query = MuseumForm::default().into_query(4, "Berlin");
        assert_eq!(query.rows, 4);
        assert_eq!(query.city, "Berlin");
        assert!(query.show_table && query.show_chart && query.show_weather);
    }

    #[test]
    fn test_museum_form_unchecked_toggles() {
        let form = MuseumForm {
            submitted: Some("1".to_string()),
            rows: Some(42),
            city: Some("Rome".to_string()),
            show_table: Some("on".to_string()),
            ..MuseumForm::default()
        };
        let query = form.into_query(5, "London");
        assert_eq!(query.rows, 10);
        assert_eq!(query.city, "Rome");
        assert!(query.show_table);
        assert!(!query.show_chart);
        assert!(!query.show_weather);
    }
}
