use serde::{Deserialize, Serialize};

/// Deployment secret consulted when no weather key was typed in.
pub const WEATHER_KEY_VAR: &str = "OPENWEATHER_API_KEY";

/// One weather reading for display. Never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub temperature: f64,
    pub humidity: f64,
    pub precipitation: f64,
    pub condition: String,
}

#[derive(Deserialize)]
struct WeatherResponse {
    main: MainReading,
    #[serde(default)]
    rain: Option<Rain>,
    weather: Vec<Condition>,
}

#[derive(Deserialize)]
struct MainReading {
    temp: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct Rain {
    #[serde(rename = "1h", default)]
    one_hour: f64,
}

#[derive(Deserialize)]
struct Condition {
    description: String,
}

impl WeatherResponse {
    fn into_snapshot(self) -> Option<WeatherSnapshot> {
        let condition = title_case(&self.weather.first()?.description);
        Some(WeatherSnapshot {
            temperature: self.main.temp,
            humidity: self.main.humidity,
            precipitation: self.rain.map(|r| r.one_hour).unwrap_or(0.0),
            condition,
        })
    }
}

/// "clear sky" -> "Clear Sky". A letter following any non-letter starts a word.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

/// Current-weather lookup against an OpenWeatherMap-compatible endpoint.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    api_url: String,
}

impl WeatherClient {
    pub fn new(api_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.to_string(),
        }
    }

    /// Fetch the current weather for `city` in metric units.
    ///
    /// Every failure (no key, bad key, unknown city, network error, odd JSON)
    /// collapses into `None`; callers show a single "no data" warning.
    pub async fn fetch(&self, city: &str, api_key: Option<&str>) -> Option<WeatherSnapshot> {
        let key = api_key.map(str::trim).filter(|k| !k.is_empty())?;
        let city = city.trim();
        if city.is_empty() {
            return None;
        }

        let resp = self
            .http
            .get(&self.api_url)
            .query(&[("q", city), ("appid", key), ("units", "metric")])
            .send()
            .await
            .ok()?;

        if resp.status() != reqwest::StatusCode::OK {
            return None;
        }

        let parsed: WeatherResponse = resp.json().await.ok()?;
        parsed.into_snapshot()
    }
}
