use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MuseumRecord {
    pub name: &'static str,
    pub rating: f64,
    pub visitor_count: u64,
    pub location: &'static str,
}

/// Sample data shown by the museum dashboard.
pub const MUSEUMS: &[MuseumRecord] = &[
    MuseumRecord { name: "The Louvre", rating: 4.7, visitor_count: 8_700_000, location: "Paris" },
    MuseumRecord { name: "British Museum", rating: 4.7, visitor_count: 5_820_000, location: "London" },
    MuseumRecord { name: "Metropolitan Museum of Art", rating: 4.8, visitor_count: 5_360_000, location: "New York" },
    MuseumRecord { name: "Vatican Museums", rating: 4.6, visitor_count: 6_800_000, location: "Vatican City" },
    MuseumRecord { name: "Rijksmuseum", rating: 4.7, visitor_count: 2_700_000, location: "Amsterdam" },
];

pub const MIN_ROWS: usize = 1;
pub const MAX_ROWS: usize = 10;

/// First `count` museums in their original order.
///
/// `location` is accepted for the dashboard's filter control but not applied.
pub fn museums(count: usize, _location: &str) -> Vec<MuseumRecord> {
    MUSEUMS.iter().take(count).copied().collect()
}

/// One bar of the visitor chart. `percent` is relative to the largest bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBar {
    pub label: String,
    pub value: u64,
    pub percent: f64,
}

pub fn visitor_chart(rows: &[MuseumRecord]) -> Vec<ChartBar> {
    let max = rows.iter().map(|r| r.visitor_count).max().unwrap_or(0);
    rows.iter()
        .map(|r| ChartBar {
            label: r.name.to_string(),
            value: r.visitor_count,
            percent: if max == 0 {
                0.0
            } else {
                r.visitor_count as f64 / max as f64 * 100.0
            },
        })
        .collect()
}

/// Sidebar controls of the museum dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct MuseumQuery {
    pub rows: usize,
    pub location: String,
    pub city: String,
    pub weather_key: Option<String>,
    pub show_table: bool,
    pub show_chart: bool,
    pub show_weather: bool,
}

impl Default for MuseumQuery {
    fn default() -> Self {
        Self {
            rows: 5,
            location: "All".to_string(),
            city: "London".to_string(),
            weather_key: None,
            show_table: true,
            show_chart: true,
            show_weather: true,
        }
    }
}

impl MuseumQuery {
    pub fn with_defaults(rows: usize, city: &str) -> Self {
        Self {
            rows,
            city: city.to_string(),
            ..Self::default()
        }
        .clamped()
    }

    /// Pin the row count to the slider range.
    pub fn clamped(mut self) -> Self {
        self.rows = self.rows.clamp(MIN_ROWS, MAX_ROWS);
        self
    }
}

/// Format a visitor count with thousands separators: 8700000 -> "8,700,000".
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
