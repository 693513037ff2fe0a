//! Briefing renderer
//!
//! Turns a complete [`DataBundle`] into the text of the daily briefing.
//! Known categories get a typed layout; every other category, and every
//! payload key a typed layout does not consume, is listed verbatim so that
//! no data is silently dropped.

use briefing_printer::{pad_cells, truncate_cells};
use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use shared::models::{MarketSnapshot, SecurityBriefing, WeatherReport, as_number, display_value};
use shared::{Category, DataBundle};

/// Box drawing characters (code page 437 compatible)
mod box_chars {
    pub const HORIZONTAL: char = '─';
    pub const VERTICAL: char = '│';
    pub const TOP_LEFT: char = '┌';
    pub const TOP_RIGHT: char = '┐';
    pub const BOTTOM_LEFT: char = '└';
    pub const BOTTOM_RIGHT: char = '┘';
    pub const LEFT_T: char = '├';
    pub const RIGHT_T: char = '┤';
    pub const TOP_T: char = '┬';
    pub const BOTTOM_T: char = '┴';
    pub const CROSS: char = '┼';
}

const TITLE: &str = "DAILY SECURITY INTELLIGENCE BRIEFING";
const FOOTER: &str = "End of Briefing - Confidential Information";
/// Upstream weather producers publish Fahrenheit
const TEMPERATURE_UNIT: &str = "°F";
const BAR_BLOCK: char = '█';
const BAR_WIDTH: usize = 10;
const INDEX_COLUMNS: [usize; 3] = [12, 10, 10];

/// Render a complete bundle to printable text
pub trait Renderer: Send + Sync {
    fn render(&self, bundle: &DataBundle) -> String;
}

#[derive(Debug, Clone)]
pub struct BriefingRenderer {
    width: usize,
    location: String,
    classification: String,
}

impl BriefingRenderer {
    pub fn new(
        width: usize,
        location: impl Into<String>,
        classification: impl Into<String>,
    ) -> Self {
        Self {
            width,
            location: location.into(),
            classification: classification.into(),
        }
    }

    /// Render with an explicit date (deterministic output for tests)
    pub fn render_at(&self, bundle: &DataBundle, now: DateTime<Local>) -> String {
        let weather = bundle.get_str(Category::WEATHER);
        let market = bundle.get_str(Category::MARKET);
        let security = bundle.get_str(Category::SECURITY);

        let weather_view = weather.and_then(WeatherReport::from_value);
        let market_view = market.and_then(MarketSnapshot::from_value);
        let security_view = security.and_then(SecurityBriefing::from_value);

        let mut out: Vec<String> = Vec::new();

        // === Header ===
        let location = weather_view
            .as_ref()
            .and_then(|w| w.location.clone())
            .unwrap_or_else(|| self.location.clone());
        out.push(self.header(TITLE));
        out.push(self.left_right(
            &format!("Date: {}", now.format("%Y-%m-%d")),
            &format!("Location: {}", location),
        ));
        out.push(format!("Classification: {}", self.classification));
        out.push(self.rule('='));
        out.push(String::new());

        // === Strategic overview ===
        out.push(self.section_header("STRATEGIC OVERVIEW"));
        out.push(format!(
            "- Today's sentiment: {}",
            or_na(market_view.as_ref().and_then(|m| m.sentiment.as_deref()))
        ));
        out.push(format!(
            "- Weather affecting transportation: {}",
            or_na(weather_view.as_ref().and_then(|w| w.impact.as_deref()))
        ));
        out.push(format!(
            "- Security alerts: {}",
            or_na(security_view.as_ref().and_then(|s| s.level.as_deref()))
        ));
        out.push(self.rule('*'));
        out.push(String::new());

        // === Known categories ===
        if let Some(raw) = weather {
            match &weather_view {
                Some(view) => self.weather_section(view, &mut out),
                None => self.generic_section(&Category::weather(), raw, &mut out),
            }
        }
        if let Some(raw) = market {
            match &market_view {
                Some(view) => self.market_section(view, &mut out),
                None => self.generic_section(&Category::market(), raw, &mut out),
            }
        }
        if let Some(raw) = security {
            match &security_view {
                Some(view) => self.security_section(view, &mut out),
                None => self.generic_section(&Category::security(), raw, &mut out),
            }
        }

        // === Everything else ===
        for (category, payload) in bundle.iter() {
            if matches!(
                category.as_str(),
                Category::WEATHER | Category::MARKET | Category::SECURITY
            ) {
                continue;
            }
            self.generic_section(category, payload, &mut out);
        }

        // === Footer ===
        out.push(self.rule('='));
        out.push(FOOTER.to_string());
        out.push(self.rule('*'));

        out.join("\n")
    }

    fn weather_section(&self, view: &WeatherReport, out: &mut Vec<String>) {
        out.push(self.section_header("WEATHER"));
        if let Some(t) = &view.temperature {
            out.push(format!("Temperature: {}", with_unit(t, TEMPERATURE_UNIT)));
        }
        if let Some(h) = &view.humidity {
            out.push(format!("Humidity: {}", with_unit(h, "%")));
        }
        if let Some(c) = &view.condition {
            out.push(format!("Condition: {}", c));
        }
        if let Some(i) = &view.impact {
            out.push(format!("Transport impact: {}", i));
        }
        self.extra_lines(&view.extra, out);
        out.push(self.rule('*'));
        out.push(String::new());
    }

    fn market_section(&self, view: &MarketSnapshot, out: &mut Vec<String>) {
        out.push(self.section_header("MARKET ANALYSIS"));
        if !view.indices.is_empty() {
            out.push("-- STOCK INDICES --".to_string());
            let rows: Vec<Vec<String>> = view
                .indices
                .iter()
                .map(|q| {
                    vec![
                        q.name.clone(),
                        opt_display(q.value.as_ref()),
                        opt_display(q.change.as_ref()),
                    ]
                })
                .collect();
            out.extend(table(&["Index", "Current", "Change"], &rows, &INDEX_COLUMNS));
        }
        if !view.commodities.is_empty() {
            out.push("-- COMMODITY TREND --".to_string());
            for c in &view.commodities {
                let price = match (&c.price, &c.unit) {
                    (Some(p), Some(u)) => format!("${}/{}", display_value(p), u),
                    (Some(p), None) => format!("${}", display_value(p)),
                    (None, _) => "N/A".to_string(),
                };
                let trend = c.trend.as_ref().and_then(as_number).unwrap_or(0.0);
                out.push(format!(
                    "{}: {} {} {}",
                    c.name,
                    price,
                    bar_chart(trend, 100.0, BAR_WIDTH),
                    or_na(c.direction.as_deref())
                ));
            }
        }
        self.extra_lines(&view.extra, out);
        out.push(self.rule('*'));
        out.push(String::new());
    }

    fn security_section(&self, view: &SecurityBriefing, out: &mut Vec<String>) {
        out.push(self.section_header("SECURITY ALERTS"));
        if let Some(level) = &view.level {
            out.push(format!("Threat level: {}", level));
        }
        for alert in &view.alerts {
            match &alert.description {
                Some(d) => out.push(format!("- {}: {}", alert.title, d)),
                None => out.push(format!("- {}", alert.title)),
            }
        }
        self.extra_lines(&view.extra, out);
        out.push(self.rule('*'));
        out.push(String::new());
    }

    /// Any payload: `key: value` lines, arrays as `- item` lists
    fn generic_section(&self, category: &Category, payload: &Value, out: &mut Vec<String>) {
        out.push(self.section_header(&section_title(category.as_str())));
        match payload {
            Value::Object(map) => self.extra_lines(map, out),
            other => out.push(display_value(other)),
        }
        out.push(self.rule('*'));
        out.push(String::new());
    }

    fn extra_lines(&self, map: &Map<String, Value>, out: &mut Vec<String>) {
        for (key, value) in map {
            match value {
                Value::Array(items) => {
                    out.push(format!("{}:", key));
                    out.extend(items.iter().map(|item| format!("- {}", display_value(item))));
                }
                other => out.push(format!("{}: {}", key, display_value(other))),
            }
        }
    }

    fn rule(&self, c: char) -> String {
        c.to_string().repeat(self.width)
    }

    /// `=`-bordered centred title
    fn header(&self, text: &str) -> String {
        let padding = self.width.saturating_sub(text.chars().count()) / 2;
        format!(
            "{}\n{}{}\n{}",
            self.rule('='),
            " ".repeat(padding),
            text,
            self.rule('=')
        )
    }

    /// `*** TITLE ***` filling the width
    fn section_header(&self, text: &str) -> String {
        let stars = "*".repeat(self.width.saturating_sub(text.chars().count() + 2) / 2);
        format!("{} {} {}", stars, text, stars)
    }

    fn left_right(&self, left: &str, right: &str) -> String {
        let used = left.chars().count() + right.chars().count();
        let gap = self.width.saturating_sub(used).max(1);
        format!("{}{}{}", left, " ".repeat(gap), right)
    }
}

impl Renderer for BriefingRenderer {
    fn render(&self, bundle: &DataBundle) -> String {
        self.render_at(bundle, Local::now())
    }
}

impl Default for BriefingRenderer {
    fn default() -> Self {
        Self::new(50, "N/A", "CONFIDENTIAL")
    }
}

/// Box-drawn table with fixed column widths
fn table(headers: &[&str], rows: &[Vec<String>], widths: &[usize]) -> Vec<String> {
    use box_chars::*;

    let mut out = vec![table_border(widths, TOP_LEFT, TOP_T, TOP_RIGHT)];
    out.push(table_row(headers.iter().copied(), widths));
    out.push(table_border(widths, LEFT_T, CROSS, RIGHT_T));
    for r in rows {
        out.push(table_row(r.iter().map(String::as_str), widths));
    }
    out.push(table_border(widths, BOTTOM_LEFT, BOTTOM_T, BOTTOM_RIGHT));
    out
}

fn table_border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let mut line = String::new();
    line.push(left);
    for (i, w) in widths.iter().enumerate() {
        line.extend(std::iter::repeat_n(box_chars::HORIZONTAL, *w));
        line.push(if i + 1 == widths.len() { right } else { mid });
    }
    line
}

fn table_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut line = String::new();
    line.push(box_chars::VERTICAL);
    for (cell, w) in cells.zip(widths) {
        line.push_str(&pad_cells(&truncate_cells(cell, *w), *w, false));
        line.push(box_chars::VERTICAL);
    }
    line
}

/// Block bar scaled against `max`, clamped to `[0, width]`
fn bar_chart(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || !value.is_finite() {
        return String::new();
    }
    let filled = ((value / max) * width as f64).clamp(0.0, width as f64) as usize;
    BAR_BLOCK.to_string().repeat(filled)
}

/// Numbers get a unit suffix, strings are printed as given
fn with_unit(value: &Value, unit: &str) -> String {
    match value {
        Value::Number(_) => format!("{}{}", display_value(value), unit),
        other => display_value(other),
    }
}

fn opt_display(value: Option<&Value>) -> String {
    value.map(display_value).unwrap_or_else(|| "N/A".to_string())
}

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or("N/A")
}

/// `supply_chain` → `SUPPLY CHAIN`
fn section_title(label: &str) -> String {
    label.replace(['_', '-'], " ").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 2, 8, 0, 0).unwrap()
    }

    fn full_bundle() -> DataBundle {
        [
            (
                Category::weather(),
                json!({"location": "Plano, TX", "temperature": 72, "humidity": 60,
                       "condition": "Sunny", "weather_impact": "MODERATE"}),
            ),
            (
                Category::market(),
                json!({
                    "sentiment": "CAUTIOUS",
                    "indices": [{"name": "Dow Jones", "value": "28,500", "change": "+0.5%"}],
                    "commodities": [{"name": "Gold", "price": "1,800", "unit": "oz",
                                     "trend": 70, "direction": "Rising"}]
                }),
            ),
            (
                Category::security(),
                json!({"security_level": "ELEVATED",
                       "alerts": [{"title": "Port", "description": "closed"}]}),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_header_and_footer() {
        let text = BriefingRenderer::default().render_at(&full_bundle(), at());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "=".repeat(50));
        assert_eq!(lines[1].trim(), TITLE);
        assert!(lines[3].starts_with("Date: 2026-01-02"));
        assert!(lines[3].ends_with("Location: Plano, TX"));
        assert_eq!(lines[3].chars().count(), 50);
        assert_eq!(lines[4], "Classification: CONFIDENTIAL");
        assert!(text.ends_with(&format!("{}\n{}", FOOTER, "*".repeat(50))));
    }

    #[test]
    fn test_typed_sections() {
        let text = BriefingRenderer::default().render_at(&full_bundle(), at());
        assert!(text.contains("- Today's sentiment: CAUTIOUS"));
        assert!(text.contains("- Weather affecting transportation: MODERATE"));
        assert!(text.contains("- Security alerts: ELEVATED"));
        assert!(text.contains("Temperature: 72°F"));
        assert!(text.contains("Humidity: 60%"));
        assert!(text.contains("│Dow Jones   │28,500    │+0.5%     │"));
        assert!(text.contains("Gold: $1,800/oz ███████ Rising"));
        assert!(text.contains("- Port: closed"));
        assert!(briefing_printer::is_printable(&text));
    }

    #[test]
    fn test_unknown_keys_and_categories_are_listed() {
        let bundle: DataBundle = [
            (Category::weather(), json!({"t": 72})),
            (Category::market(), json!({"idx": 100})),
            (Category::security(), json!({"lvl": "low"})),
            (
                Category::new("supply_chain"),
                json!({"items": ["Port congestion: LOW"], "status": "ok"}),
            ),
        ]
        .into_iter()
        .collect();

        let text = BriefingRenderer::default().render_at(&bundle, at());
        assert!(text.contains("t: 72"));
        assert!(text.contains("idx: 100"));
        assert!(text.contains("lvl: low"));
        assert!(text.contains(" SUPPLY CHAIN "));
        assert!(text.contains("items:\n- Port congestion: LOW"));
        assert!(text.contains("status: ok"));
    }

    #[test]
    fn test_temperature_printed_in_fahrenheit() {
        let bundle: DataBundle = [
            (Category::weather(), json!({"temperature": 72})),
            (Category::market(), json!({})),
            (Category::security(), json!({})),
        ]
        .into_iter()
        .collect();
        let text = BriefingRenderer::default().render_at(&bundle, at());
        let line = text
            .lines()
            .find(|l| l.starts_with("Temperature:"))
            .unwrap();
        assert_eq!(line, "Temperature: 72°F");
        assert!(!text.contains("°C"));
    }

    #[test]
    fn test_malformed_typed_payload_falls_back_to_listing() {
        let bundle: DataBundle = [(Category::security(), json!({"alerts": "none today"}))]
            .into_iter()
            .collect();
        let text = BriefingRenderer::default().render_at(&bundle, at());
        assert!(text.contains(" SECURITY "));
        assert!(text.contains("alerts: none today"));
    }

    #[test]
    fn test_bar_chart() {
        assert_eq!(bar_chart(70.0, 100.0, 10), "███████");
        assert_eq!(bar_chart(250.0, 100.0, 10).chars().count(), 10);
        assert_eq!(bar_chart(-5.0, 100.0, 10), "");
    }

    #[test]
    fn test_table_borders() {
        let rows = vec![vec!["a".to_string(), "b".to_string()]];
        let lines = table(&["X", "Y"], &rows, &[3, 2]);
        assert_eq!(
            lines,
            vec!["┌───┬──┐", "│X  │Y │", "├───┼──┤", "│a  │b │", "└───┴──┘"]
        );
    }
}
