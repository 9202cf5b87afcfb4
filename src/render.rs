//! HTML report generation.
//!
//! Produces one self-contained page with the four views. Every value taken
//! from the dataset goes through `escape_html`; interactivity is declared
//! with `data-toggle` attributes and wired by a single page script.

use crate::types::ResultStatus;
use crate::util::{escape_html as esc, format_int, format_number};
use crate::views::{Card, CategoryView, DatasetOverview, Report, StatsView, TableView};
use serde_json::{json, Value};

const CHART_JS_CDN: &str = "https://cdn.jsdelivr.net/npm/chart.js@4";

const COMPLIANT_COLOR: &str = "#28a745";
const CRITICAL_COLOR: &str = "#dc3545";
const OTHER_COLOR: &str = "#ffc107";
const ACCENT_COLOR: &str = "#0e6505";

/// One chart to draw on the canvas with id `canvas`.
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub canvas: &'static str,
    pub config: Value,
}

/// The charts belonging to one rendered stats view.
///
/// A set is built per render and consumed by `into_script`; the emitted
/// script owns the live chart handles and destroys them when the page goes
/// away.
#[derive(Debug, Clone, Default)]
pub struct ChartSet {
    charts: Vec<ChartSpec>,
}

impl ChartSet {
    pub fn for_stats(stats: &StatsView) -> Self {
        let mut set = ChartSet::default();
        let overall = &stats.overall;
        if overall.total_with_results > 0 {
            set.charts.push(ChartSpec {
                canvas: "complianceDonutChart",
                config: json!({
                    "type": "doughnut",
                    "data": {
                        "labels": ["Compliant", "Critical Violations", "Other"],
                        "datasets": [{
                            "data": [overall.compliant_count, overall.critical_count, overall.other_count],
                            "backgroundColor": [COMPLIANT_COLOR, CRITICAL_COLOR, OTHER_COLOR],
                            "borderWidth": 3,
                            "borderColor": "#fff"
                        }]
                    },
                    "options": {
                        "responsive": true,
                        "maintainAspectRatio": false,
                        "plugins": {
                            "legend": { "position": "bottom" },
                            "title": { "display": true, "text": "Overall Inspection Results Distribution" }
                        }
                    }
                }),
            });
        }

        if !stats.top_categories.is_empty() {
            let labels: Vec<&str> = stats.top_categories.iter().map(|c| c.key.as_str()).collect();
            let compliant: Vec<usize> = stats.top_categories.iter().map(|c| c.compliant).collect();
            let non_compliant: Vec<usize> = stats
                .top_categories
                .iter()
                .map(|c| c.total - c.compliant)
                .collect();
            set.charts.push(ChartSpec {
                canvas: "categoryBarChart",
                config: json!({
                    "type": "bar",
                    "data": {
                        "labels": labels,
                        "datasets": [
                            { "label": "Compliant", "data": compliant, "backgroundColor": COMPLIANT_COLOR },
                            { "label": "Non-Compliant", "data": non_compliant, "backgroundColor": CRITICAL_COLOR }
                        ]
                    },
                    "options": {
                        "responsive": true,
                        "maintainAspectRatio": false,
                        "scales": {
                            "x": { "stacked": true },
                            "y": { "stacked": true, "beginAtZero": true,
                                   "title": { "display": true, "text": "Number of Inspections" } }
                        },
                        "plugins": {
                            "title": { "display": true,
                                       "text": format!("Top {} Categories by Inspection Volume", stats.top_categories.len()) }
                        }
                    }
                }),
            });
        }

        if !stats.top_cities.is_empty() {
            let labels: Vec<&str> = stats.top_cities.iter().map(|c| c.key.as_str()).collect();
            let rates: Vec<f64> = stats.top_cities.iter().map(|c| c.rate).collect();
            let colors: Vec<&str> = rates.iter().map(|r| rate_color(*r)).collect();
            set.charts.push(ChartSpec {
                canvas: "cityComparisonChart",
                config: json!({
                    "type": "bar",
                    "data": {
                        "labels": labels,
                        "datasets": [{
                            "label": "Compliance Rate (%)",
                            "data": rates,
                            "backgroundColor": colors,
                            "borderColor": ACCENT_COLOR,
                            "borderWidth": 2
                        }]
                    },
                    "options": {
                        "indexAxis": "y",
                        "responsive": true,
                        "maintainAspectRatio": false,
                        "scales": { "x": { "beginAtZero": true, "max": 100 } },
                        "plugins": {
                            "legend": { "display": false },
                            "title": { "display": true, "text": "Compliance Rates by City" }
                        }
                    }
                }),
            });
        }

        if !stats.monthly.is_empty() {
            let labels: Vec<&str> = stats.monthly.iter().map(|m| m.label.as_str()).collect();
            let rates: Vec<f64> = stats.monthly.iter().map(|m| m.rate).collect();
            let totals: Vec<usize> = stats.monthly.iter().map(|m| m.total).collect();
            set.charts.push(ChartSpec {
                canvas: "trendLineChart",
                config: json!({
                    "type": "line",
                    "data": {
                        "labels": labels,
                        "datasets": [
                            { "label": "Compliance Rate (%)", "data": rates, "borderColor": ACCENT_COLOR,
                              "tension": 0.3, "yAxisID": "y" },
                            { "label": "Total Inspections", "data": totals, "borderColor": "#007cba",
                              "tension": 0.3, "yAxisID": "y1" }
                        ]
                    },
                    "options": {
                        "responsive": true,
                        "maintainAspectRatio": false,
                        "interaction": { "mode": "index", "intersect": false },
                        "scales": {
                            "y": { "position": "left", "beginAtZero": true, "max": 100 },
                            "y1": { "position": "right", "beginAtZero": true,
                                    "grid": { "drawOnChartArea": false } }
                        },
                        "plugins": {
                            "title": { "display": true, "text": "Inspection Trends" }
                        }
                    }
                }),
            });
        }
        set
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn canvas_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.charts.iter().map(|c| c.canvas)
    }

    /// Script that creates every chart and tears them down on `pagehide`.
    pub fn into_script(self) -> String {
        let specs: Vec<Value> = self
            .charts
            .into_iter()
            .map(|c| json!({ "canvas": c.canvas, "config": c.config }))
            .collect();
        // `</` would close the script element early.
        let specs = Value::Array(specs).to_string().replace("</", "<\\/");
        format!(
            r#"(() => {{
  const specs = {specs};
  const charts = [];
  if (!window.Chart) return;
  for (const spec of specs) {{
    const el = document.getElementById(spec.canvas);
    if (el) charts.push(new Chart(el, spec.config));
  }}
  window.addEventListener('pagehide', () => {{
    charts.forEach(chart => chart.destroy());
    charts.length = 0;
  }});
}})();"#
        )
    }
}

fn rate_color(rate: f64) -> &'static str {
    if rate >= 70.0 {
        COMPLIANT_COLOR
    } else if rate >= 50.0 {
        OTHER_COLOR
    } else {
        CRITICAL_COLOR
    }
}

/// Render the whole report as one HTML page.
pub fn render_page(report: &Report) -> String {
    let charts = ChartSet::for_stats(&report.stats);
    let stats_section = render_stats(&report.stats, &report.overview, &charts);
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Food Inspection Report</title>
    <style>{css}</style>
    <script src="{cdn}"></script>
</head>
<body>
    <nav class="view-nav">
        <a href="#table-view">Table</a>
        <a href="#card-view">Cards</a>
        <a href="#category-view">Categories</a>
        <a href="#stats-view">Stats</a>
    </nav>
    <main>
        {table}
        {cards}
        {categories}
        {stats}
    </main>
    <footer>Generated {generated}</footer>
    <script>{toggle_js}</script>
    <script>{chart_js}</script>
</body>
</html>"##,
        css = inline_css(),
        cdn = CHART_JS_CDN,
        table = render_table(&report.table),
        cards = render_cards(&report.cards),
        categories = render_categories(&report.categories),
        stats = stats_section,
        generated = esc(report.generated_at.format("%Y-%m-%d %H:%M").to_string()),
        toggle_js = toggle_script(),
        chart_js = charts.into_script(),
    )
}

pub fn render_table(view: &TableView) -> String {
    let mut out = String::new();
    out.push_str(r#"<section id="table-view"><h2 class="view-title">📊 Table View</h2>"#);
    out.push_str(&format!(
        r#"<p class="view-description">{} establishments inspected in {} ({} results)</p>"#,
        esc(&view.city),
        view.year,
        format_int(view.matched)
    ));

    if view.rows.is_empty() {
        out.push_str(&format!(
            r#"<div class="no-results"><h3>No Results Found</h3><p>No establishments found matching the filter criteria:</p><p><strong>City:</strong> {}</p><p><strong>Year:</strong> {}</p></div>"#,
            esc(&view.city),
            view.year
        ));
    } else {
        out.push_str(r#"<table class="restaurant-table"><thead><tr><th>Establishment Name</th><th>Category</th><th>City</th><th>Zip Code</th><th>Address</th><th>Inspection Date</th></tr></thead><tbody>"#);
        for row in &view.rows {
            out.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                esc(&row.name),
                esc(&row.category),
                esc(&row.city),
                esc(&row.zip),
                esc(&row.address),
                esc(&row.inspection_date)
            ));
        }
        out.push_str("</tbody></table>");
    }
    out.push_str("</section>");
    out
}

pub fn render_cards(cards: &[Card]) -> String {
    let mut out = String::new();
    out.push_str(r#"<section id="card-view"><h2 class="view-title">🃏 Card View</h2>"#);
    out.push_str(&format!(
        r#"<p class="view-description">{} Most Recently Inspected Food Establishments</p><div class="card-grid">"#,
        cards.len()
    ));
    for card in cards {
        out.push_str(&format!(
            r#"<div class="restaurant-card status-{status}"><h3>{name}</h3><p class="card-category">{category}</p><p class="card-city">{city}</p><p class="card-results">{icon} {results}</p><p class="card-date">Inspected: {date}</p></div>"#,
            status = status_class(card.status),
            name = esc(&card.name),
            category = esc(&card.category),
            city = esc(&card.city),
            icon = card.status.icon(),
            results = esc(&card.results),
            date = esc(&card.inspection_date),
        ));
    }
    out.push_str("</div></section>");
    out
}

fn status_class(status: ResultStatus) -> &'static str {
    match status {
        ResultStatus::Compliant => "compliant",
        ResultStatus::Critical => "critical",
        ResultStatus::Other => "other",
    }
}

pub fn render_categories(view: &CategoryView) -> String {
    let mut out = String::new();
    out.push_str(r#"<section id="category-view"><h2 class="view-title">📂 Category View</h2>"#);
    out.push_str(&format!(
        r#"<p class="view-description">Compliant Food Establishments in {} (Click to expand)</p>"#,
        esc(&view.city)
    ));
    for group in &view.groups {
        out.push_str(&format!(
            r#"<div class="category-section"><button type="button" class="category-header" data-toggle="{id}" aria-expanded="false" aria-controls="{id}">{icon} {title} ({count}) <span class="toggle-icon">▼</span></button><div class="category-items" id="{id}" hidden>"#,
            id = group.id,
            icon = group.icon,
            title = group.title,
            count = group.items.len(),
        ));
        if group.items.is_empty() {
            out.push_str(&format!(
                r#"<div class="category-item"><span>{}</span></div>"#,
                group.empty_message
            ));
        }
        for item in &group.items {
            out.push_str(&format!(
                r#"<div class="category-item"><span><strong>{}</strong></span><span>{}</span></div>"#,
                esc(&item.name),
                esc(&item.inspection_date)
            ));
        }
        out.push_str("</div></div>");
    }
    out.push_str("</section>");
    out
}

pub fn render_stats(stats: &StatsView, overview: &DatasetOverview, charts: &ChartSet) -> String {
    let mut out = String::new();
    out.push_str(r#"<section id="stats-view"><h2 class="view-title">📊 Food Safety Statistics</h2>"#);
    out.push_str(r#"<div class="stats-grid">"#);

    let safest = stats
        .safest_category
        .as_ref()
        .map(|s| (s.category.clone(), format!("{}% compliant", format_number(s.rate, 1))))
        .unwrap_or_else(|| ("N/A".to_string(), "Not enough inspections".to_string()));
    let most_common = overview
        .most_common_category
        .as_ref()
        .map(|k| (k.key.clone(), format!("{} establishments", format_int(k.count))))
        .unwrap_or_else(|| ("N/A".to_string(), String::new()));
    let active_year = overview
        .most_active_year
        .as_ref()
        .map(|k| (k.key.clone(), format!("{} inspections", format_int(k.count))))
        .unwrap_or_else(|| ("N/A".to_string(), String::new()));

    let cards = [
        (
            "Overall Compliance".to_string(),
            format!("{}%", format_number(stats.overall.rate, 1)),
            format!("of {} inspections", format_int(stats.overall.total_with_results)),
        ),
        (
            format!("{} Safety Score", stats.city),
            format!("{}%", format_number(stats.city_rate, 1)),
            format!("{} inspections", format_int(stats.city_inspections)),
        ),
        ("Safest Category".to_string(), safest.0, safest.1),
        (
            "Cities Covered".to_string(),
            format_int(overview.total_cities),
            format!("{} inspections per city", format_number(overview.avg_per_city, 1)),
        ),
        ("Most Common Type".to_string(), most_common.0, most_common.1),
        ("Most Active Year".to_string(), active_year.0, active_year.1),
    ];
    for (label, number, sublabel) in &cards {
        out.push_str(&format!(
            r#"<div class="stat-card"><div class="stat-label">{}</div><div class="stat-number">{}</div><div class="stat-sublabel">{}</div></div>"#,
            esc(label),
            esc(number),
            esc(sublabel)
        ));
    }
    out.push_str("</div>");

    for id in charts.canvas_ids() {
        out.push_str(&format!(
            r#"<div class="chart-container"><canvas id="{}"></canvas></div>"#,
            id
        ));
    }
    out.push_str(&format!(
        r#"<div class="safety-tip"><strong>💡 Interactive Charts:</strong> {}</div>"#,
        esc(&stats.tip)
    ));
    out.push_str("</section>");
    out
}

fn toggle_script() -> &'static str {
    r#"document.querySelectorAll('[data-toggle]').forEach(header => {
  header.addEventListener('click', () => {
    const items = document.getElementById(header.dataset.toggle);
    if (!items) return;
    const open = items.hasAttribute('hidden');
    items.toggleAttribute('hidden', !open);
    header.setAttribute('aria-expanded', String(open));
    const icon = header.querySelector('.toggle-icon');
    if (icon) icon.textContent = open ? '▲' : '▼';
  });
});"#
}

fn inline_css() -> &'static str {
    r#"body{font-family:system-ui,sans-serif;margin:0;color:#222;background:#f7f9f7}
main{max-width:1100px;margin:0 auto;padding:1rem}
.view-nav{display:flex;gap:1rem;padding:1rem;background:#0e6505}
.view-nav a{color:#fff;text-decoration:none;font-weight:600}
section{margin-bottom:3rem}
.view-title{color:#0e6505}
.restaurant-table{width:100%;border-collapse:collapse}
.restaurant-table th,.restaurant-table td{padding:.5rem;border-bottom:1px solid #ddd;text-align:left}
.card-grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(240px,1fr));gap:1rem}
.restaurant-card{background:#fff;border-radius:8px;padding:1rem;box-shadow:0 1px 3px rgba(0,0,0,.1)}
.status-compliant{border-left:4px solid #28a745}
.status-critical{border-left:4px solid #dc3545}
.status-other{border-left:4px solid #ffc107}
.category-header{width:100%;text-align:left;font-size:1.1rem;padding:.75rem;border:0;background:#e8f2e7;cursor:pointer}
.category-item{display:flex;justify-content:space-between;padding:.4rem .75rem;border-bottom:1px solid #eee}
.stats-grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(200px,1fr));gap:1rem}
.stat-card{background:#fff;border-radius:8px;padding:1rem;text-align:center}
.stat-number{font-size:1.6rem;font-weight:700;color:#0e6505}
.chart-container{position:relative;height:320px;margin:2rem 0}
.safety-tip{background:#fff8e1;padding:1rem;border-radius:8px}
footer{text-align:center;color:#777;padding:1rem}"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::types::InspectionRecord;
    use crate::views::build_report;
    use chrono::NaiveDate;

    fn report(records: &[InspectionRecord]) -> Report {
        let now = NaiveDate::from_ymd_opt(2020, 12, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        build_report(records, &ViewConfig::default(), now)
    }

    fn hostile() -> Vec<InspectionRecord> {
        vec![InspectionRecord {
            name: Some("<script>alert('x')</script>".into()),
            category: Some("Restaurant".into()),
            city: Some("College Park".into()),
            inspection_date: Some("2020-06-01".into()),
            inspection_results: Some("Compliant".into()),
            ..Default::default()
        }]
    }

    #[test]
    fn test_page_escapes_record_text() {
        let html = render_page(&report(&hostile()));
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }

    #[test]
    fn test_page_links_every_view() {
        let html = render_page(&report(&hostile()));
        for anchor in ["table-view", "card-view", "category-view", "stats-view"] {
            assert!(html.contains(&format!(r##"href="#{anchor}""##)));
            assert!(html.contains(&format!(r#"id="{anchor}""#)));
        }
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_no_inline_handlers() {
        let html = render_page(&report(&hostile()));
        assert!(!html.contains("onclick"));
        assert!(html.contains(r#"data-toggle="restaurants""#));
    }

    #[test]
    fn test_chart_set_matches_available_data() {
        let r = report(&hostile());
        let charts = ChartSet::for_stats(&r.stats);
        let ids: Vec<&str> = charts.canvas_ids().collect();
        // One city with a single inspection never reaches the city threshold.
        assert_eq!(ids, vec!["complianceDonutChart", "categoryBarChart", "trendLineChart"]);
        assert_eq!(charts.len(), 3);

        let empty = report(&[]);
        assert!(ChartSet::for_stats(&empty.stats).is_empty());
    }

    #[test]
    fn test_chart_script_cannot_close_script_tag() {
        let mut records = hostile();
        records[0].category = Some("</script><b>".into());
        let r = report(&records);
        let script = ChartSet::for_stats(&r.stats).into_script();
        assert!(!script.contains("</script>"));
        assert!(script.contains("pagehide"));
    }

    #[test]
    fn test_empty_table_shows_criteria() {
        let html = render_table(&report(&[]).table);
        assert!(html.contains("No Results Found"));
        assert!(html.contains("College Park"));
        assert!(html.contains("2020"));
    }
}
