use crate::charts::Panel;
use crate::dashboard::Dashboard;
use crate::errors::AppError;
use crate::models::SummaryCard;
use crate::table::RecentTable;
use serde::Serialize;

#[derive(Serialize)]
struct Figures<'a> {
    timeline: &'a Panel,
    pies: &'a Panel,
    region_map: &'a Panel,
    animated_map: &'a Panel,
}

pub fn render_index(dashboard: &Dashboard) -> Result<String, AppError> {
    let figures = Figures {
        timeline: &dashboard.timeline,
        pies: &dashboard.pies,
        region_map: &dashboard.region_map,
        animated_map: &dashboard.animated_map,
    };
    // Keep the embedded JSON from closing its own <script> element.
    let figures = serde_json::to_string(&figures)?.replace("</", "<\\/");

    Ok(INDEX_HTML
        .replace("{{TITLE}}", &escape(&dashboard.title))
        .replace("{{CAPTION}}", &escape(&dashboard.caption))
        .replace("{{AS_OF}}", &escape(&dashboard.as_of))
        .replace("{{CARDS}}", &render_cards(&dashboard.cards))
        .replace("{{TIMELINE}}", &render_panel("timeline", &dashboard.timeline))
        .replace("{{RECENT}}", &render_recent(&dashboard.recent))
        .replace("{{PIES}}", &render_panel("pies", &dashboard.pies))
        .replace("{{REGION_MAP}}", &render_panel("region_map", &dashboard.region_map))
        .replace(
            "{{ANIMATED_MAP}}",
            &render_panel("animated_map", &dashboard.animated_map),
        )
        .replace("{{FIGURES}}", &figures))
}

fn render_cards(cards: &[SummaryCard]) -> String {
    cards
        .iter()
        .map(|card| {
            format!(
                r#"<div class="card"><h4 id="{id}-title">{title}</h4><h2 id="{id}-value">{value}</h2><p id="{id}-description">{description}</p></div>"#,
                id = escape(&card.id),
                title = escape(&card.title),
                value = escape(&card.value),
                description = escape(&card.description),
            )
        })
        .collect()
}

fn render_panel(id: &str, panel: &Panel) -> String {
    match panel {
        Panel::Ready { .. } => format!(r#"<div class="graph" id="{id}"></div>"#),
        Panel::Empty { reason } => {
            format!(r#"<div class="placeholder empty" id="{id}">{}</div>"#, escape(reason))
        }
        Panel::Failed { reason } => {
            format!(r#"<div class="placeholder failed" id="{id}">{}</div>"#, escape(reason))
        }
    }
}

fn render_recent(table: &RecentTable) -> String {
    if table.is_empty() {
        return String::new();
    }

    let mut html = String::from("<table class=\"recent\"><thead><tr><th></th>");
    for date in &table.header {
        html.push_str(&format!("<th>{}</th>", escape(date)));
    }
    html.push_str("</tr></thead><tbody>");
    for (label, cells) in &table.rows {
        html.push_str(&format!("<tr><th>{}</th>", escape(label)));
        for cell in cells {
            html.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <script src="https://cdn.plot.ly/plotly-2.27.0.min.js"></script>
  <style>
    body {
      margin: 0;
      padding: 24px 18px 48px;
      font-family: "Trebuchet MS", sans-serif;
      color: #2b2a28;
    }

    h1,
    .caption {
      text-align: center;
    }

    .caption {
      color: #5f5c57;
      margin-bottom: 24px;
    }

    .cards {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
      gap: 16px;
      max-width: 860px;
      margin: 0 auto 24px;
    }

    .card {
      border: 1px solid rgba(47, 72, 88, 0.15);
      border-radius: 12px;
      padding: 12px 18px;
    }

    .card h2 {
      margin: 4px 0;
    }

    .placeholder {
      display: grid;
      place-items: center;
      min-height: 160px;
      margin: 16px 0;
      border: 1px dashed #c8c2ba;
      border-radius: 12px;
      color: #8b857d;
    }

    .placeholder.failed {
      color: #b3261e;
    }

    table.recent {
      margin: 16px auto;
      border-collapse: collapse;
    }

    table.recent th,
    table.recent td {
      padding: 4px 10px;
      border-bottom: 1px solid #eee;
      text-align: right;
    }
  </style>
</head>
<body>
  <h1>{{TITLE}}</h1>
  <div class="caption">{{CAPTION}} (as of {{AS_OF}})</div>
  <section class="cards">{{CARDS}}</section>
  {{TIMELINE}}
  {{RECENT}}
  {{PIES}}
  {{REGION_MAP}}
  {{ANIMATED_MAP}}
  <script type="application/json" id="figures">{{FIGURES}}</script>
  <script>
    const figures = JSON.parse(document.getElementById('figures').textContent);

    Object.entries(figures).forEach(([id, panel]) => {
      if (panel.status !== 'ready') {
        return;
      }
      const { data, layout, frames } = panel.figure;
      Plotly.newPlot(id, data, layout).then(() => {
        if (frames && frames.length) {
          Plotly.addFrames(id, frames);
        }
      });
    });
  </script>
</body>
</html>
"#;
