use crate::model::TimelineReport;

/// Render a self-contained HTML timeline (data embedded as JSON, drawn as SVG).
///
/// Important: we avoid `format!()` because the HTML contains many `{}` from JS
/// template literals (e.g., `${x}`), which would conflict with Rust formatting.
pub fn render_html_report(data: &TimelineReport) -> anyhow::Result<String> {
    // Labels come from the plan text; keep them from closing the script tag.
    let json = serde_json::to_string(data)?.replace("</", "<\\/");

    const TEMPLATE: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>EXPLAIN ANALYZE timeline</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; }
  h1 { font-size: 16px; margin: 0 0 8px 0; }
  .summary { display: flex; gap: 16px; flex-wrap: wrap; font-size: 14px; color: #333; }
  .pill { padding: 4px 8px; border: 1px solid #ddd; border-radius: 999px; background: #fafafa; }
  .warn { color: #a40; font-size: 13px; margin-top: 6px; }
  .main { padding: 12px 16px; overflow: auto; }
  .legend { margin-top: 12px; font-size: 12px; }
  .legend div { display: flex; align-items: center; gap: 6px; padding: 1px 0; }
  .swatch { display: inline-block; width: 18px; height: 3px; }
  svg text { font-size: 10px; fill: #222; }
  svg .axis-label { font-size: 11px; }
  svg .note { font-size: 9px; }
</style>
</head>
<body>
<header>
  <h1 id="title"></h1>
  <div class="summary" id="summary"></div>
  <div id="warnings"></div>
</header>

<div class="main">
  <svg id="chart" xmlns="http://www.w3.org/2000/svg"></svg>
  <div class="legend" id="legend"></div>
</div>

<script>
// Embedded report data (JSON object literal)
const DATA = __DATA__;

const PALETTE = [
  "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
  "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf"
];

const LAYOUT = { left: 180, right: 40, top: 60, bottom: 50, rowHeight: 56, width: 1100 };
const SVG_NS = "http://www.w3.org/2000/svg";

function fmtMs(x) {
  return x == null ? "n/a" : (Math.round(x * 100) / 100).toFixed(2);
}

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function el(name, attrs, parent) {
  const node = document.createElementNS(SVG_NS, name);
  for (const [k, v] of Object.entries(attrs)) node.setAttribute(k, v);
  if (parent) parent.appendChild(node);
  return node;
}

// Multi-line text: one tspan per "\n" separated line.
function multiline(parent, x, y, text, attrs) {
  const t = el("text", Object.assign({ x, y }, attrs || {}), parent);
  const lines = String(text).split("\n");
  lines.forEach((line, i) => {
    const span = el("tspan", { x, dy: i === 0 ? 0 : "1.1em" }, t);
    span.textContent = line;
  });
  return t;
}

function renderSummary() {
  const t = DATA.totals;
  document.getElementById("title").textContent = DATA.title;
  document.getElementById("summary").innerHTML = `
    <span class="pill">operations: <b>${t.operations}</b></span>
    <span class="pill">planning: <b>${fmtMs(t.planning_time_ms)} ms</b></span>
    <span class="pill">execution: <b>${fmtMs(t.execution_time_ms)} ms</b></span>
    <span class="pill">max rows: <b>${t.max_row_count.toLocaleString("en-US")}</b></span>
  `;
  document.getElementById("warnings").innerHTML = DATA.warnings
    .map((w) => `<div class="warn">${escapeHtml(w)}</div>`)
    .join("");
}

function renderChart() {
  const svg = document.getElementById("chart");
  const n = Math.max(DATA.rows.length, 1);
  const plotW = LAYOUT.width - LAYOUT.left - LAYOUT.right;
  const plotH = n * LAYOUT.rowHeight;
  svg.setAttribute("width", LAYOUT.width);
  svg.setAttribute("height", LAYOUT.top + plotH + LAYOUT.bottom);

  // Row 0 at the bottom, like a y axis.
  const xOf = (ms) => LAYOUT.left + (ms / DATA.x_max_ms) * plotW;
  const yOf = (i) => LAYOUT.top + plotH - (i + 0.5) * LAYOUT.rowHeight;
  const bottom = LAYOUT.top + plotH;

  // Axes.
  el("line", { x1: LAYOUT.left, y1: bottom, x2: LAYOUT.left + plotW, y2: bottom, stroke: "#444" }, svg);
  el("line", { x1: LAYOUT.left, y1: LAYOUT.top, x2: LAYOUT.left, y2: bottom, stroke: "#444" }, svg);
  const ticks = 10;
  for (let k = 0; k <= ticks; k++) {
    const ms = (DATA.x_max_ms * k) / ticks;
    const x = xOf(ms);
    el("line", { x1: x, y1: bottom, x2: x, y2: bottom + 4, stroke: "#444" }, svg);
    el("text", { x, y: bottom + 16, "text-anchor": "middle" }, svg).textContent = Math.round(ms);
  }
  el("text", { x: LAYOUT.left + plotW / 2, y: bottom + 36, "text-anchor": "middle", class: "axis-label" }, svg)
    .textContent = "Run Time (ms)";
  el("text", { x: 14, y: LAYOUT.top + plotH / 2, "text-anchor": "middle", class: "axis-label",
               transform: `rotate(-90 14 ${LAYOUT.top + plotH / 2})` }, svg)
    .textContent = "Query Parts";

  for (const row of DATA.rows) {
    const y = yOf(row.index);
    multiline(svg, LAYOUT.left - 8, y - 4, row.wrapped_label, { "text-anchor": "end" });
    el("line", { x1: LAYOUT.left, y1: y, x2: LAYOUT.left + plotW, y2: y,
                 stroke: "lightgrey", "stroke-dasharray": "2,3" }, svg);

    if (!row.plotted) continue;

    const color = PALETTE[row.color_index % PALETTE.length];
    const x1 = xOf(row.start_ms);
    const x2 = xOf(row.end_ms);
    const xm = xOf(row.mid_ms);

    // Dotted guides from the x axis up to the bar ends.
    for (const x of [x1, x2]) {
      el("line", { x1: x, y1: bottom, x2: x, y2: y - 0.4 * LAYOUT.rowHeight,
                   stroke: color, "stroke-dasharray": "1,3", opacity: 0.7 }, svg);
    }

    el("line", { x1, y1: y, x2, y2: y, stroke: color, "stroke-width": 2 }, svg);
    for (const x of [x1, x2]) {
      el("line", { x1: x, y1: y - 6, x2: x, y2: y + 6, stroke: color, "stroke-width": 2 }, svg);
    }

    // Bubble area proportional to bubble_size.
    const by = y - 0.3 * LAYOUT.rowHeight;
    const r = Math.sqrt(row.bubble_size) / 2;
    if (r > 0) el("circle", { cx: xm, cy: by, r, fill: color, opacity: 0.5 }, svg);
    multiline(svg, xm + 2, by, row.bubble_text, { class: "note" });

    if (row.sort_annotation) {
      multiline(svg, xm, y + 12, row.sort_annotation, { class: "note", "text-anchor": "middle" });
    }
  }

  for (const m of DATA.markers) {
    const x = xOf(m.at_ms);
    const y = yOf(m.y);
    const planning = m.kind === "planning_time";
    const tx = planning ? x + 40 : x - 10;
    const ty = y - 0.8 * LAYOUT.rowHeight;
    el("line", { x1: tx, y1: ty + 6, x2: x, y2: y, stroke: "red" }, svg);
    el("circle", { cx: x, cy: y, r: 2, fill: "red" }, svg);
    multiline(svg, tx, ty - 8, m.text, { class: "note", "text-anchor": planning ? "start" : "end" });
  }
}

function renderLegend() {
  const legend = document.getElementById("legend");
  const byLabel = new Map(DATA.rows.filter((r) => r.plotted).map((r) => [r.label, r]));
  legend.innerHTML = DATA.legend
    .map((label) => {
      const row = byLabel.get(label);
      const color = row ? PALETTE[row.color_index % PALETTE.length] : "#999";
      return `<div><span class="swatch" style="background:${color}"></span>${escapeHtml(label)}</div>`;
    })
    .join("");
}

renderSummary();
renderChart();
renderLegend();
</script>
</body>
</html>
"##;

    Ok(TEMPLATE.replace("__DATA__", &json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RenderOptions, build_timeline_report};
    use crate::plan::timeline::parse_plan_text;

    #[test]
    fn embeds_report_json() {
        let summary = parse_plan_text(
            "Seq Scan on t  (cost=0.00..1.00 rows=5 width=4) (actual time=0.01..0.02 rows=5 loops=1)\n\
             Execution Time: 0.050 ms",
        )
        .expect("parse");
        let report = build_timeline_report(&summary, &RenderOptions::default());
        let html = render_html_report(&report).expect("render");

        assert!(!html.contains("__DATA__"));
        assert!(html.contains(r#""label":"Seq Scan on t""#));
        assert!(html.contains(r#""kind":"execution_time""#));
    }

    #[test]
    fn labels_cannot_close_the_script() {
        let summary = parse_plan_text(
            "Seq Scan on </script>  (cost=0.00..1.00 rows=5 width=4) (actual time=0.01..0.02 rows=5 loops=1)",
        )
        .expect("parse");
        let report = build_timeline_report(&summary, &RenderOptions::default());
        let html = render_html_report(&report).expect("render");

        assert_eq!(html.matches("</script>").count(), 1);
        assert!(html.contains(r"Seq Scan on <\/script>"));
    }

    #[test]
    fn template_keeps_hex_palette() {
        let report = build_timeline_report(&Default::default(), &RenderOptions::default());
        let html = render_html_report(&report).expect("render");

        assert!(html.contains("const PALETTE = [\n  \"#1f77b4\", \"#ff7f0e\""));
        assert!(html.contains("\"#17becf\"\n];"));
        assert!(html.trim_end().ends_with("</html>"));
    }
}
