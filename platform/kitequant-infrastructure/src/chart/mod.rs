use kitequant_domain::repositories::chart::{ChartInput, ChartRenderer, ChartStyle};
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Writes a self-contained HTML page that draws the chart on a canvas.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlChartRenderer;

impl HtmlChartRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ChartRenderer for HtmlChartRenderer {
    fn render(
        &self,
        path: &Path,
        input: &ChartInput<'_>,
        style: &ChartStyle,
    ) -> Result<(), String> {
        let start = Instant::now();
        let result = render_html(input, style).and_then(|html| {
            fs::write(path, html)
                .map_err(|err| format!("failed to write chart {}: {}", path.display(), err))
        });
        let result_label = if result.is_ok() { "ok" } else { "err" };
        metrics::histogram!("kitequant.infra.chart.render_ms", "result" => result_label)
            .record(start.elapsed().as_millis() as f64);
        result
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
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

fn swatch(color: &str) -> String {
    format!(r#"<span class="swatch" style="background:{}"></span>"#, escape_html(color))
}

fn explanations_panel(style: &ChartStyle) -> String {
    let items = [
        format!("{} candles = Price went UP", swatch(&style.bar_up)),
        format!("{} candles = Price went DOWN", swatch(&style.bar_down)),
        format!(
            "{} line = {}",
            swatch(&style.fast_color),
            escape_html(&style.fast_label)
        ),
        format!(
            "{} line = {}",
            swatch(&style.slow_color),
            escape_html(&style.slow_label)
        ),
        "&#9650; UP arrows = BUY signals".to_string(),
        "&#9660; DOWN arrows = SELL signals".to_string(),
    ];
    let list: String = items
        .iter()
        .map(|item| format!("      <li>{item}</li>\n"))
        .collect();
    format!(
        "  <div class=\"card tips\">\n    <h2>HOW TO READ THIS:</h2>\n    <ul>\n{list}    </ul>\n  </div>\n"
    )
}

pub fn render_html(input: &ChartInput<'_>, style: &ChartStyle) -> Result<String, String> {
    let result = input.result;
    let fast: Vec<Option<f64>> = result.equity.iter().map(|point| point.fast_sma).collect();
    let slow: Vec<Option<f64>> = result.equity.iter().map(|point| point.slow_sma).collect();
    let payload = serde_json::json!({
        "bars": input.bars,
        "fast": fast,
        "slow": slow,
        "markers": result.markers(),
        "style": style,
    });
    let payload = serde_json::to_string(&payload)
        .map_err(|err| format!("failed to serialize chart data: {err}"))?
        .replace("</", "<\\/");

    let title = escape_html(input.title);
    let symbol = escape_html(input.symbol);
    let panel = if style.explanations {
        explanations_panel(style)
    } else {
        String::new()
    };

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8"/>
  <title>{title}</title>
  <style>
    body {{ font-family: ui-sans-serif, system-ui; padding: 24px; background: #fafafa; }}
    .card {{ border: 1px solid #ddd; border-radius: 10px; padding: 16px; background: #fff; margin-bottom: 16px; }}
    canvas {{ width: 100%; height: 480px; border: 1px solid #eee; border-radius: 8px; }}
    .legend span {{ margin-right: 16px; }}
    .swatch {{ display: inline-block; width: 12px; height: 12px; border-radius: 2px; vertical-align: middle; }}
    .tips {{ background: #fffbe6; }}
    .muted {{ color: #666; }}
  </style>
</head>
<body>
  <h1>{title}</h1>
  <p class="muted">symbol: <code>{symbol}</code> · bars: {bars} · trades: {trades} · profit: {profit:.2} · final value: {final_value:.2}</p>
  <div class="card">
    <canvas id="chart"></canvas>
    <p class="legend">
      <span>{fast_swatch} {fast_label}</span>
      <span>{slow_swatch} {slow_label}</span>
    </p>
  </div>
{panel}  <script>
    const data = {payload};
{script}  </script>
</body>
</html>
"#,
        bars = input.bars.len(),
        trades = result.trade_count(),
        profit = result.profit_total(),
        final_value = result.final_value,
        fast_swatch = swatch(&style.fast_color),
        slow_swatch = swatch(&style.slow_color),
        fast_label = escape_html(&style.fast_label),
        slow_label = escape_html(&style.slow_label),
        script = CHART_SCRIPT,
    ))
}

const CHART_SCRIPT: &str = r#"
    function draw() {
      const canvas = document.getElementById('chart');
      const ctx = canvas.getContext('2d');
      const dpr = window.devicePixelRatio || 1;
      const w = canvas.width = canvas.clientWidth * dpr;
      const h = canvas.height = canvas.clientHeight * dpr;
      ctx.clearRect(0, 0, w, h);

      const bars = data.bars;
      ctx.font = (11 * dpr) + 'px sans-serif';
      if (!bars.length) {
        ctx.fillStyle = '#666';
        ctx.fillText('no price data', 10 * dpr, 20 * dpr);
        return;
      }

      let lo = Infinity;
      let hi = -Infinity;
      for (const b of bars) {
        lo = Math.min(lo, b.low);
        hi = Math.max(hi, b.high);
      }
      const span = (hi - lo) || 1;
      lo -= span * 0.08;
      hi += span * 0.08;

      const pad = 48 * dpr;
      const step = (w - 2 * pad) / bars.length;
      const x = i => pad + step * (i + 0.5);
      const y = v => h - pad - (v - lo) / (hi - lo) * (h - 2 * pad);

      ctx.strokeStyle = '#eee';
      ctx.fillStyle = '#666';
      for (let k = 0; k <= 4; k++) {
        const v = lo + (hi - lo) * k / 4;
        ctx.beginPath();
        ctx.moveTo(pad, y(v));
        ctx.lineTo(w - pad, y(v));
        ctx.stroke();
        ctx.fillText(v.toFixed(2), 2 * dpr, y(v) - 2 * dpr);
      }
      const labelEvery = Math.max(1, Math.ceil(bars.length / 8));
      bars.forEach((b, i) => {
        if (i % labelEvery === 0) ctx.fillText(b.date, x(i) - 24 * dpr, h - pad / 3);
      });

      const body = Math.max(1, step * 0.7);
      ctx.globalAlpha = data.style.bar_alpha;
      bars.forEach((b, i) => {
        const color = b.close >= b.open ? data.style.bar_up : data.style.bar_down;
        ctx.strokeStyle = color;
        ctx.fillStyle = color;
        ctx.beginPath();
        ctx.moveTo(x(i), y(b.high));
        ctx.lineTo(x(i), y(b.low));
        ctx.stroke();
        const top = y(Math.max(b.open, b.close));
        const height = Math.max(dpr, Math.abs(y(b.open) - y(b.close)));
        ctx.fillRect(x(i) - body / 2, top, body, height);
      });
      ctx.globalAlpha = 1;

      function line(values, color) {
        ctx.strokeStyle = color;
        ctx.lineWidth = 2 * dpr;
        ctx.beginPath();
        let started = false;
        values.forEach((v, i) => {
          if (v === null) { started = false; return; }
          if (started) { ctx.lineTo(x(i), y(v)); } else { ctx.moveTo(x(i), y(v)); started = true; }
        });
        ctx.stroke();
        ctx.lineWidth = 1;
      }
      line(data.fast, data.style.fast_color);
      line(data.slow, data.style.slow_color);

      const index = new Map(bars.map((b, i) => [b.date, i]));
      const s = 6 * dpr;
      for (const m of data.markers) {
        const i = index.get(m.date);
        if (i === undefined) continue;
        const bar = bars[i];
        ctx.beginPath();
        if (m.kind === 'buy') {
          const tip = y(bar.low) + 4 * dpr;
          ctx.fillStyle = data.style.bar_up;
          ctx.moveTo(x(i), tip);
          ctx.lineTo(x(i) - s, tip + 2 * s);
          ctx.lineTo(x(i) + s, tip + 2 * s);
        } else {
          const tip = y(bar.high) - 4 * dpr;
          ctx.fillStyle = data.style.bar_down;
          ctx.moveTo(x(i), tip);
          ctx.lineTo(x(i) - s, tip - 2 * s);
          ctx.lineTo(x(i) + s, tip - 2 * s);
        }
        ctx.closePath();
        ctx.fill();
      }
    }
    draw();
    window.addEventListener('resize', draw);
"#;
