//! HTML rendering for the predictor page.
//!
//! Pure functions from form, record and outcome to markup. No state, no
//! business logic.

use crate::error::PredictionError;
use crate::form::{FormField, InputForm, Submission, WidgetKind};
use crate::types::{InputRecord, PredictionResult, Tone};
use std::collections::HashMap;

const TITLE: &str = "Student Success Predictor";

const STYLE: &str = r#"
body{font-family:system-ui,sans-serif;margin:0;background:#f6f7f9;color:#1f2933}
.layout{display:grid;grid-template-columns:320px 1fr;min-height:100vh}
aside{background:#fff;border-right:1px solid #e4e7eb;padding:1.5rem;overflow-y:auto}
main{padding:1.5rem 2.5rem}
.columns{display:grid;grid-template-columns:2fr 1.5fr;gap:2rem}
label{display:block;font-size:.85rem;margin-top:.9rem}
input,select{width:100%;box-sizing:border-box;padding:.35rem;margin-top:.2rem}
.help{font-size:.75rem;color:#7b8794}
button{margin-top:1.2rem;width:100%;padding:.6rem;background:#2563eb;color:#fff;border:0;border-radius:6px;font-size:1rem;cursor:pointer}
table{border-collapse:collapse;width:100%;background:#fff}
td,th{border-bottom:1px solid #e4e7eb;padding:.35rem .6rem;text-align:left;font-size:.85rem}
.success{background:#dcfce7;border-left:4px solid #16a34a;padding:.8rem 1rem}
.danger{background:#fee2e2;border-left:4px solid #dc2626;padding:.8rem 1rem}
.info{background:#dbeafe;border-left:4px solid #2563eb;padding:.8rem 1rem;margin-top:.8rem}
.bar-row{display:grid;grid-template-columns:110px 1fr 70px;gap:.5rem;align-items:center;margin:.3rem 0}
.bar{background:#e4e7eb;height:18px;border-radius:3px}
.bar>div{background:#2563eb;height:18px;border-radius:3px}
footer{margin-top:2rem;font-size:.75rem;color:#7b8794}
"#;

/// What the result panel shows
#[derive(Debug)]
pub enum Outcome<'a> {
    /// Nothing predicted yet
    Pending,
    Predicted(&'a PredictionResult),
    Failed(&'a PredictionError),
}

/// Minimal HTML escaping for text and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full page: sidebar form, entered data and result panel
pub fn render_page(
    form: &InputForm,
    record: &InputRecord,
    outcome: Outcome<'_>,
    positive_label: &str,
) -> String {
    render_page_with_rejected(form, record, &HashMap::new(), outcome, positive_label)
}

/// Page for a submission that failed coercion: valid fields keep their
/// values and rejected fields show the text that was submitted
pub fn render_submission(form: &InputForm, submission: &Submission, outcome: Outcome<'_>, positive_label: &str) -> String {
    render_page_with_rejected(form, &submission.record, &submission.rejected, outcome, positive_label)
}

fn render_page_with_rejected(
    form: &InputForm,
    record: &InputRecord,
    rejected: &HashMap<String, String>,
    outcome: Outcome<'_>,
    positive_label: &str,
) -> String {
    let body = format!(
        r#"<div class="layout">
<aside>
<h2>📝 Student Data Input</h2>
{form}
</aside>
<main>
<h1>🎓 Student Academic Status Predictor</h1>
<p>This application uses Machine Learning to predict whether a student will <strong>Dropout</strong> or <strong>Graduate</strong>.</p>
<hr>
<div class="columns">
<section>
<h3>Entered Data</h3>
{entered}
</section>
<section>
<h3>Prediction Result</h3>
{result}
</section>
</div>
{footer}
</main>
</div>"#,
        form = render_form(form, record, rejected),
        entered = render_entered_data(form, record, rejected),
        result = render_outcome(&outcome, positive_label),
        footer = render_footer(),
    );

    wrap_document(&body)
}

/// Page shown when the artifacts could not be loaded; nothing else renders
pub fn render_load_failure(message: &str) -> String {
    let body = format!(
        r#"<main>
<div class="danger">Failed to load model/data files: {}</div>
</main>"#,
        escape(message)
    );
    wrap_document(&body)
}

fn wrap_document(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
{body}
</body>
</html>"#,
        title = TITLE,
        style = STYLE,
        body = body,
    )
}

fn render_footer() -> String {
    format!(
        "<hr><footer>Academic Status Prediction Dashboard v{}</footer>",
        env!("CARGO_PKG_VERSION")
    )
}

/// Sidebar form; one widget per field, pre-filled from `record`, or with the
/// submitted text for fields in `rejected`
pub fn render_form(form: &InputForm, record: &InputRecord, rejected: &HashMap<String, String>) -> String {
    let mut html = String::from(r#"<form method="post" action="/predict">"#);
    for field in form.fields() {
        let value = match (rejected.get(&field.name), record.get(&field.name)) {
            (Some(raw), _) => WidgetValue::Raw(raw),
            (None, Some(v)) => WidgetValue::Number(v),
            (None, None) => WidgetValue::Number(field.widget.default_value()),
        };
        html.push_str(&render_widget(field, value));
    }
    html.push_str(r#"<button type="submit">🚀 Check Student Status</button></form>"#);
    html
}

/// Widget content: a coerced number or the raw text of a rejected value
#[derive(Debug, Clone, Copy)]
enum WidgetValue<'a> {
    Number(f64),
    Raw(&'a str),
}

impl WidgetValue<'_> {
    /// Attribute text, integer-formatted unless the widget takes decimals
    fn attr(&self, decimal: bool) -> String {
        match self {
            WidgetValue::Number(v) if decimal => v.to_string(),
            WidgetValue::Number(v) => (*v as i64).to_string(),
            WidgetValue::Raw(raw) => escape(raw),
        }
    }

    /// Number inputs blank out text the browser cannot parse, so a rejected
    /// value is echoed in a text input
    fn input_type(&self) -> &'static str {
        match self {
            WidgetValue::Number(_) => "number",
            WidgetValue::Raw(_) => "text",
        }
    }
}

fn render_widget(field: &FormField, value: WidgetValue<'_>) -> String {
    let name = escape(&field.name);
    match &field.widget {
        WidgetKind::Continuous { step, .. } => format!(
            r#"<label>{name}<input type="{kind}" name="{name}" value="{value}" step="{step}" required></label>"#,
            kind = value.input_type(),
            name = name,
            value = value.attr(true),
            step = step,
        ),
        WidgetKind::BoundedInteger { min, max, .. } => format!(
            r#"<label>{name} <output>{value}</output><input type="range" name="{name}" min="{min}" max="{max}" step="1" value="{value}" oninput="this.previousElementSibling.value=this.value"></label>"#,
            name = name,
            min = min,
            max = max,
            value = value.attr(false),
        ),
        WidgetKind::Binary { help } => {
            let current = value.attr(false);
            let selected = |option: &str| if current == option { " selected" } else { "" };
            format!(
                r#"<label>{name}<select name="{name}"><option value="0"{s0}>0</option><option value="1"{s1}>1</option></select><span class="help">{help}</span></label>"#,
                name = name,
                s0 = selected("0"),
                s1 = selected("1"),
                help = escape(help),
            )
        }
        WidgetKind::Integer { .. } => format!(
            r#"<label>{name}<input type="{kind}" name="{name}" value="{value}" step="1" required></label>"#,
            kind = value.input_type(),
            name = name,
            value = value.attr(false),
        ),
    }
}

/// Two-column table of the current record in schema order; rejected fields
/// show their submitted text
pub fn render_entered_data(form: &InputForm, record: &InputRecord, rejected: &HashMap<String, String>) -> String {
    let mut html = String::from("<table><thead><tr><th>Feature</th><th>Value</th></tr></thead><tbody>");
    for field in form.fields() {
        let value = match (rejected.get(&field.name), record.get(&field.name)) {
            (Some(raw), _) => escape(raw),
            (None, Some(v)) => format_value(&field.widget, v),
            (None, None) => "-".to_string(),
        };
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            escape(&field.name),
            value
        ));
    }
    html.push_str("</tbody></table>");
    html
}

fn format_value(widget: &WidgetKind, value: f64) -> String {
    match widget {
        WidgetKind::Continuous { .. } => format!("{:.2}", value),
        _ => format!("{}", value as i64),
    }
}

fn render_outcome(outcome: &Outcome<'_>, positive_label: &str) -> String {
    match outcome {
        Outcome::Pending => String::new(),
        Outcome::Predicted(result) => render_result(result, positive_label),
        Outcome::Failed(error) => render_prediction_error(error),
    }
}

/// Inline message for a failed predict action
pub fn render_prediction_error(error: &PredictionError) -> String {
    format!(
        r#"<div class="danger">An error occurred during prediction: {}</div>"#,
        escape(&error.to_string())
    )
}

/// Label with its tone, then confidence details when available
pub fn render_result(result: &PredictionResult, positive_label: &str) -> String {
    let tone = result.tone(positive_label);
    let class = match tone {
        Tone::Positive => "success",
        Tone::Cautionary => "danger",
    };

    let mut html = format!(
        r#"<hr><div class="{class}"><h3>RESULT: {label}</h3></div><div class="info">{message}</div>"#,
        class = class,
        label = escape(&result.label),
        message = tone.message(),
    );

    if let (Some(confidence), Some(ranking)) = (result.confidence_percent(), &result.probabilities) {
        html.push_str(&format!(
            "<h3>🎯 Confidence: <strong>{}</strong></h3><h3>📊 Model Confidence Details</h3>",
            confidence
        ));

        html.push_str("<table><thead><tr><th>Status</th><th>Confidence (%)</th></tr></thead><tbody>");
        for class in ranking {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{:.2}</td></tr>",
                escape(&class.label),
                class.percent()
            ));
        }
        html.push_str("</tbody></table>");

        html.push_str(r#"<div class="chart">"#);
        for class in ranking {
            html.push_str(&format!(
                r#"<div class="bar-row"><span>{label}</span><div class="bar"><div style="width:{width:.2}%"></div></div><span>{pct:.2}%</span></div>"#,
                label = escape(&class.label),
                width = class.percent().clamp(0.0, 100.0),
                pct = class.percent(),
            ));
        }
        html.push_str("</div>");
    }

    html
}
