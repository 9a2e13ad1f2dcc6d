//! Server-side rendering of the recommendation form.

use std::fmt::Write;

use crate::recommender::controller::FormView;
use crate::recommender::profile::{GpaBand, Grade};

const REPOSITORY_URL: &str = "https://github.com/GamerRaven/GPT-College-Recommender";

const STYLE: &str = "\
body{font-family:sans-serif;margin:0}\
header{position:relative;background:#3f51b5;color:#fff;padding:16px;text-align:center}\
header a{position:absolute;right:40px;top:50%;transform:translateY(-50%);color:inherit}\
form{display:flex;flex-direction:column;align-items:center;gap:12px;max-width:400px;margin:30px auto}\
label{display:flex;flex-direction:column;width:300px}\
small{color:#666}\
.error{color:#d32f2f}\
.alert{background:#fdecea;border:1px solid #d32f2f;padding:8px;max-width:400px;margin:16px auto}\
.loading{text-align:center;margin-bottom:1rem}\
.results{border:1px solid rgba(0,0,0,.23);border-radius:4px;max-width:800px;margin:25px auto;padding:1rem}";

/// Renders the full page. `alert` is shown as a banner above the form.
pub fn render_page(view: &FormView, alert: Option<&str>) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    html.push_str("<title>College Recommender</title>");
    let _ = write!(html, "<style>{STYLE}</style></head><body>");
    let _ = write!(
        html,
        "<header><h1>College Recommender</h1>\
         <a href=\"{REPOSITORY_URL}\" target=\"_blank\" rel=\"noopener\">GitHub</a></header>"
    );

    if let Some(alert) = alert {
        let _ = write!(html, "<div class=\"alert\" role=\"alert\">{}</div>", escape(alert));
    }

    html.push_str("<form method=\"post\" action=\"/\">");
    push_select(
        &mut html,
        "grade",
        "Grade",
        Grade::ALL.iter().map(|g| g.label()),
        view.profile.grade.map(|g| g.label()),
    );
    push_select(
        &mut html,
        "gpa",
        "GPA",
        GpaBand::ALL.iter().map(|b| b.label()),
        view.profile.gpa.map(|b| b.label()),
    );
    push_text(
        &mut html,
        "location",
        "Prefered Location",
        &view.profile.location,
        Some("Leave blank if none"),
    );
    push_text(
        &mut html,
        "major",
        "Intended Major",
        &view.profile.major,
        Some("Leave blank if none"),
    );
    push_text(
        &mut html,
        "achievements",
        "Academic Achievements",
        &view.profile.achievements,
        Some("Competitions, Standardized Testing Score, etc"),
    );
    push_text(
        &mut html,
        "hobby",
        "Hobbies / Interests",
        &view.profile.hobby,
        None,
    );

    if !view.messages.is_empty() {
        html.push_str("<div>");
        for message in &view.messages {
            let _ = write!(html, "<p class=\"error\">{}</p>", escape(message));
        }
        html.push_str("</div>");
    }
    html.push_str("<button type=\"submit\">Get Recommendations</button></form>");

    if view.loading {
        html.push_str("<div class=\"loading\" aria-busy=\"true\">Loading…</div>");
    }

    html.push_str("<section class=\"results\"><h2>College Recommendations:</h2>");
    if !view.recommendations.is_empty() {
        html.push_str("<ul>");
        for college in &view.recommendations {
            let _ = write!(html, "<li>{}</li>", escape(college));
        }
        html.push_str("</ul>");
    }
    html.push_str("</section></body></html>");
    html
}

fn push_select<'a>(
    html: &mut String,
    name: &str,
    label: &str,
    options: impl Iterator<Item = &'a str>,
    selected: Option<&str>,
) {
    let _ = write!(html, "<label>{label}<select name=\"{name}\"><option value=\"\"></option>");
    for option in options {
        let marker = if selected == Some(option) { " selected" } else { "" };
        let _ = write!(
            html,
            "<option value=\"{0}\"{marker}>{0}</option>",
            escape(option)
        );
    }
    html.push_str("</select></label>");
}

fn push_text(html: &mut String, name: &str, label: &str, value: &str, helper: Option<&str>) {
    let _ = write!(
        html,
        "<label>{label}<input type=\"text\" name=\"{name}\" value=\"{}\">",
        escape(value)
    );
    if let Some(helper) = helper {
        let _ = write!(html, "<small>{helper}</small>");
    }
    html.push_str("</label>");
}

/// Escapes text for use in element content and double-quoted attributes.
fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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
