use std::fmt::Write as _;

use super::escape_html;
use super::form::{FormValues, Gender, MAX_AGE};

/// What appears under the form after a submission.
pub enum Panel<'a> {
    Result { text: &'a str, download_link: &'a str },
    Error(&'a str),
}

const STYLE: &str = r#"
    <style>
        body {
            background-color: #f7f7f7;
            font-family: 'Arial', sans-serif;
            margin: 0;
        }
        .main {
            background-color: #ffffff;
            padding: 2rem;
            border-radius: 8px;
            box-shadow: 0 4px 8px rgba(0, 0, 0, 0.1);
            margin: 1rem;
        }
        .input-section {
            padding: 2rem;
        }
        .columns {
            display: flex;
            gap: 2rem;
        }
        .columns > div {
            flex: 1;
            display: flex;
            flex-direction: column;
        }
        .columns label {
            margin-top: 1rem;
        }
        .columns textarea {
            min-height: 6rem;
        }
        .output-section {
            padding: 2rem;
            background-color: #535753;
            color: #ffffff;
            border-radius: 8px;
            margin-top: 2rem;
            white-space: pre-wrap;
        }
        .error-section {
            padding: 1rem 2rem;
            background-color: #fdecea;
            color: #611a15;
            border-radius: 8px;
            margin-top: 2rem;
        }
        .download-button {
            background-color: #7f8a7f;
            color: White;
            padding: 10px 20px;
            font-size: 16px;
            border-radius: 5px;
            border: none;
            cursor: pointer;
            text-decoration: none;
            display: inline-block;
            margin-top: 1rem;
        }
        .download-button:hover {
            background-color: #45a049;
        }
        .generate-button {
            width: 100%;
            margin-top: 2rem;
            padding: 10px;
            font-size: 16px;
        }
        .header {
            color: #333333;
            text-align: center;
            margin-bottom: 2rem;
        }
        #progress {
            display: none;
            margin-top: 1rem;
        }
    </style>
"#;

const SHOW_PROGRESS: &str = "document.getElementById('progress').style.display='block'";

/// Renders the whole page: form, then the panel if there is one.
pub fn render(form: &FormValues, panel: Option<&Panel<'_>>) -> String {
    let mut html = String::with_capacity(8 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<title>AI Agents to Empower Doctors</title>\n");
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n<div class=\"main\">\n");
    html.push_str("<h1>AI Agents to Empower Doctors</h1>\n");
    html.push_str("<h1 class=\"header\">AI Diagnosis and Treatment System</h1>\n");

    let _ = write!(
        html,
        "<form method=\"post\" action=\"/\" class=\"input-section\" onsubmit=\"{SHOW_PROGRESS}\">\n\
         <div class=\"columns\">\n<div>\n\
         <label for=\"gender\">Select Gender</label>\n\
         <select id=\"gender\" name=\"gender\">\n"
    );
    for gender in Gender::ALL {
        let name = gender.to_string();
        let selected = if name.eq_ignore_ascii_case(form.gender.trim()) {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(html, "<option value=\"{name}\"{selected}>{name}</option>");
    }
    let _ = write!(
        html,
        "</select>\n\
         <label for=\"age\">Enter Age</label>\n\
         <input id=\"age\" name=\"age\" type=\"number\" min=\"0\" max=\"{MAX_AGE}\" step=\"1\" value=\"{}\">\n\
         </div>\n<div>\n\
         <label for=\"symptoms\">Enter Symptoms</label>\n\
         <textarea id=\"symptoms\" name=\"symptoms\">{}</textarea>\n\
         <label for=\"medical_history\">Enter Medical History</label>\n\
         <textarea id=\"medical_history\" name=\"medical_history\">{}</textarea>\n\
         </div>\n</div>\n\
         <button type=\"submit\" class=\"generate-button\">Generate Diagnosis and Treatment Plan</button>\n\
         <div id=\"progress\">Generating recommendations...</div>\n\
         </form>\n",
        escape_html(&form.age),
        escape_html(&form.symptoms),
        escape_html(&form.medical_history),
    );

    match panel {
        Some(Panel::Result {
            text,
            download_link,
        }) => {
            let _ = writeln!(
                html,
                "<div class=\"output-section\">{}</div>",
                escape_html(text)
            );
            html.push_str(download_link);
            html.push('\n');
        }
        Some(Panel::Error(message)) => {
            let _ = writeln!(
                html,
                "<div class=\"error-section\" role=\"alert\">{}</div>",
                escape_html(message)
            );
        }
        None => {}
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}
