use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::web::escape_html;

pub const DOCX_FILENAME: &str = "diagnosis_and_treatment_plan.docx";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Renders an anchor that downloads `bytes` as `filename` from a data URI.
pub fn download_link(bytes: &[u8], filename: &str) -> String {
    format!(
        r#"<a href="data:{DOCX_MIME};base64,{}" class="download-button" download="{}">Download Diagnosis and Treatment Plan</a>"#,
        STANDARD.encode(bytes),
        escape_html(filename),
    )
}
