use crate::services::csv_service::RecipientRow;

/// Replaces every literal `{{header}}` occurrence with the row's value for
/// that header. Case-sensitive, exact-bracket match; placeholders with no
/// matching header stay verbatim so missing columns are visible in the
/// delivered mail rather than silently blanked.
pub fn render(template: &str, row: &RecipientRow) -> String {
    let mut out = template.to_string();
    for (header, value) in row {
        let placeholder = format!("{{{{{header}}}}}");
        out = out.replace(&placeholder, value);
    }
    out
}
