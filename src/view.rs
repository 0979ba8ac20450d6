//! HTML for the single upload/preview page.

use crate::models::ParsedTable;
use crate::services::pipeline::Interaction;
use crate::utils::validation::ACCEPTED_EXTENSIONS;
use std::fmt::Write;

pub const TITLE: &str = "Excel File Uploader with Save";
pub const PROMPT: &str = "Choose an Excel file";
pub const PREVIEW_HEADING: &str = "Preview of Uploaded Excel";

const STYLE: &str = "body{font-family:sans-serif;margin:2rem auto;max-width:64rem}\
.banner{padding:.75rem 1rem;border-radius:.4rem;margin:1rem 0}\
.success{background:#e6f4ea;color:#1e4620}\
.error{background:#fdecea;color:#611a15}\
.grid{max-height:32rem;overflow:auto;border:1px solid #ddd}\
.grid table{border-collapse:collapse;font-size:.9rem}\
.grid th,.grid td{border:1px solid #eee;padding:.25rem .5rem;white-space:nowrap}\
.grid thead th{position:sticky;top:0;background:#f7f7f7}\
.grid td.num{text-align:right}";

#[derive(Debug, Clone, Copy)]
pub enum Banner<'a> {
    Success(&'a str),
    Error(&'a str),
}

/// Page for a finished interaction
pub fn render_interaction(interaction: &Interaction) -> String {
    let notification = interaction.notification();
    match interaction {
        Interaction::Prompt => render_page(None, None),
        Interaction::Parsed { table, .. } => render_page(
            notification.as_deref().map(Banner::Success),
            Some(table),
        ),
        Interaction::Failed { .. } => {
            render_page(notification.as_deref().map(Banner::Error), None)
        }
    }
}

/// Page shown when an upload was refused before it reached the pipeline
pub fn render_rejection(message: &str) -> String {
    render_page(Some(Banner::Error(message)), None)
}

pub fn render_page(banner: Option<Banner<'_>>, table: Option<&ParsedTable>) -> String {
    let accept = ACCEPTED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",");

    let mut html = String::with_capacity(4096);
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{style}</style>\n</head>\n<body>\n\
         <h1>{title}</h1>\n\
         <form method=\"post\" action=\"/\" enctype=\"multipart/form-data\">\n\
         <label for=\"file\">{prompt}</label>\n\
         <input type=\"file\" id=\"file\" name=\"file\" accept=\"{accept}\">\n\
         <button type=\"submit\">Upload</button>\n</form>\n",
        title = TITLE,
        style = STYLE,
        prompt = PROMPT,
        accept = accept,
    );

    match banner {
        Some(Banner::Success(msg)) => {
            let _ = writeln!(
                html,
                "<div class=\"banner success\" role=\"status\">{}</div>",
                escape_html(msg)
            );
        }
        Some(Banner::Error(msg)) => {
            let _ = writeln!(
                html,
                "<div class=\"banner error\" role=\"alert\">{}</div>",
                escape_html(msg)
            );
        }
        None => {}
    }

    if let Some(table) = table {
        let _ = writeln!(html, "<h2>{}</h2>", PREVIEW_HEADING);
        render_grid(&mut html, table);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_grid(html: &mut String, table: &ParsedTable) {
    html.push_str("<div class=\"grid\">\n<table>\n<thead><tr><th></th>");
    for column in &table.columns {
        let _ = write!(html, "<th>{}</th>", escape_html(column));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for (idx, row) in table.rows.iter().enumerate() {
        let _ = write!(html, "<tr><th>{}</th>", idx);
        for cell in row {
            let class = if cell.as_f64().is_some() { " class=\"num\"" } else { "" };
            let _ = write!(html, "<td{}>{}</td>", class, escape_html(&cell.to_string()));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n</div>\n");
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    #[test]
    fn test_prompt_page() {
        let html = render_page(None, None);
        assert!(html.contains(TITLE));
        assert!(html.contains(PROMPT));
        assert!(html.contains("accept=\".xlsx,.xls\""));
        assert!(!html.contains("class=\"banner"));
        assert!(!html.contains("class=\"grid\""));
    }

    #[test]
    fn test_grid_escapes_cells() {
        let table = ParsedTable {
            sheet_name: "Sheet1".to_string(),
            columns: vec!["<b>".to_string()],
            rows: vec![vec![CellValue::String("a & b".to_string())]],
        };
        let html = render_page(Some(Banner::Success("ok")), Some(&table));
        assert!(html.contains("<th>&lt;b&gt;</th>"));
        assert!(html.contains("<td>a &amp; b</td>"));
        assert!(html.contains(PREVIEW_HEADING));
    }

    #[test]
    fn test_error_banner_has_no_grid() {
        let html = render_rejection("Invalid file name: <x>");
        assert!(html.contains("banner error"));
        assert!(html.contains("Invalid file name: &lt;x&gt;"));
        assert!(!html.contains("class=\"grid\""));
    }
}
