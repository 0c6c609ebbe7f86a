//! HTML rendering.
//!
//! Pages are assembled from a shared layout. All user-supplied text passes
//! through [`escape`].

use std::fmt::Write;

use crate::error::{Error, Result};
use crate::predict::Prediction;
use crate::record::{Record, COLUMNS};

/// CSS classes on the records table.
pub const TABLE_CLASSES: &str = "dataframe data";

/// Escape text for use in element content or a quoted attribute.
#[must_use]
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

/// Render records as a `<table>`.
///
/// Each row is given with its position in the full table, which is shown in
/// the leading index column.
///
/// # Errors
///
/// Returns [`Error::Render`] if formatting fails.
pub fn render_table<'a, I>(rows: I) -> Result<String>
where
    I: IntoIterator<Item = (usize, &'a Record)>,
{
    let mut out = String::new();
    write_table(&mut out, rows).map_err(|e| Error::render(e.to_string()))?;
    Ok(out)
}

fn write_table<'a, I>(out: &mut String, rows: I) -> std::fmt::Result
where
    I: IntoIterator<Item = (usize, &'a Record)>,
{
    writeln!(out, "<table border=\"1\" class=\"{TABLE_CLASSES}\">")?;
    writeln!(out, "  <thead>")?;
    write!(out, "    <tr style=\"text-align: right;\">\n      <th></th>\n")?;
    for column in COLUMNS {
        writeln!(out, "      <th>{column}</th>")?;
    }
    writeln!(out, "    </tr>\n  </thead>\n  <tbody>")?;
    for (index, record) in rows {
        writeln!(out, "    <tr>\n      <th>{index}</th>")?;
        for value in record.fields() {
            writeln!(out, "      <td>{}</td>", escape(value))?;
        }
        writeln!(out, "    </tr>")?;
    }
    write!(out, "  </tbody>\n</table>")
}

fn layout(title: &str, body: &str) -> Result<String> {
    let mut out = String::new();
    write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\">\n  \
         <title>{title} - Flammability Records</title>\n</head>\n<body>\n  \
         <nav>\n    <a href=\"/\">Home</a> |\n    <a href=\"/search\">Search</a> |\n    \
         <a href=\"/add\">Add Entry</a> |\n    <a href=\"/predict\">Predict</a>\n  </nav>\n  \
         <h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = escape(title),
    )
    .map_err(|e| Error::render(e.to_string()))?;
    Ok(out)
}

/// The home page: optional one-shot notice followed by the full table.
///
/// # Errors
///
/// Returns [`Error::Render`] if formatting fails.
pub fn index_page(table_html: &str, notice: Option<&str>) -> Result<String> {
    let mut body = String::new();
    if let Some(message) = notice {
        body.push_str(&format!(
            "  <ul class=\"flashes\">\n    <li>{}</li>\n  </ul>\n",
            escape(message)
        ));
    }
    body.push_str(table_html);
    layout("Materials", &body)
}

/// The search page. `results` is the rendered table after a submission.
///
/// # Errors
///
/// Returns [`Error::Render`] if formatting fails.
pub fn search_page(query: Option<&str>, results: Option<&str>) -> Result<String> {
    let mut body = format!(
        "  <form method=\"post\" action=\"/search\">\n    \
         <input type=\"text\" name=\"query\" value=\"{}\" placeholder=\"Search materials\">\n    \
         <input type=\"submit\" value=\"Search\">\n  </form>\n",
        escape(query.unwrap_or_default())
    );
    if let Some(table) = results {
        body.push_str(table);
    }
    layout("Search", &body)
}

/// The entry form, one text input per column.
///
/// # Errors
///
/// Returns [`Error::Render`] if formatting fails.
pub fn add_page() -> Result<String> {
    let mut body = String::from("  <form method=\"post\" action=\"/add\">\n");
    for column in COLUMNS {
        body.push_str(&format!(
            "    <label for=\"{column}\">{}</label>\n    \
             <input type=\"text\" id=\"{column}\" name=\"{column}\" required><br>\n",
            column.replace('_', " ")
        ));
    }
    body.push_str("    <input type=\"submit\" value=\"Add Entry\">\n  </form>");
    layout("Add Entry", &body)
}

/// The prediction page. `result` holds the material name and outcome after a
/// submission.
///
/// # Errors
///
/// Returns [`Error::Render`] if formatting fails.
pub fn predict_page(result: Option<(&str, Prediction)>) -> Result<String> {
    let mut body = String::from(
        "  <form method=\"post\" action=\"/predict\">\n    \
         <label for=\"material_name\">material name</label>\n    \
         <input type=\"text\" id=\"material_name\" name=\"material_name\" required><br>\n    \
         <label for=\"flammability_class\">flammability class</label>\n    \
         <select id=\"flammability_class\" name=\"flammability_class\">\n      \
         <option value=\"Low\">Low</option>\n      \
         <option value=\"Medium\">Medium</option>\n      \
         <option value=\"High\">High</option>\n    </select><br>\n    \
         <input type=\"submit\" value=\"Predict\">\n  </form>\n",
    );
    if let Some((material_name, prediction)) = result {
        body.push_str(&format!(
            "  <p class=\"prediction\">{}: <strong>{prediction}</strong></p>\n",
            escape(material_name)
        ));
    }
    layout("Predict Flammability", &body)
}

/// A generic error page. Falls back to a bare message if the layout itself
/// cannot be rendered.
#[must_use]
pub fn error_page(message: &str) -> String {
    let body = format!("  <p class=\"error\">{}</p>", escape(message));
    layout("Error", &body).unwrap_or_else(|_| escape(message))
}
