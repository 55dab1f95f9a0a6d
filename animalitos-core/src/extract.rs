//! Raw-row extraction from the source's results table.
//!
//! Deliberately naive HTML slicing tailored to a plain `<table>` of
//! `<tr>`/`<td>` cells — the pipeline needs nothing more from the page, and
//! a full HTML parser would be dead weight. Matching is ASCII
//! case-insensitive. Cells map positionally: date, number, animal, time.

use crate::record::RawRow;

/// Minimum cells for a usable row: date, number, animal.
const MIN_CELLS: usize = 3;

/// How the response body looked, before any per-row validation.
#[derive(Debug, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// A results table was found; rows may still be empty.
    Rows(Vec<RawRow>),
    /// No `<table` marker anywhere in the body — the page shape changed or
    /// an error page came back. The fetcher treats this as retryable.
    NoTable,
}

/// Extract raw rows from a response body.
pub fn extract_rows(body: &str) -> ExtractOutcome {
    let Some(table) = slice_table(body) else {
        return ExtractOutcome::NoTable;
    };

    let mut rows = Vec::new();
    let mut cursor = 0;
    let mut row_index = 0;
    while let Some((cells, next)) = next_row(table, cursor) {
        cursor = next;
        // Header rows (<th> only) and spacer rows produce no cells.
        if cells.len() < MIN_CELLS {
            row_index += 1;
            continue;
        }
        rows.push(RawRow {
            date: cells[0].clone(),
            number: cells[1].clone(),
            animal: cells[2].clone(),
            time: cells.get(3).filter(|t| !t.is_empty()).cloned(),
            row_index,
        });
        row_index += 1;
    }
    ExtractOutcome::Rows(rows)
}

/// Inner HTML of the first `<table ...>...</table>` block.
fn slice_table(body: &str) -> Option<&str> {
    let lower = lowercase_ascii(body);
    let open = lower.find("<table")?;
    let after_open = body[open..].find('>')? + open + 1;
    let close = lower[after_open..].find("</table")?;
    Some(&body[after_open..after_open + close])
}

/// Next `<tr>...</tr>` block at or after `from`; returns its `<td>` texts
/// and the offset just past the row.
fn next_row(table: &str, from: usize) -> Option<(Vec<String>, usize)> {
    let lower = lowercase_ascii(table);
    let start = lower.get(from..)?.find("<tr")? + from;
    let after_open = table[start..].find('>')? + start + 1;
    let end_rel = lower[after_open..].find("</tr")?;
    let row_inner = &table[after_open..after_open + end_rel];

    let mut cells = Vec::new();
    let row_lower = lowercase_ascii(row_inner);
    let mut cursor = 0;
    while let Some(td) = row_lower.get(cursor..).and_then(|s| s.find("<td")) {
        let td_start = cursor + td;
        let Some(gt) = row_inner[td_start..].find('>') else {
            break;
        };
        let content_start = td_start + gt + 1;
        let Some(td_end) = row_lower[content_start..].find("</td") else {
            break;
        };
        let text = clean_cell(&row_inner[content_start..content_start + td_end]);
        cells.push(text);
        cursor = content_start + td_end + 4;
    }

    Some((cells, after_open + end_rel + 4))
}

/// Strip nested tags, decode the common entities, collapse whitespace.
fn clean_cell(inner: &str) -> String {
    let mut text = String::with_capacity(inner.len());
    let mut in_tag = false;
    for ch in inner.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    let decoded = text.replace("&nbsp;", " ").replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn lowercase_ascii(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <h1>Resultados</h1>
        <table id="table">
          <tr><th>Fecha</th><th>Numero</th><th>Animal</th><th>Hora</th></tr>
          <tr><td>15 de enero de 2025</td><td>5</td><td>Le&oacute;n</td><td>2:30 PM</td></tr>
          <tr><td>15 de enero de 2025</td><td><b>00</b></td><td>Ballena</td><td>9:00 AM</td></tr>
          <tr><td>16 de enero de 2025</td><td>10</td><td>Tigre</td><td></td></tr>
        </table>
        </body></html>
    "#;

    #[test]
    fn extracts_positional_cells() {
        let ExtractOutcome::Rows(rows) = extract_rows(PAGE) else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date, "15 de enero de 2025");
        assert_eq!(rows[0].number, "5");
        assert_eq!(rows[0].time.as_deref(), Some("2:30 PM"));
        // Nested tags inside a cell are stripped.
        assert_eq!(rows[1].number, "00");
        // Empty time cell becomes None.
        assert_eq!(rows[2].time, None);
    }

    #[test]
    fn header_row_is_skipped_but_indexed() {
        let ExtractOutcome::Rows(rows) = extract_rows(PAGE) else {
            panic!("expected rows");
        };
        // Row 0 is the header, so data rows start at index 1.
        assert_eq!(rows[0].row_index, 1);
        assert_eq!(rows[2].row_index, 3);
    }

    #[test]
    fn table_with_no_data_rows_is_empty_not_missing() {
        let body = "<table><tr><th>Fecha</th></tr></table>";
        assert_eq!(extract_rows(body), ExtractOutcome::Rows(vec![]));
    }

    #[test]
    fn missing_table_is_reported() {
        assert_eq!(extract_rows("<html><body>503</body></html>"), ExtractOutcome::NoTable);
    }

    #[test]
    fn case_insensitive_tags() {
        let body = "<TABLE><TR><TD>2025-01-15</TD><TD>05</TD><TD>LEON</TD></TR></TABLE>";
        let ExtractOutcome::Rows(rows) = extract_rows(body) else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].animal, "LEON");
    }
}
