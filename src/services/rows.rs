// src/services/rows.rs

//! Structured row access over the listing table.

use scraper::{ElementRef, Html, Selector};

use crate::error::Result;
use crate::models::{Column, ColumnLabels, RawRow};
use crate::services::parse_selector;
use crate::utils::normalize_whitespace;

/// Splits page markup into raw rows.
pub trait RowAccessor: Send + Sync {
    fn rows_of(&self, markup: &str) -> Result<Vec<RawRow>>;
}

/// Reads rows from an HTML table.
///
/// A cell's column comes from its `data-label` attribute, or from the header
/// cell at the same position when the attribute is missing. Header rows
/// (rows without `td` cells) are not returned.
#[derive(Debug, Clone)]
pub struct TableRowAccessor {
    table_selector: String,
    labels: ColumnLabels,
}

impl TableRowAccessor {
    pub fn new(table_selector: impl Into<String>, labels: ColumnLabels) -> Self {
        Self {
            table_selector: table_selector.into(),
            labels,
        }
    }

    fn column_for(&self, label: &str) -> Option<Column> {
        let label = label.trim();
        let labels = &self.labels;
        [
            (&labels.name, Column::Name),
            (&labels.status, Column::Status),
            (&labels.rating, Column::Rating),
            (&labels.estimated_gain, Column::EstimatedGain),
            (&labels.open_date, Column::OpenDate),
            (&labels.close_date, Column::CloseDate),
        ]
        .into_iter()
        .find(|(expected, _)| expected.trim().eq_ignore_ascii_case(label))
        .map(|(_, column)| column)
    }

    /// Cell text; rating cells also carry their image captions.
    fn cell_text(cell: &ElementRef, column: Column, img_sel: &Selector) -> String {
        let mut text: String = cell.text().collect::<Vec<_>>().join(" ");

        if column == Column::Rating {
            for img in cell.select(img_sel) {
                for attr in ["title", "alt"] {
                    if let Some(caption) = img.value().attr(attr) {
                        text.push(' ');
                        text.push_str(caption);
                    }
                }
            }
        }

        normalize_whitespace(&text)
    }
}

impl RowAccessor for TableRowAccessor {
    fn rows_of(&self, markup: &str) -> Result<Vec<RawRow>> {
        let table_sel = parse_selector(&self.table_selector)?;
        let row_sel = parse_selector("tr")?;
        let header_sel = parse_selector("th")?;
        let cell_sel = parse_selector("td")?;
        let img_sel = parse_selector("img")?;

        let document = Html::parse_document(markup);
        let Some(table) = document.select(&table_sel).next() else {
            log::warn!("No table matches '{}'", self.table_selector);
            return Ok(Vec::new());
        };

        let mut headers: Vec<String> = Vec::new();
        let mut rows = Vec::new();

        for row in table.select(&row_sel) {
            let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
            if cells.is_empty() {
                headers = row
                    .select(&header_sel)
                    .map(|th| normalize_whitespace(&th.text().collect::<String>()))
                    .collect();
                continue;
            }

            let mut raw = RawRow::new();
            for (position, cell) in cells.iter().enumerate() {
                let label = cell
                    .value()
                    .attr("data-label")
                    .or_else(|| headers.get(position).map(String::as_str));

                if let Some(column) = label.and_then(|l| self.column_for(l)) {
                    raw.insert(column, Self::cell_text(cell, column, &img_sel));
                }
            }
            rows.push(raw);
        }

        log::debug!("Extracted {} rows from table", rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accessor() -> TableRowAccessor {
        TableRowAccessor::new("table#report_table", ColumnLabels::default())
    }

    #[test]
    fn test_rows_by_data_label() {
        let html = r#"
            <table id="report_table">
              <tr><th>IPO</th><th>Status</th></tr>
              <tr>
                <td data-label="IPO"><a href="/x">Acme Ltd IPO</a></td>
                <td data-label="Status">Open</td>
                <td data-label="Est Listing">₹25 (12.5%)</td>
                <td data-label="Fire Rating"><img src="f.png" title="IPO Rating 4/5"></td>
                <td data-label="Open">08-Jan</td>
                <td data-label="Close">12-Jan</td>
                <td data-label="Ignored">whatever</td>
              </tr>
            </table>
        "#;

        let rows = accessor().rows_of(html).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.get(Column::Name), Some("Acme Ltd IPO"));
        assert_eq!(row.get(Column::Status), Some("Open"));
        assert_eq!(row.get(Column::EstimatedGain), Some("₹25 (12.5%)"));
        assert_eq!(row.get(Column::Rating), Some("IPO Rating 4/5"));
        assert_eq!(row.get(Column::OpenDate), Some("08-Jan"));
        assert_eq!(row.get(Column::CloseDate), Some("12-Jan"));
    }

    #[test]
    fn test_rows_by_header_position() {
        let html = r#"
            <table id="report_table">
              <thead>
                <tr><th>IPO</th><th>Status</th><th>Fire Rating</th>
                    <th>Est Listing</th><th>Open</th><th>Close</th></tr>
              </thead>
              <tbody>
                <tr><td>Beta SME</td><td>Upcoming</td><td>🔥🔥🔥</td>
                    <td>--</td><td>15-Jan</td><td>18-Jan</td></tr>
                <tr><td colspan="6">Footer note</td></tr>
              </tbody>
            </table>
        "#;

        let rows = accessor().rows_of(html).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(Column::Name), Some("Beta SME"));
        assert_eq!(rows[0].get(Column::Rating), Some("🔥🔥🔥"));
        assert_eq!(rows[0].get(Column::CloseDate), Some("18-Jan"));
        assert_eq!(rows[1].get(Column::Status), None);
    }

    #[test]
    fn test_missing_table_yields_no_rows() {
        let rows = accessor().rows_of("<html><body><p>Maintenance</p></body></html>");
        assert!(rows.unwrap().is_empty());
    }

    #[test]
    fn test_invalid_table_selector() {
        let accessor = TableRowAccessor::new("[[bad", ColumnLabels::default());
        assert!(accessor.rows_of("<table></table>").is_err());
    }
}
