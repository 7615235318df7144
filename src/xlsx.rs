use rust_xlsxwriter::{Format, Workbook};

use crate::error::Result;
use crate::export::{CellValue, Sheet, HEADER};

/// Render sheets into an `.xlsx` document held in memory.
pub fn write_workbook(sheets: &[Sheet]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_fmt = Format::new().set_bold();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (col, title) in HEADER.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *title, &header_fmt)?;
        }

        for (i, row) in sheet.rows.iter().enumerate() {
            let r = (i + 1) as u32;
            for (col, cell) in row.cells().iter().enumerate() {
                let col = col as u16;
                match cell {
                    CellValue::Text(s) => {
                        worksheet.write_string(r, col, s)?;
                    }
                    CellValue::Number(n) => {
                        worksheet.write_number(r, col, *n as f64)?;
                    }
                    CellValue::Empty => {}
                }
            }
        }

        worksheet.autofit();
    }

    if sheets.is_empty() {
        workbook.add_worksheet();
    }

    Ok(workbook.save_to_buffer()?)
}
