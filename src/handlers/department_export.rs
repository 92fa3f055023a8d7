use actix_web::http::header;
use actix_web::{web, HttpResponse};
use chrono::Local;
use log::{info, warn};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, FormatPattern, Workbook};

use crate::errors::AppError;
use crate::models::Department;
use crate::repositories::DepartmentRepository;

pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const HEADERS: [&str; 5] = ["Id", "Name", "CreatedAt", "Active", "CreatedBy"];
// Table starts at B2.
const FIRST_ROW: u32 = 1;
const FIRST_COL: u16 = 1;
const COLUMN_WIDTH: f64 = 25.0;
const DARK_BLUE: u32 = 0x00008B;
const WHITE_SMOKE: u32 = 0xF5F5F5;

/// GET /api/DepartmentExport/Excel
pub async fn export_to_excel(
    repository: web::Data<dyn DepartmentRepository>,
) -> Result<HttpResponse, AppError> {
    let departments = repository.get_all().await?;

    if departments.is_empty() {
        warn!("Department export requested but no records exist");
        return Err(AppError::NotFound("No department records found.".to_string()));
    }

    let content = render_workbook(&departments)?;
    let file_name = format!("{}_Departments.xlsx", Local::now().format("%Y%m%d%H%M%S"));
    info!("Exporting {} departments as {}", departments.len(), file_name);

    Ok(HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ))
        .body(content))
}

/// Renders `departments` into an in-memory workbook with a single
/// "Departments" sheet.
pub fn render_workbook(departments: &[Department]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Departments")?;

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_pattern(FormatPattern::Solid)
        .set_background_color(Color::RGB(DARK_BLUE))
        .set_align(FormatAlign::Left);
    let body_format = Format::new()
        .set_pattern(FormatPattern::Solid)
        .set_background_color(Color::RGB(WHITE_SMOKE))
        .set_align(FormatAlign::Left);

    let last_row = FIRST_ROW + departments.len() as u32;
    let last_col = FIRST_COL + HEADERS.len() as u16 - 1;
    let cell_format = |base: &Format, row: u32, col: u16| {
        let edges = OuterEdges::of(row, col, last_row, last_col);
        let mut format = base.clone();
        if edges.top {
            format = format.set_border_top(FormatBorder::Medium);
        }
        if edges.bottom {
            format = format.set_border_bottom(FormatBorder::Medium);
        }
        if edges.left {
            format = format.set_border_left(FormatBorder::Medium);
        }
        if edges.right {
            format = format.set_border_right(FormatBorder::Medium);
        }
        format
    };

    for (offset, title) in HEADERS.iter().enumerate() {
        let col = FIRST_COL + offset as u16;
        worksheet.set_column_width(col, COLUMN_WIDTH)?;
        let format = cell_format(&header_format, FIRST_ROW, col);
        worksheet.write_string_with_format(FIRST_ROW, col, *title, &format)?;
    }

    for (index, department) in departments.iter().enumerate() {
        let row = FIRST_ROW + 1 + index as u32;
        let format = |col: u16| cell_format(&body_format, row, col);

        worksheet.write_number_with_format(row, FIRST_COL, department.id as f64, &format(FIRST_COL))?;

        let col = FIRST_COL + 1;
        match department.name.as_deref() {
            Some(name) => worksheet.write_string_with_format(row, col, name, &format(col))?,
            None => worksheet.write_blank(row, col, &format(col))?,
        };

        let col = FIRST_COL + 2;
        match department.created_at {
            Some(created_at) => {
                let local = created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string();
                worksheet.write_string_with_format(row, col, local.as_str(), &format(col))?
            }
            None => worksheet.write_blank(row, col, &format(col))?,
        };

        let col = FIRST_COL + 3;
        match department.active {
            Some(active) => worksheet.write_boolean_with_format(row, col, active, &format(col))?,
            None => worksheet.write_blank(row, col, &format(col))?,
        };

        let col = FIRST_COL + 4;
        match department.created_by.as_deref() {
            Some(created_by) => worksheet.write_string_with_format(row, col, created_by, &format(col))?,
            None => worksheet.write_blank(row, col, &format(col))?,
        };
    }

    Ok(workbook.save_to_buffer()?)
}

/// Which sides of a cell lie on the border drawn around the whole table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OuterEdges {
    top: bool,
    bottom: bool,
    left: bool,
    right: bool,
}

impl OuterEdges {
    fn of(row: u32, col: u16, last_row: u32, last_col: u16) -> Self {
        Self {
            top: row == FIRST_ROW,
            bottom: row == last_row,
            left: col == FIRST_COL,
            right: col == last_col,
        }
    }
}
