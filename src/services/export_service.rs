// src/services/export_service.rs
//
// Exportação dos tubos filtrados. TSV e XLSX saem da mesma tabela de células,
// então os valores são idênticos nos dois formatos.

use chrono::Local;
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};
use sqlx::{Acquire, Executor, Sqlite};

use crate::{
    common::error::AppError,
    db::TubeRepository,
    models::tube::{TubeFilter, TubeView},
};

pub const EXPORT_HEADERS: [&str; 14] = [
    "Barcode",
    "Code Échantillon",
    "ID Individu",
    "Boîte",
    "Congélateur",
    "Position",
    "Concentration (ng/µL)",
    "Qualité",
    "Volume Initial (µL)",
    "Volume Actuel (µL)",
    "Source",
    "Type",
    "Statut",
    "Notes",
];

const SHEET_NAME: &str = "Tubes";
const HEADER_FILL: u32 = 0x2D3250;
const MAX_COLUMN_WIDTH: usize = 35;
// Linhas usadas para estimar a largura das colunas
const WIDTH_SAMPLE_ROWS: usize = 100;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Tsv,
    Xlsx,
}

impl ExportFormat {
    /// Ausente -> TSV. Qualquer outro valor é erro 400.
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(ExportFormat::Tsv),
            Some(f) if f.eq_ignore_ascii_case("tsv") => Ok(ExportFormat::Tsv),
            Some(f) if f.eq_ignore_ascii_case("xlsx") => Ok(ExportFormat::Xlsx),
            Some(other) => Err(AppError::UnsupportedExportFormat(other.to_string())),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Tsv => "text/tab-separated-values; charset=utf-8",
            ExportFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Tsv => "tsv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

// --- Célula neutra (independente do formato) ---
#[derive(Debug, Clone, PartialEq)]
pub enum ExportCell {
    Text(String),
    Number(f64),
    Empty,
}

impl ExportCell {
    fn text(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => ExportCell::Text(v.to_string()),
            _ => ExportCell::Empty,
        }
    }

    fn number(value: Option<f64>) -> Self {
        value.map_or(ExportCell::Empty, ExportCell::Number)
    }

    /// Representação textual (TSV e estimativa de largura).
    pub fn render(&self) -> String {
        match self {
            ExportCell::Text(s) => s.clone(),
            ExportCell::Number(n) => n.to_string(),
            ExportCell::Empty => String::new(),
        }
    }
}

/// Uma linha por tubo, colunas na ordem de `EXPORT_HEADERS`.
pub fn export_table(tubes: &[TubeView]) -> Vec<Vec<ExportCell>> {
    tubes
        .iter()
        .map(|t| {
            vec![
                ExportCell::Text(t.barcode.clone()),
                ExportCell::text(t.sample_code.as_deref()),
                ExportCell::text(t.individual_code.as_deref()),
                ExportCell::text(t.box_name.as_deref()),
                ExportCell::text(t.freezer.as_deref()),
                ExportCell::text(t.position_display.as_deref()),
                ExportCell::number(t.concentration),
                ExportCell::text(t.quality.as_deref()),
                ExportCell::number(t.initial_volume),
                ExportCell::number(t.current_volume),
                ExportCell::text(t.source.as_deref()),
                ExportCell::Text(t.tube_type.as_str().to_string()),
                ExportCell::Text(t.status.as_str().to_string()),
                ExportCell::text(t.notes.as_deref()),
            ]
        })
        .collect()
}

/// TSV em UTF-8 com BOM (o Excel reconhece os acentos).
pub fn render_tsv(table: &[Vec<ExportCell>]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(UTF8_BOM.to_vec());

    writer.write_record(EXPORT_HEADERS)?;
    for row in table {
        writer.write_record(row.iter().map(ExportCell::render))?;
    }

    writer.into_inner().map_err(|e| AppError::IoError(e.into_error()))
}

pub fn render_xlsx(table: &[Vec<ExportCell>]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center);

    for (col, header) in EXPORT_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (index, row) in table.iter().enumerate() {
        let row_num = (index + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                ExportCell::Text(s) => {
                    worksheet.write_string(row_num, col as u16, s)?;
                }
                ExportCell::Number(n) => {
                    worksheet.write_number(row_num, col as u16, *n)?;
                }
                ExportCell::Empty => {}
            }
        }
    }

    for (col, width) in column_widths(table).into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width as f64)?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Maior conteúdo (cabeçalho ou primeiras linhas) + 2, limitado a 35.
pub fn column_widths(table: &[Vec<ExportCell>]) -> Vec<usize> {
    EXPORT_HEADERS
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let longest = table
                .iter()
                .take(WIDTH_SAMPLE_ROWS)
                .filter_map(|row| row.get(col))
                .map(|cell| cell.render().chars().count())
                .fold(header.chars().count(), usize::max);
            (longest + 2).min(MAX_COLUMN_WIDTH)
        })
        .collect()
}

// --- Arquivo pronto para download ---
#[derive(Debug)]
pub struct ExportFile {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: String,
}

#[derive(Clone)]
pub struct ExportService {
    tube_repo: TubeRepository,
}

impl ExportService {
    pub fn new(tube_repo: TubeRepository) -> Self {
        Self { tube_repo }
    }

    /// Mesmo filtro da listagem, sem paginação. O arquivo é montado inteiro
    /// em memória antes de qualquer byte sair.
    pub async fn export_tubes<'e, E>(
        &self,
        executor: E,
        filter: &TubeFilter,
        format: ExportFormat,
    ) -> Result<ExportFile, AppError>
    where
        E: Executor<'e, Database = Sqlite> + Acquire<'e, Database = Sqlite>,
    {
        let mut tx = executor.begin().await?;
        let tubes = self.tube_repo.list(&mut *tx, filter, None).await?;
        let views = self.tube_repo.project(&mut tx, tubes).await?;
        tx.commit().await?;

        let table = export_table(&views);
        let bytes = match format {
            ExportFormat::Tsv => render_tsv(&table)?,
            ExportFormat::Xlsx => render_xlsx(&table)?,
        };

        tracing::info!("Exportação {}: {} tubos", format.extension(), views.len());

        Ok(ExportFile {
            bytes,
            content_type: format.content_type(),
            file_name: format!(
                "tubes_export_{}.{}",
                Local::now().format("%Y%m%d"),
                format.extension()
            ),
        })
    }
}
