// src/services/document_service.rs

use genpdf::{elements, style, Alignment, Element};
use image::Luma;
use qrcode::QrCode;

use crate::{
    common::error::AppError,
    config::{PdfSettings, PixSettings},
    models::{event::Event, registration::RegistrationDetail},
    services::export_service::{
        ficha_blocks, format_date, roll_call_rows, FichaBlock, ROLL_CALL_HEADERS,
    },
};

const FOOTER: &str = "Bom Pastor Digital - Sistema de Gestão Pastoral";
const BRAND_BLUE: style::Color = style::Color::Rgb(30, 58, 95);
const TITLE_DARK: style::Color = style::Color::Rgb(44, 62, 80);
const ALERT_RED: style::Color = style::Color::Rgb(211, 47, 47);
const MUTED_GRAY: style::Color = style::Color::Rgb(120, 120, 120);

/// Linhas da seção de evento do comprovante.
pub fn event_lines(event: &Event) -> Vec<String> {
    vec![
        format!("Evento: {}", event.name),
        format!(
            "Data: {} a {}",
            format_date(event.start_date),
            format_date(event.end_date)
        ),
        format!("Local: {}", event.location_label()),
    ]
}

/// Conteúdo do QR Code: o "copia e cola" quando existir, senão a própria chave.
pub fn pix_qr_payload(pix: &PixSettings) -> &str {
    match pix.copy_paste.as_deref() {
        Some(code) if !code.is_empty() => code,
        _ => &pix.key,
    }
}

#[derive(Clone)]
pub struct DocumentService {
    pdf: PdfSettings,
    pix: PixSettings,
}

impl DocumentService {
    pub fn new(pdf: PdfSettings, pix: PixSettings) -> Self {
        Self { pdf, pix }
    }

    pub fn pix(&self) -> &PixSettings {
        &self.pix
    }

    fn new_document(&self, title: String) -> Result<genpdf::Document, AppError> {
        // Carrega a fonte da pasta configurada (FONTS_DIR)
        let font_family = genpdf::fonts::from_files(&self.pdf.fonts_dir, &self.pdf.font_name, None)
            .map_err(|_| {
                AppError::FontNotFound(format!(
                    "Fonte {} não encontrada na pasta {}",
                    self.pdf.font_name, self.pdf.fonts_dir
                ))
            })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(title);
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);
        Ok(doc)
    }

    fn render(doc: genpdf::Document) -> Result<Vec<u8>, AppError> {
        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| AppError::PdfError(e.to_string()))?;
        Ok(buffer)
    }

    // =========================================================================
    //  FICHAS (uma página por inscrição)
    // =========================================================================

    pub fn render_fichas(
        &self,
        records: &[RegistrationDetail],
        event_title: &str,
    ) -> Result<Vec<u8>, AppError> {
        let mut doc = self.new_document(format!("Fichas - {}", event_title))?;

        if records.is_empty() {
            doc.push(elements::Paragraph::new("Nenhuma inscrição encontrada."));
        }

        for (index, record) in records.iter().enumerate() {
            if index > 0 {
                doc.push(elements::PageBreak::new());
            }

            doc.push(
                elements::Paragraph::new("FICHA DE INSCRIÇÃO")
                    .aligned(Alignment::Center)
                    .styled(style::Style::new().bold().with_font_size(18).with_color(BRAND_BLUE)),
            );
            doc.push(elements::Break::new(1));

            let mut header = elements::TableLayout::new(vec![3, 1]);
            header
                .row()
                .element(elements::Paragraph::new(format!("Evento: {}", event_title)))
                .element(
                    elements::Paragraph::new(format!(
                        "Status: {}",
                        record.registration.status.label().to_uppercase()
                    ))
                    .aligned(Alignment::Right),
                )
                .push()
                .map_err(|e| AppError::PdfError(e.to_string()))?;
            doc.push(header.styled(style::Style::new().bold().with_color(BRAND_BLUE)));
            doc.push(elements::Break::new(1.5));

            for block in ficha_blocks(record) {
                doc.push(block_element(block));
            }

            doc.push(elements::Break::new(2));
            doc.push(
                elements::Paragraph::new(FOOTER)
                    .aligned(Alignment::Center)
                    .styled(style::Style::new().with_font_size(8).with_color(MUTED_GRAY)),
            );
        }

        Self::render(doc)
    }

    // =========================================================================
    //  LISTA DE PRESENÇA
    // =========================================================================

    pub fn render_roll_call(
        &self,
        records: &[RegistrationDetail],
        event_title: &str,
    ) -> Result<Vec<u8>, AppError> {
        let mut doc = self.new_document(format!("Lista de Presença - {}", event_title))?;

        doc.push(
            elements::Paragraph::new(format!("Lista de Presença: {}", event_title))
                .styled(style::Style::new().bold().with_font_size(18)),
        );
        doc.push(elements::Break::new(1.5));

        let table = table_layout(&ROLL_CALL_HEADERS, vec![3, 3, 1], &roll_call_rows(records))?;
        doc.push(table);

        Self::render(doc)
    }

    // =========================================================================
    //  COMPROVANTE DE INSCRIÇÃO (com PIX)
    // =========================================================================

    pub fn render_confirmation(
        &self,
        detail: &RegistrationDetail,
        event: &Event,
    ) -> Result<Vec<u8>, AppError> {
        let mut doc = self.new_document(format!("Inscrição #{}", detail.registration.id))?;
        let section = style::Style::new().bold().with_font_size(14).with_color(TITLE_DARK);

        doc.push(
            elements::Paragraph::new("COMPROVANTE DE INSCRIÇÃO")
                .aligned(Alignment::Center)
                .styled(style::Style::new().bold().with_font_size(22).with_color(TITLE_DARK)),
        );
        doc.push(
            elements::Paragraph::new("Bom Pastor Digital")
                .aligned(Alignment::Center)
                .styled(style::Style::new().with_color(MUTED_GRAY)),
        );
        doc.push(elements::Break::new(2));

        // --- EVENTO ---
        doc.push(elements::Paragraph::new("Dados do Evento").styled(section));
        for line in event_lines(event) {
            doc.push(elements::Paragraph::new(line));
        }
        doc.push(elements::Break::new(1.5));

        // --- CASAL ---
        doc.push(elements::Paragraph::new("Dados do Casal").styled(section));
        doc.push(elements::Paragraph::new(format!("Esposo: {}", detail.husband.name)));
        doc.push(elements::Paragraph::new(format!("Email: {}", detail.husband.email)));
        doc.push(elements::Paragraph::new(format!("Esposa: {}", detail.wife.name)));
        doc.push(elements::Paragraph::new(format!("Email: {}", detail.wife.email)));
        doc.push(
            elements::Paragraph::new(format!("Nº da Inscrição: {}", detail.registration.id))
                .styled(style::Style::new().with_font_size(9).with_color(MUTED_GRAY)),
        );
        doc.push(elements::Break::new(1.5));

        // --- PAGAMENTO ---
        doc.push(elements::Paragraph::new("Informações de Pagamento").styled(section));
        doc.push(
            elements::Paragraph::new(format!("Valor: {}", self.pix.amount_label()))
                .styled(style::Style::new().bold().with_font_size(12).with_color(ALERT_RED)),
        );
        doc.push(elements::Paragraph::new(format!(
            "Chave PIX ({}): {}",
            self.pix.key_type, self.pix.key
        )));
        doc.push(elements::Paragraph::new(format!("Beneficiário: {}", self.pix.beneficiary)));
        doc.push(elements::Break::new(1));
        doc.push(
            elements::Paragraph::new("IMPORTANTE: Envie o comprovante via WhatsApp:")
                .styled(style::Style::new().bold().with_font_size(10)),
        );
        doc.push(
            elements::Paragraph::new(self.pix.whatsapp.clone())
                .styled(style::Style::new().bold().with_font_size(14).with_color(ALERT_RED)),
        );
        doc.push(elements::Break::new(1));

        // Gera o QR Code do PIX
        let code = QrCode::new(pix_qr_payload(&self.pix).as_bytes())
            .map_err(|e| AppError::PdfError(e.to_string()))?;
        let image_buffer = code.render::<Luma<u8>>().build();
        let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);
        let pdf_image = elements::Image::from_dynamic_image(dynamic_image)
            .map_err(|e| AppError::PdfError(e.to_string()))?
            .with_scale(genpdf::Scale::new(0.5, 0.5))
            .with_alignment(Alignment::Center);
        doc.push(pdf_image);

        if let Some(copy_paste) = self.pix.copy_paste.as_deref() {
            doc.push(
                elements::Paragraph::new("PIX Copia e Cola:")
                    .styled(style::Style::new().bold().with_font_size(10)),
            );
            doc.push(
                elements::Paragraph::new(copy_paste)
                    .styled(style::Style::new().with_font_size(8)),
            );
        }

        // --- RODAPÉ ---
        doc.push(elements::Break::new(2));
        doc.push(
            elements::Paragraph::new("Sua inscrição será confirmada após a verificação do pagamento.")
                .aligned(Alignment::Center)
                .styled(style::Style::new().italic().with_font_size(9).with_color(MUTED_GRAY)),
        );
        doc.push(
            elements::Paragraph::new("Que Deus abençoe!")
                .aligned(Alignment::Center)
                .styled(style::Style::new().with_font_size(9).with_color(MUTED_GRAY)),
        );

        Self::render(doc)
    }
}

fn block_element(block: FichaBlock) -> impl Element {
    let mut layout = elements::LinearLayout::vertical();
    layout.push(
        elements::Paragraph::new(block.title)
            .styled(style::Style::new().bold().with_font_size(11))
            .framed()
            .padded(1),
    );
    for line in block.lines {
        layout.push(
            elements::Paragraph::new(line)
                .styled(style::Style::new().with_font_size(10))
                .padded(1),
        );
    }
    layout.push(elements::Break::new(1));
    layout
}

/// Tabela com cabeçalho em negrito e bordas, reaproveitada pelos relatórios tabulares.
fn table_layout(
    headers: &[&str],
    weights: Vec<usize>,
    rows: &[Vec<String>],
) -> Result<elements::TableLayout, AppError> {
    let mut table = elements::TableLayout::new(weights);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let style_bold = style::Style::new().bold();
    let mut header = table.row();
    for title in headers {
        header.push_element(elements::Paragraph::new(*title).styled(style_bold).padded(1));
    }
    header.push().map_err(|e| AppError::PdfError(e.to_string()))?;

    for row in rows {
        let mut table_row = table.row();
        for cell in row {
            table_row.push_element(elements::Paragraph::new(cell.as_str()).padded(1));
        }
        table_row.push().map_err(|e| AppError::PdfError(e.to_string()))?;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::models::event::EventStatus;

    fn pix(copy_paste: Option<&str>) -> PixSettings {
        PixSettings {
            key: "pix@bompastor.org".into(),
            key_type: "E-mail".into(),
            beneficiary: "Paróquia Bom Pastor".into(),
            whatsapp: "(63) 99999-0000".into(),
            amount: rust_decimal::Decimal::new(10000, 2),
            copy_paste: copy_paste.map(String::from),
        }
    }

    #[test]
    fn qr_payload_prefers_copy_paste_code() {
        assert_eq!(pix_qr_payload(&pix(Some("00020126..."))), "00020126...");
        assert_eq!(pix_qr_payload(&pix(Some(""))), "pix@bompastor.org");
        assert_eq!(pix_qr_payload(&pix(None)), "pix@bompastor.org");
    }

    #[test]
    fn event_lines_show_dates_and_location() {
        let event = Event {
            id: 1,
            name: "Encontro de Casais".into(),
            start_date: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 11, 22).unwrap(),
            start_time: None,
            end_time: None,
            municipality_code: 350010,
            municipality_name: Some("Palmas".into()),
            municipality_state: Some("TO".into()),
            capacity: 50,
            status: EventStatus::Open,
            created_at: Utc::now(),
        };

        assert_eq!(
            event_lines(&event),
            vec![
                "Evento: Encontro de Casais",
                "Data: 20/11/2026 a 22/11/2026",
                "Local: Palmas - TO",
            ]
        );
    }

    #[test]
    fn missing_font_is_reported() {
        let service = DocumentService::new(
            PdfSettings { fonts_dir: "/nao/existe".into(), font_name: "Roboto".into() },
            pix(None),
        );

        let err = service.render_roll_call(&[], "Encontro").unwrap_err();
        assert!(matches!(err, AppError::FontNotFound(_)));
    }
}
