// src/services/confirmation_service.rs

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::{
    client::{EmailMessage, EmailRelayClient},
    common::error::AppError,
    config::PixSettings,
    db::{EventRepository, RegistrationRepository},
    models::{auth::User, event::Event, registration::RegistrationDetail},
    services::{document_service::DocumentService, export_service::format_date},
};

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn confirmation_subject(event: &Event) -> String {
    format!("Confirmação de Inscrição - {}", event.name)
}

pub fn confirmation_filename(registration_id: i64) -> String {
    format!("inscricao-{}.pdf", registration_id)
}

pub fn confirmation_email_html(detail: &RegistrationDetail, event: &Event, pix: &PixSettings) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <title>Confirmação de Inscrição</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="text-align: center; border-bottom: 3px solid #D4A373; padding-bottom: 20px;">
        <h1 style="color: #2C3E50; margin: 0;">Inscrição Recebida!</h1>
        <p style="color: #666;">Bom Pastor Digital</p>
    </div>

    <p>Olá, <strong>{husband}</strong> e <strong>{wife}</strong>!</p>
    <p>Recebemos a inscrição nº <strong>{id}</strong>. Seguem os dados do evento e as instruções de pagamento.</p>

    <h2 style="color: #2C3E50; border-left: 4px solid #D4A373; padding-left: 10px;">Dados do Evento</h2>
    <div style="background-color: #f9f9f9; padding: 15px; border-radius: 5px;">
        <p><strong>Evento:</strong> {event}</p>
        <p><strong>Data:</strong> {start} a {end}</p>
        <p><strong>Local:</strong> {location}</p>
    </div>

    <h2 style="color: #2C3E50; border-left: 4px solid #D4A373; padding-left: 10px;">Pagamento</h2>
    <div style="background-color: #FFF3E0; padding: 20px; border: 2px solid #FF9800; border-radius: 5px;">
        <p style="color: #D32F2F; font-weight: bold; font-size: 18px;">Valor: {amount}</p>
        <p><strong>Chave PIX ({key_type}):</strong> {key}</p>
        <p><strong>Beneficiário:</strong> {beneficiary}</p>
    </div>

    <div style="padding: 10px 15px; border: 3px solid #FF5722; border-radius: 5px; margin-top: 10px;">
        <p><strong>IMPORTANTE:</strong> envie o comprovante de pagamento pelo WhatsApp:</p>
        <p style="color: #D32F2F; font-weight: bold; font-size: 18px;">{whatsapp}</p>
    </div>

    <p>O comprovante da inscrição segue em anexo (PDF).</p>

    <div style="text-align: center; color: #777; font-size: 12px; margin-top: 30px;">
        <p>Sua inscrição será confirmada após a verificação do pagamento.</p>
        <p>Que Deus abençoe!</p>
    </div>
</body>
</html>"#,
        husband = escape_html(&detail.husband.name),
        wife = escape_html(&detail.wife.name),
        id = detail.registration.id,
        event = escape_html(&event.name),
        start = format_date(event.start_date),
        end = format_date(event.end_date),
        location = escape_html(&event.location_label()),
        amount = pix.amount_label(),
        key_type = escape_html(&pix.key_type),
        key = escape_html(&pix.key),
        beneficiary = escape_html(&pix.beneficiary),
        whatsapp = escape_html(&pix.whatsapp),
    )
}

/// Monta a mensagem para os dois cônjuges, com o PDF em anexo.
pub fn confirmation_message(
    detail: &RegistrationDetail,
    event: &Event,
    pix: &PixSettings,
    pdf: &[u8],
) -> EmailMessage {
    EmailMessage {
        to: vec![detail.husband.email.clone(), detail.wife.email.clone()],
        subject: confirmation_subject(event),
        html: confirmation_email_html(detail, event, pix),
        pdf_base64: Some(STANDARD.encode(pdf)),
        pdf_filename: Some(confirmation_filename(detail.registration.id)),
    }
}

#[derive(Clone)]
pub struct ConfirmationService {
    registration_repo: RegistrationRepository,
    event_repo: EventRepository,
    document_service: DocumentService,
    email_client: EmailRelayClient,
}

impl ConfirmationService {
    pub fn new(
        registration_repo: RegistrationRepository,
        event_repo: EventRepository,
        document_service: DocumentService,
        email_client: EmailRelayClient,
    ) -> Self {
        Self { registration_repo, event_repo, document_service, email_client }
    }

    // Só o dono da inscrição ou um administrador
    async fn load(&self, id: i64, requester: &User) -> Result<(RegistrationDetail, Event), AppError> {
        let detail = self
            .registration_repo
            .find_detail(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Inscrição".into()))?;

        if !requester.is_admin() && detail.registration.user_id != Some(requester.id) {
            return Err(AppError::Forbidden);
        }

        let event = self
            .event_repo
            .find_by_id(detail.registration.event_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Evento".into()))?;
        Ok((detail, event))
    }

    pub async fn confirmation_pdf(&self, id: i64, requester: &User) -> Result<Vec<u8>, AppError> {
        let (detail, event) = self.load(id, requester).await?;
        self.document_service.render_confirmation(&detail, &event)
    }

    /// Uma única tentativa de envio; a falha volta para quem chamou.
    pub async fn send_confirmation(&self, id: i64, requester: &User) -> Result<(), AppError> {
        let (detail, event) = self.load(id, requester).await?;
        let pdf = self.document_service.render_confirmation(&detail, &event)?;
        let message = confirmation_message(&detail, &event, self.document_service.pix(), &pdf);

        self.email_client.send(&message).await?;
        tracing::info!("📧 Confirmação da inscrição {} enviada", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::{models::event::EventStatus, services::export_service::testing::sample_detail};

    fn event() -> Event {
        Event {
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
        }
    }

    fn pix() -> PixSettings {
        PixSettings {
            key: "12.345.678/0001-90".into(),
            key_type: "CNPJ".into(),
            beneficiary: "Paróquia Bom Pastor".into(),
            whatsapp: "(63) 99999-0000".into(),
            amount: Decimal::new(10000, 2),
            copy_paste: None,
        }
    }

    #[test]
    fn message_goes_to_both_spouses_with_attachment() {
        let detail = sample_detail(42);
        let message = confirmation_message(&detail, &event(), &pix(), b"%PDF-1.4");

        assert_eq!(message.to, vec!["joão@x.com".to_string(), "maria@x.com".to_string()]);
        assert_eq!(message.subject, "Confirmação de Inscrição - Encontro de Casais");
        assert_eq!(message.pdf_filename.as_deref(), Some("inscricao-42.pdf"));
        assert_eq!(message.pdf_base64.as_deref(), Some("JVBERi0xLjQ="));
    }

    #[test]
    fn html_has_event_payment_and_whatsapp_blocks() {
        let html = confirmation_email_html(&sample_detail(42), &event(), &pix());

        assert!(html.contains("Encontro de Casais"));
        assert!(html.contains("20/11/2026 a 22/11/2026"));
        assert!(html.contains("Palmas - TO"));
        assert!(html.contains("R$ 100,00"));
        assert!(html.contains("Chave PIX (CNPJ):</strong> 12.345.678/0001-90"));
        assert!(html.contains("(63) 99999-0000"));
    }

    #[test]
    fn html_escapes_user_supplied_names() {
        let mut detail = sample_detail(1);
        detail.husband.name = "<script>x</script>".into();

        let html = confirmation_email_html(&detail, &event(), &pix());

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
