// src/client/email_relay.rs

use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, Url};
use serde::Serialize;

use crate::common::error::AppError;

/// Mensagem entregue ao relay de e-mail (SMTP fica do outro lado).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_filename: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmailRelayClient {
    client: Client,
    endpoint: Url,
    auth_token: String,
}

impl EmailRelayClient {
    pub fn new(endpoint: &str, auth_token: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Falha ao criar o cliente HTTP do relay de e-mail")?;

        let endpoint = Url::parse(endpoint).context("EMAIL_RELAY_URL inválida")?;

        Ok(Self { client, endpoint, auth_token })
    }

    /// Uma única tentativa: status não-2xx ou timeout viram erro.
    pub async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        self.client
            .post(self.endpoint.clone())
            .bearer_auth(&self.auth_token)
            .json(message)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| AppError::EmailDeliveryFailed(e.to_string()))?;

        tracing::info!("📧 E-mail \"{}\" enviado para {} destinatário(s)", message.subject, message.to.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use claims::{assert_err, assert_ok};

    use fake::faker::internet::en::SafeEmail;
    use fake::faker::lorem::en::{Paragraph, Sentence};
    use fake::{Fake, Faker};

    use wiremock::matchers::*;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    struct RelayBodyMatcher;

    impl wiremock::Match for RelayBodyMatcher {
        fn matches(&self, req: &wiremock::Request) -> bool {
            let result: Result<serde_json::Value, _> = serde_json::from_slice(&req.body);
            if let Ok(body) = result {
                body.get("to").is_some_and(|to| to.is_array())
                    && body.get("subject").is_some()
                    && body.get("html").is_some()
                    && body.get("pdfBase64").is_some()
                    && body.get("pdfFilename").is_some()
            } else {
                false
            }
        }
    }

    fn message() -> EmailMessage {
        EmailMessage {
            to: vec![SafeEmail().fake(), SafeEmail().fake()],
            subject: Sentence(1..2).fake(),
            html: Paragraph(1..2).fake(),
            pdf_base64: Some("JVBERi0xLjQ=".into()),
            pdf_filename: Some("inscricao-1.pdf".into()),
        }
    }

    fn relay_client(server_uri: &str) -> EmailRelayClient {
        let endpoint = format!("{}/send-confirmation-email", server_uri);
        let token: String = Faker.fake();
        EmailRelayClient::new(&endpoint, token, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn send_posts_json_to_relay() {
        let mock_server = MockServer::start().await;
        let client = relay_client(&mock_server.uri());

        Mock::given(header_exists("Authorization"))
            .and(header("Content-Type", "application/json"))
            .and(path("/send-confirmation-email"))
            .and(method("POST"))
            .and(RelayBodyMatcher)
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        assert_ok!(client.send(&message()).await);
    }

    #[tokio::test]
    async fn send_omits_missing_attachment() {
        let mock_server = MockServer::start().await;
        let client = relay_client(&mock_server.uri());

        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({ "subject": "Redefinição de senha" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let message = EmailMessage {
            to: vec![SafeEmail().fake()],
            subject: "Redefinição de senha".into(),
            html: "<p>link</p>".into(),
            pdf_base64: None,
            pdf_filename: None,
        };
        assert_ok!(client.send(&message).await);

        let requests = mock_server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("pdfBase64").is_none());
    }

    #[tokio::test]
    async fn send_fails_if_relay_returns_500() {
        let mock_server = MockServer::start().await;
        let client = relay_client(&mock_server.uri());

        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client.send(&message()).await;
        assert!(matches!(assert_err!(result), AppError::EmailDeliveryFailed(_)));
    }

    #[tokio::test]
    async fn send_fails_if_relay_takes_too_long() {
        let mock_server = MockServer::start().await;
        let client = relay_client(&mock_server.uri());

        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(180)))
            .expect(1)
            .mount(&mock_server)
            .await;

        assert_err!(client.send(&message()).await);
    }
}
