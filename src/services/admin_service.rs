// src/services/admin_service.rs

use chrono::Local;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{DirectoryRepository, EventRepository, RegistrationRepository},
    models::{
        directory::{Diocese, DiocesePayload},
        event::{Event, EventPayload},
        registration::{RegistrationDetail, RegistrationStatus, RegistrationUpdatePayload},
    },
    services::payment_service::PaymentService,
};

/// Telas administrativas: dioceses, eventos e inscrições.
#[derive(Clone)]
pub struct AdminService {
    directory_repo: DirectoryRepository,
    event_repo: EventRepository,
    registration_repo: RegistrationRepository,
    payment_service: PaymentService,
}

impl AdminService {
    pub fn new(
        directory_repo: DirectoryRepository,
        event_repo: EventRepository,
        registration_repo: RegistrationRepository,
        payment_service: PaymentService,
    ) -> Self {
        Self { directory_repo, event_repo, registration_repo, payment_service }
    }

    // =========================================================================
    //  DIOCESES
    // =========================================================================

    pub async fn list_dioceses(&self) -> Result<Vec<Diocese>, AppError> {
        self.directory_repo.list_dioceses().await
    }

    pub async fn create_diocese(&self, payload: DiocesePayload) -> Result<Diocese, AppError> {
        let payload = payload.normalized();
        payload.validate()?;
        let diocese = self.directory_repo.create_diocese(&payload).await?;
        tracing::info!("✅ Diocese {} criada", diocese.id);
        Ok(diocese)
    }

    pub async fn update_diocese(&self, id: i64, payload: DiocesePayload) -> Result<Diocese, AppError> {
        let payload = payload.normalized();
        payload.validate()?;
        self.directory_repo.update_diocese(id, &payload).await
    }

    pub async fn delete_diocese(&self, id: i64) -> Result<(), AppError> {
        self.directory_repo.delete_diocese(id).await
    }

    // =========================================================================
    //  EVENTOS
    // =========================================================================

    pub async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        self.event_repo.list_all().await
    }

    pub async fn list_open_events(&self) -> Result<Vec<Event>, AppError> {
        self.event_repo.list_open().await
    }

    pub async fn get_event(&self, id: i64) -> Result<Event, AppError> {
        self.event_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Evento".into()))
    }

    pub async fn create_event(&self, payload: EventPayload) -> Result<Event, AppError> {
        payload.validate()?;
        payload.validate_schedule(Local::now().date_naive())?;
        let event = self.event_repo.create(&payload).await?;
        tracing::info!("✅ Evento {} criado", event.id);
        Ok(event)
    }

    pub async fn update_event(&self, id: i64, payload: EventPayload) -> Result<Event, AppError> {
        payload.validate()?;
        payload.validate_schedule(Local::now().date_naive())?;
        self.event_repo.update(id, &payload).await
    }

    pub async fn delete_event(&self, id: i64) -> Result<(), AppError> {
        self.event_repo.delete(id).await
    }

    // =========================================================================
    //  INSCRIÇÕES
    // =========================================================================

    pub async fn list_registrations(
        &self,
        event_id: Option<i64>,
    ) -> Result<Vec<RegistrationDetail>, AppError> {
        self.registration_repo.list_details(event_id, None).await
    }

    pub async fn get_registration(&self, id: i64) -> Result<RegistrationDetail, AppError> {
        self.registration_repo
            .find_detail(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Inscrição".into()))
    }

    pub async fn update_registration(
        &self,
        id: i64,
        payload: RegistrationUpdatePayload,
    ) -> Result<RegistrationDetail, AppError> {
        payload.validate()?;
        self.registration_repo.update(id, &payload).await?;
        tracing::info!("✏️ Inscrição {} atualizada", id);
        self.get_registration(id).await
    }

    pub async fn set_registration_status(
        &self,
        id: i64,
        status: RegistrationStatus,
    ) -> Result<(), AppError> {
        self.registration_repo.update_status(id, status).await?;
        tracing::info!("Inscrição {} agora está {}", id, status.label());
        Ok(())
    }

    /// Os comprovantes saem por cascata no banco; os arquivos são removidos depois.
    pub async fn delete_registration(&self, id: i64) -> Result<(), AppError> {
        let proofs = self.payment_service.list(id).await?;
        self.registration_repo.delete(id).await?;
        self.payment_service.discard_files(&proofs).await;
        tracing::info!("🗑️ Inscrição {} excluída", id);
        Ok(())
    }

    /// Inscrições do próprio usuário (área do participante).
    pub async fn list_user_registrations(
        &self,
        user_id: uuid::Uuid,
    ) -> Result<Vec<RegistrationDetail>, AppError> {
        self.registration_repo.list_details(None, Some(user_id)).await
    }

    /// Dados prontos para os relatórios de um evento.
    pub async fn report_records(&self, event_id: i64) -> Result<(Event, Vec<RegistrationDetail>), AppError> {
        let event = self.get_event(event_id).await?;
        let records = self.registration_repo.list_details(Some(event_id), None).await?;
        Ok((event, records))
    }
}
