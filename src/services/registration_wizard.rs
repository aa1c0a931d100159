// src/services/registration_wizard.rs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    common::error::AppError,
    models::registration::{JointData, PersonInput, RegistrationDraft},
    services::registration_service::RegistrationService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    EventSelection,
    CoupleData,
    Location,
    JointData,
    Review,
    Confirmation,
}

impl WizardStep {
    pub fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::EventSelection => Some(WizardStep::CoupleData),
            WizardStep::CoupleData => Some(WizardStep::Location),
            WizardStep::Location => Some(WizardStep::JointData),
            WizardStep::JointData => Some(WizardStep::Review),
            WizardStep::Review => Some(WizardStep::Confirmation),
            WizardStep::Confirmation => None,
        }
    }

    pub fn previous(self) -> WizardStep {
        match self {
            WizardStep::EventSelection | WizardStep::CoupleData => WizardStep::EventSelection,
            WizardStep::Location => WizardStep::CoupleData,
            WizardStep::JointData => WizardStep::Location,
            WizardStep::Review => WizardStep::JointData,
            WizardStep::Confirmation => WizardStep::Review,
        }
    }

    pub fn navigation(self) -> StepNavigation {
        StepNavigation {
            step: self,
            next: self.next(),
            previous: self.previous(),
        }
    }

    /// Valida só os campos que pertencem a esta etapa.
    pub fn validate(self, draft: &RegistrationDraft) -> Result<(), ValidationErrors> {
        match self {
            WizardStep::EventSelection => EventStep { event_id: draft.event_id }.validate(),
            WizardStep::CoupleData => CoupleStep {
                husband: draft.husband.clone(),
                wife: draft.wife.clone(),
            }
            .validate(),
            WizardStep::Location => LocationStep {
                municipality_code: draft.municipality_code,
            }
            .validate(),
            WizardStep::JointData => JointStep {
                joint_data: draft.joint_data.clone(),
            }
            .validate(),
            WizardStep::Review | WizardStep::Confirmation => Ok(()),
        }
    }
}

/// Para onde o formulário pode ir depois de uma etapa válida.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepNavigation {
    pub step: WizardStep,
    pub next: Option<WizardStep>,
    pub previous: WizardStep,
}

#[derive(Validate)]
struct EventStep {
    #[validate(range(min = 1, message = "Selecione um evento."))]
    event_id: i64,
}

#[derive(Validate)]
struct CoupleStep {
    #[validate(nested)]
    husband: PersonInput,
    #[validate(nested)]
    wife: PersonInput,
}

#[derive(Validate)]
struct LocationStep {
    #[validate(range(min = 1, message = "Município obrigatório."))]
    municipality_code: i32,
}

#[derive(Validate)]
struct JointStep {
    #[validate(nested)]
    joint_data: JointData,
}

/// Quem efetivamente grava a inscrição quando o wizard é concluído.
#[async_trait]
pub trait RegistrationSubmitter: Send + Sync {
    async fn submit(&self, draft: &RegistrationDraft) -> Result<i64, AppError>;
}

/// Envio em nome de um usuário autenticado.
pub struct UserSubmission<'a> {
    pub service: &'a RegistrationService,
    pub user_id: Uuid,
}

#[async_trait]
impl RegistrationSubmitter for UserSubmission<'_> {
    async fn submit(&self, draft: &RegistrationDraft) -> Result<i64, AppError> {
        self.service.register_couple(draft, Some(self.user_id)).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    At(WizardStep),
    Submitting,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Advance {
    Moved(WizardStep),
    Submitted(i64),
}

#[derive(Debug)]
pub struct RegistrationWizard {
    state: WizardState,
    draft: RegistrationDraft,
}

impl Default for RegistrationWizard {
    fn default() -> Self {
        Self::with_draft(RegistrationDraft::default())
    }
}

impl RegistrationWizard {
    pub fn with_draft(draft: RegistrationDraft) -> Self {
        Self {
            state: WizardState::At(WizardStep::EventSelection),
            draft,
        }
    }

    fn current_step(&self) -> WizardStep {
        match self.state {
            WizardState::At(step) => step,
            WizardState::Submitting => WizardStep::Confirmation,
        }
    }

    /// Avança validando a etapa atual. Na confirmação, envia a inscrição.
    /// Se o envio falhar, o rascunho fica intacto na etapa de confirmação.
    pub async fn advance<S>(&mut self, submitter: &S) -> Result<Advance, AppError>
    where
        S: RegistrationSubmitter + ?Sized,
    {
        let step = self.current_step();
        step.validate(&self.draft)?;

        let Some(next) = step.next() else {
            return self.submit(submitter).await;
        };
        self.state = WizardState::At(next);
        Ok(Advance::Moved(next))
    }

    /// Rascunho completo de uma vez: valida etapa por etapa, na ordem, e envia.
    pub async fn complete<S>(mut self, submitter: &S) -> Result<i64, AppError>
    where
        S: RegistrationSubmitter + ?Sized,
    {
        loop {
            match self.advance(submitter).await? {
                Advance::Moved(step) => tracing::debug!("Etapa validada, seguindo para {:?}", step),
                Advance::Submitted(id) => return Ok(id),
            }
        }
    }

    async fn submit<S>(&mut self, submitter: &S) -> Result<Advance, AppError>
    where
        S: RegistrationSubmitter + ?Sized,
    {
        self.state = WizardState::Submitting;

        match submitter.submit(&self.draft).await {
            Ok(id) => {
                *self = Self::default();
                Ok(Advance::Submitted(id))
            }
            Err(e) => {
                self.state = WizardState::At(WizardStep::Confirmation);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
impl RegistrationWizard {
    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn draft(&self) -> &RegistrationDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut RegistrationDraft {
        &mut self.draft
    }

    /// Volta uma etapa sem validar; os dados preenchidos são mantidos.
    pub fn back(&mut self) {
        if let WizardState::At(step) = self.state {
            self.state = WizardState::At(step.previous());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use claims::{assert_err, assert_ok};

    use super::*;
    use crate::services::registration_service::testing::{draft, InMemoryStore};

    struct CountingSubmitter {
        calls: AtomicUsize,
        result: Result<i64, String>,
    }

    #[async_trait]
    impl RegistrationSubmitter for CountingSubmitter {
        async fn submit(&self, _draft: &RegistrationDraft) -> Result<i64, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map_err(AppError::CoupleUnavailable)
        }
    }

    fn submitter(result: Result<i64, String>) -> CountingSubmitter {
        CountingSubmitter { calls: AtomicUsize::new(0), result }
    }

    async fn filled_wizard_at_confirmation(s: &CountingSubmitter) -> RegistrationWizard {
        let mut wizard = RegistrationWizard::with_draft(draft(1, "111.222.333-44", "555.666.777-88"));
        for _ in 0..5 {
            assert_ok!(wizard.advance(s).await);
        }
        assert_eq!(wizard.state(), WizardState::At(WizardStep::Confirmation));
        wizard
    }

    #[tokio::test]
    async fn cannot_leave_event_selection_without_event() {
        let s = submitter(Ok(1));
        let mut wizard = RegistrationWizard::default();

        assert_err!(wizard.advance(&s).await);
        assert_eq!(wizard.state(), WizardState::At(WizardStep::EventSelection));
    }

    #[test]
    fn couple_step_only_checks_couple_fields() {
        let mut d = draft(1, "111.222.333-44", "555.666.777-88");
        d.joint_data = JointData::default();
        d.municipality_code = 0;
        assert_ok!(WizardStep::CoupleData.validate(&d));

        d.wife.cpf = "123".into();
        let errors = WizardStep::CoupleData.validate(&d).unwrap_err();
        assert!(errors.errors().contains_key("wife"));
        assert!(!errors.errors().contains_key("husband"));
    }

    #[test]
    fn review_and_confirmation_have_no_validation() {
        let empty = RegistrationDraft::default();
        assert_ok!(WizardStep::Review.validate(&empty));
        assert_ok!(WizardStep::Confirmation.validate(&empty));
        assert_err!(WizardStep::JointData.validate(&empty));
        assert_err!(WizardStep::Location.validate(&empty));
    }

    #[tokio::test]
    async fn back_keeps_data_and_stops_at_first_step() {
        let s = submitter(Ok(1));
        let mut wizard = RegistrationWizard::default();
        wizard.draft_mut().event_id = 3;
        assert_ok!(wizard.advance(&s).await);
        wizard.draft_mut().husband.name = "João".into();

        wizard.back();
        wizard.back();

        assert_eq!(wizard.state(), WizardState::At(WizardStep::EventSelection));
        assert_eq!(wizard.draft().event_id, 3);
        assert_eq!(wizard.draft().husband.name, "João");
    }

    #[tokio::test]
    async fn successful_submission_resets_the_wizard() {
        let s = submitter(Ok(42));
        let mut wizard = filled_wizard_at_confirmation(&s).await;

        let outcome = wizard.advance(&s).await.unwrap();

        assert_eq!(outcome, Advance::Submitted(42));
        assert_eq!(s.calls.load(Ordering::SeqCst), 1);
        assert_eq!(wizard.state(), WizardState::At(WizardStep::EventSelection));
        assert_eq!(wizard.draft().event_id, 0);
    }

    #[tokio::test]
    async fn failed_submission_keeps_draft_at_confirmation() {
        let s = submitter(Err("Um ou ambos os CPFs já estão inscritos neste evento.".into()));
        let mut wizard = filled_wizard_at_confirmation(&s).await;

        let err = wizard.advance(&s).await.unwrap_err();

        assert_eq!(err.user_message(), "Um ou ambos os CPFs já estão inscritos neste evento.");
        assert_eq!(wizard.state(), WizardState::At(WizardStep::Confirmation));
        assert_eq!(wizard.draft().event_id, 1);
    }

    #[tokio::test]
    async fn wizard_submits_through_registration_service() {
        let store = Arc::new(InMemoryStore::default());
        let service = RegistrationService::new(store.clone());
        let user_id = Uuid::new_v4();
        let submission = UserSubmission { service: &service, user_id };

        let wizard = RegistrationWizard::with_draft(draft(9, "111.222.333-44", "555.666.777-88"));
        let id = wizard.complete(&submission).await.unwrap();

        assert!(id > 0);
        let stored = store.registrations();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].user_id, Some(user_id));
    }

    #[tokio::test]
    async fn complete_stops_at_the_first_invalid_step() {
        let s = submitter(Ok(1));
        let mut d = draft(1, "111.222.333-44", "555.666.777-88");
        d.municipality_code = 0;
        d.joint_data = JointData::default();

        let err = RegistrationWizard::with_draft(d).complete(&s).await.unwrap_err();

        let AppError::ValidationError(errors) = err else {
            panic!("esperava erro de validação, veio {:?}", err);
        };
        assert!(errors.errors().contains_key("municipality_code"));
        assert!(!errors.errors().contains_key("joint_data"));
        assert_eq!(s.calls.load(Ordering::SeqCst), 0);
    }
}
