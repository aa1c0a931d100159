// src/services/registration_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    models::registration::{
        digits_only, is_valid_cpf, Availability, NewRegistration, RegistrationDraft,
    },
};

pub const MSG_HUSBAND_CPF_INVALID: &str = "CPF do esposo está inválido.";
pub const MSG_WIFE_CPF_INVALID: &str = "CPF da esposa está inválido.";
pub const MSG_SAME_CPF: &str = "Os CPFs do esposo e esposa devem ser diferentes.";
pub const MSG_ALREADY_REGISTERED: &str = "Um ou ambos os CPFs já estão inscritos neste evento.";
pub const MSG_LOOKUP_FAILED: &str = "Erro ao verificar disponibilidade. Tente novamente.";

/// Acesso a dados usado pela verificação de disponibilidade e pela gravação.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// IDs das pessoas cadastradas com algum dos CPFs (já sem máscara).
    async fn find_person_ids(&self, cpfs: &[String]) -> Result<Vec<i64>, AppError>;

    /// Existe inscrição no evento com alguma dessas pessoas, em qualquer posição do casal?
    async fn event_has_any(&self, event_id: i64, person_ids: &[i64]) -> Result<bool, AppError>;

    /// Upsert das duas pessoas, resolução da diocese e inserção da inscrição, atomicamente.
    async fn insert_registration(&self, new: &NewRegistration) -> Result<i64, AppError>;
}

#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn RegistrationStore>,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self { store }
    }

    /// Somente leitura. Erros de consulta viram "indisponível" com mensagem genérica.
    pub async fn check_availability(
        &self,
        event_id: i64,
        husband_cpf: &str,
        wife_cpf: &str,
    ) -> Availability {
        if !is_valid_cpf(husband_cpf) {
            return Availability::rejected(MSG_HUSBAND_CPF_INVALID);
        }
        if !is_valid_cpf(wife_cpf) {
            return Availability::rejected(MSG_WIFE_CPF_INVALID);
        }

        let husband = digits_only(husband_cpf);
        let wife = digits_only(wife_cpf);
        if husband == wife {
            return Availability::rejected(MSG_SAME_CPF);
        }

        match self.lookup(event_id, [husband, wife]).await {
            Ok(true) => Availability::rejected(MSG_ALREADY_REGISTERED),
            Ok(false) => Availability::available(),
            Err(e) => {
                tracing::error!("Erro ao verificar disponibilidade do casal: {:?}", e);
                Availability::rejected(MSG_LOOKUP_FAILED)
            }
        }
    }

    async fn lookup(&self, event_id: i64, cpfs: [String; 2]) -> Result<bool, AppError> {
        let person_ids = self.store.find_person_ids(&cpfs).await?;
        if person_ids.is_empty() {
            return Ok(false);
        }
        self.store.event_has_any(event_id, &person_ids).await
    }

    /// Grava a inscrição do casal e devolve o ID gerado.
    pub async fn register_couple(
        &self,
        draft: &RegistrationDraft,
        user_id: Option<Uuid>,
    ) -> Result<i64, AppError> {
        draft.validate()?;

        let availability = self
            .check_availability(draft.event_id, &draft.husband.cpf, &draft.wife.cpf)
            .await;
        if !availability.available {
            let message = availability.message.unwrap_or_else(|| MSG_ALREADY_REGISTERED.into());
            return Err(AppError::CoupleUnavailable(message));
        }

        let new = NewRegistration {
            event_id: draft.event_id,
            husband: draft.husband.to_new_person()?,
            wife: draft.wife.to_new_person()?,
            municipality_code: draft.municipality_code,
            user_id,
            joint_data: draft.joint_data.clone().normalized(),
        };

        let id = self.store.insert_registration(&new).await?;
        tracing::info!("✅ Inscrição {} criada para o evento {}", id, draft.event_id);
        Ok(id)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use super::*;
    use crate::models::registration::{NewPerson, RegistrationStatus};

    #[derive(Debug, Clone)]
    pub struct StoredRegistration {
        pub id: i64,
        pub event_id: i64,
        pub husband_id: i64,
        pub wife_id: i64,
        pub status: RegistrationStatus,
        pub user_id: Option<Uuid>,
    }

    #[derive(Default)]
    struct State {
        persons: Vec<(i64, NewPerson)>,
        registrations: Vec<StoredRegistration>,
    }

    /// Implementação em memória com as mesmas regras de unicidade do banco.
    #[derive(Default)]
    pub struct InMemoryStore {
        state: Mutex<State>,
        pub person_lookups: AtomicUsize,
        pub registration_lookups: AtomicUsize,
        pub fail_lookups: bool,
        // Consultas "atrasadas": nada aparece como cadastrado, como se outro envio
        // gravasse entre a verificação e a inserção
        pub stale_lookups: bool,
    }

    impl InMemoryStore {
        pub fn failing() -> Self {
            Self { fail_lookups: true, ..Self::default() }
        }

        pub fn stale() -> Self {
            Self { stale_lookups: true, ..Self::default() }
        }

        pub fn persons(&self) -> Vec<(i64, NewPerson)> {
            self.state.lock().unwrap().persons.clone()
        }

        pub fn registrations(&self) -> Vec<StoredRegistration> {
            self.state.lock().unwrap().registrations.clone()
        }

        fn upsert(state: &mut State, person: &NewPerson) -> i64 {
            if let Some((id, existing)) = state.persons.iter_mut().find(|(_, p)| p.cpf == person.cpf) {
                *existing = person.clone();
                return *id;
            }
            let id = state.persons.len() as i64 + 1;
            state.persons.push((id, person.clone()));
            id
        }
    }

    #[async_trait]
    impl RegistrationStore for InMemoryStore {
        async fn find_person_ids(&self, cpfs: &[String]) -> Result<Vec<i64>, AppError> {
            self.person_lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail_lookups {
                return Err(AppError::InternalServerError(anyhow::anyhow!("conexão recusada")));
            }
            if self.stale_lookups {
                return Ok(Vec::new());
            }
            let state = self.state.lock().unwrap();
            Ok(state
                .persons
                .iter()
                .filter(|(_, p)| cpfs.contains(&p.cpf))
                .map(|(id, _)| *id)
                .collect())
        }

        async fn event_has_any(&self, event_id: i64, person_ids: &[i64]) -> Result<bool, AppError> {
            self.registration_lookups.fetch_add(1, Ordering::SeqCst);
            let state = self.state.lock().unwrap();
            Ok(state.registrations.iter().any(|r| {
                r.event_id == event_id
                    && (person_ids.contains(&r.husband_id) || person_ids.contains(&r.wife_id))
            }))
        }

        async fn insert_registration(&self, new: &NewRegistration) -> Result<i64, AppError> {
            let mut state = self.state.lock().unwrap();
            let husband_id = Self::upsert(&mut state, &new.husband);
            let wife_id = Self::upsert(&mut state, &new.wife);

            let taken = state.registrations.iter().any(|r| {
                r.event_id == new.event_id
                    && [r.husband_id, r.wife_id]
                        .iter()
                        .any(|id| *id == husband_id || *id == wife_id)
            });
            if taken {
                return Err(AppError::CoupleAlreadyRegistered);
            }

            let id = state.registrations.len() as i64 + 1;
            state.registrations.push(StoredRegistration {
                id,
                event_id: new.event_id,
                husband_id,
                wife_id,
                status: RegistrationStatus::Pending,
                user_id: new.user_id,
            });
            Ok(id)
        }
    }

    pub fn draft(event_id: i64, husband_cpf: &str, wife_cpf: &str) -> RegistrationDraft {
        use crate::models::registration::{JointData, PersonInput};

        RegistrationDraft {
            event_id,
            husband: PersonInput {
                name: "João Silva".into(),
                cpf: husband_cpf.into(),
                birth_date: "01/01/1990".into(),
                email: "joao@x.com".into(),
                phone: "(11) 99999-0000".into(),
            },
            wife: PersonInput {
                name: "Maria Silva".into(),
                cpf: wife_cpf.into(),
                birth_date: "1991-02-03".into(),
                email: "maria@x.com".into(),
                phone: "(11) 98888-0000".into(),
            },
            municipality_code: 350010,
            joint_data: JointData {
                parish: "Paróquia São José".into(),
                priest: "Pe. Antônio".into(),
                address: "Rua das Flores, 123".into(),
                ..JointData::default()
            },
        }
    }
}
