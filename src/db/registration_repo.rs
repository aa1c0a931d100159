// src/db/registration_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{types::Json, Executor, FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::DirectoryRepository,
    models::registration::{
        JointData, NewPerson, NewRegistration, Person, PersonUpdate, Registration,
        RegistrationDetail, RegistrationStatus, RegistrationUpdatePayload, Spouse,
        parse_birth_date, digits_only,
    },
    services::registration_service::RegistrationStore,
};

// Consulta base das telas administrativas e relatórios: inscrição + evento + casal + local
const DETAIL_SELECT: &str = r#"
    SELECT
        r.id, r.event_id, r.husband_id, r.wife_id, r.diocese_id, r.municipality_code,
        r.user_id, r.status, r.joint_data, r.created_at,
        e.name AS event_name, e.start_date AS event_start_date,
        h.cpf AS h_cpf, h.name AS h_name, h.birth_date AS h_birth_date, h.email AS h_email,
        h.phone AS h_phone, h.created_at AS h_created_at, h.updated_at AS h_updated_at,
        w.cpf AS w_cpf, w.name AS w_name, w.birth_date AS w_birth_date, w.email AS w_email,
        w.phone AS w_phone, w.created_at AS w_created_at, w.updated_at AS w_updated_at,
        d.name AS diocese_name,
        m.name AS municipality_name, m.state AS municipality_state
    FROM registrations r
    JOIN events e ON e.id = r.event_id
    JOIN persons h ON h.id = r.husband_id
    JOIN persons w ON w.id = r.wife_id
    LEFT JOIN dioceses d ON d.id = r.diocese_id
    LEFT JOIN municipalities m ON m.code = r.municipality_code
"#;

#[derive(FromRow)]
struct DetailRow {
    id: i64,
    event_id: i64,
    husband_id: i64,
    wife_id: i64,
    diocese_id: Option<i64>,
    municipality_code: Option<i32>,
    user_id: Option<Uuid>,
    status: RegistrationStatus,
    joint_data: Json<JointData>,
    created_at: DateTime<Utc>,
    event_name: String,
    event_start_date: NaiveDate,
    h_cpf: String,
    h_name: String,
    h_birth_date: NaiveDate,
    h_email: String,
    h_phone: String,
    h_created_at: DateTime<Utc>,
    h_updated_at: DateTime<Utc>,
    w_cpf: String,
    w_name: String,
    w_birth_date: NaiveDate,
    w_email: String,
    w_phone: String,
    w_created_at: DateTime<Utc>,
    w_updated_at: DateTime<Utc>,
    diocese_name: Option<String>,
    municipality_name: Option<String>,
    municipality_state: Option<String>,
}

impl From<DetailRow> for RegistrationDetail {
    fn from(row: DetailRow) -> Self {
        RegistrationDetail {
            registration: Registration {
                id: row.id,
                event_id: row.event_id,
                husband_id: row.husband_id,
                wife_id: row.wife_id,
                diocese_id: row.diocese_id,
                municipality_code: row.municipality_code,
                user_id: row.user_id,
                status: row.status,
                joint_data: row.joint_data,
                created_at: row.created_at,
            },
            event_name: row.event_name,
            event_start_date: row.event_start_date,
            husband: Person {
                id: row.husband_id,
                cpf: row.h_cpf,
                name: row.h_name,
                birth_date: row.h_birth_date,
                email: row.h_email,
                phone: row.h_phone,
                created_at: row.h_created_at,
                updated_at: row.h_updated_at,
            },
            wife: Person {
                id: row.wife_id,
                cpf: row.w_cpf,
                name: row.w_name,
                birth_date: row.w_birth_date,
                email: row.w_email,
                phone: row.w_phone,
                created_at: row.w_created_at,
                updated_at: row.w_updated_at,
            },
            diocese_name: row.diocese_name,
            municipality_name: row.municipality_name,
            municipality_state: row.municipality_state,
        }
    }
}

#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
    directory_repo: DirectoryRepository,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool, directory_repo: DirectoryRepository) -> Self {
        Self { pool, directory_repo }
    }

    // =========================================================================
    //  PESSOAS
    // =========================================================================

    /// Insere ou atualiza a pessoa pelo CPF (chave natural) e devolve o ID.
    pub async fn upsert_person<'e, E>(&self, executor: E, person: &NewPerson) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO persons (cpf, name, birth_date, email, phone)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (cpf) DO UPDATE SET
                name = EXCLUDED.name,
                birth_date = EXCLUDED.birth_date,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(&person.cpf)
        .bind(&person.name)
        .bind(person.birth_date)
        .bind(&person.email)
        .bind(&person.phone)
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    async fn update_person<'e, E>(
        &self,
        executor: E,
        id: i64,
        person: &PersonUpdate,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let birth_date = parse_birth_date(&person.birth_date).ok_or_else(|| {
            AppError::BusinessRule(format!("Data de nascimento inválida: {}", person.birth_date))
        })?;
        sqlx::query(
            r#"
            UPDATE persons SET name = $2, birth_date = $3, email = $4, phone = $5, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(person.name.trim())
        .bind(birth_date)
        .bind(person.email.trim().to_lowercase())
        .bind(digits_only(&person.phone))
        .execute(executor)
        .await?;
        Ok(())
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    /// Inscrições enriquecidas, mais recentes primeiro, com filtros opcionais.
    pub async fn list_details(
        &self,
        event_id: Option<i64>,
        user_id: Option<Uuid>,
    ) -> Result<Vec<RegistrationDetail>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(DETAIL_SELECT);
        builder.push(" WHERE TRUE");
        if let Some(event_id) = event_id {
            builder.push(" AND r.event_id = ").push_bind(event_id);
        }
        if let Some(user_id) = user_id {
            builder.push(" AND r.user_id = ").push_bind(user_id);
        }
        builder.push(" ORDER BY r.created_at DESC, r.id DESC");

        let rows = builder
            .build_query_as::<DetailRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(RegistrationDetail::from).collect())
    }

    pub async fn find_detail(&self, id: i64) -> Result<Option<RegistrationDetail>, AppError> {
        let sql = format!("{} WHERE r.id = $1", DETAIL_SELECT);
        let row = sqlx::query_as::<_, DetailRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(RegistrationDetail::from))
    }

    // =========================================================================
    //  ALTERAÇÕES (ADMIN)
    // =========================================================================

    pub async fn update_status(&self, id: i64, status: RegistrationStatus) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE registrations SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Inscrição".into()));
        }
        Ok(())
    }

    /// Edição completa: pessoas, evento, município/diocese e dados conjuntos, tudo ou nada.
    pub async fn update(&self, id: i64, payload: &RegistrationUpdatePayload) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let (husband_id, wife_id) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT husband_id, wife_id FROM registrations WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Inscrição".into()))?;

        self.update_person(&mut *tx, husband_id, &payload.husband).await?;
        self.update_person(&mut *tx, wife_id, &payload.wife).await?;

        let diocese_id = match payload.municipality_code {
            Some(code) => self.directory_repo.diocese_for_municipality(&mut *tx, code).await?,
            None => None,
        };

        sqlx::query(
            r#"
            UPDATE registrations SET
                event_id = $2, municipality_code = $3, diocese_id = $4, joint_data = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(payload.event_id)
        .bind(payload.municipality_code)
        .bind(diocese_id)
        .bind(Json(payload.joint_data.clone().normalized()))
        .execute(&mut *tx)
        .await
        .map_err(map_registration_fk_error)?;

        sqlx::query("UPDATE registration_participants SET event_id = $2 WHERE registration_id = $1")
            .bind(id)
            .bind(payload.event_id)
            .execute(&mut *tx)
            .await
            .map_err(map_participant_error)?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM registrations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Inscrição".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RegistrationStore for RegistrationRepository {
    async fn find_person_ids(&self, cpfs: &[String]) -> Result<Vec<i64>, AppError> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM persons WHERE cpf = ANY($1)")
            .bind(cpfs)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn event_has_any(&self, event_id: i64, person_ids: &[i64]) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM registrations
                WHERE event_id = $1 AND (husband_id = ANY($2) OR wife_id = ANY($2))
            )
            "#,
        )
        .bind(event_id)
        .bind(person_ids)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_registration(&self, new: &NewRegistration) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;

        let husband_id = self
            .upsert_person(&mut *tx, &new.husband)
            .await
            .map_err(|e| person_write_failed(Spouse::Husband, e))?;
        let wife_id = self
            .upsert_person(&mut *tx, &new.wife)
            .await
            .map_err(|e| person_write_failed(Spouse::Wife, e))?;

        let diocese_id = self
            .directory_repo
            .diocese_for_municipality(&mut *tx, new.municipality_code)
            .await?;

        let registration_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO registrations (
                event_id, husband_id, wife_id, diocese_id, municipality_code,
                user_id, status, joint_data
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(new.event_id)
        .bind(husband_id)
        .bind(wife_id)
        .bind(diocese_id)
        .bind(new.municipality_code)
        .bind(new.user_id)
        .bind(RegistrationStatus::Pending)
        .bind(Json(&new.joint_data))
        .fetch_one(&mut *tx)
        .await
        .map_err(map_registration_fk_error)?;

        // A PK (event_id, person_id) garante a unicidade por evento mesmo com envios concorrentes
        sqlx::query(
            r#"
            INSERT INTO registration_participants (registration_id, event_id, person_id)
            VALUES ($1, $2, $3), ($1, $2, $4)
            "#,
        )
        .bind(registration_id)
        .bind(new.event_id)
        .bind(husband_id)
        .bind(wife_id)
        .execute(&mut *tx)
        .await
        .map_err(map_participant_error)?;

        tx.commit().await?;
        Ok(registration_id)
    }
}

fn person_write_failed(spouse: Spouse, e: AppError) -> AppError {
    tracing::error!("Falha no upsert do(a) {}: {:?}", spouse.label(), e);
    AppError::PersonWriteFailed(spouse)
}

fn map_registration_fk_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation() {
            return match db_err.constraint() {
                Some(c) if c.contains("municipality") => {
                    AppError::ResourceNotFound("Município".into())
                }
                _ => AppError::ResourceNotFound("Evento".into()),
            };
        }
        if db_err.is_check_violation() {
            return AppError::BusinessRule(
                "Os CPFs do esposo e esposa devem ser diferentes.".to_string(),
            );
        }
    }
    e.into()
}

fn map_participant_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::CoupleAlreadyRegistered;
        }
    }
    e.into()
}
