// src/services/payment_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        payment::{PaymentProof, ProofUpload, ALLOWED_PROOF_MIME_TYPES, MAX_PROOF_SIZE},
        registration::RegistrationStatus,
    },
    services::storage::ObjectStorage,
};

/// Metadados a gravar depois que o arquivo já está no storage.
#[derive(Debug, Clone)]
pub struct NewProof {
    pub registration_id: i64,
    pub storage_path: String,
    pub public_url: String,
    pub mime_type: String,
    pub uploaded_by: Option<Uuid>,
}

#[async_trait]
pub trait ProofStore: Send + Sync {
    async fn registration_status(&self, registration_id: i64) -> Result<Option<RegistrationStatus>, AppError>;

    /// Insere o comprovante e aplica `status_after_first_proof` na mesma transação.
    async fn record_proof(&self, proof: &NewProof) -> Result<PaymentProof, AppError>;

    async fn list_proofs(&self, registration_id: i64) -> Result<Vec<PaymentProof>, AppError>;
    async fn find_proof(&self, id: Uuid) -> Result<Option<PaymentProof>, AppError>;
    async fn delete_proof(&self, id: Uuid) -> Result<(), AppError>;
}

/// Só uma inscrição pendente é confirmada pelo comprovante; os demais status não mudam.
pub fn status_after_first_proof(current: RegistrationStatus) -> RegistrationStatus {
    match current {
        RegistrationStatus::Pending => RegistrationStatus::Confirmed,
        other => other,
    }
}

/// Tipo e tamanho são conferidos antes de qualquer acesso ao storage.
pub fn validate_upload(upload: &ProofUpload) -> Result<(), AppError> {
    if upload.bytes.is_empty() {
        return Err(AppError::InvalidUpload("Nenhum arquivo fornecido.".into()));
    }
    if !ALLOWED_PROOF_MIME_TYPES.contains(&upload.mime_type.as_str()) {
        return Err(AppError::InvalidUpload(
            "Formato inválido. Apenas PDF, JPG e PNG são permitidos.".into(),
        ));
    }
    if upload.bytes.len() > MAX_PROOF_SIZE {
        return Err(AppError::InvalidUpload(format!(
            "Arquivo muito grande. O máximo permitido é {}MB.",
            MAX_PROOF_SIZE / 1024 / 1024
        )));
    }
    Ok(())
}

/// `inscricao_{id}_{millis}_{aleatório}.{ext}`
pub fn object_name(registration_id: i64, extension: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "inscricao_{}_{}_{}.{}",
        registration_id,
        Utc::now().timestamp_millis(),
        &random[..6],
        extension
    )
}

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn ProofStore>,
    storage: Arc<dyn ObjectStorage>,
}

impl PaymentService {
    pub fn new(store: Arc<dyn ProofStore>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { store, storage }
    }

    pub async fn upload(
        &self,
        registration_id: i64,
        upload: ProofUpload,
        uploaded_by: Option<Uuid>,
    ) -> Result<PaymentProof, AppError> {
        validate_upload(&upload)?;

        if self.store.registration_status(registration_id).await?.is_none() {
            return Err(AppError::ResourceNotFound("Inscrição".into()));
        }

        let path = object_name(registration_id, upload.extension());
        self.storage.put(&path, &upload.bytes).await.map_err(|e| {
            tracing::error!("Erro no upload para o storage: {:?}", e);
            AppError::StorageError(
                "Falha ao enviar arquivo para o servidor de armazenamento.".into(),
            )
        })?;

        let new = NewProof {
            registration_id,
            public_url: self.storage.public_url(&path),
            storage_path: path,
            mime_type: upload.mime_type,
            uploaded_by,
        };

        match self.store.record_proof(&new).await {
            Ok(proof) => {
                tracing::info!(
                    "✅ Comprovante {} ({}) anexado à inscrição {}",
                    proof.id,
                    upload.file_name,
                    registration_id
                );
                Ok(proof)
            }
            Err(e) => {
                // Desfaz o upload para não deixar arquivo órfão
                if let Err(cleanup) = self.storage.remove(&new.storage_path).await {
                    tracing::warn!("Não foi possível remover {}: {:?}", new.storage_path, cleanup);
                }
                Err(e)
            }
        }
    }

    pub async fn list(&self, registration_id: i64) -> Result<Vec<PaymentProof>, AppError> {
        self.store.list_proofs(registration_id).await
    }

    pub async fn download(&self, id: Uuid) -> Result<(PaymentProof, Vec<u8>), AppError> {
        let proof = self
            .store
            .find_proof(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Comprovante".into()))?;
        let bytes = self.storage.get(&proof.storage_path).await?;
        Ok((proof, bytes))
    }

    /// Remove o arquivo e depois o registro. O status da inscrição não volta atrás.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let proof = self
            .store
            .find_proof(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Comprovante".into()))?;

        self.storage.remove(&proof.storage_path).await.map_err(|e| {
            tracing::error!("Erro ao remover do storage: {:?}", e);
            AppError::StorageError("Erro ao remover arquivo físico.".into())
        })?;

        self.store.delete_proof(id).await
    }

    /// Limpeza dos arquivos de uma inscrição já excluída (as linhas saem por cascata).
    pub async fn discard_files(&self, proofs: &[PaymentProof]) {
        for proof in proofs {
            if let Err(e) = self.storage.remove(&proof.storage_path).await {
                tracing::warn!("Arquivo {} não removido: {:?}", proof.storage_path, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    use claims::{assert_err, assert_ok};

    use super::*;
    use crate::services::storage::LocalDiskStorage;

    #[derive(Default)]
    struct FakeStorage {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        puts: AtomicUsize,
    }

    #[async_trait]
    impl ObjectStorage for FakeStorage {
        async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), AppError> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.objects.lock().unwrap().insert(path.to_string(), bytes.to_vec());
            Ok(())
        }

        async fn get(&self, path: &str) -> Result<Vec<u8>, AppError> {
            self.objects
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| AppError::ResourceNotFound("Arquivo".into()))
        }

        async fn remove(&self, path: &str) -> Result<(), AppError> {
            self.objects.lock().unwrap().remove(path);
            Ok(())
        }

        fn public_url(&self, path: &str) -> String {
            format!("http://files/{}", path)
        }
    }

    #[derive(Default)]
    struct FakeProofs {
        statuses: Mutex<HashMap<i64, RegistrationStatus>>,
        proofs: Mutex<Vec<PaymentProof>>,
        fail_record: bool,
    }

    impl FakeProofs {
        fn with(id: i64, status: RegistrationStatus) -> Self {
            let fake = Self::default();
            fake.statuses.lock().unwrap().insert(id, status);
            fake
        }

        fn status(&self, id: i64) -> RegistrationStatus {
            self.statuses.lock().unwrap()[&id]
        }
    }

    #[async_trait]
    impl ProofStore for FakeProofs {
        async fn registration_status(&self, id: i64) -> Result<Option<RegistrationStatus>, AppError> {
            Ok(self.statuses.lock().unwrap().get(&id).copied())
        }

        async fn record_proof(&self, proof: &NewProof) -> Result<PaymentProof, AppError> {
            if self.fail_record {
                return Err(AppError::InternalServerError(anyhow::anyhow!("banco fora do ar")));
            }
            let mut statuses = self.statuses.lock().unwrap();
            let current = statuses[&proof.registration_id];
            statuses.insert(proof.registration_id, status_after_first_proof(current));

            let stored = PaymentProof {
                id: Uuid::new_v4(),
                registration_id: proof.registration_id,
                storage_path: proof.storage_path.clone(),
                public_url: proof.public_url.clone(),
                mime_type: proof.mime_type.clone(),
                uploaded_by: proof.uploaded_by,
                created_at: Utc::now(),
            };
            self.proofs.lock().unwrap().push(stored.clone());
            Ok(stored)
        }

        async fn list_proofs(&self, id: i64) -> Result<Vec<PaymentProof>, AppError> {
            Ok(self
                .proofs
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.registration_id == id)
                .cloned()
                .collect())
        }

        async fn find_proof(&self, id: Uuid) -> Result<Option<PaymentProof>, AppError> {
            Ok(self.proofs.lock().unwrap().iter().find(|p| p.id == id).cloned())
        }

        async fn delete_proof(&self, id: Uuid) -> Result<(), AppError> {
            self.proofs.lock().unwrap().retain(|p| p.id != id);
            Ok(())
        }
    }

    fn pdf(bytes: usize) -> ProofUpload {
        ProofUpload {
            file_name: "comprovante.pdf".into(),
            mime_type: "application/pdf".into(),
            bytes: vec![b'%'; bytes],
        }
    }

    fn service(store: Arc<FakeProofs>, storage: Arc<FakeStorage>) -> PaymentService {
        PaymentService::new(store, storage)
    }

    #[test]
    fn status_transition_only_confirms_pending() {
        use RegistrationStatus::*;
        assert_eq!(status_after_first_proof(Pending), Confirmed);
        assert_eq!(status_after_first_proof(Confirmed), Confirmed);
        assert_eq!(status_after_first_proof(Canceled), Canceled);
    }

    #[test]
    fn object_name_follows_pattern() {
        let name = object_name(42, "pdf");
        let parts: Vec<_> = name.trim_end_matches(".pdf").split('_').collect();
        assert_eq!(parts[0], "inscricao");
        assert_eq!(parts[1], "42");
        assert!(parts[2].parse::<i64>().is_ok());
        assert_eq!(parts[3].len(), 6);
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn upload_validation_checks_type_and_size() {
        assert_ok!(validate_upload(&pdf(10)));
        assert_ok!(validate_upload(&pdf(MAX_PROOF_SIZE)));
        assert_err!(validate_upload(&pdf(MAX_PROOF_SIZE + 1)));
        assert_err!(validate_upload(&pdf(0)));

        let mut gif = pdf(10);
        gif.mime_type = "image/gif".into();
        assert_err!(validate_upload(&gif));
    }

    #[tokio::test]
    async fn invalid_upload_never_reaches_storage() {
        let store = Arc::new(FakeProofs::with(1, RegistrationStatus::Pending));
        let storage = Arc::new(FakeStorage::default());
        let service = service(store.clone(), storage.clone());

        assert_err!(service.upload(1, pdf(MAX_PROOF_SIZE + 1), None).await);

        assert_eq!(storage.puts.load(Ordering::SeqCst), 0);
        assert_eq!(store.status(1), RegistrationStatus::Pending);
    }

    #[tokio::test]
    async fn first_proof_confirms_pending_registration() {
        let store = Arc::new(FakeProofs::with(1, RegistrationStatus::Pending));
        let storage = Arc::new(FakeStorage::default());
        let service = service(store.clone(), storage.clone());

        let proof = service.upload(1, pdf(100), None).await.unwrap();

        assert_eq!(store.status(1), RegistrationStatus::Confirmed);
        assert!(proof.public_url.ends_with(&proof.storage_path));
        assert_eq!(storage.objects.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn proof_on_confirmed_registration_keeps_status() {
        let store = Arc::new(FakeProofs::with(1, RegistrationStatus::Confirmed));
        let service = service(store.clone(), Arc::new(FakeStorage::default()));

        assert_ok!(service.upload(1, pdf(100), None).await);
        assert_ok!(service.upload(1, pdf(100), None).await);

        assert_eq!(store.status(1), RegistrationStatus::Confirmed);
        assert_eq!(service.list(1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_registration_is_not_found() {
        let storage = Arc::new(FakeStorage::default());
        let service = service(Arc::new(FakeProofs::default()), storage.clone());

        let err = service.upload(99, pdf(100), None).await.unwrap_err();

        assert!(matches!(err, AppError::ResourceNotFound(_)));
        assert_eq!(storage.puts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn database_failure_removes_uploaded_object() {
        let store = FakeProofs { fail_record: true, ..FakeProofs::with(1, RegistrationStatus::Pending) };
        let storage = Arc::new(FakeStorage::default());
        let service = service(Arc::new(store), storage.clone());

        assert_err!(service.upload(1, pdf(100), None).await);

        assert_eq!(storage.puts.load(Ordering::SeqCst), 1);
        assert!(storage.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_proof_keeps_confirmed_status() {
        let store = Arc::new(FakeProofs::with(1, RegistrationStatus::Pending));
        let storage = Arc::new(FakeStorage::default());
        let service = service(store.clone(), storage.clone());
        let proof = service.upload(1, pdf(100), None).await.unwrap();

        assert_ok!(service.delete(proof.id).await);

        assert!(storage.objects.lock().unwrap().is_empty());
        assert!(service.list(1).await.unwrap().is_empty());
        assert_eq!(store.status(1), RegistrationStatus::Confirmed);
    }

    #[tokio::test]
    async fn download_returns_stored_bytes() {
        let store = Arc::new(FakeProofs::with(1, RegistrationStatus::Pending));
        let service = service(store, Arc::new(FakeStorage::default()));
        let proof = service.upload(1, pdf(3), None).await.unwrap();

        let (meta, bytes) = service.download(proof.id).await.unwrap();

        assert_eq!(meta.mime_type, "application/pdf");
        assert_eq!(bytes, b"%%%");
    }

    #[tokio::test]
    async fn stored_name_ignores_the_client_extension() {
        let store = Arc::new(FakeProofs::with(1, RegistrationStatus::Pending));
        let service = service(store, Arc::new(FakeStorage::default()));
        let mut upload = pdf(10);
        upload.file_name = "a.x/y".into();

        let proof = service.upload(1, upload, None).await.unwrap();

        assert!(proof.storage_path.starts_with("inscricao_1_"));
        assert!(proof.storage_path.ends_with(".pdf"));
        assert!(!proof.storage_path.contains('/'));
    }

    #[tokio::test]
    async fn odd_file_name_is_accepted_by_disk_storage() {
        let dir = std::env::temp_dir().join(format!("comprovantes-{}", Uuid::new_v4()));
        let storage = Arc::new(LocalDiskStorage::new(dir.clone(), "http://files"));
        let store = Arc::new(FakeProofs::with(1, RegistrationStatus::Pending));
        let service = PaymentService::new(store, storage);
        let mut upload = pdf(10);
        upload.file_name = "pagina.x/html".into();

        let proof = assert_ok!(service.upload(1, upload, None).await);

        assert!(dir.join(&proof.storage_path).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
