// src/services/storage.rs

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::common::error::AppError;

/// Armazenamento de objetos (comprovantes). Os caminhos são relativos ao bucket.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), AppError>;
    async fn get(&self, path: &str) -> Result<Vec<u8>, AppError>;
    async fn remove(&self, path: &str) -> Result<(), AppError>;
    fn public_url(&self, path: &str) -> String;
}

/// Bucket em um diretório local, servido em `public_base_url`.
#[derive(Debug, Clone)]
pub struct LocalDiskStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    // Só aceita nomes simples, nada de "..", "/" ou caminhos absolutos
    fn resolve(&self, path: &str) -> Result<PathBuf, AppError> {
        let mut components = Path::new(path).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(path)),
            _ => Err(AppError::StorageError(format!("Caminho inválido: {}", path))),
        }
    }
}

#[async_trait]
impl ObjectStorage for LocalDiskStorage {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), AppError> {
        let target = self.resolve(path)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::StorageError(e.to_string()))?;

        // create_new: nunca sobrescreve um objeto existente
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|e| AppError::StorageError(e.to_string()))?;
        tokio::io::AsyncWriteExt::write_all(&mut file, bytes)
            .await
            .map_err(|e| AppError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, AppError> {
        let target = self.resolve(path)?;
        tokio::fs::read(&target).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::ResourceNotFound("Arquivo".into()),
            _ => AppError::StorageError(e.to_string()),
        })
    }

    async fn remove(&self, path: &str) -> Result<(), AppError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::StorageError(e.to_string())),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use claims::{assert_err, assert_ok};

    use super::*;

    fn storage() -> (LocalDiskStorage, PathBuf) {
        let dir = std::env::temp_dir().join(format!("comprovantes-{}", uuid::Uuid::new_v4()));
        (LocalDiskStorage::new(&dir, "http://localhost:3000/files/"), dir)
    }

    #[tokio::test]
    async fn put_get_remove_roundtrip() {
        let (storage, dir) = storage();

        assert_ok!(storage.put("inscricao_1_1_abc.pdf", b"%PDF").await);
        assert_eq!(storage.get("inscricao_1_1_abc.pdf").await.unwrap(), b"%PDF");
        assert_ok!(storage.remove("inscricao_1_1_abc.pdf").await);
        assert_err!(storage.get("inscricao_1_1_abc.pdf").await);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn put_never_overwrites() {
        let (storage, dir) = storage();

        assert_ok!(storage.put("a.png", b"1").await);
        assert_err!(storage.put("a.png", b"2").await);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let (storage, _) = storage();
        assert_err!(storage.put("../fora.pdf", b"x").await);
        assert_err!(storage.get("/etc/passwd").await);
    }

    #[test]
    fn public_url_joins_base_and_path() {
        let (storage, _) = storage();
        assert_eq!(storage.public_url("a.pdf"), "http://localhost:3000/files/a.pdf");
    }
}
