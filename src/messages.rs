// SPDX-License-Identifier: MPL-2.0

//! User-facing text for every error kind.
//!
//! Error enums describe what went wrong; this module decides what the user
//! reads. `Display` on the enums stays English and goes to the logs.

use crate::api::SyncError;
use crate::cache::CacheError;
use crate::repository::SignRepositoryError;
use crate::state::{FavoritesError, SettingsError, SyncRunError};
use crate::video::VideoError;
use thiserror::Error;

pub trait UserMessage {
    fn user_message(&self) -> String;
}

impl UserMessage for SignRepositoryError {
    fn user_message(&self) -> String {
        match self {
            SignRepositoryError::FileNotFound(_) => "Не удалось загрузить данные".to_string(),
            SignRepositoryError::UnreadableFile(_) => "Ошибка чтения файла".to_string(),
            SignRepositoryError::Decode(e) => format!("Ошибка обработки данных: {e}"),
            SignRepositoryError::InvalidFormat(_) => "Неверный формат данных".to_string(),
            SignRepositoryError::NoDataAvailable => {
                "Данные недоступны. Проверьте подключение к интернету.".to_string()
            }
        }
    }
}

impl UserMessage for SyncError {
    fn user_message(&self) -> String {
        match self {
            SyncError::NoConnectivity => {
                "Нет подключения к интернету. Проверьте соединение и попробуйте снова."
                    .to_string()
            }
            SyncError::Server(code) => format!("Ошибка сервера: {code}. Попробуйте позже."),
            SyncError::Network(e) => format!("Ошибка сети: {e}"),
            SyncError::Decode(e) => format!("Ошибка обработки данных: {e}"),
            SyncError::InvalidResponse(_) => {
                "Неверный ответ сервера. Попробуйте позже.".to_string()
            }
            SyncError::InvalidEndpoint(url) => format!("Неверный адрес сервера: {url}"),
        }
    }
}

impl UserMessage for VideoError {
    fn user_message(&self) -> String {
        match self {
            VideoError::InvalidUrl => "Неверный URL видео".to_string(),
            VideoError::FetchFailed => "Не удалось загрузить видео".to_string(),
            VideoError::Storage(detail) => format!("Ошибка сервера: {detail}"),
        }
    }
}

impl UserMessage for CacheError {
    fn user_message(&self) -> String {
        match self {
            CacheError::StorageUnavailable(_) => "Хранилище недоступно".to_string(),
            CacheError::Save(_) => "Не удалось сохранить данные".to_string(),
            CacheError::Load(_) => "Не удалось прочитать сохранённые данные".to_string(),
            CacheError::Database(e) => format!("Ошибка базы данных: {e}"),
            CacheError::Serialization(e) => format!("Ошибка обработки данных: {e}"),
        }
    }
}

impl UserMessage for FavoritesError {
    fn user_message(&self) -> String {
        match self {
            FavoritesError::Storage(e) => e.user_message(),
            FavoritesError::Closed => "Избранное недоступно".to_string(),
        }
    }
}

impl UserMessage for SettingsError {
    fn user_message(&self) -> String {
        match self {
            SettingsError::Invalid(reason) => format!("Недопустимая настройка: {reason}"),
            e => format!("Не удалось сохранить настройки: {e}"),
        }
    }
}

impl UserMessage for SyncRunError {
    fn user_message(&self) -> String {
        match self {
            SyncRunError::Sync(e) => e.user_message(),
            SyncRunError::Cache(e) => e.user_message(),
            SyncRunError::Data(e) => e.user_message(),
        }
    }
}

/// Any failure the front end may have to report.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Data(#[from] SignRepositoryError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Video(#[from] VideoError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Favorites(#[from] FavoritesError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("{0}")]
    Usage(String),
}

impl From<SyncRunError> for AppError {
    fn from(e: SyncRunError) -> Self {
        match e {
            SyncRunError::Sync(e) => AppError::Sync(e),
            SyncRunError::Cache(e) => AppError::Cache(e),
            SyncRunError::Data(e) => AppError::Data(e),
        }
    }
}

impl UserMessage for AppError {
    fn user_message(&self) -> String {
        match self {
            AppError::Data(e) => e.user_message(),
            AppError::Sync(e) => e.user_message(),
            AppError::Video(e) => e.user_message(),
            AppError::Cache(e) => e.user_message(),
            AppError::Favorites(e) => e.user_message(),
            AppError::Settings(e) => e.user_message(),
            AppError::Usage(msg) => msg.clone(),
        }
    }
}
