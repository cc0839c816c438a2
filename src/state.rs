use crate::client::ApiClient;
use crate::models::LocalData;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<LocalData>>,
    pub api: ApiClient,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: LocalData, api: ApiClient) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            api,
        }
    }
}
