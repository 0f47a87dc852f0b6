use std::sync::Arc;

use cmeq_service::CmeService;
use cmeq_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<CmeService>,
}
impl AppState {
	pub async fn new(config: cmeq_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;
		let service = CmeService::new(config, db);

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: CmeService) -> Self {
		Self { service: Arc::new(service) }
	}
}
