#![allow(dead_code)]

use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App,
};
use nanodrop::services::files::{FileService, UploadPolicy};
use nanodrop::services::memory::{InMemoryMetadataStore, InMemoryObjectStore};
use nanodrop::{configure_app, cors, AppState};

pub const ORIGIN: &str = "https://files.example.com";

pub struct TestContext {
    pub metadata: Arc<InMemoryMetadataStore>,
    pub objects: Arc<InMemoryObjectStore>,
    pub state: web::Data<AppState>,
    pub allowed_origins: Vec<String>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_options(false, vec!["*".to_string()])
    }

    pub fn development() -> Self {
        Self::with_options(true, vec!["*".to_string()])
    }

    pub fn with_origins(origins: &[&str]) -> Self {
        Self::with_options(false, origins.iter().map(|o| o.to_string()).collect())
    }

    fn with_options(expose_error_details: bool, allowed_origins: Vec<String>) -> Self {
        let metadata = Arc::new(InMemoryMetadataStore::new());
        let objects = Arc::new(InMemoryObjectStore::new("test-bucket"));
        let files = FileService::new(metadata.clone(), objects.clone(), UploadPolicy::default());
        Self {
            metadata,
            objects,
            state: web::Data::new(AppState::new(files, expose_error_details)),
            allowed_origins,
        }
    }

    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .wrap(cors(&self.allowed_origins))
            .configure(configure_app(self.state.clone()))
    }
}
