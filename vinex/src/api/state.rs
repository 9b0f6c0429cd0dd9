use std::sync::Arc;

use crate::config::Config;
use crate::denoise::DenoiseEngine;
use crate::enhance::Enhancer;
use crate::llm::Generator;
use crate::recovery::SchemaRegistry;
use crate::services::{ConsigneeService, ExtractionService, TranslationService};
use crate::storage::ObjectStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Loaded denoising engine. The server never starts without one.
    pub engine: DenoiseEngine,
    pub generator: Arc<dyn Generator>,
    pub store: Arc<dyn ObjectStore>,
    pub schemas: Arc<SchemaRegistry>,
    pub extraction: ExtractionService,
    pub translation: TranslationService,
    pub consignee: ConsigneeService,
}

impl AppState {
    pub fn new(
        config: Config,
        engine: DenoiseEngine,
        generator: Arc<dyn Generator>,
        store: Arc<dyn ObjectStore>,
        schemas: SchemaRegistry,
    ) -> Self {
        let config = Arc::new(config);
        let extraction = ExtractionService::new(
            Enhancer::new(engine.clone()),
            store.clone(),
            generator.clone(),
            config.enhancement.clone(),
        );
        let translation_model = config
            .llm
            .as_ref()
            .and_then(|llm| llm.translation_model.clone());
        let translation = TranslationService::new(generator.clone(), translation_model);
        let consignee = ConsigneeService::new(generator.clone());

        Self {
            config,
            engine,
            generator,
            store,
            schemas: Arc::new(schemas),
            extraction,
            translation,
            consignee,
        }
    }
}
