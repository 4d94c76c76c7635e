//! Command handlers, one module per subcommand.

use std::{path::Path, sync::Arc};

use images3_adapters::{InMemoryMetrics, InMemoryStore, RasterProcessor};
use images3_core::{
    application::ImagePlantService,
    domain::{AggregateServices, ImageContent, ImagePlantFactory},
};

use crate::{
    config::AppConfig,
    error::{CliError, CliResult},
};

pub mod completions;
pub mod init;
pub mod inspect;
pub mod process;

/// Wires the plant service over the in-memory adapters.
pub(crate) fn plant_service(config: &AppConfig) -> ImagePlantService {
    let metrics = Arc::new(InMemoryMetrics::new().with_page_size(config.storage.page_size));
    let store = Arc::new(
        InMemoryStore::new()
            .with_page_size(config.storage.page_size)
            .with_metrics(metrics.clone()),
    );
    let ports = store.aggregate_ports(Arc::new(RasterProcessor::new()), metrics);
    let factory = ImagePlantFactory::new(AggregateServices::new(ports));
    ImagePlantService::new(factory, store.clone(), store)
}

/// Reads an input file into image content.
pub(crate) fn read_content(path: &Path) -> CliResult<ImageContent> {
    std::fs::read(path)
        .map(ImageContent::from)
        .map_err(|source| CliError::UnreadableInput {
            path: path.to_path_buf(),
            source,
        })
}
