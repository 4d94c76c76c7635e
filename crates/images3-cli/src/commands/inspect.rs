//! `images3 inspect`: show what the processor sees in each file.

use std::path::PathBuf;

use serde::Serialize;
use tracing::instrument;

use images3_adapters::RasterProcessor;
use images3_core::{application::ImageProcessor, domain::DomainError, error::Images3Error};

use crate::{
    cli::{InspectArgs, OutputFormat},
    error::CliResult,
    output::OutputManager,
};

#[derive(Debug, Serialize)]
struct FileReport {
    path: PathBuf,
    format: &'static str,
    mime_type: &'static str,
    width: u32,
    height: u32,
    size: u64,
}

#[instrument(skip_all, fields(files = args.files.len()))]
pub fn execute(args: InspectArgs, output: OutputManager) -> CliResult<()> {
    let processor = RasterProcessor::new();
    let mut reports = Vec::with_capacity(args.files.len());

    for path in args.files {
        let content = super::read_content(&path)?;
        if !processor.is_supported_format(&content) {
            return Err(Images3Error::from(DomainError::UnsupportedImageFormat {
                image_id: path.display().to_string(),
            })
            .into());
        }
        let metadata = processor.read_metadata(&content)?;
        reports.push(FileReport {
            path,
            format: metadata.format().as_str(),
            mime_type: metadata.format().mime_type(),
            width: metadata.dimension().width(),
            height: metadata.dimension().height(),
            size: metadata.size(),
        });
    }

    if output.format() == OutputFormat::Json {
        return output.json(&reports);
    }
    for r in &reports {
        output.print(&format!(
            "{}  {} {}x{} {} bytes",
            r.path.display(),
            r.format,
            r.width,
            r.height,
            r.size
        ))?;
    }
    Ok(())
}
