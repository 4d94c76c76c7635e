//! `images3 process`: run inputs through a fresh plant and write renditions.
//!
//! Layout of the output directory:
//!
//! ```text
//! <out>/<input stem>/Master.<ext>
//! <out>/<input stem>/<template>.<ext>
//! <out>/manifest.json            (with --manifest)
//! ```

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::{debug, info, instrument};

use images3_core::{
    domain::{BucketRef, ImageEntity, MASTER_TEMPLATE_NAME, PlantId},
    error::Images3Error,
};

use crate::{
    cli::{GlobalArgs, OutputFormat, ProcessArgs},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Serialize)]
struct Summary {
    plant: String,
    plant_id: String,
    output: PathBuf,
    images: u64,
    bytes: u64,
    inputs: Vec<InputReport>,
}

#[derive(Debug, Serialize)]
struct InputReport {
    input: PathBuf,
    image_id: String,
    renditions: Vec<Rendition>,
}

#[derive(Debug, Serialize)]
struct Rendition {
    template: String,
    version: String,
    path: PathBuf,
    format: &'static str,
    width: u32,
    height: u32,
    size: u64,
}

#[instrument(skip_all, fields(plant = %args.plant, inputs = args.inputs.len()))]
pub fn execute(
    args: ProcessArgs,
    _global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let out_dir = args
        .out
        .clone()
        .unwrap_or_else(|| config.output.directory.clone());
    let bootstrap = config
        .bootstrap
        .resizing_config()
        .map_err(Images3Error::from)?;

    let service = super::plant_service(&config);
    let bucket = BucketRef::new("local", "local", out_dir.display().to_string());
    let plant = service.create_plant(&args.plant, bucket, bootstrap)?;
    let plant_id = plant.id().clone();

    for spec in &args.templates {
        service.add_template(&plant_id, &spec.name, spec.config.clone(), true)?;
        debug!(template = %spec, "Template added");
    }

    std::fs::create_dir_all(&out_dir)
        .with_cli_context(|| format!("Failed to create '{}'", out_dir.display()))?;

    let bar = output.progress(args.inputs.len() as u64);
    let mut used_dirs = HashSet::new();
    let mut inputs = Vec::with_capacity(args.inputs.len());

    for input in &args.inputs {
        bar.set_message(input.display().to_string());
        let content = super::read_content(input)?;
        let original = service.upload_image(&plant_id, content)?;

        let dir = out_dir.join(rendition_dir(input, &original, &mut used_dirs));
        std::fs::create_dir_all(&dir)
            .with_cli_context(|| format!("Failed to create '{}'", dir.display()))?;

        let mut renditions = vec![write_rendition(&dir, MASTER_TEMPLATE_NAME, &original)?];
        for spec in &args.templates {
            let derived =
                service.derive_image(&plant_id, original.id().image_id(), &spec.name)?;
            renditions.push(write_rendition(&dir, &spec.name, &derived)?);
        }

        inputs.push(InputReport {
            input: input.clone(),
            image_id: original.id().image_id().to_string(),
            renditions,
        });
        bar.inc(1);
    }
    bar.finish_and_clear();

    let root = service.load_plant(&plant_id)?;
    let summary = Summary {
        plant: root.name().to_string(),
        plant_id: plant_id.to_string(),
        output: out_dir.clone(),
        images: root.count_images(None)?,
        bytes: root.size_of_images(None)?,
        inputs,
    };

    if args.manifest {
        write_manifest(&out_dir, &summary)?;
    }

    info!(images = summary.images, bytes = summary.bytes, "Processing finished");
    report(&summary, &plant_id, args.manifest, &output)
}

/// Directory for one input's renditions: its file stem, made unique.
fn rendition_dir(input: &Path, original: &ImageEntity, used: &mut HashSet<String>) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| original.id().image_id().to_string());
    if used.insert(stem.clone()) {
        return stem;
    }
    let unique = format!("{stem}-{}", original.id().image_id());
    used.insert(unique.clone());
    unique
}

fn write_rendition(dir: &Path, template: &str, image: &ImageEntity) -> CliResult<Rendition> {
    let metadata = image.metadata();
    let content = image.content().ok_or_else(|| Images3Error::Internal {
        message: format!("content of image '{}' was not retained", image.id()),
    })?;
    let path = dir.join(format!("{template}.{}", metadata.format().extension()));
    std::fs::write(&path, content.as_bytes())
        .with_cli_context(|| format!("Failed to write '{}'", path.display()))?;
    debug!(path = %path.display(), version = %image.version(), "Rendition written");

    Ok(Rendition {
        template: template.to_string(),
        version: image.version().to_string(),
        path,
        format: metadata.format().as_str(),
        width: metadata.dimension().width(),
        height: metadata.dimension().height(),
        size: metadata.size(),
    })
}

fn write_manifest(out_dir: &Path, summary: &Summary) -> CliResult<()> {
    let path = out_dir.join(MANIFEST_FILE);
    let text = serde_json::to_string_pretty(summary).map_err(|e| CliError::Serialization {
        what: "manifest",
        source: Box::new(e),
    })?;
    std::fs::write(&path, text)
        .with_cli_context(|| format!("Failed to write '{}'", path.display()))
}

fn report(
    summary: &Summary,
    plant_id: &PlantId,
    manifest: bool,
    output: &OutputManager,
) -> CliResult<()> {
    if output.format() == OutputFormat::Json {
        return output.json(summary);
    }

    output.header(&format!("Plant {} ({plant_id})", summary.plant))?;
    for input in &summary.inputs {
        output.print(&format!("  {}", input.input.display()))?;
        for r in &input.renditions {
            output.print(&format!(
                "    {:<12} {:>5}x{:<5} {:>9} bytes  {}",
                r.template,
                r.width,
                r.height,
                r.size,
                r.path.display()
            ))?;
        }
    }
    output.success(&format!(
        "{} images, {} bytes written to {}",
        summary.images,
        summary.bytes,
        summary.output.display()
    ))?;
    if manifest {
        output.info(&format!(
            "Manifest: {}",
            summary.output.join(MANIFEST_FILE).display()
        ))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::TemplateSpec;
    use image::{DynamicImage, ImageFormat as Codec, Rgb, RgbImage};
    use std::io::Cursor;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([1, 2, 3])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, Codec::Png).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, buf.into_inner()).unwrap();
        path
    }

    fn quiet_output() -> OutputManager {
        let global = quiet_global();
        OutputManager::new(&global, &AppConfig::default())
    }

    fn quiet_global() -> GlobalArgs {
        GlobalArgs {
            verbose: 0,
            quiet: true,
            no_color: true,
            config: None,
            output_format: OutputFormat::Plain,
        }
    }

    #[test]
    fn renditions_land_next_to_each_other() {
        let tmp = tempfile::tempdir().unwrap();
        let input = write_png(tmp.path(), "photo.png", 300, 150);
        let out = tmp.path().join("out");

        let args = ProcessArgs {
            inputs: vec![input],
            plant: "Test".into(),
            templates: vec!["Thumb=32x32".parse::<TemplateSpec>().unwrap()],
            out: Some(out.clone()),
            manifest: true,
        };
        execute(args, quiet_global(), AppConfig::default(), quiet_output()).unwrap();

        assert!(out.join("photo").join("Master.png").is_file());
        assert!(out.join("photo").join("Thumb.png").is_file());

        let manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join(MANIFEST_FILE)).unwrap())
                .unwrap();
        assert_eq!(manifest["images"], 2);
        let thumb = &manifest["inputs"][0]["renditions"][1];
        assert_eq!(thumb["template"], "Thumb");
        assert_eq!(thumb["width"], 32);
        assert_eq!(thumb["height"], 32);
    }

    #[test]
    fn clashing_stems_get_distinct_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        let out = tmp.path().join("out");

        let args = ProcessArgs {
            inputs: vec![write_png(&a, "x.png", 8, 8), write_png(&b, "x.png", 8, 8)],
            plant: "Test".into(),
            templates: vec![],
            out: Some(out.clone()),
            manifest: false,
        };
        execute(args, quiet_global(), AppConfig::default(), quiet_output()).unwrap();

        let dirs = std::fs::read_dir(&out).unwrap().count();
        assert_eq!(dirs, 2);
    }

    #[test]
    fn master_is_not_a_valid_extra_template() {
        let tmp = tempfile::tempdir().unwrap();
        let args = ProcessArgs {
            inputs: vec![write_png(tmp.path(), "p.png", 8, 8)],
            plant: "Test".into(),
            templates: vec!["Master=8x8".parse().unwrap()],
            out: Some(tmp.path().join("out")),
            manifest: false,
        };
        let err = execute(args, quiet_global(), AppConfig::default(), quiet_output())
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
