//! Application services - orchestrate use cases.
//!
//! Each call runs one unit of work: load or generate a root, run one command
//! through it, save what changed.

pub mod image_plant_service;

pub use image_plant_service::ImagePlantService;
