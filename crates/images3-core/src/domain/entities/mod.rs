pub mod image;
pub mod image_plant;
pub mod template;

pub use image::{ImageEntity, ImageRecord, ImageSnapshot};
pub use image_plant::{ImagePlantRoot, ImagePlantSnapshot};
pub use template::{TemplateEntity, TemplateSnapshot};
