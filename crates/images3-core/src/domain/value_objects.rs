//! Value objects: identities, resizing configuration, image metadata.
//!
//! Value objects are:
//! - Immutable (no setters)
//! - Compared by value (derive PartialEq, Eq, Hash where sensible)
//! - Self-validating (constructors return `Result` where a value can be wrong)

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;

// ============================================================================
// Identities
// ============================================================================

/// Identity of an image plant. Allocated by [`ImagePlantAccess`].
///
/// [`ImagePlantAccess`]: crate::application::ports::ImagePlantAccess
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlantId(String);

impl PlantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlantId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Template identity: the owning plant plus the template name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId {
    plant_id: PlantId,
    name: String,
}

impl TemplateId {
    pub fn new(plant_id: PlantId, name: impl Into<String>) -> Self {
        Self {
            plant_id,
            name: name.into(),
        }
    }

    pub fn plant_id(&self) -> &PlantId {
        &self.plant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.plant_id, self.name)
    }
}

/// Image identity: the owning plant plus an allocated image id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId {
    plant_id: PlantId,
    image_id: String,
}

impl ImageId {
    pub fn new(plant_id: PlantId, image_id: impl Into<String>) -> Self {
        Self {
            plant_id,
            image_id: image_id.into(),
        }
    }

    pub fn plant_id(&self) -> &PlantId {
        &self.plant_id
    }

    pub fn image_id(&self) -> &str {
        &self.image_id
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.plant_id, self.image_id)
    }
}

/// Identifies one in-memory root instance of an aggregate.
///
/// Every generated or reconstituted root mints a fresh token; entities carry
/// the token of the root that produced them. Two roots over the same plant
/// therefore never share entities, and the check survives serialisation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateRef {
    plant_id: PlantId,
    unit_of_work: Uuid,
}

impl AggregateRef {
    pub fn mint(plant_id: PlantId) -> Self {
        Self {
            plant_id,
            unit_of_work: Uuid::new_v4(),
        }
    }

    pub fn plant_id(&self) -> &PlantId {
        &self.plant_id
    }

    pub fn unit_of_work(&self) -> Uuid {
        self.unit_of_work
    }
}

impl fmt::Display for AggregateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.plant_id, self.unit_of_work)
    }
}

// ============================================================================
// Resizing
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResizingUnit {
    Pixel,
    Percent,
}

impl ResizingUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pixel => "PIXEL",
            Self::Percent => "PERCENT",
        }
    }
}

impl fmt::Display for ResizingUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResizingUnit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pixel" | "px" => Ok(Self::Pixel),
            "percent" | "%" => Ok(Self::Percent),
            other => Err(DomainError::InvalidResizingConfig(format!(
                "unknown unit '{}'",
                other
            ))),
        }
    }
}

/// How a template resizes images.
///
/// With `keep_proportions` the image is fitted inside `width x height`;
/// without it the image is stretched to exactly that box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResizingConfig {
    unit: ResizingUnit,
    width: u32,
    height: u32,
    keep_proportions: bool,
}

impl ResizingConfig {
    pub fn new(
        unit: ResizingUnit,
        width: u32,
        height: u32,
        keep_proportions: bool,
    ) -> Result<Self, DomainError> {
        if width == 0 || height == 0 {
            return Err(DomainError::InvalidResizingConfig(format!(
                "{}x{} has a zero side",
                width, height
            )));
        }
        Ok(Self {
            unit,
            width,
            height,
            keep_proportions,
        })
    }

    pub fn pixels(width: u32, height: u32, keep_proportions: bool) -> Result<Self, DomainError> {
        Self::new(ResizingUnit::Pixel, width, height, keep_proportions)
    }

    pub fn unit(&self) -> ResizingUnit {
        self.unit
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn keep_proportions(&self) -> bool {
        self.keep_proportions
    }

    /// Target box in pixels for an image of the given dimension.
    ///
    /// Percent sizes are rounded and never drop below one pixel.
    pub fn to_pixels(&self, source: ImageDimension) -> ImageDimension {
        match self.unit {
            ResizingUnit::Pixel => ImageDimension::new(self.width, self.height),
            ResizingUnit::Percent => ImageDimension::new(
                percent_of(source.width(), self.width),
                percent_of(source.height(), self.height),
            ),
        }
    }
}

fn percent_of(side: u32, percent: u32) -> u32 {
    let scaled = (u64::from(side) * u64::from(percent) + 50) / 100;
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

impl fmt::Display for ResizingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.unit {
            ResizingUnit::Pixel => "px",
            ResizingUnit::Percent => "%",
        };
        write!(f, "{}x{}{}", self.width, self.height, suffix)?;
        if self.keep_proportions {
            f.write_str(" (keep proportions)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Image description
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Bmp,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 3] = [Self::Jpeg, Self::Png, Self::Bmp];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Bmp => "BMP",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Bmp => "bmp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Bmp => "image/bmp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageDimension {
    width: u32,
    height: u32,
}

impl ImageDimension {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl fmt::Display for ImageDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageMetadata {
    dimension: ImageDimension,
    format: ImageFormat,
    size: u64,
}

impl ImageMetadata {
    pub fn new(dimension: ImageDimension, format: ImageFormat, size: u64) -> Self {
        Self {
            dimension,
            format,
            size,
        }
    }

    pub fn dimension(&self) -> ImageDimension {
        self.dimension
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Size of the encoded content in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

// ============================================================================
// External references
// ============================================================================

/// Object-storage bucket an image plant writes to. Opaque to the core.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketRef {
    access_key: String,
    secret_key: String,
    name: String,
}

impl BucketRef {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            name: name.into(),
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for BucketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketRef")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

/// Encoded image bytes. Cloning shares the buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageContent(Arc<[u8]>);

impl ImageContent {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for ImageContent {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

impl From<&[u8]> for ImageContent {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }
}

impl AsRef<[u8]> for ImageContent {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ImageContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageContent({} bytes)", self.0.len())
    }
}
