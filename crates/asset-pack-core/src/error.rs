use std::fmt;

use thiserror::Error;

/// A sprite the packer could not fit, reported with its unpadded size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnplacedSprite {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for UnplacedSprite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}x{})", self.id, self.width, self.height)
    }
}

#[derive(Debug, Error)]
pub enum AssetPackError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(
        "Invalid nine-patch on '{id}': insets top={top} bottom={bottom} left={left} right={right} exceed {width}x{height}"
    )]
    InvalidNinePatch {
        id: String,
        top: u32,
        left: u32,
        right: u32,
        bottom: u32,
        width: u32,
        height: u32,
    },
    #[error("Join '{join}' ({x},{y} {w}x{h}) exceeds its parent '{parent}' ({parent_w}x{parent_h})")]
    JoinOutOfBounds {
        join: String,
        parent: String,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        parent_w: u32,
        parent_h: u32,
    },
    #[error("Duplicate name '{name}': declared by {first} and {second}")]
    DuplicateName {
        name: String,
        first: String,
        second: String,
    },
    #[error("Join '{join}' refers to missing parent '{parent}'")]
    DanglingJoin { join: String, parent: String },
    #[error("Failed to pack {} sprite(s): {}", .unplaced.len(), list_unplaced(.unplaced))]
    PackingFailure { unplaced: Vec<UnplacedSprite> },
}

fn list_unplaced(unplaced: &[UnplacedSprite]) -> String {
    unplaced
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, AssetPackError>;
