use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Closed set of content kinds a pin can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinType {
    Image,
    Link,
    Repo,
    Pdf,
    Youtube,
}

impl PinType {
    pub const ALL: [PinType; 5] = [
        PinType::Image,
        PinType::Link,
        PinType::Repo,
        PinType::Pdf,
        PinType::Youtube,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PinType::Image => "image",
            PinType::Link => "link",
            PinType::Repo => "repo",
            PinType::Pdf => "pdf",
            PinType::Youtube => "youtube",
        }
    }

    /// Pin type for an uploaded file's declared content type
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let content_type = content_type.trim().to_ascii_lowercase();
        if content_type.starts_with("image/") {
            Some(PinType::Image)
        } else if content_type == "application/pdf" {
            Some(PinType::Pdf)
        } else {
            None
        }
    }
}

impl fmt::Display for PinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPinType(pub String);

impl fmt::Display for UnknownPinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown pin type '{}'", self.0)
    }
}

impl std::error::Error for UnknownPinType {}

impl FromStr for PinType {
    type Err = UnknownPinType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PinType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| UnknownPinType(s.to_string()))
    }
}

/// A tagged content reference attached to one board.
///
/// `board_id` and `creator_id` never change after creation. The board is a
/// weak reference: a pin may outlive the board it was created on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub id: Uuid,
    pub board_id: Uuid,
    pub pin_type: PinType,
    pub content_url: String,
    pub title: String,
    pub tags: Vec<String>,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pin {
    pub fn new(
        board_id: Uuid,
        creator_id: Uuid,
        pin_type: PinType,
        content_url: String,
        title: String,
        tags: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            board_id,
            pin_type,
            content_url,
            title,
            tags,
            creator_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
