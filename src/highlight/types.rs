//! Core types for highlight records

use log::warn;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors from highlight loading and viewer setup
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    #[error("highlight list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported page rotation {0} (expected a multiple of 90)")]
    Rotation(i32),

    #[error("invalid page size {width}x{height}")]
    PageSize { width: f64, height: f64 },
}

/// Highlight rectangle in PDF space.
///
/// `x` and `width` are measured from the left edge of the page. `y` and
/// `height` keep the sign convention of the source data: `y` is the
/// negative-signed position of the bottom edge and `height` is negative, so
/// `y + height` is the top edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Location {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub const fn from_array([x, y, width, height]: [f64; 4]) -> Self {
        Self::new(x, y, width, height)
    }

    #[must_use]
    pub const fn as_array(&self) -> [f64; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// All four components are finite numbers
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.as_array().iter().all(|v| v.is_finite())
    }

    /// Left edge
    #[must_use]
    pub fn left(&self) -> f64 {
        self.x
    }

    /// Right edge
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y
    }

    /// Top edge (`height` is negative in source data)
    #[must_use]
    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    /// Parse the `[x, y, width, height]` array form.
    ///
    /// The object form `{x, y, width, height}` is accepted as well. Anything
    /// else (wrong arity, non-numeric or non-finite entries) yields `None`.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Array(items) if items.len() == 4 => {
                let mut out = [0.0; 4];
                for (slot, item) in out.iter_mut().zip(items) {
                    *slot = item.as_f64()?;
                }
                Some(Self::from_array(out)).filter(Self::is_finite)
            }
            serde_json::Value::Object(_) => serde_json::from_value::<Self>(value.clone())
                .ok()
                .filter(Self::is_finite),
            _ => None,
        }
    }
}

/// A highlight as listed in the side panel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HighlightRecord {
    /// Page number (1-indexed); 0 marks an unusable page number
    #[serde(deserialize_with = "deserialize_page")]
    pub page: u32,

    #[serde(default)]
    pub text: String,

    /// Rectangle on the page; `None` means page-level navigation only
    #[serde(
        default,
        deserialize_with = "deserialize_location",
        serialize_with = "serialize_location"
    )]
    pub location: Option<Location>,
}

impl HighlightRecord {
    #[must_use]
    pub fn new(page: u32, text: impl Into<String>, location: Option<Location>) -> Self {
        Self {
            page,
            text: text.into(),
            location,
        }
    }
}

fn deserialize_page<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let page = value.as_u64().and_then(|page| u32::try_from(page).ok());
    if page.is_none() {
        warn!("Ignoring highlight with invalid page number {value}");
    }
    Ok(page.unwrap_or(0))
}

fn deserialize_location<'de, D>(deserializer: D) -> Result<Option<Location>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(value) => {
            let location = Location::from_json(&value);
            if location.is_none() {
                warn!("Ignoring malformed highlight location {value}");
            }
            location
        }
    })
}

fn serialize_location<S>(location: &Option<Location>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match location {
        Some(location) => location.as_array().serialize(serializer),
        None => serializer.serialize_none(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HighlightFile {
    List(Vec<HighlightRecord>),
    Wrapped { highlights: Vec<HighlightRecord> },
}

/// Parse a highlight list, either a bare array or `{ "highlights": [...] }`
pub fn parse_highlights(json: &str) -> Result<Vec<HighlightRecord>, HighlightError> {
    let file: HighlightFile = serde_json::from_str(json)?;
    Ok(match file {
        HighlightFile::List(records) | HighlightFile::Wrapped { highlights: records } => records,
    })
}
