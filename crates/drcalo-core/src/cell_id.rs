//! Bit-field layout of cell keys
//!
//! A cell key packs several readout fields into consecutive bit ranges,
//! starting at bit 0. The crystal calorimeter uses
//! `system:4,eta:11,phi:11,depth:4`; the layout string is written next to
//! each hit collection so readers can decode keys without the geometry.
//! Layouts are validated when a sensitive volume is registered.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// One named bit range of a cell key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellField {
    pub name: String,
    pub offset: u32,
    pub width: u32,
}

/// Ordered list of bit fields making up a cell key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellIdLayout {
    fields: Vec<CellField>,
}

impl CellIdLayout {
    /// Parse a `name:width,name:width,...` encoding string
    pub fn parse(encoding: &str) -> Result<Self> {
        let mut fields = Vec::new();
        let mut offset = 0u32;

        for part in encoding.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, width) = part
                .split_once(':')
                .ok_or_else(|| Error::InvalidEncoding(encoding.to_string()))?;
            let width: u32 = width
                .trim()
                .parse()
                .map_err(|_| Error::InvalidEncoding(encoding.to_string()))?;
            if width == 0 || offset.checked_add(width).map_or(true, |end| end > 64) {
                return Err(Error::InvalidEncoding(encoding.to_string()));
            }
            fields.push(CellField {
                name: name.trim().to_string(),
                offset,
                width,
            });
            offset += width;
        }

        if fields.is_empty() {
            return Err(Error::InvalidEncoding(encoding.to_string()));
        }
        Ok(Self { fields })
    }

    /// The fields in bit order
    pub fn fields(&self) -> &[CellField] {
        &self.fields
    }

    /// Render back to an encoding string
    pub fn encoding_string(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{}:{}", f.name, f.width))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for CellIdLayout {
    /// The crystal calorimeter layout `system:4,eta:11,phi:11,depth:4`
    fn default() -> Self {
        let mut fields = Vec::with_capacity(4);
        let mut offset = 0;
        for (name, width) in [("system", 4), ("eta", 11), ("phi", 11), ("depth", 4)] {
            fields.push(CellField {
                name: name.to_string(),
                offset,
                width,
            });
            offset += width;
        }
        Self { fields }
    }
}
