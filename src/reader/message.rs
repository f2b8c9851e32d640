use std::sync::Arc;

use crate::sections::sect1::Identification;
use crate::sections::sect2::LocalUse;
use crate::sections::sect3::{Grid, Grid0, GridDefinition};
use crate::sections::sect4::{Product, Product0, ProductDefinition};
use crate::sections::sect5::{Data, Data0, DataRepresentationDefinition};
use crate::sections::sect6::BitMap;
use crate::sections::sect7::DataSection;
use crate::sections::{EndSection, Indicator};

/// Location of one section inside the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionInfo {
    pub number: u8,
    /// Bytes from the start of the stream
    pub offset: u64,
    pub length: u32,
}

/// Envelope of one message: where it sits and which sections it holds. No
/// section body is decoded to produce this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInfo {
    /// 0-based message index in the stream
    pub index: usize,
    /// Bytes from the stream start to the `GRIB` magic
    pub offset: u64,
    /// Total message length from Section 0
    pub length: u64,
    pub discipline: u8,
    pub edition: u8,
    /// Sections in file order
    pub sections: Vec<SectionInfo>,
}

/// Innermost repeatable unit: one data field (sections 4-7).
#[derive(Debug, Clone)]
pub struct DataField {
    pub product_def: ProductDefinition,
    pub data_rep: DataRepresentationDefinition,
    pub bitmap: Option<BitMap>,
    pub data: Arc<DataSection>,
}

/// A grid definition and the data fields encoded on it (sections 3-7).
#[derive(Debug, Clone)]
pub struct GridBlock {
    pub grid_def: GridDefinition,
    pub fields: Vec<DataField>,
}

/// Outermost repeatable unit: an optional local-use section and its grid
/// blocks (sections 2-7).
#[derive(Debug, Clone)]
pub struct LocalBlock {
    pub local_use: Option<LocalUse>,
    pub grids: Vec<GridBlock>,
}

/// One fully assembled GRIB2 message. The tree mirrors the on-disk grouping:
/// local blocks contain grid blocks contain data fields.
#[derive(Debug, Clone)]
pub struct Message {
    pub info: MessageInfo,
    pub indicator: Indicator,
    pub identification: Identification,
    pub blocks: Vec<LocalBlock>,
    pub end: EndSection,
}

/// One data field with its full context, flattened out of the nested tree.
/// Sibling flat messages of one source message share the sections above the
/// field level; everything is read-only after construction.
#[derive(Debug, Clone)]
pub struct FlatMessage {
    /// Running index across all flattened fields of the stream
    pub index: usize,
    /// Offset of the enclosing message
    pub offset: u64,
    /// Total length of the enclosing message
    pub length: u64,
    pub discipline: u8,
    pub edition: u8,
    pub indicator: Indicator,
    pub identification: Arc<Identification>,
    pub local_use: Option<Arc<LocalUse>>,
    pub grid_def: Arc<GridDefinition>,
    pub product_def: ProductDefinition,
    pub data_rep: DataRepresentationDefinition,
    pub bitmap: Option<BitMap>,
    pub data: Arc<DataSection>,
    pub end: EndSection,
}

impl Message {
    /// Flatten to one record per data field. The record count is the number
    /// of fields summed over every local and grid block.
    pub fn flatten(&self) -> Vec<FlatMessage> {
        let identification = Arc::new(self.identification.clone());
        let mut flattened = Vec::new();

        for local in &self.blocks {
            let local_use = local.local_use.clone().map(Arc::new);
            for grid in &local.grids {
                let grid_def = Arc::new(grid.grid_def.clone());
                for field in &grid.fields {
                    flattened.push(FlatMessage {
                        index: flattened.len(),
                        offset: self.info.offset,
                        length: self.info.length,
                        discipline: self.info.discipline,
                        edition: self.info.edition,
                        indicator: self.indicator.clone(),
                        identification: identification.clone(),
                        local_use: local_use.clone(),
                        grid_def: grid_def.clone(),
                        product_def: field.product_def.clone(),
                        data_rep: field.data_rep.clone(),
                        bitmap: field.bitmap.clone(),
                        data: field.data.clone(),
                        end: self.end,
                    });
                }
            }
        }

        flattened
    }

    /// Total number of data fields across all blocks.
    pub fn field_count(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(|local| &local.grids)
            .map(|grid| grid.fields.len())
            .sum()
    }
}

impl FlatMessage {
    /// Parsed lat/lon grid, when the grid template is 3.0.
    pub fn grid0(&self) -> Option<&Grid0> {
        match &self.grid_def.grid {
            Grid::Grid0(grid) => Some(grid),
            Grid::Unknown(_) => None,
        }
    }

    /// Parsed product header, when the product template carries the 4.0
    /// fixed prefix.
    pub fn product0(&self) -> Option<&Product0> {
        match &self.product_def.product {
            Product::Product0(product) => Some(product),
            Product::Unknown(_) => None,
        }
    }

    /// Simple-packing header, when the data representation template is 5.0.
    pub fn data0(&self) -> Option<&Data0> {
        match &self.data_rep.data {
            Data::Data0(data) => Some(data),
            _ => None,
        }
    }
}
