use crate::error::{GribError, Result};
use crate::reader::message::{DataField, GridBlock, LocalBlock, Message, MessageInfo};
use crate::sections::sect1::Identification;
use crate::sections::sect4::ProductDefinition;
use crate::sections::sect5::DataRepresentationDefinition;
use crate::sections::sect6::BitMap;
use crate::sections::{EndSection, Indicator, Section};

/// Folds a linear section stream into the nested local/grid/field tree.
///
/// The standard lets sections 2-7, 3-7 and 4-7 repeat independently. The
/// assembler keeps one open block per nesting level and closes it when a
/// section of the same or an outer level arrives:
///
/// - Section 2 closes the open grid and local blocks and opens a new local
///   block.
/// - Section 3 closes the open grid block (opening an empty local block if
///   none is open) and opens a new one.
/// - Section 4 opens a data field; Section 7 completes and files it.
///
/// Malformed orderings do not abort: the offending section is dropped and a
/// warning is recorded instead.
#[derive(Default)]
pub struct Assembler {
    indicator: Option<Indicator>,
    identification: Option<Identification>,
    blocks: Vec<LocalBlock>,
    saw_end: bool,
    open_local: Option<LocalBlock>,
    open_grid: Option<GridBlock>,
    open_field: Option<OpenField>,
    warnings: Vec<GribError>,
}

struct OpenField {
    product_def: ProductDefinition,
    data_rep: Option<DataRepresentationDefinition>,
    bitmap: Option<BitMap>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one section to the tree under construction.
    pub fn push(&mut self, section: Section) {
        match section {
            Section::Section0(indicator) => {
                self.discard_open_field();
                self.open_grid = None;
                self.open_local = None;
                self.blocks.clear();
                self.indicator = Some(indicator);
            }
            Section::Section1(identification) => {
                self.identification = Some(identification);
            }
            Section::Section2(local_use) => {
                self.discard_open_field();
                self.close_grid();
                self.close_local();
                self.open_local = Some(LocalBlock {
                    local_use: Some(local_use),
                    grids: Vec::new(),
                });
            }
            Section::Section3(grid_def) => {
                self.discard_open_field();
                self.close_grid();
                if self.open_local.is_none() {
                    self.open_local = Some(LocalBlock {
                        local_use: None,
                        grids: Vec::new(),
                    });
                }
                self.open_grid = Some(GridBlock {
                    grid_def,
                    fields: Vec::new(),
                });
            }
            Section::Section4(product_def) => {
                self.discard_open_field();
                if self.open_grid.is_none() {
                    self.warnings.push(GribError::OutOfOrder(4));
                } else {
                    self.open_field = Some(OpenField {
                        product_def,
                        data_rep: None,
                        bitmap: None,
                    });
                }
            }
            Section::Section5(data_rep) => match &mut self.open_field {
                Some(field) => field.data_rep = Some(data_rep),
                None => self.warnings.push(GribError::OutOfOrder(5)),
            },
            Section::Section6(bitmap) => match &mut self.open_field {
                Some(field) => field.bitmap = Some(bitmap),
                None => self.warnings.push(GribError::OutOfOrder(6)),
            },
            Section::Section7(data) => match self.open_field.take() {
                Some(OpenField {
                    product_def,
                    data_rep: Some(data_rep),
                    bitmap,
                }) => {
                    if let Some(grid) = &mut self.open_grid {
                        grid.fields.push(DataField {
                            product_def,
                            data_rep,
                            bitmap,
                            data,
                        });
                    }
                }
                Some(_) | None => self.warnings.push(GribError::OutOfOrder(7)),
            },
            Section::Section8 => {
                self.discard_open_field();
                self.close_grid();
                self.close_local();
                self.saw_end = true;
            }
        }
    }

    fn discard_open_field(&mut self) {
        if self.open_field.take().is_some() {
            self.warnings.push(GribError::DecodeError(String::from(
                "data field discarded: no Section 7 before its block closed",
            )));
        }
    }

    fn close_grid(&mut self) {
        if let Some(grid) = self.open_grid.take() {
            if let Some(local) = &mut self.open_local {
                local.grids.push(grid);
            }
        }
    }

    fn close_local(&mut self) {
        if let Some(local) = self.open_local.take() {
            self.blocks.push(local);
        }
    }

    /// Soft errors hit while folding: out-of-order sections and discarded
    /// partial data fields.
    pub fn warnings(&self) -> &[GribError] {
        &self.warnings
    }

    /// Finish the message. Still-open blocks are closed as if Section 8 had
    /// arrived; a missing Section 0 or 1 is an error.
    pub fn into_message(mut self, info: MessageInfo) -> Result<Message> {
        if !self.saw_end {
            self.discard_open_field();
            self.close_grid();
            self.close_local();
        }

        Ok(Message {
            info,
            indicator: self
                .indicator
                .ok_or(GribError::DecodeError(String::from("Missing Section 0")))?,
            identification: self
                .identification
                .ok_or(GribError::DecodeError(String::from("Missing Section 1")))?,
            blocks: self.blocks,
            end: EndSection,
        })
    }
}
