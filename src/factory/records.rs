//! Typed views of table records and block definitions

use std::ops::{Deref, DerefMut};

use bitflags::bitflags;

use super::{define_view, Schema};
use crate::database::TagGroup;
use crate::error::{DxfError, Result};
use crate::types::{Handle, Vector3};

bitflags! {
    /// Layer state flags (group code 70)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LayerFlags: i16 {
        /// Frozen in all viewports
        const FROZEN = 1;
        /// Frozen in new viewports
        const FROZEN_IN_NEW_VIEWPORTS = 2;
        /// Locked against editing
        const LOCKED = 4;
    }
}

bitflags! {
    /// Block definition flags (group code 70)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BlockFlags: i16 {
        /// Anonymous block (name generated, e.g. hatch or dimension graphics)
        const ANONYMOUS = 1;
        /// Has non-constant attribute definitions
        const NON_CONSTANT_ATTRIBUTES = 2;
        /// External reference
        const XREF = 4;
        /// External reference overlay
        const XREF_OVERLAY = 8;
        /// Externally dependent
        const EXTERNAL = 16;
        /// Resolved external reference
        const RESOLVED = 32;
        /// Referenced external reference
        const REFERENCED = 64;
    }
}

define_view!(
    /// LAYER table record
    Layer
);
define_view!(
    /// LTYPE table record
    LineType
);
define_view!(
    /// STYLE table record
    TextStyle
);
define_view!(
    /// APPID table record
    AppId
);
define_view!(
    /// BLOCK_RECORD table record (extended schema only)
    BlockRecord
);
define_view!(
    /// BLOCK: head of a block definition
    Block
);

/// Name stored in code 2, shared by all table records.
fn record_name(group: &TagGroup) -> &str {
    group.get_str(2).unwrap_or("")
}

impl<T: Deref<Target = TagGroup>> Layer<T> {
    pub const NAME: i32 = 2;
    pub const FLAGS: i32 = 70;
    pub const COLOR: i32 = 62;
    pub const LINETYPE: i32 = 6;
    pub const PLOT: i32 = 290;
    pub const LINEWEIGHT: i32 = 370;

    pub fn name(&self) -> &str {
        record_name(&self.group)
    }

    pub fn flags(&self) -> LayerFlags {
        let bits = self.group.get_int(Self::FLAGS).unwrap_or(0) as i16;
        LayerFlags::from_bits_truncate(bits)
    }

    /// Color index; a negative stored value means the layer is off
    pub fn color(&self) -> i16 {
        self.group.get_int(Self::COLOR).map_or(7, |c| (c as i16).abs())
    }

    pub fn is_on(&self) -> bool {
        self.group.get_int(Self::COLOR).map_or(true, |c| c >= 0)
    }

    pub fn is_frozen(&self) -> bool {
        self.flags().contains(LayerFlags::FROZEN)
    }

    pub fn is_locked(&self) -> bool {
        self.flags().contains(LayerFlags::LOCKED)
    }

    pub fn linetype(&self) -> &str {
        self.group.get_str(Self::LINETYPE).unwrap_or("CONTINUOUS")
    }

    /// Plot flag; `None` for legacy layers, which have no such attribute
    pub fn plot(&self) -> Option<bool> {
        match self.schema {
            Schema::Legacy => None,
            Schema::Extended => Some(self.group.get_int(Self::PLOT).map_or(true, |v| v != 0)),
        }
    }

    /// Lineweight in 1/100 mm; `None` for legacy layers
    pub fn lineweight(&self) -> Option<i16> {
        match self.schema {
            Schema::Legacy => None,
            Schema::Extended => Some(self.group.get_int(Self::LINEWEIGHT).map_or(-3, |v| v as i16)),
        }
    }
}

impl<T: DerefMut<Target = TagGroup>> Layer<T> {
    fn set_flags(&mut self, flags: LayerFlags) {
        self.group.set_int(Self::FLAGS, flags.bits() as i64);
    }

    pub fn set_color(&mut self, color: i16) {
        let sign = if self.is_on() { 1 } else { -1 };
        self.group.set_int(Self::COLOR, (color.abs() * sign) as i64);
    }

    pub fn set_on(&mut self, on: bool) {
        let color = self.color();
        let value = if on { color } else { -color };
        self.group.set_int(Self::COLOR, value as i64);
    }

    pub fn set_frozen(&mut self, frozen: bool) {
        let mut flags = self.flags();
        flags.set(LayerFlags::FROZEN, frozen);
        self.set_flags(flags);
    }

    pub fn set_locked(&mut self, locked: bool) {
        let mut flags = self.flags();
        flags.set(LayerFlags::LOCKED, locked);
        self.set_flags(flags);
    }

    pub fn set_linetype(&mut self, name: &str) {
        self.group.set_str(Self::LINETYPE, name);
    }

    pub fn set_plot(&mut self, plot: bool) -> Result<()> {
        self.require_extended("layer plot flag")?;
        self.group.set_int(Self::PLOT, plot as i64);
        Ok(())
    }

    pub fn set_lineweight(&mut self, lineweight: i16) -> Result<()> {
        self.require_extended("layer lineweight")?;
        self.group.set_int(Self::LINEWEIGHT, lineweight as i64);
        Ok(())
    }

    fn require_extended(&self, feature: &str) -> Result<()> {
        match self.schema {
            Schema::Legacy => Err(DxfError::revision(feature, crate::types::DxfVersion::LEGACY)),
            Schema::Extended => Ok(()),
        }
    }
}

impl<T: Deref<Target = TagGroup>> LineType<T> {
    pub fn name(&self) -> &str {
        record_name(&self.group)
    }

    pub fn description(&self) -> &str {
        self.group.get_str(3).unwrap_or("")
    }
}

impl<T: DerefMut<Target = TagGroup>> LineType<T> {
    pub fn set_description(&mut self, description: &str) {
        self.group.set_str(3, description);
    }
}

impl<T: Deref<Target = TagGroup>> TextStyle<T> {
    pub fn name(&self) -> &str {
        record_name(&self.group)
    }

    /// Primary font file
    pub fn font(&self) -> &str {
        self.group.get_str(3).unwrap_or("txt")
    }

    /// Fixed height, 0 for variable
    pub fn height(&self) -> f64 {
        self.group.get_float(40).unwrap_or(0.0)
    }
}

impl<T: DerefMut<Target = TagGroup>> TextStyle<T> {
    pub fn set_font(&mut self, font: &str) {
        self.group.set_str(3, font);
    }
}

impl<T: Deref<Target = TagGroup>> AppId<T> {
    pub fn name(&self) -> &str {
        record_name(&self.group)
    }
}

impl<T: Deref<Target = TagGroup>> BlockRecord<T> {
    pub const LAYOUT: i32 = 340;

    pub fn name(&self) -> &str {
        record_name(&self.group)
    }

    /// LAYOUT object of a layout block, null otherwise
    pub fn layout(&self) -> Handle {
        self.group.get_handle(Self::LAYOUT).unwrap_or(Handle::NULL)
    }
}

impl<T: DerefMut<Target = TagGroup>> BlockRecord<T> {
    pub fn set_layout(&mut self, layout: Handle) {
        self.group.set_handle_value(Self::LAYOUT, layout);
    }

    pub fn set_name(&mut self, name: &str) {
        self.group.set_str(2, name);
    }
}

impl<T: Deref<Target = TagGroup>> Block<T> {
    pub const NAME: i32 = 2;
    pub const FLAGS: i32 = 70;
    pub const BASE_POINT: i32 = 10;
    pub const XREF_PATH: i32 = 1;

    pub fn name(&self) -> &str {
        self.group.get_str(Self::NAME).unwrap_or("")
    }

    pub fn flags(&self) -> BlockFlags {
        BlockFlags::from_bits_truncate(self.group.get_int(Self::FLAGS).unwrap_or(0) as i16)
    }

    pub fn base_point(&self) -> Vector3 {
        self.group.point(Self::BASE_POINT).unwrap_or_default()
    }

    pub fn is_xref(&self) -> bool {
        self.flags().intersects(BlockFlags::XREF | BlockFlags::XREF_OVERLAY)
    }

    pub fn xref_path(&self) -> Option<&str> {
        self.group.get_str(Self::XREF_PATH).filter(|s| !s.is_empty())
    }
}

impl<T: DerefMut<Target = TagGroup>> Block<T> {
    /// Rename; code 3 repeats the name
    pub fn set_name(&mut self, name: &str) {
        self.group.set_str(Self::NAME, name);
        if self.group.contains(3) {
            self.group.set_str(3, name);
        }
    }

    pub fn set_base_point(&mut self, p: Vector3) {
        self.group.set_point(Self::BASE_POINT, p);
    }
}
