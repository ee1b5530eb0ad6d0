//! Revision-aware construction and typed views of tag groups
//!
//! The factory is chosen once per document from its revision. It decides
//! which type labels get a typed view and how new groups are laid out
//! (subclass markers and owner tags exist only in the extended schema).

mod builders;
mod entities;
mod objects;
mod records;

pub use builders::GraphicAttribs;
pub use entities::{Arc, Circle, Image, Insert, Line, LwPolyline, Point, Polyline, Text, Underlay};
pub use objects::{Dictionary, Group, ImageDef, LayoutObject, UnderlayDef, UnderlayFormat};
pub use records::{AppId, Block, BlockFlags, BlockRecord, Layer, LayerFlags, LineType, TextStyle};

use std::ops::{Deref, DerefMut};

use crate::database::{EntityDb, TagGroup};
use crate::error::{DxfError, Result};
use crate::types::{DxfVersion, Handle};

/// Tag layout family of a revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schema {
    /// R12 and older: flat groups, no owners, no objects
    Legacy,
    /// R13 and newer: subclass markers, owner handles, OBJECTS section
    Extended,
}

impl Schema {
    pub fn of(version: DxfVersion) -> Self {
        if version.is_legacy() {
            Schema::Legacy
        } else {
            Schema::Extended
        }
    }
}

/// Read access to the group behind a typed view
pub trait TagView {
    fn group(&self) -> &TagGroup;

    fn schema(&self) -> Schema;

    fn dxftype(&self) -> &str {
        self.group().dxftype()
    }

    fn handle(&self) -> Handle {
        self.group().handle().unwrap_or(Handle::NULL)
    }

    /// Owner handle; always null in the legacy schema
    fn owner(&self) -> Handle {
        self.group().owner().unwrap_or(Handle::NULL)
    }
}

/// Write access to the group behind a typed view
pub trait TagViewMut: TagView {
    fn group_mut(&mut self) -> &mut TagGroup;
}

/// Attributes shared by all graphical entities
pub trait GraphicEntity: TagView {
    fn layer(&self) -> &str {
        self.group().get_str(8).unwrap_or("0")
    }

    /// ACI color; 256 is BYLAYER, 0 is BYBLOCK
    fn color(&self) -> i16 {
        self.group().get_int(62).map_or(256, |c| c as i16)
    }

    /// Linetype name; `None` means BYLAYER
    fn linetype(&self) -> Option<&str> {
        self.group().get_str(6)
    }

    fn is_paperspace(&self) -> bool {
        self.group().get_int(67) == Some(1)
    }
}

/// Setters for the shared graphical attributes
pub trait GraphicEntityMut: GraphicEntity + TagViewMut {
    fn set_layer(&mut self, name: &str) {
        self.group_mut().set_str(8, name);
    }

    fn set_color(&mut self, color: i16) {
        let group = self.group_mut();
        if group.contains(62) {
            group.set_int(62, color as i64);
        } else {
            group.insert_before(6, crate::io::dxf::Tag::int(62, color as i64));
        }
    }

    fn set_linetype(&mut self, name: &str) {
        self.group_mut().set_str(6, name);
    }
}

impl<V: GraphicEntity + TagViewMut> GraphicEntityMut for V {}

/// Defines a typed view over a group.
macro_rules! define_view {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name<T> {
            group: T,
            schema: $crate::factory::Schema,
        }

        impl<T> $name<T> {
            pub(crate) fn new(group: T, schema: $crate::factory::Schema) -> Self {
                Self { group, schema }
            }

            pub fn into_inner(self) -> T {
                self.group
            }
        }

        impl<T: std::ops::Deref<Target = $crate::database::TagGroup>> $crate::factory::TagView
            for $name<T>
        {
            fn group(&self) -> &$crate::database::TagGroup {
                &self.group
            }

            fn schema(&self) -> $crate::factory::Schema {
                self.schema
            }
        }

        impl<T: std::ops::DerefMut<Target = $crate::database::TagGroup>>
            $crate::factory::TagViewMut for $name<T>
        {
            fn group_mut(&mut self) -> &mut $crate::database::TagGroup {
                &mut self.group
            }
        }
    };
}

/// Marks views as graphical entities.
macro_rules! graphic_views {
    ($($name:ident),+ $(,)?) => {
        $(
            impl<T: std::ops::Deref<Target = $crate::database::TagGroup>>
                $crate::factory::GraphicEntity for $name<T> {}
        )+
    };
}

pub(crate) use define_view;
pub(crate) use graphic_views;

define_view!(
    /// Any group without a dedicated view; round-trips untouched
    Generic
);

/// A tag group wrapped in the view matching its type label.
#[derive(Debug)]
pub enum Entity<T> {
    Line(Line<T>),
    Point(Point<T>),
    Circle(Circle<T>),
    Arc(Arc<T>),
    Text(Text<T>),
    Insert(Insert<T>),
    Polyline(Polyline<T>),
    LwPolyline(LwPolyline<T>),
    Image(Image<T>),
    Underlay(Underlay<T>),
    Layer(Layer<T>),
    LineType(LineType<T>),
    TextStyle(TextStyle<T>),
    AppId(AppId<T>),
    BlockRecord(BlockRecord<T>),
    Block(Block<T>),
    Dictionary(Dictionary<T>),
    Group(Group<T>),
    LayoutObject(LayoutObject<T>),
    ImageDef(ImageDef<T>),
    UnderlayDef(UnderlayDef<T>),
    Generic(Generic<T>),
}

macro_rules! dispatch {
    ($value:expr, $view:ident => $body:expr) => {
        match $value {
            Entity::Line($view) => $body,
            Entity::Point($view) => $body,
            Entity::Circle($view) => $body,
            Entity::Arc($view) => $body,
            Entity::Text($view) => $body,
            Entity::Insert($view) => $body,
            Entity::Polyline($view) => $body,
            Entity::LwPolyline($view) => $body,
            Entity::Image($view) => $body,
            Entity::Underlay($view) => $body,
            Entity::Layer($view) => $body,
            Entity::LineType($view) => $body,
            Entity::TextStyle($view) => $body,
            Entity::AppId($view) => $body,
            Entity::BlockRecord($view) => $body,
            Entity::Block($view) => $body,
            Entity::Dictionary($view) => $body,
            Entity::Group($view) => $body,
            Entity::LayoutObject($view) => $body,
            Entity::ImageDef($view) => $body,
            Entity::UnderlayDef($view) => $body,
            Entity::Generic($view) => $body,
        }
    };
}

impl<T: Deref<Target = TagGroup>> Entity<T> {
    /// The wrapped group
    pub fn group(&self) -> &TagGroup {
        dispatch!(self, view => view.group())
    }

    pub fn dxftype(&self) -> &str {
        self.group().dxftype()
    }

    pub fn handle(&self) -> Handle {
        self.group().handle().unwrap_or(Handle::NULL)
    }

    pub fn owner(&self) -> Handle {
        self.group().owner().unwrap_or(Handle::NULL)
    }

    /// Shared graphical attributes, for entity variants.
    pub fn as_graphic(&self) -> Option<&dyn GraphicEntity> {
        match self {
            Entity::Line(v) => Some(v as &dyn GraphicEntity),
            Entity::Point(v) => Some(v as &dyn GraphicEntity),
            Entity::Circle(v) => Some(v as &dyn GraphicEntity),
            Entity::Arc(v) => Some(v as &dyn GraphicEntity),
            Entity::Text(v) => Some(v as &dyn GraphicEntity),
            Entity::Insert(v) => Some(v as &dyn GraphicEntity),
            Entity::Polyline(v) => Some(v as &dyn GraphicEntity),
            Entity::LwPolyline(v) => Some(v as &dyn GraphicEntity),
            Entity::Image(v) => Some(v as &dyn GraphicEntity),
            Entity::Underlay(v) => Some(v as &dyn GraphicEntity),
            _ => None,
        }
    }

    /// True for views with no dedicated typed accessors.
    pub fn is_generic(&self) -> bool {
        matches!(self, Entity::Generic(_))
    }
}

impl<T: DerefMut<Target = TagGroup>> Entity<T> {
    pub fn group_mut(&mut self) -> &mut TagGroup {
        dispatch!(self, view => view.group_mut())
    }
}

/// Internal classification of type labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Line,
    Point,
    Circle,
    Arc,
    Text,
    Insert,
    Polyline,
    LwPolyline,
    Image,
    Underlay,
    Layer,
    LineType,
    TextStyle,
    AppId,
    BlockRecord,
    Block,
    Dictionary,
    Group,
    LayoutObject,
    ImageDef,
    UnderlayDef,
    Generic,
}

impl Kind {
    fn of(dxftype: &str) -> Self {
        match dxftype {
            "LINE" => Kind::Line,
            "POINT" => Kind::Point,
            "CIRCLE" => Kind::Circle,
            "ARC" => Kind::Arc,
            "TEXT" => Kind::Text,
            "INSERT" => Kind::Insert,
            "POLYLINE" => Kind::Polyline,
            "LWPOLYLINE" => Kind::LwPolyline,
            "IMAGE" => Kind::Image,
            "PDFUNDERLAY" | "DWFUNDERLAY" | "DGNUNDERLAY" => Kind::Underlay,
            "LAYER" => Kind::Layer,
            "LTYPE" => Kind::LineType,
            "STYLE" => Kind::TextStyle,
            "APPID" => Kind::AppId,
            "BLOCK_RECORD" => Kind::BlockRecord,
            "BLOCK" => Kind::Block,
            "DICTIONARY" => Kind::Dictionary,
            "GROUP" => Kind::Group,
            "LAYOUT" => Kind::LayoutObject,
            "IMAGEDEF" => Kind::ImageDef,
            "PDFDEFINITION" | "DWFDEFINITION" | "DGNDEFINITION" => Kind::UnderlayDef,
            _ => Kind::Generic,
        }
    }

    /// Types that only exist in the extended schema
    fn is_extended_only(self) -> bool {
        matches!(
            self,
            Kind::LwPolyline
                | Kind::Image
                | Kind::Underlay
                | Kind::BlockRecord
                | Kind::Dictionary
                | Kind::Group
                | Kind::LayoutObject
                | Kind::ImageDef
                | Kind::UnderlayDef
        )
    }
}

/// Builds typed views and new groups for one revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityFactory {
    version: DxfVersion,
    schema: Schema,
}

impl EntityFactory {
    pub fn new(version: DxfVersion) -> Self {
        Self {
            version,
            schema: Schema::of(version),
        }
    }

    pub fn version(&self) -> DxfVersion {
        self.version
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn is_legacy(&self) -> bool {
        self.schema == Schema::Legacy
    }

    /// Move to another revision of the same schema.
    pub(crate) fn set_version(&mut self, version: DxfVersion) -> Result<()> {
        if Schema::of(version) != self.schema {
            return Err(DxfError::Structural(format!(
                "cannot switch from {} to {}: different tag layout",
                self.version, version
            )));
        }
        self.version = version;
        Ok(())
    }

    /// Fail with `UnsupportedRevision` on legacy documents.
    pub fn require_extended(&self, feature: &str) -> Result<()> {
        if self.is_legacy() {
            return Err(DxfError::revision(feature, self.version));
        }
        Ok(())
    }

    /// Fail with `UnsupportedRevision` below `minimum`.
    pub fn require(&self, feature: &str, minimum: DxfVersion) -> Result<()> {
        if !self.version.at_least(minimum) {
            return Err(DxfError::revision(feature, self.version));
        }
        Ok(())
    }

    /// True if the type label gets a typed view under this schema.
    pub fn is_supported_type(&self, dxftype: &str) -> bool {
        let kind = Kind::of(dxftype);
        kind != Kind::Generic && !(self.is_legacy() && kind.is_extended_only())
    }

    /// Typed view of the group stored under `handle`.
    pub fn wrap<'a>(&self, db: &'a EntityDb, handle: Handle) -> Result<Entity<&'a TagGroup>> {
        Ok(self.view(db.get(handle)?))
    }

    /// Mutable typed view of the group stored under `handle`.
    pub fn wrap_mut<'a>(
        &self,
        db: &'a mut EntityDb,
        handle: Handle,
    ) -> Result<Entity<&'a mut TagGroup>> {
        Ok(self.view(db.get_mut(handle)?))
    }

    /// Wrap a group in the view for its type label.
    ///
    /// Extended-only labels found in legacy documents wrap as `Generic`.
    pub fn view<T: Deref<Target = TagGroup>>(&self, group: T) -> Entity<T> {
        let mut kind = Kind::of(group.dxftype());
        if self.is_legacy() && kind.is_extended_only() {
            kind = Kind::Generic;
        }
        let s = self.schema;
        match kind {
            Kind::Line => Entity::Line(Line::new(group, s)),
            Kind::Point => Entity::Point(Point::new(group, s)),
            Kind::Circle => Entity::Circle(Circle::new(group, s)),
            Kind::Arc => Entity::Arc(Arc::new(group, s)),
            Kind::Text => Entity::Text(Text::new(group, s)),
            Kind::Insert => Entity::Insert(Insert::new(group, s)),
            Kind::Polyline => Entity::Polyline(Polyline::new(group, s)),
            Kind::LwPolyline => Entity::LwPolyline(LwPolyline::new(group, s)),
            Kind::Image => Entity::Image(Image::new(group, s)),
            Kind::Underlay => Entity::Underlay(Underlay::new(group, s)),
            Kind::Layer => Entity::Layer(Layer::new(group, s)),
            Kind::LineType => Entity::LineType(LineType::new(group, s)),
            Kind::TextStyle => Entity::TextStyle(TextStyle::new(group, s)),
            Kind::AppId => Entity::AppId(AppId::new(group, s)),
            Kind::BlockRecord => Entity::BlockRecord(BlockRecord::new(group, s)),
            Kind::Block => Entity::Block(Block::new(group, s)),
            Kind::Dictionary => Entity::Dictionary(Dictionary::new(group, s)),
            Kind::Group => Entity::Group(Group::new(group, s)),
            Kind::LayoutObject => Entity::LayoutObject(LayoutObject::new(group, s)),
            Kind::ImageDef => Entity::ImageDef(ImageDef::new(group, s)),
            Kind::UnderlayDef => Entity::UnderlayDef(UnderlayDef::new(group, s)),
            Kind::Generic => Entity::Generic(Generic::new(group, s)),
        }
    }
}

/// True for type labels of graphical entities known to the engine.
pub fn is_graphic_type(dxftype: &str) -> bool {
    matches!(
        Kind::of(dxftype),
        Kind::Line
            | Kind::Point
            | Kind::Circle
            | Kind::Arc
            | Kind::Text
            | Kind::Insert
            | Kind::Polyline
            | Kind::LwPolyline
            | Kind::Image
            | Kind::Underlay
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::dxf::Tag;

    fn lwpolyline() -> TagGroup {
        TagGroup::with_tags(
            "LWPOLYLINE",
            [Tag::string(8, "0"), Tag::int(90, 1), Tag::float(10, 0.0), Tag::float(20, 0.0)],
        )
    }

    #[test]
    fn test_wrap_by_type_label() {
        let factory = EntityFactory::new(DxfVersion::AC1015);
        let group = TagGroup::with_tags("LINE", [Tag::string(8, "walls")]);
        let entity = factory.view(&group);
        assert!(matches!(entity, Entity::Line(_)));
        assert_eq!(entity.as_graphic().map(|g| g.layer()), Some("walls"));

        let unknown = TagGroup::new("ACAD_PROXY_ENTITY");
        assert!(factory.view(&unknown).is_generic());
    }

    #[test]
    fn test_extended_types_are_generic_in_legacy_documents() {
        let group = lwpolyline();
        let legacy = EntityFactory::new(DxfVersion::AC1009);
        let extended = EntityFactory::new(DxfVersion::AC1015);
        assert!(legacy.view(&group).is_generic());
        assert!(matches!(extended.view(&group), Entity::LwPolyline(_)));
        assert!(!legacy.is_supported_type("LWPOLYLINE"));
        assert!(legacy.is_supported_type("LINE"));
    }

    #[test]
    fn test_revision_gates() {
        let legacy = EntityFactory::new(DxfVersion::AC1009);
        assert!(matches!(
            legacy.require_extended("groups"),
            Err(DxfError::UnsupportedRevision { .. })
        ));
        let r14 = EntityFactory::new(DxfVersion::AC1014);
        assert!(r14.require("image", DxfVersion::AC1015).is_err());
        assert!(EntityFactory::new(DxfVersion::AC1018)
            .require("image", DxfVersion::AC1015)
            .is_ok());
    }

    #[test]
    fn test_wrap_from_database() {
        let factory = EntityFactory::new(DxfVersion::AC1015);
        let mut db = EntityDb::new();
        let handle = db.add_new(TagGroup::with_tags("POINT", [Tag::string(8, "0")]));
        assert!(matches!(factory.wrap(&db, handle).unwrap(), Entity::Point(_)));
        if let Entity::Point(mut point) = factory.wrap_mut(&mut db, handle).unwrap() {
            point.set_color(1);
        }
        assert_eq!(db.get(handle).unwrap().get_int(62), Some(1));
        assert!(matches!(
            factory.wrap(&db, Handle::new(0xFFFF)),
            Err(DxfError::HandleNotFound(_))
        ));
    }

    #[test]
    fn test_set_version_keeps_schema() {
        let mut factory = EntityFactory::new(DxfVersion::AC1006);
        assert!(factory.set_version(DxfVersion::AC1009).is_ok());
        assert!(factory.set_version(DxfVersion::AC1015).is_err());
    }

    #[test]
    fn test_mutable_wrap() {
        let factory = EntityFactory::new(DxfVersion::AC1015);
        let mut group = TagGroup::with_tags("CIRCLE", [Tag::string(8, "0")]);
        if let Entity::Circle(mut circle) = factory.view(&mut group) {
            circle.set_layer("holes");
            circle.set_radius(2.5);
        } else {
            panic!("expected a circle view");
        }
        assert_eq!(group.get_str(8), Some("holes"));
        assert_eq!(group.get_float(40), Some(2.5));
    }
}
