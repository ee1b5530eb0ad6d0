//! Construction of new tag groups in the layout of the document's schema
//!
//! Builders return groups without handle and owner; the caller registers
//! them in the database and links them.

use super::{EntityFactory, Schema, UnderlayFormat};
use crate::database::TagGroup;
use crate::error::{DxfError, Result};
use crate::io::dxf::Tag;
use crate::types::{DxfVersion, Handle, Vector2, Vector3};

/// Layer, color and linetype of a new graphical entity
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicAttribs {
    pub layer: String,
    /// ACI color, `None` for BYLAYER
    pub color: Option<i16>,
    /// Linetype name, `None` for BYLAYER
    pub linetype: Option<String>,
}

impl Default for GraphicAttribs {
    fn default() -> Self {
        Self {
            layer: "0".to_string(),
            color: None,
            linetype: None,
        }
    }
}

impl GraphicAttribs {
    pub fn on_layer(layer: &str) -> Self {
        Self {
            layer: layer.to_string(),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: i16) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_linetype(mut self, linetype: &str) -> Self {
        self.linetype = Some(linetype.to_string());
        self
    }

    fn tags(&self) -> Vec<Tag> {
        let mut tags = vec![Tag::string(8, self.layer.as_str())];
        if let Some(linetype) = &self.linetype {
            tags.push(Tag::string(6, linetype.as_str()));
        }
        if let Some(color) = self.color {
            tags.push(Tag::int(62, color as i64));
        }
        tags
    }
}

/// Subclass markers of the symbol table records, by table name
fn record_subclass(table: &str) -> Option<&'static str> {
    let subclass = match table {
        "VPORT" => "AcDbViewportTableRecord",
        "LTYPE" => "AcDbLinetypeTableRecord",
        "LAYER" => "AcDbLayerTableRecord",
        "STYLE" => "AcDbTextStyleTableRecord",
        "VIEW" => "AcDbViewTableRecord",
        "UCS" => "AcDbUCSTableRecord",
        "APPID" => "AcDbRegAppTableRecord",
        "DIMSTYLE" => "AcDbDimStyleTableRecord",
        "BLOCK_RECORD" => "AcDbBlockTableRecord",
        _ => return None,
    };
    Some(subclass)
}

impl EntityFactory {
    fn extended(&self) -> bool {
        self.schema() == Schema::Extended
    }

    /// Graphical entity: common attributes, then the subclass bodies.
    fn graphic(
        &self,
        dxftype: &str,
        attribs: &GraphicAttribs,
        body: &[(&str, Vec<Tag>)],
    ) -> TagGroup {
        let mut group = TagGroup::new(dxftype);
        if self.extended() {
            group.push(Tag::subclass("AcDbEntity"));
        }
        group.extend(attribs.tags());
        for (subclass, tags) in body {
            if self.extended() && !subclass.is_empty() {
                group.push(Tag::subclass(subclass));
            }
            group.extend(tags.iter().cloned());
        }
        group
    }

    pub fn new_line(&self, start: Vector3, end: Vector3, attribs: &GraphicAttribs) -> TagGroup {
        let mut tags = Tag::point(10, start).to_vec();
        tags.extend(Tag::point(11, end));
        self.graphic("LINE", attribs, &[("AcDbLine", tags)])
    }

    pub fn new_point(&self, location: Vector3, attribs: &GraphicAttribs) -> TagGroup {
        self.graphic("POINT", attribs, &[("AcDbPoint", Tag::point(10, location).to_vec())])
    }

    pub fn new_circle(&self, center: Vector3, radius: f64, attribs: &GraphicAttribs) -> TagGroup {
        let mut tags = Tag::point(10, center).to_vec();
        tags.push(Tag::float(40, radius));
        self.graphic("CIRCLE", attribs, &[("AcDbCircle", tags)])
    }

    /// Arc; angles in degrees
    pub fn new_arc(
        &self,
        center: Vector3,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        attribs: &GraphicAttribs,
    ) -> TagGroup {
        let mut circle = Tag::point(10, center).to_vec();
        circle.push(Tag::float(40, radius));
        let angles = vec![Tag::float(50, start_angle), Tag::float(51, end_angle)];
        self.graphic("ARC", attribs, &[("AcDbCircle", circle), ("AcDbArc", angles)])
    }

    pub fn new_text(
        &self,
        text: &str,
        insert: Vector3,
        height: f64,
        attribs: &GraphicAttribs,
    ) -> TagGroup {
        let mut tags = Tag::point(10, insert).to_vec();
        tags.push(Tag::float(40, height));
        tags.push(Tag::string(1, text));
        tags.push(Tag::string(7, "STANDARD"));
        // the second AcDbText subclass holds alignment data, empty by default
        self.graphic("TEXT", attribs, &[("AcDbText", tags), ("AcDbText", Vec::new())])
    }

    /// Block reference to the block `name`
    pub fn new_insert(&self, name: &str, insert: Vector3, attribs: &GraphicAttribs) -> TagGroup {
        let mut tags = vec![Tag::string(2, name)];
        tags.extend(Tag::point(10, insert));
        self.graphic("INSERT", attribs, &[("AcDbBlockReference", tags)])
    }

    /// Two dimensional POLYLINE with VERTEX and SEQEND followers.
    pub fn new_polyline2d(
        &self,
        points: &[Vector2],
        closed: bool,
        attribs: &GraphicAttribs,
    ) -> (TagGroup, Vec<TagGroup>) {
        let mut head = vec![Tag::int(66, 1)];
        head.extend(Tag::point(10, Vector3::ZERO));
        head.push(Tag::int(70, closed as i64));
        let polyline = self.graphic("POLYLINE", attribs, &[("AcDb2dPolyline", head)]);

        let follower_attribs = GraphicAttribs::on_layer(&attribs.layer);
        let mut followers: Vec<TagGroup> = points
            .iter()
            .map(|p| {
                self.graphic(
                    "VERTEX",
                    &follower_attribs,
                    &[
                        ("AcDbVertex", Vec::new()),
                        ("AcDb2dVertex", Tag::point(10, Vector3::from(*p)).to_vec()),
                    ],
                )
            })
            .collect();
        followers.push(self.graphic("SEQEND", &follower_attribs, &[]));
        (polyline, followers)
    }

    pub fn new_lwpolyline(
        &self,
        points: &[Vector2],
        closed: bool,
        attribs: &GraphicAttribs,
    ) -> Result<TagGroup> {
        self.require_extended("LWPOLYLINE")?;
        let mut tags = vec![Tag::int(90, points.len() as i64), Tag::int(70, closed as i64)];
        for p in points {
            tags.push(Tag::float(10, p.x));
            tags.push(Tag::float(20, p.y));
        }
        Ok(self.graphic("LWPOLYLINE", attribs, &[("AcDbPolyline", tags)]))
    }

    /// Raster image of `size` drawing units placed at `insert`.
    pub fn new_image(
        &self,
        image_def: Handle,
        insert: Vector3,
        size: Vector2,
        size_in_pixel: Vector2,
        attribs: &GraphicAttribs,
    ) -> Result<TagGroup> {
        self.require("IMAGE", DxfVersion::AC1015)?;
        let pixel_x = if size_in_pixel.x > 0.0 { size.x / size_in_pixel.x } else { 1.0 };
        let pixel_y = if size_in_pixel.y > 0.0 { size.y / size_in_pixel.y } else { 1.0 };
        let mut tags = vec![Tag::int(90, 0)];
        tags.extend(Tag::point(10, insert));
        tags.extend(Tag::point(11, Vector3::new(pixel_x, 0.0, 0.0)));
        tags.extend(Tag::point(12, Vector3::new(0.0, pixel_y, 0.0)));
        tags.push(Tag::float(13, size_in_pixel.x));
        tags.push(Tag::float(23, size_in_pixel.y));
        tags.push(Tag::handle(340, image_def));
        tags.push(Tag::int(70, 3));
        tags.push(Tag::int(280, 0));
        tags.push(Tag::int(281, 50));
        tags.push(Tag::int(282, 50));
        tags.push(Tag::int(283, 0));
        Ok(self.graphic("IMAGE", attribs, &[("AcDbRasterImage", tags)]))
    }

    pub fn new_underlay(
        &self,
        format: UnderlayFormat,
        underlay_def: Handle,
        insert: Vector3,
        scale: f64,
        attribs: &GraphicAttribs,
    ) -> Result<TagGroup> {
        self.require(format.entity_type(), DxfVersion::AC1015)?;
        let mut tags = vec![Tag::handle(340, underlay_def)];
        tags.extend(Tag::point(10, insert));
        tags.push(Tag::float(41, scale));
        tags.push(Tag::float(42, scale));
        tags.push(Tag::float(43, scale));
        tags.push(Tag::float(50, 0.0));
        tags.push(Tag::int(280, 2));
        Ok(self.graphic(
            format.entity_type(),
            attribs,
            &[("AcDbUnderlayReference", tags)],
        ))
    }

    /// `TABLE` head of the table `name`
    pub fn new_table_head(&self, name: &str) -> TagGroup {
        let mut group = TagGroup::with_tags("TABLE", [Tag::string(2, name)]);
        if self.extended() {
            group.push(Tag::handle(330, Handle::NULL));
            group.push(Tag::subclass("AcDbSymbolTable"));
        }
        group.push(Tag::int(70, 0));
        group
    }

    /// Table record of `table` (e.g. `LAYER`) with default attributes.
    pub fn new_table_record(&self, table: &str, name: &str) -> Result<TagGroup> {
        if table == "BLOCK_RECORD" {
            return self.new_block_record(name);
        }
        let subclass = record_subclass(table).ok_or_else(|| {
            DxfError::InvalidOperation(format!("unknown table '{}'", table))
        })?;
        let mut group = TagGroup::new(table);
        if self.extended() {
            group.push(Tag::subclass("AcDbSymbolTableRecord"));
            group.push(Tag::subclass(subclass));
        }
        group.push(Tag::string(2, name));
        group.push(Tag::int(70, 0));
        match table {
            "LAYER" => {
                group.push(Tag::int(62, 7));
                group.push(Tag::string(6, "CONTINUOUS"));
                if self.extended() {
                    let plot = !name.eq_ignore_ascii_case("Defpoints");
                    group.push(Tag::int(290, plot as i64));
                    group.push(Tag::int(370, -3));
                }
            }
            "LTYPE" => {
                let description = if name.eq_ignore_ascii_case("CONTINUOUS") {
                    "Solid line"
                } else {
                    ""
                };
                group.push(Tag::string(3, description));
                group.push(Tag::int(72, 65));
                group.push(Tag::int(73, 0));
                group.push(Tag::float(40, 0.0));
            }
            "STYLE" => {
                group.push(Tag::float(40, 0.0));
                group.push(Tag::float(41, 1.0));
                group.push(Tag::float(50, 0.0));
                group.push(Tag::int(71, 0));
                group.push(Tag::float(42, 2.5));
                group.push(Tag::string(3, "txt"));
                group.push(Tag::string(4, ""));
            }
            _ => {}
        }
        Ok(group)
    }

    pub fn new_block_record(&self, name: &str) -> Result<TagGroup> {
        self.require_extended("BLOCK_RECORD")?;
        Ok(TagGroup::with_tags(
            "BLOCK_RECORD",
            [
                Tag::subclass("AcDbSymbolTableRecord"),
                Tag::subclass("AcDbBlockTableRecord"),
                Tag::string(2, name),
                Tag::handle(340, Handle::NULL),
            ],
        ))
    }

    /// `BLOCK` head; `paperspace` marks layout blocks of paper space.
    pub fn new_block(&self, name: &str, base_point: Vector3, flags: i16, paperspace: bool) -> TagGroup {
        let mut group = TagGroup::new("BLOCK");
        if self.extended() {
            group.push(Tag::subclass("AcDbEntity"));
            if paperspace {
                group.push(Tag::int(67, 1));
            }
        }
        group.push(Tag::string(8, "0"));
        if self.extended() {
            group.push(Tag::subclass("AcDbBlockBegin"));
        }
        group.push(Tag::string(2, name));
        group.push(Tag::int(70, flags as i64));
        group.extend(Tag::point(10, base_point));
        group.push(Tag::string(3, name));
        group.push(Tag::string(1, ""));
        group
    }

    pub fn new_endblk(&self, paperspace: bool) -> TagGroup {
        let mut group = TagGroup::new("ENDBLK");
        if self.extended() {
            group.push(Tag::subclass("AcDbEntity"));
            if paperspace {
                group.push(Tag::int(67, 1));
            }
        }
        group.push(Tag::string(8, "0"));
        if self.extended() {
            group.push(Tag::subclass("AcDbBlockEnd"));
        }
        group
    }

    /// Empty dictionary; `hard_owner` marks entries as owned by it.
    pub fn new_dictionary(&self, hard_owner: bool) -> Result<TagGroup> {
        self.require_extended("DICTIONARY")?;
        Ok(TagGroup::with_tags(
            "DICTIONARY",
            [
                Tag::subclass("AcDbDictionary"),
                Tag::int(280, hard_owner as i64),
                Tag::int(281, 1),
            ],
        ))
    }

    pub fn new_group(&self, description: &str, unnamed: bool, selectable: bool) -> Result<TagGroup> {
        self.require_extended("GROUP")?;
        Ok(TagGroup::with_tags(
            "GROUP",
            [
                Tag::subclass("AcDbGroup"),
                Tag::string(300, description),
                Tag::int(70, unnamed as i64),
                Tag::int(71, selectable as i64),
            ],
        ))
    }

    /// LAYOUT object for the block record `block_record`
    pub fn new_layout_object(&self, name: &str, tab_order: i64, block_record: Handle) -> Result<TagGroup> {
        self.require_extended("LAYOUT")?;
        let mut group = TagGroup::with_tags(
            "LAYOUT",
            [
                Tag::subclass("AcDbPlotSettings"),
                Tag::string(1, ""),
                Tag::string(2, "none_device"),
                Tag::string(4, ""),
                Tag::string(6, ""),
                Tag::float(40, 0.0),
                Tag::float(41, 0.0),
                Tag::float(42, 0.0),
                Tag::float(43, 0.0),
                Tag::int(70, 688),
                Tag::int(72, 0),
                Tag::subclass("AcDbLayout"),
                Tag::string(1, name),
                Tag::int(70, 1),
                Tag::int(71, tab_order),
            ],
        );
        group.extend(Tag::point(10, Vector3::ZERO).into_iter().take(2));
        group.extend(Tag::point(11, Vector3::new(420.0, 297.0, 0.0)).into_iter().take(2));
        group.push(Tag::handle(330, block_record));
        Ok(group)
    }

    pub fn new_image_def(&self, filename: &str, size_in_pixel: Vector2) -> Result<TagGroup> {
        self.require("IMAGEDEF", DxfVersion::AC1015)?;
        Ok(TagGroup::with_tags(
            "IMAGEDEF",
            [
                Tag::subclass("AcDbRasterImageDef"),
                Tag::int(90, 0),
                Tag::string(1, filename),
                Tag::float(10, size_in_pixel.x),
                Tag::float(20, size_in_pixel.y),
                Tag::float(11, 1.0),
                Tag::float(21, 1.0),
                Tag::int(280, 1),
                Tag::int(281, 0),
            ],
        ))
    }

    pub fn new_underlay_def(&self, format: UnderlayFormat, filename: &str, name: &str) -> Result<TagGroup> {
        self.require(format.definition_type(), DxfVersion::AC1015)?;
        Ok(TagGroup::with_tags(
            format.definition_type(),
            [
                Tag::subclass("AcDbUnderlayDefinition"),
                Tag::string(1, filename),
                Tag::string(2, name),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{Entity, GraphicEntity};

    #[test]
    fn test_legacy_line_has_no_subclass_markers() {
        let factory = EntityFactory::new(DxfVersion::AC1009);
        let line = factory.new_line(
            Vector3::ZERO,
            Vector3::new(1.0, 1.0, 0.0),
            &GraphicAttribs::on_layer("walls").with_color(1),
        );
        assert!(!line.has_subclass_markers());
        assert_eq!(line.get_str(8), Some("walls"));
        assert_eq!(line.point(11), Some(Vector3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn test_extended_line_layout() {
        let factory = EntityFactory::new(DxfVersion::AC1015);
        let line = factory.new_line(Vector3::ZERO, Vector3::new(2.0, 0.0, 0.0), &GraphicAttribs::default());
        assert_eq!(line.subclass("AcDbEntity").map(|t| t.len()), Some(1));
        match factory.view(&line) {
            Entity::Line(view) => {
                assert_eq!(view.layer(), "0");
                assert_eq!(view.end(), Vector3::new(2.0, 0.0, 0.0));
            }
            _ => panic!("expected a line view"),
        }
    }

    #[test]
    fn test_extended_only_builders_fail_on_legacy() {
        let factory = EntityFactory::new(DxfVersion::AC1009);
        let attribs = GraphicAttribs::default();
        for result in [
            factory.new_lwpolyline(&[Vector2::ZERO], false, &attribs).map(|_| ()),
            factory.new_block_record("*Model_Space").map(|_| ()),
            factory.new_dictionary(false).map(|_| ()),
            factory.new_group("", true, true).map(|_| ()),
            factory.new_image_def("a.png", Vector2::new(10.0, 10.0)).map(|_| ()),
        ] {
            assert!(matches!(result, Err(DxfError::UnsupportedRevision { .. })));
        }
        assert!(EntityFactory::new(DxfVersion::AC1014)
            .new_image_def("a.png", Vector2::new(1.0, 1.0))
            .is_err());
    }

    #[test]
    fn test_polyline_followers() {
        let factory = EntityFactory::new(DxfVersion::AC1009);
        let points = [Vector2::ZERO, Vector2::new(1.0, 0.0), Vector2::new(1.0, 1.0)];
        let (polyline, followers) = factory.new_polyline2d(&points, true, &GraphicAttribs::default());
        assert_eq!(polyline.get_int(66), Some(1));
        assert_eq!(polyline.get_int(70), Some(1));
        assert_eq!(followers.len(), 4);
        assert_eq!(followers.last().map(|g| g.dxftype()), Some("SEQEND"));
    }

    #[test]
    fn test_table_records() {
        let legacy = EntityFactory::new(DxfVersion::AC1009);
        let layer = legacy.new_table_record("LAYER", "0").unwrap();
        assert!(!layer.contains(290));
        assert!(legacy.new_table_record("BLOCK_RECORD", "X").is_err());
        assert!(legacy.new_table_record("NOPE", "X").is_err());

        let extended = EntityFactory::new(DxfVersion::AC1015);
        let layer = extended.new_table_record("LAYER", "Defpoints").unwrap();
        assert_eq!(layer.get_int(290), Some(0));
        assert!(layer.subclass("AcDbLayerTableRecord").is_some());
    }
}
