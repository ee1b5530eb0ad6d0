//! Typed views of graphical entities

use std::ops::{Deref, DerefMut};

use super::{define_view, graphic_views};
use crate::database::TagGroup;
use crate::io::dxf::Tag;
use crate::types::{Handle, Vector2, Vector3};

define_view!(
    /// LINE: straight segment
    Line
);
define_view!(
    /// POINT
    Point
);
define_view!(
    /// CIRCLE
    Circle
);
define_view!(
    /// ARC: angles in degrees, counter-clockwise
    Arc
);
define_view!(
    /// TEXT: single line text
    Text
);
define_view!(
    /// INSERT: block reference
    Insert
);
define_view!(
    /// POLYLINE: vertices are VERTEX followers
    Polyline
);
define_view!(
    /// LWPOLYLINE: 2D polyline with inline vertices
    LwPolyline
);
define_view!(
    /// IMAGE: raster image reference
    Image
);
define_view!(
    /// PDFUNDERLAY / DWFUNDERLAY / DGNUNDERLAY
    Underlay
);

graphic_views!(Line, Point, Circle, Arc, Text, Insert, Polyline, LwPolyline, Image, Underlay);

impl<T: Deref<Target = TagGroup>> Line<T> {
    pub const START: i32 = 10;
    pub const END: i32 = 11;

    pub fn start(&self) -> Vector3 {
        self.group.point(Self::START).unwrap_or_default()
    }

    pub fn end(&self) -> Vector3 {
        self.group.point(Self::END).unwrap_or_default()
    }
}

impl<T: DerefMut<Target = TagGroup>> Line<T> {
    pub fn set_start(&mut self, p: Vector3) {
        self.group.set_point(Self::START, p);
    }

    pub fn set_end(&mut self, p: Vector3) {
        self.group.set_point(Self::END, p);
    }
}

impl<T: Deref<Target = TagGroup>> Point<T> {
    pub const LOCATION: i32 = 10;

    pub fn location(&self) -> Vector3 {
        self.group.point(Self::LOCATION).unwrap_or_default()
    }
}

impl<T: DerefMut<Target = TagGroup>> Point<T> {
    pub fn set_location(&mut self, p: Vector3) {
        self.group.set_point(Self::LOCATION, p);
    }
}

impl<T: Deref<Target = TagGroup>> Circle<T> {
    pub const CENTER: i32 = 10;
    pub const RADIUS: i32 = 40;

    pub fn center(&self) -> Vector3 {
        self.group.point(Self::CENTER).unwrap_or_default()
    }

    pub fn radius(&self) -> f64 {
        self.group.get_float(Self::RADIUS).unwrap_or(1.0)
    }
}

impl<T: DerefMut<Target = TagGroup>> Circle<T> {
    pub fn set_center(&mut self, p: Vector3) {
        self.group.set_point(Self::CENTER, p);
    }

    pub fn set_radius(&mut self, radius: f64) {
        self.group.set_float(Self::RADIUS, radius);
    }
}

impl<T: Deref<Target = TagGroup>> Arc<T> {
    pub const CENTER: i32 = 10;
    pub const RADIUS: i32 = 40;
    pub const START_ANGLE: i32 = 50;
    pub const END_ANGLE: i32 = 51;

    pub fn center(&self) -> Vector3 {
        self.group.point(Self::CENTER).unwrap_or_default()
    }

    pub fn radius(&self) -> f64 {
        self.group.get_float(Self::RADIUS).unwrap_or(1.0)
    }

    pub fn start_angle(&self) -> f64 {
        self.group.get_float(Self::START_ANGLE).unwrap_or(0.0)
    }

    pub fn end_angle(&self) -> f64 {
        self.group.get_float(Self::END_ANGLE).unwrap_or(360.0)
    }
}

impl<T: DerefMut<Target = TagGroup>> Arc<T> {
    pub fn set_radius(&mut self, radius: f64) {
        self.group.set_float(Self::RADIUS, radius);
    }

    pub fn set_angles(&mut self, start: f64, end: f64) {
        self.group.set_float(Self::START_ANGLE, start);
        self.group.set_float(Self::END_ANGLE, end);
    }
}

impl<T: Deref<Target = TagGroup>> Text<T> {
    pub const INSERT: i32 = 10;
    pub const HEIGHT: i32 = 40;
    pub const TEXT: i32 = 1;
    pub const ROTATION: i32 = 50;
    pub const STYLE: i32 = 7;

    pub fn insert(&self) -> Vector3 {
        self.group.point(Self::INSERT).unwrap_or_default()
    }

    pub fn height(&self) -> f64 {
        self.group.get_float(Self::HEIGHT).unwrap_or(2.5)
    }

    pub fn text(&self) -> &str {
        self.group.get_str(Self::TEXT).unwrap_or("")
    }

    pub fn rotation(&self) -> f64 {
        self.group.get_float(Self::ROTATION).unwrap_or(0.0)
    }

    /// Text style name, STANDARD if unset
    pub fn style(&self) -> &str {
        self.group.get_str(Self::STYLE).unwrap_or("STANDARD")
    }
}

impl<T: DerefMut<Target = TagGroup>> Text<T> {
    pub fn set_text(&mut self, text: &str) {
        self.group.set_str(Self::TEXT, text);
    }

    pub fn set_height(&mut self, height: f64) {
        self.group.set_float(Self::HEIGHT, height);
    }

    pub fn set_style(&mut self, style: &str) {
        self.group.set_str(Self::STYLE, style);
    }
}

impl<T: Deref<Target = TagGroup>> Insert<T> {
    pub const NAME: i32 = 2;
    pub const INSERT: i32 = 10;
    pub const X_SCALE: i32 = 41;
    pub const Y_SCALE: i32 = 42;
    pub const Z_SCALE: i32 = 43;
    pub const ROTATION: i32 = 50;
    pub const HAS_ATTRIBS: i32 = 66;

    /// Name of the referenced block
    pub fn name(&self) -> &str {
        self.group.get_str(Self::NAME).unwrap_or("")
    }

    pub fn insert(&self) -> Vector3 {
        self.group.point(Self::INSERT).unwrap_or_default()
    }

    pub fn scale(&self) -> Vector3 {
        Vector3::new(
            self.group.get_float(Self::X_SCALE).unwrap_or(1.0),
            self.group.get_float(Self::Y_SCALE).unwrap_or(1.0),
            self.group.get_float(Self::Z_SCALE).unwrap_or(1.0),
        )
    }

    pub fn rotation(&self) -> f64 {
        self.group.get_float(Self::ROTATION).unwrap_or(0.0)
    }

    /// True if ATTRIB followers are attached
    pub fn has_attribs(&self) -> bool {
        self.group.get_int(Self::HAS_ATTRIBS) == Some(1)
    }
}

impl<T: DerefMut<Target = TagGroup>> Insert<T> {
    pub fn set_name(&mut self, name: &str) {
        self.group.set_str(Self::NAME, name);
    }

    pub fn set_insert(&mut self, p: Vector3) {
        self.group.set_point(Self::INSERT, p);
    }
}

impl<T: Deref<Target = TagGroup>> Polyline<T> {
    pub const FLAGS: i32 = 70;
    pub const CLOSED: i64 = 1;

    pub fn flags(&self) -> i64 {
        self.group.get_int(Self::FLAGS).unwrap_or(0)
    }

    pub fn is_closed(&self) -> bool {
        self.flags() & Self::CLOSED != 0
    }
}

impl<T: DerefMut<Target = TagGroup>> Polyline<T> {
    pub fn set_closed(&mut self, closed: bool) {
        let flags = self.flags();
        let flags = if closed { flags | Self::CLOSED } else { flags & !Self::CLOSED };
        self.group.set_int(Self::FLAGS, flags);
    }
}

impl<T: Deref<Target = TagGroup>> LwPolyline<T> {
    pub const COUNT: i32 = 90;
    pub const FLAGS: i32 = 70;
    pub const VERTEX: i32 = 10;

    pub fn points(&self) -> Vec<Vector2> {
        self.group.points2d(Self::VERTEX)
    }

    pub fn is_closed(&self) -> bool {
        self.group.get_int(Self::FLAGS).unwrap_or(0) & 1 != 0
    }
}

impl<T: DerefMut<Target = TagGroup>> LwPolyline<T> {
    /// Replace all vertices; bulges and widths are dropped.
    pub fn set_points(&mut self, points: &[Vector2]) {
        let tags = self.group.tags_mut();
        tags.retain(|t| !matches!(t.code, 10 | 20 | 40 | 41 | 42 | 91));
        tags.extend(
            points
                .iter()
                .flat_map(|p| [Tag::float(10, p.x), Tag::float(20, p.y)]),
        );
        self.group.set_int(Self::COUNT, points.len() as i64);
    }
}

impl<T: Deref<Target = TagGroup>> Image<T> {
    pub const INSERT: i32 = 10;
    pub const U_PIXEL: i32 = 11;
    pub const V_PIXEL: i32 = 12;
    pub const IMAGE_SIZE: i32 = 13;
    pub const IMAGE_DEF: i32 = 340;

    pub fn insert(&self) -> Vector3 {
        self.group.point(Self::INSERT).unwrap_or_default()
    }

    /// Image size in pixels
    pub fn image_size(&self) -> Vector2 {
        self.group.point(Self::IMAGE_SIZE).unwrap_or_default().xy()
    }

    /// Drawing size: pixel count times pixel vectors
    pub fn size(&self) -> Vector2 {
        let px = self.image_size();
        let u = self.group.point(Self::U_PIXEL).unwrap_or_default();
        let v = self.group.point(Self::V_PIXEL).unwrap_or_default();
        Vector2::new(px.x * u.x, px.y * v.y)
    }

    pub fn image_def(&self) -> Handle {
        self.group.get_handle(Self::IMAGE_DEF).unwrap_or(Handle::NULL)
    }
}

impl<T: Deref<Target = TagGroup>> Underlay<T> {
    pub const UNDERLAY_DEF: i32 = 340;
    pub const INSERT: i32 = 10;

    pub fn underlay_def(&self) -> Handle {
        self.group.get_handle(Self::UNDERLAY_DEF).unwrap_or(Handle::NULL)
    }

    pub fn insert(&self) -> Vector3 {
        self.group.point(Self::INSERT).unwrap_or_default()
    }

    pub fn scale(&self) -> Vector3 {
        Vector3::new(
            self.group.get_float(41).unwrap_or(1.0),
            self.group.get_float(42).unwrap_or(1.0),
            self.group.get_float(43).unwrap_or(1.0),
        )
    }
}
