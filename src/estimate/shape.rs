//! Reads the top-level [`Shape`] of any `Serialize` value.
//!
//! A minimal serde `Serializer` that answers for the outermost value only.
//! Elements and fields of compounds are counted, never visited.

use std::fmt;

use serde::ser::{self, Serialize, Serializer};

use super::Shape;

pub(crate) fn shape_of<T: Serialize + ?Sized>(value: &T) -> Shape {
    value.serialize(ShapeSerializer).unwrap_or(Shape::Opaque)
}

#[derive(Debug)]
pub(crate) struct Unshaped;

impl fmt::Display for Unshaped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("value refused to serialize")
    }
}

impl std::error::Error for Unshaped {}

impl ser::Error for Unshaped {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        Unshaped
    }
}

struct ShapeSerializer;

#[derive(Clone, Copy)]
enum Kind {
    Sequence,
    Record,
    /// Externally tagged variant: `{"Variant": ...}`.
    Variant,
}

pub(crate) struct Compound {
    kind: Kind,
    count: usize,
}

impl Compound {
    fn new(kind: Kind) -> Self {
        Self { kind, count: 0 }
    }

    fn finish(self) -> Shape {
        match self.kind {
            Kind::Sequence => Shape::Sequence(self.count),
            Kind::Record => Shape::Record(self.count),
            Kind::Variant => Shape::Record(1),
        }
    }
}

impl Serializer for ShapeSerializer {
    type Ok = Shape;
    type Error = Unshaped;
    type SerializeSeq = Compound;
    type SerializeTuple = Compound;
    type SerializeTupleStruct = Compound;
    type SerializeTupleVariant = Compound;
    type SerializeMap = Compound;
    type SerializeStruct = Compound;
    type SerializeStructVariant = Compound;

    fn serialize_bool(self, _v: bool) -> Result<Shape, Unshaped> {
        Ok(Shape::Bool)
    }

    fn serialize_i8(self, _v: i8) -> Result<Shape, Unshaped> {
        Ok(Shape::Number)
    }

    fn serialize_i16(self, _v: i16) -> Result<Shape, Unshaped> {
        Ok(Shape::Number)
    }

    fn serialize_i32(self, _v: i32) -> Result<Shape, Unshaped> {
        Ok(Shape::Number)
    }

    fn serialize_i64(self, _v: i64) -> Result<Shape, Unshaped> {
        Ok(Shape::Number)
    }

    fn serialize_i128(self, _v: i128) -> Result<Shape, Unshaped> {
        Ok(Shape::Number)
    }

    fn serialize_u8(self, _v: u8) -> Result<Shape, Unshaped> {
        Ok(Shape::Number)
    }

    fn serialize_u16(self, _v: u16) -> Result<Shape, Unshaped> {
        Ok(Shape::Number)
    }

    fn serialize_u32(self, _v: u32) -> Result<Shape, Unshaped> {
        Ok(Shape::Number)
    }

    fn serialize_u64(self, _v: u64) -> Result<Shape, Unshaped> {
        Ok(Shape::Number)
    }

    fn serialize_u128(self, _v: u128) -> Result<Shape, Unshaped> {
        Ok(Shape::Number)
    }

    fn serialize_f32(self, _v: f32) -> Result<Shape, Unshaped> {
        Ok(Shape::Number)
    }

    fn serialize_f64(self, _v: f64) -> Result<Shape, Unshaped> {
        Ok(Shape::Number)
    }

    fn serialize_char(self, v: char) -> Result<Shape, Unshaped> {
        Ok(Shape::Text(v.len_utf8()))
    }

    fn serialize_str(self, v: &str) -> Result<Shape, Unshaped> {
        Ok(Shape::Text(v.len()))
    }

    // serde_json writes bytes as an array of numbers.
    fn serialize_bytes(self, v: &[u8]) -> Result<Shape, Unshaped> {
        Ok(Shape::Sequence(v.len()))
    }

    fn serialize_none(self) -> Result<Shape, Unshaped> {
        Ok(Shape::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Shape, Unshaped>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Shape, Unshaped> {
        Ok(Shape::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Shape, Unshaped> {
        Ok(Shape::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Shape, Unshaped> {
        Ok(Shape::Text(variant.len()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Shape, Unshaped>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Shape, Unshaped>
    where
        T: Serialize + ?Sized,
    {
        Ok(Shape::Record(1))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Compound, Unshaped> {
        Ok(Compound::new(Kind::Sequence))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Compound, Unshaped> {
        Ok(Compound::new(Kind::Sequence))
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Compound, Unshaped> {
        Ok(Compound::new(Kind::Sequence))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Compound, Unshaped> {
        Ok(Compound::new(Kind::Variant))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Compound, Unshaped> {
        Ok(Compound::new(Kind::Record))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Compound, Unshaped> {
        Ok(Compound::new(Kind::Record))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Compound, Unshaped> {
        Ok(Compound::new(Kind::Variant))
    }
}

impl ser::SerializeSeq for Compound {
    type Ok = Shape;
    type Error = Unshaped;

    fn serialize_element<T>(&mut self, _value: &T) -> Result<(), Unshaped>
    where
        T: Serialize + ?Sized,
    {
        self.count += 1;
        Ok(())
    }

    fn end(self) -> Result<Shape, Unshaped> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for Compound {
    type Ok = Shape;
    type Error = Unshaped;

    fn serialize_element<T>(&mut self, _value: &T) -> Result<(), Unshaped>
    where
        T: Serialize + ?Sized,
    {
        self.count += 1;
        Ok(())
    }

    fn end(self) -> Result<Shape, Unshaped> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for Compound {
    type Ok = Shape;
    type Error = Unshaped;

    fn serialize_field<T>(&mut self, _value: &T) -> Result<(), Unshaped>
    where
        T: Serialize + ?Sized,
    {
        self.count += 1;
        Ok(())
    }

    fn end(self) -> Result<Shape, Unshaped> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for Compound {
    type Ok = Shape;
    type Error = Unshaped;

    fn serialize_field<T>(&mut self, _value: &T) -> Result<(), Unshaped>
    where
        T: Serialize + ?Sized,
    {
        Ok(())
    }

    fn end(self) -> Result<Shape, Unshaped> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for Compound {
    type Ok = Shape;
    type Error = Unshaped;

    fn serialize_key<T>(&mut self, _key: &T) -> Result<(), Unshaped>
    where
        T: Serialize + ?Sized,
    {
        self.count += 1;
        Ok(())
    }

    fn serialize_value<T>(&mut self, _value: &T) -> Result<(), Unshaped>
    where
        T: Serialize + ?Sized,
    {
        Ok(())
    }

    fn end(self) -> Result<Shape, Unshaped> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for Compound {
    type Ok = Shape;
    type Error = Unshaped;

    fn serialize_field<T>(&mut self, _key: &'static str, _value: &T) -> Result<(), Unshaped>
    where
        T: Serialize + ?Sized,
    {
        self.count += 1;
        Ok(())
    }

    fn end(self) -> Result<Shape, Unshaped> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for Compound {
    type Ok = Shape;
    type Error = Unshaped;

    fn serialize_field<T>(&mut self, _key: &'static str, _value: &T) -> Result<(), Unshaped>
    where
        T: Serialize + ?Sized,
    {
        Ok(())
    }

    fn end(self) -> Result<Shape, Unshaped> {
        Ok(self.finish())
    }
}
