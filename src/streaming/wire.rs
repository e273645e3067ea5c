//! Little-endian primitives shared by the tree and mesh pack formats

use crate::core::types::{Result, Vec2, Vec3};
use crate::core::Error;

pub fn write_i32(out: &mut Vec<u8>, value: i32) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn write_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn write_f32(out: &mut Vec<u8>, value: f32) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn write_vec2(out: &mut Vec<u8>, v: Vec2) {
    write_f32(out, v.x);
    write_f32(out, v.y);
}

pub fn write_vec3(out: &mut Vec<u8>, v: Vec3) {
    write_f32(out, v.x);
    write_f32(out, v.y);
    write_f32(out, v.z);
}

/// Overwrite 4 bytes at `at` with `value`
pub fn patch_i32(out: &mut [u8], at: usize, value: i32) {
    out[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// Bounds-checked cursor over a byte slice
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    /// Reader positioned at `offset`
    pub fn at(data: &'a [u8], offset: usize) -> Result<Self> {
        if offset > data.len() {
            return Err(Error::Format(format!(
                "offset {} past end of {} bytes",
                offset,
                data.len()
            )));
        }
        Ok(Self { data, cursor: offset })
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.cursor.saturating_add(N);
        if end > self.data.len() {
            return Err(Error::Format(format!(
                "need {} bytes at {}, have {}",
                N,
                self.cursor,
                self.remaining()
            )));
        }
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.data[self.cursor..end]);
        self.cursor = end;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Element count prefix; negative values and counts that can't fit in
    /// the remaining bytes are rejected.
    pub fn read_count(&mut self, element_size: usize) -> Result<usize> {
        let count = self.read_i32()?;
        if count < 0 {
            return Err(Error::Format(format!("negative count {}", count)));
        }
        let count = count as usize;
        if count.saturating_mul(element_size) > self.remaining() {
            return Err(Error::Format(format!(
                "count {} exceeds remaining {} bytes",
                count,
                self.remaining()
            )));
        }
        Ok(count)
    }
}
