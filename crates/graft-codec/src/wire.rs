//! Big-endian wire primitives.
//!
//! Strings and small byte strings carry a `u32` length prefix; binary values
//! carry a `u64` prefix. Reads never allocate more than the stream actually
//! holds, so a corrupt length prefix yields [`CodecError::Truncated`] rather
//! than a huge allocation.

use std::io::{Read, Write};

use crate::error::{CodecError, CodecResult};

pub(crate) fn write_u8<W: Write + ?Sized>(out: &mut W, value: u8) -> CodecResult<()> {
    out.write_all(&[value])?;
    Ok(())
}

pub(crate) fn write_u32<W: Write + ?Sized>(out: &mut W, value: u32) -> CodecResult<()> {
    out.write_all(&value.to_be_bytes())?;
    Ok(())
}

pub(crate) fn write_i32<W: Write + ?Sized>(out: &mut W, value: i32) -> CodecResult<()> {
    out.write_all(&value.to_be_bytes())?;
    Ok(())
}

pub(crate) fn write_u64<W: Write + ?Sized>(out: &mut W, value: u64) -> CodecResult<()> {
    out.write_all(&value.to_be_bytes())?;
    Ok(())
}

pub(crate) fn write_i64<W: Write + ?Sized>(out: &mut W, value: i64) -> CodecResult<()> {
    out.write_all(&value.to_be_bytes())?;
    Ok(())
}

pub(crate) fn write_f64<W: Write + ?Sized>(out: &mut W, value: f64) -> CodecResult<()> {
    out.write_all(&value.to_bits().to_be_bytes())?;
    Ok(())
}

/// Length-prefixed (`u32`) byte string.
pub(crate) fn write_bytes<W: Write + ?Sized>(out: &mut W, bytes: &[u8]) -> CodecResult<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| {
        CodecError::InvalidArgument(format!("{} bytes exceed the u32 length prefix", bytes.len()))
    })?;
    write_u32(out, len)?;
    out.write_all(bytes)?;
    Ok(())
}

pub(crate) fn write_str<W: Write + ?Sized>(out: &mut W, s: &str) -> CodecResult<()> {
    write_bytes(out, s.as_bytes())
}

/// Length-prefixed (`u64`) binary content.
pub(crate) fn write_blob<W: Write + ?Sized>(out: &mut W, bytes: &[u8]) -> CodecResult<()> {
    write_u64(out, bytes.len() as u64)?;
    out.write_all(bytes)?;
    Ok(())
}

fn read_array<const N: usize, R: Read + ?Sized>(input: &mut R) -> CodecResult<[u8; N]> {
    let mut buf = [0u8; N];
    input.read_exact(&mut buf)?;
    Ok(buf)
}

pub(crate) fn read_u8<R: Read + ?Sized>(input: &mut R) -> CodecResult<u8> {
    Ok(read_array::<1, R>(input)?[0])
}

pub(crate) fn read_i16<R: Read + ?Sized>(input: &mut R) -> CodecResult<i16> {
    Ok(i16::from_be_bytes(read_array(input)?))
}

pub(crate) fn read_u32<R: Read + ?Sized>(input: &mut R) -> CodecResult<u32> {
    Ok(u32::from_be_bytes(read_array(input)?))
}

pub(crate) fn read_i32<R: Read + ?Sized>(input: &mut R) -> CodecResult<i32> {
    Ok(i32::from_be_bytes(read_array(input)?))
}

pub(crate) fn read_u64<R: Read + ?Sized>(input: &mut R) -> CodecResult<u64> {
    Ok(u64::from_be_bytes(read_array(input)?))
}

pub(crate) fn read_i64<R: Read + ?Sized>(input: &mut R) -> CodecResult<i64> {
    Ok(i64::from_be_bytes(read_array(input)?))
}

pub(crate) fn read_f32<R: Read + ?Sized>(input: &mut R) -> CodecResult<f32> {
    Ok(f32::from_bits(u32::from_be_bytes(read_array(input)?)))
}

pub(crate) fn read_f64<R: Read + ?Sized>(input: &mut R) -> CodecResult<f64> {
    Ok(f64::from_bits(u64::from_be_bytes(read_array(input)?)))
}

pub(crate) fn read_exact_vec<R: Read + ?Sized>(input: &mut R, len: u64) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    Read::take(&mut *input, len).read_to_end(&mut buf)?;
    if (buf.len() as u64) != len {
        return Err(CodecError::Truncated);
    }
    Ok(buf)
}

pub(crate) fn read_bytes<R: Read + ?Sized>(input: &mut R) -> CodecResult<Vec<u8>> {
    let len = read_u32(input)?;
    read_exact_vec(input, u64::from(len))
}

pub(crate) fn read_string<R: Read + ?Sized>(input: &mut R) -> CodecResult<String> {
    String::from_utf8(read_bytes(input)?).map_err(|e| CodecError::InvalidUtf8(e.to_string()))
}

pub(crate) fn read_blob<R: Read + ?Sized>(input: &mut R) -> CodecResult<Vec<u8>> {
    let len = read_u64(input)?;
    read_exact_vec(input, len)
}

/// A reader that keeps a copy of every byte it hands out.
///
/// Used to re-emit an untouched property exactly as it was read.
pub(crate) struct CaptureReader<'a, R: Read + ?Sized> {
    inner: &'a mut R,
    captured: Vec<u8>,
}

impl<'a, R: Read + ?Sized> CaptureReader<'a, R> {
    pub(crate) fn new(inner: &'a mut R) -> Self {
        Self {
            inner,
            captured: Vec::new(),
        }
    }

    pub(crate) fn captured(&self) -> &[u8] {
        &self.captured
    }

    /// Drop what has been captured so far.
    pub(crate) fn reset(&mut self) {
        self.captured.clear();
    }
}

impl<R: Read + ?Sized> Read for CaptureReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.captured.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}
