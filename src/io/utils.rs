//! Utilities for input/output.

use super::{fdt, Endianness};
use crate::io_error;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use ndarray::{ArrayBase, Data, Dimension};
use ndarray_npy::{WriteNpyError, WriteNpyExt};
use std::{
    fs,
    io::{self, Read, Seek, SeekFrom, Write},
    mem,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Opens the file at the given path, adding the path to any error message.
pub fn open_file_and_map_err<P: AsRef<Path>>(file_path: P) -> io::Result<fs::File> {
    let file_path = file_path.as_ref();
    fs::File::open(file_path).map_err(|err| {
        io::Error::new(
            err.kind(),
            format!(
                "Could not open {}: {}",
                file_path.to_string_lossy(),
                err
            ),
        )
    })
}

/// Reads and returns the content of the specified text file.
pub fn read_text_file<P: AsRef<Path>>(file_path: P) -> io::Result<String> {
    let file = open_file_and_map_err(file_path)?;
    let mut text = String::new();
    let _ = io::BufReader::new(file).read_to_string(&mut text)?;
    Ok(text)
}

/// Reads the given number of consecutive floats from a binary file,
/// starting at the given byte offset.
pub fn read_from_binary_file<P: AsRef<Path>>(
    file_path: P,
    length: usize,
    byte_offset: usize,
    endianness: Endianness,
) -> io::Result<Vec<fdt>> {
    let mut file = open_file_and_map_err(file_path)?;
    file.seek(SeekFrom::Start(byte_offset as u64))?;

    let mut buffer = vec![0_u8; length * mem::size_of::<fdt>()];
    file.read_exact(&mut buffer)?;

    let mut values = vec![0.0; length];
    read_from_byte_buffer(&buffer, &mut values, endianness);
    Ok(values)
}

/// Decodes the floats in the given byte buffer into the given value slice.
pub fn read_from_byte_buffer(buffer: &[u8], values: &mut [fdt], endianness: Endianness) {
    match endianness.resolved() {
        Endianness::Big => BigEndian::read_f64_into(buffer, values),
        _ => LittleEndian::read_f64_into(buffer, values),
    }
}

/// Encodes the given floats into the start of the given byte buffer.
pub fn write_into_byte_buffer(values: &[fdt], buffer: &mut [u8], endianness: Endianness) {
    let byte_length = values.len() * mem::size_of::<fdt>();
    match endianness.resolved() {
        Endianness::Big => BigEndian::write_f64_into(values, &mut buffer[..byte_length]),
        _ => LittleEndian::write_f64_into(values, &mut buffer[..byte_length]),
    }
}

/// Writes the given floats to the given writer with the given byte order.
pub fn write_floats<W: Write>(
    writer: &mut W,
    values: &[fdt],
    endianness: Endianness,
) -> io::Result<()> {
    let mut buffer = vec![0_u8; values.len() * mem::size_of::<fdt>()];
    write_into_byte_buffer(values, &mut buffer, endianness);
    writer.write_all(&buffer)
}

/// Creates any missing directories leading up to the given file path.
pub fn create_directory_if_missing<P: AsRef<Path>>(file_path: P) -> io::Result<()> {
    if let Some(parent) = file_path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Output path that is written to through a temporary file
/// which replaces the target once writing has completed.
#[derive(Debug)]
pub struct AtomicOutputPath {
    target_path: PathBuf,
    temporary_file: NamedTempFile,
}

impl AtomicOutputPath {
    /// Creates a temporary file in the directory of the given target path.
    pub fn new<P: AsRef<Path>>(target_path: P) -> io::Result<Self> {
        let target_path = target_path.as_ref().to_path_buf();
        create_directory_if_missing(&target_path)?;
        let directory = match target_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let temporary_file = NamedTempFile::new_in(directory)?;
        Ok(Self {
            target_path,
            temporary_file,
        })
    }

    /// Returns the path of the final output file.
    pub fn target_path(&self) -> &Path {
        self.target_path.as_path()
    }

    /// Returns the path of the temporary file.
    pub fn temporary_path(&self) -> &Path {
        self.temporary_file.path()
    }

    /// Returns a writer for the temporary file.
    pub fn writer(&mut self) -> io::BufWriter<&mut fs::File> {
        io::BufWriter::new(self.temporary_file.as_file_mut())
    }

    /// Moves the temporary file to the target path, replacing any existing file.
    pub fn perform_replace(self) -> io::Result<()> {
        self.temporary_file
            .persist(&self.target_path)
            .map(|_| ())
            .map_err(|err| err.error)
    }
}

/// Writes the given text to a file at the given path.
pub fn write_text_file<P: AsRef<Path>>(text: &str, output_file_path: P) -> io::Result<()> {
    let mut output_path = AtomicOutputPath::new(output_file_path)?;
    {
        let mut writer = output_path.writer();
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
    }
    output_path.perform_replace()
}

/// Writes the given array in NumPy `.npy` format to a file at the given path.
pub fn write_array_as_npy<S, D, P>(array: &ArrayBase<S, D>, output_file_path: P) -> io::Result<()>
where
    S: Data<Elem = fdt>,
    D: Dimension,
    P: AsRef<Path>,
{
    let mut output_path = AtomicOutputPath::new(output_file_path)?;
    {
        let mut writer = output_path.writer();
        array.write_npy(&mut writer).map_err(|err| match err {
            WriteNpyError::Io(err) => err,
            err => io_error!(Other, "Could not write array in npy format: {}", err),
        })?;
        writer.flush()?;
    }
    output_path.perform_replace()
}

/// Serializes the given data into JSON and writes it to a file at the given path.
#[cfg(feature = "json")]
pub fn write_data_as_json<T, P>(data: &T, output_file_path: P) -> io::Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let mut output_path = AtomicOutputPath::new(output_file_path)?;
    {
        let mut writer = output_path.writer();
        serde_json::to_writer(&mut writer, data)?;
        writer.flush()?;
    }
    output_path.perform_replace()
}

/// Serializes the given data into protocol 3 pickle format and writes it
/// to a file at the given path.
#[cfg(feature = "pickle")]
pub fn write_data_as_pickle<T, P>(data: &T, output_file_path: P) -> io::Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let mut output_path = AtomicOutputPath::new(output_file_path)?;
    {
        let mut writer = output_path.writer();
        match serde_pickle::to_writer(&mut writer, data, serde_pickle::SerOptions::new()) {
            Ok(_) => {}
            Err(serde_pickle::Error::Io(err)) => return Err(err),
            Err(err) => {
                return Err(io_error!(Other, "Could not serialize data to pickle: {}", err))
            }
        }
        writer.flush()?;
    }
    output_path.perform_replace()
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn binary_round_trip_preserves_values_at_offset() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("values.bin");
        let values: Vec<fdt> = (0..10).map(|i| i as fdt * 0.5 - 1.0).collect();

        for endianness in [Endianness::Little, Endianness::Big, Endianness::Native] {
            let mut output_path = AtomicOutputPath::new(&path).unwrap();
            {
                let mut writer = output_path.writer();
                write_floats(&mut writer, &values, endianness).unwrap();
                writer.flush().unwrap();
            }
            output_path.perform_replace().unwrap();

            let read = read_from_binary_file(&path, 4, 3 * mem::size_of::<fdt>(), endianness)
                .unwrap();
            assert_eq!(read, values[3..7].to_vec());
        }
    }

    #[test]
    fn reading_past_end_fails() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("short.bin");
        write_text_file("abc", &path).unwrap();
        assert!(read_from_binary_file(&path, 1, 0, Endianness::Little).is_err());
        assert_eq!(read_text_file(&path).unwrap(), "abc");
    }

    #[test]
    fn npy_output_can_be_read_back() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("nested").join("values.npy");
        let array = ndarray::Array2::from_shape_fn((3, 2), |(i, j)| (10 * i + j) as fdt).into_dyn();
        write_array_as_npy(&array, &path).unwrap();
        let read: ndarray::ArrayD<fdt> = ndarray_npy::read_npy(&path).unwrap();
        assert_eq!(read, array);
    }
}
