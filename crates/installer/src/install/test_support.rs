//! Archive builders shared by the install and pipeline tests

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

/// Build an in-memory zip from `(name, contents)` pairs; names ending in `/` become directories
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for (name, contents) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}
