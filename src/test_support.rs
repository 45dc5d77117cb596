use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};

/// Writes a minimal MBTiles package with the given metadata rows.
pub fn write_package(dir: &Path, file_name: &str, rows: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(file_name);
    let connection = Connection::open(&path).unwrap();

    connection
        .execute_batch(
            "CREATE TABLE metadata (name text, value text);
             CREATE TABLE tiles (zoom_level integer, tile_column integer, tile_row integer, tile_data blob);",
        )
        .unwrap();

    for (name, value) in rows {
        connection
            .execute(
                "INSERT INTO metadata (name, value) VALUES (?1, ?2);",
                params![name, value],
            )
            .unwrap();
    }

    path
}
