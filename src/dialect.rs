//! Placeholder marker policy per database kind.

/// How bound parameters are marked in the final SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialectMode {
    /// `?` for every parameter (MySQL, SQLite)
    #[default]
    PositionalMarker,
    /// `$1`, `$2`, ... in left-to-right order (PostgreSQL)
    ///
    /// No bundled runner speaks this dialect; pair it with your own
    /// [`QueryRunner`](crate::QueryRunner).
    NumberedMarker,
}

impl DialectMode {
    /// Picks the dialect for a driver name such as `"mysql"` or `"postgres"`.
    ///
    /// Unknown drivers fall back to positional markers.
    pub fn for_driver(driver: &str) -> Self {
        match driver.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pgx" => DialectMode::NumberedMarker,
            _ => DialectMode::PositionalMarker,
        }
    }

    /// Starts a fresh marker sequence for one assembled statement.
    pub fn markers(self) -> MarkerWriter {
        MarkerWriter {
            mode: self,
            next: 1,
        }
    }
}

/// Writes dialect markers and keeps the running index for numbered dialects.
#[derive(Debug)]
pub struct MarkerWriter {
    mode: DialectMode,
    next: usize,
}

impl MarkerWriter {
    pub fn write(&mut self, sql: &mut String) {
        match self.mode {
            DialectMode::PositionalMarker => sql.push('?'),
            DialectMode::NumberedMarker => {
                sql.push('$');
                sql.push_str(&self.next.to_string());
                self.next += 1;
            }
        }
    }
}
