//! Font discovery for chart text.
//!
//! Plotters is built without its system-font backend, so text needs a
//! TrueType face registered up front. We take an explicit font file when one
//! is configured, otherwise the first common sans-serif face `fontdb` finds.

use std::path::Path;
use std::sync::OnceLock;

use plotters::style::{FontStyle, register_font};

/// Family name chart code uses in its text styles.
pub const CHART_FONT_FAMILY: &str = "sans-serif";

static REGISTERED: OnceLock<bool> = OnceLock::new();

/// Register a chart font once per process. Returns whether text can be drawn.
///
/// Only the first call's `explicit` path is considered.
pub fn ensure_chart_font(explicit: Option<&Path>) -> bool {
    *REGISTERED.get_or_init(|| {
        let Some(bytes) = load_font_bytes(explicit) else {
            log::warn!("No usable font found; charts will be drawn without text.");
            return false;
        };
        // Plotters keeps registered fonts for the life of the process.
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match register_font(CHART_FONT_FAMILY, FontStyle::Normal, bytes) {
            Ok(()) => true,
            Err(_) => {
                log::warn!("Chart font could not be parsed; charts will be drawn without text.");
                false
            }
        }
    })
}

fn load_font_bytes(explicit: Option<&Path>) -> Option<Vec<u8>> {
    if let Some(path) = explicit {
        match std::fs::read(path) {
            Ok(bytes) => return Some(bytes),
            Err(e) => log::warn!("Cannot read chart font '{}': {e}; trying system fonts", path.display()),
        }
    }
    find_system_sans()
}

fn find_system_sans() -> Option<Vec<u8>> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    let query = fontdb::Query {
        families: &[
            fontdb::Family::Name("DejaVu Sans"),
            fontdb::Family::Name("Liberation Sans"),
            fontdb::Family::Name("Arial"),
            fontdb::Family::Name("Helvetica"),
            fontdb::Family::SansSerif,
        ],
        weight: fontdb::Weight::NORMAL,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };

    let id = db.query(&query).or_else(|| {
        // Any single-face file will do.
        db.faces().find(|face| face.index == 0).map(|face| face.id)
    })?;

    if let Some(face) = db.face(id) {
        log::debug!("Using chart font '{}'", face.post_script_name);
    }
    db.with_face_data(id, |data, _index| data.to_vec())
}
