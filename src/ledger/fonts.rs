//! Decorative font lookup for the data cells.
//!
//! Data rows are written in a handwriting-style font when one is installed,
//! so typed-in rows stand apart from the printed header. The lookup is a
//! best-effort capability query: with the `fonts` feature disabled, or when
//! the system font source cannot be queried, no font is preferred and the
//! workbook default is used.

#[cfg(feature = "fonts")]
use once_cell::sync::Lazy;
use tracing::debug;

/// Operating system family, as far as font preferences go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    MacOs,
    Other,
}

impl HostOs {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            HostOs::MacOs
        } else {
            HostOs::Other
        }
    }
}

const MACOS_CANDIDATES: &[&str] = &["Noteworthy", "Marker Felt", "Chalkboard SE"];
const OTHER_CANDIDATES: &[&str] = &[
    "Segoe Script",
    "Lucida Handwriting",
    "Brush Script MT",
    "Comic Sans MS",
];

/// Handwriting fonts to try on `os`, most preferred first.
pub fn decorative_font_candidates(os: HostOs) -> &'static [&'static str] {
    match os {
        HostOs::MacOs => MACOS_CANDIDATES,
        HostOs::Other => OTHER_CANDIDATES,
    }
}

/// First installed candidate font for `os`, if any.
pub fn preferred_decorative_font(os: HostOs) -> Option<String> {
    let found = pick_installed(decorative_font_candidates(os), installed_families());
    debug!(font = ?found, "decorative font lookup");
    found
}

fn pick_installed(candidates: &[&str], installed: &[String]) -> Option<String> {
    candidates
        .iter()
        .find(|candidate| installed.iter().any(|family| family.as_str() == **candidate))
        .map(|candidate| candidate.to_string())
}

#[cfg(feature = "fonts")]
static INSTALLED_FAMILIES: Lazy<Vec<String>> = Lazy::new(|| {
    use font_kit::source::SystemSource;

    match SystemSource::new().all_families() {
        Ok(families) => families,
        Err(e) => {
            debug!(error = ?e, "system font families unavailable");
            Vec::new()
        },
    }
});

#[cfg(feature = "fonts")]
fn installed_families() -> &'static [String] {
    &INSTALLED_FAMILIES
}

#[cfg(not(feature = "fonts"))]
fn installed_families() -> &'static [String] {
    &[]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_per_os() {
        assert_eq!(decorative_font_candidates(HostOs::MacOs)[0], "Noteworthy");
        assert_eq!(decorative_font_candidates(HostOs::Other).len(), 4);
    }

    #[test]
    fn picks_first_installed_in_preference_order() {
        let installed = vec![
            "Arial".to_string(),
            "Comic Sans MS".to_string(),
            "Lucida Handwriting".to_string(),
        ];
        assert_eq!(
            pick_installed(OTHER_CANDIDATES, &installed).as_deref(),
            Some("Lucida Handwriting")
        );
        assert_eq!(pick_installed(MACOS_CANDIDATES, &installed), None);
    }

    #[test]
    fn lookup_never_fails() {
        // Whatever the host has installed, the query must return.
        let _ = preferred_decorative_font(HostOs::current());
    }
}
