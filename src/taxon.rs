//! Taxon identifiers from raw leaf labels.
//!
//! Gene trees often label every sequence as `<taxon>_gene<k>`, so the same
//! species shows up as `Homo_sapiens_gene1` in one file and
//! `Homo_sapiens_gene4` in another (or twice in the same file for paralogs).
//! Comparing trees therefore happens on the label with that trailing suffix
//! removed:
//!
//! ```text
//! Homo_sapiens_gene12   → Homo_sapiens
//! Homo_sapiens_gene     → Homo_sapiens_gene   (no digits, unchanged)
//! x_gene1_gene2         → x_gene1             (only the anchored suffix)
//! ```

/// Default marker preceding the gene index.
pub const DEFAULT_MARKER: &str = "_gene";

/// Strips a trailing `<marker><digits>` suffix from leaf labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    marker: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer { marker: DEFAULT_MARKER.to_string() }
    }
}

impl Normalizer {
    /// Create a normalizer for a custom marker such as `_copy`.
    pub fn new(marker: impl Into<String>) -> Self {
        Normalizer { marker: marker.into() }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Map a raw label to its taxon identifier.
    ///
    /// Total over all strings: labels without the suffix come back unchanged,
    /// and a label that is nothing but the suffix yields `""`.
    ///
    /// # Example
    /// ```
    /// # use rust_python_tree_prune::taxon::Normalizer;
    /// let norm = Normalizer::default();
    /// assert_eq!(norm.normalize("Mus_musculus_gene3"), "Mus_musculus");
    /// assert_eq!(norm.normalize("Mus_musculus"), "Mus_musculus");
    /// ```
    pub fn normalize<'a>(&self, label: &'a str) -> &'a str {
        strip_indexed_suffix(label, &self.marker)
    }
}

/// Normalize with the default `_gene` marker.
pub fn normalize(label: &str) -> &str {
    strip_indexed_suffix(label, DEFAULT_MARKER)
}

fn strip_indexed_suffix<'a>(label: &'a str, marker: &str) -> &'a str {
    if marker.is_empty() {
        return label;
    }
    // Digits after an anchored suffix cannot contain the marker, so the
    // last occurrence is the only candidate.
    let Some(pos) = label.rfind(marker) else {
        return label;
    };
    let digits = &label[pos + marker.len()..];
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        &label[..pos]
    } else {
        label
    }
}
