//! Reading, writing and discovering Newick tree files.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use tracing::debug;

use crate::error::{PruneError, Result, TreeError};
use crate::tree::GeneTree;

/// Tree file extensions picked up when none are configured.
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["treefile", "tree"];

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Read a file as text, transparently decompressing `.gz` files.
pub fn read_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let p = path.as_ref();
    let io_err = |source| PruneError::Io { path: p.to_path_buf(), source };

    if is_gzip(p) {
        let mut content = String::new();
        MultiGzDecoder::new(File::open(p).map_err(io_err)?)
            .read_to_string(&mut content)
            .map_err(io_err)?;
        Ok(content)
    } else {
        fs::read_to_string(p).map_err(io_err)
    }
}

/// Parse the first tree of a Newick text.
///
/// `[&...]` annotations are dropped; anything after the first `;` is ignored.
pub fn parse_gene_tree(content: &str) -> std::result::Result<GeneTree, TreeError> {
    if content.trim().is_empty() {
        return Err(TreeError::Parse("no tree found".to_string()));
    }
    GeneTree::from_newick(content)
}

/// Read and parse one tree file (plain or `.gz`).
pub fn read_gene_tree<P: AsRef<Path>>(path: P) -> Result<GeneTree> {
    let p = path.as_ref();
    let content = read_text(p)?;
    let tree = parse_gene_tree(&content).map_err(|source| PruneError::Parse { path: p.to_path_buf(), source })?;
    debug!(path = %p.display(), leaves = tree.n_leaves(), "parsed tree");
    Ok(tree)
}

/// Write a tree as a single Newick line.
/// If `path` ends with `.gz`, the output is gzip-compressed.
pub fn write_gene_tree<P: AsRef<Path>>(path: P, tree: &GeneTree) -> Result<()> {
    let p = path.as_ref();
    write_newick(p, tree).map_err(|source| PruneError::Io { path: p.to_path_buf(), source })
}

fn write_newick(p: &Path, tree: &GeneTree) -> io::Result<()> {
    let newick = tree.to_newick();
    if is_gzip(p) {
        let mut enc = GzEncoder::new(BufWriter::new(File::create(p)?), Compression::default());
        writeln!(&mut enc, "{newick}")?;
        // finish() writes the gzip trailer
        enc.finish()?.flush()?;
    } else {
        let mut out = BufWriter::new(File::create(p)?);
        writeln!(&mut out, "{newick}")?;
        out.flush()?;
    }
    Ok(())
}

/// File name with a trailing `.gz` and then the tree extension removed.
fn tree_stem(path: &Path) -> String {
    let stem = |p: &Path| p.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    if is_gzip(path) {
        stem(Path::new(&stem(path)))
    } else {
        stem(path)
    }
}

/// Naming scheme for pruned outputs: `<stem><suffix>.<extension>[.gz]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    pub suffix: String,
    pub extension: String,
    pub compress: bool,
    /// Directory for outputs; `None` writes next to each input.
    pub dir: Option<PathBuf>,
}

impl Default for OutputNaming {
    fn default() -> Self {
        OutputNaming {
            suffix: "_pruned".to_string(),
            extension: "tree".to_string(),
            compress: false,
            dir: None,
        }
    }
}

impl OutputNaming {
    /// Output path for a given input file.
    ///
    /// ```
    /// # use rust_python_tree_prune::io::OutputNaming;
    /// # use std::path::Path;
    /// let naming = OutputNaming::default();
    /// assert_eq!(naming.output_path(Path::new("data/OG0001.treefile")), Path::new("data/OG0001_pruned.tree"));
    /// ```
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let mut name = format!("{}{}.{}", tree_stem(input), self.suffix, self.extension);
        if self.compress {
            name.push_str(".gz");
        }
        match &self.dir {
            Some(dir) => dir.join(name),
            None => input.with_file_name(name),
        }
    }

    /// True for files this naming scheme would have produced.
    pub fn is_output(&self, path: &Path) -> bool {
        !self.suffix.is_empty() && tree_stem(path).ends_with(&self.suffix)
    }
}

fn has_tree_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(name) = path.file_name().map(|s| s.to_string_lossy().to_ascii_lowercase()) else {
        return false;
    };
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    extensions
        .iter()
        .any(|ext| name.ends_with(&format!(".{}", ext.trim_start_matches('.').to_ascii_lowercase())))
}

/// List tree files directly inside `dir` (no recursion), sorted by path.
///
/// A file matches when its name ends with `.<ext>` or `.<ext>.gz` for one of
/// `extensions`. Files that look like earlier outputs of `naming` are
/// skipped so re-running in the same directory does not prune the pruned.
pub fn discover_tree_files<P: AsRef<Path>>(
    dir: P,
    extensions: &[String],
    naming: &OutputNaming,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let io_err = |source| PruneError::Io { path: dir.to_path_buf(), source };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_file() || !has_tree_extension(&path, extensions) {
            continue;
        }
        if naming.is_output(&path) {
            debug!(path = %path.display(), "skipping earlier output");
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exts() -> Vec<String> {
        DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn blank_input_is_a_parse_error() {
        assert!(matches!(parse_gene_tree(""), Err(TreeError::Parse(_))));
        assert!(matches!(parse_gene_tree(" \n\t"), Err(TreeError::Parse(_))));
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        for bad in ["a,b;", "(a,b", "(a,b));", "(a:1.0.0,b);"] {
            assert!(matches!(parse_gene_tree(bad), Err(TreeError::Parse(_))), "{bad:?}");
        }
    }

    #[test]
    fn annotations_are_dropped_on_read() {
        let tree = parse_gene_tree("(A:[&rate=0.1]1.0,B[&height=2]:2.0);\n(C,D);").unwrap();
        assert_eq!(tree.to_newick(), "(A:1,B:2);");
    }

    #[test]
    fn output_names_follow_input_stem() {
        let naming = OutputNaming::default();
        assert_eq!(naming.output_path(Path::new("g1.treefile")), PathBuf::from("g1_pruned.tree"));
        assert_eq!(naming.output_path(Path::new("d/g2.tree")), PathBuf::from("d/g2_pruned.tree"));
        assert_eq!(naming.output_path(Path::new("d/g3.treefile.gz")), PathBuf::from("d/g3_pruned.tree"));
        assert_eq!(naming.output_path(Path::new("a.b.tree")), PathBuf::from("a.b_pruned.tree"));

        let custom = OutputNaming {
            suffix: "_shared".to_string(),
            extension: "nwk".to_string(),
            compress: true,
            dir: Some(PathBuf::from("out")),
        };
        assert_eq!(custom.output_path(Path::new("in/g1.treefile")), PathBuf::from("out/g1_shared.nwk.gz"));
    }

    #[test]
    fn recognises_earlier_outputs() {
        let naming = OutputNaming::default();
        assert!(naming.is_output(Path::new("g1_pruned.tree")));
        assert!(naming.is_output(Path::new("g1_pruned.tree.gz")));
        assert!(!naming.is_output(Path::new("g1.tree")));
    }

    #[test]
    fn discovers_tree_files_sorted() {
        let dir = tempdir().unwrap();
        for name in ["b.tree", "a.treefile", "c.tree.gz", "notes.txt", "a_pruned.tree", "d.TREE"] {
            fs::write(dir.path().join(name), "(A,B);").unwrap();
        }
        fs::create_dir(dir.path().join("sub.tree")).unwrap();

        let found = discover_tree_files(dir.path(), &exts(), &OutputNaming::default()).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.treefile", "b.tree", "c.tree.gz", "d.TREE"]);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("nope");
        assert!(matches!(
            discover_tree_files(&gone, &exts(), &OutputNaming::default()),
            Err(PruneError::Io { .. })
        ));
    }

    #[test]
    fn reads_and_writes_plain_and_gzip() {
        let dir = tempdir().unwrap();
        let tree = GeneTree::from_newick("((A:1,B:2):0.5,C:3);").unwrap();

        for name in ["out.tree", "out.tree.gz"] {
            let path = dir.path().join(name);
            write_gene_tree(&path, &tree).unwrap();
            let back = read_gene_tree(&path).unwrap();
            assert_eq!(back.to_newick(), tree.to_newick());
        }

        let plain = fs::read_to_string(dir.path().join("out.tree")).unwrap();
        assert_eq!(plain, "((A:1,B:2):0.5,C:3);\n");
    }

    #[test]
    fn single_leaf_and_empty_outputs_read_back() {
        let dir = tempdir().unwrap();
        for newick in ["x_gene1;", ";", "('Homo sapiens_gene1','it''s');"] {
            let tree = parse_gene_tree(newick).unwrap();
            let path = dir.path().join("round.tree");
            write_gene_tree(&path, &tree).unwrap();
            let back = read_gene_tree(&path).unwrap();
            assert_eq!(back.to_newick(), newick);
            assert_eq!(back.leaf_labels(), tree.leaf_labels());
        }
    }

    #[test]
    fn parse_failure_names_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.tree");
        fs::write(&path, "   \n").unwrap();
        match read_gene_tree(&path) {
            Err(PruneError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
