//! Package catalog: the candidate packages from the manifest, their
//! metadata, and the operator's selection.
//!
//! # Manifest format
//!
//! ```text
//! # comment
//! com.example.app
//! com.example.app # Description
//! com.example.app # Description | Category | RISK
//! ```
//!
//! Parsing never fails; a malformed annotation degrades to partial metadata.
//! Duplicate names are kept as separate entries and name lookups take the
//! first match.

use crate::error::{CleanerError, Result};
use chrono::Local;
use std::collections::{BTreeSet, HashSet};
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const BACKUP_PREFIX: &str = "backup_";
const BACKUP_SUFFIX: &str = ".txt";
const MAX_BACKUPS_PER_SECOND: u32 = 100;

/// One candidate package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub description: String,
    pub category: String,
    /// Open vocabulary, conventionally SAFE / RISKY / DANGER
    pub risk_level: String,
    pub installed: bool,
    pub selected: bool,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Case-insensitive substring match on name or description.
    /// `needle` must already be lowercase.
    fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }

    fn backup_line(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.name, self.description, self.category, self.risk_level
        )
    }
}

/// Parse one manifest line. Returns `None` for blank and comment lines.
pub fn parse_manifest_line(line: &str) -> Option<Package> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let Some((name, metadata)) = line.split_once('#') else {
        return Some(Package::new(line));
    };

    let mut package = Package::new(name.trim());
    let metadata = metadata.trim();
    if metadata.contains('|') {
        let mut fields = metadata.split('|').map(str::trim);
        package.description = fields.next().unwrap_or_default().to_string();
        package.category = fields.next().unwrap_or_default().to_string();
        package.risk_level = fields.next().unwrap_or_default().to_string();
    } else {
        package.description = metadata.to_string();
    }
    Some(package)
}

/// Ordered collection of candidate packages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    packages: Vec<Package>,
}

impl Catalog {
    pub fn new(packages: Vec<Package>) -> Self {
        Self { packages }
    }

    /// Parse manifest text
    pub fn parse(text: &str) -> Self {
        Self::new(text.lines().filter_map(parse_manifest_line).collect())
    }

    /// Read and parse the manifest at `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| CleanerError::io("read", path, e))?;
        let catalog = Self::parse(&text);
        info!(
            "Loaded {} packages from {}",
            catalog.count_total(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn get(&self, index: usize) -> Option<&Package> {
        self.packages.get(index)
    }

    /// Overwrite every `installed` flag from the live device package set
    pub fn refresh_installed(&mut self, installed: &HashSet<String>) {
        for package in &mut self.packages {
            package.installed = installed.contains(&package.name);
        }
        debug!(
            "{} of {} manifest packages are installed",
            self.count_installed(),
            self.count_total()
        );
    }

    // ----- selection -----

    pub fn select_all(&mut self) {
        self.select_where(|_| true);
    }

    pub fn deselect_all(&mut self) {
        for package in &mut self.packages {
            package.selected = false;
        }
    }

    pub fn select_installed(&mut self) {
        self.select_where(|p| p.installed);
    }

    /// Additive: packages outside `level` keep their selection
    pub fn select_by_risk_level(&mut self, level: &str) {
        self.select_where(|p| p.risk_level == level);
    }

    /// Additive: packages outside `category` keep their selection
    pub fn select_by_category(&mut self, category: &str) {
        self.select_where(|p| p.category == category);
    }

    /// Flip the selection at `index`; out of range is a no-op
    pub fn toggle(&mut self, index: usize) {
        if let Some(package) = self.packages.get_mut(index) {
            package.selected = !package.selected;
        }
    }

    fn select_where(&mut self, pred: impl Fn(&Package) -> bool) {
        for package in &mut self.packages {
            if pred(package) {
                package.selected = true;
            }
        }
    }

    // ----- queries -----

    pub fn selected(&self) -> Vec<&Package> {
        self.packages.iter().filter(|p| p.selected).collect()
    }

    pub fn count_total(&self) -> usize {
        self.packages.len()
    }

    pub fn count_selected(&self) -> usize {
        self.packages.iter().filter(|p| p.selected).count()
    }

    pub fn count_installed(&self) -> usize {
        self.packages.iter().filter(|p| p.installed).count()
    }

    /// Indices of packages whose name or description contains `query`,
    /// ignoring case. An empty query matches everything.
    pub fn search_indices(&self, query: &str) -> Vec<usize> {
        let needle = query.to_lowercase();
        self.indices_where(|p| p.matches_lowercase(&needle))
    }

    pub fn search(&self, query: &str) -> Vec<&Package> {
        self.resolve(self.search_indices(query))
    }

    /// Indices matching the search query and, when given, the exact
    /// category and risk level
    pub fn filter_indices(
        &self,
        query: &str,
        category: Option<&str>,
        risk_level: Option<&str>,
    ) -> Vec<usize> {
        let needle = query.to_lowercase();
        self.indices_where(|p| {
            p.matches_lowercase(&needle)
                && category.is_none_or(|c| p.category == c)
                && risk_level.is_none_or(|r| p.risk_level == r)
        })
    }

    pub fn filter_by_risk_level(&self, level: &str) -> Vec<&Package> {
        self.packages
            .iter()
            .filter(|p| p.risk_level == level)
            .collect()
    }

    pub fn filter_by_category(&self, category: &str) -> Vec<&Package> {
        self.packages
            .iter()
            .filter(|p| p.category == category)
            .collect()
    }

    /// Non-empty categories, sorted
    pub fn distinct_categories(&self) -> Vec<String> {
        distinct(self.packages.iter().map(|p| p.category.as_str()))
    }

    /// Non-empty risk levels, sorted
    pub fn distinct_risk_levels(&self) -> Vec<String> {
        distinct(self.packages.iter().map(|p| p.risk_level.as_str()))
    }

    fn indices_where(&self, pred: impl Fn(&Package) -> bool) -> Vec<usize> {
        self.packages
            .iter()
            .enumerate()
            .filter(|(_, p)| pred(*p))
            .map(|(i, _)| i)
            .collect()
    }

    fn resolve(&self, indices: Vec<usize>) -> Vec<&Package> {
        indices.into_iter().map(|i| &self.packages[i]).collect()
    }

    // ----- backups -----

    /// Write the selected packages to `dir/backup_<YYYYMMDD_HHMMSS>.txt`
    pub fn save_backup<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| CleanerError::io("create directory", dir, e))?;

        let mut content = String::new();
        for package in self.packages.iter().filter(|p| p.selected) {
            let _ = writeln!(content, "{}", package.backup_line());
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let (path, mut file) = create_backup_file(dir, &timestamp)?;
        file.write_all(content.as_bytes())
            .map_err(|e| CleanerError::io("write", &path, e))?;

        info!(
            "Saved backup of {} packages to {}",
            self.count_selected(),
            path.display()
        );
        Ok(path)
    }

    /// Select every package named in the backup at `path`.
    ///
    /// Returns how many backup lines matched a catalog entry. The file is
    /// read completely before any selection changes.
    pub fn load_backup<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| CleanerError::io("read", path, e))?;

        let mut matched = 0;
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let name = line.split('|').next().unwrap_or_default().trim();
            if let Some(package) = self.packages.iter_mut().find(|p| p.name == name) {
                package.selected = true;
                matched += 1;
            }
        }

        info!("Restored {} selections from {}", matched, path.display());
        Ok(matched)
    }

    /// Newest `backup_*.txt` in `dir`, if any
    pub fn latest_backup<P: AsRef<Path>>(dir: P) -> Result<Option<PathBuf>> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| CleanerError::io("list", dir, e))?;

        // Timestamped names sort chronologically
        let latest = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(BACKUP_PREFIX) && n.ends_with(BACKUP_SUFFIX))
            })
            .max();
        Ok(latest)
    }
}

/// Create a new backup file for `timestamp` without replacing an earlier one.
///
/// Saves within the same second get a `_NN` suffix, which still sorts after
/// the unsuffixed name.
fn create_backup_file(dir: &Path, timestamp: &str) -> Result<(PathBuf, fs::File)> {
    for attempt in 0..MAX_BACKUPS_PER_SECOND {
        let name = if attempt == 0 {
            format!("{BACKUP_PREFIX}{timestamp}{BACKUP_SUFFIX}")
        } else {
            format!("{BACKUP_PREFIX}{timestamp}_{attempt:02}{BACKUP_SUFFIX}")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("Backup {} exists, trying next suffix", path.display());
            }
            Err(e) => return Err(CleanerError::io("create", &path, e)),
        }
    }
    Err(CleanerError::io(
        "create",
        dir,
        std::io::Error::new(ErrorKind::AlreadyExists, "too many backups in one second"),
    ))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = "\
# Samsung bloat
com.samsung.android.bixby.agent # Bixby voice assistant | Assistant | SAFE
com.facebook.katana # Facebook
com.android.systemui # System UI | Core | DANGER

com.example.bare
com.example.partial # Partial | Extras
";

    #[test]
    fn test_parse_full_annotation() {
        let package =
            parse_manifest_line("com.foo.bar # Bloatware app | Bloat | SAFE").expect("package");
        assert_eq!(package.name, "com.foo.bar");
        assert_eq!(package.description, "Bloatware app");
        assert_eq!(package.category, "Bloat");
        assert_eq!(package.risk_level, "SAFE");
        assert!(!package.installed);
        assert!(!package.selected);
    }

    #[test]
    fn test_parse_skips_blank_and_comment_lines() {
        assert!(parse_manifest_line("").is_none());
        assert!(parse_manifest_line("   ").is_none());
        assert!(parse_manifest_line("# com.commented.out").is_none());
    }

    #[test]
    fn test_parse_without_annotation() {
        let package = parse_manifest_line("  com.example.bare  ").expect("package");
        assert_eq!(package, Package::new("com.example.bare"));
    }

    #[test]
    fn test_parse_description_only() {
        let package = parse_manifest_line("com.facebook.katana # Facebook app").expect("package");
        assert_eq!(package.description, "Facebook app");
        assert!(package.category.is_empty());
        assert!(package.risk_level.is_empty());
    }

    #[test]
    fn test_parse_partial_and_extra_fields() {
        let partial = parse_manifest_line("a.b # Desc | Cat").expect("package");
        assert_eq!(partial.category, "Cat");
        assert!(partial.risk_level.is_empty());

        let extra = parse_manifest_line("a.b # D | C | RISKY | ignored").expect("package");
        assert_eq!(extra.risk_level, "RISKY");
    }

    #[test]
    fn test_parse_splits_on_first_hash_only() {
        let package = parse_manifest_line("a.b # first # second").expect("package");
        assert_eq!(package.name, "a.b");
        assert_eq!(package.description, "first # second");
    }

    #[test]
    fn test_catalog_keeps_manifest_order() {
        let catalog = Catalog::parse(MANIFEST);
        let names: Vec<&str> = catalog.packages().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "com.samsung.android.bixby.agent",
                "com.facebook.katana",
                "com.android.systemui",
                "com.example.bare",
                "com.example.partial",
            ]
        );
    }

    #[test]
    fn test_refresh_installed_overwrites() {
        let mut catalog = Catalog::parse(MANIFEST);
        let first: HashSet<String> = ["com.facebook.katana".to_string()].into();
        catalog.refresh_installed(&first);
        assert_eq!(catalog.count_installed(), 1);

        let second: HashSet<String> = ["com.example.bare".to_string()].into();
        catalog.refresh_installed(&second);
        assert_eq!(catalog.count_installed(), 1);
        assert!(!catalog.packages()[1].installed);
        assert!(catalog.packages()[3].installed);
    }

    #[test]
    fn test_bulk_selection() {
        let mut catalog = Catalog::parse(MANIFEST);
        catalog.select_all();
        assert_eq!(catalog.count_selected(), catalog.count_total());
        catalog.deselect_all();
        assert_eq!(catalog.count_selected(), 0);
    }

    #[test]
    fn test_predicate_selection_is_additive() {
        let mut catalog = Catalog::parse(MANIFEST);
        catalog.toggle(1);
        catalog.select_by_risk_level("SAFE");
        assert_eq!(catalog.count_selected(), 2);

        catalog.select_by_category("Core");
        let names: Vec<&str> = catalog.selected().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "com.samsung.android.bixby.agent",
                "com.facebook.katana",
                "com.android.systemui",
            ]
        );
    }

    #[test]
    fn test_select_installed() {
        let mut catalog = Catalog::parse(MANIFEST);
        let installed: HashSet<String> = ["com.android.systemui".to_string()].into();
        catalog.refresh_installed(&installed);
        catalog.select_installed();
        assert_eq!(catalog.count_selected(), 1);
        assert!(catalog.packages()[2].selected);
    }

    #[test]
    fn test_toggle_out_of_bounds_is_noop() {
        let mut catalog = Catalog::parse(MANIFEST);
        let before = catalog.clone();
        catalog.toggle(99);
        assert_eq!(catalog, before);
    }

    #[test]
    fn test_search_is_case_insensitive_on_name_and_description() {
        let catalog = Catalog::parse(MANIFEST);
        let by_name: Vec<&str> = catalog
            .search("FACEBOOK")
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(by_name, vec!["com.facebook.katana"]);

        let by_description = catalog.search("voice");
        assert_eq!(by_description.len(), 1);
        assert_eq!(catalog.search("").len(), catalog.count_total());
        assert!(catalog.search("no-such-package").is_empty());
    }

    #[test]
    fn test_filter_indices_combines_constraints() {
        let catalog = Catalog::parse(MANIFEST);
        assert_eq!(catalog.filter_indices("", Some("Core"), None), vec![2]);
        assert_eq!(catalog.filter_indices("com", None, Some("SAFE")), vec![0]);
        assert!(catalog.filter_indices("facebook", Some("Core"), None).is_empty());
    }

    #[test]
    fn test_filters_and_distinct_values() {
        let catalog = Catalog::parse(MANIFEST);
        assert_eq!(catalog.filter_by_risk_level("DANGER").len(), 1);
        assert_eq!(catalog.filter_by_category("Extras").len(), 1);
        assert_eq!(
            catalog.distinct_categories(),
            vec!["Assistant", "Core", "Extras"]
        );
        assert_eq!(catalog.distinct_risk_levels(), vec!["DANGER", "SAFE"]);
    }

    #[test]
    fn test_duplicate_names_stay_separate() {
        let mut catalog = Catalog::parse("dup.pkg # first\ndup.pkg # second\n");
        assert_eq!(catalog.count_total(), 2);
        catalog.toggle(1);
        assert!(!catalog.packages()[0].selected);
        assert!(catalog.packages()[1].selected);
    }
}
