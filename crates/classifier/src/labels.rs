//! Class name resolution.
//!
//! Strategies run in the configured order and the first one that yields a
//! non-empty list wins. Every failure inside a strategy (missing file, bad
//! JSON, absent key) just moves on to the next one; resolution itself cannot
//! fail and ends with [`DEFAULT_CLASS_NAMES`] when nothing else applies.

use {
    crate::assets::AssetStore,
    regex::Regex,
    std::{
        collections::HashMap,
        fmt,
        path::Path,
        str::FromStr,
        sync::LazyLock,
    },
};

pub const DEFAULT_CLASS_NAMES: [&str; 2] = ["food", "not_food"];

/// Metadata keys that may carry class names, in lookup order.
pub const METADATA_KEYS: [&str; 5] = ["labels", "classes", "class_names", "label_names", "labels_json"];

static ARRAY_LITERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]+\]").expect("static regex"));

static KEYWORD_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:labels|class_names|classes)[^:\n\r]{0,120}([A-Za-z0-9_\s,\-/]+)(?:\n|$)")
        .expect("static regex")
});

static LIST_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,;\n]+").expect("static regex"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelStrategy {
    /// JSON array in the label file.
    File,
    /// Custom metadata embedded in the model.
    Metadata,
    /// Text scan of the raw model bytes.
    ModelScan,
}

impl LabelStrategy {
    pub const ALL: [LabelStrategy; 3] = [LabelStrategy::File, LabelStrategy::Metadata, LabelStrategy::ModelScan];
}

impl FromStr for LabelStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(LabelStrategy::File),
            "metadata" => Ok(LabelStrategy::Metadata),
            "model_scan" | "modelscan" | "scan" => Ok(LabelStrategy::ModelScan),
            other => Err(format!("unknown label strategy: {}", other)),
        }
    }
}

/// Where a resolved list came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelOrigin {
    File,
    Metadata,
    ModelScan,
    Default,
}

impl From<LabelStrategy> for LabelOrigin {
    fn from(strategy: LabelStrategy) -> Self {
        match strategy {
            LabelStrategy::File => LabelOrigin::File,
            LabelStrategy::Metadata => LabelOrigin::Metadata,
            LabelStrategy::ModelScan => LabelOrigin::ModelScan,
        }
    }
}

impl fmt::Display for LabelOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LabelOrigin::File => "label file",
            LabelOrigin::Metadata => "model metadata",
            LabelOrigin::ModelScan => "model byte scan",
            LabelOrigin::Default => "built-in default",
        };
        f.write_str(name)
    }
}

/// Ordered class names, index = model output index. Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassNames {
    names: Vec<String>,
    origin: LabelOrigin,
}

impl ClassNames {
    pub fn default_names() -> Self {
        Self {
            names: DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
            origin: LabelOrigin::Default,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn origin(&self) -> LabelOrigin {
        self.origin
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Everything the strategies may look at.
pub struct LabelSources<'a> {
    pub store: &'a dyn AssetStore,
    pub labels_path: &'a Path,
    pub model_path: &'a Path,
    /// Custom metadata of the loaded model, if one is loaded.
    pub metadata: Option<&'a HashMap<String, String>>,
}

/// Runs `strategies` in order and returns the first non-empty list.
pub fn resolve(sources: &LabelSources<'_>, strategies: &[LabelStrategy]) -> ClassNames {
    for &strategy in strategies {
        let names = match strategy {
            LabelStrategy::File => from_label_file(sources.store, sources.labels_path),
            LabelStrategy::Metadata => sources.metadata.and_then(from_metadata),
            LabelStrategy::ModelScan => from_model_bytes(sources.store, sources.model_path),
        };
        match names {
            Some(names) => {
                let origin = LabelOrigin::from(strategy);
                log::info!("resolved {} class names from {}", names.len(), origin);
                return ClassNames { names, origin };
            }
            None => log::debug!("label strategy {:?} produced nothing", strategy),
        }
    }
    let names = ClassNames::default_names();
    log::info!("using {} class names from {}", names.len(), names.origin());
    names
}

fn from_label_file(store: &dyn AssetStore, path: &Path) -> Option<Vec<String>> {
    let bytes = match store.read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("label file {} unreadable: {}", path.display(), e);
            return None;
        }
    };
    let text = match std::str::from_utf8(&bytes) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("label file {} is not UTF-8: {}", path.display(), e);
            return None;
        }
    };
    let names = parse_string_array(text);
    if names.is_none() {
        log::debug!("label file {} is not a JSON array of strings", path.display());
    }
    names
}

/// First known key, case-insensitive, that yields names.
///
/// A value that is valid JSON but not an array of strings skips the key.
/// A value that is not JSON at all is split as a plain list.
fn from_metadata(metadata: &HashMap<String, String>) -> Option<Vec<String>> {
    for key in METADATA_KEYS {
        let Some(raw) = lookup_ignore_case(metadata, key) else {
            continue;
        };
        if raw.is_empty() {
            continue;
        }
        let names = match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(value) => string_array(value),
            Err(_) => split_list(raw),
        };
        if names.is_some() {
            return names;
        }
        log::debug!("metadata key {} holds no usable class names", key);
    }
    None
}

fn lookup_ignore_case<'m>(metadata: &'m HashMap<String, String>, key: &str) -> Option<&'m str> {
    metadata
        .get(key)
        .or_else(|| {
            metadata
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
        .map(String::as_str)
}

/// Best-effort text scan of the model file.
fn from_model_bytes(store: &dyn AssetStore, path: &Path) -> Option<Vec<String>> {
    let bytes = match store.read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("model file {} unreadable for label scan: {}", path.display(), e);
            return None;
        }
    };
    scan_text(&String::from_utf8_lossy(&bytes))
}

/// The first bracketed span parsed as a JSON string array, else the list
/// that follows a `labels`/`class_names`/`classes` keyword.
pub fn scan_text(text: &str) -> Option<Vec<String>> {
    if let Some(found) = ARRAY_LITERAL.find(text) {
        if let Some(names) = parse_string_array(found.as_str()) {
            return Some(names);
        }
    }
    let captures = KEYWORD_LIST.captures(text)?;
    split_list(captures.get(1)?.as_str())
}

/// A non-empty JSON array made only of strings.
pub fn parse_string_array(text: &str) -> Option<Vec<String>> {
    string_array(serde_json::from_str(text).ok()?)
}

fn string_array(value: serde_json::Value) -> Option<Vec<String>> {
    let names = serde_json::from_value::<Vec<String>>(value).ok()?;
    (!names.is_empty()).then_some(names)
}

/// Splits on commas, semicolons and newlines; trims; drops empty entries.
pub fn split_list(raw: &str) -> Option<Vec<String>> {
    let names: Vec<String> = LIST_SEPARATORS
        .split(raw)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!names.is_empty()).then_some(names)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::{io, path::PathBuf},
    };

    struct MapStore(HashMap<PathBuf, Vec<u8>>);

    impl AssetStore for MapStore {
        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }
    }

    fn store(files: &[(&str, &[u8])]) -> MapStore {
        MapStore(files.iter().map(|(p, b)| (PathBuf::from(p), b.to_vec())).collect())
    }

    fn sources<'a>(store: &'a MapStore, metadata: Option<&'a HashMap<String, String>>) -> LabelSources<'a> {
        LabelSources {
            store,
            labels_path: Path::new("/a/class_names.json"),
            model_path: Path::new("/a/model.onnx"),
            metadata,
        }
    }

    fn meta(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_label_file_wins_over_metadata() {
        let store = store(&[("/a/class_names.json", br#"["x","y"]"#)]);
        let metadata = meta(&[("classes", "a,b")]);
        let names = resolve(&sources(&store, Some(&metadata)), &LabelStrategy::ALL);
        assert_eq!(names.names(), ["x", "y"]);
        assert_eq!(names.origin(), LabelOrigin::File);
    }

    #[test]
    fn test_metadata_plain_list() {
        let store = store(&[]);
        let metadata = meta(&[("classes", "a, b;\nc")]);
        let names = resolve(&sources(&store, Some(&metadata)), &LabelStrategy::ALL);
        assert_eq!(names.names(), ["a", "b", "c"]);
        assert_eq!(names.origin(), LabelOrigin::Metadata);
    }

    #[test]
    fn test_metadata_json_and_case() {
        let metadata = meta(&[("CLASS_NAMES", r#"["pizza","salad"]"#)]);
        assert_eq!(from_metadata(&metadata), Some(vec!["pizza".to_string(), "salad".to_string()]));
    }

    #[test]
    fn test_metadata_key_priority() {
        let metadata = meta(&[("label_names", "late"), ("labels", "early")]);
        assert_eq!(from_metadata(&metadata), Some(vec!["early".to_string()]));
    }

    #[test]
    fn test_metadata_non_string_json_skips_key() {
        let metadata = meta(&[("labels", "[1,2]"), ("classes", "a,b")]);
        assert_eq!(from_metadata(&metadata), Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(from_metadata(&meta(&[("labels", "[1,2]")])), None);
    }

    #[test]
    fn test_bad_label_file_falls_through() {
        let store = store(&[("/a/class_names.json", b"{not json")]);
        let metadata = meta(&[("labels", "one")]);
        let names = resolve(&sources(&store, Some(&metadata)), &LabelStrategy::ALL);
        assert_eq!(names.names(), ["one"]);
    }

    #[test]
    fn test_empty_label_file_falls_through() {
        let store = store(&[("/a/class_names.json", b"[]")]);
        let names = resolve(&sources(&store, None), &[LabelStrategy::File]);
        assert_eq!(names, ClassNames::default_names());
    }

    #[test]
    fn test_scan_array_literal() {
        let store = store(&[("/a/model.onnx", b"\x08\x07junk\x00[\"burger\",\"fries\"]\x12more")]);
        let names = resolve(&sources(&store, None), &LabelStrategy::ALL);
        assert_eq!(names.names(), ["burger", "fries"]);
        assert_eq!(names.origin(), LabelOrigin::ModelScan);
    }

    #[test]
    fn test_scan_keyword_list() {
        // the filler run is capped, so a list past it is captured whole
        let text = format!("\x01labels{}pizza, sushi, ramen\n\x02", " ".repeat(120));
        assert_eq!(
            scan_text(&text),
            Some(vec!["pizza".to_string(), "sushi".to_string(), "ramen".to_string()])
        );
    }

    #[test]
    fn test_scan_nothing() {
        assert_eq!(scan_text("\x00\x01\x02 no names in here: none"), None);
        assert_eq!(scan_text("[] [1, 2]"), None);
    }

    #[test]
    fn test_disabled_scan_defaults() {
        let store = store(&[("/a/model.onnx", br#"["burger","fries"]"#)]);
        let names = resolve(
            &sources(&store, None),
            &[LabelStrategy::File, LabelStrategy::Metadata],
        );
        assert_eq!(names.names(), DEFAULT_CLASS_NAMES);
        assert_eq!(names.origin(), LabelOrigin::Default);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" ; ,\n"), None);
        assert_eq!(split_list("a;;b"), Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("File".parse::<LabelStrategy>(), Ok(LabelStrategy::File));
        assert_eq!("model_scan".parse::<LabelStrategy>(), Ok(LabelStrategy::ModelScan));
        assert!("guess".parse::<LabelStrategy>().is_err());
    }
}
