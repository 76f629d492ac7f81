use std::borrow::Cow;
use std::env;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use encoding_rs::{UTF_8, WINDOWS_1252};
use java_properties::{LineContent, PropertiesIter};
use regex::Regex;

use crate::error::ConfigError;

const INCLUDE: &str = "include";
const INCLUDE_OPTIONAL: &str = "includeoptional";

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("variable pattern is valid"));

/// An ordered key/value configuration in the Java properties format.
///
/// Keys are case-sensitive and may repeat; every value of a repeated key is
/// kept in file order and the scalar getters return the first one. Values are
/// never split on commas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, Vec<String>)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a properties file, following `include` directives relative to
    /// the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("Loading properties from '{}'", path.display());
        let mut properties = Properties::new();
        properties.load_file(path, &mut Vec::new(), false)?;
        Ok(properties)
    }

    /// Reads properties from an already opened source such as a file handle.
    /// Includes are resolved against the working directory.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, ConfigError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| ConfigError::Load {
                path: PathBuf::from("<reader>"),
                source,
            })?;
        Self::parse(&decode(&bytes))
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut properties = Properties::new();
        properties.parse_into(text, None, &mut Vec::new())?;
        Ok(properties)
    }

    /// Replaces every value of `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(idx) => self.entries[idx].1 = vec![value],
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Appends `value` to the values of `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(idx) => self.entries[idx].1.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Keys in the order they were first seen.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match self.first(key) {
            Some(raw) => self.interpolate(raw, &mut vec![key.to_owned()]).map(Some),
            None => Ok(None),
        }
    }

    /// Every value of `key` in file order; empty when the key is absent.
    pub fn get_string_list(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        let Some(idx) = self.position(key) else {
            return Ok(Vec::new());
        };
        self.entries[idx]
            .1
            .iter()
            .map(|raw| self.interpolate(raw, &mut vec![key.to_owned()]))
            .collect()
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        let Some(value) = self.get_string(key)? else {
            return Ok(None);
        };
        parse_bool(&value)
            .map(Some)
            .ok_or_else(|| type_error(key, value, "boolean"))
    }

    /// Reads an integer in decimal, `0x` hexadecimal or `0b` binary notation
    /// and checks that it fits in `T`.
    pub fn get_int<T: TryFrom<i64>>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let Some(value) = self.get_string(key)? else {
            return Ok(None);
        };
        parse_int(&value)
            .and_then(|n| T::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| type_error(key, value, "integer"))
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    fn first(&self, key: &str) -> Option<&str> {
        self.position(key)
            .and_then(|idx| self.entries[idx].1.first())
            .map(String::as_str)
    }

    fn load_file(
        &mut self,
        path: &Path,
        stack: &mut Vec<PathBuf>,
        optional: bool,
    ) -> Result<(), ConfigError> {
        if optional && !path.exists() {
            log::debug!("Skipping missing optional include '{}'", path.display());
            return Ok(());
        }
        let bytes = fs::read(path).map_err(|source| ConfigError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let text = decode(&bytes);

        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if stack.contains(&canonical) {
            return Err(ConfigError::Include(path.to_path_buf()));
        }

        stack.push(canonical);
        let result = self.parse_into(&text, path.parent(), stack);
        stack.pop();
        result
    }

    fn parse_into(
        &mut self,
        text: &str,
        base: Option<&Path>,
        stack: &mut Vec<PathBuf>,
    ) -> Result<(), ConfigError> {
        for line in PropertiesIter::new_with_encoding(text.as_bytes(), UTF_8) {
            let line = line.map_err(|e| ConfigError::Syntax {
                line: e.line_number().unwrap_or_default(),
                message: e.to_string(),
            })?;
            let LineContent::KVPair(key, value) = line.consume_content() else {
                continue;
            };
            let value = value.trim_end().to_owned();

            if key == INCLUDE || key == INCLUDE_OPTIONAL {
                let target = self.interpolate(&value, &mut Vec::new())?;
                let target = match base {
                    Some(dir) => dir.join(target),
                    None => PathBuf::from(target),
                };
                self.load_file(&target, stack, key == INCLUDE_OPTIONAL)?;
            } else {
                self.add(key, value);
            }
        }
        Ok(())
    }

    fn interpolate(&self, value: &str, resolving: &mut Vec<String>) -> Result<String, ConfigError> {
        if !value.contains("${") {
            return Ok(value.to_owned());
        }

        let mut out = String::with_capacity(value.len());
        let mut last = 0;
        for caps in VARIABLE.captures_iter(value) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&value[last..whole.start()]);
            match self.resolve_variable(name.as_str(), resolving)? {
                Some(resolved) => out.push_str(&resolved),
                None => out.push_str(whole.as_str()),
            }
            last = whole.end();
        }
        out.push_str(&value[last..]);
        Ok(out)
    }

    fn resolve_variable(
        &self,
        name: &str,
        resolving: &mut Vec<String>,
    ) -> Result<Option<String>, ConfigError> {
        if let Some(var) = name.strip_prefix("env:") {
            return Ok(env::var(var).ok());
        }
        if resolving.iter().any(|key| key == name) {
            return Err(ConfigError::Interpolation(name.to_owned()));
        }
        let Some(raw) = self.first(name) else {
            return Ok(None);
        };

        resolving.push(name.to_owned());
        let resolved = self.interpolate(raw, resolving);
        resolving.pop();
        resolved.map(Some)
    }
}

impl FromStr for Properties {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// UTF-8 when the bytes are valid UTF-8, ISO-8859-1 otherwise.
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    UTF_8
        .decode_without_bom_handling_and_without_replacement(bytes)
        .unwrap_or_else(|| WINDOWS_1252.decode_without_bom_handling(bytes).0)
}

fn type_error(key: &str, value: String, expected: &'static str) -> ConfigError {
    ConfigError::Type {
        key: key.to_owned(),
        value,
        expected,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "y" | "t" => Some(true),
        "false" | "no" | "off" | "n" | "f" => Some(false),
        _ => None,
    }
}

fn parse_int(value: &str) -> Option<i64> {
    let value = value.trim();
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    if digits.starts_with(['+', '-']) {
        return None;
    }

    let magnitude = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2)
    } else {
        digits.parse::<i64>()
    }
    .ok()?;

    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_separators_and_comments() {
        let props = Properties::parse(
            "# comment\n! also a comment\n\nNick = bob\nServer:irc.example.org\nPort 6697\n  RealName   Bob the Bot\nEmpty\n",
        )
        .unwrap();

        assert_eq!(props.get_string("Nick").unwrap().as_deref(), Some("bob"));
        assert_eq!(props.get_string("Server").unwrap().as_deref(), Some("irc.example.org"));
        assert_eq!(props.get_string("Port").unwrap().as_deref(), Some("6697"));
        assert_eq!(props.get_string("RealName").unwrap().as_deref(), Some("Bob the Bot"));
        assert_eq!(props.get_string("Empty").unwrap().as_deref(), Some(""));
        assert_eq!(
            props.keys().collect::<Vec<_>>(),
            ["Nick", "Server", "Port", "RealName", "Empty"]
        );
    }

    #[test]
    fn keys_are_case_sensitive() {
        let props = Properties::parse("nick=lower\n").unwrap();
        assert!(!props.contains_key("Nick"));
        assert!(props.contains_key("nick"));
    }

    #[test]
    fn joins_continuation_lines() {
        let props = Properties::parse("Channels = #one, \\\n    #two\nNick=bob\n").unwrap();
        assert_eq!(props.get_string("Channels").unwrap().as_deref(), Some("#one, #two"));
        assert_eq!(props.get_string("Nick").unwrap().as_deref(), Some("bob"));
    }

    #[test]
    fn double_backslash_does_not_continue() {
        let props = Properties::parse("Path = C:\\\\\nNick=bob\n").unwrap();
        assert_eq!(props.get_string("Path").unwrap().as_deref(), Some("C:\\"));
        assert_eq!(props.get_string("Nick").unwrap().as_deref(), Some("bob"));
    }

    #[test]
    fn decodes_escapes() {
        let props = Properties::parse("Finger = tab\\there \\u00e9t\\u00e9\nmy\\ key = x\\=y\n").unwrap();
        assert_eq!(props.get_string("Finger").unwrap().as_deref(), Some("tab\there été"));
        assert_eq!(props.get_string("my key").unwrap().as_deref(), Some("x=y"));
    }

    #[test]
    fn trailing_whitespace_is_trimmed() {
        let props = Properties::parse("Nick = bob   \nServer = irc.example.org\t\n").unwrap();
        assert_eq!(props.get_string("Nick").unwrap().as_deref(), Some("bob"));
        assert_eq!(props.get_string("Server").unwrap().as_deref(), Some("irc.example.org"));
    }

    #[test]
    fn malformed_unicode_escape_is_a_syntax_error() {
        let err = Properties::parse("Nick = ok\nFinger = \\u12G4\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { .. }), "{err:?}");
    }

    #[test]
    fn values_are_not_split_on_commas() {
        let props = Properties::parse("RealName = Doe, John\n").unwrap();
        assert_eq!(props.get_string_list("RealName").unwrap(), ["Doe, John"]);
    }

    #[test]
    fn repeated_keys_accumulate() {
        let props = Properties::parse("Channels = #a\nChannels = #b\n").unwrap();
        assert_eq!(props.get_string("Channels").unwrap().as_deref(), Some("#a"));
        assert_eq!(props.get_string_list("Channels").unwrap(), ["#a", "#b"]);
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn set_replaces_and_add_appends() {
        let mut props = Properties::new();
        props.add("Channels", "#a");
        props.add("Channels", "#b");
        props.set("Channels", "#c");
        assert_eq!(props.get_string_list("Channels").unwrap(), ["#c"]);
        assert!(props.get_string_list("Missing").unwrap().is_empty());
    }

    #[test]
    fn converts_booleans() {
        let props = Properties::parse("A=true\nB=OFF\nC=yes\nD=n\nE=maybe\n").unwrap();
        assert_eq!(props.get_bool("A").unwrap(), Some(true));
        assert_eq!(props.get_bool("B").unwrap(), Some(false));
        assert_eq!(props.get_bool("C").unwrap(), Some(true));
        assert_eq!(props.get_bool("D").unwrap(), Some(false));
        assert_eq!(props.get_bool("Missing").unwrap(), None);

        let err = props.get_bool("E").unwrap_err();
        assert!(matches!(err, ConfigError::Type { expected: "boolean", .. }), "{err:?}");
    }

    #[test]
    fn converts_integers() {
        let props = Properties::parse("Dec=6697\nHex=0x1A0B\nBin=0b101\nNeg=-1\nBig=70000\nBad=notanumber\n").unwrap();
        assert_eq!(props.get_int::<u16>("Dec").unwrap(), Some(6697));
        assert_eq!(props.get_int::<u16>("Hex").unwrap(), Some(0x1A0B));
        assert_eq!(props.get_int::<u16>("Bin").unwrap(), Some(5));
        assert_eq!(props.get_int::<i32>("Neg").unwrap(), Some(-1));
        assert!(props.get_int::<u16>("Neg").is_err());
        assert!(props.get_int::<u16>("Big").is_err());
        assert!(matches!(
            props.get_int::<u16>("Bad"),
            Err(ConfigError::Type { expected: "integer", .. })
        ));
    }

    #[test]
    fn interpolates_other_keys() {
        let props = Properties::parse("Nick = bob\nRealName = ${Nick} the bot\nFinger = ${Missing}\n").unwrap();
        assert_eq!(props.get_string("RealName").unwrap().as_deref(), Some("bob the bot"));
        assert_eq!(props.get_string("Finger").unwrap().as_deref(), Some("${Missing}"));
    }

    #[test]
    fn interpolates_environment() {
        let props = Properties::parse("Home = ${env:PATH}\n").unwrap();
        let expected = env::var("PATH").unwrap_or_else(|_| "${env:PATH}".to_owned());
        assert_eq!(props.get_string("Home").unwrap(), Some(expected));
    }

    #[test]
    fn rejects_cyclic_interpolation() {
        let props = Properties::parse("A = ${B}\nB = ${A}\n").unwrap();
        assert!(matches!(props.get_string("A"), Err(ConfigError::Interpolation(_))));
    }

    #[test]
    fn reads_utf8_and_latin1_files() {
        let dir = tempfile::tempdir().unwrap();
        let utf8 = dir.path().join("utf8.properties");
        let latin1 = dir.path().join("latin1.properties");
        fs::write(&utf8, "RealName = José\n").unwrap();
        fs::write(&latin1, b"RealName = Jos\xe9\n").unwrap();

        for path in [utf8, latin1] {
            let props = Properties::load(&path).unwrap();
            assert_eq!(props.get_string("RealName").unwrap().as_deref(), Some("José"), "{path:?}");
        }

        let props = Properties::from_reader(&b"Finger = caf\xe9\n"[..]).unwrap();
        assert_eq!(props.get_string("Finger").unwrap().as_deref(), Some("café"));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = Properties::load("/definitely/not/here.properties").unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }), "{err:?}");
    }

    #[test]
    fn follows_includes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("server.properties"), "Server = irc.example.org\n").unwrap();
        fs::write(
            dir.path().join("bot.properties"),
            "Nick = bob\ninclude = server.properties\nincludeoptional = absent.properties\n",
        )
        .unwrap();

        let props = Properties::load(dir.path().join("bot.properties")).unwrap();
        assert_eq!(props.get_string("Server").unwrap().as_deref(), Some("irc.example.org"));
        assert!(!props.contains_key(INCLUDE));
    }

    #[test]
    fn missing_include_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bot.properties"), "include = absent.properties\n").unwrap();
        let err = Properties::load(dir.path().join("bot.properties")).unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }), "{err:?}");
    }

    #[test]
    fn rejects_include_cycles() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.properties"), "include = b.properties\n").unwrap();
        fs::write(dir.path().join("b.properties"), "include = a.properties\n").unwrap();
        let err = Properties::load(dir.path().join("a.properties")).unwrap_err();
        assert!(matches!(err, ConfigError::Include(_)), "{err:?}");
    }
}
