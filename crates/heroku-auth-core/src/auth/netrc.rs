//! Machine-credential store backed by a netrc file.
//!
//! The same file is read by git and curl, so everything this crate does not
//! manage (other machines, `default`, `macdef` blocks, comment lines) is kept
//! in place when the file is rewritten.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use super::types::MachineEntry;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Mapping of host name to login credentials, persisted as a whole.
pub trait MachineStore: Send {
    fn machine(&self, host: &str) -> Option<MachineEntry>;

    fn set_machine(&mut self, host: &str, entry: MachineEntry);

    /// Returns true if an entry was removed.
    fn remove_machine(&mut self, host: &str) -> bool;

    /// Commit every entry to the backing storage.
    fn save(&mut self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Machine {
    login: Option<String>,
    password: Option<String>,
    account: Option<String>,
}

impl Machine {
    fn write_to(&self, out: &mut String) {
        for (key, value) in [
            ("login", &self.login),
            ("password", &self.password),
            ("account", &self.account),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                out.push_str(&format!("  {} {}\n", key, quote(value)));
            }
        }
    }
}

/// One top-level element of the file, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Comment(String),
    Machine(String, Machine),
    Default(Machine),
    /// `macdef <name>` header and body lines, without the closing blank line.
    Macro(String),
}

#[derive(Debug, Clone, Default)]
pub struct Netrc {
    path: PathBuf,
    items: Vec<Item>,
}

impl Netrc {
    /// Load the store at `path`. A missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No netrc file, starting empty");
                String::new()
            }
            Err(e) => return Err(e.into()),
        };
        let mut netrc = Self::parse(&contents)?;
        netrc.path = path;
        Ok(netrc)
    }

    fn parse(contents: &str) -> Result<Self, StoreError> {
        let mut netrc = Netrc::default();
        // Index into `items` of the entry that field tokens apply to.
        let mut current: Option<usize> = None;
        let mut lines = contents.lines().enumerate();

        while let Some((idx, line)) = lines.next() {
            let line_no = idx + 1;
            if line.trim_start().starts_with('#') {
                netrc.items.push(Item::Comment(line.to_string()));
                continue;
            }

            let parse_error = |message: String| StoreError::Parse {
                line: line_no,
                message,
            };
            let mut tokens = tokenize(line).map_err(parse_error)?.into_iter();

            while let Some(token) = tokens.next() {
                match token.as_str() {
                    "machine" => {
                        let host = next_value(&mut tokens, line_no, &token)?;
                        netrc.items.push(Item::Machine(host, Machine::default()));
                        current = Some(netrc.items.len() - 1);
                    }
                    "default" => {
                        netrc.items.push(Item::Default(Machine::default()));
                        current = Some(netrc.items.len() - 1);
                    }
                    "login" | "password" | "account" => {
                        let value = next_value(&mut tokens, line_no, &token)?;
                        let entry = match current {
                            Some(i) => netrc.items.get_mut(i),
                            None => None,
                        };
                        let machine = match entry {
                            Some(Item::Machine(_, machine)) | Some(Item::Default(machine)) => machine,
                            _ => {
                                return Err(parse_error(format!(
                                    "'{}' outside of a machine entry",
                                    token
                                )))
                            }
                        };
                        match token.as_str() {
                            "login" => machine.login = Some(value),
                            "password" => machine.password = Some(value),
                            _ => machine.account = Some(value),
                        }
                    }
                    "macdef" => {
                        // Only the macdef header belongs to the block; the
                        // body runs until the next blank line.
                        let header: Vec<String> = tokens.by_ref().map(|t| quote(&t)).collect();
                        let mut block = format!("macdef {}", header.join(" "));
                        for (_, body) in lines.by_ref() {
                            if body.trim().is_empty() {
                                break;
                            }
                            block.push('\n');
                            block.push_str(body);
                        }
                        netrc.items.push(Item::Macro(block));
                        current = None;
                    }
                    other => return Err(parse_error(format!("unexpected token '{}'", other))),
                }
            }
        }

        Ok(netrc)
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            match item {
                Item::Comment(line) => {
                    out.push_str(line);
                    out.push('\n');
                }
                Item::Machine(host, machine) => {
                    out.push_str(&format!("machine {}\n", quote(host)));
                    machine.write_to(&mut out);
                }
                Item::Default(machine) => {
                    out.push_str("default\n");
                    machine.write_to(&mut out);
                }
                Item::Macro(block) => {
                    out.push_str(block);
                    out.push_str("\n\n");
                }
            }
        }
        out
    }

    fn find_machine(&self, host: &str) -> Option<&Machine> {
        self.items.iter().find_map(|item| match item {
            Item::Machine(h, machine) if h.as_str() == host => Some(machine),
            _ => None,
        })
    }
}

/// Split a line into tokens. Double-quoted tokens may contain whitespace and
/// backslash escapes.
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut token = String::new();
        if c == '"' {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some(escaped) => token.push(escaped),
                        None => break,
                    },
                    c => token.push(c),
                }
            }
            if !closed {
                return Err("unterminated quoted token".to_string());
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }

    Ok(tokens)
}

/// Quote a value when it would not survive whitespace tokenizing as-is.
fn quote(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.starts_with('"')
        || value.chars().any(|c| c.is_whitespace() || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

fn next_value(
    tokens: &mut impl Iterator<Item = String>,
    line: usize,
    keyword: &str,
) -> Result<String, StoreError> {
    tokens.next().ok_or_else(|| StoreError::Parse {
        line,
        message: format!("'{}' is missing a value", keyword),
    })
}

impl MachineStore for Netrc {
    fn machine(&self, host: &str) -> Option<MachineEntry> {
        self.find_machine(host).map(|m| MachineEntry {
            login: m.login.clone().unwrap_or_default(),
            password: m.password.clone().unwrap_or_default(),
        })
    }

    fn set_machine(&mut self, host: &str, entry: MachineEntry) {
        let existing = self.items.iter_mut().find_map(|item| match item {
            Item::Machine(h, machine) if h.as_str() == host => Some(machine),
            _ => None,
        });
        if let Some(machine) = existing {
            machine.login = Some(entry.login);
            machine.password = Some(entry.password);
            return;
        }

        // `default` must stay after every machine entry.
        let machine = Machine {
            login: Some(entry.login),
            password: Some(entry.password),
            account: None,
        };
        let at = self
            .items
            .iter()
            .position(|item| matches!(item, Item::Default(_)))
            .unwrap_or(self.items.len());
        self.items.insert(at, Item::Machine(host.to_string(), machine));
    }

    fn remove_machine(&mut self, host: &str) -> bool {
        let before = self.items.len();
        self.items
            .retain(|item| !matches!(item, Item::Machine(h, _) if h.as_str() == host));
        self.items.len() != before
    }

    /// Write to a temp file beside the target, then rename over it.
    /// Temp files are created owner-only (0600 on Unix).
    fn save(&mut self) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut file = NamedTempFile::new_in(&dir)?;
        file.write_all(self.render().as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), items = self.items.len(), "Saved netrc");
        Ok(())
    }
}
