//! Structured forms of a scenario instruction.
//!
//! A scenario line such as `Maximillion Deploy 0x5aaf...` is parsed into an
//! [`Event`]: the ordered [`Fragment`]s of the line. Contract processors peel
//! off the leading namespace word and turn the remainder into a [`Command`]:
//! a verb plus positional and named arguments.
//!
//! Named arguments are written `name:value`, or `name:` followed by a
//! parenthesised list (`guardians:(0x.. 0x..)`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parse::{self, ParseError};

/// One syntactic element of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fragment {
    /// A bare word (`Deploy`, `0x5aaf...`, `1e18`).
    Word(String),
    /// A double-quoted string, unescaped.
    Quoted(String),
    /// A parenthesised group of fragments.
    List(Vec<Fragment>),
}

impl Fragment {
    /// Create a bare word fragment.
    pub fn word(word: impl Into<String>) -> Self {
        Self::Word(word.into())
    }

    /// Return the text of a bare word, if this fragment is one.
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Self::Word(word) => Some(word),
            Self::Quoted(_) | Self::List(_) => None,
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(word) => f.write_str(word),
            Self::Quoted(text) => write_quoted(f, text),
            Self::List(items) => write_list(f, items),
        }
    }
}

/// Write `text` as a bare word when it would re-parse as one, quoted otherwise.
pub(crate) fn write_text(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    let bare = !text.is_empty() && !text.chars().any(parse::ends_word);
    if bare {
        f.write_str(text)
    } else {
        write_quoted(f, text)
    }
}

/// Write `text` in double quotes, escaping quotes and backslashes.
pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("\"")
}

/// Write displayable items space-separated inside parentheses.
pub(crate) fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(")")
}

/// A complete parsed event: the ordered fragments of one scenario line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    fragments: Vec<Fragment>,
}

impl Event {
    /// Create an event from already-parsed fragments.
    pub const fn new(fragments: Vec<Fragment>) -> Self {
        Self { fragments }
    }

    /// Parse the textual form of an event.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        parse::parse_event(text)
    }

    /// The fragments of the event, in order.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Split the event into its leading word and the remaining fragments.
    ///
    /// Returns `None` when the event is empty or starts with a quoted string
    /// or a list.
    pub fn split_head(&self) -> Option<(&str, &[Fragment])> {
        let (head, rest) = self.fragments.split_first()?;
        head.as_word().map(|word| (word, rest))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, fragment) in self.fragments.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{fragment}")?;
        }
        Ok(())
    }
}

/// Errors building a [`Command`] out of event fragments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// There were no fragments to take a verb from.
    #[error("command is missing a verb")]
    MissingVerb,

    /// The first fragment was a quoted string or a list.
    #[error("command verb must be a bare word, found `{0}`")]
    VerbNotWord(String),

    /// A `name:` token was the last fragment.
    #[error("named argument `{0}` has no value")]
    MissingNamedValue(String),

    /// The same named argument appeared twice.
    #[error("named argument `{0}` given more than once")]
    DuplicateNamedArgument(String),
}

/// A verb followed by positional and named argument fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    verb: String,
    positional: Vec<Fragment>,
    named: Vec<(String, Fragment)>,
}

impl Command {
    /// Create a command with positional arguments only.
    pub fn new(verb: impl Into<String>, positional: Vec<Fragment>) -> Self {
        Self {
            verb: verb.into(),
            positional,
            named: Vec::new(),
        }
    }

    /// Build a command from fragments: the first is the verb, `name:value`
    /// tokens become named arguments, everything else stays positional.
    pub fn from_fragments(fragments: &[Fragment]) -> Result<Self, CommandError> {
        let (head, rest) = fragments.split_first().ok_or(CommandError::MissingVerb)?;
        let verb = head
            .as_word()
            .ok_or_else(|| CommandError::VerbNotWord(head.to_string()))?;

        let mut command = Self::new(verb, Vec::new());
        let mut iter = rest.iter();
        while let Some(fragment) = iter.next() {
            match fragment.as_word().and_then(split_named) {
                Some((key, "")) => {
                    let value = iter
                        .next()
                        .ok_or_else(|| CommandError::MissingNamedValue(key.to_owned()))?;
                    command = command.with_named(key, value.clone())?;
                }
                Some((key, value)) => {
                    command = command.with_named(key, Fragment::word(value))?;
                }
                None => command.positional.push(fragment.clone()),
            }
        }
        Ok(command)
    }

    /// Return a copy of this command with an extra named argument.
    pub fn with_named(
        mut self,
        name: impl Into<String>,
        value: Fragment,
    ) -> Result<Self, CommandError> {
        let name = name.into();
        if self.named(&name).is_some() {
            return Err(CommandError::DuplicateNamedArgument(name));
        }
        self.named.push((name, value));
        Ok(self)
    }

    /// The command formed by this command's arguments: the first positional
    /// argument becomes the verb, named arguments carry over.
    ///
    /// `Deploy Fixed price:1.5` yields `Fixed price:1.5`.
    pub fn subcommand(&self) -> Result<Self, CommandError> {
        let (head, rest) = self
            .positional
            .split_first()
            .ok_or(CommandError::MissingVerb)?;
        let verb = head
            .as_word()
            .ok_or_else(|| CommandError::VerbNotWord(head.to_string()))?;
        Ok(Self {
            verb: verb.to_owned(),
            positional: rest.to_vec(),
            named: self.named.clone(),
        })
    }

    /// The command's verb.
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Positional argument fragments, in order.
    pub fn positional(&self) -> &[Fragment] {
        &self.positional
    }

    /// Look up a named argument, ignoring ASCII case.
    pub fn named(&self, name: &str) -> Option<&Fragment> {
        self.named
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// All named arguments in the order they were written.
    pub fn named_args(&self) -> &[(String, Fragment)] {
        &self.named
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.verb)?;
        for fragment in &self.positional {
            write!(f, " {fragment}")?;
        }
        for (name, value) in &self.named {
            write!(f, " {name}:{value}")?;
        }
        Ok(())
    }
}

/// Split `key:value` when `key` looks like an identifier.
fn split_named(word: &str) -> Option<(&str, &str)> {
    let (key, value) = word.split_once(':')?;
    let mut chars = key.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let identifier = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    (starts_alpha && identifier).then_some((key, value))
}
