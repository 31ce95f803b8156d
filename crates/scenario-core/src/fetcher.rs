//! Fetcher declarations and the dispatch engine.
//!
//! A [`Fetcher`] is one candidate way to satisfy a command: a verb, an
//! ordered list of typed [`Arg`]s, and an async handler. Several fetchers
//! may share a verb; [`get_fetcher_value`] tries them in declared order and
//! runs the handler of the first one whose arguments all coerce.
//!
//! Coercion happens completely before a handler runs, so a handler never
//! sees partially bound arguments and at most one handler runs per
//! dispatch. Handler failures are folded into [`Invocation::Failure`];
//! only "nothing matched" and malformed declarations surface as
//! [`DispatchError`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use alloy_primitives::Address;
use futures::future::BoxFuture;
use scenario_types::value::{self, TypeMismatch};
use scenario_types::{Command, Fragment, Invocation, InvocationError, Number, Value, ValueKind};
use scenario_world::World;
use tracing::{debug, trace, warn};

/// Converts one fragment into a [`Value`], with read access to the world.
pub type Coercer = Arc<dyn Fn(&World, &Fragment) -> Result<Value, TypeMismatch> + Send + Sync>;

/// The async body of a fetcher.
pub type Handler<T> = Arc<
    dyn Fn(World, FetcherArgs) -> BoxFuture<'static, Result<Invocation<T>, InvocationError>>
        + Send
        + Sync,
>;

// ---------------------------------------------------------------------------
// Argument specs
// ---------------------------------------------------------------------------

/// One named, typed parameter of a fetcher.
#[derive(Clone)]
pub struct Arg {
    name: String,
    kind: ValueKind,
    coerce: Coercer,
    default: Option<Value>,
    variadic: bool,
}

impl Arg {
    /// An argument with a custom coercion.
    pub fn new<F>(name: impl Into<String>, kind: ValueKind, coerce: F) -> Self
    where
        F: Fn(&World, &Fragment) -> Result<Value, TypeMismatch> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind,
            coerce: Arc::new(coerce),
            default: None,
            variadic: false,
        }
    }

    /// An address argument.
    ///
    /// Besides hex addresses, accepts the name of a registered contract or
    /// a dotted store path (`Tokens.oEther`) that resolves to an address in
    /// the world.
    pub fn address(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Address, |world, fragment| {
            value::coerce_address(fragment).or_else(|mismatch| {
                fragment
                    .as_word()
                    .and_then(|word| world.contract_address(word))
                    .map(Value::Address)
                    .ok_or(mismatch)
            })
        })
    }

    /// A decimal number argument.
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Number, |_, fragment| value::coerce_number(fragment))
    }

    /// A string argument.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Str, |_, fragment| value::coerce_string(fragment))
    }

    /// A boolean argument.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Bool, |_, fragment| value::coerce_bool(fragment))
    }

    /// A list argument whose elements must all be `element`.
    pub fn list(name: impl Into<String>, element: ValueKind) -> Self {
        Self::new(name, ValueKind::List, move |_, fragment| {
            value::coerce_list_of(element, fragment)
        })
    }

    /// A struct argument written as `((key value) ...)`.
    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Struct, |_, fragment| value::coerce_struct(fragment))
    }

    /// Use `value` when the argument is not supplied.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Collect every remaining positional fragment into a list.
    #[must_use]
    pub const fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// The argument's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kind this argument coerces to, or the element kind when variadic.
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Whether the argument is variadic.
    pub const fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// The default value, if any.
    pub const fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    fn coerce(&self, world: &World, fragment: &Fragment) -> Result<Value, TypeMismatch> {
        (self.coerce)(world, fragment)
    }

    fn coerce_all<'a>(
        &self,
        world: &World,
        fragments: impl Iterator<Item = &'a Fragment>,
    ) -> Result<Value, TypeMismatch> {
        fragments
            .map(|fragment| self.coerce(world, fragment))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }

    /// Bind a `name:value` argument. Variadics accept a single fragment or a list.
    fn coerce_named(&self, world: &World, fragment: &Fragment) -> Result<Value, TypeMismatch> {
        if !self.variadic {
            return self.coerce(world, fragment);
        }
        match fragment {
            Fragment::List(items) => self.coerce_all(world, items.iter()),
            single => self.coerce_all(world, std::iter::once(single)),
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arg")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("default", &self.default)
            .field("variadic", &self.variadic)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Coerced arguments
// ---------------------------------------------------------------------------

/// A handler asked for an argument that was not bound, or bound to another kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgError {
    /// No argument with this name was bound.
    #[error("missing argument `{0}`")]
    Missing(String),

    /// The argument was bound to a different kind of value.
    #[error("argument `{name}` is {found}, expected {expected}")]
    WrongKind {
        /// Argument name.
        name: String,
        /// Kind the handler asked for.
        expected: ValueKind,
        /// Kind actually bound.
        found: ValueKind,
    },
}

impl From<ArgError> for InvocationError {
    fn from(err: ArgError) -> Self {
        Self::Handler(err.to_string())
    }
}

/// Arguments bound for a matched fetcher, keyed by argument name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetcherArgs {
    values: BTreeMap<String, Value>,
    extra: Vec<Fragment>,
}

impl FetcherArgs {
    /// Bound values by argument name.
    pub const fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Input a catchall fetcher accepted without binding it to an argument.
    pub fn extra(&self) -> &[Fragment] {
        &self.extra
    }

    /// Look up a bound value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Look up a bound value, failing if it is absent.
    pub fn value(&self, name: &str) -> Result<&Value, ArgError> {
        self.get(name).ok_or_else(|| ArgError::Missing(name.to_owned()))
    }

    /// The address bound to `name`.
    pub fn address(&self, name: &str) -> Result<Address, ArgError> {
        let value = self.value(name)?;
        value
            .as_address()
            .ok_or_else(|| wrong_kind(name, ValueKind::Address, value))
    }

    /// The number bound to `name`.
    pub fn number(&self, name: &str) -> Result<Number, ArgError> {
        let value = self.value(name)?;
        value
            .as_number()
            .ok_or_else(|| wrong_kind(name, ValueKind::Number, value))
    }

    /// The string bound to `name`.
    pub fn string(&self, name: &str) -> Result<&str, ArgError> {
        let value = self.value(name)?;
        value
            .as_str()
            .ok_or_else(|| wrong_kind(name, ValueKind::Str, value))
    }

    /// The boolean bound to `name`.
    pub fn boolean(&self, name: &str) -> Result<bool, ArgError> {
        let value = self.value(name)?;
        value
            .as_bool()
            .ok_or_else(|| wrong_kind(name, ValueKind::Bool, value))
    }

    /// The list bound to `name`.
    pub fn list(&self, name: &str) -> Result<&[Value], ArgError> {
        let value = self.value(name)?;
        value
            .as_list()
            .ok_or_else(|| wrong_kind(name, ValueKind::List, value))
    }
}

fn wrong_kind(name: &str, expected: ValueKind, found: &Value) -> ArgError {
    ArgError::WrongKind {
        name: name.to_owned(),
        expected,
        found: found.kind(),
    }
}

// ---------------------------------------------------------------------------
// Fetchers
// ---------------------------------------------------------------------------

/// One candidate handler for a command verb.
pub struct Fetcher<T> {
    doc: String,
    verb: String,
    args: Vec<Arg>,
    handler: Handler<T>,
    catchall: bool,
}

impl<T: Send + 'static> Fetcher<T> {
    /// Declare a fetcher.
    ///
    /// `doc` is the human readable grammar for the fetcher; its first
    /// `#### Heading` line names it in diagnostics. An empty `verb` matches
    /// any verb.
    pub fn new<F, Fut>(
        doc: impl Into<String>,
        verb: impl Into<String>,
        args: Vec<Arg>,
        handler: F,
    ) -> Self
    where
        F: Fn(World, FetcherArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Invocation<T>, InvocationError>> + Send + 'static,
    {
        Self {
            doc: doc.into(),
            verb: verb.into(),
            args,
            handler: Arc::new(move |world, args| Box::pin(handler(world, args))),
            catchall: false,
        }
    }
}

impl<T> Fetcher<T> {
    /// Accept input left over after binding instead of rejecting it.
    #[must_use]
    pub const fn catchall(mut self) -> Self {
        self.catchall = true;
        self
    }

    /// Display name: the first `####` heading of the docs, else the verb.
    pub fn name(&self) -> &str {
        let heading = self
            .doc
            .lines()
            .find_map(|line| line.trim_start().strip_prefix("####"))
            .map(str::trim)
            .filter(|heading| !heading.is_empty());
        match heading {
            Some(heading) => heading,
            None if self.verb.is_empty() => "default",
            None => &self.verb,
        }
    }

    /// The documentation string.
    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// The matched verb; empty matches any.
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Declared arguments, in binding order.
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Whether leftover input is accepted.
    pub const fn is_catchall(&self) -> bool {
        self.catchall
    }

    /// Check the declaration itself: argument names must be non-empty and
    /// unique, and only the last argument may be variadic.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = BTreeSet::new();
        for (position, arg) in self.args.iter().enumerate() {
            if arg.name.trim().is_empty() {
                return Err(format!("argument {position} has an empty name"));
            }
            if !seen.insert(arg.name.to_ascii_lowercase()) {
                return Err(format!("argument `{}` is declared twice", arg.name));
            }
            let is_last = position.saturating_add(1) == self.args.len();
            if arg.variadic && !is_last {
                return Err(format!("variadic argument `{}` is not last", arg.name));
            }
        }
        Ok(())
    }

    fn matches_verb(&self, verb: &str) -> bool {
        self.verb.is_empty() || self.verb.eq_ignore_ascii_case(verb)
    }

    /// Bind `command`'s arguments to this fetcher's specs.
    fn bind(
        &self,
        command: &Command,
        world: &World,
        strict: bool,
    ) -> Result<FetcherArgs, RejectReason> {
        let mut named: Vec<&(String, Fragment)> = command.named_args().iter().collect();
        let mut positional = command.positional().iter();
        let mut values = BTreeMap::new();

        for arg in &self.args {
            let by_name = named
                .iter()
                .position(|(key, _)| key.eq_ignore_ascii_case(&arg.name))
                .map(|index| named.remove(index));

            let bound = if let Some((_, fragment)) = by_name {
                arg.coerce_named(world, fragment)
            } else if arg.variadic {
                let rest: Vec<&Fragment> = positional.by_ref().collect();
                match (&arg.default, rest.is_empty()) {
                    (Some(default), true) => Ok(default.clone()),
                    _ => arg.coerce_all(world, rest.into_iter()),
                }
            } else if let Some(fragment) = positional.next() {
                arg.coerce(world, fragment)
            } else if let Some(default) = &arg.default {
                Ok(default.clone())
            } else {
                return Err(RejectReason::MissingArgument {
                    arg: arg.name.clone(),
                });
            };

            let value = bound.map_err(|mismatch| RejectReason::TypeMismatch {
                arg: arg.name.clone(),
                mismatch,
            })?;
            values.insert(arg.name.clone(), value);
        }

        let mut extra: Vec<Fragment> = positional.cloned().collect();
        for (key, fragment) in named {
            match fragment {
                Fragment::Word(word) => extra.push(Fragment::word(format!("{key}:{word}"))),
                other => {
                    extra.push(Fragment::word(format!("{key}:")));
                    extra.push(other.clone());
                }
            }
        }

        if !extra.is_empty() && (strict || !self.catchall) {
            return Err(RejectReason::UnconsumedArguments { count: extra.len() });
        }
        Ok(FetcherArgs { values, extra })
    }
}

impl<T> Clone for Fetcher<T> {
    fn clone(&self) -> Self {
        Self {
            doc: self.doc.clone(),
            verb: self.verb.clone(),
            args: self.args.clone(),
            handler: Arc::clone(&self.handler),
            catchall: self.catchall,
        }
    }
}

impl<T> fmt::Debug for Fetcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("name", &self.name())
            .field("verb", &self.verb)
            .field("args", &self.args)
            .field("catchall", &self.catchall)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Dispatch behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Reject leftover input even for catchall fetchers.
    pub strict_catchall: bool,
}

/// Why a candidate fetcher was not chosen.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    /// The command verb differs from the fetcher's.
    #[error("verb is not `{expected}`")]
    VerbMismatch {
        /// The fetcher's verb.
        expected: String,
    },

    /// An argument did not coerce.
    #[error("argument `{arg}`: {mismatch}")]
    TypeMismatch {
        /// Argument name.
        arg: String,
        /// The coercion failure.
        mismatch: TypeMismatch,
    },

    /// A required argument was not supplied and has no default.
    #[error("missing argument `{arg}`")]
    MissingArgument {
        /// Argument name.
        arg: String,
    },

    /// Input was left over after binding every argument.
    #[error("{count} unconsumed argument(s)")]
    UnconsumedArguments {
        /// Number of leftover fragments.
        count: usize,
    },
}

/// A candidate and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Display name of the fetcher.
    pub fetcher: String,
    /// Why it did not match.
    pub reason: RejectReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.fetcher, self.reason)
    }
}

/// Dispatch failures that are not captured into an [`Invocation`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// No candidate fetcher fully matched the command.
    #[error("no fetcher matched `{command}` [{}]", render_attempts(.attempts))]
    AmbiguousOrNoMatch {
        /// Canonical text of the command.
        command: String,
        /// Every candidate tried, in declared order.
        attempts: Vec<Rejection>,
    },

    /// A fetcher declaration is invalid.
    #[error("malformed fetcher `{fetcher}`: {reason}")]
    MalformedFetcher {
        /// Display name of the fetcher.
        fetcher: String,
        /// What is wrong with it.
        reason: String,
    },
}

fn render_attempts(attempts: &[Rejection]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Select the fetcher matching `command` and run its handler.
///
/// Candidates are tried in declared order; the first whose arguments all
/// bind wins and its handler runs exactly once. A handler error becomes
/// [`Invocation::Failure`].
///
/// # Errors
///
/// Returns [`DispatchError::MalformedFetcher`] if any declaration is invalid
/// (checked before any binding) and [`DispatchError::AmbiguousOrNoMatch`]
/// if no candidate matches. No handler runs in either case.
pub async fn get_fetcher_value<T>(
    command: &Command,
    fetchers: &[Fetcher<T>],
    world: &World,
    options: DispatchOptions,
) -> Result<Invocation<T>, DispatchError> {
    for fetcher in fetchers {
        fetcher
            .validate()
            .map_err(|reason| DispatchError::MalformedFetcher {
                fetcher: fetcher.name().to_owned(),
                reason,
            })?;
    }

    let mut attempts = Vec::with_capacity(fetchers.len());
    for fetcher in fetchers {
        let bound = if fetcher.matches_verb(command.verb()) {
            fetcher.bind(command, world, options.strict_catchall)
        } else {
            Err(RejectReason::VerbMismatch {
                expected: fetcher.verb.clone(),
            })
        };

        match bound {
            Ok(args) => {
                debug!(
                    fetcher = fetcher.name(),
                    command = %command,
                    extra = args.extra().len(),
                    "dispatching"
                );
                let result = (fetcher.handler)(world.clone(), args).await;
                return Ok(result.unwrap_or_else(|error| {
                    warn!(fetcher = fetcher.name(), %error, "fetcher handler failed");
                    Invocation::failure(error)
                }));
            }
            Err(reason) => {
                trace!(fetcher = fetcher.name(), %reason, "candidate rejected");
                attempts.push(Rejection {
                    fetcher: fetcher.name().to_owned(),
                    reason,
                });
            }
        }
    }

    Err(DispatchError::AmbiguousOrNoMatch {
        command: command.to_string(),
        attempts,
    })
}
