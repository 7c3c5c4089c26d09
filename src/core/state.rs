//! Enumerated state values and the domains they form.
//!
//! A governed field holds one symbolic value out of a finite, ordered
//! domain. Hosts usually model a domain as an enum implementing [`State`]
//! (see the `state_enum!` macro); the registry only ever sees the symbolic
//! names, captured once in a [`Domain`].

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for enumerated state values.
///
/// All methods are pure. `name` is the symbolic value stored in the
/// governed field and used in transition definitions and events.
///
/// # Example
///
/// ```rust
/// use statefield::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum TaskState {
///     Pending,
///     Running,
///     Complete,
/// }
///
/// impl State for TaskState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Pending => "pending",
///             Self::Running => "running",
///             Self::Complete => "complete",
///         }
///     }
///
///     fn variants() -> Vec<Self> {
///         vec![Self::Pending, Self::Running, Self::Complete]
///     }
/// }
///
/// assert_eq!(TaskState::parse("running"), Some(TaskState::Running));
/// assert_eq!(TaskState::parse("nonexistent"), None);
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Symbolic name of this value.
    fn name(&self) -> &str;

    /// Every value of the domain, in declaration order.
    fn variants() -> Vec<Self>;

    /// Resolve a symbolic name back into a value.
    fn parse(name: &str) -> Option<Self> {
        Self::variants().into_iter().find(|v| v.name() == name)
    }
}

/// Finite ordered set of symbolic values a field may hold.
///
/// ```rust
/// use statefield::core::Domain;
///
/// let domain = Domain::new(["pending", "paid", "refunded"]);
/// assert!(domain.contains("paid"));
/// assert!(!domain.contains("nonexistent"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Domain {
    values: Vec<String>,
}

impl Domain {
    /// Build a domain from symbolic names. Repeated names are kept once.
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for value in values.into_iter().map(Into::into) {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        Self { values: unique }
    }

    /// Capture the domain of a [`State`] enum.
    pub fn of<S: State>() -> Self {
        Self::new(S::variants().iter().map(|v| v.name().to_string()))
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl From<Vec<String>> for Domain {
    fn from(values: Vec<String>) -> Self {
        Self::new(values)
    }
}

impl From<Domain> for Vec<String> {
    fn from(domain: Domain) -> Self {
        domain.values
    }
}

/// One governed attribute of an entity type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateField {
    pub name: String,
    pub domain: Domain,
}
