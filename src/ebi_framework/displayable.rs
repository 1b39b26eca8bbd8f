use std::{
    fmt::{Debug, Display},
    hash::Hash,
};

/// A state of a semantics, which can be stored in search structures and shown to the user.
pub trait Displayable: Hash + Clone + Eq + Display + Debug + Send + Sync {}
