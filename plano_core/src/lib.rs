pub mod arena;
pub use arena::*;

pub mod autoplace;
pub use autoplace::*;

pub mod chain;

pub mod collab;
pub use collab::*;

pub mod collision;
pub use collision::*;

pub mod command;
pub use command::*;

pub mod context;
pub use context::*;

pub mod error;
pub use error::*;

pub mod geometry;

pub mod match_set;
pub use match_set::*;

pub mod node;
pub use node::*;

pub mod positioning;
pub use positioning::*;

pub mod relationship;
pub use relationship::*;

pub mod resolver;
pub use resolver::*;
