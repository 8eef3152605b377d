mod element;
mod queue;

pub use self::{element::*, queue::*};
