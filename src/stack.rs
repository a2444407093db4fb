mod destroy;
mod outputs;
mod stack;
mod status;

pub(crate) use stack::Stack;
pub(crate) use status::State;
