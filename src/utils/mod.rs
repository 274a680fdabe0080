pub mod path;

pub(crate) mod scoped_timer;
