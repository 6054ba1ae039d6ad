mod echo;

pub use echo::echo;
