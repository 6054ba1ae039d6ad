mod echo;

pub use echo::{ConnectionDetails, EchoResponse};
