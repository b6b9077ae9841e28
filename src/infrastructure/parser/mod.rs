pub mod abi;
pub mod event_decoder;
pub mod parser;
pub mod script;

pub use event_decoder::EventDecoder;
pub use parser::{BlockDecoder, DecodedBlock};
