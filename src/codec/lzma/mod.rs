mod decoder;
mod encoder;
mod stream;

pub use self::{decoder::LzmaDecoder, encoder::LzmaEncoder};
