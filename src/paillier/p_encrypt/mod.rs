pub mod p_encrypt;

pub use p_encrypt::{p_add, p_encrypt, p_rerandomize, p_scalar_mul};
